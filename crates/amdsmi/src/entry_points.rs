//! The table of typed entry points resolved from a loaded module.

use std::ffi::c_char;
use std::ffi::c_uint;
use std::ffi::c_void;
use std::mem;

use crate::error::LoadError;
use crate::module::Module;
use crate::sys::*;

/// Whether a missing symbol fails the whole load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

/// Reinterprets a symbol address as the function pointer type `F`.
///
/// # Safety
/// `F` must be a function pointer type whose signature matches the symbol.
unsafe fn cast_symbol<F: Copy>(address: *const c_void) -> F {
    debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<*const c_void>());
    mem::transmute_copy::<*const c_void, F>(&address)
}

macro_rules! requirement {
    (required) => {
        Requirement::Required
    };
    (optional) => {
        Requirement::Optional
    };
}

macro_rules! resolve_entry {
    (required, $module:expr, $name:ident, $fn_ty:ty) => {{
        let address = $module.symbol(stringify!($name))?;
        Some(cast_symbol::<$fn_ty>(address))
    }};
    (optional, $module:expr, $name:ident, $fn_ty:ty) => {{
        match $module.symbol(stringify!($name)) {
            Ok(address) => Some(cast_symbol::<$fn_ty>(address)),
            Err(err) => {
                tracing::warn!("optional entry point unavailable: {err}");
                None
            }
        }
    }};
}

macro_rules! entry_points {
    ($(
        $(#[$meta:meta])*
        $kind:ident fn $name:ident($($arg:ident: $ty:ty),* $(,)?) as $fn_ty:ty;
    )*) => {
        /// Typed entry points of `libamd_smi`.
        ///
        /// `Default` is the fully unresolved table. Calling an unresolved
        /// entry returns [`Status::INVAL`] without touching the library.
        ///
        /// The table is neither `Copy` nor `Clone`: it is only reachable by
        /// reference from its binding, so no entry outlives an unload.
        #[derive(Debug, Default)]
        pub struct EntryPoints {
            $($name: Option<$fn_ty>,)*
        }

        impl EntryPoints {
            /// Every symbol the table knows, with its requirement.
            pub const SYMBOLS: &'static [(&'static str, Requirement)] = &[
                $((stringify!($name), requirement!($kind)),)*
            ];

            /// Resolves the table from `module`; fails on the first missing
            /// required symbol.
            pub(crate) fn resolve(module: &dyn Module) -> Result<Self, LoadError> {
                // SAFETY: each address is cast to the signature declared for
                // the symbol of the same name.
                unsafe {
                    Ok(Self {
                        $($name: resolve_entry!($kind, module, $name, $fn_ty),)*
                    })
                }
            }

            pub fn is_resolved(&self, symbol: &str) -> bool {
                match symbol {
                    $(stringify!($name) => self.$name.is_some(),)*
                    _ => false,
                }
            }

            pub fn resolved_count(&self) -> usize {
                [$(self.$name.is_some(),)*].into_iter().filter(|&resolved| resolved).count()
            }

            $(
                $(#[$meta])*
                ///
                /// # Safety
                /// Pointer arguments must satisfy the native contract of the
                /// symbol, and handles must come from the module this table
                /// was resolved from while it is still loaded.
                pub unsafe fn $name(&self, $($arg: $ty),*) -> Status {
                    match self.$name {
                        Some(entry) => entry($($arg),*),
                        None => Status::INVAL,
                    }
                }
            )*
        }
    };
}

entry_points! {
    /// `amdsmi_init`: initializes the library for the given processor families.
    required fn amdsmi_init(flags: u64) as FnInit;
    /// `amdsmi_shut_down`
    required fn amdsmi_shut_down() as FnShutDown;
    /// `amdsmi_get_socket_handles`: a null `socket_handles` only reports the count.
    required fn amdsmi_get_socket_handles(
        socket_count: *mut u32,
        socket_handles: *mut SocketHandleT,
    ) as FnGetSocketHandles;
    /// `amdsmi_get_socket_info`: writes at most `len` bytes of the socket name.
    required fn amdsmi_get_socket_info(
        socket_handle: SocketHandleT,
        len: usize,
        name: *mut c_char,
    ) as FnGetSocketInfo;
    /// `amdsmi_get_processor_handles`: a null `processor_handles` only reports the count.
    required fn amdsmi_get_processor_handles(
        socket_handle: SocketHandleT,
        processor_count: *mut u32,
        processor_handles: *mut ProcessorHandleT,
    ) as FnGetProcessorHandles;
    /// `amdsmi_get_processor_type`
    required fn amdsmi_get_processor_type(
        processor_handle: ProcessorHandleT,
        processor_type: *mut ProcessorTypeT,
    ) as FnGetProcessorType;
    /// `amdsmi_get_gpu_board_info`
    required fn amdsmi_get_gpu_board_info(
        processor_handle: ProcessorHandleT,
        board_info: *mut BoardInfoT,
    ) as FnGetGpuBoardInfo;
    /// `amdsmi_get_gpu_id`
    required fn amdsmi_get_gpu_id(processor_handle: ProcessorHandleT, id: *mut u16) as FnGetGpuId;
    /// `amdsmi_get_gpu_device_uuid`: `uuid_length` carries the buffer capacity in.
    required fn amdsmi_get_gpu_device_uuid(
        processor_handle: ProcessorHandleT,
        uuid_length: *mut c_uint,
        uuid: *mut c_char,
    ) as FnGetGpuDeviceUuid;
    /// `amdsmi_get_gpu_vram_usage`
    required fn amdsmi_get_gpu_vram_usage(
        processor_handle: ProcessorHandleT,
        vram_info: *mut VramUsageT,
    ) as FnGetGpuVramUsage;
    /// `amdsmi_get_gpu_bdf_id`: missing from older library builds.
    optional fn amdsmi_get_gpu_bdf_id(processor_handle: ProcessorHandleT, bdf_id: *mut u64) as FnGetGpuBdfId;
}
