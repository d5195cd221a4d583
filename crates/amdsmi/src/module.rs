//! Sources of the native module: runtime loading or link-time symbols.

use std::borrow::Cow;
use std::env;
use std::ffi::c_void;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::PathBuf;

use derive_more::Display;
use libloading::Library;

use crate::error::LoadError;

/// Well-known file name, resolved through the platform loader search path.
pub const DEFAULT_LIB_NAME: &str = "libamd_smi.so";
const ROCM_LIB_PATH: &str = "/opt/rocm/lib/libamd_smi.so";
/// Environment variable that overrides where the library is loaded from.
pub const LIB_PATH_ENV: &str = "AMDSMI_LIB_PATH";

/// How the entry points of a module were bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BindingKind {
    #[display("dynamic")]
    Dynamic,
    #[display("static")]
    Static,
}

/// An opened module able to hand out symbol addresses.
///
/// Dropping the module releases it; addresses it returned become invalid.
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    fn symbol(&self, name: &'static str) -> Result<*const c_void, LoadError>;
}

pub trait ModuleOpener: Send + Sync {
    fn binding(&self) -> BindingKind;

    fn open(&self) -> Result<Box<dyn Module>, LoadError>;
}

/// Module opened at runtime through the platform dynamic loader.
pub struct DynamicModule {
    name: String,
    library: Library,
}

impl Module for DynamicModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self, name: &'static str) -> Result<*const c_void, LoadError> {
        // SAFETY: the symbol is only read as an address here; callers cast it
        // to the signature declared in `sys`.
        let symbol = unsafe { self.library.get::<*const c_void>(name.as_bytes()) }.map_err(
            |err| LoadError::Symbol {
                symbol: name,
                reason: err.to_string(),
            },
        )?;

        let address = *symbol;
        if address.is_null() {
            return Err(LoadError::Symbol {
                symbol: name,
                reason: "resolved to a null address".to_string(),
            });
        }
        Ok(address)
    }
}

impl Drop for DynamicModule {
    fn drop(&mut self) {
        tracing::debug!("closing {}", self.name);
    }
}

/// Opens the library at runtime, trying each candidate path in order.
#[derive(Debug, Clone)]
pub struct DynamicOpener {
    candidates: Vec<OsString>,
}

impl DynamicOpener {
    /// Opens exactly `path`, with no fallback.
    pub fn new(path: impl Into<OsString>) -> Self {
        Self {
            candidates: vec![path.into()],
        }
    }

    /// An explicit path wins; otherwise `AMDSMI_LIB_PATH`, then the default names.
    pub fn with_override(path: Option<PathBuf>) -> Self {
        let mut candidates: Vec<OsString> = Vec::with_capacity(3);

        if let Some(path) = path {
            candidates.push(path.into_os_string());
        } else if let Some(path) = env::var_os(LIB_PATH_ENV) {
            candidates.push(path);
        }

        candidates.push(OsStr::new(DEFAULT_LIB_NAME).to_os_string());
        candidates.push(OsStr::new(ROCM_LIB_PATH).to_os_string());

        Self { candidates }
    }

    pub fn candidates(&self) -> &[OsString] {
        &self.candidates
    }
}

impl Default for DynamicOpener {
    fn default() -> Self {
        Self::with_override(None)
    }
}

impl ModuleOpener for DynamicOpener {
    fn binding(&self) -> BindingKind {
        BindingKind::Dynamic
    }

    fn open(&self) -> Result<Box<dyn Module>, LoadError> {
        let mut last_err: Option<LoadError> = None;

        for candidate in &self.candidates {
            let candidate_display = candidate.to_string_lossy();
            tracing::info!("Loading AMD SMI library from {}", candidate_display);

            // SAFETY: loading runs the library's initializers; libamd_smi has
            // no initializer requirements beyond being a well-formed ELF.
            match unsafe { Library::new(candidate) } {
                Ok(library) => {
                    return Ok(Box::new(DynamicModule {
                        name: candidate_display.into_owned(),
                        library,
                    }));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to load {}", candidate_display);
                    last_err = Some(LoadError::Open {
                        name: Cow::Owned(candidate_display.into_owned()),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Err(last_err.unwrap_or(LoadError::Open {
            name: Cow::Borrowed(DEFAULT_LIB_NAME),
            reason: "no candidate paths".to_string(),
        }))
    }
}

#[cfg(feature = "static-link")]
pub use linked::StaticOpener;

#[cfg(feature = "static-link")]
mod linked {
    use std::ffi::c_char;
    use std::ffi::c_uint;
    use std::ffi::c_void;

    use super::BindingKind;
    use super::Module;
    use super::ModuleOpener;
    use crate::error::LoadError;
    use crate::sys::*;

    extern "C" {
        fn amdsmi_init(flags: u64) -> Status;
        fn amdsmi_shut_down() -> Status;
        fn amdsmi_get_socket_handles(
            socket_count: *mut u32,
            socket_handles: *mut SocketHandleT,
        ) -> Status;
        fn amdsmi_get_socket_info(
            socket_handle: SocketHandleT,
            len: usize,
            name: *mut c_char,
        ) -> Status;
        fn amdsmi_get_processor_handles(
            socket_handle: SocketHandleT,
            processor_count: *mut u32,
            processor_handles: *mut ProcessorHandleT,
        ) -> Status;
        fn amdsmi_get_processor_type(
            processor_handle: ProcessorHandleT,
            processor_type: *mut ProcessorTypeT,
        ) -> Status;
        fn amdsmi_get_gpu_board_info(
            processor_handle: ProcessorHandleT,
            board_info: *mut BoardInfoT,
        ) -> Status;
        fn amdsmi_get_gpu_id(processor_handle: ProcessorHandleT, id: *mut u16) -> Status;
        fn amdsmi_get_gpu_device_uuid(
            processor_handle: ProcessorHandleT,
            uuid_length: *mut c_uint,
            uuid: *mut c_char,
        ) -> Status;
        fn amdsmi_get_gpu_vram_usage(
            processor_handle: ProcessorHandleT,
            vram_info: *mut VramUsageT,
        ) -> Status;
        fn amdsmi_get_gpu_bdf_id(processor_handle: ProcessorHandleT, bdf_id: *mut u64) -> Status;
    }

    /// Serves the symbols linked into the binary at build time.
    ///
    /// Every entry is a hard link-time import, the optional BDF entry
    /// included: a library without `amdsmi_get_gpu_bdf_id` fails to link
    /// instead of loading with that entry unresolved.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct StaticOpener;

    struct StaticModule;

    impl ModuleOpener for StaticOpener {
        fn binding(&self) -> BindingKind {
            BindingKind::Static
        }

        fn open(&self) -> Result<Box<dyn Module>, LoadError> {
            Ok(Box::new(StaticModule))
        }
    }

    impl Module for StaticModule {
        fn name(&self) -> &str {
            "libamd_smi (linked)"
        }

        fn symbol(&self, name: &'static str) -> Result<*const c_void, LoadError> {
            let address = match name {
                "amdsmi_init" => amdsmi_init as FnInit as *const c_void,
                "amdsmi_shut_down" => amdsmi_shut_down as FnShutDown as *const c_void,
                "amdsmi_get_socket_handles" => {
                    amdsmi_get_socket_handles as FnGetSocketHandles as *const c_void
                }
                "amdsmi_get_socket_info" => {
                    amdsmi_get_socket_info as FnGetSocketInfo as *const c_void
                }
                "amdsmi_get_processor_handles" => {
                    amdsmi_get_processor_handles as FnGetProcessorHandles as *const c_void
                }
                "amdsmi_get_processor_type" => {
                    amdsmi_get_processor_type as FnGetProcessorType as *const c_void
                }
                "amdsmi_get_gpu_board_info" => {
                    amdsmi_get_gpu_board_info as FnGetGpuBoardInfo as *const c_void
                }
                "amdsmi_get_gpu_id" => amdsmi_get_gpu_id as FnGetGpuId as *const c_void,
                "amdsmi_get_gpu_device_uuid" => {
                    amdsmi_get_gpu_device_uuid as FnGetGpuDeviceUuid as *const c_void
                }
                "amdsmi_get_gpu_vram_usage" => {
                    amdsmi_get_gpu_vram_usage as FnGetGpuVramUsage as *const c_void
                }
                "amdsmi_get_gpu_bdf_id" => amdsmi_get_gpu_bdf_id as FnGetGpuBdfId as *const c_void,
                _ => {
                    return Err(LoadError::Symbol {
                        symbol: name,
                        reason: "not linked into this binary".to_string(),
                    })
                }
            };
            Ok(address)
        }
    }
}
