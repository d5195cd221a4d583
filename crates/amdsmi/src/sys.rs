//! Native ABI of `libamd_smi`: status codes, enums and `#[repr(C)]` records.

use std::ffi::c_char;
use std::ffi::c_uint;
use std::ffi::c_void;
use std::fmt;

use bitflags::bitflags;
use derive_more::Display;

pub const NORMAL_STRING_LENGTH: usize = 32;
pub const LONG_STRING_LENGTH: usize = 256;
pub const GPU_UUID_SIZE: usize = 38;

pub type SocketHandleT = *mut c_void;
pub type ProcessorHandleT = *mut c_void;
pub type ProcessorTypeT = u32;

/// Status returned by every native call.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub u32);

macro_rules! statuses {
    ($($name:ident = $value:expr,)*) => {
        impl Status {
            $(pub const $name: Status = Status($value);)*

            /// Symbolic vendor name of the status, if it is a known one.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $(Status::$name => Some(concat!("AMDSMI_STATUS_", stringify!($name))),)*
                    _ => None,
                }
            }
        }
    };
}

statuses! {
    SUCCESS = 0,
    INVAL = 1,
    NOT_SUPPORTED = 2,
    NOT_YET_IMPLEMENTED = 3,
    FAIL_LOAD_MODULE = 4,
    FAIL_LOAD_SYMBOL = 5,
    DRM_ERROR = 6,
    API_FAILED = 7,
    TIMEOUT = 8,
    RETRY = 9,
    NO_PERM = 10,
    INTERRUPT = 11,
    IO = 12,
    ADDRESS_FAULT = 13,
    FILE_ERROR = 14,
    OUT_OF_RESOURCES = 15,
    INTERNAL_EXCEPTION = 16,
    INPUT_OUT_OF_BOUNDS = 17,
    INIT_ERROR = 18,
    REFCOUNT_OVERFLOW = 19,
    BUSY = 30,
    NOT_FOUND = 31,
    NOT_INIT = 32,
    NO_SLOT = 33,
    DRIVER_NOT_LOADED = 34,
    NO_DATA = 40,
    INSUFFICIENT_SIZE = 41,
    UNEXPECTED_SIZE = 42,
    UNEXPECTED_DATA = 43,
    NON_AMD_CPU = 44,
    NO_ENERGY_DRV = 45,
    NO_MSR_DRV = 46,
    NO_HSMP_DRV = 47,
    NO_HSMP_SUP = 48,
    NO_HSMP_MSG_SUP = 49,
    HSMP_TIMEOUT = 50,
    NO_DRV = 51,
    FILE_NOT_FOUND = 52,
    ARG_PTR_NULL = 53,
    AMDGPU_RESTART_ERR = 54,
    SETTING_UNAVAILABLE = 55,
    MAP_ERROR = 0xFFFF_FFFE,
    UNKNOWN_ERROR = 0xFFFF_FFFF,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::SUCCESS
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "AMDSMI_STATUS_{}", self.0),
        }
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

bitflags! {
    /// Processor families passed to `amdsmi_init`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InitFlags: u64 {
        const AMD_CPUS = 1 << 0;
        const AMD_GPUS = 1 << 1;
        const NON_AMD_CPUS = 1 << 2;
        const NON_AMD_GPUS = 1 << 3;
        const AMD_APUS = Self::AMD_CPUS.bits() | Self::AMD_GPUS.bits();
        const ALL_PROCESSORS = 0xFFFF_FFFF;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorType {
    #[display("unknown")]
    Unknown,
    #[display("AMD GPU")]
    AmdGpu,
    #[display("AMD CPU")]
    AmdCpu,
    #[display("non-AMD GPU")]
    NonAmdGpu,
    #[display("non-AMD CPU")]
    NonAmdCpu,
    #[display("AMD CPU core")]
    AmdCpuCore,
    #[display("AMD APU")]
    AmdApu,
    #[display("processor type {_0}")]
    Other(u32),
}

impl From<ProcessorTypeT> for ProcessorType {
    fn from(raw: ProcessorTypeT) -> Self {
        match raw {
            0 => ProcessorType::Unknown,
            1 => ProcessorType::AmdGpu,
            2 => ProcessorType::AmdCpu,
            3 => ProcessorType::NonAmdGpu,
            4 => ProcessorType::NonAmdCpu,
            5 => ProcessorType::AmdCpuCore,
            6 => ProcessorType::AmdApu,
            other => ProcessorType::Other(other),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct BoardInfoT {
    pub model_number: [c_char; LONG_STRING_LENGTH],
    pub product_serial: [c_char; NORMAL_STRING_LENGTH],
    pub fru_id: [c_char; NORMAL_STRING_LENGTH],
    pub product_name: [c_char; LONG_STRING_LENGTH],
    pub manufacturer_name: [c_char; NORMAL_STRING_LENGTH],
    pub reserved: [u64; 64],
}

impl Default for BoardInfoT {
    fn default() -> Self {
        Self {
            model_number: [0; LONG_STRING_LENGTH],
            product_serial: [0; NORMAL_STRING_LENGTH],
            fru_id: [0; NORMAL_STRING_LENGTH],
            product_name: [0; LONG_STRING_LENGTH],
            manufacturer_name: [0; NORMAL_STRING_LENGTH],
            reserved: [0; 64],
        }
    }
}

/// VRAM usage record, sizes in MB.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct VramUsageT {
    pub vram_total: u32,
    pub vram_used: u32,
    pub reserved: [u32; 2],
}

pub type FnInit = unsafe extern "C" fn(flags: u64) -> Status;
pub type FnShutDown = unsafe extern "C" fn() -> Status;
pub type FnGetSocketHandles =
    unsafe extern "C" fn(socket_count: *mut u32, socket_handles: *mut SocketHandleT) -> Status;
pub type FnGetSocketInfo =
    unsafe extern "C" fn(socket_handle: SocketHandleT, len: usize, name: *mut c_char) -> Status;
pub type FnGetProcessorHandles = unsafe extern "C" fn(
    socket_handle: SocketHandleT,
    processor_count: *mut u32,
    processor_handles: *mut ProcessorHandleT,
) -> Status;
pub type FnGetProcessorType = unsafe extern "C" fn(
    processor_handle: ProcessorHandleT,
    processor_type: *mut ProcessorTypeT,
) -> Status;
pub type FnGetGpuBoardInfo =
    unsafe extern "C" fn(processor_handle: ProcessorHandleT, board_info: *mut BoardInfoT) -> Status;
pub type FnGetGpuId =
    unsafe extern "C" fn(processor_handle: ProcessorHandleT, id: *mut u16) -> Status;
pub type FnGetGpuDeviceUuid = unsafe extern "C" fn(
    processor_handle: ProcessorHandleT,
    uuid_length: *mut c_uint,
    uuid: *mut c_char,
) -> Status;
pub type FnGetGpuVramUsage =
    unsafe extern "C" fn(processor_handle: ProcessorHandleT, vram_info: *mut VramUsageT) -> Status;
pub type FnGetGpuBdfId =
    unsafe extern "C" fn(processor_handle: ProcessorHandleT, bdf_id: *mut u64) -> Status;
