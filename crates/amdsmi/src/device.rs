//! Telemetry queries over a loaded [`AmdSmiLib`].

use std::ffi::c_char;
use std::ffi::c_uint;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

use serde::Serialize;

use crate::error::check;
use crate::error::Error;
use crate::library::AmdSmiLib;
use crate::strings::from_fixed;
use crate::sys::*;

/// Opaque socket token handed out by the library.
///
/// Borrows the binding it came from, so it cannot outlive an unload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SocketHandle<'lib> {
    raw: SocketHandleT,
    _lib: PhantomData<&'lib AmdSmiLib>,
}

/// Opaque processor token handed out by the library.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ProcessorHandle<'lib> {
    raw: ProcessorHandleT,
    _lib: PhantomData<&'lib AmdSmiLib>,
}

impl SocketHandle<'_> {
    pub fn as_raw(&self) -> SocketHandleT {
        self.raw
    }
}

impl ProcessorHandle<'_> {
    pub fn as_raw(&self) -> ProcessorHandleT {
        self.raw
    }
}

impl fmt::Debug for SocketHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SocketHandle({:p})", self.raw)
    }
}

impl fmt::Debug for ProcessorHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessorHandle({:p})", self.raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardInfo {
    pub model_number: String,
    pub product_serial: String,
    pub fru_id: String,
    pub product_name: String,
    pub manufacturer_name: String,
}

impl From<&BoardInfoT> for BoardInfo {
    fn from(raw: &BoardInfoT) -> Self {
        Self {
            model_number: from_fixed(&raw.model_number),
            product_serial: from_fixed(&raw.product_serial),
            fru_id: from_fixed(&raw.fru_id),
            product_name: from_fixed(&raw.product_name),
            manufacturer_name: from_fixed(&raw.manufacturer_name),
        }
    }
}

/// VRAM capacity and usage in MB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VramUsage {
    pub total_mb: u32,
    pub used_mb: u32,
}

/// PCI location decoded from the packed 64-bit BDF id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bdf {
    pub domain: u32,
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl Bdf {
    pub fn from_id(id: u64) -> Self {
        Self {
            domain: (id >> 32) as u32,
            bus: ((id >> 8) & 0xff) as u8,
            device: ((id >> 3) & 0x1f) as u8,
            function: (id & 0x7) as u8,
        }
    }

    pub fn to_id(self) -> u64 {
        ((self.domain as u64) << 32)
            | ((self.bus as u64) << 8)
            | (((self.device & 0x1f) as u64) << 3)
            | (self.function & 0x7) as u64
    }
}

impl fmt::Display for Bdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

impl AmdSmiLib {
    pub fn init(&self, flags: InitFlags) -> Result<(), Error> {
        check("initialize AMD SMI", unsafe {
            self.entries().amdsmi_init(flags.bits())
        })
    }

    pub fn shut_down(&self) -> Result<(), Error> {
        check("shut down AMD SMI", unsafe {
            self.entries().amdsmi_shut_down()
        })
    }

    pub fn socket_handles(&self) -> Result<Vec<SocketHandle<'_>>, Error> {
        let raw = fetch_handles("get socket count", "get socket handles", |count, out| unsafe {
            self.entries().amdsmi_get_socket_handles(count, out)
        })?;

        Ok(raw
            .into_iter()
            .map(|raw| SocketHandle {
                raw,
                _lib: PhantomData,
            })
            .collect())
    }

    /// Socket name, read into a buffer of `max_len` bytes.
    pub fn socket_name(&self, socket: &SocketHandle<'_>, max_len: usize) -> Result<String, Error> {
        if max_len == 0 {
            return Ok(String::new());
        }

        let mut name = vec![0 as c_char; max_len];
        check("get socket info", unsafe {
            self.entries()
                .amdsmi_get_socket_info(socket.raw, max_len, name.as_mut_ptr())
        })?;

        Ok(from_fixed(&name))
    }

    pub fn processor_handles<'lib>(
        &'lib self,
        socket: &SocketHandle<'lib>,
    ) -> Result<Vec<ProcessorHandle<'lib>>, Error> {
        let raw = fetch_handles(
            "get processor count for socket",
            "get processor handles for socket",
            |count, out| unsafe {
                self.entries()
                    .amdsmi_get_processor_handles(socket.raw, count, out)
            },
        )?;

        Ok(raw
            .into_iter()
            .map(|raw| ProcessorHandle {
                raw,
                _lib: PhantomData,
            })
            .collect())
    }

    pub fn processor_type(&self, processor: &ProcessorHandle<'_>) -> Result<ProcessorType, Error> {
        let mut processor_type: ProcessorTypeT = 0;
        check("get processor type", unsafe {
            self.entries()
                .amdsmi_get_processor_type(processor.raw, &mut processor_type)
        })?;
        Ok(processor_type.into())
    }

    pub fn gpu_board_info(&self, processor: &ProcessorHandle<'_>) -> Result<BoardInfo, Error> {
        let mut board_info = BoardInfoT::default();
        check("get GPU board info", unsafe {
            self.entries()
                .amdsmi_get_gpu_board_info(processor.raw, &mut board_info)
        })?;
        Ok(BoardInfo::from(&board_info))
    }

    pub fn gpu_id(&self, processor: &ProcessorHandle<'_>) -> Result<u16, Error> {
        let mut id = 0u16;
        check("get GPU ID", unsafe {
            self.entries().amdsmi_get_gpu_id(processor.raw, &mut id)
        })?;
        Ok(id)
    }

    /// Device UUID, read into the fixed 38-byte buffer the library expects.
    pub fn gpu_uuid(&self, processor: &ProcessorHandle<'_>) -> Result<String, Error> {
        let mut uuid = [0 as c_char; GPU_UUID_SIZE];
        let mut length = GPU_UUID_SIZE as c_uint;
        check("get GPU UUID", unsafe {
            self.entries()
                .amdsmi_get_gpu_device_uuid(processor.raw, &mut length, uuid.as_mut_ptr())
        })?;
        Ok(from_fixed(&uuid))
    }

    pub fn gpu_vram_usage(&self, processor: &ProcessorHandle<'_>) -> Result<VramUsage, Error> {
        let mut vram = VramUsageT::default();
        check("get GPU VRAM info", unsafe {
            self.entries()
                .amdsmi_get_gpu_vram_usage(processor.raw, &mut vram)
        })?;
        Ok(VramUsage {
            total_mb: vram.vram_total,
            used_mb: vram.vram_used,
        })
    }

    pub fn gpu_bdf_id(&self, processor: &ProcessorHandle<'_>) -> Result<Bdf, Error> {
        let mut bdf_id = 0u64;
        check("get GPU BDF ID", unsafe {
            self.entries().amdsmi_get_gpu_bdf_id(processor.raw, &mut bdf_id)
        })?;
        Ok(Bdf::from_id(bdf_id))
    }

    /// Whether the optional BDF entry point is available.
    pub fn has_bdf_id(&self) -> bool {
        self.entries().is_resolved("amdsmi_get_gpu_bdf_id")
    }
}

/// Probe-then-fetch for handle arrays: a null output pointer yields the
/// count, then a buffer of exactly that many slots is filled.
fn fetch_handles<F>(
    probe_op: &'static str,
    fetch_op: &'static str,
    mut call: F,
) -> Result<Vec<*mut std::ffi::c_void>, Error>
where
    F: FnMut(*mut u32, *mut *mut std::ffi::c_void) -> Status,
{
    let mut count = 0u32;
    check(probe_op, call(&mut count, ptr::null_mut()))?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut handles = vec![ptr::null_mut(); count as usize];
    check(fetch_op, call(&mut count, handles.as_mut_ptr()))?;
    handles.truncate(count as usize);
    Ok(handles)
}
