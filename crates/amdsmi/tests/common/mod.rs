//! In-process stand-in for `libamd_smi`.
//!
//! The stub exports `extern "C"` functions with the native signatures and
//! serves them through the `Module` trait. Canned data and call counters live
//! in a thread-local, so every test drives its own copy.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_char;
use std::ffi::c_uint;
use std::ffi::c_void;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use amdsmi::sys::*;
use amdsmi::BindingKind;
use amdsmi::LoadError;
use amdsmi::Module;
use amdsmi::ModuleOpener;

#[derive(Debug, Clone, Default)]
pub struct StubBoard {
    pub model_number: String,
    pub product_serial: String,
    pub fru_id: String,
    pub product_name: String,
    pub manufacturer_name: String,
}

#[derive(Debug, Clone)]
pub struct StubProcessor {
    pub processor_type: ProcessorTypeT,
    pub board: StubBoard,
    pub gpu_id: u16,
    pub uuid: String,
    pub vram_total: u32,
    pub vram_used: u32,
    pub bdf_id: u64,
}

#[derive(Debug, Clone)]
pub struct StubSocket {
    pub name: String,
    pub processors: Vec<StubProcessor>,
}

/// One enumeration call as seen by the stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumCall {
    pub symbol: &'static str,
    pub null_output: bool,
    pub count_in: u32,
}

#[derive(Debug, Default)]
pub struct StubState {
    pub sockets: Vec<StubSocket>,
    pub failures: HashMap<&'static str, Status>,
    pub calls: HashMap<&'static str, usize>,
    pub enum_calls: Vec<EnumCall>,
    pub init_flags: Option<u64>,
    pub initialized: bool,
}

impl StubState {
    /// One socket with two MI300X-class GPUs.
    pub fn two_gpus() -> Self {
        let gpu = |index: u16| StubProcessor {
            processor_type: 1,
            board: StubBoard {
                model_number: format!("102-G30211-0{index}"),
                product_serial: format!("PCB0{index}4711"),
                fru_id: format!("FRU-{index}"),
                product_name: "AMD Instinct MI300X OAM".to_string(),
                manufacturer_name: "AMD".to_string(),
            },
            gpu_id: 0x74a1,
            uuid: format!("8fff74a1-0000-1000-80a3-9c{index}e6c1d0e3b"),
            vram_total: 196_592,
            vram_used: 283 + index as u32,
            bdf_id: (0x0000u64 << 32) | ((0x05 + index as u64 * 0x20) << 8),
        };

        Self {
            sockets: vec![StubSocket {
                name: "0000:05:00.0".to_string(),
                processors: vec![gpu(0), gpu(1)],
            }],
            ..Default::default()
        }
    }

    pub fn fail(mut self, symbol: &'static str, status: Status) -> Self {
        self.failures.insert(symbol, status);
        self
    }
}

thread_local! {
    static STATE: RefCell<StubState> = RefCell::new(StubState::default());
}

pub fn install(state: StubState) {
    STATE.with(|cell| *cell.borrow_mut() = state);
}

pub fn with_state<R>(f: impl FnOnce(&mut StubState) -> R) -> R {
    STATE.with(|cell| f(&mut cell.borrow_mut()))
}

pub fn calls(symbol: &str) -> usize {
    with_state(|state| state.calls.get(symbol).copied().unwrap_or(0))
}

pub fn total_calls() -> usize {
    with_state(|state| state.calls.values().sum())
}

pub fn enum_calls() -> Vec<EnumCall> {
    with_state(|state| state.enum_calls.clone())
}

fn enter(state: &mut StubState, symbol: &'static str) -> Option<Status> {
    *state.calls.entry(symbol).or_default() += 1;
    state.failures.get(symbol).copied()
}

fn socket_token(socket: usize) -> SocketHandleT {
    ((socket + 1) << 16) as SocketHandleT
}

fn processor_token(socket: usize, processor: usize) -> ProcessorHandleT {
    (((socket + 1) << 16) | (processor + 1)) as ProcessorHandleT
}

fn decode_socket(token: SocketHandleT) -> Option<usize> {
    let value = token as usize;
    (value & 0xffff == 0 && value != 0).then(|| (value >> 16) - 1)
}

fn decode_processor(token: ProcessorHandleT) -> Option<(usize, usize)> {
    let value = token as usize;
    (value >> 16 != 0 && value & 0xffff != 0).then(|| ((value >> 16) - 1, (value & 0xffff) - 1))
}

fn find_processor(state: &StubState, token: ProcessorHandleT) -> Option<&StubProcessor> {
    let (socket, processor) = decode_processor(token)?;
    state.sockets.get(socket)?.processors.get(processor)
}

/// Copies `src` the way the native library does: at most `capacity - 1`
/// bytes followed by a terminator.
pub unsafe fn write_c_str(dst: *mut c_char, capacity: usize, src: &str) {
    if capacity == 0 {
        return;
    }
    let len = src.len().min(capacity - 1);
    for (i, byte) in src.as_bytes()[..len].iter().enumerate() {
        *dst.add(i) = *byte as c_char;
    }
    *dst.add(len) = 0;
}

fn fill(field: &mut [c_char], src: &str) {
    unsafe { write_c_str(field.as_mut_ptr(), field.len(), src) }
}

unsafe fn enumerate<T: Copy>(
    state: &mut StubState,
    symbol: &'static str,
    tokens: Vec<T>,
    count: *mut u32,
    out: *mut T,
) -> Status {
    if count.is_null() {
        return Status::INVAL;
    }
    state.enum_calls.push(EnumCall {
        symbol,
        null_output: out.is_null(),
        count_in: *count,
    });

    if out.is_null() {
        *count = tokens.len() as u32;
        return Status::SUCCESS;
    }

    let written = (*count as usize).min(tokens.len());
    for (i, token) in tokens.into_iter().take(written).enumerate() {
        *out.add(i) = token;
    }
    *count = written as u32;
    Status::SUCCESS
}

unsafe extern "C" fn stub_init(flags: u64) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_init") {
            return status;
        }
        state.init_flags = Some(flags);
        state.initialized = true;
        Status::SUCCESS
    })
}

unsafe extern "C" fn stub_shut_down() -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_shut_down") {
            return status;
        }
        state.initialized = false;
        Status::SUCCESS
    })
}

unsafe extern "C" fn stub_get_socket_handles(
    socket_count: *mut u32,
    socket_handles: *mut SocketHandleT,
) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_get_socket_handles") {
            return status;
        }
        let tokens = (0..state.sockets.len()).map(socket_token).collect();
        enumerate(
            state,
            "amdsmi_get_socket_handles",
            tokens,
            socket_count,
            socket_handles,
        )
    })
}

unsafe extern "C" fn stub_get_socket_info(
    socket_handle: SocketHandleT,
    len: usize,
    name: *mut c_char,
) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_get_socket_info") {
            return status;
        }
        let Some(socket) = decode_socket(socket_handle).and_then(|i| state.sockets.get(i)) else {
            return Status::INVAL;
        };
        write_c_str(name, len, &socket.name);
        Status::SUCCESS
    })
}

unsafe extern "C" fn stub_get_processor_handles(
    socket_handle: SocketHandleT,
    processor_count: *mut u32,
    processor_handles: *mut ProcessorHandleT,
) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_get_processor_handles") {
            return status;
        }
        let Some(socket) = decode_socket(socket_handle) else {
            return Status::INVAL;
        };
        let Some(processors) = state.sockets.get(socket).map(|s| s.processors.len()) else {
            return Status::INVAL;
        };
        let tokens = (0..processors).map(|p| processor_token(socket, p)).collect();
        enumerate(
            state,
            "amdsmi_get_processor_handles",
            tokens,
            processor_count,
            processor_handles,
        )
    })
}

unsafe extern "C" fn stub_get_processor_type(
    processor_handle: ProcessorHandleT,
    processor_type: *mut ProcessorTypeT,
) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_get_processor_type") {
            return status;
        }
        match find_processor(state, processor_handle) {
            Some(processor) => {
                *processor_type = processor.processor_type;
                Status::SUCCESS
            }
            None => Status::INVAL,
        }
    })
}

unsafe extern "C" fn stub_get_gpu_board_info(
    processor_handle: ProcessorHandleT,
    board_info: *mut BoardInfoT,
) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_get_gpu_board_info") {
            return status;
        }
        let Some(processor) = find_processor(state, processor_handle) else {
            return Status::INVAL;
        };
        let info = &mut *board_info;
        fill(&mut info.model_number, &processor.board.model_number);
        fill(&mut info.product_serial, &processor.board.product_serial);
        fill(&mut info.fru_id, &processor.board.fru_id);
        fill(&mut info.product_name, &processor.board.product_name);
        fill(&mut info.manufacturer_name, &processor.board.manufacturer_name);
        Status::SUCCESS
    })
}

unsafe extern "C" fn stub_get_gpu_id(processor_handle: ProcessorHandleT, id: *mut u16) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_get_gpu_id") {
            return status;
        }
        match find_processor(state, processor_handle) {
            Some(processor) => {
                *id = processor.gpu_id;
                Status::SUCCESS
            }
            None => Status::INVAL,
        }
    })
}

unsafe extern "C" fn stub_get_gpu_device_uuid(
    processor_handle: ProcessorHandleT,
    uuid_length: *mut c_uint,
    uuid: *mut c_char,
) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_get_gpu_device_uuid") {
            return status;
        }
        let Some(processor) = find_processor(state, processor_handle) else {
            return Status::INVAL;
        };
        if (*uuid_length as usize) < GPU_UUID_SIZE {
            return Status::INSUFFICIENT_SIZE;
        }
        write_c_str(uuid, *uuid_length as usize, &processor.uuid);
        Status::SUCCESS
    })
}

unsafe extern "C" fn stub_get_gpu_vram_usage(
    processor_handle: ProcessorHandleT,
    vram_info: *mut VramUsageT,
) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_get_gpu_vram_usage") {
            return status;
        }
        match find_processor(state, processor_handle) {
            Some(processor) => {
                (*vram_info).vram_total = processor.vram_total;
                (*vram_info).vram_used = processor.vram_used;
                Status::SUCCESS
            }
            None => Status::INVAL,
        }
    })
}

unsafe extern "C" fn stub_get_gpu_bdf_id(processor_handle: ProcessorHandleT, bdf_id: *mut u64) -> Status {
    with_state(|state| {
        if let Some(status) = enter(state, "amdsmi_get_gpu_bdf_id") {
            return status;
        }
        match find_processor(state, processor_handle) {
            Some(processor) => {
                *bdf_id = processor.bdf_id;
                Status::SUCCESS
            }
            None => Status::INVAL,
        }
    })
}

fn stub_symbols() -> HashMap<&'static str, usize> {
    HashMap::from([
        ("amdsmi_init", stub_init as FnInit as usize),
        ("amdsmi_shut_down", stub_shut_down as FnShutDown as usize),
        (
            "amdsmi_get_socket_handles",
            stub_get_socket_handles as FnGetSocketHandles as usize,
        ),
        (
            "amdsmi_get_socket_info",
            stub_get_socket_info as FnGetSocketInfo as usize,
        ),
        (
            "amdsmi_get_processor_handles",
            stub_get_processor_handles as FnGetProcessorHandles as usize,
        ),
        (
            "amdsmi_get_processor_type",
            stub_get_processor_type as FnGetProcessorType as usize,
        ),
        (
            "amdsmi_get_gpu_board_info",
            stub_get_gpu_board_info as FnGetGpuBoardInfo as usize,
        ),
        ("amdsmi_get_gpu_id", stub_get_gpu_id as FnGetGpuId as usize),
        (
            "amdsmi_get_gpu_device_uuid",
            stub_get_gpu_device_uuid as FnGetGpuDeviceUuid as usize,
        ),
        (
            "amdsmi_get_gpu_vram_usage",
            stub_get_gpu_vram_usage as FnGetGpuVramUsage as usize,
        ),
        (
            "amdsmi_get_gpu_bdf_id",
            stub_get_gpu_bdf_id as FnGetGpuBdfId as usize,
        ),
    ])
}

/// Open/close counters shared between a test and its opener.
#[derive(Debug, Clone, Default)]
pub struct ModuleCounters {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ModuleCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct StubModule {
    symbols: HashMap<&'static str, usize>,
    closed: Arc<AtomicUsize>,
}

impl Module for StubModule {
    fn name(&self) -> &str {
        "libamd_smi_stub.so"
    }

    fn symbol(&self, name: &'static str) -> Result<*const c_void, LoadError> {
        self.symbols
            .get(name)
            .map(|&address| address as *const c_void)
            .ok_or_else(|| LoadError::Symbol {
                symbol: name,
                reason: "undefined symbol".to_string(),
            })
    }
}

impl Drop for StubModule {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Default)]
pub struct StubOpener {
    missing: Vec<&'static str>,
    fail_open: bool,
    counters: ModuleCounters,
}

impl StubOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exports every symbol except `missing`.
    pub fn without(mut self, missing: &[&'static str]) -> Self {
        self.missing.extend_from_slice(missing);
        self
    }

    pub fn unopenable() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn counters(&self) -> ModuleCounters {
        self.counters.clone()
    }
}

impl ModuleOpener for StubOpener {
    fn binding(&self) -> BindingKind {
        BindingKind::Dynamic
    }

    fn open(&self) -> Result<Box<dyn Module>, LoadError> {
        if self.fail_open {
            return Err(LoadError::Open {
                name: "libamd_smi_stub.so".into(),
                reason: "cannot open shared object file: No such file or directory".to_string(),
            });
        }

        let mut symbols = stub_symbols();
        for name in &self.missing {
            symbols.remove(name);
        }

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubModule {
            symbols,
            closed: self.counters.closed.clone(),
        }))
    }
}
