use amdsmi::AmdSmiLib;
use amdsmi::Bdf;
use amdsmi::BoardInfo;
use amdsmi::ProcessorHandle;
use amdsmi::ProcessorType;
use amdsmi::VramUsage;
use anyhow::Context;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inventory {
    pub sockets: Vec<SocketReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocketReport {
    pub index: usize,
    pub name: String,
    pub processors: Vec<ProcessorReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessorReport {
    pub index: usize,
    pub processor_type: ProcessorType,
    /// Present only for processors that answer the GPU queries.
    pub gpu: Option<GpuReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuReport {
    pub board: BoardInfo,
    pub gpu_id: u16,
    pub bdf: Option<Bdf>,
    pub vram: VramUsage,
    pub uuid: String,
}

impl Inventory {
    pub fn processor_count(&self) -> usize {
        self.sockets.iter().map(|s| s.processors.len()).sum()
    }
}

/// Walks sockets and processors of an initialized library.
///
/// Stops at the first failing query; the error names the step.
pub fn collect(lib: &AmdSmiLib, socket_name_len: usize) -> Result<Inventory> {
    let sockets = lib.socket_handles().context("failed to enumerate sockets")?;
    tracing::info!(count = sockets.len(), "found sockets");

    let mut reports = Vec::with_capacity(sockets.len());
    for (index, socket) in sockets.iter().enumerate() {
        let name = lib
            .socket_name(socket, socket_name_len)
            .with_context(|| format!("failed to read name of socket {index}"))?;
        tracing::info!(socket = index, name = %name, "socket info");

        let processors = lib
            .processor_handles(socket)
            .with_context(|| format!("failed to enumerate processors of socket {index}"))?;
        tracing::info!(socket = index, count = processors.len(), "found processors");

        let processors = processors
            .iter()
            .enumerate()
            .map(|(proc_index, processor)| {
                collect_processor(lib, processor, proc_index)
                    .with_context(|| format!("socket {index} processor {proc_index}"))
            })
            .collect::<Result<Vec<_>>>()?;

        reports.push(SocketReport {
            index,
            name,
            processors,
        });
    }

    Ok(Inventory { sockets: reports })
}

fn collect_processor(
    lib: &AmdSmiLib,
    processor: &ProcessorHandle<'_>,
    index: usize,
) -> Result<ProcessorReport> {
    let processor_type = lib.processor_type(processor)?;
    tracing::debug!(processor = index, %processor_type, "processor type");

    let gpu = match processor_type {
        ProcessorType::AmdGpu | ProcessorType::AmdApu => Some(collect_gpu(lib, processor)?),
        _ => {
            tracing::debug!(processor = index, "skipping GPU queries");
            None
        }
    };

    Ok(ProcessorReport {
        index,
        processor_type,
        gpu,
    })
}

fn collect_gpu(lib: &AmdSmiLib, processor: &ProcessorHandle<'_>) -> Result<GpuReport> {
    let board = lib.gpu_board_info(processor)?;
    tracing::debug!(
        model_number = %board.model_number,
        product_serial = %board.product_serial,
        fru_id = %board.fru_id,
        product_name = %board.product_name,
        manufacturer_name = %board.manufacturer_name,
        "board info"
    );

    let gpu_id = lib.gpu_id(processor)?;

    let bdf = if lib.has_bdf_id() {
        Some(lib.gpu_bdf_id(processor)?)
    } else {
        None
    };

    let vram = lib.gpu_vram_usage(processor)?;
    tracing::debug!(total_mb = vram.total_mb, used_mb = vram.used_mb, "vram usage");

    let uuid = lib.gpu_uuid(processor)?;
    tracing::info!(uuid = %uuid, gpu_id, "gpu");

    Ok(GpuReport {
        board,
        gpu_id,
        bdf,
        vram,
        uuid,
    })
}
