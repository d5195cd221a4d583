use std::fmt;

use crate::inventory::Inventory;

/// Human-readable block per socket and processor.
pub struct TextReport<'a>(pub &'a Inventory);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.sockets.is_empty() {
            return writeln!(f, "no sockets found");
        }

        for socket in &self.0.sockets {
            writeln!(f, "socket {}: {}", socket.index, socket.name)?;
            for processor in &socket.processors {
                writeln!(
                    f,
                    "  processor {}: {}",
                    processor.index, processor.processor_type
                )?;
                let Some(gpu) = &processor.gpu else {
                    continue;
                };
                writeln!(f, "    product:      {}", gpu.board.product_name)?;
                writeln!(f, "    manufacturer: {}", gpu.board.manufacturer_name)?;
                writeln!(f, "    model number: {}", gpu.board.model_number)?;
                writeln!(f, "    serial:       {}", gpu.board.product_serial)?;
                writeln!(f, "    FRU id:       {}", gpu.board.fru_id)?;
                writeln!(f, "    GPU id:       {:#06x}", gpu.gpu_id)?;
                if let Some(bdf) = gpu.bdf {
                    writeln!(f, "    BDF:          {bdf}")?;
                }
                writeln!(
                    f,
                    "    VRAM:         {} / {} MB",
                    gpu.vram.used_mb, gpu.vram.total_mb
                )?;
                writeln!(f, "    UUID:         {}", gpu.uuid)?;
            }
        }
        Ok(())
    }
}
