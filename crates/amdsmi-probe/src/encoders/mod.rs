use std::collections::BTreeMap;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::config::OutputFormat;
use crate::inventory::Inventory;
use crate::inventory::ProcessorReport;
use crate::inventory::SocketReport;

pub mod influx;
pub mod json;
pub mod text;

pub const PROCESSOR_MEASUREMENT: &str = "amdsmi_processor";

/// Represents a field value that can be encoded in a record
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum FieldValue {
    String(String),
    UnsignedInteger(u64),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UnsignedInteger(value)
    }
}

/// Encodes inventory records into a line-oriented output format.
pub trait InventoryEncoder: Send + Sync {
    /// Encode one record with measurement name, tags, fields, and timestamp
    fn encode_record(
        &self,
        measurement: &str,
        tags: &BTreeMap<String, String>,
        fields: &BTreeMap<String, FieldValue>,
        timestamp: i64,
    ) -> String;

    /// Encode one processor of a socket (convenience method)
    fn encode_processor(
        &self,
        socket: &SocketReport,
        processor: &ProcessorReport,
        timestamp: i64,
    ) -> String {
        let mut tags = BTreeMap::new();
        tags.insert("socket".to_string(), socket.name.clone());
        tags.insert("socket_index".to_string(), socket.index.to_string());
        tags.insert(
            "processor_type".to_string(),
            processor.processor_type.to_string(),
        );

        let mut fields = BTreeMap::new();
        fields.insert("index".to_string(), (processor.index as u64).into());

        if let Some(gpu) = &processor.gpu {
            tags.insert("uuid".to_string(), gpu.uuid.clone());
            if let Some(bdf) = gpu.bdf {
                tags.insert("bdf".to_string(), bdf.to_string());
            }

            fields.insert("gpu_id".to_string(), u64::from(gpu.gpu_id).into());
            fields.insert("vram_total_mb".to_string(), u64::from(gpu.vram.total_mb).into());
            fields.insert("vram_used_mb".to_string(), u64::from(gpu.vram.used_mb).into());
            fields.insert("model_number".to_string(), gpu.board.model_number.as_str().into());
            fields.insert(
                "product_serial".to_string(),
                gpu.board.product_serial.as_str().into(),
            );
            fields.insert("fru_id".to_string(), gpu.board.fru_id.as_str().into());
            fields.insert("product_name".to_string(), gpu.board.product_name.as_str().into());
            fields.insert(
                "manufacturer_name".to_string(),
                gpu.board.manufacturer_name.as_str().into(),
            );
        }

        self.encode_record(PROCESSOR_MEASUREMENT, &tags, &fields, timestamp)
    }

    /// One record per processor, in enumeration order.
    fn encode_inventory(&self, inventory: &Inventory, timestamp: i64) -> String {
        inventory
            .sockets
            .iter()
            .flat_map(|socket| {
                socket
                    .processors
                    .iter()
                    .map(move |processor| self.encode_processor(socket, processor, timestamp))
            })
            .collect()
    }
}

/// Factory for the record-oriented formats; `None` for plain text.
pub fn create_encoder(format: OutputFormat) -> Option<Box<dyn InventoryEncoder>> {
    match format {
        OutputFormat::Json => Some(Box::new(json::JsonEncoder::new())),
        OutputFormat::Influx => Some(Box::new(influx::InfluxEncoder::new())),
        OutputFormat::Text => None,
    }
}

/// Renders the whole inventory in `format`.
pub fn render(format: OutputFormat, inventory: &Inventory, timestamp: i64) -> String {
    match create_encoder(format) {
        Some(encoder) => encoder.encode_inventory(inventory, timestamp),
        None => text::TextReport(inventory).to_string(),
    }
}

/// Milliseconds since the Unix epoch.
pub fn current_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
