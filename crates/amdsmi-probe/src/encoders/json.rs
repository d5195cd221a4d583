use std::collections::BTreeMap;

use serde_json::json;

use super::FieldValue;
use super::InventoryEncoder;

/// JSON encoder, one object per line
pub struct JsonEncoder;

impl JsonEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl InventoryEncoder for JsonEncoder {
    fn encode_record(
        &self,
        measurement: &str,
        tags: &BTreeMap<String, String>,
        fields: &BTreeMap<String, FieldValue>,
        timestamp: i64,
    ) -> String {
        let json_fields: serde_json::Map<String, serde_json::Value> = fields
            .iter()
            .map(|(k, v)| {
                let json_value = match v {
                    FieldValue::String(s) => serde_json::Value::String(s.clone()),
                    FieldValue::UnsignedInteger(u) => serde_json::Value::from(*u),
                };
                (k.clone(), json_value)
            })
            .collect();

        let record = json!({
            "measure": measurement,
            "ts": timestamp,
            "tag": tags,
            "field": json_fields,
        });
        record.to_string() + "\n"
    }
}
