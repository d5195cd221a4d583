use std::collections::BTreeMap;

use influxdb_line_protocol::LineProtocolBuilder;

use super::FieldValue;
use super::InventoryEncoder;

/// InfluxDB line protocol encoder
pub struct InfluxEncoder;

impl InfluxEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl InventoryEncoder for InfluxEncoder {
    fn encode_record(
        &self,
        measurement: &str,
        tags: &BTreeMap<String, String>,
        fields: &BTreeMap<String, FieldValue>,
        timestamp: i64,
    ) -> String {
        let mut builder = LineProtocolBuilder::new().measurement(measurement);

        // Line protocol has no empty tag values; such a tag is left out.
        for (key, value) in tags.iter().filter(|(_, value)| !value.is_empty()) {
            builder = builder.tag(key, value);
        }

        let mut field_entries = fields.iter();
        let Some((first_key, first_value)) = field_entries.next() else {
            tracing::warn!(measurement, "record without fields, skipping");
            return String::new();
        };

        // The first field moves the builder into the after-field state.
        let mut after_first_field = match first_value {
            FieldValue::String(s) => builder.field(first_key, s.as_str()),
            FieldValue::UnsignedInteger(u) => builder.field(first_key, *u),
        };

        for (key, value) in field_entries {
            after_first_field = match value {
                FieldValue::String(s) => after_first_field.field(key, s.as_str()),
                FieldValue::UnsignedInteger(u) => after_first_field.field(key, *u),
            };
        }

        let lp_built = after_first_field.timestamp(timestamp).close_line().build();
        String::from_utf8_lossy(&lp_built).into_owned()
    }
}
