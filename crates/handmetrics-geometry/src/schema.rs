//! JSON Schema for the published [`HandFrame`] contract.
//!
//! Consumers that read frames off the bus or from the CLI's JSON output can
//! validate against this schema instead of hard-coding field names.

use handmetrics_types::{HandFrame, RawFrame};
use schemars::schema_for;

/// JSON Schema of [`HandFrame`].
pub fn hand_frame_schema() -> serde_json::Value {
    serde_json::to_value(schema_for!(HandFrame)).unwrap_or(serde_json::Value::Null)
}

/// JSON Schema of [`RawFrame`], the detector input accepted by the assembler.
pub fn raw_frame_schema() -> serde_json::Value {
    serde_json::to_value(schema_for!(RawFrame)).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_frame_schema_names_record_fields() {
        let schema = hand_frame_schema().to_string();
        assert!(schema.contains("fingerAngles"));
        assert!(schema.contains("fingerPairAngles"));
        assert!(schema.contains("HandFrameRecord"));
    }

    #[test]
    fn raw_frame_schema_names_capture_time() {
        let schema = raw_frame_schema().to_string();
        assert!(schema.contains("capturedAt"));
        assert!(schema.contains("handedness"));
    }
}
