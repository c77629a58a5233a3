//! Lifecycle messages exchanged across the embedding boundary
//!
//! Each message is a JSON object with a `type` field:
//! `{"type":"NPS_WIDGET_RESET"}` (host → frame) and
//! `{"type":"NPS_WIDGET_CLOSE"}` (frame → host).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire name of the reset message
pub const RESET_TYPE: &str = "NPS_WIDGET_RESET";

/// Wire name of the close message
pub const CLOSE_TYPE: &str = "NPS_WIDGET_CLOSE";

/// Messages understood by either side of the boundary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum WidgetMessage {
    /// Host asks the embedded app to drop all local state
    #[serde(rename = "NPS_WIDGET_RESET")]
    Reset,

    /// Embedded app asks the host to close the overlay
    #[serde(rename = "NPS_WIDGET_CLOSE")]
    Close,
}

impl WidgetMessage {
    /// Wire name carried in the `type` field
    pub fn type_name(&self) -> &'static str {
        match self {
            WidgetMessage::Reset => RESET_TYPE,
            WidgetMessage::Close => CLOSE_TYPE,
        }
    }

    /// Encode as the JSON payload posted across the boundary
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "type": self.type_name() })
    }

    /// Decode an arbitrary payload
    ///
    /// Anything that is not an object with a known `type` yields `None`;
    /// extra fields are ignored.
    pub fn from_value(payload: &Value) -> Option<Self> {
        match payload.get("type").and_then(Value::as_str)? {
            RESET_TYPE => Some(WidgetMessage::Reset),
            CLOSE_TYPE => Some(WidgetMessage::Close),
            _ => None,
        }
    }
}

/// A payload together with the origin of the document that posted it
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Serialized origin of the sender, e.g. `https://example.com`
    pub origin: String,
    /// Raw message data; not necessarily one of ours
    pub data: Value,
}

impl Envelope {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_serialize() {
        let json = serde_json::to_string(&WidgetMessage::Reset).unwrap();
        assert_eq!(json, r#"{"type":"NPS_WIDGET_RESET"}"#);
    }

    #[test]
    fn test_close_serialize() {
        let json = serde_json::to_string(&WidgetMessage::Close).unwrap();
        assert_eq!(json, r#"{"type":"NPS_WIDGET_CLOSE"}"#);
    }

    #[test]
    fn test_close_deserialize_ignores_extra_fields() {
        let json = r#"{"type":"NPS_WIDGET_CLOSE","reason":"submitted"}"#;
        let msg: WidgetMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, WidgetMessage::Close);
    }

    #[test]
    fn test_to_value_matches_serde() {
        for msg in [WidgetMessage::Reset, WidgetMessage::Close] {
            assert_eq!(msg.to_value(), serde_json::to_value(msg).unwrap());
        }
    }

    #[test]
    fn test_from_value_rejects_foreign_payloads() {
        let foreign = [
            serde_json::json!("NPS_WIDGET_CLOSE"),
            serde_json::json!(null),
            serde_json::json!(42),
            serde_json::json!({}),
            serde_json::json!({"type": "SOMETHING_ELSE"}),
            serde_json::json!({"type": 7}),
            serde_json::json!(["NPS_WIDGET_RESET"]),
        ];
        for payload in foreign {
            assert_eq!(WidgetMessage::from_value(&payload), None, "payload: {payload}");
        }
    }

    #[test]
    fn test_from_value_accepts_ours() {
        assert_eq!(
            WidgetMessage::from_value(&serde_json::json!({"type": "NPS_WIDGET_RESET"})),
            Some(WidgetMessage::Reset)
        );
        assert_eq!(
            WidgetMessage::from_value(&serde_json::json!({"type": "NPS_WIDGET_CLOSE", "x": 1})),
            Some(WidgetMessage::Close)
        );
    }
}
