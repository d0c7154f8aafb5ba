/// JSON event codec for the terminal channel
///
/// Client frames look like `{"event": "...", "data": {...}, "ack": 1}`.
/// Server frames are either acknowledgements `{"ack": 1, "data": {...}}` or
/// output events `{"event": "terminal_output_<id>", "data": {"output": "..."}}`.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::service::DEFAULT_SESSION_ID;

pub const CREATE_TERMINAL: &str = "create_terminal";
pub const TERMINAL_INPUT: &str = "terminal_input";
pub const RESIZE_TERMINAL: &str = "resize_terminal";
pub const CLOSE_TERMINAL: &str = "close_terminal";

/// Sent to the requesting client when it addresses a session that does not exist
pub const NOT_FOUND_NOTICE: &str = "Terminal not found. Please create a new terminal.";

const DEFAULT_RESIZE_COLS: u16 = 80;
const DEFAULT_RESIZE_ROWS: u16 = 24;

fn default_terminal_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

fn default_resize_cols() -> u16 {
    DEFAULT_RESIZE_COLS
}

fn default_resize_rows() -> u16 {
    DEFAULT_RESIZE_ROWS
}

/// Name of the output event carrying a session's output
pub fn output_event_name(id: &str) -> String {
    format!("terminal_output_{}", id)
}

/// Raw client frame before its payload is interpreted
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub ack: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateTerminal {
    #[serde(default = "default_terminal_id", alias = "id")]
    pub terminal_id: String,
    #[serde(default)]
    pub cols: Option<u16>,
    #[serde(default)]
    pub rows: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TerminalInput {
    #[serde(default = "default_terminal_id", alias = "id")]
    pub terminal_id: String,
    #[serde(default, alias = "data")]
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResizeTerminal {
    #[serde(default = "default_terminal_id", alias = "id")]
    pub terminal_id: String,
    #[serde(default = "default_resize_cols")]
    pub cols: u16,
    #[serde(default = "default_resize_rows")]
    pub rows: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CloseTerminal {
    #[serde(default = "default_terminal_id", alias = "id")]
    pub terminal_id: String,
}

/// A client request with its payload decoded
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    CreateTerminal(CreateTerminal),
    TerminalInput(TerminalInput),
    ResizeTerminal(ResizeTerminal),
    CloseTerminal(CloseTerminal),
    Unknown(String),
}

impl ClientFrame {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Decode the payload for the named event. A missing or null payload
    /// decodes as an empty object, so every field takes its default.
    pub fn into_event(self) -> serde_json::Result<ClientEvent> {
        let ClientFrame { event, data, .. } = self;
        let data = match data {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        let decoded = match event.as_str() {
            CREATE_TERMINAL => ClientEvent::CreateTerminal(serde_json::from_value(data)?),
            TERMINAL_INPUT => ClientEvent::TerminalInput(serde_json::from_value(data)?),
            RESIZE_TERMINAL => ClientEvent::ResizeTerminal(serde_json::from_value(data)?),
            CLOSE_TERMINAL => ClientEvent::CloseTerminal(serde_json::from_value(data)?),
            _ => ClientEvent::Unknown(event.clone()),
        };
        Ok(decoded)
    }
}

impl ClientEvent {
    /// Decode a payload for a transport that carries the event name
    /// separately, such as Socket.IO.
    pub fn decode(event: &str, data: Value) -> serde_json::Result<Self> {
        ClientFrame {
            event: event.to_string(),
            data,
            ack: None,
        }
        .into_event()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputPayload {
    pub output: String,
}

/// Acknowledgement body for create and close requests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AckPayload {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckPayload {
    pub fn ok() -> Self {
        Self {
            success: true,
            id: None,
            error: None,
        }
    }

    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::ok()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error.into()),
        }
    }
}

/// Frame sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Ack { ack: u64, data: AckPayload },
    Event { event: String, data: OutputPayload },
}

impl ServerFrame {
    pub fn ack(ack: u64, data: AckPayload) -> Self {
        ServerFrame::Ack { ack, data }
    }

    pub fn output(id: &str, output: impl Into<String>) -> Self {
        ServerFrame::Event {
            event: output_event_name(id),
            data: OutputPayload {
                output: output.into(),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(text: &str) -> ClientEvent {
        ClientFrame::parse(text).unwrap().into_event().unwrap()
    }

    #[test]
    fn test_create_with_geometry() {
        let parsed = event(r#"{"event":"create_terminal","data":{"terminal_id":"t1","cols":120,"rows":40},"ack":3}"#);
        assert_eq!(
            parsed,
            ClientEvent::CreateTerminal(CreateTerminal {
                terminal_id: "t1".to_string(),
                cols: Some(120),
                rows: Some(40),
            })
        );
    }

    #[test]
    fn test_missing_or_null_data_uses_defaults() {
        let parsed = event(r#"{"event":"create_terminal"}"#);
        assert_eq!(
            parsed,
            ClientEvent::CreateTerminal(CreateTerminal {
                terminal_id: "default".to_string(),
                cols: None,
                rows: None,
            })
        );

        let parsed = event(r#"{"event":"resize_terminal","data":null}"#);
        assert_eq!(
            parsed,
            ClientEvent::ResizeTerminal(ResizeTerminal {
                terminal_id: "default".to_string(),
                cols: 80,
                rows: 24,
            })
        );
    }

    #[test]
    fn test_field_aliases() {
        let parsed = event(r#"{"event":"terminal_input","data":{"id":"t2","data":"ls\n"}}"#);
        assert_eq!(
            parsed,
            ClientEvent::TerminalInput(TerminalInput {
                terminal_id: "t2".to_string(),
                input: "ls\n".to_string(),
            })
        );

        let parsed = event(r#"{"event":"close_terminal","data":{"id":"t2"}}"#);
        assert_eq!(
            parsed,
            ClientEvent::CloseTerminal(CloseTerminal {
                terminal_id: "t2".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_event_is_kept() {
        assert_eq!(
            event(r#"{"event":"list_terminals","data":{}}"#),
            ClientEvent::Unknown("list_terminals".to_string())
        );
    }

    #[test]
    fn test_bad_payload_is_an_error() {
        let frame = ClientFrame::parse(r#"{"event":"resize_terminal","data":{"cols":"wide"},"ack":9}"#).unwrap();
        assert_eq!(frame.ack, Some(9));
        assert!(frame.into_event().is_err());

        assert!(ClientFrame::parse(r#"{"data":{}}"#).is_err());
    }

    #[test]
    fn test_decode_named_payload() {
        let parsed = ClientEvent::decode("resize_terminal", json!({"terminal_id": "t3", "cols": 132})).unwrap();
        assert_eq!(
            parsed,
            ClientEvent::ResizeTerminal(ResizeTerminal {
                terminal_id: "t3".to_string(),
                cols: 132,
                rows: 24,
            })
        );
        assert!(ClientEvent::decode("close_terminal", json!({"terminal_id": 5})).is_err());
    }

    #[test]
    fn test_ack_frames_serialize() {
        let created = ServerFrame::ack(1, AckPayload::created("t1"));
        assert_eq!(
            serde_json::to_value(&created).unwrap(),
            json!({"ack": 1, "data": {"success": true, "id": "t1"}})
        );

        let closed = ServerFrame::ack(2, AckPayload::ok());
        assert_eq!(
            serde_json::to_value(&closed).unwrap(),
            json!({"ack": 2, "data": {"success": true}})
        );

        let failed = ServerFrame::ack(3, AckPayload::failed("Terminal not found"));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"ack": 3, "data": {"success": false, "error": "Terminal not found"}})
        );
    }

    #[test]
    fn test_output_frame_serializes() {
        let frame = ServerFrame::output("t1", "hi\r\n");
        assert_eq!(
            frame.to_json().unwrap(),
            r#"{"event":"terminal_output_t1","data":{"output":"hi\r\n"}}"#
        );
    }
}
