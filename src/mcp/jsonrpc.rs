//! JSON-RPC 2.0 message types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Incoming JSON-RPC request or notification.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Not validated; hosts are trusted to send "2.0".
    #[serde(default)]
    pub jsonrpc: String,
    /// `Some` whenever the key is present, even as `null`.
    /// Absence is what makes a message a notification.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Keeps an explicit `null` distinct from a missing field.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Outgoing JSON-RPC response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn invalid_request(id: Value) -> Self {
        Self::error(id, INVALID_REQUEST, "Invalid request")
    }

    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(id: Value, message: impl Into<String>) -> Self {
        Self::error(id, INVALID_PARAMS, message)
    }
}

/// Methods the server understands, resolved once per message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Initialized,
    ToolsList,
    ToolsCall,
    Unknown(String),
}

impl From<&str> for Method {
    fn from(method: &str) -> Self {
        match method {
            "initialize" => Method::Initialize,
            "notifications/initialized" => Method::Initialized,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            other => Method::Unknown(other.to_string()),
        }
    }
}
