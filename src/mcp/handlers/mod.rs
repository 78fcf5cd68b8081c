//! Tool handler implementations.
//!
//! - `query` -- `query_database`, backed by the portal's SQL query API

pub mod query;

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Result type returned by tool handlers.
///
/// Matches the MCP protocol's tool result format:
/// ```json
/// {
///   "content": [{ "type": "text", "text": "..." }],
///   "isError": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolResult {
    pub content: Vec<McpContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

/// A single content item in a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum McpContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl McpToolResult {
    /// Create a successful text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Create an error text result.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::Text { text: text.into() }],
            is_error: true,
        }
    }
}

/// Executes the tool for a validated query.
///
/// Failures of any kind come back as an error-tagged result rather than a
/// Rust error; the dispatcher forwards whatever it receives.
pub trait ToolInvoker {
    fn invoke(&self, query: String) -> impl Future<Output = McpToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcp_tool_result_text() {
        let result = McpToolResult::text("hello");
        assert!(!result.is_error);
        assert_eq!(result.content, vec![McpContent::Text { text: "hello".into() }]);
    }

    #[test]
    fn test_mcp_tool_result_error() {
        let result = McpToolResult::error("something failed");
        assert!(result.is_error);
        assert_eq!(result.content.len(), 1);
    }

    #[test]
    fn test_mcp_tool_result_serialize() {
        let json = serde_json::to_value(McpToolResult::error("boom")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"content": [{"type": "text", "text": "boom"}], "isError": true})
        );
    }
}
