//! The single tool this server advertises.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};

pub const QUERY_TOOL_NAME: &str = "query_database";

/// Tool definition as returned by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static QUERY_TOOL: Lazy<ToolDescriptor> = Lazy::new(|| ToolDescriptor {
    name: QUERY_TOOL_NAME,
    description: "Execute a read-only SQL query against the Gerschel portal database. \
                  Returns rows, fields, and execution time. The API blocks write operations \
                  (INSERT, UPDATE, DELETE, DROP, etc.) and enforces a 30-second timeout. \
                  Many table and column names contain spaces; wrap them in double quotes.",
    input_schema: json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The SQL query to execute (read-only)"
            }
        },
        "required": ["query"]
    }),
});

pub fn query_tool() -> &'static ToolDescriptor {
    &QUERY_TOOL
}
