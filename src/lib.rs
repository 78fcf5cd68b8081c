//! Gerschel portal database MCP server.
//!
//! Speaks Content-Length framed JSON-RPC 2.0 over stdio and exposes a single
//! `query_database` tool that forwards read-only SQL to the portal's query API.

pub mod config;
pub mod mcp;
pub mod services;
