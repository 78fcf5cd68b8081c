//! MCP (Model Context Protocol) server implementation.
//!
//! Architecture:
//! - `framing.rs`  -- Content-Length frame encoding and incremental decoding
//! - `jsonrpc.rs`  -- JSON-RPC 2.0 request/response types and method routing enum
//! - `server.rs`   -- Dispatcher and the stdio transport loop
//! - `tools.rs`    -- The static `query_database` tool descriptor
//! - `handlers/`   -- Tool result types and the HTTP query collaborator

pub mod framing;
pub mod handlers;
pub mod jsonrpc;
pub mod server;
pub mod tools;
