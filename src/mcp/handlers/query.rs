//! `query_database` handler.
//!
//! Forwards a SQL string to the portal's query API:
//! - Bearer token read from `~/.gerschel/db-api-token` on every call
//! - `POST {apiUrl}` with body `{"query": "..."}`
//! - Response JSON is returned pretty-printed as a single text block
//!
//! The API itself rejects write statements and enforces its own 30s limit.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::{McpToolResult, ToolInvoker};
use crate::config::ServerConfig;

/// Why a query could not produce rows.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(
        "API key not found. Please:\n1. Go to {api_keys_url} and generate a key\n2. Save it to {}",
        .token_path.display()
    )]
    MissingToken {
        api_keys_url: String,
        token_path: PathBuf,
    },
    #[error("Failed to read API key from {}: {source}", .path.display())]
    Token {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP {status}: {reason}\n{detail}")]
    Http {
        status: u16,
        reason: String,
        detail: String,
    },
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// HTTP-backed tool collaborator.
pub struct HttpQueryTool {
    client: reqwest::Client,
    api_url: String,
    api_keys_url: String,
    token_path: PathBuf,
}

impl HttpQueryTool {
    pub fn new(config: &ServerConfig) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(QueryError::Client)?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_keys_url: config.api_keys_url.clone(),
            token_path: config.token_path.clone(),
        })
    }

    async fn read_token(&self) -> Result<String, QueryError> {
        let missing = || QueryError::MissingToken {
            api_keys_url: self.api_keys_url.clone(),
            token_path: self.token_path.clone(),
        };

        match tokio::fs::read_to_string(&self.token_path).await {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Err(missing())
                } else {
                    Ok(token.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(missing()),
            Err(source) => Err(QueryError::Token {
                path: self.token_path.clone(),
                source,
            }),
        }
    }

    async fn execute_query(&self, query: &str) -> Result<Value, QueryError> {
        let token = self.read_token().await?;

        debug!(url = %self.api_url, "Sending query ({} bytes)", query.len());
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&token)
            .json(&json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Error bodies are usually `{"data": ...}` but may not be JSON at all.
            let body: Option<Value> = response.json().await.ok();
            let detail = match body {
                Some(body) => match body.get("data") {
                    Some(data) if is_truthy(data) => data.clone(),
                    _ => body,
                },
                None => Value::Null,
            };
            return Err(QueryError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                detail: to_pretty(&detail),
            });
        }

        Ok(response.json().await?)
    }
}

impl ToolInvoker for HttpQueryTool {
    async fn invoke(&self, query: String) -> McpToolResult {
        match self.execute_query(&query).await {
            Ok(data) => McpToolResult::text(to_pretty(&data)),
            Err(e) => {
                warn!("[query_database] {}", e);
                McpToolResult::error(e.to_string())
            }
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::framing::FrameBuffer;
    use crate::mcp::handlers::McpContent;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn temp_token(contents: Option<&str>) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gerschel-token-{}", uuid::Uuid::new_v4()));
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        path
    }

    fn tool(api_url: String, token_path: PathBuf) -> HttpQueryTool {
        let config = ServerConfig {
            api_url,
            token_path,
            request_timeout_secs: 5,
            ..ServerConfig::default()
        };
        HttpQueryTool::new(&config).unwrap()
    }

    fn text_of(result: &McpToolResult) -> &str {
        match &result.content[0] {
            McpContent::Text { text } => text,
        }
    }

    /// Serve one HTTP response and hand back the raw request bytes.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/sql-query", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            // HTTP request headers carry content-length, so the frame
            // buffer can tell when the body has fully arrived.
            let mut frames = FrameBuffer::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending the body");
                raw.extend_from_slice(&chunk[..n]);
                if !frames.feed(&chunk[..n]).is_empty() {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (url, handle)
    }

    #[tokio::test]
    async fn test_missing_token_file() {
        let token_path = temp_token(None);
        let result = tool("http://127.0.0.1:9/unused".into(), token_path.clone())
            .invoke("SELECT 1".into())
            .await;

        assert!(result.is_error);
        let text = text_of(&result);
        assert!(text.starts_with("API key not found. Please:\n1. Go to https://portal.gerschellaw.com/tools/api-keys"));
        assert!(text.contains(&token_path.display().to_string()));
    }

    #[tokio::test]
    async fn test_blank_token_counts_as_missing() {
        let token_path = temp_token(Some("  \n"));
        let result = tool("http://127.0.0.1:9/unused".into(), token_path.clone())
            .invoke("SELECT 1".into())
            .await;

        assert!(result.is_error);
        assert!(text_of(&result).starts_with("API key not found"));
        let _ = std::fs::remove_file(token_path);
    }

    #[tokio::test]
    async fn test_successful_query() {
        let token_path = temp_token(Some("  secret-token\n"));
        let (url, server) = serve_once("200 OK", r#"{"rows":[{"id":1}],"fields":["id"],"executionTime":3}"#).await;

        let result = tool(url, token_path.clone()).invoke("SELECT 1".into()).await;
        let request = server.await.unwrap().to_lowercase();

        assert!(!result.is_error);
        let expected = to_pretty(&json!({"rows": [{"id": 1}], "fields": ["id"], "executionTime": 3}));
        assert_eq!(text_of(&result), expected);
        assert!(request.starts_with("post /api/sql-query"));
        assert!(request.contains("authorization: bearer secret-token"));
        assert!(request.ends_with(r#"{"query":"select 1"}"#));
        let _ = std::fs::remove_file(token_path);
    }

    #[tokio::test]
    async fn test_http_error_prefers_data_field() {
        let token_path = temp_token(Some("tok"));
        let (url, server) = serve_once(
            "400 Bad Request",
            r#"{"success":false,"data":{"message":"Write operations are not allowed"}}"#,
        )
        .await;

        let result = tool(url, token_path.clone()).invoke("DROP TABLE x".into()).await;
        server.await.unwrap();

        assert!(result.is_error);
        assert_eq!(
            text_of(&result),
            "HTTP 400: Bad Request\n{\n  \"message\": \"Write operations are not allowed\"\n}"
        );
        let _ = std::fs::remove_file(token_path);
    }

    #[tokio::test]
    async fn test_http_error_with_non_json_body() {
        let token_path = temp_token(Some("tok"));
        let (url, server) = serve_once("500 Internal Server Error", "upstream exploded").await;

        let result = tool(url, token_path.clone()).invoke("SELECT 1".into()).await;
        server.await.unwrap();

        assert!(result.is_error);
        assert_eq!(text_of(&result), "HTTP 500: Internal Server Error\nnull");
        let _ = std::fs::remove_file(token_path);
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let token_path = temp_token(Some("tok"));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/sql-query", listener.local_addr().unwrap());
        drop(listener);

        let result = tool(url, token_path.clone()).invoke("SELECT 1".into()).await;

        assert!(result.is_error);
        assert!(text_of(&result).starts_with("Request failed: "));
        let _ = std::fs::remove_file(token_path);
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!("x")));
    }
}
