//! Content-Length framing for the MCP stdio transport.
//!
//! Each message on the wire is:
//! ```text
//! Content-Length: <N>\r\n
//! \r\n
//! <N bytes of UTF-8 JSON>
//! ```
//!
//! Input arrives in arbitrary chunks, so [`FrameBuffer`] accumulates bytes
//! and hands back only complete bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

/// Separator between the header section and the body.
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// `Content-Length` anywhere in the header section, any case.
static CONTENT_LENGTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Content-Length:\s*(\d+)").expect("valid Content-Length pattern")
});

/// Serialize `message` and prepend its `Content-Length` header.
///
/// The length is the byte length of the UTF-8 JSON, not its char count.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, serde_json::Error> {
    let body = serde_json::to_vec(message)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());

    let mut frame = Vec::with_capacity(header.len() + body.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Running input buffer that reassembles frames across chunk boundaries.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes held back waiting for more input.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Append `chunk` and extract every frame body that is now complete.
    ///
    /// A header without a usable `Content-Length` is discarded together with
    /// its terminator and scanning resumes after it. An incomplete frame is
    /// left in place, header included, until a later chunk completes it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);

        let mut bodies = Vec::new();
        loop {
            let Some(header_end) = find_terminator(&self.buf) else {
                break;
            };
            let body_start = header_end + HEADER_TERMINATOR.len();

            let Some(length) = parse_content_length(&self.buf[..header_end]) else {
                warn!(
                    "Dropping frame header without a valid Content-Length ({} bytes)",
                    header_end
                );
                self.buf.drain(..body_start);
                continue;
            };

            let Some(body_end) = body_start.checked_add(length) else {
                warn!("Dropping frame header with oversized Content-Length {}", length);
                self.buf.drain(..body_start);
                continue;
            };
            if self.buf.len() < body_end {
                break;
            }

            let body = self.buf[body_start..body_end].to_vec();
            self.buf.drain(..body_end);
            bodies.push(body);
        }
        bodies
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

fn parse_content_length(header: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(header);
    CONTENT_LENGTH_RE
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
