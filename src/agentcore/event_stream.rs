//! Decoder for the AWS binary event stream carried by `InvokeAgent` responses.
//!
//! Each frame has the layout:
//!
//! ```text
//! [total_len:4][headers_len:4][prelude_crc:4][headers...][payload...][message_crc:4]
//! ```
//!
//! Prelude and message CRCs are not verified.

use base64::Engine;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use super::types::{AgentEvent, AgentEventStream, RemoteError, INVOKE_AGENT};

const PRELUDE_LEN: usize = 12;
const MESSAGE_CRC_LEN: usize = 4;
/// Largest message the service may send.
const MAX_MESSAGE_LEN: usize = 16 * 1024 * 1024;

/// A decoded frame. Only string-typed headers are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub headers: Vec<(String, String)>,
    pub payload: Vec<u8>,
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    bytes: Option<String>,
}

#[derive(Deserialize)]
struct ExceptionPayload {
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

impl Frame {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Interpret the frame. Exception and error frames become `Err`.
    pub fn into_event(self) -> Result<AgentEvent, RemoteError> {
        let message_type = self.header(":message-type").unwrap_or("event").to_string();
        match message_type.as_str() {
            "event" => self.into_agent_event(),
            "exception" => {
                let code = self.header(":exception-type").unwrap_or("UnknownException").to_string();
                let message = match serde_json::from_slice::<ExceptionPayload>(&self.payload) {
                    Ok(ExceptionPayload { message: Some(message) }) => message,
                    _ => String::from_utf8_lossy(&self.payload).into_owned(),
                };
                Err(RemoteError::service(INVOKE_AGENT, code, message))
            }
            "error" => {
                let code = self.header(":error-code").unwrap_or("UnknownError");
                let message = self.header(":error-message").unwrap_or_default();
                Err(RemoteError::service(INVOKE_AGENT, code, message))
            }
            other => Err(RemoteError::Protocol(format!("unknown message type `{}`", other))),
        }
    }

    fn into_agent_event(self) -> Result<AgentEvent, RemoteError> {
        let event_type = self.header(":event-type").unwrap_or_default().to_string();
        match event_type.as_str() {
            "chunk" => {
                let chunk: ChunkPayload = serde_json::from_slice(&self.payload)
                    .map_err(|e| RemoteError::Protocol(format!("chunk payload: {}", e)))?;
                let bytes = match chunk.bytes {
                    Some(encoded) => base64::engine::general_purpose::STANDARD
                        .decode(encoded)
                        .map_err(|e| RemoteError::Protocol(format!("chunk base64: {}", e)))?,
                    None => Vec::new(),
                };
                Ok(AgentEvent::Chunk(bytes))
            }
            "trace" => {
                let record = serde_json::from_slice(&self.payload)
                    .map_err(|e| RemoteError::Protocol(format!("trace payload: {}", e)))?;
                Ok(AgentEvent::Trace(record))
            }
            _ => Ok(AgentEvent::Other(event_type)),
        }
    }
}

/// Size in bytes of a header value of the given wire type, excluding any
/// length prefix, or `None` for variable-length types.
fn fixed_value_len(value_type: u8) -> Option<usize> {
    match value_type {
        0 | 1 => Some(0), // bool true / false
        2 => Some(1),     // byte
        3 => Some(2),     // short
        4 => Some(4),     // int
        5 | 8 => Some(8), // long, timestamp
        9 => Some(16),    // uuid
        _ => None,
    }
}

fn parse_headers(mut buf: &[u8]) -> Result<Vec<(String, String)>, RemoteError> {
    let truncated = || RemoteError::Protocol("truncated frame headers".to_string());
    let mut headers = Vec::new();

    while !buf.is_empty() {
        let name_len = buf[0] as usize;
        buf = &buf[1..];
        if buf.len() < name_len + 1 {
            return Err(truncated());
        }
        let name = String::from_utf8_lossy(&buf[..name_len]).into_owned();
        let value_type = buf[name_len];
        buf = &buf[name_len + 1..];

        if let Some(len) = fixed_value_len(value_type) {
            if buf.len() < len {
                return Err(truncated());
            }
            buf = &buf[len..];
            continue;
        }

        // byte array (6) and string (7) carry a 2-byte length prefix
        if value_type != 6 && value_type != 7 {
            return Err(RemoteError::Protocol(format!(
                "unknown header value type {} for `{}`",
                value_type, name
            )));
        }
        if buf.len() < 2 {
            return Err(truncated());
        }
        let value_len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        buf = &buf[2..];
        if buf.len() < value_len {
            return Err(truncated());
        }
        if value_type == 7 {
            let value = String::from_utf8_lossy(&buf[..value_len]).into_owned();
            headers.push((name, value));
        }
        buf = &buf[value_len..];
    }

    Ok(headers)
}

/// Incremental frame decoder; bytes may arrive split at any boundary.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Take the next complete frame, or `None` if more bytes are needed.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, RemoteError> {
        if self.buffer.len() < PRELUDE_LEN {
            return Ok(None);
        }

        let buf = &self.buffer;
        let total_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        let headers_len = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;

        if total_len < PRELUDE_LEN + MESSAGE_CRC_LEN
            || total_len > MAX_MESSAGE_LEN
            || PRELUDE_LEN + headers_len > total_len - MESSAGE_CRC_LEN
        {
            return Err(RemoteError::Protocol(format!(
                "invalid frame lengths (total {}, headers {})",
                total_len, headers_len
            )));
        }
        if buf.len() < total_len {
            return Ok(None);
        }

        let headers_end = PRELUDE_LEN + headers_len;
        let headers = parse_headers(&buf[PRELUDE_LEN..headers_end])?;
        let payload = buf[headers_end..total_len - MESSAGE_CRC_LEN].to_vec();
        self.buffer.drain(..total_len);

        Ok(Some(Frame { headers, payload }))
    }

    /// Fails if the body ended in the middle of a frame.
    pub fn finish(&self) -> Result<(), RemoteError> {
        if self.buffer.is_empty() {
            Ok(())
        } else {
            Err(RemoteError::Protocol(format!(
                "stream ended with {} bytes of an incomplete frame",
                self.buffer.len()
            )))
        }
    }
}

/// Turn a raw response body into a stream of agent events.
pub fn decode_event_stream<S, B>(body: S) -> AgentEventStream
where
    S: Stream<Item = Result<B, RemoteError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    Box::pin(async_stream::try_stream! {
        futures::pin_mut!(body);
        let mut decoder = EventStreamDecoder::new();

        while let Some(bytes) = body.next().await {
            decoder.push(bytes?.as_ref());
            while let Some(frame) = decoder.next_frame()? {
                let event = frame.into_event()?;
                if let AgentEvent::Other(ref kind) = event {
                    debug!("Skipping `{}` event from agent stream", kind);
                }
                yield event;
            }
        }

        decoder.finish()?;
    })
}
