use blockstream_types::StreamEvent;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use crate::error::{Result, SessionError};

/// Encode one event as an SSE record: `data: <json>\n\n`
pub fn encode_event(event: &StreamEvent) -> Result<String> {
    Ok(format!("data: {}\n\n", serde_json::to_string(event)?))
}

/// Consumer-side decoder for `data: <json>` records
///
/// Bytes may arrive in arbitrary chunks; a record is decoded once its line
/// is complete. Blank separator lines and non-`data` fields are skipped.
pub struct SseDecoder {
    buffer: VecDeque<u8>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_capacity(4096)
    }
}

impl SseDecoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Decode the next complete record, if one is buffered
    pub fn next_event(&mut self) -> Option<Result<StreamEvent>> {
        loop {
            let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

            let line = match std::str::from_utf8(&line_bytes) {
                Ok(line) => line.trim(),
                Err(e) => {
                    return Some(Err(SessionError::MalformedChunk(format!(
                        "Invalid UTF-8: {}",
                        e
                    ))))
                }
            };

            if let Some(data) = line.strip_prefix("data: ") {
                return Some(serde_json::from_str(data).map_err(SessionError::from));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Decode an SSE byte stream into events, ending after the terminal `end`
pub fn decode_sse_stream<S, B, E>(
    bytes: S,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut decoder = SseDecoder::default();

        'chunks: while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(chunk) => {
                    decoder.extend(chunk.as_ref());

                    while let Some(event_result) = decoder.next_event() {
                        let terminal = matches!(&event_result, Ok(event) if event.is_terminal());
                        yield event_result;
                        if terminal {
                            break 'chunks;
                        }
                    }
                }
                Err(e) => yield Err(SessionError::Upstream(format!("Stream error: {}", e))),
            }
        }
    })
}
