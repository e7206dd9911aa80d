//! JSON Lines decoding of response bodies.
//!
//! The service answers with one JSON object per line and closes the stream
//! when the turn is over; there is no end-of-message marker:
//! ```text
//! {"result":{"conversation":{"conversationId":"conv_1"}}}
//! {"result":{"response":{"token":"Hello ","responseId":"resp_1"}}}
//! {"result":{"response":{"token":"world","responseId":"resp_1"}}}
//! ```
//!
//! The last line may arrive without a trailing newline.

use crate::event::{ProtocolEvent, classify_line};
use bytes::Bytes;
use futures::{Stream, StreamExt};

/// Incremental line splitter and classifier.
///
/// Bytes that are not yet terminated by `\n` stay in a carry-over buffer
/// until the next chunk. Lines are only decoded once complete, so a
/// multi-byte character split across chunks is handled.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    carry: Vec<u8>,
}

impl StreamDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the events of every line it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ProtocolEvent> {
        self.carry.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.carry[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            push_line(&self.carry[start..end], &mut events);
            start = end + 1;
        }
        self.carry.drain(..start);
        events
    }

    /// Signal end-of-stream and classify whatever is left in the buffer.
    pub fn finish(&mut self) -> Vec<ProtocolEvent> {
        let rest = std::mem::take(&mut self.carry);
        let mut events = Vec::new();
        push_line(&rest, &mut events);
        events
    }

    /// Bytes waiting for a line break.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

fn push_line(line: &[u8], events: &mut Vec<ProtocolEvent>) {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.iter().all(u8::is_ascii_whitespace) {
        return;
    }
    events.extend(classify_line(line));
}

/// Decode a complete, already-buffered body.
pub fn decode_body(body: &[u8]) -> Vec<ProtocolEvent> {
    let mut decoder = StreamDecoder::new();
    let mut events = decoder.feed(body);
    events.extend(decoder.finish());
    events
}

/// Decode an asynchronous byte stream into a stream of events.
///
/// An error from the byte stream is forwarded once and ends the event
/// stream; the partial line in the buffer is discarded in that case.
pub fn decode_stream<S, E>(byte_stream: S) -> impl Stream<Item = Result<ProtocolEvent, E>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Send,
{
    async_stream::stream! {
        let mut decoder = StreamDecoder::new();
        let mut byte_stream = std::pin::pin!(byte_stream);

        while let Some(chunk) = byte_stream.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in decoder.feed(&bytes) {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        for event in decoder.finish() {
            yield Ok(event);
        }
    }
}
