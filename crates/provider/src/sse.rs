//! Server-sent event decoding for streamed chat completions.
//!
//! The response body is a sequence of newline-delimited frames prefixed
//! `data: `. A literal `[DONE]` frame ends the stream. Every other frame is
//! JSON; malformed frames are logged and skipped, never fatal.

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use qcore::{Delta, Error, Result};
use serde::Deserialize;
use std::fmt::Display;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A non-empty content and/or reasoning increment.
    Delta(Delta),
    /// The `[DONE]` sentinel.
    Done,
}

/// Incremental line decoder.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence, so
/// the decoder buffers raw bytes until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return the events completed by them, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            events.extend(decode_line(&line));
        }
        events
    }

    /// Decode whatever is left after the body ends without a newline.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let line = std::mem::take(&mut self.buf);
        decode_line(&line)
    }
}

/// Turn a raw SSE byte stream into normalized deltas.
///
/// Ends at `[DONE]` or when the body ends. Transport errors end the stream
/// with [`Error::Network`].
pub fn deltas<S, B, E>(bytes: S) -> impl Stream<Item = Result<Delta>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    try_stream! {
        let mut bytes = std::pin::pin!(bytes);
        let mut decoder = SseDecoder::new();
        let mut finished = false;
        'read: while let Some(next) = bytes.next().await {
            let chunk = next.map_err(|e| Error::Network(format!("stream interrupted: {e}")))?;
            for event in decoder.feed(chunk.as_ref()) {
                match event {
                    SseEvent::Delta(delta) => yield delta,
                    SseEvent::Done => {
                        finished = true;
                        break 'read;
                    }
                }
            }
        }
        if !finished {
            if let Some(SseEvent::Delta(delta)) = decoder.finish() {
                yield delta;
            }
        }
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

fn decode_line(line: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(line);
    let data = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    tracing::trace!("chunk: {data}");
    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!("failed to parse chunk: {e}, data: {data}");
            return None;
        }
    };
    let delta = chunk.choices.into_iter().next()?.delta;
    let delta = Delta {
        content: delta.content.unwrap_or_default(),
        reasoning: delta.reasoning_content.unwrap_or_default(),
    };
    (!delta.is_empty()).then_some(SseEvent::Delta(delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str) -> SseEvent {
        SseEvent::Delta(Delta {
            content: text.into(),
            reasoning: String::new(),
        })
    }

    #[test]
    fn frames_split_across_reads() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"choices\":[{\"delta\":").is_empty());
        let events = decoder.feed(b"{\"content\":\"He\"}}]}\n\ndata: [DONE]\n\n");
        assert_eq!(events, vec![content("He"), SseEvent::Done]);
    }

    #[test]
    fn split_utf8_sequence_is_reassembled() {
        let frame = "data: {\"choices\":[{\"delta\":{\"content\":\"你好\"}}]}\n".as_bytes();
        let mut decoder = SseDecoder::new();
        let (head, tail) = frame.split_at(40);
        assert!(decoder.feed(head).is_empty());
        assert_eq!(decoder.feed(tail), vec![content("你好")]);
    }

    #[test]
    fn reasoning_and_non_data_lines() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(
            b": keep-alive\nevent: message\n\
              data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"hmm\"}}]}\r\n\
              data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
        );
        assert_eq!(
            events,
            vec![SseEvent::Delta(Delta {
                content: String::new(),
                reasoning: "hmm".into(),
            })]
        );
    }

    #[test]
    fn unterminated_tail_is_flushed() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}").is_empty());
        assert_eq!(decoder.finish(), Some(content("x")));
        assert_eq!(decoder.finish(), None);
    }
}
