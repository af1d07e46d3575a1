//! SSE-to-NDJSON stream transcoding.
//!
//! The upstream backend emits OpenAI-style `data: {...}` event lines, but
//! network reads carry no alignment guarantee: a read may end mid-line or
//! mid-JSON. [`DeltaDecoder`] keeps the unterminated tail of each read as
//! carry-over and only decodes complete lines, so split events reassemble
//! exactly once.
//!
//! Cancellation is by drop: when the caller stops polling the transcoded
//! stream and drops it, the upstream body is dropped with it and the
//! connection is released. No trailing error frame is emitted.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::models::DeltaEvent;

/// Literal end-of-stream sentinel line sent by OpenAI-compatible backends.
const DONE_SENTINEL: &str = "data: [DONE]";

#[derive(Debug, Deserialize)]
struct UpstreamChunk {
    #[serde(default)]
    choices: Vec<UpstreamChoice>,
}

#[derive(Debug, Deserialize)]
struct UpstreamChoice {
    #[serde(default)]
    delta: Option<UpstreamDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamDelta {
    #[serde(default)]
    content: Option<String>,

    #[serde(default)]
    reasoning_content: Option<String>,
}

/// Incremental line decoder carrying buffer state between reads.
#[derive(Debug, Default)]
pub struct DeltaDecoder {
    buffer: Vec<u8>,
}

impl DeltaDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read; returns the events decoded from every line
    /// the buffer now completes, in arrival order.
    ///
    /// Decoding is per complete line, so multi-byte characters split across
    /// reads are never torn.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DeltaEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line[..newline]);
            decode_line(line.trim(), &mut events);
        }
        events
    }

    /// Bytes still waiting for a newline.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Decode one complete line into zero, one, or two events.
///
/// Blank lines and the `[DONE]` sentinel are skipped; so is anything that
/// fails to parse as JSON, since one garbled frame must not take down an
/// otherwise-healthy stream.
fn decode_line(line: &str, events: &mut Vec<DeltaEvent>) {
    if line.is_empty() || line == DONE_SENTINEL {
        return;
    }

    let payload = line.strip_prefix("data: ").unwrap_or(line);

    let Ok(chunk) = serde_json::from_str::<UpstreamChunk>(payload) else {
        tracing::trace!("skipping malformed stream line");
        return;
    };

    let Some(delta) = chunk.choices.into_iter().next().and_then(|choice| choice.delta) else {
        return;
    };

    if let Some(reasoning) = delta.reasoning_content.filter(|r| !r.is_empty()) {
        events.push(DeltaEvent::Reasoning(reasoning));
    }
    if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
        events.push(DeltaEvent::Text(content));
    }
}

/// Transcode an upstream byte stream into newline-delimited JSON event
/// lines, one [`DeltaEvent`] per line, emitted as soon as decoded.
///
/// An upstream transport error mid-stream closes the outbound stream
/// without a trailing error frame; whatever was already relayed stands. A
/// final carry-over fragment with no terminating newline is discarded at
/// end of stream.
pub fn transcode<S, E>(upstream: S) -> impl Stream<Item = Result<Bytes, std::convert::Infallible>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    async_stream::stream! {
        futures::pin_mut!(upstream);
        let mut decoder = DeltaDecoder::new();

        while let Some(read) = upstream.next().await {
            let chunk = match read {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::warn!(error = %err, "upstream stream error, closing relay");
                    break;
                }
            };

            for event in decoder.feed(&chunk) {
                yield Ok(Bytes::from(event.to_line()));
            }
        }

        if decoder.pending() > 0 {
            tracing::debug!(bytes = decoder.pending(), "discarding unterminated trailing line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_line(reasoning: Option<&str>, content: Option<&str>) -> String {
        let mut delta = serde_json::Map::new();
        if let Some(r) = reasoning {
            delta.insert("reasoning_content".into(), r.into());
        }
        if let Some(c) = content {
            delta.insert("content".into(), c.into());
        }
        format!(
            "data: {}\n",
            serde_json::json!({"choices": [{"delta": serde_json::Value::Object(delta)}]})
        )
    }

    #[test]
    fn test_single_complete_line() {
        let mut decoder = DeltaDecoder::new();
        let events = decoder.feed(delta_line(None, Some("hello")).as_bytes());
        assert_eq!(events, vec![DeltaEvent::Text("hello".to_string())]);
    }

    #[test]
    fn test_event_split_across_reads_reassembles_once() {
        let line = delta_line(None, Some("hi"));
        let (first, second) = line.split_at(line.len() - 8);

        let mut decoder = DeltaDecoder::new();
        assert!(decoder.feed(first.as_bytes()).is_empty());
        let events = decoder.feed(second.as_bytes());
        assert_eq!(events, vec![DeltaEvent::Text("hi".to_string())]);
    }

    #[test]
    fn test_done_sentinel_and_blank_lines_skipped() {
        let mut decoder = DeltaDecoder::new();
        let events = decoder.feed(b"\n\ndata: [DONE]\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_malformed_line_skipped_stream_continues() {
        let mut decoder = DeltaDecoder::new();
        let input = format!("data: {{not json\n{}", delta_line(None, Some("ok")));
        let events = decoder.feed(input.as_bytes());
        assert_eq!(events, vec![DeltaEvent::Text("ok".to_string())]);
    }

    #[test]
    fn test_reasoning_and_text_from_same_line_keep_order() {
        let mut decoder = DeltaDecoder::new();
        let events = decoder.feed(delta_line(Some("thinking"), Some("answer")).as_bytes());
        assert_eq!(
            events,
            vec![
                DeltaEvent::Reasoning("thinking".to_string()),
                DeltaEvent::Text("answer".to_string())
            ]
        );
    }

    #[test]
    fn test_missing_delta_skipped() {
        let mut decoder = DeltaDecoder::new();
        assert!(decoder.feed(b"data: {\"choices\": [{}]}\n").is_empty());
        assert!(decoder.feed(b"data: {\"choices\": []}\n").is_empty());
    }

    #[test]
    fn test_empty_delta_strings_not_emitted() {
        let mut decoder = DeltaDecoder::new();
        let events = decoder.feed(delta_line(Some(""), Some("")).as_bytes());
        assert!(events.is_empty());
    }

    #[test]
    fn test_line_without_data_prefix_still_parsed() {
        let mut decoder = DeltaDecoder::new();
        let line = delta_line(None, Some("raw"));
        let events = decoder.feed(line.trim_start_matches("data: ").as_bytes());
        assert_eq!(events, vec![DeltaEvent::Text("raw".to_string())]);
    }

    #[test]
    fn test_multibyte_character_split_across_reads() {
        let line = delta_line(None, Some("héllo"));
        let bytes = line.as_bytes();
        let split = line.find('é').unwrap() + 1; // inside the two-byte char

        let mut decoder = DeltaDecoder::new();
        assert!(decoder.feed(&bytes[..split]).is_empty());
        let events = decoder.feed(&bytes[split..]);
        assert_eq!(events, vec![DeltaEvent::Text("héllo".to_string())]);
    }
}
