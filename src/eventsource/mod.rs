use crate::codec::decode_value;
use crate::core::Result;
use crate::types::{
    ApiErrorBody, ContentBlock, ContentDelta, MessageChanges, MessageResponse, StreamEvent,
    UsageDelta,
};
use async_stream::try_stream;
use futures::{Stream, StreamExt};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::pin::Pin;

const EVENT_DELIMITER: &str = "\n\n";
const EVENT_PREFIX: &str = "event: ";
const DATA_PREFIX: &str = "data: ";
/// Event type assumed when a segment has no `event: ` line. This is a lenient
/// choice of this parser; plain SSE would default to `message`.
pub const DEFAULT_EVENT_TYPE: &str = "message_start";

/// Text delta type inside `content_block_delta` events
const TEXT_DELTA_TYPE: &str = "text_delta";

/// The fields read from one SSE event segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the first `event: ` line, or [`DEFAULT_EVENT_TYPE`]
    pub event_type: String,
    /// Value of the first `data: ` line, if any
    pub data: Option<String>,
}

impl SseFrame {
    /// Reads the event type and data of one segment (without its delimiter).
    pub fn parse(segment: &str) -> Self {
        let mut event_type = None;
        let mut data = None;

        for line in segment.trim().lines() {
            if event_type.is_none() {
                if let Some(value) = line.strip_prefix(EVENT_PREFIX) {
                    event_type = Some(value.to_string());
                    continue;
                }
            }
            if data.is_none() {
                if let Some(value) = line.strip_prefix(DATA_PREFIX) {
                    data = Some(value.to_string());
                }
            }
        }

        Self {
            event_type: event_type.unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            data,
        }
    }

    /// Decodes the frame into a typed event, or `None` when it carries nothing
    /// usable.
    pub fn into_event(self) -> Option<StreamEvent> {
        let Self { event_type, data } = self;

        let Some(data) = data else {
            return (event_type == "ping").then_some(StreamEvent::Ping);
        };

        let value: Value = match serde_json::from_str(&data) {
            Ok(value) => value,
            Err(e) => {
                debug!("[SSE] dropping {event_type} event with invalid JSON: {e}");
                return None;
            }
        };

        match decode_payload(&event_type, &data, value) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("[SSE] dropping undecodable {event_type} event: {e}");
                None
            }
        }
    }
}

#[derive(Deserialize)]
struct MessageStartPayload {
    message: MessageResponse,
}

#[derive(Deserialize)]
struct ContentBlockStartPayload {
    index: usize,
    content_block: ContentBlock,
}

#[derive(Deserialize)]
struct ContentBlockDeltaPayload {
    index: usize,
    delta: Value,
}

#[derive(Deserialize)]
struct ContentBlockStopPayload {
    index: usize,
}

#[derive(Deserialize)]
struct MessageDeltaPayload {
    delta: MessageChanges,
    #[serde(default)]
    usage: Option<UsageDelta>,
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: ApiErrorBody,
}

fn decode_payload(event_type: &str, data: &str, value: Value) -> Result<StreamEvent> {
    let event = match event_type {
        "message_start" => {
            let payload: MessageStartPayload = decode_value(value)?;
            StreamEvent::MessageStart {
                message: payload.message,
            }
        }
        "content_block_start" => {
            let payload: ContentBlockStartPayload = decode_value(value)?;
            StreamEvent::ContentBlockStart {
                index: payload.index,
                content_block: payload.content_block,
            }
        }
        "content_block_delta" => {
            let payload: ContentBlockDeltaPayload = decode_value(value)?;
            let other_kind = payload
                .delta
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|kind| kind != TEXT_DELTA_TYPE);
            // Delta kinds this crate does not model yet stay visible to callers
            if other_kind {
                return Ok(unknown(event_type, data));
            }
            let delta: ContentDelta = decode_value(payload.delta)?;
            StreamEvent::ContentBlockDelta {
                index: payload.index,
                delta,
            }
        }
        "content_block_stop" => {
            let payload: ContentBlockStopPayload = decode_value(value)?;
            StreamEvent::ContentBlockStop {
                index: payload.index,
            }
        }
        "message_delta" => {
            let payload: MessageDeltaPayload = decode_value(value)?;
            StreamEvent::MessageDelta {
                delta: payload.delta,
                usage: payload.usage,
            }
        }
        "message_stop" => StreamEvent::MessageStop,
        "ping" => StreamEvent::Ping,
        "error" => {
            let payload: ErrorPayload = decode_value(value)?;
            StreamEvent::Error {
                error: payload.error,
            }
        }
        _ => unknown(event_type, data),
    };
    Ok(event)
}

fn unknown(event_type: &str, data: &str) -> StreamEvent {
    StreamEvent::UnknownEvent {
        event_type: event_type.to_string(),
        raw_data: data.to_string(),
    }
}

/// Decodes the complete events of a single chunk.
///
/// Events are separated by a blank line. Within an event only the first `event: `
/// line and the first `data: ` line are read. A segment that fails to decode is
/// dropped and the remaining segments are still decoded. Text after the last
/// blank line is an incomplete event and is discarded, not buffered. Use
/// [`SseParser`] when events may span chunk boundaries.
pub fn parse_sse_chunk(chunk: &str) -> Vec<StreamEvent> {
    let mut segments: Vec<&str> = chunk.split(EVENT_DELIMITER).collect();
    segments.pop();
    segments
        .into_iter()
        .filter_map(|segment| SseFrame::parse(segment).into_event())
        .collect()
}

/// Stream-session parser that carries an incomplete trailing event over to the
/// next chunk.
///
/// One parser belongs to one in-flight response.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    /// Bytes of a UTF-8 sequence cut off at the end of the last chunk
    pending: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` to the residual text and decodes every completed event.
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find(EVENT_DELIMITER) {
            let segment: String = self.buffer.drain(..split + EVENT_DELIMITER.len()).collect();
            if let Some(event) = SseFrame::parse(&segment[..split]).into_event() {
                events.push(event);
            }
        }

        events
    }

    /// Like [`feed`](Self::feed) for raw bytes. A multi-byte character split
    /// across chunks is held back until it is complete; invalid bytes are
    /// replaced with U+FFFD.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(bytes);
        let pending = std::mem::take(&mut self.pending);
        let mut text = String::with_capacity(pending.len());
        let mut rest = pending.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        self.feed(&text)
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty() && self.pending.is_empty()
    }

    /// Ends the session, returning any text that never formed a complete event.
    pub fn finish(self) -> Option<String> {
        let mut rest = self.buffer;
        rest.push_str(&String::from_utf8_lossy(&self.pending));
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

pub type EventStream<E> = Pin<Box<dyn Stream<Item = Result<StreamEvent, E>> + Send>>;

/// Extension trait turning a stream of byte chunks into a stream of [`StreamEvent`]s.
pub trait EventStreamExt {
    type Error;

    /// Decodes the chunks with one [`SseParser`]. A chunk error is yielded
    /// and ends the stream.
    fn sse_events(self) -> EventStream<Self::Error>;
}

impl<S, B, E> EventStreamExt for S
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Send + 'static,
{
    type Error = E;

    fn sse_events(self) -> EventStream<E> {
        Box::pin(try_stream! {
            let mut parser = SseParser::new();
            let mut chunks = Box::pin(self);

            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                for event in parser.feed_bytes(chunk.as_ref()) {
                    yield event;
                }
            }

            if let Some(rest) = parser.finish() {
                debug!("[SSE] stream ended with an incomplete event ({} bytes)", rest.len());
            }
        })
    }
}
