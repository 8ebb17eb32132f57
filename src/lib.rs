pub mod accumulator;
#[cfg(feature = "reqwest")]
pub mod client;
pub mod codec;
pub mod core;
pub mod eventsource;
pub mod request;
pub mod response;
pub mod types;

pub use crate::accumulator::MessageAccumulator;
#[cfg(feature = "reqwest")]
pub use crate::client::ClaudeClient;
pub use crate::core::{ClaudeError, Config};
pub use crate::eventsource::{parse_sse_chunk, EventStreamExt, SseParser};
pub use crate::request::{create_message, create_message_stream, HttpMethod, HttpRequestSpec};
pub use crate::response::{parse_create_message_response, parse_error_response};
pub use crate::types::{
    simple_tool, ApiErrorBody, ContentBlock, ContentDelta, CreateMessageRequest, ImageSource,
    Message, MessageChanges, MessageResponse, Role, StopReason, StreamEvent, Tool, Usage,
    UsageDelta,
};
