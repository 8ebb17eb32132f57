pub mod message;
pub mod request;
pub mod stream;

pub use message::{ContentBlock, ImageSource, Message, MessageResponse, Role, StopReason, Usage};

pub use request::{simple_tool, CreateMessageRequest, Tool};

pub use stream::{ApiErrorBody, ContentDelta, MessageChanges, StreamEvent, UsageDelta};
