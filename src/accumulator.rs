use crate::core::{ClaudeError, Result};
use crate::types::{ContentBlock, ContentDelta, MessageResponse, StreamEvent};
use log::debug;

/// Folds the events of one streamed response back into a [`MessageResponse`].
///
/// Text deltas are appended to the text block at their index. Deltas for an index
/// that was never started, or for a non-text block, are ignored. A block start
/// must reuse an existing index or append the next one; any other start is ignored.
#[derive(Debug, Default)]
pub struct MessageAccumulator {
    message: Option<MessageResponse>,
    complete: bool,
}

impl MessageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event. An in-stream `error` event is returned as
    /// [`ClaudeError::Stream`].
    pub fn apply(&mut self, event: &StreamEvent) -> Result<()> {
        match event {
            StreamEvent::MessageStart { message } => {
                self.message = Some(message.clone());
                self.complete = false;
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                if let Some(message) = self.message.as_mut() {
                    let len = message.content.len();
                    if *index < len {
                        message.content[*index] = content_block.clone();
                    } else if *index == len {
                        message.content.push(content_block.clone());
                    } else {
                        debug!("[Accumulator] ignoring start of block {index}, have {len}");
                    }
                }
            }
            StreamEvent::ContentBlockDelta {
                index,
                delta: ContentDelta::TextDelta { text },
            } => {
                let block = self
                    .message
                    .as_mut()
                    .and_then(|message| message.content.get_mut(*index));
                match block {
                    Some(ContentBlock::Text { text: current }) => current.push_str(text),
                    _ => debug!("[Accumulator] ignoring text delta for block {index}"),
                }
            }
            StreamEvent::MessageDelta { delta, usage } => {
                if let Some(message) = self.message.as_mut() {
                    if delta.stop_reason.is_some() {
                        message.stop_reason = delta.stop_reason;
                    }
                    if delta.stop_sequence.is_some() {
                        message.stop_sequence.clone_from(&delta.stop_sequence);
                    }
                    if let Some(usage) = usage {
                        message.usage.output_tokens = usage.output_tokens;
                    }
                }
            }
            StreamEvent::MessageStop => self.complete = true,
            StreamEvent::Error { error } => {
                return Err(ClaudeError::Stream {
                    error_type: error.error_type.clone(),
                    message: error.message.clone(),
                });
            }
            StreamEvent::ContentBlockStop { .. }
            | StreamEvent::Ping
            | StreamEvent::UnknownEvent { .. } => {}
        }
        Ok(())
    }

    /// True once `message_stop` has been seen
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// The message assembled so far
    pub const fn message(&self) -> Option<&MessageResponse> {
        self.message.as_ref()
    }

    /// Returns the assembled message, or `None` if no `message_start` arrived.
    pub fn finish(self) -> Option<MessageResponse> {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApiErrorBody, MessageChanges, Role, StopReason, Usage, UsageDelta};
    use serde_json::json;

    fn start() -> StreamEvent {
        StreamEvent::MessageStart {
            message: MessageResponse {
                id: "msg_1".to_string(),
                model: "claude-3-5-sonnet-20241022".to_string(),
                role: Role::Assistant,
                content: vec![],
                stop_reason: None,
                stop_sequence: None,
                usage: Usage {
                    input_tokens: 25,
                    output_tokens: 1,
                },
            },
        }
    }

    fn text_delta(index: usize, text: &str) -> StreamEvent {
        StreamEvent::ContentBlockDelta {
            index,
            delta: ContentDelta::TextDelta {
                text: text.to_string(),
            },
        }
    }

    #[test]
    fn test_accumulates_text_and_tool_blocks() {
        let events = vec![
            start(),
            StreamEvent::ContentBlockStart {
                index: 0,
                content_block: ContentBlock::text(""),
            },
            text_delta(0, "Let me "),
            text_delta(0, "check."),
            StreamEvent::ContentBlockStop { index: 0 },
            StreamEvent::ContentBlockStart {
                index: 1,
                content_block: ContentBlock::tool_use("toolu_1", "get_weather", json!({})),
            },
            text_delta(1, "ignored"),
            StreamEvent::ContentBlockStop { index: 1 },
            StreamEvent::MessageDelta {
                delta: MessageChanges {
                    stop_reason: Some(StopReason::ToolUse),
                    stop_sequence: None,
                },
                usage: Some(UsageDelta { output_tokens: 40 }),
            },
            StreamEvent::MessageStop,
        ];

        let mut acc = MessageAccumulator::new();
        for event in &events {
            acc.apply(event).unwrap();
        }
        assert!(acc.is_complete());

        let message = acc.finish().unwrap();
        assert_eq!(message.text(), "Let me check.");
        assert_eq!(
            message.content[1],
            ContentBlock::tool_use("toolu_1", "get_weather", json!({}))
        );
        assert_eq!(message.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(
            message.usage,
            Usage {
                input_tokens: 25,
                output_tokens: 40
            }
        );
    }

    #[test]
    fn test_events_before_start_are_ignored() {
        let mut acc = MessageAccumulator::new();
        acc.apply(&text_delta(0, "lost")).unwrap();
        acc.apply(&StreamEvent::MessageStop).unwrap();
        assert!(acc.message().is_none());
        assert!(acc.finish().is_none());
    }

    #[test]
    fn test_block_start_past_end_is_ignored() {
        let mut acc = MessageAccumulator::new();
        acc.apply(&start()).unwrap();
        acc.apply(&StreamEvent::ContentBlockStart {
            index: usize::MAX,
            content_block: ContentBlock::text(""),
        })
        .unwrap();
        acc.apply(&StreamEvent::ContentBlockStart {
            index: 2,
            content_block: ContentBlock::text(""),
        })
        .unwrap();
        assert!(acc.message().unwrap().content.is_empty());

        acc.apply(&StreamEvent::ContentBlockStart {
            index: 0,
            content_block: ContentBlock::text(""),
        })
        .unwrap();
        acc.apply(&text_delta(0, "still here")).unwrap();
        assert_eq!(acc.finish().unwrap().text(), "still here");
    }

    #[test]
    fn test_error_event_surfaces() {
        let mut acc = MessageAccumulator::new();
        acc.apply(&start()).unwrap();
        let err = acc
            .apply(&StreamEvent::Error {
                error: ApiErrorBody {
                    error_type: "overloaded_error".to_string(),
                    message: "Overloaded".to_string(),
                },
            })
            .unwrap_err();
        assert_eq!(
            err,
            ClaudeError::Stream {
                error_type: "overloaded_error".to_string(),
                message: "Overloaded".to_string(),
            }
        );
    }
}
