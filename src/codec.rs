use crate::core::{ClaudeError, Result};
use crate::types::{
    ApiErrorBody, ContentBlock, CreateMessageRequest, Message, MessageResponse, Role, StopReason,
    Tool, Usage,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body as sent on the wire. `stream` goes after every request field
/// and only appears when set.
#[derive(Serialize)]
struct WireRequest<'a> {
    #[serde(flatten)]
    request: &'a CreateMessageRequest,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

pub fn encode_message(message: &Message) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

pub fn encode_tool(tool: &Tool) -> Result<String> {
    Ok(serde_json::to_string(tool)?)
}

pub fn encode_content_block(block: &ContentBlock) -> Result<String> {
    Ok(serde_json::to_string(block)?)
}

pub fn encode_create_message_request(request: &CreateMessageRequest) -> Result<String> {
    encode_request_body(request, false)
}

pub(crate) fn encode_request_body(request: &CreateMessageRequest, stream: bool) -> Result<String> {
    Ok(serde_json::to_string(&WireRequest { request, stream })?)
}

/// Decodes any model type from JSON text
pub fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(ClaudeError::from)
}

/// Decodes any model type from an already parsed JSON value
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(ClaudeError::from)
}

/// Decodes a wire role name such as `"assistant"`
pub fn decode_role(name: &str) -> Result<Role> {
    decode_value(Value::String(name.to_string()))
}

/// Decodes a wire stop reason name such as `"end_turn"`
pub fn decode_stop_reason(name: &str) -> Result<StopReason> {
    decode_value(Value::String(name.to_string()))
}

pub fn decode_content_block(text: &str) -> Result<ContentBlock> {
    decode_json(text)
}

pub fn decode_usage(text: &str) -> Result<Usage> {
    decode_json(text)
}

pub fn decode_message(text: &str) -> Result<Message> {
    decode_json(text)
}

pub fn decode_tool(text: &str) -> Result<Tool> {
    decode_json(text)
}

pub fn decode_create_message_request(text: &str) -> Result<CreateMessageRequest> {
    decode_json(text)
}

pub fn decode_message_response(text: &str) -> Result<MessageResponse> {
    decode_json(text)
}

/// Decodes the `{"error": {"type", "message"}}` body of a failed call
pub fn decode_api_error_body(text: &str) -> Result<ApiErrorBody> {
    decode_json::<ErrorEnvelope>(text).map(|envelope| envelope.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::simple_tool;
    use serde_json::json;

    #[test]
    fn test_encode_message_blocks() {
        let message = Message::new(
            Role::User,
            vec![
                ContentBlock::text("look"),
                ContentBlock::image_base64("image/png", "iVBORw0KGgo="),
                ContentBlock::tool_result("toolu_01", "42", false),
                ContentBlock::tool_result("toolu_02", "boom", true),
            ],
        );
        let encoded = encode_message(&message).unwrap();
        assert_eq!(
            encoded,
            concat!(
                r#"{"role":"user","content":["#,
                r#"{"type":"text","text":"look"},"#,
                r#"{"type":"image","source":{"type":"base64","media_type":"image/png","data":"iVBORw0KGgo="}},"#,
                r#"{"type":"tool_result","tool_use_id":"toolu_01","content":"42"},"#,
                r#"{"type":"tool_result","tool_use_id":"toolu_02","content":"boom","is_error":true}"#,
                "]}"
            )
        );
    }

    #[test]
    fn test_encode_tool_use_block() {
        let block = ContentBlock::tool_use("toolu_01", "get_weather", json!({"city": "Oslo"}));
        assert_eq!(
            encode_content_block(&block).unwrap(),
            r#"{"type":"tool_use","id":"toolu_01","name":"get_weather","input":{"city":"Oslo"}}"#
        );
    }

    #[test]
    fn test_encode_request_required_only() {
        let request = CreateMessageRequest::new(
            "claude-3-5-sonnet-20241022",
            1024,
            vec![Message::user("Hi")],
        );
        assert_eq!(
            encode_create_message_request(&request).unwrap(),
            r#"{"model":"claude-3-5-sonnet-20241022","messages":[{"role":"user","content":[{"type":"text","text":"Hi"}]}],"max_tokens":1024}"#
        );
    }

    #[test]
    fn test_encode_request_optional_order() {
        let request = CreateMessageRequest::new("m", 10, vec![])
            .with_tools(vec![Tool::new("t", "d", json!({"type": "object"}))])
            .with_stop_sequences(vec!["STOP".to_string()])
            .with_top_k(3)
            .with_top_p(0.9)
            .with_temperature(0.5)
            .with_system("sys");
        assert_eq!(
            encode_create_message_request(&request).unwrap(),
            concat!(
                r#"{"model":"m","messages":[],"max_tokens":10,"system":"sys","temperature":0.5,"#,
                r#""top_p":0.9,"top_k":3,"stop_sequences":["STOP"],"#,
                r#""tools":[{"name":"t","description":"d","input_schema":{"type":"object"}}]}"#
            )
        );
    }

    #[test]
    fn test_encode_request_stream_flag_goes_last() {
        let request = CreateMessageRequest::new("m", 10, vec![])
            .with_system("sys");
        assert_eq!(
            encode_request_body(&request, true).unwrap(),
            r#"{"model":"m","messages":[],"max_tokens":10,"system":"sys","stream":true}"#
        );
        assert!(!encode_request_body(&request, false)
            .unwrap()
            .contains("stream"));
    }

    #[test]
    fn test_tool_result_is_error_defaults_false() {
        let block = decode_content_block(
            r#"{"type":"tool_result","tool_use_id":"toolu_01","content":"ok"}"#,
        )
        .unwrap();
        assert_eq!(block, ContentBlock::tool_result("toolu_01", "ok", false));
    }

    #[test]
    fn test_tool_use_input_kept_verbatim() {
        let text = r#"{"type":"tool_use","id":"toolu_9","name":"search","input":{"zeta":1,"alpha":[true,null,{"b":2,"a":1}]}}"#;
        let block = decode_content_block(text).unwrap();
        assert_eq!(encode_content_block(&block).unwrap(), text);
    }

    #[test]
    fn test_tool_use_requires_input() {
        let err = decode_content_block(r#"{"type":"tool_use","id":"toolu_9","name":"search"}"#)
            .unwrap_err();
        assert!(matches!(err, ClaudeError::JsonDecode(_)));
    }

    #[test]
    fn test_decode_image_block() {
        let block = decode_content_block(
            r#"{"type":"image","source":{"type":"base64","media_type":"image/jpeg","data":"AAAA"}}"#,
        )
        .unwrap();
        assert_eq!(block, ContentBlock::image_base64("image/jpeg", "AAAA"));
    }

    #[test]
    fn test_unknown_block_type_fails() {
        assert!(decode_content_block(r#"{"type":"thinking","thinking":"hmm"}"#).is_err());
        assert!(decode_content_block(r#"{"text":"no type"}"#).is_err());
        assert!(decode_content_block("not json").is_err());
    }

    #[test]
    fn test_decode_role_and_stop_reason() {
        assert_eq!(decode_role("user").unwrap(), Role::User);
        assert_eq!(decode_role("assistant").unwrap(), Role::Assistant);
        assert!(decode_role("system").is_err());
        assert!(decode_role("User").is_err());

        assert_eq!(decode_stop_reason("end_turn").unwrap(), StopReason::EndTurn);
        assert_eq!(decode_stop_reason("max_tokens").unwrap(), StopReason::MaxTokens);
        assert_eq!(
            decode_stop_reason("stop_sequence").unwrap(),
            StopReason::StopSequence
        );
        assert_eq!(decode_stop_reason("tool_use").unwrap(), StopReason::ToolUse);
        assert!(decode_stop_reason("refusal").is_err());
    }

    #[test]
    fn test_message_response_stop_reason_null_or_absent() {
        let with_null = r#"{"id":"msg_1","type":"message","role":"assistant","content":[],"model":"m","stop_reason":null,"usage":{"input_tokens":1,"output_tokens":0}}"#;
        let absent = r#"{"id":"msg_1","type":"message","role":"assistant","content":[],"model":"m","usage":{"input_tokens":1,"output_tokens":0}}"#;
        assert_eq!(decode_message_response(with_null).unwrap().stop_reason, None);
        assert_eq!(decode_message_response(absent).unwrap().stop_reason, None);
    }

    #[test]
    fn test_message_response_requires_usage() {
        let text = r#"{"id":"msg_1","type":"message","role":"assistant","content":[],"model":"m"}"#;
        assert!(matches!(
            decode_message_response(text),
            Err(ClaudeError::JsonDecode(_))
        ));
    }

    #[test]
    fn test_decode_usage() {
        let usage = decode_usage(
            r#"{"input_tokens":12,"output_tokens":34,"cache_read_input_tokens":0}"#,
        )
        .unwrap();
        assert_eq!(
            usage,
            Usage {
                input_tokens: 12,
                output_tokens: 34
            }
        );
    }

    #[test]
    fn test_decode_api_error_body() {
        let body = decode_api_error_body(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )
        .unwrap();
        assert_eq!(body.error_type, "overloaded_error");
        assert_eq!(body.message, "Overloaded");
        assert!(decode_api_error_body(r#"{"error":"nope"}"#).is_err());
    }

    #[test]
    fn test_tool_roundtrip() {
        let tool = simple_tool("lookup", "Find a record", &[("id", "Record id")]);
        assert_eq!(decode_tool(&encode_tool(&tool).unwrap()).unwrap(), tool);
    }
}
