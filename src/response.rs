use crate::codec::{decode_api_error_body, decode_message_response};
use crate::core::{ClaudeError, Result};
use crate::types::MessageResponse;
use log::debug;

const STATUS_OK: u16 = 200;
const UNKNOWN_ERROR_TYPE: &str = "unknown";

/// Maps the status and body of a create-message call to its decoded response.
///
/// A 200 body that fails to parse or decode is a [`ClaudeError::JsonDecode`]; any
/// other status becomes a [`ClaudeError::Api`] (see [`parse_error_response`]).
pub fn parse_create_message_response(status: u16, body: &str) -> Result<MessageResponse> {
    if status == STATUS_OK {
        decode_message_response(body)
    } else {
        Err(parse_error_response(status, body))
    }
}

/// Builds the API error for a non-200 response. Bodies that are not a valid error
/// envelope are reported verbatim with the error type `"unknown"`.
pub fn parse_error_response(status: u16, body: &str) -> ClaudeError {
    match decode_api_error_body(body) {
        Ok(error) => ClaudeError::Api {
            status,
            message: error.message,
            error_type: error.error_type,
        },
        Err(e) => {
            debug!("[Response] undecodable error body for status {status}: {e}");
            ClaudeError::Api {
                status,
                message: body.to_string(),
                error_type: UNKNOWN_ERROR_TYPE.to_string(),
            }
        }
    }
}
