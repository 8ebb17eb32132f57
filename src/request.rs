use crate::codec::encode_request_body;
use crate::core::{ClaudeError, Config, Result};
use crate::types::CreateMessageRequest;
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

const MESSAGES_PATH: &str = "/v1/messages";

pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_API_VERSION: &str = "anthropic-version";
pub const HEADER_ACCEPT: &str = "accept";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transport needs to send one create-message call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestSpec {
    pub method: HttpMethod,
    pub url: Url,
    /// Lower-case header names mapped to their values
    pub headers: BTreeMap<String, String>,
    /// UTF-8 JSON body
    pub body: String,
}

impl HttpRequestSpec {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Builds a non-streaming `POST {base_url}/v1/messages` request
pub fn create_message(config: &Config, request: &CreateMessageRequest) -> Result<HttpRequestSpec> {
    build_request(config, request, false)
}

/// Builds a streaming request: the body carries `"stream":true` and the
/// `accept: text/event-stream` header is added
pub fn create_message_stream(
    config: &Config,
    request: &CreateMessageRequest,
) -> Result<HttpRequestSpec> {
    build_request(config, request, true)
}

fn build_request(
    config: &Config,
    request: &CreateMessageRequest,
    stream: bool,
) -> Result<HttpRequestSpec> {
    if config.api_key.is_empty() {
        return Err(ClaudeError::MissingApiKey);
    }

    let body = encode_request_body(request, stream)?;
    let url = messages_url(&config.base_url)?;
    debug!("[Request] {} {url} (stream: {stream})", HttpMethod::Post);

    let mut headers = BTreeMap::new();
    headers.insert(
        HEADER_CONTENT_TYPE.to_string(),
        "application/json".to_string(),
    );
    headers.insert(HEADER_API_KEY.to_string(), config.api_key.clone());
    headers.insert(HEADER_API_VERSION.to_string(), config.api_version.clone());
    if stream {
        headers.insert(HEADER_ACCEPT.to_string(), "text/event-stream".to_string());
    }

    Ok(HttpRequestSpec {
        method: HttpMethod::Post,
        url,
        headers,
        body,
    })
}

fn messages_url(base_url: &str) -> Result<Url> {
    let url = format!("{}{MESSAGES_PATH}", base_url.trim_end_matches('/'));
    Url::parse(&url).map_err(ClaudeError::from)
}
