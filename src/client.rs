use crate::core::{ClaudeError, Config, Result};
use crate::eventsource::{EventStream, EventStreamExt};
use crate::request::{self, HttpMethod, HttpRequestSpec};
use crate::response::{parse_create_message_response, parse_error_response};
use crate::types::{CreateMessageRequest, MessageResponse};
use futures::StreamExt;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, StatusCode};

/// Sends built requests with a `reqwest::Client` and decodes the responses.
/// Only available with the `reqwest` feature.
#[derive(Debug, Clone)]
pub struct ClaudeClient {
    config: Config,
    client: Client,
}

impl ClaudeClient {
    pub fn new(config: Config) -> Self {
        Self::with_http_client(config, Client::new())
    }

    /// Uses a caller-configured client (timeouts, proxies, pooling)
    pub const fn with_http_client(config: Config, client: Client) -> Self {
        Self { config, client }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    fn prepare(&self, spec: HttpRequestSpec) -> RequestBuilder {
        let method = match spec.method {
            HttpMethod::Post => Method::POST,
        };
        let mut builder = self.client.request(method, spec.url);
        for (name, value) in &spec.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(spec.body)
    }

    pub async fn create_message(&self, request: &CreateMessageRequest) -> Result<MessageResponse> {
        let spec = request::create_message(&self.config, request)?;
        let response = self.prepare(spec).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("[Client] create_message returned {status}");
        parse_create_message_response(status.as_u16(), &body)
    }

    /// Opens a streaming call. A non-200 status is read in full and returned as
    /// an error before any event is produced.
    pub async fn create_message_stream(
        &self,
        request: &CreateMessageRequest,
    ) -> Result<EventStream<ClaudeError>> {
        let spec = request::create_message_stream(&self.config, request)?;
        let response = self.prepare(spec).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(parse_error_response(status.as_u16(), &body));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClaudeError::from))
            .sse_events())
    }
}
