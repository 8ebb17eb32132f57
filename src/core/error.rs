#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaudeError {
    /// Malformed or schema-mismatched JSON in a successful response
    #[error("Failed to decode JSON: {0}")]
    JsonDecode(String),
    /// Non-200 response from the API
    #[error("API error ({status}) {error_type}: {message}")]
    Api {
        status: u16,
        message: String,
        error_type: String,
    },
    /// The request could not be built (e.g. an unparseable base URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// The configured API key is empty
    #[error("API key is missing")]
    MissingApiKey,
    /// Error event delivered inside an otherwise successful stream
    #[error("Stream error {error_type}: {message}")]
    Stream { error_type: String, message: String },
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    /// Failure reported by the HTTP transport
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ClaudeError {
    /// Status code of an API error, if this is one
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClaudeError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonDecode(err.to_string())
    }
}

impl From<std::io::Error> for ClaudeError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::de::Error> for ClaudeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<url::ParseError> for ClaudeError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidRequest(format!("invalid base URL: {err}"))
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for ClaudeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type Result<T, E = ClaudeError> = std::result::Result<T, E>;
