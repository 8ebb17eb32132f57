mod config;
pub mod error;

pub use config::Config;
pub use config::{DEFAULT_API_VERSION, DEFAULT_BASE_URL};
pub use error::{ClaudeError, Result};
