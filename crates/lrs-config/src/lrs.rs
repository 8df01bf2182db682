//! LRS-over-HTTP client backend settings.

use serde::{Deserialize, Serialize};

/// Headers sent on every LRS request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LrsHeaders {
    /// Value of the `X-Experience-API-Version` header.
    #[serde(default = "default_xapi_version")]
    pub x_experience_api_version: String,

    /// Value of the `Content-Type` header.
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_xapi_version() -> String {
    "1.0.3".to_owned()
}

fn default_content_type() -> String {
    "application/json".to_owned()
}

impl Default for LrsHeaders {
    fn default() -> Self {
        Self {
            x_experience_api_version: default_xapi_version(),
            content_type: default_content_type(),
        }
    }
}

/// LRS HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LrsSettings {
    /// Base URL of the peer LRS.
    #[serde(default = "default_url")]
    pub url: String,

    /// Basic-auth username.
    #[serde(default)]
    pub basic_username: Option<String>,

    /// Basic-auth password.
    #[serde(default)]
    pub basic_password: Option<String>,

    /// Headers applied to every request.
    #[serde(default)]
    pub headers: LrsHeaders,

    /// Health probe path.
    #[serde(default = "default_status_endpoint")]
    pub status_endpoint: String,

    /// Statements resource path.
    #[serde(default = "default_statements_endpoint")]
    pub statements_endpoint: String,

    /// Batch size for chunked POST writes.
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    /// Per-request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

fn default_url() -> String {
    "http://localhost:8100".to_owned()
}

fn default_status_endpoint() -> String {
    "/__heartbeat__".to_owned()
}

fn default_statements_endpoint() -> String {
    "/xAPI/statements".to_owned()
}

fn default_chunk_size() -> usize {
    500
}

impl Default for LrsSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            basic_username: None,
            basic_password: None,
            headers: LrsHeaders::default(),
            status_endpoint: default_status_endpoint(),
            statements_endpoint: default_statements_endpoint(),
            default_chunk_size: default_chunk_size(),
            request_timeout: None,
        }
    }
}

impl LrsSettings {
    /// Environment prefix for this backend's options.
    pub const ENV_PREFIX: &'static str = "RALPH_BACKENDS__HTTP__LRS__";

    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        crate::from_env(Self::ENV_PREFIX)
    }
}
