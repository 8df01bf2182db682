//! Log-archive platform (OVH LDP) backend settings.

use serde::{Deserialize, Serialize};

/// LDP data backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdpSettings {
    /// API application key.
    #[serde(default)]
    pub application_key: Option<String>,

    /// API application secret.
    #[serde(default)]
    pub application_secret: Option<String>,

    /// API consumer key.
    #[serde(default)]
    pub consumer_key: Option<String>,

    /// Stream queried when no target is given.
    #[serde(default)]
    pub default_stream_id: Option<String>,

    /// API endpoint base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,

    /// Log-platform account name.
    #[serde(default)]
    pub service_name: Option<String>,

    /// Byte chunk size for streamed archive reads.
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,
}

fn default_endpoint() -> String {
    "https://eu.api.ovh.com/1.0".to_owned()
}

fn default_chunk_size() -> usize {
    4096
}

impl Default for LdpSettings {
    fn default() -> Self {
        Self {
            application_key: None,
            application_secret: None,
            consumer_key: None,
            default_stream_id: None,
            endpoint: default_endpoint(),
            request_timeout: None,
            service_name: None,
            default_chunk_size: default_chunk_size(),
        }
    }
}

impl LdpSettings {
    /// Environment prefix for this backend's options.
    pub const ENV_PREFIX: &'static str = "RALPH_BACKENDS__DATA__LDP__";

    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        crate::from_env(Self::ENV_PREFIX)
    }
}
