//! Object-store (S3) backend settings.

use serde::{Deserialize, Serialize};

pub(crate) fn default_locale_encoding() -> String {
    "utf8".to_owned()
}

/// S3 data backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Settings {
    /// Access key id.
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials.
    #[serde(default)]
    pub session_token: Option<String>,

    /// Region of the default bucket.
    #[serde(default)]
    pub default_region: Option<String>,

    /// Bucket used when the target does not name one.
    #[serde(default)]
    pub default_bucket_name: Option<String>,

    /// Custom endpoint URL for S3-compatible stores.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Encoding used when emitting raw output.
    #[serde(default = "default_locale_encoding")]
    pub locale_encoding: String,

    /// Byte chunk size for streamed reads.
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,
}

fn default_chunk_size() -> usize {
    4096
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            default_region: None,
            default_bucket_name: None,
            endpoint_url: None,
            locale_encoding: default_locale_encoding(),
            default_chunk_size: default_chunk_size(),
        }
    }
}

impl S3Settings {
    /// Environment prefix for this backend's options.
    pub const ENV_PREFIX: &'static str = "RALPH_BACKENDS__DATA__S3__";

    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        crate::from_env(Self::ENV_PREFIX)
    }
}
