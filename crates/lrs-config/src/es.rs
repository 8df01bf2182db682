//! Search-cluster (Elasticsearch) backend settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options forwarded to the search-cluster client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EsClientOptions {
    /// Path to a CA certificate bundle.
    #[serde(default)]
    pub ca_certs: Option<PathBuf>,

    /// Whether to verify TLS certificates.
    #[serde(default)]
    pub verify_certs: Option<bool>,
}

/// Elasticsearch data backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsSettings {
    /// Cluster nodes to connect to; accepts a comma-separated string.
    #[serde(default = "default_hosts", deserialize_with = "crate::comma_separated")]
    pub hosts: Vec<String>,

    /// Index queried and written when no target is given.
    #[serde(default = "default_index")]
    pub default_index: String,

    /// Client options.
    #[serde(default)]
    pub client_options: EsClientOptions,

    /// Encoding used when emitting raw output.
    #[serde(default = "super::s3::default_locale_encoding")]
    pub locale_encoding: String,

    /// Batch size for chunked reads and bulk writes.
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    /// Per-request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

fn default_hosts() -> Vec<String> {
    vec!["http://localhost:9200".to_owned()]
}

fn default_index() -> String {
    "statements".to_owned()
}

fn default_chunk_size() -> usize {
    500
}

impl Default for EsSettings {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            default_index: default_index(),
            client_options: EsClientOptions::default(),
            locale_encoding: super::s3::default_locale_encoding(),
            default_chunk_size: default_chunk_size(),
            request_timeout: None,
        }
    }
}

impl EsSettings {
    /// Environment prefix for this backend's options.
    pub const ENV_PREFIX: &'static str = "RALPH_BACKENDS__DATA__ES__";

    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        crate::from_env(Self::ENV_PREFIX)
    }
}
