//! Document-store (MongoDB) backend settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// MongoDB data backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoSettings {
    /// Connection URI.
    #[serde(default = "default_connection_uri")]
    pub connection_uri: String,

    /// Database to connect to.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding statements.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Free-form driver options appended to the connection URI.
    #[serde(default)]
    pub client_options: BTreeMap<String, String>,

    /// Encoding used when emitting raw output.
    #[serde(default = "super::s3::default_locale_encoding")]
    pub locale_encoding: String,

    /// Batch size for chunked reads and bulk inserts.
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    /// Per-request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

fn default_connection_uri() -> String {
    "mongodb://localhost:27017/".to_owned()
}

fn default_database() -> String {
    "statements".to_owned()
}

fn default_collection() -> String {
    "marsha".to_owned()
}

fn default_chunk_size() -> usize {
    500
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self {
            connection_uri: default_connection_uri(),
            database: default_database(),
            collection: default_collection(),
            client_options: BTreeMap::new(),
            locale_encoding: super::s3::default_locale_encoding(),
            default_chunk_size: default_chunk_size(),
            request_timeout: None,
        }
    }
}

impl MongoSettings {
    /// Environment prefix for this backend's options.
    pub const ENV_PREFIX: &'static str = "RALPH_BACKENDS__DATA__MONGO__";

    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        crate::from_env(Self::ENV_PREFIX)
    }
}
