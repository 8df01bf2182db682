//! Column-store (ClickHouse) backend settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options forwarded to the ClickHouse HTTP interface on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickHouseClientOptions {
    /// Timestamp parsing mode applied server-side on insertion.
    #[serde(default = "default_date_time_input_format")]
    pub date_time_input_format: String,

    /// Enables the experimental `JSON`/object column type.
    #[serde(default = "default_allow_experimental_object_type")]
    pub allow_experimental_object_type: u8,

    /// Free-form extra settings passed through verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

fn default_date_time_input_format() -> String {
    "best_effort".to_owned()
}

fn default_allow_experimental_object_type() -> u8 {
    1
}

impl Default for ClickHouseClientOptions {
    fn default() -> Self {
        Self {
            date_time_input_format: default_date_time_input_format(),
            allow_experimental_object_type: default_allow_experimental_object_type(),
            extra: BTreeMap::new(),
        }
    }
}

/// ClickHouse data backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickHouseSettings {
    /// Server host to connect to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP interface port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database holding the event table.
    #[serde(default = "default_database")]
    pub database: String,

    /// Table where events live.
    #[serde(default = "default_event_table_name")]
    pub event_table_name: String,

    /// Username to connect as; the server default user when unset.
    #[serde(default)]
    pub username: Option<String>,

    /// Password for `username`.
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request driver options.
    #[serde(default)]
    pub client_options: ClickHouseClientOptions,

    /// Encoding used when emitting raw output.
    #[serde(default = "super::s3::default_locale_encoding")]
    pub locale_encoding: String,

    /// Batch size for chunked writes and bounded reads.
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    /// Per-request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_owned()
}

fn default_port() -> u16 {
    8123
}

fn default_database() -> String {
    "xapi".to_owned()
}

fn default_event_table_name() -> String {
    "xapi_events_all".to_owned()
}

fn default_chunk_size() -> usize {
    500
}

impl Default for ClickHouseSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            event_table_name: default_event_table_name(),
            username: None,
            password: None,
            client_options: ClickHouseClientOptions::default(),
            locale_encoding: super::s3::default_locale_encoding(),
            default_chunk_size: default_chunk_size(),
            request_timeout: None,
        }
    }
}

impl ClickHouseSettings {
    /// Environment prefix for this backend's options.
    pub const ENV_PREFIX: &'static str = "RALPH_BACKENDS__DATA__CLICKHOUSE__";

    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        crate::from_env(Self::ENV_PREFIX)
    }
}
