//! Environment-prefixed settings loading for LRS pipeline backends.
//!
//! Every backend reads its options from a namespaced prefix of the form
//! `RALPH_BACKENDS__<FAMILY>__<BACKEND>__<OPTION>`, merged over the
//! backend's built-in defaults.  Nested options use a further `__`
//! separator (`...__CLIENT_OPTIONS__VERIFY_CERTS`).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

mod clickhouse;
mod es;
mod history;
mod ldp;
mod lrs;
mod mongo;
mod s3;

pub use clickhouse::{ClickHouseClientOptions, ClickHouseSettings};
pub use es::{EsClientOptions, EsSettings};
pub use history::HistorySettings;
pub use ldp::LdpSettings;
pub use lrs::{LrsHeaders, LrsSettings};
pub use mongo::MongoSettings;
pub use s3::S3Settings;

/// Errors raised while loading settings from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Extraction or merge failure from the underlying provider.
    #[error("failed to load settings: {0}")]
    Extraction(#[from] figment::Error),
}

/// Load a settings value from `prefix`-namespaced environment variables,
/// merged over the type's defaults.
pub fn from_env<T>(prefix: &str) -> Result<T, ConfigError>
where
    T: Default + Serialize + DeserializeOwned,
{
    let settings = Figment::from(Serialized::defaults(T::default()))
        .merge(Env::prefixed(prefix).split("__"))
        .extract()?;
    Ok(settings)
}

/// Deserialize either a sequence of strings or a single comma-separated
/// string into a `Vec<String>`.
///
/// Environment variables can only carry the comma-separated form.
pub(crate) fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<String>),
        One(String),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(hosts) => hosts,
        OneOrMany::One(joined) => joined.split(',').map(str::to_owned).collect(),
    })
}
