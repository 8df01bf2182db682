//! History journal settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location of the append-only history journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Journal file path.
    #[serde(default = "default_file")]
    pub file: PathBuf,
}

fn default_file() -> PathBuf {
    PathBuf::from("history.jsonl")
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            file: default_file(),
        }
    }
}

impl HistorySettings {
    /// Environment prefix for the journal options.
    pub const ENV_PREFIX: &'static str = "RALPH_HISTORY__";

    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        crate::from_env(Self::ENV_PREFIX)
    }
}
