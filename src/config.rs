//! Optional JSON configuration.
//!
//! ```json
//! {
//!   "matching": { "trim": true, "case_sensitive": true },
//!   "mmi": { "property_name": "MMI", "name_match": "contains", "value": "700" },
//!   "marking": { "extra_properties": { "Laget av": "Skiplum" } }
//! }
//! ```
//!
//! Every field is optional; unknown fields are rejected.

use crate::error::ConfigError;
use crate::model::{MatchOptions, MmiPredicate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub matching: MatchOptions,
    pub mmi: MmiPredicate,
    pub marking: MarkingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkingConfig {
    /// Extra text properties appended to every marking property set.
    pub extra_properties: BTreeMap<String, String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path_ref.to_path_buf(),
            source,
        })
    }
}
