//! Watch configuration.
//!
//! Which module/offset chains locate the two anchor tables, and which key
//! paths name the watched values. The numeric offsets are specific to one
//! build of the target runtime and must be re-derived out of band whenever
//! that build changes; no version detection happens here.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::info;

use crate::error::{Error, Result};

/// Root table a key path starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnchorKind {
    /// The runtime's registry table (where `_LOADED` lives).
    Registry,
    /// The globals table of the main thread.
    Globals,
}

/// How a watched value slot is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    /// 8-byte double in the value cell.
    Number,
    /// Tag word of the value cell, decoded against the true/false patterns.
    Boolean,
}

/// Module-relative dereference chain locating an anchor table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerPath {
    pub module: String,
    pub offsets: Vec<u32>,
}

/// One named value to watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueSpec {
    pub name: String,
    pub anchor: AnchorKind,
    pub path: Vec<String>,
    pub kind: ValueKind,
}

/// Full watch configuration: both anchors plus the value list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    pub registry: PointerPath,
    pub globals: PointerPath,
    pub values: Vec<ValueSpec>,
}

impl WatchConfig {
    /// Load and validate a config from a JSON file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: WatchConfig = serde_json::from_str(&content)?;
        config.validate().map_err(Error::InvalidConfig)?;
        info!(
            values = config.values.len(),
            "loaded watch config from {}",
            path.as_ref().display()
        );
        Ok(config)
    }

    /// Save the config as pretty-printed JSON.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Structural sanity check. The offsets themselves cannot be verified
    /// here; wrong offsets surface as a feed that never resolves.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.registry.module.is_empty() || self.globals.module.is_empty() {
            return Err("anchor module name is empty".to_string());
        }
        if self.values.is_empty() {
            return Err("no values to watch".to_string());
        }
        for value in &self.values {
            if value.name.is_empty() {
                return Err("value with an empty name".to_string());
            }
            if value.path.is_empty() {
                return Err(format!("value '{}' has an empty key path", value.name));
            }
        }
        Ok(())
    }
}
