//! Dataset generation settings, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BallisticsError, Result};
use crate::model::PhysicsConstants;

/// Settings for one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    pub model: PhysicsConstants,
    pub n: usize,                    // number of samples
    pub root_dir: Option<PathBuf>,   // None keeps the data in memory only
    pub suffix: String,
    pub seed: Option<u64>,           // None draws from OS entropy
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            model: PhysicsConstants::default(),
            n: 10_000,
            root_dir: None,
            suffix: String::new(),
            seed: None,
        }
    }
}

impl DatasetConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        if self.suffix.contains(|c: char| c == '/' || c == '\\') {
            return Err(BallisticsError::config(format!(
                "suffix must not contain path separators: {:?}",
                self.suffix
            )));
        }
        Ok(())
    }
}
