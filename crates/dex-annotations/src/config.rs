//! Decoder configuration (`annotations.toml`)
//!
//! ```toml
//! [annotations]
//! target_sdk_version = 23
//! legacy_visibility_max_sdk = 23
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime-selectable decoder behavior
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationConfig {
    /// SDK level the running application targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sdk_version: Option<u32>,

    /// Highest target SDK for which Runtime searches also accept Build
    /// annotations. Unset disables the compatibility mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_visibility_max_sdk: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    annotations: AnnotationConfig,
}

impl AnnotationConfig {
    /// Parse a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.annotations)
    }

    /// Configuration with legacy Build/Runtime compatibility active for
    /// an application targeting `target_sdk_version`
    pub fn legacy(target_sdk_version: u32, legacy_visibility_max_sdk: u32) -> Self {
        Self {
            target_sdk_version: Some(target_sdk_version),
            legacy_visibility_max_sdk: Some(legacy_visibility_max_sdk),
        }
    }

    /// Whether Runtime searches should also accept Build annotations
    pub fn legacy_visibility_enabled(&self) -> bool {
        match (self.target_sdk_version, self.legacy_visibility_max_sdk) {
            (Some(target), Some(max)) => target <= max,
            _ => false,
        }
    }
}
