//! Settings for every kairos component.
//!
//! One [`Settings`] value is built at startup (defaults, or a TOML file) and
//! handed to the engine, which derives each component's config from it.
//! There is no process-wide settings singleton.
//!
//! ```toml
//! [search]
//! orb_deg = 2.0
//!
//! [cache.tier1]
//! capacity = 512
//!
//! [batch]
//! workers = 4
//! slot_timeout_ms = 2000
//! ```

pub mod error;
pub mod sections;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::ConfigError;
pub use sections::{
    BatchSettings, CacheSettings, EclipseSettings, MemoryTierSettings, SearchSettings,
    TimingTolerances, TtlSettings, ValidationSettings,
};

/// Top-level settings, one section per component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub search: SearchSettings,
    pub eclipse: EclipseSettings,
    pub cache: CacheSettings,
    pub batch: BatchSettings,
    pub validation: ValidationSettings,
}

impl Settings {
    /// Parse and validate settings from TOML text. Missing keys keep defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render the settings back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate().map_err(ConfigError::Invalid)?;
        self.eclipse.validate().map_err(ConfigError::Invalid)?;
        self.cache.validate().map_err(ConfigError::Invalid)?;
        self.batch.validate().map_err(ConfigError::Invalid)?;
        self.validation.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
