//! `[type_annotations]` settings loaded from TOML.

use std::path::Path;

use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::language_level::JavaLanguageLevel;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct TypeAnnotationConfig {
    /// Java feature release the sources are checked against (e.g. 7, 8, 17, 21).
    #[serde(default = "TypeAnnotationConfig::default_release", alias = "source")]
    pub release: u16,

    #[serde(default)]
    pub parallel: ParallelConfig,
}

impl TypeAnnotationConfig {
    fn default_release() -> u16 {
        JavaLanguageLevel::default().major
    }

    pub fn language_level(&self) -> JavaLanguageLevel {
        JavaLanguageLevel::new(self.release)
    }
}

impl Default for TypeAnnotationConfig {
    fn default() -> Self {
        Self {
            release: Self::default_release(),
            parallel: ParallelConfig::default(),
        }
    }
}

/// Checking a compilation unit fans declarations out over a rayon pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct ParallelConfig {
    #[serde(default = "ParallelConfig::default_enabled")]
    pub enabled: bool,

    /// Worker threads for a dedicated pool. When unset, the global rayon pool
    /// is used.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl ParallelConfig {
    fn default_enabled() -> bool {
        true
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            threads: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` would include a source snippet; the message alone is enough.
        ConfigError::Toml(err.message().to_string())
    }
}

/// Non-fatal findings produced while loading a config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys present in the input that the schema doesn't know, as dotted paths
    /// (`parallel.thread`).
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    InvalidValue { toml_path: String, message: String },
}

impl TypeAnnotationConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str_with_diagnostics(&text)
    }

    /// Unknown keys are reported, not rejected, so configs written for newer
    /// versions keep loading.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) = deserialize_toml_with_unknown_keys::<Self>(text)?;
        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.warnings.extend(config.validate());
        Ok((config, diagnostics))
    }

    fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.parallel.threads == Some(0) {
            warnings.push(ConfigWarning::InvalidValue {
                toml_path: "parallel.threads".to_string(),
                message: "must be >= 1; using the global pool instead".to_string(),
            });
        }
        if self.release < 7 {
            warnings.push(ConfigWarning::InvalidValue {
                toml_path: "release".to_string(),
                message: format!("Java {} is older than the oldest supported release (7)", self.release),
            });
        }
        warnings
    }
}

fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(path.to_string().trim_start_matches('.').to_string());
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

/// JSON schema for the `[type_annotations]` table.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(TypeAnnotationConfig)
}
