/// Service configuration.
///
/// Loaded from a TOML file (default `wqmon.toml` in the working directory).
/// Every section is optional; a missing file or section means built-in
/// defaults. Secrets such as the narrative API key are never read from this
/// file, only from the environment (optionally populated from `.env`).
///
/// ```toml
/// [engine]
/// weight_constant = 1.0
/// min_aggregate_parameters = 3
///
/// [standards.COD]
/// limit = 25.0
///
/// [narrative]
/// model = "gpt-4o-mini"
/// timeout_secs = 30
/// ```

use crate::analysis::engine::IndexEngine;
use crate::analysis::wqi::{AggregateOptions, DEFAULT_WEIGHT_CONSTANT};
use crate::model::{Parameter, Polarity};
use crate::standards::{StandardOverride, StandardSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "wqmon.toml";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub engine: EngineConfig,
    /// Parameter key → override merged onto the default standard.
    pub standards: BTreeMap<String, StandardEntry>,
    pub narrative: NarrativeConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub weight_constant: f64,
    pub min_aggregate_parameters: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weight_constant: DEFAULT_WEIGHT_CONSTANT,
            min_aggregate_parameters: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandardEntry {
    #[serde(alias = "ideal_value")]
    pub ideal: Option<f64>,
    #[serde(alias = "standard_limit")]
    pub limit: Option<f64>,
    pub polarity: Option<Polarity>,
}

impl From<StandardEntry> for StandardOverride {
    fn from(entry: StandardEntry) -> Self {
        StandardOverride {
            ideal_value: entry.ideal,
            standard_limit: entry.limit,
            polarity: entry.polarity,
        }
    }
}

/// Settings for the language-model narrative endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarrativeConfig {
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API, without the `/v1/...` path.
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the bearer key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            max_tokens: 700,
            temperature: 0.3,
        }
    }
}

impl NarrativeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reads the API key from the configured environment variable.
    /// Blank values count as unset.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown parameter in [standards]: {0}")]
    UnknownParameter(String),

    #[error("standard for {parameter} has no default; ideal, limit and polarity are all required")]
    IncompleteStandard { parameter: Parameter },

    #[error("engine.weight_constant must be a positive number, got {0}")]
    InvalidWeightConstant(f64),

    #[error("engine.min_aggregate_parameters must be at least 1")]
    InvalidMinParameters,

    #[error("narrative.timeout_secs must be at least 1")]
    InvalidTimeout,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parses and validates configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Reads, parses and validates a configuration file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&contents)
}

impl AppConfig {
    /// Checks engine and narrative options and that every standards key
    /// resolves. Degenerate standard values are allowed here: the engine
    /// skips and reports them per sample.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let k = self.engine.weight_constant;
        if !k.is_finite() || k <= 0.0 {
            return Err(ConfigError::InvalidWeightConstant(k));
        }
        if self.engine.min_aggregate_parameters == 0 {
            return Err(ConfigError::InvalidMinParameters);
        }
        if self.narrative.enabled && self.narrative.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        self.standard_set().map(|_| ())
    }

    /// Default standards with the `[standards]` overrides applied.
    pub fn standard_set(&self) -> Result<StandardSet, ConfigError> {
        let mut set = StandardSet::defaults();
        for (key, entry) in &self.standards {
            let parameter = key
                .parse::<Parameter>()
                .map_err(|_| ConfigError::UnknownParameter(key.clone()))?;
            if !set.apply_override(parameter, (*entry).into()) {
                return Err(ConfigError::IncompleteStandard { parameter });
            }
        }
        Ok(set)
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            weight_constant: self.engine.weight_constant,
            min_parameters: self.engine.min_aggregate_parameters,
        }
    }

    pub fn build_engine(&self) -> Result<IndexEngine, ConfigError> {
        Ok(IndexEngine::new(self.standard_set()?, self.aggregate_options()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
