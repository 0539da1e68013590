//! Configuration for the simulator.
//!
//! Every constant the engine depends on comes from `.cwsim/cwsim.toml`, with
//! built-in defaults for anything missing. Settings are layered
//! (file → environment → CLI) and then frozen into an [`EngineConfig`].
//!
//! # Configuration File Format
//!
//! ```toml
//! [estimator]
//! chars_per_token = 4
//!
//! [thresholds]
//! medium = 60.0
//! high = 85.0
//! critical = 100.0
//!
//! [defaults]
//! system_prompt = "You are a helpful AI assistant."
//! model = "gpt-3.5-turbo"
//!
//! [[models]]
//! id = "gpt-3.5-turbo"
//! name = "GPT-3.5"
//! context_window = 4096
//! description = "Standard context window (4K tokens)"
//! color = "blue"
//! provider = "OpenAI"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::capacity::CapacityThresholds;
use crate::errors::ConfigError;
use crate::model::{DEFAULT_MODEL_ID, ModelConfig, builtin_models};
use crate::state::{DEFAULT_SYSTEM_PROMPT, EngineConfig};
use crate::tokens::DEFAULT_CHARS_PER_TOKEN;

/// Directory holding the config file, relative to the project directory.
pub const CONFIG_DIR: &str = ".cwsim";

pub const CONFIG_FILE: &str = "cwsim.toml";

/// Environment variable that overrides `[defaults] model`.
pub const MODEL_ENV_VAR: &str = "CWSIM_MODEL";

/// Token estimation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorSection {
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

fn default_chars_per_token() -> usize {
    DEFAULT_CHARS_PER_TOKEN
}

impl Default for EstimatorSection {
    fn default() -> Self {
        Self {
            chars_per_token: default_chars_per_token(),
        }
    }
}

/// Session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsSection {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            model: default_model(),
        }
    }
}

/// The complete cwsim.toml structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimToml {
    #[serde(default)]
    pub estimator: EstimatorSection,
    #[serde(default)]
    pub thresholds: CapacityThresholds,
    #[serde(default)]
    pub defaults: DefaultsSection,
    /// Model catalog. Omitting it keeps the built-in catalog.
    #[serde(default = "builtin_models")]
    pub models: Vec<ModelConfig>,
}

impl Default for SimToml {
    fn default() -> Self {
        Self {
            estimator: EstimatorSection::default(),
            thresholds: CapacityThresholds::default(),
            defaults: DefaultsSection::default(),
            models: builtin_models(),
        }
    }
}

impl SimToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse cwsim.toml")
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize cwsim.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.estimator.chars_per_token == 0 {
            warnings.push("estimator.chars_per_token must be at least 1".to_string());
        }

        let t = &self.thresholds;
        if !t.is_ascending() {
            warnings.push(format!(
                "Thresholds must ascend from 0: medium {} <= high {} <= critical {}",
                t.medium, t.high, t.critical
            ));
        }

        if self.models.is_empty() {
            warnings.push("No models configured".to_string());
        }

        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.id.to_ascii_lowercase()) {
                warnings.push(format!("Model '{}' is listed more than once", model.id));
            }
            if model.context_window == 0 {
                warnings.push(format!("Model '{}' has a zero context window", model.id));
            }
        }

        if !self
            .models
            .iter()
            .any(|m| m.id.eq_ignore_ascii_case(&self.defaults.model))
        {
            warnings.push(format!(
                "Default model '{}' is not in the catalog",
                self.defaults.model
            ));
        }

        if self.defaults.system_prompt.trim().is_empty() {
            warnings.push("Default system prompt is empty".to_string());
        }

        warnings
    }

    /// Freeze into an engine configuration starting on `model_id`.
    pub fn to_engine_config(&self, model_id: &str) -> Result<EngineConfig, ConfigError> {
        EngineConfig::new(
            self.estimator.chars_per_token,
            self.thresholds,
            self.defaults.system_prompt.clone(),
            self.models.clone(),
            model_id,
        )
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Resolved configuration combining the file, the environment and CLI flags.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub source: ConfigSource,
    pub toml: SimToml,
    /// CLI override for the starting model
    pub cli_model: Option<String>,
}

impl SimConfig {
    /// Default config path for a project directory.
    pub fn default_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load from an explicit path (which must exist) or the project default.
    pub fn load(
        project_dir: &Path,
        explicit: Option<&Path>,
        cli_model: Option<String>,
    ) -> Result<Self> {
        let (source, toml) = match explicit {
            Some(path) => (ConfigSource::File(path.to_path_buf()), SimToml::load(path)?),
            None => {
                let path = Self::default_path(project_dir);
                if path.exists() {
                    (ConfigSource::File(path.clone()), SimToml::load(&path)?)
                } else {
                    (ConfigSource::Defaults, SimToml::default())
                }
            }
        };

        tracing::debug!(source = %source, "loaded configuration");

        Ok(Self {
            source,
            toml,
            cli_model,
        })
    }

    /// Starting model: CLI flag, then `CWSIM_MODEL`, then `[defaults] model`.
    pub fn model_id(&self) -> String {
        self.cli_model
            .clone()
            .or_else(|| std::env::var(MODEL_ENV_VAR).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| self.toml.defaults.model.clone())
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        self.toml.to_engine_config(&self.model_id())
    }
}
