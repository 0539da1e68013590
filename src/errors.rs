//! Typed error hierarchy for the fallible outer layers.
//!
//! The simulation engine itself is total and never returns these. They cover
//! the two places where user input can be rejected:
//! - `ConfigError` for an unusable `cwsim.toml`
//! - `ScenarioError` for scenario lookup and malformed scenario scripts

use thiserror::Error;

/// Reasons a configuration cannot become an `EngineConfig`.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("chars_per_token must be at least 1, got {0}")]
    InvalidCharsPerToken(usize),

    #[error(
        "Capacity thresholds must ascend from 0 (medium {medium} <= high {high} <= critical {critical})"
    )]
    ThresholdsNotAscending { medium: f64, high: f64, critical: f64 },

    #[error("Model catalog is empty")]
    EmptyCatalog,

    #[error("Model '{id}' is listed more than once")]
    DuplicateModel { id: String },

    #[error("Model '{id}' has a zero context window")]
    ZeroContextWindow { id: String },

    #[error("Unknown model '{id}'. Available: {available}")]
    UnknownModel { id: String, available: String },
}

/// Errors from loading or driving a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Scenario '{id}' not found")]
    NotFound { id: String },

    #[error("Scenario '{scenario}' uses unknown model '{model}'")]
    UnknownModel { scenario: String, model: String },

    #[error("Scenario '{id}' has no steps")]
    NoSteps { id: String },

    #[error("Step '{step}' is malformed: {reason}")]
    MalformedStep { step: String, reason: String },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
}
