//! Scenarios shipped with the binary.

use super::{Difficulty, Scenario};
use crate::errors::ScenarioError;

const SOURCES: [&str; 3] = [
    include_str!("../../scenarios/short-conversation.toml"),
    include_str!("../../scenarios/document-upload.toml"),
    include_str!("../../scenarios/long-conversation.toml"),
];

/// All built-in scenarios, in presentation order.
pub fn builtin_scenarios() -> Result<Vec<Scenario>, ScenarioError> {
    SOURCES.iter().map(|source| Scenario::parse(source)).collect()
}

pub fn find_builtin(id: &str) -> Result<Scenario, ScenarioError> {
    builtin_scenarios()?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| ScenarioError::NotFound { id: id.to_string() })
}

/// Built-in scenarios at one difficulty, in presentation order.
pub fn scenarios_by_difficulty(difficulty: Difficulty) -> Result<Vec<Scenario>, ScenarioError> {
    Ok(builtin_scenarios()?
        .into_iter()
        .filter(|s| s.difficulty == difficulty)
        .collect())
}
