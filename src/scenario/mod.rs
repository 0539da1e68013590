//! Scripted walkthroughs.
//!
//! A scenario is an ordered list of steps. State-changing steps become the
//! same [`Command`]s a person at the keyboard would issue; the engine cannot
//! tell the difference. Pacing (auto-advance delays) belongs to whoever drives
//! the [`ScenarioRunner`].
//!
//! Scenarios are TOML documents:
//!
//! ```toml
//! id = "short-conversation"
//! title = "Short Conversation"
//! model = "gpt-3.5-turbo"
//!
//! [[steps]]
//! id = "step-1"
//! instruction = "Let's start with a simple greeting"
//! action = "add_message"
//!
//! [steps.payload]
//! role = "user"
//! content = "Hello! How are you?"
//! ```

mod builtin;
mod runner;

pub use builtin::{builtin_scenarios, find_builtin, scenarios_by_difficulty};
pub use runner::{ScenarioRunner, StepOutcome};

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::ScenarioError;
use crate::message::Role;
use crate::model::ModelCatalog;
use crate::state::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => anyhow::bail!(
                "Invalid difficulty '{}'. Valid values: beginner, intermediate, advanced",
                s
            ),
        }
    }
}

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Add a message with the payload's role.
    AddMessage,
    /// Add a user message holding a document.
    AddDocument,
    /// Pause; no state change.
    Wait,
    /// Show an explanation; no state change.
    Explain,
    /// Point at part of the display; no state change.
    Highlight,
}

impl std::fmt::Display for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepAction::AddMessage => write!(f, "add_message"),
            StepAction::AddDocument => write!(f, "add_document"),
            StepAction::Wait => write!(f, "wait"),
            StepAction::Explain => write!(f, "explain"),
            StepAction::Highlight => write!(f, "highlight"),
        }
    }
}

impl StepAction {
    pub fn changes_state(&self) -> bool {
        matches!(self, StepAction::AddMessage | StepAction::AddDocument)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPayload {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Option<String>,
    /// Token size to synthesise when no content is given.
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub highlight: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub id: String,
    pub instruction: String,
    pub action: StepAction,
    #[serde(default)]
    pub payload: StepPayload,
    #[serde(default)]
    pub expected_outcome: String,
    /// Delay before advancing on its own; 0 waits for the user.
    #[serde(default)]
    pub auto_advance_delay_ms: u64,
}

/// Largest `size` an `add_document` step may ask for.
pub const MAX_DOCUMENT_TOKENS: usize = 1_000_000;

/// Upper bound on synthesised filler, whatever the chars-per-token ratio.
const MAX_FILLER_CHARS: usize = 64 * 1024 * 1024;

/// Where a state-changing step's text comes from.
enum StepBody<'a> {
    Literal(&'a str),
    Filler(usize),
}

impl ScenarioStep {
    /// The command this step issues, if any.
    ///
    /// `chars_per_token` only matters for payloads that give a `size` instead
    /// of literal content.
    pub fn command(&self, chars_per_token: usize) -> Result<Option<Command>, ScenarioError> {
        let Some((role, body)) = self.plan()? else {
            return Ok(None);
        };

        let content = match body {
            StepBody::Literal(content) => content.to_string(),
            StepBody::Filler(size) => filler_text(size, chars_per_token)
                .ok_or_else(|| self.malformed("size is too large for the token ratio"))?,
        };

        Ok(Some(Command::AddMessage { role, content }))
    }

    /// Check the payload shape without building any text.
    pub fn check(&self) -> Result<(), ScenarioError> {
        self.plan().map(|_| ())
    }

    fn plan(&self) -> Result<Option<(Role, StepBody<'_>)>, ScenarioError> {
        let role = match self.action {
            StepAction::AddMessage => self
                .payload
                .role
                .ok_or_else(|| self.malformed("add_message needs a role"))?,
            StepAction::AddDocument => Role::User,
            StepAction::Wait | StepAction::Explain | StepAction::Highlight => return Ok(None),
        };

        let body = match (&self.payload.content, self.payload.size) {
            (Some(content), _) if !content.trim().is_empty() => StepBody::Literal(content),
            (_, Some(size)) if size > MAX_DOCUMENT_TOKENS => {
                return Err(self.malformed(&format!(
                    "size {} exceeds the {} token limit",
                    size, MAX_DOCUMENT_TOKENS
                )));
            }
            (_, Some(size)) if size > 0 => StepBody::Filler(size),
            _ => return Err(self.malformed("needs non-empty content or a positive size")),
        };

        Ok(Some((role, body)))
    }

    fn malformed(&self, reason: &str) -> ScenarioError {
        ScenarioError::MalformedStep {
            step: self.id.clone(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Catalog id of the model the scenario runs on.
    #[serde(rename = "model")]
    pub model_id: String,
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    pub fn parse(content: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to load scenario from {}", path.display()))
    }

    /// Check the scenario can run against `catalog`.
    pub fn validate(&self, catalog: &ModelCatalog) -> Result<(), ScenarioError> {
        if self.steps.is_empty() {
            return Err(ScenarioError::NoSteps {
                id: self.id.clone(),
            });
        }
        if catalog.get(&self.model_id).is_none() {
            return Err(ScenarioError::UnknownModel {
                scenario: self.id.clone(),
                model: self.model_id.clone(),
            });
        }
        for step in &self.steps {
            step.check()?;
        }
        Ok(())
    }
}

/// Placeholder prose of exactly `tokens * chars_per_token` characters, so it
/// estimates to `tokens`. `None` when that length is unreasonably large.
pub fn filler_text(tokens: usize, chars_per_token: usize) -> Option<String> {
    const WORDS: [&str; 8] = [
        "lorem",
        "ipsum",
        "dolor",
        "sit",
        "amet",
        "consectetur",
        "adipiscing",
        "elit",
    ];

    let target = tokens
        .checked_mul(chars_per_token.max(1))
        .filter(|&chars| chars <= MAX_FILLER_CHARS)?;
    let mut text = String::with_capacity(target + 12);
    for word in WORDS.iter().cycle() {
        if text.len() >= target {
            break;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(word);
    }
    text.truncate(target);
    if text.ends_with(' ') {
        text.pop();
        text.push('.');
    }
    Some(text)
}
