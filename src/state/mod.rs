//! Simulator state and the commands that transform it.
//!
//! The state is a plain value. [`Engine::apply`] takes the current state and a
//! [`Command`] and returns a fresh state; nothing is mutated in place and there
//! is no observer wiring. [`Session`] is a small owner for hosts that want to
//! hold one state and feed it commands.

mod breakdown;
mod engine;
mod session;

pub use breakdown::{TokenBreakdown, breakdown};
pub use engine::{DEFAULT_SYSTEM_PROMPT, Engine, EngineConfig};
pub use session::Session;

use serde::{Deserialize, Serialize};

use crate::message::{Message, MessageId, Role, SystemPrompt};
use crate::model::ModelConfig;
use crate::overflow;

/// Single source of truth for one simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorState {
    pub model: ModelConfig,
    pub system_prompt: SystemPrompt,
    /// Conversation order, oldest first. Evicted messages stay here.
    pub messages: Vec<Message>,
    /// System prompt plus every message, visible or not.
    pub total_tokens: usize,
    pub remaining_tokens: usize,
    /// Unbounded above 100.
    pub capacity_percentage: f64,
    /// The last resolution evicted at least one message.
    pub is_overflowing: bool,
    /// Sequence number the next added message receives.
    #[serde(default)]
    pub next_sequence: u64,
}

impl SimulatorState {
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        overflow::visible_messages(&self.messages)
    }

    pub fn evicted_messages(&self) -> impl Iterator<Item = &Message> {
        overflow::evicted_messages(&self.messages)
    }

    pub fn evicted_count(&self) -> usize {
        self.evicted_messages().count()
    }

    /// Tokens inside the window, including the system prompt.
    pub fn visible_tokens(&self) -> usize {
        self.system_prompt.token_count + overflow::count_visible_tokens(&self.messages)
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        crate::message::find_by_id(&self.messages, id)
    }

    /// Check the derived fields against the log. Returns one line per
    /// violation; an empty list means the state is consistent.
    ///
    /// States produced by the engine always pass. Snapshots handed to
    /// `Command::LoadState` are taken as-is and may not.
    pub fn verify(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let window = self.model.context_window;

        let expected_total = self.system_prompt.token_count
            + self.messages.iter().map(|m| m.token_count).sum::<usize>();
        if self.total_tokens != expected_total {
            problems.push(format!(
                "total_tokens is {} but prompt and messages add up to {}",
                self.total_tokens, expected_total
            ));
        }

        let expected_remaining = window.saturating_sub(expected_total);
        if self.remaining_tokens != expected_remaining {
            problems.push(format!(
                "remaining_tokens is {} but should be {}",
                self.remaining_tokens, expected_remaining
            ));
        }

        let expected_pct = crate::capacity::capacity_percentage(expected_total, window);
        if (self.capacity_percentage - expected_pct).abs() > 1e-9 {
            problems.push(format!(
                "capacity_percentage is {:.3} but should be {:.3}",
                self.capacity_percentage, expected_pct
            ));
        }

        let resolved = overflow::resolve(
            self.messages.clone(),
            window,
            self.system_prompt.token_count,
        );
        if resolved.is_overflowing != self.is_overflowing {
            problems.push(format!(
                "is_overflowing is {} but resolution says {}",
                self.is_overflowing, resolved.is_overflowing
            ));
        }
        for (stored, expected) in self.messages.iter().zip(&resolved.messages) {
            if stored.is_visible != expected.is_visible {
                problems.push(format!(
                    "message {} visibility is {} but should be {}",
                    stored.id.short(),
                    stored.is_visible,
                    expected.is_visible
                ));
            }
        }

        if self
            .messages
            .windows(2)
            .any(|pair| pair[0].sequence >= pair[1].sequence)
        {
            problems.push("messages are not in sequence order".to_string());
        }

        problems
    }
}

/// A state transition request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append a message. Callers reject empty content before sending this.
    AddMessage { role: Role, content: String },
    /// Drop a message by id. Unknown ids are ignored.
    RemoveMessage(MessageId),
    /// Swap the active capacity profile.
    ChangeModel(ModelConfig),
    /// Replace the system prompt, marking it custom.
    UpdateSystemPrompt(String),
    /// Clear the log, keeping the model and system prompt.
    Reset,
    /// Replace the state wholesale without recomputation.
    LoadState(Box<SimulatorState>),
}

impl Command {
    pub fn add(role: Role, content: impl Into<String>) -> Self {
        Command::AddMessage {
            role,
            content: content.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::AddMessage { .. } => "add_message",
            Command::RemoveMessage(_) => "remove_message",
            Command::ChangeModel(_) => "change_model",
            Command::UpdateSystemPrompt(_) => "update_system_prompt",
            Command::Reset => "reset",
            Command::LoadState(_) => "load_state",
        }
    }
}
