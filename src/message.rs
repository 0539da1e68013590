//! Conversation messages and the system prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tokens::TokenEstimator;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::System, Role::User, Role::Assistant, Role::Tool];

    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Tool => "Tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            _ => anyhow::bail!(
                "Invalid role '{}'. Valid values: system, user, assistant, tool",
                s
            ),
        }
    }
}

/// Opaque message identifier, stable for the message's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to tell messages apart on screen.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One turn in the conversation.
///
/// `token_count` is fixed at creation. Later changes to the estimator never
/// re-price an existing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub token_count: usize,
    /// Insertion order key; strictly increasing within a session.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    /// Whether the message currently sits inside the context window.
    pub is_visible: bool,
}

impl Message {
    /// Build a visible message, pricing `content` with `estimator`.
    pub fn new(
        role: Role,
        content: impl Into<String>,
        estimator: &TokenEstimator,
        sequence: u64,
    ) -> Self {
        let content = content.into();
        let token_count = estimator.estimate(&content);
        Self {
            id: MessageId::new(),
            role,
            content,
            token_count,
            sequence,
            created_at: Utc::now(),
            is_visible: true,
        }
    }

    /// Evicted from the window. Always the negation of `is_visible`.
    pub fn is_truncated(&self) -> bool {
        !self.is_visible
    }
}

/// The singleton system prompt. Its tokens are reserved before any message
/// and it is never evicted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPrompt {
    pub content: String,
    pub token_count: usize,
    pub is_custom: bool,
}

impl SystemPrompt {
    /// The configured default prompt.
    pub fn default_prompt(content: impl Into<String>, estimator: &TokenEstimator) -> Self {
        let content = content.into();
        Self {
            token_count: estimator.estimate(&content),
            content,
            is_custom: false,
        }
    }

    /// A user-edited prompt.
    pub fn custom(content: impl Into<String>, estimator: &TokenEstimator) -> Self {
        Self {
            is_custom: true,
            ..Self::default_prompt(content, estimator)
        }
    }
}

/// Four canned turns used by demos.
pub const SAMPLE_CONVERSATION: [(Role, &str); 4] = [
    (Role::User, "Hello! How are you?"),
    (
        Role::Assistant,
        "I'm doing well, thank you! How can I help you today?",
    ),
    (Role::User, "Can you explain what a context window is?"),
    (
        Role::Assistant,
        "A context window is the maximum amount of text that an AI model can process at once. Think of it as the model's \"working memory.\"",
    ),
];

pub fn filter_by_role(messages: &[Message], role: Role) -> impl Iterator<Item = &Message> {
    messages.iter().filter(move |m| m.role == role)
}

pub fn count_by_role(messages: &[Message], role: Role) -> usize {
    filter_by_role(messages, role).count()
}

pub fn find_by_id(messages: &[Message], id: MessageId) -> Option<&Message> {
    messages.iter().find(|m| m.id == id)
}

pub fn latest(messages: &[Message]) -> Option<&Message> {
    messages.last()
}

/// Resolve a full id or a unique prefix of its hex form.
pub fn find_by_prefix<'a>(messages: &'a [Message], prefix: &str) -> Option<&'a Message> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return None;
    }
    let mut matches = messages.iter().filter(|m| {
        let full = m.id.to_string();
        full.starts_with(&prefix) || full.replace('-', "").starts_with(&prefix)
    });
    match (matches.next(), matches.next()) {
        (Some(m), None) => Some(m),
        _ => None,
    }
}
