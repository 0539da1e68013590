//! Per-role token subtotals for display.

use serde::Serialize;

use crate::message::{Message, Role, SystemPrompt};

/// Attempted usage split by source. Evicted messages are included, so `total`
/// always matches the session's `total_tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TokenBreakdown {
    pub system_prompt: usize,
    /// Messages logged with the `system` role, separate from the prompt.
    pub system_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub tool_messages: usize,
    pub total: usize,
    pub remaining: usize,
}

pub fn breakdown(
    system_prompt: &SystemPrompt,
    messages: &[Message],
    context_window: usize,
) -> TokenBreakdown {
    let mut report = TokenBreakdown {
        system_prompt: system_prompt.token_count,
        ..TokenBreakdown::default()
    };

    for message in messages {
        let bucket = match message.role {
            Role::System => &mut report.system_messages,
            Role::User => &mut report.user_messages,
            Role::Assistant => &mut report.assistant_messages,
            Role::Tool => &mut report.tool_messages,
        };
        *bucket += message.token_count;
    }

    report.total = report.system_prompt
        + report.system_messages
        + report.user_messages
        + report.assistant_messages
        + report.tool_messages;
    report.remaining = context_window.saturating_sub(report.total);
    report
}
