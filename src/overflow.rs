//! Oldest-first eviction of messages that no longer fit the context window.
//!
//! The system prompt is reserved first. Whatever budget remains is shared by
//! the message log; when the log's attempted total exceeds it, whole messages
//! are evicted from the front until the rest fits. Evicted messages stay in
//! the log with `is_visible = false` and come back as soon as budget allows.
//!
//! Resolution always starts from scratch, so it does not matter what the
//! incoming visibility flags say.

use serde::Serialize;

use crate::message::Message;

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct OverflowResult {
    pub messages: Vec<Message>,
    pub is_overflowing: bool,
    pub evicted_count: usize,
}

/// Prediction from [`would_overflow`] for a message that has not been added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverflowForecast {
    pub will_overflow: bool,
    /// Tokens above the message budget after the hypothetical add.
    pub tokens_over: usize,
    /// Leading messages the resolver would evict. May include the candidate.
    pub messages_to_remove: usize,
    /// Token mass of those messages.
    pub tokens_to_remove: usize,
}

/// Budget left for messages once the system prompt is reserved. Never negative.
pub fn available_for_messages(context_window: usize, system_prompt_tokens: usize) -> usize {
    context_window.saturating_sub(system_prompt_tokens)
}

/// Length and token mass of the evicted prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct EvictedPrefix {
    count: usize,
    tokens: usize,
}

/// Walk token counts from the oldest, removing each one until the remaining
/// attempted total fits `available`.
fn eviction_walk<I>(token_counts: I, attempted: usize, available: usize) -> EvictedPrefix
where
    I: IntoIterator<Item = usize>,
{
    let mut prefix = EvictedPrefix::default();
    let mut remaining = attempted;
    for tokens in token_counts {
        if remaining <= available {
            break;
        }
        remaining -= tokens;
        prefix.count += 1;
        prefix.tokens += tokens;
    }
    prefix
}

/// Assign visibility to every message against the budget.
pub fn resolve(
    mut messages: Vec<Message>,
    context_window: usize,
    system_prompt_tokens: usize,
) -> OverflowResult {
    let available = available_for_messages(context_window, system_prompt_tokens);
    let attempted: usize = messages.iter().map(|m| m.token_count).sum();

    if attempted <= available {
        for message in &mut messages {
            message.is_visible = true;
        }
        return OverflowResult {
            messages,
            is_overflowing: false,
            evicted_count: 0,
        };
    }

    let prefix = eviction_walk(messages.iter().map(|m| m.token_count), attempted, available);
    for (index, message) in messages.iter_mut().enumerate() {
        message.is_visible = index >= prefix.count;
    }

    tracing::debug!(
        evicted = prefix.count,
        evicted_tokens = prefix.tokens,
        attempted,
        available,
        "context window overflow"
    );

    OverflowResult {
        messages,
        is_overflowing: prefix.count > 0,
        evicted_count: prefix.count,
    }
}

/// Predict what adding a message of `candidate_tokens` would do, without
/// touching anything. Uses the same walk as [`resolve`] over the log with the
/// candidate appended.
pub fn would_overflow(
    messages: &[Message],
    candidate_tokens: usize,
    context_window: usize,
    system_prompt_tokens: usize,
) -> OverflowForecast {
    let available = available_for_messages(context_window, system_prompt_tokens);
    let attempted = messages.iter().map(|m| m.token_count).sum::<usize>() + candidate_tokens;

    if attempted <= available {
        return OverflowForecast {
            will_overflow: false,
            tokens_over: 0,
            messages_to_remove: 0,
            tokens_to_remove: 0,
        };
    }

    let counts = messages
        .iter()
        .map(|m| m.token_count)
        .chain(std::iter::once(candidate_tokens));
    let prefix = eviction_walk(counts, attempted, available);

    OverflowForecast {
        will_overflow: prefix.count > 0,
        tokens_over: attempted - available,
        messages_to_remove: prefix.count,
        tokens_to_remove: prefix.tokens,
    }
}

pub fn visible_messages(messages: &[Message]) -> impl Iterator<Item = &Message> {
    messages.iter().filter(|m| m.is_visible)
}

pub fn evicted_messages(messages: &[Message]) -> impl Iterator<Item = &Message> {
    messages.iter().filter(|m| !m.is_visible)
}

/// Tokens actually inside the window, excluding the system prompt.
pub fn count_visible_tokens(messages: &[Message]) -> usize {
    visible_messages(messages).map(|m| m.token_count).sum()
}
