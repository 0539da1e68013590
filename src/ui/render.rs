//! Plain-text rendering of simulator state for the terminal.
//!
//! Everything here returns a `String`; callers decide where to print it.
//! Styling goes through `console`, which drops colours when stdout is not a
//! terminal, so the output is stable under pipes and in tests.

use console::{StyledObject, style};

use crate::capacity::{CapacityInfo, DisplayColor};
use crate::message::Message;
use crate::overflow::OverflowForecast;
use crate::state::{SimulatorState, TokenBreakdown};
use crate::tokens::format_token_count;
use crate::ui::icons::{EVICTED, GAUGE, INFO, WARN, role_icon, tier_icon};

const DEFAULT_WIDTH: usize = 80;
const MAX_WIDTH: usize = 100;
const BAR_WIDTH: usize = 30;

/// Current terminal width, capped for readability.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .unwrap_or(DEFAULT_WIDTH)
        .clamp(40, MAX_WIDTH)
}

fn colorize<D>(value: D, color: DisplayColor) -> StyledObject<D> {
    match color {
        DisplayColor::Success => style(value).green(),
        DisplayColor::Warning => style(value).yellow(),
        DisplayColor::Error => style(value).red().bold(),
    }
}

/// A fixed-width usage bar. Anything past 100% renders as a full bar.
pub fn capacity_bar(percentage: f64, width: usize) -> String {
    let ratio = (percentage / 100.0).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

/// The tier name coloured by its display colour.
pub fn styled_tier(info: &CapacityInfo) -> String {
    colorize(info.tier.to_string().to_uppercase(), info.color).to_string()
}

/// Summary block: model, usage bar, remaining budget and any warning.
pub fn render_state(state: &SimulatorState, info: &CapacityInfo) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} ({} token window)\n",
        style(&state.model.name).cyan().bold(),
        format_token_count(state.model.context_window)
    ));
    out.push_str(&format!(
        "System prompt: {} tokens{}\n",
        format_token_count(state.system_prompt.token_count),
        if state.system_prompt.is_custom {
            style(" (custom)").dim().to_string()
        } else {
            String::new()
        }
    ));
    out.push_str(&format!(
        "{}{} {} {:.1}%  {}\n",
        GAUGE,
        colorize(capacity_bar(state.capacity_percentage, BAR_WIDTH), info.color),
        styled_tier(info),
        state.capacity_percentage,
        style(format!(
            "{} / {} used, {} remaining",
            format_token_count(state.total_tokens),
            format_token_count(state.model.context_window),
            format_token_count(state.remaining_tokens)
        ))
        .dim()
    ));

    if info.show_warning {
        out.push_str(&format!(
            "{}{}\n",
            tier_icon(info.tier),
            colorize(info.message, info.color)
        ));
    }

    if state.is_overflowing {
        out.push_str(&format!(
            "{}{} of {} messages evicted from the window\n",
            EVICTED,
            style(state.evicted_count()).red().bold(),
            state.messages.len()
        ));
    }

    out
}

/// One message: a header line followed by the wrapped content.
pub fn render_message(message: &Message, width: usize) -> String {
    let header = format!(
        "{}{} #{} {} · {} tokens",
        role_icon(message.role),
        message.role.label(),
        message.sequence,
        message.id.short(),
        format_token_count(message.token_count)
    );

    let options = textwrap::Options::new(width.saturating_sub(4).max(20))
        .initial_indent("    ")
        .subsequent_indent("    ");
    let body = textwrap::fill(&message.content, options);

    if message.is_visible {
        format!("{}\n{}\n", style(header).bold(), body)
    } else {
        format!(
            "{} {}\n{}\n",
            style(header).dim().strikethrough(),
            style("[evicted]").red(),
            style(body).dim()
        )
    }
}

/// Every message in conversation order.
pub fn render_conversation(state: &SimulatorState, width: usize) -> String {
    if state.messages.is_empty() {
        return format!("{}\n", style("(no messages)").dim());
    }
    state
        .messages
        .iter()
        .map(|m| render_message(m, width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-source token table.
pub fn render_breakdown(report: &TokenBreakdown) -> String {
    let rows = [
        ("System prompt", report.system_prompt),
        ("System messages", report.system_messages),
        ("User messages", report.user_messages),
        ("Assistant messages", report.assistant_messages),
        ("Tool messages", report.tool_messages),
    ];

    let mut out = String::new();
    for (label, tokens) in rows {
        out.push_str(&format!("  {:<20} {:>10}\n", label, format_token_count(tokens)));
    }
    out.push_str(&format!("  {}\n", "─".repeat(31)));
    out.push_str(&format!(
        "  {:<20} {:>10}\n",
        style("Total").bold(),
        format_token_count(report.total)
    ));
    out.push_str(&format!(
        "  {:<20} {:>10}\n",
        "Remaining",
        format_token_count(report.remaining)
    ));
    out
}

/// Warning shown before a message that would push others out of the window.
pub fn render_forecast(forecast: &OverflowForecast) -> Option<String> {
    if !forecast.will_overflow {
        return None;
    }
    Some(format!(
        "{}{}\n{}Sending this evicts {} message(s) ({} tokens) to make room.\n",
        WARN,
        style(format!(
            "This message puts the conversation {} tokens over the window.",
            format_token_count(forecast.tokens_over)
        ))
        .yellow(),
        INFO,
        forecast.messages_to_remove,
        format_token_count(forecast.tokens_to_remove)
    ))
}
