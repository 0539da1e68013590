//! Shared UI icons and emojis.

use console::Emoji;

use crate::capacity::CapacityTier;
use crate::message::Role;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Roles
pub static SYSTEM: Emoji<'_, '_> = Emoji("⚙️  ", "[S]");
pub static USER: Emoji<'_, '_> = Emoji("👤 ", "[U]");
pub static ASSISTANT: Emoji<'_, '_> = Emoji("🤖 ", "[A]");
pub static TOOL: Emoji<'_, '_> = Emoji("🔧 ", "[T]");

// Window indicators
pub static GAUGE: Emoji<'_, '_> = Emoji("📊 ", "[USAGE]");
pub static EVICTED: Emoji<'_, '_> = Emoji("✂️  ", "[CUT]");
pub static STEP: Emoji<'_, '_> = Emoji("▶️  ", "[>]");
pub static INFO: Emoji<'_, '_> = Emoji("💡 ", "[i]");

pub fn role_icon(role: Role) -> &'static Emoji<'static, 'static> {
    match role {
        Role::System => &SYSTEM,
        Role::User => &USER,
        Role::Assistant => &ASSISTANT,
        Role::Tool => &TOOL,
    }
}

pub fn tier_icon(tier: CapacityTier) -> &'static Emoji<'static, 'static> {
    match tier {
        CapacityTier::Low => &CHECK,
        CapacityTier::Medium | CapacityTier::High => &WARN,
        CapacityTier::Critical => &CROSS,
    }
}
