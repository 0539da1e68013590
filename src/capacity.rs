//! Capacity tiers derived from usage percentage.

use serde::{Deserialize, Serialize};

/// Usage band of the context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityTier {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for CapacityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityTier::Low => write!(f, "low"),
            CapacityTier::Medium => write!(f, "medium"),
            CapacityTier::High => write!(f, "high"),
            CapacityTier::Critical => write!(f, "critical"),
        }
    }
}

/// Semantic colour a front end should use for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayColor {
    Success,
    Warning,
    Error,
}

/// Classification result for one usage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityInfo {
    pub tier: CapacityTier,
    pub color: DisplayColor,
    pub message: &'static str,
    pub show_warning: bool,
}

/// Lower bounds (inclusive) of each tier above `low`, in percent.
///
/// ```toml
/// [thresholds]
/// medium = 60.0
/// high = 85.0
/// critical = 100.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityThresholds {
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_critical")]
    pub critical: f64,
}

fn default_medium() -> f64 {
    60.0
}

fn default_high() -> f64 {
    85.0
}

fn default_critical() -> f64 {
    100.0
}

impl Default for CapacityThresholds {
    fn default() -> Self {
        Self {
            medium: default_medium(),
            high: default_high(),
            critical: default_critical(),
        }
    }
}

impl CapacityThresholds {
    /// True when `0 <= medium <= high <= critical`.
    pub fn is_ascending(&self) -> bool {
        0.0 <= self.medium && self.medium <= self.high && self.high <= self.critical
    }

    /// Map a usage percentage to its tier. Each band includes its lower bound.
    pub fn classify(&self, percentage: f64) -> CapacityInfo {
        if percentage < self.medium {
            CapacityInfo {
                tier: CapacityTier::Low,
                color: DisplayColor::Success,
                message: "Plenty of space available",
                show_warning: false,
            }
        } else if percentage < self.high {
            CapacityInfo {
                tier: CapacityTier::Medium,
                color: DisplayColor::Warning,
                message: "Getting full - watch your space",
                show_warning: true,
            }
        } else if percentage < self.critical {
            CapacityInfo {
                tier: CapacityTier::High,
                color: DisplayColor::Error,
                message: "Almost full! Next message may remove old ones",
                show_warning: true,
            }
        } else {
            CapacityInfo {
                tier: CapacityTier::Critical,
                color: DisplayColor::Error,
                message: "Overflow! Old messages have been removed",
                show_warning: true,
            }
        }
    }
}

/// Attempted usage as a percentage of the window. Unbounded above 100.
/// A zero-sized window reports 0%.
pub fn capacity_percentage(total_tokens: usize, context_window: usize) -> f64 {
    if context_window == 0 {
        return 0.0;
    }
    (total_tokens as f64 / context_window as f64) * 100.0
}
