//! Character-based token estimation.
//!
//! Token counts are an approximation derived from the length of the
//! whitespace-normalised text. There is no vocabulary or byte-pair encoding
//! involved; the ratio is a teaching device, not a tokenizer.

use serde::{Deserialize, Serialize};

/// Approximate characters per token for English text.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Estimates token counts from character counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEstimator {
    chars_per_token: usize,
}

impl TokenEstimator {
    /// Create an estimator with the given characters-per-token ratio.
    ///
    /// A ratio of zero is treated as one so estimation stays total.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }

    /// Estimate the token cost of `text`.
    ///
    /// Whitespace runs collapse to a single space and the edges are trimmed
    /// before counting. Empty or whitespace-only text costs nothing; any other
    /// text costs at least one token.
    pub fn estimate(&self, text: &str) -> usize {
        let char_count = normalized_char_count(text);
        if char_count == 0 {
            return 0;
        }
        char_count.div_ceil(self.chars_per_token).max(1)
    }

    /// Live preview for draft text: tokens plus raw character and word counts.
    ///
    /// Characters are counted on the untrimmed input.
    pub fn estimate_realtime(&self, text: &str) -> RealtimeEstimate {
        RealtimeEstimate {
            tokens: self.estimate(text),
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
        }
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}

/// Preview numbers for text that has not been committed to the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RealtimeEstimate {
    pub tokens: usize,
    pub characters: usize,
    pub words: usize,
}

/// Estimate with the default ratio.
pub fn estimate_tokens(text: &str) -> usize {
    TokenEstimator::default().estimate(text)
}

/// Length of `text` once every whitespace run is a single space and the
/// edges are trimmed.
fn normalized_char_count(text: &str) -> usize {
    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| word.chars().count() + usize::from(i > 0))
        .sum()
}

/// Format a token count with thousands separators (e.g. `16,384`).
pub fn format_token_count(tokens: usize) -> String {
    let digits = tokens.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_whitespace_only_is_zero() {
        assert_eq!(estimate_tokens("   \n\t  "), 0);
    }

    #[test]
    fn test_single_char_costs_one_token() {
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("  a  "), 1);
    }

    #[test]
    fn test_rounds_up() {
        // 20 chars
        assert_eq!(estimate_tokens("Hello! How are you?!"), 5);
        // 21 chars
        assert_eq!(estimate_tokens("Hello! How are you?!!"), 6);
    }

    #[test]
    fn test_default_system_prompt_cost() {
        assert_eq!(estimate_tokens("You are a helpful AI assistant."), 8);
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(
            estimate_tokens("Hello!    How\n\nare\tyou?"),
            estimate_tokens("Hello! How are you?")
        );
        assert_eq!(normalized_char_count("  a   b  "), 3);
    }

    #[test]
    fn test_custom_ratio() {
        let estimator = TokenEstimator::new(2);
        assert_eq!(estimator.estimate("abcde"), 3);
        assert_eq!(estimator.chars_per_token(), 2);
    }

    #[test]
    fn test_zero_ratio_is_clamped() {
        let estimator = TokenEstimator::new(0);
        assert_eq!(estimator.chars_per_token(), 1);
        assert_eq!(estimator.estimate("abc"), 3);
    }

    #[test]
    fn test_counts_unicode_scalars() {
        // Four scalar values, twelve bytes.
        assert_eq!(estimate_tokens("日本語字"), 1);
        assert_eq!(estimate_tokens("日本語字x"), 2);
    }

    #[test]
    fn test_realtime_estimate() {
        let estimate = TokenEstimator::default().estimate_realtime("  two   words ");
        assert_eq!(estimate.characters, 14);
        assert_eq!(estimate.words, 2);
        // "two words" = 9 chars
        assert_eq!(estimate.tokens, 3);
    }

    #[test]
    fn test_realtime_estimate_empty() {
        let estimate = TokenEstimator::default().estimate_realtime("");
        assert_eq!(estimate.tokens, 0);
        assert_eq!(estimate.characters, 0);
        assert_eq!(estimate.words, 0);
    }

    #[test]
    fn test_format_token_count() {
        assert_eq!(format_token_count(0), "0");
        assert_eq!(format_token_count(999), "999");
        assert_eq!(format_token_count(4096), "4,096");
        assert_eq!(format_token_count(1_234_567), "1,234,567");
    }
}
