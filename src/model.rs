//! Model capacity profiles.

use serde::{Deserialize, Serialize};

/// A named context-window size. Switching models only changes the budget;
/// stored messages are untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub name: String,
    pub context_window: usize,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub provider: String,
}

impl ModelConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, context_window: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            context_window,
            description: String::new(),
            color: String::new(),
            provider: String::new(),
        }
    }
}

/// Id of the model a fresh session starts with.
pub const DEFAULT_MODEL_ID: &str = "gpt-3.5-turbo";

/// The built-in 4K / 8K / 16K catalog.
pub fn builtin_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            id: DEFAULT_MODEL_ID.to_string(),
            name: "GPT-3.5".to_string(),
            context_window: 4096,
            description: "Standard context window (4K tokens)".to_string(),
            color: "blue".to_string(),
            provider: "OpenAI".to_string(),
        },
        ModelConfig {
            id: "gpt-4".to_string(),
            name: "GPT-4".to_string(),
            context_window: 8192,
            description: "Advanced model (8K tokens)".to_string(),
            color: "purple".to_string(),
            provider: "OpenAI".to_string(),
        },
        ModelConfig {
            id: "gpt-3.5-turbo-16k".to_string(),
            name: "GPT-3.5 (16K)".to_string(),
            context_window: 16384,
            description: "Extended context window (16K tokens)".to_string(),
            color: "cyan".to_string(),
            provider: "OpenAI".to_string(),
        },
    ]
}

/// Fixed list of selectable models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    models: Vec<ModelConfig>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelConfig>) -> Self {
        Self { models }
    }

    pub fn get(&self, id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.id.eq_ignore_ascii_case(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelConfig> {
        self.models.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(builtin_models())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = ModelCatalog::default();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(DEFAULT_MODEL_ID).unwrap().context_window, 4096);
        assert_eq!(catalog.get("gpt-4").unwrap().context_window, 8192);
        assert_eq!(catalog.get("gpt-3.5-turbo-16k").unwrap().context_window, 16384);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = ModelCatalog::default();
        assert!(catalog.get("GPT-4").is_some());
        assert!(catalog.get("claude-3-opus").is_none());
    }

    #[test]
    fn test_ids_keep_catalog_order() {
        let catalog = ModelCatalog::default();
        assert_eq!(
            catalog.ids(),
            vec!["gpt-3.5-turbo", "gpt-4", "gpt-3.5-turbo-16k"]
        );
    }
}
