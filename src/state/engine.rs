//! The reducer: `(state, command) -> state`.

use std::collections::HashSet;

use crate::capacity::{CapacityInfo, CapacityThresholds, capacity_percentage};
use crate::errors::ConfigError;
use crate::message::{Message, SystemPrompt};
use crate::model::{DEFAULT_MODEL_ID, ModelCatalog, ModelConfig, builtin_models};
use crate::overflow::{self, OverflowForecast};
use crate::tokens::{DEFAULT_CHARS_PER_TOKEN, RealtimeEstimate, TokenEstimator};

use super::{Command, SimulatorState, TokenBreakdown, breakdown};

/// Default system prompt for a fresh session.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Immutable constants the engine is parameterised by.
///
/// Built once (usually from `cwsim.toml`) and handed to [`Engine::new`].
/// Construction validates everything, so an `EngineConfig` always has a
/// non-empty catalog containing its default model.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    estimator: TokenEstimator,
    thresholds: CapacityThresholds,
    default_system_prompt: String,
    catalog: ModelCatalog,
    default_model: ModelConfig,
}

impl EngineConfig {
    pub fn new(
        chars_per_token: usize,
        thresholds: CapacityThresholds,
        default_system_prompt: impl Into<String>,
        models: Vec<ModelConfig>,
        default_model_id: &str,
    ) -> Result<Self, ConfigError> {
        if chars_per_token == 0 {
            return Err(ConfigError::InvalidCharsPerToken(chars_per_token));
        }
        if !thresholds.is_ascending() {
            return Err(ConfigError::ThresholdsNotAscending {
                medium: thresholds.medium,
                high: thresholds.high,
                critical: thresholds.critical,
            });
        }
        if models.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for model in &models {
            if !seen.insert(model.id.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateModel {
                    id: model.id.clone(),
                });
            }
            if model.context_window == 0 {
                return Err(ConfigError::ZeroContextWindow {
                    id: model.id.clone(),
                });
            }
        }

        let catalog = ModelCatalog::new(models);
        let default_model = lookup(&catalog, default_model_id)?;

        Ok(Self {
            estimator: TokenEstimator::new(chars_per_token),
            thresholds,
            default_system_prompt: default_system_prompt.into(),
            catalog,
            default_model,
        })
    }

    /// Same configuration with a different starting model.
    pub fn with_default_model(mut self, model_id: &str) -> Result<Self, ConfigError> {
        self.default_model = lookup(&self.catalog, model_id)?;
        Ok(self)
    }

    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    pub fn thresholds(&self) -> &CapacityThresholds {
        &self.thresholds
    }

    pub fn default_system_prompt(&self) -> &str {
        &self.default_system_prompt
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn default_model(&self) -> &ModelConfig {
        &self.default_model
    }

    /// Look up a catalog model, with the available ids in the error.
    pub fn model(&self, id: &str) -> Result<&ModelConfig, ConfigError> {
        self.catalog.get(id).ok_or_else(|| ConfigError::UnknownModel {
            id: id.to_string(),
            available: self.catalog.ids().join(", "),
        })
    }
}

fn lookup(catalog: &ModelCatalog, id: &str) -> Result<ModelConfig, ConfigError> {
    catalog
        .get(id)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownModel {
            id: id.to_string(),
            available: catalog.ids().join(", "),
        })
}

impl Default for EngineConfig {
    fn default() -> Self {
        let models = builtin_models();
        let default_model = models[0].clone();
        Self {
            estimator: TokenEstimator::new(DEFAULT_CHARS_PER_TOKEN),
            thresholds: CapacityThresholds::default(),
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            catalog: ModelCatalog::new(models),
            default_model,
        }
    }
}

/// Applies commands to simulator states.
///
/// Every mutation recomputes totals and reruns overflow resolution over the
/// whole log; nothing is maintained incrementally.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Empty log, default model, default system prompt.
    pub fn initial_state(&self) -> SimulatorState {
        self.initial_state_for(self.config.default_model.clone())
    }

    /// Empty log and default system prompt on a specific model.
    pub fn initial_state_for(&self, model: ModelConfig) -> SimulatorState {
        let system_prompt =
            SystemPrompt::default_prompt(&self.config.default_system_prompt, &self.config.estimator);
        recompute(model, system_prompt, Vec::new(), 0)
    }

    pub fn apply(&self, state: &SimulatorState, command: Command) -> SimulatorState {
        tracing::debug!(command = command.name(), "applying command");

        match command {
            Command::AddMessage { role, content } => {
                let mut messages = state.messages.clone();
                messages.push(Message::new(
                    role,
                    content,
                    &self.config.estimator,
                    state.next_sequence,
                ));
                recompute(
                    state.model.clone(),
                    state.system_prompt.clone(),
                    messages,
                    state.next_sequence + 1,
                )
            }
            Command::RemoveMessage(id) => {
                let messages = state
                    .messages
                    .iter()
                    .filter(|m| m.id != id)
                    .cloned()
                    .collect();
                recompute(
                    state.model.clone(),
                    state.system_prompt.clone(),
                    messages,
                    state.next_sequence,
                )
            }
            Command::ChangeModel(model) => recompute(
                model,
                state.system_prompt.clone(),
                state.messages.clone(),
                state.next_sequence,
            ),
            Command::UpdateSystemPrompt(content) => recompute(
                state.model.clone(),
                SystemPrompt::custom(content, &self.config.estimator),
                state.messages.clone(),
                state.next_sequence,
            ),
            Command::Reset => recompute(
                state.model.clone(),
                state.system_prompt.clone(),
                Vec::new(),
                state.next_sequence,
            ),
            Command::LoadState(snapshot) => *snapshot,
        }
    }

    pub fn classify(&self, state: &SimulatorState) -> CapacityInfo {
        self.config.thresholds.classify(state.capacity_percentage)
    }

    pub fn breakdown(&self, state: &SimulatorState) -> TokenBreakdown {
        breakdown(
            &state.system_prompt,
            &state.messages,
            state.model.context_window,
        )
    }

    /// Pre-submit check for draft content.
    pub fn forecast(&self, state: &SimulatorState, content: &str) -> OverflowForecast {
        overflow::would_overflow(
            &state.messages,
            self.config.estimator.estimate(content),
            state.model.context_window,
            state.system_prompt.token_count,
        )
    }

    pub fn estimate_draft(&self, text: &str) -> RealtimeEstimate {
        self.config.estimator.estimate_realtime(text)
    }
}

/// Derive every computed field from the model, prompt and log.
fn recompute(
    model: ModelConfig,
    system_prompt: SystemPrompt,
    messages: Vec<Message>,
    next_sequence: u64,
) -> SimulatorState {
    let total_tokens =
        system_prompt.token_count + messages.iter().map(|m| m.token_count).sum::<usize>();
    let resolved = overflow::resolve(messages, model.context_window, system_prompt.token_count);

    SimulatorState {
        remaining_tokens: model.context_window.saturating_sub(total_tokens),
        capacity_percentage: capacity_percentage(total_tokens, model.context_window),
        is_overflowing: resolved.is_overflowing,
        messages: resolved.messages,
        total_tokens,
        model,
        system_prompt,
        next_sequence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::CapacityTier;
    use crate::message::{MessageId, Role};
    use proptest::prelude::*;

    fn engine() -> Engine {
        Engine::default()
    }

    fn add(engine: &Engine, state: &SimulatorState, role: Role, content: &str) -> SimulatorState {
        engine.apply(state, Command::add(role, content))
    }

    #[test]
    fn test_initial_state() {
        let engine = engine();
        let state = engine.initial_state();
        assert_eq!(state.model.id, DEFAULT_MODEL_ID);
        assert_eq!(state.system_prompt.token_count, 8);
        assert!(!state.system_prompt.is_custom);
        assert!(state.messages.is_empty());
        assert_eq!(state.total_tokens, 8);
        assert_eq!(state.remaining_tokens, 4088);
        assert!(!state.is_overflowing);
        assert!(state.verify().is_empty());
    }

    #[test]
    fn test_add_first_message() {
        let engine = engine();
        let state = add(&engine, &engine.initial_state(), Role::User, "Hello! How are you?");
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].token_count, 5);
        assert_eq!(state.total_tokens, 13);
        assert_eq!(state.remaining_tokens, 4083);
        assert!(!state.is_overflowing);
        assert!(state.messages[0].is_visible);
        assert_eq!(engine.classify(&state).tier, CapacityTier::Low);
    }

    #[test]
    fn test_oversized_message_evicts_itself() {
        let engine = engine();
        let state = add(&engine, &engine.initial_state(), Role::User, "Hello! How are you?");
        let state = add(&engine, &state, Role::User, &"x".repeat(20_000));

        assert_eq!(state.total_tokens, 13 + 5000);
        assert!(state.is_overflowing);
        assert_eq!(state.remaining_tokens, 0);
        assert!(!state.messages[1].is_visible);
        assert!(!state.messages[0].is_visible);
        assert_eq!(engine.classify(&state).tier, CapacityTier::Critical);
    }

    fn two_message_overflow(engine: &Engine) -> SimulatorState {
        let state = add(engine, &engine.initial_state(), Role::User, &"a".repeat(400));
        let state = add(engine, &state, Role::Assistant, &"b".repeat(200));
        engine.apply(&state, Command::ChangeModel(ModelConfig::new("tiny", "Tiny", 150)))
    }

    #[test]
    fn test_small_model_evicts_oldest() {
        let engine = engine();
        let state = two_message_overflow(&engine);
        assert_eq!(state.messages[0].token_count, 100);
        assert_eq!(state.messages[1].token_count, 50);
        assert!(state.is_overflowing);
        assert!(!state.messages[0].is_visible);
        assert!(state.messages[1].is_visible);
        assert_eq!(state.evicted_count(), 1);
        assert_eq!(state.total_tokens, 158);
        assert_eq!(state.visible_tokens(), 58);
    }

    #[test]
    fn test_remove_restores_evicted_message() {
        let engine = engine();
        let state = two_message_overflow(&engine);
        let b = state.messages[1].id;
        let state = engine.apply(&state, Command::RemoveMessage(b));

        assert_eq!(state.messages.len(), 1);
        assert!(state.messages[0].is_visible);
        assert!(!state.is_overflowing);
        assert_eq!(state.total_tokens, 108);
    }

    #[test]
    fn test_model_smaller_than_prompt_evicts_everything() {
        let engine = engine();
        let state = add(&engine, &engine.initial_state(), Role::User, "hi");
        let state = add(&engine, &state, Role::Assistant, "hello");
        let state = engine.apply(&state, Command::ChangeModel(ModelConfig::new("micro", "Micro", 5)));

        assert!(state.is_overflowing);
        assert_eq!(state.remaining_tokens, 0);
        assert!(state.messages.iter().all(|m| !m.is_visible));
    }

    #[test]
    fn test_larger_model_restores_messages() {
        let engine = engine();
        let state = two_message_overflow(&engine);
        let gpt4 = engine.config().model("gpt-4").unwrap().clone();
        let state = engine.apply(&state, Command::ChangeModel(gpt4));
        assert!(!state.is_overflowing);
        assert!(state.messages.iter().all(|m| m.is_visible));
        assert_eq!(state.model.context_window, 8192);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let engine = engine();
        let state = add(&engine, &engine.initial_state(), Role::User, "hello");
        let after = engine.apply(&state, Command::RemoveMessage(MessageId::new()));
        assert_eq!(after, state);
    }

    #[test]
    fn test_update_system_prompt() {
        let engine = engine();
        let state = add(&engine, &engine.initial_state(), Role::User, &"a".repeat(400));
        let state = engine.apply(&state, Command::UpdateSystemPrompt("x".repeat(16_000)));

        assert!(state.system_prompt.is_custom);
        assert_eq!(state.system_prompt.token_count, 4000);
        assert_eq!(state.total_tokens, 4100);
        // 96 tokens left for messages, the only message needs 100.
        assert!(state.is_overflowing);
        assert!(!state.messages[0].is_visible);
    }

    #[test]
    fn test_reset_keeps_model_and_prompt() {
        let engine = engine();
        let state = engine.apply(&engine.initial_state(), Command::UpdateSystemPrompt("Be terse.".into()));
        let gpt4 = engine.config().model("gpt-4").unwrap().clone();
        let state = engine.apply(&state, Command::ChangeModel(gpt4));
        let state = add(&engine, &state, Role::User, &"x".repeat(50_000));
        let state = engine.apply(&state, Command::Reset);

        assert!(state.messages.is_empty());
        assert_eq!(state.model.id, "gpt-4");
        assert_eq!(state.system_prompt.content, "Be terse.");
        assert_eq!(state.total_tokens, 3);
        assert_eq!(state.remaining_tokens, 8189);
        assert!(!state.is_overflowing);
    }

    #[test]
    fn test_load_state_replaces_without_recompute() {
        let engine = engine();
        let mut snapshot = engine.initial_state();
        snapshot.total_tokens = 999;
        let state = engine.apply(
            &engine.initial_state(),
            Command::LoadState(Box::new(snapshot.clone())),
        );
        assert_eq!(state, snapshot);
        assert!(!state.verify().is_empty());
    }

    #[test]
    fn test_message_keeps_original_price() {
        let engine = engine();
        let state = add(&engine, &engine.initial_state(), Role::User, &"x".repeat(40));

        let coarse = Engine::new(
            EngineConfig::new(
                10,
                CapacityThresholds::default(),
                DEFAULT_SYSTEM_PROMPT,
                builtin_models(),
                DEFAULT_MODEL_ID,
            )
            .unwrap(),
        );
        let state = coarse.apply(&state, Command::add(Role::User, "x".repeat(40)));
        assert_eq!(state.messages[0].token_count, 10);
        assert_eq!(state.messages[1].token_count, 4);
    }

    #[test]
    fn test_sequence_is_monotonic_across_reset() {
        let engine = engine();
        let state = add(&engine, &engine.initial_state(), Role::User, "one");
        let state = engine.apply(&state, Command::Reset);
        let state = add(&engine, &state, Role::User, "two");
        assert_eq!(state.messages[0].sequence, 1);
    }

    #[test]
    fn test_forecast_uses_estimator() {
        let engine = engine();
        let state = add(&engine, &engine.initial_state(), Role::User, &"x".repeat(16_000));
        let forecast = engine.forecast(&state, &"y".repeat(400));
        assert!(forecast.will_overflow);
        assert_eq!(forecast.messages_to_remove, 1);

        let quiet = engine.forecast(&state, "short");
        assert!(!quiet.will_overflow);
    }

    #[test]
    fn test_breakdown_matches_total() {
        let engine = engine();
        let state = two_message_overflow(&engine);
        let report = engine.breakdown(&state);
        assert_eq!(report.total, state.total_tokens);
        assert_eq!(report.user_messages, 100);
        assert_eq!(report.assistant_messages, 50);
        assert_eq!(report.remaining, 0);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let models = builtin_models;
        let ok = CapacityThresholds::default();
        assert_eq!(
            EngineConfig::new(0, ok, "p", models(), DEFAULT_MODEL_ID),
            Err(ConfigError::InvalidCharsPerToken(0))
        );
        assert_eq!(
            EngineConfig::new(4, ok, "p", Vec::new(), DEFAULT_MODEL_ID),
            Err(ConfigError::EmptyCatalog)
        );
        assert!(matches!(
            EngineConfig::new(4, ok, "p", models(), "gpt-9"),
            Err(ConfigError::UnknownModel { .. })
        ));

        let mut dup = models();
        dup.push(ModelConfig::new("GPT-4", "again", 10));
        assert!(matches!(
            EngineConfig::new(4, ok, "p", dup, DEFAULT_MODEL_ID),
            Err(ConfigError::DuplicateModel { .. })
        ));

        let zero = vec![ModelConfig::new("z", "Zero", 0)];
        assert!(matches!(
            EngineConfig::new(4, ok, "p", zero, "z"),
            Err(ConfigError::ZeroContextWindow { .. })
        ));

        let bad = CapacityThresholds {
            medium: 50.0,
            high: 40.0,
            critical: 100.0,
        };
        assert!(matches!(
            EngineConfig::new(4, bad, "p", models(), DEFAULT_MODEL_ID),
            Err(ConfigError::ThresholdsNotAscending { .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_match_catalog_lookup() {
        let ok = CapacityThresholds::default();

        let ascii = vec![
            ModelConfig::new("GPT-X", "Upper", 10),
            ModelConfig::new("gpt-x", "Lower", 20),
        ];
        assert!(matches!(
            EngineConfig::new(4, ok, "p", ascii, "gpt-x"),
            Err(ConfigError::DuplicateModel { .. })
        ));

        let accented = vec![
            ModelConfig::new("ÉCLAIR", "Upper", 10),
            ModelConfig::new("éclair", "Lower", 20),
        ];
        let config = EngineConfig::new(4, ok, "p", accented, "éclair").unwrap();
        assert_eq!(config.model("ÉCLAIR").unwrap().context_window, 10);
        assert_eq!(config.model("éclair").unwrap().context_window, 20);
    }

    #[test]
    fn test_with_default_model() {
        let config = EngineConfig::default().with_default_model("gpt-4").unwrap();
        assert_eq!(config.default_model().context_window, 8192);
        assert!(EngineConfig::default().with_default_model("nope").is_err());
        assert_eq!(Engine::new(config).initial_state().model.id, "gpt-4");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(Role, usize),
        Remove(usize),
        Model(usize),
        Prompt(usize),
        Reset,
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        proptest::sample::select(Role::ALL.to_vec())
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (arb_role(), 1usize..3000).prop_map(|(r, n)| Op::Add(r, n)),
            2 => (0usize..20).prop_map(Op::Remove),
            1 => (16usize..6000).prop_map(Op::Model),
            1 => (0usize..800).prop_map(Op::Prompt),
            1 => Just(Op::Reset),
        ]
    }

    fn to_command(state: &SimulatorState, op: Op) -> Command {
        match op {
            Op::Add(role, chars) => Command::add(role, "w".repeat(chars)),
            Op::Remove(i) => match state.messages.get(i) {
                Some(m) => Command::RemoveMessage(m.id),
                None => Command::RemoveMessage(MessageId::new()),
            },
            Op::Model(window) => Command::ChangeModel(ModelConfig::new("p", "Prop", window)),
            Op::Prompt(chars) => Command::UpdateSystemPrompt("s".repeat(chars)),
            Op::Reset => Command::Reset,
        }
    }

    proptest! {
        #[test]
        fn prop_every_transition_is_consistent(ops in prop::collection::vec(arb_op(), 0..40)) {
            let engine = engine();
            let mut state = engine.initial_state();
            for op in ops {
                let command = to_command(&state, op);
                state = engine.apply(&state, command);
                prop_assert!(state.verify().is_empty(), "{:?}", state.verify());
                prop_assert_eq!(engine.breakdown(&state).total, state.total_tokens);
                for m in &state.messages {
                    prop_assert_eq!(m.is_truncated(), !m.is_visible);
                }
            }
        }

        #[test]
        fn prop_evicted_messages_are_older_than_visible(
            ops in prop::collection::vec(arb_op(), 0..40)
        ) {
            let engine = engine();
            let mut state = engine.initial_state();
            for op in ops {
                let command = to_command(&state, op);
                state = engine.apply(&state, command);
                if state.is_overflowing {
                    let newest_evicted = state.evicted_messages().map(|m| m.sequence).max();
                    let oldest_visible = state.visible_messages().map(|m| m.sequence).min();
                    if let (Some(e), Some(v)) = (newest_evicted, oldest_visible) {
                        prop_assert!(e < v);
                    }
                }
            }
        }

        #[test]
        fn prop_add_then_remove_round_trips(
            ops in prop::collection::vec(arb_op(), 0..20),
            role in arb_role(),
            chars in 1usize..5000,
        ) {
            let engine = engine();
            let mut state = engine.initial_state();
            for op in ops {
                let command = to_command(&state, op);
                state = engine.apply(&state, command);
            }
            let added = engine.apply(&state, Command::add(role, "z".repeat(chars)));
            let id = added.messages.last().map(|m| m.id);
            prop_assert!(id.is_some());
            let removed = engine.apply(&added, Command::RemoveMessage(id.unwrap_or_default()));

            prop_assert_eq!(removed.total_tokens, state.total_tokens);
            prop_assert_eq!(&removed.messages, &state.messages);
        }
    }
}
