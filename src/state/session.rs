//! Owner of one live simulator state.

use crate::capacity::CapacityInfo;
use crate::model::ModelConfig;
use crate::overflow::OverflowForecast;

use super::{Command, Engine, SimulatorState, TokenBreakdown};

/// Holds an engine and the current state; each command replaces the state.
#[derive(Debug, Clone)]
pub struct Session {
    engine: Engine,
    state: SimulatorState,
}

impl Session {
    pub fn new(engine: Engine) -> Self {
        let state = engine.initial_state();
        Self { engine, state }
    }

    pub fn with_model(engine: Engine, model: ModelConfig) -> Self {
        let state = engine.initial_state_for(model);
        Self { engine, state }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn state(&self) -> &SimulatorState {
        &self.state
    }

    pub fn apply(&mut self, command: Command) -> &SimulatorState {
        self.state = self.engine.apply(&self.state, command);
        &self.state
    }

    pub fn capacity(&self) -> CapacityInfo {
        self.engine.classify(&self.state)
    }

    pub fn breakdown(&self) -> TokenBreakdown {
        self.engine.breakdown(&self.state)
    }

    pub fn forecast(&self, content: &str) -> OverflowForecast {
        self.engine.forecast(&self.state, content)
    }
}
