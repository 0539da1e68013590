//! Step-by-step execution of a scenario against a live session.

use serde::Serialize;

use super::{Scenario, ScenarioStep};
use crate::errors::ScenarioError;
use crate::state::{Command, Engine, Session, SimulatorState};

/// What executing one step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub step_id: String,
    /// A command was issued to the session.
    pub applied: bool,
    pub explanation: Option<String>,
}

/// Walks a scenario's steps, issuing their commands to a [`Session`].
///
/// Moving back with [`previous_step`](Self::previous_step) only moves the
/// cursor; commands already applied stay applied, as they would in a manual
/// session.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    scenario: Scenario,
    session: Session,
    current: usize,
    complete: bool,
}

impl ScenarioRunner {
    /// Validate `scenario` and start a session on its model.
    pub fn new(scenario: Scenario, engine: Engine) -> Result<Self, ScenarioError> {
        scenario.validate(engine.config().catalog())?;
        let model = engine
            .config()
            .model(&scenario.model_id)
            .map_err(|_| ScenarioError::UnknownModel {
                scenario: scenario.id.clone(),
                model: scenario.model_id.clone(),
            })?
            .clone();

        Ok(Self {
            session: Session::with_model(engine, model),
            scenario,
            current: 0,
            complete: false,
        })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &SimulatorState {
        self.session.state()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&ScenarioStep> {
        self.scenario.steps.get(self.current)
    }

    pub fn total_steps(&self) -> usize {
        self.scenario.steps.len()
    }

    /// Percentage of steps reached, counting the current one.
    pub fn progress(&self) -> f64 {
        ((self.current + 1) as f64 / self.total_steps() as f64) * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Run the step under the cursor.
    pub fn execute_current(&mut self) -> Result<StepOutcome, ScenarioError> {
        let step = self
            .scenario
            .steps
            .get(self.current)
            .ok_or_else(|| ScenarioError::NoSteps {
                id: self.scenario.id.clone(),
            })?;

        let chars_per_token = self.session.engine().config().estimator().chars_per_token();
        let command = step.command(chars_per_token)?;
        let outcome = StepOutcome {
            index: self.current,
            step_id: step.id.clone(),
            applied: command.is_some(),
            explanation: step
                .payload
                .explanation
                .clone()
                .or_else(|| step.payload.highlight.clone()),
        };

        tracing::info!(
            scenario = %self.scenario.id,
            step = %step.id,
            action = ?step.action,
            "executing scenario step"
        );

        if let Some(command) = command {
            self.session.apply(command);
        }
        Ok(outcome)
    }

    /// Advance and run the next step. Returns `None` once past the last step.
    pub fn next_step(&mut self) -> Result<Option<StepOutcome>, ScenarioError> {
        if self.current + 1 < self.total_steps() {
            self.current += 1;
            self.execute_current().map(Some)
        } else {
            self.complete = true;
            Ok(None)
        }
    }

    pub fn previous_step(&mut self) {
        if self.current > 0 {
            self.current -= 1;
            self.complete = false;
        }
    }

    /// Back to the first step with an empty log on the same model.
    pub fn reset(&mut self) {
        self.current = 0;
        self.complete = false;
        self.session.apply(Command::Reset);
    }

    /// Execute the current step and every step after it.
    pub fn run_to_end(&mut self) -> Result<Vec<StepOutcome>, ScenarioError> {
        let mut outcomes = vec![self.execute_current()?];
        while let Some(outcome) = self.next_step()? {
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::CapacityTier;
    use crate::message::Role;
    use crate::scenario::find_builtin;

    fn runner(id: &str) -> ScenarioRunner {
        ScenarioRunner::new(find_builtin(id).unwrap(), Engine::default()).unwrap()
    }

    #[test]
    fn test_short_conversation_runs_to_end() {
        let mut runner = runner("short-conversation");
        let outcomes = runner.run_to_end().unwrap();

        assert_eq!(outcomes.len(), 5);
        assert!(runner.is_complete());
        assert_eq!(outcomes.iter().filter(|o| o.applied).count(), 4);
        assert!(outcomes[2].explanation.is_some());

        let state = runner.state();
        assert_eq!(state.messages.len(), 4);
        assert!(!state.is_overflowing);
        assert_eq!(state.messages[0].token_count, 5);
        assert_eq!(state.messages[1].token_count, 13);
        assert_eq!(runner.session().capacity().tier, CapacityTier::Low);
    }

    #[test]
    fn test_document_upload_overflows() {
        let mut runner = runner("document-upload");

        runner.execute_current().unwrap();
        runner.next_step().unwrap();
        let state = runner.state();
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].token_count, 3700);
        assert_eq!(state.messages[0].role, Role::User);
        assert_eq!(runner.session().capacity().tier, CapacityTier::High);

        while runner.next_step().unwrap().is_some() {}
        let state = runner.state();
        assert!(state.is_overflowing);
        assert_eq!(state.evicted_count(), 1);
        assert!(!state.messages[0].is_visible);
        assert!(state.messages[1..].iter().all(|m| m.is_visible));
    }

    #[test]
    fn test_long_conversation_fits() {
        let mut runner = runner("long-conversation");
        runner.run_to_end().unwrap();
        assert_eq!(runner.state().messages.len(), 6);
        assert!(!runner.state().is_overflowing);
    }

    #[test]
    fn test_navigation() {
        let mut runner = runner("short-conversation");
        assert_eq!(runner.current_index(), 0);
        assert!((runner.progress() - 20.0).abs() < 1e-9);
        runner.previous_step();
        assert_eq!(runner.current_index(), 0);

        runner.execute_current().unwrap();
        runner.next_step().unwrap();
        assert_eq!(runner.current_step().unwrap().id, "step-2");
        runner.previous_step();
        assert_eq!(runner.current_index(), 0);
        // Moving back does not undo.
        assert_eq!(runner.state().messages.len(), 2);

        runner.reset();
        assert_eq!(runner.current_index(), 0);
        assert!(runner.state().messages.is_empty());
        assert!(!runner.is_complete());
    }

    #[test]
    fn test_runner_rejects_unknown_model() {
        let mut scenario = find_builtin("short-conversation").unwrap();
        scenario.model_id = "gpt-9".to_string();
        assert!(matches!(
            ScenarioRunner::new(scenario, Engine::default()),
            Err(ScenarioError::UnknownModel { .. })
        ));
    }
}
