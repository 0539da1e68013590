//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `estimate`      | `Estimate`                                         |
//! | `models`        | `Models`                                           |
//! | `scenario`      | `Scenario` (`list`, `show`, `run`)                 |
//! | `repl`          | `Repl`                                             |
//! | `config`        | `Config`                                           |

pub mod config;
pub mod estimate;
pub mod models;
pub mod repl;
pub mod scenario;

pub use config::cmd_config;
pub use estimate::cmd_estimate;
pub use models::cmd_models;
pub use repl::cmd_repl;
pub use scenario::cmd_scenario;

use anyhow::Result;
use std::path::Path;

use cwsim::sim_config::SimConfig;
use cwsim::state::Engine;

use super::Cli;

/// Resolve configuration from the file, the environment and CLI flags.
pub(crate) fn load_config(project_dir: &Path, cli: &Cli) -> Result<SimConfig> {
    SimConfig::load(project_dir, cli.config.as_deref(), cli.model.clone())
}

/// Build an engine from the resolved configuration.
pub(crate) fn load_engine(project_dir: &Path, cli: &Cli) -> Result<Engine> {
    let config = load_config(project_dir, cli)?;
    tracing::info!(source = %config.source, model = %config.model_id(), "configuration resolved");
    Ok(Engine::new(config.engine_config()?))
}
