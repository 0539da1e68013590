use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use cwsim::scenario::Difficulty;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cmd;

#[derive(Parser)]
#[command(name = "cwsim")]
#[command(version, about = "Context window simulator for LLM conversations")]
pub struct Cli {
    /// Log engine activity to stderr (same as RUST_LOG=cwsim=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Path to cwsim.toml. Defaults to .cwsim/cwsim.toml in the project directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model to start on. Overrides CWSIM_MODEL and the config file.
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the token cost of TEXT (or stdin)
    Estimate {
        text: Option<String>,

        /// Print the estimate as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the model catalog
    Models,
    /// List, inspect or run scripted walkthroughs
    Scenario {
        #[command(subcommand)]
        command: ScenarioCommands,
    },
    /// Interactive session over stdin
    Repl,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ScenarioCommands {
    List {
        /// Only show scenarios at this difficulty (beginner, intermediate, advanced)
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },
    Show {
        id: String,
    },
    Run {
        /// Built-in scenario id
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        id: Option<String>,

        /// Load the scenario from a TOML file instead
        #[arg(long)]
        file: Option<PathBuf>,

        /// Wait for each step's auto-advance delay
        #[arg(long)]
        pace: bool,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    Show,
    Validate,
    Init,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "cwsim=debug" } else { "cwsim=warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Estimate { text, json } => {
            cmd::cmd_estimate(&project_dir, &cli, text.as_deref(), *json)?
        }
        Commands::Models => cmd::cmd_models(&project_dir, &cli)?,
        Commands::Scenario { command } => {
            cmd::cmd_scenario(&project_dir, &cli, command.clone()).await?
        }
        Commands::Repl => cmd::cmd_repl(&project_dir, &cli).await?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, &cli, command.clone())?,
    }

    Ok(())
}
