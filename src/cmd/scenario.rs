//! Scripted walkthroughs (`cwsim scenario`).

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::time::Duration;

use cwsim::scenario::{
    Scenario, ScenarioRunner, StepOutcome, builtin_scenarios, find_builtin,
    scenarios_by_difficulty,
};
use cwsim::ui::icons::{INFO, SPARKLE, STEP};
use cwsim::ui::{render_state, terminal_width};

use super::super::{Cli, ScenarioCommands};

pub async fn cmd_scenario(project_dir: &Path, cli: &Cli, command: ScenarioCommands) -> Result<()> {
    match command {
        ScenarioCommands::List { difficulty } => {
            let scenarios = match difficulty {
                Some(difficulty) => scenarios_by_difficulty(difficulty)?,
                None => builtin_scenarios()?,
            };

            println!();
            println!("Scenarios");
            println!("=========");
            println!();
            if scenarios.is_empty() {
                println!("  (none)");
            }
            for scenario in scenarios {
                println!(
                    "  {:<20} {} ({}, ~{} min, {} steps)",
                    style(&scenario.id).cyan(),
                    scenario.title,
                    scenario.difficulty,
                    scenario.estimated_minutes,
                    scenario.steps.len()
                );
            }
            println!();
            println!("Run one with 'cwsim scenario run <id>'.");
        }
        ScenarioCommands::Show { id } => {
            let scenario = find_builtin(&id)?;
            print_overview(&scenario);
            for (i, step) in scenario.steps.iter().enumerate() {
                println!("  {}. [{}] {}", i + 1, step.action, step.instruction);
                if !step.expected_outcome.is_empty() {
                    println!("     {}", style(&step.expected_outcome).dim());
                }
            }
            println!();
        }
        ScenarioCommands::Run {
            id,
            file,
            pace,
            json,
        } => {
            let scenario = match (id, file) {
                (_, Some(path)) => Scenario::load(&path)?,
                (Some(id), None) => find_builtin(&id)?,
                (None, None) => anyhow::bail!("Give a scenario id or --file"),
            };
            run(project_dir, cli, scenario, pace, json).await?;
        }
    }

    Ok(())
}

fn print_overview(scenario: &Scenario) {
    println!();
    println!("{}", style(&scenario.title).bold());
    println!("{}", "=".repeat(scenario.title.chars().count()));
    if !scenario.description.is_empty() {
        println!("{}", scenario.description);
    }
    println!();
    println!(
        "Model: {}  Difficulty: {}  Steps: {}",
        scenario.model_id,
        scenario.difficulty,
        scenario.steps.len()
    );
    if !scenario.learning_objectives.is_empty() {
        println!();
        println!("You will learn:");
        for objective in &scenario.learning_objectives {
            println!("  - {}", objective);
        }
    }
    println!();
}

async fn run(
    project_dir: &Path,
    cli: &Cli,
    scenario: Scenario,
    pace: bool,
    json: bool,
) -> Result<()> {
    let engine = super::load_engine(project_dir, cli)?;
    let mut runner = ScenarioRunner::new(scenario, engine)
        .context("Scenario cannot run with the current configuration")?;
    let width = terminal_width();

    if !json {
        print_overview(runner.scenario());
    }

    let outcome = runner.execute_current()?;
    report_step(&runner, &outcome, json, width);

    loop {
        if pace && let Some(step) = runner.current_step() {
            let delay = step.auto_advance_delay_ms;
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
        match runner.next_step()? {
            Some(outcome) => report_step(&runner, &outcome, json, width),
            None => break,
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(runner.state())?);
    } else {
        println!(
            "{}Scenario complete: {}",
            SPARKLE,
            style(&runner.scenario().title).green().bold()
        );
    }

    Ok(())
}

fn report_step(runner: &ScenarioRunner, outcome: &StepOutcome, json: bool, width: usize) {
    if json {
        return;
    }
    let Some(step) = runner.scenario().steps.get(outcome.index) else {
        return;
    };

    println!(
        "{}{} {}",
        STEP,
        style(format!("Step {}/{}", outcome.index + 1, runner.total_steps())).bold(),
        step.instruction
    );
    if let Some(explanation) = &outcome.explanation {
        let options = textwrap::Options::new(width.saturating_sub(4)).subsequent_indent("   ");
        println!("{}{}", INFO, textwrap::fill(explanation, options));
    }
    if outcome.applied {
        let session = runner.session();
        print!("{}", render_state(session.state(), &session.capacity()));
    }
    if !step.expected_outcome.is_empty() {
        println!("   {}", style(&step.expected_outcome).dim());
    }
    println!();
}
