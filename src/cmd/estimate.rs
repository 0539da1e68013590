//! Draft token estimate (`cwsim estimate`).

use anyhow::{Context, Result};
use console::style;
use std::io::Read;
use std::path::Path;

use cwsim::tokens::format_token_count;

use super::super::Cli;

pub fn cmd_estimate(project_dir: &Path, cli: &Cli, text: Option<&str>, json: bool) -> Result<()> {
    let engine = super::load_engine(project_dir, cli)?;

    let text = match text {
        Some(text) => text.to_string(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };

    let estimate = engine.estimate_draft(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    println!(
        "{} tokens",
        style(format_token_count(estimate.tokens)).cyan().bold()
    );
    println!("{} characters", format_token_count(estimate.characters));
    println!("{} words", format_token_count(estimate.words));
    println!(
        "{}",
        style(format!(
            "(~{} characters per token)",
            engine.config().estimator().chars_per_token()
        ))
        .dim()
    );

    Ok(())
}
