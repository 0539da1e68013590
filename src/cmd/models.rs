//! Model catalog listing (`cwsim models`).

use anyhow::Result;
use console::style;
use std::path::Path;

use cwsim::tokens::format_token_count;

use super::super::Cli;

pub fn cmd_models(project_dir: &Path, cli: &Cli) -> Result<()> {
    let engine = super::load_engine(project_dir, cli)?;
    let config = engine.config();
    let default_id = &config.default_model().id;

    println!();
    println!("Models");
    println!("======");
    println!();

    for model in config.catalog().iter() {
        let marker = if &model.id == default_id { "*" } else { " " };
        println!(
            "{} {:<22} {:<14} {:>8} tokens",
            marker,
            style(&model.id).cyan(),
            model.name,
            format_token_count(model.context_window)
        );
        if !model.description.is_empty() {
            println!("    {}", style(&model.description).dim());
        }
    }

    println!();
    println!("* starting model");
    Ok(())
}
