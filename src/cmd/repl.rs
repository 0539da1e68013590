//! Line-oriented interactive session (`cwsim repl`).
//!
//! Each stdin line is either a slash command or plain text, which is sent as a
//! user message. Every add is preceded by an overflow forecast so the user sees
//! what is about to fall out of the window.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use cwsim::message::{Role, SAMPLE_CONVERSATION, find_by_prefix};
use cwsim::state::{Command, Session};
use cwsim::tokens::format_token_count;
use cwsim::ui::icons::{CHECK, CROSS, INFO};
use cwsim::ui::{
    render_breakdown, render_conversation, render_forecast, render_message, render_state,
    terminal_width,
};

use super::super::Cli;

const HELP: &str = "\
Commands:
  <text>                 add a user message
  /user <text>           add a user message
  /assistant <text>      add an assistant message
  /tool <text>           add a tool message
  /system <text>         add a system message
  /prompt <text>         replace the system prompt
  /remove <id-prefix>    remove a message
  /model <id>            switch model
  /models                list models
  /estimate <text>       preview a message without sending it
  /sample                add the sample conversation
  /reset                 clear the conversation
  /state                 show usage
  /messages              show the conversation
  /breakdown             show tokens by source
  /json                  print the state as JSON
  /help                  show this help
  /quit                  exit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Add { role: Role, content: String },
    Prompt(String),
    Remove(String),
    Model(String),
    Models,
    Estimate(String),
    Sample,
    Reset,
    State,
    Messages,
    Breakdown,
    Json,
    Help,
    Quit,
    Empty,
}

/// Parse one input line. Errors are messages for the user.
pub fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Add {
            role: Role::User,
            content: line.to_string(),
        });
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let require = |what: &str| -> Result<String, String> {
        if arg.is_empty() {
            Err(format!("/{} needs {}", name, what))
        } else {
            Ok(arg.to_string())
        }
    };

    match name.to_lowercase().as_str() {
        "user" | "assistant" | "tool" | "system" => {
            let role = name.parse::<Role>().map_err(|e| e.to_string())?;
            Ok(ReplCommand::Add {
                role,
                content: require("message text")?,
            })
        }
        "prompt" => Ok(ReplCommand::Prompt(require("prompt text")?)),
        "remove" | "rm" => Ok(ReplCommand::Remove(require("a message id")?)),
        "model" => Ok(ReplCommand::Model(require("a model id")?)),
        "models" => Ok(ReplCommand::Models),
        "estimate" => Ok(ReplCommand::Estimate(require("text")?)),
        "sample" => Ok(ReplCommand::Sample),
        "reset" | "clear" => Ok(ReplCommand::Reset),
        "state" => Ok(ReplCommand::State),
        "messages" | "list" => Ok(ReplCommand::Messages),
        "breakdown" => Ok(ReplCommand::Breakdown),
        "json" => Ok(ReplCommand::Json),
        "help" | "?" => Ok(ReplCommand::Help),
        "quit" | "exit" | "q" => Ok(ReplCommand::Quit),
        other => Err(format!("Unknown command '/{}'. Try /help.", other)),
    }
}

pub async fn cmd_repl(project_dir: &Path, cli: &Cli) -> Result<()> {
    let engine = super::load_engine(project_dir, cli)?;
    let mut session = Session::new(engine);
    let width = terminal_width();

    println!(
        "{} Type a message or /help. Starting on {}.",
        style("cwsim").cyan().bold(),
        session.state().model.name
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        match parse_line(&line) {
            Ok(ReplCommand::Quit) => break,
            Ok(command) => handle(&mut session, command, width)?,
            Err(message) => println!("{}{}", CROSS, message),
        }
    }

    Ok(())
}

fn handle(session: &mut Session, command: ReplCommand, width: usize) -> Result<()> {
    match command {
        ReplCommand::Add { role, content } => add(session, role, content, width),
        ReplCommand::Prompt(content) => {
            session.apply(Command::UpdateSystemPrompt(content));
            println!(
                "{}System prompt updated ({} tokens)",
                CHECK,
                session.state().system_prompt.token_count
            );
            print_state(session);
        }
        ReplCommand::Remove(prefix) => {
            match find_by_prefix(&session.state().messages, &prefix).map(|m| m.id) {
                Some(id) => {
                    session.apply(Command::RemoveMessage(id));
                    println!("{}Removed {}", CHECK, id.short());
                    print_state(session);
                }
                None => println!("{}No single message matches '{}'", CROSS, prefix),
            }
        }
        ReplCommand::Model(id) => match session.engine().config().model(&id).cloned() {
            Ok(model) => {
                println!(
                    "{}Switched to {} ({} tokens)",
                    CHECK,
                    model.name,
                    format_token_count(model.context_window)
                );
                session.apply(Command::ChangeModel(model));
                print_state(session);
            }
            Err(e) => println!("{}{}", CROSS, e),
        },
        ReplCommand::Models => {
            let current = &session.state().model.id;
            for model in session.engine().config().catalog().iter() {
                let marker = if &model.id == current { "*" } else { " " };
                println!(
                    "{} {:<22} {:>8} tokens",
                    marker,
                    model.id,
                    format_token_count(model.context_window)
                );
            }
        }
        ReplCommand::Estimate(text) => {
            let estimate = session.engine().estimate_draft(&text);
            println!(
                "{}{} tokens, {} characters, {} words",
                INFO, estimate.tokens, estimate.characters, estimate.words
            );
            if let Some(warning) = render_forecast(&session.forecast(&text)) {
                print!("{}", warning);
            }
        }
        ReplCommand::Sample => {
            for (role, content) in SAMPLE_CONVERSATION {
                session.apply(Command::add(role, content));
            }
            println!("{}Added the sample conversation", CHECK);
            print_state(session);
        }
        ReplCommand::Reset => {
            session.apply(Command::Reset);
            println!("{}Conversation cleared", CHECK);
            print_state(session);
        }
        ReplCommand::State => print_state(session),
        ReplCommand::Messages => print!("{}", render_conversation(session.state(), width)),
        ReplCommand::Breakdown => print!("{}", render_breakdown(&session.breakdown())),
        ReplCommand::Json => println!("{}", serde_json::to_string_pretty(session.state())?),
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit | ReplCommand::Empty => {}
    }
    Ok(())
}

fn add(session: &mut Session, role: Role, content: String, width: usize) {
    if content.trim().is_empty() {
        println!("{}Message is empty", CROSS);
        return;
    }

    if let Some(warning) = render_forecast(&session.forecast(&content)) {
        print!("{}", warning);
    }

    let state = session.apply(Command::AddMessage { role, content });
    if let Some(message) = state.messages.last() {
        print!("{}", render_message(message, width));
    }
    print_state(session);
}

fn print_state(session: &Session) {
    print!("{}", render_state(session.state(), &session.capacity()));
}
