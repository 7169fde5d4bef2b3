//! Command-line interface over [`AgentManager`].

pub mod commands;
pub mod output;
pub mod types;

use anyhow::Result;

use crate::services::{AgentManager, GenerationOptions, SummaryOptions};

pub use types::{Cli, Commands};

/// Dispatch a parsed command.
pub async fn run(command: Commands, manager: &AgentManager, json: bool) -> Result<()> {
    match command {
        Commands::Summarize { content, length, format } => {
            commands::text::summarize(manager, &content, SummaryOptions { length, format }, json).await
        }
        Commands::Analyze { content, aspects } => {
            commands::text::analyze(manager, &content, &aspects, json).await
        }
        Commands::Generate { prompt, tone, style, length, stream } => {
            let options = GenerationOptions { tone, style, length };
            commands::text::generate(manager, &prompt, &options, stream, json).await
        }
        Commands::Ask { question, context } => {
            commands::text::ask(manager, &question, context.as_deref(), json).await
        }
        Commands::Translate { text, to, from } => {
            commands::text::translate(manager, &text, &to, from.as_deref(), json).await
        }
        Commands::Extract { content, fields } => {
            commands::text::extract(manager, &content, &fields, json).await
        }
        Commands::Orchestrate { plan, dry_run } => {
            commands::orchestrate::execute(manager, &plan, dry_run, json).await
        }
        Commands::Agents => commands::agents::execute(manager, json),
    }
}

/// Print `err` with its causes and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json: bool) -> ! {
    if json {
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
