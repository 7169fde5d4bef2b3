//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::services::{SummaryFormat, SummaryLength};

#[derive(Parser, Debug)]
#[command(name = "agentcore")]
#[command(about = "Run specialized LLM agents and dependency-ordered agent task graphs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Load configuration from this file instead of .agentcore/
    #[arg(short, long, global = true, env = "AGENTCORE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Subcommands. Text arguments of `-` are read from stdin.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize text
    Summarize {
        /// Text to summarize
        content: String,

        /// short, medium, or long
        #[arg(short, long, default_value_t = SummaryLength::Medium)]
        length: SummaryLength,

        /// paragraph, bullets, or structured
        #[arg(short, long, default_value_t = SummaryFormat::Paragraph)]
        format: SummaryFormat,
    },

    /// Analyze text, optionally focusing on specific aspects
    Analyze {
        /// Text to analyze
        content: String,

        /// Aspects to cover (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        aspects: Vec<String>,
    },

    /// Generate content from a prompt
    Generate {
        /// What to write
        prompt: String,

        #[arg(long)]
        tone: Option<String>,

        #[arg(long)]
        style: Option<String>,

        #[arg(long)]
        length: Option<String>,

        /// Print fragments as they arrive
        #[arg(short, long)]
        stream: bool,
    },

    /// Answer a question
    Ask {
        question: String,

        /// Context the answer should be based on
        #[arg(short = 'C', long)]
        context: Option<String>,
    },

    /// Translate text
    Translate {
        text: String,

        /// Target language
        #[arg(short, long)]
        to: String,

        /// Source language (detected when omitted)
        #[arg(short, long)]
        from: Option<String>,
    },

    /// Extract named fields from text as JSON
    Extract {
        content: String,

        /// Field names (comma-separated)
        #[arg(short = 'F', long, value_delimiter = ',', required = true)]
        fields: Vec<String>,
    },

    /// Run a task graph from a YAML or JSON plan file
    Orchestrate {
        /// Plan file with a top-level `tasks` list
        plan: PathBuf,

        /// Only print the execution waves
        #[arg(long)]
        dry_run: bool,
    },

    /// List the built-in agents
    Agents,
}
