use agentcore::cli::{Cli, Commands};
use agentcore::services::{SummaryFormat, SummaryLength};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_parse_summarize_with_options() {
    let cli = Cli::try_parse_from([
        "agentcore", "summarize", "Some text", "--length", "short", "--format", "bullets",
    ])
    .unwrap();

    match cli.command {
        Commands::Summarize { content, length, format } => {
            assert_eq!(content, "Some text");
            assert_eq!(length, SummaryLength::Short);
            assert_eq!(format, SummaryFormat::Bullets);
        }
        _ => panic!("Wrong command"),
    }
    assert!(!cli.json);
}

#[test]
fn test_summarize_defaults() {
    let cli = Cli::try_parse_from(["agentcore", "summarize", "-"]).unwrap();
    match cli.command {
        Commands::Summarize { content, length, format } => {
            assert_eq!(content, "-");
            assert_eq!(length, SummaryLength::Medium);
            assert_eq!(format, SummaryFormat::Paragraph);
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_invalid_summary_length_rejected() {
    assert!(Cli::try_parse_from(["agentcore", "summarize", "x", "--length", "huge"]).is_err());
}

#[test]
fn test_parse_extract_fields_are_comma_separated() {
    let cli = Cli::try_parse_from([
        "agentcore", "--json", "extract", "Ada, London", "--fields", "name,city",
    ])
    .unwrap();

    assert!(cli.json);
    match cli.command {
        Commands::Extract { fields, .. } => assert_eq!(fields, vec!["name", "city"]),
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_extract_requires_fields() {
    assert!(Cli::try_parse_from(["agentcore", "extract", "text"]).is_err());
}

#[test]
fn test_parse_generate_stream() {
    let cli = Cli::try_parse_from([
        "agentcore", "generate", "A poem", "--tone", "playful", "--stream",
    ])
    .unwrap();

    match cli.command {
        Commands::Generate { prompt, tone, style, stream, .. } => {
            assert_eq!(prompt, "A poem");
            assert_eq!(tone.as_deref(), Some("playful"));
            assert!(style.is_none());
            assert!(stream);
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_translate_and_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "agentcore", "translate", "Hello", "--to", "French", "--verbose", "--json",
    ])
    .unwrap();

    assert!(cli.verbose);
    assert!(cli.json);
    match cli.command {
        Commands::Translate { text, to, from } => {
            assert_eq!(text, "Hello");
            assert_eq!(to, "French");
            assert!(from.is_none());
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_orchestrate() {
    let cli = Cli::try_parse_from([
        "agentcore", "--config", "custom.yaml", "orchestrate", "plan.yaml", "--dry-run",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
    match cli.command {
        Commands::Orchestrate { plan, dry_run } => {
            assert_eq!(plan, PathBuf::from("plan.yaml"));
            assert!(dry_run);
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_agents() {
    let cli = Cli::try_parse_from(["agentcore", "agents"]).unwrap();
    assert!(matches!(cli.command, Commands::Agents));
}
