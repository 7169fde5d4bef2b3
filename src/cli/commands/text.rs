//! Single-agent text commands.

use anyhow::{Context, Result};
use futures::StreamExt;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Read, Write};

use crate::cli::output::{output, CommandOutput};
use crate::services::specialists::ContentGenerationAgent;
use crate::services::{AgentManager, GenerationOptions, SummaryOptions};

/// Resolve a text argument; `-` reads all of stdin.
pub fn read_input(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read input from stdin")?;
    Ok(buffer)
}

#[derive(Debug, Serialize)]
pub struct TextOutput {
    pub agent: &'static str,
    pub text: String,
}

impl CommandOutput for TextOutput {
    fn to_human(&self) -> String {
        self.text.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractOutput {
    pub fields: Map<String, Value>,
}

impl CommandOutput for ExtractOutput {
    fn to_human(&self) -> String {
        serde_json::to_string_pretty(&self.fields).unwrap_or_default()
    }

    fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

pub async fn summarize(manager: &AgentManager, content: &str, options: SummaryOptions, json: bool) -> Result<()> {
    let content = read_input(content)?;
    let text = manager.summarize(&content, options).await?;
    output(&TextOutput { agent: "summarizer", text }, json);
    Ok(())
}

pub async fn analyze(manager: &AgentManager, content: &str, aspects: &[String], json: bool) -> Result<()> {
    let content = read_input(content)?;
    let text = manager.analyze(&content, aspects).await?;
    output(&TextOutput { agent: "analyzer", text }, json);
    Ok(())
}

pub async fn ask(manager: &AgentManager, question: &str, context: Option<&str>, json: bool) -> Result<()> {
    let question = read_input(question)?;
    let text = manager.ask_question(&question, context).await?;
    output(&TextOutput { agent: "qa", text }, json);
    Ok(())
}

pub async fn translate(
    manager: &AgentManager,
    text: &str,
    target: &str,
    source: Option<&str>,
    json: bool,
) -> Result<()> {
    let text = read_input(text)?;
    let translated = manager.translate(&text, target, source).await?;
    output(&TextOutput { agent: "translator", text: translated }, json);
    Ok(())
}

pub async fn extract(manager: &AgentManager, content: &str, fields: &[String], json: bool) -> Result<()> {
    let content = read_input(content)?;
    let fields = manager.extract(&content, fields).await?;
    output(&ExtractOutput { fields }, json);
    Ok(())
}

/// Generate content. With `stream`, fragments go straight to stdout and
/// `--json` is ignored.
pub async fn generate(
    manager: &AgentManager,
    prompt: &str,
    options: &GenerationOptions,
    stream: bool,
    json: bool,
) -> Result<()> {
    let prompt = read_input(prompt)?;

    if !stream {
        let text = manager.generate(&prompt, options).await?;
        output(&TextOutput { agent: "generator", text }, json);
        return Ok(());
    }

    let generator = manager.generator();
    let prompt = ContentGenerationAgent::build_prompt(&prompt, options);
    let mut fragments = generator.generate_stream(&prompt);
    let mut stdout = io::stdout();
    while let Some(fragment) = fragments.next().await {
        write!(stdout, "{}", fragment?)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_input_passes_through() {
        assert_eq!(read_input("hello").unwrap(), "hello");
    }

    #[test]
    fn test_extract_output_json_is_flat() {
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::from("Ada"));
        let json = ExtractOutput { fields }.to_json();
        assert_eq!(json["name"], "Ada");
    }
}
