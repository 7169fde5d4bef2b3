use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::AgentResult;
use crate::domain::models::AgentConfig;
use crate::domain::ports::Agent;
use crate::services::model_agent::ModelAgent;

use super::{delegate_agent, Specialist};

const SYSTEM_PROMPT: &str = "You are an expert summarizer. Produce accurate, faithful summaries \
that capture the key points of the source without adding information that is not in it.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    fn instruction(self) -> &'static str {
        match self {
            Self::Short => "in 2-3 sentences",
            Self::Medium => "in one or two paragraphs",
            Self::Long => "in detail, covering every major point",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    #[default]
    Paragraph,
    Bullets,
    Structured,
}

impl SummaryFormat {
    fn instruction(self) -> &'static str {
        match self {
            Self::Paragraph => "Write it as flowing prose.",
            Self::Bullets => "Format it as a bulleted list of key points.",
            Self::Structured => {
                "Structure it with headings for the overview, key points, and conclusions."
            }
        }
    }
}

macro_rules! impl_option_str {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("invalid ", stringify!($ty), " '{}', expected one of: ", $($name, " "),+),
                        other
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $(Self::$variant => $name,)+
                })
            }
        }
    };
}

impl_option_str!(SummaryLength { Short => "short", Medium => "medium", Long => "long" });
impl_option_str!(SummaryFormat {
    Paragraph => "paragraph",
    Bullets => "bullets",
    Structured => "structured",
});

/// How a summary should be shaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    pub length: SummaryLength,
    pub format: SummaryFormat,
}

/// Summarizes text (temperature 0.3)
pub struct SummarizationAgent {
    inner: ModelAgent,
}

impl Specialist for SummarizationAgent {
    const ID: &'static str = "summarizer";

    fn agent_config(model: &str) -> AgentConfig {
        AgentConfig::new("Summarizer", model)
            .with_description("Condenses long text into faithful summaries")
            .with_temperature(0.3)
            .with_system_prompt(SYSTEM_PROMPT)
    }

    fn from_model_agent(agent: ModelAgent) -> Self {
        Self { inner: agent }
    }
}

delegate_agent!(SummarizationAgent);

impl SummarizationAgent {
    pub async fn summarize(&self, content: &str, options: SummaryOptions) -> AgentResult<String> {
        let prompt = format!(
            "Summarize the following content {}. {}\n\nContent:\n{}",
            options.length.instruction(),
            options.format.instruction(),
            content
        );
        self.process(&prompt).await.map(|response| response.content)
    }
}
