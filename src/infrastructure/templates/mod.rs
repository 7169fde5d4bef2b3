//! Prompt templating

pub mod prompt_template;

pub use prompt_template::PromptTemplate;
