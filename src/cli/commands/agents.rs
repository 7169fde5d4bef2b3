//! Agents command: list the registered agents.

use anyhow::Result;
use comfy_table::Cell;
use serde::Serialize;

use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::ports::Agent;
use crate::services::AgentManager;

#[derive(Debug, Serialize)]
pub struct AgentRow {
    pub id: String,
    pub name: String,
    pub model: String,
    pub temperature: f32,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct AgentListOutput {
    pub agents: Vec<AgentRow>,
}

impl CommandOutput for AgentListOutput {
    fn to_human(&self) -> String {
        if self.agents.is_empty() {
            return "No agents registered.".to_string();
        }

        let mut table = list_table(&["id", "name", "model", "temp", "description"]);
        for agent in &self.agents {
            table.add_row(vec![
                Cell::new(&agent.id),
                Cell::new(&agent.name),
                Cell::new(&agent.model),
                Cell::new(format!("{:.1}", agent.temperature)),
                Cell::new(&agent.description),
            ]);
        }
        format!("{} agent(s):\n{table}", self.agents.len())
    }
}

impl AgentListOutput {
    pub fn from_manager(manager: &AgentManager) -> Self {
        manager.register_defaults();
        let factory = manager.factory();
        let agents = factory
            .list_agents()
            .into_iter()
            .filter_map(|id| {
                let agent = factory.get_agent(&id)?;
                let config = agent.config();
                Some(AgentRow {
                    name: config.name.clone(),
                    model: config.model.clone(),
                    temperature: config.temperature,
                    description: config.description.clone(),
                    id,
                })
            })
            .collect();
        Self { agents }
    }
}

pub fn execute(manager: &AgentManager, json: bool) -> Result<()> {
    output(&AgentListOutput::from_manager(manager), json);
    Ok(())
}
