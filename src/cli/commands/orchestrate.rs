//! Orchestrate command: run a task graph from a plan file.

use anyhow::{bail, Context, Result};
use comfy_table::Cell;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::mpsc;

use crate::cli::output::{list_table, output, truncate, CommandOutput};
use crate::domain::models::{
    OrchestrationPlan, OrchestrationResult, OrchestrationTask, TaskOutcome,
};
use crate::services::orchestrator::OrchestrationEvent;
use crate::services::{estimate_cost, AgentManager, CostSummary};

/// On-disk plan: a top-level `tasks` list.
#[derive(Debug, Deserialize)]
pub struct PlanFile {
    pub tasks: Vec<OrchestrationTask>,
}

impl PlanFile {
    /// Parse a plan; `.json` files as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&raw).with_context(|| format!("Invalid JSON plan {}", path.display()))
        } else {
            serde_yaml::from_str(&raw).with_context(|| format!("Invalid YAML plan {}", path.display()))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub waves: Vec<Vec<String>>,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["wave", "tasks"]);
        for (index, wave) in self.waves.iter().enumerate() {
            table.add_row(vec![Cell::new(index + 1), Cell::new(wave.join(", "))]);
        }
        format!("{} wave(s):\n{table}", self.waves.len())
    }
}

impl From<OrchestrationPlan> for PlanOutput {
    fn from(plan: OrchestrationPlan) -> Self {
        Self { waves: plan.waves }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskRow {
    pub id: String,
    pub agent_id: String,
    pub status: &'static str,
    /// Reply text for completed tasks, failure message otherwise
    pub detail: String,
    pub tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OrchestrateOutput {
    pub tasks: Vec<TaskRow>,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
}

impl OrchestrateOutput {
    /// Rows in plan-file order.
    pub fn new(tasks: &[OrchestrationTask], result: &OrchestrationResult) -> Self {
        let mut costs = CostSummary::default();
        let rows = tasks
            .iter()
            .map(|task| {
                let (status, detail, tokens, cost_usd) = match result.get(&task.id) {
                    Some(TaskOutcome::Completed { response }) => {
                        let usage = response.metadata.usage;
                        costs.record(&response.metadata.model, &usage);
                        (
                            "completed",
                            response.content.clone(),
                            usage.total,
                            estimate_cost(&response.metadata.model, &usage),
                        )
                    }
                    Some(TaskOutcome::Failed { failure }) => {
                        let status = if failure.is_skip() { "skipped" } else { "failed" };
                        (status, failure.message.clone(), 0, None)
                    }
                    None => ("missing", String::new(), 0, None),
                };
                TaskRow {
                    id: task.id.clone(),
                    agent_id: task.agent_id.clone(),
                    status,
                    detail,
                    tokens,
                    cost_usd,
                }
            })
            .collect();

        Self {
            tasks: rows,
            completed: result.completed_count(),
            failed: result.failed_count(),
            skipped: result.skipped_count(),
            total_tokens: result.total_usage().total,
            total_cost_usd: costs.total_usd,
        }
    }
}

impl CommandOutput for OrchestrateOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["task", "agent", "status", "tokens", "output"]);
        for row in &self.tasks {
            table.add_row(vec![
                Cell::new(&row.id),
                Cell::new(&row.agent_id),
                Cell::new(row.status),
                Cell::new(row.tokens),
                Cell::new(truncate(&row.detail, 60)),
            ]);
        }
        format!(
            "{table}\n\n{} completed, {} failed, {} skipped; {} tokens, ~${:.4}",
            self.completed, self.failed, self.skipped, self.total_tokens, self.total_cost_usd
        )
    }
}

fn describe(event: &OrchestrationEvent) -> Option<String> {
    match event {
        OrchestrationEvent::Planned { total_tasks, wave_count } => {
            Some(format!("Planned {total_tasks} task(s) in {wave_count} wave(s)"))
        }
        OrchestrationEvent::WaveStarted { wave_number, task_count } => {
            Some(format!("Wave {wave_number}: running {task_count} task(s)"))
        }
        OrchestrationEvent::TaskCompleted { task_id, agent_id } => {
            Some(format!("  done    {task_id} ({agent_id})"))
        }
        OrchestrationEvent::TaskFailed { task_id, error } => Some(format!("  failed  {task_id}: {error}")),
        OrchestrationEvent::TaskSkipped { task_id, dependency } => {
            Some(format!("  skipped {task_id} (needs {dependency})"))
        }
        OrchestrationEvent::StateChanged { .. } | OrchestrationEvent::WaveCompleted { .. } => None,
    }
}

pub async fn execute(manager: &AgentManager, plan_path: &Path, dry_run: bool, json: bool) -> Result<()> {
    let plan = PlanFile::load(plan_path)?;

    if dry_run {
        let waves = manager.orchestrator().plan(&plan.tasks)?;
        output(&PlanOutput::from(waves), json);
        return Ok(());
    }

    manager.register_defaults();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let progress = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if !json {
                if let Some(line) = describe(&event) {
                    eprintln!("{line}");
                }
            }
        }
    });

    let orchestrator = manager.orchestrator().with_events(events_tx);
    let result = orchestrator.execute(&plan.tasks).await;
    drop(orchestrator);
    let _ = progress.await;
    let result = result?;

    output(&OrchestrateOutput::new(&plan.tasks, &result), json);

    if !result.all_completed() {
        bail!(
            "{} of {} task(s) did not complete",
            result.len() - result.completed_count(),
            result.len()
        );
    }
    Ok(())
}
