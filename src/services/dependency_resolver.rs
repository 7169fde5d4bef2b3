use std::collections::{HashMap, HashSet};

use crate::domain::errors::{OrchestrationError, PlanningResult};
use crate::domain::models::{OrchestrationPlan, OrchestrationTask};

/// Validates orchestration task sets and orders them into waves
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver;

// Standalone helper for cycle detection (no self needed)
fn detect_cycle_util<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(neighbor) {
                // Cycle detected: keep only the loop and close it
                if let Some(cycle_start) = path.iter().position(|&id| id == neighbor) {
                    path.drain(0..cycle_start);
                    path.push(neighbor);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    false
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Reject duplicate ids, references to unknown tasks, and cycles.
    pub fn validate(&self, tasks: &[OrchestrationTask]) -> PlanningResult<()> {
        let mut ids = HashSet::new();
        for task in tasks {
            if !ids.insert(task.id.as_str()) {
                return Err(OrchestrationError::DuplicateTask(task.id.clone()));
            }
        }

        for task in tasks {
            if let Some(missing) = task.depends_on.iter().find(|dep| !ids.contains(dep.as_str())) {
                return Err(OrchestrationError::UnknownDependency {
                    task: task.id.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        if let Some(cycle) = self.detect_cycle(tasks) {
            return Err(OrchestrationError::DependencyCycle(cycle));
        }

        Ok(())
    }

    /// Find a dependency cycle, returned as a closed path (`a, b, a`).
    ///
    /// Traversal follows submission order, so the reported cycle is stable.
    pub fn detect_cycle(&self, tasks: &[OrchestrationTask]) -> Option<Vec<String>> {
        let graph: HashMap<&str, Vec<&str>> = tasks
            .iter()
            .map(|task| {
                (
                    task.id.as_str(),
                    task.depends_on.iter().map(String::as_str).collect(),
                )
            })
            .collect();

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for task in tasks {
            let id = task.id.as_str();
            if !visited.contains(id)
                && detect_cycle_util(id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path.into_iter().map(str::to_string).collect());
            }
        }

        None
    }

    /// Validate, then group tasks into waves.
    ///
    /// Wave 0 holds tasks without dependencies; wave k holds tasks whose
    /// dependencies all sit in earlier waves. Within a wave, tasks keep
    /// their submission order.
    pub fn plan(&self, tasks: &[OrchestrationTask]) -> PlanningResult<OrchestrationPlan> {
        self.validate(tasks)?;

        let mut placed: HashSet<&str> = HashSet::with_capacity(tasks.len());
        let mut remaining: Vec<&OrchestrationTask> = tasks.iter().collect();
        let mut waves = Vec::new();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = remaining
                .into_iter()
                .partition(|task| task.depends_on.iter().all(|dep| placed.contains(dep.as_str())));

            if ready.is_empty() {
                // Unreachable after validation; report the blocked set as a cycle.
                return Err(OrchestrationError::DependencyCycle(
                    blocked.iter().map(|task| task.id.clone()).collect(),
                ));
            }

            placed.extend(ready.iter().map(|task| task.id.as_str()));
            waves.push(ready.iter().map(|task| task.id.clone()).collect());
            remaining = blocked;
        }

        Ok(OrchestrationPlan { waves })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, deps: &[&str]) -> OrchestrationTask {
        deps.iter()
            .fold(OrchestrationTask::new(id, "agent", "input"), |t, dep| t.depends_on(*dep))
    }

    #[test]
    fn test_plan_chain() {
        let tasks = vec![task("c", &["b"]), task("a", &[]), task("b", &["a"])];
        let plan = DependencyResolver::new().plan(&tasks).unwrap();
        assert_eq!(plan.waves, vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_plan_diamond_keeps_submission_order() {
        let tasks = vec![
            task("root", &[]),
            task("right", &["root"]),
            task("left", &["root"]),
            task("join", &["left", "right"]),
        ];
        let plan = DependencyResolver::new().plan(&tasks).unwrap();
        assert_eq!(
            plan.waves,
            vec![vec!["root"], vec!["right", "left"], vec!["join"]]
        );
    }

    #[test]
    fn test_wave_uses_earlier_waves_only() {
        // b depends on a, which is in the same pass; b must wait a wave.
        let tasks = vec![task("a", &[]), task("b", &["a"]), task("c", &[])];
        let plan = DependencyResolver::new().plan(&tasks).unwrap();
        assert_eq!(plan.waves, vec![vec!["a", "c"], vec!["b"]]);
    }

    #[test]
    fn test_empty_plan() {
        let plan = DependencyResolver::new().plan(&[]).unwrap();
        assert_eq!(plan.wave_count(), 0);
    }

    #[test]
    fn test_duplicate_ids() {
        let tasks = vec![task("a", &[]), task("a", &[])];
        assert_eq!(
            DependencyResolver::new().validate(&tasks),
            Err(OrchestrationError::DuplicateTask("a".to_string()))
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let tasks = vec![task("a", &["ghost"])];
        assert_eq!(
            DependencyResolver::new().validate(&tasks),
            Err(OrchestrationError::UnknownDependency {
                task: "a".to_string(),
                dependency: "ghost".to_string(),
            })
        );
    }

    #[test]
    fn test_cycle_detected() {
        let tasks = vec![task("a", &["c"]), task("b", &["a"]), task("c", &["b"])];
        match DependencyResolver::new().plan(&tasks) {
            Err(OrchestrationError::DependencyCycle(path)) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 4);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let tasks = vec![task("a", &["a"])];
        assert_eq!(
            DependencyResolver::new().detect_cycle(&tasks),
            Some(vec!["a".to_string(), "a".to_string()])
        );
    }
}
