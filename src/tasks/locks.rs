//! Lock evaluation over the tasks of one goal.
//!
//! Tasks live in an arena graph; an edge runs from a prerequisite to the task
//! that waits on it. A task without explicit dependencies waits on every task
//! in the previous `order` position. Explicit dependencies replace that
//! chain entirely, and an explicit empty set never locks. Nothing here is
//! cached: the graph is rebuilt from the current rows on every read.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use std::collections::{BTreeMap, HashMap};

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;

/// Stands in for the id of a task that is validated before it is stored.
pub const UNSAVED_TASK_ID: TaskID = 0;

struct TaskNode {
    id: TaskID,
    status: TaskStatus,
}

pub struct DependencyGraph {
    graph: DiGraph<TaskNode, ()>,
    nodes: HashMap<TaskID, NodeIndex>,
}

impl DependencyGraph {
    pub fn build(tasks: &[Task]) -> DependencyGraph {
        let mut graph = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut nodes = HashMap::with_capacity(tasks.len());
        let mut by_order: BTreeMap<i64, Vec<NodeIndex>> = BTreeMap::new();

        for task in tasks {
            let node = graph.add_node(TaskNode {
                id: task.id,
                status: task.status,
            });
            nodes.insert(task.id, node);
            by_order.entry(task.order).or_default().push(node);
        }

        for task in tasks {
            let node = nodes[&task.id];

            match &task.dependencies {
                Some(dependencies) => {
                    for dependency in dependencies {
                        // Unknown ids cannot lock anything.
                        if let Some(&prerequisite) = nodes.get(dependency) {
                            graph.add_edge(prerequisite, node, ());
                        }
                    }
                }
                None => {
                    if let Some((_, previous)) = by_order.range(..task.order).next_back() {
                        for &prerequisite in previous {
                            graph.add_edge(prerequisite, node, ());
                        }
                    }
                }
            }
        }

        DependencyGraph { graph, nodes }
    }

    /// The effective prerequisites of a task, implicit or explicit.
    pub fn dependencies_of(&self, task_id: TaskID) -> Vec<TaskID> {
        self.prerequisites(task_id, |_| true)
    }

    /// Prerequisites that are not yet completed.
    pub fn blockers(&self, task_id: TaskID) -> Vec<TaskID> {
        self.prerequisites(task_id, |node| node.status != TaskStatus::Completed)
    }

    pub fn is_locked(&self, task_id: TaskID) -> bool {
        !self.blockers(task_id).is_empty()
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    pub fn view(&self, task: Task) -> TaskView {
        let blocked_by = self.blockers(task.id);

        TaskView {
            is_locked: !blocked_by.is_empty(),
            blocked_by,
            task,
        }
    }

    fn prerequisites(&self, task_id: TaskID, keep: impl Fn(&TaskNode) -> bool) -> Vec<TaskID> {
        let node = match self.nodes.get(&task_id) {
            Some(node) => *node,
            None => return vec![],
        };

        let mut ids: Vec<TaskID> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|prerequisite| &self.graph[prerequisite])
            .filter(|prerequisite| keep(prerequisite))
            .map(|prerequisite| prerequisite.id)
            .collect();
        ids.sort_unstable();
        ids.dedup();

        ids
    }
}

/// Lock state for every task of a goal, in the order given.
pub fn task_views(tasks: Vec<Task>) -> Vec<TaskView> {
    let graph = DependencyGraph::build(&tasks);

    tasks.into_iter().map(|task| graph.view(task)).collect()
}

/// Checks a proposed explicit dependency set for `task_id` against the other
/// tasks of its goal and returns it sorted and deduplicated.
pub fn normalize_dependencies(
    task_id: TaskID,
    dependencies: &[TaskID],
    goal_tasks: &[Task],
) -> InternalResult<Vec<TaskID>> {
    let mut normalized = dependencies.to_vec();
    normalized.sort_unstable();
    normalized.dedup();

    for dependency in &normalized {
        // The unsaved placeholder id is never in `goal_tasks`.
        if !goal_tasks.iter().any(|task| task.id == *dependency) {
            return Err(InternalError::validation(format!(
                "Dependency task {} not found in this goal",
                dependency
            )));
        }

        if *dependency == task_id {
            return Err(InternalError::validation(format!(
                "Task {} cannot depend on itself",
                task_id
            )));
        }
    }

    Ok(normalized)
}

/// Rejects a task layout whose effective dependencies form a cycle.
pub fn ensure_acyclic(goal_tasks: &[Task]) -> InternalResult<()> {
    if DependencyGraph::build(goal_tasks).has_cycle() {
        return Err(InternalError::validation(
            "These dependencies would create a cycle between tasks",
        ));
    }

    Ok(())
}
