//! Executable plan wrapper and its serialized description.
//!
//! `ExecutionPlan` pins the plan root and the optimizer-latency field the
//! optimize phase writes under a scoped timer. `describe()` flattens the
//! reachable graph (data deps and branch references) into a
//! `PlanDescription` for EXPLAIN output; when the statement is PROFILE the
//! per-node executor stats collected during the run are folded in.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::core::GraphResult;

use super::node::{NodeBody, NodeId, PlanArena};

/// Per-node execution statistics surfaced by PROFILE.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ProfileStats {
    pub rows: usize,
    pub exec_duration_us: u64,
}

/// Branch references of a control-flow node, serialized for EXPLAIN.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BranchInfo {
    Select {
        then_branch: NodeId,
        otherwise_branch: NodeId,
    },
    Loop {
        body: NodeId,
    },
}

/// Serialized form of one plan node.
#[derive(Debug, Clone, Serialize)]
pub struct PlanNodeDescription {
    pub id: NodeId,
    pub name: String,
    pub output_var: String,
    pub col_names: Vec<String>,
    pub dependencies: Vec<NodeId>,
    /// Expression or operator detail rendered as text, when the node has one.
    pub details: Option<String>,
    pub branch_info: Option<BranchInfo>,
    pub profile: Option<ProfileStats>,
}

/// Serialized form of a whole plan, the `plan_desc` of a response.
#[derive(Debug, Clone, Serialize)]
pub struct PlanDescription {
    pub root: NodeId,
    pub nodes: Vec<PlanNodeDescription>,
    pub optimize_time_in_us: u64,
}

/// The executable plan of one query.
#[derive(Debug)]
pub struct ExecutionPlan {
    root: NodeId,
    optimize_time_in_us: Arc<AtomicU64>,
}

impl ExecutionPlan {
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            optimize_time_in_us: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Shared handle the optimize phase's scoped timer writes into.
    pub fn optimize_time_handle(&self) -> Arc<AtomicU64> {
        self.optimize_time_in_us.clone()
    }

    pub fn optimize_time_in_us(&self) -> u64 {
        self.optimize_time_in_us.load(Ordering::Relaxed)
    }

    /// Serialize the reachable plan graph. `profiles` carries per-node
    /// executor stats for PROFILE requests; pass an empty map otherwise.
    pub fn describe(
        &self,
        arena: &PlanArena,
        profiles: &HashMap<NodeId, ProfileStats>,
    ) -> GraphResult<PlanDescription> {
        let mut nodes = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue = VecDeque::from([self.root]);

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let node = arena.node(id)?;

            let details = match node.body() {
                NodeBody::Select { condition, .. } | NodeBody::Loop { condition, .. } => {
                    Some(format!("condition: {}", condition.text()))
                }
                NodeBody::Filter { condition } => Some(format!("condition: {}", condition.text())),
                NodeBody::Project { columns } => Some(
                    columns
                        .iter()
                        .map(|c| format!("{} AS {}", c.expr.text(), c.alias))
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                NodeBody::Limit { count } => Some(format!("count: {}", count)),
                NodeBody::Argument { alias } => Some(format!("alias: {}", alias)),
                NodeBody::GetNeighbors { space } => Some(format!("space: {}", space)),
                NodeBody::Start | NodeBody::PassThrough => None,
            };

            let branch_info = match node.body() {
                NodeBody::Select {
                    then_branch,
                    otherwise_branch,
                    ..
                } => Some(BranchInfo::Select {
                    then_branch: *then_branch,
                    otherwise_branch: *otherwise_branch,
                }),
                NodeBody::Loop { body, .. } => Some(BranchInfo::Loop { body: *body }),
                _ => None,
            };

            nodes.push(PlanNodeDescription {
                id,
                name: node.kind().name().to_string(),
                output_var: node.output_var().to_string(),
                col_names: node.col_names().to_vec(),
                dependencies: node.deps().to_vec(),
                details,
                branch_info,
                profile: profiles.get(&id).copied(),
            });

            queue.extend(node.deps().iter().copied());
            queue.extend(node.branch_refs());
        }

        nodes.sort_by_key(|n| n.id);
        Ok(PlanDescription {
            root: self.root,
            nodes,
            optimize_time_in_us: self.optimize_time_in_us(),
        })
    }

    /// Indented dependency dump for debug logging.
    pub fn format_dependency_tree(&self, arena: &PlanArena) -> String {
        let mut output = String::new();
        self.append_node(arena, self.root, 0, &mut output);
        output
    }

    fn append_node(&self, arena: &PlanArena, id: NodeId, spaces: usize, output: &mut String) {
        let indent = " ".repeat(spaces);
        match arena.node(id) {
            Ok(node) => {
                output.push_str(&format!(
                    "{}[{}, {}, out: {}]\n",
                    indent,
                    id,
                    node.kind().name(),
                    node.output_var()
                ));
                for dep in node.deps() {
                    self.append_node(arena, *dep, spaces + 2, output);
                }
                if node.kind().is_control() {
                    for branch in node.branch_refs() {
                        output.push_str(&format!("{}  -> branch:\n", indent));
                        self.append_node(arena, branch, spaces + 4, output);
                    }
                }
            }
            Err(_) => {
                output.push_str(&format!("{}[{} <missing>]\n", indent, id));
            }
        }
    }
}
