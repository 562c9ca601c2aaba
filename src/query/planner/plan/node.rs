//! Plan nodes and the arena that owns them.
//!
//! Every plan node lives in the query context's [`PlanArena`] and is
//! addressed by a [`NodeId`] handle; nodes never own each other. Two kinds
//! of references exist between nodes:
//!
//! - `deps`: ordered data-dependency inputs. These form a DAG and drive the
//!   scheduler's indegree accounting.
//! - branch references (Select's then/otherwise, Loop's body): dispatch
//!   descriptors consumed by the control-flow machinery. They are not data
//!   edges and never contribute to indegree, which is what allows a loop
//!   body to reference nodes that data-depend on the Loop itself.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::core::{GraphResult, Status};
use crate::expression::Expression;

/// Arena handle of a plan node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of plan-node kinds. The tag stays introspectable because both
/// the scheduler and the executor factory dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlanNodeKind {
    Start,
    Select,
    Loop,
    PassThrough,
    Argument,
    Project,
    Filter,
    Limit,
    GetNeighbors,
}

impl PlanNodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            PlanNodeKind::Start => "Start",
            PlanNodeKind::Select => "Select",
            PlanNodeKind::Loop => "Loop",
            PlanNodeKind::PassThrough => "PassThrough",
            PlanNodeKind::Argument => "Argument",
            PlanNodeKind::Project => "Project",
            PlanNodeKind::Filter => "Filter",
            PlanNodeKind::Limit => "Limit",
            PlanNodeKind::GetNeighbors => "GetNeighbors",
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self, PlanNodeKind::Select | PlanNodeKind::Loop)
    }

    /// Nodes with no data-dependency inputs; they seed the ready frontier.
    pub fn is_source(&self) -> bool {
        matches!(self, PlanNodeKind::Start | PlanNodeKind::Argument)
    }
}

/// One projected column of a Project node.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectColumn {
    pub expr: Expression,
    pub alias: String,
}

/// Kind-specific payload of a plan node.
#[derive(Debug, Clone)]
pub enum NodeBody {
    Start,
    Select {
        condition: Expression,
        then_branch: NodeId,
        otherwise_branch: NodeId,
    },
    Loop {
        condition: Expression,
        body: NodeId,
        /// Variable the scheduler binds the iteration counter to before
        /// each condition evaluation and body dispatch.
        iter_alias: Option<String>,
    },
    PassThrough,
    Argument {
        alias: String,
    },
    Project {
        columns: Vec<ProjectColumn>,
    },
    Filter {
        condition: Expression,
    },
    Limit {
        count: u64,
    },
    GetNeighbors {
        space: String,
    },
}

impl NodeBody {
    pub fn kind(&self) -> PlanNodeKind {
        match self {
            NodeBody::Start => PlanNodeKind::Start,
            NodeBody::Select { .. } => PlanNodeKind::Select,
            NodeBody::Loop { .. } => PlanNodeKind::Loop,
            NodeBody::PassThrough => PlanNodeKind::PassThrough,
            NodeBody::Argument { .. } => PlanNodeKind::Argument,
            NodeBody::Project { .. } => PlanNodeKind::Project,
            NodeBody::Filter { .. } => PlanNodeKind::Filter,
            NodeBody::Limit { .. } => PlanNodeKind::Limit,
            NodeBody::GetNeighbors { .. } => PlanNodeKind::GetNeighbors,
        }
    }
}

/// A vertex of the plan DAG.
#[derive(Debug, Clone)]
pub struct PlanNode {
    id: NodeId,
    deps: Vec<NodeId>,
    output_var: String,
    col_names: Vec<String>,
    body: NodeBody,
}

impl PlanNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> PlanNodeKind {
        self.body.kind()
    }

    /// Ordered data-dependency inputs.
    pub fn deps(&self) -> &[NodeId] {
        &self.deps
    }

    /// First input; the common single-input shape.
    pub fn input(&self) -> Option<NodeId> {
        self.deps.first().copied()
    }

    pub fn output_var(&self) -> &str {
        &self.output_var
    }

    pub fn col_names(&self) -> &[String] {
        &self.col_names
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    /// Branch references carried by control-flow nodes. Dispatch hints for
    /// the scheduler, never data edges.
    pub fn branch_refs(&self) -> Vec<NodeId> {
        match &self.body {
            NodeBody::Select {
                then_branch,
                otherwise_branch,
                ..
            } => vec![*then_branch, *otherwise_branch],
            NodeBody::Loop { body, .. } => vec![*body],
            _ => Vec::new(),
        }
    }

    /// Condition expression of a Select or Loop node.
    pub fn condition(&self) -> Option<&Expression> {
        match &self.body {
            NodeBody::Select { condition, .. } | NodeBody::Loop { condition, .. } => {
                Some(condition)
            }
            _ => None,
        }
    }
}

/// Owner of every plan node of one query. Lives exactly as long as the
/// query context; handles into it must not be used across queries.
#[derive(Debug, Default)]
pub struct PlanArena {
    nodes: Vec<PlanNode>,
}

impl PlanArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> GraphResult<&PlanNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Status::error(format!("Plan node {} does not exist", id)))
    }

    pub(crate) fn insert(&mut self, deps: Vec<NodeId>, body: NodeBody) -> NodeId {
        let id = NodeId(self.nodes.len());
        let output_var = format!("__{}_{}", body.kind().name(), id.0);
        self.nodes.push(PlanNode {
            id,
            deps,
            output_var,
            col_names: Vec::new(),
            body,
        });
        id
    }

    /// Append a data-dependency edge from `id` to `dep`. Used to join
    /// independently planned subgraphs, e.g. chaining sequential sentences.
    pub fn add_dep(&mut self, id: NodeId, dep: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.deps.push(dep);
        }
    }

    pub fn set_output_var(&mut self, id: NodeId, name: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.output_var = name.into();
        }
    }

    pub fn set_col_names(&mut self, id: NodeId, names: Vec<String>) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.col_names = names;
        }
    }

    /// Deep-copy the subgraph rooted at `root` into fresh arena slots and
    /// return the new root. Sharing is preserved by identity: a node
    /// reachable along several paths is cloned exactly once. Branch
    /// references are cloned through the same mapping, so cloning must
    /// start from the subgraph root to keep them consistent.
    pub fn clone_subtree(&mut self, root: NodeId) -> GraphResult<NodeId> {
        let mut mapping = HashMap::new();
        self.clone_rec(root, &mut mapping)
    }

    fn clone_rec(
        &mut self,
        id: NodeId,
        mapping: &mut HashMap<NodeId, NodeId>,
    ) -> GraphResult<NodeId> {
        if let Some(mapped) = mapping.get(&id) {
            return Ok(*mapped);
        }

        let source = self.node(id)?.clone();

        let mut deps = Vec::with_capacity(source.deps.len());
        for dep in &source.deps {
            deps.push(self.clone_rec(*dep, mapping)?);
        }

        let body = match source.body {
            NodeBody::Select {
                condition,
                then_branch,
                otherwise_branch,
            } => NodeBody::Select {
                condition,
                then_branch: self.clone_rec(then_branch, mapping)?,
                otherwise_branch: self.clone_rec(otherwise_branch, mapping)?,
            },
            NodeBody::Loop {
                condition,
                body,
                iter_alias,
            } => NodeBody::Loop {
                condition,
                body: self.clone_rec(body, mapping)?,
                iter_alias,
            },
            other => other,
        };

        let clone_id = self.insert(deps, body);
        self.set_col_names(clone_id, source.col_names.clone());
        mapping.insert(id, clone_id);
        Ok(clone_id)
    }

    /// Structural checks over the subgraph reachable from `root`:
    /// data-dependency edges must form a DAG, only Start and Argument may
    /// have zero inputs, and output variable names must be unique except
    /// for PassThrough reusing its input's name.
    pub fn check_integrity(&self, root: NodeId) -> GraphResult<()> {
        self.node(root)?;

        // Cycle detection over data deps, iterative DFS with a color map.
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            InProgress,
            Done,
        }
        let mut colors: HashMap<NodeId, Color> = HashMap::new();
        let mut stack = vec![(root, false)];
        while let Some((id, children_done)) = stack.pop() {
            if children_done {
                colors.insert(id, Color::Done);
                continue;
            }
            match colors.get(&id) {
                Some(Color::Done) => continue,
                Some(Color::InProgress) => {
                    return Err(Status::error(format!(
                        "Cycle detected in plan at node {}",
                        id
                    )));
                }
                None => {}
            }
            colors.insert(id, Color::InProgress);
            stack.push((id, true));
            for dep in self.node(id)?.deps() {
                match colors.get(dep) {
                    Some(Color::InProgress) => {
                        return Err(Status::error(format!(
                            "Cycle detected in plan at node {}",
                            dep
                        )));
                    }
                    Some(Color::Done) => {}
                    None => stack.push((*dep, false)),
                }
            }
        }

        // Indegree and output-variable checks over the reachable subgraph,
        // branch references included.
        let mut seen_vars: HashMap<String, NodeId> = HashMap::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let node = self.node(id)?;
            if node.deps().is_empty() && !node.kind().is_source() {
                return Err(Status::error(format!(
                    "{} node {} has no input",
                    node.kind().name(),
                    id
                )));
            }

            let reused_input_var = node.kind() == PlanNodeKind::PassThrough
                && node
                    .input()
                    .and_then(|input| self.node(input).ok())
                    .map(|input| input.output_var() == node.output_var())
                    .unwrap_or(false);
            if !reused_input_var {
                if let Some(prev) = seen_vars.insert(node.output_var().to_string(), id) {
                    if prev != id {
                        return Err(Status::error(format!(
                            "Output variable `{}` is produced by both node {} and node {}",
                            node.output_var(),
                            prev,
                            id
                        )));
                    }
                }
            }

            queue.extend(node.deps().iter().copied());
            queue.extend(node.branch_refs());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn test_insert_assigns_default_output_var() {
        let mut arena = PlanArena::new();
        let start = arena.make_start();
        let node = arena.node(start).expect("node exists");
        assert_eq!(node.kind(), PlanNodeKind::Start);
        assert_eq!(node.output_var(), "__Start_0");
    }

    #[test]
    fn test_clone_preserves_sharing() {
        // Diamond: root depends on left and right, both depend on base.
        let mut arena = PlanArena::new();
        let base = arena.make_start();
        let left = arena.make_pass_through(base);
        let right = arena.make_pass_through(base);
        let root = arena.make_limit(left, 10);
        arena.add_dep(root, right);

        let before = arena.len();
        let cloned_root = arena.clone_subtree(root).expect("clone");
        // Exactly four fresh nodes: base cloned once despite two paths.
        assert_eq!(arena.len(), before + 4);

        let cloned = arena.node(cloned_root).expect("cloned root");
        let cloned_left = arena.node(cloned.deps()[0]).expect("left");
        let cloned_right = arena.node(cloned.deps()[1]).expect("right");
        assert_eq!(cloned_left.deps()[0], cloned_right.deps()[0]);
    }

    #[test]
    fn test_clone_reaches_through_branches() {
        let mut arena = PlanArena::new();
        let input = arena.make_start();
        let then_branch = arena.make_start();
        let otherwise_branch = arena.make_start();
        let select = arena.make_select(
            input,
            then_branch,
            otherwise_branch,
            Expression::literal(true),
        );

        let cloned = arena.clone_subtree(select).expect("clone");
        let node = arena.node(cloned).expect("cloned select");
        let refs = node.branch_refs();
        assert_ne!(refs[0], then_branch);
        assert_ne!(refs[1], otherwise_branch);
    }

    #[test]
    fn test_integrity_rejects_inputless_node() {
        let mut arena = PlanArena::new();
        let orphan = arena.insert(Vec::new(), NodeBody::PassThrough);
        let err = arena.check_integrity(orphan).expect_err("no input");
        assert!(err.to_string().contains("no input"));
    }

    #[test]
    fn test_integrity_rejects_duplicate_output_vars() {
        let mut arena = PlanArena::new();
        let start = arena.make_start();
        let a = arena.make_project(
            start,
            vec![ProjectColumn {
                expr: Expression::literal(Value::Int(1)),
                alias: "a".to_string(),
            }],
        );
        let b = arena.make_limit(a, 1);
        arena.set_output_var(a, "shared".to_string());
        arena.set_output_var(b, "shared".to_string());

        let err = arena.check_integrity(b).expect_err("duplicate vars");
        assert!(err.to_string().contains("shared"));
    }

    #[test]
    fn test_integrity_allows_pass_through_reuse() {
        let mut arena = PlanArena::new();
        let start = arena.make_start();
        let pt = arena.make_pass_through(start);
        let start_var = arena.node(start).expect("start").output_var().to_string();
        arena.set_output_var(pt, start_var);

        arena.check_integrity(pt).expect("reuse is legal");
    }
}
