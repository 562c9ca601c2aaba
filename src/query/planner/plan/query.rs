//! Data-producing plan nodes.
//!
//! The open family of relational and storage-backed operators. Only the
//! operators the pipeline itself plans for are enumerated here; schema and
//! admin operators hang off the same arena in the same way.

use crate::expression::Expression;

use super::node::{NodeBody, NodeId, PlanArena, ProjectColumn};

impl PlanArena {
    /// Evaluate one expression per column over the input rows.
    pub fn make_project(&mut self, input: NodeId, columns: Vec<ProjectColumn>) -> NodeId {
        let col_names: Vec<String> = columns.iter().map(|c| c.alias.clone()).collect();
        let id = self.insert(vec![input], NodeBody::Project { columns });
        self.set_col_names(id, col_names);
        id
    }

    /// Keep only the input rows satisfying `condition`.
    pub fn make_filter(&mut self, input: NodeId, condition: Expression) -> NodeId {
        let col_names = self
            .node(input)
            .map(|n| n.col_names().to_vec())
            .unwrap_or_default();
        let id = self.insert(vec![input], NodeBody::Filter { condition });
        self.set_col_names(id, col_names);
        id
    }

    /// Truncate the input to at most `count` rows.
    pub fn make_limit(&mut self, input: NodeId, count: u64) -> NodeId {
        let col_names = self
            .node(input)
            .map(|n| n.col_names().to_vec())
            .unwrap_or_default();
        let id = self.insert(vec![input], NodeBody::Limit { count });
        self.set_col_names(id, col_names);
        id
    }

    /// Storage-backed neighbor expansion within `space`.
    pub fn make_get_neighbors(&mut self, input: NodeId, space: impl Into<String>) -> NodeId {
        self.insert(
            vec![input],
            NodeBody::GetNeighbors {
                space: space.into(),
            },
        )
    }
}
