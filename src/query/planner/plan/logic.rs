//! Control-flow plan nodes.
//!
//! Constructors for the nodes that shape execution rather than produce
//! data: Start roots a DAG or a loop body; Select and Loop carry a
//! condition plus branch references; PassThrough is the deterministic join
//! point where diverging branches converge; Argument surfaces an alias
//! bound by an enclosing context (typically a Loop iteration variable).

use crate::expression::Expression;

use super::node::{NodeBody, NodeId, PlanArena};

impl PlanArena {
    /// A DAG root or loop-body root. No inputs.
    pub fn make_start(&mut self) -> NodeId {
        self.insert(Vec::new(), NodeBody::Start)
    }

    /// Conditional branch. `then_branch` / `otherwise_branch` are branch
    /// references: exactly one of the two subgraphs is dispatched, chosen
    /// by `condition` evaluated over the input.
    pub fn make_select(
        &mut self,
        input: NodeId,
        then_branch: NodeId,
        otherwise_branch: NodeId,
        condition: Expression,
    ) -> NodeId {
        self.insert(
            vec![input],
            NodeBody::Select {
                condition,
                then_branch,
                otherwise_branch,
            },
        )
    }

    /// Condition-guarded loop. While `condition` holds, the `body` subgraph
    /// is re-dispatched afresh; iterations are sequential.
    pub fn make_loop(
        &mut self,
        input: NodeId,
        body: NodeId,
        condition: Expression,
    ) -> NodeId {
        self.insert(
            vec![input],
            NodeBody::Loop {
                condition,
                body,
                iter_alias: None,
            },
        )
    }

    /// Loop whose iteration counter is published under `iter_alias` before
    /// each condition evaluation and body dispatch.
    pub fn make_loop_with_alias(
        &mut self,
        input: NodeId,
        body: NodeId,
        condition: Expression,
        iter_alias: impl Into<String>,
    ) -> NodeId {
        self.insert(
            vec![input],
            NodeBody::Loop {
                condition,
                body,
                iter_alias: Some(iter_alias.into()),
            },
        )
    }

    /// Identity node; forwards its input unchanged. May reuse the input's
    /// output variable name.
    pub fn make_pass_through(&mut self, input: NodeId) -> NodeId {
        self.insert(vec![input], NodeBody::PassThrough)
    }

    /// Reads the named alias published by an enclosing context and
    /// republishes it under its own output variable. No inputs.
    pub fn make_argument(&mut self, alias: impl Into<String>) -> NodeId {
        self.insert(
            Vec::new(),
            NodeBody::Argument {
                alias: alias.into(),
            },
        )
    }
}
