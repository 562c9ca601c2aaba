//! Sentence validation and plan population.
//!
//! Validation walks the parsed sentence tree, performs the semantic checks
//! the execution core depends on and lowers each sentence into the query
//! context's plan arena, leaving the plan installed on the context. The
//! full semantic analysis (type deduction, schema resolution) belongs to
//! the frontend; only the structure the executor needs is enforced here.

use std::collections::HashSet;

use crate::core::{GraphResult, Status};
use crate::query::context::QueryContext;
use crate::query::parser::sentence::{Sentence, YieldSentence};
use crate::query::planner::plan::{ExecutionPlan, NodeId, ProjectColumn};

pub struct Validator;

impl Validator {
    /// Validate `sentence` and install the resulting plan on `qctx`.
    pub fn validate(sentence: &Sentence, qctx: &QueryContext) -> GraphResult<()> {
        let root = Self::validate_sentence(sentence, qctx)?;
        qctx.set_plan(ExecutionPlan::new(root));
        log::debug!(
            "validated query {}, plan root {}",
            qctx.rctx().query_id(),
            root
        );
        Ok(())
    }

    fn validate_sentence(sentence: &Sentence, qctx: &QueryContext) -> GraphResult<NodeId> {
        match sentence {
            Sentence::Explain { inner, .. } => Self::validate_sentence(inner, qctx),
            Sentence::Yield(yield_sentence) => Self::plan_yield(yield_sentence, qctx),
            Sentence::Sequential(sentences) => {
                let mut prev_root: Option<NodeId> = None;
                for sentence in sentences {
                    let (start, root) = match sentence {
                        Sentence::Yield(y) => {
                            let start = qctx.arena_mut().make_start();
                            let root = Self::plan_yield_over(y, qctx, start)?;
                            (start, root)
                        }
                        other => {
                            return Err(Status::semantic_error(format!(
                                "Statement of kind {:?} cannot appear in a sequence",
                                other.kind()
                            )));
                        }
                    };
                    // Order sub-sentences by chaining each one's entry on
                    // the previous one's root.
                    if let Some(prev) = prev_root {
                        qctx.arena_mut().add_dep(start, prev);
                    }
                    prev_root = Some(root);
                }
                prev_root.ok_or(Status::StatementEmpty)
            }
        }
    }

    fn plan_yield(yield_sentence: &YieldSentence, qctx: &QueryContext) -> GraphResult<NodeId> {
        let start = qctx.arena_mut().make_start();
        Self::plan_yield_over(yield_sentence, qctx, start)
    }

    fn plan_yield_over(
        yield_sentence: &YieldSentence,
        qctx: &QueryContext,
        input: NodeId,
    ) -> GraphResult<NodeId> {
        if yield_sentence.items.is_empty() {
            return Err(Status::semantic_error("YIELD requires at least one item"));
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(yield_sentence.items.len());
        for item in &yield_sentence.items {
            let name = item.column_name();
            if !seen.insert(name.clone()) {
                return Err(Status::semantic_error(format!(
                    "Duplicate column name `{}`",
                    name
                )));
            }
            columns.push(ProjectColumn {
                expr: item.expr.clone(),
                alias: name,
            });
        }

        Ok(qctx.arena_mut().make_project(input, columns))
    }
}
