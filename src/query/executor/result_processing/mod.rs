//! Row-shaping executors: projection, filtering, truncation.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{DataSet, GraphResult, Row, Status, Value};
use crate::expression::{ExpressionContext, ExpressionEvaluator};
use crate::query::context::QueryContext;
use crate::query::planner::plan::{NodeBody, NodeId};

use super::base::{BaseExecutor, Executor};

/// Resolves names against the current row first, then the variable store.
struct RowContext<'a> {
    col_names: &'a [String],
    row: &'a Row,
    qctx: &'a QueryContext,
}

impl ExpressionContext for RowContext<'_> {
    fn variable(&self, name: &str) -> Option<Value> {
        if let Some(idx) = self.col_names.iter().position(|c| c == name) {
            return self.row.get(idx).cloned();
        }
        self.qctx.ectx().get_value(name).ok()
    }
}

/// Evaluates one expression per output column over each input row. An input
/// with no rows and no columns (a Start output) yields a single row of
/// constants, which is how a bare YIELD produces its result.
pub struct ProjectExecutor {
    base: BaseExecutor,
}

impl ProjectExecutor {
    pub fn new(node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            base: BaseExecutor::new("ProjectExecutor", node_id, qctx),
        }
    }
}

#[async_trait]
impl Executor for ProjectExecutor {
    async fn execute(&mut self) -> GraphResult<()> {
        let node = self.base.node()?;
        let columns = match node.body() {
            NodeBody::Project { columns } => columns.clone(),
            other => {
                return Err(Status::error(format!(
                    "ProjectExecutor dispatched on {} node {}",
                    other.kind().name(),
                    node.id()
                )));
            }
        };

        let input = self.base.input_value()?;
        let input_ds = input.as_dataset().cloned().unwrap_or_default();

        let mut output = DataSet::with_col_names(node.col_names().to_vec());
        let constant_input = input_ds.rows.is_empty() && input_ds.col_names.is_empty();
        if constant_input {
            let empty_row = Row::default();
            let ctx = RowContext {
                col_names: &input_ds.col_names,
                row: &empty_row,
                qctx: self.base.qctx(),
            };
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                values.push(ExpressionEvaluator::evaluate(&column.expr, &ctx)?);
            }
            output.push(Row::new(values));
        } else {
            for row in &input_ds.rows {
                let ctx = RowContext {
                    col_names: &input_ds.col_names,
                    row,
                    qctx: self.base.qctx(),
                };
                let mut values = Vec::with_capacity(columns.len());
                for column in &columns {
                    values.push(ExpressionEvaluator::evaluate(&column.expr, &ctx)?);
                }
                output.push(Row::new(values));
            }
        }

        self.base.finish(Value::DataSet(output))
    }

    fn id(&self) -> i64 {
        self.base.node_id().0 as i64
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn node_id(&self) -> NodeId {
        self.base.node_id()
    }
}

/// Keeps the input rows whose predicate holds.
pub struct FilterExecutor {
    base: BaseExecutor,
}

impl FilterExecutor {
    pub fn new(node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            base: BaseExecutor::new("FilterExecutor", node_id, qctx),
        }
    }
}

#[async_trait]
impl Executor for FilterExecutor {
    async fn execute(&mut self) -> GraphResult<()> {
        let node = self.base.node()?;
        let condition = match node.body() {
            NodeBody::Filter { condition } => condition.clone(),
            other => {
                return Err(Status::error(format!(
                    "FilterExecutor dispatched on {} node {}",
                    other.kind().name(),
                    node.id()
                )));
            }
        };

        let input = self.base.input_value()?;
        let input_ds = input
            .into_dataset()
            .ok_or_else(|| Status::error(format!("Filter node {} input is not a dataset", node.id())))?;

        let mut output = DataSet::with_col_names(input_ds.col_names.clone());
        for row in &input_ds.rows {
            let ctx = RowContext {
                col_names: &input_ds.col_names,
                row,
                qctx: self.base.qctx(),
            };
            let value = ExpressionEvaluator::evaluate(&condition, &ctx)?;
            if ExpressionEvaluator::is_truthy(&value)? {
                output.push(row.clone());
            }
        }

        self.base.finish(Value::DataSet(output))
    }

    fn id(&self) -> i64 {
        self.base.node_id().0 as i64
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn node_id(&self) -> NodeId {
        self.base.node_id()
    }
}

/// Truncates the input to at most `count` rows.
pub struct LimitExecutor {
    base: BaseExecutor,
}

impl LimitExecutor {
    pub fn new(node_id: NodeId, qctx: Arc<QueryContext>) -> Self {
        Self {
            base: BaseExecutor::new("LimitExecutor", node_id, qctx),
        }
    }
}

#[async_trait]
impl Executor for LimitExecutor {
    async fn execute(&mut self) -> GraphResult<()> {
        let node = self.base.node()?;
        let count = match node.body() {
            NodeBody::Limit { count } => *count as usize,
            other => {
                return Err(Status::error(format!(
                    "LimitExecutor dispatched on {} node {}",
                    other.kind().name(),
                    node.id()
                )));
            }
        };

        let input = self.base.input_value()?;
        let mut ds = input
            .into_dataset()
            .ok_or_else(|| Status::error(format!("Limit node {} input is not a dataset", node.id())))?;
        ds.rows.truncate(count);

        self.base.finish(Value::DataSet(ds))
    }

    fn id(&self) -> i64 {
        self.base.node_id().0 as i64
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn node_id(&self) -> NodeId {
        self.base.node_id()
    }
}
