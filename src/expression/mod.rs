//! Condition and projection expressions.
//!
//! The plan carries expressions on Select/Loop nodes (branch and loop
//! conditions), Filter nodes (row predicates) and Project nodes (column
//! definitions). Evaluation happens against an [`ExpressionContext`], which
//! resolves variable references either from the per-query variable store or
//! from the current row.

pub mod evaluator;

pub use evaluator::{ExpressionContext, ExpressionEvaluator};

use serde::{Deserialize, Serialize};

use crate::core::Value;

/// Binary operators supported in plan expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
        }
    }
}

/// Expression tree attached to plan nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Value),
    /// Named reference resolved through the evaluation context. Depending on
    /// the executor this is a query variable or a column of the current row.
    Variable(String),
    Not(Box<Expression>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Rendered form used in plan descriptions and error messages.
    pub fn text(&self) -> String {
        match self {
            Expression::Literal(v) => v.to_string(),
            Expression::Variable(name) => format!("${}", name),
            Expression::Not(inner) => format!("!({})", inner.text()),
            Expression::Binary { op, lhs, rhs } => {
                format!("({} {} {})", lhs.text(), op.symbol(), rhs.text())
            }
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}
