//! Expression evaluation.

use crate::core::{GraphResult, NullType, Status, Value};

use super::{BinaryOp, Expression};

/// Source of variable bindings during evaluation.
///
/// Executors layer contexts: a Filter evaluates row predicates against the
/// current row first, falling back to the query variable store; Select and
/// Loop conditions evaluate against the variable store alone.
pub trait ExpressionContext {
    fn variable(&self, name: &str) -> Option<Value>;
}

/// Empty context for constant expressions.
pub struct EmptyContext;

impl ExpressionContext for EmptyContext {
    fn variable(&self, _name: &str) -> Option<Value> {
        None
    }
}

pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn evaluate(expr: &Expression, ctx: &dyn ExpressionContext) -> GraphResult<Value> {
        match expr {
            Expression::Literal(v) => Ok(v.clone()),
            Expression::Variable(name) => ctx
                .variable(name)
                .ok_or_else(|| Status::error(format!("Undefined variable `{}`", name))),
            Expression::Not(inner) => {
                let value = Self::evaluate(inner, ctx)?;
                match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    Value::Null(n) => Ok(Value::Null(n)),
                    other => Err(Status::error(format!(
                        "Cannot negate value of type {}",
                        other.type_name()
                    ))),
                }
            }
            Expression::Binary { op, lhs, rhs } => {
                let left = Self::evaluate(lhs, ctx)?;
                let right = Self::evaluate(rhs, ctx)?;
                Self::apply_binary(*op, left, right)
            }
        }
    }

    /// Truthiness used by row predicates: NULL and false are false, any
    /// other non-bool value is an evaluation error.
    pub fn is_truthy(value: &Value) -> GraphResult<bool> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Null(_) => Ok(false),
            other => Err(Status::error(format!(
                "Condition must evaluate to a boolean, got {}",
                other.type_name()
            ))),
        }
    }

    fn apply_binary(op: BinaryOp, left: Value, right: Value) -> GraphResult<Value> {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let l = Self::is_truthy(&left)?;
                let r = Self::is_truthy(&right)?;
                Ok(Value::Bool(if op == BinaryOp::And { l && r } else { l || r }))
            }
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::Ne => Ok(Value::Bool(left != right)),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = Self::compare(&left, &right)?;
                let result = match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::Add | BinaryOp::Sub => Self::arithmetic(op, left, right),
        }
    }

    fn compare(left: &Value, right: &Value) -> GraphResult<std::cmp::Ordering> {
        match (left, right) {
            (Value::Int(l), Value::Int(r)) => Ok(l.cmp(r)),
            (Value::Float(l), Value::Float(r)) => l
                .partial_cmp(r)
                .ok_or_else(|| Status::error("NaN is not comparable")),
            (Value::Int(l), Value::Float(r)) => (*l as f64)
                .partial_cmp(r)
                .ok_or_else(|| Status::error("NaN is not comparable")),
            (Value::Float(l), Value::Int(r)) => l
                .partial_cmp(&(*r as f64))
                .ok_or_else(|| Status::error("NaN is not comparable")),
            (Value::String(l), Value::String(r)) => Ok(l.cmp(r)),
            (l, r) => Err(Status::error(format!(
                "Cannot compare {} with {}",
                l.type_name(),
                r.type_name()
            ))),
        }
    }

    fn arithmetic(op: BinaryOp, left: Value, right: Value) -> GraphResult<Value> {
        match (left, right) {
            (Value::Int(l), Value::Int(r)) => {
                let result = if op == BinaryOp::Add {
                    l.checked_add(r)
                } else {
                    l.checked_sub(r)
                };
                match result {
                    Some(v) => Ok(Value::Int(v)),
                    None => Ok(Value::Null(NullType::OutOfRange)),
                }
            }
            (Value::Float(l), Value::Float(r)) => Ok(Value::Float(if op == BinaryOp::Add {
                l + r
            } else {
                l - r
            })),
            (Value::Int(l), Value::Float(r)) => Self::arithmetic(op, Value::Float(l as f64), Value::Float(r)),
            (Value::Float(l), Value::Int(r)) => Self::arithmetic(op, Value::Float(l), Value::Float(r as f64)),
            (l, r) => Err(Status::error(format!(
                "Arithmetic on {} and {} is not supported",
                l.type_name(),
                r.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapContext(HashMap<String, Value>);

    impl ExpressionContext for MapContext {
        fn variable(&self, name: &str) -> Option<Value> {
            self.0.get(name).cloned()
        }
    }

    fn eval(expr: &Expression, ctx: &dyn ExpressionContext) -> Value {
        ExpressionEvaluator::evaluate(expr, ctx).expect("evaluation should succeed")
    }

    #[test]
    fn test_literal() {
        assert_eq!(eval(&Expression::literal(7i64), &EmptyContext), Value::Int(7));
    }

    #[test]
    fn test_variable_lookup() {
        let mut vars = HashMap::new();
        vars.insert("i".to_string(), Value::Int(2));
        let ctx = MapContext(vars);

        let expr = Expression::binary(
            BinaryOp::Lt,
            Expression::variable("i"),
            Expression::literal(3i64),
        );
        assert_eq!(eval(&expr, &ctx), Value::Bool(true));
    }

    #[test]
    fn test_undefined_variable() {
        let result = ExpressionEvaluator::evaluate(&Expression::variable("nope"), &EmptyContext);
        assert!(result.is_err());
    }

    #[test]
    fn test_comparison_mixed_numeric() {
        let expr = Expression::binary(
            BinaryOp::Ge,
            Expression::literal(2.5f64),
            Expression::literal(2i64),
        );
        assert_eq!(eval(&expr, &EmptyContext), Value::Bool(true));
    }

    #[test]
    fn test_logic_and_not() {
        let expr = Expression::Not(Box::new(Expression::binary(
            BinaryOp::And,
            Expression::literal(true),
            Expression::literal(false),
        )));
        assert_eq!(eval(&expr, &EmptyContext), Value::Bool(true));
    }

    #[test]
    fn test_add_overflow_becomes_null() {
        let expr = Expression::binary(
            BinaryOp::Add,
            Expression::literal(i64::MAX),
            Expression::literal(1i64),
        );
        assert_eq!(eval(&expr, &EmptyContext), Value::Null(NullType::OutOfRange));
    }

    #[test]
    fn test_truthiness_rejects_non_bool() {
        assert!(ExpressionEvaluator::is_truthy(&Value::Int(1)).is_err());
        assert_eq!(
            ExpressionEvaluator::is_truthy(&Value::Null(NullType::Null)).expect("null is falsy"),
            false
        );
    }
}
