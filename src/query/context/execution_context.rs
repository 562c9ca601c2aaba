//! Per-query variable store.
//!
//! Executors publish their output result sets here under the plan node's
//! output variable name; data-dependency successors read them back. The
//! scheduler's completion-before-dispatch edge is what makes concurrent
//! access to the same variable impossible; the lock below only protects the
//! map structure itself.
//!
//! Values are versioned: re-publishing under the same name (a loop body
//! re-executing, a Loop condition re-evaluated) appends a fresh version and
//! readers always see the newest one. A destructive `move_value` leaves a
//! tombstone so later readers fail loudly instead of observing an absent
//! variable.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::core::{GraphResult, Status, Value};

#[derive(Debug)]
enum VarSlot {
    /// Live version history, newest last. Never empty.
    Versions(Vec<Value>),
    /// The value was moved out; reads must fail, not miss.
    Consumed,
}

/// Variable store scoped to one query. Created and destroyed with the
/// query context; there is no cross-query sharing.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    vars: RwLock<HashMap<String, VarSlot>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `name`. Fails if the name is already bound unless
    /// `overwrite` is set, in which case a new version is appended.
    pub fn set_value(&self, name: &str, value: Value, overwrite: bool) -> GraphResult<()> {
        let mut vars = self.vars.write();
        match vars.get_mut(name) {
            None => {
                vars.insert(name.to_string(), VarSlot::Versions(vec![value]));
                Ok(())
            }
            Some(VarSlot::Versions(versions)) if overwrite => {
                versions.push(value);
                Ok(())
            }
            Some(VarSlot::Versions(_)) => Err(Status::error(format!(
                "Variable `{}` is already bound",
                name
            ))),
            Some(slot @ VarSlot::Consumed) if overwrite => {
                *slot = VarSlot::Versions(vec![value]);
                Ok(())
            }
            Some(VarSlot::Consumed) => Err(Status::error(format!(
                "E_VAR_CONSUMED: variable `{}` has been moved out",
                name
            ))),
        }
    }

    /// Publish a fresh version of `name` unconditionally. This is what
    /// executors use to emit their output: re-execution inside a loop body
    /// appends a new version rather than failing.
    pub fn publish(&self, name: &str, value: Value) {
        let mut vars = self.vars.write();
        match vars.get_mut(name) {
            Some(VarSlot::Versions(versions)) => versions.push(value),
            Some(slot @ VarSlot::Consumed) => *slot = VarSlot::Versions(vec![value]),
            None => {
                vars.insert(name.to_string(), VarSlot::Versions(vec![value]));
            }
        }
    }

    /// Read the newest version. Returns a snapshot; the stored value stays
    /// in place and later reads keep succeeding.
    pub fn get_value(&self, name: &str) -> GraphResult<Value> {
        let vars = self.vars.read();
        match vars.get(name) {
            Some(VarSlot::Versions(versions)) => Ok(versions
                .last()
                .cloned()
                .unwrap_or_default()),
            Some(VarSlot::Consumed) => Err(Status::error(format!(
                "E_VAR_CONSUMED: variable `{}` has been moved out",
                name
            ))),
            None => Err(Status::error(format!("Variable `{}` is not defined", name))),
        }
    }

    /// Destructive take of the newest version. Leaves a tombstone; any
    /// subsequent read or move of `name` fails.
    pub fn move_value(&self, name: &str) -> GraphResult<Value> {
        let mut vars = self.vars.write();
        match vars.get_mut(name) {
            Some(slot @ VarSlot::Versions(_)) => {
                let taken = std::mem::replace(slot, VarSlot::Consumed);
                match taken {
                    VarSlot::Versions(mut versions) => {
                        Ok(versions.pop().unwrap_or_default())
                    }
                    VarSlot::Consumed => unreachable!("slot was just matched as live"),
                }
            }
            Some(VarSlot::Consumed) => Err(Status::error(format!(
                "E_VAR_CONSUMED: variable `{}` has been moved out",
                name
            ))),
            None => Err(Status::error(format!("Variable `{}` is not defined", name))),
        }
    }

    /// Whether `name` currently holds a live value. Consumed variables do
    /// not exist for this purpose, though reads of them fail differently.
    pub fn exists(&self, name: &str) -> bool {
        matches!(self.vars.read().get(name), Some(VarSlot::Versions(_)))
    }

    /// Number of live versions of `name`.
    pub fn num_versions(&self, name: &str) -> usize {
        match self.vars.read().get(name) {
            Some(VarSlot::Versions(versions)) => versions.len(),
            _ => 0,
        }
    }

    /// Number of distinct names ever bound (tombstones included).
    pub fn num_vars(&self) -> usize {
        self.vars.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let ectx = ExecutionContext::new();
        ectx.set_value("a", Value::Int(1), false).expect("first bind");
        assert_eq!(ectx.get_value("a").expect("read"), Value::Int(1));
        assert!(ectx.exists("a"));
    }

    #[test]
    fn test_duplicate_set_requires_overwrite() {
        let ectx = ExecutionContext::new();
        ectx.set_value("a", Value::Int(1), false).expect("first bind");
        assert!(ectx.set_value("a", Value::Int(2), false).is_err());

        ectx.set_value("a", Value::Int(2), true).expect("overwrite");
        assert_eq!(ectx.get_value("a").expect("read"), Value::Int(2));
        assert_eq!(ectx.num_versions("a"), 2);
    }

    #[test]
    fn test_move_leaves_tombstone() {
        let ectx = ExecutionContext::new();
        ectx.publish("a", Value::Int(5));
        assert_eq!(ectx.move_value("a").expect("move"), Value::Int(5));

        assert!(!ectx.exists("a"));
        let err = ectx.get_value("a").expect_err("consumed");
        assert!(err.to_string().contains("E_VAR_CONSUMED"));
        assert!(ectx.move_value("a").is_err());
    }

    #[test]
    fn test_missing_is_distinct_from_consumed() {
        let ectx = ExecutionContext::new();
        let err = ectx.get_value("missing").expect_err("undefined");
        assert!(!err.to_string().contains("E_VAR_CONSUMED"));
    }

    #[test]
    fn test_publish_appends_versions() {
        let ectx = ExecutionContext::new();
        ectx.publish("loop_cond", Value::Bool(true));
        ectx.publish("loop_cond", Value::Bool(false));
        assert_eq!(ectx.num_versions("loop_cond"), 2);
        assert_eq!(ectx.get_value("loop_cond").expect("read"), Value::Bool(false));
    }
}
