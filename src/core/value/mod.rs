//! Value type system
//!
//! Runtime values produced and consumed by plan-node executors. Intermediate
//! result sets are `DataSet`s published into the per-query variable store;
//! scalar values appear inside rows and as expression results.

pub mod dataset;

pub use dataset::{DataSet, Row};

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Null value classification.
///
/// Distinguishes plain NULL from values that became null through a failed
/// computation, so errors can surface in result sets without aborting a row.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Encode, Decode)]
pub enum NullType {
    #[default]
    Null,
    NaN,
    BadType,
    DivByZero,
    OutOfRange,
}

impl NullType {
    pub fn name(&self) -> &'static str {
        match self {
            NullType::Null => "NULL",
            NullType::NaN => "NaN",
            NullType::BadType => "BAD_TYPE",
            NullType::DivByZero => "DIV_BY_ZERO",
            NullType::OutOfRange => "OUT_OF_RANGE",
        }
    }
}

impl std::fmt::Display for NullType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Runtime value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Encode, Decode)]
pub enum Value {
    Null(NullType),
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    DataSet(DataSet),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null(_) => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::DataSet(_) => "dataset",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_dataset(&self) -> bool {
        matches!(self, Value::DataSet(_))
    }

    pub fn as_dataset(&self) -> Option<&DataSet> {
        match self {
            Value::DataSet(ds) => Some(ds),
            _ => None,
        }
    }

    /// Consume the value, yielding the dataset if it holds one.
    pub fn into_dataset(self) -> Option<DataSet> {
        match self {
            Value::DataSet(ds) => Some(ds),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null(NullType::Null)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DataSet> for Value {
    fn from(ds: DataSet) -> Self {
        Value::DataSet(ds)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::DataSet(ds) => write!(f, "DataSet({} rows)", ds.rows.len()),
        }
    }
}
