//! Column-named tuple result sets.
//!
//! A `DataSet` is the unit of data exchanged between plan-node executors and
//! the shape of the `data` field in a successful client response.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::Value;

/// One tuple of a dataset. Values are positional against the dataset's
/// column-name list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Encode, Decode)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// Column-named tuple collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Encode, Decode)]
pub struct DataSet {
    pub col_names: Vec<String>,
    pub rows: Vec<Row>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_col_names(col_names: Vec<String>) -> Self {
        Self {
            col_names,
            rows: Vec::new(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.col_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Index of a named column, if present.
    pub fn col_index(&self, name: &str) -> Option<usize> {
        self.col_names.iter().position(|c| c == name)
    }

    /// Append the rows of `other`. Column-name lists must already agree;
    /// callers are expected to have unified schemas upstream.
    pub fn append(&mut self, mut other: DataSet) {
        self.rows.append(&mut other.rows);
    }
}
