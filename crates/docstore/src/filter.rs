//! Query filters over document fields

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    /// Field is present and equal to the value
    Eq,
    /// Field is absent or differs from the value
    Ne,
    /// Field is present and equal to one element of the array value
    In,
    /// Field is not present at all; the value is ignored
    Absent,
}

/// A `(field, op, value)` predicate on a top-level document field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Ne,
            value: value.into(),
        }
    }

    pub fn absent(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Absent,
            value: Value::Null,
        }
    }

    pub fn one_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            field: field.into(),
            op: FilterOp::In,
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        let actual = document.get(&self.field);
        match self.op {
            FilterOp::Eq => actual == Some(&self.value),
            FilterOp::Ne => actual != Some(&self.value),
            FilterOp::In => match (&self.value, actual) {
                (Value::Array(options), Some(actual)) => options.contains(actual),
                _ => false,
            },
            FilterOp::Absent => actual.is_none(),
        }
    }
}

/// True when the document satisfies every filter (an empty list matches everything)
pub fn matches_all(filters: &[Filter], document: &Document) -> bool {
    filters.iter().all(|filter| filter.matches(document))
}
