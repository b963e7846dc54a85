//! Equality queries against a Base.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::base::Item;

/// A set of field equality conditions, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Query {
    conditions: Map<String, Value>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    /// Value required for a field, if any
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.conditions.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether an item satisfies every condition
    pub fn matches(&self, item: &Item) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| item.get(field) == Some(value))
    }
}
