// src/model/metric.rs
use serde::{Deserialize, Serialize};

/// A measured property, e.g. `ncloc` or `coverage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: i32,
    pub key: String,
    pub name: String,
}

impl Metric {
    pub fn new(id: i32, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id,
            name: key.clone(),
            key,
        }
    }
}
