// src/model/snapshot.rs
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One analysis of a project.
///
/// At most one snapshot per project is flagged `last`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub uuid: String,
    /// Root component the analysis was run on
    pub component_uuid: String,
    pub last: bool,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl Snapshot {
    pub fn new(uuid: impl Into<String>, component_uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            component_uuid: component_uuid.into(),
            last: false,
            created_at: now_millis(),
        }
    }

    pub fn with_last(mut self, last: bool) -> Self {
        self.last = last;
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
