//! Shared fixtures for the repository integration tests.
//!
//! Facts carry a virtual id in their text value so assertions can name
//! them.
#![allow(dead_code)]

use std::sync::Arc;

use tally::model::{Component, MeasureFact, Metric, Snapshot};
use tally::{MeasureRepository, SqliteStore};

pub const COVERAGE_METRIC_ID: i32 = 10;
pub const COMPLEXITY_METRIC_ID: i32 = 11;
pub const NCLOC_METRIC_ID: i32 = 12;

pub const A_PERSON_ID: i64 = 444;
pub const LAST_ANALYSIS_UUID: &str = "A1";
pub const OTHER_ANALYSIS_UUID: &str = "A2";
pub const PREVIOUS_ANALYSIS_UUID: &str = "previous analysis UUID";

pub struct Fixture {
    pub store: Arc<SqliteStore>,
    pub repository: MeasureRepository,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().expect("open in-memory store"));
        for metric in [
            Metric::new(COVERAGE_METRIC_ID, "coverage"),
            Metric::new(COMPLEXITY_METRIC_ID, "complexity"),
            Metric::new(NCLOC_METRIC_ID, "ncloc"),
        ] {
            store.insert_metric(&metric).expect("insert metric");
        }
        let repository = MeasureRepository::with_store(store.clone());
        Self { store, repository }
    }

    pub fn insert_component(&self, component: Component) -> Component {
        self.store
            .insert_component(&component)
            .expect("insert component");
        component
    }

    pub fn insert_analysis(&self, uuid: &str, project_uuid: &str, last: bool) {
        self.store
            .insert_snapshot(&Snapshot::new(uuid, project_uuid).with_last(last))
            .expect("insert snapshot");
    }

    pub fn insert_measure(&self, id: &str, analysis_uuid: &str, component_uuid: &str, metric_id: i32) {
        let fact = MeasureFact::new(component_uuid, analysis_uuid, metric_id).with_text_value(id);
        self.repository.insert(&fact).expect("insert measure");
    }

    pub fn insert_measure_on_person(
        &self,
        id: &str,
        analysis_uuid: &str,
        component_uuid: &str,
        metric_id: i32,
        person_id: i64,
    ) {
        let fact = MeasureFact::new(component_uuid, analysis_uuid, metric_id)
            .with_person_id(person_id)
            .with_text_value(id);
        self.repository.insert(&fact).expect("insert measure");
    }
}

/// Virtual ids of `facts`, sorted.
pub fn ids(facts: &[MeasureFact]) -> Vec<String> {
    let mut ids: Vec<String> = facts
        .iter()
        .map(|f| f.text_value.clone().unwrap_or_default())
        .collect();
    ids.sort();
    ids
}

/// Sorted owned copy of `expected`.
pub fn sorted(expected: &[&str]) -> Vec<String> {
    let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    expected.sort();
    expected
}
