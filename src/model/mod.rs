//! Measure facts and the structures they hang off.

pub mod component;
pub mod fact;
pub mod metric;
pub mod snapshot;

pub use component::{Component, Qualifier, Scope, UUID_PATH_SEPARATOR};
pub use fact::{MeasureFact, PastMeasure, VARIATION_COUNT};
pub use metric::Metric;
pub use snapshot::Snapshot;
