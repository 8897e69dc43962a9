//! # tally
//!
//! A measure query engine: resolves, filters and projects measure facts
//! attached to the nodes of a component tree.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        MeasureQuery / MeasureTreeQuery (builders)        │
//! │   component scope, metric ids xor keys, analysis, person │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [repository]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  MeasureRepository                       │
//! │   latest-analysis resolution, metric key resolution,     │
//! │   short-circuit of trivially empty queries               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [store]
//! ┌─────────────────────────────────────────────────────────┐
//! │   MeasureStorage / ComponentStore / AnalysisStore /      │
//! │   MetricStore (SqliteStore implements all four)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [assembler]
//! ┌─────────────────────────────────────────────────────────┐
//! │       rows matched to the tree node set, grouped         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tally::{MeasureQuery, MeasureRepository, Settings, SqliteStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load()?;
//! tally::logging::init(&settings.logging);
//!
//! let store = Arc::new(SqliteStore::open(&settings.database)?);
//! let repository = MeasureRepository::with_store(store);
//!
//! let query = MeasureQuery::builder()
//!     .component_uuid("f6b8a2d4-0c1e-4a3b-9d7f-2e5c8b1a6f90")
//!     .metric_keys(["ncloc", "coverage"])
//!     .build()?;
//! for fact in repository.select_by_query(&query)? {
//!     println!("{} = {:?}", fact.metric_id, fact.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod repository;
pub mod store;

pub use config::Settings;
pub use error::{MeasureError, MeasureResult};
pub use model::{Component, MeasureFact, Metric, PastMeasure, Qualifier, Scope, Snapshot};
pub use query::{
    ComponentScope, ComponentTreeQuery, MeasureQuery, MeasureTreeQuery, Pagination, Strategy,
};
pub use repository::{ComponentMeasures, MeasureRepository, TreeAssembler};
pub use store::{
    AnalysisStore, AnalysisTarget, ComponentStore, MeasureFilter, MeasureStorage, MetricStore,
    SqliteStore, StoreError,
};
