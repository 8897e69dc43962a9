//! Collaborators the measure repository reads from.
//!
//! The repository never talks to a database directly. It resolves analyses,
//! metric keys and tree nodes through the traits below, and hands a fully
//! resolved [`MeasureFilter`] to a [`MeasureStorage`].
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    MeasureRepository                      │
//! └───────────────────────────────────────────────────────────┘
//!      │              │                │                │
//!      ▼              ▼                ▼                ▼
//! ┌──────────┐ ┌──────────────┐ ┌─────────────┐ ┌────────────────┐
//! │ Metric   │ │ Analysis     │ │ Component   │ │ Measure        │
//! │ Store    │ │ Store        │ │ Store       │ │ Storage        │
//! │ keys→ids │ │ last per     │ │ lookup and  │ │ filter → rows  │
//! │          │ │ project      │ │ tree walk   │ │ (streaming)    │
//! └──────────┘ └──────────────┘ └─────────────┘ └────────────────┘
//!                         ╲          │          ╱
//!                          ▼         ▼         ▼
//!                    SqliteStore (implements all four)
//! ```

pub mod sqlite;

use std::path::PathBuf;

use crate::error::MeasureResult;
use crate::model::{Component, MeasureFact};
use crate::query::ComponentTreeQuery;

pub use sqlite::SqliteStore;

/// Errors raised by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to determine data directory")]
    NoDataDir,

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Store re-entered from a row handler it is feeding")]
    Reentrant,

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    #[error("Unsupported schema version {found} (expected {expected})")]
    SchemaVersion { found: i32, expected: i32 },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Callback receiving rows one at a time. Returning an error stops the
/// stream and the error is propagated unchanged.
pub type RowHandler<'a> = dyn FnMut(MeasureFact) -> MeasureResult<()> + 'a;

/// One analysis and the components whose facts are read from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTarget {
    pub analysis_uuid: String,
    /// `None` means every component recorded in the analysis.
    pub component_uuids: Option<Vec<String>>,
}

impl AnalysisTarget {
    pub fn new(analysis_uuid: impl Into<String>, component_uuids: Option<Vec<String>>) -> Self {
        Self {
            analysis_uuid: analysis_uuid.into(),
            component_uuids,
        }
    }
}

/// Fully resolved filter executed by a [`MeasureStorage`].
///
/// Every analysis is explicit: latest-analysis resolution and metric key
/// resolution have already happened.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeasureFilter {
    pub targets: Vec<AnalysisTarget>,
    /// `None` means all metrics.
    pub metric_ids: Option<Vec<i32>>,
    /// `None` means person-less rows only.
    pub person_id: Option<i64>,
}

impl MeasureFilter {
    /// Whether running this filter can only yield nothing.
    pub fn matches_nothing(&self) -> bool {
        self.targets.is_empty()
            || self.metric_ids.as_ref().is_some_and(Vec::is_empty)
            || self.targets.iter().all(|t| {
                t.component_uuids
                    .as_ref()
                    .is_some_and(|uuids| uuids.is_empty())
            })
    }
}

/// Reads and appends raw measure rows.
pub trait MeasureStorage: Send + Sync {
    /// Stream every row matching `filter` into `handler`.
    ///
    /// The handler is only invoked before this method returns. It must not
    /// call back into the same store; implementations either serve such calls
    /// or fail them, and [`SqliteStore`] fails them with
    /// [`StoreError::Reentrant`].
    fn select_measures(&self, filter: &MeasureFilter, handler: &mut RowHandler<'_>)
        -> MeasureResult<()>;

    /// Append a fact.
    ///
    /// Fails with [`crate::MeasureError::DuplicateKey`] if a fact with the
    /// same component, analysis, metric and person exists.
    fn insert_measure(&self, fact: &MeasureFact) -> MeasureResult<()>;
}

/// Looks up components and walks the component tree.
pub trait ComponentStore: Send + Sync {
    fn select_by_uuid(&self, uuid: &str) -> MeasureResult<Option<Component>>;

    /// Components among `uuids`; unknown uuids are skipped.
    fn select_by_uuids(&self, uuids: &[String]) -> MeasureResult<Vec<Component>>;

    /// Enabled nodes under `base` selected by `query`, ordered by
    /// `(uuid_path, name, uuid)`. The base is eligible under both strategies.
    fn select_tree(&self, base: &Component, query: &ComponentTreeQuery)
        -> MeasureResult<Vec<Component>>;
}

/// Resolves the latest analysis of projects.
pub trait AnalysisStore: Send + Sync {
    /// Uuid of the snapshot flagged last for `project_uuid`, if any.
    fn select_last_analysis_uuid(&self, project_uuid: &str) -> MeasureResult<Option<String>>;

    /// Uuids of every snapshot flagged last.
    fn select_last_analysis_uuids(&self) -> MeasureResult<Vec<String>>;
}

/// Resolves metric keys.
pub trait MetricStore: Send + Sync {
    /// Ids of the metrics with the given keys; unknown keys are skipped.
    fn select_ids_by_keys(&self, keys: &[String]) -> MeasureResult<Vec<i32>>;
}

/// Default location of the measure database: `~/.tally/measures.db`.
pub fn default_database_path() -> StoreResult<PathBuf> {
    let base = dirs::home_dir().ok_or(StoreError::NoDataDir)?;
    Ok(base.join(".tally").join("measures.db"))
}
