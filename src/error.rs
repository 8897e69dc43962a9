//! Error taxonomy for measure queries.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for measure operations.
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Errors raised by query construction and the measure repository.
///
/// Empty result sets are never reported as errors: absence is an empty
/// `Vec` or `None`.
#[derive(Error, Debug)]
pub enum MeasureError {
    /// A query builder was given an invalid combination of filters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A single-row lookup matched more than one fact.
    #[error("expected one element but matched at least {count}")]
    TooManyResults {
        /// Rows seen before the lookup was aborted. The lookup stops at the
        /// second row, so this is a lower bound on the number of matches.
        count: usize,
    },

    /// A fact with the same identity already exists.
    #[error(
        "measure already exists for component {component_uuid}, analysis {analysis_uuid}, metric {metric_id}, person {person_id:?}"
    )]
    DuplicateKey {
        component_uuid: String,
        analysis_uuid: String,
        metric_id: i32,
        person_id: Option<i64>,
    },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A caller-supplied row handler aborted a streamed query.
    #[error("row handler aborted: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<rusqlite::Error> for MeasureError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Sqlite(err))
    }
}

impl MeasureError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Wrap an arbitrary error raised from inside a row handler.
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(err.into())
    }

    /// Check if this error comes from a caller contract violation rather than
    /// the store.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::TooManyResults { .. }
                | Self::DuplicateKey { .. }
                | Self::Store(StoreError::Reentrant)
        )
    }
}
