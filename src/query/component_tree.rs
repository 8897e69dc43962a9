//! Structural filter handed to the component tree store.

use crate::error::{MeasureError, MeasureResult};
use crate::model::Qualifier;

/// Which descendants of a base component are part of a tree query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// The base component and its direct children.
    Children,
    /// The base component and every descendant without children.
    #[default]
    Leaves,
}

/// A page of the ordered node set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: usize,
    pub page_size: usize,
}

impl Pagination {
    /// Number of nodes skipped before this page. Saturates instead of
    /// overflowing for hand-built values.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Strategy plus name/key, qualifier and pagination filters for selecting
/// nodes under a base component.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentTreeQuery {
    strategy: Strategy,
    name_or_key_query: Option<String>,
    qualifiers: Option<Vec<Qualifier>>,
    pagination: Option<Pagination>,
}

impl ComponentTreeQuery {
    pub fn builder() -> ComponentTreeQueryBuilder {
        ComponentTreeQueryBuilder::default()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Case-insensitive substring matched against name or key.
    pub fn name_or_key_query(&self) -> Option<&str> {
        self.name_or_key_query.as_deref()
    }

    /// Qualifiers to keep. `None` means all qualifiers.
    pub fn qualifiers(&self) -> Option<&[Qualifier]> {
        self.qualifiers.as_deref()
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    /// Whether the qualifier filter was given explicitly empty.
    pub fn returns_empty(&self) -> bool {
        self.qualifiers.as_ref().is_some_and(Vec::is_empty)
    }
}

/// Builder for [`ComponentTreeQuery`].
#[derive(Debug, Clone, Default)]
#[must_use = "builders have no effect until used"]
pub struct ComponentTreeQueryBuilder {
    strategy: Strategy,
    name_or_key_query: Option<String>,
    qualifiers: Option<Vec<Qualifier>>,
    page: Option<(usize, usize)>,
}

impl ComponentTreeQueryBuilder {
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn name_or_key_query(mut self, query: impl Into<String>) -> Self {
        self.name_or_key_query = Some(query.into());
        self
    }

    pub fn qualifiers(mut self, qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        self.qualifiers = Some(qualifiers.into_iter().collect());
        self
    }

    /// Keep only page `page` (1-based) of `page_size` nodes.
    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = Some((page, page_size));
        self
    }

    /// # Errors
    /// [`MeasureError::InvalidArgument`] on a blank name query, a page index
    /// of 0, a page size of 0, or a page whose end lies beyond `i64::MAX`
    /// nodes.
    pub fn build(self) -> MeasureResult<ComponentTreeQuery> {
        let name_or_key_query = match self.name_or_key_query {
            Some(q) if q.trim().is_empty() => {
                return Err(MeasureError::invalid_argument(
                    "Name or key query must not be blank",
                ));
            }
            other => other,
        };

        let pagination = match self.page {
            Some((0, _)) => {
                return Err(MeasureError::invalid_argument("Page index must be at least 1"));
            }
            Some((_, 0)) => {
                return Err(MeasureError::invalid_argument("Page size must be at least 1"));
            }
            Some((page, page_size)) => {
                let end = page
                    .checked_mul(page_size)
                    .filter(|end| i64::try_from(*end).is_ok());
                if end.is_none() {
                    return Err(MeasureError::invalid_argument(format!(
                        "Page {page} of size {page_size} is out of range"
                    )));
                }
                Some(Pagination { page, page_size })
            }
            None => None,
        };

        Ok(ComponentTreeQuery {
            strategy: self.strategy,
            name_or_key_query,
            qualifiers: self.qualifiers,
            pagination,
        })
    }
}
