//! Flat measure query.

use std::mem;

use crate::error::{MeasureError, MeasureResult};

/// Which components a [`MeasureQuery`] is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentScope {
    /// A single component, in any project.
    Component(String),
    /// Several components of one project. The project drives latest-analysis
    /// resolution.
    ComponentsOfProject {
        project_uuid: String,
        component_uuids: Vec<String>,
    },
    /// The root components of several projects.
    Projects(Vec<String>),
}

impl ComponentScope {
    /// Whether the scope was given as an explicitly empty collection.
    pub fn is_empty(&self) -> bool {
        match self {
            ComponentScope::Component(_) => false,
            ComponentScope::ComponentsOfProject {
                component_uuids, ..
            } => component_uuids.is_empty(),
            ComponentScope::Projects(uuids) => uuids.is_empty(),
        }
    }
}

/// Immutable filter describing which measure facts to fetch.
///
/// Built through [`MeasureQuery::builder`]; invalid combinations are rejected
/// by [`MeasureQueryBuilder::build`].
///
/// # Example
///
/// ```
/// use tally::query::MeasureQuery;
///
/// let query = MeasureQuery::builder()
///     .component_uuid("C1")
///     .metric_ids([12, 10])
///     .build()
///     .unwrap();
///
/// assert_eq!(query.metric_ids(), Some(&[12, 10][..]));
/// assert!(query.analysis_uuid().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureQuery {
    analysis_uuid: Option<String>,
    component_scope: Option<ComponentScope>,
    metric_ids: Option<Vec<i32>>,
    metric_keys: Option<Vec<String>>,
    person_id: Option<i64>,
}

impl MeasureQuery {
    pub fn builder() -> MeasureQueryBuilder {
        MeasureQueryBuilder::default()
    }

    /// Explicit analysis. `None` means the latest analysis of each project.
    pub fn analysis_uuid(&self) -> Option<&str> {
        self.analysis_uuid.as_deref()
    }

    pub fn component_scope(&self) -> Option<&ComponentScope> {
        self.component_scope.as_ref()
    }

    /// Metric ids to keep. `None` means all metrics.
    pub fn metric_ids(&self) -> Option<&[i32]> {
        self.metric_ids.as_deref()
    }

    /// Metric keys to keep. `None` means all metrics.
    pub fn metric_keys(&self) -> Option<&[String]> {
        self.metric_keys.as_deref()
    }

    /// Person whose facts are returned. `None` means person-less facts only.
    pub fn person_id(&self) -> Option<i64> {
        self.person_id
    }

    /// Whether this query can only ever match nothing.
    ///
    /// True when a component, project, metric id or metric key collection was
    /// given explicitly empty.
    pub fn returns_empty(&self) -> bool {
        self.component_scope
            .as_ref()
            .is_some_and(ComponentScope::is_empty)
            || self.metric_ids.as_ref().is_some_and(Vec::is_empty)
            || self.metric_keys.as_ref().is_some_and(Vec::is_empty)
    }
}

/// Builder for [`MeasureQuery`].
#[derive(Debug, Clone, Default)]
#[must_use = "builders have no effect until used"]
pub struct MeasureQueryBuilder {
    analysis_uuid: Option<String>,
    component_scope: Option<ComponentScope>,
    conflicting_scope: bool,
    metric_ids: Option<Vec<i32>>,
    metric_keys: Option<Vec<String>>,
    person_id: Option<i64>,
}

impl MeasureQueryBuilder {
    pub fn analysis_uuid(mut self, analysis_uuid: impl Into<String>) -> Self {
        self.analysis_uuid = Some(analysis_uuid.into());
        self
    }

    pub fn component_uuid(self, component_uuid: impl Into<String>) -> Self {
        self.scope(ComponentScope::Component(component_uuid.into()))
    }

    /// Restrict to `component_uuids`, all belonging to `project_uuid`.
    pub fn component_uuids<I, S>(self, project_uuid: impl Into<String>, component_uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope(ComponentScope::ComponentsOfProject {
            project_uuid: project_uuid.into(),
            component_uuids: component_uuids.into_iter().map(Into::into).collect(),
        })
    }

    pub fn project_uuids<I, S>(self, project_uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope(ComponentScope::Projects(
            project_uuids.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn metric_id(mut self, metric_id: i32) -> Self {
        self.metric_ids = Some(vec![metric_id]);
        self
    }

    pub fn metric_ids(mut self, metric_ids: impl IntoIterator<Item = i32>) -> Self {
        self.metric_ids = Some(metric_ids.into_iter().collect());
        self
    }

    pub fn metric_key(mut self, metric_key: impl Into<String>) -> Self {
        self.metric_keys = Some(vec![metric_key.into()]);
        self
    }

    pub fn metric_keys<I, S>(mut self, metric_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metric_keys = Some(metric_keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn person_id(mut self, person_id: i64) -> Self {
        self.person_id = Some(person_id);
        self
    }

    // Re-setting the same kind of scope replaces it; mixing kinds is an error.
    fn scope(mut self, scope: ComponentScope) -> Self {
        if let Some(existing) = &self.component_scope {
            if mem::discriminant(existing) != mem::discriminant(&scope) {
                self.conflicting_scope = true;
            }
        }
        self.component_scope = Some(scope);
        self
    }

    /// Validate and freeze the query.
    ///
    /// # Errors
    /// [`MeasureError::InvalidArgument`] if both metric ids and metric keys
    /// were set, or if more than one kind of component scope was set.
    pub fn build(self) -> MeasureResult<MeasureQuery> {
        check_metric_exclusivity(self.metric_ids.as_ref(), self.metric_keys.as_ref())?;
        if self.conflicting_scope {
            return Err(MeasureError::invalid_argument(
                "Only one of component UUID, component UUIDs or project UUIDs can be set",
            ));
        }

        Ok(MeasureQuery {
            analysis_uuid: self.analysis_uuid,
            component_scope: self.component_scope,
            metric_ids: self.metric_ids,
            metric_keys: self.metric_keys,
            person_id: self.person_id,
        })
    }
}

pub(crate) fn check_metric_exclusivity(
    metric_ids: Option<&Vec<i32>>,
    metric_keys: Option<&Vec<String>>,
) -> MeasureResult<()> {
    if metric_ids.is_some() && metric_keys.is_some() {
        return Err(MeasureError::invalid_argument(
            "Metric IDs and keys must not be set both",
        ));
    }
    Ok(())
}
