//! Measure query over a component subtree.

use crate::error::MeasureResult;
use crate::model::Qualifier;

use super::component_tree::{ComponentTreeQuery, ComponentTreeQueryBuilder, Strategy};
use super::measure_query::check_metric_exclusivity;

/// Immutable filter for measures of the nodes under a base component.
///
/// Carries metric, person and analysis filters. Node selection (strategy,
/// name/key, qualifiers, pagination) is described by the embedded
/// [`ComponentTreeQuery`] and resolved by the component store; the base
/// component itself is given to the repository separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureTreeQuery {
    analysis_uuid: Option<String>,
    metric_ids: Option<Vec<i32>>,
    metric_keys: Option<Vec<String>>,
    person_id: Option<i64>,
    component_query: ComponentTreeQuery,
}

impl MeasureTreeQuery {
    pub fn builder() -> MeasureTreeQueryBuilder {
        MeasureTreeQueryBuilder::default()
    }

    pub fn analysis_uuid(&self) -> Option<&str> {
        self.analysis_uuid.as_deref()
    }

    pub fn metric_ids(&self) -> Option<&[i32]> {
        self.metric_ids.as_deref()
    }

    pub fn metric_keys(&self) -> Option<&[String]> {
        self.metric_keys.as_deref()
    }

    pub fn person_id(&self) -> Option<i64> {
        self.person_id
    }

    pub fn strategy(&self) -> Strategy {
        self.component_query.strategy()
    }

    pub fn component_query(&self) -> &ComponentTreeQuery {
        &self.component_query
    }

    pub fn returns_empty(&self) -> bool {
        self.metric_ids.as_ref().is_some_and(Vec::is_empty)
            || self.metric_keys.as_ref().is_some_and(Vec::is_empty)
            || self.component_query.returns_empty()
    }
}

/// Builder for [`MeasureTreeQuery`].
#[derive(Debug, Clone, Default)]
#[must_use = "builders have no effect until used"]
pub struct MeasureTreeQueryBuilder {
    analysis_uuid: Option<String>,
    metric_ids: Option<Vec<i32>>,
    metric_keys: Option<Vec<String>>,
    person_id: Option<i64>,
    component_query: ComponentTreeQueryBuilder,
}

impl MeasureTreeQueryBuilder {
    pub fn analysis_uuid(mut self, analysis_uuid: impl Into<String>) -> Self {
        self.analysis_uuid = Some(analysis_uuid.into());
        self
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

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.component_query = self.component_query.strategy(strategy);
        self
    }

    pub fn name_or_key_query(mut self, query: impl Into<String>) -> Self {
        self.component_query = self.component_query.name_or_key_query(query);
        self
    }

    pub fn qualifiers(mut self, qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        self.component_query = self.component_query.qualifiers(qualifiers);
        self
    }

    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.component_query = self.component_query.page(page, page_size);
        self
    }

    /// # Errors
    /// [`crate::MeasureError::InvalidArgument`] if both metric ids and metric
    /// keys were set, or if the structural filter is invalid.
    pub fn build(self) -> MeasureResult<MeasureTreeQuery> {
        check_metric_exclusivity(self.metric_ids.as_ref(), self.metric_keys.as_ref())?;
        let component_query = self.component_query.build()?;

        Ok(MeasureTreeQuery {
            analysis_uuid: self.analysis_uuid,
            metric_ids: self.metric_ids,
            metric_keys: self.metric_keys,
            person_id: self.person_id,
            component_query,
        })
    }
}
