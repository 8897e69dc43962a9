//! Measure repository.
//!
//! Executes measure queries against the collaborator stores. Every
//! retrieval mode goes through the same resolution step:
//!
//! ```text
//! MeasureQuery ──► returns_empty? ──► metric keys → ids ──► targets ──► MeasureFilter
//!                       │                  (MetricStore)   (AnalysisStore,      │
//!                       ▼                                   ComponentStore)     ▼
//!                  empty result                                       MeasureStorage
//!                                                                            │
//!                                                 Sink: collect / forward / at-most-one
//! ```
//!
//! Latest analyses are re-resolved on every call; nothing is cached.

pub mod assembler;
mod sink;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::MeasureResult;
use crate::model::{Component, MeasureFact, PastMeasure};
use crate::query::{ComponentScope, MeasureQuery, MeasureTreeQuery};
use crate::store::{
    AnalysisStore, AnalysisTarget, ComponentStore, MeasureFilter, MeasureStorage, MetricStore,
    SqliteStore,
};

pub use assembler::{ComponentMeasures, TreeAssembler};
use sink::Sink;

/// Reads and appends measure facts.
///
/// Holds no mutable state; share it freely across threads.
#[derive(Clone)]
pub struct MeasureRepository {
    storage: Arc<dyn MeasureStorage>,
    components: Arc<dyn ComponentStore>,
    analyses: Arc<dyn AnalysisStore>,
    metrics: Arc<dyn MetricStore>,
}

impl MeasureRepository {
    pub fn new(
        storage: Arc<dyn MeasureStorage>,
        components: Arc<dyn ComponentStore>,
        analyses: Arc<dyn AnalysisStore>,
        metrics: Arc<dyn MetricStore>,
    ) -> Self {
        Self {
            storage,
            components,
            analyses,
            metrics,
        }
    }

    /// Use one SQLite store for every collaborator.
    pub fn with_store(store: Arc<SqliteStore>) -> Self {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }

    /// Facts matching `query`.
    ///
    /// Without an analysis uuid, each referenced project is read at its
    /// latest analysis.
    pub fn select_by_query(&self, query: &MeasureQuery) -> MeasureResult<Vec<MeasureFact>> {
        let mut sink = Sink::collect();
        self.run(query, &mut sink)?;
        Ok(sink.into_rows())
    }

    /// Same filtering as [`select_by_query`](Self::select_by_query), with rows
    /// handed to `handler` one at a time.
    ///
    /// The first handler error stops the stream and is returned unchanged.
    /// `handler` is never called after this method returns.
    ///
    /// `handler` runs while the store is busy with this stream and must not
    /// query the same store. With [`SqliteStore`] such a nested call fails
    /// with [`StoreError::Reentrant`](crate::store::StoreError::Reentrant);
    /// collect the rows first when follow-up queries are needed.
    pub fn select_by_query_with_handler<F>(
        &self,
        query: &MeasureQuery,
        mut handler: F,
    ) -> MeasureResult<()>
    where
        F: FnMut(MeasureFact) -> MeasureResult<()>,
    {
        let mut sink = Sink::forward(&mut handler);
        self.run(query, &mut sink)
    }

    /// The only fact matching `query`, if any.
    ///
    /// Fails with [`MeasureError::TooManyResults`](crate::MeasureError::TooManyResults)
    /// as soon as a second row is seen.
    pub fn select_single(&self, query: &MeasureQuery) -> MeasureResult<Option<MeasureFact>> {
        let mut sink = Sink::at_most_one();
        self.run(query, &mut sink)?;
        Ok(sink.into_rows().pop())
    }

    /// Facts of the nodes selected by `query` under `base`.
    ///
    /// Facts are read at the base project's latest analysis unless the query
    /// names one. Rows are returned in no particular order.
    pub fn select_tree_by_query(
        &self,
        base: &Component,
        query: &MeasureTreeQuery,
    ) -> MeasureResult<Vec<MeasureFact>> {
        let (nodes, rows) = self.fetch_tree(base, query)?;
        Ok(TreeAssembler::new(&nodes).retain(rows))
    }

    /// Like [`select_tree_by_query`](Self::select_tree_by_query), grouped per
    /// node in node order. Nodes without facts are left out.
    pub fn select_tree_by_component(
        &self,
        base: &Component,
        query: &MeasureTreeQuery,
    ) -> MeasureResult<Vec<ComponentMeasures>> {
        let (nodes, rows) = self.fetch_tree(base, query)?;
        Ok(TreeAssembler::new(&nodes).group(rows))
    }

    /// Append a fact.
    pub fn insert(&self, fact: &MeasureFact) -> MeasureResult<()> {
        self.storage.insert_measure(fact)
    }

    /// Facts of developer `person_id` on top-level components (projects and
    /// views) at their latest analysis.
    ///
    /// Facts on disabled components are dropped unless they are person
    /// scoped.
    pub fn select_project_measures_of_developer(
        &self,
        person_id: i64,
        metric_ids: &[i32],
    ) -> MeasureResult<Vec<MeasureFact>> {
        if metric_ids.is_empty() {
            debug!(person_id, "no metrics requested, skipping developer lookup");
            return Ok(Vec::new());
        }

        let targets = self
            .analyses
            .select_last_analysis_uuids()?
            .into_iter()
            .map(|analysis| AnalysisTarget::new(analysis, None))
            .collect();
        let filter = MeasureFilter {
            targets,
            metric_ids: Some(metric_ids.to_vec()),
            person_id: Some(person_id),
        };
        let rows = self.collect(&filter)?;

        let mut uuids: Vec<String> = rows.iter().map(|f| f.component_uuid.clone()).collect();
        uuids.sort_unstable();
        uuids.dedup();
        let components: HashMap<String, Component> = self
            .components
            .select_by_uuids(&uuids)?
            .into_iter()
            .map(|c| (c.uuid.clone(), c))
            .collect();

        Ok(rows
            .into_iter()
            .filter(|fact| {
                components.get(&fact.component_uuid).is_some_and(|c| {
                    c.is_top_level() && (c.enabled || fact.is_person_scoped())
                })
            })
            .collect())
    }

    /// Person-less values of `component_uuid` recorded by `analysis_uuid`.
    pub fn select_past_measures(
        &self,
        component_uuid: &str,
        analysis_uuid: &str,
        metric_ids: &[i32],
    ) -> MeasureResult<Vec<PastMeasure>> {
        if metric_ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = MeasureFilter {
            targets: vec![AnalysisTarget::new(
                analysis_uuid,
                Some(vec![component_uuid.to_string()]),
            )],
            metric_ids: Some(metric_ids.to_vec()),
            person_id: None,
        };
        Ok(self
            .collect(&filter)?
            .into_iter()
            .map(PastMeasure::from)
            .collect())
    }

    fn run(&self, query: &MeasureQuery, sink: &mut Sink<'_>) -> MeasureResult<()> {
        match self.resolve(query)? {
            Some(filter) => self.drain(&filter, sink),
            None => Ok(()),
        }
    }

    fn collect(&self, filter: &MeasureFilter) -> MeasureResult<Vec<MeasureFact>> {
        let mut sink = Sink::collect();
        self.drain(filter, &mut sink)?;
        Ok(sink.into_rows())
    }

    fn drain(&self, filter: &MeasureFilter, sink: &mut Sink<'_>) -> MeasureResult<()> {
        if filter.matches_nothing() {
            debug!("resolved filter matches nothing, skipping storage");
            return Ok(());
        }
        debug!(
            targets = filter.targets.len(),
            metrics = ?filter.metric_ids,
            person_id = ?filter.person_id,
            "selecting measures"
        );
        self.storage
            .select_measures(filter, &mut |fact| sink.accept(fact))
    }

    /// Turn a query into a storage filter. `None` when the query can only
    /// yield nothing.
    fn resolve(&self, query: &MeasureQuery) -> MeasureResult<Option<MeasureFilter>> {
        if query.returns_empty() {
            debug!("query returns empty, skipping storage");
            return Ok(None);
        }

        let metric_ids = self.resolve_metrics(query.metric_ids(), query.metric_keys())?;
        if metric_ids.as_ref().is_some_and(Vec::is_empty) {
            return Ok(None);
        }

        let analysis = query.analysis_uuid();
        let targets = match query.component_scope() {
            None => match analysis {
                Some(analysis) => vec![AnalysisTarget::new(analysis, None)],
                None => self
                    .analyses
                    .select_last_analysis_uuids()?
                    .into_iter()
                    .map(|uuid| AnalysisTarget::new(uuid, None))
                    .collect(),
            },
            Some(ComponentScope::Component(uuid)) => {
                let analysis = match analysis {
                    Some(analysis) => Some(analysis.to_string()),
                    None => match self.components.select_by_uuid(uuid)? {
                        Some(component) => self.last_analysis_of(&component.project_uuid)?,
                        None => {
                            debug!(component = %uuid, "unknown component");
                            None
                        }
                    },
                };
                analysis
                    .map(|a| AnalysisTarget::new(a, Some(vec![uuid.clone()])))
                    .into_iter()
                    .collect()
            }
            Some(ComponentScope::ComponentsOfProject {
                project_uuid,
                component_uuids,
            }) => {
                let analysis = match analysis {
                    Some(analysis) => Some(analysis.to_string()),
                    None => self.last_analysis_of(project_uuid)?,
                };
                analysis
                    .map(|a| AnalysisTarget::new(a, Some(component_uuids.clone())))
                    .into_iter()
                    .collect()
            }
            Some(ComponentScope::Projects(project_uuids)) => match analysis {
                Some(analysis) => vec![AnalysisTarget::new(analysis, Some(project_uuids.clone()))],
                None => {
                    let mut targets = Vec::with_capacity(project_uuids.len());
                    for project in project_uuids {
                        if let Some(a) = self.last_analysis_of(project)? {
                            targets.push(AnalysisTarget::new(a, Some(vec![project.clone()])));
                        }
                    }
                    targets
                }
            },
        };

        Ok(Some(MeasureFilter {
            targets,
            metric_ids,
            person_id: query.person_id(),
        }))
    }

    /// `None` means every metric.
    fn resolve_metrics(
        &self,
        ids: Option<&[i32]>,
        keys: Option<&[String]>,
    ) -> MeasureResult<Option<Vec<i32>>> {
        match (ids, keys) {
            (Some(ids), _) => Ok(Some(ids.to_vec())),
            (None, Some(keys)) => {
                let resolved = self.metrics.select_ids_by_keys(keys)?;
                if resolved.len() < keys.len() {
                    warn!(
                        requested = keys.len(),
                        resolved = resolved.len(),
                        "some metric keys are unknown"
                    );
                }
                Ok(Some(resolved))
            }
            (None, None) => Ok(None),
        }
    }

    fn last_analysis_of(&self, project_uuid: &str) -> MeasureResult<Option<String>> {
        let analysis = self.analyses.select_last_analysis_uuid(project_uuid)?;
        if analysis.is_none() {
            debug!(project = %project_uuid, "project has no last analysis");
        }
        Ok(analysis)
    }

    fn fetch_tree(
        &self,
        base: &Component,
        query: &MeasureTreeQuery,
    ) -> MeasureResult<(Vec<Component>, Vec<MeasureFact>)> {
        if query.returns_empty() {
            debug!(base = %base.uuid, "tree query returns empty, skipping storage");
            return Ok((Vec::new(), Vec::new()));
        }

        let metric_ids = self.resolve_metrics(query.metric_ids(), query.metric_keys())?;
        if metric_ids.as_ref().is_some_and(Vec::is_empty) {
            return Ok((Vec::new(), Vec::new()));
        }

        let nodes = self.components.select_tree(base, query.component_query())?;
        if nodes.is_empty() {
            return Ok((nodes, Vec::new()));
        }

        let analysis = match query.analysis_uuid() {
            Some(analysis) => Some(analysis.to_string()),
            None => self.last_analysis_of(&base.project_uuid)?,
        };
        let Some(analysis) = analysis else {
            return Ok((nodes, Vec::new()));
        };

        let filter = MeasureFilter {
            targets: vec![AnalysisTarget::new(
                analysis,
                Some(nodes.iter().map(|c| c.uuid.clone()).collect()),
            )],
            metric_ids,
            person_id: query.person_id(),
        };
        let rows = self.collect(&filter)?;
        Ok((nodes, rows))
    }
}
