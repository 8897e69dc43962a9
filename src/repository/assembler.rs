//! Stitches raw rows onto a resolved tree node set.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{Component, MeasureFact};

/// Facts recorded on one node of a tree query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentMeasures {
    pub component: Component,
    pub measures: Vec<MeasureFact>,
}

/// Matches rows to the nodes of a tree query.
///
/// Rows whose component is not part of the node set are dropped. Nodes
/// without rows get no placeholder.
pub struct TreeAssembler<'a> {
    nodes: &'a [Component],
    uuids: HashSet<&'a str>,
}

impl<'a> TreeAssembler<'a> {
    pub fn new(nodes: &'a [Component]) -> Self {
        Self {
            nodes,
            uuids: nodes.iter().map(|c| c.uuid.as_str()).collect(),
        }
    }

    pub fn contains(&self, component_uuid: &str) -> bool {
        self.uuids.contains(component_uuid)
    }

    /// Rows belonging to the node set, in their original order.
    pub fn retain(&self, rows: Vec<MeasureFact>) -> Vec<MeasureFact> {
        rows.into_iter()
            .filter(|fact| self.contains(&fact.component_uuid))
            .collect()
    }

    /// Rows grouped per node, in node-set order.
    pub fn group(&self, rows: Vec<MeasureFact>) -> Vec<ComponentMeasures> {
        let mut by_component: HashMap<String, Vec<MeasureFact>> = HashMap::new();
        for fact in self.retain(rows) {
            by_component
                .entry(fact.component_uuid.clone())
                .or_default()
                .push(fact);
        }

        self.nodes
            .iter()
            .filter_map(|node| {
                by_component
                    .remove(&node.uuid)
                    .map(|measures| ComponentMeasures {
                        component: node.clone(),
                        measures,
                    })
            })
            .collect()
    }
}
