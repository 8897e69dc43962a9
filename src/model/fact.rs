// src/model/fact.rs
use serde::{Deserialize, Serialize};

/// Number of variation slots carried by a measure fact.
pub const VARIATION_COUNT: usize = 5;

/// One recorded value of a metric for a component at a given analysis.
///
/// A fact is identified by `(component_uuid, analysis_uuid, metric_id,
/// person_id)`. Facts without a person are component-level facts; facts with
/// a person hold one developer's contribution and coexist with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureFact {
    pub component_uuid: String,
    pub analysis_uuid: String,
    pub metric_id: i32,
    pub person_id: Option<i64>,
    pub value: Option<f64>,
    /// Free-form text value ("data")
    pub text_value: Option<String>,
    pub variations: [Option<f64>; VARIATION_COUNT],
    pub alert_status: Option<String>,
    pub alert_text: Option<String>,
    pub description: Option<String>,
}

impl MeasureFact {
    pub fn new(
        component_uuid: impl Into<String>,
        analysis_uuid: impl Into<String>,
        metric_id: i32,
    ) -> Self {
        Self {
            component_uuid: component_uuid.into(),
            analysis_uuid: analysis_uuid.into(),
            metric_id,
            person_id: None,
            value: None,
            text_value: None,
            variations: [None; VARIATION_COUNT],
            alert_status: None,
            alert_text: None,
            description: None,
        }
    }

    pub fn with_person_id(mut self, person_id: i64) -> Self {
        self.person_id = Some(person_id);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_text_value(mut self, text: impl Into<String>) -> Self {
        self.text_value = Some(text.into());
        self
    }

    /// Set the variation at `index` (1-based).
    ///
    /// # Panics
    /// Panics if `index` is not in `1..=5`.
    pub fn with_variation(mut self, index: usize, value: f64) -> Self {
        assert!(
            (1..=VARIATION_COUNT).contains(&index),
            "variation index must be between 1 and {VARIATION_COUNT}, got {index}"
        );
        self.variations[index - 1] = Some(value);
        self
    }

    pub fn with_alert_status(mut self, status: impl Into<String>) -> Self {
        self.alert_status = Some(status.into());
        self
    }

    pub fn with_alert_text(mut self, text: impl Into<String>) -> Self {
        self.alert_text = Some(text.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Variation at `index` (1-based). Out-of-range indexes read as `None`.
    pub fn variation(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(1)
            .and_then(|i| self.variations.get(i))
            .copied()
            .flatten()
    }

    /// Whether this fact holds a single developer's contribution.
    pub fn is_person_scoped(&self) -> bool {
        self.person_id.is_some()
    }
}

/// Value of a metric on a component at an earlier analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastMeasure {
    pub metric_id: i32,
    pub value: Option<f64>,
}

impl From<MeasureFact> for PastMeasure {
    fn from(fact: MeasureFact) -> Self {
        Self {
            metric_id: fact.metric_id,
            value: fact.value,
        }
    }
}
