//! Measure and tree queries.
//!
//! Both query types are built once through a builder that validates
//! cross-field rules, and are immutable afterwards.

pub mod component_tree;
pub mod measure_query;
pub mod tree_query;

pub use component_tree::{ComponentTreeQuery, ComponentTreeQueryBuilder, Pagination, Strategy};
pub use measure_query::{ComponentScope, MeasureQuery, MeasureQueryBuilder};
pub use tree_query::{MeasureTreeQuery, MeasureTreeQueryBuilder};
