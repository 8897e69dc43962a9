//! Nodes of the component tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MeasureError;

/// Separator used in uuid paths (`.root.module.`).
pub const UUID_PATH_SEPARATOR: char = '.';

/// Coarse structural level of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Project,
    Directory,
    File,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Project => "PRJ",
            Scope::Directory => "DIR",
            Scope::File => "FIL",
        }
    }
}

impl FromStr for Scope {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRJ" => Ok(Scope::Project),
            "DIR" => Ok(Scope::Directory),
            "FIL" => Ok(Scope::File),
            other => Err(MeasureError::invalid_argument(format!(
                "unknown scope: {other}"
            ))),
        }
    }
}

/// Fine-grained kind of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qualifier {
    Project,
    Module,
    Directory,
    File,
    UnitTestFile,
    View,
    SubView,
    Developer,
}

impl Qualifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Qualifier::Project => "TRK",
            Qualifier::Module => "BRC",
            Qualifier::Directory => "DIR",
            Qualifier::File => "FIL",
            Qualifier::UnitTestFile => "UTS",
            Qualifier::View => "VW",
            Qualifier::SubView => "SVW",
            Qualifier::Developer => "DEV",
        }
    }

    /// Scope a component of this qualifier lives at.
    pub fn default_scope(&self) -> Scope {
        match self {
            Qualifier::Project
            | Qualifier::Module
            | Qualifier::View
            | Qualifier::SubView
            | Qualifier::Developer => Scope::Project,
            Qualifier::Directory => Scope::Directory,
            Qualifier::File | Qualifier::UnitTestFile => Scope::File,
        }
    }
}

impl FromStr for Qualifier {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRK" => Ok(Qualifier::Project),
            "BRC" => Ok(Qualifier::Module),
            "DIR" => Ok(Qualifier::Directory),
            "FIL" => Ok(Qualifier::File),
            "UTS" => Ok(Qualifier::UnitTestFile),
            "VW" => Ok(Qualifier::View),
            "SVW" => Ok(Qualifier::SubView),
            "DEV" => Ok(Qualifier::Developer),
            other => Err(MeasureError::invalid_argument(format!(
                "unknown qualifier: {other}"
            ))),
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the component tree.
///
/// `uuid_path` lists the uuids of all ancestors, each followed by a `.`, and
/// starts with a `.`: a root has path `.`, a module of project `P` has path
/// `.P.`, a file of that module `.P.M.`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub uuid: String,
    pub project_uuid: String,
    pub uuid_path: String,
    pub key: String,
    pub name: String,
    pub scope: Scope,
    pub qualifier: Qualifier,
    pub enabled: bool,
}

impl Component {
    /// Create a root component (its own project).
    pub fn root(qualifier: Qualifier, key: impl Into<String>) -> Self {
        let uuid = new_uuid();
        let key = key.into();
        Self {
            project_uuid: uuid.clone(),
            uuid,
            uuid_path: UUID_PATH_SEPARATOR.to_string(),
            name: key.clone(),
            key,
            scope: qualifier.default_scope(),
            qualifier,
            enabled: true,
        }
    }

    pub fn project(key: impl Into<String>) -> Self {
        Self::root(Qualifier::Project, key)
    }

    pub fn view(key: impl Into<String>) -> Self {
        Self::root(Qualifier::View, key)
    }

    pub fn developer(key: impl Into<String>) -> Self {
        Self::root(Qualifier::Developer, key)
    }

    /// Create a component under `parent`, in the parent's project.
    pub fn child_of(parent: &Component, qualifier: Qualifier, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            uuid: new_uuid(),
            project_uuid: parent.project_uuid.clone(),
            uuid_path: parent.child_uuid_path(),
            name: key.clone(),
            key,
            scope: qualifier.default_scope(),
            qualifier,
            enabled: true,
        }
    }

    pub fn module(parent: &Component, key: impl Into<String>) -> Self {
        Self::child_of(parent, Qualifier::Module, key)
    }

    pub fn directory(parent: &Component, key: impl Into<String>) -> Self {
        Self::child_of(parent, Qualifier::Directory, key)
    }

    pub fn file(parent: &Component, key: impl Into<String>) -> Self {
        Self::child_of(parent, Qualifier::File, key)
    }

    /// Override the generated uuid.
    ///
    /// Only meaningful before children are derived from this component.
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        let uuid = uuid.into();
        if self.is_root() {
            self.project_uuid = uuid.clone();
        }
        self.uuid = uuid;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether this component sits at the top of a tree.
    pub fn is_root(&self) -> bool {
        self.uuid_path == UUID_PATH_SEPARATOR.to_string()
    }

    /// Whether measures of this component count as project-level measures:
    /// projects and non-project roots such as views.
    pub fn is_top_level(&self) -> bool {
        self.scope == Scope::Project
            && matches!(self.qualifier, Qualifier::Project | Qualifier::View)
    }

    /// Path shared by all direct children of this component.
    pub fn child_uuid_path(&self) -> String {
        format!("{}{}{}", self.uuid_path, self.uuid, UUID_PATH_SEPARATOR)
    }

    /// Depth in the tree, 0 for roots.
    pub fn depth(&self) -> usize {
        self.uuid_path
            .split(UUID_PATH_SEPARATOR)
            .filter(|s| !s.is_empty())
            .count()
    }
}

fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
