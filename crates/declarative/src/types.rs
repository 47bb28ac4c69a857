//! Core types for declarative reconciliation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while planning a reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// No remote schema template matched the local type
    #[error("{tree}: no remote schema found for type '{kind}'")]
    SchemaNotFound { tree: String, kind: String },

    /// The local definition asks for a different implementation than the remote one
    #[error(
        "{tree}: cannot change type from '{remote}' to '{local}', delete and recreate the definition instead"
    )]
    TypeChanged {
        tree: String,
        remote: String,
        local: String,
    },

    /// A name could not be translated into an id
    #[error("{table}: unknown name '{name}'")]
    UnknownLookup { table: String, name: String },

    /// A remote implementation this tool does not know how to manage
    #[error("{tree}: unsupported remote implementation '{implementation}'")]
    UnknownImplementation { tree: String, implementation: String },
}

/// Summary of execution results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub unmanaged: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }

    /// Whether any remote state changed
    pub fn changed(&self) -> bool {
        self.total_changes() > 0
    }

    /// Total number of definitions processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.unchanged + self.unmanaged
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ExecuteSummary) {
        self.created += other.created;
        self.modified += other.modified;
        self.removed += other.removed;
        self.unchanged += other.unchanged;
        self.unmanaged += other.unmanaged;
    }
}

/// Options for a reconciliation run
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Plan and log, but don't issue any mutating call
    pub dry_run: bool,
}
