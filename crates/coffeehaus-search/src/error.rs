use std::fmt;

use thiserror::Error;

use crate::ports::AdapterError;

/// Errors surfaced to the caller of [`crate::SearchService::search`].
#[derive(Debug, Error)]
pub enum SearchError {
    /// The classifier was unavailable or its reply could not be parsed.
    #[error("query classification failed: {0}")]
    Classification(#[source] AdapterError),

    /// A directory call failed or timed out after the store came up empty.
    #[error("{operation}({key}) failed: {source}")]
    Lookup {
        operation: &'static str,
        key: String,
        #[source]
        source: AdapterError,
    },
}

/// Write step that was running when reconciliation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Insert,
    /// Re-reading snapshots for ids that conflicted on insert.
    ConflictRecheck,
    Update,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Insert => "insert",
            Self::ConflictRecheck => "conflict recheck",
            Self::Update => "update",
        };
        f.write_str(stage)
    }
}

/// Errors from [`crate::Reconciler`]. Never reach a search caller.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Snapshot read failed; nothing was written.
    #[error("snapshot read for {count} ids failed: {source}")]
    Snapshot {
        count: usize,
        #[source]
        source: AdapterError,
    },

    /// A write failed after `completed` rows were already applied. Applied
    /// writes are not rolled back.
    #[error("{stage} failed after {completed} completed writes: {source}")]
    PartialFailure {
        completed: usize,
        stage: WriteStage,
        #[source]
        source: AdapterError,
    },
}
