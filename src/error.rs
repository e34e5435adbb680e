//! Error types shared by the review engine, item sources and the binary

use crate::domain::DeletionReport;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    /// The item source failed; engine state is unchanged and the caller may retry
    #[error("item source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("invalid page cursor: {0}")]
    InvalidCursor(String),

    /// Some items were deleted, the rest stay pending for retry
    #[error(
        "deleted {} of {} items, {} failed",
        .0.deleted.len(),
        .0.requested(),
        .0.failed.len()
    )]
    PartialDeletion(DeletionReport),

    /// The source accepted the request but deleted nothing
    #[error("none of the {} items could be deleted", .0.failed.len())]
    DeletionRejected(DeletionReport),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl TriageError {
    /// The deletion report carried by a partial or rejected finish, if any
    pub fn report(&self) -> Option<&DeletionReport> {
        match self {
            TriageError::PartialDeletion(report) | TriageError::DeletionRejected(report) => {
                Some(report)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
