//! The item source boundary: where media comes from and where deletions go

pub mod directory;
pub mod memory;

pub use directory::{DirectorySource, ScanOptions, ScanOrder, DEFAULT_PAGE_SIZE};
pub use memory::MemorySource;

use crate::domain::{ItemId, MediaItem, PageCursor};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// One page of items in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<MediaItem>,
    pub next_cursor: Option<PageCursor>,
    pub has_more: bool,
    /// Best-effort size of the whole library
    pub total_count: Option<usize>,
}

/// Per-id result of a deletion request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_ids: HashSet<ItemId>,
    pub failed_ids: HashSet<ItemId>,
}

impl DeleteOutcome {
    pub fn all_deleted(ids: &[ItemId]) -> Self {
        Self {
            deleted_ids: ids.iter().cloned().collect(),
            failed_ids: HashSet::new(),
        }
    }
}

/// Supplies pages of media and performs physical deletion.
///
/// Errors from either call are reported as
/// [`TriageError::SourceUnavailable`](crate::error::TriageError::SourceUnavailable).
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch_page(&self, cursor: Option<&PageCursor>) -> Result<Page>;

    async fn delete_items(&self, ids: &[ItemId]) -> Result<DeleteOutcome>;
}
