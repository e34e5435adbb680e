//! In-memory item source with scriptable failures

use super::{DeleteOutcome, ItemSource, Page};
use crate::domain::{ItemId, MediaItem, PageCursor};
use crate::error::{Result, TriageError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Serves a fixed list of items in pages, in list order.
///
/// Useful for tests and demos: fetches and deletions can be made to fail,
/// individual ids can refuse deletion, and fetches or deletions can be held
/// open behind a gate until the test releases them.
#[derive(Debug)]
pub struct MemorySource {
    items: Vec<MediaItem>,
    page_size: usize,
    report_total: bool,
    deleted: Mutex<HashSet<ItemId>>,
    undeletable: HashSet<ItemId>,
    failing_fetches: AtomicUsize,
    failing_deletes: AtomicUsize,
    fetch_gate: Option<Arc<Notify>>,
    delete_gate: Option<Arc<Notify>>,
    fetch_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(items: Vec<MediaItem>, page_size: usize) -> Self {
        Self {
            items,
            page_size: page_size.max(1),
            report_total: true,
            deleted: Mutex::new(HashSet::new()),
            undeletable: HashSet::new(),
            failing_fetches: AtomicUsize::new(0),
            failing_deletes: AtomicUsize::new(0),
            fetch_gate: None,
            delete_gate: None,
            fetch_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    /// Leaves `total_count` unset on every page
    pub fn without_total(mut self) -> Self {
        self.report_total = false;
        self
    }

    /// Ids that are reported as failed whenever deletion is requested
    pub fn with_undeletable(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.undeletable.extend(ids);
        self
    }

    /// Every fetch waits for one `notify_one` on `gate` before answering
    pub fn with_fetch_gate(mut self, gate: Arc<Notify>) -> Self {
        self.fetch_gate = Some(gate);
        self
    }

    /// Every deletion call waits for one `notify_one` on `gate` before answering
    pub fn with_delete_gate(mut self, gate: Arc<Notify>) -> Self {
        self.delete_gate = Some(gate);
        self
    }

    /// The next `count` fetches fail with `SourceUnavailable`
    pub fn fail_next_fetches(&self, count: usize) {
        self.failing_fetches.store(count, Ordering::SeqCst);
    }

    /// The next `count` deletion calls fail with `SourceUnavailable`
    pub fn fail_next_deletes(&self, count: usize) {
        self.failing_deletes.store(count, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub async fn deleted(&self) -> HashSet<ItemId> {
        self.deleted.lock().await.clone()
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ItemSource for MemorySource {
    async fn fetch_page(&self, cursor: Option<&PageCursor>) -> Result<Page> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.fetch_gate {
            gate.notified().await;
        }

        if Self::take_failure(&self.failing_fetches) {
            return Err(TriageError::SourceUnavailable(
                "simulated fetch failure".to_string(),
            ));
        }

        let offset = match cursor {
            None => 0,
            Some(token) => token
                .as_str()
                .parse::<usize>()
                .map_err(|_| TriageError::InvalidCursor(token.to_string()))?,
        };

        let deleted = self.deleted.lock().await;
        let end = (offset + self.page_size).min(self.items.len());
        let items = self
            .items
            .get(offset..end)
            .unwrap_or(&[])
            .iter()
            .filter(|item| !deleted.contains(&item.id))
            .cloned()
            .collect();

        let has_more = end < self.items.len();
        let remaining = self
            .items
            .iter()
            .filter(|item| !deleted.contains(&item.id))
            .count();

        Ok(Page {
            items,
            next_cursor: has_more.then(|| PageCursor(end.to_string())),
            has_more,
            total_count: self.report_total.then_some(remaining),
        })
    }

    async fn delete_items(&self, ids: &[ItemId]) -> Result<DeleteOutcome> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.delete_gate {
            gate.notified().await;
        }

        if Self::take_failure(&self.failing_deletes) {
            return Err(TriageError::SourceUnavailable(
                "simulated delete failure".to_string(),
            ));
        }

        let mut deleted = self.deleted.lock().await;
        let mut outcome = DeleteOutcome::default();
        for id in ids {
            if self.undeletable.contains(id) {
                outcome.failed_ids.insert(id.clone());
            } else {
                deleted.insert(id.clone());
                outcome.deleted_ids.insert(id.clone());
            }
        }
        Ok(outcome)
    }
}
