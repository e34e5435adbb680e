use super::page_loader::{FetchRequest, FetchTicket, PageLoader};
use super::{ItemId, MediaItem};
use crate::error::{Result, TriageError};
use crate::source::Page;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Prefetch once the cursor passes this share of the loaded items
pub const DEFAULT_PREFETCH_PERCENT: u8 = 70;

/// What sits under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Current<'a> {
    Item(&'a MediaItem),
    /// Nothing loaded at the cursor yet, but the source has more
    Pending,
    /// Nothing loaded and nothing forthcoming
    EndOfQueue,
}

impl<'a> Current<'a> {
    pub fn item(self) -> Option<&'a MediaItem> {
        match self {
            Current::Item(item) => Some(item),
            _ => None,
        }
    }
}

/// Owned counterpart of [`Current`] for snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Reviewing,
    Loading,
    Exhausted,
}

/// Ordered, append-only list of loaded items plus the review cursor.
///
/// Items are only ever removed by finish reconciliation through
/// [`ReviewQueue::remove_ids`], which re-maps the cursor.
#[derive(Debug)]
pub struct ReviewQueue {
    items: Vec<MediaItem>,
    known: HashSet<ItemId>,
    cursor: usize,
    loader: PageLoader,
    prefetch_percent: u8,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::with_prefetch_percent(DEFAULT_PREFETCH_PERCENT)
    }

    pub fn with_prefetch_percent(prefetch_percent: u8) -> Self {
        Self {
            items: Vec::new(),
            known: HashSet::new(),
            cursor: 0,
            loader: PageLoader::new(),
            prefetch_percent: prefetch_percent.min(100),
        }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.loader.has_more()
    }

    pub fn total_count(&self) -> Option<usize> {
        self.loader.total_count()
    }

    pub fn is_fetch_in_flight(&self) -> bool {
        self.loader.is_in_flight()
    }

    pub fn loader(&self) -> &PageLoader {
        &self.loader
    }

    pub fn current(&self) -> Current<'_> {
        match self.items.get(self.cursor) {
            Some(item) => Current::Item(item),
            None if self.loader.has_more() => Current::Pending,
            None => Current::EndOfQueue,
        }
    }

    pub fn state(&self) -> QueueState {
        match self.current() {
            Current::Item(_) => QueueState::Reviewing,
            Current::Pending => QueueState::Loading,
            Current::EndOfQueue => QueueState::Exhausted,
        }
    }

    /// Cursor position at which the next page is requested
    pub fn prefetch_threshold(&self) -> usize {
        self.items.len() * usize::from(self.prefetch_percent) / 100
    }

    pub fn needs_prefetch(&self) -> bool {
        self.loader.has_more()
            && !self.loader.is_in_flight()
            && self.cursor >= self.prefetch_threshold()
    }

    pub fn begin_fetch(&mut self) -> Option<FetchRequest> {
        let request = self.loader.begin()?;
        debug!(
            cursor = ?request.cursor,
            loaded = self.items.len(),
            "requesting page"
        );
        Some(request)
    }

    /// Applies the source's answer to `begin_fetch`. The page commits in
    /// full or not at all. A stale ticket, or one issued before `reload`,
    /// is ignored and reports zero items.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<Page>) -> Result<usize> {
        if !self.loader.release(ticket) {
            debug!("discarding page for a stale request");
            return Ok(0);
        }

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                warn!(error = %err, "page fetch failed");
                return Err(match err {
                    TriageError::SourceUnavailable(_) => err,
                    other => TriageError::SourceUnavailable(other.to_string()),
                });
            }
        };

        let mut appended = 0;
        for item in page.items {
            if self.known.insert(item.id.clone()) {
                self.items.push(item);
                appended += 1;
            }
        }

        let first_page = self.loader.is_first_page();
        self.loader
            .advance(page.next_cursor, page.has_more, page.total_count, appended);

        if first_page {
            info!(
                total = ?self.loader.total_count(),
                has_more = self.loader.has_more(),
                "first page loaded"
            );
        }
        info!(
            appended,
            loaded = self.items.len(),
            pages = self.loader.pages_loaded(),
            has_more = self.loader.has_more(),
            "page loaded"
        );
        Ok(appended)
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.items.len());
    }

    pub(crate) fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Drops items by id and keeps the cursor on the same undecided item.
    /// Returns the ids actually removed, in queue order.
    pub(crate) fn remove_ids(&mut self, ids: &HashSet<ItemId>) -> Vec<ItemId> {
        let mut removed = Vec::new();
        let mut removed_before_cursor = 0;

        for (index, item) in self.items.iter().enumerate() {
            if ids.contains(&item.id) {
                if index < self.cursor {
                    removed_before_cursor += 1;
                }
                removed.push(item.id.clone());
            }
        }

        if removed.is_empty() {
            return removed;
        }

        self.items.retain(|item| !ids.contains(&item.id));
        for id in &removed {
            self.known.remove(id);
        }
        self.cursor = (self.cursor - removed_before_cursor).min(self.items.len());

        removed
    }

    /// Forgets every loaded item and starts paging from the beginning
    pub(crate) fn reload(&mut self) {
        self.items.clear();
        self.known.clear();
        self.cursor = 0;
        self.loader.restart();
    }
}

impl Default for ReviewQueue {
    fn default() -> Self {
        Self::new()
    }
}
