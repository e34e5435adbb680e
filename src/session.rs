//! Async driver that connects the decision engine to an item source
//!
//! The engine lives behind a mutex that is never held across a source call,
//! so decisions keep working while a page load or a deletion is suspended.
//! Every state change is published as a [`ReviewEvent`].

use crate::domain::{
    Decision, DecisionEngine, DecisionKind, DecisionStatistics, DeletionReport, FetchRequest,
    FinishStart, HistoryEntry, MediaItem, QueueState, SwipeOutcome, UndoResult,
};
use crate::error::{Result, TriageError};
use crate::source::ItemSource;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::debug;

/// Capacity of the event channel; slow subscribers skip older events
const EVENT_CAPACITY: usize = 256;

/// State changes published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewEvent {
    PageLoaded {
        appended: usize,
        loaded: usize,
        has_more: bool,
    },
    PageFailed {
        message: String,
    },
    Decided(Decision),
    Undone(HistoryEntry),
    NothingToUndo,
    Reset,
    Reloaded,
    FinishStarted {
        count: usize,
    },
    NothingToDelete,
    Finished(DeletionReport),
    FinishPartial(DeletionReport),
    FinishFailed {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Appended(usize),
    /// Another load is already running; this call did nothing
    AlreadyInFlight,
    /// The source has no more pages
    Exhausted,
    /// The queue was reloaded while this load ran; its page was dropped and
    /// a load for the fresh queue was started
    Superseded,
    /// A deletion is in flight, so the queue was not reloaded
    FinishInFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    NothingToDelete,
    AlreadyInFlight,
    Deleted(DeletionReport),
}

/// Owned view of the queue for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    pub current: Option<MediaItem>,
    pub state: QueueState,
    pub cursor: usize,
    pub loaded: usize,
    pub total_count: Option<usize>,
    pub pending_deletions: usize,
    pub can_undo: bool,
    pub fetch_in_flight: bool,
    pub finish_in_flight: bool,
    pub swipe_threshold: f32,
    pub stats: DecisionStatistics,
}

struct Shared<S> {
    engine: Mutex<DecisionEngine>,
    source: S,
    events: broadcast::Sender<ReviewEvent>,
}

/// Cheaply cloneable handle to one review session
pub struct ReviewSession<S> {
    inner: Arc<Shared<S>>,
}

impl<S> Clone for ReviewSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ItemSource + 'static> ReviewSession<S> {
    pub fn new(source: S, engine: DecisionEngine) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Shared {
                engine: Mutex::new(engine),
                source,
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.inner.events.subscribe()
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    fn emit(&self, event: ReviewEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    async fn engine(&self) -> MutexGuard<'_, DecisionEngine> {
        self.inner.engine.lock().await
    }

    /// Fetches the next page unless one is already in flight or the source is
    /// exhausted. On failure the queue is unchanged and the caller may retry.
    pub async fn load_next_page(&self) -> Result<LoadOutcome> {
        let request = {
            let mut engine = self.engine().await;
            if !engine.queue().has_more() {
                return Ok(LoadOutcome::Exhausted);
            }
            match engine.begin_fetch() {
                Some(request) => request,
                None => return Ok(LoadOutcome::AlreadyInFlight),
            }
        };

        self.run_fetch(request).await
    }

    async fn run_fetch(&self, request: FetchRequest) -> Result<LoadOutcome> {
        let result = self.inner.source.fetch_page(request.cursor.as_ref()).await;

        let mut engine = self.engine().await;
        if engine.queue().loader().is_superseded(request.ticket) {
            engine.complete_fetch(request.ticket, result)?;
            debug!("page dropped after reload, loading the fresh queue");
            // Detached; its result reaches subscribers as an event
            let _ = self.prefetch_locked(&mut engine);
            return Ok(LoadOutcome::Superseded);
        }
        match engine.complete_fetch(request.ticket, result) {
            Ok(appended) => {
                self.emit(ReviewEvent::PageLoaded {
                    appended,
                    loaded: engine.queue().len(),
                    has_more: engine.queue().has_more(),
                });
                Ok(LoadOutcome::Appended(appended))
            }
            Err(err) => {
                self.emit(ReviewEvent::PageFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Claims the fetch slot while the lock is held, then runs the fetch in
    /// the background. Returns `None` when no prefetch is due.
    fn prefetch_locked(&self, engine: &mut DecisionEngine) -> Option<JoinHandle<Result<LoadOutcome>>> {
        if !engine.needs_prefetch() {
            return None;
        }
        let request = engine.begin_fetch()?;
        debug!(cursor = engine.cursor(), "prefetching next page");

        let session = self.clone();
        Some(tokio::spawn(async move { session.run_fetch(request).await }))
    }

    /// Starts a background load if the cursor is close enough to the tail
    pub async fn prefetch_if_needed(&self) -> Option<JoinHandle<Result<LoadOutcome>>> {
        let mut engine = self.engine().await;
        self.prefetch_locked(&mut engine)
    }

    pub async fn decide(&self, index: usize, kind: DecisionKind) -> Option<Decision> {
        let mut engine = self.engine().await;
        let decision = engine.record_decision(index, kind)?;
        self.emit(ReviewEvent::Decided(decision.clone()));
        // Detached; its result reaches subscribers as an event
        let _ = self.prefetch_locked(&mut engine);
        Some(decision)
    }

    pub async fn keep(&self) -> Option<Decision> {
        let mut engine = self.engine().await;
        let decision = engine.keep_current()?;
        self.emit(ReviewEvent::Decided(decision.clone()));
        // Detached; its result reaches subscribers as an event
        let _ = self.prefetch_locked(&mut engine);
        Some(decision)
    }

    pub async fn delete(&self) -> Option<Decision> {
        let mut engine = self.engine().await;
        let decision = engine.delete_current()?;
        self.emit(ReviewEvent::Decided(decision.clone()));
        // Detached; its result reaches subscribers as an event
        let _ = self.prefetch_locked(&mut engine);
        Some(decision)
    }

    /// Applies a released swipe to the current item
    pub async fn swipe(&self, displacement: f32) -> SwipeOutcome {
        let mut engine = self.engine().await;
        let (outcome, decision) = engine.swipe(displacement);
        if let Some(decision) = decision {
            self.emit(ReviewEvent::Decided(decision));
            let _ = self.prefetch_locked(&mut engine);
        }
        outcome
    }

    pub async fn undo(&self) -> UndoResult {
        let result = self.engine().await.undo();
        match &result {
            UndoResult::Undone(entry) => self.emit(ReviewEvent::Undone(entry.clone())),
            UndoResult::NothingToUndo => self.emit(ReviewEvent::NothingToUndo),
        }
        result
    }

    pub async fn reset(&self) {
        self.engine().await.reset();
        self.emit(ReviewEvent::Reset);
    }

    /// Drops everything loaded and fetches the first page again.
    ///
    /// Does nothing while a deletion is in flight. If a page load from before
    /// the reload is still running, this returns `AlreadyInFlight` and that
    /// load starts the fresh one when it lands.
    pub async fn reload(&self) -> Result<LoadOutcome> {
        if !self.engine().await.reload() {
            return Ok(LoadOutcome::FinishInFlight);
        }
        self.emit(ReviewEvent::Reloaded);
        self.load_next_page().await
    }

    /// Physically deletes the pending batch. Confirmation is the caller's job.
    ///
    /// A partial outcome is reported as [`TriageError::PartialDeletion`]; the
    /// ids that failed stay pending.
    pub async fn finish(&self) -> Result<FinishOutcome> {
        let request = match self.engine().await.begin_finish() {
            FinishStart::NothingToDelete => {
                self.emit(ReviewEvent::NothingToDelete);
                return Ok(FinishOutcome::NothingToDelete);
            }
            FinishStart::AlreadyInFlight => return Ok(FinishOutcome::AlreadyInFlight),
            FinishStart::Ready(request) => request,
        };

        self.emit(ReviewEvent::FinishStarted {
            count: request.ids.len(),
        });
        let result = self.inner.source.delete_items(&request.ids).await;

        let mut engine = self.engine().await;
        let outcome = engine.complete_finish(request.ticket, result);
        match &outcome {
            Ok(report) => self.emit(ReviewEvent::Finished(report.clone())),
            Err(TriageError::PartialDeletion(report)) => {
                self.emit(ReviewEvent::FinishPartial(report.clone()))
            }
            Err(err) => self.emit(ReviewEvent::FinishFailed {
                message: err.to_string(),
            }),
        }
        let _ = self.prefetch_locked(&mut engine);

        outcome.map(FinishOutcome::Deleted)
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        let engine = self.engine().await;
        let queue = engine.queue();
        QueueSnapshot {
            current: engine.current().item().cloned(),
            state: queue.state(),
            cursor: queue.cursor(),
            loaded: queue.len(),
            total_count: queue.total_count(),
            pending_deletions: engine.batch().len(),
            can_undo: engine.can_undo(),
            fetch_in_flight: queue.is_fetch_in_flight(),
            finish_in_flight: engine.is_finish_in_flight(),
            swipe_threshold: engine.swipe_threshold(),
            stats: engine.get_statistics(),
        }
    }

    pub async fn statistics(&self) -> DecisionStatistics {
        self.engine().await.get_statistics()
    }
}
