use super::page_loader::{FetchRequest, FetchTicket};
use super::{
    Current, Decision, DecisionKind, DecisionStatistics, DeletionBatch, DeletionReport,
    HistoryEntry, ItemId, ReviewQueue, SwipeOutcome, UndoStack,
};
use crate::error::{Result, TriageError};
use crate::source::{DeleteOutcome, Page};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Default swipe distance, in columns, that commits a decision
pub const DEFAULT_SWIPE_THRESHOLD: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FinishTicket(u64);

/// Ids to hand to the source for physical deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishRequest {
    pub ticket: FinishTicket,
    pub ids: Vec<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishStart {
    /// Batch is empty, the source must not be called
    NothingToDelete,
    AlreadyInFlight,
    Ready(FinishRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoResult {
    Undone(HistoryEntry),
    NothingToUndo,
}

/// The review state machine: cursor transitions, undo history and the
/// pending deletion batch, on top of the paged [`ReviewQueue`].
///
/// Calls that talk to the item source are split in two (`begin_*` hands out
/// a ticket, `complete_*` applies the answer) so decisions can keep flowing
/// while the source call is suspended.
#[derive(Debug)]
pub struct DecisionEngine {
    queue: ReviewQueue,
    history: UndoStack,
    batch: DeletionBatch,
    finish_in_flight: Option<(FinishTicket, Vec<ItemId>)>,
    next_finish_ticket: u64,
    swipe_threshold: f32,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::with_queue(ReviewQueue::new())
    }

    pub fn with_queue(queue: ReviewQueue) -> Self {
        Self {
            queue,
            history: UndoStack::new(),
            batch: DeletionBatch::new(),
            finish_in_flight: None,
            next_finish_ticket: 0,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
        }
    }

    pub fn set_swipe_threshold(&mut self, threshold: f32) {
        self.swipe_threshold = threshold.abs();
    }

    pub fn swipe_threshold(&self) -> f32 {
        self.swipe_threshold
    }

    pub fn queue(&self) -> &ReviewQueue {
        &self.queue
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn batch(&self) -> &DeletionBatch {
        &self.batch
    }

    pub fn cursor(&self) -> usize {
        self.queue.cursor()
    }

    pub fn current(&self) -> Current<'_> {
        self.queue.current()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn is_finish_in_flight(&self) -> bool {
        self.finish_in_flight.is_some()
    }

    pub fn needs_prefetch(&self) -> bool {
        self.queue.needs_prefetch()
    }

    pub fn begin_fetch(&mut self) -> Option<FetchRequest> {
        self.queue.begin_fetch()
    }

    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<Page>) -> Result<usize> {
        self.queue.complete_fetch(ticket, result)
    }

    /// Commits a decision for the item at `index`.
    ///
    /// Only the item under the cursor can be decided. Anything else (a stale
    /// index, or no item loaded at the cursor) is ignored and returns `None`.
    pub fn record_decision(&mut self, index: usize, kind: DecisionKind) -> Option<Decision> {
        let cursor = self.queue.cursor();
        if index != cursor {
            debug!(index, cursor, "ignoring decision for stale index");
            return None;
        }

        let item_id = match self.queue.get(index) {
            Some(item) => item.id.clone(),
            None => {
                debug!(index, "ignoring decision with no item under the cursor");
                return None;
            }
        };

        let decision = Decision {
            kind,
            item_index: index,
            item_id,
        };

        if kind == DecisionKind::Delete {
            self.batch.insert(decision.item_id.clone());
        }
        self.history.push(HistoryEntry {
            decision: decision.clone(),
            previous_cursor: cursor,
        });
        self.queue.set_cursor(index + 1);

        debug!(?kind, id = %decision.item_id, index, "decision recorded");
        Some(decision)
    }

    pub fn keep(&mut self, index: usize) -> Option<Decision> {
        self.record_decision(index, DecisionKind::Keep)
    }

    pub fn delete(&mut self, index: usize) -> Option<Decision> {
        self.record_decision(index, DecisionKind::Delete)
    }

    pub fn keep_current(&mut self) -> Option<Decision> {
        self.keep(self.queue.cursor())
    }

    pub fn delete_current(&mut self) -> Option<Decision> {
        self.delete(self.queue.cursor())
    }

    /// Classifies a horizontal displacement and applies it to the current item
    pub fn swipe(&mut self, displacement: f32) -> (SwipeOutcome, Option<Decision>) {
        let outcome = SwipeOutcome::classify(displacement, self.swipe_threshold);
        let decision = outcome
            .decision_kind()
            .and_then(|kind| self.record_decision(self.queue.cursor(), kind));
        (outcome, decision)
    }

    /// Reverses the newest decision, restoring the cursor it was made at
    pub fn undo(&mut self) -> UndoResult {
        let entry = match self.history.pop() {
            Some(entry) => entry,
            None => return UndoResult::NothingToUndo,
        };

        if entry.decision.kind == DecisionKind::Delete {
            self.batch.remove(&entry.decision.item_id);
        }
        self.queue.set_cursor(entry.previous_cursor);

        debug!(
            kind = ?entry.decision.kind,
            id = %entry.decision.item_id,
            cursor = entry.previous_cursor,
            "decision undone"
        );
        UndoResult::Undone(entry)
    }

    /// Starts the review over without touching the loaded items
    pub fn reset(&mut self) {
        self.queue.rewind();
        self.history.clear();
        self.batch.clear();
        info!(loaded = self.queue.len(), "review restarted");
    }

    /// Drops every loaded item and all decisions; paging starts over.
    ///
    /// Refused (returns false, nothing changes) while a finish is in flight,
    /// since its outcome has to be reconciled against the current batch.
    pub fn reload(&mut self) -> bool {
        if self.finish_in_flight.is_some() {
            debug!("not reloading while a deletion is in flight");
            return false;
        }
        self.queue.reload();
        self.history.clear();
        self.batch.clear();
        info!("queue reloaded");
        true
    }

    pub fn begin_finish(&mut self) -> FinishStart {
        if self.finish_in_flight.is_some() {
            return FinishStart::AlreadyInFlight;
        }
        if self.batch.is_empty() {
            return FinishStart::NothingToDelete;
        }

        let ticket = FinishTicket(self.next_finish_ticket);
        self.next_finish_ticket += 1;
        let ids = self.batch.ids().to_vec();
        self.finish_in_flight = Some((ticket, ids.clone()));

        info!(count = ids.len(), "deleting marked items");
        FinishStart::Ready(FinishRequest { ticket, ids })
    }

    /// Reconciles the queue with the source's deletion outcome.
    ///
    /// Deleted items leave the queue and the batch, and the undo history is
    /// dropped. Ids the source did not confirm stay in the batch. When the
    /// source fails outright, or deletes nothing, state is left as it was.
    ///
    /// An outcome for a ticket that no longer holds the finish slot (a late
    /// answer after a failed attempt) is still applied for the ids the
    /// source reports, since those files are gone either way.
    pub fn complete_finish(
        &mut self,
        ticket: FinishTicket,
        result: Result<DeleteOutcome>,
    ) -> Result<DeletionReport> {
        let requested = match self.finish_in_flight.take() {
            Some((in_flight, ids)) if in_flight == ticket => Some(ids),
            other => {
                self.finish_in_flight = other;
                debug!("deletion outcome for a request that no longer holds the slot");
                None
            }
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "deletion failed");
                return Err(match err {
                    TriageError::SourceUnavailable(_) => err,
                    other => TriageError::SourceUnavailable(other.to_string()),
                });
            }
        };

        let requested = requested.unwrap_or_else(|| {
            let mut ids: Vec<ItemId> = outcome
                .deleted_ids
                .iter()
                .chain(outcome.failed_ids.iter())
                .cloned()
                .collect();
            ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            ids
        });

        let (deleted, failed): (Vec<ItemId>, Vec<ItemId>) = requested
            .into_iter()
            .partition(|id| outcome.deleted_ids.contains(id));
        let report = DeletionReport { deleted, failed };

        if report.deleted.is_empty() {
            warn!(failed = report.failed.len(), "source deleted nothing");
            return Err(TriageError::DeletionRejected(report));
        }

        let deleted_ids: HashSet<ItemId> = report.deleted.iter().cloned().collect();
        self.queue.remove_ids(&deleted_ids);
        self.batch.remove_all(&deleted_ids);
        self.history.clear();

        if report.is_complete() {
            info!(deleted = report.deleted.len(), "deletion complete");
            Ok(report)
        } else {
            warn!(
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "deletion partially failed"
            );
            Err(TriageError::PartialDeletion(report))
        }
    }

    pub fn get_statistics(&self) -> DecisionStatistics {
        DecisionStatistics {
            loaded: self.queue.len(),
            reviewed: self.history.len(),
            kept: self.history.count(DecisionKind::Keep),
            marked_for_deletion: self.batch.len(),
            total_count: self.queue.total_count(),
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{item, items};
    use crate::domain::{MediaItem, PageCursor};

    fn page(items: Vec<MediaItem>, next: Option<&str>, has_more: bool) -> Page {
        Page {
            items,
            next_cursor: next.map(|c| PageCursor(c.to_string())),
            has_more,
            total_count: None,
        }
    }

    fn load(engine: &mut DecisionEngine, page: Page) {
        let request = engine.begin_fetch().unwrap();
        engine.complete_fetch(request.ticket, Ok(page)).unwrap();
    }

    fn engine_with(ids: &[&str]) -> DecisionEngine {
        let mut engine = DecisionEngine::new();
        load(
            &mut engine,
            page(ids.iter().map(|id| item(id)).collect(), None, false),
        );
        engine
    }

    fn batch_ids(engine: &DecisionEngine) -> Vec<&str> {
        engine.batch().ids().iter().map(|id| id.as_str()).collect()
    }

    fn outcome(deleted: &[&str], failed: &[&str]) -> DeleteOutcome {
        DeleteOutcome {
            deleted_ids: deleted.iter().map(|id| ItemId::from(*id)).collect(),
            failed_ids: failed.iter().map(|id| ItemId::from(*id)).collect(),
        }
    }

    fn ready(engine: &mut DecisionEngine) -> FinishRequest {
        match engine.begin_finish() {
            FinishStart::Ready(request) => request,
            other => panic!("expected a finish request, got {:?}", other),
        }
    }

    mod decision_tests {
        use super::*;

        #[test]
        fn test_keep_advances_without_batch() {
            let mut engine = engine_with(&["a", "b"]);

            let decision = engine.keep(0).unwrap();

            assert_eq!(decision.kind, DecisionKind::Keep);
            assert_eq!(decision.item_id, ItemId::from("a"));
            assert_eq!(engine.cursor(), 1);
            assert!(engine.batch().is_empty());
            assert_eq!(engine.history().len(), 1);
        }

        #[test]
        fn test_delete_marks_and_advances() {
            let mut engine = engine_with(&["a", "b"]);

            engine.delete(0).unwrap();

            assert_eq!(engine.cursor(), 1);
            assert_eq!(batch_ids(&engine), vec!["a"]);
            assert_eq!(engine.history().peek().map(|e| e.previous_cursor), Some(0));
        }

        #[test]
        fn test_stale_index_is_ignored() {
            let mut engine = engine_with(&["a", "b"]);
            engine.keep(0).unwrap();

            assert!(engine.delete(0).is_none());
            assert!(engine.keep(5).is_none());
            assert_eq!(engine.cursor(), 1);
            assert_eq!(engine.history().len(), 1);
        }

        #[test]
        fn test_decisions_at_end_of_queue_are_noops() {
            let mut engine = engine_with(&["a"]);
            engine.keep_current().unwrap();

            assert_eq!(engine.current(), Current::EndOfQueue);
            assert!(engine.keep_current().is_none());
            assert!(engine.delete_current().is_none());
            assert_eq!(engine.cursor(), 1);
            assert_eq!(engine.history().len(), 1);
        }

        #[test]
        fn test_decisions_while_pending_are_noops() {
            let mut engine = DecisionEngine::new();
            assert_eq!(engine.current(), Current::Pending);
            assert!(engine.delete_current().is_none());
            assert!(engine.batch().is_empty());
        }

        #[test]
        fn test_swipe_three_way() {
            let mut engine = engine_with(&["a", "b", "c"]);
            engine.set_swipe_threshold(10.0);

            let (outcome, decision) = engine.swipe(3.0);
            assert_eq!(outcome, SwipeOutcome::Cancel);
            assert!(decision.is_none());
            assert_eq!(engine.cursor(), 0);

            let (outcome, decision) = engine.swipe(-12.0);
            assert_eq!(outcome, SwipeOutcome::Delete);
            assert_eq!(decision.map(|d| d.item_id), Some(ItemId::from("a")));

            let (outcome, _) = engine.swipe(10.0);
            assert_eq!(outcome, SwipeOutcome::Keep);
            assert_eq!(engine.cursor(), 2);
            assert_eq!(batch_ids(&engine), vec!["a"]);
        }

        #[test]
        fn test_statistics_follow_undo() {
            let mut engine = engine_with(&["a", "b", "c"]);
            engine.keep(0);
            engine.delete(1);
            engine.delete(2);
            engine.undo();

            let stats = engine.get_statistics();
            assert_eq!(stats.loaded, 3);
            assert_eq!(stats.reviewed, 2);
            assert_eq!(stats.kept, 1);
            assert_eq!(stats.marked_for_deletion, 1);
        }
    }

    mod undo_tests {
        use super::*;

        #[test]
        fn test_keep_then_delete_undo_scenario() {
            let mut engine = engine_with(&["A", "B", "C"]);

            engine.delete(0).unwrap();
            assert_eq!(batch_ids(&engine), vec!["A"]);
            assert_eq!(engine.cursor(), 1);

            engine.keep(1).unwrap();
            assert_eq!(engine.cursor(), 2);

            assert!(matches!(engine.undo(), UndoResult::Undone(_)));
            assert_eq!(engine.cursor(), 1);
            assert_eq!(batch_ids(&engine), vec!["A"]);

            assert!(matches!(engine.undo(), UndoResult::Undone(_)));
            assert_eq!(engine.cursor(), 0);
            assert!(engine.batch().is_empty());
        }

        #[test]
        fn test_undo_empty() {
            let mut engine = engine_with(&["a"]);
            assert_eq!(engine.undo(), UndoResult::NothingToUndo);
            assert_eq!(engine.cursor(), 0);
        }

        #[test]
        fn test_redeciding_after_undo_keeps_batch_unique() {
            let mut engine = engine_with(&["a", "b"]);
            for _ in 0..3 {
                engine.delete(0).unwrap();
                engine.undo();
                engine.delete(0).unwrap();
                engine.undo();
            }
            engine.delete(0).unwrap();
            assert_eq!(batch_ids(&engine), vec!["a"]);
        }

        #[test]
        fn test_undo_across_page_boundary() {
            let mut engine = DecisionEngine::new();
            load(&mut engine, page(vec![item("a"), item("b")], Some("2"), true));
            engine.keep(0);
            engine.delete(1);
            load(&mut engine, page(vec![item("c")], None, false));
            engine.delete(2);

            engine.undo();
            engine.undo();
            assert_eq!(engine.cursor(), 1);
            assert!(engine.batch().is_empty());
            assert_eq!(engine.queue().len(), 3);
        }

        #[test]
        fn test_reset_rewinds_and_clears() {
            let mut engine = engine_with(&["a", "b", "c"]);
            engine.delete(0);
            engine.keep(1);

            engine.reset();

            assert_eq!(engine.cursor(), 0);
            assert!(engine.batch().is_empty());
            assert!(!engine.can_undo());
            assert_eq!(engine.queue().len(), 3);
        }

        #[test]
        fn test_reload_drops_everything() {
            let mut engine = engine_with(&["a", "b"]);
            engine.delete(0);
            assert!(engine.reload());

            assert!(engine.queue().is_empty());
            assert!(engine.batch().is_empty());
            assert_eq!(engine.current(), Current::Pending);
        }
    }

    mod finish_tests {
        use super::*;

        #[test]
        fn test_finish_with_empty_batch() {
            let mut engine = engine_with(&["a"]);
            engine.keep(0);
            assert_eq!(engine.begin_finish(), FinishStart::NothingToDelete);
            assert!(!engine.is_finish_in_flight());
        }

        #[test]
        fn test_finish_full_success() {
            let mut engine = engine_with(&["a", "b", "c", "d"]);
            engine.delete(0);
            engine.keep(1);
            engine.delete(2);

            let request = ready(&mut engine);
            assert_eq!(request.ids, vec![ItemId::from("a"), ItemId::from("c")]);

            let report = engine
                .complete_finish(request.ticket, Ok(outcome(&["a", "c"], &[])))
                .unwrap();

            assert_eq!(report.deleted.len(), 2);
            assert!(report.is_complete());
            assert!(engine.batch().is_empty());
            assert!(!engine.can_undo());
            let ids: Vec<_> = engine.queue().items().iter().map(|i| i.id.as_str()).collect();
            assert_eq!(ids, vec!["b", "d"]);
            assert_eq!(engine.current().item().map(|i| i.id.as_str()), Some("d"));
        }

        #[test]
        fn test_finish_partial_failure() {
            let mut engine = engine_with(&["a", "b", "c"]);
            engine.delete(0);
            engine.delete(1);
            engine.delete(2);

            let request = ready(&mut engine);
            let result = engine.complete_finish(request.ticket, Ok(outcome(&["a", "c"], &["b"])));

            match result {
                Err(TriageError::PartialDeletion(report)) => {
                    assert_eq!(report.deleted, vec![ItemId::from("a"), ItemId::from("c")]);
                    assert_eq!(report.failed, vec![ItemId::from("b")]);
                }
                other => panic!("expected partial deletion, got {:?}", other),
            }

            assert_eq!(batch_ids(&engine), vec!["b"]);
            let ids: Vec<_> = engine.queue().items().iter().map(|i| i.id.as_str()).collect();
            assert_eq!(ids, vec!["b"]);
            assert_eq!(engine.cursor(), 1);
            assert!(!engine.can_undo());
            assert!(!engine.is_finish_in_flight());
        }

        #[test]
        fn test_unconfirmed_ids_count_as_failed() {
            let mut engine = engine_with(&["a", "b"]);
            engine.delete(0);
            engine.delete(1);

            let request = ready(&mut engine);
            let result = engine.complete_finish(request.ticket, Ok(outcome(&["a"], &[])));

            assert!(matches!(result, Err(TriageError::PartialDeletion(_))));
            assert_eq!(batch_ids(&engine), vec!["b"]);
        }

        #[test]
        fn test_finish_rejected_leaves_state() {
            let mut engine = engine_with(&["a", "b"]);
            engine.delete(0);

            let request = ready(&mut engine);
            let result = engine.complete_finish(request.ticket, Ok(outcome(&[], &["a"])));

            assert!(matches!(result, Err(TriageError::DeletionRejected(_))));
            assert_eq!(batch_ids(&engine), vec!["a"]);
            assert!(engine.can_undo());
            assert_eq!(engine.queue().len(), 2);
            assert_eq!(engine.cursor(), 1);
        }

        #[test]
        fn test_finish_source_error_allows_retry() {
            let mut engine = engine_with(&["a", "b"]);
            engine.delete(0);

            let request = ready(&mut engine);
            let result = engine.complete_finish(
                request.ticket,
                Err(TriageError::SourceUnavailable("permission revoked".to_string())),
            );

            assert!(matches!(result, Err(TriageError::SourceUnavailable(_))));
            assert_eq!(batch_ids(&engine), vec!["a"]);
            assert_eq!(engine.history().len(), 1);

            let retry = ready(&mut engine);
            engine
                .complete_finish(retry.ticket, Ok(outcome(&["a"], &[])))
                .unwrap();
            assert!(engine.batch().is_empty());
        }

        #[test]
        fn test_second_finish_while_in_flight() {
            let mut engine = engine_with(&["a"]);
            engine.delete(0);
            let _request = ready(&mut engine);
            assert_eq!(engine.begin_finish(), FinishStart::AlreadyInFlight);
        }

        #[test]
        fn test_decisions_during_finish_are_kept() {
            let mut engine = DecisionEngine::new();
            load(&mut engine, page(vec![item("a"), item("b")], Some("2"), true));
            engine.delete(0);
            let request = ready(&mut engine);

            engine.delete(1);
            load(&mut engine, page(vec![item("c")], None, false));

            engine
                .complete_finish(request.ticket, Ok(outcome(&["a"], &[])))
                .unwrap();

            assert_eq!(batch_ids(&engine), vec!["b"]);
            let ids: Vec<_> = engine.queue().items().iter().map(|i| i.id.as_str()).collect();
            assert_eq!(ids, vec!["b", "c"]);
            assert_eq!(engine.current().item().map(|i| i.id.as_str()), Some("c"));
        }

        #[test]
        fn test_reload_refused_while_finish_in_flight() {
            let mut engine = engine_with(&["a", "b"]);
            engine.delete(0);
            let request = ready(&mut engine);

            assert!(!engine.reload());
            assert_eq!(engine.queue().len(), 2);
            assert_eq!(batch_ids(&engine), vec!["a"]);
            assert_eq!(engine.begin_finish(), FinishStart::AlreadyInFlight);

            engine
                .complete_finish(request.ticket, Ok(outcome(&["a"], &[])))
                .unwrap();
            assert!(engine.batch().is_empty());
            assert_eq!(engine.queue().len(), 1);

            assert!(engine.reload());
            assert!(engine.queue().is_empty());
        }

        #[test]
        fn test_late_outcome_after_failure_is_applied() {
            let mut engine = engine_with(&["a", "b", "c"]);
            engine.delete(0);
            engine.delete(1);
            let request = ready(&mut engine);

            let err = engine
                .complete_finish(
                    request.ticket,
                    Err(TriageError::SourceUnavailable("timeout".to_string())),
                )
                .unwrap_err();
            assert!(matches!(err, TriageError::SourceUnavailable(_)));
            assert_eq!(batch_ids(&engine), vec!["a", "b"]);

            // The source did delete "a" after all
            let report = engine
                .complete_finish(request.ticket, Ok(outcome(&["a"], &[])))
                .unwrap();

            assert_eq!(report.deleted, vec![ItemId::from("a")]);
            assert_eq!(batch_ids(&engine), vec!["b"]);
            let ids: Vec<_> = engine.queue().items().iter().map(|i| i.id.as_str()).collect();
            assert_eq!(ids, vec!["b", "c"]);
            assert!(!engine.is_finish_in_flight());
        }

        #[test]
        fn test_late_outcome_leaves_current_finish_in_flight() {
            let mut engine = engine_with(&["a", "b"]);
            engine.delete(0);
            let first = ready(&mut engine);
            engine
                .complete_finish(
                    first.ticket,
                    Err(TriageError::SourceUnavailable("timeout".to_string())),
                )
                .unwrap_err();

            let second = ready(&mut engine);
            engine
                .complete_finish(first.ticket, Ok(outcome(&[], &["a"])))
                .unwrap_err();

            assert!(engine.is_finish_in_flight());
            assert_eq!(engine.begin_finish(), FinishStart::AlreadyInFlight);
            engine
                .complete_finish(second.ticket, Ok(outcome(&["a"], &[])))
                .unwrap();
            assert!(engine.batch().is_empty());
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, PartialEq)]
        struct Observed {
            cursor: usize,
            batch: DeletionBatch,
            history: UndoStack,
        }

        fn observe(engine: &DecisionEngine) -> Observed {
            Observed {
                cursor: engine.cursor(),
                batch: engine.batch().clone(),
                history: engine.history().clone(),
            }
        }

        proptest! {
            #[test]
            fn decisions_then_undos_restore_state(
                prefix in proptest::collection::vec(any::<bool>(), 0..10),
                steps in proptest::collection::vec((any::<bool>(), any::<bool>()), 0..40),
            ) {
                let mut engine = DecisionEngine::new();
                let mut next = 0;
                let mut pages = 0;
                let mut append = |engine: &mut DecisionEngine| {
                    if let Some(request) = engine.begin_fetch() {
                        let batch = items(100).into_iter().skip(next).take(5).collect();
                        next += 5;
                        pages += 1;
                        engine
                            .complete_fetch(
                                request.ticket,
                                Ok(page(batch, Some("more"), pages < 20)),
                            )
                            .unwrap();
                    }
                };
                append(&mut engine);

                for keep in prefix {
                    if keep {
                        engine.keep_current();
                    } else {
                        engine.delete_current();
                    }
                }

                let before = observe(&engine);
                let mut committed = 0;
                for (keep, load_page) in steps {
                    if load_page {
                        append(&mut engine);
                    }
                    let decided = if keep {
                        engine.keep_current()
                    } else {
                        engine.delete_current()
                    };
                    if decided.is_some() {
                        committed += 1;
                    }
                    prop_assert!(engine.cursor() <= engine.queue().len());
                }

                for _ in 0..committed {
                    prop_assert!(matches!(engine.undo(), UndoResult::Undone(_)));
                }

                prop_assert_eq!(observe(&engine), before);
            }
        }
    }
}
