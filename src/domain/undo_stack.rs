use super::{DecisionKind, HistoryEntry};

/// Ordered log of committed decisions. Only the newest entry can be reversed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoStack {
    entries: Vec<HistoryEntry>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn count(&self, kind: DecisionKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.decision.kind == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, ItemId};

    fn entry(kind: DecisionKind, index: usize) -> HistoryEntry {
        HistoryEntry {
            decision: Decision {
                kind,
                item_index: index,
                item_id: ItemId(format!("item-{}", index)),
            },
            previous_cursor: index,
        }
    }

    #[test]
    fn test_undo_stack_is_lifo() {
        let mut stack = UndoStack::new();
        stack.push(entry(DecisionKind::Keep, 0));
        stack.push(entry(DecisionKind::Delete, 1));

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek().map(|e| e.previous_cursor), Some(1));
        assert_eq!(stack.pop().map(|e| e.decision.kind), Some(DecisionKind::Delete));
        assert_eq!(stack.pop().map(|e| e.decision.kind), Some(DecisionKind::Keep));
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_undo_stack_counts_by_kind() {
        let mut stack = UndoStack::new();
        stack.push(entry(DecisionKind::Keep, 0));
        stack.push(entry(DecisionKind::Delete, 1));
        stack.push(entry(DecisionKind::Delete, 2));

        assert_eq!(stack.count(DecisionKind::Keep), 1);
        assert_eq!(stack.count(DecisionKind::Delete), 2);
    }

    #[test]
    fn test_undo_stack_clear() {
        let mut stack = UndoStack::new();
        stack.push(entry(DecisionKind::Keep, 0));
        stack.clear();
        assert!(stack.is_empty());
        assert!(stack.entries().is_empty());
    }
}
