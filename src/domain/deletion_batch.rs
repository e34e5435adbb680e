use super::ItemId;
use std::collections::HashSet;

/// Ids pending physical deletion, in the order they were marked.
/// Adding an id twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionBatch {
    order: Vec<ItemId>,
    members: HashSet<ItemId>,
}

impl DeletionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already present
    pub fn insert(&mut self, id: ItemId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    pub fn remove(&mut self, id: &ItemId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|existing| existing != id);
        true
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.order
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Drops every id in `ids`, keeping the rest in order
    pub fn remove_all(&mut self, ids: &HashSet<ItemId>) {
        self.order.retain(|id| !ids.contains(id));
        self.members.retain(|id| !ids.contains(id));
    }
}
