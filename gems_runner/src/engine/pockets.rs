use serde::Serialize;

use crate::environment::{ObjectId, ViewId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PocketItem {
    pub name: String,
    pub view_id: ViewId,
    pub object_id: ObjectId,
}

/// Pocket slots. Created on the first view load and kept for the session.
#[derive(Debug, Default, Clone)]
pub(super) struct PocketState {
    slots: Vec<Option<PocketItem>>,
    created: bool,
}

impl PocketState {
    pub(super) fn ensure_created(&mut self, count: usize) {
        if !self.created {
            self.slots = vec![None; count];
            self.created = true;
        }
    }

    pub(super) fn slots(&self) -> &[Option<PocketItem>] {
        &self.slots
    }

    pub(super) fn get(&self, pocket: usize) -> Option<&Option<PocketItem>> {
        self.slots.get(pocket)
    }

    pub(super) fn holding(&self, object_id: ObjectId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().map_or(false, |item| item.object_id == object_id))
    }

    pub(super) fn store(&mut self, pocket: usize, item: PocketItem) {
        if let Some(slot) = self.slots.get_mut(pocket) {
            *slot = Some(item);
        }
    }

    pub(super) fn take(&mut self, pocket: usize) -> Option<PocketItem> {
        self.slots.get_mut(pocket).and_then(Option::take)
    }
}
