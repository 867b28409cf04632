//! Label reconciliation: pure add/remove of image↔entity cross-references.
//!
//! Both operations work on an immutable snapshot of a label list and return
//! the new list only when something actually changed, so callers persist
//! exactly when needed and repeated calls converge (idempotence). Membership
//! is decided by entity id alone; the rest of the entity is irrelevant.

use crate::types::{EntityId, Letter, Number, Word};

/// Anything that can sit in one of an image's label collections.
pub trait Labeled {
    fn label_id(&self) -> EntityId;
}

impl Labeled for Letter {
    fn label_id(&self) -> EntityId {
        self.id
    }
}

impl Labeled for Number {
    fn label_id(&self) -> EntityId {
        self.id
    }
}

impl Labeled for Word {
    fn label_id(&self) -> EntityId {
        self.id
    }
}

/// Append `label` unless an entry with the same id is already present.
///
/// Returns the extended list, or `None` for the already-present no-op.
/// Existing order is preserved; the new entry goes last.
pub fn append_label<T: Labeled + Clone>(labels: &[T], label: T) -> Option<Vec<T>> {
    if labels.iter().any(|l| l.label_id() == label.label_id()) {
        return None;
    }
    let mut next = labels.to_vec();
    next.push(label);
    Some(next)
}

/// Remove the first entry whose id matches.
///
/// Returns the shortened list, or `None` for the not-present no-op.
pub fn remove_label<T: Labeled + Clone>(labels: &[T], id: EntityId) -> Option<Vec<T>> {
    let index = labels.iter().position(|l| l.label_id() == id)?;
    let mut next = labels.to_vec();
    next.remove(index);
    Some(next)
}
