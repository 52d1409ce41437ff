use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use pbx_types::{Identifier, IdentifierHasher};

use crate::reference::Reference;
use crate::store::StoreShared;

/// Interning table for [`Reference`] handles.
///
/// Holds at most one handle per identifier. [`get_or_create`] is atomic, so
/// decoder workers racing on the same identifier always end up sharing the
/// handle that won.
///
/// [`get_or_create`]: Self::get_or_create
pub struct ReferenceRepository {
    handles: DashMap<Identifier, Reference>,
    store: Weak<StoreShared>,
    next_provisional: AtomicU64,
}

impl ReferenceRepository {
    pub(crate) fn new(store: Weak<StoreShared>) -> Self {
        Self {
            handles: DashMap::new(),
            store,
            next_provisional: AtomicU64::new(0),
        }
    }

    /// The handle for `identifier`, creating it on first use.
    pub fn get_or_create(&self, identifier: &Identifier) -> Reference {
        self.handles
            .entry(identifier.clone())
            .or_insert_with(|| Reference::new(identifier.clone(), false, self.store.clone()))
            .clone()
    }

    /// The handle for `identifier`, if one has been interned.
    pub fn get(&self, identifier: &Identifier) -> Option<Reference> {
        self.handles.get(identifier).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.handles.contains_key(identifier)
    }

    /// Mint a fresh handle with a provisional identifier.
    ///
    /// The handle starts out pending; the next encode replaces its identifier
    /// with one derived from the object's position in the graph.
    pub fn provisional(&self) -> Reference {
        loop {
            let n = self.next_provisional.fetch_add(1, Ordering::Relaxed);
            let identifier = IdentifierHasher::PROVISIONAL.hash(&[n.to_string()]);
            if let Entry::Vacant(slot) = self.handles.entry(identifier.clone()) {
                let reference = Reference::new(identifier, true, self.store.clone());
                slot.insert(reference.clone());
                return reference;
            }
        }
    }

    /// Number of interned handles, dangling ones included.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of handles still waiting for a regenerated identifier.
    pub fn pending_count(&self) -> usize {
        self.handles.iter().filter(|entry| entry.value().is_pending()).count()
    }

    /// All handles, ordered by identifier.
    pub fn handles(&self) -> Vec<Reference> {
        let mut handles: Vec<Reference> =
            self.handles.iter().map(|entry| entry.value().clone()).collect();
        handles.sort();
        handles
    }

    pub(crate) fn remove(&self, identifier: &Identifier) -> Option<Reference> {
        self.handles.remove(identifier).map(|(_, reference)| reference)
    }

    /// Re-register a handle under its current identifier.
    pub(crate) fn insert(&self, reference: Reference) {
        self.handles.insert(reference.identifier(), reference);
    }

    pub(crate) fn clear_pending(&self) {
        for entry in self.handles.iter() {
            entry.value().set_pending(false);
        }
    }
}

impl std::fmt::Debug for ReferenceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceRepository")
            .field("handles", &self.handles.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use crate::store::ObjectStore;

    use super::*;

    #[test]
    fn interning_returns_the_same_handle() {
        let store = ObjectStore::new();
        let id = Identifier::new("13B07F961A680F5B00A75B9A").unwrap();
        let a = store.references().get_or_create(&id);
        let b = store.references().get_or_create(&id);
        assert!(a.same_handle(&b));
        assert_eq!(store.references().len(), 1);
    }

    #[test]
    fn concurrent_interning_yields_one_handle() {
        let store = Arc::new(ObjectStore::new());
        let id = Identifier::new("SHARED").unwrap();
        let handles: Vec<Reference> = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let store = &store;
                    let id = &id;
                    scope.spawn(move || store.references().get_or_create(id))
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert!(handles.windows(2).all(|pair| pair[0].same_handle(&pair[1])));
        assert_eq!(store.references().len(), 1);
    }

    #[test]
    fn provisional_handles_are_unique_and_pending() {
        let store = ObjectStore::new();
        let ids: HashSet<Identifier> = (0..100)
            .map(|_| {
                let reference = store.references().provisional();
                assert!(reference.is_pending());
                reference.identifier()
            })
            .collect();
        assert_eq!(ids.len(), 100);
        assert_eq!(store.references().pending_count(), 100);
    }

    #[test]
    fn provisional_skips_taken_identifiers() {
        let store = ObjectStore::new();
        let taken = IdentifierHasher::PROVISIONAL.hash(&["0"]);
        let existing = store.references().get_or_create(&taken);
        let fresh = store.references().provisional();
        assert!(!fresh.same_handle(&existing));
        assert_ne!(fresh.identifier(), taken);
    }
}
