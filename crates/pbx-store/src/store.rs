use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::trace;

use pbx_types::Identifier;

use crate::error::{StoreError, StoreResult};
use crate::kind::ObjectKind;
use crate::object::{ObjectVariant, PbxObject};
use crate::objects::Group;
use crate::reference::Reference;
use crate::repository::ReferenceRepository;

/// State shared between an [`ObjectStore`] and the references it mints.
pub(crate) struct StoreShared {
    objects: DashMap<Identifier, PbxObject>,
    by_kind: DashMap<ObjectKind, BTreeSet<Identifier>>,
    references: ReferenceRepository,
}

impl StoreShared {
    pub(crate) fn get(&self, id: &Identifier) -> Option<PbxObject> {
        self.objects.get(id).map(|entry| entry.value().clone())
    }

    pub(crate) fn get_as<T: ObjectVariant>(&self, id: &Identifier) -> StoreResult<T> {
        let entry = self.objects.get(id).ok_or_else(|| StoreError::MissingReference {
            id: id.clone(),
            expected: Some(T::KIND),
        })?;
        T::from_body(entry.value().body())
            .cloned()
            .ok_or_else(|| StoreError::WrongType {
                id: id.clone(),
                expected: T::KIND,
                actual: entry.value().kind(),
            })
    }
}

/// Identifier-keyed table of every object in a document.
///
/// Reads and inserts may run concurrently from many threads; that is how the
/// decoder fills the store. Operations that rewrite identifiers or several
/// entries at once are crate-internal and only reachable through
/// [`Document`](crate::Document) methods taking `&mut self`.
///
/// Alongside the main table the store keeps a per-kind index of identifiers,
/// so [`all_of_kind`](Self::all_of_kind) never scans every object.
pub struct ObjectStore {
    shared: Arc<StoreShared>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new_cyclic(|weak| StoreShared {
                objects: DashMap::new(),
                by_kind: DashMap::new(),
                references: ReferenceRepository::new(weak.clone()),
            }),
        }
    }

    /// The interning table for this store's references.
    pub fn references(&self) -> &ReferenceRepository {
        &self.shared.references
    }

    /// Shorthand for `references().get_or_create(id)`.
    pub fn reference(&self, id: &Identifier) -> Reference {
        self.shared.references.get_or_create(id)
    }

    fn check_handle(&self, reference: &Reference) -> StoreResult<()> {
        let interned = reference.with_identifier(|id| self.shared.references.get(id));
        match interned {
            Some(handle) if handle.same_handle(reference) && reference.belongs_to(&self.shared) => {
                Ok(())
            }
            _ => Err(StoreError::ForeignReference(reference.identifier())),
        }
    }

    /// Insert a new object.
    ///
    /// Adding an object equal to the one already stored under the same
    /// identifier is a no-op. Anything else under a taken identifier is
    /// [`StoreError::DuplicateIdentifier`].
    pub fn add(&self, object: PbxObject) -> StoreResult<()> {
        self.check_handle(object.reference())?;
        let id = object.identifier();
        let kind = object.kind();
        match self.shared.objects.entry(id.clone()) {
            Entry::Occupied(existing) => {
                if existing.get() == &object {
                    Ok(())
                } else {
                    Err(StoreError::DuplicateIdentifier(id))
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(object);
                self.shared.by_kind.entry(kind).or_default().insert(id);
                Ok(())
            }
        }
    }

    /// Replace the object stored under the same identifier, returning the
    /// previous version.
    pub fn update(&self, object: PbxObject) -> StoreResult<PbxObject> {
        self.check_handle(object.reference())?;
        let id = object.identifier();
        let new_kind = object.kind();
        let previous = {
            let mut entry =
                self.shared
                    .objects
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::MissingReference {
                        id: id.clone(),
                        expected: None,
                    })?;
            std::mem::replace(entry.value_mut(), object)
        };
        self.reindex(&id, previous.kind(), new_kind);
        Ok(previous)
    }

    /// Remove an object. References to it stay interned and now dangle.
    pub fn delete(&self, id: &Identifier) -> Option<PbxObject> {
        let (_, object) = self.shared.objects.remove(id)?;
        if let Some(mut ids) = self.shared.by_kind.get_mut(&object.kind()) {
            ids.remove(id);
        }
        trace!(%id, kind = %object.kind(), "object deleted");
        Some(object)
    }

    pub fn get(&self, id: &Identifier) -> Option<PbxObject> {
        self.shared.get(id)
    }

    pub fn get_throwing(&self, id: &Identifier) -> StoreResult<PbxObject> {
        self.get(id).ok_or_else(|| StoreError::MissingReference {
            id: id.clone(),
            expected: None,
        })
    }

    pub fn get_as<T: ObjectVariant>(&self, id: &Identifier) -> StoreResult<T> {
        self.shared.get_as(id)
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.shared.objects.contains_key(id)
    }

    /// Kind of the object stored under `id`, without cloning it.
    pub fn kind_of(&self, id: &Identifier) -> Option<ObjectKind> {
        self.shared.objects.get(id).map(|entry| entry.value().kind())
    }

    /// Check that `id` names an object of `expected` kind.
    pub(crate) fn require_kind(&self, id: &Identifier, expected: ObjectKind) -> StoreResult<()> {
        match self.kind_of(id) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(StoreError::WrongType {
                id: id.clone(),
                expected,
                actual,
            }),
            None => Err(StoreError::MissingReference {
                id: id.clone(),
                expected: Some(expected),
            }),
        }
    }

    /// Every object of `kind`, ordered by identifier.
    pub fn all_of_kind(&self, kind: ObjectKind) -> Vec<PbxObject> {
        self.ids_of_kind(kind)
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Every object of variant `T` with its reference, ordered by identifier.
    pub fn all_of<T: ObjectVariant>(&self) -> Vec<(Reference, T)> {
        self.all_of_kind(T::KIND)
            .into_iter()
            .filter_map(|object| {
                let reference = object.reference().clone();
                let body = T::from_body(object.body())?.clone();
                Some((reference, body))
            })
            .collect()
    }

    pub fn count_of_kind(&self, kind: ObjectKind) -> usize {
        self.shared.by_kind.get(&kind).map_or(0, |ids| ids.len())
    }

    pub(crate) fn ids_of_kind(&self, kind: ObjectKind) -> Vec<Identifier> {
        self.shared
            .by_kind
            .get(&kind)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Groups whose `children` hold `child`, ordered by identifier.
    ///
    /// Children are matched by handle, which is exact because the
    /// repository mints one handle per identifier.
    pub(crate) fn groups_listing(&self, child: &Reference) -> Vec<Reference> {
        self.ids_of_kind(ObjectKind::Group)
            .iter()
            .filter_map(|id| {
                let entry = self.shared.objects.get(id)?;
                let group = Group::from_body(entry.value().body())?;
                let lists = group.children.iter().any(|listed| listed.same_handle(child));
                lists.then(|| entry.value().reference().clone())
            })
            .collect()
    }

    /// All identifiers, sorted.
    pub fn identifiers(&self) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = self.shared.objects.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Visit every object in identifier order.
    ///
    /// The callback receives a snapshot, so it may freely read the store.
    pub fn for_each(&self, mut f: impl FnMut(&PbxObject)) {
        for id in self.identifiers() {
            if let Some(object) = self.get(&id) {
                f(&object);
            }
        }
    }

    /// Snapshot of every object in identifier order.
    pub fn objects(&self) -> Vec<PbxObject> {
        let mut objects = Vec::with_capacity(self.len());
        self.for_each(|object| objects.push(object.clone()));
        objects
    }

    pub fn len(&self) -> usize {
        self.shared.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.objects.is_empty()
    }

    /// Mark every object's identifier pending, so the next encode derives a
    /// fresh one for each.
    pub fn invalidate_all_identifiers(&self) {
        for entry in self.shared.objects.iter() {
            entry.value().reference().set_pending(true);
        }
    }

    /// `true` if any stored object's identifier is pending.
    pub fn has_pending_identifiers(&self) -> bool {
        self.shared
            .objects
            .iter()
            .any(|entry| entry.value().reference().is_pending())
    }

    /// References held by objects that do not resolve, as
    /// `(holder, attribute, target)` triples in holder order.
    pub fn dangling_references(&self) -> Vec<(Identifier, String, Identifier)> {
        let mut dangling = Vec::new();
        self.for_each(|object| {
            for (key, field) in object.body().fields() {
                field.visit_references(&mut |reference| {
                    let target = reference.identifier();
                    if !self.contains(&target) {
                        dangling.push((object.identifier(), key.clone(), target));
                    }
                });
            }
        });
        dangling
    }

    /// Edit an object in place. Returns `None` if it does not exist.
    pub(crate) fn modify<R>(&self, id: &Identifier, f: impl FnOnce(&mut PbxObject) -> R) -> Option<R> {
        let (result, old_kind, new_kind) = {
            let mut entry = self.shared.objects.get_mut(id)?;
            let old_kind = entry.value().kind();
            let result = f(entry.value_mut());
            (result, old_kind, entry.value().kind())
        };
        self.reindex(id, old_kind, new_kind);
        Some(result)
    }

    fn reindex(&self, id: &Identifier, old_kind: ObjectKind, new_kind: ObjectKind) {
        if old_kind == new_kind {
            return;
        }
        if let Some(mut ids) = self.shared.by_kind.get_mut(&old_kind) {
            ids.remove(id);
        }
        self.shared.by_kind.entry(new_kind).or_default().insert(id.clone());
    }

    /// Move objects and handles to new identifiers in one step.
    ///
    /// All affected entries are detached before any is re-inserted, so a
    /// new identifier may equal another renamed object's old one.
    pub(crate) fn apply_renames(&self, renames: &[(Reference, Identifier)]) {
        let mut detached = Vec::with_capacity(renames.len());
        for (reference, new_id) in renames {
            let old_id = reference.identifier();
            let object = self.shared.objects.remove(&old_id).map(|(_, object)| object);
            if let Some(object) = &object {
                if let Some(mut ids) = self.shared.by_kind.get_mut(&object.kind()) {
                    ids.remove(&old_id);
                }
            }
            self.shared.references.remove(&old_id);
            detached.push((reference.clone(), new_id.clone(), object));
        }
        for (reference, new_id, object) in detached {
            reference.rename(new_id.clone());
            self.shared.references.insert(reference);
            if let Some(object) = object {
                self.shared.by_kind.entry(object.kind()).or_default().insert(new_id.clone());
                self.shared.objects.insert(new_id, object);
            }
        }
    }
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ObjectStore {
    fn eq(&self, other: &Self) -> bool {
        let ids = self.identifiers();
        ids == other.identifiers()
            && ids.iter().all(|id| self.get(id) == other.get(id))
    }
}

impl Eq for ObjectStore {}

impl fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStore")
            .field("objects", &self.len())
            .field("references", &self.shared.references.len())
            .finish()
    }
}
