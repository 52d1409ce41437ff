use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Serialize, Serializer};

use pbx_types::Identifier;

use crate::error::{StoreError, StoreResult};
use crate::kind::ObjectKind;
use crate::object::{ObjectVariant, PbxObject};
use crate::store::StoreShared;

/// A handle naming one object in an [`ObjectStore`](crate::ObjectStore).
///
/// Handles are interned by the store's
/// [`ReferenceRepository`](crate::ReferenceRepository): every occurrence of
/// an identifier, whether as an object's own key or as an attribute of
/// another object, shares one underlying handle. Renaming the handle during
/// identifier regeneration is therefore visible to every holder at once.
///
/// A reference only holds a weak link to its store. Resolving it after the
/// store has been dropped yields nothing.
///
/// Equality and ordering compare identifiers; use
/// [`same_handle`](Self::same_handle) to test handle identity.
#[derive(Clone)]
pub struct Reference(Arc<Handle>);

struct Handle {
    identifier: RwLock<Identifier>,
    pending: AtomicBool,
    store: Weak<StoreShared>,
}

impl Reference {
    pub(crate) fn new(identifier: Identifier, pending: bool, store: Weak<StoreShared>) -> Self {
        Self(Arc::new(Handle {
            identifier: RwLock::new(identifier),
            pending: AtomicBool::new(pending),
            store,
        }))
    }

    /// The identifier this handle currently carries.
    pub fn identifier(&self) -> Identifier {
        self.0.identifier.read().clone()
    }

    /// Borrow the identifier without cloning it.
    pub fn with_identifier<R>(&self, f: impl FnOnce(&Identifier) -> R) -> R {
        f(&self.0.identifier.read())
    }

    /// `true` while the identifier is provisional and due for regeneration.
    pub fn is_pending(&self) -> bool {
        self.0.pending.load(Ordering::Acquire)
    }

    pub(crate) fn set_pending(&self, pending: bool) {
        self.0.pending.store(pending, Ordering::Release);
    }

    pub(crate) fn rename(&self, identifier: Identifier) {
        *self.0.identifier.write() = identifier;
    }

    /// `true` if both values are the same interned handle.
    pub fn same_handle(&self, other: &Reference) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// `true` while the owning store is alive.
    pub fn is_attached(&self) -> bool {
        self.0.store.strong_count() > 0
    }

    pub(crate) fn belongs_to(&self, store: &Arc<StoreShared>) -> bool {
        std::ptr::eq(self.0.store.as_ptr(), Arc::as_ptr(store))
    }

    /// Look the object up in the owning store.
    pub fn resolve(&self) -> Option<PbxObject> {
        let store = self.0.store.upgrade()?;
        self.with_identifier(|id| store.get(id))
    }

    /// Like [`resolve`](Self::resolve), but a missing object is an error.
    pub fn resolve_throwing(&self) -> StoreResult<PbxObject> {
        self.resolve().ok_or_else(|| StoreError::MissingReference {
            id: self.identifier(),
            expected: None,
        })
    }

    /// Resolve to a specific object variant.
    pub fn resolve_as<T: ObjectVariant>(&self) -> StoreResult<T> {
        let Some(store) = self.0.store.upgrade() else {
            return Err(StoreError::MissingReference {
                id: self.identifier(),
                expected: Some(T::KIND),
            });
        };
        let id = self.identifier();
        store.get_as::<T>(&id)
    }

    /// Kind of the referenced object, if it resolves.
    pub fn kind(&self) -> Option<ObjectKind> {
        self.resolve().map(|object| object.kind())
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.same_handle(other) || *self.0.identifier.read() == *other.0.identifier.read()
    }
}

impl Eq for Reference {}

impl PartialOrd for Reference {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Reference {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        if self.same_handle(other) {
            return CmpOrdering::Equal;
        }
        self.0.identifier.read().cmp(&other.0.identifier.read())
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pending() {
            write!(f, "Reference({}, pending)", self.0.identifier.read())
        } else {
            write!(f, "Reference({})", self.0.identifier.read())
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0.identifier.read(), f)
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_identifier(|id| serializer.serialize_str(id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Group;
    use crate::store::ObjectStore;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn equality_is_by_identifier() {
        let a = ObjectStore::new();
        let b = ObjectStore::new();
        let left = a.reference(&id("AAA"));
        let right = b.reference(&id("AAA"));
        assert_eq!(left, right);
        assert!(!left.same_handle(&right));
        assert_ne!(left, a.reference(&id("BBB")));
        assert!(left < a.reference(&id("BBB")));
    }

    #[test]
    fn resolution_contract() {
        let store = ObjectStore::new();
        let group = store.reference(&id("GROUP"));
        store
            .add(PbxObject::new(group.clone(), Group::new("Sources").into()))
            .unwrap();

        assert!(group.resolve().is_some());
        assert_eq!(group.kind(), Some(ObjectKind::Group));
        assert_eq!(group.resolve_as::<Group>().unwrap().name.as_deref(), Some("Sources"));

        let dangling = store.reference(&id("NOPE"));
        assert!(dangling.resolve().is_none());
        assert_eq!(
            dangling.resolve_throwing().unwrap_err(),
            StoreError::MissingReference {
                id: id("NOPE"),
                expected: None
            }
        );

        let wrong = group.resolve_as::<crate::objects::FileReference>().unwrap_err();
        assert_eq!(
            wrong,
            StoreError::WrongType {
                id: id("GROUP"),
                expected: ObjectKind::FileReference,
                actual: ObjectKind::Group,
            }
        );
    }

    #[test]
    fn detached_after_store_drop() {
        let store = ObjectStore::new();
        let reference = store.reference(&id("AAA"));
        assert!(reference.is_attached());
        drop(store);
        assert!(!reference.is_attached());
        assert!(reference.resolve().is_none());
        assert!(reference.resolve_as::<Group>().is_err());
    }

    #[test]
    fn rename_is_visible_through_clones() {
        let store = ObjectStore::new();
        let reference = store.reference(&id("OLD"));
        let copy = reference.clone();
        reference.rename(id("NEW"));
        assert_eq!(copy.identifier(), id("NEW"));
        assert_eq!(format!("{copy:?}"), "Reference(NEW)");
    }

    #[test]
    fn serializes_as_identifier() {
        let store = ObjectStore::new();
        let reference = store.reference(&id("ABC"));
        assert_eq!(serde_json::to_value(&reference).unwrap(), "ABC");
    }
}
