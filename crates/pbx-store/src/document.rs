use tracing::{debug, warn};

use pbx_types::{Dictionary, Identifier};

use crate::batch::BatchUpdate;
use crate::error::{StoreError, StoreResult};
use crate::kind::ObjectKind;
use crate::object::PbxObject;
use crate::objects::{Group, Project};
use crate::reference::Reference;
use crate::regenerate::{regenerate_identifiers, Regeneration};
use crate::store::ObjectStore;
use crate::tree::{self, TreeSummary};

/// Archive version written by current tooling.
pub const DEFAULT_ARCHIVE_VERSION: u32 = 1;
/// Object version written by current tooling.
pub const DEFAULT_OBJECT_VERSION: u32 = 56;

/// A decoded project file: format versions, the object store and the root.
///
/// All mutation goes through `&mut self`, which keeps a single writer per
/// document. Single-object mutations keep the group tree's parent links
/// current as they go; [`batch_update`](Self::batch_update) defers that work
/// to one full pass at the end.
#[derive(Debug)]
pub struct Document {
    archive_version: u32,
    object_version: u32,
    classes: Dictionary,
    root: Reference,
    objects: ObjectStore,
    reconcile_passes: u64,
}

impl Document {
    /// Assemble a document from decoded parts. The root must resolve to a
    /// project. Parent links are not computed; call
    /// [`reconcile_tree`](Self::reconcile_tree) afterwards.
    pub fn from_parts(
        archive_version: u32,
        object_version: u32,
        classes: Dictionary,
        root: Reference,
        objects: ObjectStore,
    ) -> StoreResult<Self> {
        match objects.get(&root.identifier()) {
            Some(object) if object.as_variant::<Project>().is_some() => {}
            other => {
                return Err(StoreError::InvalidRoot {
                    id: root.identifier(),
                    actual: other.map(|object| object.kind()),
                })
            }
        }
        Ok(Self {
            archive_version,
            object_version,
            classes,
            root,
            objects,
            reconcile_passes: 0,
        })
    }

    /// A new document holding a project and its empty main group.
    ///
    /// Both objects carry provisional identifiers until the first encode.
    pub fn new(project_name: impl Into<String>) -> StoreResult<Self> {
        let objects = ObjectStore::new();
        let main_group = objects.references().provisional();
        let root = objects.references().provisional();
        objects.add(PbxObject::new(main_group.clone(), Group::root().into()))?;
        let mut project = Project::new(main_group);
        project.name = project_name.into();
        objects.add(PbxObject::new(root.clone(), project.into()))?;
        Self::from_parts(
            DEFAULT_ARCHIVE_VERSION,
            DEFAULT_OBJECT_VERSION,
            Dictionary::new(),
            root,
            objects,
        )
    }

    pub fn archive_version(&self) -> u32 {
        self.archive_version
    }

    pub fn set_archive_version(&mut self, version: u32) {
        self.archive_version = version;
    }

    pub fn object_version(&self) -> u32 {
        self.object_version
    }

    pub fn set_object_version(&mut self, version: u32) {
        self.object_version = version;
    }

    pub fn classes(&self) -> &Dictionary {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut Dictionary {
        &mut self.classes
    }

    pub fn root(&self) -> &Reference {
        &self.root
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// The root project.
    pub fn project(&self) -> StoreResult<Project> {
        self.root.resolve_as::<Project>()
    }

    pub fn main_group(&self) -> StoreResult<Reference> {
        Ok(self.project()?.main_group)
    }

    /// Set the project's display name. Only affects annotation comments.
    pub fn set_project_name(&mut self, name: impl Into<String>) -> StoreResult<()> {
        let name = name.into();
        self.objects
            .modify(&self.root.identifier(), |object| {
                if let Some(project) = object.as_variant_mut::<Project>() {
                    project.name = name;
                }
            })
            .ok_or_else(|| StoreError::MissingReference {
                id: self.root.identifier(),
                expected: Some(ObjectKind::Project),
            })
    }

    /// A fresh reference with a provisional identifier, for a new object.
    pub fn new_reference(&self) -> Reference {
        self.objects.references().provisional()
    }

    /// Shorthand for resolving an identifier through the store.
    pub fn get(&self, id: &Identifier) -> Option<PbxObject> {
        self.objects.get(id)
    }

    /// Insert an object and bring the parent links around it up to date.
    ///
    /// A tree element is linked to the group that already lists it, and a
    /// group claims the children it lists. A second parent either way is
    /// [`StoreError::MultipleParents`] and nothing is inserted.
    pub fn add(&mut self, object: PbxObject) -> StoreResult<()> {
        let parent = if object.kind().is_tree_element() {
            tree::listing_parent(&self.objects, object.reference())?
        } else {
            None
        };
        self.insert(object, parent)
    }

    /// Insert a tree element and append it to `parent`'s children.
    ///
    /// An element already listed by a different group is rejected with
    /// [`StoreError::MultipleParents`], leaving the document unchanged.
    /// One already listed by `parent` is not listed twice.
    pub fn add_child(&mut self, parent: &Reference, object: PbxObject) -> StoreResult<Reference> {
        self.objects.require_kind(&parent.identifier(), ObjectKind::Group)?;
        if !object.kind().is_tree_element() {
            return Err(StoreError::NotTreeElement {
                id: object.identifier(),
                kind: object.kind(),
            });
        }
        let child = object.reference().clone();
        let listed = claimed_by(&self.objects, parent, &child)?;
        self.insert(object, Some(parent.clone()))?;
        if !listed {
            self.objects.modify(&parent.identifier(), |group| {
                if let Some(group) = group.as_variant_mut::<Group>() {
                    group.children.push(child.clone());
                }
            });
        }
        Ok(child)
    }

    fn insert(&mut self, object: PbxObject, parent: Option<Reference>) -> StoreResult<()> {
        let reference = object.reference().clone();
        let id = reference.identifier();
        let existed = self.objects.contains(&id);
        let is_group = object.as_variant::<Group>().is_some();
        self.objects.add(object)?;
        if is_group && !existed {
            if let Err(err) = tree::link_children(&self.objects, &reference) {
                self.objects.delete(&id);
                return Err(err);
            }
        }
        self.objects
            .modify(&id, |object| object.body_mut().set_parent(parent));
        Ok(())
    }

    /// Replace an object and refresh the parent links it affects.
    ///
    /// The object keeps the parent that lists it. If it is a group, children
    /// it gained are linked to it and children it dropped lose their link.
    /// On error the previous version is restored.
    pub fn update(&mut self, object: PbxObject) -> StoreResult<PbxObject> {
        let reference = object.reference().clone();
        let previous = self.objects.update(object)?;
        if let Err(err) = self.relink_updated(&reference, &previous) {
            self.objects.update(previous)?;
            return Err(err);
        }
        Ok(previous)
    }

    fn relink_updated(&self, reference: &Reference, previous: &PbxObject) -> StoreResult<()> {
        let id = reference.identifier();
        let current = self.objects.get_throwing(&id)?;
        let parent = if current.kind().is_tree_element() {
            tree::listing_parent(&self.objects, reference)?
        } else {
            None
        };
        let children = current
            .as_variant::<Group>()
            .map(|group| group.children.as_slice())
            .unwrap_or_default();
        if current.as_variant::<Group>().is_some() {
            tree::link_children(&self.objects, reference)?;
        }
        if let Some(old) = previous.as_variant::<Group>() {
            tree::unlink_dropped(&self.objects, reference, &old.children, children);
        }
        self.objects
            .modify(&id, |object| object.body_mut().set_parent(parent));
        Ok(())
    }

    /// Remove an object. References to it become dangling, parent links
    /// included: children of a deleted group report the missing parent
    /// when resolved.
    pub fn delete(&mut self, id: &Identifier) -> Option<PbxObject> {
        self.objects.delete(id)
    }

    /// Recompute every parent link from scratch.
    pub fn reconcile_tree(&mut self) -> StoreResult<TreeSummary> {
        self.reconcile_passes += 1;
        tree::reconcile(&self.objects)
    }

    /// Number of full reconciliation passes run on this document.
    pub fn reconcile_passes(&self) -> u64 {
        self.reconcile_passes
    }

    /// Mark every identifier for regeneration at the next encode.
    pub fn invalidate_all_identifiers(&mut self) {
        self.objects.invalidate_all_identifiers();
    }

    pub fn has_pending_identifiers(&self) -> bool {
        self.objects.has_pending_identifiers()
    }

    /// Replace pending identifiers with path-derived ones.
    pub fn regenerate_identifiers(&mut self) -> Regeneration {
        regenerate_identifiers(&self.objects, &self.root)
    }

    /// Run several mutations with tree maintenance deferred to the end.
    ///
    /// Objects added inside the closure are not linked into the tree until
    /// it returns; then a single full pass runs, whether the closure
    /// succeeded or not. If only the pass fails the error is returned as
    /// [`StoreError::Reconciliation`]. If both fail the closure's error
    /// wins and the pass failure is logged.
    pub fn batch_update<T, E>(
        &mut self,
        f: impl FnOnce(&mut BatchUpdate<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let (result, added) = {
            let mut batch = BatchUpdate::new(self);
            let result = f(&mut batch);
            (result, batch.added())
        };
        let reconciled = self.reconcile_tree();
        debug!(added, ok = result.is_ok(), "batch update closed");
        match (result, reconciled) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(err)) => Err(StoreError::Reconciliation(Box::new(err)).into()),
            (Err(err), Ok(_)) => Err(err),
            (Err(err), Err(tree_err)) => {
                warn!(error = %tree_err, "tree reconciliation failed after a failed batch");
                Err(err)
            }
        }
    }
}

/// Whether `parent` already lists `child`. A different group listing it is
/// [`StoreError::MultipleParents`].
pub(crate) fn claimed_by(store: &ObjectStore, parent: &Reference, child: &Reference) -> StoreResult<bool> {
    match tree::listing_parent(store, child)? {
        Some(current) if current != *parent => Err(StoreError::MultipleParents {
            child: child.identifier(),
            first: current.identifier(),
            second: parent.identifier(),
        }),
        Some(_) => Ok(true),
        None => Ok(false),
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.archive_version == other.archive_version
            && self.object_version == other.object_version
            && self.classes == other.classes
            && self.root == other.root
            && self.objects == other.objects
    }
}

impl Eq for Document {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectBody;
    use crate::objects::{BuildFile, FileReference};

    fn file(doc: &Document, path: &str) -> PbxObject {
        PbxObject::new(doc.new_reference(), FileReference::new(path).into())
    }

    #[test]
    fn new_document_has_project_and_main_group() {
        let doc = Document::new("App").unwrap();
        let project = doc.project().unwrap();
        assert_eq!(project.name, "App");
        assert_eq!(doc.objects().len(), 2);
        assert!(doc.has_pending_identifiers());
        assert!(project.main_group.resolve_as::<Group>().is_ok());
    }

    #[test]
    fn root_must_be_a_project() {
        let objects = ObjectStore::new();
        let group = objects.references().provisional();
        objects
            .add(PbxObject::new(group.clone(), Group::root().into()))
            .unwrap();
        let err = Document::from_parts(1, 56, Dictionary::new(), group.clone(), objects).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidRoot {
                id: group.identifier(),
                actual: Some(ObjectKind::Group),
            }
        );
    }

    #[test]
    fn add_child_links_parent() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let sources = doc
            .add_child(&main, PbxObject::new(doc.new_reference(), Group::new("Sources").into()))
            .unwrap();
        let main_m = doc.add_child(&sources, file(&doc, "main.m")).unwrap();

        let object = main_m.resolve().unwrap();
        assert_eq!(object.body().parent(), Some(&sources));
        assert_eq!(main.resolve_as::<Group>().unwrap().children, vec![sources.clone()]);
        assert_eq!(doc.reconcile_passes(), 0);
    }

    #[test]
    fn add_child_rejects_non_tree_objects() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let build_file = PbxObject::new(doc.new_reference(), BuildFile::default().into());
        assert!(matches!(
            doc.add_child(&main, build_file),
            Err(StoreError::NotTreeElement { .. })
        ));
        let missing = doc.objects().reference(&Identifier::new("NOPE").unwrap());
        assert!(matches!(
            doc.add_child(&missing, file(&doc, "x")),
            Err(StoreError::MissingReference { .. })
        ));
    }

    #[test]
    fn adding_a_group_that_steals_a_child_is_rolled_back() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let child = doc.add_child(&main, file(&doc, "a.m")).unwrap();

        let mut thief = Group::new("Thief");
        thief.children.push(child.clone());
        let thief_ref = doc.new_reference();
        let err = doc.add(PbxObject::new(thief_ref.clone(), thief.into())).unwrap_err();
        assert!(matches!(err, StoreError::MultipleParents { .. }));
        assert!(thief_ref.resolve().is_none());
        assert_eq!(child.resolve().unwrap().body().parent(), Some(&main));
    }

    fn parent_links(doc: &Document) -> Vec<(Identifier, Option<Identifier>)> {
        doc.objects()
            .objects()
            .into_iter()
            .filter(|object| object.kind().is_tree_element())
            .map(|object| (object.identifier(), object.body().parent().map(Reference::identifier)))
            .collect()
    }

    /// Local links after a single mutation must equal a full pass.
    fn assert_matches_full_pass(doc: &mut Document) {
        let local = parent_links(doc);
        doc.reconcile_tree().unwrap();
        assert_eq!(local, parent_links(doc));
    }

    #[test]
    fn element_listed_before_it_exists_is_linked_on_add() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let file_ref = doc.new_reference();
        let mut group = Group::new("Sources");
        group.children.push(file_ref.clone());
        let group_ref = doc
            .add_child(&main, PbxObject::new(doc.new_reference(), group.into()))
            .unwrap();

        doc.add(PbxObject::new(file_ref.clone(), FileReference::new("late.m").into()))
            .unwrap();
        assert_eq!(file_ref.resolve().unwrap().body().parent(), Some(&group_ref));
        assert_matches_full_pass(&mut doc);
    }

    #[test]
    fn update_unlinks_dropped_children_and_keeps_own_parent() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let sources = doc
            .add_child(&main, PbxObject::new(doc.new_reference(), Group::new("Sources").into()))
            .unwrap();
        let kept = doc.add_child(&sources, file(&doc, "kept.m")).unwrap();
        let dropped = doc.add_child(&sources, file(&doc, "dropped.m")).unwrap();

        let mut group = sources.resolve_as::<Group>().unwrap();
        group.children.retain(|child| *child != dropped);
        group.name = Some("Renamed".into());
        doc.update(PbxObject::new(sources.clone(), group.into())).unwrap();

        assert_eq!(dropped.resolve().unwrap().body().parent(), None);
        assert_eq!(kept.resolve().unwrap().body().parent(), Some(&sources));
        assert_eq!(sources.resolve().unwrap().body().parent(), Some(&main));
        assert_matches_full_pass(&mut doc);

        let mut renamed = kept.resolve_as::<FileReference>().unwrap();
        renamed.path = Some("moved.m".into());
        doc.update(PbxObject::new(kept.clone(), renamed.into())).unwrap();
        assert_eq!(kept.resolve().unwrap().body().parent(), Some(&sources));
        assert_matches_full_pass(&mut doc);
    }

    #[test]
    fn deleting_a_group_leaves_its_children_pointing_at_it() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let sources = doc
            .add_child(&main, PbxObject::new(doc.new_reference(), Group::new("Sources").into()))
            .unwrap();
        let child = doc.add_child(&sources, file(&doc, "orphaned.m")).unwrap();

        doc.delete(&sources.identifier()).unwrap();
        let parent = child.resolve().unwrap().body().parent().cloned().unwrap();
        assert_eq!(
            parent.resolve_throwing().unwrap_err(),
            StoreError::MissingReference {
                id: sources.identifier(),
                expected: None,
            }
        );
    }

    #[test]
    fn add_child_refuses_a_second_parent() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let other = doc
            .add_child(&main, PbxObject::new(doc.new_reference(), Group::new("Other").into()))
            .unwrap();
        let object = file(&doc, "shared.m");
        let child = doc.add_child(&main, object.clone()).unwrap();

        let err = doc.add_child(&other, object.clone()).unwrap_err();
        assert_eq!(
            err,
            StoreError::MultipleParents {
                child: child.identifier(),
                first: main.identifier(),
                second: other.identifier(),
            }
        );
        assert!(other.resolve_as::<Group>().unwrap().children.is_empty());
        assert_eq!(child.resolve().unwrap().body().parent(), Some(&main));

        doc.add_child(&main, object).unwrap();
        let listed = main.resolve_as::<Group>().unwrap().children;
        assert_eq!(listed.iter().filter(|c| **c == child).count(), 1);
        assert_matches_full_pass(&mut doc);
    }

    #[test]
    fn delete_leaves_dangling_reference() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let child = doc.add_child(&main, file(&doc, "gone.m")).unwrap();
        assert!(doc.delete(&child.identifier()).is_some());
        let group = main.resolve_as::<Group>().unwrap();
        assert_eq!(group.children.len(), 1);
        assert!(matches!(
            group.children[0].resolve_throwing(),
            Err(StoreError::MissingReference { .. })
        ));
    }

    #[test]
    fn equality_ignores_derived_state() {
        let mut a = Document::new("App").unwrap();
        a.regenerate_identifiers();

        let store = ObjectStore::new();
        for object in a.objects().objects() {
            let reference = store.reference(&object.identifier());
            let body = match object.into_body() {
                ObjectBody::Project(mut project) => {
                    project.main_group = store.reference(&project.main_group.identifier());
                    project.name = String::new();
                    project.into()
                }
                other => other,
            };
            store.add(PbxObject::new(reference, body)).unwrap();
        }
        let root = store.reference(&a.root().identifier());
        let b = Document::from_parts(
            a.archive_version(),
            a.object_version(),
            a.classes().clone(),
            root,
            store,
        )
        .unwrap();

        assert_eq!(a, b);
        a.set_object_version(77);
        assert_ne!(a, b);
    }
}
