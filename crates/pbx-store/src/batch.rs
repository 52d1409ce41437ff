use crate::document::{claimed_by, Document};
use crate::error::{StoreError, StoreResult};
use crate::kind::ObjectKind;
use crate::object::PbxObject;
use crate::objects::{FileReference, Group};
use crate::reference::Reference;
use crate::store::ObjectStore;

/// Mutation handle passed to [`Document::batch_update`].
///
/// Additions made here update `children` lists only. Parent links are
/// rebuilt by a single pass when the batch closes, so adding many elements
/// costs one pass instead of one per element.
pub struct BatchUpdate<'a> {
    document: &'a mut Document,
    added: usize,
}

impl<'a> BatchUpdate<'a> {
    pub(crate) fn new(document: &'a mut Document) -> Self {
        Self { document, added: 0 }
    }

    /// Number of objects added so far.
    pub fn added(&self) -> usize {
        self.added
    }

    pub fn objects(&self) -> &ObjectStore {
        self.document.objects()
    }

    pub fn root(&self) -> &Reference {
        self.document.root()
    }

    pub fn new_reference(&self) -> Reference {
        self.document.new_reference()
    }

    /// Insert an object without touching the tree.
    pub fn add(&mut self, object: PbxObject) -> StoreResult<()> {
        self.document.objects().add(object)?;
        self.added += 1;
        Ok(())
    }

    /// Insert a tree element and append it to `parent`'s children.
    ///
    /// As with [`Document::add_child`], an element another group already
    /// lists is rejected before anything changes.
    pub fn add_child(&mut self, parent: &Reference, object: PbxObject) -> StoreResult<Reference> {
        self.document.objects().require_kind(&parent.identifier(), ObjectKind::Group)?;
        if !object.kind().is_tree_element() {
            return Err(StoreError::NotTreeElement {
                id: object.identifier(),
                kind: object.kind(),
            });
        }
        let child = object.reference().clone();
        let listed = claimed_by(self.document.objects(), parent, &child)?;
        self.add(object)?;
        if !listed {
            self.document.objects().modify(&parent.identifier(), |group| {
                if let Some(group) = group.as_variant_mut::<Group>() {
                    group.children.push(child.clone());
                }
            });
        }
        Ok(child)
    }

    pub fn add_file(&mut self, group: &Reference, file: FileReference) -> StoreResult<Reference> {
        let object = PbxObject::new(self.new_reference(), file.into());
        self.add_child(group, object)
    }

    pub fn add_group(&mut self, parent: &Reference, group: Group) -> StoreResult<Reference> {
        let object = PbxObject::new(self.new_reference(), group.into());
        self.add_child(parent, object)
    }

    /// Replace an object without touching the tree.
    pub fn update(&mut self, object: PbxObject) -> StoreResult<PbxObject> {
        self.document.objects().update(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_runs_exactly_one_pass() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let files = doc
            .batch_update(|batch| -> StoreResult<Vec<Reference>> {
                let sources = batch.add_group(&main, Group::new("Sources"))?;
                (0..100)
                    .map(|n| batch.add_file(&sources, FileReference::new(format!("file{n}.swift"))))
                    .collect()
            })
            .unwrap();

        assert_eq!(doc.reconcile_passes(), 1);
        assert_eq!(files.len(), 100);
        let sources = main.resolve_as::<Group>().unwrap().children[0].clone();
        for file in &files {
            assert_eq!(file.resolve().unwrap().body().parent(), Some(&sources));
        }
        assert_eq!(
            sources.resolve().unwrap().body().parent(),
            Some(&main)
        );
    }

    #[test]
    fn batch_reconciles_even_on_error() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let mut added = None;
        let result: StoreResult<()> = doc.batch_update(|batch| {
            added = Some(batch.add_file(&main, FileReference::new("kept.swift"))?);
            let missing = batch.objects().reference(&pbx_types::Identifier::new("NOPE").unwrap());
            batch.add_file(&missing, FileReference::new("lost.swift"))?;
            Ok(())
        });

        assert!(matches!(result, Err(StoreError::MissingReference { .. })));
        assert_eq!(doc.reconcile_passes(), 1);
        let kept = added.unwrap();
        assert_eq!(kept.resolve().unwrap().body().parent(), Some(&main));
    }

    #[test]
    fn adding_a_listed_element_under_another_group_fails() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let result: StoreResult<()> = doc.batch_update(|batch| {
            let other = batch.add_group(&main, Group::new("Other"))?;
            let file = PbxObject::new(batch.new_reference(), FileReference::new("a.swift").into());
            batch.add_child(&main, file.clone())?;
            let err = batch.add_child(&other, file).unwrap_err();
            assert!(matches!(err, StoreError::MultipleParents { .. }));
            assert!(other.resolve_as::<Group>().unwrap().children.is_empty());
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(doc.reconcile_passes(), 1);
    }

    #[test]
    fn reconciliation_failure_is_reported() {
        let mut doc = Document::new("App").unwrap();
        let main = doc.main_group().unwrap();
        let result: StoreResult<()> = doc.batch_update(|batch| {
            let file = batch.add_file(&main, FileReference::new("shared.swift"))?;
            let mut other = Group::new("Other");
            other.children.push(file);
            batch.add_group(&main, other)?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::Reconciliation(_))));
    }
}
