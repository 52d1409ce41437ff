//! Parent links for the group tree.
//!
//! Groups list their children; each tree element (group, file reference,
//! reference proxy) carries a back-link to the group that lists it. The
//! links are derived state: a full pass recomputes all of them from the
//! `children` lists, and a local pass refreshes only one group's children.
//! Both validate before writing, so a failed pass leaves every link as it
//! was.

use std::collections::btree_map::{BTreeMap, Entry};
use std::collections::HashSet;

use tracing::debug;

use pbx_types::Identifier;

use crate::error::{StoreError, StoreResult};
use crate::kind::ObjectKind;
use crate::objects::Group;
use crate::reference::Reference;
use crate::store::ObjectStore;

/// Outcome of a full reconciliation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeSummary {
    pub groups: usize,
    pub linked: usize,
    pub roots: usize,
}

/// Recompute every parent link from the groups' `children` lists.
///
/// An element listed twice by the same group is fine; an element listed by
/// two different groups is [`StoreError::MultipleParents`]. Children that do
/// not resolve are skipped.
pub fn reconcile(store: &ObjectStore) -> StoreResult<TreeSummary> {
    let groups = store.all_of::<Group>();
    let mut parents: BTreeMap<Identifier, Reference> = BTreeMap::new();
    for (group_ref, group) in &groups {
        for child in &group.children {
            let child_id = child.identifier();
            if !store.contains(&child_id) {
                continue;
            }
            match parents.entry(child_id) {
                Entry::Vacant(slot) => {
                    slot.insert(group_ref.clone());
                }
                Entry::Occupied(existing) if existing.get() == group_ref => {}
                Entry::Occupied(existing) => {
                    return Err(StoreError::MultipleParents {
                        child: existing.key().clone(),
                        first: existing.get().identifier(),
                        second: group_ref.identifier(),
                    });
                }
            }
        }
    }

    let mut summary = TreeSummary {
        groups: groups.len(),
        ..TreeSummary::default()
    };
    for kind in ObjectKind::TREE {
        for id in store.ids_of_kind(kind) {
            let parent = parents.get(&id).cloned();
            if parent.is_some() {
                summary.linked += 1;
            } else {
                summary.roots += 1;
            }
            store.modify(&id, |object| object.body_mut().set_parent(parent));
        }
    }
    debug!(
        groups = summary.groups,
        linked = summary.linked,
        roots = summary.roots,
        "group tree reconciled"
    );
    Ok(summary)
}

/// Point the children of `group` at it.
///
/// Costs one lookup per child. Fails without changing anything if a child
/// is still claimed by another group that lists it.
pub fn link_children(store: &ObjectStore, group: &Reference) -> StoreResult<()> {
    let body = group.resolve_as::<Group>()?;
    let mut children = Vec::with_capacity(body.children.len());
    for child in &body.children {
        let Some(object) = child.resolve() else {
            continue;
        };
        if !object.kind().is_tree_element() {
            continue;
        }
        if let Some(current) = object.body().parent() {
            if current != group && lists_child(current, child) {
                return Err(StoreError::MultipleParents {
                    child: child.identifier(),
                    first: current.identifier(),
                    second: group.identifier(),
                });
            }
        }
        children.push(child.identifier());
    }
    for id in children {
        store.modify(&id, |object| object.body_mut().set_parent(Some(group.clone())));
    }
    Ok(())
}

/// The group that lists `child`, if any.
///
/// Scans the groups' `children` lists, so it does not rely on parent links
/// being current. Two different groups listing `child` is
/// [`StoreError::MultipleParents`].
pub fn listing_parent(store: &ObjectStore, child: &Reference) -> StoreResult<Option<Reference>> {
    match store.groups_listing(child).as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(only.clone())),
        [first, second, ..] => Err(StoreError::MultipleParents {
            child: child.identifier(),
            first: first.identifier(),
            second: second.identifier(),
        }),
    }
}

/// Clear the parent link of elements in `before` that `after` no longer
/// holds, where that link still points at `group`.
pub fn unlink_dropped(store: &ObjectStore, group: &Reference, before: &[Reference], after: &[Reference]) {
    let kept: HashSet<Identifier> = after.iter().map(Reference::identifier).collect();
    for child in before {
        let id = child.identifier();
        if kept.contains(&id) {
            continue;
        }
        store.modify(&id, |object| {
            if object.body().parent() == Some(group) {
                object.body_mut().set_parent(None);
            }
        });
    }
}

fn lists_child(group: &Reference, child: &Reference) -> bool {
    group
        .resolve_as::<Group>()
        .map(|g| g.children.contains(child))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::PbxObject;
    use crate::objects::FileReference;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    fn add_group(store: &ObjectStore, key: &str, children: &[&str]) -> Reference {
        let reference = store.reference(&id(key));
        let mut group = Group::new(key);
        group.children = children.iter().map(|c| store.reference(&id(c))).collect();
        store.add(PbxObject::new(reference.clone(), group.into())).unwrap();
        reference
    }

    fn add_file(store: &ObjectStore, key: &str) -> Reference {
        let reference = store.reference(&id(key));
        store
            .add(PbxObject::new(reference.clone(), FileReference::new(key).into()))
            .unwrap();
        reference
    }

    fn parent_of(store: &ObjectStore, key: &str) -> Option<Identifier> {
        store
            .get(&id(key))
            .and_then(|o| o.body().parent().map(Reference::identifier))
    }

    #[test]
    fn full_pass_links_every_element() {
        let store = ObjectStore::new();
        add_group(&store, "MAIN", &["SRC", "README"]);
        add_group(&store, "SRC", &["MAIN_M"]);
        add_file(&store, "README");
        add_file(&store, "MAIN_M");

        let summary = reconcile(&store).unwrap();
        assert_eq!(summary.groups, 2);
        assert_eq!(summary.linked, 3);
        assert_eq!(summary.roots, 1);
        assert_eq!(parent_of(&store, "MAIN"), None);
        assert_eq!(parent_of(&store, "SRC"), Some(id("MAIN")));
        assert_eq!(parent_of(&store, "MAIN_M"), Some(id("SRC")));
    }

    #[test]
    fn full_pass_rejects_two_parents_without_partial_writes() {
        let store = ObjectStore::new();
        add_group(&store, "A", &["F"]);
        add_file(&store, "F");
        reconcile(&store).unwrap();
        add_group(&store, "B", &["F"]);

        let err = reconcile(&store).unwrap_err();
        assert_eq!(
            err,
            StoreError::MultipleParents {
                child: id("F"),
                first: id("A"),
                second: id("B"),
            }
        );
        assert_eq!(parent_of(&store, "F"), Some(id("A")));
    }

    #[test]
    fn removed_children_lose_their_parent() {
        let store = ObjectStore::new();
        add_group(&store, "G", &["F"]);
        add_file(&store, "F");
        reconcile(&store).unwrap();

        let mut group = store.get_as::<Group>(&id("G")).unwrap();
        group.children.clear();
        store
            .update(PbxObject::new(store.reference(&id("G")), group.into()))
            .unwrap();
        reconcile(&store).unwrap();
        assert_eq!(parent_of(&store, "F"), None);
    }

    #[test]
    fn dangling_children_are_skipped() {
        let store = ObjectStore::new();
        add_group(&store, "G", &["GONE", "F"]);
        add_file(&store, "F");
        let summary = reconcile(&store).unwrap();
        assert_eq!(summary.linked, 1);
    }

    #[test]
    fn local_link_updates_only_listed_children() {
        let store = ObjectStore::new();
        add_file(&store, "F1");
        add_file(&store, "F2");
        let group = add_group(&store, "G", &["F1"]);
        link_children(&store, &group).unwrap();
        assert_eq!(parent_of(&store, "F1"), Some(id("G")));
        assert_eq!(parent_of(&store, "F2"), None);
    }

    #[test]
    fn listing_parent_scans_children_lists() {
        let store = ObjectStore::new();
        let group = add_group(&store, "G", &["F"]);
        let file = store.reference(&id("F"));
        assert_eq!(listing_parent(&store, &file).unwrap(), Some(group));
        assert_eq!(listing_parent(&store, &store.reference(&id("X"))).unwrap(), None);

        add_group(&store, "H", &["F"]);
        assert_eq!(
            listing_parent(&store, &file).unwrap_err(),
            StoreError::MultipleParents {
                child: id("F"),
                first: id("G"),
                second: id("H"),
            }
        );
    }

    #[test]
    fn unlink_only_touches_dropped_children() {
        let store = ObjectStore::new();
        let group = add_group(&store, "G", &["A", "B"]);
        add_file(&store, "A");
        add_file(&store, "B");
        reconcile(&store).unwrap();

        let before = [store.reference(&id("A")), store.reference(&id("B"))];
        unlink_dropped(&store, &group, &before, &before[..1]);
        assert_eq!(parent_of(&store, "A"), Some(id("G")));
        assert_eq!(parent_of(&store, "B"), None);
    }

    #[test]
    fn local_link_refuses_to_steal_a_child() {
        let store = ObjectStore::new();
        add_file(&store, "F");
        let first = add_group(&store, "A", &["F"]);
        link_children(&store, &first).unwrap();
        let second = add_group(&store, "B", &["F"]);
        assert!(matches!(
            link_children(&store, &second),
            Err(StoreError::MultipleParents { .. })
        ));
        assert_eq!(parent_of(&store, "F"), Some(id("A")));
    }
}
