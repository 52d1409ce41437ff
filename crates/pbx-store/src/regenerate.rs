//! Deterministic identifiers for pending objects.
//!
//! Every object reachable from the root gets a path: the chain of
//! attribute names, classes and display names leading to it from the root,
//! found breadth-first in attribute order. A pending object's new identifier
//! is the hash of its path. Paths never mention identifiers, so the same
//! graph always produces the same identifiers no matter what provisional
//! values the objects carried before.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use pbx_types::{Identifier, IdentifierHasher};

use crate::fields::{Field, FieldKey};
use crate::kind::ObjectKind;
use crate::names::display_name;
use crate::object::PbxObject;
use crate::reference::Reference;
use crate::store::ObjectStore;

/// What a regeneration pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Regeneration {
    pub renamed: usize,
    pub orphans: usize,
}

/// Replace every pending identifier in `store` with a path-derived one.
///
/// Non-pending objects keep their identifiers. Pending references that do
/// not resolve keep theirs too; only the pending flag is cleared.
pub fn regenerate_identifiers(store: &ObjectStore, root: &Reference) -> Regeneration {
    if !store.has_pending_identifiers() {
        store.references().clear_pending();
        return Regeneration::default();
    }

    let (mut plan, discovered) = reachable_paths(store, root);
    let orphans = orphan_paths(store, &discovered);
    let orphan_count = orphans.len();
    plan.extend(orphans);

    let pending: Vec<(Reference, Vec<String>)> = plan
        .into_iter()
        .filter(|(reference, _)| reference.is_pending())
        .collect();
    let renaming: HashSet<Identifier> = pending.iter().map(|(r, _)| r.identifier()).collect();
    let mut taken: HashSet<Identifier> = store
        .references()
        .handles()
        .into_iter()
        .map(|r| r.identifier())
        .filter(|id| !renaming.contains(id))
        .collect();

    let mut renames = Vec::with_capacity(pending.len());
    let mut rewritten: HashMap<String, String> = HashMap::new();
    for (reference, path) in pending {
        let mut attempt = 0;
        let mut candidate = IdentifierHasher::OBJECT.hash(path.as_slice());
        while taken.contains(&candidate) {
            attempt += 1;
            candidate = IdentifierHasher::OBJECT.hash_with_attempt(path.as_slice(), attempt);
        }
        taken.insert(candidate.clone());
        rewritten.insert(reference.identifier().to_string(), candidate.to_string());
        renames.push((reference, candidate));
    }

    store.apply_renames(&renames);
    rewrite_unknown_objects(store, &rewritten);
    store.references().clear_pending();

    let result = Regeneration {
        renamed: renames.len(),
        orphans: orphan_count,
    };
    debug!(renamed = result.renamed, orphans = result.orphans, "identifiers regenerated");
    result
}

fn label(object: &PbxObject) -> String {
    display_name(object.body()).unwrap_or_default()
}

/// Breadth-first walk from the root. Map keys are not followed: their
/// iteration order depends on identifiers.
fn reachable_paths(
    store: &ObjectStore,
    root: &Reference,
) -> (Vec<(Reference, Vec<String>)>, HashSet<Identifier>) {
    let mut plan = Vec::new();
    let mut discovered = HashSet::new();
    let mut queue = VecDeque::new();

    if let Some(object) = root.resolve() {
        discovered.insert(object.identifier());
        let path = vec!["root".to_string(), object.isa().to_string()];
        queue.push_back((object, path));
    }

    while let Some((object, path)) = queue.pop_front() {
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for (key, field) in object.body().fields() {
            let mut edges = Vec::new();
            collect_edges(&field, &mut edges);
            for edge in edges {
                let child_id = edge.identifier();
                let Some(child) = store.get(&child_id) else {
                    continue;
                };
                let base = format!("{key}:{}:{}", child.isa(), label(&child));
                let n = occurrences.entry(base.clone()).or_insert(0);
                let component = format!("{base}#{n}");
                *n += 1;
                if discovered.insert(child_id) {
                    let mut child_path = path.clone();
                    child_path.push(component);
                    queue.push_back((child, child_path));
                }
            }
        }
        plan.push((object.reference().clone(), path));
    }
    (plan, discovered)
}

fn collect_edges(field: &Field, out: &mut Vec<Reference>) {
    match field {
        Field::Value(_) => {}
        Field::Reference(reference) | Field::Identifier(reference) => out.push(reference.clone()),
        Field::List(items) => items.iter().for_each(|item| collect_edges(item, out)),
        Field::Map(entries) => {
            for (key, value) in entries {
                if let FieldKey::Name(_) = key {
                    collect_edges(value, out);
                }
            }
        }
    }
}

/// Paths for objects the root cannot reach, ranked by class and name.
fn orphan_paths(
    store: &ObjectStore,
    discovered: &HashSet<Identifier>,
) -> Vec<(Reference, Vec<String>)> {
    let mut orphans: Vec<(String, String, Reference)> = Vec::new();
    store.for_each(|object| {
        if !discovered.contains(&object.identifier()) {
            orphans.push((object.isa().to_string(), label(object), object.reference().clone()));
        }
    });
    orphans.sort();

    let mut occurrences: HashMap<(String, String), usize> = HashMap::new();
    orphans
        .into_iter()
        .map(|(isa, label, reference)| {
            let n = occurrences.entry((isa.clone(), label.clone())).or_insert(0);
            let path = vec![
                "orphan".to_string(),
                format!("{isa}:{label}#{n}"),
            ];
            *n += 1;
            (reference, path)
        })
        .collect()
}

fn rewrite_unknown_objects(store: &ObjectStore, rewritten: &HashMap<String, String>) {
    if rewritten.is_empty() {
        return;
    }
    for id in store.ids_of_kind(ObjectKind::Unknown) {
        store.modify(&id, |object| {
            if let Some(unknown) = object.as_variant_mut::<crate::objects::UnknownObject>() {
                for value in unknown.attributes.values_mut() {
                    value.map_strings(&mut |s| {
                        if let Some(new) = rewritten.get(s.as_str()) {
                            *s = new.clone();
                        }
                    });
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use pbx_types::PlistValue;

    use super::*;
    use crate::objects::{FileReference, Group, Project, UnknownObject};

    struct Fixture {
        store: ObjectStore,
        root: Reference,
        main: Reference,
        file: Reference,
    }

    fn fixture() -> Fixture {
        let store = ObjectStore::new();
        let root = store.references().provisional();
        let main = store.references().provisional();
        let file = store.references().provisional();
        let mut group = Group::root();
        group.children.push(file.clone());
        store
            .add(PbxObject::new(root.clone(), Project::new(main.clone()).into()))
            .unwrap();
        store.add(PbxObject::new(main.clone(), group.into())).unwrap();
        store
            .add(PbxObject::new(file.clone(), FileReference::new("main.swift").into()))
            .unwrap();
        Fixture {
            store,
            root,
            main,
            file,
        }
    }

    #[test]
    fn renames_pending_objects() {
        let f = fixture();
        let before = f.file.identifier();
        let result = regenerate_identifiers(&f.store, &f.root);
        assert_eq!(result.renamed, 3);
        assert_eq!(result.orphans, 0);
        assert!(!f.store.has_pending_identifiers());
        assert_ne!(f.file.identifier(), before);
        assert!(f.store.contains(&f.file.identifier()));
        assert!(!f.store.contains(&before));

        let group = f.main.resolve_as::<Group>().unwrap();
        assert!(group.children[0].same_handle(&f.file));
    }

    #[test]
    fn identifiers_do_not_depend_on_provisional_values() {
        let a = fixture();
        let b = fixture();
        // burn a few provisional ids so the second fixture starts elsewhere
        for _ in 0..5 {
            b.store.references().provisional();
        }
        regenerate_identifiers(&a.store, &a.root);
        regenerate_identifiers(&b.store, &b.root);
        assert_eq!(a.root.identifier(), b.root.identifier());
        assert_eq!(a.main.identifier(), b.main.identifier());
        assert_eq!(a.file.identifier(), b.file.identifier());
    }

    #[test]
    fn invalidation_reproduces_the_same_identifiers() {
        let f = fixture();
        regenerate_identifiers(&f.store, &f.root);
        let first = f.store.identifiers();
        f.store.invalidate_all_identifiers();
        regenerate_identifiers(&f.store, &f.root);
        assert_eq!(f.store.identifiers(), first);
    }

    #[test]
    fn stable_objects_keep_their_identifiers() {
        let f = fixture();
        regenerate_identifiers(&f.store, &f.root);
        let main_id = f.main.identifier();

        let extra = f.store.references().provisional();
        f.store
            .add(PbxObject::new(extra.clone(), FileReference::new("extra.swift").into()))
            .unwrap();
        let result = regenerate_identifiers(&f.store, &f.root);
        assert_eq!(result.renamed, 1);
        assert_eq!(result.orphans, 1);
        assert_eq!(f.main.identifier(), main_id);
        assert!(extra.identifier().is_canonical());
        assert!(!extra.is_pending());
    }

    #[test]
    fn identical_siblings_get_distinct_identifiers() {
        let f = fixture();
        let twin = f.store.references().provisional();
        f.store
            .add(PbxObject::new(twin.clone(), FileReference::new("main.swift").into()))
            .unwrap();
        let mut group = f.main.resolve_as::<Group>().unwrap();
        group.children.push(twin.clone());
        f.store
            .update(PbxObject::new(f.main.clone(), group.into()))
            .unwrap();

        regenerate_identifiers(&f.store, &f.root);
        assert_ne!(twin.identifier(), f.file.identifier());
        assert_eq!(f.store.len(), 4);
    }

    #[test]
    fn unknown_objects_follow_renames() {
        let f = fixture();
        let unknown_ref = f.store.reference(&Identifier::new("UNKNOWN").unwrap());
        let mut attributes = pbx_types::Dictionary::new();
        attributes.insert("target".into(), PlistValue::from(f.file.identifier().to_string()));
        f.store
            .add(PbxObject::new(
                unknown_ref,
                UnknownObject {
                    isa: "PBXFutureThing".into(),
                    attributes,
                }
                .into(),
            ))
            .unwrap();

        regenerate_identifiers(&f.store, &f.root);
        let unknown = f
            .store
            .get_as::<UnknownObject>(&Identifier::new("UNKNOWN").unwrap())
            .unwrap();
        assert_eq!(
            unknown.attributes["target"].as_str(),
            Some(f.file.identifier().as_str())
        );
    }

    #[test]
    fn dangling_pending_references_only_lose_the_flag() {
        let f = fixture();
        let dangling = f.store.references().provisional();
        let before = dangling.identifier();
        regenerate_identifiers(&f.store, &f.root);
        assert_eq!(dangling.identifier(), before);
        assert!(!dangling.is_pending());
    }
}
