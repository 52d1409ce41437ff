//! Human-readable names for objects, used for annotation comments in the
//! encoded file and as labels when deriving identifiers.

use std::collections::HashMap;

use pbx_types::Identifier;

use crate::kind::isa;
use crate::object::{ObjectBody, PbxObject};
use crate::objects::{BuildPhase, Project, Target};
use crate::reference::Reference;
use crate::store::ObjectStore;

/// Name of an object that needs no context beyond the objects it references.
pub fn display_name(body: &ObjectBody) -> Option<String> {
    match body {
        ObjectBody::Project(_) => Some("Project object".to_string()),
        ObjectBody::Group(v) => v.display_name().map(str::to_string),
        ObjectBody::FileReference(v) => v.display_name().map(str::to_string),
        ObjectBody::ReferenceProxy(v) => v.display_name().map(str::to_string),
        ObjectBody::BuildFile(v) => v
            .file_ref
            .as_ref()
            .or(v.product_ref.as_ref())
            .and_then(Reference::resolve)
            .and_then(|target| display_name(target.body())),
        ObjectBody::BuildPhase(v) => Some(v.display_name().to_string()),
        ObjectBody::Target(v) => Some(v.name.clone()),
        ObjectBody::TargetDependency(_) => Some(isa::TARGET_DEPENDENCY.to_string()),
        ObjectBody::ContainerItemProxy(_) => Some(isa::CONTAINER_ITEM_PROXY.to_string()),
        ObjectBody::BuildRule(v) => Some(v.name.clone().unwrap_or_else(|| isa::BUILD_RULE.to_string())),
        ObjectBody::BuildConfiguration(v) => Some(v.name.clone()),
        ObjectBody::ConfigurationList(_) => None,
        ObjectBody::PackageReference(v) => Some(format!(
            "{} \"{}\"",
            v.isa(),
            v.display_name().unwrap_or_default()
        )),
        ObjectBody::PackageProduct(v) => Some(v.product_name.clone()),
        ObjectBody::Unknown(_) => None,
    }
}

/// Precomputed context for annotating every object of a document.
///
/// Build files are named after the phase that lists them
/// (`main.swift in Sources`) and configuration lists after their owner
/// (`Build configuration list for PBXNativeTarget "App"`); both need a
/// reverse lookup that is cheaper to build once per encode.
#[derive(Debug, Default)]
pub struct CommentIndex {
    phase_of: HashMap<Identifier, String>,
    list_owner: HashMap<Identifier, (String, String)>,
}

impl CommentIndex {
    pub fn build(store: &ObjectStore) -> Self {
        let mut index = Self::default();
        for (_, phase) in store.all_of::<BuildPhase>() {
            for file in &phase.files {
                index
                    .phase_of
                    .entry(file.identifier())
                    .or_insert_with(|| phase.display_name().to_string());
            }
        }
        for (_, project) in store.all_of::<Project>() {
            if let Some(list) = &project.build_configuration_list {
                index
                    .list_owner
                    .insert(list.identifier(), (isa::PROJECT.to_string(), project.name.clone()));
            }
        }
        for (_, target) in store.all_of::<Target>() {
            if let Some(list) = &target.build_configuration_list {
                index
                    .list_owner
                    .insert(list.identifier(), (target.isa().to_string(), target.name.clone()));
            }
        }
        index
    }

    /// Annotation for `object`, if it has one.
    pub fn comment(&self, object: &PbxObject) -> Option<String> {
        let id = object.identifier();
        match object.body() {
            ObjectBody::BuildFile(_) => {
                let file = display_name(object.body())?;
                Some(match self.phase_of.get(&id) {
                    Some(phase) => format!("{file} in {phase}"),
                    None => file,
                })
            }
            ObjectBody::ConfigurationList(_) => {
                let (owner_isa, owner_name) = self.list_owner.get(&id)?;
                Some(format!("Build configuration list for {owner_isa} \"{owner_name}\""))
            }
            body => display_name(body),
        }
    }

    /// Annotation for the object `reference` points at.
    pub fn comment_for(&self, reference: &Reference) -> Option<String> {
        reference.resolve().and_then(|object| self.comment(&object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{BuildFile, BuildPhaseKind, ConfigurationList, FileReference, TargetKind};

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn contextual_comments() {
        let store = ObjectStore::new();
        let file = store.reference(&id("FILE"));
        let build_file = store.reference(&id("BF"));
        let phase = store.reference(&id("PHASE"));
        let list = store.reference(&id("LIST"));
        let target = store.reference(&id("TARGET"));

        store
            .add(PbxObject::new(file.clone(), FileReference::new("main.swift").into()))
            .unwrap();
        store
            .add(PbxObject::new(build_file.clone(), BuildFile::for_file(file.clone()).into()))
            .unwrap();
        let mut sources = BuildPhase::new(BuildPhaseKind::Sources);
        sources.files.push(build_file.clone());
        store.add(PbxObject::new(phase.clone(), sources.into())).unwrap();
        store
            .add(PbxObject::new(list.clone(), ConfigurationList::default().into()))
            .unwrap();
        let mut app = Target::new(TargetKind::Native, "App");
        app.build_configuration_list = Some(list.clone());
        store.add(PbxObject::new(target.clone(), app.into())).unwrap();

        let index = CommentIndex::build(&store);
        assert_eq!(index.comment_for(&file).as_deref(), Some("main.swift"));
        assert_eq!(
            index.comment_for(&build_file).as_deref(),
            Some("main.swift in Sources")
        );
        assert_eq!(index.comment_for(&phase).as_deref(), Some("Sources"));
        assert_eq!(
            index.comment_for(&list).as_deref(),
            Some("Build configuration list for PBXNativeTarget \"App\"")
        );
        assert_eq!(index.comment_for(&target).as_deref(), Some("App"));
        assert_eq!(index.comment_for(&store.reference(&id("MISSING"))), None);
    }
}
