use std::collections::HashMap;

use pbx_store::objects::{
    BuildConfiguration, BuildFile, BuildPhase, BuildPhaseKind, BuildRule, ConfigurationList,
    ContainerItemProxy, FileReference, Group, PackageProduct, PackageReference, Project,
    ReferenceProxy, Target, TargetDependency, TargetKind,
};
use pbx_store::{isa, AttributeReader, ObjectBody, StoreResult};

/// Builds an object body from its attribute table.
pub type DecodeFn = fn(&mut AttributeReader<'_>) -> StoreResult<ObjectBody>;

/// Maps `isa` strings to object constructors.
///
/// [`standard`](Self::standard) registers every modeled class under its
/// canonical name and under a short alias with the `PBX`/`XC` prefix
/// dropped (`Group`, `NativeTarget`, `BuildConfiguration`). Aliased objects
/// are written back under the canonical name.
#[derive(Clone)]
pub struct DiscriminatorRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl DiscriminatorRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(isa::PROJECT, |r| Project::decode(r).map(ObjectBody::from));
        registry.register(isa::GROUP, |r| Group::decode(r).map(ObjectBody::from));
        registry.register(isa::VARIANT_GROUP, |r| Group::decode_variant(r).map(ObjectBody::from));
        registry.register(isa::VERSION_GROUP, |r| Group::decode_version(r).map(ObjectBody::from));
        registry.register(isa::FILE_REFERENCE, |r| FileReference::decode(r).map(ObjectBody::from));
        registry.register(isa::REFERENCE_PROXY, |r| ReferenceProxy::decode(r).map(ObjectBody::from));
        registry.register(isa::BUILD_FILE, |r| BuildFile::decode(r).map(ObjectBody::from));
        registry.register(isa::SOURCES_PHASE, |r| {
            BuildPhase::decode(r, BuildPhaseKind::Sources).map(ObjectBody::from)
        });
        registry.register(isa::FRAMEWORKS_PHASE, |r| {
            BuildPhase::decode(r, BuildPhaseKind::Frameworks).map(ObjectBody::from)
        });
        registry.register(isa::RESOURCES_PHASE, |r| {
            BuildPhase::decode(r, BuildPhaseKind::Resources).map(ObjectBody::from)
        });
        registry.register(isa::HEADERS_PHASE, |r| {
            BuildPhase::decode(r, BuildPhaseKind::Headers).map(ObjectBody::from)
        });
        registry.register(isa::REZ_PHASE, |r| {
            BuildPhase::decode(r, BuildPhaseKind::Rez).map(ObjectBody::from)
        });
        registry.register(isa::COPY_FILES_PHASE, |r| {
            BuildPhase::decode_copy_files(r).map(ObjectBody::from)
        });
        registry.register(isa::SHELL_SCRIPT_PHASE, |r| {
            BuildPhase::decode_shell_script(r).map(ObjectBody::from)
        });
        registry.register(isa::NATIVE_TARGET, |r| {
            Target::decode(r, TargetKind::Native).map(ObjectBody::from)
        });
        registry.register(isa::AGGREGATE_TARGET, |r| {
            Target::decode(r, TargetKind::Aggregate).map(ObjectBody::from)
        });
        registry.register(isa::LEGACY_TARGET, |r| {
            Target::decode(r, TargetKind::Legacy).map(ObjectBody::from)
        });
        registry.register(isa::TARGET_DEPENDENCY, |r| {
            TargetDependency::decode(r).map(ObjectBody::from)
        });
        registry.register(isa::CONTAINER_ITEM_PROXY, |r| {
            ContainerItemProxy::decode(r).map(ObjectBody::from)
        });
        registry.register(isa::BUILD_RULE, |r| BuildRule::decode(r).map(ObjectBody::from));
        registry.register(isa::BUILD_CONFIGURATION, |r| {
            BuildConfiguration::decode(r).map(ObjectBody::from)
        });
        registry.register(isa::CONFIGURATION_LIST, |r| {
            ConfigurationList::decode(r).map(ObjectBody::from)
        });
        registry.register(isa::REMOTE_PACKAGE_REFERENCE, |r| {
            PackageReference::decode_remote(r).map(ObjectBody::from)
        });
        registry.register(isa::LOCAL_PACKAGE_REFERENCE, |r| {
            PackageReference::decode_local(r).map(ObjectBody::from)
        });
        registry.register(isa::PACKAGE_PRODUCT, |r| PackageProduct::decode(r).map(ObjectBody::from));

        let canonical: Vec<String> = registry.decoders.keys().cloned().collect();
        for name in canonical {
            let short = name
                .strip_prefix("PBX")
                .or_else(|| name.strip_prefix("XC"))
                .unwrap_or(&name);
            if short != name {
                registry.alias(short, &name);
            }
        }
        registry
    }

    /// Register `decode` for `isa`, returning any constructor it replaces.
    pub fn register(&mut self, isa: impl Into<String>, decode: DecodeFn) -> Option<DecodeFn> {
        self.decoders.insert(isa.into(), decode)
    }

    /// Make `alias` decode like `target`. Existing names are not replaced.
    /// Returns `false` if `target` is unknown or `alias` is taken.
    pub fn alias(&mut self, alias: &str, target: &str) -> bool {
        if self.decoders.contains_key(alias) {
            return false;
        }
        match self.decoders.get(target).copied() {
            Some(decode) => {
                self.decoders.insert(alias.to_string(), decode);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, isa: &str) -> Option<DecodeFn> {
        self.decoders.get(isa).copied()
    }

    pub fn contains(&self, isa: &str) -> bool {
        self.decoders.contains_key(isa)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for DiscriminatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for DiscriminatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscriminatorRegistry")
            .field("names", &self.names())
            .finish()
    }
}
