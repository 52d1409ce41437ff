use std::fmt;

use serde::Serialize;

/// Coarse classification of graph objects.
///
/// Several concrete `isa` strings share a kind: `PBXGroup`,
/// `PBXVariantGroup` and `XCVersionGroup` are all [`ObjectKind::Group`], the
/// seven build-phase classes are all [`ObjectKind::BuildPhase`], and so on.
/// The precise class lives on the object itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Project,
    Group,
    FileReference,
    ReferenceProxy,
    BuildFile,
    BuildPhase,
    Target,
    TargetDependency,
    ContainerItemProxy,
    BuildRule,
    BuildConfiguration,
    ConfigurationList,
    PackageReference,
    PackageProduct,
    Unknown,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 15] = [
        Self::Project,
        Self::Group,
        Self::FileReference,
        Self::ReferenceProxy,
        Self::BuildFile,
        Self::BuildPhase,
        Self::Target,
        Self::TargetDependency,
        Self::ContainerItemProxy,
        Self::BuildRule,
        Self::BuildConfiguration,
        Self::ConfigurationList,
        Self::PackageReference,
        Self::PackageProduct,
        Self::Unknown,
    ];

    /// Kinds that take part in the group tree and carry a parent link.
    pub const TREE: [ObjectKind; 3] = [Self::Group, Self::FileReference, Self::ReferenceProxy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Group => "group",
            Self::FileReference => "file reference",
            Self::ReferenceProxy => "reference proxy",
            Self::BuildFile => "build file",
            Self::BuildPhase => "build phase",
            Self::Target => "target",
            Self::TargetDependency => "target dependency",
            Self::ContainerItemProxy => "container item proxy",
            Self::BuildRule => "build rule",
            Self::BuildConfiguration => "build configuration",
            Self::ConfigurationList => "configuration list",
            Self::PackageReference => "package reference",
            Self::PackageProduct => "package product",
            Self::Unknown => "unknown object",
        }
    }

    pub fn is_tree_element(&self) -> bool {
        Self::TREE.contains(self)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical class names as written in the `isa` attribute.
pub mod isa {
    pub const PROJECT: &str = "PBXProject";
    pub const GROUP: &str = "PBXGroup";
    pub const VARIANT_GROUP: &str = "PBXVariantGroup";
    pub const VERSION_GROUP: &str = "XCVersionGroup";
    pub const FILE_REFERENCE: &str = "PBXFileReference";
    pub const REFERENCE_PROXY: &str = "PBXReferenceProxy";
    pub const BUILD_FILE: &str = "PBXBuildFile";
    pub const SOURCES_PHASE: &str = "PBXSourcesBuildPhase";
    pub const FRAMEWORKS_PHASE: &str = "PBXFrameworksBuildPhase";
    pub const RESOURCES_PHASE: &str = "PBXResourcesBuildPhase";
    pub const HEADERS_PHASE: &str = "PBXHeadersBuildPhase";
    pub const COPY_FILES_PHASE: &str = "PBXCopyFilesBuildPhase";
    pub const SHELL_SCRIPT_PHASE: &str = "PBXShellScriptBuildPhase";
    pub const REZ_PHASE: &str = "PBXRezBuildPhase";
    pub const NATIVE_TARGET: &str = "PBXNativeTarget";
    pub const AGGREGATE_TARGET: &str = "PBXAggregateTarget";
    pub const LEGACY_TARGET: &str = "PBXLegacyTarget";
    pub const TARGET_DEPENDENCY: &str = "PBXTargetDependency";
    pub const CONTAINER_ITEM_PROXY: &str = "PBXContainerItemProxy";
    pub const BUILD_RULE: &str = "PBXBuildRule";
    pub const BUILD_CONFIGURATION: &str = "XCBuildConfiguration";
    pub const CONFIGURATION_LIST: &str = "XCConfigurationList";
    pub const REMOTE_PACKAGE_REFERENCE: &str = "XCRemoteSwiftPackageReference";
    pub const LOCAL_PACKAGE_REFERENCE: &str = "XCLocalSwiftPackageReference";
    pub const PACKAGE_PRODUCT: &str = "XCSwiftPackageProductDependency";
}
