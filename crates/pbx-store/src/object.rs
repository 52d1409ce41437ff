use serde::Serialize;

use pbx_types::Identifier;

use crate::fields::Fields;
use crate::kind::ObjectKind;
use crate::objects::{
    BuildConfiguration, BuildFile, BuildPhase, BuildRule, ConfigurationList, ContainerItemProxy,
    FileReference, Group, PackageProduct, PackageReference, Project, ReferenceProxy, Target,
    TargetDependency, UnknownObject,
};
use crate::reference::Reference;

/// One entry of the object table: a reference plus its typed body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PbxObject {
    reference: Reference,
    #[serde(flatten)]
    body: ObjectBody,
}

impl PbxObject {
    pub fn new(reference: Reference, body: ObjectBody) -> Self {
        Self { reference, body }
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn identifier(&self) -> Identifier {
        self.reference.identifier()
    }

    pub fn body(&self) -> &ObjectBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut ObjectBody {
        &mut self.body
    }

    pub fn into_body(self) -> ObjectBody {
        self.body
    }

    pub fn kind(&self) -> ObjectKind {
        self.body.kind()
    }

    pub fn isa(&self) -> &str {
        self.body.isa()
    }

    /// Borrow the body as a specific variant.
    pub fn as_variant<T: ObjectVariant>(&self) -> Option<&T> {
        T::from_body(&self.body)
    }

    pub fn as_variant_mut<T: ObjectVariant>(&mut self) -> Option<&mut T> {
        T::from_body_mut(&mut self.body)
    }
}

/// The typed payload of an object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum ObjectBody {
    Project(Project),
    Group(Group),
    FileReference(FileReference),
    ReferenceProxy(ReferenceProxy),
    BuildFile(BuildFile),
    BuildPhase(BuildPhase),
    Target(Target),
    TargetDependency(TargetDependency),
    ContainerItemProxy(ContainerItemProxy),
    BuildRule(BuildRule),
    BuildConfiguration(BuildConfiguration),
    ConfigurationList(ConfigurationList),
    PackageReference(PackageReference),
    PackageProduct(PackageProduct),
    Unknown(UnknownObject),
}

impl ObjectBody {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Project(_) => ObjectKind::Project,
            Self::Group(_) => ObjectKind::Group,
            Self::FileReference(_) => ObjectKind::FileReference,
            Self::ReferenceProxy(_) => ObjectKind::ReferenceProxy,
            Self::BuildFile(_) => ObjectKind::BuildFile,
            Self::BuildPhase(_) => ObjectKind::BuildPhase,
            Self::Target(_) => ObjectKind::Target,
            Self::TargetDependency(_) => ObjectKind::TargetDependency,
            Self::ContainerItemProxy(_) => ObjectKind::ContainerItemProxy,
            Self::BuildRule(_) => ObjectKind::BuildRule,
            Self::BuildConfiguration(_) => ObjectKind::BuildConfiguration,
            Self::ConfigurationList(_) => ObjectKind::ConfigurationList,
            Self::PackageReference(_) => ObjectKind::PackageReference,
            Self::PackageProduct(_) => ObjectKind::PackageProduct,
            Self::Unknown(_) => ObjectKind::Unknown,
        }
    }

    /// Canonical class name written as the object's `isa`.
    pub fn isa(&self) -> &str {
        match self {
            Self::Project(_) => crate::kind::isa::PROJECT,
            Self::Group(group) => group.isa(),
            Self::FileReference(_) => crate::kind::isa::FILE_REFERENCE,
            Self::ReferenceProxy(_) => crate::kind::isa::REFERENCE_PROXY,
            Self::BuildFile(_) => crate::kind::isa::BUILD_FILE,
            Self::BuildPhase(phase) => phase.isa(),
            Self::Target(target) => target.isa(),
            Self::TargetDependency(_) => crate::kind::isa::TARGET_DEPENDENCY,
            Self::ContainerItemProxy(_) => crate::kind::isa::CONTAINER_ITEM_PROXY,
            Self::BuildRule(_) => crate::kind::isa::BUILD_RULE,
            Self::BuildConfiguration(_) => crate::kind::isa::BUILD_CONFIGURATION,
            Self::ConfigurationList(_) => crate::kind::isa::CONFIGURATION_LIST,
            Self::PackageReference(package) => package.isa(),
            Self::PackageProduct(_) => crate::kind::isa::PACKAGE_PRODUCT,
            Self::Unknown(unknown) => &unknown.isa,
        }
    }

    /// Attribute table in encoding form, keyed and ordered by attribute name.
    /// The `isa` entry is not included.
    pub fn fields(&self) -> Fields {
        let mut fields = Fields::new();
        match self {
            Self::Project(v) => v.encode(&mut fields),
            Self::Group(v) => v.encode(&mut fields),
            Self::FileReference(v) => v.encode(&mut fields),
            Self::ReferenceProxy(v) => v.encode(&mut fields),
            Self::BuildFile(v) => v.encode(&mut fields),
            Self::BuildPhase(v) => v.encode(&mut fields),
            Self::Target(v) => v.encode(&mut fields),
            Self::TargetDependency(v) => v.encode(&mut fields),
            Self::ContainerItemProxy(v) => v.encode(&mut fields),
            Self::BuildRule(v) => v.encode(&mut fields),
            Self::BuildConfiguration(v) => v.encode(&mut fields),
            Self::ConfigurationList(v) => v.encode(&mut fields),
            Self::PackageReference(v) => v.encode(&mut fields),
            Self::PackageProduct(v) => v.encode(&mut fields),
            Self::Unknown(v) => v.encode(&mut fields),
        }
        fields
    }

    /// Every reference held by the body, in attribute order.
    pub fn references(&self) -> Vec<Reference> {
        let mut out = Vec::new();
        for (_, field) in self.fields().iter() {
            field.visit_references(&mut |reference| out.push(reference.clone()));
        }
        out
    }

    /// Parent group link for tree elements.
    pub fn parent(&self) -> Option<&Reference> {
        match self {
            Self::Group(v) => v.parent.as_ref(),
            Self::FileReference(v) => v.parent.as_ref(),
            Self::ReferenceProxy(v) => v.parent.as_ref(),
            _ => None,
        }
    }

    /// Set the parent link. Returns `false` for non-tree kinds.
    pub(crate) fn set_parent(&mut self, parent: Option<Reference>) -> bool {
        match self {
            Self::Group(v) => v.parent = parent,
            Self::FileReference(v) => v.parent = parent,
            Self::ReferenceProxy(v) => v.parent = parent,
            _ => return false,
        }
        true
    }
}

/// A concrete body type that can be pulled out of an [`ObjectBody`].
pub trait ObjectVariant: Clone + Sized {
    const KIND: ObjectKind;

    fn from_body(body: &ObjectBody) -> Option<&Self>;
    fn from_body_mut(body: &mut ObjectBody) -> Option<&mut Self>;
    fn into_body(self) -> ObjectBody;
}

macro_rules! object_variant {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl ObjectVariant for $ty {
                const KIND: ObjectKind = ObjectKind::$variant;

                fn from_body(body: &ObjectBody) -> Option<&Self> {
                    match body {
                        ObjectBody::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn from_body_mut(body: &mut ObjectBody) -> Option<&mut Self> {
                    match body {
                        ObjectBody::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn into_body(self) -> ObjectBody {
                    ObjectBody::$variant(self)
                }
            }

            impl From<$ty> for ObjectBody {
                fn from(value: $ty) -> Self {
                    ObjectBody::$variant(value)
                }
            }
        )*
    };
}

object_variant! {
    Project => Project,
    Group => Group,
    FileReference => FileReference,
    ReferenceProxy => ReferenceProxy,
    BuildFile => BuildFile,
    BuildPhase => BuildPhase,
    Target => Target,
    TargetDependency => TargetDependency,
    ContainerItemProxy => ContainerItemProxy,
    BuildRule => BuildRule,
    BuildConfiguration => BuildConfiguration,
    ConfigurationList => ConfigurationList,
    PackageReference => PackageReference,
    PackageProduct => PackageProduct,
    UnknownObject => Unknown,
}
