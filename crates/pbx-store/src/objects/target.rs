use serde::Serialize;

use pbx_types::Dictionary;

use crate::error::StoreResult;
use crate::fields::{AttributeReader, Fields};
use crate::kind::isa;
use crate::reference::Reference;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Native,
    Aggregate,
    Legacy,
}

impl TargetKind {
    pub fn isa(&self) -> &'static str {
        match self {
            Self::Native => isa::NATIVE_TARGET,
            Self::Aggregate => isa::AGGREGATE_TARGET,
            Self::Legacy => isa::LEGACY_TARGET,
        }
    }
}

/// A buildable target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Target {
    pub kind: TargetKind,
    pub name: String,
    pub build_configuration_list: Option<Reference>,
    pub build_phases: Vec<Reference>,
    pub build_rules: Vec<Reference>,
    pub dependencies: Vec<Reference>,
    pub package_product_dependencies: Vec<Reference>,
    pub product_name: Option<String>,
    pub product_reference: Option<Reference>,
    pub product_type: Option<String>,
    pub extra: Dictionary,
}

impl Target {
    pub fn new(kind: TargetKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            build_configuration_list: None,
            build_phases: Vec::new(),
            build_rules: Vec::new(),
            dependencies: Vec::new(),
            package_product_dependencies: Vec::new(),
            product_name: None,
            product_reference: None,
            product_type: None,
            extra: Dictionary::new(),
        }
    }

    pub fn isa(&self) -> &'static str {
        self.kind.isa()
    }

    pub fn decode(reader: &mut AttributeReader<'_>, kind: TargetKind) -> StoreResult<Self> {
        Ok(Self {
            kind,
            name: reader.required_string("name")?,
            build_configuration_list: reader.reference("buildConfigurationList")?,
            build_phases: reader.references("buildPhases")?,
            build_rules: reader.references("buildRules")?,
            dependencies: reader.references("dependencies")?,
            package_product_dependencies: reader.references("packageProductDependencies")?,
            product_name: reader.string("productName")?,
            product_reference: reader.reference("productReference")?,
            product_type: reader.string("productType")?,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.reference("buildConfigurationList", self.build_configuration_list.as_ref());
        fields.references("buildPhases", &self.build_phases);
        if self.kind == TargetKind::Native {
            fields.references("buildRules", &self.build_rules);
        } else {
            fields.references_if_any("buildRules", &self.build_rules);
        }
        fields.references("dependencies", &self.dependencies);
        fields.text("name", self.name.as_str());
        fields.references_if_any("packageProductDependencies", &self.package_product_dependencies);
        fields.string("productName", self.product_name.as_ref());
        fields.reference("productReference", self.product_reference.as_ref());
        fields.string("productType", self.product_type.as_ref());
        fields.extra(&self.extra);
    }
}

/// An edge from one target to another it depends on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TargetDependency {
    pub name: Option<String>,
    pub product_ref: Option<Reference>,
    pub target: Option<Reference>,
    pub target_proxy: Option<Reference>,
    pub extra: Dictionary,
}

impl TargetDependency {
    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Ok(Self {
            name: reader.string("name")?,
            product_ref: reader.reference("productRef")?,
            target: reader.reference("target")?,
            target_proxy: reader.reference("targetProxy")?,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.string("name", self.name.as_ref());
        fields.reference("productRef", self.product_ref.as_ref());
        fields.reference("target", self.target.as_ref());
        fields.reference("targetProxy", self.target_proxy.as_ref());
        fields.extra(&self.extra);
    }
}

/// Indirection to an object that may live in another project file.
///
/// `remote_global_id` is written without an annotation comment; it often
/// names an object this file does not contain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ContainerItemProxy {
    pub container_portal: Option<Reference>,
    pub proxy_type: Option<String>,
    pub remote_global_id: Option<Reference>,
    pub remote_info: Option<String>,
    pub extra: Dictionary,
}

impl ContainerItemProxy {
    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Ok(Self {
            container_portal: reader.reference("containerPortal")?,
            proxy_type: reader.string("proxyType")?,
            remote_global_id: reader.reference("remoteGlobalIDString")?,
            remote_info: reader.string("remoteInfo")?,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.reference("containerPortal", self.container_portal.as_ref());
        fields.string("proxyType", self.proxy_type.as_ref());
        fields.identifier("remoteGlobalIDString", self.remote_global_id.as_ref());
        fields.string("remoteInfo", self.remote_info.as_ref());
        fields.extra(&self.extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Field;

    #[test]
    fn native_targets_always_write_build_rules() {
        let mut fields = Fields::new();
        Target::new(TargetKind::Native, "App").encode(&mut fields);
        assert_eq!(fields.get("buildRules"), Some(&Field::List(vec![])));

        let mut fields = Fields::new();
        Target::new(TargetKind::Aggregate, "All").encode(&mut fields);
        assert!(fields.get("buildRules").is_none());
        assert_eq!(fields.get("name"), Some(&Field::Value("All".into())));
    }
}
