use serde::Serialize;

use pbx_types::{Dictionary, PlistValue};

use crate::error::StoreResult;
use crate::fields::{AttributeReader, Field, FieldKey, Fields};
use crate::reference::Reference;

const TARGET_ATTRIBUTES: &str = "TargetAttributes";

/// The root object of a project file.
#[derive(Clone, Debug, Serialize)]
pub struct Project {
    /// Display name, inferred from the enclosing `.xcodeproj` directory.
    /// Not part of the encoded form and ignored by equality.
    pub name: String,
    /// The `attributes` dictionary minus `TargetAttributes`.
    pub attributes: Option<Dictionary>,
    /// Per-target attribute dictionaries, keyed by target.
    pub target_attributes: Vec<(Reference, PlistValue)>,
    pub build_configuration_list: Option<Reference>,
    pub compatibility_version: Option<String>,
    pub development_region: Option<String>,
    pub has_scanned_for_encodings: Option<String>,
    pub known_regions: Vec<String>,
    pub main_group: Reference,
    pub product_ref_group: Option<Reference>,
    pub project_dir_path: Option<String>,
    pub project_references: Vec<ProjectReference>,
    pub project_root: Option<String>,
    pub targets: Vec<Reference>,
    pub package_references: Vec<Reference>,
    pub extra: Dictionary,
}

/// One entry of `projectReferences`: a nested project and the group that
/// holds its products.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectReference {
    pub product_group: Option<Reference>,
    pub project_ref: Option<Reference>,
    pub extra: Dictionary,
}

impl Project {
    pub fn new(main_group: Reference) -> Self {
        Self {
            name: String::new(),
            attributes: None,
            target_attributes: Vec::new(),
            build_configuration_list: None,
            compatibility_version: None,
            development_region: None,
            has_scanned_for_encodings: None,
            known_regions: Vec::new(),
            main_group,
            product_ref_group: None,
            project_dir_path: None,
            project_references: Vec::new(),
            project_root: None,
            targets: Vec::new(),
            package_references: Vec::new(),
            extra: Dictionary::new(),
        }
    }

    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        let mut attributes = reader.dictionary("attributes")?;
        let mut target_attributes = Vec::new();
        if let Some(raw) = attributes.as_mut().and_then(|map| map.remove(TARGET_ATTRIBUTES)) {
            let Some(entries) = raw.into_dictionary() else {
                return Err(reader.malformed("attributes", "TargetAttributes must be a dictionary"));
            };
            for (key, value) in entries {
                target_attributes.push((reader.intern("attributes", &key)?, value));
            }
        }

        let project_references = match reader.value("projectReferences") {
            None => Vec::new(),
            Some(PlistValue::Array(items)) => items
                .into_iter()
                .map(|item| ProjectReference::decode(reader, item))
                .collect::<StoreResult<_>>()?,
            Some(other) => {
                return Err(reader.malformed(
                    "projectReferences",
                    format!("expected an array, found {}", other.type_name()),
                ))
            }
        };

        Ok(Self {
            name: String::new(),
            attributes,
            target_attributes,
            build_configuration_list: reader.reference("buildConfigurationList")?,
            compatibility_version: reader.string("compatibilityVersion")?,
            development_region: reader.string("developmentRegion")?,
            has_scanned_for_encodings: reader.string("hasScannedForEncodings")?,
            known_regions: reader.strings("knownRegions")?,
            main_group: reader.required_reference("mainGroup")?,
            product_ref_group: reader.reference("productRefGroup")?,
            project_dir_path: reader.string("projectDirPath")?,
            project_references,
            project_root: reader.string("projectRoot")?,
            targets: reader.references("targets")?,
            package_references: reader.references("packageReferences")?,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        if self.attributes.is_some() || !self.target_attributes.is_empty() {
            let mut entries: Vec<(FieldKey, Field)> = self
                .attributes
                .iter()
                .flatten()
                .map(|(k, v)| (FieldKey::Name(k.clone()), Field::Value(v.clone())))
                .collect();
            if !self.target_attributes.is_empty() {
                let targets = self
                    .target_attributes
                    .iter()
                    .map(|(target, value)| {
                        (FieldKey::Reference(target.clone()), Field::Value(value.clone()))
                    })
                    .collect();
                entries.push((
                    FieldKey::Name(TARGET_ATTRIBUTES.to_string()),
                    Field::Map(targets),
                ));
            }
            fields.insert("attributes", Field::Map(entries));
        }
        fields.reference("buildConfigurationList", self.build_configuration_list.as_ref());
        fields.string("compatibilityVersion", self.compatibility_version.as_ref());
        fields.string("developmentRegion", self.development_region.as_ref());
        fields.string("hasScannedForEncodings", self.has_scanned_for_encodings.as_ref());
        if !self.known_regions.is_empty() {
            fields.strings("knownRegions", &self.known_regions);
        }
        fields.reference("mainGroup", Some(&self.main_group));
        fields.reference("productRefGroup", self.product_ref_group.as_ref());
        fields.string("projectDirPath", self.project_dir_path.as_ref());
        if !self.project_references.is_empty() {
            let items = self
                .project_references
                .iter()
                .map(ProjectReference::encode)
                .collect();
            fields.insert("projectReferences", Field::List(items));
        }
        fields.string("projectRoot", self.project_root.as_ref());
        fields.references("targets", &self.targets);
        fields.references_if_any("packageReferences", &self.package_references);
        fields.extra(&self.extra);
    }

    /// Attribute dictionary for `target`, if any.
    pub fn target_attributes_for(&self, target: &Reference) -> Option<&PlistValue> {
        self.target_attributes
            .iter()
            .find(|(key, _)| key == target)
            .map(|(_, value)| value)
    }

    fn sorted_target_attributes(&self) -> Vec<&(Reference, PlistValue)> {
        let mut entries: Vec<_> = self.target_attributes.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && self.sorted_target_attributes() == other.sorted_target_attributes()
            && self.build_configuration_list == other.build_configuration_list
            && self.compatibility_version == other.compatibility_version
            && self.development_region == other.development_region
            && self.has_scanned_for_encodings == other.has_scanned_for_encodings
            && self.known_regions == other.known_regions
            && self.main_group == other.main_group
            && self.product_ref_group == other.product_ref_group
            && self.project_dir_path == other.project_dir_path
            && self.project_references == other.project_references
            && self.project_root == other.project_root
            && self.targets == other.targets
            && self.package_references == other.package_references
            && self.extra == other.extra
    }
}

impl Eq for Project {}

impl ProjectReference {
    fn decode(reader: &AttributeReader<'_>, value: PlistValue) -> StoreResult<Self> {
        let Some(mut map) = value.into_dictionary() else {
            return Err(reader.malformed("projectReferences", "expected an array of dictionaries"));
        };
        let mut take = |key: &str| -> StoreResult<Option<Reference>> {
            match map.remove(key) {
                None => Ok(None),
                Some(PlistValue::String(text)) => reader.intern("projectReferences", &text).map(Some),
                Some(_) => Err(reader.malformed("projectReferences", format!("{key} must be an identifier"))),
            }
        };
        let product_group = take("ProductGroup")?;
        let project_ref = take("ProjectRef")?;
        Ok(Self {
            product_group,
            project_ref,
            extra: map,
        })
    }

    fn encode(&self) -> Field {
        let mut entries: Vec<(FieldKey, Field)> = self
            .extra
            .iter()
            .map(|(k, v)| (FieldKey::Name(k.clone()), Field::Value(v.clone())))
            .collect();
        if let Some(group) = &self.product_group {
            entries.push((FieldKey::Name("ProductGroup".into()), Field::Reference(group.clone())));
        }
        if let Some(project) = &self.project_ref {
            entries.push((FieldKey::Name("ProjectRef".into()), Field::Reference(project.clone())));
        }
        Field::Map(entries)
    }
}
