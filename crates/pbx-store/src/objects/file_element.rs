use serde::Serialize;

use pbx_types::Dictionary;

use crate::error::StoreResult;
use crate::fields::{AttributeReader, Fields};
use crate::kind::isa;
use crate::reference::Reference;

/// Which group class an object is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Group,
    /// Localized variants of one resource.
    Variant,
    /// Versioned bundle such as a Core Data model.
    Version {
        current_version: Option<Reference>,
        version_group_type: Option<String>,
    },
}

/// A group in the project navigator tree.
///
/// `parent` is derived by tree reconciliation from the `children` lists of
/// all groups. It is never encoded and does not take part in equality.
#[derive(Clone, Debug, Serialize)]
pub struct Group {
    pub kind: GroupKind,
    pub children: Vec<Reference>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub source_tree: Option<String>,
    #[serde(skip)]
    pub parent: Option<Reference>,
    pub extra: Dictionary,
}

impl Group {
    /// An empty `<group>`-relative group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Group,
            children: Vec::new(),
            name: Some(name.into()),
            path: None,
            source_tree: Some("<group>".to_string()),
            parent: None,
            extra: Dictionary::new(),
        }
    }

    /// A group with no name or path, as used for a project's main group.
    pub fn root() -> Self {
        Self {
            name: None,
            ..Self::new("")
        }
    }

    pub fn isa(&self) -> &'static str {
        match self.kind {
            GroupKind::Group => isa::GROUP,
            GroupKind::Variant => isa::VARIANT_GROUP,
            GroupKind::Version { .. } => isa::VERSION_GROUP,
        }
    }

    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Self::decode_with(reader, GroupKind::Group)
    }

    pub fn decode_variant(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Self::decode_with(reader, GroupKind::Variant)
    }

    pub fn decode_version(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        let kind = GroupKind::Version {
            current_version: reader.reference("currentVersion")?,
            version_group_type: reader.string("versionGroupType")?,
        };
        Self::decode_with(reader, kind)
    }

    fn decode_with(reader: &mut AttributeReader<'_>, kind: GroupKind) -> StoreResult<Self> {
        Ok(Self {
            kind,
            children: reader.references("children")?,
            name: reader.string("name")?,
            path: reader.string("path")?,
            source_tree: reader.string("sourceTree")?,
            parent: None,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        if let GroupKind::Version {
            current_version,
            version_group_type,
        } = &self.kind
        {
            fields.reference("currentVersion", current_version.as_ref());
            fields.string("versionGroupType", version_group_type.as_ref());
        }
        fields.references("children", &self.children);
        fields.string("name", self.name.as_ref());
        fields.string("path", self.path.as_ref());
        fields.string("sourceTree", self.source_tree.as_ref());
        fields.extra(&self.extra);
    }

    /// Name shown in the navigator: `name`, falling back to `path`.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.path.as_deref())
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.children == other.children
            && self.name == other.name
            && self.path == other.path
            && self.source_tree == other.source_tree
            && self.extra == other.extra
    }
}

impl Eq for Group {}

/// A file or folder on disk.
#[derive(Clone, Debug, Serialize)]
pub struct FileReference {
    pub name: Option<String>,
    pub path: Option<String>,
    pub source_tree: Option<String>,
    pub file_encoding: Option<String>,
    pub explicit_file_type: Option<String>,
    pub last_known_file_type: Option<String>,
    pub include_in_index: Option<String>,
    #[serde(skip)]
    pub parent: Option<Reference>,
    pub extra: Dictionary,
}

impl FileReference {
    /// A `<group>`-relative reference to `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: None,
            path: Some(path.into()),
            source_tree: Some("<group>".to_string()),
            file_encoding: None,
            explicit_file_type: None,
            last_known_file_type: None,
            include_in_index: None,
            parent: None,
            extra: Dictionary::new(),
        }
    }

    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Ok(Self {
            name: reader.string("name")?,
            path: reader.string("path")?,
            source_tree: reader.string("sourceTree")?,
            file_encoding: reader.string("fileEncoding")?,
            explicit_file_type: reader.string("explicitFileType")?,
            last_known_file_type: reader.string("lastKnownFileType")?,
            include_in_index: reader.string("includeInIndex")?,
            parent: None,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.string("explicitFileType", self.explicit_file_type.as_ref());
        fields.string("fileEncoding", self.file_encoding.as_ref());
        fields.string("includeInIndex", self.include_in_index.as_ref());
        fields.string("lastKnownFileType", self.last_known_file_type.as_ref());
        fields.string("name", self.name.as_ref());
        fields.string("path", self.path.as_ref());
        fields.string("sourceTree", self.source_tree.as_ref());
        fields.extra(&self.extra);
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.path.as_deref())
    }
}

impl PartialEq for FileReference {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.path == other.path
            && self.source_tree == other.source_tree
            && self.file_encoding == other.file_encoding
            && self.explicit_file_type == other.explicit_file_type
            && self.last_known_file_type == other.last_known_file_type
            && self.include_in_index == other.include_in_index
            && self.extra == other.extra
    }
}

impl Eq for FileReference {}

/// Stand-in for a product of a nested project.
#[derive(Clone, Debug, Serialize)]
pub struct ReferenceProxy {
    pub file_type: Option<String>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub remote_ref: Option<Reference>,
    pub source_tree: Option<String>,
    #[serde(skip)]
    pub parent: Option<Reference>,
    pub extra: Dictionary,
}

impl ReferenceProxy {
    pub fn decode(reader: &mut AttributeReader<'_>) -> StoreResult<Self> {
        Ok(Self {
            file_type: reader.string("fileType")?,
            name: reader.string("name")?,
            path: reader.string("path")?,
            remote_ref: reader.reference("remoteRef")?,
            source_tree: reader.string("sourceTree")?,
            parent: None,
            extra: reader.finish(),
        })
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.string("fileType", self.file_type.as_ref());
        fields.string("name", self.name.as_ref());
        fields.string("path", self.path.as_ref());
        fields.reference("remoteRef", self.remote_ref.as_ref());
        fields.string("sourceTree", self.source_tree.as_ref());
        fields.extra(&self.extra);
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.path.as_deref())
    }
}

impl PartialEq for ReferenceProxy {
    fn eq(&self, other: &Self) -> bool {
        self.file_type == other.file_type
            && self.name == other.name
            && self.path == other.path
            && self.remote_ref == other.remote_ref
            && self.source_tree == other.source_tree
            && self.extra == other.extra
    }
}

impl Eq for ReferenceProxy {}

#[cfg(test)]
mod tests {
    use pbx_types::{Identifier, PlistValue};

    use super::*;
    use crate::store::ObjectStore;

    fn reader_for<'a>(
        store: &'a ObjectStore,
        id: &'a Identifier,
        isa: &'a str,
        entries: &[(&str, PlistValue)],
    ) -> AttributeReader<'a> {
        let attributes = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        AttributeReader::new(id, isa, attributes, store.references())
    }

    #[test]
    fn parent_is_ignored_by_equality() {
        let store = ObjectStore::new();
        let mut a = Group::new("Sources");
        let b = a.clone();
        a.parent = Some(store.reference(&Identifier::new("P").unwrap()));
        assert_eq!(a, b);

        let mut f = FileReference::new("main.swift");
        let g = f.clone();
        f.parent = Some(store.reference(&Identifier::new("P").unwrap()));
        assert_eq!(f, g);
    }

    #[test]
    fn version_group_decodes_current_version() {
        let store = ObjectStore::new();
        let id = Identifier::new("VG").unwrap();
        let mut reader = reader_for(
            &store,
            &id,
            isa::VERSION_GROUP,
            &[
                ("children", PlistValue::Array(vec!["M1".into()])),
                ("currentVersion", "M1".into()),
                ("path", "Model.xcdatamodeld".into()),
                ("versionGroupType", "wrapper.xcdatamodel".into()),
            ],
        );
        let group = Group::decode_version(&mut reader).unwrap();
        assert_eq!(group.isa(), isa::VERSION_GROUP);
        let GroupKind::Version { current_version, .. } = &group.kind else {
            panic!("expected a version group");
        };
        assert_eq!(current_version.as_ref(), Some(&group.children[0]));
        assert!(group.extra.is_empty());

        let mut fields = Fields::new();
        group.encode(&mut fields);
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["children", "currentVersion", "path", "versionGroupType"]);
    }

    #[test]
    fn display_name_prefers_name() {
        let mut file = FileReference::new("Sources/main.swift");
        assert_eq!(file.display_name(), Some("Sources/main.swift"));
        file.name = Some("main.swift".into());
        assert_eq!(file.display_name(), Some("main.swift"));
        assert_eq!(Group::root().display_name(), None);
    }
}
