//! Attribute tables in both directions.
//!
//! [`AttributeReader`] hands a decoder typed access to one object's raw
//! attribute dictionary and keeps whatever the object type does not model,
//! so it can be written back untouched. [`Fields`] is the reverse: an object
//! describes its attributes as [`Field`]s, which the encoder lays out and
//! annotates, and which identifier regeneration walks to find edges.

use std::collections::btree_map::{self, BTreeMap};

use pbx_types::{Dictionary, Identifier, PlistValue};

use crate::error::{StoreError, StoreResult};
use crate::reference::Reference;
use crate::repository::ReferenceRepository;

/// One attribute in encoding form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Value(PlistValue),
    /// A reference written with the target's display name as a comment.
    Reference(Reference),
    /// A reference written bare.
    Identifier(Reference),
    List(Vec<Field>),
    Map(Vec<(FieldKey, Field)>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKey {
    Name(String),
    Reference(Reference),
}

impl Field {
    /// Visit every reference in this field, map keys included.
    pub fn visit_references(&self, f: &mut impl FnMut(&Reference)) {
        match self {
            Self::Value(_) => {}
            Self::Reference(reference) | Self::Identifier(reference) => f(reference),
            Self::List(items) => items.iter().for_each(|item| item.visit_references(f)),
            Self::Map(entries) => {
                for (key, value) in entries {
                    if let FieldKey::Reference(reference) = key {
                        f(reference);
                    }
                    value.visit_references(f);
                }
            }
        }
    }
}

/// An object's attributes in encoding form, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fields {
    entries: BTreeMap<String, Field>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, field: Field) {
        self.entries.insert(key.to_string(), field);
    }

    pub fn text(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key, Field::Value(PlistValue::String(value.into())));
    }

    pub fn string(&mut self, key: &str, value: Option<&String>) {
        if let Some(value) = value {
            self.text(key, value.as_str());
        }
    }

    pub fn strings(&mut self, key: &str, values: &[String]) {
        let items = values
            .iter()
            .map(|s| Field::Value(PlistValue::String(s.clone())))
            .collect();
        self.insert(key, Field::List(items));
    }

    pub fn value(&mut self, key: &str, value: Option<&PlistValue>) {
        if let Some(value) = value {
            self.insert(key, Field::Value(value.clone()));
        }
    }

    pub fn dictionary(&mut self, key: &str, value: &Dictionary) {
        self.insert(key, Field::Value(PlistValue::Dictionary(value.clone())));
    }

    pub fn reference(&mut self, key: &str, value: Option<&Reference>) {
        if let Some(reference) = value {
            self.insert(key, Field::Reference(reference.clone()));
        }
    }

    pub fn identifier(&mut self, key: &str, value: Option<&Reference>) {
        if let Some(reference) = value {
            self.insert(key, Field::Identifier(reference.clone()));
        }
    }

    /// A reference list, written even when empty.
    pub fn references(&mut self, key: &str, values: &[Reference]) {
        let items = values.iter().cloned().map(Field::Reference).collect();
        self.insert(key, Field::List(items));
    }

    /// A reference list, omitted when empty.
    pub fn references_if_any(&mut self, key: &str, values: &[Reference]) {
        if !values.is_empty() {
            self.references(key, values);
        }
    }

    /// Pass-through attributes. Modeled attributes win on a name clash.
    pub fn extra(&mut self, extra: &Dictionary) {
        for (key, value) in extra {
            self.entries
                .entry(key.clone())
                .or_insert_with(|| Field::Value(value.clone()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Field> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Fields {
    type Item = (String, Field);
    type IntoIter = btree_map::IntoIter<String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Typed, consuming access to one object's raw attributes.
///
/// Every accessor removes the attribute it reads. Whatever is left when
/// [`finish`](Self::finish) is called belongs in the object's pass-through
/// table, so `finish` is the last call an object decoder makes.
pub struct AttributeReader<'a> {
    identifier: &'a Identifier,
    isa: &'a str,
    attributes: Dictionary,
    references: &'a ReferenceRepository,
}

impl<'a> AttributeReader<'a> {
    /// `attributes` must not contain the `isa` entry.
    pub fn new(
        identifier: &'a Identifier,
        isa: &'a str,
        attributes: Dictionary,
        references: &'a ReferenceRepository,
    ) -> Self {
        Self {
            identifier,
            isa,
            attributes,
            references,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        self.identifier
    }

    pub fn isa(&self) -> &str {
        self.isa
    }

    pub fn malformed(&self, attribute: &str, reason: impl Into<String>) -> StoreError {
        StoreError::MalformedAttribute {
            id: self.identifier.clone(),
            isa: self.isa.to_string(),
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }

    fn missing(&self, attribute: &str) -> StoreError {
        StoreError::MissingAttribute {
            id: self.identifier.clone(),
            isa: self.isa.to_string(),
            attribute: attribute.to_string(),
        }
    }

    /// Remove and return the raw value.
    pub fn value(&mut self, key: &str) -> Option<PlistValue> {
        self.attributes.remove(key)
    }

    pub fn string(&mut self, key: &str) -> StoreResult<Option<String>> {
        match self.attributes.remove(key) {
            None => Ok(None),
            Some(PlistValue::String(s)) => Ok(Some(s)),
            Some(value) if value.is_scalar() => {
                Ok(value.as_text().map(|text| text.into_owned()))
            }
            Some(other) => Err(self.malformed(
                key,
                format!("expected a string, found {}", other.type_name()),
            )),
        }
    }

    pub fn required_string(&mut self, key: &str) -> StoreResult<String> {
        self.string(key)?.ok_or_else(|| self.missing(key))
    }

    /// A list of scalars. A missing attribute reads as an empty list.
    pub fn strings(&mut self, key: &str) -> StoreResult<Vec<String>> {
        let Some(value) = self.attributes.remove(key) else {
            return Ok(Vec::new());
        };
        let Some(items) = value.into_array() else {
            return Err(self.malformed(key, "expected an array"));
        };
        items
            .into_iter()
            .map(|item| {
                item.as_text()
                    .map(|text| text.into_owned())
                    .ok_or_else(|| self.malformed(key, "expected an array of strings"))
            })
            .collect()
    }

    pub fn dictionary(&mut self, key: &str) -> StoreResult<Option<Dictionary>> {
        match self.attributes.remove(key) {
            None => Ok(None),
            Some(PlistValue::Dictionary(map)) => Ok(Some(map)),
            Some(other) => Err(self.malformed(
                key,
                format!("expected a dictionary, found {}", other.type_name()),
            )),
        }
    }

    /// Intern `text` as a reference in this object's store.
    pub fn intern(&self, key: &str, text: &str) -> StoreResult<Reference> {
        let identifier = Identifier::new(text)
            .map_err(|e| self.malformed(key, format!("invalid identifier: {e}")))?;
        Ok(self.references.get_or_create(&identifier))
    }

    pub fn reference(&mut self, key: &str) -> StoreResult<Option<Reference>> {
        match self.attributes.remove(key) {
            None => Ok(None),
            Some(PlistValue::String(text)) => self.intern(key, &text).map(Some),
            Some(other) => Err(self.malformed(
                key,
                format!("expected an identifier, found {}", other.type_name()),
            )),
        }
    }

    pub fn required_reference(&mut self, key: &str) -> StoreResult<Reference> {
        self.reference(key)?.ok_or_else(|| self.missing(key))
    }

    /// A list of references. A missing attribute reads as an empty list.
    pub fn references(&mut self, key: &str) -> StoreResult<Vec<Reference>> {
        let Some(value) = self.attributes.remove(key) else {
            return Ok(Vec::new());
        };
        let Some(items) = value.into_array() else {
            return Err(self.malformed(key, "expected an array of identifiers"));
        };
        items
            .into_iter()
            .map(|item| match item {
                PlistValue::String(text) => self.intern(key, &text),
                other => Err(self.malformed(
                    key,
                    format!("expected an identifier, found {}", other.type_name()),
                )),
            })
            .collect()
    }

    /// Attributes not yet consumed.
    pub fn remaining(&self) -> &Dictionary {
        &self.attributes
    }

    /// Take the unconsumed attributes, leaving the reader empty.
    pub fn finish(&mut self) -> Dictionary {
        std::mem::take(&mut self.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectStore;

    fn attributes(entries: &[(&str, PlistValue)]) -> Dictionary {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn reader_consumes_and_keeps_leftovers() {
        let store = ObjectStore::new();
        let id = Identifier::new("OBJ").unwrap();
        let mut reader = AttributeReader::new(
            &id,
            "PBXGroup",
            attributes(&[
                ("name", "Sources".into()),
                ("children", PlistValue::Array(vec!["A".into(), "B".into()])),
                ("usesTabs", PlistValue::Integer(1)),
            ]),
            store.references(),
        );
        assert_eq!(reader.string("name").unwrap().as_deref(), Some("Sources"));
        let children = reader.references("children").unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[0].same_handle(&store.references().get_or_create(&Identifier::new("A").unwrap())));
        assert!(reader.references("missing").unwrap().is_empty());
        let extra = reader.finish();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra["usesTabs"], PlistValue::from("1"));
    }

    #[test]
    fn reader_reports_shape_errors() {
        let store = ObjectStore::new();
        let id = Identifier::new("OBJ").unwrap();
        let mut reader = AttributeReader::new(
            &id,
            "PBXProject",
            attributes(&[
                ("mainGroup", PlistValue::Array(vec![])),
                ("targets", "not-a-list".into()),
            ]),
            store.references(),
        );
        let err = reader.required_reference("mainGroup").unwrap_err();
        assert!(matches!(err, StoreError::MalformedAttribute { ref attribute, .. } if attribute == "mainGroup"));
        assert!(reader.references("targets").is_err());
        assert_eq!(
            reader.required_string("name").unwrap_err(),
            StoreError::MissingAttribute {
                id: id.clone(),
                isa: "PBXProject".into(),
                attribute: "name".into(),
            }
        );
    }

    #[test]
    fn fields_are_ordered_and_extras_never_override() {
        let store = ObjectStore::new();
        let child = store.references().get_or_create(&Identifier::new("C").unwrap());
        let mut fields = Fields::new();
        fields.text("sourceTree", "<group>");
        fields.references("children", &[child.clone()]);
        fields.extra(&attributes(&[
            ("sourceTree", "SDKROOT".into()),
            ("indentWidth", "4".into()),
        ]));
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["children", "indentWidth", "sourceTree"]);
        assert_eq!(
            fields.get("sourceTree"),
            Some(&Field::Value("<group>".into()))
        );

        let mut seen = Vec::new();
        fields
            .get("children")
            .unwrap()
            .visit_references(&mut |r| seen.push(r.clone()));
        assert_eq!(seen, vec![child]);
    }
}
