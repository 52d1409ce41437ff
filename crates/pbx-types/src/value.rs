//! Tagged-value tree for attribute tables and document metadata.
//!
//! The text dialect only knows strings, data blobs, arrays and dictionaries.
//! Integers and booleans exist so callers can build values without
//! formatting them by hand; they encode as their textual form (`42`, `YES`)
//! and compare equal to the equivalent string. That keeps
//! `decode(encode(x)) == x` true for values that started life as numbers.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// An ordered string-keyed map of values.
pub type Dictionary = BTreeMap<String, PlistValue>;

/// A property-list value.
#[derive(Clone, Debug)]
pub enum PlistValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Data(Vec<u8>),
    Array(Vec<PlistValue>),
    Dictionary(Dictionary),
}

impl PlistValue {
    /// An empty dictionary.
    pub fn empty_dictionary() -> Self {
        Self::Dictionary(Dictionary::new())
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Data(_) => "data",
            Self::Array(_) => "array",
            Self::Dictionary(_) => "dictionary",
        }
    }

    /// Returns `true` for string, integer and boolean values.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::String(_) | Self::Integer(_) | Self::Boolean(_))
    }

    /// Borrow the string payload. Only matches the `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form of a scalar, as it appears in the encoded file.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s)),
            Self::Integer(n) => Some(Cow::Owned(n.to_string())),
            Self::Boolean(true) => Some(Cow::Borrowed("YES")),
            Self::Boolean(false) => Some(Cow::Borrowed("NO")),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PlistValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Self::Dictionary(map) => Some(map),
            _ => None,
        }
    }

    pub fn into_dictionary(self) -> Option<Dictionary> {
        match self {
            Self::Dictionary(map) => Some(map),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<PlistValue>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Apply `f` to every string leaf, depth first. Dictionary keys are left
    /// untouched.
    pub fn map_strings(&mut self, f: &mut impl FnMut(&mut String)) {
        match self {
            Self::String(s) => f(s),
            Self::Array(items) => items.iter_mut().for_each(|item| item.map_strings(f)),
            Self::Dictionary(map) => map.values_mut().for_each(|value| value.map_strings(f)),
            Self::Integer(_) | Self::Boolean(_) | Self::Data(_) => {}
        }
    }
}

impl PartialEq for PlistValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Dictionary(a), Self::Dictionary(b)) => a == b,
            (a, b) if a.is_scalar() && b.is_scalar() => a.as_text() == b.as_text(),
            _ => false,
        }
    }
}

impl Eq for PlistValue {}

impl From<&str> for PlistValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PlistValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PlistValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for PlistValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<PlistValue>> for PlistValue {
    fn from(value: Vec<PlistValue>) -> Self {
        Self::Array(value)
    }
}

impl From<Dictionary> for PlistValue {
    fn from(value: Dictionary) -> Self {
        Self::Dictionary(value)
    }
}

impl Serialize for PlistValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Data(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Dictionary(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: &[(&str, PlistValue)]) -> PlistValue {
        PlistValue::Dictionary(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn scalars_compare_by_text() {
        assert_eq!(PlistValue::Integer(46), PlistValue::from("46"));
        assert_eq!(PlistValue::Boolean(true), PlistValue::from("YES"));
        assert_ne!(PlistValue::Boolean(true), PlistValue::from("1"));
        assert_ne!(PlistValue::Integer(1), PlistValue::Data(b"1".to_vec()));
    }

    #[test]
    fn dictionary_equality_ignores_insertion_order() {
        let mut a = Dictionary::new();
        a.insert("b".into(), "2".into());
        a.insert("a".into(), "1".into());
        let mut b = Dictionary::new();
        b.insert("a".into(), "1".into());
        b.insert("b".into(), "2".into());
        assert_eq!(PlistValue::from(a), PlistValue::from(b));
    }

    #[test]
    fn arrays_are_ordered() {
        let a = PlistValue::Array(vec!["x".into(), "y".into()]);
        let b = PlistValue::Array(vec!["y".into(), "x".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn accessors() {
        let value = dict(&[("key", "value".into())]);
        assert_eq!(value.type_name(), "dictionary");
        assert!(value.as_str().is_none());
        let map = value.as_dictionary().unwrap();
        assert_eq!(map["key"].as_str(), Some("value"));
        assert_eq!(PlistValue::Integer(7).as_text().as_deref(), Some("7"));
        assert!(PlistValue::Array(vec![]).as_text().is_none());
    }

    #[test]
    fn map_strings_visits_leaves_only() {
        let mut value = dict(&[
            ("old", "old".into()),
            ("list", PlistValue::Array(vec!["old".into(), "keep".into()])),
        ]);
        value.map_strings(&mut |s| {
            if s == "old" {
                *s = "new".to_string();
            }
        });
        let map = value.as_dictionary().unwrap();
        assert!(map.contains_key("old"));
        assert_eq!(map["old"].as_str(), Some("new"));
        assert_eq!(
            map["list"],
            PlistValue::Array(vec!["new".into(), "keep".into()])
        );
    }

    #[test]
    fn serializes_to_json() {
        let value = dict(&[
            ("name", "App".into()),
            ("count", PlistValue::Integer(3)),
            ("blob", PlistValue::Data(vec![0xde, 0xad])),
        ]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["name"], "App");
        assert_eq!(json["count"], 3);
        assert_eq!(json["blob"], "dead");
    }
}
