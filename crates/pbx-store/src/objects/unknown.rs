use serde::Serialize;

use pbx_types::Dictionary;

use crate::fields::{AttributeReader, Fields};

/// An object whose class is not modeled. Its attributes are kept verbatim.
///
/// String values that happen to be identifiers are not interned, so they do
/// not count as graph edges. Regeneration still rewrites any that match a
/// renamed identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnknownObject {
    pub isa: String,
    pub attributes: Dictionary,
}

impl UnknownObject {
    pub fn decode(reader: &mut AttributeReader<'_>) -> Self {
        Self {
            isa: reader.isa().to_string(),
            attributes: reader.finish(),
        }
    }

    pub fn encode(&self, fields: &mut Fields) {
        fields.extra(&self.attributes);
    }
}
