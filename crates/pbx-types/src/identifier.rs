use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length of identifiers minted by [`IdentifierHasher`](crate::IdentifierHasher).
pub const GENERATED_LEN: usize = 24;

/// Opaque token naming one object within a document graph.
///
/// Identifiers carry no meaning of their own; they exist for indirection and
/// for pairing an object with its comment in the text encoding. Files written
/// by the usual tooling use 24 upper-case hex digits, but any non-empty token
/// without whitespace is accepted on input.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Create an identifier, rejecting empty tokens and tokens containing
    /// whitespace or double quotes.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TypeError::EmptyIdentifier);
        }
        if value.chars().any(|c| c.is_whitespace() || c == '"') {
            return Err(TypeError::InvalidIdentifier(value));
        }
        Ok(Self(value))
    }

    /// Build an identifier from raw hash bytes, hex-encoded upper-case.
    pub(crate) fn from_digest(bytes: &[u8]) -> Self {
        Self(hex::encode_upper(bytes))
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this identifier has the shape of a generated one
    /// (24 upper-case hex digits).
    pub fn is_canonical(&self) -> bool {
        self.0.len() == GENERATED_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_short_tokens() {
        let id = Identifier::new("1").unwrap();
        assert_eq!(id.as_str(), "1");
        assert!(!id.is_canonical());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Identifier::new(""), Err(TypeError::EmptyIdentifier));
    }

    #[test]
    fn rejects_whitespace_and_quotes() {
        assert!(matches!(
            Identifier::new("13B0 7F96"),
            Err(TypeError::InvalidIdentifier(_))
        ));
        assert!(Identifier::new("a\"b").is_err());
    }

    #[test]
    fn canonical_shape() {
        let id = Identifier::new("13B07F961A680F5B00A75B9A").unwrap();
        assert!(id.is_canonical());
        let lower = Identifier::new("13b07f961a680f5b00a75b9a").unwrap();
        assert!(!lower.is_canonical());
    }

    #[test]
    fn display_is_raw_text() {
        let id: Identifier = "ABC".parse().unwrap();
        assert_eq!(format!("{id}"), "ABC");
        assert_eq!(format!("{id:?}"), "Identifier(ABC)");
    }

    #[test]
    fn serde_roundtrip() {
        let id = Identifier::new("13B07F961A680F5B00A75B9A").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"13B07F961A680F5B00A75B9A\"");
        let parsed: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_rejects_empty() {
        assert!(serde_json::from_str::<Identifier>("\"\"").is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Identifier::new("0A").unwrap();
        let b = Identifier::new("0B").unwrap();
        assert!(a < b);
    }
}
