use crate::identifier::{Identifier, GENERATED_LEN};

/// Domain-separated BLAKE3 identifier hasher.
///
/// Each hasher carries a domain tag (e.g. `"pbx-object-v1"`) that is prepended
/// to every hash computation, so identifiers minted for different purposes
/// never coincide even when their inputs do. The digest is truncated to 96
/// bits and rendered as 24 upper-case hex digits, the shape used by the
/// project-file dialect.
pub struct IdentifierHasher {
    domain: &'static str,
}

impl IdentifierHasher {
    /// Hasher for identifiers regenerated from an object's position in the graph.
    pub const OBJECT: Self = Self {
        domain: "pbx-object-v1",
    };
    /// Hasher for provisional identifiers handed to objects created through
    /// the mutation API. They are replaced at the next encode.
    pub const PROVISIONAL: Self = Self {
        domain: "pbx-provisional-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash an ordered list of string parts.
    ///
    /// Parts are separated by a unit-separator byte so that `["ab", "c"]` and
    /// `["a", "bc"]` hash differently.
    pub fn hash<S: AsRef<str>>(&self, parts: &[S]) -> Identifier {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(part.as_ref().as_bytes());
            hasher.update(&[0x1f]);
        }
        let digest = hasher.finalize();
        Identifier::from_digest(&digest.as_bytes()[..GENERATED_LEN / 2])
    }

    /// Hash `parts` followed by a collision counter.
    ///
    /// `attempt == 0` is identical to [`hash`](Self::hash).
    pub fn hash_with_attempt<S: AsRef<str>>(&self, parts: &[S], attempt: u32) -> Identifier {
        if attempt == 0 {
            return self.hash(parts);
        }
        let counter = format!("#{attempt}");
        let mut owned: Vec<&str> = parts.iter().map(AsRef::as_ref).collect();
        owned.push(counter.as_str());
        self.hash(owned.as_slice())
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hash_is_deterministic() {
        let a = IdentifierHasher::OBJECT.hash(&["PBXProject", "root"]);
        let b = IdentifierHasher::OBJECT.hash(&["PBXProject", "root"]);
        assert_eq!(a, b);
    }

    #[test]
    fn hash_has_canonical_shape() {
        let id = IdentifierHasher::OBJECT.hash(&["anything"]);
        assert!(id.is_canonical());
        assert_eq!(id.as_str().len(), 24);
    }

    #[test]
    fn different_domains_produce_different_ids() {
        let parts = ["same", "content"];
        assert_ne!(
            IdentifierHasher::OBJECT.hash(&parts),
            IdentifierHasher::PROVISIONAL.hash(&parts)
        );
        assert_ne!(
            IdentifierHasher::OBJECT.hash(&parts),
            IdentifierHasher::new("custom-v1").hash(&parts)
        );
    }

    #[test]
    fn part_boundaries_matter() {
        let a = IdentifierHasher::OBJECT.hash(&["ab", "c"]);
        let b = IdentifierHasher::OBJECT.hash(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn attempt_zero_matches_plain_hash() {
        let parts = ["x", "y"];
        assert_eq!(
            IdentifierHasher::OBJECT.hash_with_attempt(&parts, 0),
            IdentifierHasher::OBJECT.hash(&parts)
        );
        assert_ne!(
            IdentifierHasher::OBJECT.hash_with_attempt(&parts, 1),
            IdentifierHasher::OBJECT.hash(&parts)
        );
    }

    proptest! {
        #[test]
        fn generated_ids_are_always_canonical(parts in proptest::collection::vec(".*", 0..6)) {
            let id = IdentifierHasher::OBJECT.hash(parts.as_slice());
            prop_assert!(id.is_canonical());
        }

        #[test]
        fn generated_ids_are_stable(parts in proptest::collection::vec("[a-zA-Z0-9/._-]{0,12}", 1..5)) {
            prop_assert_eq!(
                IdentifierHasher::OBJECT.hash(parts.as_slice()),
                IdentifierHasher::OBJECT.hash(parts.clone().as_slice())
            );
        }
    }
}
