use pbx_types::Identifier;

use crate::kind::ObjectKind;

/// Errors from reference resolution, store mutation and attribute decoding.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// No object is registered under the identifier.
    #[error(
        "missing reference: no object with identifier {id}{}",
        .expected.map(|kind| format!(" (expected {kind})")).unwrap_or_default()
    )]
    MissingReference {
        id: Identifier,
        expected: Option<ObjectKind>,
    },

    /// The identifier resolves, but to a different kind of object.
    #[error("object {id} is a {actual}, expected {expected}")]
    WrongType {
        id: Identifier,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// An object with the same identifier and different content already exists.
    #[error("identifier {0} is already used by a different object")]
    DuplicateIdentifier(Identifier),

    /// The object's reference was not minted by this store's repository.
    #[error("reference {0} does not belong to this object store")]
    ForeignReference(Identifier),

    /// A required attribute is absent from an object's attribute table.
    #[error("object {id} ({isa}): missing required attribute `{attribute}`")]
    MissingAttribute {
        id: Identifier,
        isa: String,
        attribute: String,
    },

    /// An attribute is present but has the wrong shape.
    #[error("object {id} ({isa}): malformed attribute `{attribute}`: {reason}")]
    MalformedAttribute {
        id: Identifier,
        isa: String,
        attribute: String,
        reason: String,
    },

    /// Two groups list the same element as a child.
    #[error("element {child} is listed by both {first} and {second}")]
    MultipleParents {
        child: Identifier,
        first: Identifier,
        second: Identifier,
    },

    /// The operation needs a tree-structured element (group or file).
    #[error("object {id} is a {kind}, which has no place in the group tree")]
    NotTreeElement { id: Identifier, kind: ObjectKind },

    /// The root reference does not resolve to a project object.
    #[error(
        "root object {id} is not a project{}",
        .actual.map(|kind| format!(" (found {kind})")).unwrap_or_else(|| " (missing)".to_string())
    )]
    InvalidRoot {
        id: Identifier,
        actual: Option<ObjectKind>,
    },

    /// Tree reconciliation at the close of a batch failed.
    #[error("tree reconciliation failed: {0}")]
    Reconciliation(#[source] Box<StoreError>),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
