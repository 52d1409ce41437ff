//! Foundation types for pbxgraph.
//!
//! Every other pbxgraph crate depends on `pbx-types`. It has no knowledge of
//! object kinds or of the text dialect; it only names things and carries
//! values.
//!
//! # Key Types
//!
//! - [`Identifier`] -- Opaque token naming one object within a document graph
//! - [`PlistValue`] -- Tagged-value tree for attribute tables and the `classes` map
//! - [`IdentifierHasher`] -- Domain-separated BLAKE3 derivation of 24-digit identifiers

pub mod error;
pub mod hasher;
pub mod identifier;
pub mod value;

pub use error::TypeError;
pub use hasher::IdentifierHasher;
pub use identifier::Identifier;
pub use value::{Dictionary, PlistValue};
