//! Object graph for pbxgraph.
//!
//! A project file is a flat table of objects keyed by 24-digit identifiers,
//! wired together by identifier-valued attributes. This crate holds that
//! table in memory and keeps it coherent.
//!
//! # Pieces
//!
//! - [`Reference`] -- interned handle naming one object; renamed in place
//!   when identifiers are regenerated
//! - [`ReferenceRepository`] -- the interning table, one handle per identifier
//! - [`ObjectStore`] -- concurrent identifier-keyed table with a per-kind index
//! - [`PbxObject`] / [`ObjectBody`] -- typed object bodies, see [`objects`]
//! - [`Document`] -- versions, class table, root project, and the store;
//!   the single-writer mutation surface
//! - [`BatchUpdate`] -- deferred tree maintenance for bulk edits
//!
//! # Rules
//!
//! 1. Every handle held anywhere in a document comes from that document's
//!    repository. The store rejects foreign handles.
//! 2. At most one object per identifier. Re-adding an equal object is a
//!    no-op, anything else is an error.
//! 3. Parent links in the group tree are derived from `children` lists and
//!    never encoded.
//! 4. Deleting an object leaves references to it dangling; resolving them
//!    reports the missing identifier.

pub mod batch;
pub mod document;
pub mod error;
pub mod fields;
pub mod kind;
pub mod names;
pub mod object;
pub mod objects;
pub mod reference;
pub mod regenerate;
pub mod repository;
pub mod store;
pub mod tree;

pub use batch::BatchUpdate;
pub use document::{Document, DEFAULT_ARCHIVE_VERSION, DEFAULT_OBJECT_VERSION};
pub use error::{StoreError, StoreResult};
pub use fields::{AttributeReader, Field, FieldKey, Fields};
pub use kind::{isa, ObjectKind};
pub use names::{display_name, CommentIndex};
pub use object::{ObjectBody, ObjectVariant, PbxObject};
pub use reference::Reference;
pub use regenerate::Regeneration;
pub use repository::ReferenceRepository;
pub use store::ObjectStore;
pub use tree::TreeSummary;
