//! Old-style (OpenStep) property-list text for pbxgraph.
//!
//! This crate is the thin text layer underneath the typed codec. It knows
//! nothing about objects or identifiers; it turns text into a
//! [`PlistValue`](pbx_types::PlistValue) tree and renders a [`Node`] tree
//! back to text.
//!
//! # Architecture
//!
//! - **Parser** ([`parse`]): comments skipped, quoted and bare strings,
//!   `<hex>` data, arrays, dictionaries. Duplicate dictionary keys are
//!   rejected rather than silently merged.
//! - **Node**: the writer's input. Like a value tree, but scalars may carry
//!   an annotation comment, containers choose inline or multi-line layout,
//!   and dictionaries may contain section markers.
//! - **Writer** ([`Writer`]): renders nodes with tab indentation in the
//!   layout the usual tooling produces, so rewritten files diff cleanly.

pub mod error;
pub mod node;
pub mod parser;
pub mod writer;

pub use error::{PlistError, PlistResult};
pub use node::{DictItem, Node};
pub use parser::parse;
pub use writer::{needs_quotes, Writer, UTF8_HEADER};
