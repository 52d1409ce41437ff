//! High-level pbxgraph API.
//!
//! [`ProjectFile`] is the entry point for tools: open a project from disk,
//! edit its [`Document`](pbx_store::Document), write it back. The lower
//! crates are re-exported for callers that need them directly.

pub mod diff;
pub mod error;
pub mod project_file;

pub use diff::{diff_documents, diff_text, DocumentDiff, Hunk, Line, ObjectChange, TextChanges};
pub use error::{SdkError, SdkResult};
pub use project_file::{ProjectFile, BUNDLE_EXTENSION, PROJECT_FILE_NAME};

pub use pbx_codec::{
    CodecConfig, DecodeOptions, Decoder, Encoder, OutputSettings, OutputStyle,
    UnknownObjectPolicy,
};
pub use pbx_store::{Document, ObjectKind, PbxObject, Reference};
pub use pbx_types::Identifier;
