//! Project-file text to object graph and back.
//!
//! - [`Decoder`] parses the text, fans object construction out over a rayon
//!   pool, and reconciles the group tree once at the end.
//! - [`Encoder`] regenerates pending identifiers and writes the graph in
//!   the IDE's layout: one section per class, annotated references,
//!   deterministic ordering throughout.
//! - [`DiscriminatorRegistry`] maps `isa` strings to object constructors.
//!
//! For any graph without dangling references, `decode(encode(doc)) == doc`.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod registry;

pub use config::{CodecConfig, DecodeOptions, OutputSettings, OutputStyle, UnknownObjectPolicy};
pub use decoder::{decode, Decoder};
pub use encoder::{encode, Encoder};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use registry::{DecodeFn, DiscriminatorRegistry};
