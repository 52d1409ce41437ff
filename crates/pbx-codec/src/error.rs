use pbx_plist::PlistError;
use pbx_store::StoreError;
use pbx_types::Identifier;

/// Errors from turning project-file text into a [`Document`](pbx_store::Document).
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The input is not UTF-8.
    #[error("project file is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The text does not parse as a property list.
    #[error("syntax error: {0}")]
    Syntax(#[from] PlistError),

    /// The top-level value is not a dictionary.
    #[error("top level of a project file must be a dictionary, found {0}")]
    NotADictionary(&'static str),

    #[error("missing top-level key `{0}`")]
    MissingKey(&'static str),

    #[error("malformed top-level key `{key}`: {reason}")]
    MalformedKey { key: &'static str, reason: String },

    /// An entry of the object table is not a well-formed object.
    #[error("object {id}: {reason}")]
    MalformedObject { id: String, reason: String },

    /// The object's class is not registered and unknown classes are rejected.
    #[error("object {id}: unknown object class `{isa}`")]
    UnknownObjectType { id: Identifier, isa: String },

    #[error("could not start decoder workers: {0}")]
    Workers(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from writing a document.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Unknown objects are present and the output settings reject them.
    #[error("object {id}: unknown object class `{isa}` cannot be written with the current settings")]
    UnknownObjectType { id: Identifier, isa: String },
}

pub type DecodeResult<T> = Result<T, DecodeError>;
pub type EncodeResult<T> = Result<T, EncodeError>;
