use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The destination exists and overwriting was not requested.
    #[error("refusing to overwrite existing file {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("decode error: {0}")]
    Decode(#[from] pbx_codec::DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] pbx_codec::EncodeError),

    #[error("store error: {0}")]
    Store(#[from] pbx_store::StoreError),
}

pub type SdkResult<T> = Result<T, SdkError>;
