use thiserror::Error;

/// Errors from tokenizing property-list text.
///
/// Positions are 1-based.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlistError {
    #[error("unexpected end of input at line {line}, column {column}")]
    UnexpectedEof { line: usize, column: usize },

    #[error("unexpected character {found:?} at line {line}, column {column}: expected {expected}")]
    UnexpectedChar {
        found: char,
        expected: &'static str,
        line: usize,
        column: usize,
    },

    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("unterminated comment starting at line {line}, column {column}")]
    UnterminatedComment { line: usize, column: usize },

    #[error("invalid escape sequence at line {line}, column {column}: {reason}")]
    InvalidEscape {
        reason: String,
        line: usize,
        column: usize,
    },

    #[error("invalid data literal at line {line}, column {column}: {reason}")]
    InvalidData {
        reason: String,
        line: usize,
        column: usize,
    },

    #[error("duplicate dictionary key {key:?} at line {line}")]
    DuplicateKey { key: String, line: usize },

    #[error("trailing content after top-level value at line {line}, column {column}")]
    TrailingContent { line: usize, column: usize },
}

pub type PlistResult<T> = Result<T, PlistError>;
