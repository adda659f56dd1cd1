//! Error types.
//!
//! Parse failures abort decoding and carry the byte offset of the
//! offending input; access failures are recoverable and never corrupt the
//! store they were raised from.

use alloc::string::String;

use thiserror::Error;

use crate::store::ValueKind;

/// A malformed-input failure from one of the decoders.
///
/// No partial store is returned alongside a `ParseError`; the offset
/// points at the byte that triggered the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} at byte offset {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub reason: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(offset: usize, reason: ParseErrorKind) -> Self {
        Self { offset, reason }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unexpected byte 0x{0:02x}")]
    UnexpectedByte(u8),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("invalid escape sequence '\\{}'", *.0 as char)]
    InvalidEscape(u8),
    #[error("invalid unicode escape sequence")]
    InvalidUnicodeEscape,
    #[error("object key must be a string")]
    ExpectedObjectKey,
    #[error("trailing bytes after value")]
    TrailingBytes,
    #[error("nesting deeper than {0} levels")]
    DepthLimitExceeded(usize),
    #[error("unknown format byte 0x{0:02x}")]
    UnknownFormatByte(u8),
    #[error("payload truncated")]
    TruncatedPayload,
}

/// A recoverable failure from navigation, typed access or path
/// resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("key not found: {0:?}")]
    NotFound(String),
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("number out of range for requested type")]
    NumberOutOfRange,
    #[error("invalid path segment {0:?}")]
    InvalidPath(String),
}

/// Failure from a pointer-path mutation, which can fail either while
/// resolving the path or while decoding the replacement bytes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
