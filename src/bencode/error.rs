use std::string::FromUtf8Error;

use thiserror::Error;

use super::shape::{Shape, Token};

/// Errors produced while decoding bencode into a target.
///
/// Any error aborts the whole call. Members of the target that were already
/// populated are left as they were; the target should not be trusted.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The target cannot be written through (for example a shared `Arc`).
    #[error("invalid decode target: {0}")]
    InvalidTarget(&'static str),

    /// A byte that does not fit the grammar.
    #[error("malformed input at byte {position}: {reason}")]
    MalformedInput {
        /// Offset of the offending byte.
        position: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Input ran out inside a token or before a closing `e`.
    #[error("unexpected end of input at byte {position} while reading {context}")]
    UnexpectedEnd {
        /// Offset at which input ran out.
        position: usize,
        /// The construct being read.
        context: &'static str,
    },

    /// An integer literal does not fit the target's width.
    #[error("integer {literal} overflows {target}")]
    NumericOverflow {
        /// The literal as it appeared on the wire.
        literal: String,
        /// The target type.
        target: &'static str,
    },

    /// The token on the wire cannot bind to the target shape.
    #[error("cannot decode {found} into {expected} at byte {position}")]
    ShapeMismatch {
        /// Offset of the token.
        position: usize,
        /// The token kind found.
        found: Token,
        /// The shape the target accepts.
        expected: Shape,
    },

    /// A mapping target whose key type is not string-like.
    #[error("unsupported map key type: {0}")]
    UnsupportedMapKey(Shape),

    /// A byte string bound to text was not UTF-8.
    #[error("invalid utf-8 in byte string at byte {position}")]
    InvalidUtf8 {
        /// Offset of the byte string's payload.
        position: usize,
        #[source]
        source: FromUtf8Error,
    },

    /// A dict repeated a key while duplicates are rejected.
    #[error("duplicate dict key at byte {position}")]
    DuplicateKey {
        /// Offset of the repeated key.
        position: usize,
    },

    /// Lists and dicts nested deeper than the configured limit.
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    /// Bytes remain after the top-level value while trailing data is rejected.
    #[error("trailing data after value at byte {0}")]
    TrailingData(usize),

    /// The underlying reader failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while encoding a value.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A mapping whose key type is not string-like, or a dict key that
    /// encoded as something other than a byte string. Names the key type or
    /// the token found.
    #[error("unsupported map key: keys must be byte strings, found {0}")]
    UnsupportedMapKey(&'static str),

    /// The source value has no bencode representation.
    #[error("unsupported type: {0} has no bencode representation")]
    UnsupportedType(&'static str),

    /// The destination writer failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
