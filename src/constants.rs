//! Decoder limits.
//!
//! These apply to every [`Decoder`](crate::bencode::Decoder) unless a
//! [`DecoderConfig`](crate::bencode::DecoderConfig) overrides them.

// ============================================================================
// Bencode decoding
// ============================================================================

/// Default maximum nesting depth of lists and dicts
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Largest buffer reserved up front for a byte string (64 KiB)
/// Longer payloads grow as bytes actually arrive
pub const MAX_PREALLOCATION: usize = 64 * 1024;
