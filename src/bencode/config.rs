use crate::constants::DEFAULT_MAX_DEPTH;

/// What to do when a dict repeats a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeys {
    /// The later value replaces the earlier one.
    #[default]
    Overwrite,
    /// Fail with [`DecodeError::DuplicateKey`](super::DecodeError::DuplicateKey).
    Reject,
}

/// Decoder settings.
///
/// The default is permissive: trailing bytes after the top-level value are
/// left unread and duplicate keys overwrite. [`DecoderConfig::strict`]
/// rejects both.
///
/// # Examples
///
/// ```
/// use rbencode::bencode::{decode_with_config, DecoderConfig, Value};
///
/// let config = DecoderConfig::default().max_depth(2);
/// assert!(decode_with_config::<Value>(b"llee", &config).is_ok());
/// assert!(decode_with_config::<Value>(b"llleee", &config).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    max_depth: usize,
    reject_trailing_data: bool,
    duplicate_keys: DuplicateKeys,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            reject_trailing_data: false,
            duplicate_keys: DuplicateKeys::Overwrite,
        }
    }
}

impl DecoderConfig {
    /// Rejects trailing data and duplicate keys.
    pub fn strict() -> Self {
        Self::default()
            .reject_trailing_data(true)
            .duplicate_keys(DuplicateKeys::Reject)
    }

    /// Sets the maximum list/dict nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets whether bytes after the top-level value are an error.
    pub fn reject_trailing_data(mut self, reject: bool) -> Self {
        self.reject_trailing_data = reject;
        self
    }

    /// Sets the duplicate key policy.
    pub fn duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Returns the maximum nesting depth.
    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }

    /// Returns true if bytes after the top-level value are an error.
    pub fn rejects_trailing_data(&self) -> bool {
        self.reject_trailing_data
    }

    /// Returns the duplicate key policy.
    pub fn duplicate_key_policy(&self) -> DuplicateKeys {
        self.duplicate_keys
    }
}
