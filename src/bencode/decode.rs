use std::io::{self, BufRead, BufReader, Read};

use tracing::{debug, trace};

use super::bind::Decode;
use super::config::{DecoderConfig, DuplicateKeys};
use super::error::DecodeError;
use super::shape::{Shape, Token};
use super::value::Value;
use crate::constants::MAX_PREALLOCATION;

/// Decodes a value of type `T` from a byte slice.
///
/// Bytes after the first complete value are ignored; use
/// [`decode_with_config`] with [`DecoderConfig::strict`] to reject them.
///
/// # Examples
///
/// ```
/// use rbencode::bencode::{decode, Value};
///
/// let value: Value = decode(b"li1e4:spame").unwrap();
/// assert_eq!(value.as_list().map(|l| l.len()), Some(2));
///
/// let numbers: Vec<u32> = decode(b"li1ei2ei3ee").unwrap();
/// assert_eq!(numbers, vec![1, 2, 3]);
/// ```
pub fn decode<T: Decode + Default>(data: &[u8]) -> Result<T, DecodeError> {
    decode_with_config(data, &DecoderConfig::default())
}

/// Decodes a value of type `T` from a byte slice using `config`.
pub fn decode_with_config<T: Decode + Default>(
    data: &[u8],
    config: &DecoderConfig,
) -> Result<T, DecodeError> {
    let mut target = T::default();
    decode_into_with_config(data, &mut target, config)?;
    Ok(target)
}

/// Decodes a byte slice into an existing target.
///
/// Dict keys with no matching record member are skipped, and members that do
/// not appear on the wire keep their current value.
///
/// `String` targets and `String` map keys require UTF-8 and fail with
/// [`DecodeError::InvalidUtf8`] otherwise. Bind payloads that may be raw
/// binary, such as info hashes or the keys of a scrape response's `files`
/// dict, to `Bytes`, `Vec<u8>` or `[u8; N]`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use rbencode::bencode::decode_into;
///
/// let mut scores: BTreeMap<String, i64> = BTreeMap::new();
/// decode_into(b"d5:alicei3e3:bobi-1ee", &mut scores).unwrap();
/// assert_eq!(scores.get("bob"), Some(&-1));
/// ```
pub fn decode_into<T: Decode + ?Sized>(data: &[u8], target: &mut T) -> Result<(), DecodeError> {
    decode_into_with_config(data, target, &DecoderConfig::default())
}

fn decode_into_with_config<T: Decode + ?Sized>(
    data: &[u8],
    target: &mut T,
    config: &DecoderConfig,
) -> Result<(), DecodeError> {
    trace!(
        len = data.len(),
        ty = std::any::type_name::<T>(),
        "decoding bencode"
    );
    let mut reader = data;
    let mut decoder = Decoder::with_config(&mut reader, config.clone());
    decoder.decode_into(target)?;
    decoder.finish()?;
    Ok(())
}

/// Decodes a value of type `T` from a reader.
///
/// The reader is buffered internally. Errors from the reader surface as
/// [`DecodeError::Io`].
pub fn decode_from_reader<T: Decode + Default, R: Read>(reader: R) -> Result<T, DecodeError> {
    let mut reader = BufReader::new(reader);
    let mut decoder = Decoder::new(&mut reader);
    let value = decoder.decode()?;
    decoder.finish()?;
    Ok(value)
}

/// A recursive-descent reader over a buffered byte source.
///
/// The decoder looks at one byte ahead to pick a production and consumes each
/// token exactly once. [`Decode`] implementations drive it through the token
/// methods below.
///
/// # Examples
///
/// ```
/// use rbencode::bencode::{Decoder, Value};
///
/// let mut input: &[u8] = b"i42e4:spam";
/// let mut decoder = Decoder::new(&mut input);
///
/// let first: Value = decoder.decode().unwrap();
/// assert_eq!(first.as_i64(), Some(42));
/// assert_eq!(decoder.position(), 4);
///
/// let second: String = decoder.decode().unwrap();
/// assert_eq!(second, "spam");
/// ```
pub struct Decoder<'r> {
    reader: &'r mut dyn BufRead,
    position: usize,
    depth: usize,
    config: DecoderConfig,
}

impl<'r> Decoder<'r> {
    /// Creates a decoder with the default configuration.
    pub fn new(reader: &'r mut dyn BufRead) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    /// Creates a decoder with the given configuration.
    pub fn with_config(reader: &'r mut dyn BufRead, config: DecoderConfig) -> Self {
        Self {
            reader,
            position: 0,
            depth: 0,
            config,
        }
    }

    /// Returns the number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Decodes the next value into a fresh `T`.
    pub fn decode<T: Decode + Default>(&mut self) -> Result<T, DecodeError> {
        let mut target = T::default();
        target.decode_into(self)?;
        Ok(target)
    }

    /// Decodes the next value into `target`.
    pub fn decode_into<T: Decode + ?Sized>(&mut self, target: &mut T) -> Result<(), DecodeError> {
        target.decode_into(self)
    }

    /// Ends decoding, checking for trailing data if the configuration asks
    /// for it. Returns the number of bytes consumed.
    pub fn finish(mut self) -> Result<usize, DecodeError> {
        if self.config.rejects_trailing_data() && self.peek_byte()?.is_some() {
            return Err(DecodeError::TrailingData(self.position));
        }
        Ok(self.position)
    }

    /// Returns the kind of the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Token, DecodeError> {
        match self.peek_byte()? {
            None => Err(self.unexpected_end("value")),
            Some(byte) => Token::from_lead(byte).ok_or_else(|| {
                self.malformed(self.position, format!("unexpected byte 0x{byte:02x}"))
            }),
        }
    }

    /// Checks that the next token is of kind `token`, reporting `shape` as
    /// the expectation otherwise.
    pub fn expect(
        &mut self,
        token: Token,
        shape: impl FnOnce() -> Shape,
    ) -> Result<(), DecodeError> {
        let found = self.peek_token()?;
        if found == token {
            Ok(())
        } else {
            Err(DecodeError::ShapeMismatch {
                position: self.position,
                found,
                expected: shape(),
            })
        }
    }

    /// Reads an integer token and converts it to `T`.
    ///
    /// `target` names `T` in overflow and mismatch errors.
    pub fn read_integer<T: TryFrom<i128>>(&mut self, target: &'static str) -> Result<T, DecodeError> {
        self.expect(Token::Integer, || Shape::Integer(target))?;
        self.bump();
        let start = self.position;
        let literal = self.read_delimited(b'e', "integer", |b| b.is_ascii_digit() || b == b'-')?;

        let parsed = parse_integer(&literal).map_err(|reason| self.malformed(start, reason))?;
        let overflow = || DecodeError::NumericOverflow {
            literal: String::from_utf8_lossy(&literal).into_owned(),
            target,
        };
        let value = parsed.ok_or_else(overflow)?;
        T::try_from(value).map_err(|_| overflow())
    }

    /// Reads a byte-string token and returns its payload.
    pub fn read_bytes(&mut self, shape: impl FnOnce() -> Shape) -> Result<Vec<u8>, DecodeError> {
        self.expect(Token::ByteString, shape)?;
        let start = self.position;
        let digits = self.read_delimited(b':', "byte string length", |b| b.is_ascii_digit())?;

        if digits.is_empty() {
            return Err(self.malformed(start, "byte string length has no digits"));
        }
        if digits.len() > 1 && digits[0] == b'0' {
            return Err(self.malformed(start, "byte string length has a leading zero"));
        }
        let len = digits
            .iter()
            .try_fold(0usize, |acc, &d| {
                acc.checked_mul(10)?.checked_add(usize::from(d - b'0'))
            })
            .ok_or_else(|| self.malformed(start, "byte string length out of range"))?;

        self.read_payload(len)
    }

    /// Reads a byte-string token that must hold UTF-8 text.
    pub fn read_text(&mut self, shape: impl FnOnce() -> Shape) -> Result<String, DecodeError> {
        let bytes = self.read_bytes(shape)?;
        String::from_utf8(bytes).map_err(|source| DecodeError::InvalidUtf8 {
            position: self.position - source.as_bytes().len(),
            source,
        })
    }

    /// Consumes the `l` opening a list.
    pub fn begin_list(&mut self, shape: impl FnOnce() -> Shape) -> Result<(), DecodeError> {
        self.enter(Token::List, shape)
    }

    /// Consumes the `d` opening a dict.
    pub fn begin_dict(&mut self, shape: impl FnOnce() -> Shape) -> Result<(), DecodeError> {
        self.enter(Token::Dict, shape)
    }

    /// Returns true if another list element follows. Consumes the closing `e`
    /// and returns false at the end of the list.
    pub fn next_element(&mut self) -> Result<bool, DecodeError> {
        self.next_in("list")
    }

    /// Returns true if another dict entry follows, leaving its key unread.
    /// Consumes the closing `e` and returns false at the end of the dict.
    pub fn next_entry(&mut self) -> Result<bool, DecodeError> {
        self.next_in("dict")
    }

    /// Reads the next dict key, or returns `None` at the end of the dict.
    ///
    /// Keys must be byte strings; any other token is a shape mismatch.
    pub fn next_key(&mut self) -> Result<Option<Vec<u8>>, DecodeError> {
        if !self.next_entry()? {
            return Ok(None);
        }
        self.read_bytes(|| Shape::Binary).map(Some)
    }

    /// Parses the next value in full and throws it away. Malformed input is
    /// still an error.
    pub fn skip_value(&mut self) -> Result<(), DecodeError> {
        let mut discard = Value::default();
        discard.decode_into(self)
    }

    /// Applies the duplicate key policy to a key that started at `position`.
    pub fn duplicate_key(&self, position: usize) -> Result<(), DecodeError> {
        match self.config.duplicate_key_policy() {
            DuplicateKeys::Overwrite => {
                debug!(position, "duplicate dict key overwrites earlier value");
                Ok(())
            }
            DuplicateKeys::Reject => Err(DecodeError::DuplicateKey { position }),
        }
    }

    fn enter(&mut self, token: Token, shape: impl FnOnce() -> Shape) -> Result<(), DecodeError> {
        self.expect(token, shape)?;
        let limit = self.config.depth_limit();
        if self.depth >= limit {
            return Err(DecodeError::NestingTooDeep(limit));
        }
        self.depth += 1;
        self.bump();
        Ok(())
    }

    fn next_in(&mut self, context: &'static str) -> Result<bool, DecodeError> {
        match self.peek_byte()? {
            None => Err(self.unexpected_end(context)),
            Some(b'e') => {
                self.bump();
                self.depth = self.depth.saturating_sub(1);
                Ok(false)
            }
            Some(_) => Ok(true),
        }
    }

    fn read_delimited(
        &mut self,
        delimiter: u8,
        context: &'static str,
        allowed: impl Fn(u8) -> bool,
    ) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();
        loop {
            match self.peek_byte()? {
                None => return Err(self.unexpected_end(context)),
                Some(byte) if byte == delimiter => {
                    self.bump();
                    return Ok(out);
                }
                Some(byte) if allowed(byte) => {
                    out.push(byte);
                    self.bump();
                }
                Some(byte) => {
                    return Err(self.malformed(
                        self.position,
                        format!("unexpected byte 0x{byte:02x} in {context}"),
                    ));
                }
            }
        }
    }

    fn read_payload(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        // Allocation follows the bytes actually read, not the declared length.
        let mut payload = Vec::with_capacity(len.min(MAX_PREALLOCATION));
        let read = Read::take(&mut *self.reader, len as u64).read_to_end(&mut payload)?;
        self.position += read;
        if read < len {
            return Err(self.unexpected_end("byte string"));
        }
        Ok(payload)
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    // Only called after peek_byte returned Some.
    fn bump(&mut self) {
        self.reader.consume(1);
        self.position += 1;
    }

    fn unexpected_end(&self, context: &'static str) -> DecodeError {
        DecodeError::UnexpectedEnd {
            position: self.position,
            context,
        }
    }

    fn malformed(&self, position: usize, reason: impl Into<String>) -> DecodeError {
        DecodeError::MalformedInput {
            position,
            reason: reason.into(),
        }
    }
}

/// Validates an integer literal (without its `i`/`e` markers) and parses it.
///
/// Returns `Ok(None)` if the literal is well formed but does not fit in
/// `i128`.
fn parse_integer(literal: &[u8]) -> Result<Option<i128>, &'static str> {
    let (negative, digits) = match literal.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, literal),
    };

    if digits.is_empty() {
        return Err("integer has no digits");
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err("integer contains a non-digit byte");
    }
    if digits.len() > 1 && digits[0] == b'0' {
        return Err("integer has a leading zero");
    }
    if negative && digits == b"0" {
        return Err("negative zero");
    }

    let magnitude = digits.iter().try_fold(0i128, |acc, &d| {
        acc.checked_mul(10)?.checked_add(i128::from(d - b'0'))
    });
    Ok(magnitude.map(|m| if negative { -m } else { m }))
}
