use std::io::Write;

use tracing::trace;

use super::bind::Encode;
use super::error::EncodeError;
use super::shape::Token;
use super::value::Integer;

/// Encodes a value to a byte vector.
///
/// The output follows the canonical bencode format:
/// - Integers: `i<number>e`
/// - Byte strings: `<length>:<data>`
/// - Lists: `l<items>e`
/// - Dictionaries: `d<key><value>...e` (keys sorted byte-wise)
///
/// # Errors
///
/// Returns [`EncodeError::UnsupportedMapKey`] for a map whose keys are not
/// byte strings and [`EncodeError::UnsupportedType`] for values with no
/// bencode form.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use rbencode::bencode::encode;
///
/// assert_eq!(encode(&123).unwrap(), b"i123e");
/// assert_eq!(encode("spam").unwrap(), b"4:spam");
/// assert_eq!(encode(&vec![1, 2]).unwrap(), b"li1ei2ee");
///
/// let mut dict = HashMap::new();
/// dict.insert("foo", 1);
/// dict.insert("bar", 2);
/// assert_eq!(encode(&dict).unwrap(), b"d3:bari2e3:fooi1ee");
/// ```
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    encode_to(&mut buf, value)?;
    Ok(buf)
}

/// Encodes a value into a writer.
pub fn encode_to<W: Write, T: Encode + ?Sized>(writer: &mut W, value: &T) -> Result<(), EncodeError> {
    trace!(ty = std::any::type_name::<T>(), "encoding bencode");
    let mut encoder = Encoder::new(writer);
    value.encode(&mut encoder)
}

/// A writer of canonical bencode tokens.
///
/// [`Encode`] implementations call one of the `write_*` methods per value.
/// Dict entries are sorted by key before they are written, whatever order
/// they are supplied in.
pub struct Encoder<'w> {
    writer: &'w mut dyn Write,
    // Set while capturing a dict key: only byte strings are allowed and they
    // are written without their length prefix.
    key_only: bool,
}

impl<'w> Encoder<'w> {
    /// Creates an encoder writing into `writer`.
    pub fn new(writer: &'w mut dyn Write) -> Self {
        Self {
            writer,
            key_only: false,
        }
    }

    /// Encodes `value` as the next token.
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.encode(self)
    }

    /// Writes an integer token in canonical decimal form.
    pub fn write_integer(&mut self, n: impl Into<Integer>) -> Result<(), EncodeError> {
        self.check_key(Token::Integer)?;
        write!(self.writer, "i{}e", n.into())?;
        Ok(())
    }

    /// Writes a byte-string token.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        if !self.key_only {
            write!(self.writer, "{}:", bytes.len())?;
        }
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Writes a list token containing `items` in order.
    pub fn write_list<'a, T, I>(&mut self, items: I) -> Result<(), EncodeError>
    where
        T: Encode + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.check_key(Token::List)?;
        self.writer.write_all(b"l")?;
        for item in items {
            item.encode(self)?;
        }
        self.writer.write_all(b"e")?;
        Ok(())
    }

    /// Writes a dict token.
    ///
    /// Keys must encode as byte strings. Entries are sorted ascending by key
    /// bytes, and entries whose value [is absent](Encode::is_absent) are left
    /// out.
    pub fn write_dict<'a, K, V, I>(&mut self, entries: I) -> Result<(), EncodeError>
    where
        K: Encode + ?Sized + 'a,
        V: Encode + ?Sized + 'a,
        I: IntoIterator<Item = (&'a K, &'a V)>,
    {
        self.check_key(Token::Dict)?;

        let mut sorted = Vec::new();
        for (key, value) in entries {
            if value.is_absent() {
                continue;
            }
            sorted.push((key_bytes(key)?, value));
        }
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        self.writer.write_all(b"d")?;
        for (key, value) in sorted {
            self.write_bytes(&key)?;
            value.encode(self)?;
        }
        self.writer.write_all(b"e")?;
        Ok(())
    }

    fn check_key(&self, found: Token) -> Result<(), EncodeError> {
        if self.key_only {
            return Err(EncodeError::UnsupportedMapKey(found.name()));
        }
        Ok(())
    }
}

/// Captures the raw bytes a dict key encodes to.
fn key_bytes<K: Encode + ?Sized>(key: &K) -> Result<Vec<u8>, EncodeError> {
    let mut raw = Vec::new();
    let mut encoder = Encoder {
        writer: &mut raw,
        key_only: true,
    };
    key.encode(&mut encoder)?;
    Ok(raw)
}
