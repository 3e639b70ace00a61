use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;

/// A bencode integer.
///
/// The wire form has no fixed width. Values in the signed 64-bit range are
/// held as `i64`; larger non-negative values fall back to `u64`. The
/// representation is normalized, so `Integer::from(5u64) == Integer::from(5i64)`.
///
/// # Examples
///
/// ```
/// use rbencode::bencode::Integer;
///
/// let small = Integer::from(-7i64);
/// assert_eq!(small.as_i64(), Some(-7));
/// assert_eq!(small.as_u64(), None);
///
/// let big = Integer::from(u64::MAX);
/// assert!(big.is_unsigned());
/// assert_eq!(big.as_u64(), Some(u64::MAX));
/// assert_eq!(big.as_i64(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Integer(Repr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Repr {
    Signed(i64),
    // Only ever holds values above i64::MAX.
    Unsigned(u64),
}

impl Integer {
    /// Returns the value as `i64` if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self.0 {
            Repr::Signed(n) => Some(n),
            Repr::Unsigned(_) => None,
        }
    }

    /// Returns the value as `u64` if it is non-negative.
    pub fn as_u64(&self) -> Option<u64> {
        match self.0 {
            Repr::Signed(n) => u64::try_from(n).ok(),
            Repr::Unsigned(n) => Some(n),
        }
    }

    /// Returns true if the value needed the unsigned fallback.
    pub fn is_unsigned(&self) -> bool {
        matches!(self.0, Repr::Unsigned(_))
    }
}

impl Default for Integer {
    fn default() -> Self {
        Integer(Repr::Signed(0))
    }
}

impl From<i64> for Integer {
    fn from(n: i64) -> Self {
        Integer(Repr::Signed(n))
    }
}

impl From<u64> for Integer {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(signed) => Integer(Repr::Signed(signed)),
            Err(_) => Integer(Repr::Unsigned(n)),
        }
    }
}

macro_rules! impl_from_narrow {
    ($wide:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Integer {
                fn from(n: $ty) -> Self {
                    Integer::from(<$wide>::from(n))
                }
            }
        )*
    };
}

impl_from_narrow!(i64: i8, i16, i32);
impl_from_narrow!(u64: u8, u16, u32);

// isize and usize are at most 64 bits wide on every supported target.
impl From<isize> for Integer {
    fn from(n: isize) -> Self {
        Integer::from(n as i64)
    }
}

impl From<usize> for Integer {
    fn from(n: usize) -> Self {
        Integer::from(n as u64)
    }
}

impl TryFrom<i128> for Integer {
    type Error = i128;

    /// Signed range first, then the unsigned fallback. Returns the input on
    /// failure.
    fn try_from(n: i128) -> Result<Self, Self::Error> {
        if let Ok(signed) = i64::try_from(n) {
            return Ok(Integer(Repr::Signed(signed)));
        }
        u64::try_from(n)
            .map(|unsigned| Integer(Repr::Unsigned(unsigned)))
            .map_err(|_| n)
    }
}

impl From<Integer> for i128 {
    fn from(n: Integer) -> Self {
        match n.0 {
            Repr::Signed(n) => i128::from(n),
            Repr::Unsigned(n) => i128::from(n),
        }
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Repr::Signed(n) => write!(f, "{n}"),
            Repr::Unsigned(n) => write!(f, "{n}"),
        }
    }
}

/// One node of a decoded bencode tree.
///
/// This is what a schema-less decode produces. Encoding a `Value` gives the
/// canonical bytes for it, so a decoded tree re-encodes identically when the
/// input was canonical.
///
/// # Examples
///
/// ```
/// use rbencode::bencode::Value;
///
/// let tree = Value::List(vec![Value::from(7i64), Value::from("seven")]);
/// let items = tree.as_list().unwrap();
/// assert_eq!(items[0].as_i64(), Some(7));
/// assert_eq!(items[1].as_str(), Some("seven"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `i...e`
    Integer(Integer),
    /// `<len>:...`, raw and not necessarily UTF-8.
    Bytes(Bytes),
    /// `l...e`
    List(Vec<Value>),
    /// `d...e`, iterated in ascending key order.
    Dict(BTreeMap<Bytes, Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Bytes(Bytes::new())
    }
}

impl Value {
    /// Wraps the UTF-8 bytes of `text` as a byte string.
    pub fn string(text: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(text.as_bytes()))
    }

    pub fn as_integer(&self) -> Option<Integer> {
        if let Value::Integer(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// The integer, if it is one and fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|n| n.as_i64())
    }

    /// The integer, if it is one and is not negative.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(|n| n.as_u64())
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        if let Value::Bytes(raw) = self {
            Some(raw)
        } else {
            None
        }
    }

    /// The byte string as text. `None` for other variants and for payloads
    /// that are not UTF-8.
    ///
    /// ```
    /// use rbencode::bencode::Value;
    ///
    /// assert_eq!(Value::string("udp").as_str(), Some("udp"));
    /// assert_eq!(Value::Bytes(vec![0xff].into()).as_str(), None);
    /// assert_eq!(Value::from(1i64).as_str(), None);
    /// ```
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes()
            .and_then(|raw| std::str::from_utf8(raw).ok())
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        if let Value::List(items) = self {
            Some(items)
        } else {
            None
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Bytes, Value>> {
        if let Value::Dict(entries) = self {
            Some(entries)
        } else {
            None
        }
    }

    /// Takes the entries out of a dict.
    pub fn into_dict(self) -> Option<BTreeMap<Bytes, Value>> {
        if let Value::Dict(entries) = self {
            Some(entries)
        } else {
            None
        }
    }

    /// Dict lookup by raw key. `None` if this is not a dict.
    ///
    /// ```
    /// use rbencode::bencode::{decode, Value};
    ///
    /// let reply: Value = decode(b"d8:intervali900e6:peers0:e").unwrap();
    /// assert_eq!(reply.get(b"interval").and_then(Value::as_i64), Some(900));
    /// assert!(reply.get(b"min interval").is_none());
    /// ```
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict().and_then(|entries| entries.get(key))
    }
}

macro_rules! impl_from {
    ($($source:ty => |$v:ident| $build:expr),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from($v: $source) -> Self {
                    $build
                }
            }
        )*
    };
}

impl_from! {
    i64 => |n| Value::Integer(Integer::from(n)),
    u64 => |n| Value::Integer(Integer::from(n)),
    Integer => |n| Value::Integer(n),
    &str => |text| Value::string(text),
    Bytes => |raw| Value::Bytes(raw),
    Vec<Value> => |items| Value::List(items),
    BTreeMap<Bytes, Value> => |entries| Value::Dict(entries),
}
