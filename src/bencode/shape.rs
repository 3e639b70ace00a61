use std::fmt;

/// The structural kind of a token on the wire, selected by its leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// `i<digits>e`
    Integer,
    /// `<length>:<bytes>`
    ByteString,
    /// `l<values>e`
    List,
    /// `d<key><value>...e`
    Dict,
}

impl Token {
    /// Maps a leading byte to the production it starts.
    pub fn from_lead(byte: u8) -> Option<Self> {
        match byte {
            b'i' => Some(Token::Integer),
            b'0'..=b'9' => Some(Token::ByteString),
            b'l' => Some(Token::List),
            b'd' => Some(Token::Dict),
            _ => None,
        }
    }

    /// Lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Token::Integer => "integer",
            Token::ByteString => "byte string",
            Token::List => "list",
            Token::Dict => "dict",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a decode target (or encode source) can hold.
///
/// Every [`Decode`](super::Decode) implementation reports its shape so that
/// mismatches can name both sides, and so that mapping key types can be
/// vetted before any input is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Accepts any token; produces a [`Value`](super::Value) tree.
    Any,
    /// A sized integer, named by its Rust type.
    Integer(&'static str),
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Binary,
    /// A list target. `capacity` is `Some` for fixed-size arrays.
    Sequence { capacity: Option<usize> },
    /// A key/value map with string-like keys.
    Mapping,
    /// A record bound through its field registry.
    Record(&'static str),
    /// A wrapper allocated on demand around the inner shape.
    Optional(Box<Shape>),
}

impl Shape {
    /// Returns true if values of this shape can serve as dict keys.
    pub fn is_string_like(&self) -> bool {
        match self {
            Shape::Text | Shape::Binary => true,
            Shape::Optional(inner) => inner.is_string_like(),
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => f.write_str("any value"),
            Shape::Integer(ty) => write!(f, "integer ({ty})"),
            Shape::Text => f.write_str("text"),
            Shape::Binary => f.write_str("byte string"),
            Shape::Sequence { capacity: None } => f.write_str("sequence"),
            Shape::Sequence { capacity: Some(n) } => write!(f, "array of {n}"),
            Shape::Mapping => f.write_str("mapping"),
            Shape::Record(name) => write!(f, "record {name}"),
            Shape::Optional(inner) => write!(f, "optional {inner}"),
        }
    }
}
