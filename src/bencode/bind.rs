//! The type binding layer: how Rust types map onto bencode tokens.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

use bytes::Bytes;

use super::decode::Decoder;
use super::encode::Encoder;
use super::error::{DecodeError, EncodeError};
use super::shape::{Shape, Token};
use super::value::{Integer, Value};

/// A type that bencode can be decoded into.
///
/// Decoding writes into an existing value, so a target can be partially
/// pre-populated: record members missing from the wire keep what they held.
///
/// # Examples
///
/// A hand-written implementation for a newtype:
///
/// ```
/// use rbencode::bencode::{decode, Decode, DecodeError, Decoder, Shape};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Port(u16);
///
/// impl Decode for Port {
///     fn shape() -> Shape {
///         Shape::Integer("port")
///     }
///
///     fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
///         self.0 = decoder.read_integer("port")?;
///         Ok(())
///     }
/// }
///
/// assert_eq!(decode::<Port>(b"i6881e").unwrap(), Port(6881));
/// assert!(decode::<Port>(b"i70000e").is_err());
/// ```
pub trait Decode {
    /// What this type accepts.
    fn shape() -> Shape
    where
        Self: Sized;

    /// Decodes the next value from `decoder` into `self`.
    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError>;

    // Sequence hooks. `u8` overrides these so byte sequences bind to byte
    // strings instead of lists.

    #[doc(hidden)]
    fn sequence_shape(capacity: Option<usize>) -> Shape
    where
        Self: Sized,
    {
        Shape::Sequence { capacity }
    }

    #[doc(hidden)]
    fn decode_vec(target: &mut Vec<Self>, decoder: &mut Decoder<'_>) -> Result<(), DecodeError>
    where
        Self: Sized + Default,
    {
        decoder.begin_list(|| Self::sequence_shape(None))?;
        target.clear();
        while decoder.next_element()? {
            let mut element = Self::default();
            element.decode_into(decoder)?;
            target.push(element);
        }
        Ok(())
    }

    #[doc(hidden)]
    fn decode_array(target: &mut [Self], decoder: &mut Decoder<'_>) -> Result<(), DecodeError>
    where
        Self: Sized + Default,
    {
        let capacity = target.len();
        decoder.begin_list(|| Self::sequence_shape(Some(capacity)))?;
        let mut filled = 0;
        while decoder.next_element()? {
            // Elements past the capacity are parsed and dropped.
            let mut element = Self::default();
            element.decode_into(decoder)?;
            if let Some(slot) = target.get_mut(filled) {
                *slot = element;
            }
            filled += 1;
        }
        for slot in target.iter_mut().skip(filled) {
            *slot = Self::default();
        }
        Ok(())
    }
}

/// A type that can be encoded as bencode.
///
/// # Examples
///
/// ```
/// use rbencode::bencode::{encode, Encode, EncodeError, Encoder};
///
/// struct Port(u16);
///
/// impl Encode for Port {
///     fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
///         encoder.write_integer(self.0)
///     }
/// }
///
/// assert_eq!(encode(&Port(6881)).unwrap(), b"i6881e");
/// ```
pub trait Encode {
    /// Writes `self` as exactly one bencode value.
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError>;

    /// Returns true if the value should be left out of an enclosing dict.
    fn is_absent(&self) -> bool {
        false
    }

    /// Returns true if every value of this type encodes as a byte string,
    /// which makes the type usable as a mapping key.
    fn is_string_like() -> bool
    where
        Self: Sized,
    {
        false
    }

    #[doc(hidden)]
    fn slice_is_string_like() -> bool
    where
        Self: Sized,
    {
        false
    }

    #[doc(hidden)]
    fn encode_slice(items: &[Self], encoder: &mut Encoder<'_>) -> Result<(), EncodeError>
    where
        Self: Sized,
    {
        encoder.write_list(items)
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl Decode for $ty {
                fn shape() -> Shape {
                    Shape::Integer(stringify!($ty))
                }

                fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
                    *self = decoder.read_integer(stringify!($ty))?;
                    Ok(())
                }
            }

            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
                    encoder.write_integer(*self)
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, isize, u16, u32, u64, usize);

impl Decode for u8 {
    fn shape() -> Shape {
        Shape::Integer("u8")
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        *self = decoder.read_integer("u8")?;
        Ok(())
    }

    fn sequence_shape(_capacity: Option<usize>) -> Shape {
        Shape::Binary
    }

    fn decode_vec(target: &mut Vec<Self>, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        *target = decoder.read_bytes(|| Shape::Binary)?;
        Ok(())
    }

    fn decode_array(target: &mut [Self], decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        let bytes = decoder.read_bytes(|| Shape::Binary)?;
        let copied = bytes.len().min(target.len());
        target[..copied].copy_from_slice(&bytes[..copied]);
        target[copied..].fill(0);
        Ok(())
    }
}

impl Encode for u8 {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        encoder.write_integer(*self)
    }

    fn slice_is_string_like() -> bool {
        true
    }

    fn encode_slice(items: &[Self], encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        encoder.write_bytes(items)
    }
}

impl Decode for Integer {
    fn shape() -> Shape {
        Shape::Integer("i64 or u64")
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        *self = decoder.read_integer("i64 or u64")?;
        Ok(())
    }
}

impl Encode for Integer {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        encoder.write_integer(*self)
    }
}

macro_rules! impl_unsupported {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, _encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
                    Err(EncodeError::UnsupportedType(stringify!($ty)))
                }
            }
        )*
    };
}

impl_unsupported!(f32, f64, ());

impl Decode for String {
    fn shape() -> Shape {
        Shape::Text
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        *self = decoder.read_text(Self::shape)?;
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        encoder.write_bytes(self.as_bytes())
    }

    fn is_string_like() -> bool {
        true
    }
}

impl Encode for str {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        encoder.write_bytes(self.as_bytes())
    }
}

impl Decode for Bytes {
    fn shape() -> Shape {
        Shape::Binary
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        *self = Bytes::from(decoder.read_bytes(Self::shape)?);
        Ok(())
    }
}

impl Encode for Bytes {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        encoder.write_bytes(self)
    }

    fn is_string_like() -> bool {
        true
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn shape() -> Shape {
        T::sequence_shape(None)
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        T::decode_vec(self, decoder)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        T::encode_slice(self, encoder)
    }

    fn is_string_like() -> bool {
        T::slice_is_string_like()
    }
}

impl<T: Decode + Default, const N: usize> Decode for [T; N] {
    fn shape() -> Shape {
        T::sequence_shape(Some(N))
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        T::decode_array(self, decoder)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        T::encode_slice(self, encoder)
    }

    fn is_string_like() -> bool {
        T::slice_is_string_like()
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        T::encode_slice(self, encoder)
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(Box::new(T::shape()))
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        self.get_or_insert_with(T::default).decode_into(decoder)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        match self {
            Some(value) => value.encode(encoder),
            None => Err(EncodeError::UnsupportedType("None outside a dict")),
        }
    }

    fn is_absent(&self) -> bool {
        match self {
            Some(value) => value.is_absent(),
            None => true,
        }
    }

    fn is_string_like() -> bool {
        T::is_string_like()
    }
}

impl<T: Decode> Decode for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        (**self).decode_into(decoder)
    }
}

impl<T: Decode> Decode for Rc<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        Rc::get_mut(self)
            .ok_or(DecodeError::InvalidTarget("shared Rc cannot be decoded into"))?
            .decode_into(decoder)
    }
}

impl<T: Decode> Decode for Arc<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        Arc::get_mut(self)
            .ok_or(DecodeError::InvalidTarget("shared Arc cannot be decoded into"))?
            .decode_into(decoder)
    }
}

// Pointers forward to their pointee. The unsized pointees get their own impls
// so that the key-type answer is still known for `&str` and `Box<[u8]>`.
macro_rules! impl_encode_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<T: Encode> Encode for $ptr<T> {
                fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
                    (**self).encode(encoder)
                }

                fn is_absent(&self) -> bool {
                    (**self).is_absent()
                }

                fn is_string_like() -> bool {
                    T::is_string_like()
                }
            }

            impl Encode for $ptr<str> {
                fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
                    (**self).encode(encoder)
                }

                fn is_string_like() -> bool {
                    true
                }
            }

            impl<T: Encode> Encode for $ptr<[T]> {
                fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
                    (**self).encode(encoder)
                }

                fn is_string_like() -> bool {
                    T::slice_is_string_like()
                }
            }

            impl<'d> Encode for $ptr<dyn Encode + 'd> {
                fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
                    (**self).encode(encoder)
                }

                fn is_absent(&self) -> bool {
                    (**self).is_absent()
                }
            }
        )*
    };
}

impl_encode_pointer!(Box, Rc, Arc);

impl<T: Encode> Encode for &T {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        (**self).encode(encoder)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }

    fn is_string_like() -> bool {
        T::is_string_like()
    }
}

impl Encode for &str {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        encoder.write_bytes(self.as_bytes())
    }

    fn is_string_like() -> bool {
        true
    }
}

impl<T: Encode> Encode for &[T] {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        T::encode_slice(self, encoder)
    }

    fn is_string_like() -> bool {
        T::slice_is_string_like()
    }
}

impl<'d> Encode for &(dyn Encode + 'd) {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        (**self).encode(encoder)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

fn check_key_type<K: Encode>() -> Result<(), EncodeError> {
    if K::is_string_like() {
        Ok(())
    } else {
        Err(EncodeError::UnsupportedMapKey(std::any::type_name::<K>()))
    }
}

/// Decodes dict entries into `insert`, which returns true if the key was
/// already present.
fn decode_entries<K, V>(
    decoder: &mut Decoder<'_>,
    shape: fn() -> Shape,
    mut insert: impl FnMut(K, V) -> bool,
) -> Result<(), DecodeError>
where
    K: Decode + Default,
    V: Decode + Default,
{
    let key_shape = K::shape();
    if !key_shape.is_string_like() {
        return Err(DecodeError::UnsupportedMapKey(key_shape));
    }

    decoder.begin_dict(shape)?;
    while decoder.next_entry()? {
        let position = decoder.position();
        let mut key = K::default();
        key.decode_into(decoder)?;
        let mut value = V::default();
        value.decode_into(decoder)?;
        if insert(key, value) {
            decoder.duplicate_key(position)?;
        }
    }
    Ok(())
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: Decode + Default + Ord,
    V: Decode + Default,
{
    fn shape() -> Shape {
        Shape::Mapping
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        decode_entries::<K, V>(decoder, Self::shape, |k, v| self.insert(k, v).is_some())
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Default + Eq + Hash,
    V: Decode + Default,
    S: BuildHasher + Default,
{
    fn shape() -> Shape {
        Shape::Mapping
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        decode_entries::<K, V>(decoder, Self::shape, |k, v| self.insert(k, v).is_some())
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        check_key_type::<K>()?;
        encoder.write_dict(self)
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        check_key_type::<K>()?;
        encoder.write_dict(self)
    }
}

impl Decode for Value {
    fn shape() -> Shape {
        Shape::Any
    }

    fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        *self = match decoder.peek_token()? {
            Token::Integer => Value::Integer(decoder.read_integer("i64 or u64")?),
            Token::ByteString => Value::Bytes(Bytes::from(decoder.read_bytes(Self::shape)?)),
            Token::List => {
                decoder.begin_list(Self::shape)?;
                let mut list = Vec::new();
                while decoder.next_element()? {
                    let mut element = Value::default();
                    element.decode_into(decoder)?;
                    list.push(element);
                }
                Value::List(list)
            }
            Token::Dict => {
                let mut dict = BTreeMap::new();
                decode_entries(decoder, Self::shape, |k: Bytes, v: Value| {
                    dict.insert(k, v).is_some()
                })?;
                Value::Dict(dict)
            }
        };
        Ok(())
    }
}

impl Encode for Value {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
        match self {
            Value::Integer(n) => encoder.write_integer(*n),
            Value::Bytes(b) => encoder.write_bytes(b),
            Value::List(l) => encoder.write_list(l),
            Value::Dict(d) => encoder.write_dict(d),
        }
    }
}
