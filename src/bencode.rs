//! Bencode ([BEP-3]) decoder, canonical encoder and type bindings.
//!
//! Torrent metainfo, tracker announces and DHT messages are all bencoded.
//! The format has exactly four kinds of token, each selected by its first
//! byte:
//!
//! | Token | Wire form | Sample | Meaning |
//! |-------|-----------|--------|---------|
//! | integer | `i` digits `e` | `i-3e` | -3 |
//! | byte string | length `:` bytes | `5:seeds` | "seeds" |
//! | list | `l` values `e` | `li1ei2ee` | [1, 2] |
//! | dict | `d` (key value)* `e` | `d1:ki0ee` | {"k": 0} |
//!
//! # Targets
//!
//! Decoding is driven by the target type through the [`Decode`] trait, and
//! encoding by the source type through [`Encode`]:
//!
//! - [`Value`] accepts anything and keeps the full tree.
//! - Integers bind to `i8`..`u64`/`isize`/`usize`, range-checked.
//! - Byte strings bind to `String` (UTF-8), `Vec<u8>`, `[u8; N]` and `Bytes`.
//! - Lists bind to `Vec<T>` (growable) and `[T; N]` (fixed; extra elements are
//!   parsed and dropped, missing ones reset to the default).
//! - Dicts bind to `BTreeMap`/`HashMap` with string-like keys and to records
//!   declared with [`bencode_record!`](crate::bencode_record).
//! - `Option<T>`, `Box<T>` and uniquely owned `Rc<T>`/`Arc<T>` are unwrapped,
//!   with `None` filled in on demand.
//!
//! Dict keys are always written in ascending byte order, so any logical value
//! has exactly one encoding.
//!
//! # Examples
//!
//! ## Decoding without a schema
//!
//! ```
//! use rbencode::bencode::{decode, Value};
//!
//! let value: Value = decode(b"d3:foo3:bar5:pizza4:coole").unwrap();
//! assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
//!
//! let big: Value = decode(b"i18446744073709551615e").unwrap();
//! assert_eq!(big.as_u64(), Some(u64::MAX));
//! ```
//!
//! ## Records
//!
//! ```
//! use rbencode::bencode::{decode, encode};
//! use rbencode::bencode_record;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Announce {
//!     interval: u32,
//!     tracker_id: Option<String>,
//!     peers: Vec<u8>,
//! }
//!
//! bencode_record!(Announce {
//!     interval,
//!     tracker_id => "tracker id",
//!     peers,
//! });
//!
//! let response = b"d8:intervali1800e5:peers6:\x7f\x00\x00\x01\x1a\xe1e";
//! let announce: Announce = decode(response).unwrap();
//! assert_eq!(announce.interval, 1800);
//! assert_eq!(announce.tracker_id, None);
//! assert_eq!(encode(&announce).unwrap(), response);
//! ```
//!
//! # Error Handling
//!
//! Decoding fails fast with a [`DecodeError`]:
//!
//! - [`DecodeError::UnexpectedEnd`] - Input ended inside a token or structure
//! - [`DecodeError::MalformedInput`] - A byte that fits no production
//! - [`DecodeError::ShapeMismatch`] - The token cannot bind to the target
//! - [`DecodeError::NumericOverflow`] - An integer too wide for the target
//! - [`DecodeError::InvalidTarget`] - The target cannot be written through
//!
//! Encoding fails with [`EncodeError::UnsupportedMapKey`] or
//! [`EncodeError::UnsupportedType`].
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod bind;
mod config;
mod decode;
mod encode;
mod error;
mod record;
mod shape;
mod value;

pub use bind::{Decode, Encode};
pub use config::{DecoderConfig, DuplicateKeys};
pub use decode::{decode, decode_from_reader, decode_into, decode_with_config, Decoder};
pub use encode::{encode, encode_to, Encoder};
pub use error::{DecodeError, EncodeError};
pub use record::{decode_record, encode_record, Binding, Field, FieldRegistry, Member, Record};
pub use shape::{Shape, Token};
pub use value::{Integer, Value};
