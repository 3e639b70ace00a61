//! rbencode - Bencode for BitTorrent
//!
//! This library encodes and decodes the Bencode format (BEP-3) used by
//! `.torrent` files, tracker responses and the DHT. Values can be decoded into
//! a schema-less [`Value`] tree or straight into typed targets: integers,
//! strings, byte buffers, sequences, maps and records declared with
//! [`bencode_record!`].
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 Bencode decoder, canonical encoder and type bindings
//! - [`constants`] - Decoder limits

pub mod bencode;
pub mod constants;

pub use bencode::{
    decode, decode_from_reader, decode_into, decode_with_config, encode, encode_to, Decode,
    DecodeError, Decoder, DecoderConfig, Encode, EncodeError, Encoder, Value,
};
