//! Records: structs bound to dicts member by member.
//!
//! A record's [`FieldRegistry`] maps wire keys to member slots. It is derived
//! from the record's [`Member`] list (declared name plus optional rename or
//! skip) the first time it is needed, and reused afterwards.

use tracing::{debug, warn};

use super::bind::{Decode, Encode};
use super::decode::Decoder;
use super::encode::Encoder;
use super::error::{DecodeError, EncodeError};
use super::shape::Shape;

/// How a record member binds to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Bound under the member's declared name.
    Name,
    /// Bound under an explicit wire key.
    Rename(&'static str),
    /// Never bound, in either direction.
    Skip,
}

/// A declared record member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    /// The member's name in the Rust struct.
    pub name: &'static str,
    /// How the member binds.
    pub binding: Binding,
}

impl Member {
    /// Returns the wire key this member binds to, or `None` if skipped.
    pub fn wire_key(&self) -> Option<&'static str> {
        match self.binding {
            Binding::Name => Some(self.name),
            Binding::Rename(key) => Some(key),
            Binding::Skip => None,
        }
    }
}

/// One bound member: its wire key and its slot in the member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    key: &'static str,
    slot: usize,
}

impl Field {
    /// The wire key.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// The member's index in [`Record::members`].
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// The wire keys of one record type, sorted ascending by key bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRegistry {
    record: &'static str,
    fields: Vec<Field>,
}

impl FieldRegistry {
    /// Builds the registry for `record` from its declared members.
    ///
    /// Skipped members are left out. If two members bind the same key the
    /// first declared one keeps it.
    pub fn build(record: &'static str, members: &[Member]) -> Self {
        let mut fields: Vec<Field> = Vec::with_capacity(members.len());
        for (slot, member) in members.iter().enumerate() {
            let Some(key) = member.wire_key() else {
                continue;
            };
            if let Some(existing) = fields.iter().find(|f| f.key == key) {
                warn!(
                    record,
                    key,
                    kept = members[existing.slot].name,
                    dropped = member.name,
                    "two record members bind the same wire key"
                );
                continue;
            }
            fields.push(Field { key, slot });
        }
        fields.sort_by(|a, b| a.key.as_bytes().cmp(b.key.as_bytes()));
        Self { record, fields }
    }

    /// Returns the slot bound to `key`, if any.
    pub fn lookup(&self, key: &[u8]) -> Option<usize> {
        self.fields
            .binary_search_by(|f| f.key.as_bytes().cmp(key))
            .ok()
            .map(|i| self.fields[i].slot)
    }

    /// The bound fields in canonical (ascending key) order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The record type's name.
    pub fn record(&self) -> &'static str {
        self.record
    }

    /// Number of bound fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no member is bound.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A struct whose members bind to dict keys.
///
/// Implement it with [`bencode_record!`](crate::bencode_record), which also
/// implements [`Decode`] and [`Encode`] for the type.
pub trait Record {
    /// The record's type name.
    const NAME: &'static str;

    /// Declared members, in declaration order. Slots index this list.
    fn members() -> &'static [Member];

    /// The memoized field registry.
    fn registry() -> &'static FieldRegistry;

    /// The member at `slot`, or `None` for skipped members.
    fn member(&self, slot: usize) -> Option<&dyn Encode>;

    /// The member at `slot` for decoding, or `None` for skipped members.
    fn member_mut(&mut self, slot: usize) -> Option<&mut dyn Decode>;
}

/// Decodes a dict into a record.
///
/// Keys found in the registry decode into their member. Other keys have their
/// value parsed and discarded.
pub fn decode_record<T: Record>(record: &mut T, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
    decoder.begin_dict(|| Shape::Record(T::NAME))?;
    let registry = T::registry();
    let mut seen = vec![false; T::members().len()];

    loop {
        let position = decoder.position();
        let Some(key) = decoder.next_key()? else {
            break;
        };

        let Some(slot) = registry.lookup(&key) else {
            debug!(
                record = T::NAME,
                key = %String::from_utf8_lossy(&key),
                "skipping unknown dict key"
            );
            decoder.skip_value()?;
            continue;
        };

        if let Some(flag) = seen.get_mut(slot) {
            if std::mem::replace(flag, true) {
                decoder.duplicate_key(position)?;
            }
        }

        record
            .member_mut(slot)
            .ok_or(DecodeError::InvalidTarget("record member is not bound"))?
            .decode_into(decoder)?;
    }
    Ok(())
}

/// Encodes a record as a dict in registry order.
pub fn encode_record<T: Record>(record: &T, encoder: &mut Encoder<'_>) -> Result<(), EncodeError> {
    let registry = T::registry();
    let mut entries: Vec<(&[u8], &dyn Encode)> = Vec::with_capacity(registry.len());
    for field in registry.fields() {
        let value = record
            .member(field.slot())
            .ok_or(EncodeError::UnsupportedType(T::NAME))?;
        entries.push((field.key().as_bytes(), value));
    }
    encoder.write_dict(entries)
}

/// Binds a struct's members to dict keys.
///
/// Each member is listed by name. `member => "wire key"` binds it under a
/// different key and `member => skip` excludes it in both directions (the
/// member's type then needs no bencode support). Members that are not listed
/// are not bound either. Records need `Default` to appear inside sequences
/// and options.
///
/// # Examples
///
/// ```
/// use rbencode::bencode::{decode, encode};
/// use rbencode::bencode_record;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct FileEntry {
///     length: u64,
///     path: Vec<String>,
///     md5: Option<String>,
///     cached_hash: Option<std::time::Instant>,
/// }
///
/// bencode_record!(FileEntry {
///     length,
///     path,
///     md5 => "md5sum",
///     cached_hash => skip,
/// });
///
/// let entry = FileEntry {
///     length: 7,
///     path: vec!["dir".into(), "a.txt".into()],
///     ..Default::default()
/// };
/// let bytes = encode(&entry).unwrap();
/// assert_eq!(bytes, b"d6:lengthi7e4:pathl3:dir5:a.txtee");
/// assert_eq!(decode::<FileEntry>(&bytes).unwrap(), entry);
/// ```
#[macro_export]
macro_rules! bencode_record {
    (@binding) => {
        $crate::bencode::Binding::Name
    };
    (@binding skip) => {
        $crate::bencode::Binding::Skip
    };
    (@binding $key:literal) => {
        $crate::bencode::Binding::Rename($key)
    };

    (@decode ($($place:tt)*) skip) => {
        ::core::option::Option::None
    };
    (@decode ($($place:tt)*) $($key:literal)?) => {
        ::core::option::Option::Some($($place)* as &mut dyn $crate::bencode::Decode)
    };

    (@encode ($($place:tt)*) skip) => {
        ::core::option::Option::None
    };
    (@encode ($($place:tt)*) $($key:literal)?) => {
        ::core::option::Option::Some($($place)* as &dyn $crate::bencode::Encode)
    };

    (@count) => { 0usize };
    (@count $head:ident $($tail:ident)*) => {
        1usize + $crate::bencode_record!(@count $($tail)*)
    };

    // Expands to an if/else chain selecting the member at `$slot`. `$seen`
    // holds the members already passed, so its count is the current slot.
    (@pick $mode:ident $slot:ident ($($base:tt)*) [$($seen:ident)*]) => {
        ::core::option::Option::None
    };
    (@pick $mode:ident $slot:ident ($($base:tt)*) [$($seen:ident)*]
        $member:ident $(=> $binding:tt)? $(, $($rest:tt)*)?) => {
        if $slot == $crate::bencode_record!(@count $($seen)*) {
            $crate::bencode_record!(@$mode ($($base)*.$member) $($binding)?)
        } else {
            $crate::bencode_record!(
                @pick $mode $slot ($($base)*) [$($seen)* $member] $($($rest)*)?
            )
        }
    };

    ($record:ident { $($member:ident $(=> $binding:tt)?),* $(,)? }) => {
        impl $crate::bencode::Record for $record {
            const NAME: &'static str = ::core::stringify!($record);

            fn members() -> &'static [$crate::bencode::Member] {
                const MEMBERS: &[$crate::bencode::Member] = &[
                    $(
                        $crate::bencode::Member {
                            name: ::core::stringify!($member),
                            binding: $crate::bencode_record!(@binding $($binding)?),
                        }
                    ),*
                ];
                MEMBERS
            }

            fn registry() -> &'static $crate::bencode::FieldRegistry {
                static REGISTRY: ::std::sync::OnceLock<$crate::bencode::FieldRegistry> =
                    ::std::sync::OnceLock::new();
                REGISTRY.get_or_init(|| {
                    $crate::bencode::FieldRegistry::build(
                        <Self as $crate::bencode::Record>::NAME,
                        <Self as $crate::bencode::Record>::members(),
                    )
                })
            }

            fn member(&self, slot: usize) -> ::core::option::Option<&dyn $crate::bencode::Encode> {
                $crate::bencode_record!(
                    @pick encode slot (&self) [] $($member $(=> $binding)?),*
                )
            }

            fn member_mut(
                &mut self,
                slot: usize,
            ) -> ::core::option::Option<&mut dyn $crate::bencode::Decode> {
                $crate::bencode_record!(
                    @pick decode slot (&mut self) [] $($member $(=> $binding)?),*
                )
            }
        }

        impl $crate::bencode::Decode for $record {
            fn shape() -> $crate::bencode::Shape {
                $crate::bencode::Shape::Record(<Self as $crate::bencode::Record>::NAME)
            }

            fn decode_into(
                &mut self,
                decoder: &mut $crate::bencode::Decoder<'_>,
            ) -> ::core::result::Result<(), $crate::bencode::DecodeError> {
                $crate::bencode::decode_record(self, decoder)
            }
        }

        impl $crate::bencode::Encode for $record {
            fn encode(
                &self,
                encoder: &mut $crate::bencode::Encoder<'_>,
            ) -> ::core::result::Result<(), $crate::bencode::EncodeError> {
                $crate::bencode::encode_record(self, encoder)
            }
        }
    };
}
