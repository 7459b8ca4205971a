// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value kind classification and the convertibility table.

use alloc::string::String;
use core::any::TypeId;

use crate::decimal::Decimal;
use crate::timestamp::Timestamp;

/// The kinds of values the built-in converter understands.
///
/// Each kind corresponds to one Rust type; [`ValueKind::of`] classifies a
/// type and [`ValueKind::from_type_id`] classifies an erased one. Types
/// outside this set are opaque to the built-in converter and can only be
/// handled by explicitly registered converters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`String`].
    Text,
    /// [`bool`].
    Bool,
    /// [`u8`].
    Byte,
    /// [`i16`].
    I16,
    /// [`u16`].
    U16,
    /// [`i32`].
    I32,
    /// [`u32`].
    U32,
    /// [`i64`].
    I64,
    /// [`u64`].
    U64,
    /// [`f32`].
    F32,
    /// [`f64`].
    F64,
    /// [`Decimal`].
    Decimal,
    /// [`char`].
    Char,
    /// [`Timestamp`].
    DateTime,
}

impl ValueKind {
    /// Classifies a Rust type.
    #[must_use]
    pub fn of<T: 'static>() -> Option<Self> {
        Self::from_type_id(TypeId::of::<T>())
    }

    /// Classifies an erased type.
    #[must_use]
    pub fn from_type_id(id: TypeId) -> Option<Self> {
        if id == TypeId::of::<String>() {
            Some(Self::Text)
        } else if id == TypeId::of::<bool>() {
            Some(Self::Bool)
        } else if id == TypeId::of::<u8>() {
            Some(Self::Byte)
        } else if id == TypeId::of::<i16>() {
            Some(Self::I16)
        } else if id == TypeId::of::<u16>() {
            Some(Self::U16)
        } else if id == TypeId::of::<i32>() {
            Some(Self::I32)
        } else if id == TypeId::of::<u32>() {
            Some(Self::U32)
        } else if id == TypeId::of::<i64>() {
            Some(Self::I64)
        } else if id == TypeId::of::<u64>() {
            Some(Self::U64)
        } else if id == TypeId::of::<f32>() {
            Some(Self::F32)
        } else if id == TypeId::of::<f64>() {
            Some(Self::F64)
        } else if id == TypeId::of::<Decimal>() {
            Some(Self::Decimal)
        } else if id == TypeId::of::<char>() {
            Some(Self::Char)
        } else if id == TypeId::of::<Timestamp>() {
            Some(Self::DateTime)
        } else {
            None
        }
    }

    /// Returns the [`TypeId`] of the Rust type this kind stands for.
    #[must_use]
    pub fn type_id(self) -> TypeId {
        match self {
            Self::Text => TypeId::of::<String>(),
            Self::Bool => TypeId::of::<bool>(),
            Self::Byte => TypeId::of::<u8>(),
            Self::I16 => TypeId::of::<i16>(),
            Self::U16 => TypeId::of::<u16>(),
            Self::I32 => TypeId::of::<i32>(),
            Self::U32 => TypeId::of::<u32>(),
            Self::I64 => TypeId::of::<i64>(),
            Self::U64 => TypeId::of::<u64>(),
            Self::F32 => TypeId::of::<f32>(),
            Self::F64 => TypeId::of::<f64>(),
            Self::Decimal => TypeId::of::<Decimal>(),
            Self::Char => TypeId::of::<char>(),
            Self::DateTime => TypeId::of::<Timestamp>(),
        }
    }

    /// Returns `true` for the integer kinds (signed and unsigned,
    /// including [`Byte`](Self::Byte)).
    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::I16 | Self::U16 | Self::I32 | Self::U32 | Self::I64 | Self::U64
        )
    }

    /// Returns `true` for the numeric kinds: integers, floats, and
    /// [`Decimal`](Self::Decimal).
    #[must_use]
    pub fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, Self::F32 | Self::F64 | Self::Decimal)
    }
}

/// Whether the built-in converter can convert between two kinds.
///
/// The relation is symmetric. The numeric kinds, `Bool`, and `Text` are
/// mutually convertible. `DateTime` only converts to and from `Text`.
/// `Char` converts to and from `Text` and the integer kinds, but never to
/// floats, `Decimal`, or `Bool`. Conversion between convertible kinds can
/// still fail at runtime for a particular value (parse failure, overflow).
#[must_use]
pub fn convertible(a: ValueKind, b: ValueKind) -> bool {
    use ValueKind::{Char, DateTime, Text};
    if a == b {
        return true;
    }
    match (a, b) {
        (DateTime, other) | (other, DateTime) => other == Text,
        (Char, other) | (other, Char) => other == Text || other.is_integer(),
        // What remains is the numeric/bool/text family, which is closed
        // under conversion.
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    const ALL: [ValueKind; 14] = [
        ValueKind::Text,
        ValueKind::Bool,
        ValueKind::Byte,
        ValueKind::I16,
        ValueKind::U16,
        ValueKind::I32,
        ValueKind::U32,
        ValueKind::I64,
        ValueKind::U64,
        ValueKind::F32,
        ValueKind::F64,
        ValueKind::Decimal,
        ValueKind::Char,
        ValueKind::DateTime,
    ];

    #[test]
    fn classification_round_trips() {
        for kind in ALL {
            assert_eq!(ValueKind::from_type_id(kind.type_id()), Some(kind));
        }
        assert_eq!(ValueKind::of::<i32>(), Some(ValueKind::I32));
        assert_eq!(ValueKind::of::<String>(), Some(ValueKind::Text));
        assert_eq!(ValueKind::of::<Vec<u8>>(), None);
    }

    #[test]
    fn convertibility_is_symmetric() {
        for a in ALL {
            for b in ALL {
                assert_eq!(convertible(a, b), convertible(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn numeric_family_is_closed() {
        for a in ALL {
            for b in ALL {
                if (a.is_numeric() || a == ValueKind::Bool || a == ValueKind::Text)
                    && (b.is_numeric() || b == ValueKind::Bool || b == ValueKind::Text)
                {
                    assert!(convertible(a, b), "{a:?} vs {b:?}");
                }
            }
        }
    }

    #[test]
    fn datetime_only_converts_with_text() {
        for other in ALL {
            let expected = other == ValueKind::Text || other == ValueKind::DateTime;
            assert_eq!(convertible(ValueKind::DateTime, other), expected, "{other:?}");
        }
    }

    #[test]
    fn char_converts_with_text_and_integers_only() {
        assert!(convertible(ValueKind::Char, ValueKind::Text));
        assert!(convertible(ValueKind::Char, ValueKind::I32));
        assert!(convertible(ValueKind::Char, ValueKind::Byte));
        assert!(convertible(ValueKind::Char, ValueKind::U64));
        assert!(!convertible(ValueKind::Char, ValueKind::F64));
        assert!(!convertible(ValueKind::Char, ValueKind::F32));
        assert!(!convertible(ValueKind::Char, ValueKind::Decimal));
        assert!(!convertible(ValueKind::Char, ValueKind::Bool));
        assert!(!convertible(ValueKind::Char, ValueKind::DateTime));
    }
}
