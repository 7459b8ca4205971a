// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The built-in primitive conversion engine.
//!
//! Conversion goes through a widened intermediate: the source is
//! decomposed into a [`Scalar`], then composed into the target kind with
//! checked range and parse semantics. A conversion that is permitted by
//! the kind table can still fail for a particular value; failures are
//! `None`, never panics.

use alloc::string::{String, ToString};

use midstory_property::ErasedValue;

use crate::decimal::Decimal;
use crate::kind::{ValueKind, convertible};
use crate::timestamp::Timestamp;

/// A widened view of a primitive value.
enum Scalar {
    Signed(i128),
    Unsigned(u128),
    Float(f64),
    Decimal(Decimal),
    Bool(bool),
    Text(String),
    Char(char),
    DateTime(Timestamp),
}

fn decompose(value: &ErasedValue, kind: ValueKind) -> Option<Scalar> {
    Some(match kind {
        ValueKind::Text => Scalar::Text(value.downcast_ref::<String>()?.clone()),
        ValueKind::Bool => Scalar::Bool(*value.downcast_ref::<bool>()?),
        ValueKind::Byte => Scalar::Unsigned(u128::from(*value.downcast_ref::<u8>()?)),
        ValueKind::I16 => Scalar::Signed(i128::from(*value.downcast_ref::<i16>()?)),
        ValueKind::U16 => Scalar::Unsigned(u128::from(*value.downcast_ref::<u16>()?)),
        ValueKind::I32 => Scalar::Signed(i128::from(*value.downcast_ref::<i32>()?)),
        ValueKind::U32 => Scalar::Unsigned(u128::from(*value.downcast_ref::<u32>()?)),
        ValueKind::I64 => Scalar::Signed(i128::from(*value.downcast_ref::<i64>()?)),
        ValueKind::U64 => Scalar::Unsigned(u128::from(*value.downcast_ref::<u64>()?)),
        ValueKind::F32 => Scalar::Float(f64::from(*value.downcast_ref::<f32>()?)),
        ValueKind::F64 => Scalar::Float(*value.downcast_ref::<f64>()?),
        ValueKind::Decimal => Scalar::Decimal(*value.downcast_ref::<Decimal>()?),
        ValueKind::Char => Scalar::Char(*value.downcast_ref::<char>()?),
        ValueKind::DateTime => Scalar::DateTime(*value.downcast_ref::<Timestamp>()?),
    })
}

/// Widens the scalar to `i128`, truncating floats toward zero.
fn to_i128(scalar: &Scalar) -> Option<i128> {
    match scalar {
        Scalar::Signed(v) => Some(*v),
        Scalar::Unsigned(v) => i128::try_from(*v).ok(),
        Scalar::Float(v) => {
            if v.is_nan() {
                return None;
            }
            // The `as` cast truncates toward zero; infinities saturate and
            // are caught by the narrowing step.
            #[expect(clippy::cast_possible_truncation, reason = "truncation is the semantics")]
            let truncated = *v as i128;
            Some(truncated)
        }
        Scalar::Decimal(v) => v.trunc_i64().map(i128::from),
        Scalar::Bool(v) => Some(i128::from(*v)),
        Scalar::Text(v) => v.trim().parse().ok(),
        Scalar::Char(v) => Some(i128::from(u32::from(*v))),
        Scalar::DateTime(_) => None,
    }
}

fn to_f64(scalar: &Scalar) -> Option<f64> {
    match scalar {
        Scalar::Signed(v) => Some(*v as f64),
        Scalar::Unsigned(v) => Some(*v as f64),
        Scalar::Float(v) => Some(*v),
        Scalar::Decimal(v) => Some(v.to_f64()),
        Scalar::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
        Scalar::Text(v) => v.trim().parse().ok(),
        Scalar::Char(_) | Scalar::DateTime(_) => None,
    }
}

fn to_decimal(scalar: &Scalar) -> Option<Decimal> {
    match scalar {
        Scalar::Signed(v) => i64::try_from(*v).ok().map(Decimal::from_i64),
        Scalar::Unsigned(v) => u64::try_from(*v).ok().map(Decimal::from_u64),
        Scalar::Float(v) => Decimal::from_f64(*v),
        Scalar::Decimal(v) => Some(*v),
        Scalar::Bool(v) => Some(Decimal::from_i64(i64::from(*v))),
        Scalar::Text(v) => v.trim().parse().ok(),
        Scalar::Char(_) | Scalar::DateTime(_) => None,
    }
}

fn to_bool(scalar: &Scalar) -> Option<bool> {
    match scalar {
        Scalar::Signed(v) => Some(*v != 0),
        Scalar::Unsigned(v) => Some(*v != 0),
        Scalar::Float(v) => Some(*v != 0.0),
        Scalar::Decimal(v) => Some(*v != Decimal::ZERO),
        Scalar::Bool(v) => Some(*v),
        Scalar::Text(v) => match v.trim() {
            t if t.eq_ignore_ascii_case("true") => Some(true),
            t if t.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        },
        Scalar::Char(_) | Scalar::DateTime(_) => None,
    }
}

fn to_text(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Signed(v) => v.to_string(),
        Scalar::Unsigned(v) => v.to_string(),
        Scalar::Float(v) => v.to_string(),
        Scalar::Decimal(v) => v.to_string(),
        Scalar::Bool(v) => v.to_string(),
        Scalar::Text(v) => v.clone(),
        Scalar::Char(v) => v.to_string(),
        Scalar::DateTime(v) => v.to_string(),
    }
}

fn to_char(scalar: &Scalar) -> Option<char> {
    match scalar {
        Scalar::Char(v) => Some(*v),
        Scalar::Text(v) => {
            let mut chars = v.chars();
            let c = chars.next()?;
            chars.next().is_none().then_some(c)
        }
        other => {
            let code = u32::try_from(to_i128(other)?).ok()?;
            char::from_u32(code)
        }
    }
}

fn compose(scalar: &Scalar, target: ValueKind) -> Option<ErasedValue> {
    Some(match target {
        ValueKind::Text => ErasedValue::new(to_text(scalar)),
        ValueKind::Bool => ErasedValue::new(to_bool(scalar)?),
        ValueKind::Byte => ErasedValue::new(u8::try_from(to_i128(scalar)?).ok()?),
        ValueKind::I16 => ErasedValue::new(i16::try_from(to_i128(scalar)?).ok()?),
        ValueKind::U16 => ErasedValue::new(u16::try_from(to_i128(scalar)?).ok()?),
        ValueKind::I32 => ErasedValue::new(i32::try_from(to_i128(scalar)?).ok()?),
        ValueKind::U32 => ErasedValue::new(u32::try_from(to_i128(scalar)?).ok()?),
        ValueKind::I64 => ErasedValue::new(i64::try_from(to_i128(scalar)?).ok()?),
        ValueKind::U64 => ErasedValue::new(u64::try_from(to_i128(scalar)?).ok()?),
        #[expect(clippy::cast_possible_truncation, reason = "narrowing to f32 is the semantics")]
        ValueKind::F32 => ErasedValue::new(to_f64(scalar)? as f32),
        ValueKind::F64 => ErasedValue::new(to_f64(scalar)?),
        ValueKind::Decimal => ErasedValue::new(to_decimal(scalar)?),
        ValueKind::Char => ErasedValue::new(to_char(scalar)?),
        ValueKind::DateTime => match scalar {
            Scalar::DateTime(v) => ErasedValue::new(*v),
            Scalar::Text(v) => ErasedValue::new(v.trim().parse::<Timestamp>().ok()?),
            _ => return None,
        },
    })
}

/// Converts a primitive value to the target kind.
///
/// Returns `None` when the source type is not a known kind, the kind pair
/// is not convertible, or the particular value does not survive the
/// conversion (parse failure, out of range).
pub(crate) fn convert_primitive(value: &ErasedValue, target: ValueKind) -> Option<ErasedValue> {
    let source = ValueKind::from_type_id(value.type_id())?;
    if !convertible(source, target) {
        return None;
    }
    if source == target {
        return Some(value.clone());
    }
    let scalar = decompose(value, source)?;
    compose(&scalar, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    fn convert<T: Clone + PartialEq + 'static>(value: &ErasedValue, target: ValueKind) -> Option<T> {
        convert_primitive(value, target)
            .as_ref()
            .and_then(ErasedValue::downcast_ref::<T>)
            .cloned()
    }

    #[test]
    fn float_to_int_truncates_toward_zero() {
        let v = ErasedValue::new(3.7_f64);
        assert_eq!(convert::<i32>(&v, ValueKind::I32), Some(3));
        let v = ErasedValue::new(-3.7_f64);
        assert_eq!(convert::<i32>(&v, ValueKind::I32), Some(-3));
    }

    #[test]
    fn int_to_text_and_back() {
        let v = ErasedValue::new(42_i32);
        assert_eq!(convert::<String>(&v, ValueKind::Text).as_deref(), Some("42"));

        let v = ErasedValue::new(String::from("42"));
        assert_eq!(convert::<i32>(&v, ValueKind::I32), Some(42));
        assert_eq!(convert::<f64>(&v, ValueKind::F64), Some(42.0));
    }

    #[test]
    fn parse_failure_is_none() {
        let v = ErasedValue::new(String::from("not a number"));
        assert_eq!(convert::<i32>(&v, ValueKind::I32), None);
        assert_eq!(convert::<f64>(&v, ValueKind::F64), None);
    }

    #[test]
    fn narrowing_overflow_is_none() {
        let v = ErasedValue::new(300_i32);
        assert_eq!(convert::<u8>(&v, ValueKind::Byte), None);
        let v = ErasedValue::new(-1_i32);
        assert_eq!(convert::<u64>(&v, ValueKind::U64), None);
        let v = ErasedValue::new(f64::INFINITY);
        assert_eq!(convert::<i64>(&v, ValueKind::I64), None);
        let v = ErasedValue::new(f64::NAN);
        assert_eq!(convert::<i64>(&v, ValueKind::I64), None);
    }

    #[test]
    fn bool_conversions() {
        let v = ErasedValue::new(true);
        assert_eq!(convert::<String>(&v, ValueKind::Text).as_deref(), Some("true"));
        assert_eq!(convert::<i32>(&v, ValueKind::I32), Some(1));

        let v = ErasedValue::new(String::from("True"));
        assert_eq!(convert::<bool>(&v, ValueKind::Bool), Some(true));
        let v = ErasedValue::new(0_i64);
        assert_eq!(convert::<bool>(&v, ValueKind::Bool), Some(false));
        let v = ErasedValue::new(2_i64);
        assert_eq!(convert::<bool>(&v, ValueKind::Bool), Some(true));
    }

    #[test]
    fn char_conversions() {
        let v = ErasedValue::new('A');
        assert_eq!(convert::<i32>(&v, ValueKind::I32), Some(65));
        assert_eq!(convert::<String>(&v, ValueKind::Text).as_deref(), Some("A"));

        let v = ErasedValue::new(66_i32);
        assert_eq!(convert::<char>(&v, ValueKind::Char), Some('B'));

        // Surrogate range is not a char.
        let v = ErasedValue::new(0xD800_i32);
        assert_eq!(convert::<char>(&v, ValueKind::Char), None);

        // Kind table: char never reaches floats or bool.
        let v = ErasedValue::new('A');
        assert_eq!(convert::<f64>(&v, ValueKind::F64), None);
        assert_eq!(convert::<bool>(&v, ValueKind::Bool), None);
    }

    #[test]
    fn text_to_char_requires_single_char() {
        let v = ErasedValue::new(String::from("x"));
        assert_eq!(convert::<char>(&v, ValueKind::Char), Some('x'));
        let v = ErasedValue::new(String::from("xy"));
        assert_eq!(convert::<char>(&v, ValueKind::Char), None);
        let v = ErasedValue::new(String::new());
        assert_eq!(convert::<char>(&v, ValueKind::Char), None);
    }

    #[test]
    fn datetime_only_talks_to_text() {
        let v = ErasedValue::new(String::from("2026-08-29T12:30:00Z"));
        let t = convert::<Timestamp>(&v, ValueKind::DateTime).unwrap();
        assert_eq!(
            convert::<String>(&ErasedValue::new(t), ValueKind::Text).as_deref(),
            Some("2026-08-29T12:30:00Z")
        );
        assert_eq!(convert::<i64>(&ErasedValue::new(t), ValueKind::I64), None);
    }

    #[test]
    fn decimal_conversions() {
        let v = ErasedValue::new(Decimal::from_i64(5));
        assert_eq!(convert::<i32>(&v, ValueKind::I32), Some(5));
        assert_eq!(convert::<String>(&v, ValueKind::Text).as_deref(), Some("5"));

        let v = ErasedValue::new(String::from("19.99"));
        let d = convert::<Decimal>(&v, ValueKind::Decimal).unwrap();
        assert_eq!(d.to_string(), "19.99");

        let v = ErasedValue::new(2.5_f64);
        let d = convert::<Decimal>(&v, ValueKind::Decimal).unwrap();
        assert_eq!(d.to_f64(), 2.5);
    }

    #[test]
    fn unknown_types_are_opaque() {
        let v = ErasedValue::new([1_u8, 2, 3]);
        assert!(convert_primitive(&v, ValueKind::Text).is_none());
    }

    #[test]
    fn same_kind_is_identity() {
        let v = ErasedValue::new(7_i32);
        assert_eq!(convert::<i32>(&v, ValueKind::I32), Some(7));
    }
}
