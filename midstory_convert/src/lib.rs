// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Midstory Convert: Value kinds and bidirectional conversion.
//!
//! This crate supplies the conversion layer the binding engine leans on:
//! a closed set of primitive [`ValueKind`]s with a symmetric convertibility
//! table, a built-in converter for those kinds, and a [`ConverterRegistry`]
//! for custom converters between arbitrary types.
//!
//! ## Conversion Rules
//!
//! The numeric kinds, `bool`, and text are mutually convertible.
//! [`Timestamp`] converts only to and from text. `char` converts to and
//! from text and integers, never floats, [`Decimal`], or `bool`. A
//! permitted conversion can still reject a particular value: parse
//! failures and out-of-range narrowing produce `None` rather than a panic
//! or a clamped value.
//!
//! Floats truncate toward zero when converted to integers, so a float to
//! integer round trip is lossy by design.
//!
//! ## Custom Converters
//!
//! A [`Converter`] is registered once per unordered type pair and serves
//! both directions:
//!
//! ```rust
//! use core::any::TypeId;
//! use midstory_convert::{Converter, ConverterRegistry};
//! use midstory_property::ErasedValue;
//!
//! #[derive(Clone, PartialEq)]
//! struct Visibility(bool);
//!
//! struct BoolToVisibility;
//!
//! impl Converter for BoolToVisibility {
//!     fn convert(&self, value: &ErasedValue, target: TypeId) -> Option<ErasedValue> {
//!         if target == TypeId::of::<Visibility>() {
//!             Some(ErasedValue::new(Visibility(*value.downcast_ref::<bool>()?)))
//!         } else {
//!             Some(ErasedValue::new(value.downcast_ref::<Visibility>()?.0))
//!         }
//!     }
//! }
//!
//! let mut registry = ConverterRegistry::new();
//! registry.register::<bool, Visibility>(BoolToVisibility);
//!
//! let v = registry.convert_to::<Visibility>(&ErasedValue::new(true)).unwrap();
//! assert!(v.downcast_ref::<Visibility>().is_some());
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod decimal;
mod kind;
mod registry;
mod scalar;
mod timestamp;

pub use decimal::{Decimal, ParseDecimalError};
pub use kind::{ValueKind, convertible};
pub use registry::{Converter, ConverterKey, ConverterRegistry};
pub use timestamp::{ParseTimestampError, Timestamp};
