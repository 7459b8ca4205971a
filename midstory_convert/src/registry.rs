// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Custom converter registration and conversion dispatch.

use alloc::sync::Arc;
use core::any::TypeId;
use hashbrown::HashMap;

use midstory_property::ErasedValue;

use crate::kind::{ValueKind, convertible};
use crate::scalar::convert_primitive;

/// A bidirectional value converter between two types.
///
/// A single instance serves both directions; `target` says which way the
/// current call goes. Returning `None` rejects the value without
/// propagating it.
pub trait Converter: Send + Sync {
    /// Converts `value` to the `target` type.
    fn convert(&self, value: &ErasedValue, target: TypeId) -> Option<ErasedValue>;
}

/// An unordered pair of types identifying a converter.
///
/// Construction normalizes the pair, so `new::<A, B>()` and `new::<B, A>()`
/// produce the same key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConverterKey {
    lo: TypeId,
    hi: TypeId,
}

impl ConverterKey {
    /// Creates the key for a pair of types.
    #[must_use]
    pub fn new<A: 'static, B: 'static>() -> Self {
        Self::from_ids(TypeId::of::<A>(), TypeId::of::<B>())
    }

    /// Creates the key from erased type IDs.
    #[must_use]
    pub fn from_ids(a: TypeId, b: TypeId) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }
}

/// The registry of custom converters, with fallback to the built-in
/// primitive conversion table.
///
/// Like the property registry, this has a two-phase lifecycle: converters
/// are registered at startup and looked up for the process lifetime.
/// An explicitly registered converter takes precedence over the built-in
/// table for its type pair.
///
/// # Example
///
/// ```rust
/// use midstory_convert::ConverterRegistry;
/// use midstory_property::ErasedValue;
///
/// let registry = ConverterRegistry::new();
///
/// // Built-in conversions need no registration.
/// let out = registry.convert_to::<i32>(&ErasedValue::new(3.7_f64)).unwrap();
/// assert_eq!(out.downcast_ref::<i32>(), Some(&3));
/// ```
#[derive(Default)]
pub struct ConverterRegistry {
    converters: HashMap<ConverterKey, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter for a pair of types.
    ///
    /// The pair is unordered; one registration covers both directions.
    ///
    /// # Panics
    ///
    /// Panics if `A` and `B` are the same type or a converter is already
    /// registered for the pair.
    pub fn register<A: 'static, B: 'static>(&mut self, converter: impl Converter + 'static) {
        assert!(
            TypeId::of::<A>() != TypeId::of::<B>(),
            "Converter endpoints must be distinct types"
        );
        let key = ConverterKey::new::<A, B>();
        assert!(
            !self.converters.contains_key(&key),
            "A converter is already registered for this type pair"
        );
        self.converters.insert(key, Arc::new(converter));
    }

    /// Returns the converter registered for a pair, if any.
    #[must_use]
    pub fn find(&self, a: TypeId, b: TypeId) -> Option<&Arc<dyn Converter>> {
        self.converters.get(&ConverterKey::from_ids(a, b))
    }

    /// Returns the number of registered converters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Returns `true` if no converters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Whether a conversion path exists between two types.
    ///
    /// True for identical types, explicitly registered pairs, and pairs the
    /// built-in kind table declares convertible. A `true` answer does not
    /// guarantee every value survives; lossy and parsing conversions can
    /// still reject at runtime.
    #[must_use]
    pub fn can_convert(&self, source: TypeId, target: TypeId) -> bool {
        if source == target || self.converters.contains_key(&ConverterKey::from_ids(source, target))
        {
            return true;
        }
        match (ValueKind::from_type_id(source), ValueKind::from_type_id(target)) {
            (Some(s), Some(t)) => convertible(s, t),
            _ => false,
        }
    }

    /// Converts a value to the target type.
    ///
    /// Identical types pass through unchanged. An explicit converter is
    /// consulted next, then the built-in primitive table. Returns `None`
    /// when no path exists or the value is rejected.
    #[must_use]
    pub fn convert(&self, value: &ErasedValue, target: TypeId) -> Option<ErasedValue> {
        if value.type_id() == target {
            return Some(value.clone());
        }
        if let Some(converter) = self.find(value.type_id(), target) {
            return converter.convert(value, target);
        }
        convert_primitive(value, ValueKind::from_type_id(target)?)
    }

    /// Typed shorthand for [`convert`](Self::convert).
    #[must_use]
    pub fn convert_to<T: 'static>(&self, value: &ErasedValue) -> Option<ErasedValue> {
        self.convert(value, TypeId::of::<T>())
    }
}

impl core::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("count", &self.converters.len())
            .finish()
    }
}
