// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property metadata definitions.
//!
//! [`PropertyMetadata`] holds a property's default value, optional coercion
//! and changed callbacks, and the structural-impact flags the layout
//! collaborator reads to decide what to invalidate. Metadata is attached per
//! owner type; derived types may override it through
//! [`PropertyRegistry::override_metadata`](crate::PropertyRegistry::override_metadata).

use alloc::boxed::Box;
use bitflags::bitflags;

bitflags! {
    /// Structural impact of a property change, consumed by the layout pass.
    #[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug)]
    pub struct StructuralFlags: u8 {
        /// A change invalidates cached measurement results.
        const AFFECTS_MEASURE = 1 << 0;
        /// A change invalidates cached placement results.
        const AFFECTS_ARRANGE = 1 << 1;
        /// A change requires repainting without re-layout.
        const AFFECTS_PAINT = 1 << 2;
    }
}

/// Callback invoked when a property value changes.
///
/// Receives the owner key, the previous effective value, and the new value.
pub type PropertyChangedCallback<K, T> = Box<dyn Fn(K, Option<&T>, &T) + Send + Sync>;

/// Callback for coercing a candidate value before it is stored.
///
/// Returns the coerced value, or `None` to reject the candidate. Rejection
/// leaves the stored value unchanged; it is a policy outcome, not an error.
pub type CoerceValueCallback<T> = Box<dyn Fn(T) -> Option<T> + Send + Sync>;

/// Metadata for a registered property, attached to one owner type.
///
/// # Example
///
/// ```rust
/// use midstory_property::{PropertyMetadataBuilder, StructuralFlags};
///
/// let metadata = PropertyMetadataBuilder::<u32, f64>::new(100.0)
///     .affects(StructuralFlags::AFFECTS_MEASURE)
///     .coerce(|v| Some(v.clamp(0.0, 1000.0)))
///     .build();
///
/// assert_eq!(metadata.default_value(), &100.0);
/// assert_eq!(metadata.coerce(-5.0), Some(0.0));
/// ```
pub struct PropertyMetadata<K, T: Clone + PartialEq + 'static> {
    default_value: T,
    inherits: bool,
    flags: StructuralFlags,
    changed_callback: Option<PropertyChangedCallback<K, T>>,
    coerce_callback: Option<CoerceValueCallback<T>>,
}

impl<K: Copy, T: Clone + PartialEq + 'static> PropertyMetadata<K, T> {
    /// Creates metadata with the given default value and no callbacks.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self {
            default_value,
            inherits: false,
            flags: StructuralFlags::empty(),
            changed_callback: None,
            coerce_callback: None,
        }
    }

    /// Returns a reference to the default value.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Returns whether the property's value is readable through the
    /// instance parent chain.
    #[must_use]
    #[inline]
    pub fn inherits(&self) -> bool {
        self.inherits
    }

    /// Returns the structural-impact flags.
    #[must_use]
    #[inline]
    pub fn flags(&self) -> StructuralFlags {
        self.flags
    }

    /// Coerces a candidate through the coerce callback if one is set.
    ///
    /// Without a callback the candidate passes through untouched.
    #[inline]
    pub fn coerce(&self, value: T) -> Option<T> {
        match &self.coerce_callback {
            Some(callback) => callback(value),
            None => Some(value),
        }
    }

    /// Invokes the changed callback if one is set.
    #[inline]
    pub fn on_changed(&self, owner: K, old_value: Option<&T>, new_value: &T) {
        if let Some(callback) = &self.changed_callback {
            callback(owner, old_value, new_value);
        }
    }

    /// Returns whether a changed callback is set.
    #[must_use]
    #[inline]
    pub fn has_changed_callback(&self) -> bool {
        self.changed_callback.is_some()
    }

    /// Returns whether a coerce callback is set.
    #[must_use]
    #[inline]
    pub fn has_coerce_callback(&self) -> bool {
        self.coerce_callback.is_some()
    }
}

// Manual Debug impl since callbacks aren't Debug
impl<K, T: Clone + PartialEq + core::fmt::Debug + 'static> core::fmt::Debug
    for PropertyMetadata<K, T>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("default_value", &self.default_value)
            .field("inherits", &self.inherits)
            .field("flags", &self.flags)
            .field("has_changed_callback", &self.changed_callback.is_some())
            .field("has_coerce_callback", &self.coerce_callback.is_some())
            .finish()
    }
}

/// Builder for [`PropertyMetadata`].
pub struct PropertyMetadataBuilder<K, T: Clone + PartialEq + 'static> {
    metadata: PropertyMetadata<K, T>,
}

impl<K, T: Clone + PartialEq + core::fmt::Debug + 'static> core::fmt::Debug
    for PropertyMetadataBuilder<K, T>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyMetadataBuilder")
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl<K: Copy, T: Clone + PartialEq + 'static> PropertyMetadataBuilder<K, T> {
    /// Creates a builder with the given default value.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self {
            metadata: PropertyMetadata::new(default_value),
        }
    }

    /// Marks the property readable through the instance parent chain.
    #[must_use]
    pub fn inherits(mut self, inherits: bool) -> Self {
        self.metadata.inherits = inherits;
        self
    }

    /// Sets the structural-impact flags returned on every effective change.
    #[must_use]
    pub fn affects(mut self, flags: StructuralFlags) -> Self {
        self.metadata.flags = flags;
        self
    }

    /// Sets a callback invoked after the stored value changes.
    #[must_use]
    pub fn on_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(K, Option<&T>, &T) + Send + Sync + 'static,
    {
        self.metadata.changed_callback = Some(Box::new(callback));
        self
    }

    /// Sets a callback that clamps, normalizes, or rejects candidates.
    #[must_use]
    pub fn coerce<F>(mut self, callback: F) -> Self
    where
        F: Fn(T) -> Option<T> + Send + Sync + 'static,
    {
        self.metadata.coerce_callback = Some(Box::new(callback));
        self
    }

    /// Builds the [`PropertyMetadata`].
    #[must_use]
    pub fn build(self) -> PropertyMetadata<K, T> {
        self.metadata
    }
}
