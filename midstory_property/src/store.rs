// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node sparse property storage.
//!
//! This module provides [`PropertyStore`] for storing property values on
//! nodes, using sparse storage to minimize memory for nodes with few
//! properties set.
//!
//! # Implementation
//!
//! Following the `WinUI` approach, we use a sorted vector with binary search
//! rather than a hash map. This provides:
//!
//! - Better cache locality (contiguous memory)
//! - Lower memory overhead (no hash buckets)
//! - O(log n) lookup, which is fast for typical property counts (5-20)
//! - Inline storage for small property sets via `SmallVec`
//!
//! # Write pipeline
//!
//! [`PropertyStore::set_value`] runs the full commit pipeline: metadata
//! coercion, an equality short-circuit against the current effective value,
//! storage, and the changed callback. The outcome reports whether anything
//! changed and which structural flags the effective metadata carries, so
//! callers can mark layout or paint dirty and push binding updates.

use smallvec::SmallVec;

use crate::hierarchy::OwnerType;
use crate::id::{Property, PropertyId};
use crate::metadata::StructuralFlags;
use crate::registry::PropertyRegistry;
use crate::value::ErasedValue;

/// Default inline capacity for property entries.
///
/// Most UI nodes have fewer than 8 non-default properties set,
/// so this avoids heap allocation in the common case.
const INLINE_CAPACITY: usize = 8;

/// The result of a property write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SetOutcome {
    /// `true` if the effective value changed.
    ///
    /// A rejected coercion or a write equal to the current effective value
    /// leaves this `false`; no storage occurred and no callback fired.
    pub changed: bool,
    /// The structural-impact flags of the effective metadata, set only when
    /// the value changed.
    pub flags: StructuralFlags,
}

impl SetOutcome {
    const UNCHANGED: Self = Self {
        changed: false,
        flags: StructuralFlags::empty(),
    };
}

/// Per-node sparse storage for local property values.
///
/// Each store carries its owner key and the node's concrete type; metadata
/// is resolved for that type, so overrides registered for derived types
/// take effect automatically.
///
/// # Storage Strategy
///
/// Uses a sorted `SmallVec` with binary search, following the `WinUI`
/// `vector_map` approach. This provides O(log n) lookup with excellent
/// cache locality. The first 8 properties are stored inline without heap
/// allocation.
///
/// # Example
///
/// ```rust
/// use midstory_property::{PropertyMetadataBuilder, PropertyRegistry, PropertyStore};
///
/// let mut registry = PropertyRegistry::new();
/// let node = registry.register_type("Node", None);
/// let width = registry.register("Width", node, PropertyMetadataBuilder::new(0.0_f64).build());
///
/// let mut store = PropertyStore::<u32>::new(1, node);
///
/// // No value set - uses default
/// assert!(store.get_local(width).is_none());
/// assert_eq!(store.effective_value(width, &registry), 0.0);
///
/// let outcome = store.set_value(width, 100.0, &registry);
/// assert!(outcome.changed);
/// assert_eq!(store.get_local(width), Some(&100.0));
///
/// // Writing the same value again is a no-op.
/// assert!(!store.set_value(width, 100.0, &registry).changed);
/// ```
#[derive(Debug)]
pub struct PropertyStore<K> {
    /// Local values, sorted by [`PropertyId`] for binary search lookup.
    entries: SmallVec<[(PropertyId, ErasedValue); INLINE_CAPACITY]>,
    owner: K,
    concrete: OwnerType,
}

impl<K: Copy + Eq> PropertyStore<K> {
    /// Creates a new property store for the given owner key and concrete
    /// type.
    #[must_use]
    pub fn new(owner: K, concrete: OwnerType) -> Self {
        Self {
            entries: SmallVec::new(),
            owner,
            concrete,
        }
    }

    /// Returns the owner key of this store.
    #[must_use]
    #[inline]
    pub fn owner(&self) -> K {
        self.owner
    }

    /// Returns the concrete type metadata is resolved against.
    #[must_use]
    #[inline]
    pub fn concrete_type(&self) -> OwnerType {
        self.concrete
    }

    /// Returns `true` if no properties have explicit values set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of properties with explicit values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the property IDs that have values set, in ascending order.
    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Binary search for an entry by property ID.
    #[inline]
    fn find_entry(&self, id: PropertyId) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&id, |(pid, _)| *pid)
    }

    /// Gets the local value, if set.
    #[must_use]
    #[inline]
    pub fn get_local<T: Clone + 'static>(&self, property: Property<T>) -> Option<&T> {
        self.get_local_erased(property.id())
            .and_then(ErasedValue::downcast_ref)
    }

    /// Gets the local value in erased form, if set.
    #[must_use]
    #[inline]
    pub fn get_local_erased(&self, id: PropertyId) -> Option<&ErasedValue> {
        self.find_entry(id).ok().map(|idx| &self.entries[idx].1)
    }

    /// Returns `true` if the property has a local value.
    #[must_use]
    #[inline]
    pub fn has_local<T: Clone + 'static>(&self, property: Property<T>) -> bool {
        self.find_entry(property.id()).is_ok()
    }

    /// Sets a property value, running the full commit pipeline.
    ///
    /// The candidate is first passed through the effective metadata's
    /// coercion callback; a rejected candidate is a silent no-op. A coerced
    /// value equal to the current effective value is also a no-op. Otherwise
    /// the value is stored and the changed callback fires with the prior
    /// local value (`None` if the property was at its default).
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered in the registry.
    pub fn set_value<T: Clone + PartialEq + 'static>(
        &mut self,
        property: Property<T>,
        value: T,
        registry: &PropertyRegistry<K>,
    ) -> SetOutcome {
        self.set_erased(property.id(), ErasedValue::new(value), registry)
    }

    /// Sets a property value from an erased candidate.
    ///
    /// Same pipeline as [`set_value`](Self::set_value); this entry point is
    /// used by the binding engine, which works with erased values. A
    /// candidate whose type does not match the property's value type is
    /// rejected by coercion and becomes a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered in the registry.
    pub fn set_erased(
        &mut self,
        id: PropertyId,
        value: ErasedValue,
        registry: &PropertyRegistry<K>,
    ) -> SetOutcome {
        let metadata = registry
            .resolve_erased(id, self.concrete)
            .unwrap_or_else(|| panic!("Property {id:?} not found in registry"));

        let Some(coerced) = metadata.coerce_erased(value) else {
            return SetOutcome::UNCHANGED;
        };

        // Equality short-circuit against the current effective value. This
        // is what terminates two-way binding propagation.
        let entry = self.find_entry(id);
        let default;
        let current = match entry {
            Ok(idx) => Some(&self.entries[idx].1),
            Err(_) => {
                default = metadata.default_erased();
                Some(&default)
            }
        };
        if current.is_some_and(|c| c.value_eq(&coerced)) {
            return SetOutcome::UNCHANGED;
        }

        let old = match entry {
            Ok(idx) => {
                let old = core::mem::replace(&mut self.entries[idx].1, coerced.clone());
                Some(old)
            }
            Err(idx) => {
                self.entries.insert(idx, (id, coerced.clone()));
                None
            }
        };

        metadata.on_changed_erased(self.owner, old.as_ref(), &coerced);

        SetOutcome {
            changed: true,
            flags: metadata.flags(),
        }
    }

    /// Clears the local value, reverting the property to its default.
    ///
    /// Fires the changed callback if the removed value differed from the
    /// resolved default. Clearing an unset property is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered in the registry.
    pub fn clear_value<T: Clone + PartialEq + 'static>(
        &mut self,
        property: Property<T>,
        registry: &PropertyRegistry<K>,
    ) -> SetOutcome {
        self.clear_erased(property.id(), registry)
    }

    /// Clears the local value from an erased entry point.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered in the registry.
    pub fn clear_erased(&mut self, id: PropertyId, registry: &PropertyRegistry<K>) -> SetOutcome {
        let Ok(idx) = self.find_entry(id) else {
            return SetOutcome::UNCHANGED;
        };
        let metadata = registry
            .resolve_erased(id, self.concrete)
            .unwrap_or_else(|| panic!("Property {id:?} not found in registry"));

        let (_, old) = self.entries.remove(idx);
        let default = metadata.default_erased();
        if old.value_eq(&default) {
            return SetOutcome::UNCHANGED;
        }

        metadata.on_changed_erased(self.owner, Some(&old), &default);

        SetOutcome {
            changed: true,
            flags: metadata.flags(),
        }
    }

    /// Gets the effective value (local → resolved default).
    ///
    /// Metadata is resolved against this store's concrete type, so derived
    /// types see their overridden defaults. Inheritance across the tree is
    /// the province of [`walk_inherited`](crate::walk_inherited).
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered in the registry.
    #[must_use]
    pub fn effective_value<T: Clone + PartialEq + 'static>(
        &self,
        property: Property<T>,
        registry: &PropertyRegistry<K>,
    ) -> T {
        self.effective_ref(property, registry).clone()
    }

    /// Gets the effective value (local → resolved default), borrowed.
    ///
    /// This avoids cloning and returns a reference into either this store
    /// or the registry's resolved default.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered in the registry.
    #[must_use]
    pub fn effective_ref<'a, T: Clone + PartialEq + 'static>(
        &'a self,
        property: Property<T>,
        registry: &'a PropertyRegistry<K>,
    ) -> &'a T {
        if let Some(v) = self.get_local(property) {
            return v;
        }
        if let Some(metadata) = registry.resolve(property, self.concrete) {
            return metadata.default_value();
        }
        panic!("Property {:?} not found in registry", property.id());
    }

    /// Gets the effective value in erased form.
    ///
    /// Returns `None` if the property is not registered.
    #[must_use]
    pub fn effective_erased(
        &self,
        id: PropertyId,
        registry: &PropertyRegistry<K>,
    ) -> Option<ErasedValue> {
        if let Some(v) = self.get_local_erased(id) {
            return Some(v.clone());
        }
        registry
            .resolve_erased(id, self.concrete)
            .map(|m| m.default_erased())
    }
}

impl<K: Copy + Eq> Clone for PropertyStore<K> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            owner: self.owner,
            concrete: self.concrete,
        }
    }
}
