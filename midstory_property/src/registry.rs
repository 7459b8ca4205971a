// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The property registry with per-owner-type metadata chains.
//!
//! Properties are registered once at startup against an owner type from the
//! [`TypeHierarchy`]. Derived owner types may override metadata without
//! creating a new property; resolution walks the concrete type's base chain
//! and returns the nearest override, falling back to the original metadata.
//! Resolution results are memoized per `(property, concrete type)` — the
//! memo assumes all overrides are in place before the first resolution, so
//! overriding after that point is a configuration error.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cell::RefCell;
use hashbrown::HashMap;

use crate::hierarchy::{OwnerType, TypeHierarchy};
use crate::id::{Property, PropertyId};
use crate::metadata::{PropertyMetadata, StructuralFlags};
use crate::value::ErasedValue;

/// A registration entry for a property.
pub struct PropertyRegistration<K> {
    name: &'static str,
    owner: OwnerType,
    type_id: TypeId,
    metadata: Box<dyn ErasedMetadata<K>>,
    overrides: Vec<(OwnerType, Box<dyn ErasedMetadata<K>>)>,
}

impl<K> PropertyRegistration<K> {
    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the owner type that registered the property.
    #[must_use]
    #[inline]
    pub fn owner(&self) -> OwnerType {
        self.owner
    }

    /// Returns the [`TypeId`] of the property's value type.
    #[must_use]
    #[inline]
    pub fn value_type(&self) -> TypeId {
        self.type_id
    }
}

impl<K> core::fmt::Debug for PropertyRegistration<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyRegistration")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("type_id", &self.type_id)
            .field("overrides", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

/// The registry of properties and owner types.
///
/// Lives for the process lifetime with a two-phase lifecycle: a
/// registration phase (single-threaded, before any UI node is constructed)
/// followed by a read-only steady state. There is no removal operation.
///
/// # Example
///
/// ```rust
/// use midstory_property::{PropertyMetadataBuilder, PropertyRegistry};
///
/// let mut registry = PropertyRegistry::<u32>::new();
/// let node = registry.register_type("Node", None);
/// let count = registry.register("Count", node, PropertyMetadataBuilder::new(0_i32).build());
///
/// let metadata = registry.resolve(count, node).unwrap();
/// assert_eq!(metadata.default_value(), &0);
/// ```
pub struct PropertyRegistry<K> {
    types: TypeHierarchy,
    properties: Vec<PropertyRegistration<K>>,
    by_key: HashMap<(&'static str, OwnerType), PropertyId>,
    /// Memoized resolution: which override (if any) applies for a
    /// `(property, concrete type)` pair. `None` means the original metadata.
    memo: RefCell<HashMap<(PropertyId, OwnerType), Option<OwnerType>>>,
}

impl<K> Default for PropertyRegistry<K> {
    fn default() -> Self {
        Self {
            types: TypeHierarchy::new(),
            properties: Vec::new(),
            by_key: HashMap::new(),
            memo: RefCell::new(HashMap::new()),
        }
    }
}

impl<K: Copy> PropertyRegistry<K> {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the owner-type hierarchy.
    #[must_use]
    #[inline]
    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.types
    }

    /// Registers an owner type; a shorthand for
    /// [`TypeHierarchy::register`].
    pub fn register_type(&mut self, name: &'static str, base: Option<OwnerType>) -> OwnerType {
        self.types.register(name, base)
    }

    /// Registers a new property for an owner type.
    ///
    /// Returns a type-safe [`Property<T>`] handle.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty, `owner` is not a registered type, a
    /// property with the same `(name, owner)` already exists, or more than
    /// 65,536 properties are registered.
    pub fn register<T: Clone + PartialEq + 'static>(
        &mut self,
        name: &'static str,
        owner: OwnerType,
        metadata: PropertyMetadata<K, T>,
    ) -> Property<T> {
        assert!(!name.is_empty(), "Property name must not be empty");
        assert!(
            (owner.index() as usize) < self.types.len(),
            "Owner type {owner:?} is not registered"
        );
        assert!(
            !self.by_key.contains_key(&(name, owner)),
            "Property '{name}' is already registered for {:?}",
            self.types.name(owner)
        );
        assert!(
            self.properties.len() < u16::MAX as usize,
            "Too many properties registered (max {})",
            u16::MAX
        );

        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = PropertyId::new(self.properties.len() as u16);

        self.properties.push(PropertyRegistration {
            name,
            owner,
            type_id: TypeId::of::<T>(),
            metadata: Box::new(metadata),
            overrides: Vec::new(),
        });
        self.by_key.insert((name, owner), id);

        Property::from_id(id)
    }

    /// Overrides a property's metadata for a more derived owner type.
    ///
    /// The property keeps its identity; only resolution for
    /// `derived_owner` and types below it changes.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered, `T` differs from the
    /// registered value type, `derived_owner` is not strictly derived from
    /// the property's owner, metadata was already overridden for that exact
    /// type, or resolution memoization has already begun.
    pub fn override_metadata<T: Clone + PartialEq + 'static>(
        &mut self,
        property: Property<T>,
        derived_owner: OwnerType,
        metadata: PropertyMetadata<K, T>,
    ) {
        assert!(
            self.memo.borrow().is_empty(),
            "Metadata override after resolution began; overrides must complete during startup"
        );
        let id = property.id();
        let types = &self.types;
        let registration = self
            .properties
            .get_mut(id.index() as usize)
            .unwrap_or_else(|| panic!("Property {id:?} is not registered"));
        assert!(
            registration.type_id == TypeId::of::<T>(),
            "Metadata value type mismatch for property '{}'",
            registration.name
        );
        assert!(
            derived_owner != registration.owner
                && types.is_derived_from(derived_owner, registration.owner),
            "{derived_owner:?} is not strictly derived from the owner of property '{}'",
            registration.name
        );
        assert!(
            !registration.overrides.iter().any(|(t, _)| *t == derived_owner),
            "Metadata for property '{}' was already overridden for {derived_owner:?}",
            registration.name
        );

        registration.overrides.push((derived_owner, Box::new(metadata)));
    }

    /// Resolves the effective metadata for a property on a concrete type.
    ///
    /// Walks from `concrete` upward through its base chain and returns the
    /// nearest override at or above it, falling back to the original
    /// metadata. Memoized per `(property, concrete)`.
    ///
    /// Returns `None` if the property is not registered or `T` does not
    /// match its value type.
    #[must_use]
    pub fn resolve<T: Clone + PartialEq + 'static>(
        &self,
        property: Property<T>,
        concrete: OwnerType,
    ) -> Option<&PropertyMetadata<K, T>> {
        self.resolve_erased(property.id(), concrete)
            .and_then(|m| m.as_any().downcast_ref())
    }

    /// Erased resolution used by the store and the binding engine.
    #[must_use]
    pub(crate) fn resolve_erased(
        &self,
        id: PropertyId,
        concrete: OwnerType,
    ) -> Option<&dyn ErasedMetadata<K>> {
        let registration = self.properties.get(id.index() as usize)?;
        let applies = self.resolve_owner(id, registration, concrete);
        match applies {
            Some(ty) => registration
                .overrides
                .iter()
                .find(|(t, _)| *t == ty)
                .map(|(_, m)| m.as_ref()),
            None => Some(registration.metadata.as_ref()),
        }
    }

    fn resolve_owner(
        &self,
        id: PropertyId,
        registration: &PropertyRegistration<K>,
        concrete: OwnerType,
    ) -> Option<OwnerType> {
        if let Some(cached) = self.memo.borrow().get(&(id, concrete)) {
            return *cached;
        }

        let mut applies = None;
        for ty in self.types.base_chain(concrete) {
            if ty == registration.owner {
                break;
            }
            if registration.overrides.iter().any(|(t, _)| *t == ty) {
                applies = Some(ty);
                break;
            }
        }
        self.memo.borrow_mut().insert((id, concrete), applies);
        applies
    }

    /// Returns the number of registered properties.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if no properties are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Looks up a property by name and owner type.
    #[must_use]
    pub fn by_name(&self, name: &str, owner: OwnerType) -> Option<PropertyId> {
        self.by_key.get(&(name, owner)).copied()
    }

    /// Returns the registration for a property.
    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&PropertyRegistration<K>> {
        self.properties.get(id.index() as usize)
    }

    /// Returns the effective structural-impact flags for a property on a
    /// concrete type.
    #[must_use]
    pub fn flags(&self, id: PropertyId, concrete: OwnerType) -> StructuralFlags {
        self.resolve_erased(id, concrete)
            .map(|m| m.flags())
            .unwrap_or_default()
    }

    /// Returns an iterator over all registered properties.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropertyRegistration<K>)> {
        self.properties.iter().enumerate().map(|(i, r)| {
            #[expect(clippy::cast_possible_truncation, reason = "index < len < u16::MAX")]
            (PropertyId::new(i as u16), r)
        })
    }
}

impl<K> core::fmt::Debug for PropertyRegistry<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("types", &self.types)
            .field("count", &self.properties.len())
            .field(
                "properties",
                &self.properties.iter().map(|r| r.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Type-erased metadata trait for heterogeneous storage.
///
/// The erased surface carries everything the store and binding engine need
/// without knowing the value type: default, coercion, equality-checked
/// change notification, and flags.
pub(crate) trait ErasedMetadata<K>: Any {
    fn as_any(&self) -> &dyn Any;
    fn flags(&self) -> StructuralFlags;
    fn inherits(&self) -> bool;
    fn default_erased(&self) -> ErasedValue;
    /// Coerces an erased candidate; `None` is a rejection. A candidate of
    /// the wrong type is rejected.
    fn coerce_erased(&self, value: ErasedValue) -> Option<ErasedValue>;
    fn on_changed_erased(&self, owner: K, old: Option<&ErasedValue>, new: &ErasedValue);
}

impl<K: Copy, T: Clone + PartialEq + 'static> ErasedMetadata<K> for PropertyMetadata<K, T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn flags(&self) -> StructuralFlags {
        Self::flags(self)
    }

    fn inherits(&self) -> bool {
        Self::inherits(self)
    }

    fn default_erased(&self) -> ErasedValue {
        ErasedValue::new(self.default_value().clone())
    }

    fn coerce_erased(&self, value: ErasedValue) -> Option<ErasedValue> {
        let candidate = value.downcast_ref::<T>()?.clone();
        self.coerce(candidate).map(ErasedValue::new)
    }

    fn on_changed_erased(&self, owner: K, old: Option<&ErasedValue>, new: &ErasedValue) {
        let old = old.and_then(ErasedValue::downcast_ref::<T>);
        if let Some(new) = new.downcast_ref::<T>() {
            self.on_changed(owner, old, new);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PropertyMetadataBuilder;

    fn setup() -> (PropertyRegistry<u32>, OwnerType, OwnerType, OwnerType) {
        let mut registry = PropertyRegistry::new();
        let control = registry.register_type("Control", None);
        let button = registry.register_type("Button", Some(control));
        let toggle = registry.register_type("ToggleButton", Some(button));
        (registry, control, button, toggle)
    }

    #[test]
    fn register_and_lookup() {
        let (mut registry, control, _, _) = setup();
        let width = registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.by_name("Width", control), Some(width.id()));
        let registration = registry.get(width.id()).unwrap();
        assert_eq!(registration.name(), "Width");
        assert_eq!(registration.owner(), control);
        assert_eq!(registration.value_type(), TypeId::of::<f64>());
    }

    #[test]
    fn same_name_for_unrelated_owners() {
        let mut registry = PropertyRegistry::<u32>::new();
        let a = registry.register_type("A", None);
        let b = registry.register_type("B", None);
        let pa = registry.register("Value", a, PropertyMetadataBuilder::new(0_i32).build());
        let pb = registry.register("Value", b, PropertyMetadataBuilder::new(0_i32).build());
        assert_ne!(pa.id(), pb.id());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_name_same_owner_panics() {
        let (mut registry, control, _, _) = setup();
        registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());
        registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_name_panics() {
        let (mut registry, control, _, _) = setup();
        registry.register("", control, PropertyMetadataBuilder::new(0.0_f64).build());
    }

    // Identity law: resolving for the registering type returns the original
    // metadata.
    #[test]
    fn resolve_identity() {
        let (mut registry, control, _, _) = setup();
        let width =
            registry.register("Width", control, PropertyMetadataBuilder::new(7.0_f64).build());
        let metadata = registry.resolve(width, control).unwrap();
        assert_eq!(metadata.default_value(), &7.0);
    }

    #[test]
    fn resolve_walks_to_nearest_override() {
        let (mut registry, control, button, toggle) = setup();
        let width =
            registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());
        registry.override_metadata(width, button, PropertyMetadataBuilder::new(40.0_f64).build());

        // Button and everything below it sees the override.
        assert_eq!(registry.resolve(width, button).unwrap().default_value(), &40.0);
        assert_eq!(registry.resolve(width, toggle).unwrap().default_value(), &40.0);
        // The base type is unaffected.
        assert_eq!(registry.resolve(width, control).unwrap().default_value(), &0.0);
    }

    #[test]
    fn override_does_not_affect_siblings() {
        let mut registry = PropertyRegistry::<u32>::new();
        let control = registry.register_type("Control", None);
        let button = registry.register_type("Button", Some(control));
        let slider = registry.register_type("Slider", Some(control));
        let width =
            registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());
        registry.override_metadata(width, button, PropertyMetadataBuilder::new(40.0_f64).build());

        assert_eq!(registry.resolve(width, slider).unwrap().default_value(), &0.0);
    }

    #[test]
    fn nearest_override_wins() {
        let (mut registry, control, button, toggle) = setup();
        let width =
            registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());
        registry.override_metadata(width, button, PropertyMetadataBuilder::new(40.0_f64).build());
        registry.override_metadata(width, toggle, PropertyMetadataBuilder::new(60.0_f64).build());

        assert_eq!(registry.resolve(width, toggle).unwrap().default_value(), &60.0);
        assert_eq!(registry.resolve(width, button).unwrap().default_value(), &40.0);
    }

    #[test]
    fn unrelated_type_falls_back_to_original() {
        let (mut registry, control, _, _) = setup();
        let other = registry.register_type("Popup", None);
        let width =
            registry.register("Width", control, PropertyMetadataBuilder::new(3.0_f64).build());
        assert_eq!(registry.resolve(width, other).unwrap().default_value(), &3.0);
    }

    #[test]
    fn resolution_is_memoized() {
        let (mut registry, control, button, _) = setup();
        let width =
            registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());
        registry.override_metadata(width, button, PropertyMetadataBuilder::new(40.0_f64).build());

        let first = registry.resolve(width, button).unwrap().default_value();
        let second = registry.resolve(width, button).unwrap().default_value();
        assert!(core::ptr::eq(first, second));
    }

    #[test]
    #[should_panic(expected = "not strictly derived")]
    fn override_on_owner_itself_panics() {
        let (mut registry, control, _, _) = setup();
        let width =
            registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());
        registry.override_metadata(width, control, PropertyMetadataBuilder::new(1.0_f64).build());
    }

    #[test]
    #[should_panic(expected = "not strictly derived")]
    fn override_on_unrelated_type_panics() {
        let (mut registry, _, button, _) = setup();
        let other = registry.register_type("Popup", None);
        let width =
            registry.register("Width", button, PropertyMetadataBuilder::new(0.0_f64).build());
        registry.override_metadata(width, other, PropertyMetadataBuilder::new(1.0_f64).build());
    }

    #[test]
    #[should_panic(expected = "already overridden")]
    fn double_override_panics() {
        let (mut registry, control, button, _) = setup();
        let width =
            registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());
        registry.override_metadata(width, button, PropertyMetadataBuilder::new(1.0_f64).build());
        registry.override_metadata(width, button, PropertyMetadataBuilder::new(2.0_f64).build());
    }

    #[test]
    #[should_panic(expected = "after resolution began")]
    fn override_after_resolution_panics() {
        let (mut registry, control, button, _) = setup();
        let width =
            registry.register("Width", control, PropertyMetadataBuilder::new(0.0_f64).build());
        let _ = registry.resolve(width, button);
        registry.override_metadata(width, button, PropertyMetadataBuilder::new(1.0_f64).build());
    }

    #[test]
    fn flags_follow_the_override() {
        let (mut registry, control, button, _) = setup();
        let width = registry.register(
            "Width",
            control,
            PropertyMetadataBuilder::new(0.0_f64)
                .affects(StructuralFlags::AFFECTS_MEASURE)
                .build(),
        );
        registry.override_metadata(
            width,
            button,
            PropertyMetadataBuilder::new(0.0_f64)
                .affects(StructuralFlags::AFFECTS_PAINT)
                .build(),
        );

        assert_eq!(registry.flags(width.id(), control), StructuralFlags::AFFECTS_MEASURE);
        assert_eq!(registry.flags(width.id(), button), StructuralFlags::AFFECTS_PAINT);
    }
}
