// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property host traits.
//!
//! This module provides the [`PropertyHost`] trait for nodes that carry
//! property stores, and [`PropertyHostExt`] for convenient property access
//! methods including inheritance resolution. Hosts are identified by a
//! lookup key rather than owned references; liveness is a question the
//! surrounding tree answers, which keeps stale observers from holding nodes
//! alive.

use crate::id::Property;
use crate::registry::PropertyRegistry;
use crate::store::{PropertyStore, SetOutcome};
use crate::value::ErasedValue;

/// A lookup mechanism for walking parent chains for inheritance.
///
/// Given a node key, returns its [`PropertyStore`] and its parent key.
///
/// This is used by inheritance walking helpers such as [`walk_inherited`]
/// and [`walk_inherited_ref`], and by higher-level resolution layers.
pub trait ParentLookup<'a, K: Copy + Eq + 'a> {
    /// Looks up the store and parent key for `key`.
    fn lookup(&self, key: K) -> Option<(&'a PropertyStore<K>, Option<K>)>;
}

impl<'a, K, F> ParentLookup<'a, K> for F
where
    K: Copy + Eq + 'a,
    F: Fn(K) -> Option<(&'a PropertyStore<K>, Option<K>)>,
{
    #[inline]
    fn lookup(&self, key: K) -> Option<(&'a PropertyStore<K>, Option<K>)> {
        self(key)
    }
}

/// Walks the parent chain looking for an inherited value.
///
/// This is the canonical implementation of inheritance walking, checking
/// the local value at each ancestor. Used by
/// [`PropertyHostExt::get_inherited`] and reusable by higher-level crates.
///
/// Returns the first value found, or `None` if no ancestor has the property
/// set.
///
/// # Arguments
///
/// * `current_key` - The key to start walking from (typically `parent_key()`)
/// * `property` - The property to look for
/// * `store_lookup` - Function returning (store, `parent_key`) for a given key
pub fn walk_inherited<'a, K, T, F>(
    mut current_key: Option<K>,
    property: Property<T>,
    store_lookup: &F,
) -> Option<T>
where
    K: Copy + Eq + 'a,
    T: Clone + 'static,
    F: ParentLookup<'a, K> + ?Sized,
{
    while let Some(key) = current_key {
        if let Some((parent_store, next_parent)) = store_lookup.lookup(key) {
            if let Some(value) = parent_store.get_local(property) {
                return Some(value.clone());
            }
            current_key = next_parent;
        } else {
            break;
        }
    }
    None
}

/// Walks the parent chain looking for an inherited value, returning a
/// reference.
///
/// The borrowed variant of [`walk_inherited`].
pub fn walk_inherited_ref<'a, K, T, F>(
    mut current_key: Option<K>,
    property: Property<T>,
    store_lookup: &F,
) -> Option<&'a T>
where
    K: Copy + Eq + 'a,
    T: Clone + 'static,
    F: ParentLookup<'a, K> + ?Sized,
{
    while let Some(key) = current_key {
        if let Some((parent_store, next_parent)) = store_lookup.lookup(key) {
            if let Some(value) = parent_store.get_local(property) {
                return Some(value);
            }
            current_key = next_parent;
        } else {
            break;
        }
    }
    None
}

/// A trait for nodes that carry property stores.
///
/// This trait provides access to the node's property store and key,
/// enabling the extension methods in [`PropertyHostExt`]. The `member`
/// method is the seam the binding engine uses to read plain named members
/// that are not registered properties.
///
/// # Example
///
/// ```rust
/// use midstory_property::{PropertyHost, PropertyStore};
///
/// struct MyElement {
///     key: u32,
///     parent: Option<u32>,
///     store: PropertyStore<u32>,
/// }
///
/// impl PropertyHost<u32> for MyElement {
///     fn property_store(&self) -> &PropertyStore<u32> {
///         &self.store
///     }
///
///     fn property_store_mut(&mut self) -> &mut PropertyStore<u32> {
///         &mut self.store
///     }
///
///     fn key(&self) -> u32 {
///         self.key
///     }
///
///     fn parent_key(&self) -> Option<u32> {
///         self.parent
///     }
/// }
/// ```
pub trait PropertyHost<K: Copy + Eq> {
    /// Returns a reference to the node's property store.
    fn property_store(&self) -> &PropertyStore<K>;

    /// Returns a mutable reference to the node's property store.
    fn property_store_mut(&mut self) -> &mut PropertyStore<K>;

    /// Returns the key that identifies this node.
    fn key(&self) -> K;

    /// Returns the parent's key, if this node has a parent.
    ///
    /// This is used for property inheritance resolution.
    fn parent_key(&self) -> Option<K>;

    /// Reads a plain named member by name, in erased form.
    ///
    /// Members are one-shot binding sources: they can be read when a
    /// binding initializes but emit no change notifications. The default
    /// implementation knows no members.
    fn member(&self, name: &str) -> Option<ErasedValue> {
        let _ = name;
        None
    }
}

/// Extension methods for [`PropertyHost`].
///
/// These methods provide convenient access to property values.
pub trait PropertyHostExt<K: Copy + Eq>: PropertyHost<K> {
    /// Gets the local value only.
    ///
    /// Returns `None` if no local value is set.
    fn get_local_value<'a, T: Clone + 'static>(&'a self, property: Property<T>) -> Option<&'a T>
    where
        K: 'a,
    {
        self.property_store().get_local(property)
    }

    /// Gets the effective value (local → resolved default).
    ///
    /// Does **not** walk the tree; see [`get_inherited`](Self::get_inherited).
    fn effective_value<T: Clone + PartialEq + 'static>(
        &self,
        property: Property<T>,
        registry: &PropertyRegistry<K>,
    ) -> T {
        self.property_store().effective_value(property, registry)
    }

    /// Gets the effective value (local → resolved default), borrowed.
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered in the registry.
    fn effective_ref<'a, T: Clone + PartialEq + 'static>(
        &'a self,
        property: Property<T>,
        registry: &'a PropertyRegistry<K>,
    ) -> &'a T
    where
        K: 'a,
    {
        self.property_store().effective_ref(property, registry)
    }

    /// Gets the effective value with inheritance resolution.
    ///
    /// Resolution order:
    /// 1. This node's local value
    /// 2. If the effective metadata inherits: walk parent chain
    /// 3. Resolved metadata default
    ///
    /// # Arguments
    ///
    /// * `property` - The property to get
    /// * `registry` - The property registry containing metadata
    /// * `store_lookup` - Returns (`PropertyStore`, `parent_key`) for a given key
    ///
    /// # Example
    ///
    /// ```rust
    /// use midstory_property::{
    ///     PropertyHost, PropertyHostExt, PropertyMetadataBuilder, PropertyRegistry,
    ///     PropertyStore,
    /// };
    /// use std::collections::HashMap;
    ///
    /// let mut registry = PropertyRegistry::new();
    /// let node = registry.register_type("Node", None);
    /// let font_size = registry.register(
    ///     "FontSize",
    ///     node,
    ///     PropertyMetadataBuilder::new(12.0_f64)
    ///         .inherits(true)
    ///         .build(),
    /// );
    ///
    /// struct Element { key: u32, parent: Option<u32>, store: PropertyStore<u32> }
    /// impl PropertyHost<u32> for Element {
    ///     fn property_store(&self) -> &PropertyStore<u32> { &self.store }
    ///     fn property_store_mut(&mut self) -> &mut PropertyStore<u32> { &mut self.store }
    ///     fn key(&self) -> u32 { self.key }
    ///     fn parent_key(&self) -> Option<u32> { self.parent }
    /// }
    ///
    /// let mut parent = Element { key: 1, parent: None, store: PropertyStore::new(1, node) };
    /// let child = Element { key: 2, parent: Some(1), store: PropertyStore::new(2, node) };
    ///
    /// parent.store.set_value(font_size, 16.0, &registry);
    ///
    /// let elements: HashMap<u32, &Element> = [(1, &parent), (2, &child)].into_iter().collect();
    ///
    /// let value = child.get_inherited(font_size, &registry, &|key| {
    ///     elements.get(&key).map(|e| (e.property_store(), e.parent_key()))
    /// });
    /// assert_eq!(value, 16.0);
    /// ```
    fn get_inherited<'a, T, F>(
        &'a self,
        property: Property<T>,
        registry: &PropertyRegistry<K>,
        store_lookup: &F,
    ) -> T
    where
        K: 'a,
        T: Clone + PartialEq + 'static,
        F: ParentLookup<'a, K> + ?Sized,
    {
        if let Some(value) = self.property_store().get_local(property) {
            return value.clone();
        }

        let concrete = self.property_store().concrete_type();
        if let Some(metadata) = registry.resolve(property, concrete) {
            if metadata.inherits()
                && let Some(value) = walk_inherited(self.parent_key(), property, store_lookup)
            {
                return value;
            }
            return metadata.default_value().clone();
        }

        panic!("Property {:?} not found in registry", property.id());
    }

    /// Gets the effective value with inheritance resolution (borrowed).
    ///
    /// # Panics
    ///
    /// Panics if the property is not registered in the registry.
    fn get_inherited_ref<'a, T, F>(
        &'a self,
        property: Property<T>,
        registry: &'a PropertyRegistry<K>,
        store_lookup: &F,
    ) -> &'a T
    where
        K: 'a,
        T: Clone + PartialEq + 'static,
        F: ParentLookup<'a, K> + ?Sized,
    {
        if let Some(value) = self.property_store().get_local(property) {
            return value;
        }

        let concrete = self.property_store().concrete_type();
        if let Some(metadata) = registry.resolve(property, concrete) {
            if metadata.inherits()
                && let Some(value) = walk_inherited_ref(self.parent_key(), property, store_lookup)
            {
                return value;
            }
            return metadata.default_value();
        }

        panic!("Property {:?} not found in registry", property.id());
    }

    /// Sets a property value through the full commit pipeline.
    ///
    /// Coerces, short-circuits on equality, stores, and fires the changed
    /// callback. The caller is responsible for acting on the returned
    /// structural flags and for pushing binding updates:
    /// ```ignore
    /// let outcome = element.set_value(width, 100.0, &registry);
    /// if outcome.changed {
    ///     dirty.mark(element.key(), outcome.flags);
    /// }
    /// ```
    fn set_value<T: Clone + PartialEq + 'static>(
        &mut self,
        property: Property<T>,
        value: T,
        registry: &PropertyRegistry<K>,
    ) -> SetOutcome {
        self.property_store_mut().set_value(property, value, registry)
    }

    /// Clears the local value, reverting to the default.
    fn clear_value<T: Clone + PartialEq + 'static>(
        &mut self,
        property: Property<T>,
        registry: &PropertyRegistry<K>,
    ) -> SetOutcome {
        self.property_store_mut().clear_value(property, registry)
    }

    /// Returns `true` if the property has a local value.
    fn has_local<T: Clone + 'static>(&self, property: Property<T>) -> bool {
        self.property_store().has_local(property)
    }
}

// Blanket implementation for all PropertyHost types
impl<K: Copy + Eq, T: PropertyHost<K>> PropertyHostExt<K> for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyRegistry;
    use crate::hierarchy::OwnerType;
    use crate::metadata::PropertyMetadataBuilder;

    struct TestElement {
        key: u32,
        parent: Option<u32>,
        store: PropertyStore<u32>,
    }

    impl TestElement {
        fn new(key: u32, parent: Option<u32>, concrete: OwnerType) -> Self {
            Self {
                key,
                parent,
                store: PropertyStore::new(key, concrete),
            }
        }
    }

    impl PropertyHost<u32> for TestElement {
        fn property_store(&self) -> &PropertyStore<u32> {
            &self.store
        }

        fn property_store_mut(&mut self) -> &mut PropertyStore<u32> {
            &mut self.store
        }

        fn key(&self) -> u32 {
            self.key
        }

        fn parent_key(&self) -> Option<u32> {
            self.parent
        }

        fn member(&self, name: &str) -> Option<ErasedValue> {
            (name == "Tag").then(|| ErasedValue::new(7_i32))
        }
    }

    fn setup() -> (PropertyRegistry<u32>, OwnerType, Property<f64>) {
        let mut registry = PropertyRegistry::new();
        let node = registry.register_type("Node", None);
        let width = registry.register("Width", node, PropertyMetadataBuilder::new(0.0_f64).build());
        (registry, node, width)
    }

    #[test]
    fn ext_get_set() {
        let (registry, node, width) = setup();
        let mut element = TestElement::new(1, None, node);

        assert!(element.get_local_value(width).is_none());

        let outcome = element.set_value(width, 100.0, &registry);
        assert!(outcome.changed);
        assert_eq!(element.get_local_value(width), Some(&100.0));
    }

    #[test]
    fn ext_clear() {
        let (registry, node, width) = setup();
        let mut element = TestElement::new(1, None, node);

        element.set_value(width, 100.0, &registry);
        assert!(element.has_local(width));

        assert!(element.clear_value(width, &registry).changed);
        assert!(!element.has_local(width));
    }

    #[test]
    fn host_key() {
        let (_, node, _) = setup();
        let element = TestElement::new(42, Some(1), node);
        assert_eq!(element.key(), 42);
        assert_eq!(element.parent_key(), Some(1));
    }

    #[test]
    fn member_lookup() {
        let (_, node, _) = setup();
        let element = TestElement::new(1, None, node);
        assert_eq!(element.member("Tag").unwrap().downcast_ref::<i32>(), Some(&7));
        assert!(element.member("Missing").is_none());
    }

    #[test]
    fn ext_inheritance_from_parent() {
        let mut registry = PropertyRegistry::new();
        let node = registry.register_type("Node", None);
        let font_size = registry.register(
            "FontSize",
            node,
            PropertyMetadataBuilder::new(12.0_f64)
                .inherits(true)
                .build(),
        );

        let mut parent = TestElement::new(1, None, node);
        let child = TestElement::new(2, Some(1), node);

        parent.set_value(font_size, 16.0, &registry);

        let elements: alloc::collections::BTreeMap<u32, &TestElement> =
            [(1, &parent), (2, &child)].into_iter().collect();

        let value = child.get_inherited(font_size, &registry, &|key| {
            elements
                .get(&key)
                .map(|e| (e.property_store(), e.parent_key()))
        });
        assert_eq!(value, 16.0);
    }

    #[test]
    fn ext_inheritance_skips_unset_ancestors() {
        let mut registry = PropertyRegistry::new();
        let node = registry.register_type("Node", None);
        let font_size = registry.register(
            "FontSize",
            node,
            PropertyMetadataBuilder::new(12.0_f64)
                .inherits(true)
                .build(),
        );

        let mut root = TestElement::new(1, None, node);
        let mid = TestElement::new(2, Some(1), node);
        let leaf = TestElement::new(3, Some(2), node);

        root.set_value(font_size, 18.0, &registry);

        let elements: alloc::collections::BTreeMap<u32, &TestElement> =
            [(1, &root), (2, &mid), (3, &leaf)].into_iter().collect();

        let value = leaf.get_inherited(font_size, &registry, &|key| {
            elements
                .get(&key)
                .map(|e| (e.property_store(), e.parent_key()))
        });
        assert_eq!(value, 18.0);
    }

    #[test]
    fn ext_local_overrides_inherited() {
        let mut registry = PropertyRegistry::new();
        let node = registry.register_type("Node", None);
        let font_size = registry.register(
            "FontSize",
            node,
            PropertyMetadataBuilder::new(12.0_f64)
                .inherits(true)
                .build(),
        );

        let mut parent = TestElement::new(1, None, node);
        let mut child = TestElement::new(2, Some(1), node);

        parent.set_value(font_size, 16.0, &registry);
        child.set_value(font_size, 20.0, &registry);

        let elements: alloc::collections::BTreeMap<u32, &TestElement> =
            [(1, &parent), (2, &child)].into_iter().collect();

        let value = child.get_inherited(font_size, &registry, &|key| {
            elements
                .get(&key)
                .map(|e| (e.property_store(), e.parent_key()))
        });
        assert_eq!(value, 20.0);
    }

    #[test]
    fn ext_non_inherited_uses_default() {
        let mut registry = PropertyRegistry::new();
        let node = registry.register_type("Node", None);
        let width = registry.register(
            "Width",
            node,
            PropertyMetadataBuilder::new(100.0_f64)
                .inherits(false)
                .build(),
        );

        let mut parent = TestElement::new(1, None, node);
        let child = TestElement::new(2, Some(1), node);

        parent.set_value(width, 200.0, &registry);

        let elements: alloc::collections::BTreeMap<u32, &TestElement> =
            [(1, &parent), (2, &child)].into_iter().collect();

        let value = child.get_inherited(width, &registry, &|key| {
            elements
                .get(&key)
                .map(|e| (e.property_store(), e.parent_key()))
        });
        assert_eq!(value, 100.0); // Default, not parent's 200.0
    }

    #[test]
    fn ext_inherited_ref_borrows_from_ancestor() {
        let mut registry = PropertyRegistry::new();
        let node = registry.register_type("Node", None);
        let font_size = registry.register(
            "FontSize",
            node,
            PropertyMetadataBuilder::new(12.0_f64)
                .inherits(true)
                .build(),
        );

        let mut parent = TestElement::new(1, None, node);
        let child = TestElement::new(2, Some(1), node);

        parent.set_value(font_size, 16.0, &registry);

        let elements: alloc::collections::BTreeMap<u32, &TestElement> =
            [(1, &parent), (2, &child)].into_iter().collect();

        let value_ref = child.get_inherited_ref(font_size, &registry, &|key| {
            elements
                .get(&key)
                .map(|e| (e.property_store(), e.parent_key()))
        });

        assert!(core::ptr::eq(
            value_ref,
            parent.property_store().get_local(font_size).unwrap()
        ));
    }
}
