// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tree access surface the binding engine works against.

use midstory_property::{ErasedValue, PropertyHost, PropertyStore};

/// Access to the nodes a binding engine can reach.
///
/// The engine addresses nodes by key and never holds references to them,
/// so bindings cannot keep dead nodes alive. A key whose lookup fails is a
/// dead endpoint; bindings touching it are dropped on the next
/// propagation.
pub trait BindingHost<K: Copy + Eq> {
    /// Returns the property store of a live node.
    fn store(&self, key: K) -> Option<&PropertyStore<K>>;

    /// Returns the mutable property store of a live node.
    fn store_mut(&mut self, key: K) -> Option<&mut PropertyStore<K>>;

    /// Reads a plain named member of a node, in erased form.
    ///
    /// The default implementation knows no members; trees whose nodes
    /// expose members forward to [`PropertyHost::member`].
    fn member(&self, key: K, name: &str) -> Option<ErasedValue> {
        let _ = (key, name);
        None
    }

    /// Whether the node is currently alive.
    fn is_alive(&self, key: K) -> bool {
        self.store(key).is_some()
    }
}

/// Blanket adapter: a map-like collection of [`PropertyHost`] nodes keyed
/// by `K` can serve directly as a binding host.
impl<K, H> BindingHost<K> for hashbrown::HashMap<K, H>
where
    K: Copy + Eq + core::hash::Hash,
    H: PropertyHost<K>,
{
    fn store(&self, key: K) -> Option<&PropertyStore<K>> {
        self.get(&key).map(PropertyHost::property_store)
    }

    fn store_mut(&mut self, key: K) -> Option<&mut PropertyStore<K>> {
        self.get_mut(&key).map(PropertyHost::property_store_mut)
    }

    fn member(&self, key: K, name: &str) -> Option<ErasedValue> {
        self.get(&key).and_then(|h| h.member(name))
    }
}
