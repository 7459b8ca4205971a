// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Midstory Property: Core dependency property storage.
//!
//! This crate provides the foundation for a dependency property system:
//! an owner-type hierarchy, a process-lifetime property registry with
//! per-type metadata overrides, and sparse per-node value storage with a
//! coerce/notify write pipeline. Data binding lives in `midstory_binding`
//! and value conversion in `midstory_convert`.
//!
//! ## Core Concepts
//!
//! ### Property Identity
//!
//! A property is identified by `(name, owner type)` within a
//! [`TypeHierarchy`]. Unrelated types may each register a property with the
//! same name without collision. Registration hands back a compact
//! [`PropertyId`] wrapped in a type-safe [`Property<T>`] key.
//!
//! ### Metadata Resolution
//!
//! [`PropertyMetadata`] holds the default value, inheritance and
//! structural-impact flags, and coercion and changed callbacks. Derived
//! owner types may override metadata without creating a new property;
//! [`PropertyRegistry::resolve`] walks the concrete type's base chain to
//! the nearest override and memoizes the result.
//!
//! ### Property Storage
//!
//! [`PropertyStore`] holds explicitly set values per node, sparsely.
//! [`PropertyStore::set_value`] runs the full commit pipeline: coerce,
//! equality short-circuit, store, changed callback. Inheritance across the
//! tree is handled by [`PropertyHostExt::get_inherited`].
//!
//! ## Quick Start
//!
//! ```rust
//! use midstory_property::{
//!     Property, PropertyMetadataBuilder, PropertyRegistry, PropertyStore, StructuralFlags,
//! };
//!
//! // Register owner types and properties at startup.
//! let mut registry = PropertyRegistry::new();
//! let control = registry.register_type("Control", None);
//! let width: Property<f64> = registry.register(
//!     "Width",
//!     control,
//!     PropertyMetadataBuilder::new(0.0_f64)
//!         .affects(StructuralFlags::AFFECTS_MEASURE)
//!         .coerce(|v: f64| Some(v.max(0.0)))
//!         .build(),
//! );
//!
//! // Create a property store for a node.
//! let mut store = PropertyStore::<u32>::new(1, control);
//!
//! // Writes run the commit pipeline.
//! let outcome = store.set_value(width, -10.0, &registry);
//! assert!(outcome.changed);
//! assert_eq!(store.get_local(width), Some(&0.0)); // coerced
//! assert!(outcome.flags.contains(StructuralFlags::AFFECTS_MEASURE));
//!
//! // Effective value falls back to the resolved default.
//! store.clear_value(width, &registry);
//! assert_eq!(store.effective_value(width, &registry), 0.0);
//! ```
//!
//! ## Memory Optimizations
//!
//! | Optimization | Description |
//! |--------------|-------------|
//! | **Sparse storage** | `PropertyStore` only allocates for non-default properties |
//! | **Shared defaults** | Default values stored in registry, not per-node |
//! | **Inline storage** | `SmallVec` for small property counts |
//! | **`PropertyId` as u16** | Compact property identification |
//! | **Memoized resolution** | Base-chain walks run once per `(property, type)` |
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod hierarchy;
mod host;
mod id;
mod metadata;
mod registry;
mod store;
mod value;

pub use hierarchy::{OwnerType, TypeHierarchy};
pub use host::{ParentLookup, PropertyHost, PropertyHostExt, walk_inherited, walk_inherited_ref};
pub use id::{Property, PropertyId};
pub use metadata::{
    CoerceValueCallback, PropertyChangedCallback, PropertyMetadata, PropertyMetadataBuilder,
    StructuralFlags,
};
pub use registry::{PropertyRegistration, PropertyRegistry};
pub use store::{PropertyStore, SetOutcome};
pub use value::ErasedValue;
