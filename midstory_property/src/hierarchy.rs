// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owner-type identification and base-chain walking.
//!
//! UI node types are registered explicitly at startup together with an
//! optional base link, giving the property and event registries a
//! reflection-free way to answer "is `Button` derived from `Control`?" and
//! to walk from a concrete type toward the root of its hierarchy.

use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;

/// A registered UI-node type.
///
/// This is a lightweight handle (u16) identifying a type in a
/// [`TypeHierarchy`]. Owner types are registered once during startup and
/// never removed.
///
/// # Example
///
/// ```rust
/// use midstory_property::TypeHierarchy;
///
/// let mut types = TypeHierarchy::new();
/// let control = types.register("Control", None);
/// let button = types.register("Button", Some(control));
///
/// assert!(types.is_derived_from(button, control));
/// assert!(!types.is_derived_from(control, button));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerType(u16);

impl OwnerType {
    /// Returns the underlying index of this owner type.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnerType").field(&self.0).finish()
    }
}

struct TypeEntry {
    name: &'static str,
    base: Option<OwnerType>,
}

/// The registered type table with declared base links.
///
/// Registration is a one-time, startup-phase activity; afterwards the table
/// is read-only and safe to share. There is no removal operation.
#[derive(Default)]
pub struct TypeHierarchy {
    entries: Vec<TypeEntry>,
    by_name: HashMap<&'static str, OwnerType>,
}

impl TypeHierarchy {
    /// Creates a new empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type with an optional base link.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or already registered, or if more than
    /// 65,536 types are registered.
    pub fn register(&mut self, name: &'static str, base: Option<OwnerType>) -> OwnerType {
        assert!(!name.is_empty(), "Owner type name must not be empty");
        assert!(
            !self.by_name.contains_key(name),
            "Owner type '{name}' is already registered"
        );
        assert!(
            self.entries.len() < u16::MAX as usize,
            "Too many owner types registered (max {})",
            u16::MAX
        );
        if let Some(base) = base {
            assert!(
                (base.index() as usize) < self.entries.len(),
                "Base type {base:?} is not registered"
            );
        }

        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = OwnerType(self.entries.len() as u16);
        self.entries.push(TypeEntry { name, base });
        self.by_name.insert(name, id);
        id
    }

    /// Returns the number of registered types.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the name of a registered type.
    #[must_use]
    pub fn name(&self, ty: OwnerType) -> Option<&'static str> {
        self.entries.get(ty.index() as usize).map(|e| e.name)
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<OwnerType> {
        self.by_name.get(name).copied()
    }

    /// Returns the declared base of a type, if any.
    #[must_use]
    pub fn base(&self, ty: OwnerType) -> Option<OwnerType> {
        self.entries.get(ty.index() as usize).and_then(|e| e.base)
    }

    /// Returns `true` when `ty` is `ancestor` or has `ancestor` on its base chain.
    #[must_use]
    pub fn is_derived_from(&self, ty: OwnerType, ancestor: OwnerType) -> bool {
        self.base_chain(ty).any(|t| t == ancestor)
    }

    /// Walks from `ty` to the root of its hierarchy, yielding `ty` first.
    pub fn base_chain(&self, ty: OwnerType) -> impl Iterator<Item = OwnerType> + '_ {
        BaseChain {
            hierarchy: self,
            current: Some(ty),
        }
    }
}

impl fmt::Debug for TypeHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHierarchy")
            .field("count", &self.entries.len())
            .field("types", &self.by_name.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct BaseChain<'a> {
    hierarchy: &'a TypeHierarchy,
    current: Option<OwnerType>,
}

impl Iterator for BaseChain<'_> {
    type Item = OwnerType;

    fn next(&mut self) -> Option<Self::Item> {
        let ty = self.current?;
        self.current = self.hierarchy.base(ty);
        Some(ty)
    }
}
