// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event identification types.
//!
//! A routed event's identity is the `(name, owner type)` pair held by the
//! registry; [`EventId`] is the compact runtime handle for that identity
//! and [`RoutedEvent<A>`] wraps it with a phantom argument type for
//! compile-time checked handler signatures.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// A runtime event identifier.
///
/// A lightweight handle (u16) that uniquely identifies a registered event
/// within an [`EventRegistry`](crate::EventRegistry). Two events with the
/// same name may exist for unrelated owner types; each gets its own
/// `EventId`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u16);

impl EventId {
    /// Creates an event ID from an index.
    ///
    /// Typically called by
    /// [`EventRegistry::register`](crate::EventRegistry::register) rather
    /// than directly.
    #[must_use]
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the underlying index of this event ID.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventId").field(&self.0).finish()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

/// A type-safe event key carrying the argument type as a phantom parameter.
///
/// The phantom type ensures a `RoutedEvent<PointerArgs>` only accepts
/// handlers taking `PointerArgs`; the registry guarantees the handle was
/// registered with the same `A`. Same size as [`EventId`] (2 bytes).
pub struct RoutedEvent<A> {
    id: EventId,
    _marker: PhantomData<fn() -> A>,
}

impl<A> RoutedEvent<A> {
    /// Creates a typed event key from an event ID.
    ///
    /// The caller must ensure the ID was registered with argument type `A`;
    /// mismatches surface as runtime lookup failures.
    #[must_use]
    #[inline]
    pub const fn from_id(id: EventId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Returns the underlying event ID.
    #[must_use]
    #[inline]
    pub const fn id(self) -> EventId {
        self.id
    }
}

// Manual trait implementations to avoid requiring A: Clone, etc.

impl<A> Copy for RoutedEvent<A> {}

impl<A> Clone for RoutedEvent<A> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> PartialEq for RoutedEvent<A> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<A> Eq for RoutedEvent<A> {}

impl<A> Hash for RoutedEvent<A> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<A> fmt::Debug for RoutedEvent<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutedEvent")
            .field("id", &self.id)
            .field("args", &core::any::type_name::<A>())
            .finish()
    }
}
