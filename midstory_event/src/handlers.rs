// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instance handler storage.
//!
//! Handlers are plain `fn` pointers. Each is erased once at add time into
//! a shared thunk that downcasts the argument envelope back to its typed
//! form; the pointer address doubles as the handler's identity for
//! duplicate detection and removal.

use alloc::rc::Rc;
use core::any::Any;
use core::hash::Hash;
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::args::RoutedArgs;
use crate::id::{EventId, RoutedEvent};

/// An erased handler invocation.
pub(crate) type HandlerThunk<K> = Rc<dyn Fn(K, &mut dyn Any)>;

/// The `fn` pointer address, used as the handler's identity.
#[expect(
    clippy::fn_to_numeric_cast_any,
    reason = "the address is the identity; it is never called through the integer"
)]
pub(crate) fn handler_identity<K, A>(handler: fn(K, &mut RoutedArgs<A>)) -> usize {
    handler as usize
}

/// Wraps a typed handler into an erased thunk.
pub(crate) fn erase_handler<K, A>(handler: fn(K, &mut RoutedArgs<A>)) -> HandlerThunk<K>
where
    K: Copy + 'static,
    A: 'static,
{
    Rc::new(move |node, any| {
        if let Some(args) = any.downcast_mut::<RoutedArgs<A>>() {
            handler(node, args);
        }
    })
}

struct HandlerEntry<K> {
    identity: usize,
    thunk: HandlerThunk<K>,
}

/// Per-`(event, node)` instance handler lists, in subscription order.
pub(crate) struct HandlerTable<K> {
    entries: HashMap<(EventId, K), SmallVec<[HandlerEntry<K>; 2]>>,
}

impl<K: Copy + Eq + Hash + 'static> HandlerTable<K> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds a handler; returns `false` if the same handler is already
    /// subscribed for this `(event, node)`.
    pub(crate) fn add<A: 'static>(
        &mut self,
        event: RoutedEvent<A>,
        node: K,
        handler: fn(K, &mut RoutedArgs<A>),
    ) -> bool {
        let identity = handler_identity(handler);
        let entries = self.entries.entry((event.id(), node)).or_default();
        if entries.iter().any(|e| e.identity == identity) {
            return false;
        }
        entries.push(HandlerEntry {
            identity,
            thunk: erase_handler(handler),
        });
        true
    }

    /// Removes a handler; returns `false` if it was not subscribed.
    /// Removing twice is safe.
    pub(crate) fn remove<A: 'static>(
        &mut self,
        event: RoutedEvent<A>,
        node: K,
        handler: fn(K, &mut RoutedArgs<A>),
    ) -> bool {
        let identity = handler_identity(handler);
        let Some(entries) = self.entries.get_mut(&(event.id(), node)) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.identity != identity);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.entries.remove(&(event.id(), node));
        }
        removed
    }

    /// Iterates the thunks subscribed for an `(event, node)` pair.
    pub(crate) fn thunks(
        &self,
        event: EventId,
        node: K,
    ) -> impl Iterator<Item = &HandlerThunk<K>> {
        self.entries
            .get(&(event, node))
            .into_iter()
            .flat_map(|entries| entries.iter().map(|e| &e.thunk))
    }

    /// Drops every handler a dead node subscribed for an event.
    pub(crate) fn purge(&mut self, event: EventId, node: K) {
        self.entries.remove(&(event, node));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K> core::fmt::Debug for HandlerTable<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("subscriptions", &self.entries.len())
            .finish()
    }
}
