// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event registration and class handlers.

use alloc::vec::Vec;
use core::any::TypeId;
use core::cell::RefCell;
use hashbrown::HashMap;

use midstory_property::{OwnerType, TypeHierarchy};

use crate::args::{RoutedArgs, RoutingStrategy};
use crate::handlers::{HandlerThunk, erase_handler};
use crate::id::{EventId, RoutedEvent};

struct EventEntry<K> {
    name: &'static str,
    owner: OwnerType,
    strategy: RoutingStrategy,
    args_type: TypeId,
    class_handlers: Vec<(OwnerType, HandlerThunk<K>)>,
}

/// The registry of routed events and their class handlers.
///
/// Events are registered once at startup under a `(name, owner)` key.
/// A class handler attaches to a type rather than an instance, at most
/// one per `(event, type)`: during dispatch each node runs the handler
/// attached to the nearest type on its base chain, ahead of the node's
/// instance handlers. Resolution per `(event, concrete type)` is
/// memoized.
///
/// Registration mistakes are configuration errors and panic.
pub struct EventRegistry<K> {
    events: Vec<EventEntry<K>>,
    by_key: HashMap<(&'static str, OwnerType), EventId>,
    memo: RefCell<HashMap<(EventId, OwnerType), Option<HandlerThunk<K>>>>,
}

impl<K: Copy + 'static> EventRegistry<K> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            by_key: HashMap::new(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Registers a routed event carrying `A` payloads.
    ///
    /// # Panics
    ///
    /// Panics if the name is empty, if `(name, owner)` is already
    /// registered, or if the event id space overflows.
    pub fn register<A: 'static>(
        &mut self,
        name: &'static str,
        owner: OwnerType,
        strategy: RoutingStrategy,
    ) -> RoutedEvent<A> {
        assert!(!name.is_empty(), "Event name must not be empty");
        assert!(
            !self.by_key.contains_key(&(name, owner)),
            "Event {name:?} is already registered for this owner"
        );
        let index = u16::try_from(self.events.len())
            .unwrap_or_else(|_| panic!("Event id space exhausted registering {name:?}"));

        let id = EventId::new(index);
        self.events.push(EventEntry {
            name,
            owner,
            strategy,
            args_type: TypeId::of::<A>(),
            class_handlers: Vec::new(),
        });
        self.by_key.insert((name, owner), id);
        RoutedEvent::from_id(id)
    }

    /// Attaches the class handler for `(event, class)`: it runs for
    /// every node whose nearest handled base type is `class`, before the
    /// node's instance handlers.
    ///
    /// # Panics
    ///
    /// Panics if the event is not registered, if its payload type is not
    /// `A`, or if `(event, class)` already has a class handler.
    pub fn register_class_handler<A: 'static>(
        &mut self,
        event: RoutedEvent<A>,
        class: OwnerType,
        handler: fn(K, &mut RoutedArgs<A>),
    ) {
        let entry = self
            .events
            .get_mut(event.id().index() as usize)
            .unwrap_or_else(|| panic!("Event {:?} is not registered", event.id()));
        assert!(
            entry.args_type == TypeId::of::<A>(),
            "Event {:?} does not carry this payload type",
            event.id()
        );
        assert!(
            !entry.class_handlers.iter().any(|(c, _)| *c == class),
            "Event {:?} already has a class handler for this type",
            event.id()
        );
        entry.class_handlers.push((class, erase_handler(handler)));
        // Resolved handlers may now be stale.
        self.memo.borrow_mut().clear();
    }

    /// The class handler that applies to a node of the given concrete
    /// type: the one attached to the nearest type on the concrete type's
    /// base chain, if any.
    pub(crate) fn class_handler_for(
        &self,
        event: EventId,
        concrete: OwnerType,
        hierarchy: &TypeHierarchy,
    ) -> Option<HandlerThunk<K>> {
        if let Some(resolved) = self.memo.borrow().get(&(event, concrete)) {
            return resolved.clone();
        }
        let entry = self.events.get(event.index() as usize)?;
        let resolved = hierarchy.base_chain(concrete).find_map(|class| {
            entry
                .class_handlers
                .iter()
                .find(|(c, _)| *c == class)
                .map(|(_, thunk)| thunk.clone())
        });
        self.memo
            .borrow_mut()
            .insert((event, concrete), resolved.clone());
        resolved
    }

    /// Looks up an event id by `(name, owner)`.
    #[must_use]
    pub fn by_name(&self, name: &str, owner: OwnerType) -> Option<EventId> {
        self.by_key.get(&(name, owner)).copied()
    }

    /// The event's name, if registered.
    #[must_use]
    pub fn name(&self, event: EventId) -> Option<&'static str> {
        self.events.get(event.index() as usize).map(|e| e.name)
    }

    /// The type that registered the event, if registered.
    #[must_use]
    pub fn owner(&self, event: EventId) -> Option<OwnerType> {
        self.events.get(event.index() as usize).map(|e| e.owner)
    }

    /// The event's routing strategy, if registered.
    #[must_use]
    pub fn strategy(&self, event: EventId) -> Option<RoutingStrategy> {
        self.events.get(event.index() as usize).map(|e| e.strategy)
    }

    /// The [`TypeId`] of the event's payload, if registered.
    #[must_use]
    pub fn args_type(&self, event: EventId) -> Option<TypeId> {
        self.events.get(event.index() as usize).map(|e| e.args_type)
    }

    /// The number of registered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<K: Copy + 'static> Default for EventRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> core::fmt::Debug for EventRegistry<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("events", &self.events.len())
            .finish()
    }
}
