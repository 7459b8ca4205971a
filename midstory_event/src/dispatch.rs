// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route construction and event dispatch.

use core::any::{Any, TypeId};
use core::hash::Hash;
use smallvec::SmallVec;

use midstory_property::{OwnerType, TypeHierarchy};

use crate::args::{RoutedArgs, RoutingStrategy};
use crate::handlers::HandlerTable;
use crate::id::RoutedEvent;
use crate::registry::EventRegistry;
use crate::route::RoutePool;

/// Read access to the tree an event routes through.
///
/// The dispatcher never stores keys; it asks the tree for parents and
/// liveness at dispatch time, so stale keys are harmless.
pub trait EventTree<K: Copy + Eq> {
    /// The node's parent, or `None` at the root.
    fn parent(&self, key: K) -> Option<K>;

    /// The node's concrete type, or `None` if the node is gone.
    fn concrete_type(&self, key: K) -> Option<OwnerType>;

    /// Whether the key still names a live node.
    fn is_alive(&self, key: K) -> bool {
        self.concrete_type(key).is_some()
    }
}

/// Builds routes and runs handlers for routed events.
///
/// Per node the order is the class handler (nearest type on the node's
/// base chain), then instance handlers in subscription order. A handler
/// that marks the envelope handled stops the remainder of the route.
/// Route allocations are recycled through a small pool.
pub struct Dispatcher<K> {
    handlers: HandlerTable<K>,
    pool: RoutePool<K>,
}

impl<K: Copy + Eq + Hash + 'static> Dispatcher<K> {
    /// Creates a dispatcher with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HandlerTable::new(),
            pool: RoutePool::new(),
        }
    }

    /// Subscribes an instance handler for `(event, node)`.
    ///
    /// Returns `false` if the same handler is already subscribed there.
    pub fn add_handler<A: 'static>(
        &mut self,
        event: RoutedEvent<A>,
        node: K,
        handler: fn(K, &mut RoutedArgs<A>),
    ) -> bool {
        self.handlers.add(event, node, handler)
    }

    /// Unsubscribes an instance handler. Returns `false` if it was not
    /// subscribed; removing twice is safe.
    pub fn remove_handler<A: 'static>(
        &mut self,
        event: RoutedEvent<A>,
        node: K,
        handler: fn(K, &mut RoutedArgs<A>),
    ) -> bool {
        self.handlers.remove(event, node, handler)
    }

    /// Raises an event at `origin` and routes it per the event's
    /// strategy: `Bubble` walks origin to root, `Tunnel` root to origin,
    /// `Direct` stays at the origin. Returns the envelope so the caller
    /// can inspect the payload and the handled flag.
    ///
    /// # Panics
    ///
    /// Panics if the event is not registered, if its payload type is not
    /// `A`, or if its strategy is [`RoutingStrategy::TopHit`]; top-hit
    /// events route through [`Dispatcher::dispatch_top_hit`].
    pub fn dispatch<A: 'static>(
        &mut self,
        tree: &impl EventTree<K>,
        registry: &EventRegistry<K>,
        hierarchy: &TypeHierarchy,
        event: RoutedEvent<A>,
        origin: K,
        args: A,
    ) -> RoutedArgs<A> {
        let strategy = self.check_event(registry, event);
        assert!(
            strategy != RoutingStrategy::TopHit,
            "Event {:?} is top-hit routed; use dispatch_top_hit",
            event.id()
        );

        let mut chain: SmallVec<[K; 8]> = SmallVec::new();
        match strategy {
            RoutingStrategy::Direct => chain.push(origin),
            RoutingStrategy::Bubble | RoutingStrategy::Tunnel => {
                let mut cursor = Some(origin);
                while let Some(node) = cursor {
                    chain.push(node);
                    cursor = tree.parent(node);
                }
            }
            RoutingStrategy::TopHit => unreachable!(),
        }
        if strategy == RoutingStrategy::Tunnel {
            chain.reverse();
        }

        self.run(tree, registry, hierarchy, event, &chain, args)
    }

    /// Raises a top-hit event over an externally computed chain, topmost
    /// node first. Hit testing is the caller's concern; the dispatcher
    /// only runs the handlers in the order given.
    ///
    /// # Panics
    ///
    /// Panics if the event is not registered, if its payload type is not
    /// `A`, or if its strategy is not [`RoutingStrategy::TopHit`].
    pub fn dispatch_top_hit<A: 'static>(
        &mut self,
        tree: &impl EventTree<K>,
        registry: &EventRegistry<K>,
        hierarchy: &TypeHierarchy,
        event: RoutedEvent<A>,
        chain: &[K],
        args: A,
    ) -> RoutedArgs<A> {
        let strategy = self.check_event(registry, event);
        assert!(
            strategy == RoutingStrategy::TopHit,
            "Event {:?} is not top-hit routed",
            event.id()
        );
        self.run(tree, registry, hierarchy, event, chain, args)
    }

    fn check_event<A: 'static>(
        &self,
        registry: &EventRegistry<K>,
        event: RoutedEvent<A>,
    ) -> RoutingStrategy {
        let strategy = registry
            .strategy(event.id())
            .unwrap_or_else(|| panic!("Event {:?} is not registered", event.id()));
        assert!(
            registry.args_type(event.id()) == Some(TypeId::of::<A>()),
            "Event {:?} does not carry this payload type",
            event.id()
        );
        strategy
    }

    fn run<A: 'static>(
        &mut self,
        tree: &impl EventTree<K>,
        registry: &EventRegistry<K>,
        hierarchy: &TypeHierarchy,
        event: RoutedEvent<A>,
        chain: &[K],
        args: A,
    ) -> RoutedArgs<A> {
        let mut route = self.pool.acquire();
        for &node in chain {
            match tree.concrete_type(node) {
                Some(concrete) => {
                    if let Some(thunk) = registry.class_handler_for(event.id(), concrete, hierarchy)
                    {
                        route.push(node, thunk);
                    }
                    for thunk in self.handlers.thunks(event.id(), node) {
                        route.push(node, thunk.clone());
                    }
                }
                // The node is gone; its subscriptions are stale.
                None => self.handlers.purge(event.id(), node),
            }
        }

        let mut envelope = RoutedArgs::new(args);
        for (node, thunk) in route.steps() {
            thunk(node, &mut envelope as &mut dyn Any);
            if envelope.handled() {
                break;
            }
        }
        self.pool.release(route);
        envelope
    }
}

impl<K: Copy + Eq + Hash + 'static> Default for Dispatcher<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> core::fmt::Debug for Dispatcher<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use hashbrown::HashMap;

    struct Tree {
        parents: HashMap<u32, u32>,
        alive: HashMap<u32, OwnerType>,
    }

    impl EventTree<u32> for Tree {
        fn parent(&self, key: u32) -> Option<u32> {
            self.parents.get(&key).copied()
        }

        fn concrete_type(&self, key: u32) -> Option<OwnerType> {
            self.alive.get(&key).copied()
        }
    }

    const ROOT: u32 = 1;
    const MID: u32 = 2;
    const LEAF: u32 = 3;

    struct Fixture {
        types: TypeHierarchy,
        registry: EventRegistry<u32>,
        tree: Tree,
        panel: OwnerType,
        button: OwnerType,
    }

    /// Root (Panel) <- Mid (Panel) <- Leaf (Button).
    fn fixture() -> Fixture {
        let mut types = TypeHierarchy::new();
        let control = types.register("Control", None);
        let panel = types.register("Panel", Some(control));
        let button = types.register("Button", Some(control));

        let mut parents = HashMap::new();
        parents.insert(MID, ROOT);
        parents.insert(LEAF, MID);
        let mut alive = HashMap::new();
        alive.insert(ROOT, panel);
        alive.insert(MID, panel);
        alive.insert(LEAF, button);

        Fixture {
            types,
            registry: EventRegistry::new(),
            tree: Tree { parents, alive },
            panel,
            button,
        }
    }

    type Trace = Vec<(u32, &'static str)>;

    fn record(node: u32, args: &mut RoutedArgs<Trace>) {
        args.args.push((node, "instance"));
    }

    fn record_second(node: u32, args: &mut RoutedArgs<Trace>) {
        args.args.push((node, "second"));
    }

    fn record_class(node: u32, args: &mut RoutedArgs<Trace>) {
        args.args.push((node, "class"));
    }

    fn record_base_class(node: u32, args: &mut RoutedArgs<Trace>) {
        args.args.push((node, "base-class"));
    }

    fn consume(node: u32, args: &mut RoutedArgs<Trace>) {
        args.args.push((node, "consumed"));
        args.mark_handled();
    }

    #[test]
    fn bubble_walks_origin_to_root() {
        let mut f = fixture();
        let click = f
            .registry
            .register("Click", f.button, RoutingStrategy::Bubble);
        let mut dispatcher = Dispatcher::new();
        for node in [ROOT, MID, LEAF] {
            dispatcher.add_handler(click, node, record);
        }

        let envelope =
            dispatcher.dispatch(&f.tree, &f.registry, &f.types, click, LEAF, Trace::new());
        assert_eq!(
            envelope.args,
            [(LEAF, "instance"), (MID, "instance"), (ROOT, "instance")]
        );
        assert!(!envelope.handled());
    }

    #[test]
    fn tunnel_walks_root_to_origin() {
        let mut f = fixture();
        let preview = f
            .registry
            .register("PreviewClick", f.button, RoutingStrategy::Tunnel);
        let mut dispatcher = Dispatcher::new();
        for node in [ROOT, MID, LEAF] {
            dispatcher.add_handler(preview, node, record);
        }

        let envelope =
            dispatcher.dispatch(&f.tree, &f.registry, &f.types, preview, LEAF, Trace::new());
        assert_eq!(
            envelope.args,
            [(ROOT, "instance"), (MID, "instance"), (LEAF, "instance")]
        );
    }

    #[test]
    fn direct_stays_at_the_origin() {
        let mut f = fixture();
        let focus = f
            .registry
            .register("GotFocus", f.button, RoutingStrategy::Direct);
        let mut dispatcher = Dispatcher::new();
        for node in [ROOT, MID, LEAF] {
            dispatcher.add_handler(focus, node, record);
        }

        let envelope =
            dispatcher.dispatch(&f.tree, &f.registry, &f.types, focus, MID, Trace::new());
        assert_eq!(envelope.args, [(MID, "instance")]);
    }

    #[test]
    fn handled_stops_the_route() {
        let mut f = fixture();
        let click = f
            .registry
            .register("Click", f.button, RoutingStrategy::Bubble);
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_handler(click, LEAF, record);
        dispatcher.add_handler(click, MID, consume);
        dispatcher.add_handler(click, ROOT, record);

        let envelope =
            dispatcher.dispatch(&f.tree, &f.registry, &f.types, click, LEAF, Trace::new());
        assert_eq!(envelope.args, [(LEAF, "instance"), (MID, "consumed")]);
        assert!(envelope.handled());
    }

    #[test]
    fn handled_stops_within_a_node() {
        let mut f = fixture();
        let click = f
            .registry
            .register("Click", f.button, RoutingStrategy::Direct);
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_handler(click, LEAF, consume);
        dispatcher.add_handler(click, LEAF, record_second);

        let envelope =
            dispatcher.dispatch(&f.tree, &f.registry, &f.types, click, LEAF, Trace::new());
        assert_eq!(envelope.args, [(LEAF, "consumed")]);
    }

    #[test]
    fn class_handler_runs_before_instance_handlers() {
        let mut f = fixture();
        let click = f
            .registry
            .register("Click", f.button, RoutingStrategy::Bubble);
        // Button's own handler shadows the Control one at Leaf; the
        // Panel nodes fall back to the Control handler.
        let control = f.types.base_chain(f.button).nth(1).unwrap();
        f.registry.register_class_handler(click, control, record_base_class);
        f.registry.register_class_handler(click, f.button, record_class);
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_handler(click, LEAF, record);

        let envelope =
            dispatcher.dispatch(&f.tree, &f.registry, &f.types, click, LEAF, Trace::new());
        assert_eq!(
            envelope.args,
            [
                (LEAF, "class"),
                (LEAF, "instance"),
                (MID, "base-class"),
                (ROOT, "base-class"),
            ]
        );
    }

    #[test]
    fn dead_nodes_are_skipped_and_purged() {
        let mut f = fixture();
        let click = f
            .registry
            .register("Click", f.button, RoutingStrategy::Bubble);
        let mut dispatcher = Dispatcher::new();
        for node in [ROOT, MID, LEAF] {
            dispatcher.add_handler(click, node, record);
        }
        f.tree.alive.remove(&MID);

        let envelope =
            dispatcher.dispatch(&f.tree, &f.registry, &f.types, click, LEAF, Trace::new());
        assert_eq!(envelope.args, [(LEAF, "instance"), (ROOT, "instance")]);

        // The dead node's subscription was dropped; reviving the node
        // does not bring its handler back.
        f.tree.alive.insert(MID, f.panel);
        let envelope =
            dispatcher.dispatch(&f.tree, &f.registry, &f.types, click, LEAF, Trace::new());
        assert_eq!(envelope.args, [(LEAF, "instance"), (ROOT, "instance")]);
    }

    #[test]
    fn duplicate_add_and_double_remove() {
        let mut f = fixture();
        let click = f
            .registry
            .register("Click", f.button, RoutingStrategy::Bubble);
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.add_handler(click, LEAF, record));
        assert!(!dispatcher.add_handler(click, LEAF, record));
        assert!(dispatcher.remove_handler(click, LEAF, record));
        assert!(!dispatcher.remove_handler(click, LEAF, record));

        let envelope =
            dispatcher.dispatch(&f.tree, &f.registry, &f.types, click, LEAF, Trace::new());
        assert!(envelope.args.is_empty());
    }

    #[test]
    fn top_hit_follows_the_supplied_chain() {
        let mut f = fixture();
        let wheel = f
            .registry
            .register("Wheel", f.button, RoutingStrategy::TopHit);
        let mut dispatcher = Dispatcher::new();
        for node in [ROOT, MID, LEAF] {
            dispatcher.add_handler(wheel, node, record);
        }

        // Topmost hit first; the tree's parent edges play no part.
        let envelope = dispatcher.dispatch_top_hit(
            &f.tree,
            &f.registry,
            &f.types,
            wheel,
            &[MID, LEAF, ROOT],
            Trace::new(),
        );
        assert_eq!(
            envelope.args,
            [(MID, "instance"), (LEAF, "instance"), (ROOT, "instance")]
        );
    }

    #[test]
    fn top_hit_consumption_spares_the_nodes_below() {
        let mut f = fixture();
        let wheel = f
            .registry
            .register("Wheel", f.button, RoutingStrategy::TopHit);
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_handler(wheel, MID, consume);
        dispatcher.add_handler(wheel, LEAF, record);

        let envelope = dispatcher.dispatch_top_hit(
            &f.tree,
            &f.registry,
            &f.types,
            wheel,
            &[MID, LEAF],
            Trace::new(),
        );
        assert_eq!(envelope.args, [(MID, "consumed")]);
    }

    #[test]
    #[should_panic(expected = "top-hit routed; use dispatch_top_hit")]
    fn plain_dispatch_of_a_top_hit_event_panics() {
        let mut f = fixture();
        let wheel = f
            .registry
            .register("Wheel", f.button, RoutingStrategy::TopHit);
        let mut dispatcher = Dispatcher::new();
        let _ = dispatcher.dispatch(&f.tree, &f.registry, &f.types, wheel, LEAF, Trace::new());
    }

    #[test]
    #[should_panic(expected = "is not top-hit routed")]
    fn top_hit_entry_point_rejects_other_strategies() {
        let mut f = fixture();
        let click = f
            .registry
            .register("Click", f.button, RoutingStrategy::Bubble);
        let mut dispatcher = Dispatcher::new();
        let _ = dispatcher.dispatch_top_hit(
            &f.tree,
            &f.registry,
            &f.types,
            click,
            &[LEAF],
            Trace::new(),
        );
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn unregistered_event_panics() {
        let f = fixture();
        let mut dispatcher: Dispatcher<u32> = Dispatcher::new();
        let forged: RoutedEvent<Trace> = RoutedEvent::from_id(crate::id::EventId::new(42));
        let _ = dispatcher.dispatch(&f.tree, &f.registry, &f.types, forged, LEAF, Trace::new());
    }
}
