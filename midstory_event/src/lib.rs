// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routed events for Midstory trees.
//!
//! An event raised at a node does not stay there: it travels along the
//! tree and gives every node on the way a chance to react. This crate
//! provides the registry that names events, the typed [`RoutedEvent`]
//! keys that carry their payload type, and the [`Dispatcher`] that
//! builds and runs routes.
//!
//! ## Routing Strategies
//!
//! - [`Bubble`](RoutingStrategy::Bubble): origin first, then each
//!   ancestor up to the root.
//! - [`Tunnel`](RoutingStrategy::Tunnel): root first, ending at the
//!   origin.
//! - [`Direct`](RoutingStrategy::Direct): the origin only.
//! - [`TopHit`](RoutingStrategy::TopHit): an externally computed hit
//!   chain, topmost node first, via [`Dispatcher::dispatch_top_hit`].
//!
//! At every node, the class handler registered against the nearest type
//! on the node's base chain runs before the node's instance handlers.
//! Any handler can call [`RoutedArgs::mark_handled`] to stop the rest
//! of the route.
//!
//! ## Quick Start
//!
//! ```
//! use midstory_event::{Dispatcher, EventRegistry, EventTree, RoutedArgs, RoutingStrategy};
//! use midstory_property::{OwnerType, TypeHierarchy};
//!
//! // Nodes 3 -> 2 -> 1, all of one type.
//! struct Tree(OwnerType);
//!
//! impl EventTree<u32> for Tree {
//!     fn parent(&self, key: u32) -> Option<u32> {
//!         (key > 1).then(|| key - 1)
//!     }
//!
//!     fn concrete_type(&self, _key: u32) -> Option<OwnerType> {
//!         Some(self.0)
//!     }
//! }
//!
//! fn on_click(node: u32, args: &mut RoutedArgs<&'static str>) {
//!     assert_eq!(args.args, "pressed");
//!     if node == 1 {
//!         args.mark_handled();
//!     }
//! }
//!
//! let mut types = TypeHierarchy::new();
//! let control = types.register("Control", None);
//! let tree = Tree(control);
//!
//! let mut registry = EventRegistry::new();
//! let click = registry.register("Click", control, RoutingStrategy::Bubble);
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.add_handler(click, 1, on_click);
//!
//! let outcome = dispatcher.dispatch(&tree, &registry, &types, click, 3, "pressed");
//! assert!(outcome.handled());
//! ```
//!
//! Handlers are plain `fn` pointers so subscriptions can be compared and
//! removed by identity; state lives in the event payload or behind the
//! node key, not in the handler.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod args;
mod dispatch;
mod handlers;
mod id;
mod registry;
mod route;

pub use args::{RoutedArgs, RoutingStrategy};
pub use dispatch::{Dispatcher, EventTree};
pub use id::{EventId, RoutedEvent};
pub use registry::EventRegistry;
