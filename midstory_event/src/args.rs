// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing strategies and the handler argument envelope.

use core::fmt;

/// How an event travels through the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RoutingStrategy {
    /// Root to origin: ancestors see the event before the origin does.
    Tunnel,
    /// Origin to root: the origin sees the event first, then each ancestor.
    Bubble,
    /// The origin node only; no traversal.
    Direct,
    /// The topmost hit node first, then the rest of an externally supplied
    /// hit chain. Dispatched through
    /// [`Dispatcher::dispatch_top_hit`](crate::Dispatcher::dispatch_top_hit).
    TopHit,
}

/// The envelope handed to every handler on a route.
///
/// Wraps the event's argument payload with the `handled` flag. A handler
/// that calls [`mark_handled`](Self::mark_handled) stops the route
/// immediately: no later handler runs, not even on the same node.
#[derive(Debug)]
pub struct RoutedArgs<A> {
    handled: bool,
    /// The event's argument payload.
    pub args: A,
}

impl<A> RoutedArgs<A> {
    /// Wraps a payload in an unhandled envelope.
    #[must_use]
    pub fn new(args: A) -> Self {
        Self {
            handled: false,
            args,
        }
    }

    /// Whether a handler has marked the event handled.
    #[must_use]
    #[inline]
    pub fn handled(&self) -> bool {
        self.handled
    }

    /// Marks the event handled, stopping the route after this handler.
    #[inline]
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    /// Unwraps the payload.
    #[must_use]
    pub fn into_args(self) -> A {
        self.args
    }
}

impl<A: fmt::Display> fmt::Display for RoutedArgs<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.args, if self.handled { " (handled)" } else { "" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unhandled() {
        let args = RoutedArgs::new(5_i32);
        assert!(!args.handled());
        assert_eq!(args.args, 5);
    }

    #[test]
    fn mark_handled_sticks() {
        let mut args = RoutedArgs::new(());
        args.mark_handled();
        assert!(args.handled());
    }
}
