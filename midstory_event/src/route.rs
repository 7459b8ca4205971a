// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built routes and their reuse pool.

use alloc::vec::Vec;

use crate::handlers::HandlerThunk;

/// A fully built route: the ordered handler invocations for one dispatch.
pub(crate) struct EventRoute<K> {
    steps: Vec<(K, HandlerThunk<K>)>,
}

impl<K: Copy> EventRoute<K> {
    fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub(crate) fn push(&mut self, node: K, thunk: HandlerThunk<K>) {
        self.steps.push((node, thunk));
    }

    pub(crate) fn steps(&self) -> impl Iterator<Item = (K, &HandlerThunk<K>)> {
        self.steps.iter().map(|(node, thunk)| (*node, thunk))
    }

    fn clear(&mut self) {
        self.steps.clear();
    }
}

/// Maximum number of idle routes the pool retains.
const MAX_POOLED: usize = 8;

/// Recycles route allocations between dispatches.
///
/// Releasing a route clears its steps but keeps the backing capacity, so
/// steady-state dispatch does not allocate. The pool never holds more
/// than [`MAX_POOLED`] idle routes.
pub(crate) struct RoutePool<K> {
    idle: Vec<EventRoute<K>>,
}

impl<K: Copy> RoutePool<K> {
    pub(crate) fn new() -> Self {
        Self { idle: Vec::new() }
    }

    pub(crate) fn acquire(&mut self) -> EventRoute<K> {
        self.idle.pop().unwrap_or_else(EventRoute::new)
    }

    pub(crate) fn release(&mut self, mut route: EventRoute<K>) {
        if self.idle.len() < MAX_POOLED {
            route.clear();
            self.idle.push(route);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle_len(&self) -> usize {
        self.idle.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;

    fn noop_thunk() -> HandlerThunk<u32> {
        Rc::new(|_, _| {})
    }

    #[test]
    fn released_routes_come_back_empty() {
        let mut pool: RoutePool<u32> = RoutePool::new();
        let mut route = pool.acquire();
        route.push(1, noop_thunk());
        route.push(2, noop_thunk());
        pool.release(route);

        let route = pool.acquire();
        assert_eq!(route.steps().count(), 0);
        pool.release(route);
        assert_eq!(pool.idle_len(), 1);
    }

    #[test]
    fn pool_is_bounded() {
        let mut pool: RoutePool<u32> = RoutePool::new();
        let routes: alloc::vec::Vec<_> = (0..MAX_POOLED + 3).map(|_| pool.acquire()).collect();
        for route in routes {
            pool.release(route);
        }
        assert_eq!(pool.idle_len(), MAX_POOLED);
    }
}
