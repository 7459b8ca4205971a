// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The binding engine: establishment, propagation, and teardown.

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::hash::Hash;
use hashbrown::HashMap;
use smallvec::SmallVec;

use midstory_convert::{Converter, ConverterRegistry};
use midstory_property::{
    ErasedValue, Property, PropertyId, PropertyRegistry, SetOutcome, StructuralFlags,
};

use crate::error::BindError;
use crate::host::BindingHost;

/// The direction(s) a binding moves values in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BindingMode {
    /// Source changes flow to the target.
    OneWay,
    /// Changes flow both ways; the initial push goes source to target.
    TwoWay,
    /// Target changes flow to the source.
    OneWayToSource,
    /// The source value is pushed once at establishment, then the binding
    /// is inert.
    OneTime,
}

/// The source end of a binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BindingSource<K> {
    /// A dependency property on a node. Participates in live binding
    /// modes.
    Property(K, PropertyId),
    /// A plain named member on a node. Members emit no change
    /// notifications, so they can only source
    /// [`BindingMode::OneTime`] bindings.
    Member(K, &'static str),
}

/// A handle to an established binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindingId(u32);

impl core::fmt::Display for BindingId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "binding#{}", self.0)
    }
}

#[derive(Clone)]
struct BindingState<K> {
    mode: BindingMode,
    source: BindingSource<K>,
    target: (K, PropertyId),
    /// Explicit converter; `None` resolves through the registry per push.
    converter: Option<Arc<dyn Converter>>,
}

enum Push {
    Changed,
    Unchanged,
    Dead,
}

/// The binding engine.
///
/// Owns the set of live bindings and moves values between endpoints when
/// notified of property changes. Endpoints are node keys resolved through
/// a [`BindingHost`] on every touch, so the engine never keeps nodes
/// alive; a binding whose endpoint has disappeared is dropped the next
/// time propagation reaches it.
///
/// Propagation terminates through the property store's equality
/// short-circuit: a push whose converted value equals the current
/// effective value writes nothing and schedules nothing. A lossy
/// conversion pair in a two-way binding may bounce one extra hop before
/// the values agree.
///
/// # Example
///
/// ```rust
/// use hashbrown::HashMap;
/// use midstory_binding::{BindingEngine, BindingMode, BindingSource};
/// use midstory_convert::ConverterRegistry;
/// use midstory_property::{
///     PropertyHost, PropertyMetadataBuilder, PropertyRegistry, PropertyStore,
/// };
///
/// struct Element { key: u32, store: PropertyStore<u32> }
/// impl PropertyHost<u32> for Element {
///     fn property_store(&self) -> &PropertyStore<u32> { &self.store }
///     fn property_store_mut(&mut self) -> &mut PropertyStore<u32> { &mut self.store }
///     fn key(&self) -> u32 { self.key }
///     fn parent_key(&self) -> Option<u32> { None }
/// }
///
/// let mut registry = PropertyRegistry::new();
/// let node = registry.register_type("Node", None);
/// let count = registry.register("Count", node, PropertyMetadataBuilder::new(0_i32).build());
/// let converters = ConverterRegistry::new();
///
/// let mut tree: HashMap<u32, Element> = [1, 2]
///     .into_iter()
///     .map(|k| (k, Element { key: k, store: PropertyStore::new(k, node) }))
///     .collect();
///
/// let mut engine = BindingEngine::new();
/// engine
///     .bind(
///         &mut tree,
///         &registry,
///         &converters,
///         BindingSource::Property(1, count.id()),
///         (2, count.id()),
///         BindingMode::OneWay,
///     )
///     .unwrap();
///
/// engine.set_property(&mut tree, &registry, &converters, 1, count, 7);
/// assert_eq!(tree[&2].store.effective_value(count, &registry), 7);
/// ```
pub struct BindingEngine<K> {
    slots: Vec<Option<BindingState<K>>>,
    free: Vec<u32>,
    /// Bindings that react to a source property change, keyed by source.
    by_source: HashMap<(K, PropertyId), SmallVec<[BindingId; 2]>>,
    /// Bindings that react to a target property change, keyed by target.
    by_target: HashMap<(K, PropertyId), SmallVec<[BindingId; 2]>>,
}

impl<K> Default for BindingEngine<K> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_source: HashMap::new(),
            by_target: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> BindingEngine<K> {
    /// Creates a new empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns `true` if no bindings are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the handle refers to a live binding.
    #[must_use]
    pub fn is_bound(&self, id: BindingId) -> bool {
        self.slots
            .get(id.0 as usize)
            .is_some_and(|slot| slot.is_some())
    }

    /// Returns the mode of a live binding.
    #[must_use]
    pub fn mode(&self, id: BindingId) -> Option<BindingMode> {
        self.slots.get(id.0 as usize)?.as_ref().map(|s| s.mode)
    }

    /// Establishes a binding from `source` to the target property.
    ///
    /// Endpoints are validated (registered properties, live nodes, a
    /// conversion path for each requested direction), then the initial
    /// transfer runs: source to target for every mode except
    /// [`OneWayToSource`](BindingMode::OneWayToSource), which pushes
    /// target to source. The initial transfer cascades into other
    /// bindings like any other change.
    ///
    /// # Errors
    ///
    /// See [`BindError`] for the conditions reported.
    pub fn bind<H: BindingHost<K>>(
        &mut self,
        host: &mut H,
        registry: &PropertyRegistry<K>,
        converters: &ConverterRegistry,
        source: BindingSource<K>,
        target: (K, PropertyId),
        mode: BindingMode,
    ) -> Result<BindingId, BindError> {
        self.bind_inner(host, registry, converters, source, target, mode, None)
    }

    /// Establishes a binding that moves values through the given
    /// converter instead of resolving one from the registry. The
    /// converter serves both directions, so no conversion-path check is
    /// made.
    ///
    /// # Errors
    ///
    /// See [`BindError`]; everything except
    /// [`NoConverter`](BindError::NoConverter) still applies.
    pub fn bind_with<H: BindingHost<K>>(
        &mut self,
        host: &mut H,
        registry: &PropertyRegistry<K>,
        converters: &ConverterRegistry,
        source: BindingSource<K>,
        target: (K, PropertyId),
        mode: BindingMode,
        converter: Arc<dyn Converter>,
    ) -> Result<BindingId, BindError> {
        self.bind_inner(host, registry, converters, source, target, mode, Some(converter))
    }

    fn bind_inner<H: BindingHost<K>>(
        &mut self,
        host: &mut H,
        registry: &PropertyRegistry<K>,
        converters: &ConverterRegistry,
        source: BindingSource<K>,
        target: (K, PropertyId),
        mode: BindingMode,
        converter: Option<Arc<dyn Converter>>,
    ) -> Result<BindingId, BindError> {
        let (target_key, target_prop) = target;
        let target_ty = registry
            .get(target_prop)
            .ok_or(BindError::UnknownProperty)?
            .value_type();
        if !host.is_alive(target_key) {
            return Err(BindError::DeadEndpoint);
        }

        // Validate the source and learn its value type. Member values are
        // read eagerly; they feed the initial push.
        let mut member_value = None;
        let source_ty = match source {
            BindingSource::Property(key, prop) => {
                if (key, prop) == (target_key, target_prop) {
                    return Err(BindError::SelfBinding);
                }
                let ty = registry
                    .get(prop)
                    .ok_or(BindError::UnknownProperty)?
                    .value_type();
                if !host.is_alive(key) {
                    return Err(BindError::DeadEndpoint);
                }
                ty
            }
            BindingSource::Member(key, name) => {
                if mode != BindingMode::OneTime {
                    return Err(BindError::MemberNotObservable);
                }
                if !host.is_alive(key) {
                    return Err(BindError::DeadEndpoint);
                }
                let value = host.member(key, name).ok_or(BindError::MemberUnavailable)?;
                let ty = value.type_id();
                member_value = Some(value);
                ty
            }
        };

        if converter.is_none() {
            let forward = !matches!(mode, BindingMode::OneWayToSource);
            let reverse = matches!(mode, BindingMode::TwoWay | BindingMode::OneWayToSource);
            if (forward && !converters.can_convert(source_ty, target_ty))
                || (reverse && !converters.can_convert(target_ty, source_ty))
            {
                return Err(BindError::NoConverter);
            }
        }

        let explicit = converter.clone();
        let id = self.allocate(BindingState {
            mode,
            source,
            target,
            converter,
        });

        if let BindingSource::Property(key, prop) = source {
            match mode {
                BindingMode::OneWay => self.by_source.entry((key, prop)).or_default().push(id),
                BindingMode::TwoWay => {
                    self.by_source.entry((key, prop)).or_default().push(id);
                    self.by_target.entry(target).or_default().push(id);
                }
                BindingMode::OneWayToSource => {
                    self.by_target.entry(target).or_default().push(id);
                }
                BindingMode::OneTime => {}
            }
        }

        // Initial transfer. A value-level conversion failure leaves the
        // endpoints untouched but the binding established.
        let changed = match source {
            BindingSource::Member(..) => member_value.and_then(|value| {
                match write_value(host, registry, converters, explicit.as_deref(), &value, target) {
                    Push::Changed => Some(target),
                    _ => None,
                }
            }),
            BindingSource::Property(key, prop) => {
                let (from, to) = if mode == BindingMode::OneWayToSource {
                    (target, (key, prop))
                } else {
                    ((key, prop), target)
                };
                match push_value(host, registry, converters, explicit.as_deref(), from, to) {
                    Push::Changed => Some(to),
                    _ => None,
                }
            }
        };
        if let Some((key, prop)) = changed {
            self.notify_changed(host, registry, converters, key, prop);
        }

        Ok(id)
    }

    /// Removes a binding.
    ///
    /// Returns `false` if the handle is stale; unbinding twice is safe.
    pub fn unbind(&mut self, id: BindingId) -> bool {
        let Some(state) = self.slots.get_mut(id.0 as usize).and_then(Option::take) else {
            return false;
        };
        if let BindingSource::Property(key, prop) = state.source {
            Self::unsubscribe(&mut self.by_source, (key, prop), id);
        }
        Self::unsubscribe(&mut self.by_target, state.target, id);
        self.free.push(id.0);
        true
    }

    /// Propagates a property change through every binding observing it.
    ///
    /// Call after a property on `node` changed outside
    /// [`set_property`](Self::set_property). Downstream writes cascade
    /// breadth-first until the equality short-circuit quiesces the graph.
    /// Bindings whose endpoints are gone are dropped along the way.
    pub fn notify_changed<H: BindingHost<K>>(
        &mut self,
        host: &mut H,
        registry: &PropertyRegistry<K>,
        converters: &ConverterRegistry,
        node: K,
        property: PropertyId,
    ) {
        let mut queue: VecDeque<(K, PropertyId)> = VecDeque::new();
        queue.push_back((node, property));

        while let Some(endpoint) = queue.pop_front() {
            // Forward pushes: bindings sourcing from the changed property.
            let forward: SmallVec<[BindingId; 2]> =
                self.by_source.get(&endpoint).cloned().unwrap_or_default();
            for id in forward {
                let Some(state) = self.slots.get(id.0 as usize).and_then(Clone::clone) else {
                    continue;
                };
                let explicit = state.converter.as_deref();
                match push_value(host, registry, converters, explicit, endpoint, state.target) {
                    Push::Changed => queue.push_back(state.target),
                    Push::Unchanged => {}
                    Push::Dead => {
                        self.unbind(id);
                    }
                }
            }

            // Reverse pushes: two-way and to-source bindings targeting the
            // changed property.
            let reverse: SmallVec<[BindingId; 2]> =
                self.by_target.get(&endpoint).cloned().unwrap_or_default();
            for id in reverse {
                let Some(state) = self.slots.get(id.0 as usize).and_then(Clone::clone) else {
                    continue;
                };
                let BindingSource::Property(key, prop) = state.source else {
                    continue;
                };
                let explicit = state.converter.as_deref();
                match push_value(host, registry, converters, explicit, endpoint, (key, prop)) {
                    Push::Changed => queue.push_back((key, prop)),
                    Push::Unchanged => {}
                    Push::Dead => {
                        self.unbind(id);
                    }
                }
            }
        }
    }

    /// Sets a property value and propagates the change through bindings.
    ///
    /// Composes the store's commit pipeline with
    /// [`notify_changed`](Self::notify_changed): the changed callback has
    /// already fired by the time bindings move the value. Setting a
    /// property on a dead node is a no-op.
    pub fn set_property<T, H>(
        &mut self,
        host: &mut H,
        registry: &PropertyRegistry<K>,
        converters: &ConverterRegistry,
        node: K,
        property: Property<T>,
        value: T,
    ) -> SetOutcome
    where
        T: Clone + PartialEq + 'static,
        H: BindingHost<K>,
    {
        let Some(store) = host.store_mut(node) else {
            return SetOutcome {
                changed: false,
                flags: StructuralFlags::empty(),
            };
        };
        let outcome = store.set_value(property, value, registry);
        if outcome.changed {
            self.notify_changed(host, registry, converters, node, property.id());
        }
        outcome
    }

    fn allocate(&mut self, state: BindingState<K>) -> BindingId {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(state);
            BindingId(index)
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or_else(|_| {
                panic!("Too many bindings established (max {})", u32::MAX)
            });
            self.slots.push(Some(state));
            BindingId(index)
        }
    }

    fn unsubscribe(
        map: &mut HashMap<(K, PropertyId), SmallVec<[BindingId; 2]>>,
        endpoint: (K, PropertyId),
        id: BindingId,
    ) {
        if let Some(ids) = map.get_mut(&endpoint) {
            ids.retain(|b| *b != id);
            if ids.is_empty() {
                map.remove(&endpoint);
            }
        }
    }
}

impl<K: core::fmt::Debug> core::fmt::Debug for BindingEngine<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BindingEngine")
            .field("bindings", &(self.slots.len() - self.free.len()))
            .finish_non_exhaustive()
    }
}

/// Moves the effective value of `from` onto `to`, converting on the way.
fn push_value<K, H>(
    host: &mut H,
    registry: &PropertyRegistry<K>,
    converters: &ConverterRegistry,
    explicit: Option<&dyn Converter>,
    from: (K, PropertyId),
    to: (K, PropertyId),
) -> Push
where
    K: Copy + Eq,
    H: BindingHost<K>,
{
    let Some(store) = host.store(from.0) else {
        return Push::Dead;
    };
    let Some(value) = store.effective_erased(from.1, registry) else {
        return Push::Unchanged;
    };
    write_value(host, registry, converters, explicit, &value, to)
}

/// Writes an erased value onto a property, converting to its type.
fn write_value<K, H>(
    host: &mut H,
    registry: &PropertyRegistry<K>,
    converters: &ConverterRegistry,
    explicit: Option<&dyn Converter>,
    value: &ErasedValue,
    to: (K, PropertyId),
) -> Push
where
    K: Copy + Eq,
    H: BindingHost<K>,
{
    let Some(target_ty) = registry.get(to.1).map(|r| r.value_type()) else {
        return Push::Unchanged;
    };
    // A value the converter rejects simply does not transfer.
    let converted = match explicit {
        Some(converter) => converter.convert(value, target_ty),
        None => converters.convert(value, target_ty),
    };
    let Some(converted) = converted else {
        return Push::Unchanged;
    };
    let Some(store) = host.store_mut(to.0) else {
        return Push::Dead;
    };
    if store.set_erased(to.1, converted, registry).changed {
        Push::Changed
    } else {
        Push::Unchanged
    }
}
