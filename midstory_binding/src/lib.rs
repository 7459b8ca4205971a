// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Midstory Binding: Data binding between dependency properties.
//!
//! This crate connects properties across nodes so that a change to one
//! endpoint flows to the other, converting between value types along the
//! way. It builds on `midstory_property` for storage and change callbacks
//! and on `midstory_convert` for the conversion layer.
//!
//! ## Modes
//!
//! A [`BindingMode`] selects the direction(s) a binding moves values in:
//! one-way, two-way, to-source, or a single transfer at establishment
//! ([`BindingMode::OneTime`]). Two-way bindings stay consistent through the
//! property store's equality short-circuit: propagation stops as soon as a
//! push would write a value equal to the one already there, which also
//! terminates binding cycles.
//!
//! ## Sources
//!
//! A binding source is either a dependency property or a plain named
//! member read through [`BindingHost::member`]. Members emit no change
//! notifications, so they can only source one-time bindings; requesting a
//! live mode reports [`BindError::MemberNotObservable`].
//!
//! ## Liveness
//!
//! The engine addresses nodes by key through a [`BindingHost`] and holds
//! no node references. When an endpoint disappears, bindings touching it
//! are dropped the next time propagation reaches them.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod engine;
mod error;
mod host;

pub use engine::{BindingEngine, BindingId, BindingMode, BindingSource};
pub use error::BindError;
pub use host::BindingHost;
