// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding establishment errors.

use core::fmt;

/// An error establishing a binding.
///
/// These are runtime conditions, not configuration mistakes: binding is
/// driven by application state (which nodes exist, what values they hold),
/// so failures are reported rather than panicking.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BindError {
    /// Source and target are the same property on the same node.
    SelfBinding,
    /// A referenced property is not registered.
    UnknownProperty,
    /// A referenced node is gone or was never in the host tree.
    DeadEndpoint,
    /// No conversion path exists between the endpoint types for the
    /// requested direction(s).
    NoConverter,
    /// A plain member was used as the source of a live binding mode.
    ///
    /// Members emit no change notifications, so only
    /// [`BindingMode::OneTime`](crate::BindingMode::OneTime) can observe
    /// them.
    MemberNotObservable,
    /// The named member does not exist on the source node.
    MemberUnavailable,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::SelfBinding => "binding source and target are the same property",
            Self::UnknownProperty => "property is not registered",
            Self::DeadEndpoint => "binding endpoint node is not alive",
            Self::NoConverter => "no conversion path between endpoint types",
            Self::MemberNotObservable => "plain members can only source one-time bindings",
            Self::MemberUnavailable => "named member does not exist on the source node",
        };
        f.write_str(message)
    }
}

impl core::error::Error for BindError {}
