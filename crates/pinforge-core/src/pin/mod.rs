//! Digital pin description, negotiation and grouping
//!
//! Negotiating a pin goes through three steps:
//!
//! 1. [`PinConfiguration::check_validity`] rejects requests that
//!    contradict themselves,
//! 2. [`PinConfiguration::combine`] folds the request onto the pin's
//!    current (or a hypothetical) configuration,
//! 3. [`PinCapability::compatible`] checks the result against what the
//!    hardware can do.
//!
//! [`PinGroup`] runs these steps for a set of pins on one port, and
//! [`PinAccess`] applies the results.

mod access;
mod capability;
mod configuration;
mod group;

pub use access::PinAccess;
pub use capability::{PinCapFlags, PinCapTag, PinCapability, RejectReason};
pub use configuration::{PinCfgFlags, PinCfgTag, PinConfiguration};
pub use group::{PinGroup, GAP};

/// Pin identifier, global or port-local depending on context
pub type PinId = u32;
