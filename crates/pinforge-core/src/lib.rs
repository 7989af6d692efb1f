//! pinforge-core - Digital pin negotiation and chip-select coordination
//!
//! This crate describes what a digital pin can do ([`PinCapability`]),
//! what a driver wants from it ([`PinConfiguration`]), and negotiates
//! between the two before any hardware is touched. On top of that it
//! coordinates exclusive chip selection on a shared bus through
//! [`ChipSelectManager`].
//!
//! Hardware is reached through two traits: [`port::Port`] reads and
//! writes pins, [`select::ChipSelectDriver`] asserts and releases chip
//! selects.
//!
//! # Example
//!
//! ```ignore
//! use pinforge_core::pin::{PinCfgFlags, PinConfiguration, PinGroup};
//!
//! let group = PinGroup::new(port, [Some(4), Some(5)])?;
//! let access = group.access()?;
//! access.configure(0, &PinConfiguration::output(PinCfgFlags::OUTPUT_PUSH_PULL))?;
//! access.output(0, true)?;
//! ```
//!
//! [`PinCapability`]: pin::PinCapability
//! [`PinConfiguration`]: pin::PinConfiguration
//! [`ChipSelectManager`]: select::ChipSelectManager

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod flags;
pub mod pin;
pub mod port;
pub mod select;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
