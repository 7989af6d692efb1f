//! Exclusive chip selection on a shared bus
//!
//! Several chips often share clock and data lines and are told apart by a
//! chip-select signal. A [`ChipSelectManager`] makes sure only one user
//! at a time drives that signal: users block in
//! [`ChipSelectManager::access`] until they get a [`ChipAccess`] token,
//! and dropping the token hands the bus to the next waiter.
//!
//! How a chip is actually selected is up to a [`ChipSelectDriver`]. The
//! pin-driven drivers in this module cover the common wirings: one line
//! for one chip ([`PinSelect`]), one line per chip ([`PinSetSelect`]) and
//! a binary-encoded chip id on several lines ([`MultiplexerSelect`]).

mod access;
mod chip_select;
mod driver;
mod manager;
mod pins;

pub use access::ChipAccess;
pub use chip_select::ChipSelect;
pub use driver::ChipSelectDriver;
pub use manager::ChipSelectManager;
pub use pins::{MultiplexerSelect, PinSelect, PinSetSelect};

/// Chip identifier; negative ids are never valid
pub type ChipId = i32;
