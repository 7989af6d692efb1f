//! Chip-select backend trait

use std::sync::Arc;

use super::ChipId;
use crate::error::Result;

/// Backend that drives chip-select signals
///
/// The manager serializes `select` and `deselect`: they are only called
/// by the holder of the active token, never concurrently, and never with
/// the manager's lock held.
pub trait ChipSelectDriver: Send + Sync {
    /// True if `chip` can be selected
    ///
    /// Must not block and must give the same answer whether or not a
    /// token is outstanding; the manager calls it from any thread.
    fn is_valid_chip(&self, chip: ChipId) -> bool;

    /// Assert the select signal of `chip`
    fn select(&self, chip: ChipId) -> Result<()>;

    /// Release the select signal of `chip`
    ///
    /// Deselecting a chip that is not selected is harmless.
    fn deselect(&self, chip: ChipId) -> Result<()>;
}

impl<D: ChipSelectDriver + ?Sized> ChipSelectDriver for Arc<D> {
    fn is_valid_chip(&self, chip: ChipId) -> bool {
        (**self).is_valid_chip(chip)
    }

    fn select(&self, chip: ChipId) -> Result<()> {
        (**self).select(chip)
    }

    fn deselect(&self, chip: ChipId) -> Result<()> {
        (**self).deselect(chip)
    }
}

impl<D: ChipSelectDriver + ?Sized> ChipSelectDriver for Box<D> {
    fn is_valid_chip(&self, chip: ChipId) -> bool {
        (**self).is_valid_chip(chip)
    }

    fn select(&self, chip: ChipId) -> Result<()> {
        (**self).select(chip)
    }

    fn deselect(&self, chip: ChipId) -> Result<()> {
        (**self).deselect(chip)
    }
}
