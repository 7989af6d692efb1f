//! A chip bound to its manager

use std::sync::Arc;

use super::{ChipAccess, ChipId, ChipSelectManager};
use crate::error::{Error, Result};

/// One chip on a managed bus
///
/// Device drivers usually keep one of these instead of the manager and a
/// loose chip id.
#[derive(Debug, Clone)]
pub struct ChipSelect {
    manager: Arc<ChipSelectManager>,
    chip: ChipId,
}

impl ChipSelect {
    /// Pair `chip` with `manager`, failing if the manager does not know it
    pub fn new(manager: Arc<ChipSelectManager>, chip: ChipId) -> Result<Self> {
        if !manager.is_valid_chip(chip) {
            return Err(Error::InvalidChipId(chip));
        }
        Ok(Self { manager, chip })
    }

    /// The chip id
    pub fn chip(&self) -> ChipId {
        self.chip
    }

    /// The manager the chip belongs to
    pub fn manager(&self) -> &Arc<ChipSelectManager> {
        &self.manager
    }

    /// True if the manager can still select this chip
    pub fn is_valid(&self) -> bool {
        !self.manager.is_terminated() && self.manager.is_valid_chip(self.chip)
    }

    /// Wait for the bus, without selecting
    pub fn access(&self) -> Result<ChipAccess> {
        self.manager.access(self.chip)
    }

    /// Wait for the bus and select the chip
    pub fn select(&self) -> Result<ChipAccess> {
        self.manager.select(self.chip)
    }
}
