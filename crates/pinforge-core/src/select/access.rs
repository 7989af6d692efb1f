//! Scoped chip-select token

use std::sync::Arc;

use super::{ChipId, ChipSelectManager};
use crate::error::{Error, Result};

/// Exclusive hold on a [`ChipSelectManager`]
///
/// Returned by [`ChipSelectManager::access`] and
/// [`ChipSelectManager::select`]. While it is bound no other token of the
/// same manager exists. Dropping it deselects the chip if needed and wakes
/// one waiter; [`release`](Self::release) does the same and reports a
/// failed deselect instead of logging it.
#[derive(Debug, Default)]
pub struct ChipAccess {
    manager: Option<Arc<ChipSelectManager>>,
    token: u64,
    chip: ChipId,
}

impl ChipAccess {
    /// A token not bound to any manager
    ///
    /// Bind it with [`ChipSelectManager::access_into`].
    pub fn unbound() -> Self {
        Self::default()
    }

    pub(super) fn bound(manager: Arc<ChipSelectManager>, token: u64, chip: ChipId) -> Self {
        Self {
            manager: Some(manager),
            token,
            chip,
        }
    }

    pub(super) fn bind(&mut self, manager: Arc<ChipSelectManager>, token: u64, chip: ChipId) {
        self.manager = Some(manager);
        self.token = token;
        self.chip = chip;
    }

    fn manager(&self) -> Result<&Arc<ChipSelectManager>> {
        self.manager.as_ref().ok_or(Error::AccessTokenNotBound)
    }

    /// True while the token holds its manager
    pub fn is_bound(&self) -> bool {
        self.manager.is_some()
    }

    /// The chip this token is for; `None` when unbound
    pub fn chip(&self) -> Option<ChipId> {
        self.manager.as_ref().map(|_| self.chip)
    }

    /// True if the chip is currently selected
    pub fn is_selected(&self) -> bool {
        self.manager
            .as_ref()
            .is_some_and(|manager| manager.is_selected(self.token))
    }

    /// Select the chip; no-op if already selected
    pub fn select(&mut self) -> Result<()> {
        let manager = self.manager()?;
        if manager.is_selected(self.token) {
            return Ok(());
        }
        manager.drive_select(self.token, self.chip)
    }

    /// Deselect the chip but keep the token
    pub fn deselect(&mut self) -> Result<()> {
        let manager = self.manager()?;
        if !manager.is_selected(self.token) {
            return Ok(());
        }
        manager.drive_deselect(self.token, self.chip)
    }

    /// Point the token at another chip
    ///
    /// If the old chip was selected it is deselected before the new one is
    /// selected, so two chips are never selected at once. Moving to the
    /// current chip does nothing.
    pub fn change_chip(&mut self, chip: ChipId) -> Result<()> {
        let manager = self.manager()?;
        if !manager.is_valid_chip(chip) {
            return Err(Error::InvalidChipId(chip));
        }
        if chip == self.chip {
            return Ok(());
        }
        manager.switch_chip(self.token, self.chip, chip)?;
        self.chip = chip;
        Ok(())
    }

    /// Give the token back now
    ///
    /// Afterwards the token is unbound and dropping it does nothing.
    /// Releasing an unbound token is a no-op.
    pub fn release(&mut self) -> Result<()> {
        match self.manager.take() {
            Some(manager) => manager.retire(self.token),
            None => Ok(()),
        }
    }
}

impl Drop for ChipAccess {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::error!("chip select: failed to deselect chip {}: {}", self.chip, e);
        }
    }
}
