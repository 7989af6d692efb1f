//! Recording chip-select driver

use std::sync::{Mutex, PoisonError};

use pinforge_core::error::{Error, Result};
use pinforge_core::select::{ChipId, ChipSelectDriver};

/// A call a [`DummySelect`] received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectEvent {
    /// `select(chip)`
    Select(ChipId),
    /// `deselect(chip)`
    Deselect(ChipId),
}

/// Chip-select driver for chips `0..chips` that drives nothing
///
/// It remembers which chip is selected and every call it got, and
/// complains if asked to select a second chip while one is still
/// selected.
#[derive(Debug)]
pub struct DummySelect {
    chips: ChipId,
    state: Mutex<(Option<ChipId>, Vec<SelectEvent>)>,
}

impl DummySelect {
    /// Create a driver for chips `0..chips`
    pub fn new(chips: ChipId) -> Self {
        Self {
            chips,
            state: Mutex::new((None, Vec::new())),
        }
    }

    /// The selected chip, if any
    pub fn selected(&self) -> Option<ChipId> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).0
    }

    /// Every call so far, oldest first
    pub fn events(&self) -> Vec<SelectEvent> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .1
            .clone()
    }
}

impl ChipSelectDriver for DummySelect {
    fn is_valid_chip(&self, chip: ChipId) -> bool {
        (0..self.chips).contains(&chip)
    }

    fn select(&self, chip: ChipId) -> Result<()> {
        if !self.is_valid_chip(chip) {
            return Err(Error::InvalidChipId(chip));
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(other) = state.0.filter(|&other| other != chip) {
            log::error!("dummy select: chip {} selected while chip {} is", chip, other);
        }
        state.0 = Some(chip);
        state.1.push(SelectEvent::Select(chip));
        log::debug!("dummy select: chip {} selected", chip);
        Ok(())
    }

    fn deselect(&self, chip: ChipId) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.0 == Some(chip) {
            state.0 = None;
        }
        state.1.push(SelectEvent::Deselect(chip));
        log::debug!("dummy select: chip {} deselected", chip);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_selection() {
        let cs = DummySelect::new(2);
        assert!(!cs.is_valid_chip(2));
        cs.select(1).unwrap();
        assert_eq!(cs.selected(), Some(1));
        cs.deselect(0).unwrap();
        assert_eq!(cs.selected(), Some(1));
        cs.deselect(1).unwrap();
        assert_eq!(cs.selected(), None);
        assert!(matches!(cs.select(5), Err(Error::InvalidChipId(5))));
    }
}
