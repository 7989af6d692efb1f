//! Blocking single-owner chip-select coordination

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use super::{ChipAccess, ChipId, ChipSelectDriver};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    ShuttingDown,
    Terminated,
}

#[derive(Debug)]
struct State {
    current_chip: Option<ChipId>,
    active_token: Option<u64>,
    selected: bool,
    waiters: usize,
    phase: Phase,
    next_token: u64,
}

/// Hands out exclusive access to a set of chips sharing a bus
///
/// At most one [`ChipAccess`] token is outstanding per manager. Callers
/// of [`access`](Self::access) block until the current token is released;
/// there is no fairness among waiters.
///
/// A thread that needs both a pin claim ([`PinGroup::access`]) and a
/// chip-select token for the same operation must take the pin claim
/// first. Taking them in the other order on some path can deadlock
/// against a thread that follows the rule.
///
/// Do not call [`shutdown`](Self::shutdown) or `access` from a thread
/// that holds a token of the same manager: both wait for that token.
///
/// [`PinGroup::access`]: crate::pin::PinGroup::access
pub struct ChipSelectManager {
    driver: Box<dyn ChipSelectDriver>,
    state: Mutex<State>,
    released: Condvar,
}

impl fmt::Debug for ChipSelectManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChipSelectManager")
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl ChipSelectManager {
    /// Create a manager around a select backend
    pub fn new(driver: impl ChipSelectDriver + 'static) -> Arc<Self> {
        Self::from_boxed(Box::new(driver))
    }

    /// Create a manager around a backend picked at runtime
    pub fn from_boxed(driver: Box<dyn ChipSelectDriver>) -> Arc<Self> {
        Arc::new(Self {
            driver,
            state: Mutex::new(State {
                current_chip: None,
                active_token: None,
                selected: false,
                waiters: 0,
                phase: Phase::Running,
                next_token: 1,
            }),
            released: Condvar::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if `chip` can be selected
    ///
    /// Never blocks and does not depend on whether a token is held.
    pub fn is_valid_chip(&self, chip: ChipId) -> bool {
        chip >= 0 && self.driver.is_valid_chip(chip)
    }

    /// Wait for exclusive access to `chip`
    ///
    /// The returned token starts out acquired but not selected. Fails
    /// immediately with [`Error::InvalidChipId`] for a chip the driver
    /// does not know, and with [`Error::ManagerTerminated`] once
    /// shutdown has begun, including for callers already waiting.
    pub fn access(self: &Arc<Self>, chip: ChipId) -> Result<ChipAccess> {
        let token = self.acquire(chip)?;
        Ok(ChipAccess::bound(Arc::clone(self), token, chip))
    }

    /// Like [`access`](Self::access), but fills an existing token
    ///
    /// Fails with [`Error::AccessTokenAlreadyBound`] without waiting if
    /// `access` still belongs to a manager.
    pub fn access_into(self: &Arc<Self>, access: &mut ChipAccess, chip: ChipId) -> Result<()> {
        if access.is_bound() {
            return Err(Error::AccessTokenAlreadyBound);
        }
        let token = self.acquire(chip)?;
        access.bind(Arc::clone(self), token, chip);
        Ok(())
    }

    /// Wait for exclusive access to `chip` and select it
    pub fn select(self: &Arc<Self>, chip: ChipId) -> Result<ChipAccess> {
        let mut access = self.access(chip)?;
        access.select()?;
        Ok(access)
    }

    /// Chip of the outstanding token, if any
    pub fn current_chip(&self) -> Option<ChipId> {
        self.lock().current_chip
    }

    /// True once shutdown has begun
    pub fn is_terminated(&self) -> bool {
        self.lock().phase != Phase::Running
    }

    /// Number of threads blocked waiting for a token
    pub fn waiting(&self) -> usize {
        self.lock().waiters
    }

    /// Stop handing out tokens
    ///
    /// Waiting and future callers of `access` fail with
    /// [`Error::ManagerTerminated`]. Returns once the outstanding token,
    /// if any, has been released. Calling it again is a no-op; dropping
    /// the manager calls it too.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if state.phase == Phase::Running {
            log::debug!("chip select: shutting down");
            state.phase = Phase::ShuttingDown;
            self.released.notify_all();
        }
        while state.active_token.is_some() {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.phase != Phase::Terminated {
            state.phase = Phase::Terminated;
            self.released.notify_all();
            log::debug!("chip select: terminated");
        }
    }

    fn acquire(&self, chip: ChipId) -> Result<u64> {
        if !self.is_valid_chip(chip) {
            return Err(Error::InvalidChipId(chip));
        }

        let mut state = self.lock();
        loop {
            if state.phase != Phase::Running {
                return Err(Error::ManagerTerminated);
            }
            if state.active_token.is_none() {
                break;
            }
            state.waiters += 1;
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.waiters -= 1;
        }

        let token = state.next_token;
        state.next_token += 1;
        state.active_token = Some(token);
        state.current_chip = Some(chip);
        state.selected = false;
        log::trace!("chip select: token {} acquired chip {}", token, chip);
        Ok(token)
    }

    pub(super) fn is_selected(&self, token: u64) -> bool {
        let state = self.lock();
        state.active_token == Some(token) && state.selected
    }

    pub(super) fn drive_select(&self, token: u64, chip: ChipId) -> Result<()> {
        debug_assert_eq!(self.lock().active_token, Some(token));
        self.driver.select(chip)?;
        self.lock().selected = true;
        log::trace!("chip select: chip {} selected", chip);
        Ok(())
    }

    pub(super) fn drive_deselect(&self, token: u64, chip: ChipId) -> Result<()> {
        debug_assert_eq!(self.lock().active_token, Some(token));
        self.driver.deselect(chip)?;
        self.lock().selected = false;
        log::trace!("chip select: chip {} deselected", chip);
        Ok(())
    }

    /// Move the token from `old` to `new`, reselecting if it was selected
    ///
    /// On failure the token stays on `old`; it is left deselected if only
    /// the select of `new` failed.
    pub(super) fn switch_chip(&self, token: u64, old: ChipId, new: ChipId) -> Result<()> {
        if self.is_selected(token) {
            self.drive_deselect(token, old)?;
            self.drive_select(token, new)?;
        }
        self.lock().current_chip = Some(new);
        log::trace!("chip select: token {} moved from chip {} to {}", token, old, new);
        Ok(())
    }

    /// Give the bus back, deselecting first if needed
    ///
    /// The token is cleared even if the deselect fails; the error is
    /// handed back to the caller.
    pub(super) fn retire(&self, token: u64) -> Result<()> {
        let (selected, chip) = {
            let state = self.lock();
            if state.active_token != Some(token) {
                return Ok(());
            }
            (state.selected, state.current_chip)
        };

        let result = match chip {
            Some(chip) if selected => self.driver.deselect(chip),
            _ => Ok(()),
        };

        let mut state = self.lock();
        state.active_token = None;
        state.current_chip = None;
        state.selected = false;
        if state.phase == Phase::Running {
            self.released.notify_one();
        } else {
            // the shutdown thread is among the waiters
            self.released.notify_all();
        }
        log::trace!("chip select: token {} released", token);
        result
    }
}

impl Drop for ChipSelectManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
