//! Port backend interface
//!
//! A [`Port`] is the object that actually reads and writes pin state,
//! such as a Linux GPIO chip or an I/O expander. Pins have a local id
//! (`0..pin_count`) inside the port and a global id, which is the local
//! id plus the port's `id_offset`. The core talks to ports in global ids
//! at the edges and in local ids for the required methods.
//!
//! Implementations only need the required methods; translation, batched
//! queries, proposals and claims come with the trait.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::pin::{PinCapability, PinConfiguration, PinId, RejectReason};

/// Set of claimed local pin ids
///
/// Every port embeds one of these and hands it out through
/// [`Port::claims`]. Claiming is all-or-nothing and never blocks.
#[derive(Debug, Default)]
pub struct PinClaims {
    claimed: Mutex<BTreeSet<PinId>>,
}

impl PinClaims {
    /// Empty claim set
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim all of `locals`, or none of them
    ///
    /// `to_global` only serves the error: the first pin already taken is
    /// reported as [`Error::PinInUse`] with its global id.
    pub fn claim(&self, locals: &[PinId], to_global: impl Fn(PinId) -> PinId) -> Result<()> {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&taken) = locals.iter().find(|id| claimed.contains(id)) {
            return Err(Error::PinInUse(to_global(taken)));
        }
        claimed.extend(locals.iter().copied());
        Ok(())
    }

    /// Release `locals`
    pub fn release(&self, locals: &[PinId]) {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        for id in locals {
            claimed.remove(id);
        }
    }

    /// True if `local` is claimed
    pub fn is_claimed(&self, local: PinId) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&local)
    }
}

/// A set of pins driven by one backend
///
/// Read results are snapshots. Another thread may reconfigure a pin the
/// moment after a query returns; only a claim through
/// [`PinGroup::access`](crate::pin::PinGroup::access) keeps other
/// access objects away.
pub trait Port: Send + Sync {
    /// Human readable name, used in logs
    fn name(&self) -> &str;

    /// Number of local ids, including ids of pins that do not exist
    fn pin_count(&self) -> u32;

    /// Global id of local pin 0
    fn id_offset(&self) -> PinId {
        0
    }

    /// Capabilities of a local pin; [`PinCapability::NONEXISTENT`] for
    /// ids the port does not have
    fn capability(&self, local: PinId) -> PinCapability;

    /// Current configuration of a local pin, including live state
    fn configuration(&self, local: PinId) -> Result<PinConfiguration>;

    /// Put an already negotiated configuration into effect
    ///
    /// `cfg` is the result of [`Port::propose_config`] and has passed
    /// the capability check.
    fn apply(&self, local: PinId, cfg: &PinConfiguration) -> Result<()>;

    /// Read the level of a local pin
    fn input(&self, local: PinId) -> Result<bool>;

    /// Set the output level of a local pin
    ///
    /// On a pin that is not an output yet the level is latched and shows
    /// once the pin becomes one. A backend that cannot latch may instead
    /// switch the pin to an output starting at `high`.
    fn output(&self, local: PinId, high: bool) -> Result<()>;

    /// Claim bookkeeping for this port
    fn claims(&self) -> &PinClaims;

    /// Translate a global id; `None` if it is outside this port
    fn local_id(&self, global: PinId) -> Option<PinId> {
        global
            .checked_sub(self.id_offset())
            .filter(|&local| local < self.pin_count())
    }

    /// Translate a local id
    ///
    /// Saturates at `PinId::MAX` for ids past the end of the id space.
    /// Backends keep `id_offset + pin_count` in range, so this only
    /// happens for locals the port does not have.
    fn global_id(&self, local: PinId) -> PinId {
        self.id_offset().saturating_add(local)
    }

    /// True if the global id names a usable pin of this port
    fn exists(&self, global: PinId) -> bool {
        self.local_id(global)
            .is_some_and(|local| self.capability(local).exists())
    }

    /// Translate global ids, failing on the first unknown one
    fn local_ids(&self, globals: &[PinId]) -> Result<Vec<PinId>> {
        globals
            .iter()
            .map(|&global| self.local_id(global).ok_or(Error::NonexistentPin(global)))
            .collect()
    }

    /// Capabilities of global ids; unknown ids map to
    /// [`PinCapability::NONEXISTENT`]
    fn capabilities(&self, globals: &[PinId]) -> Vec<PinCapability> {
        globals
            .iter()
            .map(|&global| {
                self.local_id(global)
                    .map_or(PinCapability::NONEXISTENT, |local| self.capability(local))
            })
            .collect()
    }

    /// Current configurations of global ids
    fn configurations(&self, globals: &[PinId]) -> Result<Vec<PinConfiguration>> {
        self.local_ids(globals)?
            .into_iter()
            .map(|local| self.configuration(local))
            .collect()
    }

    /// Negotiate a configuration without touching the hardware
    ///
    /// `proposed` is checked for self-contradiction, folded onto
    /// `initial` (or the pin's current configuration) and replaced by the
    /// result, which is then checked against the pin's capabilities.
    fn propose_config(
        &self,
        local: PinId,
        proposed: &mut PinConfiguration,
        initial: Option<&PinConfiguration>,
    ) -> Result<RejectReason> {
        proposed.check_validity()?;
        let base = match initial {
            Some(cfg) => *cfg,
            None => self.configuration(local)?,
        };
        *proposed = PinConfiguration::combine(&base, proposed);
        proposed.check_validity()?;
        Ok(self.capability(local).compatible(proposed))
    }

    /// Claim local pins for exclusive use
    fn claim(&self, locals: &[PinId]) -> Result<()> {
        self.claims().claim(locals, |local| self.global_id(local))
    }

    /// Release a claim made with [`Port::claim`]
    fn release(&self, locals: &[PinId]) {
        self.claims().release(locals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_all_or_nothing() {
        let claims = PinClaims::new();
        claims.claim(&[1, 2], |l| l + 100).unwrap();
        let err = claims.claim(&[3, 2], |l| l + 100).unwrap_err();
        assert!(matches!(err, Error::PinInUse(102)));
        // 3 was not claimed by the failed attempt
        assert!(!claims.is_claimed(3));

        claims.release(&[1, 2]);
        claims.claim(&[3, 2], |l| l).unwrap();
        assert!(claims.is_claimed(2));
        assert!(!claims.is_claimed(1));
    }

    #[test]
    fn test_id_translation_at_top_of_range() {
        let port = crate::testing::MockPort::new("mock", 2, PinId::MAX - 1);
        assert_eq!(port.global_id(1), PinId::MAX);
        assert_eq!(port.local_id(PinId::MAX), Some(1));
        assert_eq!(port.local_id(0), None);
        // past the end saturates instead of wrapping
        assert_eq!(port.global_id(5), PinId::MAX);
        assert!(!port.exists(0));
    }
}
