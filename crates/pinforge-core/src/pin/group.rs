//! Ordered groups of pins on one port

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pin::{PinAccess, PinCapability, PinConfiguration, PinId, RejectReason};
use crate::port::Port;

/// Raw id marking a position without a pin, see [`PinGroup::from_raw`]
pub const GAP: i64 = -1;

/// An ordered set of pins on one port
///
/// Positions may be empty (gaps), which lets a driver keep a fixed
/// layout, for example data bit `n` at position `n`, when some lines are
/// not wired. Every pin that is present exists on the port and appears
/// once.
///
/// Queries go straight to the port and return snapshots: nothing stops
/// another thread from changing a pin right after a query returns. Use
/// [`PinGroup::access`] to keep other users off the pins.
#[derive(Clone)]
pub struct PinGroup {
    port: Arc<dyn Port>,
    pins: Vec<Option<PinId>>,
}

impl fmt::Debug for PinGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinGroup")
            .field("port", &self.port.name())
            .field("pins", &self.pins)
            .finish()
    }
}

impl PinGroup {
    /// Create a group from global ids, `None` marking a gap
    pub fn new(
        port: Arc<dyn Port>,
        pins: impl IntoIterator<Item = Option<PinId>>,
    ) -> Result<Self> {
        let pins: Vec<Option<PinId>> = pins.into_iter().collect();
        let mut seen = BTreeSet::new();
        for &id in pins.iter().flatten() {
            if !port.exists(id) {
                return Err(Error::NonexistentPin(id));
            }
            if !seen.insert(id) {
                return Err(Error::DuplicatePin(id));
            }
        }
        Ok(Self { port, pins })
    }

    /// Create a group from signed ids where [`GAP`] (`-1`) marks a gap
    pub fn from_raw(port: Arc<dyn Port>, ids: &[i64]) -> Result<Self> {
        let pins = ids
            .iter()
            .map(|&id| match id {
                GAP => Ok(None),
                id => PinId::try_from(id)
                    .map(Some)
                    .map_err(|_| Error::InvalidPinId(id)),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(port, pins)
    }

    /// The port the pins belong to
    pub fn port(&self) -> &Arc<dyn Port> {
        &self.port
    }

    /// Number of positions, gaps included
    pub fn size(&self) -> usize {
        self.pins.len()
    }

    /// True if the group has no positions
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Global ids by position
    pub fn global_ids(&self) -> &[Option<PinId>] {
        &self.pins
    }

    /// Port-local ids by position
    pub fn local_ids(&self) -> Vec<Option<PinId>> {
        self.pins
            .iter()
            .map(|id| id.and_then(|id| self.port.local_id(id)))
            .collect()
    }

    /// Global id at `pos`; `None` for gaps and positions past the end
    pub fn global_id(&self, pos: usize) -> Option<PinId> {
        self.pins.get(pos).copied().flatten()
    }

    /// Local id at `pos`; `None` for gaps and positions past the end
    pub fn local_id(&self, pos: usize) -> Option<PinId> {
        self.global_id(pos).and_then(|id| self.port.local_id(id))
    }

    /// True if there is a pin at `pos`
    pub fn exists(&self, pos: usize) -> bool {
        self.global_id(pos).is_some()
    }

    fn slot(&self, pos: usize) -> Result<Option<PinId>> {
        match self.pins.get(pos) {
            Some(id) => Ok(id.and_then(|id| self.port.local_id(id))),
            None => Err(Error::PositionOutOfRange(pos)),
        }
    }

    /// Capabilities of the pin at `pos`
    pub fn capability(&self, pos: usize) -> Result<PinCapability> {
        Ok(self
            .slot(pos)?
            .map_or(PinCapability::NONEXISTENT, |local| self.port.capability(local)))
    }

    /// Capabilities of every position; gaps are
    /// [`PinCapability::NONEXISTENT`]
    pub fn capabilities(&self) -> Vec<PinCapability> {
        self.local_ids()
            .into_iter()
            .map(|local| local.map_or(PinCapability::NONEXISTENT, |l| self.port.capability(l)))
            .collect()
    }

    /// Current configuration of the pin at `pos`
    pub fn configuration(&self, pos: usize) -> Result<PinConfiguration> {
        match self.slot(pos)? {
            Some(local) => self.port.configuration(local),
            None => Ok(PinConfiguration::NO_CHANGE),
        }
    }

    /// Current configuration of every position; gaps are
    /// [`PinConfiguration::NO_CHANGE`]
    pub fn configurations(&self) -> Result<Vec<PinConfiguration>> {
        self.local_ids()
            .into_iter()
            .map(|local| match local {
                Some(l) => self.port.configuration(l),
                None => Ok(PinConfiguration::NO_CHANGE),
            })
            .collect()
    }

    /// Negotiate a configuration for the pin at `pos` without applying it
    ///
    /// `proposed` is replaced by its combination with `initial`, or with
    /// the pin's current configuration when `initial` is `None`. A gap
    /// accepts requests without concrete options and rejects the rest
    /// with [`RejectReason::NonexistentPin`].
    pub fn propose_config(
        &self,
        pos: usize,
        proposed: &mut PinConfiguration,
        initial: Option<&PinConfiguration>,
    ) -> Result<RejectReason> {
        match self.slot(pos)? {
            Some(local) => self.port.propose_config(local, proposed, initial),
            None => {
                proposed.check_validity()?;
                if proposed.concrete_options().is_zero() && proposed.min_output_current == 0 {
                    Ok(RejectReason::NotRejected)
                } else {
                    Ok(RejectReason::NonexistentPin)
                }
            }
        }
    }

    /// Negotiate a configuration for every position without applying it
    ///
    /// `proposed` holds one request per position and is updated in place
    /// like [`PinGroup::propose_config`]. `initial`, when given, is the
    /// hypothetical starting configuration per position. `on_pin` is
    /// called with each position's verdict in group order. Every pin is
    /// evaluated even after a rejection; the first rejection, or
    /// [`RejectReason::NotRejected`], is returned.
    pub fn propose_configs(
        &self,
        proposed: &mut [PinConfiguration],
        initial: Option<&[PinConfiguration]>,
        mut on_pin: Option<&mut dyn FnMut(usize, RejectReason)>,
    ) -> Result<RejectReason> {
        self.check_len(proposed.len())?;
        if let Some(initial) = initial {
            self.check_len(initial.len())?;
        }

        let mut first = RejectReason::NotRejected;
        for (pos, cfg) in proposed.iter_mut().enumerate() {
            let reason = self.propose_config(pos, cfg, initial.map(|init| &init[pos]))?;
            if let Some(cb) = on_pin.as_mut() {
                cb(pos, reason);
            }
            if !first.is_rejected() {
                first = reason;
            }
        }
        Ok(first)
    }

    /// Claim the pins for exclusive use
    ///
    /// Fails with [`Error::PinInUse`] without waiting if another access
    /// object holds any of them. When an operation also needs a
    /// chip-select token, take the pin access first.
    pub fn access(&self) -> Result<PinAccess> {
        PinAccess::new(self.clone())
    }

    pub(crate) fn check_len(&self, len: usize) -> Result<()> {
        if len == self.pins.len() {
            Ok(())
        } else {
            Err(Error::LengthMismatch {
                expected: self.pins.len(),
                actual: len,
            })
        }
    }
}
