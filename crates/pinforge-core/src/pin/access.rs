//! Exclusive access to the pins of a group

use crate::error::{Error, Result};
use crate::pin::{PinConfiguration, PinGroup, PinId};

/// Claim on the pins of a [`PinGroup`]
///
/// Obtained from [`PinGroup::access`]. While it exists no other access
/// object can claim these pins; dropping it releases them. Hardware state
/// is left as it is on release.
#[derive(Debug)]
pub struct PinAccess {
    group: PinGroup,
    claimed: Vec<PinId>,
}

impl PinAccess {
    pub(crate) fn new(group: PinGroup) -> Result<Self> {
        let claimed: Vec<PinId> = group.local_ids().into_iter().flatten().collect();
        group.port().claim(&claimed)?;
        Ok(Self { group, claimed })
    }

    /// The group this access covers
    pub fn group(&self) -> &PinGroup {
        &self.group
    }

    /// Number of positions, gaps included
    pub fn size(&self) -> usize {
        self.group.size()
    }

    fn local(&self, pos: usize) -> Result<PinId> {
        if pos >= self.group.size() {
            return Err(Error::PositionOutOfRange(pos));
        }
        self.group.local_id(pos).ok_or(Error::EmptyPosition(pos))
    }

    /// Negotiate and apply a configuration for the pin at `pos`
    ///
    /// The request is folded onto the pin's current configuration. A
    /// rejection fails with [`Error::IncompatibleConfiguration`] and
    /// leaves the pin untouched. Returns the configuration now in effect.
    pub fn configure(&self, pos: usize, cfg: &PinConfiguration) -> Result<PinConfiguration> {
        let local = self.local(pos)?;
        let port = self.group.port();
        let mut proposed = *cfg;
        let reason = port.propose_config(local, &mut proposed, None)?;
        if reason.is_rejected() {
            return Err(Error::IncompatibleConfiguration(reason));
        }
        port.apply(local, &proposed)?;
        Ok(proposed)
    }

    /// Negotiate one configuration per position, then apply them all
    ///
    /// Nothing is applied unless every position negotiates. Gaps must be
    /// given requests without concrete options.
    pub fn configure_all(&self, cfgs: &[PinConfiguration]) -> Result<Vec<PinConfiguration>> {
        let mut proposed = cfgs.to_vec();
        let reason = self.group.propose_configs(&mut proposed, None, None)?;
        if reason.is_rejected() {
            return Err(Error::IncompatibleConfiguration(reason));
        }

        let port = self.group.port();
        for (pos, cfg) in proposed.iter().enumerate() {
            if let Some(local) = self.group.local_id(pos) {
                port.apply(local, cfg)?;
            }
        }
        Ok(proposed)
    }

    /// Read the pin at `pos`
    pub fn input(&self, pos: usize) -> Result<bool> {
        let local = self.local(pos)?;
        self.group.port().input(local)
    }

    /// Read every pin; gaps read as `None`
    pub fn inputs(&self) -> Result<Vec<Option<bool>>> {
        let port = self.group.port();
        self.group
            .local_ids()
            .into_iter()
            .map(|local| local.map(|l| port.input(l)).transpose())
            .collect()
    }

    /// Set the output level of the pin at `pos`
    pub fn output(&self, pos: usize, high: bool) -> Result<()> {
        let local = self.local(pos)?;
        self.group.port().output(local, high)
    }

    /// Set every pin's output level in position order; gap entries are
    /// ignored
    pub fn outputs(&self, levels: &[bool]) -> Result<()> {
        self.group.check_len(levels.len())?;
        let port = self.group.port();
        for (local, &high) in self.group.local_ids().into_iter().zip(levels) {
            if let Some(local) = local {
                port.output(local, high)?;
            }
        }
        Ok(())
    }
}

impl Drop for PinAccess {
    fn drop(&mut self) {
        self.group.port().release(&self.claimed);
    }
}
