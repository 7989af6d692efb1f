//! Chip-select drivers built on claimed pins

use super::{ChipId, ChipSelectDriver};
use crate::error::{Error, Result};
use crate::pin::{PinAccess, PinConfiguration, RejectReason};

/// Drive every present pin to its idle level, then make it an output in
/// its preferred drive style
///
/// The levels are latched before the direction changes so a select line
/// never passes through its active level. Nothing is driven unless every
/// pin negotiates.
fn configure_outputs(access: &PinAccess, idle: &[bool]) -> Result<()> {
    let group = access.group();
    let cfgs = group
        .capabilities()
        .iter()
        .enumerate()
        .map(|(pos, cap)| {
            if !group.exists(pos) {
                return Ok(PinConfiguration::NO_CHANGE);
            }
            cap.default_output_config()
                .ok_or(Error::IncompatibleConfiguration(
                    RejectReason::DirectionUnsupported,
                ))
        })
        .collect::<Result<Vec<_>>>()?;

    let reason = group.propose_configs(&mut cfgs.clone(), None, None)?;
    if reason.is_rejected() {
        return Err(Error::IncompatibleConfiguration(reason));
    }

    access.outputs(idle)?;
    access.configure_all(&cfgs)?;
    Ok(())
}

/// Single select line for a single chip (chip 0)
#[derive(Debug)]
pub struct PinSelect {
    access: PinAccess,
    active_level: bool,
}

impl PinSelect {
    /// Take over a one-pin access and drive it inactive
    ///
    /// `active_level` is the level that selects the chip; most chips
    /// select on low.
    pub fn new(access: PinAccess, active_level: bool) -> Result<Self> {
        if access.size() != 1 {
            return Err(Error::LengthMismatch {
                expected: 1,
                actual: access.size(),
            });
        }
        if !access.group().exists(0) {
            return Err(Error::EmptyPosition(0));
        }
        configure_outputs(&access, &[!active_level])?;
        Ok(Self {
            access,
            active_level,
        })
    }

    /// Give the pins back
    pub fn into_inner(self) -> PinAccess {
        self.access
    }
}

impl ChipSelectDriver for PinSelect {
    fn is_valid_chip(&self, chip: ChipId) -> bool {
        chip == 0
    }

    fn select(&self, _chip: ChipId) -> Result<()> {
        self.access.output(0, self.active_level)
    }

    fn deselect(&self, _chip: ChipId) -> Result<()> {
        self.access.output(0, !self.active_level)
    }
}

/// One select line per chip
///
/// The pin at position `n` selects chip `n`. Gaps are chips that cannot
/// be selected.
#[derive(Debug)]
pub struct PinSetSelect {
    access: PinAccess,
    active_level: bool,
}

impl PinSetSelect {
    /// Take over the pins and drive them all inactive
    pub fn new(access: PinAccess, active_level: bool) -> Result<Self> {
        configure_outputs(&access, &vec![!active_level; access.size()])?;
        Ok(Self {
            access,
            active_level,
        })
    }

    /// Give the pins back
    pub fn into_inner(self) -> PinAccess {
        self.access
    }

    fn position(&self, chip: ChipId) -> Result<usize> {
        usize::try_from(chip)
            .ok()
            .filter(|&pos| self.access.group().exists(pos))
            .ok_or(Error::InvalidChipId(chip))
    }
}

impl ChipSelectDriver for PinSetSelect {
    fn is_valid_chip(&self, chip: ChipId) -> bool {
        self.position(chip).is_ok()
    }

    fn select(&self, chip: ChipId) -> Result<()> {
        let pos = self.position(chip)?;
        self.access.output(pos, self.active_level)
    }

    fn deselect(&self, chip: ChipId) -> Result<()> {
        let pos = self.position(chip)?;
        self.access.output(pos, !self.active_level)
    }
}

/// Chip id encoded in binary on address lines
///
/// Position 0 carries the least significant bit. With an enable line,
/// it sits at the last position of the access: it is asserted after the
/// address is set and released on deselect. Without one, deselecting
/// leaves the address lines alone.
#[derive(Debug)]
pub struct MultiplexerSelect {
    access: PinAccess,
    address_lines: usize,
    enable: Option<bool>,
}

impl MultiplexerSelect {
    /// Take over the pins, set address 0 and release the enable line
    ///
    /// `enable` is the active level of the enable line, or `None` if
    /// there is none. Address lines must not be gaps.
    pub fn new(access: PinAccess, enable: Option<bool>) -> Result<Self> {
        let address_lines = match (access.size(), enable) {
            (0, Some(_)) => {
                return Err(Error::LengthMismatch {
                    expected: 1,
                    actual: 0,
                })
            }
            (size, Some(_)) => size - 1,
            (size, None) => size,
        };
        if let Some(pos) = (0..access.size()).find(|&pos| !access.group().exists(pos)) {
            return Err(Error::EmptyPosition(pos));
        }

        let mut idle = vec![false; address_lines];
        if let Some(active) = enable {
            idle.push(!active);
        }
        configure_outputs(&access, &idle)?;

        Ok(Self {
            access,
            address_lines,
            enable,
        })
    }

    /// Number of address lines
    pub fn address_lines(&self) -> usize {
        self.address_lines
    }

    /// Give the pins back
    pub fn into_inner(self) -> PinAccess {
        self.access
    }
}

impl ChipSelectDriver for MultiplexerSelect {
    fn is_valid_chip(&self, chip: ChipId) -> bool {
        u32::try_from(chip)
            .is_ok_and(|chip| chip.checked_shr(self.address_lines as u32).unwrap_or(0) == 0)
    }

    fn select(&self, chip: ChipId) -> Result<()> {
        if !self.is_valid_chip(chip) {
            return Err(Error::InvalidChipId(chip));
        }
        for bit in 0..self.address_lines {
            let high = chip.checked_shr(bit as u32).unwrap_or(0) & 1 == 1;
            self.access.output(bit, high)?;
        }
        if let Some(active) = self.enable {
            self.access.output(self.address_lines, active)?;
        }
        Ok(())
    }

    fn deselect(&self, _chip: ChipId) -> Result<()> {
        match self.enable {
            Some(active) => self.access.output(self.address_lines, !active),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::{PinCapFlags, PinCapability, PinGroup};
    use crate::port::Port;
    use crate::select::ChipSelectManager;
    use crate::testing::MockPort;
    use std::sync::Arc;

    fn access(port: &Arc<MockPort>, ids: &[i64]) -> PinAccess {
        PinGroup::from_raw(port.clone(), ids)
            .unwrap()
            .access()
            .unwrap()
    }

    #[test]
    fn test_pin_select_active_low() {
        let port = Arc::new(MockPort::new("mock", 4, 0));
        let cs = PinSelect::new(access(&port, &[2]), false).unwrap();
        assert!(port.configuration(2).unwrap().is_output());
        assert!(port.level(2));
        assert!(!cs.is_valid_chip(1));

        let manager = ChipSelectManager::new(cs);
        let token = manager.select(0).unwrap();
        assert!(!port.level(2));
        drop(token);
        assert!(port.level(2));
    }

    #[test]
    fn test_pin_select_needs_one_pin() {
        let port = Arc::new(MockPort::new("mock", 4, 0));
        assert!(matches!(
            PinSelect::new(access(&port, &[0, 1]), false),
            Err(Error::LengthMismatch { .. })
        ));
        assert!(matches!(
            PinSelect::new(access(&port, &[-1]), false),
            Err(Error::EmptyPosition(0))
        ));
    }

    #[test]
    fn test_pin_select_rejects_input_only() {
        let mut port = MockPort::new("mock", 4, 0);
        port.set_capability(1, PinCapability::new(PinCapFlags::INPUT, 0));
        let port = Arc::new(port);
        assert!(matches!(
            PinSelect::new(access(&port, &[1]), false),
            Err(Error::IncompatibleConfiguration(
                RejectReason::DirectionUnsupported
            ))
        ));
    }

    #[test]
    fn test_pin_set_select() {
        let port = Arc::new(MockPort::new("mock", 4, 0));
        let cs = PinSetSelect::new(access(&port, &[3, -1, 1]), true).unwrap();
        assert!(cs.is_valid_chip(0));
        assert!(!cs.is_valid_chip(1));
        assert!(cs.is_valid_chip(2));
        assert!(!cs.is_valid_chip(3));
        assert!(!cs.is_valid_chip(-1));
        assert!(!port.level(3) && !port.level(1));

        cs.select(2).unwrap();
        assert!(port.level(1));
        assert!(!port.level(3));
        cs.deselect(2).unwrap();
        assert!(!port.level(1));
    }

    #[test]
    fn test_multiplexer_with_enable() {
        let port = Arc::new(MockPort::new("mock", 4, 0));
        // two address lines, enable active low on pin 3
        let cs = MultiplexerSelect::new(access(&port, &[0, 1, 3]), Some(false)).unwrap();
        assert_eq!(cs.address_lines(), 2);
        assert!(cs.is_valid_chip(3));
        assert!(!cs.is_valid_chip(4));
        assert!(port.level(3));

        cs.select(2).unwrap();
        assert!(!port.level(0));
        assert!(port.level(1));
        assert!(!port.level(3));

        cs.deselect(2).unwrap();
        assert!(port.level(3));
        // address is left as it was
        assert!(port.level(1));
    }

    #[test]
    fn test_multiplexer_without_enable() {
        let port = Arc::new(MockPort::new("mock", 4, 0));
        let cs = MultiplexerSelect::new(access(&port, &[0, 1, 2]), None).unwrap();
        assert!(cs.is_valid_chip(7));
        assert!(!cs.is_valid_chip(8));

        cs.select(5).unwrap();
        let before = port.writes().len();
        cs.deselect(5).unwrap();
        assert_eq!(port.writes().len(), before);
        assert!(port.level(0) && !port.level(1) && port.level(2));
    }

    #[test]
    fn test_multiplexer_rejects_gaps() {
        let port = Arc::new(MockPort::new("mock", 4, 0));
        assert!(matches!(
            MultiplexerSelect::new(access(&port, &[0, -1, 2]), None),
            Err(Error::EmptyPosition(1))
        ));
    }
}
