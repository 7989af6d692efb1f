//! Test doubles shared by the unit tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::pin::{PinCapFlags, PinCapability, PinConfiguration, PinId};
use crate::port::{PinClaims, Port};
use crate::select::{ChipId, ChipSelectDriver};

/// Everything a pin can do, 20 mA
pub const FULL: PinCapability = PinCapability::new(
    PinCapFlags::INPUT
        .union(PinCapFlags::OUTPUT_MASK)
        .union(PinCapFlags::INPUT_PULL_MASK),
    20,
);

#[derive(Debug)]
struct MockPin {
    cfg: PinConfiguration,
    level: bool,
}

/// In-memory port recording every output write
pub struct MockPort {
    name: String,
    offset: PinId,
    caps: Vec<PinCapability>,
    pins: Mutex<Vec<MockPin>>,
    writes: Mutex<Vec<(PinId, bool)>>,
    claims: PinClaims,
}

impl MockPort {
    pub fn new(name: &str, count: u32, offset: PinId) -> Self {
        Self {
            name: name.to_string(),
            offset,
            caps: vec![FULL; count as usize],
            pins: Mutex::new(
                (0..count)
                    .map(|_| MockPin {
                        cfg: PinConfiguration::NO_CHANGE,
                        level: false,
                    })
                    .collect(),
            ),
            writes: Mutex::new(Vec::new()),
            claims: PinClaims::new(),
        }
    }

    pub fn set_capability(&mut self, local: PinId, cap: PinCapability) {
        self.caps[local as usize] = cap;
    }

    /// Output writes as (local id, level)
    pub fn writes(&self) -> Vec<(PinId, bool)> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn level(&self, local: PinId) -> bool {
        self.pins.lock().unwrap_or_else(PoisonError::into_inner)[local as usize].level
    }

    fn check(&self, local: PinId) -> Result<usize> {
        if self.capability(local).exists() {
            Ok(local as usize)
        } else {
            Err(Error::NonexistentPin(self.global_id(local)))
        }
    }
}

impl Port for MockPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn pin_count(&self) -> u32 {
        self.caps.len() as u32
    }

    fn id_offset(&self) -> PinId {
        self.offset
    }

    fn capability(&self, local: PinId) -> PinCapability {
        self.caps
            .get(local as usize)
            .copied()
            .unwrap_or(PinCapability::NONEXISTENT)
    }

    fn configuration(&self, local: PinId) -> Result<PinConfiguration> {
        let idx = self.check(local)?;
        Ok(self.pins.lock().unwrap_or_else(PoisonError::into_inner)[idx].cfg)
    }

    fn apply(&self, local: PinId, cfg: &PinConfiguration) -> Result<()> {
        let idx = self.check(local)?;
        self.pins.lock().unwrap_or_else(PoisonError::into_inner)[idx].cfg = *cfg;
        Ok(())
    }

    fn input(&self, local: PinId) -> Result<bool> {
        let idx = self.check(local)?;
        Ok(self.pins.lock().unwrap_or_else(PoisonError::into_inner)[idx].level)
    }

    fn output(&self, local: PinId, high: bool) -> Result<()> {
        let idx = self.check(local)?;
        let mut pins = self.pins.lock().unwrap_or_else(PoisonError::into_inner);
        pins[idx].level = high;
        pins[idx].cfg.set_output_state(high);
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((local, high));
        Ok(())
    }

    fn claims(&self) -> &PinClaims {
        &self.claims
    }
}

/// What a [`RecordingSelect`] was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectEvent {
    Select(ChipId),
    Deselect(ChipId),
}

/// Select driver accepting chips `0..count` and recording every call
pub struct RecordingSelect {
    count: ChipId,
    events: Mutex<Vec<SelectEvent>>,
    fail_deselect: AtomicBool,
}

impl RecordingSelect {
    pub fn new(count: ChipId) -> Self {
        Self {
            count,
            events: Mutex::new(Vec::new()),
            fail_deselect: AtomicBool::new(false),
        }
    }

    pub fn events(&self) -> Vec<SelectEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn deselects(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, SelectEvent::Deselect(_)))
            .count()
    }

    pub fn fail_deselect(&self, fail: bool) {
        self.fail_deselect.store(fail, Ordering::SeqCst);
    }

    fn record(&self, event: SelectEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ChipSelectDriver for RecordingSelect {
    fn is_valid_chip(&self, chip: ChipId) -> bool {
        (0..self.count).contains(&chip)
    }

    fn select(&self, chip: ChipId) -> Result<()> {
        self.record(SelectEvent::Select(chip));
        Ok(())
    }

    fn deselect(&self, chip: ChipId) -> Result<()> {
        if self.fail_deselect.load(Ordering::SeqCst) {
            return Err(Error::backend(std::io::Error::other("deselect failed")));
        }
        self.record(SelectEvent::Deselect(chip));
        Ok(())
    }
}
