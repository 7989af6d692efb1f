//! Simulated port

use std::sync::{Mutex, MutexGuard, PoisonError};

use pinforge_core::error::{Error, Result};
use pinforge_core::pin::{PinCapFlags, PinCapability, PinCfgFlags, PinConfiguration, PinId};
use pinforge_core::port::{PinClaims, Port};

/// Capabilities of a dummy pin unless overridden: everything, 20 mA
pub const DEFAULT_CAPABILITY: PinCapability =
    PinCapability::new(PinCapFlags::REAL_MASK.union(PinCapFlags::EVENT_MASK), 20);

/// Configuration for the dummy port
#[derive(Debug, Clone)]
pub struct DummyPortConfig {
    /// Port name used in logs
    pub name: String,
    /// Number of local ids
    pub pin_count: u32,
    /// Global id of local pin 0
    pub id_offset: PinId,
    /// Capabilities of every pin without an override
    pub capability: PinCapability,
    /// Per-pin capabilities, by local id
    pub overrides: Vec<(PinId, PinCapability)>,
}

impl Default for DummyPortConfig {
    fn default() -> Self {
        Self {
            name: "dummy".to_string(),
            pin_count: 8,
            id_offset: 0,
            capability: DEFAULT_CAPABILITY,
            overrides: Vec::new(),
        }
    }
}

impl DummyPortConfig {
    /// Create a configuration with `pin_count` fully capable pins
    pub fn new(pin_count: u32) -> Self {
        Self {
            pin_count,
            ..Default::default()
        }
    }

    /// Set the global id of local pin 0
    pub fn with_offset(mut self, offset: PinId) -> Self {
        self.id_offset = offset;
        self
    }

    /// Set the port name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the capabilities of one local pin
    pub fn with_pin(mut self, local: PinId, capability: PinCapability) -> Self {
        self.overrides.retain(|&(id, _)| id != local);
        self.overrides.push((local, capability));
        self
    }

    /// Leave a hole at a local id
    pub fn without_pin(self, local: PinId) -> Self {
        self.with_pin(local, PinCapability::NONEXISTENT)
    }

    fn capability_of(&self, local: PinId) -> PinCapability {
        self.overrides
            .iter()
            .find(|&&(id, _)| id == local)
            .map_or(self.capability, |&(_, cap)| cap)
    }
}

/// Something a dummy port was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DummyEvent {
    /// A configuration was applied to a local pin
    Configured(PinId, PinConfiguration),
    /// A local pin was driven
    Output(PinId, bool),
}

#[derive(Debug, Default)]
struct DummyPin {
    cfg: PinConfiguration,
    /// Level forced onto the pin from outside; `None` lets the pull decide
    external: Option<bool>,
    driven: bool,
}

impl DummyPin {
    fn level(&self) -> bool {
        if self.cfg.is_output() {
            return self.driven;
        }
        self.external
            .unwrap_or_else(|| self.cfg.options.test(PinCfgFlags::INPUT_PULL_UP))
    }
}

/// Port whose pins live in memory
///
/// Pins start with no configuration. An input reads the level set with
/// [`DummyPort::set_input_level`], or its pull when none was set; an
/// output reads back what was driven.
pub struct DummyPort {
    config: DummyPortConfig,
    pins: Mutex<Vec<DummyPin>>,
    history: Mutex<Vec<DummyEvent>>,
    claims: PinClaims,
}

impl DummyPort {
    /// Create a dummy port
    ///
    /// Pins that would get a global id past `PinId::MAX` are dropped.
    pub fn new(mut config: DummyPortConfig) -> Self {
        let room = PinId::MAX - config.id_offset;
        if config.pin_count > room {
            log::warn!(
                "dummy: only {} of {} pins fit above offset {}",
                room,
                config.pin_count,
                config.id_offset
            );
            config.pin_count = room;
        }
        log::debug!(
            "dummy: {} pins at {}..{}",
            config.pin_count,
            config.id_offset,
            config.id_offset + config.pin_count
        );
        let pins = (0..config.pin_count).map(|_| DummyPin::default()).collect();
        Self {
            config,
            pins: Mutex::new(pins),
            history: Mutex::new(Vec::new()),
            claims: PinClaims::new(),
        }
    }

    /// Create a dummy port with `pin_count` fully capable pins at global
    /// ids `0..pin_count`
    pub fn with_pins(pin_count: u32) -> Self {
        Self::new(DummyPortConfig::new(pin_count))
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyPortConfig {
        &self.config
    }

    fn pins(&self) -> MutexGuard<'_, Vec<DummyPin>> {
        self.pins.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: DummyEvent) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn index(&self, local: PinId) -> Result<usize> {
        if self.capability(local).exists() {
            Ok(local as usize)
        } else {
            Err(Error::NonexistentPin(self.global_id(local)))
        }
    }

    /// Force the level seen on an input; `None` lets the pull decide
    pub fn set_input_level(&self, local: PinId, level: Option<bool>) -> Result<()> {
        let idx = self.index(local)?;
        self.pins()[idx].external = level;
        Ok(())
    }

    /// Last level driven on a pin
    pub fn output_level(&self, local: PinId) -> Result<bool> {
        let idx = self.index(local)?;
        Ok(self.pins()[idx].driven)
    }

    /// Everything applied or driven so far, oldest first
    pub fn history(&self) -> Vec<DummyEvent> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the recorded history
    pub fn clear_history(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Port for DummyPort {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn pin_count(&self) -> u32 {
        self.config.pin_count
    }

    fn id_offset(&self) -> PinId {
        self.config.id_offset
    }

    fn capability(&self, local: PinId) -> PinCapability {
        if local < self.config.pin_count {
            self.config.capability_of(local)
        } else {
            PinCapability::NONEXISTENT
        }
    }

    fn configuration(&self, local: PinId) -> Result<PinConfiguration> {
        let idx = self.index(local)?;
        let pins = self.pins();
        let pin = &pins[idx];
        let mut cfg = pin.cfg;
        cfg.set_input_state(pin.level());
        cfg.set_output_state(pin.driven);
        Ok(cfg)
    }

    fn apply(&self, local: PinId, cfg: &PinConfiguration) -> Result<()> {
        let idx = self.index(local)?;
        let mut stored = *cfg;
        stored.options.clear_flags(PinCfgFlags::STATE_MASK);
        self.pins()[idx].cfg = stored;
        log::trace!("dummy: pin {} configured as {}", local, stored);
        self.record(DummyEvent::Configured(local, stored));
        Ok(())
    }

    fn input(&self, local: PinId) -> Result<bool> {
        let idx = self.index(local)?;
        Ok(self.pins()[idx].level())
    }

    fn output(&self, local: PinId, high: bool) -> Result<()> {
        let idx = self.index(local)?;
        self.pins()[idx].driven = high;
        log::trace!("dummy: pin {} driven {}", local, if high { "high" } else { "low" });
        self.record(DummyEvent::Output(local, high));
        Ok(())
    }

    fn claims(&self) -> &PinClaims {
        &self.claims
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> std::result::Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid {} value: {}", key, value))
}

/// Parse port options from a list of key-value pairs
///
/// # Supported Options
///
/// - `pins=N` - Number of pins (default 8)
/// - `offset=N` - Global id of the first pin (default 0)
/// - `name=S` - Port name (default "dummy")
/// - `maxcurrent=N` - Output current limit in mA, 0 for none (default 20)
/// - `inputonly=N` - Local pin N can only be read (may be repeated)
/// - `missing=N` - Local pin N does not exist (may be repeated)
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<DummyPortConfig, String> {
    let mut config = DummyPortConfig::default();
    let mut input_only = Vec::new();
    let mut missing = Vec::new();

    for (key, value) in options {
        match *key {
            "pins" => config.pin_count = parse_number(key, value)?,
            "offset" => config.id_offset = parse_number(key, value)?,
            "name" => config.name = value.to_string(),
            "maxcurrent" => config.capability.max_output_current = parse_number(key, value)?,
            "inputonly" => input_only.push(parse_number::<PinId>(key, value)?),
            "missing" => missing.push(parse_number::<PinId>(key, value)?),
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.pin_count == 0 {
        return Err("A dummy port needs at least one pin".to_string());
    }
    if config.id_offset.checked_add(config.pin_count).is_none() {
        return Err(format!(
            "Pin ids {}+{} do not fit in a pin id",
            config.id_offset, config.pin_count
        ));
    }

    let input_cap = PinCapability::new(
        config.capability.capabilities.without(PinCapFlags::OUTPUT_MASK),
        0,
    );
    for local in input_only {
        config = config.with_pin(local, input_cap);
    }
    for local in missing {
        config = config.without_pin(local);
    }
    Ok(config)
}
