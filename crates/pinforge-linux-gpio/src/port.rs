//! Linux GPIO chip exposed as a pinforge port
//!
//! Every line of one `/dev/gpiochipN` becomes a pin. Lines are requested
//! from the kernel the first time they are used, one request per line,
//! and kept until the port is dropped. Reading a line that was never
//! requested holds it without changing its direction. Lines that were
//! never requested report the configuration the kernel has for them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{LinuxGpioError, Result};

use gpiocdev::chip::Chip;
use gpiocdev::line::{Bias, Direction, Drive, EdgeDetection, Offset, Value};
use gpiocdev::request::{Config, Request};

use pinforge_core::error::Result as CoreResult;
use pinforge_core::pin::{PinCapFlags, PinCapability, PinCfgFlags, PinConfiguration, PinId};
use pinforge_core::port::{PinClaims, Port};

/// Consumer label shown by `gpioinfo` for lines we hold
const CONSUMER: &str = "pinforge";

/// What any line of a character device chip can do
const LINE_CAPABILITY: PinCapability = PinCapability::new(
    PinCapFlags::INPUT
        .union(PinCapFlags::OUTPUT_MASK)
        .union(PinCapFlags::INPUT_PULL_MASK)
        .union(PinCapFlags::EVENT_EDGE_FALLING)
        .union(PinCapFlags::EVENT_EDGE_RISING)
        .union(PinCapFlags::INTERRUPT_ON_EVENT),
    0,
);

/// Configuration for opening a Linux GPIO port
#[derive(Debug, Clone, Default)]
pub struct LinuxGpioPortConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Global id of line 0
    pub id_offset: PinId,
}

impl LinuxGpioPortConfig {
    /// Create a new configuration for the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the global id of line 0
    pub fn with_offset(mut self, offset: PinId) -> Self {
        self.id_offset = offset;
        self
    }
}

/// A line we hold a kernel request for
struct HeldLine {
    request: Request,
    cfg: PinConfiguration,
    /// Held only for reading; the kernel config was left alone
    as_is: bool,
}

/// Port backed by a Linux GPIO character device
pub struct LinuxGpioPort {
    device: String,
    chip: Chip,
    num_lines: u32,
    id_offset: PinId,
    held: Mutex<HashMap<Offset, HeldLine>>,
    claims: PinClaims,
}

fn value(high: bool) -> Value {
    if high {
        Value::Active
    } else {
        Value::Inactive
    }
}

/// Translate a negotiated configuration into a line request config
fn line_config(line: Offset, cfg: &PinConfiguration) -> Config {
    let opts = cfg.options;
    let mut config = Config::default();
    config.with_line(line);

    if opts.test(PinCfgFlags::DIR_OUTPUT) {
        config.as_output(value(cfg.output_state()));
        let drive = opts.mask(PinCfgFlags::OUTPUT_MASK);
        if drive == PinCfgFlags::OUTPUT_DRIVE_LOW {
            config.with_drive(Drive::OpenDrain);
        } else if drive == PinCfgFlags::OUTPUT_DRIVE_HIGH {
            config.with_drive(Drive::OpenSource);
        } else {
            config.with_drive(Drive::PushPull);
        }
    } else {
        config.as_input();
        let edges = opts.mask(PinCfgFlags::EVENT_EDGE_CHANGE);
        if edges == PinCfgFlags::EVENT_EDGE_CHANGE {
            config.with_edge_detection(EdgeDetection::BothEdges);
        } else if edges == PinCfgFlags::EVENT_EDGE_RISING {
            config.with_edge_detection(EdgeDetection::RisingEdge);
        } else if edges == PinCfgFlags::EVENT_EDGE_FALLING {
            config.with_edge_detection(EdgeDetection::FallingEdge);
        }
    }

    if opts.test(PinCfgFlags::INPUT_PULL_UP) {
        config.with_bias(Bias::PullUp);
    } else if opts.test(PinCfgFlags::INPUT_PULL_DOWN) {
        config.with_bias(Bias::PullDown);
    } else if opts.test(PinCfgFlags::INPUT_NO_PULL) {
        config.with_bias(Bias::Disabled);
    }
    config
}

/// Request config that reads `line` without touching its direction
fn read_config(line: Offset) -> Config {
    let mut config = Config::default();
    config.with_line(line).as_is();
    config
}

/// Every line needs a global id that fits in a [`PinId`]
fn check_id_range(offset: PinId, lines: u32) -> Result<()> {
    match offset.checked_add(lines) {
        Some(_) => Ok(()),
        None => Err(LinuxGpioError::IdRangeOverflow { offset, lines }),
    }
}

/// Describe a line the way the kernel reports it
fn config_from_info(info: &gpiocdev::line::Info) -> PinConfiguration {
    let mut opts = PinCfgFlags::zero();
    match info.direction {
        Direction::Output => {
            opts |= PinCfgFlags::DIR_OUTPUT;
            opts |= match info.drive {
                Some(Drive::OpenDrain) => PinCfgFlags::OUTPUT_DRIVE_LOW,
                Some(Drive::OpenSource) => PinCfgFlags::OUTPUT_DRIVE_HIGH,
                _ => PinCfgFlags::OUTPUT_PUSH_PULL,
            };
        }
        Direction::Input => {
            opts |= PinCfgFlags::DIR_INPUT;
            opts |= match info.edge_detection {
                Some(EdgeDetection::RisingEdge) => PinCfgFlags::EVENT_EDGE_RISING,
                Some(EdgeDetection::FallingEdge) => PinCfgFlags::EVENT_EDGE_FALLING,
                Some(EdgeDetection::BothEdges) => PinCfgFlags::EVENT_EDGE_CHANGE,
                None => PinCfgFlags::EVENT_NONE,
            };
        }
    }
    opts |= match info.bias {
        Some(Bias::PullUp) => PinCfgFlags::INPUT_PULL_UP,
        Some(Bias::PullDown) => PinCfgFlags::INPUT_PULL_DOWN,
        Some(Bias::Disabled) => PinCfgFlags::INPUT_NO_PULL,
        None => PinCfgFlags::zero(),
    };
    PinConfiguration::new(opts)
}

impl LinuxGpioPort {
    /// Open a GPIO chip
    pub fn open(config: &LinuxGpioPortConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }

        log::debug!("linux_gpio: Opening device {}", config.device);

        let chip = Chip::from_path(&config.device).map_err(|source| {
            LinuxGpioError::ChipOpenFailed {
                path: config.device.clone(),
                source,
            }
        })?;
        let info = chip.info().map_err(LinuxGpioError::ChipInfoFailed)?;
        check_id_range(config.id_offset, info.num_lines)?;

        log::info!(
            "linux_gpio: Opened {} ({}, {} lines at pin {})",
            config.device,
            info.label,
            info.num_lines,
            config.id_offset
        );

        Ok(Self {
            device: config.device.clone(),
            chip,
            num_lines: info.num_lines,
            id_offset: config.id_offset,
            held: Mutex::new(HashMap::new()),
            claims: PinClaims::new(),
        })
    }

    fn held(&self) -> MutexGuard<'_, HashMap<Offset, HeldLine>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, local: PinId) -> CoreResult<Offset> {
        if local < self.num_lines {
            Ok(local)
        } else {
            Err(pinforge_core::Error::NonexistentPin(self.global_id(local)))
        }
    }

    /// Request `line` with `cfg`, or reconfigure it if we already hold it
    fn request(&self, line: Offset, cfg: &PinConfiguration) -> Result<()> {
        let config = line_config(line, cfg);
        let mut held = self.held();
        match held.get_mut(&line) {
            Some(h) => {
                h.request
                    .reconfigure(&config)
                    .map_err(LinuxGpioError::ReconfigureFailed)?;
                h.cfg = *cfg;
                h.as_is = false;
            }
            None => {
                let request = Request::from_config(config)
                    .on_chip(&self.device)
                    .with_consumer(CONSUMER)
                    .request()
                    .map_err(LinuxGpioError::LineRequestFailed)?;
                held.insert(
                    line,
                    HeldLine {
                        request,
                        cfg: *cfg,
                        as_is: false,
                    },
                );
            }
        }
        log::debug!("linux_gpio: line {} configured as {}", line, cfg);
        Ok(())
    }

    /// Hold `line` as the kernel has it so its value can be read
    ///
    /// The line keeps its direction, so an output keeps driving.
    fn request_as_is(&self, line: Offset) -> Result<()> {
        let info = self
            .chip
            .line_info(line)
            .map_err(|source| LinuxGpioError::LineInfoFailed { line, source })?;
        let request = Request::from_config(read_config(line))
            .on_chip(&self.device)
            .with_consumer(CONSUMER)
            .request()
            .map_err(LinuxGpioError::LineRequestFailed)?;
        let cfg = config_from_info(&info);
        log::debug!("linux_gpio: holding line {} as {} for reading", line, cfg);
        self.held().insert(
            line,
            HeldLine {
                request,
                cfg,
                as_is: true,
            },
        );
        Ok(())
    }
}

impl Port for LinuxGpioPort {
    fn name(&self) -> &str {
        &self.device
    }

    fn pin_count(&self) -> u32 {
        self.num_lines
    }

    fn id_offset(&self) -> PinId {
        self.id_offset
    }

    fn capability(&self, local: PinId) -> PinCapability {
        if local < self.num_lines {
            LINE_CAPABILITY
        } else {
            PinCapability::NONEXISTENT
        }
    }

    fn configuration(&self, local: PinId) -> CoreResult<PinConfiguration> {
        let line = self.check(local)?;
        if let Some(h) = self.held().get(&line) {
            let mut cfg = h.cfg;
            let level = h
                .request
                .value(line)
                .map_err(LinuxGpioError::GetValueFailed)?;
            cfg.set_input_state(level == Value::Active);
            return Ok(cfg);
        }

        let info = self
            .chip
            .line_info(line)
            .map_err(|source| LinuxGpioError::LineInfoFailed { line, source })?;
        Ok(config_from_info(&info))
    }

    fn apply(&self, local: PinId, cfg: &PinConfiguration) -> CoreResult<()> {
        let line = self.check(local)?;
        self.request(line, cfg)?;
        Ok(())
    }

    fn input(&self, local: PinId) -> CoreResult<bool> {
        let line = self.check(local)?;
        if !self.held().contains_key(&line) {
            self.request_as_is(line)?;
        }
        let held = self.held();
        let Some(h) = held.get(&line) else {
            return Err(pinforge_core::Error::NonexistentPin(self.global_id(local)));
        };
        let level = h
            .request
            .value(line)
            .map_err(LinuxGpioError::GetValueFailed)?;
        Ok(level == Value::Active)
    }

    fn output(&self, local: PinId, high: bool) -> CoreResult<()> {
        let line = self.check(local)?;
        let mut held = self.held();
        if let Some(h) = held.get_mut(&line).filter(|h| h.cfg.is_output() && !h.as_is) {
            h.request
                .set_value(line, value(high))
                .map_err(LinuxGpioError::SetValueFailed)?;
            h.cfg.set_output_state(high);
            return Ok(());
        }
        drop(held);

        // not an output yet: request it as one, starting at the wanted level
        log::debug!("linux_gpio: requesting line {} as output for writing", line);
        let mut cfg = PinConfiguration::output(PinCfgFlags::OUTPUT_PUSH_PULL);
        cfg.set_output_state(high);
        self.request(line, &cfg)?;
        Ok(())
    }

    fn claims(&self) -> &PinClaims {
        &self.claims
    }
}

/// Parse port options from a list of key-value pairs
///
/// # Supported Options
///
/// - `dev=/dev/gpiochipN` - GPIO chip device path (required, or use gpiochip)
/// - `gpiochip=N` - GPIO chip number (alternative to dev)
/// - `offset=N` - Global pin id of line 0 (optional, default 0)
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxGpioPortConfig, String> {
    let mut config = LinuxGpioPortConfig::default();
    let mut gpiochip: Option<u32> = None;

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "gpiochip" => {
                gpiochip = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid gpiochip value: {}", value))?,
                );
            }
            "offset" => {
                config.id_offset = value
                    .parse()
                    .map_err(|_| format!("Invalid offset value: {}", value))?;
            }
            _ => {
                log::warn!("linux_gpio: Unknown option: {}={}", key, value);
            }
        }
    }

    // Handle dev vs gpiochip
    if config.device.is_empty() {
        if let Some(n) = gpiochip {
            config.device = format!("/dev/gpiochip{}", n);
        } else {
            return Err("Either 'dev' or 'gpiochip' must be specified.\n\
                 e.g. linux_gpio:dev=/dev/gpiochip0"
                .to_string());
        }
    } else if gpiochip.is_some() {
        return Err("Only one of 'dev' or 'gpiochip' can be specified".to_string());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("gpiochip", "2"), ("offset", "64")]).unwrap();
        assert_eq!(config.device, "/dev/gpiochip2");
        assert_eq!(config.id_offset, 64);

        let config = parse_options(&[("dev", "/dev/gpiochip0")]).unwrap();
        assert_eq!(config.device, "/dev/gpiochip0");
        assert_eq!(config.id_offset, 0);

        assert!(parse_options(&[]).is_err());
        assert!(parse_options(&[("dev", "/dev/gpiochip0"), ("gpiochip", "0")]).is_err());
        assert!(parse_options(&[("gpiochip", "x")]).is_err());
    }

    #[test]
    fn test_open_requires_device() {
        assert!(matches!(
            LinuxGpioPort::open(&LinuxGpioPortConfig::default()),
            Err(LinuxGpioError::NoDevice)
        ));
    }

    #[test]
    fn test_line_capability_accepts_negotiated_configs() {
        let out = PinConfiguration::output(PinCfgFlags::OUTPUT_DRIVE_LOW);
        assert!(!LINE_CAPABILITY.compatible(&out).is_rejected());
        let edges = PinConfiguration::input()
            .with(PinCfgFlags::EVENT_EDGE_CHANGE | PinCfgFlags::INTERRUPT_ON_EVENT);
        assert!(!LINE_CAPABILITY.compatible(&edges).is_rejected());
        let level = PinConfiguration::input().with(PinCfgFlags::EVENT_LEVEL_LOW);
        assert!(LINE_CAPABILITY.compatible(&level).is_rejected());
    }

    #[test]
    fn test_id_range() {
        assert!(check_id_range(0, 64).is_ok());
        assert!(check_id_range(PinId::MAX - 8, 8).is_ok());
        assert!(matches!(
            check_id_range(PinId::MAX - 7, 8),
            Err(LinuxGpioError::IdRangeOverflow { lines: 8, .. })
        ));
    }

    #[test]
    fn test_read_config_keeps_direction() {
        let config = read_config(5);
        let line = config.line_config(5).unwrap();
        assert_eq!(line.direction, None);
        assert_eq!(line.bias, None);

        let mut out = PinConfiguration::output(PinCfgFlags::OUTPUT_PUSH_PULL);
        out.set_output_state(true);
        let config = line_config(5, &out);
        let line = config.line_config(5).unwrap();
        assert_eq!(line.direction, Some(Direction::Output));
        assert_eq!(line.value, Some(Value::Active));
    }
}
