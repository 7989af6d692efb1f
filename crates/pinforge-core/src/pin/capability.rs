//! Pin capabilities
//!
//! A [`PinCapability`] describes what one physical pin can do. Port
//! backends build one per pin from hardware documentation or from the
//! kernel's line information; the core only reads it.

use core::fmt;

use crate::flags::FlagSet;
use crate::pin::configuration::{PinCfgFlags, PinConfiguration};

/// Marker for capability flags
pub enum PinCapTag {}

/// Capability flag set
pub type PinCapFlags = FlagSet<PinCapTag, u32>;

impl PinCapFlags {
    /// Pin can read its level
    pub const INPUT: Self = Self::bit(0);
    /// Output can sink current (open drain)
    pub const OUTPUT_DRIVE_LOW: Self = Self::bit(1);
    /// Output can source current (open source)
    pub const OUTPUT_DRIVE_HIGH: Self = Self::bit(2);
    /// Output can actively drive both levels
    pub const OUTPUT_PUSH_PULL: Self = Self::bit(3);
    /// Any output drive style
    pub const OUTPUT_MASK: Self = Self::OUTPUT_DRIVE_LOW
        .union(Self::OUTPUT_DRIVE_HIGH)
        .union(Self::OUTPUT_PUSH_PULL);

    /// Pull resistors can be disabled
    pub const INPUT_NO_PULL: Self = Self::bit(4);
    /// Pull-up resistor available
    pub const INPUT_PULL_UP: Self = Self::bit(5);
    /// Pull-down resistor available
    pub const INPUT_PULL_DOWN: Self = Self::bit(6);
    /// Any controllable pull setting
    pub const INPUT_PULL_MASK: Self = Self::INPUT_NO_PULL
        .union(Self::INPUT_PULL_UP)
        .union(Self::INPUT_PULL_DOWN);

    /// Falling edges can be detected
    pub const EVENT_EDGE_FALLING: Self = Self::bit(8);
    /// Rising edges can be detected
    pub const EVENT_EDGE_RISING: Self = Self::bit(9);
    /// Low level can be detected
    pub const EVENT_LEVEL_LOW: Self = Self::bit(10);
    /// High level can be detected
    pub const EVENT_LEVEL_HIGH: Self = Self::bit(11);

    /// All event detection bits
    pub const EVENT_MASK: Self = Self::EVENT_EDGE_FALLING
        .union(Self::EVENT_EDGE_RISING)
        .union(Self::EVENT_LEVEL_LOW)
        .union(Self::EVENT_LEVEL_HIGH);

    /// Events can raise an interrupt
    pub const INTERRUPT_ON_EVENT: Self = Self::bit(16);

    /// Bits that make a pin count as existing
    pub const REAL_MASK: Self = Self::INPUT
        .union(Self::OUTPUT_MASK)
        .union(Self::INPUT_PULL_MASK)
        .union(Self::INTERRUPT_ON_EVENT);
}

/// Why a configuration cannot be used on a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RejectReason {
    /// The configuration is usable
    #[default]
    NotRejected,
    /// Requested direction is not supported
    DirectionUnsupported,
    /// Requested pull setting is not supported
    PullUnsupported,
    /// Requested event detection is not supported
    EventUnsupported,
    /// Interrupts are not supported
    InterruptUnsupported,
    /// Requested output drive style is not supported
    OutputStyleUnsupported,
    /// Required output current is more than the pin can supply
    CurrentExceedsMax,
    /// There is no pin at this position
    NonexistentPin,
}

impl RejectReason {
    /// True for every value except [`RejectReason::NotRejected`]
    pub fn is_rejected(self) -> bool {
        self != Self::NotRejected
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRejected => write!(f, "not rejected"),
            Self::DirectionUnsupported => write!(f, "direction unsupported"),
            Self::PullUnsupported => write!(f, "pull unsupported"),
            Self::EventUnsupported => write!(f, "event unsupported"),
            Self::InterruptUnsupported => write!(f, "interrupt unsupported"),
            Self::OutputStyleUnsupported => write!(f, "output style unsupported"),
            Self::CurrentExceedsMax => write!(f, "current exceeds maximum"),
            Self::NonexistentPin => write!(f, "pin does not exist"),
        }
    }
}

/// What a single pin can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PinCapability {
    /// Capability flags
    pub capabilities: PinCapFlags,
    /// Maximum output current in milliamps, zero if unspecified
    pub max_output_current: u16,
}

impl PinCapability {
    /// Capability of a pin that does not exist
    pub const NONEXISTENT: Self = Self::new(PinCapFlags::from_bits(0), 0);

    /// Create a capability description
    pub const fn new(capabilities: PinCapFlags, max_output_current: u16) -> Self {
        Self {
            capabilities,
            max_output_current,
        }
    }

    /// True if the pin can do anything at all
    pub fn exists(&self) -> bool {
        self.capabilities.any(PinCapFlags::REAL_MASK)
    }

    /// True if the pin can be read
    pub fn can_input(&self) -> bool {
        self.capabilities.test(PinCapFlags::INPUT)
    }

    /// True if the pin has any output drive style
    pub fn can_output(&self) -> bool {
        self.capabilities.any(PinCapFlags::OUTPUT_MASK)
    }

    /// The preferred output drive style
    ///
    /// Checks push-pull, then drive-low, then drive-high and returns the
    /// first one the pin has, or zero. Drivers rely on this order when
    /// picking a default.
    pub fn first_output_drive_flag(&self) -> PinCapFlags {
        [
            PinCapFlags::OUTPUT_PUSH_PULL,
            PinCapFlags::OUTPUT_DRIVE_LOW,
            PinCapFlags::OUTPUT_DRIVE_HIGH,
        ]
        .into_iter()
        .find(|&flag| self.capabilities.test(flag))
        .unwrap_or_default()
    }

    /// Output configuration using the preferred drive style
    ///
    /// Returns `None` if the pin cannot output.
    pub fn default_output_config(&self) -> Option<PinConfiguration> {
        let drive = self.first_output_drive_flag();
        let options = if drive == PinCapFlags::OUTPUT_PUSH_PULL {
            PinCfgFlags::OUTPUT_PUSH_PULL
        } else if drive == PinCapFlags::OUTPUT_DRIVE_LOW {
            PinCfgFlags::OUTPUT_DRIVE_LOW
        } else if drive == PinCapFlags::OUTPUT_DRIVE_HIGH {
            PinCfgFlags::OUTPUT_DRIVE_HIGH
        } else {
            return None;
        };
        Some(PinConfiguration::new(PinCfgFlags::DIR_OUTPUT | options))
    }

    /// Check whether the concrete parts of `cfg` are possible on this pin
    ///
    /// Only concrete selectors are checked; "no change" domains and
    /// domains carrying their immaterial bit are always accepted. The
    /// first violated domain is reported, in the order direction, pull,
    /// event, interrupt, output drive, current.
    pub fn compatible(&self, cfg: &PinConfiguration) -> RejectReason {
        let caps = self.capabilities;
        let opts = cfg.concrete_options();

        if (opts.test(PinCfgFlags::DIR_INPUT) && !self.can_input())
            || (opts.test(PinCfgFlags::DIR_OUTPUT) && !self.can_output())
        {
            return RejectReason::DirectionUnsupported;
        }

        let pulls = [
            (PinCfgFlags::INPUT_NO_PULL, PinCapFlags::INPUT_NO_PULL),
            (PinCfgFlags::INPUT_PULL_UP, PinCapFlags::INPUT_PULL_UP),
            (PinCfgFlags::INPUT_PULL_DOWN, PinCapFlags::INPUT_PULL_DOWN),
        ];
        if pulls
            .iter()
            .any(|&(want, have)| opts.test(want) && !caps.test(have))
        {
            return RejectReason::PullUnsupported;
        }

        let events = [
            (PinCfgFlags::EVENT_EDGE_FALLING, PinCapFlags::EVENT_EDGE_FALLING),
            (PinCfgFlags::EVENT_EDGE_RISING, PinCapFlags::EVENT_EDGE_RISING),
            (PinCfgFlags::EVENT_LEVEL_LOW, PinCapFlags::EVENT_LEVEL_LOW),
            (PinCfgFlags::EVENT_LEVEL_HIGH, PinCapFlags::EVENT_LEVEL_HIGH),
        ];
        if events
            .iter()
            .any(|&(want, have)| opts.test(want) && !caps.test(have))
        {
            return RejectReason::EventUnsupported;
        }

        if opts.test(PinCfgFlags::INTERRUPT_ON_EVENT) && !caps.test(PinCapFlags::INTERRUPT_ON_EVENT)
        {
            return RejectReason::InterruptUnsupported;
        }

        let drive = opts.mask(PinCfgFlags::OUTPUT_PUSH_PULL);
        let needed = if drive == PinCfgFlags::OUTPUT_PUSH_PULL {
            PinCapFlags::OUTPUT_PUSH_PULL
        } else if drive == PinCfgFlags::OUTPUT_DRIVE_LOW {
            PinCapFlags::OUTPUT_DRIVE_LOW
        } else if drive == PinCfgFlags::OUTPUT_DRIVE_HIGH {
            PinCapFlags::OUTPUT_DRIVE_HIGH
        } else {
            PinCapFlags::zero()
        };
        if !caps.test(needed) {
            return RejectReason::OutputStyleUnsupported;
        }

        if self.max_output_current != 0 && cfg.min_output_current > self.max_output_current {
            return RejectReason::CurrentExceedsMax;
        }

        RejectReason::NotRejected
    }
}
