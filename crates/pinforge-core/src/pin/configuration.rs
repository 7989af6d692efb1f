//! Pin configuration and the configuration merge
//!
//! A [`PinConfiguration`] is a request: what the caller wants the pin to
//! do. Options are grouped into domains (direction, input pull, event,
//! interrupt, output drive). Each domain can be
//!
//! - left at zero, meaning "no change",
//! - given a concrete selector such as [`PinCfgFlags::DIR_OUTPUT`],
//! - marked immaterial, meaning "keep whatever is there, I do not care".
//!
//! [`PinConfiguration::combine`] folds a new request onto an old
//! configuration domain by domain. Two live-state bits report the last
//! observed input level and the last output level set.

use core::fmt;

use crate::error::{Error, Result};
use crate::flags::FlagSet;
use crate::pin::capability::{PinCapability, RejectReason};

/// Marker for configuration flags
pub enum PinCfgTag {}

/// Configuration flag set
pub type PinCfgFlags = FlagSet<PinCfgTag, u32>;

impl PinCfgFlags {
    /// Leave every domain as it is
    pub const NO_CHANGE: Self = Self::from_bits(0);

    // Direction
    /// Operate as an input
    pub const DIR_INPUT: Self = Self::bit(0);
    /// Operate as an output
    pub const DIR_OUTPUT: Self = Self::bit(1);
    /// Caller does not care about direction
    pub const DIR_IMMATERIAL: Self = Self::bit(2);
    /// Concrete direction selectors
    pub const DIR_MASK: Self = Self::DIR_INPUT.union(Self::DIR_OUTPUT);

    // Input pull
    /// Disable pull resistors
    pub const INPUT_NO_PULL: Self = Self::bit(4);
    /// Enable the pull-up resistor
    pub const INPUT_PULL_UP: Self = Self::bit(5);
    /// Enable the pull-down resistor
    pub const INPUT_PULL_DOWN: Self = Self::bit(6);
    /// Caller does not care about pull
    pub const INPUT_PULL_IMMATERIAL: Self = Self::bit(7);
    /// Concrete pull selectors
    pub const INPUT_PULL_MASK: Self = Self::INPUT_NO_PULL
        .union(Self::INPUT_PULL_UP)
        .union(Self::INPUT_PULL_DOWN);

    // Events
    /// Detect nothing
    pub const EVENT_NONE: Self = Self::bit(8);
    /// Detect falling edges
    pub const EVENT_EDGE_FALLING: Self = Self::bit(9);
    /// Detect rising edges
    pub const EVENT_EDGE_RISING: Self = Self::bit(10);
    /// Detect both edges
    pub const EVENT_EDGE_CHANGE: Self = Self::EVENT_EDGE_FALLING.union(Self::EVENT_EDGE_RISING);
    /// Detect a low level
    pub const EVENT_LEVEL_LOW: Self = Self::bit(11);
    /// Detect a high level
    pub const EVENT_LEVEL_HIGH: Self = Self::bit(12);
    /// Caller does not care about events
    pub const EVENT_IMMATERIAL: Self = Self::bit(13);
    /// Concrete event selectors
    pub const EVENT_MASK: Self = Self::EVENT_NONE
        .union(Self::EVENT_EDGE_CHANGE)
        .union(Self::EVENT_LEVEL_LOW)
        .union(Self::EVENT_LEVEL_HIGH);

    // Interrupts
    /// Do not raise interrupts
    pub const INTERRUPT_NONE: Self = Self::bit(16);
    /// Raise an interrupt when the selected event occurs
    pub const INTERRUPT_ON_EVENT: Self = Self::bit(17);
    /// Caller does not care about interrupts
    pub const INTERRUPT_IMMATERIAL: Self = Self::bit(18);
    /// Concrete interrupt selectors
    pub const INTERRUPT_MASK: Self = Self::INTERRUPT_NONE.union(Self::INTERRUPT_ON_EVENT);

    // Output drive
    /// Sink current only (open drain)
    pub const OUTPUT_DRIVE_LOW: Self = Self::bit(20);
    /// Source current only (open source)
    pub const OUTPUT_DRIVE_HIGH: Self = Self::bit(21);
    /// Drive both levels
    pub const OUTPUT_PUSH_PULL: Self = Self::OUTPUT_DRIVE_LOW.union(Self::OUTPUT_DRIVE_HIGH);
    /// Caller does not care about the drive style
    pub const OUTPUT_IMMATERIAL: Self = Self::bit(22);
    /// Concrete drive selectors
    pub const OUTPUT_MASK: Self = Self::OUTPUT_PUSH_PULL;

    // Live state
    /// Last input level observed was high
    pub const INPUT_STATE: Self = Self::bit(28);
    /// Last output level set was high
    pub const OUTPUT_STATE: Self = Self::bit(29);
    /// Both live-state bits
    pub const STATE_MASK: Self = Self::INPUT_STATE.union(Self::OUTPUT_STATE);

    /// Every immaterial bit
    pub const IMMATERIAL_MASK: Self = Self::DIR_IMMATERIAL
        .union(Self::INPUT_PULL_IMMATERIAL)
        .union(Self::EVENT_IMMATERIAL)
        .union(Self::INTERRUPT_IMMATERIAL)
        .union(Self::OUTPUT_IMMATERIAL);
}

/// One configuration domain: its concrete selectors and immaterial bit
#[derive(Debug, Clone, Copy)]
struct Domain {
    concrete: PinCfgFlags,
    immaterial: PinCfgFlags,
}

impl Domain {
    fn all(self) -> PinCfgFlags {
        self.concrete | self.immaterial
    }
}

const DOMAINS: [Domain; 5] = [
    Domain {
        concrete: PinCfgFlags::DIR_MASK,
        immaterial: PinCfgFlags::DIR_IMMATERIAL,
    },
    Domain {
        concrete: PinCfgFlags::INPUT_PULL_MASK,
        immaterial: PinCfgFlags::INPUT_PULL_IMMATERIAL,
    },
    Domain {
        concrete: PinCfgFlags::EVENT_MASK,
        immaterial: PinCfgFlags::EVENT_IMMATERIAL,
    },
    Domain {
        concrete: PinCfgFlags::INTERRUPT_MASK,
        immaterial: PinCfgFlags::INTERRUPT_IMMATERIAL,
    },
    Domain {
        concrete: PinCfgFlags::OUTPUT_MASK,
        immaterial: PinCfgFlags::OUTPUT_IMMATERIAL,
    },
];

/// Requested operating mode of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PinConfiguration {
    /// Option flags
    pub options: PinCfgFlags,
    /// Minimum output current needed in milliamps, zero for no change
    pub min_output_current: u16,
    /// Maximum output current allowed in milliamps, zero for no change
    pub max_output_current: u16,
}

impl PinConfiguration {
    /// Change nothing
    pub const NO_CHANGE: Self = Self::new(PinCfgFlags::NO_CHANGE);

    /// Configuration with the given options and no current limits
    pub const fn new(options: PinCfgFlags) -> Self {
        Self {
            options,
            min_output_current: 0,
            max_output_current: 0,
        }
    }

    /// Every domain immaterial
    pub const fn immaterial() -> Self {
        Self::new(PinCfgFlags::IMMATERIAL_MASK)
    }

    /// Plain input request
    pub const fn input() -> Self {
        Self::new(PinCfgFlags::DIR_INPUT)
    }

    /// Output request with the given drive selector
    pub const fn output(drive: PinCfgFlags) -> Self {
        Self::new(PinCfgFlags::DIR_OUTPUT.union(drive))
    }

    /// Copy with `flags` added
    #[must_use]
    pub fn with(mut self, flags: PinCfgFlags) -> Self {
        self.options.set(flags);
        self
    }

    /// Copy with the given current limits
    #[must_use]
    pub fn with_currents(mut self, min: u16, max: u16) -> Self {
        self.min_output_current = min;
        self.max_output_current = max;
        self
    }

    /// Options of one domain, selected by `mask`
    pub fn domain(&self, mask: PinCfgFlags) -> PinCfgFlags {
        self.options.mask(mask)
    }

    /// True if the pin is (or is requested to be) an input
    pub fn is_input(&self) -> bool {
        self.options.test(PinCfgFlags::DIR_INPUT)
    }

    /// True if the pin is (or is requested to be) an output
    pub fn is_output(&self) -> bool {
        self.options.test(PinCfgFlags::DIR_OUTPUT)
    }

    /// Last observed input level
    pub fn input_state(&self) -> bool {
        self.options.test(PinCfgFlags::INPUT_STATE)
    }

    /// Last output level set
    pub fn output_state(&self) -> bool {
        self.options.test(PinCfgFlags::OUTPUT_STATE)
    }

    /// Record the input level
    pub fn set_input_state(&mut self, high: bool) {
        self.options.set_to(PinCfgFlags::INPUT_STATE, high);
    }

    /// Record the output level
    pub fn set_output_state(&mut self, high: bool) {
        self.options.set_to(PinCfgFlags::OUTPUT_STATE, high);
    }

    /// True if this configuration changes nothing
    pub fn is_no_change(&self) -> bool {
        self.options.without(PinCfgFlags::STATE_MASK).is_zero()
            && self.min_output_current == 0
            && self.max_output_current == 0
    }

    /// Concrete selectors of every domain that is not immaterial
    ///
    /// This is what a pin must actually support for the configuration to
    /// work. Immaterial bits and live state are dropped.
    pub fn concrete_options(&self) -> PinCfgFlags {
        DOMAINS
            .iter()
            .filter(|d| !self.options.any(d.immaterial))
            .fold(PinCfgFlags::zero(), |acc, d| acc | self.options.mask(d.concrete))
    }

    /// Check that the configuration does not contradict itself
    ///
    /// Fails with [`Error::SelfContradictoryConfig`] if a domain has more
    /// than one concrete selector (push-pull and edge change are allowed
    /// pairs), or if both current limits are set and the minimum is above
    /// the maximum. This is a bug in the caller, never a negotiation
    /// outcome.
    pub fn check_validity(&self) -> Result<()> {
        let single = |mask: PinCfgFlags| self.options.mask(mask).bits().count_ones() <= 1;

        let events = self.options.mask(PinCfgFlags::EVENT_MASK);
        let events_ok = events.bits().count_ones() <= 1 || events == PinCfgFlags::EVENT_EDGE_CHANGE;

        let currents_ok = self.min_output_current == 0
            || self.max_output_current == 0
            || self.min_output_current <= self.max_output_current;

        if single(PinCfgFlags::DIR_MASK)
            && single(PinCfgFlags::INPUT_PULL_MASK)
            && single(PinCfgFlags::INTERRUPT_MASK)
            && events_ok
            && currents_ok
        {
            Ok(())
        } else {
            Err(Error::SelfContradictoryConfig)
        }
    }

    /// Fold `new` onto `old`
    ///
    /// For each domain:
    ///
    /// - `new` leaves it at zero: the domain is copied from `old`,
    ///   including an immaterial bit `old` may carry;
    /// - `new` marks it immaterial: `old`'s concrete selectors are kept
    ///   and the immaterial bit is set;
    /// - otherwise `new`'s selectors replace `old`'s.
    ///
    /// Nonzero current limits in `new` replace those of `old`. Live-state
    /// bits always come from `old`. The merge is neither commutative nor
    /// associative; apply requests in the order they were made.
    pub fn combine(old: &Self, new: &Self) -> Self {
        let mut options = old.options.mask(PinCfgFlags::STATE_MASK);
        for d in DOMAINS {
            let requested = new.options.mask(d.all());
            options |= if requested.is_zero() {
                old.options.mask(d.all())
            } else if requested.any(d.immaterial) {
                old.options.mask(d.concrete) | d.immaterial
            } else {
                requested
            };
        }

        let pick = |old: u16, new: u16| if new != 0 { new } else { old };

        Self {
            options,
            min_output_current: pick(old.min_output_current, new.min_output_current),
            max_output_current: pick(old.max_output_current, new.max_output_current),
        }
    }

    /// In-place form of [`PinConfiguration::combine`] with `self` as the
    /// old configuration
    pub fn combine_with(&mut self, new: &Self) -> &mut Self {
        *self = Self::combine(self, new);
        self
    }

    /// Check this configuration against a pin's capabilities
    pub fn compatible(&self, cap: &PinCapability) -> RejectReason {
        cap.compatible(self)
    }
}

impl fmt::Display for PinConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.options;
        let pick = |pairs: &[(PinCfgFlags, &'static str)], immaterial: PinCfgFlags| {
            let name = pairs
                .iter()
                .find(|(flag, _)| o.mask(pairs_mask(pairs)) == *flag)
                .map(|(_, name)| *name)
                .unwrap_or("-");
            match (name, o.any(immaterial)) {
                ("-", true) => "any",
                (name, _) => name,
            }
        };

        let dir = pick(
            &[
                (PinCfgFlags::DIR_INPUT, "input"),
                (PinCfgFlags::DIR_OUTPUT, "output"),
            ],
            PinCfgFlags::DIR_IMMATERIAL,
        );
        let pull = pick(
            &[
                (PinCfgFlags::INPUT_NO_PULL, "none"),
                (PinCfgFlags::INPUT_PULL_UP, "up"),
                (PinCfgFlags::INPUT_PULL_DOWN, "down"),
            ],
            PinCfgFlags::INPUT_PULL_IMMATERIAL,
        );
        let event = pick(
            &[
                (PinCfgFlags::EVENT_NONE, "none"),
                (PinCfgFlags::EVENT_EDGE_FALLING, "falling"),
                (PinCfgFlags::EVENT_EDGE_RISING, "rising"),
                (PinCfgFlags::EVENT_EDGE_CHANGE, "both"),
                (PinCfgFlags::EVENT_LEVEL_LOW, "low"),
                (PinCfgFlags::EVENT_LEVEL_HIGH, "high"),
            ],
            PinCfgFlags::EVENT_IMMATERIAL,
        );
        let irq = pick(
            &[
                (PinCfgFlags::INTERRUPT_NONE, "off"),
                (PinCfgFlags::INTERRUPT_ON_EVENT, "on"),
            ],
            PinCfgFlags::INTERRUPT_IMMATERIAL,
        );
        let drive = pick(
            &[
                (PinCfgFlags::OUTPUT_DRIVE_LOW, "open-drain"),
                (PinCfgFlags::OUTPUT_DRIVE_HIGH, "open-source"),
                (PinCfgFlags::OUTPUT_PUSH_PULL, "push-pull"),
            ],
            PinCfgFlags::OUTPUT_IMMATERIAL,
        );

        write!(
            f,
            "dir={} pull={} event={} irq={} drive={}",
            dir, pull, event, irq, drive
        )?;
        if self.min_output_current != 0 || self.max_output_current != 0 {
            write!(
                f,
                " current={}..{}mA",
                self.min_output_current, self.max_output_current
            )?;
        }
        Ok(())
    }
}

fn pairs_mask(pairs: &[(PinCfgFlags, &'static str)]) -> PinCfgFlags {
    pairs
        .iter()
        .fold(PinCfgFlags::zero(), |acc, (flag, _)| acc | *flag)
}
