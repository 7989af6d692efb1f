use proptest::prelude::*;

use pinforge_core::pin::{PinCapFlags, PinCapability, PinCfgFlags, PinConfiguration, RejectReason};

/// (concrete selectors, immaterial bit) of every configuration domain
const DOMAINS: [(PinCfgFlags, PinCfgFlags); 5] = [
    (PinCfgFlags::DIR_MASK, PinCfgFlags::DIR_IMMATERIAL),
    (PinCfgFlags::INPUT_PULL_MASK, PinCfgFlags::INPUT_PULL_IMMATERIAL),
    (PinCfgFlags::EVENT_MASK, PinCfgFlags::EVENT_IMMATERIAL),
    (PinCfgFlags::INTERRUPT_MASK, PinCfgFlags::INTERRUPT_IMMATERIAL),
    (PinCfgFlags::OUTPUT_MASK, PinCfgFlags::OUTPUT_IMMATERIAL),
];

fn domain_bits() -> PinCfgFlags {
    DOMAINS
        .iter()
        .fold(PinCfgFlags::zero(), |acc, &(c, i)| acc | c | i)
}

/// Current limit, zero ("no preference") about half the time
fn current() -> impl Strategy<Value = u16> {
    prop_oneof![Just(0u16), 1u16..40]
}

fn config() -> impl Strategy<Value = PinConfiguration> {
    (any::<u32>(), current(), current()).prop_map(|(bits, min, max)| PinConfiguration {
        options: PinCfgFlags::from_bits(bits).mask(domain_bits() | PinCfgFlags::STATE_MASK),
        min_output_current: min,
        max_output_current: max,
    })
}

fn capability() -> impl Strategy<Value = PinCapability> {
    let known = PinCapFlags::REAL_MASK | PinCapFlags::EVENT_MASK;
    (any::<u32>(), 0u16..40)
        .prop_map(move |(bits, max)| PinCapability::new(PinCapFlags::from_bits(bits).mask(known), max))
}

/// Every concrete request of `cfg` has a matching capability
fn supported(cap: &PinCapability, cfg: &PinConfiguration) -> bool {
    let opts = cfg.concrete_options();
    let caps = cap.capabilities;

    let pairs = [
        (PinCfgFlags::DIR_INPUT, PinCapFlags::INPUT),
        (PinCfgFlags::INPUT_NO_PULL, PinCapFlags::INPUT_NO_PULL),
        (PinCfgFlags::INPUT_PULL_UP, PinCapFlags::INPUT_PULL_UP),
        (PinCfgFlags::INPUT_PULL_DOWN, PinCapFlags::INPUT_PULL_DOWN),
        (PinCfgFlags::EVENT_EDGE_FALLING, PinCapFlags::EVENT_EDGE_FALLING),
        (PinCfgFlags::EVENT_EDGE_RISING, PinCapFlags::EVENT_EDGE_RISING),
        (PinCfgFlags::EVENT_LEVEL_LOW, PinCapFlags::EVENT_LEVEL_LOW),
        (PinCfgFlags::EVENT_LEVEL_HIGH, PinCapFlags::EVENT_LEVEL_HIGH),
        (PinCfgFlags::INTERRUPT_ON_EVENT, PinCapFlags::INTERRUPT_ON_EVENT),
    ];
    if pairs
        .iter()
        .any(|&(want, have)| opts.test(want) && !caps.test(have))
    {
        return false;
    }
    if opts.test(PinCfgFlags::DIR_OUTPUT) && !caps.any(PinCapFlags::OUTPUT_MASK) {
        return false;
    }

    let drive = opts.mask(PinCfgFlags::OUTPUT_MASK);
    let drive_ok = if drive == PinCfgFlags::OUTPUT_PUSH_PULL {
        caps.test(PinCapFlags::OUTPUT_PUSH_PULL)
    } else if drive == PinCfgFlags::OUTPUT_DRIVE_LOW {
        caps.test(PinCapFlags::OUTPUT_DRIVE_LOW)
    } else if drive == PinCfgFlags::OUTPUT_DRIVE_HIGH {
        caps.test(PinCapFlags::OUTPUT_DRIVE_HIGH)
    } else {
        true
    };

    drive_ok
        && (cap.max_output_current == 0 || cfg.min_output_current <= cap.max_output_current)
}

proptest! {
    #[test]
    fn flag_set_laws(a in any::<u32>(), b in any::<u32>()) {
        let a = PinCapFlags::from_bits(a);
        let b = PinCapFlags::from_bits(b);
        prop_assert_eq!((a | b) & a, a);
        prop_assert_eq!(a & !a, PinCapFlags::zero());
        prop_assert!((a ^ a).is_zero());
        prop_assert_eq!(bool::from(a), !a.is_zero());
    }

    #[test]
    fn single_bits_are_distinct(n in 0u32..32, m in 0u32..32) {
        prop_assume!(n != m);
        prop_assert_ne!(PinCfgFlags::bit(n), PinCfgFlags::bit(m));
    }

    #[test]
    fn combine_tracks_last_setter(
        base in config(),
        updates in proptest::collection::vec(config(), 0..8),
    ) {
        let mut folded = base;
        for update in &updates {
            folded.combine_with(update);
        }

        for (concrete, immaterial) in DOMAINS {
            let all = concrete | immaterial;
            let touching: Vec<&PinConfiguration> = updates
                .iter()
                .filter(|c| !c.options.mask(all).is_zero())
                .collect();

            let expected_concrete = touching
                .iter()
                .rev()
                .find(|c| !c.options.any(immaterial))
                .map_or(base.options.mask(concrete), |c| c.options.mask(concrete));
            let expected_immaterial = touching
                .last()
                .map_or(base.options.any(immaterial), |c| c.options.any(immaterial));

            prop_assert_eq!(folded.options.mask(concrete), expected_concrete);
            prop_assert_eq!(folded.options.any(immaterial), expected_immaterial);
        }

        // the last nonzero limit wins, zero keeps what was there
        let last_nonzero = |base: u16, of: fn(&PinConfiguration) -> u16| {
            updates.iter().map(of).filter(|&v| v != 0).last().unwrap_or(base)
        };
        prop_assert_eq!(
            folded.min_output_current,
            last_nonzero(base.min_output_current, |c| c.min_output_current)
        );
        prop_assert_eq!(
            folded.max_output_current,
            last_nonzero(base.max_output_current, |c| c.max_output_current)
        );

        // live state is never taken from a request
        prop_assert_eq!(
            folded.options.mask(PinCfgFlags::STATE_MASK),
            base.options.mask(PinCfgFlags::STATE_MASK)
        );
    }

    #[test]
    fn compatible_iff_supported(cap in capability(), cfg in config()) {
        let verdict = cap.compatible(&cfg);
        prop_assert_eq!(verdict == RejectReason::NotRejected, supported(&cap, &cfg));
        prop_assert_eq!(cfg.compatible(&cap), verdict);
    }
}

#[test]
fn immaterial_keeps_output_request() {
    let out = PinConfiguration::output(PinCfgFlags::OUTPUT_PUSH_PULL);
    let merged = PinConfiguration::combine(&out, &PinConfiguration::immaterial());
    assert_eq!(merged.options, out.options | PinCfgFlags::IMMATERIAL_MASK);
    assert_eq!(merged.min_output_current, out.min_output_current);
    assert_eq!(merged.max_output_current, out.max_output_current);
}

#[test]
fn input_only_cannot_output() {
    let cap = PinCapability::new(PinCapFlags::INPUT, 0);
    let cfg = PinConfiguration::new(PinCfgFlags::DIR_OUTPUT);
    assert_eq!(cap.compatible(&cfg), RejectReason::DirectionUnsupported);
}
