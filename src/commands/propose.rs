//! Configuration negotiation

use std::sync::Arc;

use pinforge_core::pin::{PinCfgFlags, PinConfiguration, PinGroup, RejectReason};
use pinforge_core::port::Port;

use crate::cli::{ConfigArgs, DirectionArg, DriveArg, EventArg, PullArg};

/// Build the requested configuration from command-line options
///
/// Options left out stay "no change"; `any` sets the domain's immaterial
/// bit.
pub fn config_from_args(args: &ConfigArgs) -> PinConfiguration {
    let mut flags = PinCfgFlags::NO_CHANGE;

    if let Some(direction) = args.direction {
        flags |= match direction {
            DirectionArg::Input => PinCfgFlags::DIR_INPUT,
            DirectionArg::Output => PinCfgFlags::DIR_OUTPUT,
            DirectionArg::Any => PinCfgFlags::DIR_IMMATERIAL,
        };
    }
    if let Some(pull) = args.pull {
        flags |= match pull {
            PullArg::None => PinCfgFlags::INPUT_NO_PULL,
            PullArg::Up => PinCfgFlags::INPUT_PULL_UP,
            PullArg::Down => PinCfgFlags::INPUT_PULL_DOWN,
            PullArg::Any => PinCfgFlags::INPUT_PULL_IMMATERIAL,
        };
    }
    if let Some(event) = args.event {
        flags |= match event {
            EventArg::None => PinCfgFlags::EVENT_NONE,
            EventArg::Falling => PinCfgFlags::EVENT_EDGE_FALLING,
            EventArg::Rising => PinCfgFlags::EVENT_EDGE_RISING,
            EventArg::Both => PinCfgFlags::EVENT_EDGE_CHANGE,
            EventArg::Low => PinCfgFlags::EVENT_LEVEL_LOW,
            EventArg::High => PinCfgFlags::EVENT_LEVEL_HIGH,
            EventArg::Any => PinCfgFlags::EVENT_IMMATERIAL,
        };
    }
    if let Some(interrupt) = args.interrupt {
        flags |= if interrupt {
            PinCfgFlags::INTERRUPT_ON_EVENT
        } else {
            PinCfgFlags::INTERRUPT_NONE
        };
    }
    if let Some(drive) = args.drive {
        flags |= match drive {
            DriveArg::PushPull => PinCfgFlags::OUTPUT_PUSH_PULL,
            DriveArg::OpenDrain => PinCfgFlags::OUTPUT_DRIVE_LOW,
            DriveArg::OpenSource => PinCfgFlags::OUTPUT_DRIVE_HIGH,
            DriveArg::Any => PinCfgFlags::OUTPUT_IMMATERIAL,
        };
    }

    PinConfiguration::new(flags).with_currents(args.min_current, args.max_current)
}

/// Propose one configuration to every pin, optionally applying it
pub fn cmd_propose(
    port: Arc<dyn Port>,
    pins: &[i64],
    request: PinConfiguration,
    apply: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let group = PinGroup::from_raw(port, pins)?;
    log::debug!("Proposing {} to {} positions", request, group.size());

    // gaps get no request so they never reject
    let requests: Vec<PinConfiguration> = (0..group.size())
        .map(|pos| {
            if group.exists(pos) {
                request
            } else {
                PinConfiguration::NO_CHANGE
            }
        })
        .collect();

    let mut proposed = requests.clone();
    let mut verdicts = Vec::with_capacity(group.size());
    let mut record = |pos: usize, reason: RejectReason| verdicts.push((pos, reason));
    let first = group.propose_configs(&mut proposed, None, Some(&mut record))?;

    for ((pos, reason), merged) in verdicts.iter().zip(&proposed) {
        let id = match group.global_id(*pos) {
            Some(id) => id.to_string(),
            None => "gap".to_string(),
        };
        if reason.is_rejected() {
            println!("{:>6}: rejected ({})", id, reason);
        } else {
            println!("{:>6}: ok    {}", id, merged);
        }
    }

    if first.is_rejected() {
        return Err(format!("Configuration rejected: {}", first).into());
    }
    if apply {
        let access = group.access()?;
        access.configure_all(&requests)?;
        println!(
            "Applied to {} pins",
            group.global_ids().iter().flatten().count()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_args() {
        assert!(config_from_args(&ConfigArgs::default()).is_no_change());

        let args = ConfigArgs {
            direction: Some(DirectionArg::Input),
            pull: Some(PullArg::Up),
            drive: Some(DriveArg::Any),
            ..Default::default()
        };
        let cfg = config_from_args(&args);
        assert_eq!(
            cfg.options,
            PinCfgFlags::DIR_INPUT | PinCfgFlags::INPUT_PULL_UP | PinCfgFlags::OUTPUT_IMMATERIAL
        );
        assert!(cfg.check_validity().is_ok());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_propose_and_apply() {
        let dummy = Arc::new(pinforge_dummy::DummyPort::new(
            pinforge_dummy::DummyPortConfig::new(4).with_pin(
                2,
                pinforge_core::pin::PinCapability::new(pinforge_core::pin::PinCapFlags::INPUT, 0),
            ),
        ));
        let output = PinConfiguration::output(PinCfgFlags::OUTPUT_PUSH_PULL);

        // input-only pin in the group: nothing is applied
        assert!(cmd_propose(dummy.clone(), &[0, 2], output, true).is_err());
        assert!(dummy.history().is_empty());

        cmd_propose(dummy.clone(), &[0, -1, 1], output, true).unwrap();
        assert_eq!(dummy.history().len(), 2);
        assert!(dummy.configuration(1).unwrap().is_output());
    }
}
