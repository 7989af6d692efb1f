//! Chip select through port pins

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pinforge_core::pin::PinGroup;
use pinforge_core::port::Port;
use pinforge_core::select::{
    ChipId, ChipSelectDriver, ChipSelectManager, MultiplexerSelect, PinSelect, PinSetSelect,
};

use super::level_name;
use crate::cli::SelectMode;

/// Options of the `select` command
#[derive(Debug, Clone)]
pub struct SelectArgs {
    pub mode: SelectMode,
    /// Active level of single and set lines
    pub active_high: bool,
    /// Active level of the mux enable line, if there is one
    pub enable: Option<bool>,
    pub chip: ChipId,
    pub hold: Duration,
}

fn build_driver(
    group: &PinGroup,
    args: &SelectArgs,
) -> Result<Box<dyn ChipSelectDriver>, Box<dyn std::error::Error>> {
    let access = group.access()?;
    let driver: Box<dyn ChipSelectDriver> = match args.mode {
        SelectMode::Single => Box::new(PinSelect::new(access, args.active_high)?),
        SelectMode::Set => Box::new(PinSetSelect::new(access, args.active_high)?),
        SelectMode::Mux => {
            let mux = MultiplexerSelect::new(access, args.enable)?;
            log::debug!("Multiplexer with {} address lines", mux.address_lines());
            Box::new(mux)
        }
    };
    Ok(driver)
}

/// Select a chip, hold it, then release it
pub fn cmd_select(
    port: Arc<dyn Port>,
    pins: &[i64],
    args: &SelectArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let group = PinGroup::from_raw(port, pins)?;
    let manager = ChipSelectManager::from_boxed(build_driver(&group, args)?);

    let token = manager.select(args.chip)?;
    log::info!("Chip {} selected", args.chip);
    for (pos, cfg) in group.configurations()?.iter().enumerate() {
        if let Some(id) = group.global_id(pos) {
            println!("{:>6}: {}", id, level_name(cfg.output_state()));
        }
    }

    if !args.hold.is_zero() {
        thread::sleep(args.hold);
    }

    drop(token);
    manager.shutdown();
    log::info!("Chip {} released", args.chip);
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use pinforge_dummy::DummyPort;

    fn args(mode: SelectMode, chip: ChipId) -> SelectArgs {
        SelectArgs {
            mode,
            active_high: false,
            enable: Some(false),
            chip,
            hold: Duration::ZERO,
        }
    }

    #[test]
    fn test_select_set_returns_idle() {
        let port = Arc::new(DummyPort::with_pins(4));
        cmd_select(port.clone(), &[0, 1, 2], &args(SelectMode::Set, 1)).unwrap();

        for local in 0..3 {
            assert!(port.output_level(local).unwrap());
        }
        // pins released with the manager
        assert!(!port.claims().is_claimed(0));
    }

    #[test]
    fn test_select_invalid_chip() {
        let port = Arc::new(DummyPort::with_pins(4));
        assert!(cmd_select(port.clone(), &[0], &args(SelectMode::Single, 1)).is_err());
        // mux with two address lines and an enable line
        assert!(cmd_select(port.clone(), &[0, 1, 2], &args(SelectMode::Mux, 3)).is_ok());
        assert!(cmd_select(port, &[0, 1, 2], &args(SelectMode::Mux, 4)).is_err());
    }
}
