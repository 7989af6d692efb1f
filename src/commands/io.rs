//! Reading and driving pins

use std::sync::Arc;

use pinforge_core::pin::{PinGroup, RejectReason};
use pinforge_core::port::Port;
use pinforge_core::Error;

use super::level_name;

/// Read the level of each pin, leaving its configuration alone
pub fn cmd_get(port: Arc<dyn Port>, pins: &[i64]) -> Result<(), Box<dyn std::error::Error>> {
    let group = PinGroup::from_raw(port, pins)?;
    let access = group.access()?;

    for (pos, level) in access.inputs()?.into_iter().enumerate() {
        if let (Some(id), Some(level)) = (group.global_id(pos), level) {
            println!("{:>6}: {}", id, level_name(level));
        }
    }
    Ok(())
}

/// Drive one pin, switching it to an output first if needed
pub fn cmd_set(port: Arc<dyn Port>, pin: u32, high: bool) -> Result<(), Box<dyn std::error::Error>> {
    let group = PinGroup::new(port, [Some(pin)])?;
    let access = group.access()?;

    if !group.configuration(0)?.is_output() {
        let cfg = group
            .capability(0)?
            .default_output_config()
            .ok_or(Error::IncompatibleConfiguration(
                RejectReason::DirectionUnsupported,
            ))?;
        let applied = access.configure(0, &cfg)?;
        log::debug!("Pin {} configured as {}", pin, applied);
    }

    access.output(0, high)?;
    println!("{:>6}: {}", pin, level_name(high));
    Ok(())
}
