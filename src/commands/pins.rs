//! Port overview

use pinforge_core::pin::{PinCapFlags, PinCapability};
use pinforge_core::port::Port;

/// Print capabilities and current configuration of every pin on a port
pub fn cmd_pins(port: &dyn Port) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Port {}: {} pins, ids {}..{}",
        port.name(),
        port.pin_count(),
        port.id_offset(),
        u64::from(port.id_offset()) + u64::from(port.pin_count())
    );
    println!();
    println!("{:>6}  {:<40} {}", "Pin", "Capabilities", "Configuration");
    println!("{}", "-".repeat(96));

    for local in 0..port.pin_count() {
        let cap = port.capability(local);
        let global = port.global_id(local);
        if !cap.exists() {
            println!("{:>6}  (missing)", global);
            continue;
        }
        let cfg = match port.configuration(local) {
            Ok(cfg) => cfg.to_string(),
            Err(e) => format!("unreadable: {}", e),
        };
        println!("{:>6}  {:<40} {}", global, describe_capability(&cap), cfg);
    }
    Ok(())
}

/// Short human-readable list of what a pin can do
fn describe_capability(cap: &PinCapability) -> String {
    const NAMES: [(PinCapFlags, &str); 12] = [
        (PinCapFlags::INPUT, "in"),
        (PinCapFlags::OUTPUT_PUSH_PULL, "pp"),
        (PinCapFlags::OUTPUT_DRIVE_LOW, "od"),
        (PinCapFlags::OUTPUT_DRIVE_HIGH, "os"),
        (PinCapFlags::INPUT_NO_PULL, "nopull"),
        (PinCapFlags::INPUT_PULL_UP, "pu"),
        (PinCapFlags::INPUT_PULL_DOWN, "pd"),
        (PinCapFlags::EVENT_EDGE_FALLING, "fall"),
        (PinCapFlags::EVENT_EDGE_RISING, "rise"),
        (PinCapFlags::EVENT_LEVEL_LOW, "lvl-lo"),
        (PinCapFlags::EVENT_LEVEL_HIGH, "lvl-hi"),
        (PinCapFlags::INTERRUPT_ON_EVENT, "irq"),
    ];

    let mut names: Vec<String> = NAMES
        .iter()
        .filter(|(flag, _)| cap.capabilities.test(*flag))
        .map(|(_, name)| name.to_string())
        .collect();
    if cap.max_output_current != 0 {
        names.push(format!("{}mA", cap.max_output_current));
    }
    names.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_capability() {
        let cap = PinCapability::new(PinCapFlags::INPUT | PinCapFlags::INPUT_PULL_UP, 0);
        assert_eq!(describe_capability(&cap), "in,pu");

        let cap = PinCapability::new(PinCapFlags::OUTPUT_DRIVE_LOW, 8);
        assert_eq!(describe_capability(&cap), "od,8mA");
    }
}
