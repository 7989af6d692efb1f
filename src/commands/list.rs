//! List commands implementation

use crate::ports;

/// List all supported port backends
pub fn list_ports() {
    println!("Supported ports:");
    println!();

    let available = ports::available_ports();
    if available.is_empty() {
        println!("  (none, recompile with port features enabled)");
        return;
    }

    for p in &available {
        println!("  {:12} - {}", p.name, p.description);
        if !p.aliases.is_empty() {
            println!("  {:12}   aliases: {}", "", p.aliases.join(", "));
        }
    }

    #[cfg(feature = "linux-gpio")]
    match pinforge_linux_gpio::list_chips() {
        Ok(chips) if !chips.is_empty() => {
            println!();
            println!("GPIO chips:");
            for chip in chips {
                println!("  {}", chip.display());
            }
        }
        Ok(_) => {}
        Err(e) => log::debug!("Could not scan for GPIO chips: {}", e),
    }
}
