//! pinforge-linux-gpio - Linux GPIO character device port
//!
//! This crate exposes the lines of a Linux GPIO chip as pinforge pins,
//! using the gpiocdev crate which talks to the GPIO character device
//! interface (`/dev/gpiochipN`).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pinforge_core::pin::{PinCfgFlags, PinConfiguration, PinGroup};
//! use pinforge_linux_gpio::{LinuxGpioPort, LinuxGpioPortConfig};
//!
//! let port = LinuxGpioPort::open(&LinuxGpioPortConfig::new("/dev/gpiochip0"))?;
//! let group = PinGroup::new(Arc::new(port), [Some(17)])?;
//! let access = group.access()?;
//! access.configure(0, &PinConfiguration::output(PinCfgFlags::OUTPUT_PUSH_PULL))?;
//! access.output(0, true)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with pinforge CLI
//!
//! ```bash
//! # Show the lines of a chip
//! pinforge pins -p linux_gpio:dev=/dev/gpiochip0
//!
//! # Using gpiochip number instead of device path
//! pinforge get -p linux_gpio:gpiochip=0 --pin 4
//! ```
//!
//! # Capabilities
//!
//! Every line can be an input or an output. Outputs can be push-pull,
//! open-drain (drives low only) or open-source (drives high only).
//! Inputs support pull-up, pull-down and no bias, and edge detection.
//! The character device has no level-triggered events and no current
//! limits.
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.5+
//!   for bias and reconfiguration)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod error;
pub mod port;

// Re-exports
pub use error::{LinuxGpioError, Result};
pub use port::{parse_options, LinuxGpioPort, LinuxGpioPortConfig};

use std::path::PathBuf;
use std::sync::Arc;

/// Open a Linux GPIO port and return it as a shared [`Port`]
///
/// This is a convenience function for use in the CLI port dispatch.
///
/// # Example Options
///
/// - `dev=/dev/gpiochip0` - GPIO chip device path (or use gpiochip=N)
/// - `gpiochip=0` - GPIO chip number (alternative to dev)
/// - `offset=0` - Global pin id of line 0
///
/// [`Port`]: pinforge_core::port::Port
pub fn open_linux_gpio_port(
    options: &[(&str, &str)],
) -> std::result::Result<Arc<dyn pinforge_core::port::Port>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    let port = LinuxGpioPort::open(&config)?;
    Ok(Arc::new(port))
}

/// GPIO chip devices present on the system, sorted by path
pub fn list_chips() -> std::io::Result<Vec<PathBuf>> {
    let mut chips: Vec<PathBuf> = std::fs::read_dir("/dev")?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("gpiochip"))
        })
        .collect();
    chips.sort();
    Ok(chips)
}
