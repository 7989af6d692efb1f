//! pinforge-dummy - In-memory pins for testing
//!
//! This crate provides a simulated port whose pins live in memory and a
//! chip-select driver that only records what it was asked to do. They are
//! useful for tests and dry runs without real hardware.
//!
//! # Usage with pinforge CLI
//!
//! ```bash
//! # Eight pins at global ids 0..8
//! pinforge pins -p dummy
//!
//! # Sixteen pins starting at global id 32
//! pinforge propose -p dummy:pins=16,offset=32 --pin 40 --output push-pull
//! ```

mod port;
mod select;

pub use port::{parse_options, DummyEvent, DummyPort, DummyPortConfig, DEFAULT_CAPABILITY};
pub use select::{DummySelect, SelectEvent};

use std::sync::Arc;

use pinforge_core::port::Port;

/// Open a dummy port from CLI options
///
/// # Example Options
///
/// - `pins=8` - Number of pins (default 8)
/// - `offset=0` - Global id of the first pin (default 0)
/// - `name=dummy` - Port name used in logs
/// - `maxcurrent=20` - Output current limit in mA, 0 for none
/// - `inputonly=3` - Make a pin input-only (may be repeated)
/// - `missing=5` - Leave a hole at a local id (may be repeated)
pub fn open_dummy_port(
    options: &[(&str, &str)],
) -> std::result::Result<Arc<dyn Port>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    Ok(Arc::new(DummyPort::new(config)))
}
