//! CLI command implementations
//!
//! Every command opens its port from the `-p` string, builds a `PinGroup`
//! over the requested pins and works through the group. Commands that
//! touch hardware claim the pins first; `pins` and `propose` only read.

mod io;
mod list;
mod pins;
mod propose;
mod select;

pub use io::{cmd_get, cmd_set};
pub use list::list_ports;
pub use pins::cmd_pins;
pub use propose::{cmd_propose, config_from_args};
pub use select::{cmd_select, SelectArgs};

/// Render a level the way every command prints it
fn level_name(high: bool) -> &'static str {
    if high {
        "high"
    } else {
        "low"
    }
}
