//! pinforge - digital pin negotiation and chip select tool
//!
//! Opens a port backend (an in-memory dummy or a Linux GPIO chip), then
//! inspects pins, negotiates configurations against their capabilities,
//! reads and drives levels, or selects chips through pin-driven select
//! lines.
//!
//! # Architecture
//!
//! All hardware access goes through `pinforge_core`:
//! - A **port** owns a range of pins and reports what each one can do
//! - A **pin group** negotiates configurations over several pins and hands
//!   out exclusive **pin access**
//! - A **chip select manager** serializes chip selection behind access
//!   tokens, with pin-driven select lines as its driver

mod cli;
mod commands;
mod ports;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let result = match cli.command {
        Commands::Pins { port } => {
            let port = ports::open_port(&port)?;
            commands::cmd_pins(port.as_ref())
        }
        Commands::Propose {
            port,
            pins,
            config,
            apply,
        } => {
            let port = ports::open_port(&port)?;
            let request = commands::config_from_args(&config);
            commands::cmd_propose(port, &pins, request, apply)
        }
        Commands::Get { port, pins } => {
            let port = ports::open_port(&port)?;
            commands::cmd_get(port, &pins)
        }
        Commands::Set { port, pin, level } => {
            let port = ports::open_port(&port)?;
            commands::cmd_set(port, pin, level.is_high())
        }
        Commands::Select {
            port,
            pins,
            mode,
            active,
            enable,
            chip,
            hold,
        } => {
            let port = ports::open_port(&port)?;
            let args = commands::SelectArgs {
                mode,
                active_high: active.is_high(),
                enable: enable.map(|level| level.is_high()),
                chip,
                hold: Duration::from_millis(hold),
            };
            commands::cmd_select(port, &pins, &args)
        }
        Commands::ListPorts => {
            commands::list_ports();
            Ok(())
        }
    };

    result
}
