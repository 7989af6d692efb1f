//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};

const PORT_HELP: &str =
    "Port to use, as name[:key=value,...] (see 'pinforge list-ports')";

#[derive(Parser)]
#[command(name = "pinforge")]
#[command(author, version, about = "Digital pin negotiation and chip select tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Logic level on a line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DirectionArg {
    Input,
    Output,
    /// Leave the direction to whatever is configured
    Any,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PullArg {
    None,
    Up,
    Down,
    Any,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum EventArg {
    None,
    Falling,
    Rising,
    Both,
    Low,
    High,
    Any,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DriveArg {
    PushPull,
    /// Open drain: only drives low
    OpenDrain,
    /// Open source: only drives high
    OpenSource,
    Any,
}

/// Requested pin configuration; options left out are not changed
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Line direction
    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,

    /// Input bias
    #[arg(long, value_enum)]
    pub pull: Option<PullArg>,

    /// Event detection
    #[arg(long, value_enum)]
    pub event: Option<EventArg>,

    /// Raise an interrupt on the detected event
    #[arg(long)]
    pub interrupt: Option<bool>,

    /// Output drive style
    #[arg(long, value_enum)]
    pub drive: Option<DriveArg>,

    /// Minimum output current in mA (0 = unspecified)
    #[arg(long, default_value_t = 0)]
    pub min_current: u16,

    /// Maximum output current in mA (0 = unspecified)
    #[arg(long, default_value_t = 0)]
    pub max_current: u16,
}

/// How the select lines map to chip ids
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SelectMode {
    /// One line selecting chip 0
    Single,
    /// Line N selects chip N
    Set,
    /// Lines carry the chip id in binary, LSB first
    Mux,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show capabilities and configuration of every pin on a port
    Pins {
        #[arg(short, long, help = PORT_HELP)]
        port: String,
    },

    /// Check a configuration against pins without touching hardware
    Propose {
        #[arg(short, long, help = PORT_HELP)]
        port: String,

        /// Global pin ids, comma-separated; -1 leaves a gap
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        pins: Vec<i64>,

        #[command(flatten)]
        config: ConfigArgs,

        /// Apply the configuration when every pin accepts it
        #[arg(long)]
        apply: bool,
    },

    /// Read input levels
    Get {
        #[arg(short, long, help = PORT_HELP)]
        port: String,

        /// Global pin ids, comma-separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        pins: Vec<i64>,
    },

    /// Drive a pin
    Set {
        #[arg(short, long, help = PORT_HELP)]
        port: String,

        /// Global pin id
        #[arg(long)]
        pin: u32,

        /// Level to drive
        #[arg(value_enum)]
        level: Level,
    },

    /// Select a chip through pin-driven chip select lines
    Select {
        #[arg(short, long, help = PORT_HELP)]
        port: String,

        /// Global pin ids of the select lines, comma-separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        pins: Vec<i64>,

        /// Line mapping
        #[arg(long, value_enum, default_value = "set")]
        mode: SelectMode,

        /// Active level of the select lines (single and set modes)
        #[arg(long, value_enum, default_value = "low")]
        active: Level,

        /// Active level of the enable line, which is the last pin (mux mode)
        #[arg(long, value_enum)]
        enable: Option<Level>,

        /// Chip to select
        #[arg(short, long, default_value_t = 0)]
        chip: i32,

        /// How long to keep the chip selected, in milliseconds
        #[arg(long, default_value_t = 0)]
        hold: u64,
    },

    /// List available port backends
    ListPorts,
}
