//! Error types for Linux GPIO port operations

use gpiocdev::line::Offset;
use thiserror::Error;

/// Linux GPIO port specific errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to open GPIO chip
    #[error("Failed to open GPIO chip '{path}': {source}")]
    ChipOpenFailed {
        path: String,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to read chip information
    #[error("Failed to read GPIO chip info: {0}")]
    ChipInfoFailed(#[source] gpiocdev::Error),

    /// Failed to read line information
    #[error("Failed to read info for GPIO line {line}: {source}")]
    LineInfoFailed {
        line: Offset,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to request GPIO lines
    #[error("Failed to request GPIO line: {0}")]
    LineRequestFailed(#[source] gpiocdev::Error),

    /// Failed to set GPIO line value
    #[error("Failed to set GPIO line value: {0}")]
    SetValueFailed(#[source] gpiocdev::Error),

    /// Failed to get GPIO line value
    #[error("Failed to get GPIO line value: {0}")]
    GetValueFailed(#[source] gpiocdev::Error),

    /// Failed to reconfigure GPIO lines
    #[error("Failed to reconfigure GPIO line: {0}")]
    ReconfigureFailed(#[source] gpiocdev::Error),

    /// Lines would get global ids past the end of the id space
    #[error("{lines} lines at offset {offset} do not fit in a pin id")]
    IdRangeOverflow { offset: u32, lines: u32 },

    /// GPIO chip or device not specified
    #[error("No GPIO chip specified. Use dev=/dev/gpiochipN or gpiochip=N")]
    NoDevice,
}

impl From<LinuxGpioError> for pinforge_core::Error {
    fn from(err: LinuxGpioError) -> Self {
        pinforge_core::Error::backend(err)
    }
}

/// Result type for Linux GPIO port operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;
