//! Error types for pinforge-core
//!
//! Three kinds of failure pass through this type:
//!
//! - caller bugs, such as a self-contradictory [`PinConfiguration`],
//! - negotiation failures raised when an incompatible configuration is
//!   actually applied (a proposal reports the same thing as a plain
//!   [`RejectReason`] value instead),
//! - resource protocol violations from the chip-select manager and pin
//!   claims.
//!
//! Nothing in this crate retries on any of them.
//!
//! [`PinConfiguration`]: crate::pin::PinConfiguration

use crate::pin::{PinId, RejectReason};
use crate::select::ChipId;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    /// Two mutually exclusive options of one domain were requested, or the
    /// minimum output current exceeds the maximum
    #[error("self-contradictory pin configuration")]
    SelfContradictoryConfig,
    /// The pin cannot operate as requested
    #[error("incompatible pin configuration: {0}")]
    IncompatibleConfiguration(RejectReason),

    // Pin errors
    /// Negative pin id other than the gap marker
    #[error("invalid pin id {0}")]
    InvalidPinId(i64),
    /// Pin does not exist on the port
    #[error("pin {0} does not exist")]
    NonexistentPin(PinId),
    /// Pin appears twice in one group
    #[error("pin {0} appears more than once in the group")]
    DuplicatePin(PinId),
    /// Pin is claimed by another access object
    #[error("pin {0} is already in use")]
    PinInUse(PinId),
    /// Position is past the end of the group
    #[error("position {0} is outside the pin group")]
    PositionOutOfRange(usize),
    /// Position is a gap in the group
    #[error("no pin at position {0}")]
    EmptyPosition(usize),
    /// A per-pin slice does not match the group size
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Group size
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    // Chip-select errors
    /// The chip id is not handled by the select driver
    #[error("invalid chip id {0}")]
    InvalidChipId(ChipId),
    /// The access token already belongs to a manager
    #[error("access token is already bound to a manager")]
    AccessTokenAlreadyBound,
    /// The access token was released or never bound
    #[error("access token is not bound to a manager")]
    AccessTokenNotBound,
    /// The manager is shutting down or has shut down
    #[error("chip select manager has been terminated")]
    ManagerTerminated,

    /// Failure reported by a port or select backend
    #[error(transparent)]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a backend-specific error
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
