//! Error types for sensor operations.

use embedded_hal::i2c::ErrorKind;

use crate::controls::ControlId;
use crate::vendor::HdrMode;

/// Failure on the two-wire register bus.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Writing a register failed on the bus.
    #[error("write to register {addr:#06x} failed: {kind}")]
    Write {
        /// Register address.
        addr: u16,
        /// Bus-level cause.
        kind: ErrorKind,
    },
    /// Reading a register failed on the bus.
    #[error("read of register {addr:#06x} failed: {kind}")]
    Read {
        /// Register address.
        addr: u16,
        /// Bus-level cause.
        kind: ErrorKind,
    },
}

/// Error type for sensor operations.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// Register I/O failed. Never retried by the driver.
    #[error("register transport: {0}")]
    Transport(#[from] TransportError),
    /// Control identifier is not handled by this sensor.
    #[error("unsupported control {0:#010x}")]
    UnsupportedControl(u32),
    /// No catalog entry carries the requested HDR mode.
    #[error("no sensor mode for HDR mode {0:?}")]
    UnsupportedMode(HdrMode),
    /// The model-identity register holds an unexpected value.
    #[error("model id {found:#06x} not supported (expected {expected:#06x})")]
    IdentityMismatch {
        /// Value read from the sensor.
        found: u16,
        /// Value this driver supports.
        expected: u16,
    },
    /// Clock or another attach-time resource is unavailable.
    #[error("resource unavailable: {0}")]
    Resource(String),
    /// Enumeration index, media-bus code or control payload is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Control value outside the control's range.
    #[error("value {value} out of range for {id:?}")]
    ValueOutOfRange {
        /// Control being set.
        id: ControlId,
        /// Rejected value.
        value: i64,
    },
    /// Module configuration is incomplete.
    #[error("module configuration: {0}")]
    Config(String),
    /// A static mode catalog entry is inconsistent.
    #[error("mode {index}: {reason}")]
    Catalog {
        /// Catalog index of the offending mode.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type for sensor operations.
pub type Result<T> = std::result::Result<T, SensorError>;
