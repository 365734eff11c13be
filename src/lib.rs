//! IMX219 sensor control: a driver core for the Sony IMX219 8MP image sensor.
//!
//! The crate covers everything between the camera framework and the sensor's
//! register bus: the mode catalog and best-fit selection, translation of
//! gain/exposure/blanking controls into register writes, the streaming state
//! machine, identity verification at attach, and the vendor extension
//! commands. Hardware access goes through [`RegisterTransport`] and
//! [`ExternalClock`], so the driver runs unchanged against a real bus or a
//! mock.

pub mod config;
pub mod controls;
pub mod device;
pub mod error;
pub mod identity;
pub mod modes;
pub mod registers;
pub mod traits;
pub mod transport;
pub mod validation;
pub mod vendor;

#[cfg(test)]
pub mod mock;

pub use config::{Facing, ModuleConfig};
pub use controls::{split_gain, vertical_timing, ControlId, ControlRanges, GainCodes};
pub use device::{ControlState, Imx219, StreamState};
pub use error::{Result, SensorError, TransportError};
pub use modes::{select_mode, MediaBusCode, SensorMode, SUPPORTED_MODES};
pub use traits::{
    CameraSensor, ControlApplication, ExternalClock, FormatNegotiation, FormatWhich, MbusFormat,
    RegisterTransport, StreamControl, VendorExtension,
};
pub use transport::I2cTransport;
pub use vendor::{HdrConfig, HdrMode, VendorCommand, VendorResponse};
