//! Core traits and types shared between the sensor driver and its host.

use v4l::control::Control;
use v4l::FourCC;

use crate::controls::{ControlDesc, ControlRanges};
use crate::error::{Result, TransportError};
use crate::modes::{Interval, MediaBusCode, SensorMode};
use crate::registers::RegWidth;
use crate::vendor::{HdrMode, VendorCommand, VendorResponse};

/// Register access over the sensor's two-wire bus.
pub trait RegisterTransport {
    /// Write the low `width` bytes of `value` to `addr`.
    fn write(&mut self, addr: u16, width: RegWidth, value: u32)
        -> std::result::Result<(), TransportError>;

    /// Read `width` bytes from `addr`.
    fn read(&mut self, addr: u16, width: RegWidth) -> std::result::Result<u32, TransportError>;
}

/// The sensor's external master clock.
pub trait ExternalClock {
    /// Prepare and enable the clock.
    ///
    /// Implementations report an unavailable clock as [`SensorError::Resource`].
    ///
    /// [`SensorError::Resource`]: crate::error::SensorError::Resource
    fn enable(&mut self) -> Result<()>;

    /// Disable and unprepare the clock.
    fn disable(&mut self);
}

/// Receives control ranges whenever the active mode changes.
pub trait ControlRangeSink: Send {
    /// Replace the published hblank, vblank and pixel-rate ranges.
    fn publish(&mut self, ranges: &ControlRanges);
}

/// Which format a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatWhich {
    /// Negotiate without touching the device.
    Try,
    /// The format the device streams with.
    #[default]
    Active,
}

/// Media-bus format on the sensor's source pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbusFormat {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Bus pixel code.
    pub code: MediaBusCode,
}

impl MbusFormat {
    /// Create a format from its parts.
    #[must_use]
    pub const fn new(width: u32, height: u32, code: MediaBusCode) -> Self {
        Self {
            width,
            height,
            code,
        }
    }

    /// Format produced by `mode`.
    #[must_use]
    pub const fn from_mode(mode: &SensorMode) -> Self {
        Self::new(mode.width, mode.height, mode.bus_code)
    }

    /// Memory pixel format for this bus code, if one is known.
    #[must_use]
    pub fn fourcc(&self) -> Option<FourCC> {
        self.code.fourcc()
    }
}

/// One discrete frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    /// Enumeration index.
    pub index: u32,
    /// Bus pixel code.
    pub code: MediaBusCode,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// One discrete frame interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIntervalDesc {
    /// Enumeration index.
    pub index: u32,
    /// Bus pixel code.
    pub code: MediaBusCode,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Fastest interval at this size.
    pub interval: Interval,
    /// HDR mode of the entry.
    pub hdr_mode: HdrMode,
}

/// MIPI CSI-2 bus parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Number of data lanes.
    pub lanes: u8,
    /// Virtual channel carrying image data.
    pub channel: u8,
    /// Whether the clock lane runs continuously.
    pub continuous_clock: bool,
}

/// Format and frame-size negotiation.
pub trait FormatNegotiation {
    /// Bus code at `index`. Only index 0 exists.
    fn enum_mbus_code(&self, index: u32) -> Result<MediaBusCode>;

    /// Frame size of catalog entry `index`.
    fn enum_frame_size(&self, index: u32, code: MediaBusCode) -> Result<FrameSize>;

    /// Frame interval of catalog entry `index`.
    fn enum_frame_interval(&self, index: u32, code: MediaBusCode) -> Result<FrameIntervalDesc>;

    /// Current format.
    fn format(&self) -> MbusFormat;

    /// Select the supported mode closest to `request`. Returns the format chosen.
    fn set_format(&self, which: FormatWhich, request: &MbusFormat) -> MbusFormat;

    /// Frame interval of the active mode.
    fn frame_interval(&self) -> Interval;
}

/// Control application.
pub trait ControlApplication {
    /// Apply a control request from the framework.
    fn set_control(&self, control: &Control) -> Result<()>;

    /// Describe every control with its current range.
    fn controls(&self) -> Vec<ControlDesc>;
}

/// Power and streaming.
pub trait StreamControl {
    /// Enable or disable the external clock.
    fn set_power(&self, on: bool) -> Result<()>;

    /// Start or stop streaming.
    fn set_stream(&self, enable: bool) -> Result<()>;
}

/// Vendor extension commands.
pub trait VendorExtension {
    /// Dispatch a vendor command.
    fn vendor_command(&self, command: VendorCommand) -> Result<VendorResponse>;
}

/// Everything the camera framework needs from a sensor.
pub trait CameraSensor: FormatNegotiation + ControlApplication + StreamControl + VendorExtension {}

impl<S> CameraSensor for S where
    S: FormatNegotiation + ControlApplication + StreamControl + VendorExtension
{
}
