//! IMX219 driver instance implementing the camera framework traits.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, error, info, warn};
use v4l::control::{Control, Value};

use crate::config::ModuleConfig;
use crate::controls::{
    default_frame_length, describe_controls, split_gain, vertical_timing, ControlDesc,
    ControlId, ControlRanges, GainCodes, TestPattern, EXPOSURE_MAX, TEST_COLOUR_MAX,
};
use crate::error::{Result, SensorError};
use crate::identity::SensorIdentity;
use crate::modes::{
    default_mode, find_by_hdr_mode, select_mode, Interval, MediaBusCode, SensorMode,
    SUPPORTED_MODES,
};
use crate::registers::{
    table_entries, RegWidth, RegisterWrite, ANA_GAIN_GLOBAL_A, DIG_GAIN_GLOBAL_A, EXPOSURE,
    FRM_LENGTH_A, IMG_ORIENTATION, MODE_SELECT, MODE_SELECT_MASK, MODE_STREAMING, START, STOP,
    TD_B, TD_GB, TD_GR, TD_R, TEST_PATTERN, TP_WINDOW_HEIGHT, TP_WINDOW_WIDTH,
};
use crate::traits::{
    BusConfig, ControlApplication, ControlRangeSink, ExternalClock, FormatNegotiation,
    FormatWhich, FrameIntervalDesc, FrameSize, MbusFormat, RegisterTransport, StreamControl,
    VendorExtension,
};
use crate::validation::validate_catalog;
use crate::vendor::{HdrConfig, ModuleInfo, VendorCommand, VendorResponse};

/// Driver version as `(major, minor, patch)`.
pub const DRIVER_VERSION: (u8, u8, u8) = (0x00, 0x01, 0x02);

const CSI2_LANES: u8 = 2;

/// Stream state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Sensor in software standby.
    #[default]
    Stopped,
    /// Start sequence completed.
    Streaming,
    /// The last start or stop sequence failed part-way.
    Faulted,
}

/// Per-instance sensor state, guarded by the instance lock.
#[derive(Debug, Clone, Copy)]
pub struct ControlState {
    /// Active catalog entry.
    pub mode: &'static SensorMode,
    /// Horizontal mirror, applied at stream start.
    pub hflip: bool,
    /// Vertical flip, applied at stream start.
    pub vflip: bool,
    /// Last gain codes written, rewritten at every start.
    pub gain: Option<GainCodes>,
    /// Last exposure written in lines, rewritten at every start.
    pub exposure: Option<u32>,
    /// Selected test pattern.
    pub test_pattern: TestPattern,
    /// Frame length currently programmed.
    pub cur_vts: u32,
    /// Frame length set through vertical blanking since the last start.
    pub requested_vts: Option<u32>,
    /// Ranges published for the active mode.
    pub ranges: ControlRanges,
    /// Stream state.
    pub stream: StreamState,
}

impl ControlState {
    fn new(mode: &'static SensorMode) -> Self {
        Self {
            mode,
            hflip: false,
            vflip: false,
            gain: None,
            exposure: None,
            test_pattern: TestPattern::Disabled,
            cur_vts: default_frame_length(mode),
            requested_vts: None,
            ranges: ControlRanges::for_mode(mode),
            stream: StreamState::Stopped,
        }
    }

    /// Image orientation register value: bit 0 mirror, bit 1 flip.
    fn orientation(&self) -> u32 {
        u32::from(self.hflip) | (u32::from(self.vflip) << 1)
    }
}

/// Why the start sequence is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Stream start; frame length bookkeeping resets to the mode default.
    Start,
    /// Control latch while streaming; the requested frame length survives.
    Relatch,
}

struct Inner<T, C> {
    transport: T,
    clock: C,
    clock_enabled: bool,
    state: ControlState,
    sink: Option<Box<dyn ControlRangeSink>>,
}

impl<T: RegisterTransport, C: ExternalClock> Inner<T, C> {
    fn power_on(&mut self) -> Result<()> {
        if !self.clock_enabled {
            self.clock.enable()?;
            self.clock_enabled = true;
            debug!("imx219 power on");
        }
        Ok(())
    }

    fn power_off(&mut self) {
        if self.clock_enabled {
            self.clock.disable();
            self.clock_enabled = false;
            debug!("imx219 power off");
        }
    }

    fn probe(&mut self) -> Result<SensorIdentity> {
        self.power_on()?;
        let identity = SensorIdentity::read(&mut self.transport)
            .and_then(|identity| identity.verify().map(|()| identity));
        self.power_off();
        identity
    }

    fn write(&mut self, addr: u16, width: RegWidth, value: u32) -> Result<()> {
        Ok(self.transport.write(addr, width, value)?)
    }

    fn write_table(&mut self, table: &[RegisterWrite]) -> Result<()> {
        for reg in table_entries(table) {
            self.write(reg.addr, reg.width, reg.value)?;
        }
        Ok(())
    }

    fn start_sequence(&mut self, replay: Replay) -> Result<()> {
        let mode = self.state.mode;
        self.write_table(mode.reg_list)?;

        let orientation = self.state.orientation();
        self.write(IMG_ORIENTATION, RegWidth::U8, orientation)?;

        let pattern = self.state.test_pattern;
        self.write(TEST_PATTERN, RegWidth::U16, pattern.register_value())?;
        if pattern != TestPattern::Disabled {
            self.write(TP_WINDOW_WIDTH, RegWidth::U16, mode.width)?;
            self.write(TP_WINDOW_HEIGHT, RegWidth::U16, mode.height)?;
        }

        self.restore_controls(replay)?;
        self.write_table(&START)
    }

    /// Rewrite the exposure, gain and frame length the mode program overwrote.
    fn restore_controls(&mut self, replay: Replay) -> Result<()> {
        if let Some(lines) = self.state.exposure {
            self.write(EXPOSURE, RegWidth::U16, lines)?;
        }
        if let Some(codes) = self.state.gain {
            self.write_gain(codes)?;
        }

        self.state.cur_vts = default_frame_length(self.state.mode);
        match (replay, self.state.requested_vts) {
            (Replay::Relatch, Some(frame_length)) => {
                self.write(FRM_LENGTH_A, RegWidth::U16, frame_length)?;
                self.state.cur_vts = frame_length;
            }
            (Replay::Relatch, None) => {}
            (Replay::Start, _) => self.state.requested_vts = None,
        }
        Ok(())
    }

    fn write_gain(&mut self, codes: GainCodes) -> Result<()> {
        self.write(ANA_GAIN_GLOBAL_A, RegWidth::U8, u32::from(codes.analogue))?;
        self.write(DIG_GAIN_GLOBAL_A, RegWidth::U16, u32::from(codes.digital))
    }

    fn settle(&mut self, result: Result<()>, reached: StreamState) -> Result<()> {
        self.state.stream = if result.is_ok() {
            reached
        } else {
            StreamState::Faulted
        };
        if let Err(err) = &result {
            error!("stream transition to {reached:?} failed: {err}");
        } else {
            debug!("stream {reached:?}");
        }
        result
    }

    fn start_stream(&mut self, replay: Replay) -> Result<()> {
        let result = self.start_sequence(replay);
        self.settle(result, StreamState::Streaming)
    }

    fn stop_stream(&mut self) -> Result<()> {
        let result = self.write_table(&STOP);
        self.settle(result, StreamState::Stopped)
    }

    fn quick_stream(&mut self, on: bool) -> Result<()> {
        if on {
            let result = self.write_table(&START);
            self.settle(result, StreamState::Streaming)
        } else {
            self.stop_stream()
        }
    }

    fn switch_mode(&mut self, mode: &'static SensorMode) {
        self.state.mode = mode;
        self.state.requested_vts = None;
        self.state.ranges = ControlRanges::for_mode(mode);
        if let Some(sink) = self.sink.as_mut() {
            sink.publish(&self.state.ranges);
        }
        debug!(
            "mode {}x{}, pixel rate {}",
            mode.width,
            mode.height,
            mode.pixel_rate()
        );
    }

    fn apply_control(&mut self, id: ControlId, value: i64) -> Result<()> {
        if id.is_read_only() {
            warn!("control {} is read-only", id.name());
            return Err(SensorError::UnsupportedControl(id.raw()));
        }
        match id {
            ControlId::HFlip => self.state.hflip = flag(id, value)?,
            ControlId::VFlip => self.state.vflip = flag(id, value)?,
            ControlId::AnalogueGain | ControlId::Gain => {
                let codes = split_gain(value);
                self.write_gain(codes)?;
                self.state.gain = Some(codes);
            }
            ControlId::Exposure => {
                let lines = bounded(id, value, EXPOSURE_MAX)?;
                self.write(EXPOSURE, RegWidth::U16, lines)?;
                self.state.exposure = Some(lines);
            }
            ControlId::VBlank => {
                let timing = vertical_timing(self.state.mode, value);
                if timing.frame_length != self.state.cur_vts {
                    self.write(FRM_LENGTH_A, RegWidth::U16, timing.frame_length)?;
                    self.state.cur_vts = timing.frame_length;
                }
                self.state.requested_vts = Some(timing.frame_length);
            }
            ControlId::TestPattern => {
                let pattern = TestPattern::from_menu_index(value)
                    .ok_or(SensorError::ValueOutOfRange { id, value })?;
                self.write(TEST_PATTERN, RegWidth::U16, pattern.register_value())?;
                self.state.test_pattern = pattern;
            }
            _ => {
                let addr = pattern_colour_register(id)
                    .ok_or(SensorError::UnsupportedControl(id.raw()))?;
                self.write(addr, RegWidth::U16, colour(id, value)?)?;
            }
        }
        self.relatch()
    }

    /// Replay the start sequence if the sensor is streaming, so changes latch.
    fn relatch(&mut self) -> Result<()> {
        let mode_select = self
            .transport
            .read(MODE_SELECT, RegWidth::U8)
            .inspect_err(|_| error!("failed to read mode select"))?;
        if mode_select & MODE_SELECT_MASK == u32::from(MODE_STREAMING) {
            self.start_stream(Replay::Relatch)?;
        }
        Ok(())
    }
}

const fn pattern_colour_register(id: ControlId) -> Option<u16> {
    match id {
        ControlId::TestPatternRed => Some(TD_R),
        ControlId::TestPatternGreenR => Some(TD_GR),
        ControlId::TestPatternBlue => Some(TD_B),
        ControlId::TestPatternGreenB => Some(TD_GB),
        _ => None,
    }
}

fn flag(id: ControlId, value: i64) -> Result<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(SensorError::ValueOutOfRange { id, value }),
    }
}

fn bounded(id: ControlId, value: i64, max: i64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| i64::from(*v) <= max)
        .ok_or(SensorError::ValueOutOfRange { id, value })
}

fn colour(id: ControlId, value: i64) -> Result<u32> {
    bounded(id, value, TEST_COLOUR_MAX)
}

fn control_value(control: &Control) -> Result<i64> {
    match &control.value {
        Value::Integer(value) => Ok(*value),
        Value::Boolean(value) => Ok(i64::from(*value)),
        other => Err(SensorError::InvalidArgument(format!(
            "control {:#010x} carries unsupported payload {other:?}",
            control.id
        ))),
    }
}

/// One attached IMX219.
///
/// All operations take the instance lock for their full register sequence, so
/// the sensor can be shared across threads.
pub struct Imx219<T, C> {
    inner: Mutex<Inner<T, C>>,
    config: ModuleConfig,
    identity: SensorIdentity,
}

impl<T: RegisterTransport, C: ExternalClock> Imx219<T, C> {
    /// Probe the sensor and create an instance in the default mode.
    ///
    /// The clock is enabled only for the identity read. Nothing is created if
    /// the configuration is incomplete, the clock is unavailable, a read fails
    /// or the model id is not an IMX219.
    pub fn attach(transport: T, clock: C, config: ModuleConfig) -> Result<Self> {
        let (major, minor, patch) = DRIVER_VERSION;
        info!("driver version: {major:02x}.{minor:02x}.{patch:02x}");

        config.validate()?;
        validate_catalog(&SUPPORTED_MODES)?;

        let mut inner = Inner {
            transport,
            clock,
            clock_enabled: false,
            state: ControlState::new(default_mode()),
            sink: None,
        };
        let identity = inner.probe()?;

        Ok(Self {
            inner: Mutex::new(inner),
            config,
            identity,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install the consumer of range updates and publish the current ranges to it.
    pub fn set_range_sink(&self, mut sink: Box<dyn ControlRangeSink>) {
        let mut inner = self.lock();
        sink.publish(&inner.state.ranges);
        inner.sink = Some(sink);
    }

    /// Identification read at attach.
    pub const fn identity(&self) -> SensorIdentity {
        self.identity
    }

    /// Board configuration supplied at attach.
    pub const fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Subdevice name for the I²C device `dev_name`.
    pub fn subdev_name(&self, dev_name: &str) -> String {
        self.config.subdev_name(dev_name)
    }

    /// Snapshot of the control state.
    pub fn state(&self) -> ControlState {
        self.lock().state
    }

    /// MIPI CSI-2 bus parameters.
    #[allow(clippy::unused_self)]
    pub const fn bus_config(&self) -> BusConfig {
        BusConfig {
            lanes: CSI2_LANES,
            channel: 0,
            continuous_clock: true,
        }
    }

    /// Link frequency of the active mode, in Hz.
    pub fn link_frequency(&self) -> Option<i64> {
        self.lock().state.mode.link_frequency()
    }

    /// Apply control `id` with `value`.
    pub fn set_control_value(&self, id: ControlId, value: i64) -> Result<()> {
        self.lock().apply_control(id, value)
    }

    /// Release the transport and clock, stopping the clock if still running.
    pub fn detach(self) -> (T, C) {
        let mut inner = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        inner.power_off();
        (inner.transport, inner.clock)
    }
}

impl<T: RegisterTransport, C: ExternalClock> FormatNegotiation for Imx219<T, C> {
    fn enum_mbus_code(&self, index: u32) -> Result<MediaBusCode> {
        if index != 0 {
            return Err(SensorError::InvalidArgument(format!(
                "media-bus code index {index}"
            )));
        }
        Ok(self.lock().state.mode.bus_code)
    }

    fn enum_frame_size(&self, index: u32, code: MediaBusCode) -> Result<FrameSize> {
        let mode = catalog_entry(index, code)?;
        Ok(FrameSize {
            index,
            code,
            width: mode.width,
            height: mode.height,
        })
    }

    fn enum_frame_interval(&self, index: u32, code: MediaBusCode) -> Result<FrameIntervalDesc> {
        let mode = catalog_entry(index, code)?;
        Ok(FrameIntervalDesc {
            index,
            code,
            width: mode.width,
            height: mode.height,
            interval: mode.max_fps,
            hdr_mode: mode.hdr_mode,
        })
    }

    fn format(&self) -> MbusFormat {
        MbusFormat::from_mode(self.lock().state.mode)
    }

    fn set_format(&self, which: FormatWhich, request: &MbusFormat) -> MbusFormat {
        let mode = select_mode(request.width, request.height);
        if which == FormatWhich::Active {
            self.lock().switch_mode(mode);
        }
        MbusFormat::from_mode(mode)
    }

    fn frame_interval(&self) -> Interval {
        self.lock().state.mode.max_fps
    }
}

fn catalog_entry(index: u32, code: MediaBusCode) -> Result<&'static SensorMode> {
    let mode = usize::try_from(index)
        .ok()
        .and_then(|index| SUPPORTED_MODES.get(index))
        .ok_or_else(|| SensorError::InvalidArgument(format!("frame size index {index}")))?;
    if mode.bus_code != code {
        return Err(SensorError::InvalidArgument(format!(
            "media-bus code {:#06x}",
            code.0
        )));
    }
    Ok(mode)
}

impl<T: RegisterTransport, C: ExternalClock> ControlApplication for Imx219<T, C> {
    fn set_control(&self, control: &Control) -> Result<()> {
        let id = ControlId::from_raw(control.id)
            .ok_or(SensorError::UnsupportedControl(control.id))?;
        let value = control_value(control)?;
        self.set_control_value(id, value)
    }

    fn controls(&self) -> Vec<ControlDesc> {
        describe_controls(self.lock().state.mode)
    }
}

impl<T: RegisterTransport, C: ExternalClock> StreamControl for Imx219<T, C> {
    fn set_power(&self, on: bool) -> Result<()> {
        let mut inner = self.lock();
        if on {
            inner.power_on()
        } else {
            inner.power_off();
            Ok(())
        }
    }

    fn set_stream(&self, enable: bool) -> Result<()> {
        let mut inner = self.lock();
        if enable {
            inner.start_stream(Replay::Start)
        } else {
            inner.stop_stream()
        }
    }
}

impl<T: RegisterTransport, C: ExternalClock> VendorExtension for Imx219<T, C> {
    fn vendor_command(&self, command: VendorCommand) -> Result<VendorResponse> {
        match command {
            VendorCommand::GetModuleInfo => Ok(VendorResponse::ModuleInfo(
                ModuleInfo::from_config(&self.config),
            )),
            VendorCommand::GetHdrConfig => {
                let hdr_mode = self.lock().state.mode.hdr_mode;
                Ok(VendorResponse::HdrConfig(HdrConfig::for_mode(hdr_mode)))
            }
            VendorCommand::SetHdrConfig(request) => {
                let mode = find_by_hdr_mode(request.hdr_mode).ok_or_else(|| {
                    warn!("no mode for hdr mode {}", request.hdr_mode.raw());
                    SensorError::UnsupportedMode(request.hdr_mode)
                })?;
                let mut inner = self.lock();
                inner.switch_mode(mode);
                inner.state.cur_vts = mode.vts_def;
                Ok(VendorResponse::Done)
            }
            VendorCommand::SetQuickStream(on) => {
                self.lock().quick_stream(on)?;
                Ok(VendorResponse::Done)
            }
        }
    }
}
