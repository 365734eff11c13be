//! Control identifiers and the gain/exposure/blanking conversion math.

use crate::modes::{SensorMode, LINK_FREQ_MENU};
use crate::registers::{EXP_LINES_MARGIN, VTS_MAX};

const CID_BASE: u32 = 0x0098_0900;
const IMAGE_SOURCE_CLASS_BASE: u32 = 0x009E_0900;
const IMAGE_PROC_CLASS_BASE: u32 = 0x009F_0900;

/// Controls exposed by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    /// Horizontal mirror.
    HFlip,
    /// Vertical flip.
    VFlip,
    /// Analogue gain; routed to the unified gain split.
    AnalogueGain,
    /// Unified gain in 1/256 steps.
    Gain,
    /// Exposure in lines.
    Exposure,
    /// Horizontal blanking (read-only).
    HBlank,
    /// Vertical blanking.
    VBlank,
    /// Link frequency menu (read-only).
    LinkFreq,
    /// Pixel rate (read-only).
    PixelRate,
    /// Test pattern menu.
    TestPattern,
    /// Test pattern red channel.
    TestPatternRed,
    /// Test pattern green-on-red-row channel.
    TestPatternGreenR,
    /// Test pattern blue channel.
    TestPatternBlue,
    /// Test pattern green-on-blue-row channel.
    TestPatternGreenB,
}

impl ControlId {
    /// Every control, in registration order.
    pub const ALL: [Self; 14] = [
        Self::HFlip,
        Self::VFlip,
        Self::AnalogueGain,
        Self::Gain,
        Self::Exposure,
        Self::HBlank,
        Self::VBlank,
        Self::LinkFreq,
        Self::PixelRate,
        Self::TestPattern,
        Self::TestPatternRed,
        Self::TestPatternGreenR,
        Self::TestPatternBlue,
        Self::TestPatternGreenB,
    ];

    /// V4L2 control identifier.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Exposure => CID_BASE + 17,
            Self::Gain => CID_BASE + 19,
            Self::HFlip => CID_BASE + 20,
            Self::VFlip => CID_BASE + 21,
            Self::VBlank => IMAGE_SOURCE_CLASS_BASE + 1,
            Self::HBlank => IMAGE_SOURCE_CLASS_BASE + 2,
            Self::AnalogueGain => IMAGE_SOURCE_CLASS_BASE + 3,
            Self::TestPatternRed => IMAGE_SOURCE_CLASS_BASE + 4,
            Self::TestPatternGreenR => IMAGE_SOURCE_CLASS_BASE + 5,
            Self::TestPatternBlue => IMAGE_SOURCE_CLASS_BASE + 6,
            Self::TestPatternGreenB => IMAGE_SOURCE_CLASS_BASE + 7,
            Self::LinkFreq => IMAGE_PROC_CLASS_BASE + 1,
            Self::PixelRate => IMAGE_PROC_CLASS_BASE + 2,
            Self::TestPattern => IMAGE_PROC_CLASS_BASE + 3,
        }
    }

    /// Look up a control by its V4L2 identifier.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.raw() == raw)
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HFlip => "Horizontal Flip",
            Self::VFlip => "Vertical Flip",
            Self::AnalogueGain => "Analogue Gain",
            Self::Gain => "Gain",
            Self::Exposure => "Exposure",
            Self::HBlank => "Horizontal Blanking",
            Self::VBlank => "Vertical Blanking",
            Self::LinkFreq => "Link Frequency",
            Self::PixelRate => "Pixel Rate",
            Self::TestPattern => "Test Pattern",
            Self::TestPatternRed => "Red Pixel Value",
            Self::TestPatternGreenR => "Green (Red) Pixel Value",
            Self::TestPatternBlue => "Blue Pixel Value",
            Self::TestPatternGreenB => "Green (Blue) Pixel Value",
        }
    }

    /// Whether the framework may write this control.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::HBlank | Self::LinkFreq | Self::PixelRate)
    }
}

/// Sensor test patterns, indexed by menu position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestPattern {
    /// Normal image output.
    #[default]
    Disabled,
    /// Single colour taken from the channel controls.
    SolidColor,
    /// Vertical colour bars.
    ColorBar,
    /// Colour bars fading to grey.
    FadeToGreyColorBar,
    /// Pseudo-random PN9 sequence.
    Pn9,
}

impl TestPattern {
    /// Menu entries in index order.
    pub const MENU: [Self; 5] = [
        Self::Disabled,
        Self::SolidColor,
        Self::ColorBar,
        Self::FadeToGreyColorBar,
        Self::Pn9,
    ];

    /// Pattern at menu position `index`.
    #[must_use]
    pub fn from_menu_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::MENU.get(index).copied())
    }

    /// Register value selecting this pattern.
    #[must_use]
    pub const fn register_value(self) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::SolidColor => 1,
            Self::ColorBar => 2,
            Self::FadeToGreyColorBar => 3,
            Self::Pn9 => 4,
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::SolidColor => "Solid Color",
            Self::ColorBar => "Color Bar",
            Self::FadeToGreyColorBar => "Fade to Grey Color Bar",
            Self::Pn9 => "PN9",
        }
    }
}

/// Lower bound of the unified gain, 1x.
pub const UNIFIED_GAIN_MIN: i64 = 256;
/// Upper bound of the unified gain.
pub const UNIFIED_GAIN_MAX: i64 = 43_663;
/// Unified gain above which analogue gain is held and digital gain takes over.
pub const ANALOGUE_GAIN_CEILING: u32 = 2728;
/// Largest analogue gain register code.
pub const ANALOGUE_CODE_MAX: u32 = 232;
/// Digital gain register range.
pub const DIGITAL_CODE_MIN: u32 = 256;
/// Digital gain register range.
pub const DIGITAL_CODE_MAX: u32 = 4095;
/// Exposure register range, in lines.
pub const EXPOSURE_MAX: i64 = 4095;
/// Test pattern channel range.
pub const TEST_COLOUR_MAX: i64 = 0x03FF;

/// Register codes for one unified gain request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GainCodes {
    /// Analogue gain register code, 0..=232.
    pub analogue: u8,
    /// Digital gain register code, 256..=4095.
    pub digital: u16,
}

/// Split a unified gain (1/256 units) into analogue and digital register codes.
///
/// Analogue gain carries everything up to [`ANALOGUE_GAIN_CEILING`]; beyond it
/// the remainder goes to digital gain. The analogue register follows
/// `code = 256 - 256 * 256 / gain`.
#[must_use]
pub fn split_gain(unified: i64) -> GainCodes {
    let gain = u32::try_from(unified.clamp(UNIFIED_GAIN_MIN, UNIFIED_GAIN_MAX))
        .unwrap_or(DIGITAL_CODE_MIN);

    let (a_gain, d_gain) = if gain <= ANALOGUE_GAIN_CEILING {
        (gain, DIGITAL_CODE_MIN)
    } else {
        // truncating division
        (ANALOGUE_GAIN_CEILING, gain * 256 / ANALOGUE_GAIN_CEILING)
    };

    let analogue = if a_gain < 256 {
        0
    } else {
        (256 - (256 * 256) / a_gain).min(ANALOGUE_CODE_MAX)
    };
    let digital = d_gain.clamp(DIGITAL_CODE_MIN, DIGITAL_CODE_MAX);

    GainCodes {
        analogue: u8::try_from(analogue).unwrap_or(u8::MAX),
        digital: u16::try_from(digital).unwrap_or(u16::MAX),
    }
}

/// Vertical timing resulting from a blanking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalTiming {
    /// Effective request after raising it to the mode's total lines.
    pub vts: u32,
    /// Frame length register value (request less the exposure margin).
    pub frame_length: u32,
}

/// Resolve a vertical blanking request against the active mode.
///
/// The request is compared against the mode's total lines (`vts_def`), not
/// its blanking: anything below is raised to `vts_def`. The frame length is
/// the request less [`EXP_LINES_MARGIN`], never past `VTS_MAX` less the margin.
#[must_use]
pub fn vertical_timing(mode: &SensorMode, requested_vblank: i64) -> VerticalTiming {
    let floor = i64::from(mode.vts_def);
    let vts = u32::try_from(requested_vblank.max(floor).min(i64::from(VTS_MAX)))
        .unwrap_or(mode.vts_def);

    VerticalTiming {
        vts,
        frame_length: vts.saturating_sub(EXP_LINES_MARGIN),
    }
}

/// Frame length programmed at every stream start.
#[must_use]
pub const fn default_frame_length(mode: &SensorMode) -> u32 {
    mode.vts_def.saturating_sub(EXP_LINES_MARGIN)
}

/// Range and default of an integer control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRange {
    /// Smallest accepted value.
    pub min: i64,
    /// Largest accepted value.
    pub max: i64,
    /// Increment.
    pub step: u64,
    /// Default value.
    pub default: i64,
}

impl ControlRange {
    /// Range admitting exactly one value.
    #[must_use]
    pub const fn fixed(value: i64) -> Self {
        Self {
            min: value,
            max: value,
            step: 1,
            default: value,
        }
    }

    /// Range with unit step.
    #[must_use]
    pub const fn new(min: i64, max: i64, default: i64) -> Self {
        Self {
            min,
            max,
            step: 1,
            default,
        }
    }
}

/// Control ranges derived from the active mode's timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRanges {
    /// Horizontal blanking, fixed.
    pub hblank: ControlRange,
    /// Vertical blanking, from the mode default up to the largest frame length.
    pub vblank: ControlRange,
    /// Pixel rate, fixed.
    pub pixel_rate: ControlRange,
}

impl ControlRanges {
    /// Derive the ranges for `mode`.
    #[must_use]
    pub fn for_mode(mode: &SensorMode) -> Self {
        let vblank_def = i64::from(mode.vblank_def());
        let vblank_max = i64::from(VTS_MAX.saturating_sub(mode.height));
        let pixel_rate = i64::try_from(mode.pixel_rate()).unwrap_or(i64::MAX);

        Self {
            hblank: ControlRange::fixed(i64::from(mode.hblank())),
            vblank: ControlRange::new(vblank_def, vblank_max, vblank_def),
            pixel_rate: ControlRange::fixed(pixel_rate),
        }
    }
}

/// Description of one control as presented to the framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDesc {
    /// Control identifier.
    pub id: ControlId,
    /// Accepted values.
    pub range: ControlRange,
    /// Menu labels for menu controls.
    pub menu: Vec<&'static str>,
}

/// Describe every control for a sensor running `mode`.
#[must_use]
pub fn describe_controls(mode: &SensorMode) -> Vec<ControlDesc> {
    let ranges = ControlRanges::for_mode(mode);
    let link_freq_max = i64::try_from(LINK_FREQ_MENU.len()).unwrap_or(1) - 1;

    ControlId::ALL
        .into_iter()
        .map(|id| {
            let range = match id {
                ControlId::HFlip | ControlId::VFlip => ControlRange::new(0, 1, 0),
                ControlId::AnalogueGain => ControlRange::new(256, 11 * 256, 2 * 256),
                ControlId::Gain => {
                    ControlRange::new(UNIFIED_GAIN_MIN, UNIFIED_GAIN_MAX, UNIFIED_GAIN_MIN)
                }
                ControlId::Exposure => ControlRange::new(0, EXPOSURE_MAX, 1575),
                ControlId::HBlank => ranges.hblank,
                ControlId::VBlank => ranges.vblank,
                ControlId::LinkFreq => {
                    let index = i64::try_from(mode.freq_idx).unwrap_or(0);
                    ControlRange::new(0, link_freq_max, index)
                }
                ControlId::PixelRate => ranges.pixel_rate,
                ControlId::TestPattern => ControlRange::new(0, 4, 0),
                ControlId::TestPatternRed
                | ControlId::TestPatternGreenR
                | ControlId::TestPatternBlue
                | ControlId::TestPatternGreenB => {
                    ControlRange::new(0, TEST_COLOUR_MAX, TEST_COLOUR_MAX)
                }
            };
            let menu = if id == ControlId::TestPattern {
                TestPattern::MENU.iter().map(|pattern| pattern.label()).collect()
            } else {
                Vec::new()
            };
            ControlDesc { id, range, menu }
        })
        .collect()
}
