//! Supported sensor modes and best-fit selection.

use v4l::{FourCC, Fraction};

use crate::registers::{
    RegisterWrite, EXP_LINES_MARGIN, MODE_1920X1080_30FPS, MODE_3280X2464_21FPS,
};
use crate::vendor::HdrMode;

/// Media-bus pixel code as used on the sensor's output pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaBusCode(pub u32);

impl MediaBusCode {
    /// 10-bit Bayer RGGB, one sample per bus clock.
    pub const SRGGB10_1X10: Self = Self(0x300F);

    /// Memory pixel format produced when this bus code is captured.
    #[must_use]
    pub fn fourcc(self) -> Option<FourCC> {
        match self {
            Self::SRGGB10_1X10 => Some(FourCC::new(b"RG10")),
            _ => None,
        }
    }
}

/// A frame interval in seconds, `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Seconds numerator.
    pub numerator: u32,
    /// Seconds denominator.
    pub denominator: u32,
}

impl From<Interval> for Fraction {
    fn from(interval: Interval) -> Self {
        Self::new(interval.numerator, interval.denominator)
    }
}

/// Link frequencies selectable through the link-frequency menu, in Hz.
pub const LINK_FREQ_MENU: [i64; 1] = [456_000_000];

/// An immutable catalog entry describing one readout configuration.
#[derive(Debug, Clone, Copy)]
pub struct SensorMode {
    /// Bus pixel format.
    pub bus_code: MediaBusCode,
    /// Output width after cropping/binning.
    pub width: u32,
    /// Output height after cropping/binning.
    pub height: u32,
    /// Fastest frame interval, as `numerator / denominator` seconds.
    pub max_fps: Interval,
    /// Horizontal total size.
    pub hts_def: u32,
    /// Vertical total size.
    pub vts_def: u32,
    /// Register program, terminated by [`RegisterWrite::END`].
    pub reg_list: &'static [RegisterWrite],
    /// HDR operating mode.
    pub hdr_mode: HdrMode,
    /// Index into [`LINK_FREQ_MENU`].
    pub freq_idx: usize,
}

impl SensorMode {
    /// Frames per second, rounded to nearest.
    #[must_use]
    pub const fn fps(&self) -> u32 {
        div_round_closest(self.max_fps.denominator, self.max_fps.numerator)
    }

    /// Horizontal blanking in pixels.
    #[must_use]
    pub const fn hblank(&self) -> u32 {
        self.hts_def.saturating_sub(self.width)
    }

    /// Default (and minimum) vertical blanking in lines.
    #[must_use]
    pub const fn vblank_def(&self) -> u32 {
        self.vts_def.saturating_sub(self.height)
    }

    /// Pixel rate implied by the mode's timing.
    #[must_use]
    pub const fn pixel_rate(&self) -> u64 {
        self.vts_def as u64 * self.hts_def as u64 * self.fps() as u64
    }

    /// Link frequency in Hz.
    #[must_use]
    pub fn link_frequency(&self) -> Option<i64> {
        LINK_FREQ_MENU.get(self.freq_idx).copied()
    }
}

/// Integer division rounding half away from zero, for positive operands.
const fn div_round_closest(n: u32, d: u32) -> u32 {
    if d == 0 {
        return 0;
    }
    (n + d / 2) / d
}

const LINE_LENGTH: u32 = 0x0D78;

/// All modes this sensor supports. Entry 0 is the power-on default.
pub static SUPPORTED_MODES: [SensorMode; 2] = [
    SensorMode {
        bus_code: MediaBusCode::SRGGB10_1X10,
        width: 1920,
        height: 1080,
        max_fps: Interval {
            numerator: 10_000,
            denominator: 300_000,
        },
        hts_def: LINE_LENGTH - EXP_LINES_MARGIN,
        vts_def: 0x06E3,
        reg_list: &MODE_1920X1080_30FPS,
        hdr_mode: HdrMode::None,
        freq_idx: 0,
    },
    SensorMode {
        bus_code: MediaBusCode::SRGGB10_1X10,
        width: 3280,
        height: 2464,
        max_fps: Interval {
            numerator: 10_000,
            denominator: 210_000,
        },
        hts_def: LINE_LENGTH - EXP_LINES_MARGIN,
        vts_def: 0x09C4,
        reg_list: &MODE_3280X2464_21FPS,
        hdr_mode: HdrMode::None,
        freq_idx: 0,
    },
];

/// Manhattan distance between a mode's output size and a requested size.
#[must_use]
pub const fn resolution_distance(mode: &SensorMode, width: u32, height: u32) -> u32 {
    mode.width.abs_diff(width) + mode.height.abs_diff(height)
}

/// Pick the catalog entry closest to `width` x `height`.
///
/// Ties resolve to the earliest entry. Returns `None` only for an empty catalog.
#[must_use]
pub fn find_best_fit(modes: &[SensorMode], width: u32, height: u32) -> Option<&SensorMode> {
    modes
        .iter()
        .enumerate()
        .min_by_key(|(index, mode)| (resolution_distance(mode, width, height), *index))
        .map(|(_, mode)| mode)
}

/// Best-fit selection against [`SUPPORTED_MODES`].
#[must_use]
pub fn select_mode(width: u32, height: u32) -> &'static SensorMode {
    find_best_fit(&SUPPORTED_MODES, width, height).unwrap_or_else(default_mode)
}

/// Power-on default mode, the first catalog entry.
#[must_use]
pub fn default_mode() -> &'static SensorMode {
    let [first, ..] = &SUPPORTED_MODES;
    first
}

/// First catalog entry carrying `hdr_mode`.
#[must_use]
pub fn find_by_hdr_mode(hdr_mode: HdrMode) -> Option<&'static SensorMode> {
    SUPPORTED_MODES.iter().find(|mode| mode.hdr_mode == hdr_mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_mode_prefers_smallest_distance() {
        let mode = select_mode(2000, 1500);
        assert_eq!((mode.width, mode.height), (1920, 1080));

        let mode = select_mode(3000, 2000);
        assert_eq!((mode.width, mode.height), (3280, 2464));
    }

    #[test]
    fn test_select_mode_exact_match() {
        let mode = select_mode(3280, 2464);
        assert_eq!((mode.width, mode.height), (3280, 2464));
        assert_eq!(resolution_distance(mode, 3280, 2464), 0);
    }

    #[test]
    fn test_distance_worked_example() {
        let [hd, full] = &SUPPORTED_MODES;
        assert_eq!(resolution_distance(hd, 2000, 1500), 920);
        assert_eq!(resolution_distance(full, 2000, 1500), 2244);
    }

    #[test]
    fn test_tie_resolves_to_lower_index() {
        let modes = [
            SensorMode {
                width: 100,
                height: 100,
                ..SUPPORTED_MODES[0]
            },
            SensorMode {
                width: 300,
                height: 100,
                ..SUPPORTED_MODES[1]
            },
        ];
        let mode = find_best_fit(&modes, 200, 100).expect("non-empty catalog");
        assert_eq!(mode.width, 100);
    }

    #[test]
    fn test_find_best_fit_empty_catalog() {
        assert!(find_best_fit(&[], 640, 480).is_none());
    }

    #[test]
    fn test_zero_request_picks_smallest_mode() {
        let mode = select_mode(0, 0);
        assert_eq!(mode.width, 1920);
    }

    #[test]
    fn test_fps_rounds_to_nearest() {
        assert_eq!(SUPPORTED_MODES[0].fps(), 30);
        assert_eq!(SUPPORTED_MODES[1].fps(), 21);
        assert_eq!(div_round_closest(25, 10), 3);
        assert_eq!(div_round_closest(24, 10), 2);
    }

    #[test]
    fn test_derived_timing_1080p() {
        let mode = &SUPPORTED_MODES[0];
        assert_eq!(mode.hts_def, 3444);
        assert_eq!(mode.hblank(), 3444 - 1920);
        assert_eq!(mode.vblank_def(), 0x06E3 - 1080);
        assert_eq!(mode.pixel_rate(), 1763 * 3444 * 30);
    }

    #[test]
    fn test_derived_timing_full_resolution() {
        let mode = &SUPPORTED_MODES[1];
        assert_eq!(mode.hblank(), 164);
        assert_eq!(mode.vblank_def(), 2500 - 2464);
        assert_eq!(mode.pixel_rate(), 2500 * 3444 * 21);
    }

    #[test]
    fn test_interval_converts_to_fraction() {
        let fraction = Fraction::from(SUPPORTED_MODES[0].max_fps);
        assert_eq!(fraction.numerator, 10_000);
        assert_eq!(fraction.denominator, 300_000);
    }

    #[test]
    fn test_link_frequency() {
        assert_eq!(SUPPORTED_MODES[0].link_frequency(), Some(456_000_000));
    }

    #[test]
    fn test_find_by_hdr_mode() {
        let mode = find_by_hdr_mode(HdrMode::None).expect("linear mode exists");
        assert_eq!(mode.width, 1920);
        assert!(find_by_hdr_mode(HdrMode::X2).is_none());
    }

    #[test]
    fn test_bus_code_fourcc() {
        let fourcc = MediaBusCode::SRGGB10_1X10.fourcc().expect("known code");
        assert_eq!(fourcc.repr, *b"RG10");
        assert!(MediaBusCode(0x2006).fourcc().is_none());
    }
}
