//! IMX219 register map and the per-mode programming tables.

/// Width of a single register access on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegWidth {
    /// One byte.
    U8,
    /// Two bytes, big-endian.
    U16,
    /// Four bytes, big-endian.
    U32,
}

impl RegWidth {
    /// Number of data bytes transferred for this width.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// One entry of a register programming table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    /// Register address.
    pub addr: u16,
    /// Value to program. Only the low `width` bytes are sent.
    pub value: u32,
    /// Access width.
    pub width: RegWidth,
}

impl RegisterWrite {
    /// Table terminator.
    pub const END: Self = Self::byte(TABLE_END, 0x00);

    /// 8-bit register write.
    #[must_use]
    pub const fn byte(addr: u16, value: u8) -> Self {
        Self {
            addr,
            value: value as u32,
            width: RegWidth::U8,
        }
    }

    /// Whether this entry terminates its table.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.addr == TABLE_END
    }
}

/// Iterate a sentinel-terminated table up to (not including) the terminator.
pub fn table_entries(table: &[RegisterWrite]) -> impl Iterator<Item = &RegisterWrite> {
    table.iter().take_while(|reg| !reg.is_end())
}

/// Sentinel address that terminates a programming table.
pub const TABLE_END: u16 = 0xFFFF;

/// Model identification, 16 bits.
pub const MODEL_ID: u16 = 0x0000;
/// Lot identification, high byte.
pub const LOT_ID_H: u16 = 0x0004;
/// Lot identification, middle byte.
pub const LOT_ID_M: u16 = 0x0005;
/// Lot identification, low byte.
pub const LOT_ID_L: u16 = 0x0006;
/// Chip identification, 16 bits.
pub const CHIP_ID: u16 = 0x000D;
/// Standby / streaming select.
pub const MODE_SELECT: u16 = 0x0100;
/// Coarse integration time, 16 bits.
pub const EXPOSURE: u16 = 0x015A;
/// Global analogue gain, 8 bits.
pub const ANA_GAIN_GLOBAL_A: u16 = 0x0157;
/// Global digital gain, 16 bits.
pub const DIG_GAIN_GLOBAL_A: u16 = 0x0158;
/// Frame length in lines, 16 bits.
pub const FRM_LENGTH_A: u16 = 0x0160;
/// Line length in pixels, 16 bits.
pub const LINE_LENGTH_A: u16 = 0x0162;
/// Output width, 16 bits.
pub const X_OUTPUT_SIZE: u16 = 0x016C;
/// Output height, 16 bits.
pub const Y_OUTPUT_SIZE: u16 = 0x016E;
/// Image orientation: bit 0 horizontal mirror, bit 1 vertical flip.
pub const IMG_ORIENTATION: u16 = 0x0172;
/// Test pattern selector.
pub const TEST_PATTERN: u16 = 0x0600;
/// Test pattern red channel.
pub const TD_R: u16 = 0x0602;
/// Test pattern green (red row) channel.
pub const TD_GR: u16 = 0x0604;
/// Test pattern blue channel.
pub const TD_B: u16 = 0x0606;
/// Test pattern green (blue row) channel.
pub const TD_GB: u16 = 0x0608;
/// Test pattern window width.
pub const TP_WINDOW_WIDTH: u16 = 0x0624;
/// Test pattern window height.
pub const TP_WINDOW_HEIGHT: u16 = 0x0626;

/// Value of [`MODEL_ID`] on an IMX219.
pub const IMX219_MODEL_ID: u16 = 0x0219;

/// Mask applied to [`MODE_SELECT`] before comparing against [`MODE_STREAMING`].
pub const MODE_SELECT_MASK: u32 = 0x1F;
/// [`MODE_SELECT`] value while streaming.
pub const MODE_STREAMING: u8 = 0x01;
/// [`MODE_SELECT`] value in software standby.
pub const MODE_STANDBY: u8 = 0x00;

/// Lines kept between exposure and frame length.
pub const EXP_LINES_MARGIN: u32 = 4;
/// Largest programmable frame length.
pub const VTS_MAX: u32 = 0xFFFF;

/// Enter streaming.
pub static START: [RegisterWrite; 2] = [
    RegisterWrite::byte(MODE_SELECT, MODE_STREAMING),
    RegisterWrite::END,
];

/// Enter software standby.
pub static STOP: [RegisterWrite; 2] = [
    RegisterWrite::byte(MODE_SELECT, MODE_STANDBY),
    RegisterWrite::END,
];

const fn r(addr: u16, value: u8) -> RegisterWrite {
    RegisterWrite::byte(addr, value)
}

/// 24 MHz MCLK, 3280x2464 at ~21 fps, two MIPI lanes.
pub static MODE_3280X2464_21FPS: [RegisterWrite; 66] = [
    // manufacturer access codes for addresses above 0x3000
    r(0x30EB, 0x05),
    r(0x30EB, 0x0C),
    r(0x300A, 0xFF),
    r(0x300B, 0xFF),
    r(0x30EB, 0x05),
    r(0x30EB, 0x09),
    // lanes, D-PHY, 24 MHz external clock
    r(0x0114, 0x01),
    r(0x0128, 0x00),
    r(0x012A, 0x18),
    r(0x012B, 0x00),
    // full-array crop window
    r(0x0164, 0x00),
    r(0x0165, 0x00),
    r(0x0166, 0x0C),
    r(0x0167, 0xCF),
    r(0x0168, 0x00),
    r(0x0169, 0x00),
    r(0x016A, 0x09),
    r(0x016B, 0x9F),
    // output size
    r(0x016C, 0x0C),
    r(0x016D, 0xD0),
    r(0x016E, 0x09),
    r(0x016F, 0xA0),
    // integration time, frame and line length (banks A and B)
    r(0x015A, 0x01),
    r(0x015B, 0xF4),
    r(0x0160, 0x09),
    r(0x0161, 0xC4),
    r(0x0162, 0x0D),
    r(0x0163, 0x78),
    r(0x0260, 0x09),
    r(0x0261, 0xC4),
    r(0x0262, 0x0D),
    r(0x0263, 0x78),
    // no skipping, no binning
    r(0x0170, 0x01),
    r(0x0171, 0x01),
    r(0x0270, 0x01),
    r(0x0271, 0x01),
    r(0x0174, 0x00),
    r(0x0175, 0x00),
    r(0x0274, 0x00),
    r(0x0275, 0x00),
    // RAW10
    r(0x018C, 0x0A),
    r(0x018D, 0x0A),
    r(0x028C, 0x0A),
    r(0x028D, 0x0A),
    // PLL
    r(0x0301, 0x05),
    r(0x0303, 0x01),
    r(0x0304, 0x03),
    r(0x0305, 0x03),
    r(0x0306, 0x00),
    r(0x0307, 0x39),
    r(0x0309, 0x0A),
    r(0x030B, 0x01),
    r(0x030C, 0x00),
    r(0x030D, 0x72),
    // CIS tuning
    r(0x455E, 0x00),
    r(0x471E, 0x4B),
    r(0x4767, 0x0F),
    r(0x4750, 0x14),
    r(0x47B4, 0x14),
    r(0x4713, 0x30),
    r(0x478B, 0x10),
    r(0x478F, 0x10),
    r(0x4793, 0x10),
    r(0x4797, 0x0E),
    r(0x479B, 0x0E),
    RegisterWrite::END,
];

/// 24 MHz MCLK, 1920x1080 at 30 fps, two MIPI lanes.
pub static MODE_1920X1080_30FPS: [RegisterWrite; 49] = [
    r(0x30EB, 0x05),
    r(0x30EB, 0x0C),
    r(0x300A, 0xFF),
    r(0x300B, 0xFF),
    r(0x30EB, 0x05),
    r(0x30EB, 0x09),
    r(0x0114, 0x01),
    r(0x0128, 0x00),
    r(0x012A, 0x18),
    r(0x012B, 0x00),
    // frame and line length
    r(0x0160, 0x06),
    r(0x0161, 0xE6),
    r(0x0162, 0x0D),
    r(0x0163, 0x78),
    // centred 1920x1080 crop
    r(0x0164, 0x02),
    r(0x0165, 0xA8),
    r(0x0166, 0x0A),
    r(0x0167, 0x27),
    r(0x0168, 0x02),
    r(0x0169, 0xB4),
    r(0x016A, 0x06),
    r(0x016B, 0xEB),
    r(0x016C, 0x07),
    r(0x016D, 0x80),
    r(0x016E, 0x04),
    r(0x016F, 0x38),
    r(0x0170, 0x01),
    r(0x0171, 0x01),
    r(0x0174, 0x00),
    r(0x0175, 0x00),
    r(0x018C, 0x0A),
    r(0x018D, 0x0A),
    r(0x0301, 0x05),
    r(0x0303, 0x01),
    r(0x0304, 0x03),
    r(0x0305, 0x03),
    r(0x0306, 0x00),
    r(0x0307, 0x39),
    r(0x0309, 0x0A),
    r(0x030B, 0x01),
    r(0x030C, 0x00),
    r(0x030D, 0x72),
    r(0x455E, 0x00),
    r(0x471E, 0x4B),
    r(0x4767, 0x0F),
    r(0x4750, 0x14),
    r(0x4540, 0x00),
    r(0x47B4, 0x14),
    RegisterWrite::END,
];
