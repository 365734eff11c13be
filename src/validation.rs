//! Consistency checks for the static mode catalog.
//!
//! Every catalog entry carries both a register program and the timing numbers
//! derived from it. These functions check that the two agree, so a bad table
//! edit is caught at attach instead of streaming the wrong geometry.

use crate::error::{Result, SensorError};
use crate::modes::SensorMode;
use crate::registers::{
    table_entries, RegisterWrite, EXP_LINES_MARGIN, LINE_LENGTH_A, X_OUTPUT_SIZE, Y_OUTPUT_SIZE,
};

/// Value a table leaves in a 16-bit register split across two byte writes.
///
/// Later writes override earlier ones. Returns `None` unless both halves are
/// programmed.
#[must_use]
pub fn programmed_u16(table: &[RegisterWrite], addr: u16) -> Option<u32> {
    let last_byte = |target: u16| {
        table_entries(table)
            .filter(|reg| reg.addr == target)
            .last()
            .map(|reg| reg.value & 0xFF)
    };
    let high = last_byte(addr)?;
    let low = last_byte(addr.wrapping_add(1))?;
    Some((high << 8) | low)
}

/// Validates one catalog entry.
///
/// # Arguments
///
/// * `index` - Catalog position, used in the error
/// * `mode` - The entry to check
///
/// # Errors
///
/// Returns `Catalog` if:
/// - The register program has no terminator
/// - The programmed output size differs from the declared width or height
/// - The programmed line length differs from `hts_def` plus the exposure margin
/// - The total size is smaller than the active size
/// - The frame interval has a zero term
pub fn validate_mode(index: usize, mode: &SensorMode) -> Result<()> {
    let fail = |reason: String| SensorError::Catalog { index, reason };

    if !mode.reg_list.iter().any(RegisterWrite::is_end) {
        return Err(fail("register program is not terminated".to_owned()));
    }

    for (addr, name, declared) in [
        (X_OUTPUT_SIZE, "width", mode.width),
        (Y_OUTPUT_SIZE, "height", mode.height),
        (LINE_LENGTH_A, "line length", mode.hts_def + EXP_LINES_MARGIN),
    ] {
        match programmed_u16(mode.reg_list, addr) {
            Some(programmed) if programmed == declared => {}
            Some(programmed) => {
                return Err(fail(format!(
                    "{name} {declared} declared, {programmed} programmed at {addr:#06x}"
                )));
            }
            None => return Err(fail(format!("{name} not programmed at {addr:#06x}"))),
        }
    }

    if mode.hts_def < mode.width || mode.vts_def < mode.height {
        return Err(fail(format!(
            "total size {}x{} smaller than active size {}x{}",
            mode.hts_def, mode.vts_def, mode.width, mode.height
        )));
    }

    if mode.max_fps.numerator == 0 || mode.max_fps.denominator == 0 {
        return Err(fail("frame interval has a zero term".to_owned()));
    }

    if mode.link_frequency().is_none() {
        return Err(fail(format!("link frequency index {} unknown", mode.freq_idx)));
    }

    Ok(())
}

/// Validates a whole catalog.
///
/// All entries must pass [`validate_mode`] and share the first entry's bus
/// code, since only one media-bus code is enumerated.
///
/// # Errors
///
/// Returns `Catalog` for an empty catalog or the first inconsistent entry.
pub fn validate_catalog(modes: &[SensorMode]) -> Result<()> {
    let Some(first) = modes.first() else {
        return Err(SensorError::Catalog {
            index: 0,
            reason: "catalog is empty".to_owned(),
        });
    };

    for (index, mode) in modes.iter().enumerate() {
        validate_mode(index, mode)?;
        if mode.bus_code != first.bus_code {
            return Err(SensorError::Catalog {
                index,
                reason: format!(
                    "bus code {:#06x} differs from {:#06x}",
                    mode.bus_code.0, first.bus_code.0
                ),
            });
        }
    }

    Ok(())
}
