//! imx219-modes: print the IMX219 mode catalog and gain register splits.
//!
//! Usage: `imx219-modes [GAIN...]`, where each gain is in 1/256 units.

use imx219_sensor::controls::describe_controls;
use imx219_sensor::validation::validate_catalog;
use imx219_sensor::{split_gain, ControlRanges, SensorError, SUPPORTED_MODES};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> imx219_sensor::Result<()> {
    validate_catalog(&SUPPORTED_MODES)?;

    for (index, mode) in SUPPORTED_MODES.iter().enumerate() {
        let ranges = ControlRanges::for_mode(mode);
        println!(
            "Mode {index}: {}x{} @ {} fps, code {:#06x}, hdr {:?}",
            mode.width,
            mode.height,
            mode.fps(),
            mode.bus_code.0,
            mode.hdr_mode
        );
        println!(
            "  hts {} vts {} hblank {} vblank {}..={} pixel rate {}",
            mode.hts_def,
            mode.vts_def,
            ranges.hblank.default,
            ranges.vblank.min,
            ranges.vblank.max,
            ranges.pixel_rate.default
        );
        if let Some(link) = mode.link_frequency() {
            println!("  link frequency {link} Hz");
        }
    }

    if let Some(mode) = SUPPORTED_MODES.first() {
        println!("Controls:");
        for desc in describe_controls(mode) {
            println!(
                "  {:<24} {:#010x} [{}, {}] default {}",
                desc.id.name(),
                desc.id.raw(),
                desc.range.min,
                desc.range.max,
                desc.range.default
            );
        }
    }

    for arg in std::env::args().skip(1) {
        let gain: i64 = arg
            .parse()
            .map_err(|_| SensorError::InvalidArgument(format!("gain {arg:?}")))?;
        let codes = split_gain(gain);
        println!(
            "Gain {gain}: analogue code {} digital code {}",
            codes.analogue, codes.digital
        );
    }

    Ok(())
}
