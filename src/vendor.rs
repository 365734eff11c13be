//! Vendor extension commands for the camera framework.
//!
//! The camera stack reaches module information, HDR selection and a
//! lightweight stream toggle through one multiplexed entry point. Each command
//! is a variant of [`VendorCommand`] and produces one [`VendorResponse`].

use crate::config::ModuleConfig;

/// Sensor name reported in module information.
pub const SENSOR_NAME: &str = "imx219";

/// Capacity of each string field in [`ModuleInfo`], including the terminator.
pub const MODULE_NAME_LEN: usize = 32;

/// HDR operating mode of a sensor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HdrMode {
    /// Linear readout.
    #[default]
    None,
    /// Two-exposure HDR.
    X2,
    /// Three-exposure HDR.
    X3,
}

impl HdrMode {
    /// Numeric tag used by the camera framework.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::None => 0,
            Self::X2 => 5,
            Self::X3 => 6,
        }
    }
}

/// How HDR exposures are separated on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdrEspMode {
    /// Exposures on separate virtual channels.
    NormalVc,
    /// Exposures tagged by ID code.
    IdCode,
}

/// HDR configuration exchanged with the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdrConfig {
    /// Requested or active HDR mode.
    pub hdr_mode: HdrMode,
    /// Exposure separation reported for the active mode.
    pub esp_mode: HdrEspMode,
}

impl HdrConfig {
    /// Configuration reported for a mode running `hdr_mode`.
    #[must_use]
    pub const fn for_mode(hdr_mode: HdrMode) -> Self {
        let esp_mode = match hdr_mode {
            HdrMode::None => HdrEspMode::NormalVc,
            HdrMode::X2 | HdrMode::X3 => HdrEspMode::IdCode,
        };
        Self { hdr_mode, esp_mode }
    }
}

/// Identity of the camera module as configured by the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Sensor name.
    pub sensor: String,
    /// Module name.
    pub module: String,
    /// Lens name.
    pub lens: String,
}

impl ModuleInfo {
    /// Build module information from the board configuration.
    ///
    /// Fields longer than the framework's fixed buffers are truncated.
    #[must_use]
    pub fn from_config(config: &ModuleConfig) -> Self {
        Self {
            sensor: truncate_field(SENSOR_NAME),
            module: truncate_field(&config.module_name),
            lens: truncate_field(&config.lens_name),
        }
    }
}

fn truncate_field(value: &str) -> String {
    value.chars().take(MODULE_NAME_LEN - 1).collect()
}

/// A vendor extension request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorCommand {
    /// Report sensor, module and lens names.
    GetModuleInfo,
    /// Report the active mode's HDR configuration.
    GetHdrConfig,
    /// Switch to the first mode running the requested HDR mode.
    SetHdrConfig(HdrConfig),
    /// Toggle streaming without replaying the mode program.
    SetQuickStream(bool),
}

/// Result of a [`VendorCommand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorResponse {
    /// Answer to [`VendorCommand::GetModuleInfo`].
    ModuleInfo(ModuleInfo),
    /// Answer to [`VendorCommand::GetHdrConfig`].
    HdrConfig(HdrConfig),
    /// The command was applied.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Facing;

    #[test]
    fn test_hdr_config_for_linear_mode() {
        let cfg = HdrConfig::for_mode(HdrMode::None);
        assert_eq!(cfg.esp_mode, HdrEspMode::NormalVc);
        assert_eq!(cfg.hdr_mode.raw(), 0);
    }

    #[test]
    fn test_hdr_config_for_hdr_mode() {
        assert_eq!(HdrConfig::for_mode(HdrMode::X2).esp_mode, HdrEspMode::IdCode);
        assert_eq!(HdrConfig::for_mode(HdrMode::X3).esp_mode, HdrEspMode::IdCode);
    }

    #[test]
    fn test_module_info_truncates_long_names() {
        let config = ModuleConfig {
            module_index: 0,
            facing: Facing::Back,
            module_name: "x".repeat(40),
            lens_name: "lens".to_owned(),
        };
        let info = ModuleInfo::from_config(&config);
        assert_eq!(info.sensor, "imx219");
        assert_eq!(info.module.len(), MODULE_NAME_LEN - 1);
        assert_eq!(info.lens, "lens");
    }
}
