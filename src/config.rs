//! Board-supplied module configuration.

use serde::Deserialize;

use crate::error::{Result, SensorError};
use crate::vendor::SENSOR_NAME;

/// Which side of the device the module faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear camera.
    #[default]
    Back,
    /// Front camera.
    Front,
}

impl Facing {
    const fn initial(self) -> char {
        match self {
            Self::Back => 'b',
            Self::Front => 'f',
        }
    }
}

/// Module identity fields normally read from the board description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleConfig {
    /// Camera module index on the board.
    #[serde(default)]
    pub module_index: u32,
    /// Module orientation.
    #[serde(default)]
    pub facing: Facing,
    /// Module name.
    pub module_name: String,
    /// Lens name.
    pub lens_name: String,
}

impl ModuleConfig {
    /// Create a configuration for a back-facing module at index 0.
    #[must_use]
    pub fn new(module_name: &str, lens_name: &str) -> Self {
        Self {
            module_index: 0,
            facing: Facing::Back,
            module_name: module_name.to_owned(),
            lens_name: lens_name.to_owned(),
        }
    }

    /// Set the module index.
    #[must_use]
    pub const fn with_index(mut self, module_index: u32) -> Self {
        self.module_index = module_index;
        self
    }

    /// Set the facing.
    #[must_use]
    pub const fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// Reject configurations missing module information.
    pub fn validate(&self) -> Result<()> {
        if self.module_name.trim().is_empty() {
            return Err(SensorError::Config("module name is empty".to_owned()));
        }
        if self.lens_name.trim().is_empty() {
            return Err(SensorError::Config("lens name is empty".to_owned()));
        }
        Ok(())
    }

    /// Subdevice name, e.g. `m00_b_imx219 1-0010`.
    #[must_use]
    pub fn subdev_name(&self, dev_name: &str) -> String {
        format!(
            "m{:02}_{}_{} {}",
            self.module_index,
            self.facing.initial(),
            SENSOR_NAME,
            dev_name
        )
    }
}
