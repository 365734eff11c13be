//! Sensor identification read at attach time.

use log::{error, info};

use crate::error::{Result, SensorError};
use crate::registers::{
    RegWidth, CHIP_ID, IMX219_MODEL_ID, LOT_ID_H, LOT_ID_L, LOT_ID_M, MODEL_ID,
};
use crate::traits::RegisterTransport;

/// Identification registers of one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorIdentity {
    /// Model identifier.
    pub model_id: u16,
    /// 24-bit manufacturing lot.
    pub lot_id: u32,
    /// Chip identifier within the lot.
    pub chip_id: u16,
}

impl SensorIdentity {
    /// Read all identification registers. The first failing read aborts.
    pub fn read<T: RegisterTransport>(transport: &mut T) -> Result<Self> {
        let model_id = read_u16(transport, MODEL_ID).inspect_err(|_| {
            error!("failed to read model id at {MODEL_ID:#06x}");
        })?;

        let mut lot_id = 0u32;
        for (addr, part) in [(LOT_ID_H, "high"), (LOT_ID_M, "mid"), (LOT_ID_L, "low")] {
            let byte = transport.read(addr, RegWidth::U8).inspect_err(|_| {
                error!("failed to read lot id ({part} byte)");
            })?;
            lot_id = (lot_id << 8) | (byte & 0xFF);
        }

        let chip_id = read_u16(transport, CHIP_ID).inspect_err(|_| {
            error!("failed to read chip id");
        })?;

        Ok(Self {
            model_id,
            lot_id,
            chip_id,
        })
    }

    /// Fail unless the model identifier names an IMX219.
    pub fn verify(&self) -> Result<()> {
        if self.model_id != IMX219_MODEL_ID {
            error!("model id {:#06x} not supported", self.model_id);
            return Err(SensorError::IdentityMismatch {
                found: self.model_id,
                expected: IMX219_MODEL_ID,
            });
        }
        info!(
            "model id {:#06x}, lot id {:#08x}, chip id {:#06x}",
            self.model_id,
            self.lot_id,
            self.chip_id
        );
        Ok(())
    }
}

fn read_u16<T: RegisterTransport>(transport: &mut T, addr: u16) -> Result<u16> {
    let value = transport.read(addr, RegWidth::U16)?;
    Ok(u16::try_from(value & 0xFFFF).unwrap_or(u16::MAX))
}
