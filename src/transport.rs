//! Register transport over an `embedded-hal` I²C bus.

use embedded_hal::i2c::{Error as _, I2c};
use log::warn;

use crate::error::TransportError;
use crate::registers::RegWidth;
use crate::traits::RegisterTransport;

/// 7-bit bus address the IMX219 answers on.
pub const DEFAULT_ADDRESS: u8 = 0x10;

/// Register access framed as a big-endian 16-bit address followed by data.
#[derive(Debug)]
pub struct I2cTransport<I2C> {
    bus: I2C,
    address: u8,
}

impl<I2C: I2c> I2cTransport<I2C> {
    /// Talk to the sensor at [`DEFAULT_ADDRESS`].
    pub const fn new(bus: I2C) -> Self {
        Self::with_address(bus, DEFAULT_ADDRESS)
    }

    /// Talk to the sensor at `address`.
    pub const fn with_address(bus: I2C, address: u8) -> Self {
        Self { bus, address }
    }

    /// Bus address in use.
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Release the bus.
    pub fn release(self) -> I2C {
        self.bus
    }
}

/// Low `width` bytes of `value`, most significant first.
fn data_bytes(value: u32, width: RegWidth) -> impl Iterator<Item = u8> {
    let bytes = value.to_be_bytes();
    bytes.into_iter().skip(bytes.len() - width.bytes())
}

impl<I2C: I2c> RegisterTransport for I2cTransport<I2C> {
    fn write(&mut self, addr: u16, width: RegWidth, value: u32) -> Result<(), TransportError> {
        let mut frame = Vec::with_capacity(2 + width.bytes());
        frame.extend_from_slice(&addr.to_be_bytes());
        frame.extend(data_bytes(value, width));

        self.bus
            .write(self.address, &frame)
            .map_err(|err| TransportError::Write {
                addr,
                kind: err.kind(),
            })
    }

    fn read(&mut self, addr: u16, width: RegWidth) -> Result<u32, TransportError> {
        let mut data = vec![0u8; width.bytes()];
        self.bus
            .write_read(self.address, &addr.to_be_bytes(), &mut data)
            .map_err(|err| {
                warn!(
                    "reading register {addr:#06x} from {:#04x} failed",
                    self.address
                );
                TransportError::Read {
                    addr,
                    kind: err.kind(),
                }
            })?;

        Ok(data
            .into_iter()
            .fold(0u32, |acc, byte| (acc << 8) | u32::from(byte)))
    }
}
