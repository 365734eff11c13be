//! Mock transport and clock for testing without hardware.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

use crate::error::{Result, SensorError, TransportError};
use crate::registers::{RegWidth, RegisterWrite, CHIP_ID, LOT_ID_H, LOT_ID_L, LOT_ID_M, MODEL_ID};
use crate::traits::{ExternalClock, RegisterTransport};

#[derive(Debug, Default)]
struct MockBus {
    registers: HashMap<u16, u32>,
    writes: Vec<RegisterWrite>,
    reads: Vec<u16>,
    fail_write_at: Option<u16>,
    fail_read_at: Option<u16>,
}

/// Shared view of a [`MockTransport`]'s register file and access log.
#[derive(Debug, Clone, Default)]
pub struct MockHandle(Arc<Mutex<MockBus>>);

impl MockHandle {
    fn bus(&self) -> MutexGuard<'_, MockBus> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Preload a register value.
    pub fn set_register(&self, addr: u16, value: u32) {
        self.bus().registers.insert(addr, value);
    }

    /// Current register value, if ever written or preloaded.
    pub fn register(&self, addr: u16) -> Option<u32> {
        self.bus().registers.get(&addr).copied()
    }

    /// Successful writes, oldest first.
    pub fn writes(&self) -> Vec<RegisterWrite> {
        self.bus().writes.clone()
    }

    /// Addresses of all attempted reads, oldest first.
    pub fn reads(&self) -> Vec<u16> {
        self.bus().reads.clone()
    }

    /// Forget the access log, keeping register contents.
    pub fn clear_log(&self) {
        let mut bus = self.bus();
        bus.writes.clear();
        bus.reads.clear();
    }

    /// Make writes to `addr` fail.
    pub fn fail_writes_at(&self, addr: u16) {
        self.bus().fail_write_at = Some(addr);
    }

    /// Make reads from `addr` fail.
    pub fn fail_reads_at(&self, addr: u16) {
        self.bus().fail_read_at = Some(addr);
    }

    /// Remove injected failures.
    pub fn clear_failures(&self) {
        let mut bus = self.bus();
        bus.fail_write_at = None;
        bus.fail_read_at = None;
    }
}

/// Mock transport backed by an in-memory register file.
#[derive(Debug, Default)]
pub struct MockTransport {
    handle: MockHandle,
}

impl MockTransport {
    /// Empty register file; unset registers read as zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register file answering like a genuine IMX219.
    #[must_use]
    pub fn imx219() -> Self {
        Self::new().with_identity(0x0219, 0x12_3456, 0x00AB)
    }

    /// Preload the identification registers.
    #[must_use]
    pub fn with_identity(self, model_id: u16, lot_id: u32, chip_id: u16) -> Self {
        let [_, high, mid, low] = lot_id.to_be_bytes();
        self.handle.set_register(MODEL_ID, u32::from(model_id));
        self.handle.set_register(LOT_ID_H, u32::from(high));
        self.handle.set_register(LOT_ID_M, u32::from(mid));
        self.handle.set_register(LOT_ID_L, u32::from(low));
        self.handle.set_register(CHIP_ID, u32::from(chip_id));
        self
    }

    /// Handle sharing this transport's state.
    #[must_use]
    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

const NACK: ErrorKind = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);

impl RegisterTransport for MockTransport {
    fn write(
        &mut self,
        addr: u16,
        width: RegWidth,
        value: u32,
    ) -> std::result::Result<(), TransportError> {
        let mut bus = self.handle.bus();
        if bus.fail_write_at == Some(addr) {
            return Err(TransportError::Write { addr, kind: NACK });
        }
        bus.registers.insert(addr, value);
        bus.writes.push(RegisterWrite { addr, value, width });
        Ok(())
    }

    fn read(&mut self, addr: u16, _width: RegWidth) -> std::result::Result<u32, TransportError> {
        let mut bus = self.handle.bus();
        bus.reads.push(addr);
        if bus.fail_read_at == Some(addr) {
            return Err(TransportError::Read { addr, kind: NACK });
        }
        Ok(bus.registers.get(&addr).copied().unwrap_or(0))
    }
}

#[derive(Debug, Default)]
struct ClockState {
    enabled: bool,
    enable_count: u32,
    disable_count: u32,
    unavailable: bool,
}

/// Mock external clock counting enable/disable calls.
#[derive(Debug, Clone, Default)]
pub struct MockClock(Arc<Mutex<ClockState>>);

impl MockClock {
    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A clock whose enable always fails.
    #[must_use]
    pub fn unavailable() -> Self {
        let clock = Self::default();
        clock.state().unavailable = true;
        clock
    }

    /// Whether the clock is currently running.
    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    /// Number of successful enables.
    pub fn enable_count(&self) -> u32 {
        self.state().enable_count
    }

    /// Number of disables.
    pub fn disable_count(&self) -> u32 {
        self.state().disable_count
    }
}

impl ExternalClock for MockClock {
    fn enable(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.unavailable {
            return Err(SensorError::Resource("xvclk not available".to_owned()));
        }
        state.enabled = true;
        state.enable_count += 1;
        Ok(())
    }

    fn disable(&mut self) {
        let mut state = self.state();
        state.enabled = false;
        state.disable_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_records_writes() {
        let mut transport = MockTransport::new();
        transport
            .write(0x0100, RegWidth::U8, 1)
            .expect("write should succeed");

        let handle = transport.handle();
        assert_eq!(handle.register(0x0100), Some(1));
        assert_eq!(handle.writes().len(), 1);
    }

    #[test]
    fn test_mock_transport_injected_failure() {
        let mut transport = MockTransport::new();
        transport.handle().fail_writes_at(0x0172);

        assert!(transport.write(0x0172, RegWidth::U8, 3).is_err());
        assert!(transport.handle().writes().is_empty());
    }

    #[test]
    fn test_mock_clock_counts() {
        let mut clock = MockClock::default();
        clock.enable().expect("enable should succeed");
        assert!(clock.is_enabled());
        clock.disable();
        assert!(!clock.is_enabled());
        assert_eq!((clock.enable_count(), clock.disable_count()), (1, 1));

        let mut missing = MockClock::unavailable();
        assert!(missing.enable().is_err());
    }
}
