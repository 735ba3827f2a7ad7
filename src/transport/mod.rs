//! Bus transport abstraction
//!
//! The SPIRIT1 is driven over a byte-duplex bus: every opcode frame written
//! to the device produces an equal-length response whose first two bytes are
//! always the status header. [`Transport`] captures exactly that capability
//! and is the seam between the register engine and the host's bus hardware.
//!
//! Two implementations are provided:
//! - [`SpiTransport`]: the real bus, over an `embedded-hal` [`SpiDevice`]
//! - [`mock::MockTransport`]: a deterministic in-memory device model for
//!   offline testing
//!
//! [`SpiDevice`]: embedded_hal::spi::SpiDevice

pub mod mock;

use thiserror::Error;

/// Errors raised by a transport implementation.
///
/// The register engine treats any transport error as a soft failure: the
/// operation is logged and degrades to a no-op with an empty result, so an
/// intermittent bus fault during a long receive session does not abort the
/// process.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The device is powered down or otherwise unreachable.
    #[error("transport is shut down")]
    Shutdown,
    /// The bus transfer itself failed.
    #[error("bus transfer failed")]
    Bus,
}

/// A byte-duplex transport to the radio.
///
/// `transact` sends one complete opcode frame and returns the device's
/// response. The response is at least as long as the request; its first two
/// bytes are the status header and the remaining bytes carry the requested
/// payload.
pub trait Transport {
    fn transact(&mut self, frame: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// Transport over a real SPI bus.
///
/// SPI is full duplex, so the response is always exactly as long as the
/// request: the status header clocks out under the opcode and address bytes,
/// and register payloads clock out under the trailing bytes of the frame.
pub struct SpiTransport<SPI> {
    spi: SPI,
}

impl<SPI> SpiTransport<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Transport for SpiTransport<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    fn transact(&mut self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut response = vec![0u8; frame.len()];
        self.spi
            .transfer(&mut response, frame)
            .map_err(|_| TransportError::Bus)?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    #[test]
    fn spi_transport_is_full_duplex() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer(vec![0x01, 0xC8, 0x00], vec![0x52, 0x07, 0x33]),
            SpiTransaction::transaction_end(),
        ];
        let mut transport = SpiTransport::new(SpiMock::new(&expectations));

        let response = transport.transact(&[0x01, 0xC8, 0x00]).unwrap();
        assert_eq!(response, vec![0x52, 0x07, 0x33]);

        transport.release().done();
    }
}
