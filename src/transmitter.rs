//! Transmit path
//!
//! [`Transmitter::send`] stages one outbound message: the address and
//! control fields go to their dedicated registers, the payload goes through
//! the TX FIFO, and the call returns once the modulator has drained the
//! FIFO. Validation is fail-closed: a message that does not match the packet
//! configuration is rejected before anything is written to the device.

use log::debug;

use crate::device::Spirit1;
use crate::error::Error;
use crate::packet::PacketConfig;
use crate::registers::Register;
use crate::status::DeviceState;
use crate::transport::Transport;

/// One message to transmit.
///
/// `address` and `control` must match the packet configuration: an address
/// when the address field is enabled, exactly `control_length` control
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutboundMessage {
    pub address: Option<u8>,
    pub control: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Transmit engine bound to a packet configuration.
pub struct Transmitter<'a> {
    config: &'a PacketConfig,
}

impl<'a> Transmitter<'a> {
    pub fn new(config: &'a PacketConfig) -> Self {
        Self { config }
    }

    /// Transmit one message and wait for the FIFO to drain.
    pub fn send<T: Transport>(
        &self,
        spirit: &mut Spirit1<T>,
        message: &OutboundMessage,
    ) -> Result<(), Error> {
        let address = if self.config.address_field {
            Some(
                message
                    .address
                    .ok_or(Error::MissingRequiredField("address"))?,
            )
        } else {
            None
        };
        if message.control.len() != self.config.control_length as usize {
            return Err(Error::ConfigurationInvalid(
                "control field does not match the configured length",
            ));
        }

        if let Some(address) = address {
            self.config.write_tx_source_address(spirit, address);
        }
        self.config.write_tx_control(spirit, &message.control)?;

        if self.config.fixed_length {
            // the hardware length covers address and control as well
            let total = message.payload.len() + self.config.header_length();
            spirit.write_registers(
                Register::PktLen1,
                &[(total >> 8) as u8, (total & 0xFF) as u8],
            );
        }

        if !spirit.flush_tx_fifo() {
            return Err(Error::StateTransition {
                wanted: DeviceState::Ready,
            });
        }
        spirit.write_linear_fifo(&message.payload);
        debug!("transmitting {} payload bytes", message.payload.len());
        if !spirit.start_tx() {
            return Err(Error::StateTransition {
                wanted: DeviceState::Tx,
            });
        }
        while spirit.tx_fifo_used() > 0 {}
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::CrcMode;
    use crate::transport::mock::MockTransport;

    fn config() -> PacketConfig {
        PacketConfig {
            preamble_length: 5,
            sync_words: vec![0x5A, 0x47],
            crc_mode: CrcMode::Crc8005,
            control_length: 2,
            address_field: true,
            ..PacketConfig::default()
        }
    }

    #[test]
    fn send_stages_fields_and_drains_the_fifo() {
        let mut spirit = Spirit1::new(MockTransport::new());
        let config = config();
        let message = OutboundMessage {
            address: Some(0x21),
            control: vec![9, 8],
            payload: vec![1, 2, 3, 4, 5],
        };
        Transmitter::new(&config).send(&mut spirit, &message).unwrap();

        let mock = spirit.release();
        assert_eq!(mock.register(Register::TxSourceAddr), 0x21);
        assert_eq!(mock.register(Register::TxCtrl1), 9);
        assert_eq!(mock.register(Register::TxCtrl0), 8);
        // payload passed through the FIFO port
        assert_eq!(mock.tx_fifo(), &[1, 2, 3, 4, 5]);
        // variable length mode leaves the length registers alone
        assert_eq!(mock.register(Register::PktLen1), 0);
        assert_eq!(mock.register(Register::PktLen0), 0);
        assert_eq!(mock.commands(), vec![0x72, 0x60]);
    }

    #[test]
    fn fixed_length_mode_programs_the_total_length() {
        let mut spirit = Spirit1::new(MockTransport::new());
        let mut config = config();
        config.fixed_length = true;
        config.fixed_packet_length = 100;
        let message = OutboundMessage {
            address: Some(0x21),
            control: vec![9, 8],
            payload: vec![0; 5],
        };
        Transmitter::new(&config).send(&mut spirit, &message).unwrap();

        let mock = spirit.release();
        // five payload bytes plus address and two control bytes
        assert_eq!(mock.register(Register::PktLen1), 0);
        assert_eq!(mock.register(Register::PktLen0), 8);
    }

    #[test]
    fn validation_fails_closed() {
        let mut spirit = Spirit1::new(MockTransport::new());
        let config = config();

        let no_address = OutboundMessage {
            address: None,
            control: vec![9, 8],
            payload: vec![1],
        };
        assert_eq!(
            Transmitter::new(&config).send(&mut spirit, &no_address),
            Err(Error::MissingRequiredField("address"))
        );

        let short_control = OutboundMessage {
            address: Some(1),
            control: vec![9],
            payload: vec![1],
        };
        assert!(Transmitter::new(&config)
            .send(&mut spirit, &short_control)
            .is_err());

        let mock = spirit.release();
        // nothing but the constructor's status refresh touched the bus
        assert_eq!(mock.frames().len(), 1);
        assert!(mock.tx_fifo().is_empty());
    }
}
