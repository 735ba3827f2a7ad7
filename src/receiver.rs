//! Receive pipeline
//!
//! [`RxSession`] owns the radio for the duration of a receive run: it arms
//! the receiver, drains the FIFO as watermark interrupts come in, and turns
//! each completed packet into a [`FramedMessage`] with its link metrics and
//! captured CRC. The session borrows the register engine exclusively, so no
//! other component can touch the bus while a reception is in flight.
//!
//! Each call to [`RxSession::next`] blocks until the next event: a message,
//! an RX timeout, or the session having been stopped.

use log::{debug, info, warn};

use crate::device::Spirit1;
use crate::error::Error;
use crate::irq::{Irq, IrqFlags};
use crate::packet::{FramedMessage, PacketConfig, ReceivedFrame};
use crate::registers::Register;
use crate::status::DeviceState;
use crate::transport::Transport;

/// What a receive iteration produced.
#[derive(Debug, PartialEq, Eq)]
pub enum RxEvent {
    /// A packet passed the packet handler and was deframed.
    Message(FramedMessage),
    /// The RX timeout expired without a packet; the session is over.
    Timeout,
    /// The session was stopped, either cooperatively or by reaching its
    /// message limit.
    Stopped,
}

/// An armed receive session.
pub struct RxSession<'a, T: Transport> {
    spirit: &'a mut Spirit1<T>,
    irq: &'a Irq,
    config: &'a PacketConfig,
    buffer: Vec<u8>,
    received: usize,
    message_limit: usize,
    done: bool,
}

impl<'a, T: Transport> RxSession<'a, T> {
    /// Flush the RX FIFO and enter RX.
    ///
    /// A `message_limit` of zero keeps the session open until it is stopped
    /// or times out.
    pub fn start(
        spirit: &'a mut Spirit1<T>,
        irq: &'a Irq,
        config: &'a PacketConfig,
        message_limit: usize,
    ) -> Result<Self, Error> {
        if !spirit.flush_rx_fifo() {
            return Err(Error::StateTransition {
                wanted: DeviceState::Ready,
            });
        }
        if !spirit.start_rx() {
            return Err(Error::StateTransition {
                wanted: DeviceState::Rx,
            });
        }
        Ok(Self {
            spirit,
            irq,
            config,
            buffer: Vec::new(),
            received: 0,
            message_limit,
            done: false,
        })
    }

    /// Messages delivered so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Abort the reception and end the session.
    pub fn stop(&mut self) {
        if !self.done {
            self.done = true;
            self.spirit.sabort();
        }
    }

    /// Block until the next receive event.
    pub fn next(&mut self) -> RxEvent {
        if self.done {
            return RxEvent::Stopped;
        }
        loop {
            let status = self.irq.status(self.spirit);

            if status.contains(IrqFlags::RX_FIFO_ALMOST_FULL) {
                self.drain_fifo();
            }
            if status.contains(IrqFlags::RX_TIMEOUT) {
                info!("RX timeout after {} messages", self.received);
                self.done = true;
                self.spirit.sabort();
                return RxEvent::Timeout;
            }
            if status.contains(IrqFlags::RX_DATA_READY) {
                self.drain_fifo();
                match self.take_message() {
                    Ok(message) => {
                        self.received += 1;
                        if self.message_limit > 0 && self.received >= self.message_limit {
                            debug!("message limit of {} reached", self.message_limit);
                            self.done = true;
                            self.spirit.sabort();
                        } else {
                            self.rearm();
                        }
                        return RxEvent::Message(message);
                    }
                    Err(e) => {
                        warn!("discarding unparseable frame: {e}");
                        self.rearm();
                    }
                }
            }
        }
    }

    fn drain_fifo(&mut self) {
        let available = self.spirit.rx_fifo_available();
        if available > 0 {
            let bytes = self.spirit.read_linear_fifo(available);
            self.buffer.extend_from_slice(&bytes);
        }
    }

    /// Snapshot the link metrics and captured CRC, then deframe the buffer.
    fn take_message(&mut self) -> Result<FramedMessage, Error> {
        let metrics = self.spirit.read_registers(&[
            Register::RssiLevel,
            Register::LinkQualif2,
            Register::LinkQualif1,
            Register::LinkQualif0,
        ]);
        let mut payload = std::mem::take(&mut self.buffer);
        payload.extend(self.config.read_rx_crc(self.spirit));

        let frame = if metrics.len() == 4 {
            ReceivedFrame {
                payload,
                rssi: metrics[0],
                pqi: metrics[1],
                sqi: metrics[2] & 0x7F,
                agc: metrics[3] & 0x0F,
            }
        } else {
            ReceivedFrame {
                payload,
                rssi: 0,
                pqi: 0,
                sqi: 0,
                agc: 0,
            }
        };
        self.config.deframe(frame)
    }

    /// Leave RX, flush and re-enter for the next packet.
    fn rearm(&mut self) {
        self.spirit.sabort();
        self.spirit.flush_rx_fifo();
        self.spirit.start_rx();
    }
}

/// Whether the receiver re-enters RX by itself after each packet.
pub fn persistent_rx<T: Transport>(spirit: &mut Spirit1<T>) -> bool {
    spirit.register_bit(Register::Protocol0, 1)
}

pub fn set_persistent_rx<T: Transport>(spirit: &mut Spirit1<T>, on: bool) {
    spirit.set_register_bit(Register::Protocol0, 1, on);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::CrcMode;
    use crate::transport::mock::MockTransport;

    fn config() -> PacketConfig {
        PacketConfig {
            preamble_length: 5,
            sync_words: vec![0x5A, 0x47, 0x52, 0x50],
            crc_mode: CrcMode::Crc1021,
            control_length: 2,
            address_field: true,
            ..PacketConfig::default()
        }
    }

    fn seeded_mock(payload_len: usize) -> (MockTransport, Vec<u8>) {
        let payload: Vec<u8> = (0..payload_len as u8).collect();
        let image = config()
            .frame(Some(0x42), &[0x10, 0x20], &payload)
            .unwrap();

        let mut mock = MockTransport::new();
        mock.push_rx_bytes(&image);
        mock.set_register(Register::CrcField1, 0xAB);
        mock.set_register(Register::CrcField0, 0xCD);
        mock.set_register(Register::RssiLevel, 0x90);
        mock.set_register(Register::LinkQualif2, 0xC8);
        mock.set_register(Register::LinkQualif1, 0xBC);
        mock.set_register(Register::LinkQualif0, 0xF3);
        (mock, payload)
    }

    #[test]
    fn chunked_reception_reassembles_one_message() {
        // 40 byte FIFO image, drained in 16 + 16 + 8 byte chunks
        let (mut mock, payload) = seeded_mock(37);
        mock.set_fifo_chunk_limit(16);
        mock.push_irq_status(IrqFlags::RX_FIFO_ALMOST_FULL.bits());
        mock.push_irq_status(IrqFlags::RX_FIFO_ALMOST_FULL.bits());
        mock.push_irq_status(IrqFlags::RX_DATA_READY.bits());
        let mut spirit = Spirit1::new(mock);
        let irq = Irq::new();
        let packet = config();

        let mut session = RxSession::start(&mut spirit, &irq, &packet, 1).unwrap();
        match session.next() {
            RxEvent::Message(message) => {
                assert_eq!(message.address, Some(0x42));
                assert_eq!(message.control, vec![0x10, 0x20]);
                assert_eq!(message.crc, vec![0xAB, 0xCD]);
                assert_eq!(message.frame.payload, payload);
                assert_eq!(message.frame.rssi, 0x90);
                assert_eq!(message.frame.sqi, 0x3C);
                assert_eq!(message.frame.pqi, 0xC8);
                assert_eq!(message.frame.agc, 0x03);
            }
            other => panic!("expected a message, got {other:?}"),
        }
        // the limit was reached, the session is over
        assert_eq!(session.next(), RxEvent::Stopped);
        assert_eq!(session.received(), 1);

        let mock = spirit.release();
        // arm, then abort at the limit; no re-arm in between
        assert_eq!(mock.commands(), vec![0x71, 0x61, 0x67]);
    }

    #[test]
    fn unlimited_session_rearms_between_messages() {
        let (mut mock, _) = seeded_mock(10);
        mock.push_irq_status(IrqFlags::RX_DATA_READY.bits());
        mock.push_irq_status(IrqFlags::RX_TIMEOUT.bits());
        let mut spirit = Spirit1::new(mock);
        let irq = Irq::new();
        let packet = config();

        let mut session = RxSession::start(&mut spirit, &irq, &packet, 0).unwrap();
        assert!(matches!(session.next(), RxEvent::Message(_)));
        assert_eq!(session.next(), RxEvent::Timeout);
        assert_eq!(session.next(), RxEvent::Stopped);

        let mock = spirit.release();
        // arm, re-arm after the message, abort on timeout
        assert_eq!(mock.commands(), vec![0x71, 0x61, 0x67, 0x71, 0x61, 0x67]);
    }

    #[test]
    fn stop_aborts_the_reception_once() {
        let mut spirit = Spirit1::new(MockTransport::new());
        let irq = Irq::new();
        let packet = config();

        let mut session = RxSession::start(&mut spirit, &irq, &packet, 0).unwrap();
        session.stop();
        session.stop();
        assert_eq!(session.next(), RxEvent::Stopped);

        let mock = spirit.release();
        assert_eq!(mock.commands(), vec![0x71, 0x61, 0x67]);
    }

    #[test]
    fn persistent_rx_toggles_protocol0() {
        let mut spirit = Spirit1::new(MockTransport::new());
        assert!(!persistent_rx(&mut spirit));
        set_persistent_rx(&mut spirit, true);
        assert!(persistent_rx(&mut spirit));
    }
}
