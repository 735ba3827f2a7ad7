//! Deterministic in-memory device model
//!
//! [`MockTransport`] emulates enough of the SPIRIT1 bus behavior to exercise
//! the whole driver offline: a 256-byte register file, command strobes that
//! move the state code in the status header, a scripted IRQ status sequence
//! and a byte FIFO for RX payloads. Every frame is recorded so tests can
//! assert on exact bus traffic.
//!
//! The model is intentionally script-driven rather than cycle-accurate:
//! bytes pushed with [`MockTransport::push_rx_bytes`] represent upcoming
//! on-air data, so a `FLUSHRXFIFO` strobe does not discard them.

use std::collections::VecDeque;

use super::{Transport, TransportError};
use crate::registers::{Register, FIFO_ADDRESS};

const STATUS_BYTE_0: usize = 0xC0;
const STATUS_BYTE_1: usize = 0xC1;

/// In-memory stand-in for a SPIRIT1 on the bus.
pub struct MockTransport {
    registers: [u8; 256],
    rx_fifo: VecDeque<u8>,
    tx_fifo: Vec<u8>,
    tx_occupancy: usize,
    irq_script: VecDeque<u32>,
    current_irq: u32,
    fifo_chunk_limit: usize,
    inert_commands: bool,
    shutdown: bool,
    log: Vec<Vec<u8>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// A powered-up device sitting in READY with its RX FIFO empty.
    pub fn new() -> Self {
        let mut registers = [0u8; 256];
        registers[STATUS_BYTE_0] = 0x52;
        registers[STATUS_BYTE_1] = 0x07;
        Self {
            registers,
            rx_fifo: VecDeque::new(),
            tx_fifo: Vec::new(),
            tx_occupancy: 0,
            irq_script: VecDeque::new(),
            current_irq: 0,
            fifo_chunk_limit: 96,
            inert_commands: false,
            shutdown: false,
            log: Vec::new(),
        }
    }

    /// Seed one register with a value.
    pub fn set_register(&mut self, register: Register, value: u8) {
        self.registers[register.addr() as usize] = value;
    }

    /// Seed a contiguous run of registers starting at `start`.
    pub fn seed_registers(&mut self, start: Register, values: &[u8]) {
        let base = start.addr() as usize;
        self.registers[base..base + values.len()].copy_from_slice(values);
    }

    pub fn register(&self, register: Register) -> u8 {
        self.registers[register.addr() as usize]
    }

    /// Queue bytes the RX FIFO will deliver.
    pub fn push_rx_bytes(&mut self, bytes: &[u8]) {
        self.rx_fifo.extend(bytes.iter().copied());
    }

    /// Queue one IRQ status word per upcoming status poll.
    ///
    /// Each read of the IRQ status run consumes one entry; once the script is
    /// exhausted every further poll reads as zero.
    pub fn push_irq_status(&mut self, status: u32) {
        self.irq_script.push_back(status);
    }

    /// Cap how many FIFO bytes a single occupancy read reports, emulating the
    /// almost-full watermark of the real 96-byte FIFO.
    pub fn set_fifo_chunk_limit(&mut self, limit: usize) {
        self.fifo_chunk_limit = limit;
    }

    /// When set, command strobes are recorded but have no effect on the
    /// status header. Used to provoke state-transition timeouts.
    pub fn set_inert_commands(&mut self, inert: bool) {
        self.inert_commands = inert;
    }

    /// Simulate the device becoming unreachable.
    pub fn set_shutdown(&mut self, shutdown: bool) {
        self.shutdown = shutdown;
    }

    /// Everything the TX FIFO has been fed since construction. A TX strobe
    /// or a flush zeroes the occupancy but keeps this log.
    pub fn tx_fifo(&self) -> &[u8] {
        &self.tx_fifo
    }

    /// Every frame seen on the bus, in order.
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.log
    }

    /// The command opcodes strobed so far, in order.
    pub fn commands(&self) -> Vec<u8> {
        self.log
            .iter()
            .filter(|frame| frame.first() == Some(&0x80))
            .filter_map(|frame| frame.get(1).copied())
            .collect()
    }

    fn set_state_code(&mut self, header_byte_1: u8) {
        self.registers[STATUS_BYTE_1] = header_byte_1;
    }

    fn read_address(&mut self, addr: u8) -> u8 {
        match addr {
            FIFO_ADDRESS => self.rx_fifo.pop_front().unwrap_or(0),
            a if a == Register::LinearFifoStatus0.addr() => {
                self.rx_fifo.len().min(self.fifo_chunk_limit) as u8
            }
            a if a == Register::LinearFifoStatus1.addr() => self.tx_occupancy.min(96) as u8,
            a if a == Register::IrqStatus3.addr() => {
                self.current_irq = self.irq_script.pop_front().unwrap_or(0);
                (self.current_irq >> 24) as u8
            }
            a if a == Register::IrqStatus2.addr() => (self.current_irq >> 16) as u8,
            a if a == Register::IrqStatus1.addr() => (self.current_irq >> 8) as u8,
            a if a == Register::IrqStatus0.addr() => self.current_irq as u8,
            a => self.registers[a as usize],
        }
    }

    fn strobe(&mut self, opcode: u8) {
        if self.inert_commands {
            return;
        }
        match opcode {
            // READY, SABORT, SRES and the RX flush all land in READY
            0x62 | 0x67 | 0x70 | 0x71 => self.set_state_code(0x07),
            0x72 => {
                self.set_state_code(0x07);
                self.tx_occupancy = 0;
            }
            0x63 => self.set_state_code(0x80),
            0x64 => self.set_state_code(0x6D),
            0x65 | 0x66 => self.set_state_code(0x1F),
            0x61 => self.set_state_code(0x67),
            0x60 => {
                self.set_state_code(0xBF);
                // The modulator drains the FIFO faster than we can poll it.
                self.tx_occupancy = 0;
            }
            _ => {}
        }
    }
}

impl Transport for MockTransport {
    fn transact(&mut self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        if self.shutdown {
            return Err(TransportError::Shutdown);
        }
        self.log.push(frame.to_vec());

        let mut response = vec![
            self.registers[STATUS_BYTE_0],
            self.registers[STATUS_BYTE_1],
        ];
        match frame.first() {
            Some(0x00) => {
                let start = frame[1];
                for (n, &value) in frame[2..].iter().enumerate() {
                    if start == FIFO_ADDRESS {
                        self.tx_fifo.push(value);
                        self.tx_occupancy += 1;
                    } else {
                        self.registers[start.wrapping_add(n as u8) as usize] = value;
                    }
                    response.push(value);
                }
            }
            Some(0x01) => {
                // The final byte of a read frame is the terminator.
                for &addr in &frame[1..frame.len() - 1] {
                    let value = self.read_address(addr);
                    response.push(value);
                }
            }
            Some(0x80) => {
                self.strobe(frame[1]);
            }
            _ => {}
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_returns_status_header_then_registers() {
        let mut mock = MockTransport::new();
        mock.set_register(Register::RssiLevel, 0x42);

        let response = mock
            .transact(&[0x01, Register::RssiLevel.addr(), 0x00])
            .unwrap();
        assert_eq!(response, vec![0x52, 0x07, 0x42]);
    }

    #[test]
    fn write_echoes_values_and_updates_registers() {
        let mut mock = MockTransport::new();

        let response = mock
            .transact(&[0x00, Register::Sync4.addr(), 0xAA, 0xBB])
            .unwrap();
        assert_eq!(response, vec![0x52, 0x07, 0xAA, 0xBB]);
        assert_eq!(mock.register(Register::Sync4), 0xAA);
        assert_eq!(mock.register(Register::Sync3), 0xBB);
    }

    #[test]
    fn strobes_move_the_state_code() {
        let mut mock = MockTransport::new();
        mock.transact(&[0x80, 0x63]).unwrap();
        let response = mock.transact(&[0x01, 0xC0, 0xC1]).unwrap();
        assert_eq!(response[1], 0x80);
        assert_eq!(mock.commands(), vec![0x63]);
    }

    #[test]
    fn tx_strobe_drains_occupancy_but_keeps_the_fed_bytes() {
        let mut mock = MockTransport::new();
        mock.transact(&[0x00, FIFO_ADDRESS, 1, 2, 3]).unwrap();

        let status = Register::LinearFifoStatus1.addr();
        assert_eq!(mock.transact(&[0x01, status, 0x00]).unwrap()[2], 3);

        mock.transact(&[0x80, 0x60]).unwrap();
        assert_eq!(mock.transact(&[0x01, status, 0x00]).unwrap()[2], 0);
        assert_eq!(mock.tx_fifo(), &[1, 2, 3]);
    }

    #[test]
    fn fifo_reads_pop_scripted_bytes() {
        let mut mock = MockTransport::new();
        mock.push_rx_bytes(&[1, 2, 3]);
        mock.set_fifo_chunk_limit(2);

        let size = mock
            .transact(&[0x01, Register::LinearFifoStatus0.addr(), 0x00])
            .unwrap()[2];
        assert_eq!(size, 2);

        let response = mock
            .transact(&[0x01, FIFO_ADDRESS, FIFO_ADDRESS, FIFO_ADDRESS])
            .unwrap();
        assert_eq!(&response[2..], &[1, 2]);
    }
}
