//! SPIRIT1 register and command engine
//!
//! This module provides the low-level interface for interacting with the
//! SPIRIT1 through a [`Transport`]. It frames register reads/writes and
//! command strobes, keeps a cached copy of the status header that rides on
//! every response, and enforces completion of commanded state changes.
//!
//! # Failure policy
//! A transport fault turns every operation into a logged no-op returning an
//! empty result. This is deliberate fail-soft behavior: an intermittent bus
//! fault during a long receive session degrades to skipped iterations rather
//! than aborting the process. Callers that need confirmation inspect the
//! returned bytes or the cached [`StatusWord`].

use log::{error, warn};

use crate::registers::{Command, Register, FIFO_ADDRESS};
use crate::status::{DeviceState, StatusWord};
use crate::transport::Transport;

/// How many status refreshes a commanded state change is given to complete.
const STATE_CHANGE_POLLS: usize = 20;

/// Main device interface for the SPIRIT1 radio.
///
/// Wraps a [`Transport`] and provides register access, command strobes and
/// the named state operations. Every transaction, whatever its purpose,
/// refreshes the cached status word from the response header.
pub struct Spirit1<T> {
    transport: T,
    status: StatusWord,
}

impl<T: Transport> Spirit1<T> {
    /// Creates a new engine over the provided transport.
    ///
    /// The initial status is read immediately; if the device reports the
    /// invalid `LOCKWON` resting state it is reset on the spot.
    pub fn new(transport: T) -> Self {
        let mut device = Self {
            transport,
            status: StatusWord::default(),
        };
        device.refresh_status();
        if device.status.state == DeviceState::LockWon {
            warn!("device is resting in LOCKWON; issuing a reset");
            device.reset();
        }
        device
    }

    /// Releases the underlying transport.
    pub fn release(self) -> T {
        self.transport
    }

    /// The most recently observed status header.
    pub fn status(&self) -> &StatusWord {
        &self.status
    }

    /// Re-read the status header without touching any other register.
    pub fn refresh_status(&mut self) {
        self.xfer(&[0x01, 0xC0, 0xC1]);
    }

    /// Read the named registers, one byte each, in request order.
    pub fn read_registers(&mut self, registers: &[Register]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(registers.len() + 2);
        frame.push(0x01);
        frame.extend(registers.iter().map(|r| r.addr()));
        frame.push(0x00);
        self.xfer(&frame)
    }

    /// Read a single register, or zero on a fail-soft empty response.
    pub fn read_register(&mut self, register: Register) -> u8 {
        self.read_registers(&[register])
            .first()
            .copied()
            .unwrap_or(0)
    }

    /// Write a contiguous run of values starting at `start`.
    ///
    /// Returns the echoed bytes, for callers that want read-after-write
    /// confirmation.
    pub fn write_registers(&mut self, start: Register, values: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(values.len() + 2);
        frame.push(0x00);
        frame.push(start.addr());
        frame.extend_from_slice(values);
        self.xfer(&frame)
    }

    /// Strobe a command.
    pub fn send_command(&mut self, command: Command) {
        self.command_raw(command.opcode());
    }

    /// Strobe a raw opcode, validating it against the legal command set.
    ///
    /// Opcodes outside 0x60-0x72, and the two register addresses 0x6E/0x6F
    /// inside that range, are rejected with a logged error and **no** bus
    /// transaction.
    pub fn command_raw(&mut self, opcode: u8) {
        if !(0x60..=0x72).contains(&opcode) || opcode == 0x6E || opcode == 0x6F {
            error!(
                "invalid command {opcode:#04x}: must be between 0x60 and 0x72, but not 0x6E or 0x6F"
            );
            return;
        }
        self.xfer(&[0x80, opcode]);
    }

    /// Read a single bit of a register.
    pub fn register_bit(&mut self, register: Register, bit: u8) -> bool {
        self.read_register(register) & (1 << bit) != 0
    }

    /// Read-modify-write a single bit of a register.
    pub fn set_register_bit(&mut self, register: Register, bit: u8, on: bool) {
        let mut value = self.read_register(register) & !(1 << bit);
        if on {
            value |= 1 << bit;
        }
        self.write_registers(register, &[value]);
    }

    /// The generic register patch primitive: `value = (old & mask) + add`.
    pub fn update_register(&mut self, register: Register, mask: u8, add: u8) {
        let value = (self.read_register(register) & mask).wrapping_add(add);
        self.write_registers(register, &[value]);
    }

    /// Issue `command` and poll the status header until the device reports
    /// `target`, allowing chip-internal latency for the transition.
    ///
    /// Returns `false` (with a logged error naming both states) if the target
    /// state is not reached within the polling budget.
    pub fn change_state(&mut self, command: Command, target: DeviceState) -> bool {
        self.send_command(command);
        let mut polls = 0;
        while self.status.state != target {
            polls += 1;
            self.refresh_status();
            if polls >= STATE_CHANGE_POLLS {
                error!(
                    "unable to change state: wanted {:?} but device reports {:?}",
                    target, self.status.state
                );
                return false;
            }
        }
        true
    }

    pub fn reset(&mut self) -> bool {
        self.change_state(Command::Reset, DeviceState::Ready)
    }

    pub fn ready(&mut self) -> bool {
        self.change_state(Command::Ready, DeviceState::Ready)
    }

    pub fn standby(&mut self) -> bool {
        self.change_state(Command::Standby, DeviceState::Standby)
    }

    pub fn sleep(&mut self) -> bool {
        self.change_state(Command::Sleep, DeviceState::Sleep)
    }

    pub fn lock_tx(&mut self) -> bool {
        self.change_state(Command::LockTx, DeviceState::Lock)
    }

    pub fn lock_rx(&mut self) -> bool {
        self.change_state(Command::LockRx, DeviceState::Lock)
    }

    pub fn start_rx(&mut self) -> bool {
        self.change_state(Command::Rx, DeviceState::Rx)
    }

    pub fn start_tx(&mut self) -> bool {
        self.change_state(Command::Tx, DeviceState::Tx)
    }

    pub fn sabort(&mut self) -> bool {
        self.change_state(Command::Sabort, DeviceState::Ready)
    }

    pub fn flush_rx_fifo(&mut self) -> bool {
        self.change_state(Command::FlushRxFifo, DeviceState::Ready)
    }

    pub fn flush_tx_fifo(&mut self) -> bool {
        self.change_state(Command::FlushTxFifo, DeviceState::Ready)
    }

    /// Pop `count` bytes from the linear RX FIFO.
    pub fn read_linear_fifo(&mut self, count: usize) -> Vec<u8> {
        if count == 0 {
            warn!("read_linear_fifo() for 0 bytes?");
            return Vec::new();
        }
        let mut frame = vec![0x01, FIFO_ADDRESS];
        frame.extend(std::iter::repeat(FIFO_ADDRESS).take(count));
        self.xfer(&frame)
    }

    /// Push bytes into the linear TX FIFO.
    pub fn write_linear_fifo(&mut self, data: &[u8]) -> Vec<u8> {
        let mut frame = vec![0x00, FIFO_ADDRESS];
        frame.extend_from_slice(data);
        self.xfer(&frame)
    }

    /// Bytes currently waiting in the RX FIFO.
    pub fn rx_fifo_available(&mut self) -> usize {
        (self.read_register(Register::LinearFifoStatus0) & 0x7F) as usize
    }

    /// Bytes still queued in the TX FIFO.
    pub fn tx_fifo_used(&mut self) -> usize {
        (self.read_register(Register::LinearFifoStatus1) & 0x7F) as usize
    }

    /// Run one bus transaction, refresh the cached status from the response
    /// header and strip it from the returned payload.
    fn xfer(&mut self, frame: &[u8]) -> Vec<u8> {
        match self.transport.transact(frame) {
            Ok(response) => {
                self.status.update(&response);
                if response.len() > 2 {
                    response[2..].to_vec()
                } else {
                    Vec::new()
                }
            }
            Err(e) => {
                warn!("bus transaction dropped: {e}");
                Vec::new()
            }
        }
    }
}
