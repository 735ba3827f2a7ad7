//! Interrupt flag handling
//!
//! The SPIRIT1 exposes 31 interrupt sources across four mask and four status
//! registers. [`IrqFlags`] models them as one 32-bit set; [`Irq`] owns the
//! host-side copy of the mask and moves it to and from the device. Status
//! reads are non-destructive on the host side but clear the latched flags in
//! the device, so callers read once per poll and dispatch on the snapshot.

use bitflags::bitflags;
use log::debug;

use crate::device::Spirit1;
use crate::registers::Register;
use crate::transport::Transport;

bitflags! {
    /// Interrupt sources, one bit per line of the four IRQ registers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IrqFlags: u32 {
        /// A complete packet sits in the RX FIFO.
        const RX_DATA_READY = 1 << 0;
        /// A packet was received but discarded by filtering.
        const RX_DATA_DISC = 1 << 1;
        /// Transmission of a packet finished.
        const TX_DATA_SENT = 1 << 2;
        /// The automatic retransmission limit was reached.
        const MAX_RE_TX_REACH = 1 << 3;
        /// A received packet failed its CRC check.
        const CRC_ERROR = 1 << 4;
        /// The TX FIFO overflowed or underflowed.
        const TX_FIFO_ERROR = 1 << 5;
        /// The RX FIFO overflowed or underflowed.
        const RX_FIFO_ERROR = 1 << 6;
        const TX_FIFO_ALMOST_FULL = 1 << 7;
        const TX_FIFO_ALMOST_EMPTY = 1 << 8;
        const RX_FIFO_ALMOST_FULL = 1 << 9;
        const RX_FIFO_ALMOST_EMPTY = 1 << 10;
        /// CSMA gave up after the maximum number of backoffs.
        const MAX_BO_CCA_REACH = 1 << 11;
        const VALID_PREAMBLE = 1 << 12;
        const VALID_SYNC = 1 << 13;
        const RSSI_ABOVE_TH = 1 << 14;
        /// Wake-up timeout in low duty cycle mode.
        const WKUP_TOUT_LDC = 1 << 15;
        /// The device entered READY.
        const READY = 1 << 16;
        /// STANDBY entry was delayed until the end of an access.
        const STANDBY_DELAYED = 1 << 17;
        const LOW_BATT_LVL = 1 << 18;
        /// Power-on reset.
        const POR = 1 << 19;
        /// Brown-out reset.
        const BOR = 1 << 20;
        /// The synthesizer locked.
        const LOCK = 1 << 21;
        const PM_COUNT_EXPIRED = 1 << 22;
        const XO_COUNT_EXPIRED = 1 << 23;
        const SYNTH_LOCK_TIMEOUT = 1 << 24;
        const SYNTH_LOCK_STARTUP = 1 << 25;
        const SYNTH_CAL_TIMEOUT = 1 << 26;
        const TX_START_TIME = 1 << 27;
        const RX_START_TIME = 1 << 28;
        /// The RX timeout timer expired with no packet.
        const RX_TIMEOUT = 1 << 29;
        /// An AES operation completed.
        const AES_END = 1 << 30;
    }
}

/// Host-side view of the device's interrupt mask.
#[derive(Debug, Default)]
pub struct Irq {
    mask: IrqFlags,
}

impl Irq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the device-side mask so no source raises the IRQ line.
    ///
    /// Run once during bring-up before individual sources are enabled.
    pub fn init<T: Transport>(&mut self, spirit: &mut Spirit1<T>) {
        self.mask = IrqFlags::empty();
        spirit.write_registers(Register::IrqMask3, &[0, 0, 0, 0]);
    }

    /// The currently configured mask.
    pub fn mask(&self) -> IrqFlags {
        self.mask
    }

    /// Replace the mask and program it into the device, MSB first.
    pub fn write_mask<T: Transport>(&mut self, spirit: &mut Spirit1<T>, mask: IrqFlags) {
        self.mask = mask;
        let bits = mask.bits();
        debug!("programming IRQ mask {:#010x}", bits);
        spirit.write_registers(
            Register::IrqMask3,
            &[
                (bits >> 24) as u8,
                (bits >> 16) as u8,
                (bits >> 8) as u8,
                bits as u8,
            ],
        );
    }

    /// Read and decode the latched interrupt status.
    ///
    /// The device clears the latched flags on read, so each call returns the
    /// events raised since the previous one.
    pub fn status<T: Transport>(&self, spirit: &mut Spirit1<T>) -> IrqFlags {
        let raw = spirit.read_registers(&[
            Register::IrqStatus3,
            Register::IrqStatus2,
            Register::IrqStatus1,
            Register::IrqStatus0,
        ]);
        if raw.len() < 4 {
            return IrqFlags::empty();
        }
        let bits = ((raw[0] as u32) << 24)
            | ((raw[1] as u32) << 16)
            | ((raw[2] as u32) << 8)
            | raw[3] as u32;
        IrqFlags::from_bits_truncate(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn init_clears_the_device_mask() {
        let mut spirit = Spirit1::new(MockTransport::new());
        let mut irq = Irq::new();
        irq.init(&mut spirit);

        let mock = spirit.release();
        assert_eq!(mock.register(Register::IrqMask3), 0);
        assert_eq!(mock.register(Register::IrqMask0), 0);
        assert_eq!(irq.mask(), IrqFlags::empty());
    }

    #[test]
    fn mask_is_written_msb_first() {
        let mut spirit = Spirit1::new(MockTransport::new());
        let mut irq = Irq::new();
        irq.write_mask(
            &mut spirit,
            IrqFlags::RX_DATA_READY | IrqFlags::RX_TIMEOUT,
        );

        let mock = spirit.release();
        // bit 29 lands in the MSB register, bit 0 in the LSB register
        assert_eq!(mock.register(Register::IrqMask3), 0x20);
        assert_eq!(mock.register(Register::IrqMask2), 0x00);
        assert_eq!(mock.register(Register::IrqMask1), 0x00);
        assert_eq!(mock.register(Register::IrqMask0), 0x01);
    }

    #[test]
    fn status_decodes_one_scripted_word_per_poll() {
        let mut mock = MockTransport::new();
        mock.push_irq_status(IrqFlags::RX_FIFO_ALMOST_FULL.bits());
        mock.push_irq_status(IrqFlags::RX_DATA_READY.bits());
        let mut spirit = Spirit1::new(mock);
        let irq = Irq::new();

        assert_eq!(irq.status(&mut spirit), IrqFlags::RX_FIFO_ALMOST_FULL);
        assert_eq!(irq.status(&mut spirit), IrqFlags::RX_DATA_READY);
        // script exhausted, nothing pending
        assert_eq!(irq.status(&mut spirit), IrqFlags::empty());
    }
}
