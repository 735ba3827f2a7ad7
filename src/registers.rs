//! SPIRIT1 register map and command strobes
//!
//! This module contains the fixed register address space of the SPIRIT1 and
//! the command strobe opcodes. Registers are always accessed by absolute
//! address, either one at a time or as a contiguous run starting at a named
//! base address, and are read/written as an ordered byte sequence.
//!
//! The linear FIFO is not part of the register file; it is accessed through
//! the dedicated port at [`FIFO_ADDRESS`].

/// Address of the linear FIFO access port.
///
/// Reading this address pops bytes from the RX FIFO; writing pushes bytes
/// into the TX FIFO.
pub const FIFO_ADDRESS: u8 = 0xFF;

/// Named registers of the SPIRIT1 address space (0x00-0xFD).
///
/// The addresses must match the hardware register map byte-for-byte; several
/// multi-byte quantities (SYNT word, sync words, IRQ mask/status, timers) are
/// laid out as descending-numbered runs of single-byte registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Ana = 0x01,
    /// Analog intermediate frequency offset
    IfOffsetAna = 0x07,
    /// PLL programmable divider, byte 3 (shares bits with the charge pump word)
    Synt3 = 0x08,
    /// PLL programmable divider, byte 2
    Synt2 = 0x09,
    /// PLL programmable divider, byte 1
    Synt1 = 0x0A,
    /// PLL programmable divider, byte 0 (low bits hold the band select code)
    Synt0 = 0x0B,
    /// Factored channel space
    ChannelSpaceFactor = 0x0C,
    /// Digital intermediate frequency offset
    IfOffsetDig = 0x0D,
    FcOffsetHi = 0x0E,
    FcOffsetLo = 0x0F,
    PaPower8 = 0x10,
    PaPower7 = 0x11,
    PaPower6 = 0x12,
    PaPower5 = 0x13,
    PaPower4 = 0x14,
    PaPower3 = 0x15,
    PaPower2 = 0x16,
    PaPower1 = 0x17,
    PaPower0 = 0x18,
    /// Datarate mantissa
    Mod1 = 0x1A,
    /// Modulation select, datarate exponent
    Mod0 = 0x1B,
    /// Frequency deviation exponent/mantissa
    Fdev0 = 0x1C,
    /// Channel filter bandwidth
    Chflt = 0x1D,
    Afc2 = 0x1E,
    Afc1 = 0x1F,
    Afc0 = 0x20,
    AgcCtrl2 = 0x24,
    AgcCtrl1 = 0x25,
    AgcCtrl0 = 0x26,
    PktCtrl4 = 0x30,
    PktCtrl3 = 0x31,
    PktCtrl2 = 0x32,
    PktCtrl1 = 0x33,
    PktLen1 = 0x34,
    PktLen0 = 0x35,
    Sync4 = 0x36,
    Sync3 = 0x37,
    Sync2 = 0x38,
    Sync1 = 0x39,
    /// SQI and PQI thresholds/enables
    Qi = 0x3A,
    RxSourceAddr = 0x4B,
    TxSourceAddr = 0x4E,
    PktFltOptions = 0x4F,
    Protocol2 = 0x50,
    Protocol1 = 0x51,
    Protocol0 = 0x52,
    Timers5 = 0x53,
    Timers4 = 0x54,
    Timers3 = 0x55,
    Timers2 = 0x56,
    Timers1 = 0x57,
    Timers0 = 0x58,
    CsmaConfig3 = 0x64,
    CsmaConfig2 = 0x65,
    CsmaConfig1 = 0x66,
    CsmaConfig0 = 0x67,
    TxCtrl3 = 0x68,
    TxCtrl2 = 0x69,
    TxCtrl1 = 0x6A,
    TxCtrl0 = 0x6B,
    ChannelNumber = 0x6C,
    /// VCO TX calibration input
    RcoVcoCalibrIn1 = 0x6E,
    /// VCO RX calibration input
    RcoVcoCalibrIn0 = 0x6F,
    IrqMask3 = 0x90,
    IrqMask2 = 0x91,
    IrqMask1 = 0x92,
    IrqMask0 = 0x93,
    /// Undocumented IQC correction
    Iqc1 = 0x99,
    /// Undocumented IQC correction
    Iqc0 = 0x9A,
    SynthConfigHi = 0x9E,
    SynthConfigLo = 0x9F,
    VcoConfig = 0xA1,
    DemConfig = 0xA3,
    PmConfig2 = 0xA4,
    PmConfig1 = 0xA5,
    PmConfig0 = 0xA6,
    XoRcoTest = 0xB4,
    LinkQualif2 = 0xC5,
    LinkQualif1 = 0xC6,
    LinkQualif0 = 0xC7,
    /// RSSI of the received packet
    RssiLevel = 0xC8,
    RxPktLenHi = 0xC9,
    RxPktLenLo = 0xCA,
    /// CRC field of the received packet, byte 2
    CrcField2 = 0xCB,
    /// CRC field of the received packet, byte 1
    CrcField1 = 0xCC,
    /// CRC field of the received packet, byte 0
    CrcField0 = 0xCD,
    RxCtrlField3 = 0xCE,
    RxCtrlField2 = 0xCF,
    RxCtrlField1 = 0xD0,
    RxCtrlField0 = 0xD1,
    /// RX source address
    RxAddress1 = 0xD2,
    /// RX destination address
    RxAddress0 = 0xD3,
    /// RCO/VCO calibration output
    RcoVcoCalibrOut0 = 0xE5,
    /// TX FIFO element count
    LinearFifoStatus1 = 0xE6,
    /// RX FIFO element count
    LinearFifoStatus0 = 0xE7,
    IrqStatus3 = 0xFA,
    IrqStatus2 = 0xFB,
    IrqStatus1 = 0xFC,
    IrqStatus0 = 0xFD,
}

impl Register {
    /// The absolute address of this register.
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// Command strobes, opcodes 0x60-0x72.
///
/// Each command is bound to exactly one target [`DeviceState`] and a set of
/// precondition states; the preconditions are documented here but not
/// enforced client-side beyond logging. Opcodes 0x6E and 0x6F are register
/// addresses (VCO calibration inputs) and are not valid commands even though
/// they fall inside the opcode range.
///
/// [`DeviceState`]: crate::status::DeviceState
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Start to transmit; valid only from READY
    Tx = 0x60,
    /// Start to receive; valid only from READY
    Rx = 0x61,
    /// Go to READY; valid only from STANDBY, SLEEP or LOCK
    Ready = 0x62,
    /// Go to STANDBY; valid only from READY
    Standby = 0x63,
    /// Go to SLEEP; valid only from READY
    Sleep = 0x64,
    /// Go to LOCK using the RX synthesizer configuration; valid only from READY
    LockRx = 0x65,
    /// Go to LOCK using the TX synthesizer configuration; valid only from READY
    LockTx = 0x66,
    /// Force exit from TX or RX and go to READY; valid only from TX or RX
    Sabort = 0x67,
    /// LDC mode: reload the LDC timer from the prescaler/counter registers
    LdcReload = 0x68,
    /// Autoretransmission: reload the packet sequence counter from PROTOCOL2
    SequenceUpdate = 0x69,
    /// AES: start the encryption routine; valid from all states
    AesEncrypt = 0x6A,
    /// AES: compute the key for decryption; valid from all states
    AesKey = 0x6B,
    /// AES: start the decryption routine using the current key; valid from all states
    AesDecrypt = 0x6C,
    /// AES: compute the key and start the decryption; valid from all states
    AesKeyDecrypt = 0x6D,
    /// Reset all of the digital part, except the SPI registers
    Reset = 0x70,
    /// Clean the RX FIFO; valid from all states
    FlushRxFifo = 0x71,
    /// Clean the TX FIFO; valid from all states
    FlushTxFifo = 0x72,
}

impl Command {
    /// The opcode byte sent on the bus.
    pub fn opcode(self) -> u8 {
        self as u8
    }
}
