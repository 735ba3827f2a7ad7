//! CSMA/CA engine configuration
//!
//! The hardware CSMA engine samples the channel before transmitting and
//! backs off a pseudo-random number of slots when it is busy. Configuration
//! is a snapshot: [`Csma::enable`] writes the whole `CSMA_CONFIG` block and
//! arms the engine, [`Csma::disable`] drops only the arm bit.

use crate::device::Spirit1;
use crate::registers::Register;
use crate::transport::Transport;

/// Channel sense period, in bit times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CcaPeriod {
    #[default]
    BitTimes64 = 0,
    BitTimes128 = 1,
    BitTimes256 = 2,
    BitTimes512 = 3,
}

impl CcaPeriod {
    /// The period for a sense time in bit times; unknown values fall back to
    /// the shortest period.
    pub fn from_bit_times(bit_times: u32) -> Self {
        match bit_times {
            128 => Self::BitTimes128,
            256 => Self::BitTimes256,
            512 => Self::BitTimes512,
            _ => Self::BitTimes64,
        }
    }
}

/// How many sense periods the channel must be observed idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CcaLength {
    #[default]
    Times0 = 0x00,
    Times1 = 0x10,
    Times2 = 0x20,
    Times3 = 0x30,
    Times4 = 0x40,
    Times5 = 0x50,
    Times6 = 0x60,
    Times7 = 0x70,
    Times8 = 0x80,
    Times9 = 0x90,
    Times10 = 0xA0,
    Times11 = 0xB0,
    Times12 = 0xC0,
    Times13 = 0xD0,
    Times14 = 0xE0,
    Times15 = 0xF0,
}

/// CSMA/CA engine parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csma {
    /// Keep retrying forever instead of giving up after `max_backoffs`.
    pub persistent: bool,
    pub cca_period: CcaPeriod,
    pub cca_length: CcaLength,
    /// Maximum number of backoff cycles, 0 to 7.
    pub max_backoffs: u8,
    /// Seed of the backoff pseudo-random generator.
    pub seed: u16,
    /// Backoff unit prescaler, 0 to 63.
    pub prescaler: u8,
}

impl Default for Csma {
    fn default() -> Self {
        Self {
            persistent: false,
            cca_period: CcaPeriod::default(),
            cca_length: CcaLength::default(),
            max_backoffs: 0,
            seed: 0xFF00,
            prescaler: 1,
        }
    }
}

impl Csma {
    /// Program the engine configuration and arm it.
    pub fn enable<T: Transport>(&self, spirit: &mut Spirit1<T>) {
        let config = [
            (self.seed >> 8) as u8,
            (self.seed & 0xFF) as u8,
            ((self.prescaler & 0x3F) << 2) | self.cca_period as u8,
            self.cca_length as u8 | (self.max_backoffs & 0x07),
        ];
        spirit.write_registers(Register::CsmaConfig3, &config);
        spirit.set_register_bit(Register::Protocol1, 2, self.persistent);
        spirit.set_register_bit(Register::Protocol1, 1, true);
    }

    /// Disarm the engine, leaving its configuration in place.
    pub fn disable<T: Transport>(&self, spirit: &mut Spirit1<T>) {
        spirit.set_register_bit(Register::Protocol1, 1, false);
    }
}
