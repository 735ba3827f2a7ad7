//! Link quality indicators
//!
//! Thresholds and readbacks for the three receive quality estimators: SQI
//! (sync word correlation), PQI (preamble correlation) and the AGC word.
//! The estimators gate packet acceptance once enabled; their measured values
//! for the last packet are latched in the `LINK_QUALIF` registers.

use log::warn;

use crate::device::Spirit1;
use crate::registers::Register;
use crate::transport::Transport;

/// Quality indicator configuration and readback.
#[derive(Debug, Default)]
pub struct Qi;

impl Qi {
    pub fn new() -> Self {
        Self
    }

    /// Set the sync quality threshold, 0 to 3. A zero threshold accepts any
    /// packet with a perfect sync match.
    pub fn set_sqi_threshold<T: Transport>(&self, spirit: &mut Spirit1<T>, threshold: u8) {
        if threshold > 3 {
            warn!("SQI threshold must be between 0 and 3, not {threshold}");
            return;
        }
        spirit.update_register(Register::Qi, 0x3F, threshold << 6);
    }

    pub fn sqi_threshold<T: Transport>(&self, spirit: &mut Spirit1<T>) -> u8 {
        (spirit.read_register(Register::Qi) >> 6) & 0x03
    }

    pub fn enable_sqi<T: Transport>(&self, spirit: &mut Spirit1<T>, on: bool) {
        spirit.set_register_bit(Register::Qi, 1, on);
    }

    /// The sync quality of the last received packet.
    pub fn sqi_value<T: Transport>(&self, spirit: &mut Spirit1<T>) -> u8 {
        spirit.read_register(Register::LinkQualif1) & 0x7F
    }

    /// Set the preamble quality threshold, 0 to 15, in units of 4 correlated
    /// bits.
    pub fn set_pqi_threshold<T: Transport>(&self, spirit: &mut Spirit1<T>, threshold: u8) {
        if threshold > 15 {
            warn!("PQI threshold must be between 0 and 15, not {threshold}");
            return;
        }
        spirit.update_register(Register::Qi, 0xC3, threshold << 2);
    }

    pub fn pqi_threshold<T: Transport>(&self, spirit: &mut Spirit1<T>) -> u8 {
        (spirit.read_register(Register::Qi) >> 2) & 0x0F
    }

    pub fn enable_pqi<T: Transport>(&self, spirit: &mut Spirit1<T>, on: bool) {
        spirit.set_register_bit(Register::Qi, 0, on);
    }

    /// The preamble quality of the last received packet.
    pub fn pqi_value<T: Transport>(&self, spirit: &mut Spirit1<T>) -> u8 {
        spirit.read_register(Register::LinkQualif2)
    }

    /// Freeze or run the AGC loop.
    pub fn enable_agc<T: Transport>(&self, spirit: &mut Spirit1<T>, on: bool) {
        spirit.set_register_bit(Register::AgcCtrl0, 7, on);
    }

    /// The AGC attenuation word latched for the last received packet.
    pub fn agc_value<T: Transport>(&self, spirit: &mut Spirit1<T>) -> u8 {
        spirit.read_register(Register::LinkQualif0) & 0x0F
    }

    /// The RSSI latched for the last received packet, raw register units.
    pub fn rssi_value<T: Transport>(&self, spirit: &mut Spirit1<T>) -> u8 {
        spirit.read_register(Register::RssiLevel)
    }
}
