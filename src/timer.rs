//! RX timeout and wake-up timers
//!
//! Both timers count a prescaled clock: the RX timeout runs from the
//! divided crystal, the wake-up timer from the internal RC oscillator whose
//! actual frequency depends on the crystal fitted. The millisecond helpers
//! search the neighboring counter value and pick whichever programs the
//! smaller error.

use log::debug;

use crate::device::Spirit1;
use crate::registers::Register;
use crate::transport::Transport;

/// The crystal frequency above which the timer clock is divided by two.
const DOUBLE_XTAL_THR: u32 = 30_000_000;

/// Timer configuration. The crystal frequency must match the one the radio
/// was configured with.
pub struct Timer {
    xtal: u32,
    /// Stop condition combination: true ORs the conditions, false ANDs them.
    pub or_conditions: bool,
}

impl Timer {
    pub fn new(xtal: u32) -> Self {
        Self {
            xtal,
            or_conditions: false,
        }
    }

    /// Select which quality gates stop the RX timeout timer.
    pub fn set_rx_timeout_stop_conditions<T: Transport>(
        &self,
        spirit: &mut Spirit1<T>,
        rssi: bool,
        sqi: bool,
        pqi: bool,
    ) {
        let value = ((rssi as u8) << 7) | ((sqi as u8) << 6) | ((pqi as u8) << 5);
        spirit.update_register(Register::Protocol2, 0x1F, value);
        spirit.set_register_bit(Register::PktFltOptions, 7, self.or_conditions);
    }

    /// Program the RX timeout counter directly. Zero disables the timeout.
    pub fn set_rx_timeout_counter<T: Transport>(&self, spirit: &mut Spirit1<T>, counter: u8) {
        spirit.write_registers(Register::Timers4, &[counter]);
    }

    /// Program the RX timeout prescaler directly.
    pub fn set_rx_timeout_prescaler<T: Transport>(&self, spirit: &mut Spirit1<T>, prescaler: u8) {
        spirit.write_registers(Register::Timers5, &[prescaler]);
    }

    /// The RC oscillator frequency in hertz.
    ///
    /// With a 50 MHz crystal the RC oscillator is trimmed differently
    /// depending on the peak detector setting.
    pub fn rco_frequency<T: Transport>(&self, spirit: &mut Spirit1<T>) -> u32 {
        if self.xtal == 50_000_000 {
            if spirit.register_bit(Register::Ana, 6) {
                36_100
            } else {
                33_300
            }
        } else {
            34_700
        }
    }

    /// Counter and prescaler for a wake-up interval in milliseconds.
    pub fn compute_wakeup_values<T: Transport>(
        &self,
        spirit: &mut Spirit1<T>,
        ms: u32,
    ) -> (u8, u8) {
        let rco_khz = self.rco_frequency(spirit) as f64 / 1000.0;
        Self::quantize(ms as f64 * rco_khz, rco_khz, ms as f64)
    }

    /// Counter and prescaler for an RX timeout in milliseconds.
    pub fn compute_rx_timeout_values(&self, ms: u32) -> (u8, u8) {
        let mut xtal = self.xtal;
        if xtal > DOUBLE_XTAL_THR {
            xtal >>= 1;
        }
        let ticks_per_ms = xtal as f64 / 1_210_000.0;
        Self::quantize(ms as f64 * ticks_per_ms, ticks_per_ms, ms as f64)
    }

    /// Program the RX timeout from a millisecond interval.
    pub fn set_rx_timeout_ms<T: Transport>(&self, spirit: &mut Spirit1<T>, ms: u32) {
        let (counter, prescaler) = self.compute_rx_timeout_values(ms);
        debug!("rx timeout {ms} ms -> counter {counter}, prescaler {prescaler}");
        spirit.write_registers(Register::Timers5, &[prescaler, counter]);
    }

    /// Program the LDC wake-up timer from a millisecond interval.
    pub fn set_wakeup_ms<T: Transport>(&self, spirit: &mut Spirit1<T>, ms: u32) {
        let (counter, prescaler) = self.compute_wakeup_values(spirit, ms);
        debug!("wakeup {ms} ms -> counter {counter}, prescaler {prescaler}");
        spirit.write_registers(Register::Timers3, &[prescaler, counter]);
    }

    /// Split a tick count into counter and prescaler, preferring the
    /// neighbor with the smaller millisecond error.
    fn quantize(ticks: f64, ticks_per_ms: f64, ms: f64) -> (u8, u8) {
        if ticks / 255.0 > 253.0 {
            // interval too long for the 8-bit pair, saturate
            return (0xFF, 0xFF);
        }
        let pscaler = ticks / 255.0 + 2.0;
        let mut counter = ticks / pscaler;
        let err = (counter * pscaler / ticks_per_ms - ms).abs();
        if counter <= 254.0 && ((counter + 1.0) * pscaler / ticks_per_ms - ms).abs() < err {
            counter += 1.0;
        }
        let pscaler = pscaler - 1.0;
        let counter = if counter < 1.0 { 1.0 } else { counter - 1.0 };
        (counter as u8, pscaler as u8)
    }
}
