//! Frequency synthesis math
//!
//! Pure arithmetic shared by the radio configuration layer: band
//! classification, synthesizer word computation and its inverse, `SYNT`
//! register packing, VCO selection, charge pump current selection and the
//! output power mapping. Nothing in here touches the bus.
//!
//! The synthesizer frequency is programmed as a 26-bit word:
//!
//! ```text
//! synth_word = f_base * half_band_factor * 2^18 * div / f_xtal
//! ```
//!
//! where `div` is 2 when the reference divider is enabled and
//! `half_band_factor` depends on the operating band. The word is spread over
//! the four `SYNT` registers together with the charge pump setting and the
//! band code.

/// `2^18`, the fixed divider of the synthesizer equation.
const FBASE_DIVIDER: f64 = 262_144.0;

/// VCO frequencies in MHz the charge pump current is calibrated against.
const VCO_FREQ_TABLE: [f64; 16] = [
    4644.0, 4708.0, 4772.0, 4836.0, 4902.0, 4966.0, 5030.0, 5095.0, 5161.0, 5232.0, 5303.0,
    5375.0, 5448.0, 5519.0, 5592.0, 5663.0,
];

/// The four operating bands of the synthesizer.
///
/// Each band has its own divider chain (the band factor), its own code in
/// the `SYNT0` register and its own VCO crossover point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrequencyBand {
    High,
    Middle,
    Low,
    VeryLow,
}

impl FrequencyBand {
    /// Divider factor of the band's synthesizer chain.
    pub fn factor(&self) -> u32 {
        match self {
            Self::High => 6,
            Self::Middle => 12,
            Self::Low => 16,
            Self::VeryLow => 32,
        }
    }

    /// Half the band factor, as used by the synthesizer equation.
    pub fn half_factor(&self) -> u32 {
        self.factor() / 2
    }

    /// Band selection code programmed into `SYNT0`.
    pub fn code(&self) -> u8 {
        match self {
            Self::High => 1,
            Self::Middle => 3,
            Self::Low => 4,
            Self::VeryLow => 5,
        }
    }

    /// Decode a band selection code read back from `SYNT0`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::High),
            3 => Some(Self::Middle),
            4 => Some(Self::Low),
            5 => Some(Self::VeryLow),
            _ => None,
        }
    }

    /// Frequency below which the low VCO is selected in this band.
    fn vco_threshold(&self) -> f64 {
        match self {
            Self::High => 860_166_667.0,
            Self::Middle => 430_083_334.0,
            Self::Low => 322_562_500.0,
            Self::VeryLow => 161_281_250.0,
        }
    }

    fn range(&self) -> (f64, f64) {
        match self {
            Self::High => (778.0e6, 957.1e6),
            Self::Middle => (386.0e6, 471.1e6),
            Self::Low => (299.0e6, 349.1e6),
            Self::VeryLow => (149.0e6, 175.1e6),
        }
    }
}

/// Which of the two on-chip VCOs covers a carrier frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VcoSetting {
    Low,
    High,
}

impl VcoSetting {
    /// Selection bits for the `SYNTH_CONFIG` high register.
    pub fn value(&self) -> u8 {
        match self {
            Self::Low => 0x02,
            Self::High => 0x04,
        }
    }
}

/// A carrier frequency and the synthesis math hanging off it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frequency {
    hz: f64,
}

impl Frequency {
    pub fn from_hz(hz: f64) -> Self {
        Self { hz }
    }

    pub fn from_mhz(mhz: f64) -> Self {
        Self { hz: mhz * 1e6 }
    }

    pub fn hz(&self) -> f64 {
        self.hz
    }

    /// This frequency shifted by `delta_hz`.
    pub fn offset(&self, delta_hz: f64) -> Self {
        Self {
            hz: self.hz + delta_hz,
        }
    }

    /// The band this frequency falls into.
    ///
    /// Frequencies outside every band classify as [`FrequencyBand::High`];
    /// configuration paths guard against that with [`Frequency::is_possible`]
    /// before any register is written.
    pub fn band(&self) -> FrequencyBand {
        for band in [
            FrequencyBand::VeryLow,
            FrequencyBand::Low,
            FrequencyBand::Middle,
            FrequencyBand::High,
        ] {
            let (lo, hi) = band.range();
            if self.hz >= lo && self.hz <= hi {
                return band;
            }
        }
        FrequencyBand::High
    }

    /// Whether the frequency lies inside one of the operating bands.
    pub fn is_possible(&self) -> bool {
        let (lo, hi) = self.band().range();
        self.hz >= lo && self.hz <= hi
    }

    /// VCO selection for this carrier.
    pub fn vco(&self) -> VcoSetting {
        if self.hz < self.band().vco_threshold() {
            VcoSetting::Low
        } else {
            VcoSetting::High
        }
    }

    /// The 26-bit synthesizer word for this carrier.
    pub fn synth_word(&self, xtal: u32, ref_divider: bool) -> u32 {
        let div = if ref_divider { 2.0 } else { 1.0 };
        let half = self.band().half_factor() as f64;
        (self.hz * half * (FBASE_DIVIDER * div / xtal as f64)) as u32
    }

    /// The carrier a synthesizer word programs, rounded to the nearest hertz.
    pub fn from_synth_word(
        word: u32,
        band: FrequencyBand,
        xtal: u32,
        ref_divider: bool,
    ) -> Self {
        let div = if ref_divider { 2.0 } else { 1.0 };
        let half = band.half_factor() as f64;
        Self {
            hz: (word as f64 * xtal as f64 / (FBASE_DIVIDER * div * half)).round(),
        }
    }

    /// Charge pump current setting for this carrier.
    ///
    /// The VCO runs at `carrier * band_factor`; the current is picked from a
    /// calibration table by nearest VCO frequency.
    pub fn charge_pump_word(&self) -> u8 {
        let vcofreq = (self.hz / 1e6) * self.band().factor() as f64;
        let mut i = if vcofreq >= VCO_FREQ_TABLE[15] {
            15
        } else {
            VCO_FREQ_TABLE
                .iter()
                .position(|&entry| vcofreq < entry)
                .unwrap_or(15)
        };
        if i != 0 && VCO_FREQ_TABLE[i] - vcofreq > vcofreq - VCO_FREQ_TABLE[i - 1] {
            i -= 1;
        }
        (i % 8) as u8
    }

    /// The four `SYNT` register values for this carrier.
    ///
    /// The charge pump setting rides in the top bits of `SYNT3` and the band
    /// code in the low bits of `SYNT0`.
    pub fn synt_registers(&self, xtal: u32, ref_divider: bool) -> [u8; 4] {
        let word = self.synth_word(xtal, ref_divider);
        let wcp = self.charge_pump_word();
        [
            (wcp << 5) | ((word >> 21) & 0x1F) as u8,
            ((word >> 13) & 0xFF) as u8,
            ((word >> 5) & 0xFF) as u8,
            (((word & 0x1F) << 3) as u8) | self.band().code(),
        ]
    }

    /// Reconstruct the programmed carrier from the `SYNT` registers.
    ///
    /// Returns `None` when the band code is not one of the four defined
    /// bands.
    pub fn from_synt_registers(regs: [u8; 4], xtal: u32, ref_divider: bool) -> Option<Self> {
        let band = FrequencyBand::from_code(regs[3] & 0x07)?;
        let word = (((regs[0] & 0x1F) as u32) << 21)
            | ((regs[1] as u32) << 13)
            | ((regs[2] as u32) << 5)
            | ((regs[3] >> 3) as u32);
        Some(Self::from_synth_word(word, band, xtal, ref_divider))
    }

    /// Linear coefficients of the output power mapping for this carrier.
    ///
    /// Six values per band: slope and intercept for the high, mid and low
    /// segments of the piecewise fit.
    fn power_factors(&self) -> [f64; 6] {
        match self.band() {
            FrequencyBand::High => {
                if self.hz < 900.0e6 {
                    [-2.04, 23.45, -2.04, 23.45, -1.95, 27.66]
                } else {
                    [-2.11, 25.66, -2.11, 25.66, -2.00, 31.28]
                }
            }
            FrequencyBand::Middle => [-3.48, 38.45, -1.89, 27.66, -1.92, 30.23],
            FrequencyBand::Low => [-3.27, 35.43, -1.80, 26.31, -1.89, 29.61],
            FrequencyBand::VeryLow => [-4.18, 50.66, -1.80, 30.04, -1.86, 32.22],
        }
    }

    /// Map a requested output power in dBm to a `PA_POWER` register value.
    ///
    /// Piecewise linear fit per band, clamped to the valid register range of
    /// 1 to 90.
    pub fn power_register_from_dbm(&self, dbm: f64) -> u8 {
        let f = self.power_factors();
        let raw = if dbm > 0.0 && 13.0 / f[2] - f[3] / f[2] < dbm {
            f[0] * dbm + f[1]
        } else if dbm <= 0.0 && 40.0 / f[2] - f[3] / f[2] > dbm {
            f[4] * dbm + f[5]
        } else {
            f[2] * dbm + f[3]
        };
        (raw.round() as i32).clamp(1, 90) as u8
    }
}
