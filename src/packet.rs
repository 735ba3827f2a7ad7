//! Basic packet format
//!
//! Configuration of the hardware packet handler and host-side framing for
//! the basic packet format: preamble, up to four sync words, an optional
//! address byte, up to four control bytes, the payload and an optional CRC.
//!
//! The address and control fields never pass through the FIFOs. On transmit
//! they are inserted from the `TX_SOURCE_ADDR` and `TX_CTRL` registers; on
//! receive they are delivered at the front of the FIFO image while the CRC
//! is captured in the `CRC_FIELD` registers. [`PacketConfig::deframe`] takes
//! that combined image apart.

use log::warn;

use crate::device::Spirit1;
use crate::error::Error;
use crate::registers::Register;
use crate::transport::Transport;

const TX_CTRL: [Register; 4] = [
    Register::TxCtrl3,
    Register::TxCtrl2,
    Register::TxCtrl1,
    Register::TxCtrl0,
];

const RX_CTRL: [Register; 4] = [
    Register::RxCtrlField3,
    Register::RxCtrlField2,
    Register::RxCtrlField1,
    Register::RxCtrlField0,
];

const CRC_FIELD: [Register; 3] = [
    Register::CrcField2,
    Register::CrcField1,
    Register::CrcField0,
];

/// CRC polynomial selection of the packet handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CrcMode {
    Off = 0,
    /// 7-bit polynomial 0x07
    Crc7 = 1,
    /// 16-bit polynomial 0x8005
    Crc8005 = 2,
    /// 16-bit polynomial 0x1021
    Crc1021 = 3,
    /// 24-bit polynomial 0x864CFB
    Crc24 = 4,
}

impl CrcMode {
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// On-air length of the CRC field in bytes.
    pub fn length(&self) -> usize {
        match self {
            Self::Off => 0,
            Self::Crc7 => 1,
            Self::Crc8005 | Self::Crc1021 => 2,
            Self::Crc24 => 3,
        }
    }
}

/// A payload with its link-quality metrics, as drained from the RX FIFO.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceivedFrame {
    pub payload: Vec<u8>,
    pub rssi: u8,
    pub sqi: u8,
    pub pqi: u8,
    pub agc: u8,
}

/// A received frame taken apart into its packet fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramedMessage {
    pub address: Option<u8>,
    pub control: Vec<u8>,
    pub crc: Vec<u8>,
    pub frame: ReceivedFrame,
}

/// Basic packet format configuration.
///
/// The sync length is implied by `sync_words`, most significant word first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketConfig {
    pub preamble_length: u8,
    pub sync_words: Vec<u8>,
    pub fixed_length: bool,
    pub fixed_packet_length: u16,
    pub crc_mode: CrcMode,
    pub control_length: u8,
    pub address_field: bool,
    pub fec: bool,
    pub data_whitening: bool,
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            preamble_length: 1,
            sync_words: vec![0x01],
            fixed_length: false,
            fixed_packet_length: 0,
            crc_mode: CrcMode::Off,
            control_length: 0,
            address_field: false,
            fec: false,
            data_whitening: false,
        }
    }
}

impl PacketConfig {
    /// Check the configuration without touching the device.
    pub fn validate(&self) -> Result<(), Error> {
        // 32 would truncate to a zero preamble field in PKTCTRL2
        if !(1..=31).contains(&self.preamble_length) {
            return Err(Error::ConfigurationInvalid(
                "preamble length must be between 1 and 31 bytes",
            ));
        }
        if self.sync_words.is_empty() || self.sync_words.len() > 4 {
            return Err(Error::ConfigurationInvalid(
                "between 1 and 4 sync words are required",
            ));
        }
        if self.control_length > 4 {
            return Err(Error::ConfigurationInvalid(
                "control field is at most 4 bytes",
            ));
        }
        if self.fixed_length && self.fixed_packet_length == 0 {
            return Err(Error::ConfigurationInvalid(
                "fixed length packets need a nonzero length",
            ));
        }
        Ok(())
    }

    /// Program the packet handler.
    ///
    /// Enables automatic packet filtering, disables source and control
    /// filtering, enables CRC rejection when a CRC mode is selected and
    /// packs the four `PKTCTRL` registers and the sync words.
    pub fn init<T: Transport>(&self, spirit: &mut Spirit1<T>) -> Result<(), Error> {
        self.validate()?;

        spirit.set_register_bit(Register::Protocol1, 0, true);

        let mut fltopts = spirit.read_register(Register::PktFltOptions) & 0xCE;
        if self.crc_mode != CrcMode::Off {
            fltopts |= 0x01;
        }
        spirit.write_registers(Register::PktFltOptions, &[fltopts]);

        let pktctrl = [
            ((self.address_field as u8) << 3) | self.control_length,
            length_field_width(self.fixed_packet_length),
            (self.preamble_length << 3)
                | (((self.sync_words.len() - 1) as u8) << 1)
                | u8::from(!self.fixed_length),
            (self.crc_mode.value() << 5) | ((self.data_whitening as u8) << 4) | self.fec as u8,
        ];
        spirit.write_registers(Register::PktCtrl4, &pktctrl);

        let mut sync: Vec<u8> = self.sync_words.clone();
        sync.reverse();
        spirit.write_registers(Register::Sync4, &sync);

        Ok(())
    }

    /// Reprogram the length-field width for a new maximum packet length.
    pub fn set_packet_length<T: Transport>(&self, spirit: &mut Spirit1<T>, length: u16) {
        spirit.update_register(Register::PktCtrl3, 0xF0, length_field_width(length));
    }

    /// Bytes in front of the payload in the RX FIFO image.
    pub fn header_length(&self) -> usize {
        usize::from(self.address_field) + self.control_length as usize
    }

    /// Build the FIFO image of an outgoing frame: address, control, payload.
    ///
    /// The CRC is not part of the image; the packet handler computes it on
    /// air.
    pub fn frame(
        &self,
        address: Option<u8>,
        control: &[u8],
        payload: &[u8],
    ) -> Result<Vec<u8>, Error> {
        if self.address_field && address.is_none() {
            return Err(Error::MissingRequiredField("address"));
        }
        if control.len() != self.control_length as usize {
            return Err(Error::ConfigurationInvalid(
                "control field does not match the configured length",
            ));
        }
        let mut image = Vec::with_capacity(self.header_length() + payload.len());
        if self.address_field {
            image.push(address.unwrap_or(0));
        }
        image.extend_from_slice(control);
        image.extend_from_slice(payload);
        Ok(image)
    }

    /// Take a received frame apart into its packet fields.
    ///
    /// The frame payload is expected to be the drained FIFO image with the
    /// captured CRC bytes appended.
    pub fn deframe(&self, frame: ReceivedFrame) -> Result<FramedMessage, Error> {
        let needed = self.header_length() + self.crc_mode.length();
        if frame.payload.len() < needed {
            return Err(Error::FrameTooShort {
                needed,
                got: frame.payload.len(),
            });
        }
        let mut bytes = frame.payload;
        let crc = bytes.split_off(bytes.len() - self.crc_mode.length());
        let address = if self.address_field {
            Some(bytes.remove(0))
        } else {
            None
        };
        let control: Vec<u8> = bytes.drain(..self.control_length as usize).collect();
        Ok(FramedMessage {
            address,
            control,
            crc,
            frame: ReceivedFrame {
                payload: bytes,
                ..frame
            },
        })
    }

    /// Program the source address inserted into transmitted packets.
    pub fn write_tx_source_address<T: Transport>(&self, spirit: &mut Spirit1<T>, address: u8) {
        spirit.write_registers(Register::TxSourceAddr, &[address]);
    }

    /// Program the control bytes inserted into transmitted packets.
    pub fn write_tx_control<T: Transport>(
        &self,
        spirit: &mut Spirit1<T>,
        control: &[u8],
    ) -> Result<(), Error> {
        if control.len() != self.control_length as usize {
            return Err(Error::ConfigurationInvalid(
                "control field does not match the configured length",
            ));
        }
        if !control.is_empty() {
            spirit.write_registers(TX_CTRL[TX_CTRL.len() - control.len()], control);
        }
        Ok(())
    }

    /// The control bytes of the last received packet.
    pub fn read_rx_control<T: Transport>(&self, spirit: &mut Spirit1<T>) -> Vec<u8> {
        if self.control_length == 0 {
            return Vec::new();
        }
        let run = &RX_CTRL[RX_CTRL.len() - self.control_length as usize..];
        spirit.read_registers(run)
    }

    /// The captured CRC field of the last received packet.
    pub fn read_rx_crc<T: Transport>(&self, spirit: &mut Spirit1<T>) -> Vec<u8> {
        let length = self.crc_mode.length();
        if length == 0 {
            return Vec::new();
        }
        spirit.read_registers(&CRC_FIELD[CRC_FIELD.len() - length..])
    }

    /// The destination address of the last received packet.
    pub fn read_rx_destination_address<T: Transport>(&self, spirit: &mut Spirit1<T>) -> u8 {
        spirit.read_register(Register::RxAddress0)
    }

    /// Length of the payload of the last received packet.
    ///
    /// The hardware counter includes the address and control fields; they
    /// are subtracted here.
    pub fn received_packet_length<T: Transport>(&self, spirit: &mut Spirit1<T>) -> usize {
        let raw = spirit.read_registers(&[Register::RxPktLenHi, Register::RxPktLenLo]);
        if raw.len() < 2 {
            warn!("received packet length unavailable");
            return 0;
        }
        let total = ((raw[0] as usize) << 8) + raw[1] as usize;
        total.saturating_sub(self.header_length())
    }

    /// Render the packet handler configuration as read back from the device.
    pub fn describe<T: Transport>(&self, spirit: &mut Spirit1<T>) -> String {
        let pktctrl = spirit.read_registers(&[
            Register::PktCtrl4,
            Register::PktCtrl3,
            Register::PktCtrl2,
            Register::PktCtrl1,
        ]);
        let sync = spirit.read_registers(&[
            Register::Sync4,
            Register::Sync3,
            Register::Sync2,
            Register::Sync1,
        ]);
        let fltopts = spirit.read_register(Register::PktFltOptions);
        if pktctrl.len() < 4 || sync.len() < 4 {
            return String::from("packet settings unavailable");
        }

        let mut out = String::from("Basic Packet Settings:\n");
        for (n, value) in pktctrl.iter().enumerate() {
            out += &format!("  PKTCTRL{}: {:#04x} {:08b}\n", 4 - n, value, value);
        }
        out += &format!("  address field:   {}\n", pktctrl[0] >> 3 & 0x01);
        out += &format!("  control length:  {} bytes\n", pktctrl[0] & 0x07);
        out += &format!(
            "  packet length:   {} bits (max {} bytes)\n",
            (pktctrl[1] & 0x0F) + 1,
            1u32 << ((pktctrl[1] & 0x0F) + 1)
        );
        out += &format!("  preamble length: {} bytes\n", pktctrl[2] >> 3);
        out += &format!("  sync words:      {}\n", ((pktctrl[2] >> 1) & 0x03) + 1);
        out += &format!("  CRC mode:        {}\n", pktctrl[3] >> 5);
        out += if pktctrl[2] & 0x01 == 0 {
            "  fixed length packets\n"
        } else {
            "  variable length packets\n"
        };
        if pktctrl[3] & 0x10 != 0 {
            out += "  data whitening enabled\n";
        }
        if pktctrl[3] & 0x01 != 0 {
            out += "  FEC enabled\n";
        }
        out += &format!(
            "  sync: {:#04x} {:#04x} {:#04x} {:#04x}\n",
            sync[3], sync[2], sync[1], sync[0]
        );
        out += &format!("  CRC validation:  {}\n", fltopts & 0x01 != 0);
        out
    }
}

/// Width of the length field, encoded as bits-minus-one.
///
/// A zero maximum length degenerates to the widest field, matching the
/// hardware default.
fn length_field_width(length: u16) -> u8 {
    if length == 0 {
        0x0F
    } else {
        ((15 - length.leading_zeros()) as u8) & 0x0F
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn example_config() -> PacketConfig {
        PacketConfig {
            preamble_length: 5,
            sync_words: vec![0x5A, 0x47, 0x52, 0x50],
            fixed_length: false,
            fixed_packet_length: 100,
            crc_mode: CrcMode::Crc1021,
            control_length: 2,
            address_field: true,
            fec: false,
            data_whitening: true,
        }
    }

    #[test]
    fn init_packs_the_control_registers() {
        let mut mock = MockTransport::new();
        mock.set_register(Register::PktFltOptions, 0xFF);
        let mut spirit = Spirit1::new(mock);
        example_config().init(&mut spirit).unwrap();

        let mock = spirit.release();
        assert_eq!(mock.register(Register::PktCtrl4), 0x0A);
        assert_eq!(mock.register(Register::PktCtrl3), 0x06);
        assert_eq!(mock.register(Register::PktCtrl2), 0x2F);
        assert_eq!(mock.register(Register::PktCtrl1), 0x70);
        // sync words land reversed, SYNC4 holds the last configured word
        assert_eq!(mock.register(Register::Sync4), 0x50);
        assert_eq!(mock.register(Register::Sync1), 0x5A);
        // source/control filtering cleared, CRC rejection enabled
        assert_eq!(mock.register(Register::PktFltOptions), 0xCF);
        assert_ne!(mock.register(Register::Protocol1) & 0x01, 0);
    }

    #[test]
    fn validation_rejects_malformed_configurations() {
        let mut config = example_config();
        config.preamble_length = 0;
        assert!(config.validate().is_err());

        config = example_config();
        config.preamble_length = 32;
        assert!(config.validate().is_err());

        config = example_config();
        config.sync_words.clear();
        assert!(config.validate().is_err());

        config = example_config();
        config.fixed_length = true;
        config.fixed_packet_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn frame_and_deframe_round_trip() {
        let config = example_config();
        let mut image = config
            .frame(Some(0x42), &[0x10, 0x20], &[1, 2, 3, 4, 5])
            .unwrap();
        assert_eq!(image, vec![0x42, 0x10, 0x20, 1, 2, 3, 4, 5]);

        // the captured CRC rides behind the FIFO image
        image.extend_from_slice(&[0xAB, 0xCD]);
        let message = config
            .deframe(ReceivedFrame {
                payload: image,
                rssi: 0x90,
                sqi: 60,
                pqi: 200,
                agc: 3,
            })
            .unwrap();

        assert_eq!(message.address, Some(0x42));
        assert_eq!(message.control, vec![0x10, 0x20]);
        assert_eq!(message.crc, vec![0xAB, 0xCD]);
        assert_eq!(message.frame.payload, vec![1, 2, 3, 4, 5]);
        assert_eq!(message.frame.rssi, 0x90);
    }

    #[test]
    fn deframe_rejects_truncated_frames() {
        let config = example_config();
        let result = config.deframe(ReceivedFrame {
            payload: vec![0x42, 0x10],
            rssi: 0,
            sqi: 0,
            pqi: 0,
            agc: 0,
        });
        assert_eq!(result, Err(Error::FrameTooShort { needed: 5, got: 2 }));
    }

    #[test]
    fn frame_requires_the_configured_fields() {
        let config = example_config();
        assert_eq!(
            config.frame(None, &[0, 0], &[1]),
            Err(Error::MissingRequiredField("address"))
        );
        assert!(config.frame(Some(1), &[0], &[1]).is_err());
    }

    #[test]
    fn field_runs_use_the_tail_registers() {
        let mut mock = MockTransport::new();
        mock.set_register(Register::RxCtrlField1, 0xD0);
        mock.set_register(Register::RxCtrlField0, 0xD1);
        mock.set_register(Register::CrcField1, 0xAA);
        mock.set_register(Register::CrcField0, 0xBB);
        let mut spirit = Spirit1::new(mock);

        let config = example_config();
        assert_eq!(config.read_rx_control(&mut spirit), vec![0xD0, 0xD1]);
        assert_eq!(config.read_rx_crc(&mut spirit), vec![0xAA, 0xBB]);

        config.write_tx_control(&mut spirit, &[9, 8]).unwrap();
        config.write_tx_source_address(&mut spirit, 0x21);

        let mock = spirit.release();
        assert_eq!(mock.register(Register::TxCtrl1), 9);
        assert_eq!(mock.register(Register::TxCtrl0), 8);
        assert_eq!(mock.register(Register::TxSourceAddr), 0x21);
    }

    #[test]
    fn received_length_subtracts_the_header_fields() {
        let mut mock = MockTransport::new();
        mock.set_register(Register::RxPktLenHi, 0);
        mock.set_register(Register::RxPktLenLo, 40);
        let mut spirit = Spirit1::new(mock);

        // one address byte and two control bytes ride ahead of the payload
        assert_eq!(example_config().received_packet_length(&mut spirit), 37);
    }

    #[test]
    fn describe_reports_the_programmed_settings() {
        let mut spirit = Spirit1::new(MockTransport::new());
        let config = example_config();
        config.init(&mut spirit).unwrap();

        let text = config.describe(&mut spirit);
        assert!(text.contains("preamble length: 5 bytes"));
        assert!(text.contains("variable length packets"));
        assert!(text.contains("data whitening enabled"));
    }
}
