//! SPIRIT1 Radio Driver
//!
//! This crate provides a driver for the STMicroelectronics SPIRIT1 sub-GHz
//! radio transceiver. The SPIRIT1 is a low data rate transceiver for the
//! 169/315/433/868/915 MHz ISM bands with an on-chip packet handler, linear
//! FIFOs and a flexible interrupt system.
//!
//! # Features
//! - Frequency bands: 149-175, 299-349, 386-471 and 778-957 MHz
//! - Modulation support: 2-FSK, GFSK (BT 0.5/1), MSK, ASK/OOK
//! - Data rates from 0.1 to 510 kbps with automatic quantization
//! - Basic packet format: preamble, sync, address, control, CRC, FEC and
//!   data whitening
//! - Blocking receive sessions with FIFO watermark draining and RX timeout
//! - Hardware CSMA/CA, link quality gating and wake-up timers
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: the register and command engine
//!   - Frames register reads/writes and command strobes
//!   - Tracks the status header returned with every bus response
//! - [`transport`]: the bus seam, with an `embedded-hal` SPI implementation
//!   and a deterministic mock for offline testing
//! - [`radio`]: analog and modem configuration, including the quantization
//!   searches for datarate, deviation and channel filter bandwidth, and the
//!   VCO calibration sequence
//! - [`frequency`]: pure synthesizer math shared by the radio layer
//! - [`packet`]: basic packet format configuration and host-side framing
//! - [`receiver`] / [`transmitter`]: the RX session pipeline and the TX
//!   staging path
//! - [`irq`], [`qi`], [`timer`], [`csma`]: interrupt mask handling, link
//!   quality gates, RX timeout and wake-up timers, CSMA/CA
//!
//! # Usage
//! Configuration follows a specific sequence:
//!
//! 1. Create a [`Spirit1`] over a [`SpiTransport`]
//! 2. Set the crystal frequency, then run [`radio::Radio::init`]
//! 3. Program the packet format with [`packet::PacketConfig::init`]
//! 4. Clear and program the interrupt mask through [`irq::Irq`]
//! 5. Start an [`receiver::RxSession`] or send with a
//!    [`transmitter::Transmitter`]
//!
//! # Important Notes
//! - The bus has a single owner: a receive session borrows the engine
//!   exclusively until it ends.
//! - Transport faults are fail-soft. Operations degrade to logged no-ops
//!   with empty results; commanded state changes report failure instead.
//! - Crystals above 30 MHz are handled transparently via the digital and
//!   reference dividers.
//!
//! # Example
//! ```no_run
//! use embedded_hal::spi::SpiDevice;
//! use spirit1::radio::{Radio, RadioConfig};
//! use spirit1::{Error, SpiTransport, Spirit1};
//!
//! fn bring_up<SPI: SpiDevice>(spi: SPI) -> Result<Spirit1<SpiTransport<SPI>>, Error> {
//!     let mut spirit = Spirit1::new(SpiTransport::new(spi));
//!     spirit.reset();
//!
//!     let mut radio = Radio::new(RadioConfig::default());
//!     radio.set_xtal_frequency(&mut spirit, 26_000_000);
//!     radio.init(&mut spirit)?;
//!
//!     Ok(spirit)
//! }
//! ```

pub mod csma;
pub mod device;
pub mod error;
pub mod frequency;
pub mod irq;
pub mod packet;
pub mod qi;
pub mod radio;
pub mod receiver;
pub mod registers;
pub mod status;
pub mod timer;
pub mod transmitter;
pub mod transport;

pub use device::Spirit1;
pub use error::Error;
pub use registers::{Command, Register, FIFO_ADDRESS};
pub use status::{DeviceState, StatusWord};
pub use transport::{SpiTransport, Transport, TransportError};
