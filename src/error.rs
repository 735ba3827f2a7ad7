//! Driver error taxonomy
//!
//! Configuration and framing problems fail closed: they are rejected before
//! anything is written to the device. Runtime bus faults are handled inside
//! the register engine (logged no-ops) and never surface here; an RX session
//! timeout is a normal termination reported through
//! [`RxEvent::Timeout`](crate::receiver::RxEvent), not an error.

use thiserror::Error;

use crate::status::DeviceState;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Radio or packet parameters failed validation; nothing was written to
    /// the device.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(&'static str),

    /// The packet configuration requires a field the message did not supply.
    #[error("message is missing the required {0} field")]
    MissingRequiredField(&'static str),

    /// The device never reported the wanted state within the polling budget.
    #[error("device failed to reach the {wanted:?} state")]
    StateTransition { wanted: DeviceState },

    /// A received frame is shorter than the configured header layout.
    #[error("frame of {got} bytes is shorter than the {needed} configured header bytes")]
    FrameTooShort { needed: usize, got: usize },
}
