//! Errors of the ranging engine and the radio bring-up

use crate::{frame::ParseError, ranging::ComputeDistanceError};
use core::fmt;

/// Everything that can make a ranging cycle or the radio bring-up fail
///
/// `E` is the error type of the transceiver driver. Errors never leave the
/// firmware; the controller turns them into a failed cycle and a log line.
#[derive(Debug, PartialEq)]
pub enum Error<E> {
    /// The transceiver driver reported an error
    Radio(E),

    /// The SPI bus or one of the control lines could not be set up
    BusNotReady,

    /// The radio answered with an unknown device ID
    BadDeviceId(u32),

    /// The radio didn't reach IDLE_RC after reset
    RadioNotIdle,

    /// The clock PLL didn't lock
    PllLockFailed,

    /// A frame wasn't sent within the TX budget
    TxTimeout,

    /// No valid response arrived within the RX budget
    RespTimeout,

    /// The FINAL frame wasn't sent. The distance is still valid.
    FinalTxFailed,

    /// A received frame didn't decode
    Parse(ParseError),

    /// The DS-TWR denominator was zero
    DivisionDegenerate,
}

impl<E> From<ParseError> for Error<E> {
    fn from(error: ParseError) -> Self {
        Error::Parse(error)
    }
}

impl<E> From<ComputeDistanceError> for Error<E> {
    fn from(error: ComputeDistanceError) -> Self {
        match error {
            ComputeDistanceError::DivisionDegenerate => Error::DivisionDegenerate,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Radio(error) => write!(f, "radio error: {:?}", error),
            Error::BusNotReady => write!(f, "bus not ready"),
            Error::BadDeviceId(id) => write!(f, "bad device ID {:#010x}", id),
            Error::RadioNotIdle => write!(f, "radio not idle after reset"),
            Error::PllLockFailed => write!(f, "PLL lock failed"),
            Error::TxTimeout => write!(f, "TX timeout"),
            Error::RespTimeout => write!(f, "no response from anchor"),
            Error::FinalTxFailed => write!(f, "FINAL transmission failed"),
            Error::Parse(error) => write!(f, "malformed frame: {:?}", error),
            Error::DivisionDegenerate => write!(f, "degenerate DS-TWR timestamps"),
        }
    }
}
