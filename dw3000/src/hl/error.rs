use crate::ll;
use core::fmt;

/// An error that can occur while driving the radio
pub enum Error<B: ll::Bus> {
    /// Error occured while using the bus
    Bus(ll::Error<B>),

    /// The device ID doesn't belong to a supported radio
    ///
    /// `0x00000000` and `0xffffffff` usually mean nothing answered on the
    /// bus at all.
    BadDeviceId(u32),

    /// The clock PLL didn't lock after configuration
    PllLockFailed,

    /// The configuration was not valid. Some combinations of settings are not allowed.
    InvalidConfiguration,

    /// A frame doesn't fit into the TX buffer at the requested offset
    FrameTooLong {
        /// Offset plus length of the rejected frame
        required_len: usize,
    },

    /// A buffer offset can't be expressed in the transaction header
    OffsetOutOfRange(u16),
}

impl<B: ll::Bus> From<ll::Error<B>> for Error<B> {
    fn from(error: ll::Error<B>) -> Self {
        Error::Bus(error)
    }
}

// We can't derive this implementation, as `Debug` is only implemented
// conditionally for `ll::Error`.
impl<B: ll::Bus> fmt::Debug for Error<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Bus(error) => write!(f, "Bus({:?})", error),
            Error::BadDeviceId(id) => write!(f, "BadDeviceId({:#010x})", id),
            Error::PllLockFailed => write!(f, "PllLockFailed"),
            Error::InvalidConfiguration => write!(f, "InvalidConfiguration"),
            Error::FrameTooLong { required_len } => {
                write!(f, "FrameTooLong {{ required_len: {:?} }}", required_len)
            }
            Error::OffsetOutOfRange(offset) => write!(f, "OffsetOutOfRange({})", offset),
        }
    }
}
