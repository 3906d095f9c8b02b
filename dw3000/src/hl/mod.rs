//! High-level interface to the DW3000
//!
//! The entry point to this API is the [DW3000] struct. It wraps the
//! [register-level interface] and provides the operations a polling ranging
//! application needs: bring-up, PHY configuration, transmission, reception
//! and timestamp access. The radio is never configured to raise interrupts;
//! callers observe events through [`DW3000::read_sys_status`].
//!
//! [register-level interface]: ../ll/index.html

use crate::ll;
use core::fmt;

pub use error::*;
pub use sending::FCS_LEN;

mod config;
mod error;
mod init;
mod receiving;
mod sending;

/// Entry point to the DW3000 driver API
pub struct DW3000<B> {
    ll: ll::DW3000<B>,
    state: Status,
}

/// What the driver last asked the radio to do
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// Reset, not yet initialised
    Uninitialized,
    /// Initialised and idle
    Ready,
    /// Configured for the link and idle
    Configured,
    /// A transmission was started
    Sending,
    /// The receiver was enabled
    Receiving,
}

/// How a transmission is started
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TxMode {
    /// Send right away
    Immediate,
    /// Send right away, then turn the receiver on once the frame is out
    ImmediateResponseExpected,
}

/// How the receiver is enabled
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RxMode {
    /// Turn the receiver on right away
    Immediate,
}

/// External LNA/PA control lines driven by the radio's GPIOs
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LnaPaMode {
    /// Drive the external low noise amplifier (GPIO6)
    pub lna: bool,
    /// Drive the external power amplifier (GPIO4 and GPIO5)
    pub pa: bool,
}

impl LnaPaMode {
    /// No external amplifiers
    pub const NONE: LnaPaMode = LnaPaMode {
        lna: false,
        pa: false,
    };
}

/// Silicon revision reported by the device ID
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Revision {
    /// B0 silicon
    B0,
    /// C0 silicon
    C0,
}

/// A device ID the driver knows how to talk to
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeviceVariant {
    /// The raw device ID
    pub id: u32,
    /// Silicon revision
    pub revision: Revision,
    /// Whether the part has a second antenna port for PDoA
    pub pdoa: bool,
}

impl DeviceVariant {
    /// Identifies a device from its ID register
    ///
    /// Returns `None` for anything that isn't a DW3000, including the
    /// all-zeros and all-ones values a dead bus reads back.
    pub fn from_id(id: u32) -> Option<Self> {
        let (revision, pdoa) = match id {
            0xdeca_0302 => (Revision::C0, false),
            0xdeca_0312 => (Revision::C0, true),
            0xdeca_0301 => (Revision::B0, false),
            0xdeca_0311 => (Revision::B0, true),
            _ => return None,
        };

        Some(DeviceVariant { id, revision, pdoa })
    }
}

impl<B> DW3000<B>
where
    B: ll::Bus,
{
    /// Create a new instance of `DW3000`
    ///
    /// Takes the bus the radio is connected to. The radio itself is not
    /// touched until one of the bring-up methods is called.
    pub fn new(bus: B) -> Self {
        DW3000 {
            ll: ll::DW3000::new(bus),
            state: Status::Uninitialized,
        }
    }

    /// Provides direct access to the register-level API
    ///
    /// Using the register-level API can invalidate assumptions the
    /// high-level API makes, for example about which events are enabled.
    pub fn ll(&mut self) -> &mut ll::DW3000<B> {
        &mut self.ll
    }

    /// What the driver last asked the radio to do
    pub fn status(&self) -> Status {
        self.state
    }

    /// Pulses the reset line through the bus
    pub fn hard_reset(&mut self) -> Result<(), Error<B>> {
        self.ll.bus().reset().map_err(ll::Error::Reset)?;
        self.state = Status::Uninitialized;

        Ok(())
    }
}

// Can't be derived without putting requirements on `B`.
impl<B> fmt::Debug for DW3000<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DW3000 {{ state: {:?}, .. }}", self.state)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_device_ids() {
        let c0 = DeviceVariant::from_id(0xdeca_0302).unwrap();
        assert_eq!(c0.revision, Revision::C0);
        assert!(!c0.pdoa);

        let b0_pdoa = DeviceVariant::from_id(0xdeca_0311).unwrap();
        assert_eq!(b0_pdoa.revision, Revision::B0);
        assert!(b0_pdoa.pdoa);
    }

    #[test]
    fn dead_bus_ids_are_rejected() {
        assert!(DeviceVariant::from_id(0x0000_0000).is_none());
        assert!(DeviceVariant::from_id(0xffff_ffff).is_none());
        assert!(DeviceVariant::from_id(0xdeca_0130).is_none());
    }

    #[test]
    fn hard_reset_goes_through_bus() {
        let mut dw = DW3000::new(fake::FakeBus::new());
        dw.hard_reset().unwrap();

        assert_eq!(dw.ll().bus().resets, 1);
        assert_eq!(dw.status(), Status::Uninitialized);
    }
}
