//! Firmware library of a DW3000 based UWB locator tag
//!
//! The tag periodically measures its distance to a fixed anchor using
//! single-sided two-way ranging (SS-TWR) and reports it through the `log`
//! facade. The pieces, from the wire up:
//!
//! - [`bus`]: the radio's SPI bus, chip select and reset lines
//! - [`radio`]: what the ranging engine needs from the transceiver
//! - [`frame`]: POLL, RESP, FINAL and BEACON frames
//! - [`ranging`]: time of flight and distance computation
//! - [`engine`]: the ranging state machine
//! - [`controller`]: the periodic loop and its watchdog
//! - [`calibration`], [`diagnostics`]: bring-up helpers
//!
//! Everything is polled from a single loop; the radio never raises an
//! interrupt.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]

pub mod bus;
pub mod calibration;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod frame;
pub mod indicator;
pub mod radio;
pub mod ranging;
pub mod util;

#[cfg(test)]
mod mock;

pub use dw3000;
pub use ieee802154::mac;

pub use crate::error::Error;
