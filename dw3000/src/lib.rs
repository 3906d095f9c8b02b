//! Driver crate for the DW3000 UWB transceiver
//!
//! The crate is split the same way as the radio's documentation: [`ll`]
//! provides typed access to single registers, [`hl`] builds the operations a
//! ranging application needs on top of that. All bus traffic goes through
//! the [`ll::Bus`] trait, which the board support code implements.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]

pub mod configs;
pub mod hl;
pub mod ll;
pub mod status;
pub mod time;

pub use crate::{
    configs::{Config, TxConfig},
    hl::{DeviceVariant, Error, LnaPaMode, Revision, RxMode, Status, TxMode, DW3000, FCS_LEN},
    ll::Bus,
};
