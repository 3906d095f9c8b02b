//! Configuration structs for the radio
//!
//! [`Config`] is the set of PHY settings both ends of a link have to agree
//! on. [`TxConfig`] tunes the transmitter's RF output and is local to one
//! device.

use serde::{Deserialize, Serialize};

/// PHY configuration
///
/// Passed to [`DW3000::configure`](crate::DW3000::configure).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// The channel the radio operates on
    pub channel: UwbChannel,
    /// The length of the preamble
    pub preamble_length: PreambleLength,
    /// Preamble acquisition chunk size used by the receiver
    pub pac: PacSize,
    /// Preamble code used by the transmitter
    pub tx_preamble_code: u8,
    /// Preamble code the receiver looks for
    pub rx_preamble_code: u8,
    /// The start-of-frame delimiter sequence
    pub sfd_type: SfdSequence,
    /// Data rate of the payload
    pub bitrate: BitRate,
    /// PHY header mode
    pub phr_mode: PhrMode,
    /// PHY header rate
    pub phr_rate: PhrRate,
    /// SFD detection timeout in preamble symbols
    pub sfd_timeout: u16,
    /// Scrambled timestamp sequence mode
    pub sts_mode: StsMode,
    /// Phase difference of arrival mode
    pub pdoa_mode: PdoaMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            channel: UwbChannel::Channel5,
            preamble_length: PreambleLength::Symbols128,
            pac: PacSize::Pac8,
            tx_preamble_code: 9,
            rx_preamble_code: 9,
            sfd_type: SfdSequence::Decawave8,
            bitrate: BitRate::Kbps6800,
            phr_mode: PhrMode::Standard,
            phr_rate: PhrRate::Standard,
            sfd_timeout: PreambleLength::Symbols128.symbols() + 1 + 8 - 8,
            sts_mode: StsMode::Off,
            pdoa_mode: PdoaMode::Mode0,
        }
    }
}

impl Config {
    /// Checks that the settings form a combination the radio supports
    pub fn is_valid(&self) -> bool {
        let code_ok = |code: u8| matches!(code, 3 | 4 | 9..=12);

        code_ok(self.tx_preamble_code) && code_ok(self.rx_preamble_code) && self.sfd_timeout > 0
    }
}

/// Transmitter RF configuration
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct TxConfig {
    /// Pulse generator delay, controls the bandwidth
    pub pg_delay: u8,
    /// TX power, one byte per frame section
    pub power: u32,
    /// Pulse generator calibration target. Zero leaves calibration off.
    pub pg_count: u16,
}

impl Default for TxConfig {
    fn default() -> Self {
        TxConfig {
            pg_delay: 0x34,
            power: 0xfefe_fefe,
            pg_count: 0,
        }
    }
}

/// The channel that the DW3000 operates on
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum UwbChannel {
    /// Channel 5, 6489.6 MHz
    Channel5 = 0,
    /// Channel 9, 7987.2 MHz
    Channel9 = 1,
}

impl UwbChannel {
    /// PLL configuration for the channel
    pub fn pll_config(&self) -> u16 {
        match self {
            UwbChannel::Channel5 => 0x1f3c,
            UwbChannel::Channel9 => 0x0f3c,
        }
    }
}

/// The length of the preamble
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PreambleLength {
    /// 64 symbols
    Symbols64,
    /// 128 symbols
    Symbols128,
    /// 256 symbols
    Symbols256,
    /// 512 symbols
    Symbols512,
    /// 1024 symbols
    Symbols1024,
    /// 1536 symbols
    Symbols1536,
    /// 2048 symbols
    Symbols2048,
    /// 4096 symbols
    Symbols4096,
}

impl PreambleLength {
    /// Value of the TXPSR field in TX_FCTRL
    pub fn txpsr(&self) -> u8 {
        match self {
            PreambleLength::Symbols64 => 0x1,
            PreambleLength::Symbols128 => 0x5,
            PreambleLength::Symbols256 => 0x9,
            PreambleLength::Symbols512 => 0xd,
            PreambleLength::Symbols1024 => 0x2,
            PreambleLength::Symbols1536 => 0x6,
            PreambleLength::Symbols2048 => 0xa,
            PreambleLength::Symbols4096 => 0x3,
        }
    }

    /// Number of preamble symbols
    pub const fn symbols(&self) -> u16 {
        match self {
            PreambleLength::Symbols64 => 64,
            PreambleLength::Symbols128 => 128,
            PreambleLength::Symbols256 => 256,
            PreambleLength::Symbols512 => 512,
            PreambleLength::Symbols1024 => 1024,
            PreambleLength::Symbols1536 => 1536,
            PreambleLength::Symbols2048 => 2048,
            PreambleLength::Symbols4096 => 4096,
        }
    }
}

/// Preamble acquisition chunk size
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PacSize {
    /// 8 symbols, recommended for preambles up to 128 symbols
    Pac8 = 0,
    /// 16 symbols
    Pac16 = 1,
    /// 32 symbols
    Pac32 = 2,
    /// 4 symbols
    Pac4 = 3,
}

/// The SFD sequence that is used to transmit and receive frames
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum SfdSequence {
    /// IEEE 802.15.4a 8-symbol SFD
    Ieee = 0,
    /// Decawave proprietary 8-symbol SFD
    Decawave8 = 1,
    /// Decawave proprietary 16-symbol SFD
    Decawave16 = 2,
    /// IEEE 802.15.4z 8-symbol SFD
    Ieee4z = 3,
}

/// The bitrate at which a message is transmitted
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum BitRate {
    /// 850 kilobits per second
    Kbps850 = 0,
    /// 6.8 megabits per second
    Kbps6800 = 1,
}

/// PHY header mode
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PhrMode {
    /// Standard IEEE 802.15.4 PHR, frames up to 127 bytes
    Standard = 0,
    /// Decawave extended PHR, frames up to 1023 bytes
    Extended = 1,
}

/// PHY header rate
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PhrRate {
    /// PHR at 850 kbps
    Standard = 0,
    /// PHR at the data rate
    DataRate = 1,
}

/// Scrambled timestamp sequence mode
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum StsMode {
    /// No STS
    Off = 0,
    /// STS after the SFD
    Mode1 = 1,
    /// STS after the payload
    Mode2 = 2,
    /// STS only, no payload
    ModeNoData = 3,
}

/// Phase difference of arrival mode
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PdoaMode {
    /// PDoA off
    Mode0 = 0,
    /// PDoA over the preamble
    Mode1 = 1,
    /// PDoA over the STS
    Mode3 = 3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_tag_link() {
        let config = Config::default();

        assert_eq!(config.channel, UwbChannel::Channel5);
        assert_eq!(config.preamble_length.symbols(), 128);
        assert_eq!(config.sfd_timeout, 129);
        assert_eq!(config.tx_preamble_code, 9);
        assert!(config.is_valid());
    }

    #[test]
    fn rejects_unknown_preamble_codes() {
        let config = Config {
            rx_preamble_code: 7,
            ..Config::default()
        };

        assert!(!config.is_valid());
    }
}
