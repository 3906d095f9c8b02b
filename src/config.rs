//! Build-time configuration
//!
//! Numeric options are read from the environment at compile time, for
//! example `TAG_TWR_PERIOD_MS=500 cargo build`. Unset or malformed values
//! fall back to the defaults. Calibration is switched on with the
//! `calibration` feature.

use dw3000::{Config, TxConfig};
use ieee802154::mac::{PanId, ShortAddress};

/// Short address of this tag
pub const TAG_ADDRESS: ShortAddress = ShortAddress(0x0001);

/// PAN shared by tag and anchor
pub const PAN_ID: PanId = PanId(0xdeca);

/// Time between the starts of two ranging cycles
pub const TWR_PERIOD_MS: u32 = parse_u32(option_env!("TAG_TWR_PERIOD_MS"), 1000);

/// Whether the calibration burst runs before the ranging loop
pub const CAL_ENABLE: bool = cfg!(feature = "calibration");

/// Distance to the anchor during calibration
pub const CAL_REF_MM: u32 = parse_u32(option_env!("UWB_CAL_REF_MM"), 5000);

/// Number of cycles in a calibration burst
pub const CAL_SAMPLES: u32 = parse_u32(option_env!("UWB_CAL_SAMPLES"), 100);

/// TX and RX antenna delay, in device time units
pub const ANTENNA_DELAY: u16 = 16385;

/// How long the radio may take to reach IDLE_RC after a soft reset
pub const IDLE_TIMEOUT_MS: u32 = 100;

/// Attempts when waiting for a frame to go out, one every [`TX_POLL_US`]
pub const TX_POLL_ATTEMPTS: u32 = 1000;

/// Pause between two checks for a sent frame
pub const TX_POLL_US: u32 = 10;

/// How long to wait for the anchor's response
pub const RESP_TIMEOUT_MS: u32 = 3000;

/// Pause between two checks for a received frame
pub const RESP_POLL_MS: u32 = 1;

/// Pause between two steps of a ranging exchange
pub const STATE_SETTLE_MS: u32 = 5;

/// Consecutive failed cycles that trigger a radio re-initialization
pub const WATCHDOG_THRESHOLD: u32 = 10;

/// Pause after a watchdog re-initialization
pub const WATCHDOG_SETTLE_MS: u32 = 100;

/// Distances above this are logged as out of range
pub const MAX_PLAUSIBLE_MM: u32 = 100_000;

/// Parses a decimal number at compile time
///
/// Returns `default` if `value` is `None`, empty, contains anything but
/// digits or doesn't fit into `u32`.
pub const fn parse_u32(value: Option<&str>, default: u32) -> u32 {
    let bytes = match value {
        Some(value) => value.as_bytes(),
        None => return default,
    };
    if bytes.is_empty() {
        return default;
    }

    let mut result: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        if digit < b'0' || digit > b'9' {
            return default;
        }
        result = match result.checked_mul(10) {
            Some(r) => match r.checked_add((digit - b'0') as u32) {
                Some(r) => r,
                None => return default,
            },
            None => return default,
        };
        i += 1;
    }

    result
}

/// Everything the tag needs to know about itself and the link
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TagConfig {
    /// Own short address
    pub address: ShortAddress,
    /// PAN of the ranging link
    pub pan_id: PanId,
    /// Ranging period
    pub period_ms: u32,
    /// PHY settings
    pub radio: Config,
    /// Transmitter RF settings
    pub tx: TxConfig,
    /// TX and RX antenna delay
    pub antenna_delay: u16,
    /// Calibration reference distance
    pub cal_ref_mm: u32,
    /// Calibration burst length
    pub cal_samples: u32,
}

impl Default for TagConfig {
    fn default() -> Self {
        TagConfig {
            address: TAG_ADDRESS,
            pan_id: PAN_ID,
            period_ms: TWR_PERIOD_MS,
            radio: Config::default(),
            tx: TxConfig::default(),
            antenna_delay: ANTENNA_DELAY,
            cal_ref_mm: CAL_REF_MM,
            cal_samples: CAL_SAMPLES,
        }
    }
}
