//! Masks for the lower 32 bits of the SYS_STATUS register
//!
//! The radio sets these bits on events. Writing a one clears the bit, so the
//! masks are used both to test and to acknowledge events.

/// Clock PLL locked
pub const CPLOCK: u32 = 0x0000_0002;

/// Transmit frame sent
pub const TXFRS: u32 = 0x0000_0080;

/// Receive frame ready, FCS good
pub const RXFCG: u32 = 0x0000_4000;

/// Receive frame wait timeout
pub const RXFTO: u32 = 0x0002_0000;

/// Preamble detection timeout
pub const RXPTO: u32 = 0x0020_0000;

/// SPI ready after reset
pub const SPIRDY: u32 = 0x0080_0000;

/// Radio is in IDLE_RC
pub const RCINIT: u32 = 0x0100_0000;

/// Every transmit event
pub const ALL_TX: u32 = 0x0000_00f8;

/// Every event that belongs to a good reception
pub const ALL_RX_GOOD: u32 = 0x0000_6f00;

/// Every receive error
pub const ALL_RX_ERR: u32 = 0x2405_9000;

/// Every receive timeout
pub const ALL_RX_TO: u32 = RXFTO | RXPTO;
