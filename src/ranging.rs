//! Time-of-flight and distance computation
//!
//! The shipping algorithm is single-sided two-way ranging (SS-TWR): the tag
//! sends a POLL, the anchor answers with a RESP carrying its own POLL RX and
//! RESP TX timestamps. The tag then knows its round-trip time `Ra` and the
//! anchor's reply time `Db`; the time of flight is `(Ra - Db) / 2`.
//!
//! All timestamp arithmetic is done on the radio's 40-bit timestamps, modulo
//! 2^40, and stays integral until the final conversion to millimetres.
//!
//! [`ds_twr_time_of_flight`] implements the asymmetric double-sided variant
//! (DW3000 user manual, section 12.3.2) for anchors that send a third
//! message. The ranging cycle doesn't use it.

use dw3000::time::{Duration, Instant, TICKS_PER_SECOND};
use serde::{Deserialize, Serialize};

/// Speed of light in m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Millimetres travelled by light in one device time unit
pub const MM_PER_DU: f64 = SPEED_OF_LIGHT * 1000.0 / TICKS_PER_SECOND as f64;

/// The four timestamps of one SS-TWR exchange
///
/// `poll_tx` and `resp_rx` are in tag time, the other two in anchor time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Timestamps {
    /// When the tag sent the POLL
    pub poll_tx: Instant,
    /// When the tag received the RESP
    pub resp_rx: Instant,
    /// When the anchor received the POLL
    pub poll_rx_anchor: Instant,
    /// When the anchor sent the RESP
    pub resp_tx_anchor: Instant,
}

impl Timestamps {
    /// Round-trip time measured by the tag
    pub fn round_trip(&self) -> Duration {
        self.resp_rx.duration_since(self.poll_tx)
    }

    /// Reply time measured by the anchor
    pub fn reply(&self) -> Duration {
        self.resp_tx_anchor.duration_since(self.poll_rx_anchor)
    }

    /// Time of flight in device time units, or `None` if the anchor's reply
    /// time exceeds the round trip
    ///
    /// The half unit of an odd difference is dropped.
    pub fn time_of_flight(&self) -> Option<u64> {
        let round_trip = self.round_trip().value();
        let reply = self.reply().value();

        round_trip.checked_sub(reply).map(|difference| difference / 2)
    }

    /// Distance in millimetres, converted from [`Self::time_of_flight`]
    ///
    /// Zero if the reply time exceeds the round trip. Saturates at
    /// `u32::MAX`.
    pub fn distance_mm(&self) -> u32 {
        self.time_of_flight().map_or(0, time_of_flight_to_mm)
    }
}

/// Converts a one-way time of flight into millimetres, rounded
///
/// Float to integer casts saturate, so the result is clamped to `u32`.
pub fn time_of_flight_to_mm(time_of_flight: u64) -> u32 {
    let distance = time_of_flight as f64 * MM_PER_DU;
    (distance + 0.5) as u32
}

/// Returned by [`ds_twr_time_of_flight`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComputeDistanceError {
    /// Round-trip and reply times sum to zero
    DivisionDegenerate,
}

/// Asymmetric double-sided two-way ranging
///
/// `round1`/`reply1` are the initiator's round trip and the responder's
/// reply for the first exchange, `round2`/`reply2` the responder's round
/// trip and the initiator's reply for the second one. Returns the time of
/// flight in device time units, zero if the reply products exceed the
/// round-trip product.
pub fn ds_twr_time_of_flight(
    round1: Duration,
    reply1: Duration,
    round2: Duration,
    reply2: Duration,
) -> Result<u64, ComputeDistanceError> {
    let (ra, da) = (round1.value() as u128, reply1.value() as u128);
    let (rb, db) = (round2.value() as u128, reply2.value() as u128);

    let denominator = ra + rb + da + db;
    if denominator == 0 {
        return Err(ComputeDistanceError::DivisionDegenerate);
    }

    let numerator = (ra * rb).saturating_sub(da * db);

    // 40-bit inputs keep the quotient below 2^80 / 2^40
    Ok((numerator / denominator) as u64)
}
