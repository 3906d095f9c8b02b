//! Time-related types based on the DW3000's 40-bit device time

use core::ops::Add;
use serde::{Deserialize, Serialize};

/// The maximum value of 40-bit system time stamps.
pub const TIME_MAX: u64 = 0xff_ffff_ffff;

/// Device time units per second (499.2 MHz × 128)
pub const TICKS_PER_SECOND: u64 = 63_897_600_000;

/// Represents an instant in time
///
/// Internally uses the same 40-bit timestamps that the DW3000 uses. These
/// wrap around after roughly 17.2 seconds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[repr(C)]
pub struct Instant(u64);

impl Instant {
    /// Creates a new instance of `Instant`
    ///
    /// Returns `Some(...)`, if `value` fits within 40 bits, `None` if it
    /// doesn't.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use dw3000::time::{
    ///     TIME_MAX,
    ///     Instant,
    /// };
    ///
    /// let valid_instant   = Instant::new(TIME_MAX);
    /// let invalid_instant = Instant::new(TIME_MAX + 1);
    ///
    /// assert!(valid_instant.is_some());
    /// assert!(invalid_instant.is_none());
    /// ```
    pub fn new(value: u64) -> Option<Self> {
        if value <= TIME_MAX {
            Some(Instant(value))
        } else {
            None
        }
    }

    /// Creates an `Instant` from a register value, dropping bits above 40
    pub fn from_register(value: u64) -> Self {
        Instant(value & TIME_MAX)
    }

    /// Returns the raw 40-bit timestamp
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns the amount of time passed between the two `Instant`s
    ///
    /// Assumes that `&self` represents a later time than `earlier`. The
    /// difference is taken modulo 2^40, so a counter that wrapped in between
    /// still yields the right result.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use dw3000::time::{
    ///     TIME_MAX,
    ///     Instant,
    /// };
    ///
    /// let before_wrap = Instant::new(TIME_MAX - 2).unwrap();
    /// let after_wrap  = Instant::new(5).unwrap();
    ///
    /// assert_eq!(after_wrap.duration_since(before_wrap).value(), 8);
    /// ```
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration(self.0.wrapping_sub(earlier.0) & TIME_MAX)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Self::Output {
        // Both operands are 40-bit values, so the sum can't overflow `u64`.
        Instant((self.0 + rhs.0) & TIME_MAX)
    }
}

/// A duration between two instants in DW3000 device time
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
#[repr(C)]
pub struct Duration(u64);

impl Duration {
    /// Creates a new instance of `Duration`
    ///
    /// Returns `None` if `value` doesn't fit within 40 bits.
    pub fn new(value: u64) -> Option<Self> {
        if value <= TIME_MAX {
            Some(Duration(value))
        } else {
            None
        }
    }

    /// Returns the raw 40-bit value
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_without_wrap() {
        let earlier = Instant::from_register(0x100);
        let later = Instant::from_register(0x1f_fe00);

        assert_eq!(later.duration_since(earlier).value(), 0x1f_fd00);
    }

    #[test]
    fn duration_across_wrap() {
        let earlier = Instant::from_register(0xff_ffff_fffe);
        let later = Instant::from_register(2);

        assert_eq!(later.duration_since(earlier).value(), 4);
    }

    #[test]
    fn register_values_are_truncated_to_forty_bits() {
        assert_eq!(Instant::from_register(0x01_00_0000_0005).value(), 5);
    }

    #[test]
    fn addition_wraps() {
        let instant = Instant::from_register(TIME_MAX);
        let sum = instant + Duration::new(3).unwrap();

        assert_eq!(sum.value(), 2);
    }
}
