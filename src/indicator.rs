//! Activity indicator

use embedded_hal::digital::v2::OutputPin;

/// Something that can show whether the tag is ranging
///
/// Failures to drive the indicator are ignored; it is never worth failing a
/// ranging cycle over.
pub trait Indicator {
    /// Turns the indicator on
    fn on(&mut self);

    /// Turns the indicator off
    fn off(&mut self);
}

/// An LED on a GPIO pin
pub struct Led<P> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> Led<P> {
    /// Create a new LED that lights up when the pin is driven high
    pub fn active_high(pin: P) -> Self {
        let mut led = Led {
            pin,
            active_low: false,
        };
        led.off();
        led
    }

    /// Create a new LED that lights up when the pin is driven low
    pub fn active_low(pin: P) -> Self {
        let mut led = Led {
            pin,
            active_low: true,
        };
        led.off();
        led
    }

    /// Releases the pin
    pub fn free(self) -> P {
        self.pin
    }

    fn drive(&mut self, lit: bool) {
        let high = lit != self.active_low;
        if high {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
    }
}

impl<P: OutputPin> Indicator for Led<P> {
    fn on(&mut self) {
        self.drive(true);
    }

    fn off(&mut self) {
        self.drive(false);
    }
}

/// For boards without an LED
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIndicator;

impl Indicator for NoIndicator {
    fn on(&mut self) {}

    fn off(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{vec, vec::Vec};

    #[derive(Default)]
    struct Pin {
        levels: Vec<bool>,
    }

    impl OutputPin for Pin {
        type Error = ();

        fn set_low(&mut self) -> Result<(), ()> {
            self.levels.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), ()> {
            self.levels.push(true);
            Ok(())
        }
    }

    #[test]
    fn active_low_led() {
        let mut led = Led::active_low(Pin::default());
        led.on();
        led.off();

        assert_eq!(led.free().levels, vec![true, false, true]);
    }

    #[test]
    fn active_high_led() {
        let mut led = Led::active_high(Pin::default());
        led.on();

        assert_eq!(led.free().levels, vec![false, true]);
    }
}
