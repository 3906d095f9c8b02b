//! Periodic ranging loop with a watchdog
//!
//! The controller starts a ranging cycle every period, counts consecutive
//! failures and re-initializes the radio once too many cycles in a row have
//! failed. It never gives up: the tag keeps ranging so an anchor can find
//! it again when it comes back into range.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use log::{debug, error, info, warn};

use crate::{
    config::{WATCHDOG_SETTLE_MS, WATCHDOG_THRESHOLD},
    engine::{Measurement, RangingEngine},
    indicator::Indicator,
    radio::Transceiver,
};

/// A free running millisecond clock
///
/// Wraps around; the controller only looks at differences.
pub trait Clock {
    /// Milliseconds since some fixed point in the past
    fn now_ms(&mut self) -> u32;
}

/// What happened during one period
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CycleOutcome {
    /// The anchor answered
    Ranged(Measurement),
    /// The cycle failed
    Failed {
        /// Failed cycles in a row, including this one
        consecutive: u32,
    },
    /// The cycle failed and the watchdog re-initialized the radio
    Reinitialized,
}

/// Drives the ranging engine at a fixed cadence
pub struct Controller<R, D, C, I> {
    engine: RangingEngine<R, D>,
    clock: C,
    indicator: I,
    period_ms: u32,
    cycle_count: u32,
    consecutive_failures: u32,
}

impl<R, D, C, I> Controller<R, D, C, I>
where
    R: Transceiver,
    D: DelayMs<u32> + DelayUs<u32>,
    C: Clock,
    I: Indicator,
{
    /// Takes over an engine whose radio is already initialized
    pub fn new(engine: RangingEngine<R, D>, clock: C, indicator: I) -> Self {
        let period_ms = engine.config().period_ms;

        Controller {
            engine,
            clock,
            indicator,
            period_ms,
            cycle_count: 0,
            consecutive_failures: 0,
        }
    }

    /// Runs one period: a ranging cycle, the watchdog, then sleeps until the
    /// period is over
    ///
    /// The period is measured from the start of the cycle. If the cycle
    /// overran, the next one starts right away.
    pub fn run_once(&mut self) -> CycleOutcome {
        let start = self.clock.now_ms();
        self.cycle_count = self.cycle_count.wrapping_add(1);

        self.indicator.off();

        let outcome = match self.engine.cycle() {
            Ok(measurement) => {
                debug!("cycle #{} complete", self.cycle_count);
                self.consecutive_failures = 0;
                self.indicator.on();
                CycleOutcome::Ranged(measurement)
            }
            Err(err) => {
                warn!("cycle #{} failed: {}", self.cycle_count, err);
                self.consecutive_failures += 1;

                if self.consecutive_failures >= WATCHDOG_THRESHOLD {
                    self.reinitialize();
                    CycleOutcome::Reinitialized
                } else {
                    CycleOutcome::Failed {
                        consecutive: self.consecutive_failures,
                    }
                }
            }
        };

        let elapsed = self.clock.now_ms().wrapping_sub(start);
        let remaining = self.period_ms.saturating_sub(elapsed);
        if remaining > 0 {
            self.engine.sleep_ms(remaining);
        }

        outcome
    }

    fn reinitialize(&mut self) {
        error!(
            "{} failed cycles in a row, re-initializing radio",
            self.consecutive_failures
        );

        match self.engine.init_radio() {
            Ok(_) => info!("radio re-initialized"),
            Err(err) => error!("re-initialization failed: {}", err),
        }

        self.consecutive_failures = 0;
        self.engine.sleep_ms(WATCHDOG_SETTLE_MS);
    }

    /// Ranges forever
    pub fn run(&mut self) -> ! {
        info!("ranging every {} ms", self.period_ms);

        loop {
            self.run_once();
        }
    }

    /// Cycles started so far
    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    /// Failed cycles since the last success or re-initialization
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Access to the engine
    pub fn engine(&mut self) -> &mut RangingEngine<R, D> {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TagConfig,
        mock::{self, nominal_reply, FakeClock, FakeDelay, FakeRadio},
    };
    use std::{vec, vec::Vec};

    #[derive(Default)]
    struct Lamp {
        states: Vec<bool>,
    }

    impl Indicator for Lamp {
        fn on(&mut self) {
            self.states.push(true);
        }

        fn off(&mut self) {
            self.states.push(false);
        }
    }

    fn controller(radio: FakeRadio) -> (Controller<FakeRadio, FakeDelay, FakeClock, Lamp>, mock::Now) {
        let config = TagConfig {
            period_ms: 1000,
            ..TagConfig::default()
        };
        let (mut engine, now) = mock::engine(radio, config);
        engine.init_radio().unwrap();

        let clock = FakeClock { now: now.clone() };
        (Controller::new(engine, clock, Lamp::default()), now)
    }

    #[test]
    fn keeps_the_period() {
        let mut radio = FakeRadio::new();
        radio.always = Some(vec![nominal_reply()]);
        let (mut controller, now) = controller(radio);

        for _ in 0..3 {
            let start = now.get();
            let outcome = controller.run_once();

            assert!(matches!(outcome, CycleOutcome::Ranged(m) if m.distance_mm == 1802));
            assert_eq!(now.get() - start, 1_000_000);
        }
        assert_eq!(controller.cycle_count(), 3);
    }

    #[test]
    fn overrun_starts_next_cycle_right_away() {
        let (mut controller, now) = controller(FakeRadio::new());
        let start = now.get();

        controller.run_once();

        assert_eq!(now.get() - start, 3_009_000);
    }

    #[test]
    fn watchdog_reinitializes_after_ten_failures() {
        let (mut controller, _) = controller(FakeRadio::new());

        for n in 1..10 {
            assert_eq!(controller.run_once(), CycleOutcome::Failed { consecutive: n });
            assert_eq!(controller.engine().radio().hard_resets, 1);
        }

        assert_eq!(controller.run_once(), CycleOutcome::Reinitialized);
        assert_eq!(controller.engine().radio().hard_resets, 2);
        assert_eq!(controller.consecutive_failures(), 0);

        assert_eq!(controller.run_once(), CycleOutcome::Failed { consecutive: 1 });
        assert_eq!(controller.cycle_count(), 11);
    }

    #[test]
    fn watchdog_settles_after_reinitialization() {
        let (mut controller, now) = controller(FakeRadio::new());
        for _ in 1..10 {
            controller.run_once();
        }

        let start = now.get();
        controller.run_once();

        assert_eq!(now.get() - start, 3_009_000 + 100_000);
    }

    #[test]
    fn success_resets_failure_count() {
        let mut radio = FakeRadio::new();
        radio.script.push_back(vec![]);
        radio.script.push_back(vec![nominal_reply()]);
        let (mut controller, _) = controller(radio);

        assert_eq!(controller.run_once(), CycleOutcome::Failed { consecutive: 1 });
        assert!(matches!(controller.run_once(), CycleOutcome::Ranged(_)));
        assert_eq!(controller.consecutive_failures(), 0);
        assert_eq!(controller.run_once(), CycleOutcome::Failed { consecutive: 1 });
    }

    #[test]
    fn indicator_shows_last_result() {
        let mut radio = FakeRadio::new();
        radio.script.push_back(vec![nominal_reply()]);
        let (mut controller, _) = controller(radio);

        controller.run_once();
        controller.run_once();

        assert_eq!(controller.indicator.states, vec![false, true, false]);
    }
}
