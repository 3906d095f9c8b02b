//! Antenna delay calibration
//!
//! With the anchor placed at a known distance, a burst of ranging cycles
//! shows how far the measured distance is off. The error is converted back
//! into device time units to suggest a better antenna delay.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use log::{info, warn};
#[allow(unused_imports)]
use micromath::F32Ext;
use serde::{Deserialize, Serialize};

use crate::{engine::RangingEngine, radio::Transceiver, ranging::MM_PER_DU};

/// Pause between two calibration cycles
pub const CAL_INTERVAL_MS: u32 = 10;

/// Statistics of a calibration burst
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Cycles run
    pub attempts: u32,
    /// Cycles that produced a distance
    pub successes: u32,
    /// Mean measured distance
    pub mean_mm: f32,
    /// Standard deviation of the measured distance
    pub std_dev_mm: f32,
    /// Mean distance minus the reference distance
    pub error_mm: f32,
    /// Antenna delay that would remove the mean error, for TX and RX each
    pub suggested_antenna_delay: u16,
}

/// Returned by [`calibrate`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CalibrationError {
    /// Not a single cycle succeeded
    NoSamples {
        /// Cycles run
        attempts: u32,
    },
}

/// Running mean and variance (Welford)
#[derive(Clone, Copy, Debug, Default)]
struct Stats {
    count: u32,
    mean: f32,
    m2: f32,
}

impl Stats {
    fn add(&mut self, value: f32) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f32;
        self.m2 += delta * (value - self.mean);
    }

    /// Population standard deviation
    fn std_dev(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.m2 / self.count as f32).sqrt()
    }
}

/// Suggests an antenna delay from the mean distance error
///
/// The error shows up twice in the round trip; half of that goes to the TX
/// delay and half to the RX delay.
pub fn suggest_antenna_delay(current: u16, error_mm: f32) -> u16 {
    let correction = (error_mm / MM_PER_DU as f32).round();
    let suggested = current as f32 + correction;

    if suggested <= 0.0 {
        0
    } else if suggested >= u16::MAX as f32 {
        u16::MAX
    } else {
        suggested as u16
    }
}

/// Runs `samples` ranging cycles against an anchor `reference_mm` away
///
/// Failed cycles count as attempts but don't contribute to the statistics.
pub fn calibrate<R, D>(
    engine: &mut RangingEngine<R, D>,
    reference_mm: u32,
    samples: u32,
) -> Result<CalibrationReport, CalibrationError>
where
    R: Transceiver,
    D: DelayMs<u32> + DelayUs<u32>,
{
    info!("calibrating against {} mm, {} samples", reference_mm, samples);

    let mut stats = Stats::default();

    for attempt in 0..samples {
        match engine.cycle() {
            Ok(measurement) => stats.add(measurement.distance_mm as f32),
            Err(err) => warn!("calibration cycle {} failed: {}", attempt, err),
        }
        engine.sleep_ms(CAL_INTERVAL_MS);
    }

    if stats.count == 0 {
        return Err(CalibrationError::NoSamples { attempts: samples });
    }

    let error_mm = stats.mean - reference_mm as f32;
    let report = CalibrationReport {
        attempts: samples,
        successes: stats.count,
        mean_mm: stats.mean,
        std_dev_mm: stats.std_dev(),
        error_mm,
        suggested_antenna_delay: suggest_antenna_delay(engine.config().antenna_delay, error_mm),
    };

    info!(
        "calibration: {}/{} ok, mean {} mm, std dev {} mm, error {} mm, antenna delay {}",
        report.successes,
        report.attempts,
        report.mean_mm,
        report.std_dev_mm,
        report.error_mm,
        report.suggested_antenna_delay,
    );

    Ok(report)
}
