//! Bring-up diagnostics
//!
//! If the radio doesn't come up at boot, the firmware doesn't halt. It
//! blinks slowly, reads the device ID straight off the bus so the raw bytes
//! show up in the log, and retries the full initialization until it works.

use dw3000::{ll, Bus, DeviceVariant};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use log::{error, info, warn};

use crate::{engine::RangingEngine, indicator::Indicator, radio::Transceiver};

/// How long the indicator is lit in every diagnostic round
pub const BLINK_ON_MS: u32 = 100;

/// How long the indicator stays dark in every diagnostic round
pub const BLINK_OFF_MS: u32 = 900;

/// Reads the device ID register without going through the driver
///
/// Returns the raw bytes, least significant first.
pub fn probe_bus<B: Bus>(bus: &mut B) -> Result<[u8; 4], B::Error> {
    let mut header = [0; 2];
    let len = ll::encode_header(false, 0x00, 0x00, &mut header);

    let mut id = [0; 4];
    bus.read(&header[..len], &mut id)?;

    Ok(id)
}

/// Retries radio initialization until it succeeds
///
/// Every round blinks the indicator, probes the bus and logs what it read,
/// then attempts a full initialization.
pub fn run_until_ready<R, D, I>(engine: &mut RangingEngine<R, D>, indicator: &mut I) -> DeviceVariant
where
    R: Transceiver,
    D: DelayMs<u32> + DelayUs<u32>,
    I: Indicator,
{
    let mut round: u32 = 0;

    loop {
        round = round.wrapping_add(1);

        indicator.on();
        engine.sleep_ms(BLINK_ON_MS);
        indicator.off();
        engine.sleep_ms(BLINK_OFF_MS);

        match engine.radio().probe_device_id() {
            Ok(raw) => {
                let id = u32::from_le_bytes(raw);
                info!(
                    "probe #{}: {:02x} {:02x} {:02x} {:02x}, device ID {:#010x}",
                    round, raw[0], raw[1], raw[2], raw[3], id,
                );
                if id == 0 || id == u32::MAX {
                    warn!("nothing answers on the bus, check wiring");
                }
            }
            Err(err) => warn!("probe #{} failed: {}", round, err),
        }

        match engine.init_radio() {
            Ok(variant) => {
                info!("radio up after {} diagnostic rounds", round);
                return variant;
            }
            Err(err) => error!("initialization failed: {}", err),
        }
    }
}
