//! UWB tag firmware for an nRF52833 with a DW3000 radio
//!
//! Logs through RTT. Waits for the debugger to attach, brings the radio up
//! (or stays in diagnostic mode until it comes up), optionally calibrates,
//! then ranges forever.
#![no_main]
#![no_std]

use cortex_m_rt::entry;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use log::{error, info, warn, LevelFilter, Log, Metadata, Record};
use nrf52833_hal::{
    gpio::{p0, Level},
    pac,
    spim::{self, Spim},
    timer::{Periodic, Timer},
    Delay,
};
use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};

use uwb_tag::{
    bus::{SpiPort, SPI_MODE},
    calibration,
    config::{TagConfig, CAL_ENABLE},
    controller::{Clock, Controller},
    diagnostics,
    dw3000::DW3000,
    engine::RangingEngine,
    indicator::{Indicator, Led},
    radio::Transceiver,
    Error,
};

/// Time for the RTT host to attach before the first log line
const STARTUP_SETTLE_MS: u32 = 2000;

/// Pause between bring-up and the first ranging cycle
const START_DELAY_MS: u32 = 500;

/// Core clock, for busy waits
const CORE_CLOCK_MHZ: u32 = 64;

struct RttLogger;

impl Log for RttLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        rprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: RttLogger = RttLogger;

/// Busy waits on the core clock, for the SPI port's sub-millisecond timing
struct CycleDelay;

impl DelayUs<u32> for CycleDelay {
    fn delay_us(&mut self, us: u32) {
        cortex_m::asm::delay(us.saturating_mul(CORE_CLOCK_MHZ));
    }
}

impl DelayMs<u32> for CycleDelay {
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
}

/// Milliseconds since boot, from a free running 1 MHz timer
struct Uptime {
    timer: Timer<pac::TIMER0, Periodic>,
    last_us: u32,
    elapsed_us: u64,
}

impl Uptime {
    fn new(timer: pac::TIMER0) -> Self {
        let mut timer = Timer::periodic(timer);
        timer.start(u32::MAX);

        Uptime {
            timer,
            last_us: 0,
            elapsed_us: 0,
        }
    }
}

impl Clock for Uptime {
    fn now_ms(&mut self) -> u32 {
        let now = self.timer.read();
        self.elapsed_us += now.wrapping_sub(self.last_us) as u64;
        self.last_us = now;

        (self.elapsed_us / 1000) as u32
    }
}

#[entry]
fn main() -> ! {
    rtt_init_print!();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }

    let p = pac::Peripherals::take().unwrap();
    let core = pac::CorePeripherals::take().unwrap();

    let mut delay = Delay::new(core.SYST);
    delay.delay_ms(STARTUP_SETTLE_MS);

    info!("UWB tag starting");

    let port0 = p0::Parts::new(p.P0);

    let cs = port0.p0_02.into_push_pull_output(Level::High);
    let rst = port0.p0_29.into_push_pull_output(Level::High);
    let mut led = Led::active_low(port0.p0_06.into_push_pull_output(Level::High));

    let pins = spim::Pins {
        sck: port0.p0_31.into_push_pull_output(Level::Low).degrade(),
        mosi: Some(port0.p0_30.into_push_pull_output(Level::Low).degrade()),
        miso: Some(port0.p0_28.into_floating_input().degrade()),
    };
    let spi = Spim::new(p.SPIM2, pins, spim::Frequency::M2, SPI_MODE, 0);

    let port = match SpiPort::open(spi, cs, rst, CycleDelay) {
        Ok(port) => port,
        Err(err) => {
            error!("{}: {:?}", Error::<()>::BusNotReady, err);
            loop {
                led.on();
                delay.delay_ms(diagnostics::BLINK_ON_MS);
                led.off();
                delay.delay_ms(diagnostics::BLINK_OFF_MS);
            }
        }
    };

    let config = TagConfig::default();
    let mut engine = RangingEngine::new(DW3000::new(port), delay, config);

    match engine.radio().probe_device_id() {
        Ok(raw) => info!("bus probe: device ID {:#010x}", u32::from_le_bytes(raw)),
        Err(err) => warn!("bus probe failed: {}", err),
    }

    if let Err(err) = engine.init_radio() {
        error!("radio initialization failed: {}", err);
        info!("entering diagnostic mode");
        diagnostics::run_until_ready(&mut engine, &mut led);
    }

    if CAL_ENABLE {
        match calibration::calibrate(&mut engine, config.cal_ref_mm, config.cal_samples) {
            Ok(report) => info!(
                "set antenna delay to {} to remove a {} mm error",
                report.suggested_antenna_delay, report.error_mm,
            ),
            Err(err) => warn!("calibration failed: {:?}", err),
        }
    }

    if let Err(err) = engine.send_beacon(0) {
        warn!("beacon failed: {}", err);
    }

    engine.sleep_ms(START_DELAY_MS);

    let mut controller = Controller::new(engine, Uptime::new(p.TIMER0), led);
    controller.run()
}
