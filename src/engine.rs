//! The SS-TWR ranging state machine
//!
//! A cycle walks through `Idle → PollTx → RespWait → Compute → FinalTx →
//! Idle`. Every step polls the radio; there are no interrupts. Any failure
//! turns the transceiver off and goes straight back to `Idle`.

use core::num::Wrapping;

use dw3000::{
    status::{ALL_RX_ERR, ALL_RX_GOOD, ALL_RX_TO, ALL_TX, RXFCG},
    time::Instant,
    DeviceVariant, LnaPaMode, Revision, RxMode, TxMode, FCS_LEN,
};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use ieee802154::mac::ShortAddress;
use log::{debug, info, warn};

use crate::{
    block_timeout,
    config::{
        TagConfig, IDLE_TIMEOUT_MS, MAX_PLAUSIBLE_MM, RESP_POLL_MS, RESP_TIMEOUT_MS,
        STATE_SETTLE_MS, TX_POLL_ATTEMPTS, TX_POLL_US,
    },
    frame::{self, MessageType, Response, TagInfo},
    radio::Transceiver,
    ranging::Timestamps,
    util::TimeoutError,
    Error,
};

/// Largest frame the radio can receive, including the FCS
const MAX_FRAME_LEN: usize = 127;

/// Where the engine is within a ranging exchange
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// Between exchanges
    Idle,
    /// Sending the POLL
    PollTx,
    /// Waiting for the anchor's RESP
    RespWait,
    /// Computing the distance
    Compute,
    /// Sending the FINAL
    FinalTx,
}

/// Scratch data of the current exchange
///
/// Cleared at the start of every cycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExchangeRecord {
    /// The four exchange timestamps, zero until captured
    pub timestamps: Timestamps,
    /// Sequence number of the POLL
    pub seq: u8,
    /// Computed distance, zero until computed
    pub distance_mm: u32,
}

/// Result of a successful ranging cycle
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Measurement {
    /// Sequence number of the POLL that started the exchange
    pub seq: u8,
    /// The anchor that answered
    pub anchor: ShortAddress,
    /// Distance to the anchor
    pub distance_mm: u32,
    /// The timestamps the distance was computed from
    pub timestamps: Timestamps,
    /// Whether the FINAL report went out
    pub final_sent: bool,
}

/// Runs ranging exchanges against a single anchor
///
/// Owns the radio exclusively. The sequence number survives
/// re-initialization of the radio.
pub struct RangingEngine<R, D> {
    radio: R,
    delay: D,
    config: TagConfig,
    seq: Wrapping<u8>,
    record: ExchangeRecord,
    state: State,
}

impl<R, D> RangingEngine<R, D>
where
    R: Transceiver,
    D: DelayMs<u32> + DelayUs<u32>,
{
    /// Creates an engine. The radio is not touched until
    /// [`RangingEngine::init_radio`] is called.
    pub fn new(radio: R, delay: D, config: TagConfig) -> Self {
        RangingEngine {
            radio,
            delay,
            config,
            seq: Wrapping(0),
            record: ExchangeRecord::default(),
            state: State::Idle,
        }
    }

    /// Resets and configures the radio for ranging
    ///
    /// Used at boot and by the watchdog. Fails with
    /// [`Error::BadDeviceId`] if the radio isn't a DW3000, with
    /// [`Error::RadioNotIdle`] if it doesn't come out of reset and with
    /// [`Error::PllLockFailed`] if the PHY configuration doesn't take.
    pub fn init_radio(&mut self) -> Result<DeviceVariant, Error<R::Error>> {
        self.state = State::Idle;

        self.radio.hard_reset()?;

        let id = self.radio.read_device_id()?;
        let variant = DeviceVariant::from_id(id).ok_or(Error::BadDeviceId(id))?;
        info!(
            "DW3000 {:#010x}, silicon {}{}",
            id,
            match variant.revision {
                Revision::B0 => "B0",
                Revision::C0 => "C0",
            },
            if variant.pdoa { ", PDOA" } else { "" },
        );

        self.radio.soft_reset()?;
        self.wait_idle()?;

        self.radio.initialise()?;
        self.radio.configure(&self.config.radio)?;
        self.radio.configure_tx_rf(&self.config.tx)?;

        self.radio.set_rx_antenna_delay(self.config.antenna_delay)?;
        self.radio.set_tx_antenna_delay(self.config.antenna_delay)?;

        self.radio.set_rx_after_tx_delay(0)?;
        self.radio.set_rx_timeout(0)?;
        self.radio.set_preamble_detect_timeout(0)?;

        self.radio.set_lna_pa_mode(LnaPaMode::NONE)?;
        self.radio.configure_frame_filter(false, 0)?;
        self.radio.set_leds(false)?;

        debug!("radio configured");

        Ok(variant)
    }

    fn wait_idle(&mut self) -> Result<(), Error<R::Error>> {
        let radio = &mut self.radio;
        let result = block_timeout!(
            IDLE_TIMEOUT_MS,
            self.delay.delay_ms(1),
            match radio.check_idle() {
                Ok(true) => Ok(()),
                Ok(false) => Err(nb::Error::WouldBlock),
                Err(error) => Err(nb::Error::Other(error)),
            }
        );

        result.map_err(|err| match err {
            TimeoutError::Timeout => Error::RadioNotIdle,
            TimeoutError::Other(error) => error,
        })
    }

    /// Runs one complete ranging exchange
    ///
    /// Returns the measurement if the anchor answered. A lost FINAL is
    /// logged and reported in [`Measurement::final_sent`], but doesn't fail
    /// the cycle.
    pub fn cycle(&mut self) -> Result<Measurement, Error<R::Error>> {
        self.record = ExchangeRecord::default();

        let result = self.exchange();
        if result.is_err() {
            if let Err(error) = self.radio.force_trx_off() {
                warn!("failed to turn radio off: {}", error);
            }
        }

        self.state = State::Idle;
        result
    }

    fn exchange(&mut self) -> Result<Measurement, Error<R::Error>> {
        self.transition(State::PollTx);
        let seq = self.send_poll()?;
        self.record.seq = seq;

        self.transition(State::RespWait);
        let (response, resp_rx) = self.await_response()?;
        self.record.timestamps.resp_rx = resp_rx;
        self.record.timestamps.poll_rx_anchor = response.poll_rx_ts;
        self.record.timestamps.resp_tx_anchor = response.resp_tx_ts;

        self.transition(State::Compute);
        let distance_mm = self.record.timestamps.distance_mm();
        self.record.distance_mm = distance_mm;

        if distance_mm > MAX_PLAUSIBLE_MM {
            warn!(
                "seq {}: {} mm from anchor {:#06x} is out of range",
                seq, distance_mm, response.anchor.0,
            );
        } else {
            info!(
                "seq {}: {} mm from anchor {:#06x}",
                seq, distance_mm, response.anchor.0,
            );
        }

        self.transition(State::FinalTx);
        let final_sent = match self.send_final(response.anchor, distance_mm) {
            Ok(()) => true,
            Err(error) => {
                warn!("{}: {}", Error::<R::Error>::FinalTxFailed, error);
                self.radio.force_trx_off().ok();
                false
            }
        };

        self.transition(State::Idle);

        Ok(Measurement {
            seq,
            anchor: response.anchor,
            distance_mm,
            timestamps: self.record.timestamps,
            final_sent,
        })
    }

    fn transition(&mut self, state: State) {
        self.state = state;
        self.delay.delay_ms(STATE_SETTLE_MS);
    }

    fn next_seq(&mut self) -> u8 {
        let seq = self.seq.0;
        self.seq += Wrapping(1);
        seq
    }

    fn send_poll(&mut self) -> Result<u8, Error<R::Error>> {
        self.radio.force_trx_off()?;
        self.radio.write_sys_status(ALL_TX | ALL_RX_GOOD | ALL_RX_ERR)?;

        let seq = self.next_seq();
        let poll = frame::build_poll(seq, self.config.pan_id, self.config.address);

        let poll_tx = self.transmit(&poll, TxMode::ImmediateResponseExpected, true)?;
        self.record.timestamps.poll_tx = poll_tx;

        debug!("seq {}: POLL sent at {:#012x}", seq, poll_tx.value());

        Ok(seq)
    }

    /// Waits for a RESP, skipping anything else the receiver picks up
    fn await_response(&mut self) -> Result<(Response, Instant), Error<R::Error>> {
        let result = block_timeout!(
            RESP_TIMEOUT_MS / RESP_POLL_MS,
            self.delay.delay_ms(RESP_POLL_MS),
            self.poll_response()
        );

        result.map_err(|err| match err {
            TimeoutError::Timeout => Error::RespTimeout,
            TimeoutError::Other(error) => error,
        })
    }

    fn poll_response(&mut self) -> nb::Result<(Response, Instant), Error<R::Error>> {
        let sys_status = self.radio.read_sys_status()?;

        if sys_status & RXFCG != 0 {
            if let Some(response) = self.read_response()? {
                return Ok(response);
            }

            self.radio.write_sys_status(ALL_RX_GOOD)?;
            self.radio.rx_enable(RxMode::Immediate)?;
            return Err(nb::Error::WouldBlock);
        }

        if sys_status & (ALL_RX_ERR | ALL_RX_TO) != 0 {
            self.radio.write_sys_status(ALL_RX_ERR | ALL_RX_TO)?;
            self.radio.rx_enable(RxMode::Immediate)?;
        }

        Err(nb::Error::WouldBlock)
    }

    /// Reads the received frame, if it is a valid RESP
    fn read_response(&mut self) -> Result<Option<(Response, Instant)>, Error<R::Error>> {
        let len = self.radio.read_rx_finfo_len()? as usize;
        if len == 0 || len > MAX_FRAME_LEN {
            debug!("ignoring frame of length {}", len);
            return Ok(None);
        }

        let mut buffer = [0; MAX_FRAME_LEN];
        let frame = &mut buffer[..len];
        self.radio.read_rx_data(frame, 0)?;

        if MessageType::of(frame) != Some(MessageType::Response) {
            debug!("ignoring frame of type {:?}", frame.get(9));
            return Ok(None);
        }

        let resp_rx = self.radio.read_rx_timestamp()?;
        let response = match frame::parse_response(frame) {
            Ok(response) => response,
            Err(error) => {
                debug!("ignoring malformed RESP: {:?}", error);
                return Ok(None);
            }
        };

        self.radio.write_sys_status(ALL_RX_GOOD | ALL_RX_ERR)?;

        Ok(Some((response, resp_rx)))
    }

    fn send_final(&mut self, anchor: ShortAddress, distance_mm: u32) -> Result<(), Error<R::Error>> {
        self.radio.force_trx_off()?;

        let seq = self.next_seq();
        let report = frame::build_final(
            seq,
            self.config.pan_id,
            self.config.address,
            anchor,
            distance_mm,
        );

        self.transmit(&report, TxMode::Immediate, true)?;

        Ok(())
    }

    /// Broadcasts a BEACON announcing this tag
    pub fn send_beacon(&mut self, status: u8) -> Result<(), Error<R::Error>> {
        self.radio.force_trx_off()?;
        self.radio.write_sys_status(ALL_TX)?;

        let seq = self.next_seq();
        let info = TagInfo {
            address: self.config.address,
            status,
        };
        let beacon = frame::build_beacon(seq, self.config.pan_id, &info);

        let result = self.transmit(&beacon, TxMode::Immediate, false);
        if result.is_err() {
            self.radio.force_trx_off().ok();
        }
        result?;

        debug!("seq {}: BEACON sent", seq);

        Ok(())
    }

    /// Sends a frame and waits for it to go out
    fn transmit(
        &mut self,
        frame: &[u8],
        mode: TxMode,
        ranging: bool,
    ) -> Result<Instant, Error<R::Error>> {
        self.radio.write_tx_data(frame, 0)?;
        self.radio
            .write_tx_fctrl(frame.len() as u16 + FCS_LEN, 0, ranging)?;
        self.radio.start_tx(mode)?;

        let radio = &mut self.radio;
        let result = block_timeout!(
            TX_POLL_ATTEMPTS,
            self.delay.delay_us(TX_POLL_US),
            radio.wait_transmit()
        );

        result.map_err(|err| match err {
            TimeoutError::Timeout => Error::TxTimeout,
            TimeoutError::Other(error) => error,
        })
    }

    /// Sleeps on the engine's delay source
    pub fn sleep_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Where the engine is within an exchange
    pub fn state(&self) -> State {
        self.state
    }

    /// Scratch data of the last exchange
    pub fn record(&self) -> &ExchangeRecord {
        &self.record
    }

    /// The engine's configuration
    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    /// Access to the radio
    pub fn radio(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Releases radio and delay source
    pub fn free(self) -> (R, D) {
        (self.radio, self.delay)
    }
}
