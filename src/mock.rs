//! Scripted radio and virtual time for host tests

use std::{cell::Cell, collections::VecDeque, rc::Rc, vec::Vec};

use dw3000::{
    status::{ALL_RX_ERR, ALL_RX_GOOD, ALL_RX_TO, ALL_TX, RCINIT, RXFCG, SPIRDY, TXFRS},
    time::Instant,
    Config, DeviceVariant, LnaPaMode, RxMode, TxConfig, TxMode,
};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use ieee802154::mac::ShortAddress;

use crate::{
    config::TagConfig,
    controller::Clock,
    engine::RangingEngine,
    frame::{self, MessageType},
    radio::Transceiver,
    Error,
};

/// Microseconds since the start of the test
pub type Now = Rc<Cell<u64>>;

/// Address the scripted anchor answers from
pub const ANCHOR: ShortAddress = ShortAddress(0x1234);

/// Bad FCS, one of the RX error bits
const RXFCE: u32 = 0x0000_8000;

/// Delay that advances virtual time instead of sleeping
pub struct FakeDelay {
    pub now: Now,
}

impl DelayMs<u32> for FakeDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.now.set(self.now.get() + ms as u64 * 1000);
    }
}

impl DelayUs<u32> for FakeDelay {
    fn delay_us(&mut self, us: u32) {
        self.now.set(self.now.get() + us as u64);
    }
}

/// Reads virtual time
pub struct FakeClock {
    pub now: Now,
}

impl Clock for FakeClock {
    fn now_ms(&mut self) -> u32 {
        (self.now.get() / 1000) as u32
    }
}

/// Error of the scripted radio
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fault;

/// Something the receiver picks up
#[derive(Clone, Debug, PartialEq)]
pub enum RxEvent {
    /// A frame with a good FCS, without the FCS
    Frame { data: Vec<u8>, rx_ts: u64 },
    /// A frame with a bad FCS
    Error,
}

/// An event `after_us` after a POLL went out
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub after_us: u64,
    pub event: RxEvent,
}

#[derive(Clone, Debug)]
struct Scheduled {
    at_us: u64,
    event: RxEvent,
}

/// A frame the tag sent
#[derive(Clone, Debug, PartialEq)]
pub struct Sent {
    pub data: Vec<u8>,
    pub len: u16,
    pub mode: TxMode,
    pub ranging: bool,
    pub at_us: u64,
}

impl Sent {
    pub fn message(&self) -> Option<MessageType> {
        MessageType::of(&self.data)
    }

    pub fn seq(&self) -> u8 {
        self.data[2]
    }
}

/// A DW3000 stand-in that answers POLLs from a script
pub struct FakeRadio {
    pub now: Now,
    pub device_id: u32,
    pub idle: bool,
    pub pll_locks: bool,
    /// The bus reads all zeros until this many hard resets have happened
    pub dead_resets: usize,
    /// Transmissions never complete
    pub tx_stuck: bool,
    /// FINAL transmissions never complete
    pub final_stuck: bool,
    pub sent: Vec<Sent>,
    /// TX timestamps to hand out, `default_tx_ts` once empty
    pub tx_timestamps: VecDeque<u64>,
    pub default_tx_ts: u64,
    /// Replies to the next POLLs, one entry per POLL
    pub script: VecDeque<Vec<Reply>>,
    /// Replies to every POLL once the script is used up
    pub always: Option<Vec<Reply>>,
    pub hard_resets: usize,
    pub inits: usize,
    pub force_offs: usize,
    pub rx_enables: usize,
    pub antenna_delays: (u16, u16),
    status: u32,
    pending: VecDeque<Scheduled>,
    rx_since: Option<u64>,
    tx_buffer: Vec<u8>,
    tx_len: u16,
    tx_ranging: bool,
    tx_ts: u64,
    rx_frame: Vec<u8>,
    rx_ts: u64,
}

impl FakeRadio {
    pub fn new() -> Self {
        FakeRadio {
            now: Now::default(),
            device_id: 0xdeca_0302,
            idle: true,
            pll_locks: true,
            dead_resets: 0,
            tx_stuck: false,
            final_stuck: false,
            sent: Vec::new(),
            tx_timestamps: VecDeque::new(),
            default_tx_ts: 0,
            script: VecDeque::new(),
            always: None,
            hard_resets: 0,
            inits: 0,
            force_offs: 0,
            rx_enables: 0,
            antenna_delays: (0, 0),
            status: 0,
            pending: VecDeque::new(),
            rx_since: None,
            tx_buffer: Vec::new(),
            tx_len: 0,
            tx_ranging: false,
            tx_ts: 0,
            rx_frame: Vec::new(),
            rx_ts: 0,
        }
    }

    /// Frames sent with the given message type
    pub fn sent_of_type(&self, message: MessageType) -> impl Iterator<Item = &Sent> {
        self.sent
            .iter()
            .filter(move |sent| sent.message() == Some(message))
    }

    fn id(&self) -> u32 {
        if self.hard_resets <= self.dead_resets {
            0
        } else {
            self.device_id
        }
    }

    /// Whether the receiver is currently on
    pub fn receiving(&self) -> bool {
        self.rx_since.is_some()
    }

    /// Delivers due events. Frames arriving while the receiver is off are
    /// lost.
    fn advance(&mut self) {
        let now = self.now.get();

        while let Some(next) = self.pending.front() {
            if next.at_us > now {
                break;
            }
            let next = self.pending.pop_front().unwrap();

            match self.rx_since {
                Some(since) if next.at_us >= since => {
                    self.latch(next.event);
                    break;
                }
                _ => continue,
            }
        }
    }

    fn latch(&mut self, event: RxEvent) {
        match event {
            RxEvent::Frame { data, rx_ts } => {
                self.rx_frame = data;
                self.rx_ts = rx_ts;
                self.status |= RXFCG | 0x0f00;
            }
            RxEvent::Error => self.status |= RXFCE,
        }
        self.rx_since = None;
    }

    fn schedule_replies(&mut self) {
        let replies = match self.script.pop_front() {
            Some(replies) => replies,
            None => match &self.always {
                Some(replies) => replies.clone(),
                None => return,
            },
        };

        let now = self.now.get();
        for reply in replies {
            self.pending.push_back(Scheduled {
                at_us: now + reply.after_us,
                event: reply.event,
            });
        }
    }
}

impl Transceiver for FakeRadio {
    type Error = Fault;

    fn hard_reset(&mut self) -> Result<(), Error<Fault>> {
        self.hard_resets += 1;
        self.status = RCINIT | SPIRDY;
        self.rx_since = None;
        self.pending.clear();
        Ok(())
    }

    fn read_device_id(&mut self) -> Result<u32, Error<Fault>> {
        Ok(self.id())
    }

    fn probe_device_id(&mut self) -> Result<[u8; 4], Error<Fault>> {
        Ok(self.id().to_le_bytes())
    }

    fn soft_reset(&mut self) -> Result<(), Error<Fault>> {
        Ok(())
    }

    fn check_idle(&mut self) -> Result<bool, Error<Fault>> {
        Ok(self.idle)
    }

    fn initialise(&mut self) -> Result<DeviceVariant, Error<Fault>> {
        self.inits += 1;
        let id = self.id();
        DeviceVariant::from_id(id).ok_or(Error::BadDeviceId(id))
    }

    fn configure(&mut self, _: &Config) -> Result<(), Error<Fault>> {
        if self.pll_locks {
            Ok(())
        } else {
            Err(Error::PllLockFailed)
        }
    }

    fn configure_tx_rf(&mut self, _: &TxConfig) -> Result<(), Error<Fault>> {
        Ok(())
    }

    fn set_rx_antenna_delay(&mut self, delay: u16) -> Result<(), Error<Fault>> {
        self.antenna_delays.1 = delay;
        Ok(())
    }

    fn set_tx_antenna_delay(&mut self, delay: u16) -> Result<(), Error<Fault>> {
        self.antenna_delays.0 = delay;
        Ok(())
    }

    fn set_rx_after_tx_delay(&mut self, _: u32) -> Result<(), Error<Fault>> {
        Ok(())
    }

    fn set_rx_timeout(&mut self, _: u32) -> Result<(), Error<Fault>> {
        Ok(())
    }

    fn set_preamble_detect_timeout(&mut self, _: u16) -> Result<(), Error<Fault>> {
        Ok(())
    }

    fn set_lna_pa_mode(&mut self, _: LnaPaMode) -> Result<(), Error<Fault>> {
        Ok(())
    }

    fn configure_frame_filter(&mut self, _: bool, _: u16) -> Result<(), Error<Fault>> {
        Ok(())
    }

    fn set_leds(&mut self, _: bool) -> Result<(), Error<Fault>> {
        Ok(())
    }

    fn force_trx_off(&mut self) -> Result<(), Error<Fault>> {
        self.force_offs += 1;
        self.rx_since = None;
        self.status &= !(ALL_TX | ALL_RX_GOOD | ALL_RX_ERR | ALL_RX_TO);
        Ok(())
    }

    fn write_tx_data(&mut self, data: &[u8], _: u16) -> Result<(), Error<Fault>> {
        self.tx_buffer = data.to_vec();
        Ok(())
    }

    fn write_tx_fctrl(&mut self, len: u16, _: u16, ranging: bool) -> Result<(), Error<Fault>> {
        self.tx_len = len;
        self.tx_ranging = ranging;
        Ok(())
    }

    fn start_tx(&mut self, mode: TxMode) -> Result<(), Error<Fault>> {
        let sent = Sent {
            data: self.tx_buffer.clone(),
            len: self.tx_len,
            mode,
            ranging: self.tx_ranging,
            at_us: self.now.get(),
        };
        let message = sent.message();
        self.sent.push(sent);

        let stuck = self.tx_stuck || (self.final_stuck && message == Some(MessageType::Final));
        if stuck {
            return Ok(());
        }

        self.tx_ts = self.tx_timestamps.pop_front().unwrap_or(self.default_tx_ts);
        self.status |= TXFRS;

        if mode == TxMode::ImmediateResponseExpected {
            self.rx_since = Some(self.now.get());
            if message == Some(MessageType::Poll) {
                self.schedule_replies();
            }
        }

        Ok(())
    }

    fn wait_transmit(&mut self) -> nb::Result<Instant, Error<Fault>> {
        if self.status & TXFRS == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.status &= !TXFRS;
        Ok(Instant::from_register(self.tx_ts))
    }

    fn rx_enable(&mut self, _: RxMode) -> Result<(), Error<Fault>> {
        self.rx_enables += 1;
        self.rx_since = Some(self.now.get());
        Ok(())
    }

    fn read_sys_status(&mut self) -> Result<u32, Error<Fault>> {
        self.advance();
        Ok(self.status)
    }

    fn write_sys_status(&mut self, mask: u32) -> Result<(), Error<Fault>> {
        self.status &= !mask;
        Ok(())
    }

    fn read_rx_finfo_len(&mut self) -> Result<u16, Error<Fault>> {
        Ok((self.rx_frame.len() + 2) as u16)
    }

    fn read_rx_data(&mut self, buffer: &mut [u8], offset: u16) -> Result<(), Error<Fault>> {
        for (i, b) in buffer.iter_mut().enumerate() {
            *b = self
                .rx_frame
                .get(offset as usize + i)
                .copied()
                .unwrap_or(0);
        }
        Ok(())
    }

    fn read_tx_timestamp(&mut self) -> Result<Instant, Error<Fault>> {
        Ok(Instant::from_register(self.tx_ts))
    }

    fn read_rx_timestamp(&mut self) -> Result<Instant, Error<Fault>> {
        Ok(Instant::from_register(self.rx_ts))
    }
}

/// A RESP from [`ANCHOR`]
pub fn response(seq: u8, poll_rx: u64, resp_tx: u64) -> Vec<u8> {
    frame::build_response(
        seq,
        crate::config::PAN_ID,
        ANCHOR,
        crate::config::TAG_ADDRESS,
        Instant::from_register(poll_rx),
        Instant::from_register(resp_tx),
    )
    .to_vec()
}

/// The anchor answering 2 ms after the POLL, 0x180 DU (1802 mm) away,
/// given a POLL sent at tag time 0
pub fn nominal_reply() -> Reply {
    Reply {
        after_us: 2000,
        event: RxEvent::Frame {
            data: response(0, 0x100, 0x1f_fe00),
            rx_ts: 0x20_0000,
        },
    }
}

/// An engine on a scripted radio, with the clock driving both
pub fn engine(radio: FakeRadio, config: TagConfig) -> (RangingEngine<FakeRadio, FakeDelay>, Now) {
    let now = radio.now.clone();
    let delay = FakeDelay { now: now.clone() };
    (RangingEngine::new(radio, delay, config), now)
}

/// An engine whose anchor answers every POLL like [`nominal_reply`]
pub fn nominal_engine(config: TagConfig) -> (RangingEngine<FakeRadio, FakeDelay>, Now) {
    let mut radio = FakeRadio::new();
    radio.always = Some(std::vec![nominal_reply()]);
    engine(radio, config)
}
