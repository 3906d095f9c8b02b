//! SPI port the radio is connected to
//!
//! Implements [`dw3000::Bus`] on top of the `embedded-hal` SPI, pin and delay
//! traits: one blocking SPI master, a chip select line, the radio's reset
//! line and a delay source. The radio samples on the rising edge with the
//! clock idling low (SPI mode 0) and is driven at 2 MHz.

use core::fmt;

use embedded_hal::{
    blocking::{
        delay::{DelayMs, DelayUs},
        spi,
    },
    digital::v2::OutputPin,
    spi::{Mode, MODE_0},
};

/// SPI clock the radio is driven with
pub const SPI_FREQUENCY_HZ: u32 = 2_000_000;

/// SPI mode the radio expects
pub const SPI_MODE: Mode = MODE_0;

/// How long the reset line is held low
const RESET_LOW_MS: u32 = 10;

/// How long the radio needs to come up after reset
const RESET_RECOVERY_MS: u32 = 50;

/// Setup and hold time around chip select edges
const CS_SETTLE_US: u32 = 1;

/// The radio's SPI bus and control lines
pub struct SpiPort<SPI, CS, RST, D> {
    spi: SPI,
    cs: CS,
    rst: RST,
    delay: D,
}

impl<SPI, CS, RST, D> SpiPort<SPI, CS, RST, D>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
    RST: OutputPin,
    D: DelayMs<u32> + DelayUs<u32>,
{
    /// Takes ownership of the bus and puts both control lines in their idle
    /// state
    ///
    /// Chip select is deasserted and the reset line released. Fails with
    /// [`Error::NotReady`] if either line can't be driven.
    pub fn open(spi: SPI, mut cs: CS, mut rst: RST, delay: D) -> Result<Self, Error<SPI, CS, RST>> {
        cs.set_high().map_err(|_| Error::NotReady)?;
        rst.set_high().map_err(|_| Error::NotReady)?;

        Ok(SpiPort {
            spi,
            cs,
            rst,
            delay,
        })
    }

    /// Releases the peripherals
    pub fn free(self) -> (SPI, CS, RST, D) {
        (self.spi, self.cs, self.rst, self.delay)
    }

    fn assert_cs_low(&mut self) -> Result<(), Error<SPI, CS, RST>> {
        self.cs.set_low().map_err(|err| Error::ChipSelect(err))?;
        self.delay.delay_us(CS_SETTLE_US);
        Ok(())
    }

    fn assert_cs_high(&mut self) -> Result<(), Error<SPI, CS, RST>> {
        self.delay.delay_us(CS_SETTLE_US);
        self.cs.set_high().map_err(|err| Error::ChipSelect(err))?;
        Ok(())
    }

    fn write_all(&mut self, header: &[u8], body: &[u8]) -> Result<(), Error<SPI, CS, RST>> {
        <SPI as spi::Write<u8>>::write(&mut self.spi, header).map_err(|err| Error::Write(err))?;
        if !body.is_empty() {
            <SPI as spi::Write<u8>>::write(&mut self.spi, body).map_err(|err| Error::Write(err))?;
        }
        Ok(())
    }

    fn write_then_read(
        &mut self,
        header: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Error<SPI, CS, RST>> {
        <SPI as spi::Write<u8>>::write(&mut self.spi, header).map_err(|err| Error::Write(err))?;

        buffer.iter_mut().for_each(|b| *b = 0);
        self.spi
            .transfer(buffer)
            .map_err(|err| Error::Transfer(err))?;
        Ok(())
    }
}

impl<SPI, CS, RST, D> dw3000::Bus for SpiPort<SPI, CS, RST, D>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    <SPI as spi::Transfer<u8>>::Error: fmt::Debug,
    <SPI as spi::Write<u8>>::Error: fmt::Debug,
    CS: OutputPin,
    <CS as OutputPin>::Error: fmt::Debug,
    RST: OutputPin,
    <RST as OutputPin>::Error: fmt::Debug,
    D: DelayMs<u32> + DelayUs<u32>,
{
    type Error = Error<SPI, CS, RST>;

    fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error> {
        self.assert_cs_low()?;
        let result = self.write_all(header, body);
        // Release the radio even if the transfer failed
        self.assert_cs_high()?;
        result
    }

    fn read(&mut self, header: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.assert_cs_low()?;
        let result = self.write_then_read(header, buffer);
        self.assert_cs_high()?;
        result
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.rst.set_low().map_err(|err| Error::Reset(err))?;
        self.delay.delay_ms(RESET_LOW_MS);
        self.rst.set_high().map_err(|err| Error::Reset(err))?;
        self.delay.delay_ms(RESET_RECOVERY_MS);
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

/// An error that can occur when talking to the radio over SPI
pub enum Error<SPI, CS, RST>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
    RST: OutputPin,
{
    /// The control lines couldn't be put into their idle state
    NotReady,

    /// SPI error occured during a transfer transaction
    Transfer(<SPI as spi::Transfer<u8>>::Error),

    /// SPI error occured during a write transaction
    Write(<SPI as spi::Write<u8>>::Error),

    /// Error occured while changing chip select signal
    ChipSelect(<CS as OutputPin>::Error),

    /// Error occured while driving the reset line
    Reset(<RST as OutputPin>::Error),
}

// We can't derive this implementation, as the compiler will complain that the
// associated error type doesn't implement `Debug`.
impl<SPI, CS, RST> fmt::Debug for Error<SPI, CS, RST>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    <SPI as spi::Transfer<u8>>::Error: fmt::Debug,
    <SPI as spi::Write<u8>>::Error: fmt::Debug,
    CS: OutputPin,
    <CS as OutputPin>::Error: fmt::Debug,
    RST: OutputPin,
    <RST as OutputPin>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotReady => write!(f, "NotReady"),
            Error::Transfer(error) => write!(f, "Transfer({:?})", error),
            Error::Write(error) => write!(f, "Write({:?})", error),
            Error::ChipSelect(error) => write!(f, "ChipSelect({:?})", error),
            Error::Reset(error) => write!(f, "Reset({:?})", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dw3000::Bus;
    use std::{cell::RefCell, rc::Rc, vec, vec::Vec};

    #[derive(Clone, Debug, PartialEq)]
    enum Event {
        Write(Vec<u8>),
        Transfer(usize),
        Cs(bool),
        Rst(bool),
        DelayMs(u32),
        DelayUs(u32),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct FakeSpi {
        log: Log,
        reply: u8,
    }

    impl spi::Write<u8> for FakeSpi {
        type Error = ();

        fn write(&mut self, words: &[u8]) -> Result<(), ()> {
            self.log.borrow_mut().push(Event::Write(words.to_vec()));
            Ok(())
        }
    }

    impl spi::Transfer<u8> for FakeSpi {
        type Error = ();

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], ()> {
            self.log.borrow_mut().push(Event::Transfer(words.len()));
            for (i, word) in words.iter_mut().enumerate() {
                *word = self.reply.wrapping_add(i as u8);
            }
            Ok(words)
        }
    }

    struct FakePin {
        log: Log,
        reset: bool,
        broken: bool,
    }

    impl OutputPin for FakePin {
        type Error = ();

        fn set_low(&mut self) -> Result<(), ()> {
            self.set(false)
        }

        fn set_high(&mut self) -> Result<(), ()> {
            self.set(true)
        }
    }

    impl FakePin {
        fn set(&mut self, level: bool) -> Result<(), ()> {
            if self.broken {
                return Err(());
            }
            let event = if self.reset { Event::Rst(level) } else { Event::Cs(level) };
            self.log.borrow_mut().push(event);
            Ok(())
        }
    }

    struct FakeDelay {
        log: Log,
    }

    impl DelayMs<u32> for FakeDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.log.borrow_mut().push(Event::DelayMs(ms));
        }
    }

    impl DelayUs<u32> for FakeDelay {
        fn delay_us(&mut self, us: u32) {
            self.log.borrow_mut().push(Event::DelayUs(us));
        }
    }

    type Port = SpiPort<FakeSpi, FakePin, FakePin, FakeDelay>;

    fn port(log: &Log) -> Port {
        let pin = |reset| FakePin {
            log: log.clone(),
            reset,
            broken: false,
        };
        let spi = FakeSpi {
            log: log.clone(),
            reply: 0x10,
        };
        let port = SpiPort::open(spi, pin(false), pin(true), FakeDelay { log: log.clone() });
        log.borrow_mut().clear();
        port.unwrap()
    }

    #[test]
    fn open_idles_control_lines() {
        let log = Log::default();
        let spi = FakeSpi {
            log: log.clone(),
            reply: 0,
        };
        let cs = FakePin {
            log: log.clone(),
            reset: false,
            broken: false,
        };
        let rst = FakePin {
            log: log.clone(),
            reset: true,
            broken: false,
        };

        assert!(SpiPort::open(spi, cs, rst, FakeDelay { log: log.clone() }).is_ok());
        assert_eq!(*log.borrow(), vec![Event::Cs(true), Event::Rst(true)]);
    }

    #[test]
    fn broken_chip_select_is_not_ready() {
        let log = Log::default();
        let spi = FakeSpi {
            log: log.clone(),
            reply: 0,
        };
        let cs = FakePin {
            log: log.clone(),
            reset: false,
            broken: true,
        };
        let rst = FakePin {
            log: log.clone(),
            reset: true,
            broken: false,
        };

        let result = SpiPort::open(spi, cs, rst, FakeDelay { log: log.clone() });
        assert!(matches!(result, Err(Error::NotReady)));
    }

    #[test]
    fn write_frames_header_and_body_with_chip_select() {
        let log = Log::default();
        let mut port = port(&log);

        port.write(&[0xc8, 0x90], &[1, 2, 3]).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Event::Cs(false),
                Event::DelayUs(1),
                Event::Write(vec![0xc8, 0x90]),
                Event::Write(vec![1, 2, 3]),
                Event::DelayUs(1),
                Event::Cs(true),
            ]
        );
    }

    #[test]
    fn fast_command_has_no_body() {
        let log = Log::default();
        let mut port = port(&log);

        port.write(&[0x83], &[]).unwrap();

        let writes = log
            .borrow()
            .iter()
            .filter(|event| matches!(event, Event::Write(_)))
            .count();
        assert_eq!(writes, 1);
    }

    #[test]
    fn read_clocks_in_after_header() {
        let log = Log::default();
        let mut port = port(&log);

        let mut buffer = [0xff; 4];
        port.read(&[0x00], &mut buffer).unwrap();

        assert_eq!(buffer, [0x10, 0x11, 0x12, 0x13]);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Cs(false),
                Event::DelayUs(1),
                Event::Write(vec![0x00]),
                Event::Transfer(4),
                Event::DelayUs(1),
                Event::Cs(true),
            ]
        );
    }

    #[test]
    fn reset_pulses_line() {
        let log = Log::default();
        let mut port = port(&log);

        port.reset().unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Event::Rst(false),
                Event::DelayMs(10),
                Event::Rst(true),
                Event::DelayMs(50),
            ]
        );
    }
}
