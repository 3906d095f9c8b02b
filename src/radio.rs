//! The operations the ranging engine needs from a transceiver
//!
//! [`Transceiver`] is implemented for the DW3000 driver. The engine is
//! written against the trait only, so the ranging logic can run against a
//! scripted radio in tests.

use core::fmt;

use dw3000::{
    hl, ll, time::Instant, Bus, Config, DeviceVariant, LnaPaMode, RxMode, TxConfig, TxMode,
    DW3000,
};

use crate::{diagnostics, Error};

/// A UWB transceiver driven by polling
///
/// Status bits and masks are those of the DW3000 `SYS_STATUS` register, see
/// [`dw3000::status`].
pub trait Transceiver {
    /// Error reported by the driver
    type Error: fmt::Debug;

    /// Pulses the reset line and waits for the radio to come back up
    fn hard_reset(&mut self) -> Result<(), Error<Self::Error>>;

    /// Reads the 32-bit device ID
    fn read_device_id(&mut self) -> Result<u32, Error<Self::Error>>;

    /// Reads the device ID register as raw bytes, bypassing the driver
    fn probe_device_id(&mut self) -> Result<[u8; 4], Error<Self::Error>>;

    /// Resets the radio's digital blocks
    fn soft_reset(&mut self) -> Result<(), Error<Self::Error>>;

    /// Whether the radio has reached IDLE_RC
    fn check_idle(&mut self) -> Result<bool, Error<Self::Error>>;

    /// Loads the tuning values the radio needs after reset
    fn initialise(&mut self) -> Result<DeviceVariant, Error<Self::Error>>;

    /// Applies the PHY configuration and locks the PLL
    fn configure(&mut self, config: &Config) -> Result<(), Error<Self::Error>>;

    /// Applies the transmitter RF settings
    fn configure_tx_rf(&mut self, config: &TxConfig) -> Result<(), Error<Self::Error>>;

    /// Sets the RX antenna delay
    fn set_rx_antenna_delay(&mut self, delay: u16) -> Result<(), Error<Self::Error>>;

    /// Sets the TX antenna delay
    fn set_tx_antenna_delay(&mut self, delay: u16) -> Result<(), Error<Self::Error>>;

    /// Sets the delay between a transmission and the receiver turning on
    fn set_rx_after_tx_delay(&mut self, delay_us: u32) -> Result<(), Error<Self::Error>>;

    /// Sets the frame wait timeout, zero disables it
    fn set_rx_timeout(&mut self, timeout_us: u32) -> Result<(), Error<Self::Error>>;

    /// Sets the preamble detection timeout, zero disables it
    fn set_preamble_detect_timeout(&mut self, timeout: u16) -> Result<(), Error<Self::Error>>;

    /// Configures the external amplifier control lines
    fn set_lna_pa_mode(&mut self, mode: LnaPaMode) -> Result<(), Error<Self::Error>>;

    /// Configures frame filtering
    fn configure_frame_filter(&mut self, enabled: bool, allow: u16)
        -> Result<(), Error<Self::Error>>;

    /// Switches the radio's activity LEDs
    fn set_leds(&mut self, enabled: bool) -> Result<(), Error<Self::Error>>;

    /// Aborts any transmission or reception and clears all event flags
    fn force_trx_off(&mut self) -> Result<(), Error<Self::Error>>;

    /// Writes a frame into the TX buffer
    fn write_tx_data(&mut self, data: &[u8], offset: u16) -> Result<(), Error<Self::Error>>;

    /// Sets the length, including the FCS, of the frame to send
    fn write_tx_fctrl(&mut self, len: u16, offset: u16, ranging: bool)
        -> Result<(), Error<Self::Error>>;

    /// Starts a transmission
    fn start_tx(&mut self, mode: TxMode) -> Result<(), Error<Self::Error>>;

    /// Completes once the frame is sent, returning the TX timestamp
    fn wait_transmit(&mut self) -> nb::Result<Instant, Error<Self::Error>>;

    /// Turns the receiver on
    fn rx_enable(&mut self, mode: RxMode) -> Result<(), Error<Self::Error>>;

    /// Reads the low 32 bits of the event register
    fn read_sys_status(&mut self) -> Result<u32, Error<Self::Error>>;

    /// Clears the event bits set in `mask`
    fn write_sys_status(&mut self, mask: u32) -> Result<(), Error<Self::Error>>;

    /// Length of the last received frame, including the FCS
    fn read_rx_finfo_len(&mut self) -> Result<u16, Error<Self::Error>>;

    /// Copies the last received frame out of the RX buffer
    fn read_rx_data(&mut self, buffer: &mut [u8], offset: u16) -> Result<(), Error<Self::Error>>;

    /// Timestamp of the last transmission
    fn read_tx_timestamp(&mut self) -> Result<Instant, Error<Self::Error>>;

    /// Timestamp of the last reception
    fn read_rx_timestamp(&mut self) -> Result<Instant, Error<Self::Error>>;
}

impl<B: Bus> From<hl::Error<B>> for Error<hl::Error<B>> {
    fn from(error: hl::Error<B>) -> Self {
        match error {
            hl::Error::BadDeviceId(id) => Error::BadDeviceId(id),
            hl::Error::PllLockFailed => Error::PllLockFailed,
            error => Error::Radio(error),
        }
    }
}

impl<B: Bus> Transceiver for DW3000<B> {
    type Error = hl::Error<B>;

    fn hard_reset(&mut self) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::hard_reset(self)?)
    }

    fn read_device_id(&mut self) -> Result<u32, Error<Self::Error>> {
        Ok(DW3000::read_device_id(self)?)
    }

    fn probe_device_id(&mut self) -> Result<[u8; 4], Error<Self::Error>> {
        diagnostics::probe_bus(self.ll().bus())
            .map_err(|err| Error::Radio(hl::Error::Bus(ll::Error::Read(err))))
    }

    fn soft_reset(&mut self) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::soft_reset(self)?)
    }

    fn check_idle(&mut self) -> Result<bool, Error<Self::Error>> {
        Ok(DW3000::check_idle(self)?)
    }

    fn initialise(&mut self) -> Result<DeviceVariant, Error<Self::Error>> {
        Ok(DW3000::initialise(self)?)
    }

    fn configure(&mut self, config: &Config) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::configure(self, config)?)
    }

    fn configure_tx_rf(&mut self, config: &TxConfig) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::configure_tx_rf(self, config)?)
    }

    fn set_rx_antenna_delay(&mut self, delay: u16) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::set_rx_antenna_delay(self, delay)?)
    }

    fn set_tx_antenna_delay(&mut self, delay: u16) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::set_tx_antenna_delay(self, delay)?)
    }

    fn set_rx_after_tx_delay(&mut self, delay_us: u32) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::set_rx_after_tx_delay(self, delay_us)?)
    }

    fn set_rx_timeout(&mut self, timeout_us: u32) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::set_rx_timeout(self, timeout_us)?)
    }

    fn set_preamble_detect_timeout(&mut self, timeout: u16) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::set_preamble_detect_timeout(self, timeout)?)
    }

    fn set_lna_pa_mode(&mut self, mode: LnaPaMode) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::set_lna_pa_mode(self, mode)?)
    }

    fn configure_frame_filter(
        &mut self,
        enabled: bool,
        allow: u16,
    ) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::configure_frame_filter(self, enabled, allow)?)
    }

    fn set_leds(&mut self, enabled: bool) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::set_leds(self, enabled)?)
    }

    fn force_trx_off(&mut self) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::force_trx_off(self)?)
    }

    fn write_tx_data(&mut self, data: &[u8], offset: u16) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::write_tx_data(self, data, offset)?)
    }

    fn write_tx_fctrl(
        &mut self,
        len: u16,
        offset: u16,
        ranging: bool,
    ) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::write_tx_fctrl(self, len, offset, ranging)?)
    }

    fn start_tx(&mut self, mode: TxMode) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::start_tx(self, mode)?)
    }

    fn wait_transmit(&mut self) -> nb::Result<Instant, Error<Self::Error>> {
        DW3000::wait_transmit(self).map_err(|err| err.map(Error::from))
    }

    fn rx_enable(&mut self, mode: RxMode) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::rx_enable(self, mode)?)
    }

    fn read_sys_status(&mut self) -> Result<u32, Error<Self::Error>> {
        Ok(DW3000::read_sys_status(self)?)
    }

    fn write_sys_status(&mut self, mask: u32) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::write_sys_status(self, mask)?)
    }

    fn read_rx_finfo_len(&mut self) -> Result<u16, Error<Self::Error>> {
        Ok(DW3000::read_rx_finfo_len(self)?)
    }

    fn read_rx_data(&mut self, buffer: &mut [u8], offset: u16) -> Result<(), Error<Self::Error>> {
        Ok(DW3000::read_rx_data(self, buffer, offset)?)
    }

    fn read_tx_timestamp(&mut self) -> Result<Instant, Error<Self::Error>> {
        Ok(DW3000::read_tx_timestamp(self)?)
    }

    fn read_rx_timestamp(&mut self) -> Result<Instant, Error<Self::Error>> {
        Ok(DW3000::read_rx_timestamp(self)?)
    }
}
