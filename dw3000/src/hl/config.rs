use super::{LnaPaMode, Status};
use crate::{ll, Config, Error, TxConfig, DW3000};

/// How often the PLL lock bit is checked after calibration
const PLL_LOCK_RETRIES: u32 = 6;

/// Pause between two PLL lock checks
const PLL_LOCK_POLL_US: u32 = 20;

impl<B> DW3000<B>
where
    B: ll::Bus,
{
    /// Applies the PHY configuration and locks the PLL
    ///
    /// Returns [`Error::PllLockFailed`] if the PLL doesn't lock for the
    /// requested channel, and [`Error::InvalidConfiguration`] for settings
    /// the radio doesn't support.
    pub fn configure(&mut self, config: &Config) -> Result<(), Error<B>> {
        if !config.is_valid() {
            return Err(Error::InvalidConfiguration);
        }

        self.ll.chan_ctrl().write(|w| {
            w.rf_chan(config.channel as u8)
                .sfd_type(config.sfd_type as u8)
                .tx_pcode(config.tx_preamble_code)
                .rx_pcode(config.rx_preamble_code)
        })?;

        self.ll.sys_cfg().modify(|_, w| {
            w.phr_mode(config.phr_mode as u8)
                .phr_6m8(config.phr_rate as u8)
                .cp_spc(config.sts_mode as u8)
                .pdoa_mode(config.pdoa_mode as u8)
        })?;

        self.ll.tx_fctrl().modify(|_, w| {
            w.txbr(config.bitrate as u8)
                .txpsr(config.preamble_length.txpsr())
        })?;

        self.ll.dtune0().modify(|_, w| w.pac(config.pac as u8))?;
        self.ll
            .rx_sfd_toc()
            .write(|w| w.value(config.sfd_timeout))?;

        self.ll
            .pll_cfg()
            .write(|w| w.value(config.channel.pll_config()))?;
        self.ll.pll_cal().modify(|_, w| w.use_old(0b1).cal_en(0b1))?;

        let mut locked = false;
        for _ in 0..PLL_LOCK_RETRIES {
            self.ll.bus().delay_us(PLL_LOCK_POLL_US);
            if self.pll_locked()? {
                locked = true;
                break;
            }
        }
        if !locked {
            return Err(Error::PllLockFailed);
        }

        self.state = Status::Configured;

        Ok(())
    }

    /// Whether the clock PLL reports lock
    pub fn pll_locked(&mut self) -> Result<bool, Error<B>> {
        Ok(self.ll.sys_status().read()?.cplock() == 0b1)
    }

    /// Sets pulse generator delay and TX power
    ///
    /// Pulse generator calibration isn't supported, so `pg_count` has to be
    /// zero.
    pub fn configure_tx_rf(&mut self, config: &TxConfig) -> Result<(), Error<B>> {
        if config.pg_count != 0 {
            return Err(Error::InvalidConfiguration);
        }

        self.ll
            .tx_ctrl_hi()
            .modify(|_, w| w.tx_pg_delay(config.pg_delay))?;
        self.ll.tx_power().write(|w| w.value(config.power))?;

        Ok(())
    }

    /// Sets the RX antenna delay, in device time units
    pub fn set_rx_antenna_delay(&mut self, delay: u16) -> Result<(), Error<B>> {
        self.ll.cia_conf().modify(|_, w| w.rxantd(delay))?;
        Ok(())
    }

    /// Sets the TX antenna delay, in device time units
    pub fn set_tx_antenna_delay(&mut self, delay: u16) -> Result<(), Error<B>> {
        self.ll.tx_antd().write(|w| w.value(delay))?;
        Ok(())
    }

    /// Sets the turnaround between the end of a transmission and the
    /// receiver turning on, for [`TxMode::ImmediateResponseExpected`]
    ///
    /// [`TxMode::ImmediateResponseExpected`]: super::TxMode::ImmediateResponseExpected
    pub fn set_rx_after_tx_delay(&mut self, delay_us: u32) -> Result<(), Error<B>> {
        self.ll.ack_resp().modify(|_, w| w.w4r_tim(delay_us))?;
        Ok(())
    }

    /// Sets the frame wait timeout. Zero disables the timeout.
    pub fn set_rx_timeout(&mut self, timeout_us: u32) -> Result<(), Error<B>> {
        self.ll.rx_fwto().write(|w| w.value(timeout_us))?;
        self.ll
            .sys_cfg()
            .modify(|_, w| w.rxwtoe((timeout_us > 0) as u8))?;
        Ok(())
    }

    /// Sets the preamble detection timeout, in PAC units. Zero disables it.
    pub fn set_preamble_detect_timeout(&mut self, timeout: u16) -> Result<(), Error<B>> {
        self.ll.pre_toc().write(|w| w.value(timeout))?;
        Ok(())
    }

    /// Hands GPIO4 to GPIO6 to external amplifiers, or back to GPIO use
    pub fn set_lna_pa_mode(&mut self, mode: LnaPaMode) -> Result<(), Error<B>> {
        self.ll.gpio_mode().modify(|_, w| {
            w.msgp4(mode.pa as u8)
                .msgp5(mode.pa as u8)
                .msgp6(mode.lna as u8)
        })?;
        Ok(())
    }

    /// Enables or disables hardware frame filtering
    ///
    /// `allow` is written to FF_CFG and selects which frame types pass.
    pub fn configure_frame_filter(&mut self, enabled: bool, allow: u16) -> Result<(), Error<B>> {
        self.ll.ff_cfg().write(|w| w.value(if enabled { allow } else { 0 }))?;
        self.ll.sys_cfg().modify(|_, w| w.ffen(enabled as u8))?;
        Ok(())
    }

    /// Enables or disables the RX/TX activity LEDs on GPIO2 and GPIO3
    pub fn set_leds(&mut self, enabled: bool) -> Result<(), Error<B>> {
        self.ll
            .gpio_mode()
            .modify(|_, w| w.msgp2(enabled as u8).msgp3(enabled as u8))?;
        self.ll
            .led_ctrl()
            .modify(|_, w| w.blink_en(enabled as u8).blink_tim(0x10))?;
        Ok(())
    }
}
