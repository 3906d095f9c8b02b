use super::{DeviceVariant, Status};
use crate::{ll, status, Error, DW3000};

/// Default crystal trim, used when the part wasn't trimmed in production
const DEFAULT_XTAL_TRIM: u8 = 0x2e;

/// Recommended DTUNE3 value. See user manual, section 8.2.7.
const DTUNE3_DEFAULT: u32 = 0xaf5f_584c;

impl<B> DW3000<B>
where
    B: ll::Bus,
{
    /// Reads the 32-bit device ID
    pub fn read_device_id(&mut self) -> Result<u32, Error<B>> {
        Ok(self.ll.dev_id().read()?.value())
    }

    /// Resets every block of the radio, keeping the SPI configuration
    ///
    /// The system clock is forced to the crystal first, as the PLL goes away
    /// during the reset.
    pub fn soft_reset(&mut self) -> Result<(), Error<B>> {
        self.ll.clk_ctrl().modify(|_, w| w.sys_clk(0b01))?;

        self.ll.soft_rst().write(|w| w.value(0x000))?;
        self.ll.bus().delay_ms(1);
        self.ll.soft_rst().write(|w| w.value(0x1ff))?;

        self.state = Status::Uninitialized;

        Ok(())
    }

    /// Checks whether the radio has reached IDLE_RC after a reset
    pub fn check_idle(&mut self) -> Result<bool, Error<B>> {
        let sys_status = self.ll.sys_status().read()?;

        Ok(sys_status.rcinit() == 0b1 && sys_status.spirdy() == 0b1)
    }

    /// Initialises the radio
    ///
    /// Verifies the device ID, writes the tuning values that differ from the
    /// reset defaults and masks all events, as the driver works by polling.
    pub fn initialise(&mut self) -> Result<DeviceVariant, Error<B>> {
        let id = self.read_device_id()?;
        let variant = DeviceVariant::from_id(id).ok_or(Error::BadDeviceId(id))?;

        // Move on to IDLE_PLL on its own, so the PLL is running before the
        // first transmission.
        self.ll.seq_ctrl().modify(|_, w| w.ainit2idle(0b1))?;

        // Set DTUNE3. See user manual, section 8.2.7.
        self.ll.dtune3().write(|w| w.value(DTUNE3_DEFAULT))?;

        if self.ll.xtal().read()?.value() == 0 {
            self.ll.xtal().write(|w| w.value(DEFAULT_XTAL_TRIM))?;
        }

        // Keep CIA diagnostics minimal, only the timestamps are needed.
        self.ll.cia_conf().modify(|_, w| w.mindiag(0b1))?;

        self.ll.sys_enable().write(|w| w.value(0))?;
        self.ll.sys_status().write(|w| {
            w.value(status::ALL_TX | status::ALL_RX_GOOD | status::ALL_RX_ERR | status::ALL_RX_TO)
        })?;

        self.state = Status::Ready;

        Ok(variant)
    }
}
