use super::{RxMode, Status};
use crate::{
    ll::{self, FastCommand},
    time::Instant,
    Error, DW3000,
};

impl<B> DW3000<B>
where
    B: ll::Bus,
{
    /// Turns the receiver on
    ///
    /// Completion, errors and timeouts show up in SYS_STATUS, see
    /// [`DW3000::read_sys_status`].
    pub fn rx_enable(&mut self, mode: RxMode) -> Result<(), Error<B>> {
        match mode {
            RxMode::Immediate => self.ll.fast_command(FastCommand::Rx)?,
        }

        self.state = Status::Receiving;

        Ok(())
    }

    /// Reads the lower 32 bits of SYS_STATUS
    ///
    /// Use the masks in [`crate::status`] to interpret the value.
    pub fn read_sys_status(&mut self) -> Result<u32, Error<B>> {
        Ok(self.ll.sys_status().read()?.value())
    }

    /// Clears the events set in `mask`
    pub fn write_sys_status(&mut self, mask: u32) -> Result<(), Error<B>> {
        self.ll.sys_status().write(|w| w.value(mask))?;
        Ok(())
    }

    /// Length of the last received frame, including the FCS
    pub fn read_rx_finfo_len(&mut self) -> Result<u16, Error<B>> {
        Ok(self.ll.rx_finfo().read()?.rxflen())
    }

    /// Copies received frame data, starting at `offset`, into `buffer`
    pub fn read_rx_data(&mut self, buffer: &mut [u8], offset: u16) -> Result<(), Error<B>> {
        if offset as usize + buffer.len() > ll::MAX_BUFFER_OFFSET as usize + 1 {
            return Err(Error::OffsetOutOfRange(offset));
        }

        self.ll.read_rx_buffer(offset, buffer)?;

        Ok(())
    }

    /// Reads the adjusted time stamp of the last reception
    pub fn read_rx_timestamp(&mut self) -> Result<Instant, Error<B>> {
        let stamp = self.ll.rx_time().read()?.rx_stamp();

        Ok(Instant::from_register(stamp))
    }
}
