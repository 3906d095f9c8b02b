use super::{Status, TxMode};
use crate::{
    ll::{self, FastCommand},
    status,
    time::Instant,
    Error, DW3000,
};

/// Length of the frame check sequence the radio appends to every frame
pub const FCS_LEN: u16 = 2;

impl<B> DW3000<B>
where
    B: ll::Bus,
{
    /// Turns transmitter and receiver off and clears all TX/RX events
    pub fn force_trx_off(&mut self) -> Result<(), Error<B>> {
        self.ll.fast_command(FastCommand::TxRxOff)?;
        self.write_sys_status(
            status::ALL_TX | status::ALL_RX_GOOD | status::ALL_RX_ERR | status::ALL_RX_TO,
        )?;

        self.state = Status::Ready;

        Ok(())
    }

    /// Copies a frame payload into the TX buffer
    ///
    /// The FCS is not part of `data`, the radio appends it.
    pub fn write_tx_data(&mut self, data: &[u8], offset: u16) -> Result<(), Error<B>> {
        let required_len = offset as usize + data.len();
        if required_len > ll::MAX_BUFFER_OFFSET as usize {
            return Err(Error::FrameTooLong { required_len });
        }

        self.ll.write_tx_buffer(offset, data)?;

        Ok(())
    }

    /// Sets length and buffer offset of the next frame
    ///
    /// `len` includes the FCS. Frames with `ranging` set have their
    /// transmission time stamped for two-way ranging.
    pub fn write_tx_fctrl(&mut self, len: u16, offset: u16, ranging: bool) -> Result<(), Error<B>> {
        self.ll.tx_fctrl().modify(|_, w| {
            w.txflen(len)
                .txb_offset(offset)
                .tr(ranging as u8)
        })?;

        Ok(())
    }

    /// Starts transmitting the frame in the TX buffer
    pub fn start_tx(&mut self, mode: TxMode) -> Result<(), Error<B>> {
        let command = match mode {
            TxMode::Immediate => FastCommand::Tx,
            TxMode::ImmediateResponseExpected => FastCommand::TxW4r,
        };
        self.ll.fast_command(command)?;

        self.state = Status::Sending;

        Ok(())
    }

    /// Wait for the transmission to finish
    ///
    /// Returns `WouldBlock` until the frame sent event shows up, then clears
    /// it and returns the transmission time.
    pub fn wait_transmit(&mut self) -> nb::Result<Instant, Error<B>> {
        let sys_status = self
            .read_sys_status()
            .map_err(nb::Error::Other)?;

        if sys_status & status::TXFRS == 0 {
            return Err(nb::Error::WouldBlock);
        }

        self.write_sys_status(status::TXFRS)
            .map_err(nb::Error::Other)?;

        self.read_tx_timestamp().map_err(nb::Error::Other)
    }

    /// Reads the adjusted time stamp of the last transmission
    pub fn read_tx_timestamp(&mut self) -> Result<Instant, Error<B>> {
        let stamp = self.ll.tx_time().read()?.tx_stamp();

        Ok(Instant::from_register(stamp))
    }
}

#[cfg(test)]
mod tests {
    use crate::{hl::fake::FakeBus, status, Error, Status, TxMode, DW3000};

    #[test]
    fn frame_goes_into_tx_buffer() {
        let mut dw = DW3000::new(FakeBus::new());

        dw.write_tx_data(&[0x41, 0x88, 0x07], 0).unwrap();
        dw.write_tx_fctrl(3 + super::FCS_LEN, 0, true).unwrap();

        assert_eq!(dw.ll().bus().tx_buffer, [0x41, 0x88, 0x07]);
        // length 5, ranging bit set
        assert_eq!(dw.ll().bus().get(0x00, 0x24, 2), &[0x05, 0x08]);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut dw = DW3000::new(FakeBus::new());

        match dw.write_tx_data(&[0; 20], 120) {
            Err(Error::FrameTooLong { required_len: 140 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(dw.ll().bus().tx_buffer.is_empty());
    }

    #[test]
    fn start_tx_issues_fast_command() {
        let mut dw = DW3000::new(FakeBus::new());

        dw.start_tx(TxMode::Immediate).unwrap();
        dw.start_tx(TxMode::ImmediateResponseExpected).unwrap();

        assert_eq!(dw.ll().bus().fast_commands, [0x83, 0x99]);
        assert_eq!(dw.status(), Status::Sending);
    }

    #[test]
    fn wait_transmit_reports_timestamp() {
        let mut dw = DW3000::new(FakeBus::new());

        assert!(matches!(dw.wait_transmit(), Err(nb::Error::WouldBlock)));

        dw.ll().bus().set(0x00, 0x74, &[0x10, 0x20, 0x30, 0x40, 0x50]);
        dw.ll().bus().set(0x00, 0x44, &status::TXFRS.to_le_bytes());

        let sent = dw.wait_transmit().unwrap();
        assert_eq!(sent.value(), 0x50_4030_2010);
        assert_eq!(dw.read_sys_status().unwrap() & status::TXFRS, 0);
    }

    #[test]
    fn force_trx_off_clears_events() {
        let mut dw = DW3000::new(FakeBus::new());
        dw.ll()
            .bus()
            .set(0x00, 0x44, &(status::RXFCG | status::TXFRS | status::CPLOCK).to_le_bytes());

        dw.force_trx_off().unwrap();

        assert_eq!(dw.ll().bus().fast_commands, [0x81]);
        assert_eq!(dw.read_sys_status().unwrap(), status::CPLOCK);
        assert_eq!(dw.status(), Status::Ready);
    }
}
