//! Low-level interface to the DW3000
//!
//! This module implements a register-level interface to the DW3000. Most
//! code should use the [high-level interface] instead, which knows the order
//! in which registers need to be touched.
//!
//! Every transaction is a header of one or two bytes, followed by the
//! register data. Registers with a sub-address of zero are accessed using the
//! short (one byte) header, all others use the full address header. Fast
//! commands are single byte transactions without any data.
//!
//! **NOTE**: Many field access methods accept types that have a larger number
//! of bits than the field actually consists of. Values that don't fit are
//! silently truncated.
//!
//! [high-level interface]: ../hl/index.html

use core::{fmt, marker::PhantomData};

/// Transport used to talk to the DW3000
///
/// Implemented by the board support code. A single call to [`Bus::write`] or
/// [`Bus::read`] is one chip-select framed transaction; implementations must
/// keep chip select asserted for the whole call and must never interleave
/// two transactions.
pub trait Bus {
    /// Error reported by the underlying peripherals
    type Error: fmt::Debug;

    /// Send `header` followed by `body` in one transaction
    fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Self::Error>;

    /// Send `header`, then clock `buffer.len()` bytes into `buffer`
    fn read(&mut self, header: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Pulse the reset line and wait for the radio to come back up
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Sleep for at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Busy-wait for at least `us` microseconds
    fn delay_us(&mut self, us: u32);
}

/// Entry point to the DW3000 driver's low-level API
///
/// Please consider using [hl::DW3000] instead.
///
/// [hl::DW3000]: ../hl/struct.DW3000.html
pub struct DW3000<B> {
    bus: B,
}

impl<B> DW3000<B> {
    /// Create a new instance of `DW3000`
    pub fn new(bus: B) -> Self {
        DW3000 { bus }
    }

    /// Access the underlying bus
    pub fn bus(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the underlying bus
    pub fn free(self) -> B {
        self.bus
    }
}

impl<B: Bus> DW3000<B> {
    /// Issue a fast command
    pub fn fast_command(&mut self, command: FastCommand) -> Result<(), Error<B>> {
        let header = [0x81 | ((command as u8) << 1)];
        self.bus.write(&header, &[]).map_err(Error::Write)
    }

    /// Write `data` into the TX buffer, starting at `offset`
    pub fn write_tx_buffer(&mut self, offset: u16, data: &[u8]) -> Result<(), Error<B>> {
        let mut header = [0; 2];
        let len = buffer_header(true, TX_BUFFER_ID, offset, &mut header);
        self.bus.write(&header[..len], data).map_err(Error::Write)
    }

    /// Read from RX buffer 0 into `buffer`, starting at `offset`
    pub fn read_rx_buffer(&mut self, offset: u16, buffer: &mut [u8]) -> Result<(), Error<B>> {
        let mut header = [0; 2];
        let len = buffer_header(false, RX_BUFFER_0_ID, offset, &mut header);
        self.bus.read(&header[..len], buffer).map_err(Error::Read)
    }
}

/// Base address of the TX data buffer
pub const TX_BUFFER_ID: u8 = 0x14;

/// Base address of the first RX data buffer
pub const RX_BUFFER_0_ID: u8 = 0x12;

/// Largest buffer offset that fits the full address header
pub const MAX_BUFFER_OFFSET: u16 = 0x7f;

/// Fast commands, issued using a single byte transaction
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum FastCommand {
    /// Turn the transceiver off and go to IDLE
    TxRxOff = 0x0,
    /// Start transmission immediately
    Tx = 0x1,
    /// Enable the receiver immediately
    Rx = 0x2,
    /// Start transmission, then enable the receiver once the frame is sent
    TxW4r = 0xc,
}

/// Provides access to a register
///
/// You can get an instance for a given register using one of the methods on
/// [`DW3000`].
pub struct RegAccessor<'s, R, B>(&'s mut DW3000<B>, PhantomData<R>);

impl<'s, R, B> RegAccessor<'s, R, B>
where
    B: Bus,
{
    /// Read from the register
    pub fn read(&mut self) -> Result<R::Read, Error<B>>
    where
        R: Register + Readable,
    {
        let mut r = R::read();
        let buffer = R::buffer(&mut r);

        let header_len = init_header::<R>(false, buffer);
        let (header, data) = buffer.split_at_mut(header_len);

        self.0.bus.read(header, data).map_err(Error::Read)?;

        Ok(r)
    }

    /// Write to the register
    pub fn write<F>(&mut self, f: F) -> Result<(), Error<B>>
    where
        R: Register + Writable,
        F: FnOnce(&mut R::Write) -> &mut R::Write,
    {
        let mut w = R::write();
        f(&mut w);

        let buffer = R::buffer(&mut w);
        let header_len = init_header::<R>(true, buffer);
        let (header, data) = buffer.split_at(header_len);

        self.0.bus.write(header, data).map_err(Error::Write)
    }

    /// Modify the register
    pub fn modify<F>(&mut self, f: F) -> Result<(), Error<B>>
    where
        R: Register + Readable + Writable,
        F: for<'r> FnOnce(&mut R::Read, &'r mut R::Write) -> &'r mut R::Write,
    {
        let mut r = self.read()?;
        let mut w = R::write();

        <R as Writable>::buffer(&mut w).copy_from_slice(<R as Readable>::buffer(&mut r));

        f(&mut r, &mut w);

        let buffer = <R as Writable>::buffer(&mut w);
        let header_len = init_header::<R>(true, buffer);
        let (header, data) = buffer.split_at(header_len);

        self.0.bus.write(header, data).map_err(Error::Write)
    }
}

/// A bus error that can occur when communicating with the DW3000
pub enum Error<B: Bus> {
    /// Error during a read transaction
    Read(B::Error),

    /// Error during a write transaction
    Write(B::Error),

    /// Error while pulsing the reset line
    Reset(B::Error),
}

// We can't derive this implementation, as the compiler would require `B`
// itself to implement `Debug`.
impl<B: Bus> fmt::Debug for Error<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read(error) => write!(f, "Read({:?})", error),
            Error::Write(error) => write!(f, "Write({:?})", error),
            Error::Reset(error) => write!(f, "Reset({:?})", error),
        }
    }
}

/// Initializes the SPI message header
///
/// Writes the header for accessing register `R` into the start of `buffer`
/// and returns its length.
fn init_header<R: Register>(write: bool, buffer: &mut [u8]) -> usize {
    encode_header(write, R::ID, R::SUB_ID, buffer)
}

fn buffer_header(write: bool, id: u8, offset: u16, buffer: &mut [u8]) -> usize {
    // Offset 0 would select the short header, which is fine for the buffers
    // as well, but the full header keeps the transaction shape uniform.
    buffer[0] = (((write as u8) << 7) & 0x80)
        | 0x40
        | ((id << 1) & 0x3e)
        | (((offset & MAX_BUFFER_OFFSET) as u8 >> 6) & 0x01);
    buffer[1] = ((offset & MAX_BUFFER_OFFSET) as u8) << 2;

    2
}

/// Encodes a register access header
///
/// Byte 0: bit 7 selects write, bit 6 selects the full address mode, bits 5
/// to 1 are the base address and bit 0 is the top bit of the 7-bit
/// sub-address. Byte 1 holds the remaining sub-address bits, shifted left by
/// two.
pub fn encode_header(write: bool, id: u8, sub_id: u16, buffer: &mut [u8]) -> usize {
    let full = sub_id > 0;
    let sub = (sub_id & 0x7f) as u8;

    buffer[0] = (((write as u8) << 7) & 0x80)
        | (((full as u8) << 6) & 0x40)
        | ((id << 1) & 0x3e)
        | ((sub >> 6) & 0x01);

    if !full {
        return 1;
    }

    buffer[1] = (sub << 2) & 0xfc;

    2
}

/// Implemented for all registers
///
/// This is a mostly internal trait that should not be implemented or used
/// directly by users of this crate.
pub trait Register {
    /// The register's base address
    const ID: u8;

    /// The register's sub-address
    const SUB_ID: u16;

    /// The length of the register
    const LEN: usize;
}

/// Marker trait for registers that can be read from
pub trait Readable {
    /// The type that is used to read from the register
    type Read;

    /// Return the read type for this register
    fn read() -> Self::Read;

    /// Return the read type's internal buffer
    fn buffer(r: &mut Self::Read) -> &mut [u8];
}

/// Marker trait for registers that can be written to
pub trait Writable {
    /// The type that is used to write to the register
    type Write;

    /// Return the write type for this register
    fn write() -> Self::Write;

    /// Return the write type's internal buffer
    fn buffer(w: &mut Self::Write) -> &mut [u8];
}

/// Generates register implementations
macro_rules! impl_register {
    (
        $(
            $id:expr,
            $sub_id:expr,
            $len:expr,
            $rw:tt,
            $name:ident($name_lower:ident) {
            #[$doc:meta]
            $(
                $field:ident,
                $first_bit:expr,
                $last_bit:expr,
                $ty:ty;
                #[$field_doc:meta]
            )*
            }
        )*
    ) => {
        $(
            #[$doc]
            #[allow(non_camel_case_types)]
            pub struct $name;

            impl Register for $name {
                const ID:     u8    = $id;
                const SUB_ID: u16   = $sub_id;
                const LEN:    usize = $len;
            }

            impl $name {
                const HEADER_LEN: usize = 1 + (Self::SUB_ID > 0) as usize;
            }

            #[$doc]
            pub mod $name_lower {
                use core::fmt;

                const HEADER_LEN: usize = super::$name::HEADER_LEN;

                /// Used to read from the register
                pub struct R(pub(crate) [u8; HEADER_LEN + $len]);

                impl R {
                    $(
                        #[$field_doc]
                        pub fn $field(&self) -> $ty {
                            use core::mem::size_of;
                            use crate::ll::FromBytes;

                            // Bytes of the register data that hold part of
                            // this field.
                            const START: usize = $first_bit / 8;
                            const END: usize = $last_bit  / 8 + 1;
                            const LEN: usize = END - START;

                            let mut bytes = [0; LEN];
                            bytes[..LEN].copy_from_slice(
                                &self.0[START+HEADER_LEN .. END+HEADER_LEN]
                            );

                            // Shift the field down, so it starts at bit 0.
                            const OFFSET_IN_BYTE: usize = $first_bit % 8;

                            if OFFSET_IN_BYTE > 0 {
                                bytes[0] >>= OFFSET_IN_BYTE;

                                let mut i = 1;
                                #[allow(arithmetic_overflow)]
                                while i < LEN {
                                    bytes[i - 1] |=
                                        bytes[i] << 8 - OFFSET_IN_BYTE;
                                    bytes[i] >>= OFFSET_IN_BYTE;
                                    i += 1;
                                }
                            }

                            // Mask out bits of neighbouring fields above the
                            // last bit.
                            const SIZE_IN_BITS: usize =
                                $last_bit - $first_bit + 1;
                            const BITS_ABOVE_FIELD: usize =
                                8 - (SIZE_IN_BITS % 8);
                            const SIZE_IN_BYTES: usize =
                                (SIZE_IN_BITS - 1) / 8 + 1;
                            const LAST_INDEX: usize =
                                SIZE_IN_BYTES - 1;
                            if BITS_ABOVE_FIELD < 8 {
                                #[allow(arithmetic_overflow)]
                                {
                                    bytes[LAST_INDEX] <<= BITS_ABOVE_FIELD;
                                    bytes[LAST_INDEX] >>= BITS_ABOVE_FIELD;
                                }
                            }

                            let bytes = if bytes.len() > size_of::<$ty>() {
                                &bytes[..size_of::<$ty>()]
                            }
                            else {
                                &bytes
                            };
                            <$ty as FromBytes>::from_bytes(bytes)
                        }
                    )*
                }

                impl fmt::Debug for R {
                    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "0x")?;
                        for i in (0 .. $len).rev() {
                            write!(f, "{:02x}", self.0[HEADER_LEN + i])?;
                        }

                        Ok(())
                    }
                }

                /// Used to write to the register
                pub struct W(pub(crate) [u8; HEADER_LEN + $len]);

                impl W {
                    $(
                        #[$field_doc]
                        pub fn $field(&mut self, value: $ty) -> &mut Self {
                            use crate::ll::ToBytes;

                            let source = <$ty as ToBytes>::to_bytes(value);

                            const START:          usize = $first_bit / 8;
                            const END:            usize = $last_bit  / 8 + 1;
                            const OFFSET_IN_BYTE: usize = $first_bit % 8;
                            const LEN:            usize = $last_bit - $first_bit + 1;

                            let mut bits_left         = LEN;
                            let mut bits_left_in_byte = 8;
                            let mut bits_written_to_byte = 0;

                            let mut source_i  = 0;
                            let mut target_i  = START;
                            while target_i < END {
                                let mut mask = 0xff;
                                let mut offset_in_this_byte = 0;

                                // First byte: keep the bits below the field.
                                if target_i == START {
                                    mask <<= OFFSET_IN_BYTE;
                                    offset_in_this_byte = OFFSET_IN_BYTE;
                                }

                                // Last byte: keep the bits above the field.
                                if target_i == END - 1 {
                                    let shift =
                                        8 - bits_left - offset_in_this_byte;
                                    mask <<= shift;
                                    mask >>= shift;
                                }

                                mask <<= bits_written_to_byte;

                                let value = source[source_i]
                                    >> 8 - bits_left_in_byte
                                    << offset_in_this_byte
                                    << bits_written_to_byte;

                                self.0[HEADER_LEN + target_i] &= !mask;
                                self.0[HEADER_LEN + target_i] |= value & mask;

                                let bits_needed = mask.count_ones() as usize;
                                let bits_used = bits_needed.min(
                                    bits_left_in_byte - offset_in_this_byte
                                );

                                bits_left -= bits_used;
                                bits_written_to_byte += bits_used;

                                if bits_left_in_byte > bits_used {
                                    bits_left_in_byte -= bits_used;
                                }
                                else {
                                    bits_left_in_byte =
                                        8 - (bits_used - bits_left_in_byte);

                                    source_i += 1;
                                }

                                if bits_used == bits_needed {
                                    target_i += 1;
                                    bits_written_to_byte = 0;
                                }
                            }

                            self
                        }
                    )*
                }
            }

            impl_rw!($rw, $name, $name_lower, $len);
        )*


        impl<B> DW3000<B> {
            $(
                #[$doc]
                pub fn $name_lower(&mut self) -> RegAccessor<'_, $name, B> {
                    RegAccessor(self, PhantomData)
                }
            )*
        }
    }
}

// Helper macro, used internally by `impl_register!`
macro_rules! impl_rw {
    (RO, $name:ident, $name_lower:ident, $len:expr) => {
        impl_rw!(@R, $name, $name_lower, $len);
    };
    (RW, $name:ident, $name_lower:ident, $len:expr) => {
        impl_rw!(@R, $name, $name_lower, $len);
        impl_rw!(@W, $name, $name_lower, $len);
    };

    (@R, $name:ident, $name_lower:ident, $len:expr) => {
        impl Readable for $name {
            type Read = $name_lower::R;

            fn read() -> Self::Read {
                $name_lower::R([0; Self::HEADER_LEN + $len])
            }

            fn buffer(r: &mut Self::Read) -> &mut [u8] {
                &mut r.0
            }
        }
    };
    (@W, $name:ident, $name_lower:ident, $len:expr) => {
        impl Writable for $name {
            type Write = $name_lower::W;

            fn write() -> Self::Write {
                $name_lower::W([0; Self::HEADER_LEN + $len])
            }

            fn buffer(w: &mut Self::Write) -> &mut [u8] {
                &mut w.0
            }
        }
    };
}

// All registers are implemented in this macro invocation. It follows the
// following syntax:
// <base>, <sub-address>, <size-bytes>, <RO/RW>, <name-upper>(name-lower) { /// <doc>
//     <field 1>
//     <field 2>
//     ...
// }
//
// Each field follows the following syntax:
// <name>, <first-bit-index>, <last-bit-index>, <type>; /// <doc>
impl_register! {
    0x00, 0x00, 4, RO, DEV_ID(dev_id) { /// Device identifier
        rev,     0,  3, u8;  /// Revision
        ver,     4,  7, u8;  /// Version
        model,   8, 15, u8;  /// Model
        ridtag, 16, 31, u16; /// Register Identification Tag
        value,   0, 31, u32; /// Complete identifier
    }
    0x00, 0x10, 4, RW, SYS_CFG(sys_cfg) { /// System Configuration
        ffen,        0,  0, u8; /// Frame Filtering Enable
        dis_fcs_tx,  1,  1, u8; /// Disable auto-FCS Transmission
        dis_fce,     2,  2, u8; /// Disable frame check error handling
        dis_drxb,    3,  3, u8; /// Disable Double RX Buffer
        phr_mode,    4,  4, u8; /// PHR Mode
        phr_6m8,     5,  5, u8; /// Send the PHR at the data rate
        spi_crcen,   6,  6, u8; /// Enable SPI CRC
        cia_ipatov,  7,  7, u8; /// Select CIA processing preamble CIR
        cia_sts,     8,  8, u8; /// Select CIA processing STS CIR
        rxwtoe,      9,  9, u8; /// Receive Wait Timeout Enable
        rxautr,     10, 10, u8; /// Receiver Auto Re-enable
        auto_ack,   11, 11, u8; /// Automatic Acknowledge Enable
        cp_spc,     12, 13, u8; /// STS Packet Configuration
        cp_sdc,     15, 15, u8; /// Use the super deterministic code
        pdoa_mode,  16, 17, u8; /// PDoA mode
        fast_aat,   18, 18, u8; /// Fast RX to TX turn around
    }
    0x00, 0x14, 2, RW, FF_CFG(ff_cfg) { /// Frame Filter Configuration
        ffab,     0,  0, u8;  /// Allow Beacon frames
        ffad,     1,  1, u8;  /// Allow Data frames
        ffaa,     2,  2, u8;  /// Allow Acknowledgement frames
        ffam,     3,  3, u8;  /// Allow MAC Command frames
        value,    0, 15, u16; /// Complete filter configuration
    }
    0x00, 0x24, 6, RW, TX_FCTRL(tx_fctrl) { /// TX Frame Control
        txflen,      0,  9, u16; /// TX Frame Length, including the FCS
        txbr,       10, 10, u8;  /// Transmit Bit Rate
        tr,         11, 11, u8;  /// Transmit Ranging enable
        txpsr,      12, 15, u8;  /// Transmit Preamble Symbol Repetitions
        txb_offset, 16, 25, u16; /// Transmit buffer index offset
        fine_plen,  40, 47, u8;  /// Fine PSR control
    }
    0x00, 0x34, 3, RW, RX_FWTO(rx_fwto) { /// Receive Frame Wait Timeout
        value, 0, 19, u32; /// Timeout in units of roughly one microsecond
    }
    0x00, 0x3C, 6, RW, SYS_ENABLE(sys_enable) { /// System Event Enable Mask
        value, 0, 31, u32; /// Lower 32 event enable bits
    }
    0x00, 0x44, 6, RW, SYS_STATUS(sys_status) { /// System Event Status
        irqs,      0,  0, u8;  /// Interrupt Request Status
        cplock,    1,  1, u8;  /// Clock PLL Lock
        txfrb,     4,  4, u8;  /// TX Frame Begins
        txprs,     5,  5, u8;  /// TX Preamble Sent
        txphs,     6,  6, u8;  /// TX PHY Header Sent
        txfrs,     7,  7, u8;  /// TX Frame Sent
        rxprd,     8,  8, u8;  /// RX Preamble Detected
        rxsfdd,    9,  9, u8;  /// RX SFD Detected
        ciadone,  10, 10, u8;  /// CIA processing done
        rxphd,    11, 11, u8;  /// RX PHY Header Detect
        rxphe,    12, 12, u8;  /// RX PHY Header Error
        rxfr,     13, 13, u8;  /// RX Data Frame Ready
        rxfcg,    14, 14, u8;  /// RX FCS Good
        rxfce,    15, 15, u8;  /// RX FCS Error
        rxfsl,    16, 16, u8;  /// RX Reed-Solomon Frame Sync Loss
        rxfto,    17, 17, u8;  /// RX Frame Wait Timeout
        ciaerr,   18, 18, u8;  /// CIA error
        rxovrr,   20, 20, u8;  /// RX Overrun
        rxpto,    21, 21, u8;  /// Preamble Detection Timeout
        spirdy,   23, 23, u8;  /// SPI ready
        rcinit,   24, 24, u8;  /// Entered IDLE_RC
        rxsto,    26, 26, u8;  /// Receive SFD timeout
        arfe,     29, 29, u8;  /// Frame filtering rejection
        value,     0, 31, u32; /// Lower 32 status bits
    }
    0x00, 0x4C, 4, RO, RX_FINFO(rx_finfo) { /// RX Frame Information
        rxflen,  0,  9, u16; /// Receive Frame Length, including the FCS
        rxnspl, 11, 12, u8;  /// Receive Non-Standard Preamble Length
        rxbr,   13, 13, u8;  /// Receive Bit Rate Report
        rng,    15, 15, u8;  /// Receiver Ranging
        rxprf,  16, 17, u8;  /// RX Pulse Repetition Rate Report
        rxpsr,  18, 19, u8;  /// RX Preamble Repetition
        rxpacc, 20, 31, u16; /// Preamble Accumulation Count
    }
    0x00, 0x64, 16, RO, RX_TIME(rx_time) { /// Receive Time Stamp
        rx_stamp,  0, 39, u64; /// Fully adjusted time stamp
        rx_rawst, 64, 95, u32; /// Raw time stamp
    }
    0x00, 0x74, 5, RO, TX_TIME(tx_time) { /// Transmit Time Stamp
        tx_stamp,  0, 39, u64; /// Fully adjusted time stamp
    }
    0x01, 0x04, 2, RW, TX_ANTD(tx_antd) { /// Transmitter antenna delay
        value, 0, 15, u16; /// Delay in device time units
    }
    0x01, 0x08, 4, RW, ACK_RESP(ack_resp) { /// Acknowledgement and response turnaround
        w4r_tim,  0, 19, u32; /// Wait-for-response turnaround time
        ack_tim, 24, 31, u8;  /// Auto-acknowledgement turnaround time
    }
    0x01, 0x0C, 4, RW, TX_POWER(tx_power) { /// TX Power Control
        value, 0, 31, u32; /// One power byte per frame section
    }
    0x01, 0x14, 2, RW, CHAN_CTRL(chan_ctrl) { /// Channel Control
        rf_chan,   0,  0, u8; /// Channel select, 0 for channel 5
        sfd_type,  1,  2, u8; /// SFD sequence
        tx_pcode,  3,  7, u8; /// Transmitter preamble code
        rx_pcode,  8, 12, u8; /// Receiver preamble code
    }
    0x05, 0x00, 4, RW, GPIO_MODE(gpio_mode) { /// GPIO Mode Control
        msgp0,  0,  2, u8; /// GPIO0 mode
        msgp1,  3,  5, u8; /// GPIO1 mode
        msgp2,  6,  8, u8; /// GPIO2 mode, 1 selects the RX LED
        msgp3,  9, 11, u8; /// GPIO3 mode, 1 selects the TX LED
        msgp4, 12, 14, u8; /// GPIO4 mode, 1 selects the external PA
        msgp5, 15, 17, u8; /// GPIO5 mode, 1 selects the external TX switch
        msgp6, 18, 20, u8; /// GPIO6 mode, 1 selects the external RX switch
    }
    0x06, 0x00, 2, RW, DTUNE0(dtune0) { /// Digital receiver tuning 0
        pac,   0, 1, u8; /// Preamble acquisition chunk size
        dt0b4, 4, 4, u8; /// Tuning bit 4
    }
    0x06, 0x02, 2, RW, RX_SFD_TOC(rx_sfd_toc) { /// SFD detection timeout
        value, 0, 15, u16; /// Timeout in preamble symbols
    }
    0x06, 0x04, 2, RW, PRE_TOC(pre_toc) { /// Preamble detection timeout
        value, 0, 15, u16; /// Timeout in units of PAC size symbols
    }
    0x06, 0x0C, 4, RW, DTUNE3(dtune3) { /// Digital receiver tuning 3
        value, 0, 31, u32; /// Tuning value
    }
    0x07, 0x1C, 4, RW, TX_CTRL_HI(tx_ctrl_hi) { /// Transmitter control
        tx_pg_delay, 0, 5, u8; /// Pulse generator delay
    }
    0x09, 0x00, 2, RW, PLL_CFG(pll_cfg) { /// PLL configuration
        value, 0, 15, u16; /// Channel dependent PLL setting
    }
    0x09, 0x08, 4, RW, PLL_CAL(pll_cal) { /// PLL calibration
        use_old,    1, 1, u8; /// Use the previous calibration result
        pll_cfg_ld, 4, 7, u8; /// PLL calibration configuration
        cal_en,     8, 8, u8; /// Start PLL calibration
    }
    0x09, 0x14, 1, RW, XTAL(xtal) { /// Crystal trim
        value, 0, 5, u8; /// Trim code
    }
    0x0E, 0x00, 4, RW, CIA_CONF(cia_conf) { /// CIA configuration
        rxantd,   0, 15, u16; /// Receiver antenna delay
        mindiag, 20, 20, u8;  /// Minimal diagnostics
    }
    0x0F, 0x30, 4, RO, SYS_STATE(sys_state) { /// System state
        tx_state,    0,  3, u8; /// Transmit state machine
        rx_state,    8, 13, u8; /// Receive state machine
        pmsc_state, 16, 23, u8; /// Power management state machine
    }
    0x11, 0x00, 2, RW, SOFT_RST(soft_rst) { /// Soft reset of the device blocks
        value, 0, 8, u16; /// One bit per block, 0 holds the block in reset
    }
    0x11, 0x04, 4, RW, CLK_CTRL(clk_ctrl) { /// Clock control
        sys_clk, 0, 1, u8; /// System clock selection, 1 forces the crystal
    }
    0x11, 0x08, 4, RW, SEQ_CTRL(seq_ctrl) { /// Sequencing control
        ainit2idle,  8,  8, u8; /// Go from IDLE_RC to IDLE_PLL automatically
        force2init, 23, 23, u8; /// Force to IDLE_RC
    }
    0x11, 0x16, 4, RW, LED_CTRL(led_ctrl) { /// LED control
        blink_tim,   0,  7, u8; /// Blink time
        blink_en,    8,  8, u8; /// Blink enable
        force_trig, 16, 19, u8; /// Manual blink trigger, one bit per LED
    }
}

/// Internal trait used by `impl_register!`
trait FromBytes {
    fn from_bytes(bytes: &[u8]) -> Self;
}

/// Internal trait used by `impl_register!`
trait ToBytes {
    type Bytes;

    fn to_bytes(self) -> Self::Bytes;
}

/// Internal macro used to implement `FromBytes`/`ToBytes`
macro_rules! impl_bytes {
    ($($ty:ty,)*) => {
        $(
            impl FromBytes for $ty {
                fn from_bytes(bytes: &[u8]) -> Self {
                    let mut val = 0;

                    for (i, &b) in bytes.iter().enumerate() {
                        val |= (b as $ty) << (i * 8);
                    }

                    val
                }
            }

            impl ToBytes for $ty {
                type Bytes = [u8; ::core::mem::size_of::<$ty>()];

                fn to_bytes(self) -> Self::Bytes {
                    self.to_le_bytes()
                }
            }
        )*
    }
}

impl_bytes! {
    u8,
    u16,
    u32,
    u64,
}
