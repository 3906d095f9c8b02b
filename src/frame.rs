//! Encoding and decoding of the ranging frames
//!
//! All frames are IEEE 802.15.4 data frames with short addressing and PAN ID
//! compression. The header is followed by a one byte message type and the
//! message payload:
//!
//! | Offset | Field           | Size |
//! |-------:|-----------------|-----:|
//! | 0      | Frame control   | 2    |
//! | 2      | Sequence number | 1    |
//! | 3      | PAN ID          | 2    |
//! | 5      | Destination     | 2    |
//! | 7      | Source          | 2    |
//! | 9      | Message type    | 1    |
//! | 10     | Payload         | var  |
//!
//! Multi-byte fields are little-endian. The FCS is not part of the frames
//! built here; the radio appends and checks it.

use byte::{ctx::Bytes, BytesExt, LE};
use dw3000::time::Instant;
use ieee802154::mac::{self, Address, PanId, ShortAddress};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Destination of frames meant for every listener
pub const BROADCAST: ShortAddress = ShortAddress::BROADCAST;

/// Header length, up to and including the message type
pub const HEADER_LEN: usize = 10;

/// Length of a POLL frame
pub const POLL_LEN: usize = HEADER_LEN;

/// Length of a RESP frame
pub const RESP_LEN: usize = HEADER_LEN + 2 * TIMESTAMP_LEN;

/// Length of a FINAL frame
pub const FINAL_LEN: usize = HEADER_LEN + 4;

/// Length of a BEACON frame
pub const BEACON_LEN: usize = HEADER_LEN + 8;

/// Bytes per timestamp in a RESP
const TIMESTAMP_LEN: usize = 5;

/// Version reported in BEACON frames
pub const TAG_VERSION: u8 = 0x01;

/// Identifies the message a frame carries
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MessageType {
    /// Tag asks for a response, starts an exchange
    Poll = 0x61,
    /// Anchor answers a POLL with its timestamps
    Response = 0x50,
    /// Tag reports the measured distance
    Final = 0x23,
    /// Tag announces itself
    Beacon = 0x70,
}

impl MessageType {
    /// Reads the message type of a frame
    ///
    /// Returns `None` for frames that are too short or carry an unknown type.
    pub fn of(frame: &[u8]) -> Option<Self> {
        let raw = *frame.get(HEADER_LEN - 1)?;
        MessageType::try_from(raw).ok()
    }
}

/// Tag information carried by a BEACON
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TagInfo {
    /// Address of the tag
    pub address: ShortAddress,
    /// Free-form status flags
    pub status: u8,
}

/// A decoded RESP frame
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Response {
    /// Sequence number
    pub seq: u8,
    /// Address of the anchor that sent the response
    pub anchor: ShortAddress,
    /// When the anchor received the POLL, in anchor time
    pub poll_rx_ts: Instant,
    /// When the anchor sent this response, in anchor time
    pub resp_tx_ts: Instant,
}

/// A frame that doesn't decode as the expected message
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The frame is shorter than the message requires
    TooShort(usize),
    /// The frame carries a different message type
    WrongType(u8),
}

impl From<byte::Error> for ParseError {
    fn from(error: byte::Error) -> Self {
        match error {
            byte::Error::BadOffset(offset) => ParseError::TooShort(offset),
            _ => ParseError::TooShort(0),
        }
    }
}

/// MAC header of every ranging frame
///
/// Data frame, no security, no pending, no ACK request, PAN ID compression,
/// short destination and source addresses, 802.15.4-2003 frame version.
/// Encodes as frame control `41 88`.
fn header(seq: u8, pan_id: PanId, destination: ShortAddress, source: ShortAddress) -> mac::Header {
    mac::Header {
        frame_type: mac::FrameType::Data,
        security: mac::Security::None,
        frame_pending: false,
        ack_request: false,
        pan_id_compress: true,
        version: mac::FrameVersion::Ieee802154_2003,
        seq,
        destination: Some(Address::Short(pan_id, destination)),
        source: Some(Address::Short(pan_id, source)),
    }
}

/// Writes the MAC header and the message type, returns the payload offset
fn write_header(frame: &mut [u8], header: mac::Header, message: MessageType) -> usize {
    let mut offset = 0;

    let result = frame
        .write(&mut offset, header)
        .and_then(|()| frame.write_with(&mut offset, u8::from(message), LE));

    // Every frame buffer is at least `HEADER_LEN` long
    if let Err(err) = result {
        panic!("Failed to write frame header: {:?}", err);
    }

    offset
}

fn write_timestamp(buf: &mut [u8], timestamp: Instant) {
    buf.copy_from_slice(&timestamp.value().to_le_bytes()[..TIMESTAMP_LEN]);
}

fn read_timestamp(frame: &[u8], offset: &mut usize) -> Result<Instant, ParseError> {
    let bytes: &[u8] = frame.read_with(offset, Bytes::Len(TIMESTAMP_LEN))?;

    let mut raw = [0; 8];
    raw[..TIMESTAMP_LEN].copy_from_slice(bytes);

    Ok(Instant::from_register(u64::from_le_bytes(raw)))
}

/// Builds a POLL, broadcast to any anchor
pub fn build_poll(seq: u8, pan_id: PanId, source: ShortAddress) -> [u8; POLL_LEN] {
    let mut frame = [0; POLL_LEN];
    write_header(&mut frame, header(seq, pan_id, BROADCAST, source), MessageType::Poll);
    frame
}

/// Builds a FINAL, reporting `distance_mm` to `anchor`
pub fn build_final(
    seq: u8,
    pan_id: PanId,
    source: ShortAddress,
    anchor: ShortAddress,
    distance_mm: u32,
) -> [u8; FINAL_LEN] {
    let mut frame = [0; FINAL_LEN];
    let offset = write_header(&mut frame, header(seq, pan_id, anchor, source), MessageType::Final);
    frame[offset..].copy_from_slice(&distance_mm.to_le_bytes());
    frame
}

/// Builds a BEACON
///
/// The payload is the tag address, [`TAG_VERSION`], the status byte, the
/// sequence number and three reserved bytes.
pub fn build_beacon(seq: u8, pan_id: PanId, info: &TagInfo) -> [u8; BEACON_LEN] {
    let mut frame = [0; BEACON_LEN];
    let offset = write_header(
        &mut frame,
        header(seq, pan_id, BROADCAST, info.address),
        MessageType::Beacon,
    );

    let payload = &mut frame[offset..];
    payload[0..2].copy_from_slice(&info.address.0.to_le_bytes());
    payload[2] = TAG_VERSION;
    payload[3] = info.status;
    payload[4] = seq;

    frame
}

/// Builds a RESP, as an anchor would send it
pub fn build_response(
    seq: u8,
    pan_id: PanId,
    anchor: ShortAddress,
    tag: ShortAddress,
    poll_rx_ts: Instant,
    resp_tx_ts: Instant,
) -> [u8; RESP_LEN] {
    let mut frame = [0; RESP_LEN];
    write_header(&mut frame, header(seq, pan_id, tag, anchor), MessageType::Response);

    write_timestamp(&mut frame[HEADER_LEN..HEADER_LEN + TIMESTAMP_LEN], poll_rx_ts);
    write_timestamp(&mut frame[HEADER_LEN + TIMESTAMP_LEN..RESP_LEN], resp_tx_ts);

    frame
}

/// Decodes a RESP
///
/// Accepts any frame of at least [`RESP_LEN`] bytes whose message type is
/// [`MessageType::Response`]. Trailing bytes are ignored.
pub fn parse_response(frame: &[u8]) -> Result<Response, ParseError> {
    if frame.len() < RESP_LEN {
        return Err(ParseError::TooShort(frame.len()));
    }
    let message = frame[HEADER_LEN - 1];
    if message != u8::from(MessageType::Response) {
        return Err(ParseError::WrongType(message));
    }

    let seq = frame[2];

    let mut offset = 7;
    let anchor = ShortAddress(frame.read_with::<u16>(&mut offset, LE)?);

    let mut offset = HEADER_LEN;
    let poll_rx_ts = read_timestamp(frame, &mut offset)?;
    let resp_tx_ts = read_timestamp(frame, &mut offset)?;

    Ok(Response {
        seq,
        anchor,
        poll_rx_ts,
        resp_tx_ts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAN: PanId = PanId(0xdeca);
    const TAG: ShortAddress = ShortAddress(0x0001);
    const ANCHOR: ShortAddress = ShortAddress(0x1234);

    fn instant(value: u64) -> Instant {
        Instant::new(value).unwrap()
    }

    #[test]
    fn poll_is_broadcast_header_only() {
        let frame = build_poll(0x2a, PAN, TAG);

        assert_eq!(
            frame,
            [0x41, 0x88, 0x2a, 0xca, 0xde, 0xff, 0xff, 0x01, 0x00, 0x61]
        );
        assert_eq!(MessageType::of(&frame), Some(MessageType::Poll));
    }

    #[test]
    fn header_decodes_as_compressed_data_frame() {
        let frame = build_final(9, PanId(0x0bad), TAG, ANCHOR, 0);

        let header: mac::Header = frame.read(&mut 0).unwrap();
        assert_eq!(header.frame_type, mac::FrameType::Data);
        assert_eq!(header.version, mac::FrameVersion::Ieee802154_2003);
        assert!(header.pan_id_compress);
        assert_eq!(header.seq, 9);
        assert_eq!(header.destination, Some(Address::Short(PanId(0x0bad), ANCHOR)));
        assert_eq!(header.source, Some(Address::Short(PanId(0x0bad), TAG)));
        assert_eq!(&frame[3..5], &[0xad, 0x0b]);
    }

    #[test]
    fn final_carries_distance() {
        let frame = build_final(7, PAN, TAG, ANCHOR, 1802);

        assert_eq!(frame.len(), 14);
        assert_eq!(&frame[5..7], &[0x34, 0x12]);
        assert_eq!(frame[9], 0x23);
        assert_eq!(&frame[10..], &1802u32.to_le_bytes());
    }

    #[test]
    fn beacon_layout() {
        let info = TagInfo {
            address: ShortAddress(0xbeef),
            status: 0x02,
        };
        let frame = build_beacon(0x10, PAN, &info);

        assert_eq!(frame.len(), 18);
        assert_eq!(&frame[5..10], &[0xff, 0xff, 0xef, 0xbe, 0x70]);
        assert_eq!(&frame[10..], &[0xef, 0xbe, 0x01, 0x02, 0x10, 0, 0, 0]);
    }

    #[test]
    fn response_round_trip() {
        let frame = build_response(
            3,
            PAN,
            ANCHOR,
            TAG,
            instant(0x00_0000_0100),
            instant(0xff_ffff_ffff),
        );

        assert_eq!(frame.len(), 20);
        assert_eq!(&frame[10..15], &[0x00, 0x01, 0x00, 0x00, 0x00]);

        let response = parse_response(&frame).unwrap();
        assert_eq!(response.seq, 3);
        assert_eq!(response.anchor, ANCHOR);
        assert_eq!(response.poll_rx_ts.value(), 0x100);
        assert_eq!(response.resp_tx_ts.value(), 0xff_ffff_ffff);
    }

    #[test]
    fn response_with_trailing_bytes_is_accepted() {
        let mut frame = [0; 24];
        frame[..RESP_LEN].copy_from_slice(&build_response(
            1,
            PAN,
            ANCHOR,
            TAG,
            instant(5),
            instant(6),
        ));

        assert_eq!(parse_response(&frame).unwrap().resp_tx_ts.value(), 6);
    }

    #[test]
    fn short_or_foreign_frames_are_rejected() {
        let frame = build_response(1, PAN, ANCHOR, TAG, instant(5), instant(6));
        assert_eq!(
            parse_response(&frame[..19]),
            Err(ParseError::TooShort(19))
        );

        let mut garbled = frame;
        garbled[9] = 0x00;
        assert_eq!(parse_response(&garbled), Err(ParseError::WrongType(0x00)));

        let mut poll = [0; 20];
        poll[..POLL_LEN].copy_from_slice(&build_poll(1, PAN, TAG));
        assert_eq!(parse_response(&poll), Err(ParseError::WrongType(0x61)));
    }

    #[test]
    fn unknown_message_types() {
        assert_eq!(MessageType::of(&[0; 10]), None);
        assert_eq!(MessageType::of(&[0x41, 0x88]), None);
    }
}
