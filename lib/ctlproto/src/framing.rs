use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{CtlError, CtlResult};
use crate::message::MessageType;

/// Refuses to allocate a receive buffer larger than this for one frame's
/// payload (section 7: framing errors close the connection rather than let
/// a malicious or buggy peer exhaust memory).
pub const MAX_PAYLOAD_LEN: u32 = 16 * 1024 * 1024;

/// Writes the 8-byte `{type, length}` header followed by `payload`
/// (section 6). Host byte order is little-endian throughout this workspace,
/// same choice as the marshalling engine.
pub fn write_frame<W: Write>(writer: &mut W, msg_type: MessageType, payload: &[u8]) -> CtlResult<()> {
    writer.write_u32::<LittleEndian>(msg_type.as_u32())?;
    writer.write_u32::<LittleEndian>(payload.len() as u32)?;
    writer.write_all(payload)?;
    Ok(())
}

/// Reads one frame: the header, then exactly `length` bytes of payload.
pub fn read_frame<R: Read>(reader: &mut R) -> CtlResult<(MessageType, Vec<u8>)> {
    let raw_type = reader.read_u32::<LittleEndian>()?;
    let length = reader.read_u32::<LittleEndian>()?;
    if length > MAX_PAYLOAD_LEN {
        return Err(CtlError::PayloadTooLarge(length));
    }
    let msg_type =
        MessageType::from_u32(raw_type).ok_or(CtlError::UnknownMessageType(raw_type))?;

    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload)?;
    Ok((msg_type, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn frame_round_trips_through_a_byte_buffer() {
        let mut buf = Vec::new();
        write_frame(&mut buf, MessageType::GetInterface, b"eth0").unwrap();

        let mut cursor = Cursor::new(buf);
        let (msg_type, payload) = read_frame(&mut cursor).unwrap();
        assert_eq!(msg_type, MessageType::GetInterface);
        assert_eq!(payload, b"eth0");
    }

    #[test]
    fn empty_payload_frame_round_trips() {
        let mut buf = Vec::new();
        write_frame(&mut buf, MessageType::None, &[]).unwrap();

        let mut cursor = Cursor::new(buf);
        let (msg_type, payload) = read_frame(&mut cursor).unwrap();
        assert_eq!(msg_type, MessageType::None);
        assert!(payload.is_empty());
    }

    #[test]
    fn oversized_declared_length_is_rejected_before_allocating() {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(MessageType::GetInterfaces.as_u32()).unwrap();
        buf.write_u32::<LittleEndian>(MAX_PAYLOAD_LEN + 1).unwrap();

        let mut cursor = Cursor::new(buf);
        let result = read_frame(&mut cursor);
        assert!(matches!(result, Err(CtlError::PayloadTooLarge(_))));
    }

    #[test]
    fn truncated_payload_is_an_io_error() {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(MessageType::GetInterfaces.as_u32()).unwrap();
        buf.write_u32::<LittleEndian>(10).unwrap();
        buf.extend_from_slice(b"short");

        let mut cursor = Cursor::new(buf);
        assert!(read_frame(&mut cursor).is_err());
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(999).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();

        let mut cursor = Cursor::new(buf);
        assert!(matches!(read_frame(&mut cursor), Err(CtlError::UnknownMessageType(999))));
    }
}
