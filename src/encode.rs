// Encode fields
//
use bytes::{BufMut, BytesMut};
use std::fmt::Display;

/// The maximum value of the field "remaining length".
pub const MAXIMUM_REMAINING_LENGTH: usize = 268_435_455;

/// A packet can not be encoded.
///
/// Unlike [`crate::DecodingError`], this error does not describe bytes received
/// from a peer. It indicates that a packet was constructed with values that the
/// MQTT wire format can't carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// A string or binary field is longer than 65,535 bytes.
    StringTooLong { length: usize },

    /// The variable header and payload together exceed 268,435,455 bytes.
    PacketTooLarge { length: usize },

    /// Packet identifiers must be non-zero.
    InvalidPacketIdentifier,

    InvalidValue(String),
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StringTooLong { length } => write!(
                f,
                "field of {length} bytes exceeds the maximum of {} bytes",
                u16::MAX
            ),
            Self::PacketTooLarge { length } => write!(
                f,
                "remaining length of {length} bytes exceeds the maximum of {MAXIMUM_REMAINING_LENGTH} bytes"
            ),
            Self::InvalidPacketIdentifier => write!(f, "packet identifier must be non-zero"),
            Self::InvalidValue(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for EncodingError {}

pub fn utf8(buf: &mut BytesMut, value: &str) -> Result<(), EncodingError> {
    if value.contains('\0') {
        return Err(EncodingError::InvalidValue(
            "a string must not contain the null character U+0000".into(),
        ));
    }
    bytes(buf, value.as_bytes())
}

pub fn bytes(buf: &mut BytesMut, value: &[u8]) -> Result<(), EncodingError> {
    let length = u16::try_from(value.len()).map_err(|_| EncodingError::StringTooLong {
        length: value.len(),
    })?;

    buf.reserve(value.len() + 2);
    buf.put_u16(length);
    buf.put_slice(value);
    Ok(())
}

pub fn packet_identifier(buf: &mut BytesMut, value: u16) -> Result<(), EncodingError> {
    if value == 0 {
        return Err(EncodingError::InvalidPacketIdentifier);
    }
    buf.put_u16(value);
    Ok(())
}

pub fn remaining_length(buf: &mut BytesMut, length: usize) -> Result<(), EncodingError> {
    if length > MAXIMUM_REMAINING_LENGTH {
        return Err(EncodingError::PacketTooLarge { length });
    }

    let mut length = length;
    loop {
        let mut byte = (length % 128) as u8;
        length /= 128;

        if length > 0 {
            byte |= 128;
        }
        buf.put_u8(byte);

        if length == 0 {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode;

    fn encoded_length(length: usize) -> Vec<u8> {
        let mut buf = BytesMut::new();
        remaining_length(&mut buf, length).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_remaining_length() {
        assert_eq!(encoded_length(0), [0x00]);
        assert_eq!(encoded_length(127), [0x7f]);
        assert_eq!(encoded_length(128), [0x80, 0x01]);
        assert_eq!(encoded_length(16_383), [0xff, 0x7f]);
        assert_eq!(encoded_length(16_384), [0x80, 0x80, 0x01]);
        assert_eq!(encoded_length(2_097_152), [0x80, 0x80, 0x80, 0x01]);
        assert_eq!(
            encoded_length(MAXIMUM_REMAINING_LENGTH),
            [0xff, 0xff, 0xff, 0x7f]
        );

        for length in [0, 1, 321, 16_384, 2_097_151, MAXIMUM_REMAINING_LENGTH] {
            let bytes = encoded_length(length);
            assert_eq!(
                decode::remaining_length(&bytes),
                Ok((length, bytes.len()))
            );
        }
    }

    #[test]
    fn test_remaining_length_too_large() {
        let mut buf = BytesMut::new();
        assert_eq!(
            remaining_length(&mut buf, MAXIMUM_REMAINING_LENGTH + 1),
            Err(EncodingError::PacketTooLarge {
                length: MAXIMUM_REMAINING_LENGTH + 1
            })
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_utf8() {
        let mut buf = BytesMut::new();
        utf8(&mut buf, "MQTT").unwrap();
        assert_eq!(&buf[..], b"\x00\x04MQTT");

        let too_long = "a".repeat(u16::MAX as usize + 1);
        assert_eq!(
            utf8(&mut buf, &too_long),
            Err(EncodingError::StringTooLong {
                length: u16::MAX as usize + 1
            })
        );

        assert!(matches!(
            utf8(&mut buf, "a\0b"),
            Err(EncodingError::InvalidValue(_))
        ));

        // The longest string that fits.
        let mut buf = BytesMut::new();
        utf8(&mut buf, &"a".repeat(u16::MAX as usize)).unwrap();
        assert_eq!(&buf[..2], &[0xff, 0xff]);
    }

    #[test]
    fn test_packet_identifier() {
        let mut buf = BytesMut::new();
        packet_identifier(&mut buf, 19266).unwrap();
        assert_eq!(&buf[..], &[0x4b, 0x42]);

        assert_eq!(
            packet_identifier(&mut buf, 0),
            Err(EncodingError::InvalidPacketIdentifier)
        );
    }
}
