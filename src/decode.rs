// Decode fields
//
use crate::PacketType;
use bytes::{Buf, Bytes};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPacketTypeError(pub u8);

/// The bytes do not form a valid MQTT packet.
///
/// Every variant describes why a packet is malformed. A malformed packet is
/// terminal for the decode attempt: no partial packet is ever returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    /// The bytes are not enough to decode the packet.
    NotEnoughBytes { minimum: usize, actual: usize },

    /// There are too many bytes for this packet.
    TooManyBytes,

    /// The packet is not valid. Number 1 till and including 14 are valid packet numbers.
    InvalidPacketType(u8),

    /// The lower nibble of the fixed header is not allowed for this packet type.
    InvalidFlags { packet_type: PacketType, flags: u8 },

    // The field "remaining length" is not valid.
    InvalidRemainingLength,

    /// The packet exceeds the maximum size configured on the [`crate::Decoder`].
    PacketTooLarge { maximum: usize, actual: usize },

    InvalidValue(String),
}

impl DecodingError {
    /// Whether the packet ended, or the stream closed, before all expected bytes were read.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::NotEnoughBytes { .. })
    }
}

impl From<InvalidPacketTypeError> for DecodingError {
    fn from(value: InvalidPacketTypeError) -> Self {
        Self::InvalidPacketType(value.0)
    }
}

impl Display for DecodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed packet: ")?;
        match self {
            Self::NotEnoughBytes { minimum, actual } => write!(
                f,
                "not enough bytes available, at minimum {minimum} bytes are expected but got {actual} bytes"
            ),
            Self::TooManyBytes => write!(f, "too many bytes"),
            Self::InvalidPacketType(value) => write!(f, "{value} is not a valid packet type"),
            Self::InvalidFlags { packet_type, flags } => {
                write!(f, "flags {flags:#06b} are not valid for {packet_type:?}")
            }
            Self::InvalidRemainingLength => write!(f, "field remaining length is not valid"),
            Self::PacketTooLarge { maximum, actual } => write!(
                f,
                "remaining length of {actual} bytes exceeds the maximum of {maximum} bytes"
            ),
            Self::InvalidValue(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for DecodingError {}

fn ensure(bytes: &Bytes, minimum: usize) -> Result<(), DecodingError> {
    if bytes.remaining() < minimum {
        return Err(DecodingError::NotEnoughBytes {
            minimum,
            actual: bytes.remaining(),
        });
    }
    Ok(())
}

pub fn u8(bytes: &mut Bytes) -> Result<u8, DecodingError> {
    ensure(bytes, 1)?;
    Ok(bytes.get_u8())
}

pub fn u16(bytes: &mut Bytes) -> Result<u16, DecodingError> {
    ensure(bytes, 2)?;
    Ok(bytes.get_u16())
}

/// Decode a packet identifier. The value 0 is not allowed [MQTT-2.3.1-1].
pub fn packet_identifier(bytes: &mut Bytes) -> Result<u16, DecodingError> {
    let identifier = u16(bytes)?;
    if identifier == 0 {
        return Err(DecodingError::InvalidValue(
            "packet identifier must be non-zero".into(),
        ));
    }
    Ok(identifier)
}

// Each packet contains a field 'remaining length'.
// This field is between 1 and 4 bytes long. The field encodes
// the number of bytes that follow _after_ the fixed header.
//
// Returns the decoded value and the number of bytes the field occupies.
pub fn remaining_length(bytes: &[u8]) -> Result<(usize, usize), DecodingError> {
    let mut multiplier = 1;
    let mut value = 0;

    for (index, byte) in bytes.iter().take(4).enumerate() {
        value += (byte & 127) as usize * multiplier;
        if byte & 128 == 0 {
            return Ok((value, index + 1));
        }
        multiplier *= 128;
    }

    if bytes.len() >= 4 {
        return Err(DecodingError::InvalidRemainingLength);
    }

    Err(DecodingError::NotEnoughBytes {
        minimum: bytes.len() + 1,
        actual: bytes.len(),
    })
}

/// Try parsing next field as `String`.
/// The field must start with 2 bytes indicating the length of the string.
pub fn utf8(bytes: &mut Bytes) -> Result<String, DecodingError> {
    let value = crate::decode::bytes(bytes)?;
    let value = String::from_utf8(value.to_vec())
        .map_err(|_| DecodingError::InvalidValue("field is not valid UTF-8".into()))?;

    // [MQTT-1.5.3-2] A UTF-8 encoded string MUST NOT include an encoding of the null character U+0000.
    if value.contains('\0') {
        return Err(DecodingError::InvalidValue(
            "field contains the null character U+0000".into(),
        ));
    }
    Ok(value)
}

// Try parsing next field as `Bytes`.
// The field must start with 2 bytes indicating the length of the data.
pub fn bytes(bytes: &mut Bytes) -> Result<Bytes, DecodingError> {
    let length = u16(bytes)? as usize;
    if bytes.remaining() < length {
        return Err(DecodingError::NotEnoughBytes {
            minimum: length + 2,
            actual: bytes.remaining() + 2,
        });
    }

    Ok(bytes.split_to(length))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_remaining_length() {
        assert_eq!(remaining_length(&[0x00]), Ok((0, 1)));
        assert_eq!(remaining_length(&[0x7f]), Ok((127, 1)));
        assert_eq!(remaining_length(&[0x80, 0x01]), Ok((128, 2)));
        assert_eq!(remaining_length(&[0xff, 0x7f]), Ok((16_383, 2)));
        assert_eq!(remaining_length(&[0x80, 0x80, 0x01]), Ok((16_384, 3)));
        assert_eq!(
            remaining_length(&[0xff, 0xff, 0xff, 0x7f]),
            Ok((268_435_455, 4))
        );

        // Bytes following the field are ignored.
        assert_eq!(remaining_length(&[0x3e, 0x00, 0x04]), Ok((62, 1)));
    }

    #[test]
    fn test_remaining_length_with_continuation_bit_on_fourth_byte() {
        assert_eq!(
            remaining_length(&[0xff, 0xff, 0xff, 0xff, 0x01]),
            Err(DecodingError::InvalidRemainingLength)
        );
        assert_eq!(
            remaining_length(&[0x80, 0x80, 0x80, 0x80]),
            Err(DecodingError::InvalidRemainingLength)
        );
    }

    #[test]
    fn test_remaining_length_without_enough_bytes() {
        assert_eq!(
            remaining_length(&[]),
            Err(DecodingError::NotEnoughBytes {
                minimum: 1,
                actual: 0
            })
        );
        assert_eq!(
            remaining_length(&[0x80, 0x80]),
            Err(DecodingError::NotEnoughBytes {
                minimum: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_utf8() {
        let mut bytes = Bytes::from_static(b"\x00\x04MQTT\x04");
        assert_eq!(utf8(&mut bytes).unwrap(), "MQTT");
        // Only the field is consumed.
        assert_eq!(&bytes[..], b"\x04");

        let mut bytes = Bytes::from_static(b"\x00\x00");
        assert_eq!(utf8(&mut bytes).unwrap(), "");
    }

    #[test]
    fn test_utf8_rejects_invalid_input() {
        // The declared length exceeds the available data.
        let mut bytes = Bytes::from_static(b"\x00\x05MQTT");
        assert!(utf8(&mut bytes).unwrap_err().is_truncated());

        // Not even the length is complete.
        let mut bytes = Bytes::from_static(b"\x00");
        assert!(utf8(&mut bytes).unwrap_err().is_truncated());

        let mut bytes = Bytes::from_static(b"\x00\x02\xc3\x28");
        assert!(matches!(
            utf8(&mut bytes),
            Err(DecodingError::InvalidValue(_))
        ));

        let mut bytes = Bytes::from_static(b"\x00\x03a\x00b");
        assert!(matches!(
            utf8(&mut bytes),
            Err(DecodingError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_bytes() {
        let mut input = Bytes::from_static(b"\x00\x03\x00\xff\x01rest");
        assert_eq!(&bytes(&mut input).unwrap()[..], &[0x00, 0xff, 0x01]);
        assert_eq!(&input[..], b"rest");
    }

    #[test]
    fn test_packet_identifier() {
        let mut bytes = Bytes::from_static(&[0x4b, 0x42]);
        assert_eq!(packet_identifier(&mut bytes), Ok(19266));

        let mut bytes = Bytes::from_static(&[0x00, 0x00]);
        assert!(matches!(
            packet_identifier(&mut bytes),
            Err(DecodingError::InvalidValue(_))
        ));

        let mut bytes = Bytes::from_static(&[0x01]);
        assert!(packet_identifier(&mut bytes).unwrap_err().is_truncated());
    }
}
