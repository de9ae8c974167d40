//! Providing [`FixedHeader`], the header present in every MQTT control packet.
use crate::{
    decode::{self, DecodingError},
    encode::{self, EncodingError},
    PacketType,
};
use bytes::{BufMut, BytesMut};

/// The [fixed header](https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718020)
/// is present in all MQTT control packets.
///
/// ```text
///   bit    | 7 6 5 4     | 3 2 1 0 |
///   byte 1 | packet type | flags   |
///   byte 2.. remaining length (1 to 4 bytes)
/// ```
///
/// # Example
///
/// ```
/// use kwikstaart::{FixedHeader, PacketType};
///
/// let (header, length) = FixedHeader::decode(&[0x10, 0x3e]).unwrap();
/// assert_eq!(header.packet_type(), PacketType::Connect);
/// assert_eq!(header.flags(), 0);
/// assert_eq!(header.remaining_length(), 62);
/// assert_eq!(length, 2);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FixedHeader {
    packet_type: PacketType,
    flags: u8,
    remaining_length: usize,
}

impl FixedHeader {
    pub(crate) fn new(packet_type: PacketType, flags: u8, remaining_length: usize) -> Self {
        Self {
            packet_type,
            flags: flags & 0b1111,
            remaining_length,
        }
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    /// The 4 least significant bits of the first byte.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// The number of bytes following the fixed header.
    pub fn remaining_length(&self) -> usize {
        self.remaining_length
    }

    /// Decode a fixed header at the start of `bytes`.
    ///
    /// Returns the header and the number of bytes it occupies. The packet type
    /// and flags are validated before the remaining length is looked at, so an
    /// unknown packet type is detected after receiving only the first byte.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodingError> {
        let byte = *bytes.first().ok_or(DecodingError::NotEnoughBytes {
            minimum: 2,
            actual: 0,
        })?;

        let packet_type = PacketType::try_from(byte >> 4)?;
        let flags = byte & 0b1111;
        packet_type.verify_flags(flags)?;

        let (remaining_length, length) = decode::remaining_length(&bytes[1..]).map_err(
            |error| match error {
                DecodingError::NotEnoughBytes { minimum, actual } => {
                    DecodingError::NotEnoughBytes {
                        minimum: minimum + 1,
                        actual: actual + 1,
                    }
                }
                error => error,
            },
        )?;

        Ok((
            Self {
                packet_type,
                flags,
                remaining_length,
            },
            length + 1,
        ))
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        buf.put_u8(u8::from(self.packet_type) << 4 | self.flags);
        encode::remaining_length(buf, self.remaining_length)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_fixed_header() {
        let (header, length) = FixedHeader::decode(&[0x32, 0x80, 0x01, 0xff]).unwrap();
        assert_eq!(header.packet_type(), PacketType::Publish);
        assert_eq!(header.flags(), 0b0010);
        assert_eq!(header.remaining_length(), 128);
        assert_eq!(length, 3);
    }

    #[test]
    fn test_decode_reserved_packet_types() {
        assert_eq!(
            FixedHeader::decode(&[0x00, 0x00]),
            Err(DecodingError::InvalidPacketType(0))
        );
        assert_eq!(
            FixedHeader::decode(&[0xf0, 0x00]),
            Err(DecodingError::InvalidPacketType(15))
        );

        // The packet type is rejected before the remaining length is needed.
        assert_eq!(
            FixedHeader::decode(&[0xf0]),
            Err(DecodingError::InvalidPacketType(15))
        );
    }

    #[test]
    fn test_decode_invalid_flags() {
        // CONNECT with a reserved bit set.
        assert_eq!(
            FixedHeader::decode(&[0x11, 0x00]),
            Err(DecodingError::InvalidFlags {
                packet_type: PacketType::Connect,
                flags: 1
            })
        );

        // SUBSCRIBE requires 0b0010.
        assert!(FixedHeader::decode(&[0x80, 0x00]).is_err());
        assert!(FixedHeader::decode(&[0x82, 0x00]).is_ok());

        // PUBLISH with QoS 3.
        assert!(FixedHeader::decode(&[0x36, 0x00]).is_err());
    }

    #[test]
    fn test_decode_incomplete_header() {
        assert!(FixedHeader::decode(&[]).unwrap_err().is_truncated());
        assert_eq!(
            FixedHeader::decode(&[0x30, 0x80]),
            Err(DecodingError::NotEnoughBytes {
                minimum: 3,
                actual: 2
            })
        );
        assert_eq!(
            FixedHeader::decode(&[0x30, 0x80, 0x80, 0x80, 0x80]),
            Err(DecodingError::InvalidRemainingLength)
        );
    }

    #[test]
    fn test_encode_fixed_header() {
        let mut buf = BytesMut::new();
        FixedHeader::new(PacketType::PubRel, 0b0010, 2)
            .encode(&mut buf)
            .unwrap();
        assert_eq!(&buf[..], &[0x62, 0x02]);

        let mut buf = BytesMut::new();
        FixedHeader::new(PacketType::Publish, 0b1011, 321)
            .encode(&mut buf)
            .unwrap();
        assert_eq!(&buf[..], &[0x3b, 0xc1, 0x02]);
    }
}
