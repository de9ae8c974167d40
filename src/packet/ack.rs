//! Providing [`Ack`], a type to compose messages like [`crate::PubAck`], [`crate::UnsubAck`] and more.
use crate::{
    decode::{self, DecodingError},
    encode::{self, EncodingError},
};
use bytes::{Bytes, BytesMut};

/// [`Ack`] is a type to compose messages like [`crate::PubAck`], [`crate::UnsubAck`] and a few others.
///
/// It models the body of a 4 byte message:
/// * a byte that includes the packet type
/// * a byte that contains the remaining length, it's always 2.
/// * 2 bytes to encode the packet identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ack {
    packet_identifier: u16,
}

impl Ack {
    pub(crate) fn new(packet_identifier: u16) -> Self {
        Self { packet_identifier }
    }

    pub(crate) fn packet_identifier(&self) -> u16 {
        self.packet_identifier
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        encode::packet_identifier(buf, self.packet_identifier)
    }

    pub(crate) fn decode(body: &mut Bytes) -> Result<Self, DecodingError> {
        Ok(Self::new(decode::packet_identifier(body)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_ack() {
        let mut body = Bytes::from_static(&[0x06, 0x20]);
        assert_eq!(Ack::decode(&mut body).unwrap().packet_identifier(), 1568);
        assert!(body.is_empty());

        let mut body = Bytes::from_static(&[0x06]);
        assert!(Ack::decode(&mut body).unwrap_err().is_truncated());

        let mut body = Bytes::from_static(&[0x00, 0x00]);
        assert!(Ack::decode(&mut body).is_err());
    }
}
