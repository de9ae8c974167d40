//! Providing [`UnsubAck`], to acknowledge a [`crate::Unsubscribe`].
use crate::{
    decode::DecodingError,
    encode::EncodingError,
    packet::{ack::Ack, header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType,
};
use bytes::{Bytes, BytesMut};

/// The [`UnsubAck`] packet is sent by the server to the client to confirm receipt of an [`crate::Unsubscribe`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UnsubAck(Ack);

impl UnsubAck {
    /// Create a new `UnsubAck` with the given packet identifier.
    pub fn new(packet_identifier: u16) -> Self {
        Self(Ack::new(packet_identifier))
    }

    /// Retrieve the packet identifier.
    pub fn packet_identifier(&self) -> u16 {
        self.0.packet_identifier()
    }
}

impl Frame for UnsubAck {
    const PACKET_TYPE: PacketType = PacketType::UnsubAck;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        self.0.encode(buf)
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        Ack::decode(body).map(Self)
    }
}

impl TryFrom<Bytes> for UnsubAck {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<UnsubAck> for Packet {
    fn from(value: UnsubAck) -> Packet {
        Packet::UnsubAck(value)
    }
}

impl std::fmt::Debug for UnsubAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UNSUBACK")
            .field("packet_identifier", &self.packet_identifier())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encode_and_decode() {
        let unsuback = UnsubAck::new(1568);
        let bytes = unsuback.to_bytes().unwrap();
        assert_eq!(&bytes[..], &[0xb0, 0x02, 0x06, 0x20]);
        assert_eq!(UnsubAck::try_from(bytes).unwrap(), unsuback);
    }
}
