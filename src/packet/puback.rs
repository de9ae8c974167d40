//! Providing [`PubAck`], to acknowledge a [`crate::Publish`].
use crate::{
    decode::DecodingError,
    encode::EncodingError,
    packet::{ack::Ack, header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType,
};
use bytes::{Bytes, BytesMut};

/// A [`PubAck`] packet is the response to a [`crate::Publish`] packet with
/// [`crate::QoS::AtLeastOnceDelivery`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PubAck(Ack);

impl PubAck {
    /// Create a new `PubAck` with the given packet identifier.
    pub fn new(packet_identifier: u16) -> Self {
        Self(Ack::new(packet_identifier))
    }

    /// Retrieve the packet identifier.
    pub fn packet_identifier(&self) -> u16 {
        self.0.packet_identifier()
    }
}

impl Frame for PubAck {
    const PACKET_TYPE: PacketType = PacketType::PubAck;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        self.0.encode(buf)
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        Ack::decode(body).map(Self)
    }
}

impl TryFrom<Bytes> for PubAck {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<PubAck> for Packet {
    fn from(value: PubAck) -> Packet {
        Packet::PubAck(value)
    }
}

impl std::fmt::Debug for PubAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PUBACK")
            .field("packet_identifier", &self.packet_identifier())
            .finish()
    }
}
