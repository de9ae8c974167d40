//! Providing [`PubComp`], to acknowledge a [`crate::PubRel`].
use crate::{
    decode::DecodingError,
    encode::EncodingError,
    packet::{ack::Ack, header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType,
};
use bytes::{Bytes, BytesMut};

/// A [`PubComp`] packet is the response to a [`crate::PubRel`].
/// It's the fourth and final packet of the QoS 2 protocol exchange.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PubComp(Ack);

impl PubComp {
    /// Create a new `PubComp` with the given packet identifier.
    pub fn new(packet_identifier: u16) -> Self {
        Self(Ack::new(packet_identifier))
    }

    /// Retrieve the packet identifier.
    pub fn packet_identifier(&self) -> u16 {
        self.0.packet_identifier()
    }
}

impl Frame for PubComp {
    const PACKET_TYPE: PacketType = PacketType::PubComp;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        self.0.encode(buf)
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        Ack::decode(body).map(Self)
    }
}

impl TryFrom<Bytes> for PubComp {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<PubComp> for Packet {
    fn from(value: PubComp) -> Packet {
        Packet::PubComp(value)
    }
}

impl std::fmt::Debug for PubComp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PUBCOMP")
            .field("packet_identifier", &self.packet_identifier())
            .finish()
    }
}
