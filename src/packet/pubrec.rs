//! Providing [`PubRec`], the first response to a [`crate::Publish`] with QoS 2.
use crate::{
    decode::DecodingError,
    encode::EncodingError,
    packet::{ack::Ack, header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType,
};
use bytes::{Bytes, BytesMut};

/// A [`PubRec`] packet is the response to a [`crate::Publish`] packet with
/// [`crate::QoS::ExactlyOnceDelivery`]. It's the second packet of the QoS 2 protocol exchange.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PubRec(Ack);

impl PubRec {
    /// Create a new `PubRec` with the given packet identifier.
    pub fn new(packet_identifier: u16) -> Self {
        Self(Ack::new(packet_identifier))
    }

    /// Retrieve the packet identifier.
    pub fn packet_identifier(&self) -> u16 {
        self.0.packet_identifier()
    }
}

impl Frame for PubRec {
    const PACKET_TYPE: PacketType = PacketType::PubRec;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        self.0.encode(buf)
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        Ack::decode(body).map(Self)
    }
}

impl TryFrom<Bytes> for PubRec {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<PubRec> for Packet {
    fn from(value: PubRec) -> Packet {
        Packet::PubRec(value)
    }
}

impl std::fmt::Debug for PubRec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PUBREC")
            .field("packet_identifier", &self.packet_identifier())
            .finish()
    }
}
