//! Providing [`PubRel`], to acknowledge a [`crate::PubRec`].
use crate::{
    decode::DecodingError,
    encode::EncodingError,
    packet::{ack::Ack, header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType,
};
use bytes::{Bytes, BytesMut};

/// A [`PubRel`] packet is the response to a [`crate::PubRec`].
///
/// The lower nibble of the fixed header is always `0b0010`.
/// https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718022
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PubRel(Ack);

impl PubRel {
    /// Create a new `PubRel` with the given packet identifier.
    pub fn new(packet_identifier: u16) -> Self {
        Self(Ack::new(packet_identifier))
    }

    /// Retrieve the packet identifier.
    pub fn packet_identifier(&self) -> u16 {
        self.0.packet_identifier()
    }
}

impl Frame for PubRel {
    const PACKET_TYPE: PacketType = PacketType::PubRel;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        self.0.encode(buf)
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        Ack::decode(body).map(Self)
    }
}

impl TryFrom<Bytes> for PubRel {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<PubRel> for Packet {
    fn from(value: PubRel) -> Packet {
        Packet::PubRel(value)
    }
}

impl std::fmt::Debug for PubRel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PUBREL")
            .field("packet_identifier", &self.packet_identifier())
            .finish()
    }
}
