//! Providing [`Disconnect`]
use crate::{
    decode::DecodingError,
    packet::{header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType,
};
use bytes::Bytes;

// A DISCONNECT packet consists of only a header of two bytes.
// The first byte encodes the packet type, DISCONNECT in this case.
// The second byte encodes the remaining length, which is 0.
/// The Disconnect Packet is the final packet sent from a Client to the Server.
/// It indicates that the Client is disconnecting cleanly.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Disconnect;

impl Frame for Disconnect {
    const PACKET_TYPE: PacketType = PacketType::Disconnect;

    fn decode(_header: FixedHeader, _body: &mut Bytes) -> Result<Self, DecodingError> {
        // The remaining length is verified by the caller. Any byte
        // in the body is reported as `DecodingError::TooManyBytes`.
        Ok(Self)
    }
}

impl TryFrom<Bytes> for Disconnect {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<Disconnect> for Packet {
    fn from(value: Disconnect) -> Packet {
        Packet::Disconnect(value)
    }
}

impl std::fmt::Debug for Disconnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DISCONNECT").finish()
    }
}
