//! Providing [`PingReq`]
use crate::{
    decode::DecodingError,
    packet::{header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType,
};
use bytes::Bytes;

// A PINGREQ packet consists of only a header of two bytes.
// The first byte encodes the packet type, PINGREQ in this case.
// The second byte encodes the remaining length, which is 0.
/// A PINGREQ Packet is sent from a Client to the Server to indicate that the Client is alive.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct PingReq;

impl Frame for PingReq {
    const PACKET_TYPE: PacketType = PacketType::PingReq;

    fn decode(_header: FixedHeader, _body: &mut Bytes) -> Result<Self, DecodingError> {
        // The remaining length is verified by the caller. Any byte
        // in the body is reported as `DecodingError::TooManyBytes`.
        Ok(Self)
    }
}

impl TryFrom<Bytes> for PingReq {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<PingReq> for Packet {
    fn from(value: PingReq) -> Packet {
        Packet::PingReq(value)
    }
}

impl std::fmt::Debug for PingReq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PINGREQ").finish()
    }
}
