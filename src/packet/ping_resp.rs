//! Providing [`PingResp`]
use crate::{
    decode::DecodingError,
    packet::{header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType,
};
use bytes::Bytes;

// A PINGRESP packet consists of only a header of two bytes.
// The first byte encodes the packet type, PINGRESP in this case.
// The second byte encodes the remaining length, which is 0.
/// A PINGRESP Packet is sent by the Server to the Client in response to a PINGREQ Packet. It indicates that the Server is alive.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct PingResp;

impl Frame for PingResp {
    const PACKET_TYPE: PacketType = PacketType::PingResp;

    fn decode(_header: FixedHeader, _body: &mut Bytes) -> Result<Self, DecodingError> {
        // The remaining length is verified by the caller. Any byte
        // in the body is reported as `DecodingError::TooManyBytes`.
        Ok(Self)
    }
}

impl TryFrom<Bytes> for PingResp {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<PingResp> for Packet {
    fn from(value: PingResp) -> Packet {
        Packet::PingResp(value)
    }
}

impl std::fmt::Debug for PingResp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PINGRESP").finish()
    }
}
