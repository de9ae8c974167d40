use crate::{
    decode::{DecodingError, InvalidPacketTypeError},
    encode::EncodingError,
    ConnAck, Connect, Disconnect, PingReq, PingResp, PubAck, PubComp, PubRec, PubRel, Publish,
    SubAck, Subscribe, UnsubAck, Unsubscribe,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::error::Error;
use std::fmt::{self, Display};

mod ack;
pub mod connack;
pub mod connect;
pub mod disconnect;
pub mod header;
pub mod ping_req;
pub mod ping_resp;
pub mod puback;
pub mod pubcomp;
pub mod publish;
pub mod pubrec;
pub mod pubrel;
pub mod suback;
pub mod subscribe;
pub mod unsuback;
pub mod unsubscribe;

use header::FixedHeader;

/// An MQTT control packet.
///
/// # Example
///
/// Decode a complete frame:
/// ```
/// use bytes::Bytes;
/// use kwikstaart::{Packet, PacketType};
///
/// let packet = Packet::try_from(Bytes::from_static(&[0xc0, 0x00])).unwrap();
/// assert_eq!(packet.packet_type(), PacketType::PingReq);
/// ```
///
/// Encode a packet:
/// ```
/// use kwikstaart::{Packet, PubAck};
///
/// let packet: Packet = PubAck::new(1568).into();
/// assert_eq!(&packet.to_bytes().unwrap()[..], &[0x40, 0x02, 0x06, 0x20]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    Connect(Connect),
    ConnAck(ConnAck),
    Publish(Publish),
    PubAck(PubAck),
    PubRec(PubRec),
    PubRel(PubRel),
    PubComp(PubComp),
    Subscribe(Subscribe),
    SubAck(SubAck),
    Unsubscribe(Unsubscribe),
    UnsubAck(UnsubAck),
    PingReq(PingReq),
    PingResp(PingResp),
    Disconnect(Disconnect),
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::Connect(packet) => packet.packet_type(),
            Self::ConnAck(packet) => packet.packet_type(),
            Self::Publish(packet) => packet.packet_type(),
            Self::PubAck(packet) => packet.packet_type(),
            Self::PubRec(packet) => packet.packet_type(),
            Self::PubRel(packet) => packet.packet_type(),
            Self::PubComp(packet) => packet.packet_type(),
            Self::Subscribe(packet) => packet.packet_type(),
            Self::SubAck(packet) => packet.packet_type(),
            Self::Unsubscribe(packet) => packet.packet_type(),
            Self::UnsubAck(packet) => packet.packet_type(),
            Self::PingReq(packet) => packet.packet_type(),
            Self::PingResp(packet) => packet.packet_type(),
            Self::Disconnect(packet) => packet.packet_type(),
        }
    }

    /// Return the fixed header this packet encodes to.
    pub fn fixed_header(&self) -> Result<FixedHeader, EncodingError> {
        match self {
            Self::Connect(packet) => packet.fixed_header(),
            Self::ConnAck(packet) => packet.fixed_header(),
            Self::Publish(packet) => packet.fixed_header(),
            Self::PubAck(packet) => packet.fixed_header(),
            Self::PubRec(packet) => packet.fixed_header(),
            Self::PubRel(packet) => packet.fixed_header(),
            Self::PubComp(packet) => packet.fixed_header(),
            Self::Subscribe(packet) => packet.fixed_header(),
            Self::SubAck(packet) => packet.fixed_header(),
            Self::Unsubscribe(packet) => packet.fixed_header(),
            Self::UnsubAck(packet) => packet.fixed_header(),
            Self::PingReq(packet) => packet.fixed_header(),
            Self::PingResp(packet) => packet.fixed_header(),
            Self::Disconnect(packet) => packet.fixed_header(),
        }
    }

    /// Serialize the packet.
    pub fn to_bytes(&self) -> Result<Bytes, EncodingError> {
        match self {
            Self::Connect(packet) => packet.to_bytes(),
            Self::ConnAck(packet) => packet.to_bytes(),
            Self::Publish(packet) => packet.to_bytes(),
            Self::PubAck(packet) => packet.to_bytes(),
            Self::PubRec(packet) => packet.to_bytes(),
            Self::PubRel(packet) => packet.to_bytes(),
            Self::PubComp(packet) => packet.to_bytes(),
            Self::Subscribe(packet) => packet.to_bytes(),
            Self::SubAck(packet) => packet.to_bytes(),
            Self::Unsubscribe(packet) => packet.to_bytes(),
            Self::UnsubAck(packet) => packet.to_bytes(),
            Self::PingReq(packet) => packet.to_bytes(),
            Self::PingResp(packet) => packet.to_bytes(),
            Self::Disconnect(packet) => packet.to_bytes(),
        }
    }

    /// Decode the variable header and payload of a packet.
    ///
    /// `body` must contain exactly the `remaining_length` bytes that follow
    /// `header`. Bytes left over after decoding are an error.
    pub fn decode(header: FixedHeader, mut body: Bytes) -> Result<Self, DecodingError> {
        verify_body_length(&header, &body)?;

        let body = &mut body;
        let packet = match header.packet_type() {
            PacketType::Connect => Self::Connect(Connect::decode(header, body)?),
            PacketType::ConnAck => Self::ConnAck(ConnAck::decode(header, body)?),
            PacketType::Publish => Self::Publish(Publish::decode(header, body)?),
            PacketType::PubAck => Self::PubAck(PubAck::decode(header, body)?),
            PacketType::PubRec => Self::PubRec(PubRec::decode(header, body)?),
            PacketType::PubRel => Self::PubRel(PubRel::decode(header, body)?),
            PacketType::PubComp => Self::PubComp(PubComp::decode(header, body)?),
            PacketType::Subscribe => Self::Subscribe(Subscribe::decode(header, body)?),
            PacketType::SubAck => Self::SubAck(SubAck::decode(header, body)?),
            PacketType::Unsubscribe => Self::Unsubscribe(Unsubscribe::decode(header, body)?),
            PacketType::UnsubAck => Self::UnsubAck(UnsubAck::decode(header, body)?),
            PacketType::PingReq => Self::PingReq(PingReq::decode(header, body)?),
            PacketType::PingResp => Self::PingResp(PingResp::decode(header, body)?),
            PacketType::Disconnect => Self::Disconnect(Disconnect::decode(header, body)?),
        };

        if body.has_remaining() {
            return Err(DecodingError::TooManyBytes);
        }

        Ok(packet)
    }
}

impl TryFrom<Bytes> for Packet {
    type Error = DecodingError;

    fn try_from(mut value: Bytes) -> Result<Self, Self::Error> {
        let (header, offset) = FixedHeader::decode(&value)?;
        value.advance(offset);

        Packet::decode(header, value)
    }
}

/// Decode a complete frame as a specific packet type.
pub(crate) fn try_from_frame<F: Frame>(mut value: Bytes) -> Result<F, DecodingError> {
    let (header, offset) = FixedHeader::decode(&value)?;
    if header.packet_type() != F::PACKET_TYPE {
        return Err(DecodingError::InvalidPacketType(header.packet_type().into()));
    }
    value.advance(offset);
    verify_body_length(&header, &value)?;

    let frame = F::decode(header, &mut value)?;
    if value.has_remaining() {
        return Err(DecodingError::TooManyBytes);
    }
    Ok(frame)
}

// [MQTT-4.7.3-1] All Topic Names and Topic Filters MUST be at least one character long.
pub(crate) fn verify_topic(topic: &str) -> Result<(), String> {
    if topic.is_empty() {
        return Err("topic must be at least one character long".into());
    }
    Ok(())
}

fn verify_body_length(header: &FixedHeader, body: &Bytes) -> Result<(), DecodingError> {
    if body.len() < header.remaining_length() {
        return Err(DecodingError::NotEnoughBytes {
            minimum: header.remaining_length(),
            actual: body.len(),
        });
    }
    if body.len() > header.remaining_length() {
        return Err(DecodingError::TooManyBytes);
    }
    Ok(())
}

// An mqtt frame consists of 3 parts:
// - A fixed header, present in all MQTT Control Packets
// - A variable header, present in some
// - A payload, present in some
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    Unsubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
}

impl PacketType {
    /// The flags this packet type must carry in its fixed header.
    ///
    /// `None` for [`PacketType::Publish`], where the flags encode DUP, QoS and RETAIN.
    pub fn required_flags(&self) -> Option<u8> {
        match self {
            Self::Publish => None,
            Self::PubRel | Self::Subscribe | Self::Unsubscribe => Some(0b0010),
            _ => Some(0b0000),
        }
    }

    pub(crate) fn verify_flags(&self, flags: u8) -> Result<(), DecodingError> {
        let valid = match self.required_flags() {
            Some(required) => flags == required,
            // QoS is encoded in bit 2 and 1. Both bits set is not a valid QoS.
            None => (flags >> 1) & 0b11 != 0b11,
        };

        if !valid {
            return Err(DecodingError::InvalidFlags {
                packet_type: *self,
                flags,
            });
        }
        Ok(())
    }
}

impl From<PacketType> for u8 {
    fn from(value: PacketType) -> u8 {
        value as u8
    }
}

impl TryFrom<u8> for PacketType {
    type Error = InvalidPacketTypeError;

    /// Convert the 4 bit packet type field. Both 0 and 15 are reserved.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let packet_type = match value {
            1 => Self::Connect,
            2 => Self::ConnAck,
            3 => Self::Publish,
            4 => Self::PubAck,
            5 => Self::PubRec,
            6 => Self::PubRel,
            7 => Self::PubComp,
            8 => Self::Subscribe,
            9 => Self::SubAck,
            10 => Self::Unsubscribe,
            11 => Self::UnsubAck,
            12 => Self::PingReq,
            13 => Self::PingResp,
            14 => Self::Disconnect,
            _ => return Err(InvalidPacketTypeError(value)),
        };

        Ok(packet_type)
    }
}

/// The codec of a single packet type.
///
/// Implementors describe how their variable header and payload are encoded
/// and decoded. Framing, the fixed header and the remaining length, is
/// provided.
pub trait Frame: Sized {
    const PACKET_TYPE: PacketType;

    fn packet_type(&self) -> PacketType {
        Self::PACKET_TYPE
    }

    /// The lower nibble of the fixed header.
    fn flags(&self) -> u8 {
        Self::PACKET_TYPE.required_flags().unwrap_or_default()
    }

    // Write the variable header. Some packets don't have one.
    fn encode_variable_header(&self, _buf: &mut BytesMut) -> Result<(), EncodingError> {
        Ok(())
    }

    // Write the payload. Some packets don't have one.
    fn encode_payload(&self, _buf: &mut BytesMut) -> Result<(), EncodingError> {
        Ok(())
    }

    /// Decode the variable header and payload from `body`.
    ///
    /// `body` holds exactly the bytes following the fixed header. The flags of
    /// `header` are already verified against [`PacketType::required_flags()`].
    fn decode(header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError>;

    /// Encode the variable header and payload.
    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        self.encode_variable_header(buf)?;
        self.encode_payload(buf)
    }

    fn fixed_header(&self) -> Result<FixedHeader, EncodingError> {
        let mut body = BytesMut::new();
        self.encode_body(&mut body)?;
        Ok(FixedHeader::new(Self::PACKET_TYPE, self.flags(), body.len()))
    }

    /// Serialize the packet.
    ///
    /// The remaining length depends on the size of the body. So the body is
    /// encoded first, and the fixed header is put in front of it.
    fn to_bytes(&self) -> Result<Bytes, EncodingError> {
        let mut body = BytesMut::new();
        self.encode_body(&mut body)?;

        let header = FixedHeader::new(Self::PACKET_TYPE, self.flags(), body.len());
        let mut packet = BytesMut::with_capacity(body.len() + 5);
        header.encode(&mut packet)?;
        packet.put(body);

        Ok(packet.freeze())
    }

    // Return the length of the frame in bytes.
    fn length(&self) -> Result<usize, EncodingError> {
        self.to_bytes().map(|bytes| bytes.len())
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProtocolLevel {
    _3_1_1 = 4,
}

/// The Quality of Service of a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[repr(u8)]
pub enum QoS {
    AtMostOnceDelivery = 0,
    AtLeastOnceDelivery = 1,
    ExactlyOnceDelivery = 2,
}

impl TryFrom<&u8> for QoS {
    type Error = InvalidQoS;

    fn try_from(value: &u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::AtMostOnceDelivery),
            1 => Ok(Self::AtLeastOnceDelivery),
            2 => Ok(Self::ExactlyOnceDelivery),
            _ => Err(InvalidQoS(*value)),
        }
    }
}

impl TryFrom<u8> for QoS {
    type Error = InvalidQoS;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        QoS::try_from(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidQoS(pub u8);

impl Error for InvalidQoS {}

impl Display for InvalidQoS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a valid value for QoS", self.0)
    }
}

impl From<InvalidQoS> for DecodingError {
    fn from(value: InvalidQoS) -> Self {
        DecodingError::InvalidValue(value.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_packet_type_conversion() {
        for value in 1..=14u8 {
            let packet_type = PacketType::try_from(value).unwrap();
            assert_eq!(u8::from(packet_type), value);
        }

        assert_eq!(PacketType::try_from(0), Err(InvalidPacketTypeError(0)));
        assert_eq!(PacketType::try_from(15), Err(InvalidPacketTypeError(15)));
    }

    #[test]
    fn test_required_flags() {
        assert_eq!(PacketType::Connect.required_flags(), Some(0));
        assert_eq!(PacketType::PubRel.required_flags(), Some(0b0010));
        assert_eq!(PacketType::Subscribe.required_flags(), Some(0b0010));
        assert_eq!(PacketType::Unsubscribe.required_flags(), Some(0b0010));
        assert_eq!(PacketType::Publish.required_flags(), None);

        assert!(PacketType::Publish.verify_flags(0b1101).is_ok());
        assert!(PacketType::Publish.verify_flags(0b0110).is_err());
        assert!(PacketType::PingReq.verify_flags(0b0001).is_err());
    }

    #[test]
    fn test_decode_frame_with_trailing_bytes() {
        let input = Bytes::from_static(&[0xc0, 0x00, 0xc0]);
        assert_eq!(Packet::try_from(input), Err(DecodingError::TooManyBytes));
    }

    #[test]
    fn test_decode_truncated_frame() {
        let input = Bytes::from_static(&[0x40, 0x02, 0x06]);
        assert_eq!(
            Packet::try_from(input),
            Err(DecodingError::NotEnoughBytes {
                minimum: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_decode_body_with_unread_bytes() {
        // A PUBACK with a remaining length of 3 contains a byte that no field claims.
        let input = Bytes::from_static(&[0x40, 0x03, 0x06, 0x20, 0x00]);
        assert_eq!(Packet::try_from(input), Err(DecodingError::TooManyBytes));
    }

    #[test]
    fn test_qos_conversion() {
        assert_eq!(QoS::try_from(1_u8), Ok(QoS::AtLeastOnceDelivery));
        assert_eq!(QoS::try_from(3_u8), Err(InvalidQoS(3)));
    }
}
