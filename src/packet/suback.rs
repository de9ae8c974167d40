//! The server's answer to a [`crate::Subscribe`].
use crate::{
    decode::{self, DecodingError},
    encode::{self, EncodingError},
    packet::{header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType, QoS,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt::Display;

/// [SUBACK](https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718068)
/// holds a return code for every topic filter of the [`crate::Subscribe`] it confirms.
///
/// ```
/// use bytes::Bytes;
/// use kwikstaart::{packet::suback::ReturnCode, QoS, SubAck};
///
/// let suback = SubAck::try_from(Bytes::from_static(&[0x90, 0x04, 0x37, 0xdb, 0x01, 0x80])).unwrap();
/// assert_eq!(suback.packet_identifier(), 14299);
/// assert_eq!(
///     suback.return_codes(),
///     &[ReturnCode::QoS(QoS::AtLeastOnceDelivery), ReturnCode::Failure]
/// );
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SubAck {
    packet_identifier: u16,
    return_codes: Vec<ReturnCode>,
}

impl SubAck {
    pub fn builder(packet_identifier: u16, return_code: impl Into<ReturnCode>) -> Builder {
        Builder::new(packet_identifier, return_code)
    }

    /// Equal to the packet identifier of the acknowledged [`crate::Subscribe`].
    pub fn packet_identifier(&self) -> u16 {
        self.packet_identifier
    }

    pub fn return_codes(&self) -> &[ReturnCode] {
        &self.return_codes
    }
}

impl Frame for SubAck {
    const PACKET_TYPE: PacketType = PacketType::SubAck;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        encode::packet_identifier(buf, self.packet_identifier)
    }

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        if self.return_codes.is_empty() {
            return Err(EncodingError::InvalidValue(
                "SUBACK must contain at least one return code".into(),
            ));
        }

        for code in &self.return_codes {
            buf.put_u8((*code).into());
        }
        Ok(())
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        let packet_identifier = decode::packet_identifier(body)?;

        let mut return_codes = Vec::with_capacity(body.remaining());
        while body.has_remaining() {
            return_codes.push(ReturnCode::try_from(body.get_u8())?);
        }

        if return_codes.is_empty() {
            return Err(DecodingError::InvalidValue(
                "SUBACK must contain at least one return code".into(),
            ));
        }

        Ok(Self {
            packet_identifier,
            return_codes,
        })
    }
}

impl TryFrom<Bytes> for SubAck {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<SubAck> for Packet {
    fn from(value: SubAck) -> Packet {
        Packet::SubAck(value)
    }
}

impl std::fmt::Debug for SubAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SUBACK")
            .field("packet_identifier", &self.packet_identifier)
            .field("return_codes", &self.return_codes)
            .finish()
    }
}

/// Configures a [`SubAck`]. Return codes are kept in the order they are added.
#[derive(Clone, Debug)]
pub struct Builder {
    packet_identifier: u16,
    return_codes: Vec<ReturnCode>,
}

impl Builder {
    pub fn new(packet_identifier: u16, return_code: impl Into<ReturnCode>) -> Self {
        Self {
            packet_identifier,
            return_codes: vec![return_code.into()],
        }
    }

    pub fn add_return_code(mut self, return_code: impl Into<ReturnCode>) -> Self {
        self.return_codes.push(return_code.into());
        self
    }

    pub fn build(self) -> SubAck {
        SubAck {
            packet_identifier: self.packet_identifier,
            return_codes: self.return_codes,
        }
    }

    pub fn build_packet(self) -> Packet {
        self.build().into()
    }
}

/// Outcome of a single subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum ReturnCode {
    /// Subscribed, with the maximum QoS the server grants.
    QoS(QoS),

    Failure,
}

impl From<QoS> for ReturnCode {
    fn from(value: QoS) -> Self {
        ReturnCode::QoS(value)
    }
}

impl From<ReturnCode> for u8 {
    fn from(value: ReturnCode) -> Self {
        match value {
            ReturnCode::QoS(qos) => qos as u8,
            ReturnCode::Failure => 0x80,
        }
    }
}

impl TryFrom<u8> for ReturnCode {
    type Error = InvalidReturnCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x80 => Ok(Self::Failure),
            _ => QoS::try_from(value)
                .map(Self::QoS)
                .map_err(|_| InvalidReturnCode(value)),
        }
    }
}

/// A SUBACK return code other than 0x00, 0x01, 0x02 or 0x80.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InvalidReturnCode(pub u8);

impl Display for InvalidReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x} is not a valid SUBACK return code", self.0)
    }
}

impl std::error::Error for InvalidReturnCode {}

impl From<InvalidReturnCode> for DecodingError {
    fn from(value: InvalidReturnCode) -> Self {
        DecodingError::InvalidValue(value.to_string())
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for SubAck {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let mut builder = SubAck::builder(u16::arbitrary(u)?.max(1), ReturnCode::arbitrary(u)?);
        for code in u.arbitrary_iter::<ReturnCode>()? {
            builder = builder.add_return_code(code?);
        }
        Ok(builder.build())
    }
}
