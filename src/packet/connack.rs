//! The server's answer to a [`crate::Connect`].
use crate::{
    decode::{self, DecodingError},
    encode::EncodingError,
    packet::{header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType,
};
use bytes::{BufMut, Bytes, BytesMut};

/// [CONNACK](https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718033)
/// tells a client whether its connection attempt was accepted.
///
/// ```
/// use kwikstaart::{packet::connack::ReturnCode, ConnAck, Frame};
///
/// let connack = ConnAck::builder().session_present().build();
/// assert_eq!(&connack.to_bytes().unwrap()[..], &[0x20, 0x02, 0x01, 0x00]);
///
/// let refused = ConnAck::builder()
///     .return_code(ReturnCode::ConnectionRefusedServerUnavailable)
///     .build();
/// assert_eq!(&refused.to_bytes().unwrap()[..], &[0x20, 0x02, 0x00, 0x03]);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ConnAck {
    session_present: bool,
    return_code: ReturnCode,
}

impl ConnAck {
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Whether the server resumed a session it kept for this client.
    pub fn session_present(&self) -> bool {
        self.session_present
    }

    pub fn return_code(&self) -> ReturnCode {
        self.return_code
    }
}

impl Frame for ConnAck {
    const PACKET_TYPE: PacketType = PacketType::ConnAck;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        buf.put_u8(u8::from(self.session_present));
        buf.put_u8(self.return_code.into());
        Ok(())
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        // Bits 7-1 are reserved, bit 0 is session present.
        let acknowledge_flags = decode::u8(body)?;
        if acknowledge_flags & 0b1111_1110 != 0 {
            return Err(DecodingError::InvalidValue(format!(
                "acknowledge flags {acknowledge_flags:#010b} have reserved bits set"
            )));
        }
        let session_present = acknowledge_flags == 1;

        let return_code = ReturnCode::try_from(decode::u8(body)?)?;

        // [MQTT-3.2.2-4] If a server sends a CONNACK packet containing a non-zero return code it MUST set Session Present to 0.
        if session_present && return_code != ReturnCode::ConnectionAccepted {
            return Err(DecodingError::InvalidValue(format!(
                "session present is set, but connection is refused with {return_code:?}"
            )));
        }

        Ok(Self {
            session_present,
            return_code,
        })
    }
}

impl TryFrom<Bytes> for ConnAck {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<ConnAck> for Packet {
    fn from(value: ConnAck) -> Self {
        Packet::ConnAck(value)
    }
}

impl std::fmt::Debug for ConnAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CONNACK")
            .field("session_present", &self.session_present)
            .field("return_code", &self.return_code)
            .finish()
    }
}

/// Outcome of a connection attempt. Every code but `ConnectionAccepted`
/// means the server closes the connection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[repr(u8)]
pub enum ReturnCode {
    ConnectionAccepted = 0,

    /// Protocol level not supported.
    ConnectionRefusedUnacceptableProtocolVersion = 1,

    ConnectionRefusedIdentifierRejected = 2,

    ConnectionRefusedServerUnavailable = 3,

    ConnectionRefusedBadUsernameOrPassword = 4,

    ConnectionRefusedNotAuthorized = 5,
}

impl TryFrom<u8> for ReturnCode {
    type Error = DecodingError;

    // Codes 6-255 are reserved.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use ReturnCode::*;

        [
            ConnectionAccepted,
            ConnectionRefusedUnacceptableProtocolVersion,
            ConnectionRefusedIdentifierRejected,
            ConnectionRefusedServerUnavailable,
            ConnectionRefusedBadUsernameOrPassword,
            ConnectionRefusedNotAuthorized,
        ]
        .get(usize::from(value))
        .copied()
        .ok_or_else(|| DecodingError::InvalidValue(format!("unknown CONNACK return code {value}")))
    }
}

impl From<ReturnCode> for u8 {
    fn from(value: ReturnCode) -> Self {
        value as u8
    }
}

/// Configures a [`ConnAck`]. By default the connection is accepted
/// without a session.
#[derive(Debug, Clone)]
pub struct Builder {
    session_present: bool,
    return_code: ReturnCode,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            session_present: false,
            return_code: ReturnCode::ConnectionAccepted,
        }
    }

    /// Mark the session of the client as resumed. Has no effect
    /// if the connection is refused.
    pub fn session_present(mut self) -> Self {
        self.session_present = true;
        self
    }

    pub fn return_code(mut self, return_code: ReturnCode) -> Self {
        self.return_code = return_code;
        self
    }

    pub fn build(self) -> ConnAck {
        let accepted = self.return_code == ReturnCode::ConnectionAccepted;
        ConnAck {
            session_present: self.session_present && accepted,
            return_code: self.return_code,
        }
    }

    pub fn build_packet(self) -> Packet {
        self.build().into()
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for ConnAck {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let builder = Builder::new().return_code(ReturnCode::arbitrary(u)?);
        let builder = match bool::arbitrary(u)? {
            true => builder.session_present(),
            false => builder,
        };
        Ok(builder.build())
    }
}
