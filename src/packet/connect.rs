//! Opening a session.
use crate::{
    decode::{self, DecodingError},
    encode::{self, EncodingError},
    packet::{header::FixedHeader, try_from_frame},
    Frame, Packet, PacketType, ProtocolLevel, QoS,
};
use bytes::{BufMut, Bytes, BytesMut};
use core::fmt;
use std::marker::PhantomData;

const PROTOCOL_NAME: &str = "MQTT";

/// [CONNECT](https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718028)
/// opens a session. A client sends it once, right after the network connection is established.
///
/// ```
/// use kwikstaart::{Connect, Frame};
///
/// let packet = Connect::builder()
///     .client_id("thermostat-3")
///     .keep_alive(300)
///     .clean_session()
///     .build();
///
/// let frame = packet.to_bytes().unwrap();
/// assert_eq!(&frame[..12], &[0x10, 0x18, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0x02, 0x01, 0x2c]);
///
/// let decoded = Connect::try_from(frame).unwrap();
/// assert_eq!(decoded.client_id(), "thermostat-3");
/// assert_eq!(decoded.keep_alive(), 300);
/// assert!(decoded.flags().clean_session());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Connect {
    protocol_level: u8,
    clean_session: bool,
    keep_alive: u16,

    client_id: String,
    will: Option<Will>,
    username: Option<String>,
    password: Option<Bytes>,
}

impl Connect {
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// The protocol name. It's always "MQTT".
    pub fn protocol_name(&self) -> &str {
        PROTOCOL_NAME
    }

    /// The revision of the protocol requested by the client.
    ///
    /// A level other than 4 is not a malformed packet. The server
    /// responds to it with [`crate::packet::connack::ReturnCode::ConnectionRefusedUnacceptableProtocolVersion`].
    pub fn protocol_level(&self) -> u8 {
        self.protocol_level
    }

    /// The connect flags, derived from the fields of the packet.
    ///
    /// ```
    /// use kwikstaart::Connect;
    ///
    /// let flags = Connect::builder().username("gateway").build().flags();
    /// assert!(flags.username());
    /// assert!(!flags.password());
    /// assert_eq!(flags.bits(), 0b1000_0010);
    /// ```
    pub fn flags(&self) -> Flags {
        let mut flags = Flags::default();
        if self.clean_session {
            flags.set_clean_session();
        }

        if let Some(will) = &self.will {
            flags.set_will_flag();
            flags.set_will_qos(will.qos);
            if will.retain {
                flags.set_will_retain();
            }
        }

        if self.username.is_some() {
            flags.set_username();
        }

        if self.password.is_some() {
            flags.set_password();
        }
        flags
    }

    /// May be empty, in which case the server assigns an identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Maximum number of seconds between two packets from the client. 0 disables the mechanism.
    pub fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&[u8]> {
        self.password.as_deref()
    }

    /// The password as text. `None` if there is no password or if it
    /// isn't valid UTF-8.
    pub fn password_str(&self) -> Option<&str> {
        self.password().and_then(|password| std::str::from_utf8(password).ok())
    }

    /// The message the server publishes when the client disappears without a DISCONNECT.
    pub fn will(&self) -> Option<&Will> {
        self.will.as_ref()
    }
}

impl Frame for Connect {
    const PACKET_TYPE: PacketType = PacketType::Connect;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        encode::utf8(buf, PROTOCOL_NAME)?;
        buf.put_u8(self.protocol_level);
        buf.put_u8(self.flags().bits());
        buf.put_u16(self.keep_alive);
        Ok(())
    }

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        // The order of the fields is fixed. A field is only present
        // if the corresponding flag is set.
        encode::utf8(buf, &self.client_id)?;
        if let Some(will) = &self.will {
            encode::utf8(buf, &will.topic)?;
            encode::bytes(buf, &will.message)?;
        }

        if let Some(username) = &self.username {
            encode::utf8(buf, username)?;
        }

        if let Some(password) = &self.password {
            encode::bytes(buf, password)?;
        }
        Ok(())
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        let protocol_name = decode::utf8(body)?;
        if protocol_name != PROTOCOL_NAME {
            return Err(DecodingError::InvalidValue(format!(
                "protocol name must be \"{PROTOCOL_NAME}\", but is {protocol_name:?}"
            )));
        }

        let protocol_level = decode::u8(body)?;
        let flags = Flags::try_from(decode::u8(body)?)?;
        let keep_alive = decode::u16(body)?;

        // [MQTT-3.1.3-3] The Client Identifier (ClientId) MUST be present and MUST be the first field in the CONNECT packet payload.
        // A zero-byte ClientId is allowed.
        let client_id = decode::utf8(body)?;

        let will = if flags.will_flag() {
            Some(Will {
                topic: decode::utf8(body)?,
                message: decode::bytes(body)?,
                qos: flags.will_qos(),
                retain: flags.will_retain(),
            })
        } else {
            None
        };

        let username = if flags.username() {
            Some(decode::utf8(body)?)
        } else {
            None
        };

        let password = if flags.password() {
            Some(decode::bytes(body)?)
        } else {
            None
        };

        Ok(Self {
            protocol_level,
            clean_session: flags.clean_session(),
            keep_alive,
            client_id,
            will,
            username,
            password,
        })
    }
}

impl TryFrom<Bytes> for Connect {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<Connect> for Packet {
    fn from(value: Connect) -> Packet {
        Packet::Connect(value)
    }
}

impl std::fmt::Debug for Connect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the password.
        f.debug_struct("CONNECT")
            .field("protocol_level", &self.protocol_level)
            .field("client_id", &self.client_id())
            .field("keep_alive", &self.keep_alive())
            .field("flags", &self.flags())
            .field("username", &self.username())
            .field("will", &self.will())
            .finish()
    }
}

/// The connect flags of a [`Connect`].
///
/// ```text
///   bit | 7        | 6        | 5           | 4 3      | 2         | 1             | 0
///       | username | password | will retain | will QoS | will flag | clean session | reserved
/// ```
///
/// A `Flags` can only be created from a valid byte.
///
/// ```
/// use kwikstaart::{packet::connect::Flags, QoS};
///
/// let flags = Flags::try_from(0xce).unwrap();
/// assert!(flags.username());
/// assert!(flags.password());
/// assert!(!flags.will_retain());
/// assert_eq!(flags.will_qos(), QoS::AtLeastOnceDelivery);
/// assert!(flags.will_flag());
/// assert!(flags.clean_session());
/// assert!(!flags.reserved());
///
/// // The reserved bit is set.
/// assert!(Flags::try_from(0xcf).is_err());
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    const USERNAME: u8 = 0b1000_0000;
    const PASSWORD: u8 = 0b0100_0000;
    const WILL_RETAIN: u8 = 0b0010_0000;
    const WILL_QOS: u8 = 0b0001_1000;
    const WILL_FLAG: u8 = 0b0000_0100;
    const CLEAN_SESSION: u8 = 0b0000_0010;
    const RESERVED: u8 = 0b0000_0001;

    pub fn bits(&self) -> u8 {
        self.0
    }

    fn is_set(&self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    fn set(&mut self, mask: u8) {
        self.0 |= mask;
    }

    pub fn username(&self) -> bool {
        self.is_set(Self::USERNAME)
    }

    fn set_username(&mut self) {
        self.set(Self::USERNAME)
    }

    pub fn password(&self) -> bool {
        self.is_set(Self::PASSWORD)
    }

    fn set_password(&mut self) {
        self.set(Self::PASSWORD)
    }

    pub fn will_retain(&self) -> bool {
        self.is_set(Self::WILL_RETAIN)
    }

    fn set_will_retain(&mut self) {
        self.set(Self::WILL_RETAIN)
    }

    pub fn will_qos(&self) -> QoS {
        // `Flags` is never created with both QoS bits set.
        QoS::try_from((self.0 & Self::WILL_QOS) >> 3).unwrap_or(QoS::AtMostOnceDelivery)
    }

    fn set_will_qos(&mut self, qos: QoS) {
        self.set((qos as u8) << 3)
    }

    pub fn will_flag(&self) -> bool {
        self.is_set(Self::WILL_FLAG)
    }

    fn set_will_flag(&mut self) {
        self.set(Self::WILL_FLAG)
    }

    pub fn clean_session(&self) -> bool {
        self.is_set(Self::CLEAN_SESSION)
    }

    fn set_clean_session(&mut self) {
        self.set(Self::CLEAN_SESSION)
    }

    /// Never set on a valid packet.
    pub fn reserved(&self) -> bool {
        self.is_set(Self::RESERVED)
    }
}

impl TryFrom<u8> for Flags {
    type Error = DecodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // [MQTT-3.1.2-3] The Server MUST validate that the reserved flag in the CONNECT Control Packet is set to zero.
        if value & Self::RESERVED != 0 {
            return Err(DecodingError::InvalidValue(
                "reserved bit of the connect flags is set".into(),
            ));
        }

        let will_qos = (value & Self::WILL_QOS) >> 3;
        if will_qos == 3 {
            return Err(DecodingError::InvalidValue("will QoS is 3".into()));
        }

        let flags = Flags(value);

        // [MQTT-3.1.2-13] If the Will Flag is set to 0, then the Will QoS MUST be set to 0.
        // [MQTT-3.1.2-15] If the Will Flag is set to 0, then the Will Retain Flag MUST be set to 0.
        if !flags.will_flag() && (will_qos != 0 || flags.will_retain()) {
            return Err(DecodingError::InvalidValue(
                "will QoS and will retain must be 0 if the will flag is not set".into(),
            ));
        }

        // [MQTT-3.1.2-22] If the User Name Flag is set to 0, the Password Flag MUST be set to 0.
        if flags.password() && !flags.username() {
            return Err(DecodingError::InvalidValue(
                "password flag is set, but username flag is not".into(),
            ));
        }

        Ok(flags)
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flags")
            .field("username", &self.username())
            .field("password", &self.password())
            .field("will_retain", &self.will_retain())
            .field("will_qos", &self.will_qos())
            .field("will_flag", &self.will_flag())
            .field("clean_session", &self.clean_session())
            .finish()
    }
}

/// A message the server publishes on behalf of the client,
/// when the client disconnects ungracefully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Will {
    pub topic: String,
    pub message: Bytes,

    pub retain: bool,
    pub qos: QoS,
}

impl Will {
    /// The message as text, `None` if it isn't valid UTF-8.
    pub fn message_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.message).ok()
    }
}

// Type states of the `Builder`.

/// No username configured.
#[derive(Copy, Clone, Debug)]
pub struct WithoutAuth;

/// Username configured, a password may follow.
#[derive(Copy, Clone, Debug)]
pub struct WithAuth;

#[derive(Copy, Clone, Debug)]
pub struct WithoutWill;

/// Will configured, its QoS and retain flag may follow.
#[derive(Copy, Clone, Debug)]
pub struct WithWill;

/// Configures a [`Connect`].
///
/// The type parameters make invalid flag combinations unrepresentable:
/// `password()` exists only after `username()`, `will_qos()` and
/// `retain_will()` only after `will()`.
///
/// ```
/// use kwikstaart::{Connect, QoS};
///
/// let packet = Connect::builder()
///     .client_id("thermostat-3")
///     .username("gateway")
///     .password(vec![0x00, 0xff])
///     .will("thermostats/3/online", "false")
///     .will_qos(QoS::AtLeastOnceDelivery)
///     .build();
///
/// assert_eq!(packet.password(), Some(&[0x00, 0xff][..]));
/// assert_eq!(packet.flags().bits(), 0b1100_1100);
/// ```
///
/// ```compile_fail
/// use kwikstaart::Connect;
///
/// // A password requires a username.
/// Connect::builder().password("secret");
/// ```
#[derive(Clone)]
pub struct Builder<A = WithoutAuth, W = WithoutWill> {
    client_id: String,
    keep_alive: u16,
    clean_session: bool,

    will: Option<Will>,
    username: Option<String>,
    password: Option<Bytes>,

    _auth: PhantomData<A>,
    _will: PhantomData<W>,
}

impl Builder<WithoutAuth, WithoutWill> {
    pub fn new() -> Self {
        Builder {
            client_id: String::new(),
            keep_alive: 0,
            clean_session: false,

            will: None,
            username: None,
            password: None,
            _auth: PhantomData,
            _will: PhantomData,
        }
    }
}

impl Default for Builder<WithoutAuth, WithoutWill> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, W> Builder<A, W> {
    pub fn client_id(mut self, client_id: impl ToString) -> Self {
        self.client_id = client_id.to_string();
        self
    }

    /// In seconds. Defaults to 0, which disables keep alive.
    pub fn keep_alive(mut self, seconds: u16) -> Self {
        self.keep_alive = seconds;
        self
    }

    pub fn username(self, username: impl ToString) -> Builder<WithAuth, W> {
        Builder {
            client_id: self.client_id,
            keep_alive: self.keep_alive,
            clean_session: self.clean_session,
            will: self.will,
            username: Some(username.to_string()),
            password: self.password,
            _auth: PhantomData,
            _will: self._will,
        }
    }

    /// The will is published with QoS 0 and without retain, unless
    /// configured otherwise.
    pub fn will(
        self,
        topic: impl Into<String>,
        message: impl Into<Bytes>,
    ) -> Builder<A, WithWill> {
        Builder {
            client_id: self.client_id,
            keep_alive: self.keep_alive,
            clean_session: self.clean_session,
            will: Some(Will {
                topic: topic.into(),
                message: message.into(),
                retain: false,
                qos: QoS::AtMostOnceDelivery,
            }),
            username: self.username,
            password: self.password,
            _auth: self._auth,
            _will: PhantomData,
        }
    }

    /// Discard any session state the server holds for this client.
    ///
    /// A packet without client id always has a clean session:
    /// ```
    /// use kwikstaart::Connect;
    ///
    /// assert!(Connect::builder().build().flags().clean_session());
    /// assert!(!Connect::builder().client_id("hall-sensor").build().flags().clean_session());
    /// ```
    pub fn clean_session(mut self) -> Self {
        self.clean_session = true;
        self
    }

    pub fn build(self) -> Connect {
        // [MQTT-3.1.3-7] If the Client supplies a zero-byte ClientId, the Client MUST also set CleanSession to 1.
        let clean_session = self.clean_session || self.client_id.is_empty();

        Connect {
            protocol_level: ProtocolLevel::_3_1_1 as u8,
            clean_session,
            keep_alive: self.keep_alive,
            client_id: self.client_id,
            will: self.will,
            username: self.username,
            password: self.password,
        }
    }

    pub fn build_packet(self) -> Packet {
        self.build().into()
    }
}

impl<W> Builder<WithAuth, W> {
    /// The password is binary data, not necessarily UTF-8.
    pub fn password(mut self, password: impl Into<Bytes>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl<A> Builder<A, WithWill> {
    pub fn will_qos(mut self, qos: QoS) -> Self {
        if let Some(will) = self.will.as_mut() {
            will.qos = qos;
        }
        self
    }

    pub fn retain_will(mut self) -> Self {
        if let Some(will) = self.will.as_mut() {
            will.retain = true;
        }
        self
    }
}

impl<A, W> std::fmt::Debug for Builder<A, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("client_id", &self.client_id)
            .field("keep_alive", &self.keep_alive)
            .field("clean_session", &self.clean_session)
            .field("will", &self.will)
            .field("username", &self.username)
            .finish()
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for Connect {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let mut builder = Connect::builder()
            .client_id(String::arbitrary(u)?.replace('\0', ""))
            .keep_alive(u16::arbitrary(u)?);
        if bool::arbitrary(u)? {
            builder = builder.clean_session();
        };

        if bool::arbitrary(u)? {
            return Ok(builder.build());
        }

        let mut builder = builder.username(String::arbitrary(u)?.replace('\0', ""));
        if bool::arbitrary(u)? {
            builder = builder.password(Vec::<u8>::arbitrary(u)?);
        }

        if bool::arbitrary(u)? {
            return Ok(builder.build());
        }

        let mut builder = builder.will(
            String::arbitrary(u)?.replace('\0', ""),
            Vec::<u8>::arbitrary(u)?,
        );
        if bool::arbitrary(u)? {
            builder = builder.retain_will();
        }

        Ok(builder.will_qos(QoS::arbitrary(u)?).build())
    }
}
