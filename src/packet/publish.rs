//! Application messages.
use crate::{
    decode::{self, DecodingError},
    encode::{self, EncodingError},
    packet::{header::FixedHeader, try_from_frame, verify_topic},
    packet_identifier, Frame, Packet, PacketType, QoS,
};
use bytes::{BufMut, Bytes, BytesMut};

/// [PUBLISH](https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718037)
/// carries an application message on a topic, in both directions.
///
/// ```
/// use kwikstaart::{Frame, Publish, QoS};
///
/// let packet = Publish::builder("sensors/temperature", "21.5")
///     .qos(QoS::AtLeastOnceDelivery)
///     .packet_identifier(7)
///     .build();
///
/// let bytes = packet.to_bytes().unwrap();
/// assert_eq!(bytes[0], 0x32);
///
/// let packet = Publish::try_from(bytes).unwrap();
/// assert_eq!(packet.topic(), "sensors/temperature");
/// assert_eq!(packet.payload(), b"21.5");
/// assert_eq!(packet.packet_identifier(), Some(7));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Publish {
    topic: String,
    payload: Bytes,
    qos: QoS,
    retain: bool,
    duplicate: bool,
    packet_identifier: Option<u16>,
}

impl Publish {
    pub fn builder(topic: impl Into<String>, payload: impl Into<Bytes>) -> Builder {
        Builder::new(topic, payload)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The application message. It's opaque to the protocol and may be empty.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    /// Whether the server keeps the message for future subscribers of the topic.
    pub fn retain(&self) -> bool {
        self.retain
    }

    /// Whether this is a redelivery of an earlier attempt.
    pub fn duplicate(&self) -> bool {
        self.duplicate
    }

    /// `None` for QoS 0, otherwise the non-zero packet identifier.
    pub fn packet_identifier(&self) -> Option<u16> {
        self.packet_identifier
    }
}

fn verify_topic_name(topic: &str) -> Result<(), String> {
    verify_topic(topic)?;
    // [MQTT-3.3.2-2] The Topic Name in the PUBLISH Packet MUST NOT contain wildcard characters.
    if topic.contains(['+', '#']) {
        return Err(format!("topic name {topic:?} contains a wildcard"));
    }
    Ok(())
}

impl Frame for Publish {
    const PACKET_TYPE: PacketType = PacketType::Publish;

    // bit 3: DUP, bits 2-1: QoS, bit 0: RETAIN
    fn flags(&self) -> u8 {
        (u8::from(self.duplicate) << 3) | ((self.qos as u8) << 1) | u8::from(self.retain)
    }

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        verify_topic_name(&self.topic).map_err(EncodingError::InvalidValue)?;
        encode::utf8(buf, &self.topic)?;

        if let Some(packet_identifier) = self.packet_identifier {
            encode::packet_identifier(buf, packet_identifier)?;
        }
        Ok(())
    }

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        buf.put_slice(&self.payload);
        Ok(())
    }

    fn decode(header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        let flags = header.flags();
        let qos = QoS::try_from((flags >> 1) & 0b11)?;

        let topic = decode::utf8(body)?;
        verify_topic_name(&topic).map_err(DecodingError::InvalidValue)?;

        let packet_identifier = if qos == QoS::AtMostOnceDelivery {
            None
        } else {
            Some(decode::packet_identifier(body)?)
        };

        // The payload is everything that remains. It may be empty.
        let payload = body.split_to(body.len());

        Ok(Self {
            topic,
            payload,
            qos,
            retain: flags & 0b0001 != 0,
            duplicate: flags & 0b1000 != 0,
            packet_identifier,
        })
    }
}

impl TryFrom<Bytes> for Publish {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<Publish> for Packet {
    fn from(value: Publish) -> Packet {
        Packet::Publish(value)
    }
}

impl std::fmt::Debug for Publish {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Payloads can be large, only their length is printed.
        f.debug_struct("PUBLISH")
            .field("topic", &self.topic)
            .field("qos", &self.qos)
            .field("packet_identifier", &self.packet_identifier)
            .field("retain", &self.retain)
            .field("duplicate", &self.duplicate)
            .field("payload_length", &self.payload.len())
            .finish()
    }
}

/// Configures a [`Publish`]. Defaults to QoS 0 without the retain or DUP flag.
#[derive(Clone, Debug)]
pub struct Builder {
    topic: String,
    payload: Bytes,
    qos: QoS,
    retain: bool,
    duplicate: bool,
    packet_identifier: Option<u16>,
}

impl Builder {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Builder {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtMostOnceDelivery,
            retain: false,
            duplicate: false,
            packet_identifier: None,
        }
    }

    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    pub fn duplicate(mut self, duplicate: bool) -> Self {
        self.duplicate = duplicate;
        self
    }

    /// Ignored for [`QoS::AtMostOnceDelivery`]. If QoS is higher and no
    /// identifier is set, [`packet_identifier()`] generates one.
    pub fn packet_identifier(mut self, packet_identifier: u16) -> Self {
        self.packet_identifier = Some(packet_identifier);
        self
    }

    pub fn build(self) -> Publish {
        let packet_identifier = match self.qos {
            QoS::AtMostOnceDelivery => None,
            _ => Some(self.packet_identifier.unwrap_or_else(packet_identifier)),
        };

        Publish {
            topic: self.topic,
            payload: self.payload,
            qos: self.qos,
            retain: self.retain,
            duplicate: self.duplicate,
            packet_identifier,
        }
    }

    pub fn build_packet(self) -> Packet {
        self.build().into()
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for Publish {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let topic = String::arbitrary(u)?.replace(['\0', '+', '#'], "");
        let builder = Publish::builder(topic, Vec::<u8>::arbitrary(u)?)
            .qos(QoS::arbitrary(u)?)
            .retain(bool::arbitrary(u)?)
            .duplicate(bool::arbitrary(u)?)
            .packet_identifier(u16::arbitrary(u)?.max(1));
        Ok(builder.build())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_qos_0_has_no_packet_identifier() {
        let packet = Publish::builder("lights/kitchen", "on")
            .retain(true)
            .packet_identifier(4021)
            .build();

        assert_eq!(packet.packet_identifier(), None);
        assert_eq!(
            &packet.to_bytes().unwrap()[..],
            b"\x31\x12\x00\x0elights/kitchenon"
        );
    }

    #[test]
    fn test_generated_packet_identifier() {
        let packet = Publish::builder("lights/kitchen", "off")
            .qos(QoS::ExactlyOnceDelivery)
            .build();
        assert!(matches!(packet.packet_identifier(), Some(identifier) if identifier != 0));
    }

    #[test]
    fn test_encode_and_decode_flags() {
        let packet = Publish::builder("lights/hall", vec![0x01, 0x02])
            .qos(QoS::AtLeastOnceDelivery)
            .packet_identifier(0x0102)
            .retain(true)
            .duplicate(true)
            .build();

        let bytes = packet.to_bytes().unwrap();
        assert_eq!(&bytes[..4], &[0b0011_1011, 0x11, 0x00, 0x0b]);
        assert_eq!(&bytes[15..], &[0x01, 0x02, 0x01, 0x02]);
        assert_eq!(Publish::try_from(bytes), Ok(packet));
    }

    #[test]
    fn test_decode_empty_payload() {
        let packet = Publish::try_from(Bytes::from_static(&[0x30, 0x03, 0x00, 0x01, b'a'])).unwrap();
        assert_eq!(packet.topic(), "a");
        assert!(packet.payload().is_empty());
    }

    #[test]
    fn test_decode_invalid_publish() {
        // QoS 3 is rejected while reading the fixed header.
        assert!(matches!(
            Publish::try_from(Bytes::from_static(&[0x36, 0x03, 0x00, 0x01, b'a'])),
            Err(DecodingError::InvalidFlags { .. })
        ));

        // QoS 1, but the packet identifier is missing.
        assert!(Publish::try_from(Bytes::from_static(&[0x32, 0x03, 0x00, 0x01, b'a']))
            .unwrap_err()
            .is_truncated());

        // QoS 1 with packet identifier 0.
        assert!(matches!(
            Publish::try_from(Bytes::from_static(&[0x32, 0x05, 0x00, 0x01, b'a', 0x00, 0x00])),
            Err(DecodingError::InvalidValue(_))
        ));

        assert!(matches!(
            Publish::try_from(Bytes::from_static(&[0x30, 0x03, 0x00, 0x01, b'#'])),
            Err(DecodingError::InvalidValue(_))
        ));

        // Topic length exceeds the remaining length.
        assert!(Publish::try_from(Bytes::from_static(&[0x30, 0x03, 0x00, 0x05, b'a']))
            .unwrap_err()
            .is_truncated());
    }

    #[test]
    fn test_empty_topic_name() {
        assert!(matches!(
            Publish::builder("", "on").build().to_bytes(),
            Err(EncodingError::InvalidValue(_))
        ));
        assert!(matches!(
            Publish::try_from(Bytes::from_static(&[0x30, 0x04, 0x00, 0x00, b'o', b'n'])),
            Err(DecodingError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_encode_wildcard_topic() {
        for topic in ["lights/+", "lights/#"] {
            assert!(matches!(
                Publish::builder(topic, "").build().to_bytes(),
                Err(EncodingError::InvalidValue(_))
            ));
        }
    }
}
