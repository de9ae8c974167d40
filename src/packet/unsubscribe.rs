//! Removing subscriptions.
use crate::{
    decode::{self, DecodingError},
    encode::{self, EncodingError},
    packet::{header::FixedHeader, try_from_frame, verify_topic},
    packet_identifier, Frame, Packet, PacketType,
};
use bytes::{Buf, Bytes, BytesMut};

/// [UNSUBSCRIBE](https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718072)
/// removes one or more subscriptions of a client. The server answers with a [`crate::UnsubAck`].
///
/// ```
/// use bytes::Bytes;
/// use kwikstaart::Unsubscribe;
///
/// let frame = Bytes::from_static(&[0xa2, 0x0b, 0x67, 0xeb, 0x00, 0x07, b'a', b'l', b'a', b'r', b'm', b'/', b'#']);
/// let unsubscribe = Unsubscribe::try_from(frame).unwrap();
///
/// assert_eq!(unsubscribe.packet_identifier(), 26603);
/// assert_eq!(unsubscribe.topics().collect::<Vec<_>>(), ["alarm/#"]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Unsubscribe {
    packet_identifier: u16,
    topics: Vec<String>,
}

impl Unsubscribe {
    pub fn builder(topic: impl Into<String>) -> Builder {
        Builder::new(topic)
    }

    pub fn packet_identifier(&self) -> u16 {
        self.packet_identifier
    }

    /// The topic filters to unsubscribe from. Never empty on a decoded packet.
    pub fn topics(&self) -> Topics<'_> {
        Topics {
            inner: self.topics.iter(),
        }
    }
}

impl Frame for Unsubscribe {
    const PACKET_TYPE: PacketType = PacketType::Unsubscribe;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        encode::packet_identifier(buf, self.packet_identifier)
    }

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        if self.topics.is_empty() {
            return Err(EncodingError::InvalidValue(
                "UNSUBSCRIBE must contain at least one topic filter".into(),
            ));
        }

        for topic in &self.topics {
            verify_topic(topic).map_err(EncodingError::InvalidValue)?;
            encode::utf8(buf, topic)?;
        }
        Ok(())
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        let packet_identifier = decode::packet_identifier(body)?;

        let mut topics = Vec::new();
        while body.has_remaining() {
            let topic = decode::utf8(body)?;
            verify_topic(&topic).map_err(DecodingError::InvalidValue)?;
            topics.push(topic);
        }

        // [MQTT-3.10.3-2] The Payload of an UNSUBSCRIBE packet MUST contain at least one Topic Filter.
        if topics.is_empty() {
            return Err(DecodingError::InvalidValue(
                "UNSUBSCRIBE must contain at least one topic filter".into(),
            ));
        }

        Ok(Self {
            packet_identifier,
            topics,
        })
    }
}

impl TryFrom<Bytes> for Unsubscribe {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<Unsubscribe> for Packet {
    fn from(value: Unsubscribe) -> Packet {
        Packet::Unsubscribe(value)
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UNSUBSCRIBE")
            .field("packet_identifier", &self.packet_identifier)
            .field("topics", &self.topics)
            .finish()
    }
}

/// An iterator over the topic filters of an [`Unsubscribe`].
pub struct Topics<'a> {
    inner: std::slice::Iter<'a, String>,
}

impl<'a> Iterator for Topics<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(String::as_str)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Topics<'_> {}

/// Configures an [`Unsubscribe`]. Unless set, the packet identifier is generated
/// by [`packet_identifier()`].
#[derive(Clone, Debug)]
pub struct Builder {
    packet_identifier: u16,
    topics: Vec<String>,
}

impl Builder {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            packet_identifier: packet_identifier(),
            topics: vec![topic.into()],
        }
    }

    pub fn add_topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.push(topic.into());
        self
    }

    pub fn packet_identifier(mut self, packet_identifier: u16) -> Self {
        self.packet_identifier = packet_identifier;
        self
    }

    pub fn build(self) -> Unsubscribe {
        Unsubscribe {
            packet_identifier: self.packet_identifier,
            topics: self.topics,
        }
    }

    pub fn build_packet(self) -> Packet {
        self.build().into()
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for Unsubscribe {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let mut builder = Unsubscribe::builder(String::arbitrary(u)?.replace('\0', ""))
            .packet_identifier(u16::arbitrary(u)?.max(1));
        for topic in u.arbitrary_iter::<String>()? {
            builder = builder.add_topic(topic?.replace('\0', ""));
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encode_and_decode_unsubscribe() {
        let unsubscribe = Unsubscribe::builder("alarm/#")
            .add_topic("lights/+/state")
            .packet_identifier(0x0102)
            .build();

        let bytes = unsubscribe.to_bytes().unwrap();
        assert_eq!(&bytes[..6], &[0xa2, 0x1b, 0x01, 0x02, 0x00, 0x07]);
        assert_eq!(&bytes[13..15], &[0x00, 0x0e]);

        let decoded = Unsubscribe::try_from(bytes).unwrap();
        assert_eq!(decoded.topics().len(), 2);
        assert_eq!(decoded, unsubscribe);
    }

    #[test]
    fn test_decode_invalid_unsubscribe() {
        assert!(matches!(
            Unsubscribe::try_from(Bytes::from_static(&[0xa2, 0x02, 0x00, 0x01])),
            Err(DecodingError::InvalidValue(_))
        ));

        // Topic filter shorter than its length prefix.
        assert!(Unsubscribe::try_from(Bytes::from_static(&[0xa2, 0x05, 0x00, 0x01, 0x00, 0x02, b'a']))
            .unwrap_err()
            .is_truncated());

        assert!(matches!(
            Unsubscribe::try_from(Bytes::from_static(&[0xa2, 0x05, 0x00, 0x00, 0x00, 0x01, b'a'])),
            Err(DecodingError::InvalidValue(_))
        ));

        // Zero-length topic filter.
        assert!(matches!(
            Unsubscribe::try_from(Bytes::from_static(&[0xa2, 0x04, 0x00, 0x01, 0x00, 0x00])),
            Err(DecodingError::InvalidValue(_))
        ));
        assert!(matches!(
            Unsubscribe::builder("").packet_identifier(1).build().to_bytes(),
            Err(EncodingError::InvalidValue(_))
        ));

        assert!(matches!(
            Unsubscribe::try_from(Bytes::from_static(&[0xa0, 0x05, 0x00, 0x01, 0x00, 0x01, b'a'])),
            Err(DecodingError::InvalidFlags { .. })
        ));
    }
}
