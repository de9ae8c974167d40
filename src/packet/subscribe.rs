//! Subscribing to topic filters.
use crate::{
    decode::{self, DecodingError},
    encode::{self, EncodingError},
    packet::{header::FixedHeader, try_from_frame, verify_topic},
    packet_identifier, Frame, Packet, PacketType, QoS,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// [SUBSCRIBE](https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718063)
/// registers a client for one or more topic filters, each with the maximum QoS
/// it wants to receive messages at.
///
/// ```
/// use kwikstaart::{Frame, QoS, Subscribe};
///
/// let subscribe = Subscribe::builder("lights/+/state", QoS::AtLeastOnceDelivery)
///     .add_topic("alarms/#", QoS::ExactlyOnceDelivery)
///     .packet_identifier(3)
///     .build();
///
/// let frame = subscribe.to_bytes().unwrap();
/// assert_eq!(&frame[..4], &[0x82, 0x1e, 0x00, 0x03]);
///
/// let subscribe = Subscribe::try_from(frame).unwrap();
/// assert_eq!(
///     subscribe.topics().collect::<Vec<_>>(),
///     [("lights/+/state", QoS::AtLeastOnceDelivery), ("alarms/#", QoS::ExactlyOnceDelivery)]
/// );
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Subscribe {
    packet_identifier: u16,
    topics: Vec<(String, QoS)>,
}

impl Subscribe {
    pub fn builder(topic: impl Into<String>, qos: QoS) -> Builder {
        Builder::new(topic, qos)
    }

    pub fn packet_identifier(&self) -> u16 {
        self.packet_identifier
    }

    /// The topic filters in the order they were sent, with the requested QoS.
    pub fn topics(&self) -> Topics<'_> {
        Topics {
            inner: self.topics.iter(),
        }
    }
}

impl Frame for Subscribe {
    const PACKET_TYPE: PacketType = PacketType::Subscribe;

    fn encode_variable_header(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        encode::packet_identifier(buf, self.packet_identifier)
    }

    fn encode_payload(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        // [MQTT-3.8.3-3] The payload of a SUBSCRIBE packet MUST contain at least one Topic Filter / QoS pair.
        if self.topics.is_empty() {
            return Err(EncodingError::InvalidValue(
                "SUBSCRIBE must contain at least one topic filter".into(),
            ));
        }

        for (topic, qos) in &self.topics {
            verify_topic(topic).map_err(EncodingError::InvalidValue)?;
            encode::utf8(buf, topic)?;
            buf.put_u8(*qos as u8);
        }
        Ok(())
    }

    fn decode(_header: FixedHeader, body: &mut Bytes) -> Result<Self, DecodingError> {
        let packet_identifier = decode::packet_identifier(body)?;

        let mut topics = vec![];
        while body.has_remaining() {
            let topic = decode::utf8(body)?;
            verify_topic(&topic).map_err(DecodingError::InvalidValue)?;
            let requested_qos = decode::u8(body)?;

            // [MQTT-3-8.3-4] The Server MUST treat a SUBSCRIBE packet as malformed if any of the Reserved bits in the payload are non-zero.
            if requested_qos >> 2 != 0 {
                return Err(DecodingError::InvalidValue(format!(
                    "requested QoS {requested_qos:#010b} of {topic:?} has reserved bits set"
                )));
            }

            topics.push((topic, QoS::try_from(requested_qos)?));
        }

        if topics.is_empty() {
            return Err(DecodingError::InvalidValue(
                "SUBSCRIBE must contain at least one topic filter".into(),
            ));
        }

        Ok(Self {
            packet_identifier,
            topics,
        })
    }
}

impl TryFrom<Bytes> for Subscribe {
    type Error = DecodingError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        try_from_frame(value)
    }
}

impl From<Subscribe> for Packet {
    fn from(value: Subscribe) -> Packet {
        Packet::Subscribe(value)
    }
}

impl std::fmt::Debug for Subscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SUBSCRIBE")
            .field("packet_identifier", &self.packet_identifier)
            .field("topics", &self.topics)
            .finish()
    }
}

/// An iterator over the topic filters of a [`Subscribe`].
pub struct Topics<'a> {
    inner: std::slice::Iter<'a, (String, QoS)>,
}

impl<'a> Iterator for Topics<'a> {
    type Item = (&'a str, QoS);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(topic, qos)| (topic.as_str(), *qos))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Topics<'_> {}

/// Configures a [`Subscribe`]. Unless set, the packet identifier is generated
/// by [`packet_identifier()`].
#[derive(Clone)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Builder {
    packet_identifier: u16,
    #[cfg_attr(feature = "arbitrary", arbitrary(with = arbitrary_topics))]
    topics: Vec<(String, QoS)>,
}

#[cfg(feature = "arbitrary")]
fn arbitrary_topics(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Vec<(String, QoS)>> {
    use std::ops::ControlFlow;
    let mut topics: Vec<(String, QoS)> = vec![];
    u.arbitrary_loop(Some(1), Some(255), |u| {
        let (topic, qos): (String, QoS) = u.arbitrary()?;
        topics.push((topic.replace('\0', ""), qos));

        Ok(ControlFlow::Continue(()))
    })?;

    Ok(topics)
}

impl Builder {
    pub fn new(topic: impl Into<String>, qos: QoS) -> Self {
        Self {
            packet_identifier: packet_identifier(),
            topics: vec![(topic.into(), qos)],
        }
    }

    pub fn add_topic(mut self, topic: impl Into<String>, qos: QoS) -> Self {
        self.topics.push((topic.into(), qos));
        self
    }

    pub fn packet_identifier(mut self, packet_identifier: u16) -> Self {
        self.packet_identifier = packet_identifier;
        self
    }

    pub fn build(self) -> Subscribe {
        Subscribe {
            packet_identifier: self.packet_identifier,
            topics: self.topics,
        }
    }

    pub fn build_packet(self) -> Packet {
        self.build().into()
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("packet_identifier", &self.packet_identifier)
            .field("topics", &self.topics)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encode_and_decode_subscribe() {
        let subscribe = Subscribe::builder("a/b", QoS::AtMostOnceDelivery)
            .add_topic("c/#", QoS::ExactlyOnceDelivery)
            .packet_identifier(0x4b42)
            .build();

        let bytes = subscribe.to_bytes().unwrap();
        assert_eq!(
            &bytes[..],
            &[0x82, 0x0e, 0x4b, 0x42, 0x00, 0x03, b'a', b'/', b'b', 0x00, 0x00, 0x03, b'c', b'/', b'#', 0x02]
        );
        assert_eq!(Subscribe::try_from(bytes), Ok(subscribe));
    }

    #[test]
    fn test_encode_without_packet_identifier() {
        let subscribe = Subscribe::builder("a/b", QoS::AtMostOnceDelivery)
            .packet_identifier(0)
            .build();
        assert_eq!(
            subscribe.to_bytes(),
            Err(EncodingError::InvalidPacketIdentifier)
        );
    }

    #[test]
    fn test_decode_invalid_subscribe() {
        // No topic filter at all.
        assert!(matches!(
            Subscribe::try_from(Bytes::from_static(&[0x82, 0x02, 0x00, 0x01])),
            Err(DecodingError::InvalidValue(_))
        ));

        // Upper 6 bits of the requested QoS byte are reserved.
        assert!(Subscribe::try_from(Bytes::from_static(&[0x82, 0x06, 0x00, 0x01, 0x00, 0x01, b'a', 0x04])).is_err());

        assert!(Subscribe::try_from(Bytes::from_static(&[0x82, 0x06, 0x00, 0x01, 0x00, 0x01, b'a', 0x03])).is_err());

        // Topic filter without requested QoS.
        assert!(Subscribe::try_from(Bytes::from_static(&[0x82, 0x05, 0x00, 0x01, 0x00, 0x01, b'a']))
            .unwrap_err()
            .is_truncated());

        assert!(matches!(
            Subscribe::try_from(Bytes::from_static(&[0x80, 0x06, 0x00, 0x01, 0x00, 0x01, b'a', 0x00])),
            Err(DecodingError::InvalidFlags { .. })
        ));
    }

    #[test]
    fn test_empty_topic_filter() {
        let subscribe = Subscribe::builder("a/b", QoS::AtMostOnceDelivery)
            .add_topic("", QoS::AtLeastOnceDelivery)
            .packet_identifier(1)
            .build();
        assert!(matches!(
            subscribe.to_bytes(),
            Err(EncodingError::InvalidValue(_))
        ));

        assert!(matches!(
            Subscribe::try_from(Bytes::from_static(&[0x82, 0x05, 0x00, 0x01, 0x00, 0x00, 0x01])),
            Err(DecodingError::InvalidValue(_))
        ));
    }

    // Over half a million filters, so the remaining length takes 4 bytes.
    #[test]
    fn test_subscribe_with_many_topics() {
        let mut builder = Subscribe::builder("a", QoS::AtMostOnceDelivery).packet_identifier(1);
        for _ in 0..524_287 {
            builder = builder.add_topic("b", QoS::AtLeastOnceDelivery);
        }

        let bytes = builder.build().to_bytes().unwrap();
        assert_eq!(bytes[4], 0x01);
        let packet = Subscribe::try_from(bytes).unwrap();
        assert_eq!(packet.topics().len(), 524_288);
    }
}
