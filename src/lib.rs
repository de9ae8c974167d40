#![doc = include_str!("../README.md")]
#[doc(inline)]
pub use crate::decode::DecodingError;
#[doc(inline)]
pub use crate::decoder::Decoder;
#[doc(inline)]
pub use crate::encode::EncodingError;
#[doc(inline)]
pub use crate::packet::{
    connack::ConnAck, connect::Connect, disconnect::Disconnect, header::FixedHeader,
    ping_req::PingReq, ping_resp::PingResp, puback::PubAck, pubcomp::PubComp, publish::Publish,
    pubrec::PubRec, pubrel::PubRel, suback::SubAck, subscribe::Subscribe, unsuback::UnsubAck,
    unsubscribe::Unsubscribe, Frame, Packet, PacketType, ProtocolLevel, QoS,
};
use bytes::Bytes;
use std::{error::Error, fmt::Display, time::SystemTime};

pub mod decode;
mod decoder;
pub mod encode;
pub mod packet;

pub mod blocking;

#[cfg(feature = "async")]
pub mod aio;

/// A packet identifier derived from the system clock. Never 0.
///
/// Consecutive calls are likely, not guaranteed, to differ.
pub fn packet_identifier() -> u16 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or_default();

    // [MQTT-2.3.1-1] SUBSCRIBE, UNSUBSCRIBE, and PUBLISH (in cases where QoS > 0) Control Packets MUST contain a non-zero 16-bit Packet Identifier.
    match nanos as u16 {
        0 => 1,
        identifier => identifier,
    }
}

/// A [`Packet::Connect`] with only a client id and keep alive interval.
/// An empty client id implies a clean session.
pub fn connect(client_id: String, keep_alive_interval: u16) -> Packet {
    Connect::builder()
        .client_id(client_id)
        .keep_alive(keep_alive_interval)
        .build_packet()
}

/// Subscribe to a single topic filter with QoS 0.
///
/// ```
/// use kwikstaart::{subscribe, QoS};
///
/// let packet = subscribe("garden/#");
/// assert_eq!(packet.topics().next(), Some(("garden/#", QoS::AtMostOnceDelivery)));
/// ```
pub fn subscribe(topic: &str) -> Subscribe {
    Subscribe::builder(topic, QoS::AtMostOnceDelivery).build()
}

/// Unsubscribe from a single topic filter.
pub fn unsubscribe(topic: &str) -> Unsubscribe {
    Unsubscribe::builder(topic).build()
}

/// A [`Publish`] with QoS 0, so without packet identifier. The retain
/// and DUP flags are cleared.
pub fn publish(topic: &str, payload: Bytes) -> Publish {
    Publish::builder(topic, payload).build()
}

/// Reading or writing a packet from or to a stream failed.
#[derive(Debug)]
pub enum StreamError {
    /// The peer sent a malformed packet.
    Decoding(DecodingError),

    /// The packet can't be encoded.
    Encoding(EncodingError),

    Io(std::io::Error),
}

impl StreamError {
    /// Whether the error is caused by a malformed packet.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Decoding(_))
    }
}

impl Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decoding(error) => write!(f, "{error}"),
            Self::Encoding(error) => write!(f, "failed to encode packet: {error}"),
            Self::Io(error) => write!(f, "IO error: {error}"),
        }
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decoding(error) => Some(error),
            Self::Encoding(error) => Some(error),
            Self::Io(error) => Some(error),
        }
    }
}

impl From<DecodingError> for StreamError {
    fn from(value: DecodingError) -> Self {
        Self::Decoding(value)
    }
}

impl From<EncodingError> for StreamError {
    fn from(value: EncodingError) -> Self {
        Self::Encoding(value)
    }
}

impl From<std::io::Error> for StreamError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
