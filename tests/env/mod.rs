use kwikstaart::{
    packet::{connack::ReturnCode, suback},
    ConnAck, Connect, Disconnect, Packet, PingReq, PingResp, PubAck, PubComp, PubRec, PubRel,
    Publish, QoS, SubAck, Subscribe, UnsubAck, Unsubscribe,
};
use std::io::Read;

pub fn init_logger() {
    // Fails if another test already installed the logger.
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Trace)
        .init();
}

// A collection of valid `Packet`s, at least one of every packet type.
pub fn valid_packets() -> Vec<Packet> {
    vec![
        Connect::builder().build().into(),
        Connect::builder()
            .client_id("0123456789")
            .keep_alive(60)
            .will("sensors/status", "offline")
            .will_qos(QoS::AtLeastOnceDelivery)
            .retain_will()
            .username("user")
            .password("password")
            .build()
            .into(),
        ConnAck::builder().session_present().build().into(),
        ConnAck::builder()
            .return_code(ReturnCode::ConnectionRefusedBadUsernameOrPassword)
            .build()
            .into(),
        Publish::builder("sensors/temperature/1", "19.2").build().into(),
        Publish::builder("sensors/camera/1", vec![0xff; 300])
            .qos(QoS::ExactlyOnceDelivery)
            .packet_identifier(1568)
            .retain(true)
            .duplicate(true)
            .build()
            .into(),
        PubAck::new(1).into(),
        PubRec::new(1568).into(),
        PubRel::new(1568).into(),
        PubComp::new(u16::MAX).into(),
        Subscribe::builder("sensors/+/1", QoS::AtMostOnceDelivery)
            .add_topic("sensors/#", QoS::ExactlyOnceDelivery)
            .packet_identifier(19266)
            .build()
            .into(),
        SubAck::builder(19266, QoS::AtMostOnceDelivery)
            .add_return_code(suback::ReturnCode::Failure)
            .build()
            .into(),
        Unsubscribe::builder("sensors/+/1")
            .packet_identifier(26603)
            .build()
            .into(),
        UnsubAck::new(26603).into(),
        PingReq.into(),
        PingResp.into(),
        Disconnect.into(),
    ]
}

/// A reader that returns at most 1 byte per call to `read()`.
pub struct Trickle<R> {
    inner: R,
}

impl<R> Trickle<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }
}

impl<R: Read> Read for Trickle<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let length = buf.len().min(1);
        self.inner.read(&mut buf[..length])
    }
}
