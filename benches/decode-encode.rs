use bytes::Bytes;
use criterion::{criterion_group, criterion_main, Criterion};
use kwikstaart::{
    ConnAck, Connect, Decoder, Disconnect, Frame, Packet, PubAck, Publish, QoS, SubAck, Subscribe,
    UnsubAck, Unsubscribe,
};
use std::hint::black_box;

fn decode_encode(packet: &Packet) -> Bytes {
    let bytes = packet.to_bytes().unwrap();
    Packet::try_from(black_box(bytes))
        .unwrap()
        .to_bytes()
        .unwrap()
}

fn criterion_benchmark(c: &mut Criterion) {
    let packets: Vec<(&str, Packet)> = vec![
        (
            "Connect",
            Connect::builder()
                .client_id("sensor-1")
                .username("admin")
                .password("secret")
                .will("sensors/status/1", "offline")
                .build()
                .into(),
        ),
        ("ConnAck", ConnAck::builder().build().into()),
        (
            "Subscribe",
            Subscribe::builder("sensors/temperature/1", QoS::AtMostOnceDelivery)
                .add_topic("sensors/humidity/2", QoS::AtMostOnceDelivery)
                .build()
                .into(),
        ),
        (
            "SubAck",
            SubAck::builder(1337, QoS::AtMostOnceDelivery)
                .add_return_code(QoS::AtMostOnceDelivery)
                .build()
                .into(),
        ),
        (
            "Publish",
            Publish::builder("sensors/temperature/1", r#"{"measurement": 19.2}"#)
                .build()
                .into(),
        ),
        ("PubAck", PubAck::new(1337).into()),
        (
            "Unsubscribe",
            Unsubscribe::builder("sensors/temperature/1")
                .add_topic("sensors/humidity/1")
                .build()
                .into(),
        ),
        ("UnsubAck", UnsubAck::new(1337).into()),
        ("Disconnect", Disconnect.into()),
    ];

    for (name, packet) in &packets {
        c.bench_function(&format!("decode/encode {name}"), |b| {
            b.iter(|| decode_encode(packet))
        });
    }

    c.bench_function("incremental decode Publish", |b| {
        let payload = vec![0x42; 4096];
        let bytes = Publish::builder("sensors/camera/1", payload)
            .build()
            .to_bytes()
            .unwrap();

        b.iter(|| {
            let mut decoder = Decoder::new();
            let mut offset = 0;
            loop {
                let size = decoder.bytes_required();
                let chunk = bytes.slice(offset..offset + size);
                offset += size;
                if let Some(packet) = decoder.try_decode(black_box(chunk)).unwrap() {
                    break packet;
                }
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
