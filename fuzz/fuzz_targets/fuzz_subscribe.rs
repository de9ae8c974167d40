#![no_main]
use libfuzzer_sys::fuzz_target;
use kwikstaart::{packet::subscribe::Builder, Frame, Subscribe};

fuzz_target!(|data: Builder| {
    let subscribe_1 = data.build();

    // A packet identifier of 0 or a topic longer than 65,535 bytes can't be encoded.
    let Ok(bytes) = subscribe_1.to_bytes() else {
        return;
    };
    let subscribe_2 = Subscribe::try_from(bytes.clone()).unwrap();

    // Verify that both packets are equal.
    assert_eq!(subscribe_1, subscribe_2);
    assert_eq!(bytes, subscribe_2.to_bytes().unwrap());

    subscribe_1.packet_identifier();
    let topics = subscribe_1.topics();
    for _ in topics {}
});
