#![no_main]
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use kwikstaart::{Decoder, Packet};

// Arbitrary input must never cause a panic. Whatever decodes, must encode
// and decode again to the same packet.
fuzz_target!(|data: &[u8]| {
    let input = Bytes::copy_from_slice(data);
    if let Ok(packet) = Packet::try_from(input.clone()) {
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(Packet::try_from(bytes).unwrap(), packet);
    }

    let mut decoder = Decoder::with_maximum_packet_size(u16::MAX as usize);
    let mut offset = 0;
    while offset < data.len() {
        let size = decoder.bytes_required().min(data.len() - offset);
        let chunk = input.slice(offset..offset + size);
        offset += size;

        if decoder.try_decode(chunk).is_err() {
            break;
        }
    }
    _ = decoder.end_of_stream();
});
