//! Providing [`Decoder`], an incremental decoder that doesn't perform any IO.
use crate::{decode::DecodingError, packet::header::FixedHeader, Packet};
use bytes::{Bytes, BytesMut};
use log::{debug, trace};

#[derive(Default, Debug)]
enum State {
    // The state machine is waiting for the start of a new packet.
    #[default]
    StartOfHeader,

    // The state machine processed the first part of a header and is waiting
    // for the remainder of the field "remaining length".
    EndOfHeader { partial_header: BytesMut },

    // The state machine processed the header and it knows the length
    // of the entire packet. Now it waits for the remaining bytes
    // to complete the packet.
    RestOfPacket { header: FixedHeader, body: BytesMut },
}

/// `Decoder` assembles [`Packet`]s from a stream of bytes.
///
/// The decoder doesn't read from a socket. The caller requests a buffer with
/// [`Decoder::get_read_buffer()`], fills it and hands the filled part to
/// [`Decoder::try_decode()`]. The buffer is never larger than the number of
/// bytes needed to complete the current packet, so a read never consumes
/// bytes of the next packet. Nor is it larger than
/// [`Decoder::READ_BUFFER_SIZE`], a large packet is read in several parts.
///
/// ```
/// use bytes::Bytes;
/// use kwikstaart::{Decoder, Packet, PingReq};
///
/// let input = [0xc0, 0x00, 0xd0, 0x00];
/// let mut offset = 0;
/// let mut decoder = Decoder::new();
///
/// let packet = loop {
///     let mut buffer = decoder.get_read_buffer();
///     let size = buffer.len();
///     buffer.copy_from_slice(&input[offset..offset + size]);
///     offset += size;
///
///     if let Some(packet) = decoder.try_decode(buffer.freeze()).unwrap() {
///         break packet;
///     }
/// };
///
/// assert_eq!(packet, Packet::PingReq(PingReq));
/// // The PINGRESP that follows has not been touched.
/// assert_eq!(offset, 2);
/// ```
#[derive(Debug, Default)]
pub struct Decoder {
    state: State,
    maximum_packet_size: Option<usize>,
}

impl Decoder {
    /// Upper bound on the length of a buffer returned by
    /// [`Decoder::get_read_buffer()`].
    pub const READ_BUFFER_SIZE: usize = 8 * 1024;

    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `Decoder` that rejects packets with a remaining length
    /// above `maximum` with [`DecodingError::PacketTooLarge`].
    ///
    /// The check happens as soon as the fixed header is complete,
    /// before the body of the packet is read.
    pub fn with_maximum_packet_size(maximum: usize) -> Self {
        Self {
            state: State::default(),
            maximum_packet_size: Some(maximum),
        }
    }

    /// The number of bytes the decoder wants to receive next.
    ///
    /// It's never 0.
    pub fn bytes_required(&self) -> usize {
        match &self.state {
            // A fixed header is at least 2 bytes.
            State::StartOfHeader => 2,
            // The field "remaining length" is read 1 byte at a time. Only
            // the last byte lacks the continuation bit.
            State::EndOfHeader { .. } => 1,
            State::RestOfPacket { header, body } => header.remaining_length() - body.len(),
        }
    }

    /// Retrieve an input buffer. The caller must fill the buffer and pass it,
    /// or the part that is filled, to [`Decoder::try_decode()`].
    pub fn get_read_buffer(&self) -> BytesMut {
        match self.state {
            State::StartOfHeader => trace!("Waiting for start of header."),
            State::EndOfHeader { .. } => trace!("Waiting for end of the header."),
            State::RestOfPacket { .. } => trace!("Waiting for remainder of the packet."),
        }

        // The remaining length comes from the peer, only bytes that
        // actually arrive are accumulated.
        BytesMut::zeroed(self.bytes_required().min(Self::READ_BUFFER_SIZE))
    }

    /// Feed bytes to the decoder.
    ///
    /// Returns `Ok(Some(packet))` when `buf` completes a packet and `Ok(None)`
    /// if more bytes are needed. After an error, the decoder is reset and the
    /// bytes of the malformed packet are dropped.
    ///
    /// `buf` may be longer than [`Decoder::bytes_required()`], for example a
    /// complete frame, but it must not extend past the end of the current
    /// packet. The decoder doesn't keep bytes for later: any byte past the
    /// end of the packet becomes part of its body and the packet fails with
    /// [`DecodingError::TooManyBytes`].
    pub fn try_decode(&mut self, buf: Bytes) -> Result<Option<Packet>, DecodingError> {
        let result = match std::mem::take(&mut self.state) {
            State::StartOfHeader => self.decode_header(BytesMut::new(), buf),
            State::EndOfHeader { partial_header } => self.decode_header(partial_header, buf),
            State::RestOfPacket { header, body } => self.decode_body(header, body, buf),
        };

        if result.is_err() {
            self.state = State::default();
        }
        result
    }

    /// Signal the stream ended.
    ///
    /// That is fine between 2 packets. If the decoder holds a partial packet,
    /// that packet is truncated and [`DecodingError::NotEnoughBytes`] is returned.
    pub fn end_of_stream(&mut self) -> Result<(), DecodingError> {
        match std::mem::take(&mut self.state) {
            State::StartOfHeader => Ok(()),
            State::EndOfHeader { partial_header } => Err(DecodingError::NotEnoughBytes {
                minimum: partial_header.len() + 1,
                actual: partial_header.len(),
            }),
            State::RestOfPacket { header, body } => Err(DecodingError::NotEnoughBytes {
                minimum: header.remaining_length(),
                actual: body.len(),
            }),
        }
    }

    fn decode_header(
        &mut self,
        mut partial_header: BytesMut,
        buf: Bytes,
    ) -> Result<Option<Packet>, DecodingError> {
        partial_header.extend_from_slice(&buf);
        if partial_header.is_empty() {
            return Ok(None);
        }

        // The packet type and flags are verified on the first byte,
        // an unknown packet type fails without waiting for more bytes.
        let (header, length) = match FixedHeader::decode(&partial_header) {
            Ok(result) => result,
            Err(DecodingError::NotEnoughBytes { .. }) => {
                self.state = State::EndOfHeader { partial_header };
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        if let Some(maximum) = self.maximum_packet_size {
            if header.remaining_length() > maximum {
                return Err(DecodingError::PacketTooLarge {
                    maximum,
                    actual: header.remaining_length(),
                });
            }
        }

        let rest = partial_header.split_off(length).freeze();
        self.decode_body(header, BytesMut::new(), rest)
    }

    fn decode_body(
        &mut self,
        header: FixedHeader,
        mut body: BytesMut,
        buf: Bytes,
    ) -> Result<Option<Packet>, DecodingError> {
        body.extend_from_slice(&buf);
        if body.len() < header.remaining_length() {
            self.state = State::RestOfPacket { header, body };
            return Ok(None);
        }

        let packet = Packet::decode(header, body.freeze())?;
        debug!("--> {packet:?}");
        Ok(Some(packet))
    }
}
