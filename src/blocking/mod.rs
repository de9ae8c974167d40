//! Read and write [`Packet`]s from and to blocking streams.
//!
//! ```no_run
//! use std::net::TcpStream;
//! use kwikstaart::{blocking::{read_packet, write_packet}, connect, Packet};
//!
//! let mut stream = TcpStream::connect("localhost:1883").unwrap();
//! write_packet(&mut stream, &connect("kwikstaart".into(), 60)).unwrap();
//!
//! while let Some(packet) = read_packet(&mut stream).unwrap() {
//!     println!("Received {packet:?}");
//! }
//! ```
use crate::{Decoder, Packet, StreamError};
use log::{debug, error};
use std::io::{ErrorKind, Read, Write};

/// Read a single packet from `reader`.
///
/// Returns `Ok(None)` if the stream ends before the first byte of a packet.
/// If the stream ends in the middle of a packet, the packet is truncated and
/// a [`crate::DecodingError`] is returned.
///
/// Never more bytes are read than the packet is long, so `reader` doesn't
/// have to be buffered.
pub fn read_packet<R: Read>(reader: &mut R) -> Result<Option<Packet>, StreamError> {
    read_packet_with(&mut Decoder::new(), reader)
}

/// Read a single packet from `reader` using the given `Decoder`.
///
/// Use it to apply the configuration of the decoder, like
/// [`Decoder::with_maximum_packet_size()`].
pub fn read_packet_with<R: Read>(
    decoder: &mut Decoder,
    reader: &mut R,
) -> Result<Option<Packet>, StreamError> {
    loop {
        let mut buffer = decoder.get_read_buffer();
        let bytes_read = match reader.read(&mut buffer) {
            Ok(bytes_read) => bytes_read,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => return Err(error.into()),
        };

        if bytes_read == 0 {
            if let Err(error) = decoder.end_of_stream() {
                error!("Stream closed in the middle of a packet: {error}");
                return Err(error.into());
            }
            return Ok(None);
        }

        buffer.truncate(bytes_read);
        match decoder.try_decode(buffer.freeze()) {
            Ok(Some(packet)) => return Ok(Some(packet)),
            Ok(None) => continue,
            Err(error) => {
                error!("Dropping malformed packet: {error}");
                return Err(error.into());
            }
        }
    }
}

/// Encode `packet` and write it to `writer`. The writer is flushed afterwards.
pub fn write_packet<W: Write>(writer: &mut W, packet: &Packet) -> Result<(), StreamError> {
    let bytes = packet.to_bytes()?;
    writer.write_all(&bytes)?;
    // If the writer is buffered, `bytes` will not be transmitted unless
    // the internal buffer is full or a call to flush is done.
    writer.flush()?;

    debug!("<-- {packet:?}");
    Ok(())
}
