//! Read and write [`Packet`]s from and to asynchronous streams.
//!
//! The functions work with any type implementing [`AsyncRead`] or [`AsyncWrite`]
//! from `futures-lite`, regardless of the executor.
//!
//! ```no_run
//! use async_net::TcpStream;
//! use kwikstaart::{aio::{read_packet, write_packet}, connect};
//!
//! # smol::block_on(async {
//! let mut stream = TcpStream::connect("localhost:1883").await.unwrap();
//! write_packet(&mut stream, &connect("kwikstaart".into(), 60)).await.unwrap();
//!
//! while let Some(packet) = read_packet(&mut stream).await.unwrap() {
//!     println!("Received {packet:?}");
//! }
//! # });
//! ```
use crate::{Decoder, Packet, StreamError};
use futures_lite::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use log::{debug, error};
use std::io::ErrorKind;

/// Read a single packet from `reader`.
///
/// Returns `Ok(None)` if the stream ends before the first byte of a packet.
/// If the stream ends in the middle of a packet, the packet is truncated and
/// a [`crate::DecodingError`] is returned.
pub async fn read_packet<R>(reader: &mut R) -> Result<Option<Packet>, StreamError>
where
    R: AsyncRead + Unpin,
{
    read_packet_with(&mut Decoder::new(), reader).await
}

/// Read a single packet from `reader` using the given `Decoder`.
pub async fn read_packet_with<R>(
    decoder: &mut Decoder,
    reader: &mut R,
) -> Result<Option<Packet>, StreamError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let mut buffer = decoder.get_read_buffer();
        let bytes_read = match reader.read(&mut buffer).await {
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
pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), StreamError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = packet.to_bytes()?;
    writer.write_all(&bytes).await?;
    // If the writer is buffered, `bytes` will not be transmitted unless
    // the internal buffer is full or a call to flush is done.
    writer.flush().await?;

    debug!("<-- {packet:?}");
    Ok(())
}
