use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::protocol::{MAX_PACKET_SIZE, Packet, PacketError};

const LENGTH_PREFIX: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("frame of {0} bytes exceeds the size limit")]
    TooLarge(usize),
    #[error(transparent)]
    Packet(#[from] PacketError),
}

/// Writes one length-prefixed packet and returns the bytes put on the wire.
pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<usize, FrameError>
where
    W: AsyncWrite + Unpin,
{
    let data = packet.serialize()?;
    if data.len() > MAX_PACKET_SIZE {
        return Err(FrameError::TooLarge(data.len()));
    }

    writer.write_u32(data.len() as u32).await?;
    writer.write_all(&data).await?;
    writer.flush().await?;

    Ok(LENGTH_PREFIX + data.len())
}

/// Reads one raw frame body. `None` means the peer closed the stream between
/// frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > MAX_PACKET_SIZE {
        return Err(FrameError::TooLarge(len));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

/// Yields decoded packets from a stream. Frames that fail to decode are
/// skipped without closing the stream.
pub struct PacketReader<R> {
    inner: R,
    dropped: u64,
}

impl<R: AsyncRead + Unpin> PacketReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, dropped: 0 }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub async fn next_packet(&mut self) -> Result<Option<Packet>, FrameError> {
        loop {
            let Some(frame) = read_frame(&mut self.inner).await? else {
                return Ok(None);
            };

            match Packet::deserialize(&frame) {
                Ok(packet) => return Ok(Some(packet)),
                Err(e) => {
                    self.dropped += 1;
                    log::debug!("dropping malformed frame ({} bytes): {}", frame.len(), e);
                }
            }
        }
    }
}
