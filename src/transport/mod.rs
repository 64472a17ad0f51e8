//! Frame transports. A frame is a 4-byte big-endian length followed by that
//! many payload bytes; payloads are JSON documents.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub mod in_memory;
pub mod tcp;

pub use in_memory::InMemoryTransport;
pub use tcp::TcpTransport;

/// Receiving half of a connection.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` once the peer closed the connection cleanly.
    async fn recv(&mut self) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Sending half of a connection.
#[async_trait::async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: &[u8]) -> anyhow::Result<()>;
}

/// A full-duplex connection that can be split so reading and writing run in
/// separate tasks.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send(&mut self, frame: &[u8]) -> anyhow::Result<()>;
    async fn recv(&mut self) -> anyhow::Result<Option<Vec<u8>>>;
    fn into_split(self: Box<Self>) -> (Box<dyn FrameSource>, Box<dyn FrameSink>);
}

fn io_error(op: &str, e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe => {
            anyhow::anyhow!("Connection closed by peer")
        }
        ErrorKind::ConnectionReset => anyhow::anyhow!("Connection reset by peer"),
        _ => anyhow::anyhow!("{} error: {}", op, e),
    }
}

/// Read one frame. A clean end of stream before the length prefix yields
/// `None`; zero-length and oversized frames are errors.
pub async fn read_frame<R>(reader: &mut R, max_frame: u32) -> anyhow::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(io_error("Read", e)),
    }

    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(anyhow::anyhow!("Invalid frame length: 0"));
    }
    // bounded before allocating
    if len > max_frame {
        return Err(anyhow::anyhow!(
            "Frame too large: {} bytes (max: {})",
            len,
            max_frame
        ));
    }

    let mut buf = vec![0u8; len as usize];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|e| io_error("Read", e))?;
    Ok(Some(buf))
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8], max_frame: u32) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if frame.is_empty() {
        return Err(anyhow::anyhow!("Refusing to send an empty frame"));
    }
    if frame.len() > max_frame as usize {
        return Err(anyhow::anyhow!(
            "Frame too large: {} bytes (max: {})",
            frame.len(),
            max_frame
        ));
    }
    let len = (frame.len() as u32).to_be_bytes();
    writer.write_all(&len).await.map_err(|e| io_error("Write", e))?;
    writer.write_all(frame).await.map_err(|e| io_error("Write", e))?;
    writer.flush().await.map_err(|e| io_error("Write", e))?;
    Ok(())
}
