use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::config::{
    ServerConfig, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_FRAME_SIZE, DEFAULT_WRITE_TIMEOUT,
};
use crate::transport::{read_frame, write_frame, FrameSink, FrameSource, Transport};

pub struct TcpReader {
    half: OwnedReadHalf,
    max_frame: u32,
    idle_timeout: Duration,
}

pub struct TcpWriter {
    half: OwnedWriteHalf,
    max_frame: u32,
    write_timeout: Duration,
}

/// Length-prefixed frames over a TCP stream.
pub struct TcpTransport {
    reader: TcpReader,
    writer: TcpWriter,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_limits(
            stream,
            DEFAULT_MAX_FRAME_SIZE,
            DEFAULT_WRITE_TIMEOUT,
            DEFAULT_IDLE_TIMEOUT,
        )
    }

    pub fn with_config(stream: TcpStream, config: &ServerConfig) -> Self {
        Self::with_limits(
            stream,
            config.max_frame_size,
            config.write_timeout,
            config.idle_timeout,
        )
    }

    pub fn with_limits(
        stream: TcpStream,
        max_frame: u32,
        write_timeout: Duration,
        idle_timeout: Duration,
    ) -> Self {
        let _ = stream.set_nodelay(true);
        let (read, write) = stream.into_split();
        Self {
            reader: TcpReader {
                half: read,
                max_frame,
                idle_timeout,
            },
            writer: TcpWriter {
                half: write,
                max_frame,
                write_timeout,
            },
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    pub fn split(self) -> (TcpReader, TcpWriter) {
        (self.reader, self.writer)
    }
}

#[async_trait::async_trait]
impl FrameSource for TcpReader {
    async fn recv(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        timeout(self.idle_timeout, read_frame(&mut self.half, self.max_frame))
            .await
            .map_err(|_| anyhow::anyhow!("Connection idle for {:?}", self.idle_timeout))?
    }
}

#[async_trait::async_trait]
impl FrameSink for TcpWriter {
    async fn send(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        timeout(
            self.write_timeout,
            write_frame(&mut self.half, frame, self.max_frame),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.write_timeout))?
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        self.writer.send(frame).await
    }

    async fn recv(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        self.reader.recv().await
    }

    fn into_split(self: Box<Self>) -> (Box<dyn FrameSource>, Box<dyn FrameSink>) {
        let (reader, writer) = self.split();
        (Box::new(reader), Box::new(writer))
    }
}
