use tokio::sync::mpsc;

use crate::transport::{FrameSink, FrameSource, Transport};

pub struct InMemoryReader {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

pub struct InMemoryWriter {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

/// One end of an in-process connection. Dropping an end (or its writer)
/// closes the stream seen by the other end.
pub struct InMemoryTransport {
    reader: InMemoryReader,
    writer: InMemoryWriter,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        (
            Self {
                reader: InMemoryReader { rx: rx1 },
                writer: InMemoryWriter { tx: tx2 },
            },
            Self {
                reader: InMemoryReader { rx: rx2 },
                writer: InMemoryWriter { tx: tx1 },
            },
        )
    }

    pub fn split(self) -> (InMemoryReader, InMemoryWriter) {
        (self.reader, self.writer)
    }
}

#[async_trait::async_trait]
impl FrameSource for InMemoryReader {
    async fn recv(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.rx.recv().await)
    }
}

#[async_trait::async_trait]
impl FrameSink for InMemoryWriter {
    async fn send(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        if frame.is_empty() {
            return Err(anyhow::anyhow!("Refusing to send an empty frame"));
        }
        self.tx
            .send(frame.to_vec())
            .map_err(|_| anyhow::anyhow!("Channel closed"))
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
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
