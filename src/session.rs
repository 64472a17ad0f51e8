//! One live connection: the reader runs in the calling task, the writer in
//! a task of its own fed by the connection's hub queue.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::gateway::{ConnectionState, Gateway};
use crate::hub::{ConnectionId, Hub, Subscription};
use crate::protocol::Payload;
use crate::transport::{FrameSink, Transport};

/// Serve `transport` until the peer disconnects, the transport fails or the
/// hub drops the connection. The connection is unregistered on every path.
pub async fn run_session(
    gateway: Arc<Gateway>,
    transport: Box<dyn Transport>,
    outbound_capacity: usize,
) -> anyhow::Result<()> {
    let (mut reader, writer) = transport.into_split();
    let hub = gateway.hub().clone();
    let Subscription { id, rx } = hub.open(None, None, outbound_capacity);
    let mut conn = ConnectionState::new(id);
    debug!("session {} started", id);

    let mut writer_task = tokio::spawn(write_loop(id, writer, rx, hub.clone()));
    let mut writer_done = false;

    let result = loop {
        tokio::select! {
            frame = reader.recv() => match frame {
                Ok(Some(frame)) => gateway.handle_frame(&mut conn, &frame).await,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            },
            _ = &mut writer_task => {
                writer_done = true;
                break Ok(());
            }
        }
    };

    hub.unregister(id);
    if !writer_done {
        // drains whatever is still queued, then sees the queue close
        let _ = writer_task.await;
    }
    match &result {
        Ok(()) => debug!("session {} closed", id),
        Err(e) => warn!("session {} failed: {}", id, e),
    }
    result
}

async fn write_loop(
    id: ConnectionId,
    mut writer: Box<dyn FrameSink>,
    mut rx: mpsc::Receiver<Payload>,
    hub: Hub,
) {
    while let Some(payload) = rx.recv().await {
        if let Err(e) = writer.send(&payload).await {
            warn!("session {} write failed: {}", id, e);
            break;
        }
    }
    hub.unregister(id);
}
