use std::future::Future;
use std::sync::Arc;

use log::{info, warn};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::game::GameEngine;
use crate::gateway::Gateway;
use crate::hub::Hub;
use crate::session::run_session;
use crate::transport::TcpTransport;

/// TCP front end: one session per accepted connection.
pub struct Server {
    gateway: Arc<Gateway>,
    config: ServerConfig,
}

impl Server {
    pub fn new(engine: Arc<GameEngine>, hub: Hub, config: ServerConfig) -> Self {
        Self {
            gateway: Arc::new(Gateway::new(engine, hub)),
            config,
        }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        let listener = TcpListener::bind(self.config.bind_address).await?;
        info!("listening on {}", listener.local_addr()?);
        Ok(listener)
    }

    /// Accept connections until `shutdown` resolves. Sessions already running
    /// are left to finish on their own.
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutting down listener");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("accepted connection from {}", peer);
                        let transport = TcpTransport::with_config(stream, &self.config);
                        let gateway = self.gateway.clone();
                        let capacity = self.config.outbound_capacity;
                        tokio::spawn(async move {
                            let _ = run_session(gateway, Box::new(transport), capacity).await;
                        });
                    }
                    Err(e) => warn!("accept failed: {}", e),
                },
            }
        }
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = self.bind().await?;
        self.serve_until(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }
}
