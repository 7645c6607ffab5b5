use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::relay::HubHandle;
use crate::websocket::connection::{classify, Inbound};
use crate::websocket::{ConnectionHandle, ConnectionPool};

pub struct WebSocketServer {
    pool: Arc<ConnectionPool>,
    hub: HubHandle,
}

impl WebSocketServer {
    pub fn new(pool: Arc<ConnectionPool>, hub: HubHandle) -> Self {
        Self { pool, hub }
    }

    /// Accept connections forever. Accept errors are logged and skipped.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        server.handle_connection(stream, addr).await;
                    });
                }
                Err(e) => error!("Failed to accept connection: {}", e),
            }
        }
    }

    pub async fn handle_connection(self: Arc<Self>, raw_stream: TcpStream, addr: SocketAddr) {
        info!("New WebSocket connection from: {}", addr);

        let ws_stream = match tokio_tungstenite::accept_async(raw_stream).await {
            Ok(ws) => ws,
            Err(e) => {
                error!("Error during WebSocket handshake with {}: {}", addr, e);
                return;
            }
        };

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let connection = ConnectionHandle::new(tx);
        let connection_id = connection.id();
        self.pool.add(connection.clone()).await;

        // Forward queued frames to the socket
        let mut send_task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = ws_sink.send(message).await {
                    error!("Error sending WebSocket message: {}", e);
                    break;
                }
            }

            if let Err(e) = ws_sink.close().await {
                debug!("Error closing WebSocket connection: {}", e);
            }
        });

        let pool = self.pool.clone();
        let hub = self.hub.clone();
        let mut receive_task = tokio::spawn(async move {
            while let Some(message) = ws_stream.next().await {
                let message = match message {
                    Ok(msg) => msg,
                    Err(e) => {
                        error!("Error receiving WebSocket message: {}", e);
                        break;
                    }
                };

                match classify(connection_id, message) {
                    Inbound::Payload(text) => {
                        if let Err(e) = hub.submit(connection.clone(), text) {
                            error!("Dropping frame from {}: {}", connection_id, e);
                            break;
                        }
                    }
                    // Keep polling so the close handshake completes
                    Inbound::Close => pool.mark_closing(&connection_id).await,
                    Inbound::Ignored => {}
                }
            }
        });

        tokio::select! {
            _ = &mut send_task => {
                info!("Send task completed for connection {}", connection_id);
                receive_task.abort();
            }
            _ = &mut receive_task => {
                info!("Receive task completed for connection {}", connection_id);
                send_task.abort();
            }
        }

        // The registry keeps its session until the next sweep
        self.pool.remove(&connection_id).await;
        info!(
            "Connection {} closed, {} still connected",
            connection_id,
            self.pool.connection_count().await
        );
    }
}
