pub mod config;
pub mod error;
pub mod relay;
pub mod websocket;

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

use relay::RelayHub;
use websocket::{ConnectionPool, WebSocketServer};

/// Serve the relay on `listener` until `shutdown` resolves.
///
/// Spawns the relay hub with the configured sweep interval, then accepts
/// websocket connections on the current runtime.
pub async fn serve<F>(config: Settings, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let pool = Arc::new(ConnectionPool::new());
    let (hub, handle) = RelayHub::new(pool.clone(), config.relay.sweep_interval());
    tokio::spawn(hub.run());

    let server = Arc::new(WebSocketServer::new(pool, handle));
    info!(
        "Relay ready to accept connections at ws://{}",
        listener.local_addr()?
    );

    tokio::select! {
        _ = server.run(listener) => {}
        _ = shutdown => info!("Shutdown requested, no longer accepting connections"),
    }

    Ok(())
}
