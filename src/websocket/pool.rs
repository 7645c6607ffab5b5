use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::WebSocketError;
use crate::relay::Transport;
use crate::websocket::{ConnectionHandle, ConnectionState};

#[derive(Debug)]
struct PoolEntry {
    handle: ConnectionHandle,
    state: ConnectionState,
}

/// Every socket the server currently knows about, keyed by connection id.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    connections: Arc<RwLock<HashMap<Uuid, PoolEntry>>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, handle: ConnectionHandle) {
        let id = handle.id();
        self.connections.write().await.insert(
            id,
            PoolEntry {
                handle,
                state: ConnectionState::Open,
            },
        );
        info!("Added connection {} to pool", id);
    }

    /// Stop treating the connection as open while its tasks wind down.
    pub async fn mark_closing(&self, id: &Uuid) {
        if let Some(entry) = self.connections.write().await.get_mut(id) {
            if entry.state == ConnectionState::Open {
                entry.state = ConnectionState::Closing;
                debug!("Connection {} is closing", id);
            }
        }
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.connections.write().await.remove(id).is_some();
        if removed {
            info!("Removed connection {} from pool", id);
        }
        removed
    }

    #[cfg(test)]
    pub async fn state(&self, id: &Uuid) -> ConnectionState {
        self.connections
            .read()
            .await
            .get(id)
            .map(|entry| entry.state)
            .unwrap_or(ConnectionState::Closed)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl Transport for ConnectionPool {
    async fn open_connections(&self) -> Result<HashSet<Uuid>, WebSocketError> {
        Ok(self
            .connections
            .read()
            .await
            .iter()
            .filter(|(_, entry)| entry.state == ConnectionState::Open)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn broadcast(&self, payload: &str) -> usize {
        let connections = self.connections.read().await;
        let mut delivered = 0;

        for (id, entry) in connections.iter() {
            if entry.state != ConnectionState::Open {
                continue;
            }
            debug!("Sending data to connection {}: {}", id, payload);
            match entry.handle.send_text(payload) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Skipping broadcast to {}: {}", id, e),
            }
        }

        delivered
    }
}
