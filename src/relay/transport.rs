use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::WebSocketError;

/// The transport layer as seen by the relay core.
///
/// The transport, not the registry, is authoritative about which sockets are
/// still open. Broadcasts go to every open socket whether or not it has
/// registered a profile.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ids of all connections currently in the open state.
    async fn open_connections(&self) -> Result<HashSet<Uuid>, WebSocketError>;

    /// Queue `payload` on every open connection. Returns how many
    /// connections it was queued for; individual send failures are skipped.
    async fn broadcast(&self, payload: &str) -> usize;
}
