//! Relay core: who is connected, what their frames mean, and who hears
//! about it.
//!
//! [`Relay`] owns the [`Registry`] and is only ever driven from one task
//! (see [`RelayHub`]), so frame handling and sweep ticks never interleave.

mod hub;
pub mod protocol;
mod registry;
mod router;
mod sweeper;
mod transport;

pub use hub::{HubCommand, HubHandle, RelayHub};
pub use protocol::{ChatMessage, Envelope, InboundEvent, OutboundEvent, UserProfile};
pub use registry::{Registry, Session};
pub use router::Routed;
pub use sweeper::SweepOutcome;
pub use transport::Transport;

#[cfg(test)]
pub use transport::MockTransport;

use std::sync::Arc;
use tracing::error;

pub struct Relay {
    registry: Registry,
    transport: Arc<dyn Transport>,
}

impl Relay {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            registry: Registry::new(),
            transport,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode once and fan out to every open connection.
    async fn publish(&self, event: OutboundEvent) -> usize {
        match event.encode() {
            Ok(payload) => self.transport.broadcast(&payload).await,
            Err(e) => {
                error!("Failed to serialize outbound event: {}", e);
                0
            }
        }
    }
}
