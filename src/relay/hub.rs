use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::error::WebSocketError;
use crate::relay::{Relay, Transport};
use crate::websocket::ConnectionHandle;

#[derive(Debug)]
pub enum HubCommand {
    Frame {
        connection: ConnectionHandle,
        payload: String,
    },
}

/// Submits work to a running [`RelayHub`]. The hub stops once every handle
/// has been dropped.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    pub fn submit(&self, connection: ConnectionHandle, payload: String) -> Result<(), WebSocketError> {
        self.tx
            .send(HubCommand::Frame {
                connection,
                payload,
            })
            .map_err(|_| WebSocketError::SendError("relay hub has stopped".to_string()))
    }
}

/// Single owner of the relay state. Frames and sweep ticks are processed one
/// at a time in arrival order.
pub struct RelayHub {
    relay: Relay,
    rx: mpsc::UnboundedReceiver<HubCommand>,
    sweep_interval: Duration,
}

impl RelayHub {
    pub fn new(transport: Arc<dyn Transport>, sweep_interval: Duration) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            relay: Relay::new(transport),
            rx,
            sweep_interval,
        };
        (hub, HubHandle { tx })
    }

    /// Run until all handles are dropped, then hand back the final state.
    pub async fn run(self) -> Relay {
        let RelayHub {
            mut relay,
            mut rx,
            sweep_interval,
        } = self;

        let mut ticker = interval(sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; the first sweep is one interval out
        ticker.tick().await;

        info!("Relay hub started, sweeping every {:?}", sweep_interval);

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(HubCommand::Frame { connection, payload }) => {
                        if let Err(e) = relay.handle_frame(&connection, &payload).await {
                            warn!("Error in message from connection {}: {}", connection.id(), e);
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if let Err(e) = relay.sweep().await {
                        error!("Sweep tick failed: {}", e);
                    }
                }
            }
        }

        info!("Relay hub stopped with {} sessions", relay.registry().len());
        relay
    }
}
