use chrono::Utc;
use tracing::{debug, info};

use crate::error::ProtocolError;
use crate::relay::protocol::{ChatMessage, InboundEvent, OutboundEvent};
use crate::relay::{Relay, Session};
use crate::websocket::ConnectionHandle;

/// What a successfully decoded frame led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Registered { sessions: usize, delivered: usize },
    Relayed { delivered: usize },
    /// A chat message from a connection that never registered.
    Unregistered,
    /// Unknown or missing message type.
    Ignored,
}

impl Relay {
    /// Decode one inbound frame from `connection` and act on it.
    ///
    /// Errors mean the frame was malformed. Nothing has been changed or sent
    /// when an error is returned.
    pub async fn handle_frame(
        &mut self,
        connection: &ConnectionHandle,
        raw: &str,
    ) -> Result<Routed, ProtocolError> {
        debug!("Received data from connection {}: {}", connection.id(), raw);

        match InboundEvent::decode(raw)? {
            InboundEvent::Register(profile) => {
                info!("Registering '{}' on connection {}", profile.name, connection.id());
                self.registry.add(connection.clone(), profile);

                let delivered = self
                    .publish(OutboundEvent::Roster(self.registry.profiles()))
                    .await;
                Ok(Routed::Registered {
                    sessions: self.registry.len(),
                    delivered,
                })
            }
            InboundEvent::Message(text) => {
                let sender = self
                    .registry
                    .find_by_connection(connection)
                    .and_then(Session::name)
                    .map(str::to_string);

                let Some(from) = sender else {
                    debug!("Ignoring message from unregistered connection {}", connection.id());
                    return Ok(Routed::Unregistered);
                };

                let delivered = self
                    .publish(OutboundEvent::Message(ChatMessage {
                        from,
                        message: text,
                        time: Utc::now().timestamp_millis(),
                    }))
                    .await;
                Ok(Routed::Relayed { delivered })
            }
            InboundEvent::Unknown(tag) => {
                debug!("Ignoring frame with message type {:?}", tag);
                Ok(Routed::Ignored)
            }
        }
    }
}
