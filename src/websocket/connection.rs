use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;
use uuid::Uuid;

use crate::error::WebSocketError;

/// Transport-level lifecycle of a single websocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closing,
    Closed,
}

/// Cheap, cloneable handle used to push frames to one client.
///
/// Two handles are equal when they refer to the same underlying connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    tx: mpsc::UnboundedSender<Message>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn send_text(&self, text: &str) -> Result<(), WebSocketError> {
        self.tx
            .send(Message::Text(text.to_string()))
            .map_err(|e| WebSocketError::SendError(format!("connection {}: {}", self.id, e)))
    }

    /// True once the writer side of the connection has gone away.
    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

/// What the read loop should do with one websocket message.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Inbound {
    /// Frame payload to hand to the relay.
    Payload(String),
    Close,
    /// Control traffic the transport answers on its own.
    Ignored,
}

pub(crate) fn classify(id: Uuid, msg: Message) -> Inbound {
    match msg {
        Message::Text(text) => Inbound::Payload(text),
        // Raw buffers are read as text, same as text frames
        Message::Binary(bin) => match String::from_utf8(bin) {
            Ok(text) => Inbound::Payload(text),
            Err(e) => {
                warn!("Dropping non-UTF-8 binary frame on connection {}: {}", id, e);
                Inbound::Ignored
            }
        },
        Message::Close(_) => Inbound::Close,
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Inbound::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_equality_follows_connection() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let a = ConnectionHandle::new(tx.clone());
        let b = ConnectionHandle::new(tx);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_send_text_after_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new(tx);

        handle.send_text("hi").unwrap();
        assert_eq!(rx.try_recv().unwrap(), Message::Text("hi".to_string()));

        drop(rx);
        assert!(handle.is_closed());
        assert!(matches!(handle.send_text("late"), Err(WebSocketError::SendError(_))));
    }

    #[test]
    fn test_classify_frames() {
        let id = Uuid::new_v4();
        assert_eq!(
            classify(id, Message::Text("{}".to_string())),
            Inbound::Payload("{}".to_string())
        );
        assert_eq!(
            classify(id, Message::Binary(b"{\"messageType\":\"x\"}".to_vec())),
            Inbound::Payload("{\"messageType\":\"x\"}".to_string())
        );
        assert_eq!(classify(id, Message::Binary(vec![0xff, 0xfe])), Inbound::Ignored);
        assert_eq!(classify(id, Message::Ping(vec![1])), Inbound::Ignored);
        assert_eq!(classify(id, Message::Close(None)), Inbound::Close);
    }
}
