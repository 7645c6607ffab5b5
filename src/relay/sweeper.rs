use tracing::{debug, info};

use crate::error::WebSocketError;
use crate::relay::protocol::OutboundEvent;
use crate::relay::{Relay, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Unchanged,
    Evicted { evicted: usize, remaining: usize },
}

impl Relay {
    /// Drop sessions whose connection the transport no longer reports as
    /// open. When anything was dropped, the surviving names go out as a
    /// `users` roster.
    pub async fn sweep(&mut self) -> Result<SweepOutcome, WebSocketError> {
        let open = self.transport.open_connections().await?;

        let survivors: Vec<Session> = self
            .registry
            .snapshot()
            .iter()
            .filter(|session| open.contains(&session.connection.id()))
            .cloned()
            .collect();

        if survivors.len() == self.registry.len() {
            debug!("Sweep found {} live sessions, nothing to evict", survivors.len());
            return Ok(SweepOutcome::Unchanged);
        }

        let evicted = self.registry.len() - survivors.len();
        self.registry.replace_all(survivors);
        info!(
            "Sweep evicted {} sessions, {} remaining",
            evicted,
            self.registry.len()
        );

        // Names only here, unlike the full profiles sent on registration
        self.publish(OutboundEvent::RosterNames(self.registry.names()))
            .await;

        Ok(SweepOutcome::Evicted {
            evicted,
            remaining: self.registry.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::testing::{connect, drain, register_frame};
    use crate::relay::MockTransport;
    use crate::websocket::ConnectionPool;
    use std::sync::Arc;
    use test_log::test;

    #[test(tokio::test)]
    async fn test_sweep_without_closures_is_silent() {
        let pool = Arc::new(ConnectionPool::new());
        let mut relay = Relay::new(pool.clone());
        let (alice, mut rx) = connect(&pool).await;
        relay.handle_frame(&alice, &register_frame("Alice")).await.unwrap();
        drain(&mut rx);

        assert_eq!(relay.sweep().await.unwrap(), SweepOutcome::Unchanged);
        assert_eq!(relay.sweep().await.unwrap(), SweepOutcome::Unchanged);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(relay.registry().names(), vec!["Alice"]);
    }

    #[test(tokio::test)]
    async fn test_sweep_evicts_closed_connections() {
        let pool = Arc::new(ConnectionPool::new());
        let mut relay = Relay::new(pool.clone());

        let mut receivers = Vec::new();
        let mut handles = Vec::new();
        for name in ["Alice", "Bob", "Carol", "Dave"] {
            let (handle, rx) = connect(&pool).await;
            relay.handle_frame(&handle, &register_frame(name)).await.unwrap();
            handles.push(handle);
            receivers.push(rx);
        }

        pool.remove(&handles[1].id()).await;
        pool.mark_closing(&handles[3].id()).await;

        let outcome = relay.sweep().await.unwrap();
        assert_eq!(outcome, SweepOutcome::Evicted { evicted: 2, remaining: 2 });
        assert_eq!(relay.registry().names(), vec!["Alice", "Carol"]);

        let frames = drain(&mut receivers[0]);
        let roster = frames.last().unwrap();
        assert_eq!(roster["messageType"], "users");
        // Known inconsistency: eviction rosters carry plain names while
        // registration rosters carry JSON-encoded profiles.
        assert_eq!(roster["dataArray"], serde_json::json!(["Alice", "Carol"]));

        // Exactly one roster per eviction, then quiet again
        assert_eq!(relay.sweep().await.unwrap(), SweepOutcome::Unchanged);
        let name_rosters = drain(&mut receivers[2])
            .iter()
            .filter(|f| f["dataArray"] == serde_json::json!(["Alice", "Carol"]))
            .count();
        assert_eq!(name_rosters, 1);
    }

    #[test(tokio::test)]
    async fn test_sweep_ignores_unregistered_connections() {
        let pool = Arc::new(ConnectionPool::new());
        let mut relay = Relay::new(pool.clone());
        let (lurker, _rx) = connect(&pool).await;

        pool.remove(&lurker.id()).await;
        assert_eq!(relay.sweep().await.unwrap(), SweepOutcome::Unchanged);
    }

    #[test(tokio::test)]
    async fn test_sweep_transport_failure_leaves_registry_alone() {
        let pool = Arc::new(ConnectionPool::new());
        let (alice, _rx) = connect(&pool).await;

        let mut transport = MockTransport::new();
        transport
            .expect_open_connections()
            .times(1)
            .returning(|| Err(WebSocketError::ConnectionError("listener gone".to_string())));
        transport.expect_broadcast().returning(|_| 1);

        let mut relay = Relay::new(Arc::new(transport));
        relay.handle_frame(&alice, &register_frame("Alice")).await.unwrap();

        assert!(matches!(
            relay.sweep().await,
            Err(WebSocketError::ConnectionError(_))
        ));
        assert_eq!(relay.registry().len(), 1);
    }
}
