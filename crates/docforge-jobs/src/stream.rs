//! Stream Hub (C8): a process-wide registry of subscriber channels that
//! the Job Scheduler pushes progress events into (§4.8).
//!
//! Sends are best-effort by construction: `send`/`broadcast` never
//! return an error and never block the scheduler — a subscriber that's
//! gone (channel dropped, or never attached) just silently misses the
//! event, per §4.8's "a missed event never blocks progress".

use crate::types::StreamEvent;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

/// Registry of subscriber channels keyed by opaque client id.
#[derive(Default)]
pub struct StreamHub {
    subscribers: RwLock<HashMap<String, mpsc::UnboundedSender<StreamEvent>>>,
}

impl StreamHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `client_id`, replacing any previous entry (§4.8).
    /// Returns the receiving half the caller's WebSocket handler polls.
    pub fn attach(&self, client_id: &str) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .expect("stream hub lock poisoned")
            .insert(client_id.to_string(), tx);
        debug!(client_id, "subscriber attached");
        rx
    }

    /// Best-effort, idempotent removal.
    pub fn detach(&self, client_id: &str) {
        self.subscribers
            .write()
            .expect("stream hub lock poisoned")
            .remove(client_id);
        debug!(client_id, "subscriber detached");
    }

    /// Enqueues `event` for `client_id`; dropped silently if the
    /// subscriber is gone.
    pub fn send(&self, client_id: &str, event: StreamEvent) {
        let subscribers = self.subscribers.read().expect("stream hub lock poisoned");
        if let Some(tx) = subscribers.get(client_id) {
            let _ = tx.send(event);
        }
    }

    /// Fans `event` out to every current subscriber.
    pub fn broadcast(&self, event: StreamEvent) {
        let subscribers = self.subscribers.read().expect("stream hub lock poisoned");
        for tx in subscribers.values() {
            let _ = tx.send(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobSnapshot;
    use docforge_core::CommitMode;
    use uuid::Uuid;

    fn snapshot() -> JobSnapshot {
        JobSnapshot {
            task_id: Uuid::new_v4(),
            document_id: "doc1".to_string(),
            status: crate::types::JobStatus::Running,
            mode: CommitMode::Replace,
            cursor: 0,
            total: 1,
            completed: 0,
            failed: 0,
            results: Vec::new(),
            started_at: None,
            ended_at: None,
            error: None,
        }
    }

    #[test]
    fn send_to_attached_subscriber_is_received() {
        let hub = StreamHub::new();
        let mut rx = hub.attach("client-1");
        hub.send("client-1", StreamEvent::JobStarted { job: snapshot() });
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn send_to_unknown_subscriber_is_silently_dropped() {
        let hub = StreamHub::new();
        hub.send("nobody", StreamEvent::JobStarted { job: snapshot() });
    }

    #[test]
    fn detach_is_idempotent_and_stops_delivery() {
        let hub = StreamHub::new();
        let mut rx = hub.attach("client-1");
        hub.detach("client-1");
        hub.detach("client-1");
        hub.send("client-1", StreamEvent::JobStarted { job: snapshot() });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn broadcast_reaches_every_subscriber() {
        let hub = StreamHub::new();
        let mut rx1 = hub.attach("client-1");
        let mut rx2 = hub.attach("client-2");
        hub.broadcast(StreamEvent::JobStarted { job: snapshot() });
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
