//! In-process event bus.
//!
//! Services publish a [`BoardEvent`] after the record it describes has been
//! persisted. Each subscriber owns an unbounded queue, so a slow consumer
//! never loses events while its receiver is alive. Subscribers whose
//! receiver has been dropped are pruned on the next publish.
use std::sync::Mutex;

use idea_board_shared::types::BoardEvent;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<UnboundedSender<BoardEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber that receives every event published from
    /// now on.
    pub fn subscribe(&self) -> UnboundedReceiver<BoardEvent> {
        let (sender, receiver) = unbounded_channel();
        self.lock_subscribers().push(sender);
        receiver
    }

    /// Delivers `event` to every live subscriber. Never fails.
    pub fn publish(&self, event: BoardEvent) {
        tracing::debug!(event = event.name(), actor_id = event.actor_id(), "Publishing event");
        self.lock_subscribers()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<UnboundedSender<BoardEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_user;

    #[tokio::test]
    async fn test_every_subscriber_receives_each_event() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(BoardEvent::UserCreated(sample_user(1, "alice")));

        assert!(matches!(first.recv().await, Some(BoardEvent::UserCreated(u)) if u.id == 1));
        assert!(matches!(second.recv().await, Some(BoardEvent::UserCreated(u)) if u.id == 1));
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(BoardEvent::UserCreated(sample_user(1, "alice")));

        assert_eq!(bus.subscriber_count(), 1);
        drop(kept);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        bus.publish(BoardEvent::UserCreated(sample_user(1, "alice")));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_receiver_ends_when_bus_is_dropped() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        drop(bus);
        assert!(receiver.recv().await.is_none());
    }
}
