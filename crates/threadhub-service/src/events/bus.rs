//! Broadcast-channel event bus for single-node deployments.

use tokio::sync::broadcast;
use tracing::debug;

use threadhub_core::config::EventsConfig;
use threadhub_core::events::DomainEvent;
use threadhub_core::traits::EventPublisher;

/// Fans domain events out to every subscriber.
///
/// Subscribers that fall more than `buffer_size` events behind observe
/// `RecvError::Lagged` and skip ahead.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    /// Create a bus sized by configuration.
    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.buffer_size)
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: DomainEvent) {
        let event_id = event.id;
        match self.sender.send(event) {
            Ok(receivers) => debug!(event_id = %event_id, receivers, "Published event"),
            Err(_) => debug!(event_id = %event_id, "Published event with no subscribers"),
        }
    }
}
