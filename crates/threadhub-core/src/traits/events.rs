//! Seam between write operations and event consumers.

use crate::events::DomainEvent;

/// Publishes domain events after the originating write has committed.
///
/// Publishing is fire-and-forget: a publisher must never fail the write
/// that produced the event, so the method has no error channel.
pub trait EventPublisher: Send + Sync + 'static {
    /// Hand an event to interested subscribers.
    fn publish(&self, event: DomainEvent);
}

/// Publisher that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: DomainEvent) {}
}
