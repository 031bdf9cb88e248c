//! Background task turning comment events into delivered notifications.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use threadhub_core::error::AppError;
use threadhub_core::events::{DomainEvent, EventPayload};
use threadhub_entity::Notification;

use super::rules::NotificationRules;

/// Delivers notifications to users. Transport lives outside the engine.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Deliver one notification.
    async fn deliver(&self, notification: Notification) -> Result<(), AppError>;
}

/// Sink that records each notification as a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn deliver(&self, notification: Notification) -> Result<(), AppError> {
        info!(
            notification_id = %notification.id,
            recipient_id = %notification.recipient_id,
            actor_id = %notification.actor_id,
            comment_id = %notification.comment_id,
            title = %notification.title,
            "Notification"
        );
        Ok(())
    }
}

/// Applies [`NotificationRules`] to events and hands results to a sink.
#[derive(Clone)]
pub struct NotificationDispatcher {
    rules: NotificationRules,
    sink: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// Creates a new dispatcher.
    pub fn new(rules: NotificationRules, sink: Arc<dyn NotificationSink>) -> Self {
        Self { rules, sink }
    }

    /// Handle one event. Returns the delivered notification, if any.
    pub async fn handle(&self, event: &DomainEvent) -> Result<Option<Notification>, AppError> {
        let EventPayload::Comment(comment_event) = &event.payload;
        let Some(notification) = self.rules.notification_for(comment_event).await? else {
            return Ok(None);
        };
        self.sink.deliver(notification.clone()).await?;
        Ok(Some(notification))
    }

    /// Consume events from `receiver` until the bus closes.
    pub fn spawn(self, mut receiver: broadcast::Receiver<DomainEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Err(e) = self.handle(&event).await {
                            warn!(event_id = %event.id, error = %e, "Notification dispatch failed");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification dispatcher lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Event bus closed; notification dispatcher stopping");
                        break;
                    }
                }
            }
        })
    }
}
