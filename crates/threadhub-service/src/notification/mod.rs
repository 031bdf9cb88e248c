//! Notifications derived from comment events.

pub mod dispatcher;
pub mod rules;

pub use dispatcher::{NotificationDispatcher, NotificationSink, TracingNotificationSink};
pub use rules::{InMemoryPostDirectory, NotificationRules, PostDirectory};
