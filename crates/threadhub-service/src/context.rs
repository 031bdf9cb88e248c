//! Request context carrying the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadhub_core::types::UserId;

/// Context for the current request.
///
/// Authentication happens upstream; the engine only needs to know *who* is
/// acting so it can enforce the author predicate and attribute events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user performing the operation.
    pub actor_id: UserId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context for `actor_id`.
    pub fn new(actor_id: UserId) -> Self {
        Self {
            actor_id,
            request_time: Utc::now(),
        }
    }

    /// Returns whether `user_id` is the acting user.
    pub fn is_actor(&self, user_id: UserId) -> bool {
        self.actor_id == user_id
    }
}
