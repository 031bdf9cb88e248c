//! Core traits defined in `threadhub-core` and implemented by other crates.

pub mod events;

pub use events::{EventPublisher, NoopPublisher};
