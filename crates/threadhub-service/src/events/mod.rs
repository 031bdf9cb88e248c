//! In-process domain event distribution.

pub mod bus;

pub use bus::EventBus;
