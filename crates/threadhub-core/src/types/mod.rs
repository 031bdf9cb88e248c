//! Core type definitions used across the ThreadHub workspace.

pub mod id;

pub use id::*;
