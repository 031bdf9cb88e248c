//! Comment store backend selection.

use serde::{Deserialize, Serialize};

/// Which persistence backend holds comments and the closure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL through the sqlx pool.
    #[default]
    Postgres,
    /// Process-local store, used for tests and embedding.
    Memory,
}

/// Store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend used for comments and closure edges.
    #[serde(default)]
    pub backend: StoreBackend,
}
