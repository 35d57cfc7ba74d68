//! Construction-time failures. Tick-time failures never use this type —
//! see [`crate::log`] for the runtime taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("bootstrap failed: {reason}")]
    Bootstrap { reason: String },

    #[error("log ring buffer capacity must be > 0, got {capacity}")]
    InvalidRingCapacity { capacity: usize },

    #[error("tick system '{name}' registered more than once")]
    DuplicateSystemRegistration { name: String },

    #[error("persisted state could not be loaded: {reason}")]
    PersistenceLoad { reason: String },
}
