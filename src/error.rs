//! Error types for the simulation core
//!
//! Scheduling violations and index/invariant violations are programmer errors.
//! They surface as `Err` and abort the current `step()`; nothing is dropped silently.

use thiserror::Error;

use crate::sim::BlobId;

/// Errors raised by the scheduler, the world, or configuration loading
#[derive(Debug, Error)]
pub enum SimError {
    /// Priority level outside `[0, levels)`
    #[error("invalid priority level {priority} (scheduler has {levels} levels)")]
    InvalidPriority { priority: usize, levels: usize },

    /// Due tick is not strictly in the future
    #[error("cannot schedule at tick {tick}: current tick is {now}")]
    InvalidSchedule { tick: i64, now: i64 },

    /// Relative delay must be positive
    #[error("invalid delay {delta}: must be at least 1 tick")]
    InvalidDelay { delta: i64 },

    /// Particle index does not address a live slot
    #[error("particle index {index} out of range (len {len})")]
    ParticleOutOfRange { index: usize, len: usize },

    /// Blob id has no live blob
    #[error("no live blob with id {0}")]
    UnknownBlob(BlobId),

    /// Configuration values that cannot be used
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
