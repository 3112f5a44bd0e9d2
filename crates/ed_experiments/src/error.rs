use ed_core::error::SimError;
use thiserror::Error;

/// A replication set is invalid as soon as one of its runs fails.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("replication {replication} (seed {seed}) failed: {source}")]
pub struct ReplicationError {
    pub replication: usize,
    pub seed: u64,
    #[source]
    pub source: SimError,
}
