//! Contract for the remote queue API. The model only consumes it; transports
//! implement [`QueueApi`].

pub mod memory;

pub use memory::MemoryApi;

use crate::queue::JobRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    Decode(String),
}

/// Kind of entity an edit or commit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Job,
    Set,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Job => f.write_str("job"),
            EntityKind::Set => f.write_str("set"),
        }
    }
}

/// Body of an `edit` call: the entity to open a draft session on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub id: i64,
}

/// Body of a `commit` call: the serialized record as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub json: String,
}

#[async_trait]
pub trait QueueApi: Send + Sync {
    /// Open a draft-edit session for an entity.
    async fn edit(&self, kind: EntityKind, request: EditRequest) -> Result<(), ApiError>;

    /// Persist a record. The response is the authoritative job, with ids
    /// assigned to every set.
    async fn commit(&self, kind: EntityKind, request: CommitRequest) -> Result<JobRecord, ApiError>;
}
