use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{SessionId, TaxSession};

/// Repository record wrapping a session with bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub session: TaxSession,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by every write; `update` refuses a record read before the latest write.
    #[serde(default)]
    pub revision: u64,
}

impl SessionRecord {
    pub fn new(session_id: SessionId, session: TaxSession) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            session,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    /// Mark a write: refresh `updated_at` and bump the revision.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.revision += 1;
    }

    /// True when this record was derived from `stored` and nothing was written in between.
    pub fn follows(&self, stored: &SessionRecord) -> bool {
        self.revision == stored.revision + 1
    }
}

/// Storage abstraction so the service can be exercised without a database.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError>;
    /// Replace the stored record. Implementations return `Stale` unless
    /// `record.follows(stored)`, so overlapping read-modify-write requests fail instead of
    /// dropping each other's changes.
    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read")]
    Stale,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
