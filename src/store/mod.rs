//! Record store boundary: persistence of sessions, transcript units,
//! running summaries, and AI responses.
//!
//! The coordinator depends only on this narrow contract; deployments plug
//! in whatever backend they have. The in-memory implementation here is the
//! default and the test double.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::state::{AiResponseUnit, RunningSummary, Session, TranscriptUnit};

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_session(&self, session: Session) -> Result<(), StoreError>;

    async fn get_session(&self, id: &str) -> Result<Option<Session>, StoreError>;

    /// Overwrite the stored session record (status, phase, facilitation,
    /// members). The coordinator persists wholesale after each mutation.
    async fn update_session(&self, session: Session) -> Result<(), StoreError>;

    async fn insert_transcript_unit(&self, unit: TranscriptUnit) -> Result<(), StoreError>;

    /// Units for a session, sorted by elapsed-time offset.
    async fn list_transcript_units(&self, session_id: &str)
        -> Result<Vec<TranscriptUnit>, StoreError>;

    /// Overwrite-in-place; a session has at most one running summary.
    async fn upsert_summary(&self, summary: RunningSummary) -> Result<(), StoreError>;

    async fn get_summary(&self, session_id: &str) -> Result<Option<RunningSummary>, StoreError>;

    async fn insert_ai_response(&self, unit: AiResponseUnit) -> Result<(), StoreError>;

    async fn list_ai_responses(&self, session_id: &str)
        -> Result<Vec<AiResponseUnit>, StoreError>;
}
