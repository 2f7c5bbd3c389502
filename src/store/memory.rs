use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RecordStore, StoreError};
use crate::session::state::{AiResponseUnit, RunningSummary, Session, TranscriptUnit};

/// In-memory record store, keyed by session id.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
    units: RwLock<HashMap<String, Vec<TranscriptUnit>>>,
    summaries: RwLock<HashMap<String, RunningSummary>>,
    responses: RwLock<HashMap<String, Vec<AiResponseUnit>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_session(&self, session: Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).cloned())
    }

    async fn update_session(&self, session: Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&session.id) {
            return Err(StoreError::NotFound(session.id));
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn insert_transcript_unit(&self, unit: TranscriptUnit) -> Result<(), StoreError> {
        let mut units = self.units.write().await;
        units.entry(unit.session_id.clone()).or_default().push(unit);
        Ok(())
    }

    async fn list_transcript_units(
        &self,
        session_id: &str,
    ) -> Result<Vec<TranscriptUnit>, StoreError> {
        let units = self.units.read().await;
        let mut list = units.get(session_id).cloned().unwrap_or_default();
        list.sort_by(|a, b| {
            a.offset_secs
                .partial_cmp(&b.offset_secs)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(list)
    }

    async fn upsert_summary(&self, summary: RunningSummary) -> Result<(), StoreError> {
        let mut summaries = self.summaries.write().await;
        summaries.insert(summary.session_id.clone(), summary);
        Ok(())
    }

    async fn get_summary(&self, session_id: &str) -> Result<Option<RunningSummary>, StoreError> {
        let summaries = self.summaries.read().await;
        Ok(summaries.get(session_id).cloned())
    }

    async fn insert_ai_response(&self, unit: AiResponseUnit) -> Result<(), StoreError> {
        let mut responses = self.responses.write().await;
        responses
            .entry(unit.session_id.clone())
            .or_default()
            .push(unit);
        Ok(())
    }

    async fn list_ai_responses(
        &self,
        session_id: &str,
    ) -> Result<Vec<AiResponseUnit>, StoreError> {
        let responses = self.responses.read().await;
        let mut list = responses.get(session_id).cloned().unwrap_or_default();
        list.sort_by(|a, b| {
            a.offset_secs
                .partial_cmp(&b.offset_secs)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{SummaryContent, TranscriptOrigin};
    use chrono::Utc;

    fn unit(session_id: &str, offset: f64) -> TranscriptUnit {
        TranscriptUnit {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            offset_secs: offset,
            text: "text".to_string(),
            origin: TranscriptOrigin::Engine,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn update_requires_existing_session() {
        let store = MemoryStore::new();
        let session = Session::new("t", 0, Vec::new());
        assert!(matches!(
            store.update_session(session.clone()).await,
            Err(StoreError::NotFound(_))
        ));

        store.create_session(session.clone()).await.unwrap();
        assert!(store.update_session(session).await.is_ok());
    }

    #[tokio::test]
    async fn units_come_back_sorted_by_offset() {
        let store = MemoryStore::new();
        store.insert_transcript_unit(unit("s", 20.0)).await.unwrap();
        store.insert_transcript_unit(unit("s", 5.0)).await.unwrap();
        store.insert_transcript_unit(unit("s", 12.0)).await.unwrap();

        let list = store.list_transcript_units("s").await.unwrap();
        let offsets: Vec<f64> = list.iter().map(|u| u.offset_secs).collect();
        assert_eq!(offsets, vec![5.0, 12.0, 20.0]);
    }

    #[tokio::test]
    async fn summary_overwrites_wholesale_and_round_trips() {
        let store = MemoryStore::new();
        let first = RunningSummary {
            session_id: "s".to_string(),
            full_transcript: "one".to_string(),
            content: SummaryContent {
                summary: "v1".to_string(),
                key_points: vec!["old".to_string()],
                ..Default::default()
            },
            updated_at: Utc::now(),
        };
        store.upsert_summary(first).await.unwrap();

        let second = RunningSummary {
            session_id: "s".to_string(),
            full_transcript: "one two".to_string(),
            content: SummaryContent {
                summary: "v2".to_string(),
                key_points: vec!["k1".to_string(), "k2".to_string()],
                decisions: vec!["d".to_string()],
                ..Default::default()
            },
            updated_at: Utc::now(),
        };
        store.upsert_summary(second.clone()).await.unwrap();

        let read = store.get_summary("s").await.unwrap().unwrap();
        assert_eq!(read.content, second.content);
        assert_eq!(read.full_transcript, "one two");
    }
}
