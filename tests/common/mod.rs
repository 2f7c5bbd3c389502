// Shared test doubles for the coordinator's external collaborators.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use minutes_live::engine::{EngineError, GenerationEngine, GenerationRequest, TranscriptionEngine};
use minutes_live::{
    AiMember, AudioTranscoder, Collaborators, Config, MemoryStore, Personality, RecordStore,
    Session, SessionCoordinator, SessionEvent, TranscodeError,
};
use tokio::sync::broadcast;

/// Returns segments unchanged so tests can feed arbitrary bytes without a
/// real audio container.
pub struct PassthroughTranscoder;

impl AudioTranscoder for PassthroughTranscoder {
    fn transcode(&self, container: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        Ok(container.to_vec())
    }
}

pub struct FailingTranscoder;

impl AudioTranscoder for FailingTranscoder {
    fn transcode(&self, _container: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        Err(TranscodeError::NoTrack)
    }
}

/// Always recognizes the same text; counts calls.
pub struct FixedTranscription {
    text: String,
    calls: AtomicUsize,
}

impl FixedTranscription {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionEngine for FixedTranscription {
    async fn transcribe(&self, _wav: Vec<u8>, _language: &str) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

pub struct FailingTranscription;

#[async_trait]
impl TranscriptionEngine for FailingTranscription {
    async fn transcribe(&self, _wav: Vec<u8>, _language: &str) -> Result<String, EngineError> {
        Err(EngineError::Timeout)
    }
}

/// Pops scripted responses in order, falling back to a default; counts
/// calls.
pub struct ScriptedGeneration {
    responses: Mutex<VecDeque<Result<String, EngineError>>>,
    default: String,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl ScriptedGeneration {
    pub fn new(default: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            default: default.to_string(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn push(&self, response: Result<String, EngineError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationEngine for ScriptedGeneration {
    async fn generate(&self, request: GenerationRequest) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(self.default.clone()),
        }
    }
}

pub struct Harness {
    pub coordinator: Arc<SessionCoordinator>,
    pub generation: Arc<ScriptedGeneration>,
    pub transcription: Arc<FixedTranscription>,
    pub store: Arc<MemoryStore>,
}

pub fn member(name: &str, personality: Personality) -> AiMember {
    AiMember {
        id: format!("member-{name}"),
        name: name.to_string(),
        personality,
        active: true,
    }
}

/// Build a coordinator over test doubles. `transcript_text` is what the
/// transcription double recognizes; `generation_default` is the fallback
/// generation output.
pub async fn harness(
    mut session: Session,
    transcript_text: &str,
    generation_default: &str,
) -> Harness {
    let generation = Arc::new(ScriptedGeneration::new(generation_default));
    let transcription = Arc::new(FixedTranscription::new(transcript_text));
    let store = Arc::new(MemoryStore::new());

    session.id = format!("session-test-{}", uuid::Uuid::new_v4());
    store
        .create_session(session.clone())
        .await
        .expect("create session record");

    let collaborators = Collaborators {
        transcoder: Arc::new(PassthroughTranscoder),
        transcription: Arc::clone(&transcription) as Arc<dyn TranscriptionEngine>,
        generation: Arc::clone(&generation) as Arc<dyn GenerationEngine>,
        store: Arc::clone(&store) as Arc<dyn RecordStore>,
    };

    let coordinator = SessionCoordinator::new(session, Config::default(), collaborators);

    Harness {
        coordinator,
        generation,
        transcription,
        store,
    }
}

/// Wait for the next event, failing the test on a 2s stall.
pub async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event channel closed")
}

/// Give spawned pipeline tasks a moment, then assert no event arrived.
pub async fn assert_no_event(rx: &mut broadcast::Receiver<SessionEvent>) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    match rx.try_recv() {
        Err(broadcast::error::TryRecvError::Empty) => {}
        Ok(event) => panic!("expected no event, got {event:?}"),
        Err(e) => panic!("event channel in unexpected state: {e:?}"),
    }
}
