pub mod audio;
pub mod config;
pub mod engine;
pub mod http;
pub mod nats;
pub mod session;
pub mod store;

pub use audio::{AudioAccumulator, AudioTranscoder, SymphoniaTranscoder, TranscodeError};
pub use config::Config;
pub use engine::{
    build_http_client, EngineError, GenerationEngine, GenerationRequest, HttpGenerationEngine,
    HttpTranscriptionEngine, TranscriptionEngine,
};
pub use http::{create_router, AppState};
pub use nats::NatsEventMirror;
pub use session::{
    AiMember, AiResponseUnit, ClientMessage, Collaborators, Personality, Phase, RunningSummary,
    Session, SessionCoordinator, SessionEvent, SessionStatus, SummaryContent, TranscriptOrigin,
    TranscriptUnit,
};
pub use store::{MemoryStore, RecordStore, StoreError};
