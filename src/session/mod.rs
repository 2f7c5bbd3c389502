//! Live session coordination
//!
//! This module owns everything that happens while a session is running:
//! - The authoritative per-session state and its data model
//! - The coordinator that serializes all mutations to that state
//! - Phase scheduling, periodic summarization, and reactive AI responses
//! - The event types published to session observers

pub mod coordinator;
pub mod events;
pub mod phase;
pub mod responder;
pub mod state;
pub mod summarizer;

pub use coordinator::{Collaborators, SessionCoordinator};
pub use events::{ClientMessage, SessionEvent};
pub use state::{
    ActionItem, AiMember, AiResponseUnit, Personality, Phase, RunningSummary, Session,
    SessionState, SessionStatus, SummaryContent, TranscriptOrigin, TranscriptUnit,
};
