use serde::{Deserialize, Serialize};

use super::state::{Personality, Phase, SummaryContent};

/// Messages a connected client may send over the session socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One raw audio fragment, base64-encoded.
    AudioChunk { audio: String },
    /// Flush pending audio and produce a full summary. Not a session end.
    StopRecording {},
    EnableFacilitator { duration_seconds: u32 },
    DisableFacilitator {},
}

/// Events published to every observer of a session.
///
/// Delivery is best-effort and completion-ordered; consumers needing
/// chronology must sort by the embedded elapsed-time offsets.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Transcript {
        id: String,
        text: String,
        timestamp: f64,
    },
    /// Full summary, produced at stop-recording / session end.
    SummaryComplete { summary: SummaryContent },
    /// Periodic running summary.
    PartialSummary {
        summary: SummaryContent,
        segment_count: usize,
        timestamp: f64,
    },
    FacilitatorMessage {
        message: String,
        phase: Phase,
        progress: f64,
    },
    AiResponse {
        ai_member_id: String,
        name: String,
        personality: Personality,
        response: String,
        timestamp: f64,
        response_id: String,
    },
    /// Non-fatal; the session continues.
    Error { message: String },
}
