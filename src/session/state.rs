use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::AudioAccumulator;

/// Lifecycle status of a session record.
///
/// Deliberately decoupled from "recording has stopped": `stop_recording`
/// flushes and summarizes without touching this flag, only an explicit
/// end-of-session signal moves it to `Ended`, and it never moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended,
}

/// Coarse stage of a facilitated session's timeline.
///
/// Ordered so the coordinator can enforce forward-only transitions: once
/// `WrapUp` is reached the phase never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    None,
    Introduction,
    Sharing,
    Discussion,
    WrapUp,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::None => "none",
            Phase::Introduction => "introduction",
            Phase::Sharing => "sharing",
            Phase::Discussion => "discussion",
            Phase::WrapUp => "wrap-up",
        }
    }
}

/// Fixed personality vocabulary for AI participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Logical,
    Creative,
    Diplomatic,
    Aggressive,
}

impl Personality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Logical => "logical",
            Personality::Creative => "creative",
            Personality::Diplomatic => "diplomatic",
            Personality::Aggressive => "aggressive",
        }
    }

    /// Fixed persona text fed to the generation engine.
    pub fn description(&self) -> &'static str {
        match self {
            Personality::Logical => {
                "You are a logical, analytical debater. You point out \
                 contradictions in what was said and argue from data and \
                 concrete examples."
            }
            Personality::Creative => {
                "You are a creative debater. You offer unconventional \
                 perspectives and new possibilities the discussion has not \
                 considered."
            }
            Personality::Diplomatic => {
                "You are a diplomatic debater. You respect the speakers' \
                 views, acknowledge their strong points, and gently present \
                 a different way of seeing things."
            }
            Personality::Aggressive => {
                "You are an aggressive debater. You sharply point out \
                 inaccuracies, missing evidence, and inconsistencies in what \
                 was said."
            }
        }
    }
}

/// A configured synthetic participant that can generate reactive commentary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMember {
    pub id: String,
    pub name: String,
    pub personality: Personality,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptOrigin {
    Engine,
    Manual,
}

/// One timestamped piece of recognized (or manually entered) speech text.
///
/// `offset_secs` is the sort key for every downstream read; units are not
/// required to arrive in offset order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptUnit {
    pub id: String,
    pub session_id: String,
    pub offset_secs: f64,
    pub text: String,
    pub origin: TranscriptOrigin,
    pub created_at: DateTime<Utc>,
}

/// The JSON shape the generation engine is asked to produce for minutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryContent {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    #[serde(default)]
    pub decisions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub task: String,
    #[serde(default)]
    pub assignee: Option<String>,
}

/// At most one per session, regenerated wholesale on every pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningSummary {
    pub session_id: String,
    pub full_transcript: String,
    #[serde(flatten)]
    pub content: SummaryContent,
    pub updated_at: DateTime<Utc>,
}

/// One generated commentary turn from an AI participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponseUnit {
    pub id: String,
    pub session_id: String,
    pub member_id: String,
    pub offset_secs: f64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// The session record as stored and served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Configured total duration in seconds, 0 = unbounded.
    pub duration_secs: u32,
    pub status: SessionStatus,
    pub phase: Phase,
    /// Set exactly once, on first audio activity or explicit start.
    pub started_at: Option<DateTime<Utc>>,
    pub facilitation_enabled: bool,
    pub ai_members: Vec<AiMember>,
}

impl Session {
    pub fn new(title: impl Into<String>, duration_secs: u32, ai_members: Vec<AiMember>) -> Self {
        Self {
            id: format!("session-{}", uuid::Uuid::new_v4()),
            title: title.into(),
            created_at: Utc::now(),
            duration_secs,
            status: SessionStatus::Active,
            phase: Phase::None,
            started_at: None,
            facilitation_enabled: false,
            ai_members,
        }
    }
}

/// The authoritative in-memory record of one live session, exclusively
/// owned by its coordinator behind a single mutex.
pub struct SessionState {
    pub session: Session,
    pub units: Vec<TranscriptUnit>,
    pub responses: Vec<AiResponseUnit>,
    /// Offset of the last reactive-responder trigger, for the throttle.
    pub last_response_trigger: Option<f64>,
    pub accumulator: AudioAccumulator,
}

impl SessionState {
    pub fn new(session: Session, accumulator: AudioAccumulator) -> Self {
        Self {
            session,
            units: Vec::new(),
            responses: Vec::new(),
            last_response_trigger: None,
            accumulator,
        }
    }

    /// Record the start instant. Idempotent: only the first call wins.
    pub fn mark_started(&mut self, now: DateTime<Utc>) -> bool {
        if self.session.started_at.is_some() {
            return false;
        }
        self.session.started_at = Some(now);
        true
    }

    /// Seconds since the start instant, 0.0 before any audio activity.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> f64 {
        match self.session.started_at {
            Some(started) => {
                (now.signed_duration_since(started).num_milliseconds() as f64 / 1000.0).max(0.0)
            }
            None => 0.0,
        }
    }

    /// Advance the phase. Returns false (and leaves state untouched) for
    /// anything but a forward move.
    pub fn advance_phase(&mut self, target: Phase) -> bool {
        if target <= self.session.phase {
            return false;
        }
        self.session.phase = target;
        true
    }

    /// All units ordered by elapsed-time offset, the only ordering
    /// downstream consumers may rely on.
    pub fn units_sorted(&self) -> Vec<TranscriptUnit> {
        let mut units = self.units.clone();
        units.sort_by(|a, b| {
            a.offset_secs
                .partial_cmp(&b.offset_secs)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        units
    }

    /// Units within the trailing window ending at `until_offset`.
    pub fn window(&self, until_offset: f64, window_secs: f64) -> Vec<TranscriptUnit> {
        let from = until_offset - window_secs;
        let mut units: Vec<TranscriptUnit> = self
            .units
            .iter()
            .filter(|u| u.offset_secs >= from && u.offset_secs <= until_offset)
            .cloned()
            .collect();
        units.sort_by(|a, b| {
            a.offset_secs
                .partial_cmp(&b.offset_secs)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        units
    }

    pub fn active_members(&self) -> Vec<AiMember> {
        self.session
            .ai_members
            .iter()
            .filter(|m| m.active)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SessionState {
        SessionState::new(
            Session::new("test", 600, Vec::new()),
            AudioAccumulator::new(10, 1024),
        )
    }

    fn unit(offset: f64) -> TranscriptUnit {
        TranscriptUnit {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: "session-x".to_string(),
            offset_secs: offset,
            text: format!("at {offset}"),
            origin: TranscriptOrigin::Engine,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn start_instant_set_exactly_once() {
        let mut st = state();
        let first = Utc::now();
        assert!(st.mark_started(first));
        assert!(!st.mark_started(first + chrono::Duration::seconds(10)));
        assert_eq!(st.session.started_at, Some(first));
    }

    #[test]
    fn phase_never_regresses() {
        let mut st = state();
        assert!(st.advance_phase(Phase::Sharing));
        assert!(!st.advance_phase(Phase::Introduction));
        assert!(!st.advance_phase(Phase::Sharing));
        assert!(st.advance_phase(Phase::WrapUp));
        assert!(!st.advance_phase(Phase::Discussion));
        assert_eq!(st.session.phase, Phase::WrapUp);
    }

    #[test]
    fn units_sorted_by_offset_not_arrival() {
        let mut st = state();
        st.units.push(unit(30.0));
        st.units.push(unit(10.0));
        st.units.push(unit(20.0));
        let sorted = st.units_sorted();
        let offsets: Vec<f64> = sorted.iter().map(|u| u.offset_secs).collect();
        assert_eq!(offsets, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn window_keeps_only_trailing_units() {
        let mut st = state();
        st.units.push(unit(5.0));
        st.units.push(unit(100.0));
        st.units.push(unit(170.0));
        let window = st.window(180.0, 120.0);
        let offsets: Vec<f64> = window.iter().map(|u| u.offset_secs).collect();
        assert_eq!(offsets, vec![100.0, 170.0]);
    }

    #[test]
    fn phase_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Phase::WrapUp).unwrap(),
            "\"wrap-up\""
        );
        assert_eq!(serde_json::to_string(&Phase::None).unwrap(), "\"none\"");
    }

    #[test]
    fn summary_content_round_trips() {
        let content = SummaryContent {
            summary: "short".to_string(),
            key_points: vec!["a".to_string(), "b".to_string()],
            action_items: vec![ActionItem {
                task: "do it".to_string(),
                assignee: Some("alice".to_string()),
            }],
            decisions: vec!["ship".to_string()],
        };
        let json = serde_json::to_string(&content).unwrap();
        let back: SummaryContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, content);
    }
}
