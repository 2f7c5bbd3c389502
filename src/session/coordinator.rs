use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use base64::Engine as _;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::events::{ClientMessage, SessionEvent};
use super::phase;
use super::responder;
use super::state::{
    AiResponseUnit, Session, SessionState, SessionStatus, TranscriptOrigin, TranscriptUnit,
};
use super::summarizer;
use crate::audio::{AudioAccumulator, AudioTranscoder};
use crate::config::Config;
use crate::engine::{prompt, GenerationEngine, TranscriptionEngine};
use crate::store::RecordStore;

/// The external collaborators one coordinator drives. All long-latency;
/// all behind traits so tests can substitute doubles.
#[derive(Clone)]
pub struct Collaborators {
    pub transcoder: Arc<dyn AudioTranscoder>,
    pub transcription: Arc<dyn TranscriptionEngine>,
    pub generation: Arc<dyn GenerationEngine>,
    pub store: Arc<dyn RecordStore>,
}

/// Owns one live session: its state, its background activities, and its
/// observer channel.
///
/// Every mutation of session state goes through the single `state` mutex,
/// so concurrent activities never interleave inconsistently. Engine and
/// transcoder calls always run outside that critical section against a
/// snapshot, and their results are discarded if the session has ended by
/// the time they try to land.
pub struct SessionCoordinator {
    session_id: String,
    config: Config,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    collaborators: Collaborators,
    observers: AtomicUsize,
    phase_task: Mutex<Option<JoinHandle<()>>>,
    summary_task: Mutex<Option<JoinHandle<()>>>,
    /// Self-handle for spawning background tasks from `&self` methods.
    weak: Weak<SessionCoordinator>,
}

impl SessionCoordinator {
    pub fn new(session: Session, config: Config, collaborators: Collaborators) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let accumulator = AudioAccumulator::new(
            config.session.audio_batch_size,
            config.session.min_segment_bytes,
        );

        Arc::new_cyclic(|weak| Self {
            session_id: session.id.clone(),
            config,
            state: Mutex::new(SessionState::new(session, accumulator)),
            events,
            collaborators,
            observers: AtomicUsize::new(0),
            phase_task: Mutex::new(None),
            summary_task: Mutex::new(None),
            weak: weak.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn session_snapshot(&self) -> Session {
        self.state.lock().await.session.clone()
    }

    pub async fn transcript_snapshot(&self) -> Vec<TranscriptUnit> {
        self.state.lock().await.units_sorted()
    }

    fn publish(&self, event: SessionEvent) {
        // Best-effort: a send error just means nobody is listening right now.
        let _ = self.events.send(event);
    }

    fn publish_error(&self, message: impl Into<String>) {
        self.publish(SessionEvent::Error {
            message: message.into(),
        });
    }

    // ------------------------------------------------------------------
    // Inbound messages
    // ------------------------------------------------------------------

    pub async fn handle_message(&self, message: ClientMessage) {
        match message {
            ClientMessage::AudioChunk { audio } => {
                match base64::engine::general_purpose::STANDARD.decode(audio.trim()) {
                    Ok(bytes) if !bytes.is_empty() => self.handle_audio(bytes).await,
                    Ok(_) => self.publish_error("empty audio fragment"),
                    Err(_) => self.publish_error("audio fragment was not valid base64"),
                }
            }
            ClientMessage::StopRecording {} => self.stop_recording().await,
            ClientMessage::EnableFacilitator { duration_seconds } => {
                self.enable_facilitator(duration_seconds).await
            }
            ClientMessage::DisableFacilitator {} => self.disable_facilitator().await,
        }
    }

    /// Feed one raw audio fragment into the accumulator. If a segment is
    /// ready, transcription runs in its own task so the inbound loop never
    /// waits on the engine.
    pub async fn handle_audio(&self, fragment: Vec<u8>) {
        let segment = {
            let mut st = self.state.lock().await;
            if st.session.status == SessionStatus::Ended {
                self.publish_error("session has ended");
                return;
            }
            self.start_if_needed(&mut st).await;
            st.accumulator.submit(&fragment)
        };

        if let Some(segment) = segment {
            let Some(this) = self.weak.upgrade() else {
                return;
            };
            tokio::spawn(async move {
                this.process_segment(segment).await;
            });
        }
    }

    /// Record a manually entered transcript unit. Accepted even after the
    /// session has ended; "recording has stopped" and "no more input" are
    /// separate decisions here.
    pub async fn add_manual_transcript(
        &self,
        text: String,
        offset: Option<f64>,
    ) -> Option<TranscriptUnit> {
        let text = text.trim().to_string();
        if text.is_empty() {
            self.publish_error("transcript text must not be empty");
            return None;
        }

        let unit = self
            .record_transcript(text, TranscriptOrigin::Manual, offset)
            .await?;
        self.maybe_respond(unit.offset_secs).await;
        Some(unit)
    }

    /// Explicit idle-to-active start, for clients that want the clock
    /// running before the first audio arrives.
    pub async fn start(&self) {
        let mut st = self.state.lock().await;
        if st.session.status == SessionStatus::Ended {
            return;
        }
        self.start_if_needed(&mut st).await;
    }

    /// Flush pending audio and produce a full summary. Leaves the session
    /// status untouched: stopping the recording is not ending the session.
    pub async fn stop_recording(&self) {
        info!("Stop recording requested for {}", self.session_id);
        self.flush_pending_audio().await;
        self.run_summary_pass(true).await;
    }

    /// Explicit end-of-session: flush, final summary, cancel background
    /// work, then mark the record ended. The status flip is permanent.
    pub async fn end(&self) {
        {
            let st = self.state.lock().await;
            if st.session.status == SessionStatus::Ended {
                return;
            }
        }

        info!("Ending session {}", self.session_id);

        self.flush_pending_audio().await;
        self.run_summary_pass(true).await;
        self.cancel_background().await;

        let mut st = self.state.lock().await;
        st.session.status = SessionStatus::Ended;
        if let Err(e) = self.collaborators.store.update_session(st.session.clone()).await {
            warn!("Failed to persist ended status for {}: {}", self.session_id, e);
        }
    }

    pub async fn enable_facilitator(&self, duration_seconds: u32) {
        let spawn_duration = {
            let mut st = self.state.lock().await;
            if st.session.status == SessionStatus::Ended {
                return;
            }
            st.session.facilitation_enabled = true;
            if duration_seconds > 0 {
                st.session.duration_secs = duration_seconds;
            }
            if let Err(e) = self.collaborators.store.update_session(st.session.clone()).await {
                warn!("Failed to persist facilitation for {}: {}", self.session_id, e);
            }
            if st.session.started_at.is_some() && st.session.duration_secs > 0 {
                Some(st.session.duration_secs)
            } else {
                None
            }
        };

        info!(
            "Facilitation enabled for {} (duration {}s)",
            self.session_id, duration_seconds
        );

        if let Some(duration) = spawn_duration {
            self.spawn_phase_loop(duration).await;
        }
    }

    pub async fn disable_facilitator(&self) {
        {
            let mut st = self.state.lock().await;
            st.session.facilitation_enabled = false;
            if let Err(e) = self.collaborators.store.update_session(st.session.clone()).await {
                warn!("Failed to persist facilitation for {}: {}", self.session_id, e);
            }
        }

        let mut guard = self.phase_task.lock().await;
        if let Some(task) = guard.take() {
            task.abort();
        }

        info!("Facilitation disabled for {}", self.session_id);
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register an attached observer. Restarts background loops if an
    /// earlier full detach stopped them on a still-running session.
    pub async fn observer_attached(&self) {
        self.observers.fetch_add(1, Ordering::SeqCst);

        let (started, facilitated) = {
            let st = self.state.lock().await;
            let running =
                st.session.started_at.is_some() && st.session.status != SessionStatus::Ended;
            (
                running,
                running && st.session.facilitation_enabled && st.session.duration_secs > 0,
            )
        };

        if started {
            self.spawn_summary_loop().await;
        }
        if facilitated {
            let duration = self.state.lock().await.session.duration_secs;
            self.spawn_phase_loop(duration).await;
        }
    }

    /// Deregister an observer. When the last one goes, background work
    /// stops; session data stays and the status flag is untouched.
    pub async fn observer_detached(&self) {
        let previous = self.observers.fetch_sub(1, Ordering::SeqCst);
        if previous <= 1 {
            info!(
                "Last observer detached from {}; stopping background work",
                self.session_id
            );
            self.cancel_background().await;
        }
    }

    // ------------------------------------------------------------------
    // Transcription pipeline
    // ------------------------------------------------------------------

    async fn process_segment(&self, segment: Vec<u8>) {
        if let Some(text) = self.transcribe_segment(segment).await {
            if let Some(unit) = self
                .record_transcript(text, TranscriptOrigin::Engine, None)
                .await
            {
                self.maybe_respond(unit.offset_secs).await;
            }
        }
    }

    /// Segment bytes to recognized text: transcode, engine call, denylist
    /// filter. Every failure collapses to `None`; none is session-fatal.
    async fn transcribe_segment(&self, segment: Vec<u8>) -> Option<String> {
        let transcoder = Arc::clone(&self.collaborators.transcoder);
        let wav = match tokio::task::spawn_blocking(move || transcoder.transcode(&segment)).await {
            Ok(Ok(wav)) => wav,
            Ok(Err(e)) => {
                warn!("Audio transcode failed for {}: {}", self.session_id, e);
                self.publish_error(format!("audio processing failed: {e}"));
                return None;
            }
            Err(e) => {
                error!("Transcode task failed for {}: {}", self.session_id, e);
                return None;
            }
        };

        let text = match self
            .collaborators
            .transcription
            .transcribe(wav, &self.config.engine.language)
            .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Transcription failed for {}: {}", self.session_id, e);
                return None;
            }
        };

        if text.is_empty() {
            return None;
        }

        // Known spurious outputs are dropped silently, not surfaced as errors.
        if self
            .config
            .filter
            .denylist
            .iter()
            .any(|phrase| text.contains(phrase))
        {
            info!(
                "Discarding denylisted transcription output for {}",
                self.session_id
            );
            return None;
        }

        Some(text)
    }

    async fn record_transcript(
        &self,
        text: String,
        origin: TranscriptOrigin,
        offset: Option<f64>,
    ) -> Option<TranscriptUnit> {
        let unit = {
            let mut st = self.state.lock().await;
            // An in-flight engine result loses the race with session end.
            if origin == TranscriptOrigin::Engine && st.session.status == SessionStatus::Ended {
                return None;
            }

            let now = Utc::now();
            let unit = TranscriptUnit {
                id: format!("transcript-{}", uuid::Uuid::new_v4()),
                session_id: st.session.id.clone(),
                offset_secs: offset.unwrap_or_else(|| st.elapsed_secs(now)),
                text,
                origin,
                created_at: now,
            };
            st.units.push(unit.clone());

            if let Err(e) = self
                .collaborators
                .store
                .insert_transcript_unit(unit.clone())
                .await
            {
                warn!("Failed to persist transcript for {}: {}", self.session_id, e);
            }

            unit
        };

        self.publish(SessionEvent::Transcript {
            id: unit.id.clone(),
            text: unit.text.clone(),
            timestamp: unit.offset_secs,
        });

        Some(unit)
    }

    async fn flush_pending_audio(&self) {
        let segment = { self.state.lock().await.accumulator.flush() };
        let Some(segment) = segment else { return };

        if let Some(text) = self.transcribe_segment(segment).await {
            if let Some(unit) = self
                .record_transcript(text, TranscriptOrigin::Engine, None)
                .await
            {
                self.maybe_respond(unit.offset_secs).await;
            }
        }
    }

    // ------------------------------------------------------------------
    // Reactive responder
    // ------------------------------------------------------------------

    /// Possibly produce one AI commentary turn for the unit recorded at
    /// `trigger_offset`. Throttled; failures are silent misses.
    pub async fn maybe_respond(&self, trigger_offset: f64) {
        let (member, window) = {
            let mut st = self.state.lock().await;
            if st.session.status == SessionStatus::Ended {
                return;
            }
            let members = st.active_members();
            if members.is_empty() {
                return;
            }
            if !responder::should_trigger(
                st.last_response_trigger,
                trigger_offset,
                self.config.session.response_min_gap_secs,
            ) {
                return;
            }
            st.last_response_trigger = Some(trigger_offset);

            let Some(member) = responder::choose_member(&members) else {
                return;
            };
            let window = st.window(trigger_offset, self.config.session.responder_window_secs);
            (member, window)
        };

        let rendered = summarizer::render_transcript(&window);
        let request = prompt::reaction_request(member.personality.description(), &rendered);

        let response = match self.collaborators.generation.generate(request).await {
            Ok(response) if !response.trim().is_empty() => response.trim().to_string(),
            Ok(_) => return,
            Err(e) => {
                warn!("AI response generation failed for {}: {}", self.session_id, e);
                return;
            }
        };

        let unit = {
            let mut st = self.state.lock().await;
            if st.session.status == SessionStatus::Ended {
                return;
            }
            let now = Utc::now();
            let unit = AiResponseUnit {
                id: format!("response-{}", uuid::Uuid::new_v4()),
                session_id: st.session.id.clone(),
                member_id: member.id.clone(),
                offset_secs: st.elapsed_secs(now),
                text: response,
                created_at: now,
            };
            st.responses.push(unit.clone());

            if let Err(e) = self
                .collaborators
                .store
                .insert_ai_response(unit.clone())
                .await
            {
                warn!("Failed to persist AI response for {}: {}", self.session_id, e);
            }

            unit
        };

        self.publish(SessionEvent::AiResponse {
            ai_member_id: member.id,
            name: member.name,
            personality: member.personality,
            response: unit.text.clone(),
            timestamp: unit.offset_secs,
            response_id: unit.id,
        });
    }

    // ------------------------------------------------------------------
    // Summarization
    // ------------------------------------------------------------------

    /// One summarization pass. Periodic passes skip quietly below the unit
    /// minimum and on any failure; the final pass reports problems and
    /// falls back to a degraded summary rather than staying silent.
    pub async fn run_summary_pass(&self, final_pass: bool) {
        let (units, elapsed) = {
            let st = self.state.lock().await;
            if !final_pass && st.session.status == SessionStatus::Ended {
                return;
            }
            (st.units_sorted(), st.elapsed_secs(Utc::now()))
        };

        if !final_pass && units.len() < summarizer::MIN_UNITS_FOR_SUMMARY {
            return;
        }

        let full_text = summarizer::render_transcript(&units);
        if full_text.is_empty() {
            if final_pass {
                self.publish_error("no transcript data to summarize");
            }
            return;
        }

        let request = prompt::summary_request(&full_text);
        let raw = match self.collaborators.generation.generate(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Summary generation failed for {}: {}", self.session_id, e);
                if final_pass {
                    self.publish_error(format!("summary generation failed: {e}"));
                }
                return;
            }
        };

        let content = match summarizer::parse_summary(&raw) {
            Some(content) => content,
            None if final_pass => {
                warn!(
                    "Unparseable final summary for {}; using degraded fallback",
                    self.session_id
                );
                summarizer::fallback_summary(&full_text)
            }
            None => {
                warn!("Discarding unparseable summary for {}", self.session_id);
                return;
            }
        };

        if !final_pass {
            let st = self.state.lock().await;
            if st.session.status == SessionStatus::Ended {
                return;
            }
        }

        let summary = crate::session::state::RunningSummary {
            session_id: self.session_id.clone(),
            full_transcript: full_text,
            content: content.clone(),
            updated_at: Utc::now(),
        };
        if let Err(e) = self.collaborators.store.upsert_summary(summary).await {
            warn!("Failed to persist summary for {}: {}", self.session_id, e);
        }

        if final_pass {
            self.publish(SessionEvent::SummaryComplete { summary: content });
        } else {
            self.publish(SessionEvent::PartialSummary {
                summary: content,
                segment_count: units.len(),
                timestamp: elapsed,
            });
        }
    }

    // ------------------------------------------------------------------
    // Phase scheduling
    // ------------------------------------------------------------------

    /// One phase-scheduler tick at the given elapsed time. Split from the
    /// timer loop so the transition logic is directly drivable.
    pub async fn phase_tick_at(&self, elapsed_secs: f64) {
        let transition = {
            let mut st = self.state.lock().await;
            if st.session.status == SessionStatus::Ended
                || !st.session.facilitation_enabled
                || st.session.duration_secs == 0
            {
                None
            } else {
                let progress = phase::progress_pct(elapsed_secs, st.session.duration_secs);
                let target = phase::phase_for_progress(progress, &self.config.session.phase);
                if st.advance_phase(target) {
                    if let Err(e) = self
                        .collaborators
                        .store
                        .update_session(st.session.clone())
                        .await
                    {
                        warn!("Failed to persist phase for {}: {}", self.session_id, e);
                    }
                    let window =
                        st.window(elapsed_secs, self.config.session.facilitator_window_secs);
                    Some((target, progress, window))
                } else {
                    None
                }
            }
        };

        let Some((new_phase, progress, window)) = transition else {
            return;
        };

        info!(
            "Session {} entered phase {} at {:.1}%",
            self.session_id,
            new_phase.as_str(),
            progress
        );

        let rendered = summarizer::render_transcript(&window);
        let request = prompt::facilitator_request(new_phase.as_str(), progress, &rendered);

        match self.collaborators.generation.generate(request).await {
            Ok(message) => {
                {
                    let st = self.state.lock().await;
                    if st.session.status == SessionStatus::Ended {
                        return;
                    }
                }
                self.publish(SessionEvent::FacilitatorMessage {
                    message,
                    phase: new_phase,
                    progress,
                });
            }
            // No retry: the next tick or transition is the recovery point.
            Err(e) => warn!(
                "Facilitation generation failed for {}: {}",
                self.session_id, e
            ),
        }
    }

    // ------------------------------------------------------------------
    // Background loops
    // ------------------------------------------------------------------

    /// Idempotent idle-to-active transition; spawns the background loops
    /// on the first call. Caller holds the state lock.
    async fn start_if_needed(&self, st: &mut SessionState) {
        if !st.mark_started(Utc::now()) {
            return;
        }

        info!("Session {} started", self.session_id);

        if let Err(e) = self.collaborators.store.update_session(st.session.clone()).await {
            warn!("Failed to persist start for {}: {}", self.session_id, e);
        }

        self.spawn_summary_loop().await;
        if st.session.facilitation_enabled && st.session.duration_secs > 0 {
            self.spawn_phase_loop(st.session.duration_secs).await;
        }
    }

    async fn spawn_summary_loop(&self) {
        let mut guard = self.summary_task.lock().await;
        if guard.as_ref().map(|t| !t.is_finished()).unwrap_or(false) {
            return;
        }

        let Some(this) = self.weak.upgrade() else {
            return;
        };
        let period = std::time::Duration::from_secs(self.config.session.summary_interval_secs);
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The immediate first tick would summarize an empty session.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                this.run_summary_pass(false).await;
            }
        }));
    }

    async fn spawn_phase_loop(&self, duration_secs: u32) {
        let mut guard = self.phase_task.lock().await;
        if guard.as_ref().map(|t| !t.is_finished()).unwrap_or(false) {
            return;
        }

        let Some(this) = self.weak.upgrade() else {
            return;
        };
        let period = phase::tick_interval(duration_secs);
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let elapsed = {
                    let st = this.state.lock().await;
                    st.elapsed_secs(Utc::now())
                };
                this.phase_tick_at(elapsed).await;
            }
        }));
    }

    /// Stop both background loops. In-flight engine calls they issued are
    /// left to finish; their results are discarded at the mutation gate.
    pub async fn cancel_background(&self) {
        {
            let mut guard = self.phase_task.lock().await;
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
        {
            let mut guard = self.summary_task.lock().await;
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}
