use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub engine: EngineConfig,
    pub session: SessionTuning,
    pub filter: FilterConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Connection settings for the transcription and generation engines.
///
/// Both engines speak the OpenAI-compatible wire format, so a single
/// base URL + API key pair covers them. The shared `reqwest::Client`
/// built from these settings is constructed once at startup and injected
/// everywhere, never per call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub api_key: String,
    pub transcription_model: String,
    pub generation_model: String,
    /// Language hint passed to the transcription engine.
    pub language: String,
    pub timeout_secs: u64,
}

/// Per-session timing and sizing knobs.
///
/// Defaults match the original service's fixed constants; deployments may
/// override them in the config file without any code change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Fragments accumulated before a segment is cut.
    pub audio_batch_size: usize,
    /// Segments smaller than this are dropped as noise.
    pub min_segment_bytes: usize,
    /// Cadence of the periodic summarizer.
    pub summary_interval_secs: u64,
    /// Minimum gap between reactive AI responses.
    pub response_min_gap_secs: f64,
    /// Trailing transcript window handed to the facilitator.
    pub facilitator_window_secs: f64,
    /// Trailing transcript window handed to the reactive responder.
    pub responder_window_secs: f64,
    pub phase: PhaseThresholds,
}

/// Progress percentages at which the session advances to the next phase.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
    pub sharing_pct: f64,
    pub discussion_pct: f64,
    pub wrap_up_pct: f64,
}

/// Known spurious transcription outputs, discarded on substring match.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub denylist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct NatsConfig {
    /// When set, session events are mirrored to NATS for external observers.
    pub url: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("MINUTES").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "minutes-live".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8700,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            transcription_model: "whisper-1".to_string(),
            generation_model: "gpt-4o-mini".to_string(),
            language: "ja".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            audio_batch_size: 10,
            min_segment_bytes: 1024,
            summary_interval_secs: 30,
            response_min_gap_secs: 15.0,
            facilitator_window_secs: 300.0,
            responder_window_secs: 120.0,
            phase: PhaseThresholds::default(),
        }
    }
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            sharing_pct: 10.0,
            discussion_pct: 25.0,
            wrap_up_pct: 85.0,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            denylist: vec![
                "ご視聴ありがとうございました".to_string(),
                "最後までご視聴頂き有難うございました。".to_string(),
                "字幕".to_string(),
                "チャンネル登録".to_string(),
            ],
        }
    }
}
