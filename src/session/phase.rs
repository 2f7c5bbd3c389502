//! Progress and phase arithmetic for the phase scheduler.

use std::time::Duration;

use super::state::Phase;
use crate::config::PhaseThresholds;

/// Fraction of the configured duration already elapsed, as a percentage
/// capped at 100. A zero duration (unbounded session) always reads 0.
pub fn progress_pct(elapsed_secs: f64, duration_secs: u32) -> f64 {
    if duration_secs == 0 {
        return 0.0;
    }
    ((elapsed_secs / duration_secs as f64) * 100.0).min(100.0)
}

/// Map a progress percentage to its phase. Deterministic and monotonic in
/// `progress`.
pub fn phase_for_progress(progress: f64, thresholds: &PhaseThresholds) -> Phase {
    if progress < thresholds.sharing_pct {
        Phase::Introduction
    } else if progress < thresholds.discussion_pct {
        Phase::Sharing
    } else if progress < thresholds.wrap_up_pct {
        Phase::Discussion
    } else {
        Phase::WrapUp
    }
}

/// Scheduler cadence: a twentieth of the session, clamped to [5s, 30s].
pub fn tick_interval(duration_secs: u32) -> Duration {
    Duration::from_secs((duration_secs as u64 / 20).clamp(5, 30))
}
