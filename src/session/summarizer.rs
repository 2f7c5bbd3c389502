//! Transcript rendering and summary parsing for the periodic summarizer
//! and the final summarization pass.

use super::state::{SummaryContent, TranscriptUnit};

/// Minimum number of transcript units before a summarization pass runs.
pub const MIN_UNITS_FOR_SUMMARY: usize = 2;

/// Render units (already sorted by offset) with the elapsed offset inline,
/// the form the summary prompt expects.
pub fn render_transcript(units: &[TranscriptUnit]) -> String {
    units
        .iter()
        .map(|u| format!("[{:.1}s] {}", u.offset_secs, u.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pull the outermost JSON object out of an engine response that may be
/// wrapped in prose or code fences.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Parse the engine's JSON-shaped summary. `None` on any mismatch; the
/// caller decides whether to skip the tick or fall back.
pub fn parse_summary(raw: &str) -> Option<SummaryContent> {
    let json = extract_json_object(raw)?;
    serde_json::from_str(json).ok()
}

/// Degraded summary used when the final pass cannot parse the engine
/// output: the raw transcript stands in for the key points.
pub fn fallback_summary(full_text: &str) -> SummaryContent {
    let excerpt = if full_text.chars().count() > 200 {
        let truncated: String = full_text.chars().take(200).collect();
        format!("{truncated}...")
    } else {
        full_text.to_string()
    };

    SummaryContent {
        summary: "Automatic minutes generation failed.".to_string(),
        key_points: vec![excerpt],
        action_items: Vec::new(),
        decisions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::TranscriptOrigin;
    use chrono::Utc;

    fn unit(offset: f64, text: &str) -> TranscriptUnit {
        TranscriptUnit {
            id: "t".to_string(),
            session_id: "s".to_string(),
            offset_secs: offset,
            text: text.to_string(),
            origin: TranscriptOrigin::Engine,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn transcript_renders_offsets_inline() {
        let rendered = render_transcript(&[unit(0.0, "first"), unit(12.34, "second")]);
        assert_eq!(rendered, "[0.0s] first\n[12.3s] second");
    }

    #[test]
    fn parses_clean_json() {
        let raw = r#"{"summary":"s","key_points":["k"],"action_items":[],"decisions":[]}"#;
        let parsed = parse_summary(raw).unwrap();
        assert_eq!(parsed.summary, "s");
        assert_eq!(parsed.key_points, vec!["k"]);
    }

    #[test]
    fn parses_json_wrapped_in_fences() {
        let raw = "```json\n{\"summary\":\"s\",\"key_points\":[]}\n```";
        let parsed = parse_summary(raw).unwrap();
        assert_eq!(parsed.summary, "s");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let parsed = parse_summary(r#"{"summary":"only"}"#).unwrap();
        assert!(parsed.key_points.is_empty());
        assert!(parsed.action_items.is_empty());
        assert!(parsed.decisions.is_empty());
    }

    #[test]
    fn garbage_yields_none() {
        assert!(parse_summary("not json at all").is_none());
        assert!(parse_summary("}{").is_none());
    }

    #[test]
    fn fallback_truncates_long_transcripts_by_chars() {
        let long: String = "あ".repeat(500);
        let fb = fallback_summary(&long);
        assert_eq!(fb.key_points.len(), 1);
        assert!(fb.key_points[0].ends_with("..."));
        assert_eq!(fb.key_points[0].chars().count(), 203);

        let short = fallback_summary("brief");
        assert_eq!(short.key_points, vec!["brief"]);
    }
}
