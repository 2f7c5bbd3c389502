//! Prompt templates for the three generation uses: running summaries,
//! phase facilitation, and AI participant reactions.

use super::generation::GenerationRequest;

const SUMMARY_SYSTEM: &str = "\
You are an expert minute-taker for meetings and debates.
From the transcript you are given, produce minutes as a single JSON object
and nothing else, in the same language as the transcript:

{
  \"summary\": \"overall summary of the discussion (2-3 sentences)\",
  \"key_points\": [\"key point 1\", \"key point 2\"],
  \"action_items\": [
    {\"task\": \"concrete task\", \"assignee\": \"name, or empty string if unknown\"}
  ],
  \"decisions\": [\"decision 1\", \"decision 2\"]
}";

const FACILITATOR_SYSTEM: &str = "\
You are a calm, concise meeting facilitator. The session just moved into a
new phase. In 2-3 sentences, in the same language as the transcript, guide
the participants into that phase: acknowledge where the discussion stands
and say what to focus on next. Address the room, not an individual.";

/// Build the wholesale summary request. The transcript is passed with
/// elapsed offsets rendered inline so the engine can reference timing.
pub fn summary_request(transcript: &str) -> GenerationRequest {
    GenerationRequest {
        system: SUMMARY_SYSTEM.to_string(),
        user: format!(
            "Create minutes from the following session transcript:\n\n{}",
            transcript
        ),
        json_output: true,
        temperature: 0.3,
        max_tokens: None,
    }
}

/// Build the facilitation request emitted on a phase transition.
pub fn facilitator_request(phase: &str, progress: f64, recent_transcript: &str) -> GenerationRequest {
    let user = if recent_transcript.is_empty() {
        format!(
            "The session is {:.0}% through its allotted time and has just \
             entered the \"{}\" phase. Nothing has been said recently.",
            progress, phase
        )
    } else {
        format!(
            "The session is {:.0}% through its allotted time and has just \
             entered the \"{}\" phase. Recent discussion:\n\n{}",
            progress, phase, recent_transcript
        )
    };

    GenerationRequest {
        system: FACILITATOR_SYSTEM.to_string(),
        user,
        json_output: false,
        temperature: 0.7,
        max_tokens: Some(300),
    }
}

/// Build a reaction request for one AI participant. The personality
/// description comes from the participant's fixed tag.
pub fn reaction_request(personality_description: &str, recent_transcript: &str) -> GenerationRequest {
    GenerationRequest {
        system: format!(
            "{} You are participating in a live discussion. React briefly \
             (2-3 sentences) to the most recent statements, in the same \
             language as the transcript.",
            personality_description
        ),
        user: format!("Recent discussion:\n\n{}", recent_transcript),
        json_output: false,
        temperature: 0.7,
        max_tokens: Some(500),
    }
}
