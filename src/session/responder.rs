//! Trigger decision and participant selection for the reactive responder.

use rand::seq::SliceRandom;

use super::state::AiMember;

/// Throttle check, compared on elapsed-time offsets rather than wall
/// clock so replays and slow pipelines behave identically.
pub fn should_trigger(
    last_trigger_offset: Option<f64>,
    unit_offset: f64,
    min_gap_secs: f64,
) -> bool {
    match last_trigger_offset {
        None => true,
        Some(last) => unit_offset - last >= min_gap_secs,
    }
}

/// Uniform random choice among the active members.
pub fn choose_member(members: &[AiMember]) -> Option<AiMember> {
    members.choose(&mut rand::thread_rng()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::Personality;

    fn member(id: &str) -> AiMember {
        AiMember {
            id: id.to_string(),
            name: id.to_string(),
            personality: Personality::Logical,
            active: true,
        }
    }

    #[test]
    fn first_unit_always_triggers() {
        assert!(should_trigger(None, 0.0, 15.0));
    }

    #[test]
    fn gap_below_minimum_skips() {
        assert!(!should_trigger(Some(100.0), 110.0, 15.0));
    }

    #[test]
    fn gap_at_or_above_minimum_triggers() {
        assert!(should_trigger(Some(100.0), 115.0, 15.0));
        assert!(should_trigger(Some(100.0), 116.0, 15.0));
    }

    #[test]
    fn no_members_means_no_choice() {
        assert!(choose_member(&[]).is_none());
    }

    #[test]
    fn single_member_is_always_chosen() {
        let members = vec![member("m-1")];
        assert_eq!(choose_member(&members).unwrap().id, "m-1");
    }

    #[test]
    fn choice_stays_within_the_pool() {
        let members = vec![member("a"), member("b"), member("c")];
        for _ in 0..50 {
            let chosen = choose_member(&members).unwrap();
            assert!(members.iter().any(|m| m.id == chosen.id));
        }
    }
}
