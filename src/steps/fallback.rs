//! Keyword fallback catalog.
//!
//! Used whenever no remote resolution is available or it failed. Groups are
//! checked in declaration order and the first group with a matching keyword
//! wins, so "tired and overwhelmed" resolves to the `overwhelmed` group.

use super::types::StepSequence;

/// One keyword group and the three steps it resolves to.
struct FallbackGroup {
    name: &'static str,
    keywords: &'static [&'static str],
    actions: [&'static str; 3],
}

const GROUPS: &[FallbackGroup] = &[
    FallbackGroup {
        name: "scattered",
        keywords: &["scattered"],
        actions: ["Pick up one item.", "Put it where it belongs.", "Repeat once."],
    },
    FallbackGroup {
        name: "overwhelmed",
        keywords: &["overwhelmed"],
        actions: ["Close your eyes.", "Count to ten.", "Open your eyes."],
    },
    FallbackGroup {
        name: "tired",
        keywords: &["tired"],
        actions: ["Drink a glass of water.", "Stand up and stretch.", "Sit back down."],
    },
    FallbackGroup {
        name: "anxious",
        keywords: &["panic", "anxious"],
        actions: [
            "Sit down.",
            "Feel your feet on the floor.",
            "Take three deep breaths.",
        ],
    },
    FallbackGroup {
        name: "clean",
        keywords: &["clean", "tidy", "wash"],
        actions: ["Stand up.", "Go to the messy area.", "Pick up one piece of trash."],
    },
    FallbackGroup {
        name: "write",
        keywords: &["write", "email", "study", "type", "code"],
        actions: ["Open your device.", "Open the app.", "Type one word."],
    },
    FallbackGroup {
        name: "cook",
        keywords: &["cook", "make", "eat"],
        actions: ["Walk to the kitchen.", "Get one ingredient.", "Put it on the counter."],
    },
    FallbackGroup {
        name: "call",
        keywords: &["call", "phone", "text"],
        actions: ["Unlock your phone.", "Open the contacts app.", "Find the name."],
    },
    FallbackGroup {
        name: "exercise",
        keywords: &["exercise", "run", "walk", "gym"],
        actions: ["Stand up.", "Put on your socks.", "Put on your shoes."],
    },
    FallbackGroup {
        name: "read",
        keywords: &["read"],
        actions: [
            "Pick up the book.",
            "Open to the current page.",
            "Read the first sentence.",
        ],
    },
    FallbackGroup {
        name: "shower",
        keywords: &["shower", "bath"],
        actions: ["Walk to the bathroom.", "Turn on the water.", "Check the temperature."],
    },
    FallbackGroup {
        name: "sleep",
        keywords: &["sleep", "nap", "bed", "rest"],
        actions: ["Turn off the lights.", "Lie down.", "Close your eyes."],
    },
    FallbackGroup {
        name: "present",
        keywords: &["present", "pitch", "demo"],
        actions: ["Stand tall.", "Take a deep breath.", "Say the first sentence."],
    },
    FallbackGroup {
        name: "drink",
        keywords: &["drink", "water", "thirsty"],
        actions: ["Find a glass.", "Fill it with water.", "Take one sip."],
    },
];

const DEFAULT_ACTIONS: [&str; 3] = ["Stand up.", "Walk to the task area.", "Touch the first object."];

/// Resolve the fallback sequence for free text. Total and deterministic.
pub fn resolve(text: &str) -> StepSequence {
    let actions = match_group(text)
        .and_then(|name| GROUPS.iter().find(|g| g.name == name))
        .map(|g| g.actions)
        .unwrap_or(DEFAULT_ACTIONS);
    StepSequence::from_actions(actions)
}

/// Name of the first keyword group that matches, if any.
pub fn match_group(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    GROUPS
        .iter()
        .find(|group| group.keywords.iter().any(|kw| lower.contains(kw)))
        .map(|group| group.name)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::types::{CognitiveLoad, DEFAULT_WHY};

    #[test]
    fn tired_resolves_to_water_and_stretch() {
        let seq = resolve("I'm tired");
        assert_eq!(
            seq.actions(),
            vec!["Drink a glass of water.", "Stand up and stretch.", "Sit back down."]
        );
        for step in &seq {
            assert_eq!(step.why, DEFAULT_WHY);
            assert_eq!(step.load, CognitiveLoad::Light);
        }
    }

    #[test]
    fn unmatched_text_uses_default_sequence() {
        let seq = resolve("I can't start");
        assert_eq!(
            seq.actions(),
            vec!["Stand up.", "Walk to the task area.", "Touch the first object."]
        );
        assert_eq!(match_group("I can't start"), None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(match_group("OVERWHELMED by everything"), Some("overwhelmed"));
        assert_eq!(match_group("Need to Wash the dishes"), Some("clean"));
    }

    #[test]
    fn declaration_order_breaks_ties() {
        // "tired" and "overwhelmed" both match; overwhelmed is declared first.
        assert_eq!(match_group("tired and overwhelmed"), Some("overwhelmed"));
        // "panic" is checked before "write".
        assert_eq!(match_group("panic about writing the report"), Some("anxious"));
        // "bed" is checked after "clean".
        assert_eq!(match_group("clean under the bed"), Some("clean"));
    }

    #[test]
    fn every_entry_has_exactly_three_steps() {
        for group in GROUPS {
            let seq = resolve(group.keywords[0]);
            assert_eq!(seq.len(), 3, "group {}", group.name);
        }
        assert_eq!(resolve("").len(), 3);
    }

    #[test]
    fn resolve_is_deterministic() {
        for text in ["I'm tired", "call mom", "gym", "", "something else"] {
            assert_eq!(resolve(text), resolve(text));
        }
    }
}
