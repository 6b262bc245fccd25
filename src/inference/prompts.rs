//! Prompt construction for step mode and decision mode.
//!
//! Each request is single-turn: one system instruction, one user message.

use crate::steps::{Preferences, TextLength};

use super::types::ChatMessage;

/// System instruction for step mode.
pub const STEP_SYSTEM_PROMPT: &str = r#"You are an occupational therapist helping a person with executive dysfunction (ADHD, dyslexia) get past task paralysis.
Break ANY input into a sequence of atomic, physical micro-steps.

STEP COUNT BY COMPLEXITY:
- SIMPLE tasks (e.g. "Drink water", "Sit down"): 2-3 steps.
- MEDIUM tasks (e.g. "Send an email", "Wash dishes"): 4-6 steps.
- COMPLEX tasks (e.g. "Clean room", "Study for exam", "Write essay"): 7-10 steps.

PHYSICAL ACTIONS ONLY:
- Never use abstract verbs such as "Plan", "Think", "Decide".
- Use physical verbs such as "Open", "Touch", "Walk", "Type", "Grab".
- Every step must be doable right now.
- If the input is an object, the steps interact with it. If it is a question, the steps find the answer physically.

FOR EACH STEP:
- "why": one short sentence on how the step lowers friction or grounds the person.
- "load": the cognitive effort, exactly one of "Very Light", "Light", "Moderate". Never a number.

RULES:
1. Output strictly valid JSON. No markdown, no conversational filler.
2. At most 6 words per step action.
3. Tone: calm, direct, encouraging.

Format: {"steps": [{"action": "...", "why": "...", "load": "Light"}]}"#;

/// System instruction for decision mode.
pub const DECISION_SYSTEM_PROMPT: &str = r#"You are a decisive helper. Pick exactly one of the two options, preferring whichever is healthier or easier to start.
Return only JSON: {"answer": "<the chosen option text>", "reason": "Short reason why.", "steps": ["Step 1", "Step 2", "Step 3"]}
IMPORTANT: "answer" must repeat the chosen option's text exactly as written. Never answer "Option A" or "Option B".
"steps" must contain exactly 3 short physical actions to begin the chosen option."#;

/// Build the messages for a step-mode request.
pub fn step_messages(user_text: &str, prefs: &Preferences) -> Vec<ChatMessage> {
    let mut user = format!(
        "Task: \"{}\". Break this down into physical micro-steps based on its complexity \
         (Simple=2-3, Medium=4-6, Complex=7-10). Preferences: Tone {}.",
        user_text.trim(),
        prefs.tone_label()
    );
    if prefs.text_length == TextLength::Short {
        user.push_str(" Keep every \"why\" under 8 words.");
    }
    let needs = prefs.support_needs.trim();
    if !needs.is_empty() {
        user.push_str(&format!(" Support needs: {needs}."));
    }

    vec![ChatMessage::system(STEP_SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Build the messages for a decision-mode request.
pub fn decision_messages(option_a: &str, option_b: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(DECISION_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Option A: {}. Option B: {}.",
            option_a.trim(),
            option_b.trim()
        )),
    ]
}
