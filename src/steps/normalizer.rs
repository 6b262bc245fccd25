//! Response normalization — model output to canonical `StepSequence`.
//!
//! Models wrap their JSON in prose often enough that extraction is its own
//! step: find the first balanced `{...}` span, parse it, and only then look
//! at the `steps` field. Any failure along the way is an "invalid" signal
//! (`NormalizeError`); callers decide whether to fall back.

use serde_json::Value;

use super::errors::NormalizeError;
use super::fallback;
use super::types::{CognitiveLoad, RawStep, Step, StepSequence, DEFAULT_WHY};

/// Upper bound on steps kept from a model response (complex-task tier).
pub const MAX_STEPS: usize = 10;

// ─── Extraction ──────────────────────────────────────────────────────────────

/// Find the first balanced `{...}` span in free-form text.
///
/// Braces inside JSON string literals are ignored. Returns `None` when there
/// is no `{` or the first object never closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_string {
            match b {
                b'\\' => escape_next = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and parse the JSON object embedded in model output.
///
/// A span that fails to parse gets one repair pass (trailing commas, stray
/// control characters) before the failure is reported.
pub fn parse_payload(content: &str) -> Result<Value, NormalizeError> {
    let span = extract_json_object(content).ok_or(NormalizeError::NoJsonObject)?;

    match serde_json::from_str::<Value>(span) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let repaired = repair_control_characters(&repair_trailing_commas(span));
            serde_json::from_str::<Value>(&repaired).map_err(|_| NormalizeError::InvalidJson {
                reason: first_err.to_string(),
            })
        }
    }
}

/// Remove trailing commas before `}` or `]`, outside string literals.
fn repair_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut result = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            result.push(ch);
            continue;
        }
        if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        result.push(ch);
    }

    result
}

/// Drop control characters other than `\n`, `\r` and `\t`.
fn repair_control_characters(input: &str) -> String {
    input
        .chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\r' || c == '\t')
        .collect()
}

// ─── Shape coercion ──────────────────────────────────────────────────────────

/// Coerce a raw `steps` value into canonical steps.
///
/// Accepts arrays of bare strings, arrays of (partial) records, or a mix.
/// Missing `why`/`load` fields get defaults; entries without a usable action
/// are dropped. Absent, non-array, and empty input are all invalid.
pub fn normalize(raw: Option<&Value>) -> Result<StepSequence, NormalizeError> {
    let items = match raw {
        None | Some(Value::Null) => return Err(NormalizeError::MissingSteps),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(NormalizeError::NotAnArray),
    };

    let steps: Vec<Step> = items
        .iter()
        .filter_map(|item| serde_json::from_value::<RawStep>(item.clone()).ok())
        .filter_map(into_step)
        .collect();

    if steps.is_empty() {
        return Err(NormalizeError::Empty);
    }
    Ok(StepSequence::new(steps))
}

fn into_step(raw: RawStep) -> Option<Step> {
    match raw {
        RawStep::Text(action) => {
            let action = action.trim();
            (!action.is_empty()).then(|| Step::from_action(action))
        }
        RawStep::Record(record) => {
            let action = record.action.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
            let why = record
                .why
                .as_ref()
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .unwrap_or(DEFAULT_WHY);
            let load = record.load.as_ref().and_then(Value::as_str);
            Some(Step {
                action: action.to_string(),
                why: why.to_string(),
                load: CognitiveLoad::parse_or_default(load),
            })
        }
    }
}

/// Fail-closed variant of [`normalize`]: substitutes the fallback catalog
/// entry for `text` whenever the input is invalid.
pub fn normalize_or_fallback(raw: Option<&Value>, text: &str) -> StepSequence {
    match normalize(raw) {
        Ok(seq) => seq,
        Err(e) => {
            tracing::debug!(error = %e, "step normalization failed, using fallback");
            fallback::resolve(text)
        }
    }
}

/// Final checks before a sequence is returned or cached.
///
/// Drops blank actions and caps the length at [`MAX_STEPS`].
pub fn validate(seq: StepSequence) -> Result<StepSequence, NormalizeError> {
    let mut steps: Vec<Step> = seq
        .into_iter()
        .filter(|s| !s.action.trim().is_empty())
        .collect();

    if steps.is_empty() {
        return Err(NormalizeError::Empty);
    }
    if steps.len() > MAX_STEPS {
        tracing::warn!(count = steps.len(), max = MAX_STEPS, "truncating oversized step list");
        steps.truncate(MAX_STEPS);
    }
    Ok(StepSequence::new(steps))
}

/// Full path for step-mode model output: extract, parse, coerce, validate.
pub fn parse_step_response(content: &str) -> Result<StepSequence, NormalizeError> {
    let payload = parse_payload(content)?;
    let seq = normalize(payload.get("steps"))?;
    validate(seq)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
