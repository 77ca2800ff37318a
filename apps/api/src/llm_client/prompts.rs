// Prompt fragments shared by every evaluator prompt.
// Task-specific prompts live in evaluation/prompts.rs.

/// System prompt suffix that enforces JSON-only output.
pub const JSON_ONLY: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Every numeric field in the response is range-checked; out-of-range values
/// fail the whole evaluation instead of being clamped.
pub const RANGE_INSTRUCTION: &str = "\
    CRITICAL: Every numeric field must lie inside the range stated for it. \
    Never omit a required field; use an empty list when there is nothing to report.";

/// Renders an optional free-text field for a prompt.
pub fn or_missing(value: Option<&str>, missing: &'static str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => missing.to_string(),
    }
}

pub fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Yes",
        Some(false) => "No",
        None => "Unknown",
    }
}
