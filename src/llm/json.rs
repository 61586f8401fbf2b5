//! Pulling a JSON object out of model output that may carry markdown or chatter.

use tracing::debug;

/// Extract the first complete JSON object from LLM output.
///
/// A fenced block is preferred when it holds an object. Braces inside string
/// values don't count toward nesting, so trailing prose that mentions `{` or
/// `}` is left out. Returns the trimmed input when no complete object exists;
/// the caller's parse step then reports the failure.
pub fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    let object = fenced_body(trimmed)
        .and_then(balanced_object)
        .or_else(|| balanced_object(trimmed));

    match object {
        Some(object) => object.to_string(),
        None => {
            debug!(text = trimmed, "No complete JSON object in LLM response");
            trimmed.to_string()
        }
    }
}

/// Contents of the first markdown code fence, minus an optional `json` tag.
fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let end = after.find("```")?;
    Some(after[..end].trim())
}

/// The first top-level `{ ... }` span, or `None` if it never closes.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
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
