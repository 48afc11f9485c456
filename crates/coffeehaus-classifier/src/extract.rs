//! Pulls the JSON object out of a model reply.
//!
//! Models sometimes wrap the object in a Markdown code fence or a sentence
//! of prose even when told not to.

use std::sync::LazyLock;

use regex::Regex;

static FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("valid fenced json regex")
});

/// Returns the JSON object text inside `reply`.
///
/// Tries, in order: the whole reply, a fenced block, the span from the first
/// `{` to the last `}`. Falls back to the trimmed reply so the caller's parse
/// error shows what was received.
pub(crate) fn json_object(reply: &str) -> &str {
    let trimmed = reply.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return trimmed;
    }

    if let Some(m) = FENCED.captures(trimmed).and_then(|c| c.get(1)) {
        return m.as_str();
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::json_object;

    #[test]
    fn bare_object_is_returned_as_is() {
        assert_eq!(json_object("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn fenced_object_is_unwrapped() {
        let reply = "```json\n{\"searchType\": \"area\"}\n```";
        assert_eq!(json_object(reply), "{\"searchType\": \"area\"}");
    }

    #[test]
    fn object_inside_prose_is_found() {
        let reply = "Here is the analysis: {\"searchType\": \"proximity\"} Hope it helps.";
        assert_eq!(json_object(reply), "{\"searchType\": \"proximity\"}");
    }

    #[test]
    fn reply_without_object_is_returned_trimmed() {
        assert_eq!(json_object("  sorry, I can't  "), "sorry, I can't");
    }
}
