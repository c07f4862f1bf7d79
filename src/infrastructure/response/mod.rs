use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").expect("valid regex"));

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").expect("valid regex"));

static CODE_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("valid regex"));

/// Strip reasoning blocks some models emit ahead of the answer.
pub fn clean_llm_response(response: &str) -> String {
    let cleaned = THINK_TAG_PATTERN.replace_all(response, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

/// Pull the JSON object out of a model reply.
///
/// Handles a raw OpenAI-style envelope, a fenced code block, and prose
/// wrapped around a bare object, in that order.
pub fn extract_json_payload(output: &str) -> String {
    let trimmed = output.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(content) = value
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
        {
            return extract_json_payload(content);
        }
        return trimmed.to_string();
    }

    if let Some(captures) = CODE_FENCE_PATTERN.captures(trimmed) {
        if let Some(inner) = captures.get(1) {
            return inner.as_str().trim().to_string();
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_think_tags() {
        let input = "<think>Some reasoning here</think>{\"mappings\":[]}";
        assert_eq!(clean_llm_response(input), "{\"mappings\":[]}");
    }

    #[test]
    fn test_clean_self_closing_think() {
        assert_eq!(clean_llm_response("<think />{}"), "{}");
    }

    #[test]
    fn test_clean_reasoning_tags() {
        let input = "<reasoning>Internal reasoning</reasoning>\n{}";
        assert_eq!(clean_llm_response(input), "{}");
    }

    #[test]
    fn test_extract_from_code_fence() {
        let input = "Here you go:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json_payload(input), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_from_envelope() {
        let input = r#"{"choices":[{"message":{"content":"```\n{\"a\": 2}\n```"}}]}"#;
        assert_eq!(extract_json_payload(input), "{\"a\": 2}");
    }

    #[test]
    fn test_extract_from_surrounding_prose() {
        let input = "Sure! {\"mappings\": []} Hope that helps.";
        assert_eq!(extract_json_payload(input), "{\"mappings\": []}");
    }

    #[test]
    fn test_extract_passes_plain_json_through() {
        assert_eq!(extract_json_payload("  {\"x\":true} "), "{\"x\":true}");
    }
}
