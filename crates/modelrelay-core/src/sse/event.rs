//! SSE payload classification and delta extraction

use serde_json::Value;

/// Sentinel payload that ends a stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// What one `data:` line means to the reader loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A non-empty content fragment
    Delta(String),
    /// The `[DONE]` sentinel
    Done,
    /// The provider reported an error inside the stream
    UpstreamError(String),
    /// The payload was not valid JSON; skip it
    Malformed { line: String, reason: String },
    /// Valid JSON without content (role headers, usage, keep-alives)
    Empty,
}

impl SseEvent {
    /// Check if this event carries content
    pub fn is_delta(&self) -> bool {
        matches!(self, SseEvent::Delta(_))
    }
}

/// Classify one line of an SSE body
///
/// Returns `None` for lines that are not `data:` fields: blank
/// separators, `:` comments, and `event:`/`id:`/`retry:` fields.
pub fn parse_line(line: &str) -> Option<SseEvent> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    Some(parse_payload(payload))
}

/// Classify the payload of a `data:` field
pub fn parse_payload(payload: &str) -> SseEvent {
    let trimmed = payload.trim();
    if trimmed == DONE_SENTINEL {
        return SseEvent::Done;
    }
    if trimmed.is_empty() {
        return SseEvent::Empty;
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(e) => {
            return SseEvent::Malformed {
                line: payload.to_string(),
                reason: e.to_string(),
            }
        }
    };

    if let Some(message) = extract_error(&value) {
        return SseEvent::UpstreamError(message);
    }

    match extract_delta(&value) {
        Some(text) if !text.is_empty() => SseEvent::Delta(text),
        _ => SseEvent::Empty,
    }
}

/// Pull the content fragment out of a provider chunk
///
/// Shapes tried in order:
/// - `choices[0].delta.content` (OpenAI, OpenRouter, DeepSeek, Perplexity)
/// - `choices[0].text` (legacy completions)
/// - `delta.text` (Anthropic `content_block_delta`)
/// - `candidates[0].content.parts[*].text` (Gemini)
/// - top-level `content` or `text` (single-field proxies)
pub fn extract_delta(value: &Value) -> Option<String> {
    if let Some(choice) = value.get("choices").and_then(|c| c.get(0)) {
        if let Some(content) = choice.pointer("/delta/content").and_then(Value::as_str) {
            return Some(content.to_string());
        }
        if let Some(text) = choice.get("text").and_then(Value::as_str) {
            return Some(text.to_string());
        }
        // OpenAI-shape chunk without content (role header, finish_reason)
        return None;
    }

    if let Some(text) = value.pointer("/delta/text").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    if let Some(parts) = value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        return Some(text);
    }

    value
        .get("content")
        .and_then(Value::as_str)
        .or_else(|| value.get("text").and_then(Value::as_str))
        .map(str::to_string)
}

/// Pull a provider-reported error out of a chunk
///
/// Accepts `{"error": "..."}` and `{"error": {"message": "..."}}`.
pub fn extract_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        Value::Object(obj) => Some(
            obj.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
        ),
        other => Some(other.to_string()),
    }
}

/// Frame a JSON payload the way the proxy functions do
pub fn encode_data(value: &Value) -> String {
    format!("data: {}\n\n", value)
}

/// Frame the terminating sentinel
pub fn encode_done() -> String {
    format!("data: {}\n\n", DONE_SENTINEL)
}

/// Frame an OpenAI-shape content delta
pub fn encode_delta(text: &str) -> String {
    encode_data(&serde_json::json!({
        "choices": [{ "delta": { "content": text } }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_openai_shape() {
        let event = parse_line(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#);
        assert_eq!(event, Some(SseEvent::Delta("Hi".to_string())));
    }

    #[test]
    fn test_done_and_non_data_lines() {
        assert_eq!(parse_line("data: [DONE]"), Some(SseEvent::Done));
        assert_eq!(parse_line("data:[DONE]\r"), Some(SseEvent::Done));
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line(": keep-alive"), None);
        assert_eq!(parse_line("event: message"), None);
        assert_eq!(parse_line("id: 42"), None);
    }

    #[test]
    fn test_role_header_and_empty_content_are_empty() {
        let header = parse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#);
        assert_eq!(header, Some(SseEvent::Empty));

        let blank = parse_line(r#"data: {"choices":[{"delta":{"content":""}}]}"#);
        assert_eq!(blank, Some(SseEvent::Empty));
    }

    #[test]
    fn test_provider_specific_shapes() {
        let anthropic = json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Bon"}});
        assert_eq!(extract_delta(&anthropic).as_deref(), Some("Bon"));

        let gemini = json!({"candidates": [{"content": {"parts": [{"text": "jour"}, {"text": "!"}]}}]});
        assert_eq!(extract_delta(&gemini).as_deref(), Some("jour!"));

        let legacy = json!({"choices": [{"text": "abc"}]});
        assert_eq!(extract_delta(&legacy).as_deref(), Some("abc"));

        assert_eq!(extract_delta(&json!({"content": "x"})).as_deref(), Some("x"));
        assert_eq!(extract_delta(&json!({"text": "y"})).as_deref(), Some("y"));
        assert_eq!(extract_delta(&json!({"usage": {"total_tokens": 3}})), None);
    }

    #[test]
    fn test_malformed_json() {
        match parse_line("data: {not json") {
            Some(SseEvent::Malformed { line, .. }) => assert_eq!(line, "{not json"),
            other => panic!("expected malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_upstream_error_payloads() {
        assert_eq!(
            parse_line(r#"data: {"error":"quota exceeded"}"#),
            Some(SseEvent::UpstreamError("quota exceeded".to_string()))
        );
        assert_eq!(
            parse_line(r#"data: {"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
            Some(SseEvent::UpstreamError("Overloaded".to_string()))
        );
        assert_eq!(
            parse_line(r#"data: {"error":null,"content":"ok"}"#),
            Some(SseEvent::Delta("ok".to_string()))
        );
    }

    #[test]
    fn test_encoding_matches_proxy_framing() {
        assert_eq!(encode_done(), "data: [DONE]\n\n");
        let framed = encode_delta("Hi");
        assert!(framed.starts_with("data: {"));
        assert!(framed.ends_with("\n\n"));
        assert_eq!(parse_line(framed.trim_end()), Some(SseEvent::Delta("Hi".to_string())));
    }
}
