//! Two-part completion parser.
//!
//! Providers are instructed to answer with a `TEXTO:` prose block followed
//! by a `JSON:` structured block, but real completions are messy: fenced
//! JSON, missing markers, trailing chatter. This parser is deliberately
//! forgiving and never fails: a JSON block that does not parse becomes an
//! empty object, which the orchestrator later replaces or repairs via the
//! fallback generator.

use serde_json::Value;

/// Split a raw completion into (prose, structured JSON).
///
/// Boundary policy, in order:
/// 1. a literal `JSON:` marker splits the response;
/// 2. otherwise the substring from the first `{` to the last `}` is taken
///    as the JSON block;
/// 3. otherwise the whole response is prose and the JSON block is empty.
///
/// Pure function; safe to unit-test with literal strings.
pub fn parse_completion(raw: &str) -> (String, Value) {
    let (prose_block, json_block) = split_blocks(raw);

    let prose = prose_block.replace("TEXTO:", "").trim().to_string();

    let json = if json_block.trim().is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        let candidate = json_block
            .trim()
            .trim_matches(|c| c == '`' || c == '\n')
            .trim();
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode JSON block from completion");
                Value::Object(serde_json::Map::new())
            }
        }
    };

    (prose, json)
}

fn split_blocks(raw: &str) -> (&str, &str) {
    if let Some(idx) = raw.find("JSON:") {
        return (&raw[..idx], &raw[idx + "JSON:".len()..]);
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if end > start {
            return (&raw[..start], &raw[start..=end]);
        }
    }
    (raw, "")
}
