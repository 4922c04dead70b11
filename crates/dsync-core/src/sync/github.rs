//! GitHub contents API payloads.

use base64::Engine;
use serde_json::Value;

use crate::error::{DsyncError, DsyncResult};

/// Decode the `content` field of a contents API response and parse it as JSON.
pub fn decode_contents(response: &Value) -> DsyncResult<Value> {
    let content = response
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| DsyncError::fetch("github", "response has no 'content' field"))?;

    if let Some(encoding) = response.get("encoding").and_then(Value::as_str) {
        if encoding != "base64" {
            return Err(DsyncError::fetch("github", format!("unsupported encoding '{}'", encoding)));
        }
    }

    // The API wraps base64 at 60 columns.
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| DsyncError::fetch("github", format!("invalid base64 content: {}", e)))?;

    serde_json::from_slice(&bytes).map_err(|e| DsyncError::fetch("github", format!("file is not valid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_wrapped_content() {
        let raw = r##"{"color":{"brand":{"primary":{"value":"#0066CC"}}}}"##;
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        let (head, tail) = encoded.split_at(20);
        let response = json!({ "encoding": "base64", "content": format!("{}\n{}\n", head, tail) });

        let decoded = decode_contents(&response).unwrap();
        assert_eq!(decoded["color"]["brand"]["primary"]["value"], "#0066CC");
    }

    #[test]
    fn test_decode_failures_are_fetch_errors() {
        for response in [
            json!({}),
            json!({ "content": "!!!not base64" }),
            json!({ "content": base64::engine::general_purpose::STANDARD.encode("not json") }),
            json!({ "encoding": "utf-8", "content": "e30=" }),
        ] {
            assert!(matches!(decode_contents(&response), Err(DsyncError::Fetch { .. })));
        }
    }
}
