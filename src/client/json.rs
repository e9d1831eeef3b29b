//! JSON decoding with the failing field path in the error.

use anyhow::Result;
use reqwest::StatusCode;

/// Decode `body`, naming the serde path and position on failure so a bad
/// field in a large availability payload can be found.
pub fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        if path.is_empty() || path == "." {
            anyhow::anyhow!("{inner}")
        } else {
            anyhow::anyhow!("at path '{path}': {inner}")
        }
    })
}

/// Best-effort error text from a failed response body: `message`, then
/// `error`.
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Text describing a failed response: the body's own message when it has
/// one, `HTTP {code}: {reason}` otherwise.
pub fn failure_message(status: StatusCode, body: &str) -> String {
    error_message(body).unwrap_or_else(|| {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        )
    })
}
