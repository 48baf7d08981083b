//! Host validation, route joining and body serialization.

use serde_json::Value;
use url::form_urlencoded;

use crate::{ClientError, Payload, Result};

/// Characters left literal when a route is percent-encoded.
const ROUTE_SAFE: [char; 4] = ['/', '?', '=', '&'];

/// Lower-cases `host` and strips a leading `https://` or `http://`.
///
/// Paths and query strings are rejected: routes belong in the base route.
pub(crate) fn parse_host(host: &str) -> Result<String> {
    let lowered = host.to_lowercase();
    let cleaned = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);

    if cleaned.is_empty() {
        return Err(ClientError::InvalidConfiguration(
            "host must not be empty".to_owned(),
        ));
    }
    if cleaned.contains('/') {
        #[cfg(feature = "tracing")]
        tracing::error!(host = cleaned, "route in host");
        return Err(ClientError::InvalidConfiguration(format!(
            "host '{cleaned}' contains a route; use set_base_route instead"
        )));
    }
    if cleaned.contains('?') {
        #[cfg(feature = "tracing")]
        tracing::error!(host = cleaned, "query parameters in host");
        return Err(ClientError::InvalidConfiguration(format!(
            "host '{cleaned}' contains query parameters"
        )));
    }
    Ok(cleaned.to_owned())
}

/// Normalizes a base route to `""` or `/segment[/segment...]` with no trailing slash.
pub(crate) fn normalize_base_route(route: &str) -> String {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Joins the base route and a call route, then encodes when asked.
pub(crate) fn format_route(base_route: &str, route: &str, encode: bool) -> String {
    let combined = if route.starts_with('/') {
        format!("{base_route}{route}")
    } else {
        format!("{base_route}/{route}")
    };
    if encode {
        encode_route(&combined)
    } else {
        combined
    }
}

fn encode_route(route: &str) -> String {
    let mut encoded = String::with_capacity(route.len());
    let mut start = 0;
    for (index, ch) in route.char_indices() {
        if ROUTE_SAFE.contains(&ch) {
            encoded.push_str(&urlencoding::encode(&route[start..index]));
            encoded.push(ch);
            start = index + ch.len_utf8();
        }
    }
    encoded.push_str(&urlencoding::encode(&route[start..]));
    encoded
}

/// Serializes a payload as compact JSON or as a form-encoded string.
///
/// Form values render strings verbatim, numbers and booleans as their JSON
/// text (`true`, not `True`), `null` as an empty value and objects as compact
/// JSON. An array value repeats its key once per element.
pub(crate) fn format_payload(payload: &Payload, form_encoding: bool) -> String {
    if !form_encoding {
        return payload.to_json_text();
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in payload.iter() {
        match value {
            Value::Array(items) => {
                for item in items {
                    serializer.append_pair(key, &form_value(item));
                }
            }
            other => {
                serializer.append_pair(key, &form_value(other));
            }
        }
    }
    serializer.finish()
}

fn form_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
