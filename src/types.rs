use std::fmt;

use serde_json::{Map, Value};

/// HTTP verb of a logical call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Delete,
    Post,
    Put,
    Patch,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Delete => "DELETE",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Delete => Self::DELETE,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
        }
    }
}

/// Outcome of one logical call.
///
/// `status` is `0` when no attempt ever received a response. `json` is empty
/// when the body is empty, not JSON, or JSON that is not an object; `body`
/// always holds the raw text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallResult {
    pub json: Map<String, Value>,
    pub body: String,
    pub attempts: usize,
    pub status: u16,
}

impl CallResult {
    /// True when no response was received on any attempt.
    pub fn is_transport_failure(&self) -> bool {
        self.status == 0
    }

    /// True for a `2xx` final status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Parses a response body into a JSON object, falling back to an empty map.
pub(crate) fn decode_body(body: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
