use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ClientError, Result};

/// Default connection timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default backoff base in seconds.
pub const DEFAULT_THROTTLE_TIMEOUT_SECS: u64 = 60;
/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default port, also the fallback for out-of-range ports.
pub const DEFAULT_PORT: u16 = 443;
/// Status codes retried unless the caller changes the set.
pub const DEFAULT_RETRY_CODES: [u16; 9] = [401, 402, 403, 408, 429, 500, 502, 503, 504];

/// URL scheme used to reach the host.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// TLS (the default).
    #[default]
    Https,
    /// Plaintext, for local services.
    Http,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configures timeouts, retry behavior and request encoding.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Backoff base in seconds. Attempt `n` (zero-based) sleeps `n * throttle_timeout_secs` first.
    pub throttle_timeout_secs: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Response status codes that trigger another attempt.
    pub retry_codes: BTreeSet<u16>,
    /// Percent-encode the request path before sending.
    pub encode_url: bool,
    /// Send payloads form-encoded instead of as JSON.
    pub use_form_encoding: bool,
    /// Remote port.
    pub port: u16,
    pub scheme: Scheme,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            throttle_timeout_secs: DEFAULT_THROTTLE_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_codes: DEFAULT_RETRY_CODES.into_iter().collect(),
            encode_url: true,
            use_form_encoding: false,
            port: DEFAULT_PORT,
            scheme: Scheme::Https,
        }
    }
}

/// Rejects negative values for the setting `name`.
pub(crate) fn non_negative(name: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| ClientError::InvalidArgument { name, value })
}

/// Ports at or outside the bounds of `1..65535` fall back to 443.
pub(crate) fn normalize_port(port: i64) -> u16 {
    u16::try_from(port)
        .ok()
        .filter(|port| *port > 1 && *port < u16::MAX)
        .unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = ClientOptions::default();
        assert_eq!(opts.timeout_secs, 30);
        assert_eq!(opts.throttle_timeout_secs, 60);
        assert_eq!(opts.max_retries, 3);
        assert_eq!(
            opts.retry_codes.iter().copied().collect::<Vec<_>>(),
            vec![401, 402, 403, 408, 429, 500, 502, 503, 504]
        );
        assert!(opts.encode_url);
        assert!(!opts.use_form_encoding);
        assert_eq!(opts.port, 443);
        assert_eq!(opts.scheme, Scheme::Https);
    }

    #[test]
    fn each_default_owns_its_retry_codes() {
        let mut first = ClientOptions::default();
        let second = ClientOptions::default();
        first.retry_codes.insert(418);
        assert!(!second.retry_codes.contains(&418));
    }

    #[test]
    fn non_negative_accepts_zero_and_rejects_negatives() {
        assert_eq!(non_negative("timeout", 0), Ok(0));
        assert_eq!(non_negative("timeout", 10), Ok(10));
        assert_eq!(
            non_negative("timeout", -19),
            Err(ClientError::InvalidArgument {
                name: "timeout",
                value: -19
            })
        );
    }

    #[test]
    fn port_outside_open_range_falls_back() {
        assert_eq!(normalize_port(8443), 8443);
        assert_eq!(normalize_port(2), 2);
        assert_eq!(normalize_port(65_534), 65_534);
        assert_eq!(normalize_port(1), DEFAULT_PORT);
        assert_eq!(normalize_port(0), DEFAULT_PORT);
        assert_eq!(normalize_port(-80), DEFAULT_PORT);
        assert_eq!(normalize_port(65_535), DEFAULT_PORT);
        assert_eq!(normalize_port(70_000), DEFAULT_PORT);
    }

    #[test]
    fn options_deserialize_with_missing_fields_defaulted() {
        let opts: ClientOptions =
            serde_json::from_str(r#"{"max_retries": 1, "scheme": "http"}"#).unwrap();
        assert_eq!(opts.max_retries, 1);
        assert_eq!(opts.scheme, Scheme::Http);
        assert_eq!(opts.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
