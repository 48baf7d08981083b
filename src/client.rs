use std::fmt;
use std::time::Duration;

use reqwest::header;
use serde_json::{Map, Value};
use tokio::time::sleep;

use crate::{
    connection::ConnectionManager,
    format::{self, normalize_base_route, parse_host},
    options::{non_negative, normalize_port},
    types::decode_body,
    CallResult, ClientOptions, Method, Payload, Result, Scheme,
};

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// REST client for a single host.
///
/// Every call goes through the same retry loop: attempt `n` (counting from
/// zero) first sleeps `n * throttle_timeout` seconds, transport failures drop
/// the connection before the next attempt, and responses whose status is in
/// the retry set are attempted again until `max_retries` is spent.
///
/// Calls take `&mut self`; share a client between tasks only behind a lock.
pub struct RestClient {
    host: String,
    base_route: String,
    options: ClientOptions,
    connections: ConnectionManager,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("host", &self.host)
            .field("base_route", &self.base_route)
            .field("options", &self.options)
            .field("connected", &self.connections.is_open())
            .finish()
    }
}

/// Status and raw body of one physical attempt.
struct Reply {
    status: u16,
    body: String,
}

/// State carried from one attempt to the next.
#[derive(Default)]
struct Progress {
    attempts: usize,
    status: u16,
    body: String,
    json: Map<String, Value>,
}

impl Progress {
    /// A transport failure counts as an attempt but keeps earlier response fields.
    fn record_failure(self) -> Self {
        Self {
            attempts: self.attempts + 1,
            ..self
        }
    }

    fn record_reply(self, reply: Reply) -> Self {
        Self {
            attempts: self.attempts + 1,
            status: reply.status,
            json: decode_body(&reply.body),
            body: reply.body,
        }
    }

    fn finish(self) -> CallResult {
        CallResult {
            json: self.json,
            body: self.body,
            attempts: self.attempts,
            status: self.status,
        }
    }
}

impl RestClient {
    /// Creates a client for `host`.
    ///
    /// `host` may carry an `http://` or `https://` prefix, which is dropped,
    /// but no path or query; put the path in `base_route` instead.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tinyrest::RestClient;
    ///
    /// let client = RestClient::new("api.example.com", "v1").unwrap();
    /// assert_eq!(client.base_route(), "/v1");
    /// ```
    pub fn new(host: &str, base_route: &str) -> Result<Self> {
        Ok(Self {
            host: parse_host(host)?,
            base_route: normalize_base_route(base_route),
            options: ClientOptions::default(),
            connections: ConnectionManager::default(),
        })
    }

    /// Replaces the whole configuration. Out-of-range ports fall back to 443.
    pub fn with_options(mut self, mut opts: ClientOptions) -> Self {
        opts.port = normalize_port(opts.port.into());
        self.options = opts;
        self.connections.release();
        self
    }

    pub async fn get(&mut self, route: &str) -> CallResult {
        self.request(Method::Get, route, None).await
    }

    pub async fn delete(&mut self, route: &str) -> CallResult {
        self.request(Method::Delete, route, None).await
    }

    pub async fn post(&mut self, route: &str, payload: &Payload) -> CallResult {
        self.request(Method::Post, route, Some(payload)).await
    }

    pub async fn put(&mut self, route: &str, payload: &Payload) -> CallResult {
        self.request(Method::Put, route, Some(payload)).await
    }

    pub async fn patch(&mut self, route: &str, payload: &Payload) -> CallResult {
        self.request(Method::Patch, route, Some(payload)).await
    }

    /// Runs one logical call and returns its final outcome.
    ///
    /// Never fails: a call where no attempt got a response returns a
    /// [`CallResult`] with status `0`.
    pub async fn request(
        &mut self,
        method: Method,
        route: &str,
        payload: Option<&Payload>,
    ) -> CallResult {
        let path = self.format_route(route);
        let body = payload.map(|payload| (self.format_payload(payload), self.content_type()));

        let mut progress = Progress::default();
        let mut retry_needed = true;

        while retry_needed && progress.attempts <= self.options.max_retries {
            self.wait_before_attempt(progress.attempts).await;

            progress = match self.attempt(method, &path, body.as_ref()).await {
                Ok(reply) => {
                    retry_needed = self.options.retry_codes.contains(&reply.status);
                    if retry_needed {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            %method,
                            path = %path,
                            status = reply.status,
                            attempt = progress.attempts + 1,
                            "retryable status"
                        );
                    }
                    progress.record_reply(reply)
                }
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        %method,
                        path = %path,
                        attempt = progress.attempts + 1,
                        kind = transport_failure_kind(&_err),
                        error = %_err,
                        "transport failure"
                    );
                    self.connections.release();
                    retry_needed = true;
                    progress.record_failure()
                }
            };
        }

        progress.finish()
    }

    async fn attempt(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&(String, &'static str)>,
    ) -> reqwest::Result<Reply> {
        let timeout = Duration::from_secs(self.options.timeout_secs);
        let connection =
            self.connections
                .acquire(self.options.scheme, &self.host, self.options.port, timeout)?;

        let mut request = connection.request(method.into(), path);
        if let Some((text, content_type)) = body {
            request = request
                .header(header::CONTENT_TYPE, *content_type)
                .body(text.clone());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        Ok(Reply {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Sleeps `attempts * throttle_timeout`; the first attempt never waits.
    async fn wait_before_attempt(&self, attempts: usize) {
        let multiplier = u64::try_from(attempts).unwrap_or(u64::MAX);
        let delay_secs = self.options.throttle_timeout_secs.saturating_mul(multiplier);
        if delay_secs == 0 {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("waiting {} s before attempt {}", delay_secs, attempts + 1);

        sleep(Duration::from_secs(delay_secs)).await;
    }

    fn content_type(&self) -> &'static str {
        if self.options.use_form_encoding {
            FORM_CONTENT_TYPE
        } else {
            JSON_CONTENT_TYPE
        }
    }

    /// Prefixes the base route and percent-encodes when `encode_url` is set.
    pub fn format_route(&self, route: &str) -> String {
        format::format_route(&self.base_route, route, self.options.encode_url)
    }

    /// Serializes a payload as JSON, or form-encoded when `use_form_encoding` is set.
    pub fn format_payload(&self, payload: &Payload) -> String {
        format::format_payload(payload, self.options.use_form_encoding)
    }

    /// Drops the held connection. The next call reconnects.
    pub fn close(&mut self) {
        self.connections.release();
    }

    pub fn is_connected(&self) -> bool {
        self.connections.is_open()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn base_route(&self) -> &str {
        &self.base_route
    }

    /// Sets the route prefixed to every call and returns the stored form.
    pub fn set_base_route(&mut self, route: &str) -> &str {
        self.base_route = normalize_base_route(route);
        &self.base_route
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn port(&self) -> u16 {
        self.options.port
    }

    /// Sets the port. Values not strictly between 1 and 65535 fall back to 443.
    pub fn set_port(&mut self, port: i64) {
        let port = normalize_port(port);
        if port != self.options.port {
            self.options.port = port;
            self.connections.release();
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.options.scheme
    }

    pub fn set_scheme(&mut self, scheme: Scheme) {
        if scheme != self.options.scheme {
            self.options.scheme = scheme;
            self.connections.release();
        }
    }

    /// Seconds an attempt may take before it counts as a transport failure.
    pub fn timeout(&self) -> u64 {
        self.options.timeout_secs
    }

    pub fn set_timeout(&mut self, seconds: i64) -> Result<()> {
        let seconds = non_negative("timeout", seconds)?;
        if seconds != self.options.timeout_secs {
            self.options.timeout_secs = seconds;
            self.connections.release();
        }
        Ok(())
    }

    /// Backoff base in seconds.
    pub fn throttle_timeout(&self) -> u64 {
        self.options.throttle_timeout_secs
    }

    pub fn set_throttle_timeout(&mut self, seconds: i64) -> Result<()> {
        self.options.throttle_timeout_secs = non_negative("throttle_timeout", seconds)?;
        Ok(())
    }

    pub fn max_retries(&self) -> usize {
        self.options.max_retries
    }

    pub fn set_max_retries(&mut self, count: i64) -> Result<()> {
        let count = non_negative("max_retries", count)?;
        self.options.max_retries = usize::try_from(count).unwrap_or(usize::MAX);
        Ok(())
    }

    pub fn encode_url(&self) -> bool {
        self.options.encode_url
    }

    pub fn set_encode_url(&mut self, encode_url: bool) {
        self.options.encode_url = encode_url;
    }

    pub fn use_form_encoding(&self) -> bool {
        self.options.use_form_encoding
    }

    pub fn set_use_form_encoding(&mut self, use_form_encoding: bool) {
        self.options.use_form_encoding = use_form_encoding;
    }

    /// Retryable status codes in ascending order.
    pub fn retry_codes(&self) -> Vec<u16> {
        self.options.retry_codes.iter().copied().collect()
    }

    /// Adds status codes to the retry set. Codes already present are ignored.
    pub fn add_retry_codes<I: IntoIterator<Item = u16>>(&mut self, codes: I) {
        self.options.retry_codes.extend(codes);
    }

    /// Removes status codes from the retry set. Absent codes are ignored.
    pub fn remove_retry_codes<I: IntoIterator<Item = u16>>(&mut self, codes: I) {
        for code in codes {
            self.options.retry_codes.remove(&code);
        }
    }
}

#[cfg(feature = "tracing")]
fn transport_failure_kind(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_body() || err.is_decode() {
        "body"
    } else if err.is_builder() {
        "builder"
    } else {
        "request"
    }
}
