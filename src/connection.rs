use std::time::Duration;

use crate::Scheme;

/// A transport bound to one `(scheme, host, port, timeout)` tuple.
#[derive(Debug)]
pub(crate) struct Connection {
    http: reqwest::Client,
    origin: String,
}

impl Connection {
    fn open(scheme: Scheme, host: &str, port: u16, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(1)
            .http1_only()
            .build()?;
        Ok(Self {
            http,
            origin: format!("{scheme}://{host}:{port}"),
        })
    }

    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(method, format!("{}{path}", self.origin))
    }

    pub(crate) fn origin(&self) -> &str {
        &self.origin
    }
}

/// Holds at most one lazily opened [`Connection`] to the client's host.
#[derive(Debug, Default)]
pub(crate) struct ConnectionManager {
    current: Option<Connection>,
}

impl ConnectionManager {
    /// Returns the held connection, opening one first if needed.
    pub(crate) fn acquire(
        &mut self,
        scheme: Scheme,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> reqwest::Result<&Connection> {
        let connection = match self.current.take() {
            Some(connection) => connection,
            None => {
                let connection = Connection::open(scheme, host, port, timeout)?;
                #[cfg(feature = "tracing")]
                tracing::debug!(origin = connection.origin(), "opened connection");
                connection
            }
        };
        Ok(self.current.insert(connection))
    }

    /// Drops the held connection; the next `acquire` opens a fresh one.
    pub(crate) fn release(&mut self) {
        if let Some(_connection) = self.current.take() {
            #[cfg(feature = "tracing")]
            tracing::debug!(origin = _connection.origin(), "released connection");
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.current.is_some()
    }
}
