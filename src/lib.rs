//! `tinyrest` is a small async REST client bound to a single host.
//!
//! A [`RestClient`] keeps one lazily opened connection, formats routes and
//! payloads, and retries each call with linear backoff:
//! - [`RestClient::get`] / [`RestClient::delete`]
//! - [`RestClient::post`] / [`RestClient::put`] / [`RestClient::patch`]
//!
//! Calls never return an error. Every call yields a [`CallResult`]; a status
//! of `0` means no attempt received a response.
//!
//! ```no_run
//! use tinyrest::{Payload, RestClient};
//!
//! # async fn run() -> tinyrest::Result<()> {
//! let mut client = RestClient::new("api.example.com", "/v1")?;
//! client.set_max_retries(2)?;
//!
//! let result = client
//!     .post("users", &Payload::from([("name", "Kit")]))
//!     .await;
//! if result.is_transport_failure() {
//!     eprintln!("no response after {} attempts", result.attempts);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod connection;
mod error;
mod format;
mod options;
mod payload;
mod types;

pub use client::RestClient;
pub use error::ClientError;
pub use options::{
    ClientOptions, Scheme, DEFAULT_MAX_RETRIES, DEFAULT_PORT, DEFAULT_RETRY_CODES,
    DEFAULT_THROTTLE_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
};
pub use payload::Payload;
pub use types::{CallResult, Method};

pub type Result<T> = std::result::Result<T, ClientError>;
