/// Error type returned by this crate.
///
/// Only construction and configuration can fail. Per-call methods never
/// return an error; transport failures and HTTP error statuses are reported
/// through [`CallResult::status`](crate::CallResult::status).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The host given to the client is unusable (path, query or empty).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A numeric setting was given a negative value.
    #[error("invalid argument for {name}: {value} must not be negative")]
    InvalidArgument {
        /// Name of the setting that rejected the value.
        name: &'static str,
        /// The rejected value.
        value: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::ClientError;

    #[test]
    fn invalid_argument_message_names_the_setting() {
        let err = ClientError::InvalidArgument {
            name: "timeout",
            value: -5,
        };
        assert_eq!(
            err.to_string(),
            "invalid argument for timeout: -5 must not be negative"
        );
    }
}
