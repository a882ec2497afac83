use thiserror::Error;

/// Errors raised by a [`Driver`](crate::driver::adapter::Driver) implementation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The automation session is gone (app crashed, server restarted, bad id)
    #[error("Session lost: {0}")]
    SessionLost(String),

    /// The element reference no longer points at a live view
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// The driver rejected or failed a command
    #[error("{command} failed: {message}")]
    Command { command: String, message: String },

    /// HTTP transport failure talking to the automation server
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be parsed
    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Screenshot payload was not valid base64
    #[error("Failed to decode screenshot: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl DriverError {
    pub fn command(command: &str, message: impl Into<String>) -> Self {
        DriverError::Command {
            command: command.to_string(),
            message: message.into(),
        }
    }

    pub fn is_session_lost(&self) -> bool {
        matches!(self, DriverError::SessionLost(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, DriverError::StaleElement(_))
    }
}

/// Errors raised by locator operations.
///
/// "Not found" is never an error: searches return `Option`/result structs.
/// What ends up here is either caller misuse or an infrastructure failure
/// the test runner has to deal with.
#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("No selector candidates supplied")]
    NoCandidates,

    #[error("Selector must not be empty")]
    EmptySelector,

    /// A tap, clear or type gesture failed on a located element
    #[error("Gesture '{action}' failed: {source}")]
    Gesture {
        action: &'static str,
        #[source]
        source: DriverError,
    },

    #[error("Session lost: {0}")]
    SessionLost(String),

    #[error(transparent)]
    Driver(DriverError),
}

impl LocatorError {
    /// Wrap a driver error raised while performing `action`.
    ///
    /// Session loss keeps its own variant so callers can match on it
    /// regardless of which gesture hit it.
    pub fn gesture(action: &'static str, source: DriverError) -> Self {
        match source {
            DriverError::SessionLost(msg) => LocatorError::SessionLost(msg),
            source => LocatorError::Gesture { action, source },
        }
    }
}

impl From<DriverError> for LocatorError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::SessionLost(msg) => LocatorError::SessionLost(msg),
            other => LocatorError::Driver(other),
        }
    }
}
