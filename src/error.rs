//! Unified error handling for slirc-client.
//!
//! Engine failures keep the engine's own diagnostic text; the crate never
//! rewords them. Missing handlers and interrupted waits are not errors.

use std::io;
use thiserror::Error;

// ============================================================================
// Engine Errors
// ============================================================================

/// A failure reported by the engine: its error code plus the engine's
/// description of that code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

// ============================================================================
// Protocol Errors (commands, connect, wait)
// ============================================================================

/// Recoverable failures surfaced by session operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// The engine rejected the operation.
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// The descriptor wait failed for a reason other than a signal.
    #[error("select() error: {0}")]
    Wait(#[source] io::Error),

    /// A required argument was empty.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    /// A handler name that no event dispatches to.
    #[error("no event dispatches to handler '{0}'")]
    UnknownHandler(String),
}

impl ProtocolError {
    /// The engine's error code, if the engine produced this error.
    pub fn engine_code(&self) -> Option<i32> {
        match self {
            Self::Engine(err) => Some(err.code),
            _ => None,
        }
    }
}

// ============================================================================
// Session Errors (step)
// ============================================================================

/// Errors returned by [`Session::step`](crate::Session::step).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A host handler failed. Dispatch stopped for the rest of the step.
    #[error("{handler} failed: {source}")]
    Handler {
        handler: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl SessionError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol(ProtocolError::Engine(_)) => "engine",
            Self::Protocol(ProtocolError::Wait(_)) => "wait",
            Self::Protocol(ProtocolError::MissingArgument { .. }) => "missing_argument",
            Self::Protocol(ProtocolError::UnknownHandler(_)) => "unknown_handler",
            Self::Handler { .. } => "handler",
        }
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        Self::Protocol(ProtocolError::Engine(err))
    }
}

/// Result type for host handlers.
pub type HandlerResult = anyhow::Result<()>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_message_is_preserved_verbatim() {
        let err = ProtocolError::from(EngineError::new(5, "Socket error"));
        assert_eq!(err.to_string(), "Socket error");
        assert_eq!(err.engine_code(), Some(5));

        let err = SessionError::from(EngineError::new(5, "Socket error"));
        assert_eq!(err.to_string(), "Socket error");
        assert_eq!(err.error_code(), "engine");
    }

    #[test]
    fn engine_error_displays_engine_text_only() {
        let err = EngineError::new(11, "Socket write error");
        assert_eq!(err.to_string(), "Socket write error");
        let err: &dyn std::error::Error = &err;
        assert!(err.source().is_none());
    }

    #[test]
    fn handler_error_keeps_source() {
        let err = SessionError::Handler {
            handler: "onjoin",
            source: anyhow::anyhow!("boom").into(),
        };
        assert_eq!(err.to_string(), "onjoin failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn missing_argument_names_command() {
        let err = ProtocolError::MissingArgument {
            command: "JOIN",
            argument: "channel",
        };
        assert_eq!(err.to_string(), "JOIN: missing channel");
        assert_eq!(err.engine_code(), None);
    }
}
