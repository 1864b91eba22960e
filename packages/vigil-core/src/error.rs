//! Centralized error types for the Vigil core library.
//!
//! Host calls fail with one of three narrow error types
//! ([`PresentationError`], [`ProbeError`], [`RestartRejected`]). They are caught
//! at the tick or command-handler boundary and never escape the execution
//! context; [`VigilError`] is what the public entry points return.

use thiserror::Error;

use crate::context::ContextId;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for logs and relay events.
    fn code(&self) -> &'static str;
}

/// The host indicator API rejected a post or channel registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresentationError {
    /// The notification channel was never registered, or was deleted.
    #[error("notification channel not registered: {0}")]
    ChannelNotRegistered(String),

    /// The user or host revoked the right to post foreground indicators.
    #[error("foreground presentation permission revoked")]
    PermissionRevoked,

    /// Any other refusal reported by the host.
    #[error("indicator rejected by host: {0}")]
    Rejected(String),
}

/// The host service registry could not be queried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The registry did not answer.
    #[error("service registry unavailable: {0}")]
    RegistryUnavailable(String),
}

/// The host declined to recreate an execution context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host declined to restart {context}: {reason}")]
pub struct RestartRejected {
    /// Context whose restart was requested.
    pub context: ContextId,
    /// Reason reported by the host.
    pub reason: String,
}

impl ErrorCode for PresentationError {
    fn code(&self) -> &'static str {
        match self {
            Self::ChannelNotRegistered(_) => "channel_not_registered",
            Self::PermissionRevoked => "permission_revoked",
            Self::Rejected(_) => "indicator_rejected",
        }
    }
}

impl ErrorCode for ProbeError {
    fn code(&self) -> &'static str {
        match self {
            Self::RegistryUnavailable(_) => "registry_unavailable",
        }
    }
}

impl ErrorCode for RestartRejected {
    fn code(&self) -> &'static str {
        "restart_rejected"
    }
}

/// Application-wide error type for the Vigil core.
#[derive(Debug, Error)]
pub enum VigilError {
    /// Posting or verifying the indicator failed.
    #[error(transparent)]
    Presentation(#[from] PresentationError),

    /// The liveness query failed.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// The host refused to recreate the context.
    #[error(transparent)]
    Restart(#[from] RestartRejected),

    /// A command name outside the known vocabulary.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The target execution context no longer accepts commands.
    #[error("Context closed: {0}")]
    ContextClosed(ContextId),

    /// No execution context is alive to receive a command.
    #[error("No execution context is running")]
    NoContext,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ErrorCode for VigilError {
    fn code(&self) -> &'static str {
        match self {
            Self::Presentation(e) => e.code(),
            Self::Probe(e) => e.code(),
            Self::Restart(e) => e.code(),
            Self::UnknownCommand(_) => "unknown_command",
            Self::ContextClosed(_) => "context_closed",
            Self::NoContext => "no_context",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a host indicator call.
pub type PresentationResult<T> = Result<T, PresentationError>;

/// Result of a host liveness query.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Result of a host restart request.
pub type RestartResult<T> = Result<T, RestartRejected>;

/// Convenient Result alias for crate-wide operations.
pub type VigilResult<T> = Result<T, VigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vigil_error_forwards_host_error_codes() {
        let err: VigilError = PresentationError::PermissionRevoked.into();
        assert_eq!(err.code(), "permission_revoked");

        let err: VigilError = ProbeError::RegistryUnavailable("down".into()).into();
        assert_eq!(err.code(), "registry_unavailable");
    }

    #[test]
    fn restart_rejected_names_the_context() {
        let err = RestartRejected {
            context: ContextId::new("svc", 3),
            reason: "background start not allowed".into(),
        };
        assert_eq!(err.code(), "restart_rejected");
        assert_eq!(
            err.to_string(),
            "host declined to restart svc#3: background start not allowed"
        );
    }
}
