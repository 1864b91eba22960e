//! Event emitter abstraction for decoupling the supervisor from transport.
//!
//! The supervisor depends on the [`EventEmitter`] trait rather than a concrete
//! broadcast channel, enabling testing and alternative transports.

use super::{RelayEvent, SupervisorEvent};

/// Trait for emitting outbound events without knowledge of transport.
pub trait EventEmitter: Send + Sync {
    /// Emits a request for the application layer.
    fn emit_relay(&self, event: RelayEvent);

    /// Emits a supervisor diagnostic event.
    fn emit_supervisor(&self, event: SupervisorEvent);
}

/// No-op emitter for embedding or testing.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_relay(&self, _event: RelayEvent) {}

    fn emit_supervisor(&self, _event: SupervisorEvent) {}
}

/// Logging emitter for debugging and development.
///
/// Relay events are logged at info level since they ask the application to
/// act; supervisor diagnostics at debug.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_relay(&self, event: RelayEvent) {
        tracing::info!(?event, "relay_event");
    }

    fn emit_supervisor(&self, event: SupervisorEvent) {
        tracing::debug!(?event, "supervisor_event");
    }
}
