//! External event bus.
//!
//! This module provides:
//! - [`Command`] - the inbound command vocabulary, delivered to one execution
//!   context over a typed queue ([`CommandSender`])
//! - [`EventEmitter`] trait for publishing outbound events
//! - [`BroadcastEventBridge`] for fan-out to any number of subscribers
//! - Outbound event types: the [`RelayEvent`] consumed by the application
//!   layer and diagnostic [`SupervisorEvent`]s

mod bridge;
mod commands;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use commands::{command_channel, Command, CommandReceiver, CommandSender};
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::supervisor::CorrectiveAction;

/// Events published on the outbound channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// Requests relayed to the application layer.
    Relay(RelayEvent),

    /// Supervisor diagnostics.
    Supervisor(SupervisorEvent),
}

/// The single event type relayed back to the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayEvent {
    /// The service asks the application to perform a playback action
    /// (e.g. stop playback because it can no longer be sustained).
    PlaybackActionRequested {
        action: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events describing what the supervisor did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SupervisorEvent {
    /// A context processed its start command.
    ContextStarted {
        generation: u64,
        #[serde(rename = "playbackActive")]
        playback_active: bool,
        timestamp: u64,
    },
    /// A corrective action was applied.
    CorrectionApplied {
        generation: u64,
        action: CorrectiveAction,
        timestamp: u64,
    },
    /// The context asked the host to re-create it.
    RestartRequested {
        generation: u64,
        #[serde(rename = "playbackActive")]
        playback_active: bool,
        timestamp: u64,
    },
    /// Supervision stopped because playback is no longer active.
    Quiesced { generation: u64, timestamp: u64 },
    /// The context requested its own teardown.
    ContextStopped { generation: u64, timestamp: u64 },
}
