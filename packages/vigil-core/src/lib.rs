//! Vigil Core - keeps a background playback service alive and its foreground
//! indicator posted.
//!
//! An execution context is one running instance of the playback service. While
//! playback is active, a [`ReconciliationSupervisor`] inside the context
//! periodically observes the host and corrects drift: a context the host no
//! longer reports as running is restarted, and an indicator that vanished
//! from the host's live set is posted again.
//!
//! # Architecture
//!
//! - [`host`]: Traits describing the platform (indicator surface, service
//!   registry, lifecycle) plus an in-memory implementation
//! - [`presenter`]: Channel registration and indicator posting
//! - [`probe`]: Liveness checks against the service registry
//! - [`supervisor`]: The reconciliation decision table and timer cadence
//! - [`context`]: One context task serializing commands and ticks
//! - [`manager`]: Generation bookkeeping, command routing and restarts
//! - [`events`]: Inbound commands and outbound broadcast events
//! - [`state`]: Per-context state store and configuration
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`IndicatorHost`](host::IndicatorHost): Posting indicators
//! - [`ServiceRegistry`](host::ServiceRegistry): Asking whether a context runs
//! - [`ContextLifecycle`](host::ContextLifecycle): Restart and teardown requests
//! - [`EventEmitter`](events::EventEmitter): Emitting outbound events

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod context;
pub mod error;
pub mod events;
pub mod host;
pub mod manager;
pub mod presenter;
pub mod probe;
pub mod state;
pub mod supervisor;
pub mod utils;

pub use context::{ContextExit, ContextHandle, ContextId, ExecutionContext};
pub use error::{
    ErrorCode, PresentationError, ProbeError, RestartRejected, VigilError, VigilResult,
};
pub use events::{
    BroadcastEvent, BroadcastEventBridge, Command, EventEmitter, LoggingEventEmitter,
    NoopEventEmitter, RelayEvent, SupervisorEvent,
};
pub use host::{
    ContextLifecycle, ContextRegistrar, HostFault, HostServices, IndicatorHost, IndicatorId,
    LaunchRequest, MemoryHost, ServiceHost, ServiceRegistry,
};
pub use manager::ContextManager;
pub use presenter::IndicatorPresenter;
pub use probe::LivenessProbe;
pub use state::{Config, IndicatorState, PlaybackState, StateStore};
pub use supervisor::{CorrectiveAction, ReconciliationSupervisor, SupervisorPhase, TickOutcome};
pub use utils::now_millis;
