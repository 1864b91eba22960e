//! Host operating system contract.
//!
//! The host owns execution contexts: it starts them, may kill them without
//! warning, and mandates that a foreground context always carries a current
//! indicator. These traits are the only way the core talks to it, so the
//! supervisor can be driven against [`MemoryHost`] in tests and in the
//! headless daemon.

mod memory;
mod types;

pub use memory::{HostFault, MemoryHost};
pub use types::{
    Category, ChannelConfig, Importance, IndicatorConfig, IndicatorHandle, IndicatorId,
    IndicatorStyle, Priority, Visibility,
};

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ContextId;
use crate::error::{PresentationResult, ProbeResult, RestartResult};

/// Trait for the host's foreground-presentation primitive.
///
/// Used by `IndicatorPresenter` to post, re-post and verify the indicator.
#[async_trait]
pub trait IndicatorHost: Send + Sync {
    /// Registers a notification channel.
    ///
    /// Registering the same channel again is a no-op on the host side.
    async fn register_channel(&self, channel: &ChannelConfig) -> PresentationResult<()>;

    /// Posts (or replaces) the foreground indicator for `context`.
    ///
    /// This also marks the context as foreground, which the host demands
    /// within a short grace period of context creation.
    async fn post_foreground(
        &self,
        context: &ContextId,
        indicator: &IndicatorConfig,
    ) -> PresentationResult<IndicatorHandle>;

    /// Returns the ids of every indicator currently shown by the host.
    async fn active_indicators(&self) -> PresentationResult<Vec<IndicatorId>>;
}

/// Trait for the host's service registry.
///
/// Used by `LivenessProbe`.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Returns whether `context` is currently registered as running.
    async fn is_running(&self, context: &ContextId) -> ProbeResult<bool>;
}

/// Trait for context lifecycle requests.
///
/// The supervisor never creates or destroys contexts itself; it asks the
/// host, which decides how and when to act.
#[async_trait]
pub trait ContextLifecycle: Send + Sync {
    /// Requests that the host re-create `context` with the given initial
    /// playback state.
    async fn request_restart(&self, context: &ContextId, initial_playback: bool)
        -> RestartResult<()>;

    /// Requests a full teardown of `context`.
    ///
    /// Teardown removes the indicator along with the context.
    async fn request_teardown(&self, context: &ContextId);
}

/// Hook through which the owner of context creation informs the host
/// registry that a context came to life or went away.
pub trait ContextRegistrar: Send + Sync {
    fn context_created(&self, context: &ContextId);

    fn context_destroyed(&self, context: &ContextId);
}

/// A lifecycle request forwarded by the host to the owner of context creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchRequest {
    /// Re-create the context with a fresh generation.
    Restart {
        previous: ContextId,
        initial_playback: bool,
    },
    /// The context asked to be torn down.
    Teardown { context: ContextId },
}

// ─────────────────────────────────────────────────────────────────────────────
// Combined Traits (for trait objects)
// ─────────────────────────────────────────────────────────────────────────────

/// Combined trait for everything an execution context needs from the host.
pub trait ServiceHost: IndicatorHost + ServiceRegistry + ContextLifecycle {}

/// Blanket implementation for any type implementing all three traits.
impl<T: IndicatorHost + ServiceRegistry + ContextLifecycle> ServiceHost for T {}

/// The host's facets as separate trait objects, one per collaborator.
#[derive(Clone)]
pub struct HostServices {
    pub indicators: Arc<dyn IndicatorHost>,
    pub registry: Arc<dyn ServiceRegistry>,
    pub lifecycle: Arc<dyn ContextLifecycle>,
}

impl HostServices {
    /// Splits one host implementation into its facets.
    pub fn from_host<H: ServiceHost + 'static>(host: Arc<H>) -> Self {
        Self {
            indicators: host.clone(),
            registry: host.clone(),
            lifecycle: host,
        }
    }
}
