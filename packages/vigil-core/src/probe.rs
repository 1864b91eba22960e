//! Liveness probing for the current execution context.

use std::sync::Arc;

use crate::context::ContextId;
use crate::error::ProbeResult;
use crate::host::ServiceRegistry;

/// Read-only query of the host registry for one context.
///
/// A `false` answer is only authoritative for the tick that observed it: the
/// query can race with the host tearing the process down.
pub struct LivenessProbe {
    registry: Arc<dyn ServiceRegistry>,
    context: ContextId,
}

impl LivenessProbe {
    pub fn new(registry: Arc<dyn ServiceRegistry>, context: ContextId) -> Self {
        Self { registry, context }
    }

    pub async fn is_running(&self) -> ProbeResult<bool> {
        self.registry.is_running(&self.context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ContextRegistrar, HostFault, MemoryHost};

    #[tokio::test]
    async fn probe_matches_generation() {
        let host = Arc::new(MemoryHost::new());
        let current = ContextId::new("svc", 2);
        host.context_created(&ContextId::new("svc", 1));

        let probe = LivenessProbe::new(host.clone(), current.clone());
        assert!(!probe.is_running().await.unwrap());

        host.context_created(&current);
        assert!(probe.is_running().await.unwrap());
    }

    #[tokio::test]
    async fn probe_reports_registry_failure() {
        let host = Arc::new(MemoryHost::new());
        host.inject(HostFault::ProbeUnavailable);

        let probe = LivenessProbe::new(host, ContextId::new("svc", 1));
        assert!(probe.is_running().await.is_err());
    }
}
