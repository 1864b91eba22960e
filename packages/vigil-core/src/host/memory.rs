//! In-memory host used by the headless daemon and by tests.
//!
//! Keeps registered channels, posted indicators and running contexts in a
//! single mutex-guarded table. Faults can be injected to simulate a host that
//! revokes permissions, loses track of a context or refuses restarts.
//! Restart and teardown requests are forwarded as [`LaunchRequest`]s to
//! whoever owns context creation.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::types::{ChannelConfig, IndicatorConfig, IndicatorHandle, IndicatorId};
use super::{ContextLifecycle, ContextRegistrar, IndicatorHost, LaunchRequest, ServiceRegistry};
use crate::context::ContextId;
use crate::error::{
    PresentationError, PresentationResult, ProbeError, ProbeResult, RestartRejected,
    RestartResult,
};

/// Failure modes that can be switched on for a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostFault {
    /// Every indicator post fails with [`PresentationError::Rejected`].
    RejectPresentation,
    /// Every indicator post fails with [`PresentationError::PermissionRevoked`].
    RevokePermission,
    /// The service registry cannot be queried.
    ProbeUnavailable,
    /// Restart requests are declined.
    RejectRestart,
}

struct PostedIndicator {
    owner: ContextId,
    config: IndicatorConfig,
}

/// Restart and teardown requests remembered for inspection.
const REQUEST_HISTORY_LIMIT: usize = 64;

#[derive(Default)]
struct HostTable {
    channels: HashMap<String, ChannelConfig>,
    indicators: HashMap<IndicatorId, PostedIndicator>,
    running: HashSet<ContextId>,
    faults: HashSet<HostFault>,
    revision: u64,
    posts: usize,
    restarts: VecDeque<(ContextId, bool)>,
    teardowns: VecDeque<ContextId>,
}

/// Appends to a bounded history, dropping the oldest entry when full.
fn remember<T>(history: &mut VecDeque<T>, entry: T) {
    if history.len() == REQUEST_HISTORY_LIMIT {
        history.pop_front();
    }
    history.push_back(entry);
}

impl HostTable {
    fn forget(&mut self, context: &ContextId) {
        self.running.remove(context);
        self.indicators.retain(|_, posted| &posted.owner != context);
    }
}

/// Host implementation backed by in-process tables.
pub struct MemoryHost {
    table: Mutex<HostTable>,
    launch_tx: mpsc::UnboundedSender<LaunchRequest>,
    launch_rx: Mutex<Option<mpsc::UnboundedReceiver<LaunchRequest>>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let (launch_tx, launch_rx) = mpsc::unbounded_channel();
        Self {
            table: Mutex::new(HostTable::default()),
            launch_tx,
            launch_rx: Mutex::new(Some(launch_rx)),
        }
    }

    /// Takes the receiving end of the launch request queue.
    ///
    /// Returns `None` after the first call.
    pub fn take_launch_requests(&self) -> Option<mpsc::UnboundedReceiver<LaunchRequest>> {
        self.launch_rx.lock().take()
    }

    pub fn inject(&self, fault: HostFault) {
        self.table.lock().faults.insert(fault);
    }

    pub fn clear(&self, fault: HostFault) {
        self.table.lock().faults.remove(&fault);
    }

    /// Drops `context` from the registry without notifying it, as when the
    /// host reclaims the process. Its indicators go with it.
    pub fn kill(&self, context: &ContextId) {
        log::info!("[MemoryHost] Killing {}", context);
        self.table.lock().forget(context);
    }

    /// Removes an indicator from the live set behind the owner's back.
    pub fn dismiss_indicator(&self, id: IndicatorId) -> bool {
        self.table.lock().indicators.remove(&id).is_some()
    }

    /// Deletes a registered channel, as a user clearing app notification
    /// settings would.
    pub fn delete_channel(&self, channel_id: &str) -> bool {
        self.table.lock().channels.remove(channel_id).is_some()
    }

    /// Total successful indicator posts since creation.
    pub fn post_count(&self) -> usize {
        self.table.lock().posts
    }

    /// The currently shown configuration for indicator `id`.
    pub fn indicator(&self, id: IndicatorId) -> Option<IndicatorConfig> {
        self.table
            .lock()
            .indicators
            .get(&id)
            .map(|posted| posted.config.clone())
    }

    pub fn channel(&self, channel_id: &str) -> Option<ChannelConfig> {
        self.table.lock().channels.get(channel_id).cloned()
    }

    pub fn is_registered(&self, context: &ContextId) -> bool {
        self.table.lock().running.contains(context)
    }

    /// The most recent restart requests, oldest first.
    pub fn restart_requests(&self) -> Vec<(ContextId, bool)> {
        self.table.lock().restarts.iter().cloned().collect()
    }

    /// The most recent teardown requests, oldest first.
    pub fn teardown_requests(&self) -> Vec<ContextId> {
        self.table.lock().teardowns.iter().cloned().collect()
    }

    fn forward(&self, request: LaunchRequest) {
        if let Err(e) = self.launch_tx.send(request) {
            log::trace!("[MemoryHost] No launch request consumer: {:?}", e.0);
        }
    }
}

#[async_trait]
impl IndicatorHost for MemoryHost {
    async fn register_channel(&self, channel: &ChannelConfig) -> PresentationResult<()> {
        let mut table = self.table.lock();
        // Channel settings are immutable once registered.
        table
            .channels
            .entry(channel.id.clone())
            .or_insert_with(|| channel.clone());
        Ok(())
    }

    async fn post_foreground(
        &self,
        context: &ContextId,
        indicator: &IndicatorConfig,
    ) -> PresentationResult<IndicatorHandle> {
        let mut table = self.table.lock();
        if table.faults.contains(&HostFault::RevokePermission) {
            return Err(PresentationError::PermissionRevoked);
        }
        if table.faults.contains(&HostFault::RejectPresentation) {
            return Err(PresentationError::Rejected("injected fault".to_string()));
        }
        if !table.channels.contains_key(&indicator.channel_id) {
            return Err(PresentationError::ChannelNotRegistered(
                indicator.channel_id.clone(),
            ));
        }

        table.indicators.insert(
            indicator.id,
            PostedIndicator {
                owner: context.clone(),
                config: indicator.clone(),
            },
        );
        table.revision += 1;
        table.posts += 1;

        Ok(IndicatorHandle {
            id: indicator.id,
            revision: table.revision,
        })
    }

    async fn active_indicators(&self) -> PresentationResult<Vec<IndicatorId>> {
        Ok(self.table.lock().indicators.keys().copied().collect())
    }
}

#[async_trait]
impl ServiceRegistry for MemoryHost {
    async fn is_running(&self, context: &ContextId) -> ProbeResult<bool> {
        let table = self.table.lock();
        if table.faults.contains(&HostFault::ProbeUnavailable) {
            return Err(ProbeError::RegistryUnavailable("injected fault".to_string()));
        }
        Ok(table.running.contains(context))
    }
}

#[async_trait]
impl ContextLifecycle for MemoryHost {
    async fn request_restart(
        &self,
        context: &ContextId,
        initial_playback: bool,
    ) -> RestartResult<()> {
        {
            let mut table = self.table.lock();
            if table.faults.contains(&HostFault::RejectRestart) {
                return Err(RestartRejected {
                    context: context.clone(),
                    reason: "injected fault".to_string(),
                });
            }
            remember(&mut table.restarts, (context.clone(), initial_playback));
        }

        self.forward(LaunchRequest::Restart {
            previous: context.clone(),
            initial_playback,
        });
        Ok(())
    }

    async fn request_teardown(&self, context: &ContextId) {
        {
            let mut table = self.table.lock();
            table.forget(context);
            remember(&mut table.teardowns, context.clone());
        }

        self.forward(LaunchRequest::Teardown {
            context: context.clone(),
        });
    }
}

impl ContextRegistrar for MemoryHost {
    fn context_created(&self, context: &ContextId) {
        self.table.lock().running.insert(context.clone());
    }

    fn context_destroyed(&self, context: &ContextId) {
        self.table.lock().forget(context);
    }
}
