//! Context manager - the composition root for execution contexts.
//!
//! The manager plays the part of the host's service launcher: it assigns
//! generations, spawns contexts, routes commands to the live one, and acts on
//! restart / teardown requests coming back from the host.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::context::{ContextHandle, ContextId, ExecutionContext};
use crate::error::{VigilError, VigilResult};
use crate::events::{Command, EventEmitter};
use crate::host::{ContextRegistrar, HostServices, LaunchRequest};
use crate::state::Config;

/// The live context and the last generation handed out, guarded together so
/// a newer generation is never replaced by an older one.
#[derive(Default)]
struct ContextSlot {
    generation: u64,
    current: Option<ContextHandle>,
}

impl ContextSlot {
    /// Whether `context` is the live handle. A forgotten context is never
    /// current.
    fn is_current(&self, context: &ContextId) -> bool {
        self.current
            .as_ref()
            .is_some_and(|handle| handle.id() == context)
    }
}

/// Owns the current execution context and re-creates it on demand.
pub struct ContextManager {
    host: HostServices,
    registrar: Arc<dyn ContextRegistrar>,
    emitter: Arc<dyn EventEmitter>,
    config: Config,
    slot: Mutex<ContextSlot>,
    /// Token to signal the launcher task to stop.
    cancel_token: CancellationToken,
}

impl ContextManager {
    /// Creates a manager with no context running.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Configuration`] if `config` is invalid.
    pub fn new(
        host: HostServices,
        registrar: Arc<dyn ContextRegistrar>,
        emitter: Arc<dyn EventEmitter>,
        config: Config,
    ) -> VigilResult<Arc<Self>> {
        config.validate().map_err(VigilError::Configuration)?;
        Ok(Arc::new(Self {
            host,
            registrar,
            emitter,
            config,
            slot: Mutex::new(ContextSlot::default()),
            cancel_token: CancellationToken::new(),
        }))
    }

    /// Identity of the live context, if any.
    pub fn current_context(&self) -> Option<ContextId> {
        self.slot
            .lock()
            .current
            .as_ref()
            .filter(|handle| !handle.is_finished())
            .map(|handle| handle.id().clone())
    }

    /// Starts a context silently (playback stopped), as after a device boot.
    pub fn boot(&self) -> VigilResult<ContextId> {
        log::info!("[ContextManager] Boot start");
        self.launch(false)
    }

    /// Replaces any current context with a fresh generation started with
    /// `initial_playback`.
    pub fn launch(&self, initial_playback: bool) -> VigilResult<ContextId> {
        let mut slot = self.slot.lock();
        self.launch_in(&mut slot, initial_playback)
    }

    /// Launches the next generation into `slot`. The caller holds the lock
    /// for the whole replacement.
    fn launch_in(&self, slot: &mut ContextSlot, initial_playback: bool) -> VigilResult<ContextId> {
        slot.generation += 1;
        let id = ContextId::new(self.config.service_name.as_str(), slot.generation);

        self.registrar.context_created(&id);
        let handle =
            ExecutionContext::spawn(id.clone(), self.host.clone(), self.emitter.clone(), &self.config);
        handle.commands().try_send(Command::Start {
            playback_active: initial_playback,
        })?;

        if let Some(previous) = slot.current.replace(handle) {
            self.retire(previous);
        }

        log::info!(
            "[ContextManager] Launched {} (playback_active={})",
            id,
            initial_playback
        );
        Ok(id)
    }

    /// Delivers a command to the live context.
    ///
    /// A `Start` with no live context launches one; any other command
    /// without a live context fails with [`VigilError::NoContext`].
    pub async fn command(&self, command: Command) -> VigilResult<()> {
        let sender = {
            let mut slot = self.slot.lock();
            let live = slot
                .current
                .as_ref()
                .filter(|handle| !handle.commands().is_closed())
                .map(ContextHandle::commands);
            match (live, command) {
                (Some(sender), _) => sender,
                (None, Command::Start { playback_active }) => {
                    return self.launch_in(&mut slot, playback_active).map(|_| ());
                }
                (None, _) => return Err(VigilError::NoContext),
            }
        };
        sender.send(command).await
    }

    /// Spawns the task that acts on the host's launch requests.
    pub fn start_launcher(self: Arc<Self>, mut requests: mpsc::UnboundedReceiver<LaunchRequest>) {
        let cancel_token = self.cancel_token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        log::info!("[ContextManager] Shutting down launcher");
                        break;
                    }
                    request = requests.recv() => match request {
                        Some(request) => self.handle_launch_request(request),
                        None => break,
                    },
                }
            }
        });
    }

    fn handle_launch_request(&self, request: LaunchRequest) {
        match request {
            LaunchRequest::Restart {
                previous,
                initial_playback,
            } => {
                let mut slot = self.slot.lock();
                if !slot.is_current(&previous) {
                    log::debug!("[ContextManager] Ignoring restart of stale {}", previous);
                    return;
                }
                if let Err(e) = self.launch_in(&mut slot, initial_playback) {
                    log::error!("[ContextManager] Restart of {} failed: {}", previous, e);
                }
            }
            LaunchRequest::Teardown { context } => {
                let mut slot = self.slot.lock();
                if slot.is_current(&context) {
                    if let Some(handle) = slot.current.take() {
                        drop(slot);
                        self.retire(handle);
                    }
                }
            }
        }
    }

    fn retire(&self, handle: ContextHandle) {
        log::info!("[ContextManager] Retiring {}", handle.id());
        self.registrar.context_destroyed(handle.id());
        handle.kill();
    }

    /// Stops the launcher and the current context.
    pub async fn shutdown(&self) {
        log::info!("[ContextManager] Beginning shutdown...");
        self.cancel_token.cancel();

        let current = self.slot.lock().current.take();
        if let Some(handle) = current {
            self.registrar.context_destroyed(handle.id());
            handle.kill();
            let exit = handle.join().await;
            log::info!("[ContextManager] Context ended: {:?}", exit);
        }
    }
}
