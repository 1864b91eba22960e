//! Execution context: one running instance of the playback service.
//!
//! Each context is a single tokio task that owns its supervisor (and through
//! it the [`StateStore`](crate::state::StateStore)). Commands and timer fires
//! are serialized through one `select!` loop, so no two handlers ever run at
//! the same time and the state needs no locking.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ErrorCode, VigilResult};
use crate::events::{command_channel, Command, CommandReceiver, CommandSender, EventEmitter};
use crate::host::{HostServices, IndicatorId};
use crate::presenter::IndicatorPresenter;
use crate::probe::LivenessProbe;
use crate::state::{Config, StateStore};
use crate::supervisor::ReconciliationSupervisor;

/// Identity of an execution context as known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextId {
    /// Service name the host registers the context under.
    pub service: Arc<str>,
    /// Monotonic instance number assigned at creation.
    pub generation: u64,
}

impl ContextId {
    pub fn new(service: impl Into<Arc<str>>, generation: u64) -> Self {
        Self {
            service: service.into(),
            generation,
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.service, self.generation)
    }
}

/// Why a context's task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextExit {
    /// Playback ended and the context asked to be torn down.
    TornDown,
    /// The host (or its owner) cancelled the context.
    Killed,
    /// Every command sender was dropped.
    Detached,
}

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Owner-side handle to a running context.
pub struct ContextHandle {
    id: ContextId,
    commands: CommandSender,
    cancel: CancellationToken,
    task: JoinHandle<ContextExit>,
}

impl ContextHandle {
    pub fn id(&self) -> &ContextId {
        &self.id
    }

    /// A sender for this context's command queue.
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    pub async fn send(&self, command: Command) -> VigilResult<()> {
        self.commands.send(command).await
    }

    /// Whether the context's task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the context, as the host does when reclaiming it.
    pub fn kill(&self) {
        self.cancel.cancel();
    }

    /// Waits for the context's task to end.
    pub async fn join(self) -> ContextExit {
        match self.task.await {
            Ok(exit) => exit,
            Err(e) => {
                log::error!("[Context] {} task failed: {}", self.id, e);
                ContextExit::Killed
            }
        }
    }
}

/// One execution context: supervisor plus command queue.
pub struct ExecutionContext {
    id: ContextId,
    supervisor: ReconciliationSupervisor,
    commands: CommandReceiver,
    cancel: CancellationToken,
}

impl ExecutionContext {
    /// Builds the context and its collaborators.
    pub fn new(
        id: ContextId,
        host: HostServices,
        emitter: Arc<dyn EventEmitter>,
        config: &Config,
    ) -> (Self, CommandSender) {
        let (sender, commands) = command_channel(id.clone(), config.command_capacity);

        let supervisor = ReconciliationSupervisor::new(
            id.clone(),
            StateStore::new(id.generation),
            IndicatorPresenter::new(
                host.indicators,
                id.clone(),
                IndicatorId(config.indicator_id),
            ),
            LivenessProbe::new(host.registry, id.clone()),
            host.lifecycle,
            emitter,
            config.tick_interval(),
        );

        let context = Self {
            id,
            supervisor,
            commands,
            cancel: CancellationToken::new(),
        };
        (context, sender)
    }

    /// Spawns the context on the current tokio runtime.
    pub fn spawn(
        id: ContextId,
        host: HostServices,
        emitter: Arc<dyn EventEmitter>,
        config: &Config,
    ) -> ContextHandle {
        let (context, commands) = Self::new(id.clone(), host, emitter, config);
        let cancel = context.cancel.clone();
        let task = tokio::spawn(context.run());
        ContextHandle {
            id,
            commands,
            cancel,
            task,
        }
    }

    /// Runs the context until teardown, cancellation or detachment.
    pub async fn run(mut self) -> ContextExit {
        log::info!("[Context] {} created", self.id);

        // The channel is registered before first use; a failure here is
        // retried lazily by the first post.
        if let Err(e) = self.supervisor.ensure_channel().await {
            log::warn!("[Context] {} channel registration failed: {}", self.id, e);
        }

        let exit = loop {
            let due = self.supervisor.next_due();
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break ContextExit::Killed,

                command = self.commands.recv() => match command {
                    Some(command) => {
                        if self.handle(command).await == Flow::Exit {
                            break ContextExit::TornDown;
                        }
                    }
                    None => break ContextExit::Detached,
                },

                _ = wait_until(due) => {
                    let outcome = self.supervisor.on_timer().await;
                    log::debug!("[Context] {} tick: {:?}", self.id, outcome);
                }
            }
        };

        self.commands.close();
        self.supervisor.cancel();
        log::info!("[Context] {} destroyed ({:?})", self.id, exit);
        exit
    }

    async fn handle(&mut self, command: Command) -> Flow {
        log::debug!("[Context] {} received {:?}", self.id, command);

        let result = match command {
            Command::Start { playback_active } => {
                self.supervisor.on_start(playback_active).await;
                Ok(())
            }
            Command::Stop => {
                self.supervisor.request_user_stop();
                Ok(())
            }
            Command::ShowIndicator => self.supervisor.on_show().await,
            Command::HideIndicator => self.supervisor.on_hide().await,
            Command::UpdatePlayback { playing: true } => {
                self.supervisor.on_playback_started().await;
                Ok(())
            }
            Command::UpdatePlayback { playing: false } => {
                self.supervisor.on_stop().await;
                return Flow::Exit;
            }
            Command::ForceShow => self.supervisor.on_force_show().await,
            Command::ForceHide => self.supervisor.on_force_hide().await,
            Command::ForceSync => self.supervisor.on_force_sync().await.map(|action| {
                log::info!("[Context] {} force sync applied {:?}", self.id, action);
            }),
            Command::KeepAlive => {
                self.supervisor.on_keep_alive();
                Ok(())
            }
        };

        if let Err(e) = result {
            log::warn!(
                "[Context] {} failed to handle {:?} ({}): {}",
                self.id,
                command,
                e.code(),
                e
            );
        }
        Flow::Continue
    }
}

/// Resolves at `due`, or never when nothing is scheduled.
async fn wait_until(due: Option<Instant>) {
    match due {
        Some(due) => tokio::time::sleep_until(due).await,
        None => std::future::pending().await,
    }
}
