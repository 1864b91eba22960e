//! Reconciliation supervisor.
//!
//! Responsibilities:
//! - Periodic drift detection between logical playback state, the posted
//!   indicator and the host's view of the execution context
//! - Applying at most one corrective action per tick
//! - Explicit command entry points (start, stop, force show/hide, force sync)
//!
//! The supervisor does not own a timer task. Its pending tick is a deadline
//! ([`SupervisorPhase::Scheduled`]) that the owning execution context waits
//! on, so replacing or clearing the phase cancels the tick completely.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::constants::STOP_ACTION;
use crate::context::ContextId;
use crate::error::{ErrorCode, VigilResult};
use crate::events::{EventEmitter, RelayEvent, SupervisorEvent};
use crate::host::{ContextLifecycle, IndicatorStyle};
use crate::presenter::IndicatorPresenter;
use crate::probe::LivenessProbe;
use crate::state::StateStore;
use crate::utils::now_millis;

/// The correction chosen by one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CorrectiveAction {
    /// State is consistent.
    None,
    /// The host no longer lists the context; ask it to re-create it.
    RestartContext,
    /// Playing without an indicator.
    ForcePresent,
    /// Stopped with an indicator posted; re-post it minimized.
    ForceMinimize,
    /// Playing and marked posted, but the host lost the indicator.
    RestorePresent,
}

impl CorrectiveAction {
    /// Chooses the highest-priority correction for an observation.
    pub fn decide(observation: &Observation) -> Self {
        if !observation.running {
            return Self::RestartContext;
        }
        match (observation.playback_active, observation.indicator_posted) {
            (true, false) => Self::ForcePresent,
            (false, true) => Self::ForceMinimize,
            (true, true) if observation.indicator_live == Some(false) => Self::RestorePresent,
            _ => Self::None,
        }
    }
}

/// What one reconciliation pass saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub playback_active: bool,
    pub indicator_posted: bool,
    pub running: bool,
    /// Whether the indicator is in the host's live set. Only queried while
    /// running, playing and posted; `None` otherwise.
    pub indicator_live: Option<bool>,
}

/// Scheduling state of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorPhase {
    /// No tick pending.
    Idle,
    /// Exactly one tick pending, due at `due`.
    Scheduled { due: Instant },
    /// A tick body is executing.
    Running,
}

/// Result of a timer-driven tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Playback is active; the next tick is scheduled.
    Rescheduled,
    /// Playback is inactive; supervision stopped until the next start.
    Quiesced,
    /// A restart was requested; the new context supervises itself.
    RestartIssued,
}

/// Self-healing control loop for one execution context.
pub struct ReconciliationSupervisor {
    context: ContextId,
    interval: Duration,
    phase: SupervisorPhase,
    state: StateStore,
    presenter: IndicatorPresenter,
    probe: LivenessProbe,
    lifecycle: Arc<dyn ContextLifecycle>,
    emitter: Arc<dyn EventEmitter>,
}

impl ReconciliationSupervisor {
    /// Creates an idle supervisor.
    ///
    /// # Arguments
    /// * `context` - Identity of the supervised execution context
    /// * `state` - The context's state store, handed over for its lifetime
    /// * `presenter` - Indicator presenter bound to the same context
    /// * `probe` - Liveness probe bound to the same context
    /// * `lifecycle` - Host lifecycle for restart and teardown requests
    /// * `emitter` - Outbound event sink
    /// * `interval` - Fixed delay between ticks
    pub fn new(
        context: ContextId,
        state: StateStore,
        presenter: IndicatorPresenter,
        probe: LivenessProbe,
        lifecycle: Arc<dyn ContextLifecycle>,
        emitter: Arc<dyn EventEmitter>,
        interval: Duration,
    ) -> Self {
        Self {
            context,
            interval,
            phase: SupervisorPhase::Idle,
            state,
            presenter,
            probe,
            lifecycle,
            emitter,
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn phase(&self) -> SupervisorPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == SupervisorPhase::Idle
    }

    /// Deadline of the pending tick, if any.
    pub fn next_due(&self) -> Option<Instant> {
        match self.phase {
            SupervisorPhase::Scheduled { due } => Some(due),
            _ => None,
        }
    }

    /// Number of pending ticks; never more than one.
    pub fn pending_ticks(&self) -> usize {
        usize::from(self.next_due().is_some())
    }

    /// Registers the indicator channel ahead of the first post.
    pub async fn ensure_channel(&mut self) -> VigilResult<()> {
        self.presenter.ensure_channel().await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scheduling
    // ─────────────────────────────────────────────────────────────────────────

    /// Schedules the next tick one interval from now, replacing any pending one.
    pub fn start(&mut self) {
        if let SupervisorPhase::Scheduled { .. } = self.phase {
            log::debug!("[Supervisor] Replacing pending tick for {}", self.context);
        }
        self.schedule_next();
    }

    /// Drops the pending tick.
    pub fn cancel(&mut self) {
        self.phase = SupervisorPhase::Idle;
    }

    fn schedule_next(&mut self) {
        self.phase = SupervisorPhase::Scheduled {
            due: Instant::now() + self.interval,
        };
    }

    /// Runs the tick body. Called by the owner when the deadline passes.
    pub async fn on_timer(&mut self) -> TickOutcome {
        self.phase = SupervisorPhase::Running;
        let outcome = self.run_tick().await;

        match outcome {
            TickOutcome::Rescheduled => self.schedule_next(),
            TickOutcome::Quiesced => {
                self.phase = SupervisorPhase::Idle;
                log::info!(
                    "[Supervisor] Playback inactive, supervision of {} quiesced",
                    self.context
                );
                self.emitter.emit_supervisor(SupervisorEvent::Quiesced {
                    generation: self.context.generation,
                    timestamp: now_millis(),
                });
            }
            TickOutcome::RestartIssued => self.phase = SupervisorPhase::Idle,
        }

        outcome
    }

    async fn run_tick(&mut self) -> TickOutcome {
        match self.reconcile().await {
            Ok(CorrectiveAction::RestartContext) => return TickOutcome::RestartIssued,
            Ok(_) => {}
            Err(e) => {
                log::warn!(
                    "[Supervisor] Tick for {} failed ({}): {}",
                    self.context,
                    e.code(),
                    e
                );
            }
        }

        if self.state.get_playback() {
            TickOutcome::Rescheduled
        } else {
            TickOutcome::Quiesced
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconciliation
    // ─────────────────────────────────────────────────────────────────────────

    /// Observes, decides and applies one corrective action.
    ///
    /// Does not touch the scheduling phase.
    pub async fn reconcile(&mut self) -> VigilResult<CorrectiveAction> {
        let observation = self.observe().await?;
        let action = CorrectiveAction::decide(&observation);
        log::debug!(
            "[Supervisor] {} observed {:?} -> {:?}",
            self.context,
            observation,
            action
        );
        self.apply(action).await?;
        Ok(action)
    }

    async fn observe(&self) -> VigilResult<Observation> {
        let playback_active = self.state.get_playback();
        let indicator_posted = self.state.get_indicator_posted();
        let running = self.probe.is_running().await?;

        let indicator_live = if running && playback_active && indicator_posted {
            Some(self.presenter.is_live().await?)
        } else {
            None
        };

        Ok(Observation {
            playback_active,
            indicator_posted,
            running,
            indicator_live,
        })
    }

    async fn apply(&mut self, action: CorrectiveAction) -> VigilResult<()> {
        match action {
            CorrectiveAction::None => return Ok(()),
            CorrectiveAction::RestartContext => {
                let playback_active = self.state.get_playback();
                log::warn!(
                    "[Supervisor] {} not registered as running, requesting restart",
                    self.context
                );
                if let Err(e) = self
                    .lifecycle
                    .request_restart(&self.context, playback_active)
                    .await
                {
                    log::error!("[Supervisor] {}", e);
                    self.relay(STOP_ACTION);
                    return Err(e.into());
                }
                self.emitter.emit_supervisor(SupervisorEvent::RestartRequested {
                    generation: self.context.generation,
                    playback_active,
                    timestamp: now_millis(),
                });
            }
            CorrectiveAction::ForcePresent | CorrectiveAction::RestorePresent => {
                self.presenter.present(IndicatorStyle::Standard).await?;
                self.state.set_indicator_posted(true);
            }
            CorrectiveAction::ForceMinimize => {
                self.presenter.present(IndicatorStyle::Minimized).await?;
                self.state.set_indicator_posted(true);
            }
        }

        log::info!("[Supervisor] Applied {:?} to {}", action, self.context);
        self.emitter.emit_supervisor(SupervisorEvent::CorrectionApplied {
            generation: self.context.generation,
            action,
            timestamp: now_millis(),
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Command entry points
    // ─────────────────────────────────────────────────────────────────────────

    /// Sets the playback state, posts the indicator within the same call, and
    /// starts supervision.
    pub async fn on_start(&mut self, initial_playback: bool) {
        self.state.set_playback(initial_playback);

        let style = if initial_playback {
            IndicatorStyle::Standard
        } else {
            IndicatorStyle::Minimized
        };
        match self.presenter.present(style).await {
            Ok(_) => self.state.set_indicator_posted(true),
            Err(e) => log::error!(
                "[Supervisor] Initial indicator for {} failed ({}): {}",
                self.context,
                e.code(),
                e
            ),
        }

        self.emitter.emit_supervisor(SupervisorEvent::ContextStarted {
            generation: self.context.generation,
            playback_active: initial_playback,
            timestamp: now_millis(),
        });
        self.start();
    }

    /// Playback ended: stop supervising and ask the host to tear the context
    /// down. The indicator goes with the context.
    pub async fn on_stop(&mut self) {
        self.state.set_playback(false);
        self.cancel();
        log::info!("[Supervisor] Playback ended, tearing down {}", self.context);
        self.lifecycle.request_teardown(&self.context).await;
        self.emitter.emit_supervisor(SupervisorEvent::ContextStopped {
            generation: self.context.generation,
            timestamp: now_millis(),
        });
    }

    /// Posts the indicator outside the tick cadence.
    ///
    /// Records the indicator as posted even if the host refused; while playing,
    /// the next tick's live-set check restores it.
    pub async fn on_force_show(&mut self) -> VigilResult<()> {
        self.force(IndicatorStyle::Standard).await
    }

    /// Re-posts the indicator minimized outside the tick cadence.
    pub async fn on_force_hide(&mut self) -> VigilResult<()> {
        self.force(IndicatorStyle::Minimized).await
    }

    async fn force(&mut self, style: IndicatorStyle) -> VigilResult<()> {
        let result = self.presenter.present(style).await;
        self.state.set_indicator_posted(true);
        result?;
        Ok(())
    }

    /// Posts the indicator; marks it posted only if the host accepted it.
    pub async fn on_show(&mut self) -> VigilResult<()> {
        self.presenter.present(IndicatorStyle::Standard).await?;
        self.state.set_indicator_posted(true);
        Ok(())
    }

    /// Minimizes the indicator if one is posted; otherwise does nothing.
    pub async fn on_hide(&mut self) -> VigilResult<()> {
        if !self.state.get_indicator_posted() {
            log::debug!(
                "[Supervisor] No indicator posted for {}, nothing to hide",
                self.context
            );
            return Ok(());
        }
        self.presenter.present(IndicatorStyle::Minimized).await?;
        Ok(())
    }

    /// Runs one reconciliation pass on demand without touching scheduling.
    pub async fn on_force_sync(&mut self) -> VigilResult<CorrectiveAction> {
        self.reconcile().await
    }

    /// Resumes supervision if playback is active but no tick is pending.
    ///
    /// Returns whether supervision was restarted.
    pub fn on_keep_alive(&mut self) -> bool {
        if self.state.get_playback() && self.is_idle() {
            log::info!(
                "[Supervisor] Keep-alive resumed supervision of {}",
                self.context
            );
            self.start();
            return true;
        }
        false
    }

    /// Playback (re)started while the context is alive.
    pub async fn on_playback_started(&mut self) {
        if let Err(e) = self.on_force_show().await {
            log::warn!(
                "[Supervisor] Indicator for {} not posted ({}): {}",
                self.context,
                e.code(),
                e
            );
        }
        self.state.set_playback(true);
        if self.is_idle() {
            self.start();
        }
    }

    /// Asks the application layer to stop playback.
    pub fn request_user_stop(&self) {
        self.relay(STOP_ACTION);
    }

    fn relay(&self, action: &str) {
        log::info!("[Supervisor] Relaying {} to the application", action);
        self.emitter.emit_relay(RelayEvent::PlaybackActionRequested {
            action: action.to_string(),
            timestamp: now_millis(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BroadcastEvent, BroadcastEventBridge};
    use crate::host::{ContextRegistrar, HostFault, IndicatorHost, IndicatorId, MemoryHost};
    use tokio::sync::broadcast;

    const INTERVAL: Duration = Duration::from_secs(5);

    struct Fixture {
        host: Arc<MemoryHost>,
        events: broadcast::Receiver<BroadcastEvent>,
        supervisor: ReconciliationSupervisor,
    }

    fn fixture() -> Fixture {
        let host = Arc::new(MemoryHost::new());
        let bridge = BroadcastEventBridge::new(32);
        let events = bridge.subscribe();
        let context = ContextId::new("svc", 1);
        host.context_created(&context);

        let supervisor = ReconciliationSupervisor::new(
            context.clone(),
            StateStore::new(context.generation),
            IndicatorPresenter::new(host.clone(), context.clone(), IndicatorId::default()),
            LivenessProbe::new(host.clone(), context.clone()),
            host.clone(),
            Arc::new(bridge),
            INTERVAL,
        );

        Fixture {
            host,
            events,
            supervisor,
        }
    }

    fn drain(events: &mut broadcast::Receiver<BroadcastEvent>) -> Vec<BroadcastEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Decision table
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn not_running_always_restarts() {
        for playback_active in [false, true] {
            for indicator_posted in [false, true] {
                let observation = Observation {
                    playback_active,
                    indicator_posted,
                    running: false,
                    indicator_live: None,
                };
                assert_eq!(
                    CorrectiveAction::decide(&observation),
                    CorrectiveAction::RestartContext
                );
            }
        }
    }

    #[test]
    fn decision_priority_while_running() {
        let observe = |playback_active, indicator_posted, indicator_live| Observation {
            playback_active,
            indicator_posted,
            running: true,
            indicator_live,
        };

        assert_eq!(
            CorrectiveAction::decide(&observe(true, false, None)),
            CorrectiveAction::ForcePresent
        );
        assert_eq!(
            CorrectiveAction::decide(&observe(false, true, None)),
            CorrectiveAction::ForceMinimize
        );
        assert_eq!(
            CorrectiveAction::decide(&observe(true, true, Some(false))),
            CorrectiveAction::RestorePresent
        );
        assert_eq!(
            CorrectiveAction::decide(&observe(true, true, Some(true))),
            CorrectiveAction::None
        );
        assert_eq!(
            CorrectiveAction::decide(&observe(false, false, None)),
            CorrectiveAction::None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn one_tick_converges_from_every_reachable_state() {
        for playing in [false, true] {
            for posted in [false, true] {
                for running in [false, true] {
                    let mut f = fixture();
                    f.supervisor.state.set_playback(playing);
                    f.supervisor.state.set_indicator_posted(posted);
                    if !running {
                        f.host.kill(&f.supervisor.context);
                    }
                    f.supervisor.start();

                    let outcome = f.supervisor.on_timer().await;

                    if outcome == TickOutcome::RestartIssued {
                        assert!(!running);
                        assert_eq!(f.host.restart_requests().len(), 1);
                    } else {
                        let state = f.supervisor.state();
                        assert!(!state.get_playback() || state.get_indicator_posted());
                        assert!(f.host.is_registered(&f.supervisor.context));
                    }
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scheduling
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn repeated_start_leaves_one_pending_tick() {
        let mut f = fixture();

        for _ in 0..5 {
            f.supervisor.start();
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        assert_eq!(f.supervisor.pending_ticks(), 1);
        let due = f.supervisor.next_due().unwrap();
        assert_eq!(due, Instant::now() - Duration::from_millis(100) + INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_clears_pending_tick() {
        let mut f = fixture();
        f.supervisor.start();

        f.supervisor.cancel();

        assert!(f.supervisor.is_idle());
        assert_eq!(f.supervisor.pending_ticks(), 0);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scenarios
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn start_presents_immediately_then_tick_is_quiet() {
        let mut f = fixture();

        f.supervisor.on_start(true).await;
        assert_eq!(f.host.post_count(), 1);
        assert_eq!(f.supervisor.pending_ticks(), 1);

        tokio::time::advance(INTERVAL).await;
        let outcome = f.supervisor.on_timer().await;

        assert_eq!(outcome, TickOutcome::Rescheduled);
        assert!(f.supervisor.state().get_indicator_posted());
        assert_eq!(f.host.post_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_indicator_flag_is_forced_back() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;
        f.supervisor.state.set_indicator_posted(false);

        let outcome = f.supervisor.on_timer().await;

        assert_eq!(outcome, TickOutcome::Rescheduled);
        assert!(f.supervisor.state().get_indicator_posted());
        assert_eq!(f.host.post_count(), 2);
        assert_eq!(f.supervisor.pending_ticks(), 1);
        assert!(drain(&mut f.events).iter().any(|e| matches!(
            e,
            BroadcastEvent::Supervisor(SupervisorEvent::CorrectionApplied {
                action: CorrectiveAction::ForcePresent,
                ..
            })
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn dead_context_requests_restart_and_stops_ticking() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;
        f.host.kill(&f.supervisor.context);

        let outcome = f.supervisor.on_timer().await;

        assert_eq!(outcome, TickOutcome::RestartIssued);
        assert!(f.supervisor.is_idle());
        assert_eq!(
            f.host.restart_requests(),
            vec![(f.supervisor.context.clone(), true)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_tick_and_requests_teardown() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;

        f.supervisor.on_stop().await;

        assert!(!f.supervisor.state().get_playback());
        assert_eq!(f.supervisor.pending_ticks(), 0);
        assert_eq!(
            f.host.teardown_requests(),
            vec![f.supervisor.context.clone()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_force_sync_has_no_extra_side_effects() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;
        let posts = f.host.post_count();
        let phase = f.supervisor.phase();

        let first = f.supervisor.on_force_sync().await.unwrap();
        let second = f.supervisor.on_force_sync().await.unwrap();

        assert_eq!(first, CorrectiveAction::None);
        assert_eq!(second, CorrectiveAction::None);
        assert_eq!(f.host.post_count(), posts);
        assert_eq!(f.supervisor.phase(), phase);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Corrections and failures
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn lost_indicator_is_restored() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;
        f.host.dismiss_indicator(IndicatorId::default());

        let action = f.supervisor.reconcile().await.unwrap();

        assert_eq!(action, CorrectiveAction::RestorePresent);
        assert!(f.host.indicator(IndicatorId::default()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_with_indicator_is_minimized_then_quiesces() {
        let mut f = fixture();
        f.supervisor.on_start(false).await;

        let outcome = f.supervisor.on_timer().await;

        assert_eq!(outcome, TickOutcome::Quiesced);
        assert!(f.supervisor.is_idle());
        let shown = f.host.indicator(IndicatorId::default()).unwrap();
        assert_eq!(shown.style, IndicatorStyle::Minimized);
        assert!(f.supervisor.state().get_indicator_posted());
    }

    #[tokio::test(start_paused = true)]
    async fn presentation_failure_retries_next_tick() {
        let mut f = fixture();
        f.supervisor.state.set_playback(true);
        f.host.inject(HostFault::RejectPresentation);

        assert_eq!(f.supervisor.on_timer().await, TickOutcome::Rescheduled);
        assert!(!f.supervisor.state().get_indicator_posted());

        f.host.clear(HostFault::RejectPresentation);
        assert_eq!(f.supervisor.on_timer().await, TickOutcome::Rescheduled);
        assert!(f.supervisor.state().get_indicator_posted());
    }

    #[tokio::test(start_paused = true)]
    async fn probe_failure_keeps_supervising_while_playing() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;
        f.host.inject(HostFault::ProbeUnavailable);

        assert_eq!(f.supervisor.on_timer().await, TickOutcome::Rescheduled);
        assert!(f.host.restart_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_restart_is_relayed_and_retried() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;
        f.host.kill(&f.supervisor.context);
        f.host.inject(HostFault::RejectRestart);

        let outcome = f.supervisor.on_timer().await;

        assert_eq!(outcome, TickOutcome::Rescheduled);
        assert!(drain(&mut f.events).iter().any(|e| matches!(
            e,
            BroadcastEvent::Relay(RelayEvent::PlaybackActionRequested { action, .. })
                if action == STOP_ACTION
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn force_show_records_posted_even_when_rejected() {
        let mut f = fixture();
        f.host.inject(HostFault::RejectPresentation);

        assert!(f.supervisor.on_force_show().await.is_err());
        assert!(f.supervisor.state().get_indicator_posted());
    }

    #[tokio::test(start_paused = true)]
    async fn show_records_posted_only_on_success() {
        let mut f = fixture();
        f.host.inject(HostFault::RejectPresentation);

        assert!(f.supervisor.on_show().await.is_err());
        assert!(!f.supervisor.state().get_indicator_posted());
    }

    #[tokio::test(start_paused = true)]
    async fn hide_without_indicator_posts_nothing() {
        let mut f = fixture();

        f.supervisor.on_hide().await.unwrap();

        assert_eq!(f.host.post_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_resumes_only_idle_playing_supervisor() {
        let mut f = fixture();
        assert!(!f.supervisor.on_keep_alive());

        f.supervisor.state.set_playback(true);
        assert!(f.supervisor.on_keep_alive());
        assert!(!f.supervisor.on_keep_alive());
        assert_eq!(f.supervisor.pending_ticks(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Command handlers
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn user_stop_is_relayed_to_application() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;
        drain(&mut f.events);

        f.supervisor.request_user_stop();

        let events = drain(&mut f.events);
        assert!(matches!(
            events.as_slice(),
            [BroadcastEvent::Relay(RelayEvent::PlaybackActionRequested { action, .. })]
                if action == STOP_ACTION
        ));
        assert!(f.supervisor.state().get_playback());
        assert!(f.host.teardown_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hide_reposts_minimized_when_posted() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;

        f.supervisor.on_hide().await.unwrap();

        let shown = f.host.indicator(IndicatorId::default()).unwrap();
        assert_eq!(shown.style, IndicatorStyle::Minimized);
        assert_eq!(f.host.post_count(), 2);
        assert!(f.supervisor.state().get_indicator_posted());
    }

    #[tokio::test(start_paused = true)]
    async fn force_hide_minimizes_and_keeps_posted() {
        let mut f = fixture();

        f.supervisor.on_force_hide().await.unwrap();

        let shown = f.host.indicator(IndicatorId::default()).unwrap();
        assert_eq!(shown.style, IndicatorStyle::Minimized);
        assert!(f.supervisor.state().get_indicator_posted());

        f.supervisor.on_force_hide().await.unwrap();
        assert!(f.supervisor.state().get_indicator_posted());
        assert_eq!(f.host.active_indicators().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn playback_started_shows_and_resumes_supervision() {
        let mut f = fixture();
        assert!(f.supervisor.is_idle());

        f.supervisor.on_playback_started().await;

        let shown = f.host.indicator(IndicatorId::default()).unwrap();
        assert_eq!(shown.style, IndicatorStyle::Standard);
        assert!(f.supervisor.state().get_playback());
        assert!(f.supervisor.state().get_indicator_posted());
        assert_eq!(f.supervisor.pending_ticks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn playback_started_keeps_pending_tick() {
        let mut f = fixture();
        f.supervisor.on_start(true).await;
        let due = f.supervisor.next_due();
        tokio::time::advance(Duration::from_secs(1)).await;

        f.supervisor.on_playback_started().await;

        assert_eq!(f.supervisor.next_due(), due);
    }
}
