//! Line-oriented stdin console.
//!
//! Each line is either a host action name routed to the current context, or
//! a simulation directive acting on the in-memory host.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use vigil_core::constants::CHANNEL_ID;
use vigil_core::{Command, ContextManager, HostFault, IndicatorId, MemoryHost};

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    /// A host action for the current context.
    Action(Command),
    /// The host drops the current context without notice.
    Kill,
    /// The indicator disappears from the host's live set.
    Dismiss,
    /// The user deletes the notification channel.
    RevokeChannel,
    /// Switches a host fault on or off.
    Fault { fault: HostFault, enabled: bool },
    /// Logs the current context and indicator.
    Status,
}

impl ConsoleLine {
    /// Parses one line; blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default();
        let parsed = match head {
            "kill" => Self::Kill,
            "dismiss" => Self::Dismiss,
            "revoke-channel" => Self::RevokeChannel,
            "status" => Self::Status,
            "fault" => {
                let fault = parse_fault(words.next())?;
                let enabled = match words.next() {
                    Some("on") => true,
                    Some("off") => false,
                    other => bail!("expected on|off after fault name, got {:?}", other),
                };
                Self::Fault { fault, enabled }
            }
            action => {
                let playing = match words.next() {
                    None => false,
                    Some(flag) => flag
                        .parse()
                        .map_err(|_| anyhow!("expected true|false after {}, got {}", action, flag))?,
                };
                Self::Action(Command::from_action(action, playing)?)
            }
        };
        Ok(Some(parsed))
    }
}

fn parse_fault(name: Option<&str>) -> Result<HostFault> {
    match name {
        Some("reject-presentation") => Ok(HostFault::RejectPresentation),
        Some("revoke-permission") => Ok(HostFault::RevokePermission),
        Some("probe-unavailable") => Ok(HostFault::ProbeUnavailable),
        Some("reject-restart") => Ok(HostFault::RejectRestart),
        other => bail!("unknown fault {:?}", other),
    }
}

/// Executes console lines against the manager and the in-memory host.
pub struct Console {
    manager: Arc<ContextManager>,
    host: Arc<MemoryHost>,
    indicator_id: IndicatorId,
}

impl Console {
    pub fn new(
        manager: Arc<ContextManager>,
        host: Arc<MemoryHost>,
        indicator_id: IndicatorId,
    ) -> Self {
        Self {
            manager,
            host,
            indicator_id,
        }
    }

    /// Reads lines until EOF, executing each one.
    ///
    /// Bad lines are logged and skipped.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, reader: R) -> Result<()> {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let parsed = match ConsoleLine::parse(&line) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("[Console] {}", e);
                    continue;
                }
            };
            if let Err(e) = self.execute(parsed).await {
                log::warn!("[Console] {}", e);
            }
        }
        log::info!("[Console] Input closed");
        Ok(())
    }

    pub async fn execute(&self, line: ConsoleLine) -> Result<()> {
        match line {
            ConsoleLine::Action(command) => self.manager.command(command).await?,
            ConsoleLine::Kill => {
                let context = self
                    .manager
                    .current_context()
                    .ok_or_else(|| anyhow!("no context to kill"))?;
                self.host.kill(&context);
            }
            ConsoleLine::Dismiss => {
                if !self.host.dismiss_indicator(self.indicator_id) {
                    bail!("indicator {} is not posted", self.indicator_id.0);
                }
            }
            ConsoleLine::RevokeChannel => {
                if !self.host.delete_channel(CHANNEL_ID) {
                    bail!("channel {} is not registered", CHANNEL_ID);
                }
            }
            ConsoleLine::Fault { fault, enabled } => {
                if enabled {
                    self.host.inject(fault);
                } else {
                    self.host.clear(fault);
                }
                log::info!("[Console] Fault {:?} enabled={}", fault, enabled);
            }
            ConsoleLine::Status => {
                let context = self
                    .manager
                    .current_context()
                    .map_or_else(|| "none".to_string(), |id| id.to_string());
                log::info!(
                    "[Console] context={} indicator_live={} posts={}",
                    context,
                    self.host.indicator(self.indicator_id).is_some(),
                    self.host.post_count()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vigil_core::{Config, HostServices, NoopEventEmitter, VigilError};

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn parses_actions_and_directives() {
        assert_eq!(
            ConsoleLine::parse("UPDATE_RADIO_STATE true").unwrap(),
            Some(ConsoleLine::Action(Command::UpdatePlayback { playing: true }))
        );
        assert_eq!(
            ConsoleLine::parse("  FORCE_COMPLETE_SYNC ").unwrap(),
            Some(ConsoleLine::Action(Command::ForceSync))
        );
        assert_eq!(
            ConsoleLine::parse("fault probe-unavailable on").unwrap(),
            Some(ConsoleLine::Fault {
                fault: HostFault::ProbeUnavailable,
                enabled: true
            })
        );
        assert_eq!(ConsoleLine::parse("# comment").unwrap(), None);
        assert_eq!(ConsoleLine::parse("").unwrap(), None);
    }

    #[test]
    fn rejects_unknown_input() {
        let err = ConsoleLine::parse("PLAY_LOUDER").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VigilError>(),
            Some(VigilError::UnknownCommand(_))
        ));
        assert!(ConsoleLine::parse("fault gremlins on").is_err());
        assert!(ConsoleLine::parse("fault reject-restart maybe").is_err());
        assert!(ConsoleLine::parse("UPDATE_RADIO_STATE yes").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn script_recovers_dismissed_indicator() {
        let host = Arc::new(MemoryHost::new());
        let manager = ContextManager::new(
            HostServices::from_host(host.clone()),
            host.clone(),
            Arc::new(NoopEventEmitter),
            Config::default(),
        )
        .unwrap();
        manager
            .clone()
            .start_launcher(host.take_launch_requests().unwrap());
        let console = Console::new(manager.clone(), host.clone(), IndicatorId::default());

        console.run(&b"START\nbogus line\n"[..]).await.unwrap();
        settle().await;
        assert!(host.indicator(IndicatorId::default()).is_some());

        console.execute(ConsoleLine::Dismiss).await.unwrap();
        assert!(host.indicator(IndicatorId::default()).is_none());

        tokio::time::sleep(Duration::from_millis(5100)).await;
        settle().await;

        assert!(host.indicator(IndicatorId::default()).is_some());
        assert_eq!(host.post_count(), 2);
    }
}
