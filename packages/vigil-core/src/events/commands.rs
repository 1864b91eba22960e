//! Inbound command vocabulary and the per-context command queue.
//!
//! Every execution context owns exactly one [`CommandReceiver`]; all
//! commands for that context are serialized through it. Delivery is
//! at-least-once, so every handler must tolerate duplicates.

use tokio::sync::mpsc;

use crate::context::ContextId;
use crate::error::{VigilError, VigilResult};

/// Commands the application layer can send to an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start (or re-enter) the service with the given playback state.
    Start { playback_active: bool },
    /// User pressed stop on the indicator; relayed back to the application.
    Stop,
    /// Post the indicator.
    ShowIndicator,
    /// Re-post a minimized indicator if one is posted.
    HideIndicator,
    /// Playback started or ended.
    UpdatePlayback { playing: bool },
    /// Post the indicator outside the tick cadence.
    ForceShow,
    /// Post a minimized indicator outside the tick cadence.
    ForceHide,
    /// Run one reconciliation pass now.
    ForceSync,
    /// Ping from the application while it is alive.
    KeepAlive,
}

impl Command {
    /// Maps a host action name to a command.
    ///
    /// `playing` carries the boolean extra of `UPDATE_RADIO_STATE` and is
    /// ignored by every other action.
    pub fn from_action(action: &str, playing: bool) -> VigilResult<Self> {
        let command = match action {
            "START" | "START_RADIO_BACKGROUND" => Self::Start {
                playback_active: true,
            },
            "START_SILENT" => Self::Start {
                playback_active: false,
            },
            "RADIO_STOP" => Self::Stop,
            "SHOW_NOTIFICATION" => Self::ShowIndicator,
            "HIDE_NOTIFICATION" => Self::HideIndicator,
            "UPDATE_RADIO_STATE" => Self::UpdatePlayback { playing },
            "FORCE_SHOW_NOTIFICATION" => Self::ForceShow,
            "FORCE_HIDE_NOTIFICATION" => Self::ForceHide,
            "FORCE_COMPLETE_SYNC" => Self::ForceSync,
            "KEEP_SERVICE_ALIVE" => Self::KeepAlive,
            other => return Err(VigilError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// Creates the command queue for one execution context.
pub fn command_channel(context: ContextId, capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (CommandSender { context, tx }, CommandReceiver { rx })
}

/// Cloneable sending half of a context's command queue.
#[derive(Clone)]
pub struct CommandSender {
    context: ContextId,
    tx: mpsc::Sender<Command>,
}

impl CommandSender {
    /// Queues a command, waiting for capacity.
    pub async fn send(&self, command: Command) -> VigilResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| VigilError::ContextClosed(self.context.clone()))
    }

    /// Queues a command without waiting.
    pub fn try_send(&self, command: Command) -> VigilResult<()> {
        self.tx
            .try_send(command)
            .map_err(|_| VigilError::ContextClosed(self.context.clone()))
    }

    /// Whether the receiving context has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, owned by the execution context.
pub struct CommandReceiver {
    rx: mpsc::Receiver<Command>,
}

impl CommandReceiver {
    pub async fn recv(&mut self) -> Option<Command> {
        self.rx.recv().await
    }

    /// Stops accepting new commands; queued ones can still be drained.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_action_maps_host_names() {
        assert_eq!(
            Command::from_action("UPDATE_RADIO_STATE", true).unwrap(),
            Command::UpdatePlayback { playing: true }
        );
        assert_eq!(
            Command::from_action("START_SILENT", true).unwrap(),
            Command::Start {
                playback_active: false
            }
        );
        assert_eq!(
            Command::from_action("FORCE_COMPLETE_SYNC", false).unwrap(),
            Command::ForceSync
        );
        assert_eq!(
            Command::from_action("RADIO_STOP", false).unwrap(),
            Command::Stop
        );
    }

    #[test]
    fn from_action_rejects_unknown_names() {
        let err = Command::from_action("PLAY_LOUDER", false).unwrap_err();
        assert!(matches!(err, VigilError::UnknownCommand(name) if name == "PLAY_LOUDER"));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = command_channel(ContextId::new("svc", 1), 4);
        tx.send(Command::KeepAlive).await.unwrap();

        drop(rx);

        assert!(tx.is_closed());
        assert!(matches!(
            tx.send(Command::KeepAlive).await,
            Err(VigilError::ContextClosed(_))
        ));
    }
}
