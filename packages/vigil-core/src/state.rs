//! Core state types.
//!
//! [`StateStore`] holds the two booleans that define the system state plus the
//! generation of the execution context that owns it. It performs no
//! validation: every combination is representable, and it is the
//! supervisor's job to reconcile undesirable combinations after the fact.
//!
//! [`Config`] carries the tunables shared by the core and the daemon.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    COMMAND_CHANNEL_CAPACITY, DEFAULT_TICK_INTERVAL_MS, EVENT_CHANNEL_CAPACITY, INDICATOR_ID,
    SERVICE_NAME,
};

/// Logical playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    Playing,
    Stopped,
}

impl From<bool> for PlaybackState {
    fn from(playing: bool) -> Self {
        if playing {
            Self::Playing
        } else {
            Self::Stopped
        }
    }
}

/// Whether a foreground indicator has been posted for the context.
///
/// Once `Posted`, this never returns to `NotPosted` for the lifetime of the
/// context: hiding re-posts a minimized indicator instead of removing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorState {
    Posted,
    NotPosted,
}

impl From<bool> for IndicatorState {
    fn from(posted: bool) -> Self {
        if posted {
            Self::Posted
        } else {
            Self::NotPosted
        }
    }
}

/// Per-context state, exclusively owned by one execution context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateStore {
    playback_active: bool,
    indicator_posted: bool,
    generation: u64,
}

impl StateStore {
    /// Creates an empty store for the context of the given generation.
    pub fn new(generation: u64) -> Self {
        Self {
            playback_active: false,
            indicator_posted: false,
            generation,
        }
    }

    pub fn set_playback(&mut self, active: bool) {
        self.playback_active = active;
    }

    pub fn get_playback(&self) -> bool {
        self.playback_active
    }

    pub fn set_indicator_posted(&mut self, posted: bool) {
        self.indicator_posted = posted;
    }

    pub fn get_indicator_posted(&self) -> bool {
        self.indicator_posted
    }

    /// Generation of the owning execution context.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback_active.into()
    }

    pub fn indicator_state(&self) -> IndicatorState {
        self.indicator_posted.into()
    }
}

/// Configuration for the Vigil supervisor.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Name the service is registered under with the host.
    pub service_name: String,

    /// Interval between reconciliation ticks (milliseconds).
    pub tick_interval_ms: u64,

    /// Identity of the foreground indicator.
    pub indicator_id: u32,

    /// Capacity of each context's inbound command queue.
    pub command_capacity: usize,

    /// Capacity of the outbound broadcast channel.
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            indicator_id: INDICATOR_ID,
            command_capacity: COMMAND_CHANNEL_CAPACITY,
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.service_name.is_empty() {
            return Err("service_name must not be empty".to_string());
        }
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be >= 1".to_string());
        }
        if self.command_capacity == 0 {
            return Err("command_capacity must be >= 1 (mpsc::channel panics on 0)".to_string());
        }
        if self.event_capacity == 0 {
            return Err(
                "event_capacity must be >= 1 (broadcast::channel panics on 0)".to_string(),
            );
        }
        Ok(())
    }

    /// Tick interval as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_starts_stopped_and_not_posted() {
        let store = StateStore::new(7);
        assert_eq!(store.playback_state(), PlaybackState::Stopped);
        assert_eq!(store.indicator_state(), IndicatorState::NotPosted);
        assert_eq!(store.generation(), 7);
    }

    #[test]
    fn store_accepts_every_combination() {
        let mut store = StateStore::new(1);
        for playing in [false, true] {
            for posted in [false, true] {
                store.set_playback(playing);
                store.set_indicator_posted(posted);
                assert_eq!(store.get_playback(), playing);
                assert_eq!(store.get_indicator_posted(), posted);
            }
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_secs(5));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = Config {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_capacities_are_rejected() {
        let config = Config {
            command_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            event_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"tick_interval_ms": 250}"#).unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.indicator_id, INDICATOR_ID);
        assert_eq!(config.service_name, SERVICE_NAME);
    }
}
