//! Fixed host-facing constants.
//!
//! These values identify the service, its indicator and its notification
//! channel to the host. Changing them between releases orphans indicators and
//! channels that the host has already registered.

// ─────────────────────────────────────────────────────────────────────────────
// Service identity
// ─────────────────────────────────────────────────────────────────────────────

/// Name under which the playback service is registered with the host.
pub const SERVICE_NAME: &str = "vigil.PlaybackBackgroundService";

// ─────────────────────────────────────────────────────────────────────────────
// Indicator / notification channel
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of the persistent foreground indicator.
///
/// A single id is reused for every post so that re-posting replaces the
/// existing indicator instead of stacking a new one.
pub const INDICATOR_ID: u32 = 1001;

/// Notification channel the indicator is posted on.
pub const CHANNEL_ID: &str = "vigil.playback.background";

/// Human-readable channel name shown in host settings.
pub const CHANNEL_NAME: &str = "Vigil Radio";

/// Channel description shown in host settings.
pub const CHANNEL_DESCRIPTION: &str = "Keeps radio playback alive in the background";

// ─────────────────────────────────────────────────────────────────────────────
// Supervision cadence
// ─────────────────────────────────────────────────────────────────────────────

/// Interval between reconciliation ticks (milliseconds).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 5000;

// ─────────────────────────────────────────────────────────────────────────────
// Relay actions
// ─────────────────────────────────────────────────────────────────────────────

/// Action relayed to the application layer when playback must stop.
pub const STOP_ACTION: &str = "STOP_RADIO";

// ─────────────────────────────────────────────────────────────────────────────
// Channel capacities
// ─────────────────────────────────────────────────────────────────────────────

/// Capacity of the per-context inbound command queue.
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the outbound broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;
