//! Data types exchanged with the host's indicator API.

use serde::Serialize;

use crate::constants::{CHANNEL_DESCRIPTION, CHANNEL_ID, CHANNEL_NAME, INDICATOR_ID};

/// Identity of a posted indicator (the host's notification id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IndicatorId(pub u32);

impl Default for IndicatorId {
    fn default() -> Self {
        Self(INDICATOR_ID)
    }
}

/// Returned by the host after a successful foreground post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorHandle {
    pub id: IndicatorId,
    /// Monotonic post counter kept by the host (re-posts bump it).
    pub revision: u64,
}

/// Channel importance. Only the minimum level is ever used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Importance {
    Min,
    Low,
    Default,
}

/// Per-indicator priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Min,
    Default,
}

/// Lock-screen visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Secret,
    Private,
    Public,
}

/// Indicator category hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Service,
    Transport,
}

/// How the indicator should look when (re)posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorStyle {
    /// Regular minimum-priority indicator while playing.
    Standard,
    /// Content-less indicator used in place of a removal.
    Minimized,
}

/// Notification channel registration.
///
/// The host requires the channel to be registered once, before first use,
/// with a configuration that cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub importance: Importance,
    pub show_badge: bool,
    pub lights: bool,
    pub vibration: bool,
    pub sound: bool,
    pub lockscreen_visibility: Visibility,
    pub bypass_dnd: bool,
}

impl ChannelConfig {
    /// The fixed minimum-importance channel used for the playback indicator.
    pub fn background_playback() -> Self {
        Self {
            id: CHANNEL_ID.to_string(),
            name: CHANNEL_NAME.to_string(),
            description: CHANNEL_DESCRIPTION.to_string(),
            importance: Importance::Min,
            show_badge: false,
            lights: false,
            vibration: false,
            sound: false,
            lockscreen_visibility: Visibility::Secret,
            bypass_dnd: false,
        }
    }
}

/// Everything the host needs to post the foreground indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorConfig {
    pub id: IndicatorId,
    pub channel_id: String,
    pub priority: Priority,
    /// Non-dismissible.
    pub ongoing: bool,
    pub auto_cancel: bool,
    pub silent: bool,
    pub category: Category,
    pub visibility: Visibility,
    pub style: IndicatorStyle,
}

impl IndicatorConfig {
    /// Minimum-priority, silent, non-dismissible indicator on `channel`.
    pub fn foreground(id: IndicatorId, channel: &ChannelConfig, style: IndicatorStyle) -> Self {
        Self {
            id,
            channel_id: channel.id.clone(),
            priority: Priority::Min,
            ongoing: true,
            auto_cancel: false,
            silent: true,
            category: Category::Service,
            visibility: Visibility::Secret,
            style,
        }
    }
}
