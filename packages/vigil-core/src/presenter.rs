//! Foreground indicator presentation.
//!
//! [`IndicatorPresenter`] posts and re-posts the persistent indicator for one
//! execution context. It has no removal operation: a foreground context must
//! always carry an indicator, so "hiding" re-posts the
//! [`IndicatorStyle::Minimized`] variant.

use std::sync::Arc;

use crate::context::ContextId;
use crate::error::{PresentationError, PresentationResult};
use crate::host::{
    ChannelConfig, IndicatorConfig, IndicatorHandle, IndicatorHost, IndicatorId, IndicatorStyle,
};

/// Posts the foreground indicator for one execution context.
pub struct IndicatorPresenter {
    host: Arc<dyn IndicatorHost>,
    context: ContextId,
    channel: ChannelConfig,
    indicator_id: IndicatorId,
    channel_registered: bool,
}

impl IndicatorPresenter {
    pub fn new(
        host: Arc<dyn IndicatorHost>,
        context: ContextId,
        indicator_id: IndicatorId,
    ) -> Self {
        Self {
            host,
            context,
            channel: ChannelConfig::background_playback(),
            indicator_id,
            channel_registered: false,
        }
    }

    /// Registers the notification channel if that has not succeeded yet.
    ///
    /// Called eagerly at context creation and lazily before every post, so a
    /// failed registration is retried on the next presentation.
    pub async fn ensure_channel(&mut self) -> PresentationResult<()> {
        if self.channel_registered {
            return Ok(());
        }
        self.host.register_channel(&self.channel).await?;
        self.channel_registered = true;
        log::debug!("[Presenter] Registered channel {}", self.channel.id);
        Ok(())
    }

    /// Posts the indicator in the given style.
    ///
    /// Idempotent: every call replaces the indicator with the same id, so
    /// repeated calls with the same style produce no visible change.
    ///
    /// If the host has lost the channel since it was registered, the channel is
    /// registered again and the post retried once.
    pub async fn present(&mut self, style: IndicatorStyle) -> PresentationResult<IndicatorHandle> {
        self.ensure_channel().await?;
        let config = IndicatorConfig::foreground(self.indicator_id, &self.channel, style);
        let handle = match self.host.post_foreground(&self.context, &config).await {
            Err(PresentationError::ChannelNotRegistered(channel)) => {
                log::warn!("[Presenter] Channel {} vanished, registering again", channel);
                self.channel_registered = false;
                self.ensure_channel().await?;
                self.host.post_foreground(&self.context, &config).await?
            }
            result => result?,
        };
        log::debug!(
            "[Presenter] Posted {:?} indicator for {} (revision {})",
            style,
            self.context,
            handle.revision
        );
        Ok(handle)
    }

    /// Checks whether the indicator is still in the host's live set.
    pub async fn is_live(&self) -> PresentationResult<bool> {
        let active = self.host.active_indicators().await?;
        Ok(active.contains(&self.indicator_id))
    }
}
