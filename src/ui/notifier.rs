use async_trait::async_trait;
use serenity::builder::{CreateMessage, EditMessage};
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::player::notify::{NotifyError, NowPlayingHandle, PlayerNotifier};
use crate::player::state::Track;
use crate::ui::embeds;

/// Display real del reproductor: publica y edita embeds en el canal de texto
/// del guild. Los errores de envío se devuelven al motor, que los trata como
/// no fatales.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PlayerNotifier for DiscordNotifier {
    async fn now_playing(
        &self,
        channel_id: ChannelId,
        track: &Track,
    ) -> Result<NowPlayingHandle, NotifyError> {
        let message = channel_id
            .send_message(
                &self.http,
                CreateMessage::new().embed(embeds::create_now_playing_embed(track)),
            )
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        Ok(NowPlayingHandle {
            channel_id,
            message_id: message.id,
        })
    }

    async fn progress(
        &self,
        handle: NowPlayingHandle,
        track: &Track,
        elapsed: Duration,
    ) -> Result<(), NotifyError> {
        handle
            .channel_id
            .edit_message(
                &self.http,
                handle.message_id,
                EditMessage::new().embed(embeds::create_progress_embed(track, elapsed)),
            )
            .await
            .map_err(|e| NotifyError(e.to_string()))?;
        Ok(())
    }

    async fn playback_error(&self, channel_id: ChannelId, message: &str) {
        if let Err(e) = channel_id.say(&self.http, format!("❌ {}", message)).await {
            warn!("⚠️ No se pudo reportar el error al canal {}: {}", channel_id, e);
        }
    }
}
