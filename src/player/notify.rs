use async_trait::async_trait;
use serenity::model::id::{ChannelId, MessageId};
use std::time::Duration;
use thiserror::Error;

use crate::player::state::Track;

/// Referencia al mensaje de "Reproduciendo ahora" que el reporter de
/// progreso va editando.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NowPlayingHandle {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

#[derive(Debug, Error)]
#[error("no se pudo publicar el estado: {0}")]
pub struct NotifyError(pub String);

/// Colaborador de display del reproductor: anuncio de pista, progreso
/// periódico y errores visibles para el usuario. Los fallos de display
/// nunca se propagan al motor; a lo sumo detienen al reporter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerNotifier: Send + Sync + 'static {
    /// Publica el anuncio de pista nueva y devuelve el handle del mensaje
    /// para las ediciones de progreso.
    async fn now_playing(
        &self,
        channel_id: ChannelId,
        track: &Track,
    ) -> Result<NowPlayingHandle, NotifyError>;

    /// Actualiza el progreso de la pista activa.
    async fn progress(
        &self,
        handle: NowPlayingHandle,
        track: &Track,
        elapsed: Duration,
    ) -> Result<(), NotifyError>;

    /// Informa un error de reproducción al canal del guild.
    async fn playback_error(&self, channel_id: ChannelId, message: &str);
}
