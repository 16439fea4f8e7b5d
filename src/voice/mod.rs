pub mod songbird_sink;

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};

use crate::error::{ConnectionError, PlaybackError};

pub use songbird_sink::SongbirdSink;

/// Callback de fin de pista. Para cada `play` que devolvió `Ok`, el adapter
/// lo invoca exactamente una vez, termine la pista de forma natural, por
/// `stop` o por error del stream. Si `play` devolvió `Err`, la sesión nunca
/// arrancó y el callback se descarta sin invocarse.
pub type TrackEndCallback = Box<dyn FnOnce() + Send + 'static>;

/// Transporte de audio por guild. A lo sumo una sesión de audio viva por
/// guild: un `play` sobre una sesión activa la reemplaza, nunca la duplica.
#[async_trait]
pub trait AudioSink: Send + Sync + 'static {
    /// Conecta al canal de voz. Idempotente: si ya hay una conexión válida a
    /// ese canal, la reutiliza.
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), ConnectionError>;

    /// Arranca la reproducción de un stream con el volumen dado.
    async fn play(
        &self,
        guild_id: GuildId,
        stream_url: &str,
        volume: f32,
        on_end: TrackEndCallback,
    ) -> Result<(), PlaybackError>;

    /// Pausa la sesión activa. `false` = no había nada que pausar.
    async fn pause(&self, guild_id: GuildId) -> bool;

    /// Reanuda la sesión pausada. `false` = no había nada pausado.
    async fn resume(&self, guild_id: GuildId) -> bool;

    /// Ajusta el volumen en vivo, sin interrumpir la reproducción.
    async fn set_volume(&self, guild_id: GuildId, volume: f32);

    /// Detiene la sesión activa. El callback de fin igual se dispara,
    /// una única vez.
    async fn stop(&self, guild_id: GuildId);

    /// Corta la conexión de voz del guild.
    async fn disconnect(&self, guild_id: GuildId);

    /// Hay una conexión de voz viva para el guild.
    fn is_connected(&self, guild_id: GuildId) -> bool;
}
