use chrono::{DateTime, Utc};
use serenity::model::id::{ChannelId, UserId};
use std::collections::VecDeque;

use crate::player::notify::NowPlayingHandle;
use crate::sources::ResolvedTrack;

/// Una pista de la cola. Valor inmutable: por cada intento de reproducción
/// se construye una pista nueva con el stream recién resuelto.
#[derive(Debug, Clone)]
pub struct Track {
    /// URL original o término de búsqueda tal como lo pidió el usuario.
    pub locator: String,
    /// Stream directo de audio. Vacío hasta resolver; expira, así que nunca
    /// se conserva entre esperas de cola.
    pub stream_url: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration_seconds: Option<u64>,
    pub requested_by: UserId,
    pub requested_at: DateTime<Utc>,
}

impl Track {
    /// Entrada de cola aún sin resolver. Mientras no haya título se muestra
    /// el locator, igual que hace la cola con URLs recién agregadas.
    pub fn placeholder(locator: String, title: Option<String>, requested_by: UserId) -> Self {
        Self {
            title: title.unwrap_or_else(|| locator.clone()),
            locator,
            stream_url: String::new(),
            thumbnail: None,
            duration_seconds: None,
            requested_by,
            requested_at: Utc::now(),
        }
    }

    /// Pista lista para reproducir, construida a partir de una resolución
    /// fresca del locator.
    pub fn from_resolution(locator: &str, resolved: &ResolvedTrack, requested_by: UserId) -> Self {
        Self {
            locator: locator.to_string(),
            stream_url: resolved.stream_url.clone(),
            title: resolved.title.clone(),
            thumbnail: resolved.thumbnail.clone(),
            duration_seconds: resolved.duration_seconds,
            requested_by,
            requested_at: Utc::now(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.stream_url.is_empty()
    }
}

/// Estado mutable de un guild. Propiedad exclusiva del worker de ese guild:
/// toda mutación pasa por su cola de mensajes, nunca por acceso compartido.
#[derive(Debug)]
pub struct GuildMusicState {
    /// Cola FIFO. Mientras hay pista activa, `queue[0]` es esa pista:
    /// sacarla de la cola y limpiar `current` es una sola transición.
    pub queue: VecDeque<Track>,
    /// No-vacío exactamente mientras hay sesión de audio (sonando o pausada).
    pub current: Option<Track>,
    pub volume: f32,
    /// Canal al que (re)conectarse, fijado por el último /play o /search,
    /// independiente del estado real de la conexión.
    pub bound_voice_channel: Option<ChannelId>,
    pub display_channel: Option<ChannelId>,
    pub now_playing_msg: Option<NowPlayingHandle>,
    pub idle_seconds: u64,
}

impl GuildMusicState {
    pub fn new(default_volume: f32) -> Self {
        Self {
            queue: VecDeque::new(),
            current: None,
            volume: default_volume,
            bound_voice_channel: None,
            display_channel: None,
            now_playing_msg: None,
            idle_seconds: 0,
        }
    }
}
