use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use reqwest::Client as HttpClient;
use serenity::model::id::{ChannelId, GuildId};
use songbird::input::{HttpRequest, Input};
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent};
use std::sync::Arc;
use tracing::{debug, info};

use super::{AudioSink, TrackEndCallback};
use crate::error::{ConnectionError, PlaybackError};

type EndSlot = Arc<Mutex<Option<TrackEndCallback>>>;

struct ActiveTrack {
    handle: TrackHandle,
    on_end: EndSlot,
    paused: bool,
}

/// Adapter de songbird: una sesión de audio por guild. El callback de fin se
/// guarda en un slot de un solo uso, así que se dispara exactamente una vez
/// por reproducción, termine como termine.
pub struct SongbirdSink {
    manager: Arc<Songbird>,
    http: HttpClient,
    active: DashMap<GuildId, ActiveTrack>,
}

impl SongbirdSink {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self {
            manager,
            http: HttpClient::new(),
            active: DashMap::new(),
        }
    }

    fn fire_end(slot: &EndSlot) {
        if let Some(callback) = slot.lock().take() {
            callback();
        }
    }
}

/// Dispara el callback de fin la primera vez que la pista termina o falla;
/// cualquier evento posterior encuentra el slot vacío.
struct TrackEndNotifier {
    slot: EndSlot,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        SongbirdSink::fire_end(&self.slot);
        None
    }
}

#[async_trait]
impl AudioSink for SongbirdSink {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), ConnectionError> {
        // Reconectar al mismo canal con una sesión viva es un no-op.
        if let Some(call) = self.manager.get(guild_id) {
            let call_lock = call.lock().await;
            if call_lock.current_connection().is_some()
                && call_lock.current_channel() == Some(channel_id.into())
            {
                return Ok(());
            }
        }

        self.manager
            .join(guild_id, channel_id)
            .await
            .map_err(|e| ConnectionError::Join(e.to_string()))?;

        info!(
            "🔊 Conectado al canal de voz {} en guild {}",
            channel_id, guild_id
        );
        Ok(())
    }

    async fn play(
        &self,
        guild_id: GuildId,
        stream_url: &str,
        volume: f32,
        on_end: TrackEndCallback,
    ) -> Result<(), PlaybackError> {
        let call = self
            .manager
            .get(guild_id)
            .ok_or_else(|| PlaybackError::Start("sin conexión de voz".to_string()))?;

        // Reemplazar, nunca duplicar: una sola sesión por guild.
        if let Some((_, previous)) = self.active.remove(&guild_id) {
            let _ = previous.handle.stop();
            Self::fire_end(&previous.on_end);
        }

        let input = Input::from(HttpRequest::new(self.http.clone(), stream_url.to_string()));

        let handle = {
            let mut call_lock = call.lock().await;
            call_lock.play_input(input)
        };

        let _ = handle.set_volume(volume);

        let slot: EndSlot = Arc::new(Mutex::new(Some(on_end)));
        let registered = handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndNotifier { slot: slot.clone() },
            )
            .and_then(|()| {
                handle.add_event(
                    Event::Track(TrackEvent::Error),
                    TrackEndNotifier { slot: slot.clone() },
                )
            });

        if let Err(e) = registered {
            // Sin eventos no hay garantía de fin: se aborta la sesión y el
            // callback se descarta sin disparar, como promete el contrato.
            slot.lock().take();
            let _ = handle.stop();
            return Err(PlaybackError::Start(e.to_string()));
        }

        self.active.insert(
            guild_id,
            ActiveTrack {
                handle,
                on_end: slot,
                paused: false,
            },
        );

        Ok(())
    }

    async fn pause(&self, guild_id: GuildId) -> bool {
        let handle = match self.active.get(&guild_id) {
            Some(active) if !active.paused => active.handle.clone(),
            _ => return false,
        };

        match handle.get_info().await {
            Ok(info) if info.playing == PlayMode::Play => {
                if handle.pause().is_err() {
                    return false;
                }
                if let Some(mut active) = self.active.get_mut(&guild_id) {
                    active.paused = true;
                }
                true
            }
            _ => false,
        }
    }

    async fn resume(&self, guild_id: GuildId) -> bool {
        let handle = match self.active.get(&guild_id) {
            Some(active) if active.paused => active.handle.clone(),
            _ => return false,
        };

        if handle.play().is_err() {
            return false;
        }
        if let Some(mut active) = self.active.get_mut(&guild_id) {
            active.paused = false;
        }
        true
    }

    async fn set_volume(&self, guild_id: GuildId, volume: f32) {
        if let Some(active) = self.active.get(&guild_id) {
            let _ = active.handle.set_volume(volume);
        }
    }

    async fn stop(&self, guild_id: GuildId) {
        if let Some((_, active)) = self.active.remove(&guild_id) {
            let _ = active.handle.stop();
            // El fin se entrega acá mismo; el evento End que songbird emita
            // después encuentra el slot ya vacío.
            Self::fire_end(&active.on_end);
        }
    }

    async fn disconnect(&self, guild_id: GuildId) {
        if let Err(e) = self.manager.remove(guild_id).await {
            debug!("La desconexión de voz en guild {} falló: {}", guild_id, e);
        }
        self.active.remove(&guild_id);
        info!("👋 Desconectado del canal de voz en guild {}", guild_id);
    }

    fn is_connected(&self, guild_id: GuildId) -> bool {
        self.manager.get(guild_id).is_some()
    }
}
