//! Motor de reproducción por guild.
//!
//! Cada guild tiene un worker propio con su cola de mensajes: los comandos
//! de usuario, los fines de pista del sink y los ticks del reaper y del
//! reporter entran todos por ahí. Eso serializa toda mutación del estado de
//! un guild sin bloquear a los demás guilds, que corren en paralelo.

pub mod notify;
pub mod state;

mod progress;
mod reaper;
pub(crate) mod worker;

use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::error::{PlayerError, ResolutionError, UserInputError};
use crate::sources::{SearchCandidate, TrackResolver};
use crate::voice::AudioSink;
use worker::PlayerCommand;

pub use notify::{NotifyError, NowPlayingHandle, PlayerNotifier};
pub use state::Track;

/// Configuración del motor, derivada de la configuración global.
#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub default_volume: f32,
    pub max_queue_size: usize,
    pub idle_timeout: Duration,
    pub idle_check_period: Duration,
    pub progress_period: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            default_volume: 1.0,
            max_queue_size: 100,
            idle_timeout: Duration::from_secs(120),
            idle_check_period: Duration::from_secs(10),
            progress_period: Duration::from_secs(5),
        }
    }
}

/// Pedido de encolado: el locator tal como lo escribió el usuario, más un
/// título provisional si ya se conoce (por ejemplo al elegir de /search).
#[derive(Debug, Clone)]
pub struct TrackRequest {
    pub locator: String,
    pub title: Option<String>,
    pub requested_by: UserId,
}

/// Resultado de `remove_at`: quitar la posición activa equivale a `skip`.
#[derive(Debug)]
pub enum RemoveOutcome {
    Removed(Track),
    SkippedCurrent,
}

/// Motor de reproducción. Un registro por guild, creado en el primer uso y
/// vivo hasta el fin del proceso; el reset lógico (leave, timeout) limpia su
/// contenido pero nunca lo elimina.
pub struct PlaybackEngine {
    settings: PlayerSettings,
    resolver: Arc<dyn TrackResolver>,
    sink: Arc<dyn AudioSink>,
    notifier: Arc<dyn PlayerNotifier>,
    workers: DashMap<GuildId, mpsc::UnboundedSender<PlayerCommand>>,
}

impl PlaybackEngine {
    pub fn new(
        settings: PlayerSettings,
        resolver: Arc<dyn TrackResolver>,
        sink: Arc<dyn AudioSink>,
        notifier: Arc<dyn PlayerNotifier>,
    ) -> Self {
        Self {
            settings,
            resolver,
            sink,
            notifier,
            workers: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Agrega pedidos a la cola del guild y arranca la reproducción si no
    /// había nada sonando. Fija el canal de voz y el canal de display para
    /// las conexiones siguientes.
    pub async fn enqueue(
        &self,
        guild_id: GuildId,
        requests: Vec<TrackRequest>,
        voice_channel: ChannelId,
        display_channel: ChannelId,
    ) -> Result<usize, PlayerError> {
        let added = self
            .request(guild_id, |reply| PlayerCommand::Enqueue {
                requests,
                voice_channel,
                display_channel,
                reply,
            })
            .await??;
        Ok(added)
    }

    /// Busca candidatos para la selección interactiva. No toca estado de
    /// guild: el vínculo de canales ocurre recién al encolar la elección.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, ResolutionError> {
        self.resolver.search(query, limit).await
    }

    pub async fn skip(&self, guild_id: GuildId) -> Result<(), PlayerError> {
        self.request(guild_id, |reply| PlayerCommand::Skip { reply })
            .await?
            .map_err(PlayerError::from)
    }

    pub async fn pause(&self, guild_id: GuildId) -> Result<(), PlayerError> {
        self.request(guild_id, |reply| PlayerCommand::Pause { reply })
            .await?
            .map_err(PlayerError::from)
    }

    pub async fn resume(&self, guild_id: GuildId) -> Result<(), PlayerError> {
        self.request(guild_id, |reply| PlayerCommand::Resume { reply })
            .await?
            .map_err(PlayerError::from)
    }

    /// Ajusta el volumen del guild (porcentaje 0–100). Aplica en vivo a la
    /// sesión activa sin interrumpirla y queda para las pistas siguientes.
    pub async fn set_volume(&self, guild_id: GuildId, percent: i64) -> Result<(), PlayerError> {
        if !(0..=100).contains(&percent) {
            return Err(UserInputError::InvalidVolume.into());
        }
        let volume = percent as f32 / 100.0;
        self.request(guild_id, |reply| PlayerCommand::SetVolume { volume, reply })
            .await?;
        Ok(())
    }

    /// Quita la entrada en la posición 1-based de /queue. Sobre la posición
    /// activa equivale a `skip`.
    pub async fn remove_at(
        &self,
        guild_id: GuildId,
        position: usize,
    ) -> Result<RemoveOutcome, PlayerError> {
        self.request(guild_id, |reply| PlayerCommand::RemoveAt { position, reply })
            .await?
            .map_err(PlayerError::from)
    }

    /// Copia ordenada de la cola (la pista activa va primera).
    pub async fn list_queue(&self, guild_id: GuildId) -> Result<Vec<Track>, PlayerError> {
        self.request(guild_id, |reply| PlayerCommand::ListQueue { reply })
            .await
    }

    /// Pista activa y tiempo transcurrido, si hay algo sonando o pausado.
    pub async fn now_playing(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<(Track, Duration)>, PlayerError> {
        self.request(guild_id, |reply| PlayerCommand::NowPlaying { reply })
            .await
    }

    /// Corta la voz, limpia la cola y olvida los canales vinculados.
    pub async fn leave(&self, guild_id: GuildId) -> Result<(), PlayerError> {
        self.request(guild_id, |reply| PlayerCommand::Leave { reply })
            .await
    }

    /// Arranca el reaper de inactividad. Llamar una sola vez por proceso.
    pub fn spawn_idle_reaper(self: &Arc<Self>) {
        reaper::spawn(Arc::clone(self));
    }

    pub(crate) fn broadcast_idle_tick(&self, period: Duration) {
        for entry in self.workers.iter() {
            let _ = entry.value().send(PlayerCommand::IdleTick { period });
        }
    }

    /// Envía un comando al worker del guild (creándolo si es el primer uso)
    /// y espera la respuesta.
    async fn request<T>(
        &self,
        guild_id: GuildId,
        make: impl FnOnce(oneshot::Sender<T>) -> PlayerCommand,
    ) -> Result<T, PlayerError> {
        let (reply, rx) = oneshot::channel();
        self.worker(guild_id)
            .send(make(reply))
            .map_err(|_| PlayerError::WorkerGone)?;
        rx.await.map_err(|_| PlayerError::WorkerGone)
    }

    fn worker(&self, guild_id: GuildId) -> mpsc::UnboundedSender<PlayerCommand> {
        self.workers
            .entry(guild_id)
            .or_insert_with(|| {
                worker::spawn(
                    guild_id,
                    self.settings.clone(),
                    Arc::clone(&self.resolver),
                    Arc::clone(&self.sink),
                    Arc::clone(&self.notifier),
                )
            })
            .clone()
    }
}
