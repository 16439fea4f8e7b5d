use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::UserInputError;
use crate::player::notify::PlayerNotifier;
use crate::player::state::{GuildMusicState, Track};
use crate::player::{progress, PlayerSettings, RemoveOutcome, TrackRequest};
use crate::sources::TrackResolver;
use crate::voice::{AudioSink, TrackEndCallback};

/// Mensajes que entran al worker de un guild. Comandos de usuario, fines de
/// pista y ticks de las tareas de fondo viajan todos por el mismo canal: esa
/// es la serialización por guild.
pub(crate) enum PlayerCommand {
    Enqueue {
        requests: Vec<TrackRequest>,
        voice_channel: ChannelId,
        display_channel: ChannelId,
        reply: oneshot::Sender<Result<usize, UserInputError>>,
    },
    Skip {
        reply: oneshot::Sender<Result<(), UserInputError>>,
    },
    Pause {
        reply: oneshot::Sender<Result<(), UserInputError>>,
    },
    Resume {
        reply: oneshot::Sender<Result<(), UserInputError>>,
    },
    SetVolume {
        volume: f32,
        reply: oneshot::Sender<()>,
    },
    RemoveAt {
        position: usize,
        reply: oneshot::Sender<Result<RemoveOutcome, UserInputError>>,
    },
    ListQueue {
        reply: oneshot::Sender<Vec<Track>>,
    },
    NowPlaying {
        reply: oneshot::Sender<Option<(Track, Duration)>>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
    /// Fin de la reproducción `generation`. Lo envía el callback del sink
    /// desde el hilo del driver; un fin de una generación ya descartada se
    /// ignora.
    TrackEnded { generation: u64 },
    /// Tick del reaper de inactividad.
    IdleTick { period: Duration },
    /// Tick del reporter de progreso de la reproducción `generation`.
    /// La respuesta indica si el reporter debe seguir vivo.
    ProgressTick {
        generation: u64,
        reply: oneshot::Sender<bool>,
    },
}

pub(crate) struct GuildWorker {
    guild_id: GuildId,
    state: GuildMusicState,
    /// Generación de reproducción: se incrementa en cada `play` y en cada
    /// descarte de sesión. Un `TrackEnded`/`ProgressTick` con generación
    /// vieja es un mensaje obsoleto.
    generation: u64,
    started_at: Option<Instant>,
    settings: PlayerSettings,
    resolver: Arc<dyn TrackResolver>,
    sink: Arc<dyn AudioSink>,
    notifier: Arc<dyn PlayerNotifier>,
    tx: mpsc::UnboundedSender<PlayerCommand>,
}

/// Lanza el worker de un guild y devuelve el extremo de envío de su canal.
/// El worker vive lo que dure el proceso.
pub(crate) fn spawn(
    guild_id: GuildId,
    settings: PlayerSettings,
    resolver: Arc<dyn TrackResolver>,
    sink: Arc<dyn AudioSink>,
    notifier: Arc<dyn PlayerNotifier>,
) -> mpsc::UnboundedSender<PlayerCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    let worker = GuildWorker {
        guild_id,
        state: GuildMusicState::new(settings.default_volume),
        generation: 0,
        started_at: None,
        settings,
        resolver,
        sink,
        notifier,
        tx: tx.clone(),
    };
    tokio::spawn(worker.run(rx));
    tx
}

impl GuildWorker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PlayerCommand>) {
        debug!("🧵 Worker de reproducción iniciado para guild {}", self.guild_id);
        while let Some(cmd) = rx.recv().await {
            self.handle(cmd).await;
        }
        debug!("🛑 Worker de guild {} terminado", self.guild_id);
    }

    async fn handle(&mut self, cmd: PlayerCommand) {
        match cmd {
            PlayerCommand::Enqueue {
                requests,
                voice_channel,
                display_channel,
                reply,
            } => {
                self.state.bound_voice_channel = Some(voice_channel);
                self.state.display_channel = Some(display_channel);

                if self.state.queue.len() + requests.len() > self.settings.max_queue_size {
                    let _ = reply.send(Err(UserInputError::QueueFull(
                        self.settings.max_queue_size,
                    )));
                    return;
                }

                let added = requests.len();
                for req in requests {
                    self.state
                        .queue
                        .push_back(Track::placeholder(req.locator, req.title, req.requested_by));
                }
                let _ = reply.send(Ok(added));

                if self.state.current.is_none() {
                    self.advance().await;
                }
            }
            PlayerCommand::Skip { reply } => {
                if self.state.current.is_none() {
                    let _ = reply.send(Err(UserInputError::NothingPlaying));
                    return;
                }
                let _ = reply.send(Ok(()));
                self.skip_current().await;
            }
            PlayerCommand::Pause { reply } => {
                let paused = self.sink.pause(self.guild_id).await;
                let _ = reply.send(if paused {
                    Ok(())
                } else {
                    Err(UserInputError::NothingPlaying)
                });
            }
            PlayerCommand::Resume { reply } => {
                let resumed = self.sink.resume(self.guild_id).await;
                let _ = reply.send(if resumed {
                    Ok(())
                } else {
                    Err(UserInputError::NothingPaused)
                });
            }
            PlayerCommand::SetVolume { volume, reply } => {
                self.state.volume = volume.clamp(0.0, 1.0);
                self.sink.set_volume(self.guild_id, self.state.volume).await;
                let _ = reply.send(());
            }
            PlayerCommand::RemoveAt { position, reply } => {
                // Posición 1-based, la misma numeración que muestra /queue.
                let Some(index) = position.checked_sub(1) else {
                    let _ = reply.send(Err(UserInputError::InvalidPosition));
                    return;
                };
                if index == 0 && self.state.current.is_some() {
                    // Quitar la posición activa equivale a saltarla.
                    let _ = reply.send(Ok(RemoveOutcome::SkippedCurrent));
                    self.skip_current().await;
                } else if let Some(removed) = self.state.queue.remove(index) {
                    let _ = reply.send(Ok(RemoveOutcome::Removed(removed)));
                } else {
                    let _ = reply.send(Err(UserInputError::InvalidPosition));
                }
            }
            PlayerCommand::ListQueue { reply } => {
                let _ = reply.send(self.state.queue.iter().cloned().collect());
            }
            PlayerCommand::NowPlaying { reply } => {
                let info = self.state.current.clone().map(|track| {
                    let elapsed = self
                        .started_at
                        .map(|started| started.elapsed())
                        .unwrap_or_default();
                    (track, elapsed)
                });
                let _ = reply.send(info);
            }
            PlayerCommand::Leave { reply } => {
                self.teardown(true).await;
                let _ = reply.send(());
            }
            PlayerCommand::TrackEnded { generation } => {
                if generation != self.generation || self.state.current.is_none() {
                    // Fin de una sesión que el motor ya descartó (skip, leave
                    // o reemplazo). El estado no se toca.
                    debug!(
                        "♻️ Fin de pista obsoleto en guild {} (gen {})",
                        self.guild_id, generation
                    );
                    return;
                }
                self.state.queue.pop_front();
                self.state.current = None;
                self.started_at = None;
                self.advance().await;
            }
            PlayerCommand::IdleTick { period } => {
                self.idle_tick(period).await;
            }
            PlayerCommand::ProgressTick { generation, reply } => {
                let keep_alive = self.progress_tick(generation).await;
                let _ = reply.send(keep_alive);
            }
        }
    }

    /// Única transición re-entrante del motor: resuelve la cabeza de la
    /// cola, conecta y reproduce. Una falla de resolución descarta esa
    /// entrada y sigue con la siguiente; una falla de conexión descarta solo
    /// la cabeza y no reintenta.
    async fn advance(&mut self) {
        loop {
            let Some(head) = self.state.queue.front() else {
                self.state.current = None;
                self.state.idle_seconds = 0;
                return;
            };
            let locator = head.locator.clone();
            let requested_by = head.requested_by;

            // Re-resolver siempre al momento de reproducir: los stream URLs
            // expiran mientras la entrada espera en la cola.
            let resolved = match self.resolver.resolve(&locator).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    warn!(
                        "❌ No se pudo resolver `{}` en guild {}: {}",
                        locator, self.guild_id, e
                    );
                    self.notify_error(&format!("No se pudo obtener el audio de `{}`: {}", locator, e))
                        .await;
                    self.state.queue.pop_front();
                    continue;
                }
            };

            let Some(channel) = self.state.bound_voice_channel else {
                self.notify_error(&crate::error::ConnectionError::NoChannelBound.to_string())
                    .await;
                self.state.queue.pop_front();
                self.state.current = None;
                return;
            };

            if let Err(e) = self.sink.connect(self.guild_id, channel).await {
                warn!(
                    "❌ Conexión de voz fallida en guild {}: {}",
                    self.guild_id, e
                );
                self.notify_error(&format!("No se pudo conectar al canal de voz: {}", e))
                    .await;
                self.state.queue.pop_front();
                self.state.current = None;
                // Sin reintento automático: el usuario debe volver a pedirlo.
                return;
            }

            let track = Track::from_resolution(&locator, &resolved, requested_by);

            self.generation += 1;
            let generation = self.generation;
            let tx = self.tx.clone();
            let on_end: TrackEndCallback = Box::new(move || {
                // Entregado como mensaje al worker, nunca mutación directa
                // desde el hilo del driver de audio.
                let _ = tx.send(PlayerCommand::TrackEnded { generation });
            });

            if let Err(e) = self
                .sink
                .play(self.guild_id, &track.stream_url, self.state.volume, on_end)
                .await
            {
                warn!(
                    "❌ Error iniciando reproducción en guild {}: {}",
                    self.guild_id, e
                );
                self.notify_error(&format!("Error reproduciendo `{}`: {}", track.title, e))
                    .await;
                self.state.queue.pop_front();
                continue;
            }

            info!("🎵 Reproduciendo {} en guild {}", track.title, self.guild_id);
            self.state.queue[0] = track.clone();
            self.state.current = Some(track);
            self.state.idle_seconds = 0;
            self.started_at = Some(Instant::now());
            self.publish_now_playing().await;
            progress::spawn_reporter(self.tx.clone(), generation, self.settings.progress_period);
            return;
        }
    }

    /// Detiene la sesión activa y arranca la siguiente entrada. El callback
    /// de fin de la sesión detenida queda obsoleto por el salto de
    /// generación y se ignora cuando llegue.
    async fn skip_current(&mut self) {
        self.generation += 1;
        self.sink.stop(self.guild_id).await;
        self.state.queue.pop_front();
        self.state.current = None;
        self.started_at = None;
        self.advance().await;
    }

    /// Transición de salida: detiene la sesión, corta la voz y limpia la
    /// cola. Un leave explícito del usuario además olvida el canal de voz
    /// vinculado y el canal de display; el timeout de inactividad los
    /// conserva para la próxima reproducción.
    async fn teardown(&mut self, user_requested: bool) {
        self.generation += 1;
        self.sink.stop(self.guild_id).await;
        self.sink.disconnect(self.guild_id).await;
        self.state.queue.clear();
        self.state.current = None;
        self.started_at = None;
        self.state.idle_seconds = 0;
        self.state.now_playing_msg = None;
        if user_requested {
            self.state.bound_voice_channel = None;
            self.state.display_channel = None;
        }
        info!("👋 Sesión de voz cerrada en guild {}", self.guild_id);
    }

    /// Contabilidad de inactividad: una conexión de voz sin pista activa
    /// acumula tiempo; cualquier pista sonando o pausada reinicia el
    /// contador. Al alcanzar el umbral se fuerza la transición de salida.
    async fn idle_tick(&mut self, period: Duration) {
        if !self.sink.is_connected(self.guild_id) || self.state.current.is_some() {
            self.state.idle_seconds = 0;
            return;
        }
        self.state.idle_seconds += period.as_secs();
        if self.state.idle_seconds >= self.settings.idle_timeout.as_secs() {
            info!(
                "💤 Guild {} inactiva por {}s, desconectando",
                self.guild_id, self.state.idle_seconds
            );
            self.teardown(false).await;
        }
    }

    /// Un tick del reporter. Devuelve `false` cuando el reporter debe morir:
    /// la reproducción que lo creó ya no existe o el display falló.
    async fn progress_tick(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        let Some(track) = self.state.current.clone() else {
            return false;
        };
        let Some(handle) = self.state.now_playing_msg else {
            return false;
        };
        let Some(started) = self.started_at else {
            return false;
        };
        match self.notifier.progress(handle, &track, started.elapsed()).await {
            Ok(()) => true,
            Err(e) => {
                // Mensaje borrado u otro fallo de display: el reporter se
                // apaga solo, sin propagar nada.
                debug!(
                    "📉 Reporter de progreso detenido en guild {}: {}",
                    self.guild_id, e
                );
                self.state.now_playing_msg = None;
                false
            }
        }
    }

    async fn publish_now_playing(&mut self) {
        let Some(channel) = self.state.display_channel else {
            return;
        };
        let Some(track) = self.state.current.clone() else {
            return;
        };
        match self.notifier.now_playing(channel, &track).await {
            Ok(handle) => self.state.now_playing_msg = Some(handle),
            Err(e) => {
                warn!(
                    "⚠️ No se pudo anunciar la pista en guild {}: {}",
                    self.guild_id, e
                );
                self.state.now_playing_msg = None;
            }
        }
    }

    async fn notify_error(&self, message: &str) {
        if let Some(channel) = self.state.display_channel {
            self.notifier.playback_error(channel, message).await;
        }
    }
}
