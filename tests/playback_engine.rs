//! Pruebas del motor de reproducción contra adapters falsos: resolver, sink
//! y display quedan en memoria y registran cada llamada, así se puede
//! verificar la política de transición sin red ni Discord.

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ritmo_bot::error::{
    ConnectionError, PlaybackError, PlayerError, ResolutionError, UserInputError,
};
use ritmo_bot::player::{
    NotifyError, NowPlayingHandle, PlaybackEngine, PlayerNotifier, PlayerSettings, RemoveOutcome,
    TrackRequest,
};
use ritmo_bot::player::state::Track;
use ritmo_bot::sources::{ResolvedTrack, SearchCandidate, TrackResolver};
use ritmo_bot::voice::{AudioSink, TrackEndCallback};

fn guild() -> GuildId {
    GuildId::new(1)
}

fn voice() -> ChannelId {
    ChannelId::new(10)
}

fn text() -> ChannelId {
    ChannelId::new(20)
}

fn request(locator: &str) -> TrackRequest {
    TrackRequest {
        locator: locator.to_string(),
        title: None,
        requested_by: UserId::new(7),
    }
}

// ------------------------------------------------------------------
// Adapters falsos
// ------------------------------------------------------------------

#[derive(Default)]
struct FakeResolver {
    /// Locators que fallan al resolver.
    failing: Mutex<HashSet<String>>,
    /// Cada locator resuelto, en orden.
    calls: Mutex<Vec<String>>,
    /// Pausa artificial para simular la latencia de red de la resolución.
    delay: Option<Duration>,
}

impl FakeResolver {
    fn fail_on(&self, locator: &str) {
        self.failing.lock().insert(locator.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TrackResolver for FakeResolver {
    async fn resolve(&self, locator: &str) -> Result<ResolvedTrack, ResolutionError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let attempt = {
            let mut calls = self.calls.lock();
            calls.push(locator.to_string());
            calls.len()
        };

        if self.failing.lock().contains(locator) {
            return Err(ResolutionError::NoResults(locator.to_string()));
        }

        Ok(ResolvedTrack {
            page_url: format!("https://page.test/{}", locator),
            // El stream cambia en cada resolución, como los reales.
            stream_url: format!("https://stream.test/{}?intento={}", locator, attempt),
            title: format!("Título {}", locator),
            thumbnail: None,
            duration_seconds: Some(180),
        })
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, ResolutionError> {
        Ok((0..limit)
            .map(|i| SearchCandidate {
                url: format!("https://page.test/{}-{}", query, i),
                title: format!("{} #{}", query, i),
                duration_seconds: Some(60),
            })
            .collect())
    }
}

#[derive(Clone, Debug, PartialEq)]
enum SinkEvent {
    Connect(u64),
    Play { stream: String, volume: f32 },
    Pause,
    Resume,
    SetVolume(f32),
    Stop,
    Disconnect,
}

/// Sink en memoria. Guarda el callback de fin de la sesión activa para que
/// la prueba dispare fines naturales, y hace cumplir con asserts las partes
/// del contrato que el motor no puede violar: una sesión por guild y un fin
/// exactamente-una-vez por reproducción.
#[derive(Default)]
struct FakeSink {
    events: Mutex<Vec<SinkEvent>>,
    pending: Mutex<HashMap<u64, TrackEndCallback>>,
    paused: Mutex<HashSet<u64>>,
    connected: Mutex<HashSet<u64>>,
    completions: AtomicU64,
    fail_connect: AtomicBool,
}

impl FakeSink {
    fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    fn plays(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Play { stream, .. } => Some(stream),
                _ => None,
            })
            .collect()
    }

    fn count(&self, wanted: fn(&SinkEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| wanted(e)).count()
    }

    /// Fin natural (o muerte del stream) de la sesión activa del guild.
    fn finish_current(&self, guild_id: GuildId) {
        self.fire(guild_id);
    }

    fn fire(&self, guild_id: GuildId) {
        if let Some(callback) = self.pending.lock().remove(&guild_id.get()) {
            self.completions.fetch_add(1, Ordering::SeqCst);
            callback();
        }
    }
}

#[async_trait]
impl AudioSink for FakeSink {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), ConnectionError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ConnectionError::Join("canal inalcanzable".to_string()));
        }
        self.events.lock().push(SinkEvent::Connect(channel_id.get()));
        self.connected.lock().insert(guild_id.get());
        Ok(())
    }

    async fn play(
        &self,
        guild_id: GuildId,
        stream_url: &str,
        volume: f32,
        on_end: TrackEndCallback,
    ) -> Result<(), PlaybackError> {
        {
            let mut pending = self.pending.lock();
            assert!(
                !pending.contains_key(&guild_id.get()),
                "dos sesiones simultáneas para el guild {}",
                guild_id
            );
            pending.insert(guild_id.get(), on_end);
        }
        self.paused.lock().remove(&guild_id.get());
        self.events.lock().push(SinkEvent::Play {
            stream: stream_url.to_string(),
            volume,
        });
        Ok(())
    }

    async fn pause(&self, guild_id: GuildId) -> bool {
        let active = self.pending.lock().contains_key(&guild_id.get());
        if !active || !self.paused.lock().insert(guild_id.get()) {
            return false;
        }
        self.events.lock().push(SinkEvent::Pause);
        true
    }

    async fn resume(&self, guild_id: GuildId) -> bool {
        if !self.paused.lock().remove(&guild_id.get()) {
            return false;
        }
        self.events.lock().push(SinkEvent::Resume);
        true
    }

    async fn set_volume(&self, _guild_id: GuildId, volume: f32) {
        self.events.lock().push(SinkEvent::SetVolume(volume));
    }

    async fn stop(&self, guild_id: GuildId) {
        self.events.lock().push(SinkEvent::Stop);
        self.paused.lock().remove(&guild_id.get());
        self.fire(guild_id);
    }

    async fn disconnect(&self, guild_id: GuildId) {
        self.events.lock().push(SinkEvent::Disconnect);
        self.connected.lock().remove(&guild_id.get());
    }

    fn is_connected(&self, guild_id: GuildId) -> bool {
        self.connected.lock().contains(&guild_id.get())
    }
}

#[derive(Default)]
struct FakeNotifier {
    announced: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    progress_ticks: AtomicU64,
    fail_progress: AtomicBool,
}

#[async_trait]
impl PlayerNotifier for FakeNotifier {
    async fn now_playing(
        &self,
        channel_id: ChannelId,
        track: &Track,
    ) -> Result<NowPlayingHandle, NotifyError> {
        self.announced.lock().push(track.title.clone());
        Ok(NowPlayingHandle {
            channel_id,
            message_id: MessageId::new(1),
        })
    }

    async fn progress(
        &self,
        _handle: NowPlayingHandle,
        _track: &Track,
        _elapsed: Duration,
    ) -> Result<(), NotifyError> {
        if self.fail_progress.load(Ordering::SeqCst) {
            return Err(NotifyError("mensaje borrado".to_string()));
        }
        self.progress_ticks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn playback_error(&self, _channel_id: ChannelId, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}

// ------------------------------------------------------------------
// Arnés
// ------------------------------------------------------------------

struct Harness {
    engine: Arc<PlaybackEngine>,
    resolver: Arc<FakeResolver>,
    sink: Arc<FakeSink>,
    notifier: Arc<FakeNotifier>,
}

impl Harness {
    fn new(settings: PlayerSettings) -> Self {
        Self::with_resolver(settings, FakeResolver::default())
    }

    fn with_resolver(settings: PlayerSettings, resolver: FakeResolver) -> Self {
        let resolver = Arc::new(resolver);
        let sink = Arc::new(FakeSink::default());
        let notifier = Arc::new(FakeNotifier::default());
        let engine = Arc::new(PlaybackEngine::new(
            settings,
            resolver.clone(),
            sink.clone(),
            notifier.clone(),
        ));
        Self {
            engine,
            resolver,
            sink,
            notifier,
        }
    }

    async fn enqueue(&self, locator: &str) -> Result<usize, PlayerError> {
        self.engine
            .enqueue(guild(), vec![request(locator)], voice(), text())
            .await
    }

    async fn enqueue_many(&self, locators: &[&str]) -> Result<usize, PlayerError> {
        let requests = locators.iter().map(|locator| request(locator)).collect();
        self.engine.enqueue(guild(), requests, voice(), text()).await
    }

    /// Round-trip por el worker: cuando responde, todo mensaje enviado antes
    /// (incluidos los `TrackEnded` de los fines disparados) ya fue procesado.
    async fn queue_locators(&self) -> Vec<String> {
        self.engine
            .list_queue(guild())
            .await
            .unwrap()
            .into_iter()
            .map(|track| track.locator)
            .collect()
    }

    async fn now_playing_title(&self) -> Option<String> {
        self.engine
            .now_playing(guild())
            .await
            .unwrap()
            .map(|(track, _)| track.title)
    }
}

// ------------------------------------------------------------------
// Propiedades del motor
// ------------------------------------------------------------------

#[tokio::test]
async fn la_cola_conserva_el_orden_de_insercion() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();
    h.enqueue("c").await.unwrap();

    assert_eq!(h.queue_locators().await, vec!["a", "b", "c"]);
    assert_eq!(h.now_playing_title().await, Some("Título a".to_string()));
    assert_eq!(h.notifier.announced.lock().clone(), vec!["Título a"]);
}

#[tokio::test]
async fn el_fin_natural_encadena_las_pistas_en_orden() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();

    h.sink.finish_current(guild());
    assert_eq!(h.now_playing_title().await, Some("Título b".to_string()));

    h.sink.finish_current(guild());
    assert_eq!(h.now_playing_title().await, None);
    assert_eq!(h.queue_locators().await, Vec::<String>::new());
}

#[tokio::test]
async fn remove_en_la_posicion_activa_equivale_a_skip() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();
    h.enqueue("c").await.unwrap();

    let outcome = h.engine.remove_at(guild(), 1).await.unwrap();
    assert!(matches!(outcome, RemoveOutcome::SkippedCurrent));

    // Arrancó la siguiente sin perder ni duplicar nada.
    assert_eq!(h.now_playing_title().await, Some("Título b".to_string()));
    assert_eq!(h.queue_locators().await, vec!["b", "c"]);
}

#[tokio::test]
async fn remove_de_una_entrada_en_espera_no_toca_la_actual() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();
    h.enqueue("c").await.unwrap();

    let outcome = h.engine.remove_at(guild(), 2).await.unwrap();
    match outcome {
        RemoveOutcome::Removed(track) => assert_eq!(track.locator, "b"),
        other => panic!("se esperaba Removed, se obtuvo {:?}", other),
    }

    assert_eq!(h.now_playing_title().await, Some("Título a".to_string()));
    assert_eq!(h.queue_locators().await, vec!["a", "c"]);
}

#[tokio::test]
async fn remove_fuera_de_rango_es_error_de_usuario_sin_mutacion() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();

    for position in [0usize, 5] {
        let err = h.engine.remove_at(guild(), position).await.unwrap_err();
        assert!(matches!(
            err,
            PlayerError::Input(UserInputError::InvalidPosition)
        ));
    }

    assert_eq!(h.queue_locators().await, vec!["a"]);
}

#[tokio::test]
async fn set_volume_aplica_en_vivo_sin_interrumpir() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    let stops_before = h.sink.count(|e| matches!(e, SinkEvent::Stop));

    h.engine.set_volume(guild(), 30).await.unwrap();

    let events = h.sink.events();
    assert!(events.contains(&SinkEvent::SetVolume(0.3)));
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Stop)), stops_before);
    assert_eq!(h.now_playing_title().await, Some("Título a".to_string()));
}

#[tokio::test]
async fn el_volumen_fuera_de_rango_se_rechaza_sin_mutacion() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    let events_before = h.sink.events().len();

    let err = h.engine.set_volume(guild(), 150).await.unwrap_err();
    assert!(matches!(
        err,
        PlayerError::Input(UserInputError::InvalidVolume)
    ));
    assert_eq!(h.sink.events().len(), events_before);
}

#[tokio::test]
async fn el_volumen_fijado_en_reposo_vale_para_la_proxima_pista() {
    let h = Harness::new(PlayerSettings::default());

    h.engine.set_volume(guild(), 40).await.unwrap();
    h.enqueue("a").await.unwrap();

    let volume = h.sink.events().iter().find_map(|event| match event {
        SinkEvent::Play { volume, .. } => Some(*volume),
        _ => None,
    });
    assert_eq!(volume, Some(0.4));
}

#[tokio::test]
async fn cada_play_entrega_exactamente_un_fin() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();
    h.enqueue("c").await.unwrap();

    // a termina natural, b se salta, c muere a mitad de stream: tres
    // reproducciones, tres fines, ni uno más. El round-trip entre pasos
    // espera a que el worker termine cada transición.
    h.sink.finish_current(guild());
    h.queue_locators().await;
    h.engine.skip(guild()).await.unwrap();
    h.queue_locators().await;
    h.sink.finish_current(guild());

    assert_eq!(h.now_playing_title().await, None);
    assert_eq!(h.sink.plays().len(), 3);
    assert_eq!(h.sink.completions.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn doble_skip_rapido_termina_en_la_tercera_pista() {
    let mut resolver = FakeResolver::default();
    // Resolución lenta: el segundo skip llega mientras el primero avanza.
    resolver.delay = Some(Duration::from_millis(20));
    let h = Harness::with_resolver(PlayerSettings::default(), resolver);

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();
    h.enqueue("c").await.unwrap();
    assert_eq!(h.now_playing_title().await, Some("Título a".to_string()));

    let (first, second) = tokio::join!(h.engine.skip(guild()), h.engine.skip(guild()));
    first.unwrap();
    second.unwrap();

    // b jamás llegó a sonar de verdad: a y b terminaron exactamente una vez
    // cada una y la cola quedó en c, sin perder nada más.
    assert_eq!(h.now_playing_title().await, Some("Título c".to_string()));
    assert_eq!(h.queue_locators().await, vec!["c"]);
    assert_eq!(h.sink.completions.load(Ordering::SeqCst), 2);
    assert_eq!(h.sink.plays().len(), 3);
}

#[tokio::test]
async fn una_resolucion_fallida_se_salta_con_un_solo_aviso() {
    let h = Harness::new(PlayerSettings::default());
    h.resolver.fail_on("b");

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();
    h.enqueue("c").await.unwrap();

    h.sink.finish_current(guild());

    assert_eq!(h.now_playing_title().await, Some("Título c".to_string()));
    assert_eq!(h.queue_locators().await, vec!["c"]);
    assert_eq!(h.notifier.errors.lock().len(), 1);
}

#[tokio::test]
async fn una_conexion_fallida_descarta_solo_la_cabeza_sin_reintentar() {
    let h = Harness::new(PlayerSettings::default());
    h.sink.fail_connect.store(true, Ordering::SeqCst);

    h.enqueue_many(&["a", "b"]).await.unwrap();

    // Cayó solo la cabeza; el resto espera a que el usuario vuelva a pedir.
    assert_eq!(h.now_playing_title().await, None);
    assert_eq!(h.queue_locators().await, vec!["b"]);
    assert_eq!(h.resolver.calls(), vec!["a"]);
    assert_eq!(h.notifier.errors.lock().len(), 1);
    assert!(h.sink.plays().is_empty());
}

#[tokio::test]
async fn se_re_resuelve_en_cada_reproduccion() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();
    assert_eq!(h.resolver.calls(), vec!["a"]);

    h.sink.finish_current(guild());
    h.queue_locators().await;
    assert_eq!(h.resolver.calls(), vec!["a", "b"]);

    // Cada play usa el stream de su propia resolución, nunca uno cacheado.
    assert_eq!(
        h.sink.plays(),
        vec![
            "https://stream.test/a?intento=1",
            "https://stream.test/b?intento=2"
        ]
    );
}

#[tokio::test]
async fn pause_y_resume_solo_valen_desde_el_estado_correcto() {
    let h = Harness::new(PlayerSettings::default());

    let err = h.engine.pause(guild()).await.unwrap_err();
    assert!(matches!(
        err,
        PlayerError::Input(UserInputError::NothingPlaying)
    ));

    h.enqueue("a").await.unwrap();
    h.engine.pause(guild()).await.unwrap();

    // La pista pausada sigue siendo la actual.
    assert_eq!(h.now_playing_title().await, Some("Título a".to_string()));

    let err = h.engine.pause(guild()).await.unwrap_err();
    assert!(matches!(
        err,
        PlayerError::Input(UserInputError::NothingPlaying)
    ));

    h.engine.resume(guild()).await.unwrap();
    let err = h.engine.resume(guild()).await.unwrap_err();
    assert!(matches!(
        err,
        PlayerError::Input(UserInputError::NothingPaused)
    ));
}

#[tokio::test]
async fn la_cola_llena_rechaza_el_encolado_completo() {
    let settings = PlayerSettings {
        max_queue_size: 2,
        ..PlayerSettings::default()
    };
    let h = Harness::new(settings);

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();

    let err = h.enqueue("c").await.unwrap_err();
    assert!(matches!(
        err,
        PlayerError::Input(UserInputError::QueueFull(2))
    ));
    assert_eq!(h.queue_locators().await, vec!["a", "b"]);
}

#[tokio::test]
async fn leave_limpia_todo_y_el_guild_queda_reutilizable() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    h.enqueue("b").await.unwrap();

    h.engine.leave(guild()).await.unwrap();

    assert_eq!(h.now_playing_title().await, None);
    assert_eq!(h.queue_locators().await, Vec::<String>::new());
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Disconnect)), 1);
    assert_eq!(h.sink.completions.load(Ordering::SeqCst), 1);

    // El registro del guild persiste y acepta una nueva sesión.
    h.enqueue("c").await.unwrap();
    assert_eq!(h.now_playing_title().await, Some("Título c".to_string()));
}

#[tokio::test]
async fn skip_sin_nada_sonando_es_error_de_usuario() {
    let h = Harness::new(PlayerSettings::default());
    let err = h.engine.skip(guild()).await.unwrap_err();
    assert!(matches!(
        err,
        PlayerError::Input(UserInputError::NothingPlaying)
    ));
}

// ------------------------------------------------------------------
// Tareas de fondo: reaper de inactividad y reporter de progreso
// ------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn el_reaper_desconecta_una_sola_vez_tras_el_umbral() {
    let h = Harness::new(PlayerSettings::default());
    h.engine.spawn_idle_reaper();

    h.enqueue("a").await.unwrap();
    h.sink.finish_current(guild());
    h.queue_locators().await;

    // Conectado y en reposo: el contador corre hasta los 120s.
    tokio::time::sleep(Duration::from_secs(115)).await;
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Disconnect)), 0);

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Disconnect)), 1);
    assert!(!h.sink.is_connected(guild()));

    // Una sola transición: más tiempo en reposo no vuelve a desconectar.
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Disconnect)), 1);
}

#[tokio::test(start_paused = true)]
async fn la_actividad_reinicia_el_contador_de_inactividad() {
    let h = Harness::new(PlayerSettings::default());
    h.engine.spawn_idle_reaper();

    h.enqueue("a").await.unwrap();
    h.sink.finish_current(guild());
    h.queue_locators().await;

    // 80s en reposo, por debajo del umbral.
    tokio::time::sleep(Duration::from_secs(80)).await;
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Disconnect)), 0);

    // Volver a reproducir pone el contador en cero aunque pasen 110s más.
    h.enqueue("b").await.unwrap();
    tokio::time::sleep(Duration::from_secs(110)).await;
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Disconnect)), 0);

    // Al terminar, hacen falta 120s de reposo nuevos para la desconexión.
    h.sink.finish_current(guild());
    h.queue_locators().await;
    tokio::time::sleep(Duration::from_secs(115)).await;
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Disconnect)), 0);
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Disconnect)), 1);
}

#[tokio::test(start_paused = true)]
async fn el_reporter_publica_progreso_mientras_la_pista_vive() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();

    tokio::time::sleep(Duration::from_secs(16)).await;
    let ticks = h.notifier.progress_ticks.load(Ordering::SeqCst);
    assert!(ticks >= 2, "se esperaban ticks de progreso, hubo {}", ticks);

    // Al terminar la pista el reporter muere solo: no hay más ticks.
    h.sink.finish_current(guild());
    h.queue_locators().await;
    let ticks_al_final = h.notifier.progress_ticks.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(
        h.notifier.progress_ticks.load(Ordering::SeqCst),
        ticks_al_final
    );
}

#[tokio::test(start_paused = true)]
async fn un_fallo_de_display_apaga_el_reporter_sin_cortar_el_audio() {
    let h = Harness::new(PlayerSettings::default());

    h.enqueue("a").await.unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(h.notifier.progress_ticks.load(Ordering::SeqCst) >= 1);

    // El mensaje de estado desaparece: el reporter muere, la pista sigue.
    h.notifier.fail_progress.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(6)).await;
    let ticks = h.notifier.progress_ticks.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.notifier.progress_ticks.load(Ordering::SeqCst), ticks);
    assert_eq!(h.now_playing_title().await, Some("Título a".to_string()));
    assert_eq!(h.sink.count(|e| matches!(e, SinkEvent::Stop)), 0);
}

#[tokio::test]
async fn los_guilds_no_se_bloquean_entre_si() {
    let mut resolver = FakeResolver::default();
    resolver.delay = Some(Duration::from_millis(100));
    let h = Harness::with_resolver(PlayerSettings::default(), resolver);

    let other_guild = GuildId::new(2);

    // Las dos resoluciones lentas corren en paralelo: si un guild bloqueara
    // al otro, esto tardaría el doble.
    let started = std::time::Instant::now();
    let (a, b) = tokio::join!(
        h.engine
            .enqueue(guild(), vec![request("a")], voice(), text()),
        h.engine
            .enqueue(other_guild, vec![request("b")], voice(), text()),
    );
    a.unwrap();
    b.unwrap();

    // enqueue responde antes de resolver; esperar a que ambos avancen.
    h.queue_locators().await;
    h.engine.list_queue(other_guild).await.unwrap();

    assert!(
        started.elapsed() < Duration::from_millis(180),
        "los workers de guilds distintos deben avanzar en paralelo"
    );
    assert_eq!(h.sink.plays().len(), 2);
}
