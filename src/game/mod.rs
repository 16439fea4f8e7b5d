//! Piedra, Papel o Tijeras: partidas efímeras por par de jugadores y
//! estadísticas persistidas en un archivo plano.

pub mod stats;

use anyhow::Result;
use dashmap::DashMap;
use serenity::model::id::{GuildId, UserId};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use stats::{RpsRecord, RpsStore};

/// Tiempo de vida de una partida sin terminar.
const GAME_TTL: Duration = Duration::from_secs(300);

const SAVE_FILE: &str = "rps_stats.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpsChoice {
    Rock,
    Paper,
    Scissors,
}

impl RpsChoice {
    pub fn emoji(self) -> &'static str {
        match self {
            RpsChoice::Rock => "🪨",
            RpsChoice::Paper => "📄",
            RpsChoice::Scissors => "✂️",
        }
    }

    /// Sufijo usado en los custom_id de los botones.
    pub fn id(self) -> &'static str {
        match self {
            RpsChoice::Rock => "rock",
            RpsChoice::Paper => "paper",
            RpsChoice::Scissors => "scissors",
        }
    }

    pub fn from_id(raw: &str) -> Option<Self> {
        match raw {
            "rock" => Some(RpsChoice::Rock),
            "paper" => Some(RpsChoice::Paper),
            "scissors" => Some(RpsChoice::Scissors),
            _ => None,
        }
    }

    pub fn beats(self, other: RpsChoice) -> bool {
        matches!(
            (self, other),
            (RpsChoice::Rock, RpsChoice::Scissors)
                | (RpsChoice::Paper, RpsChoice::Rock)
                | (RpsChoice::Scissors, RpsChoice::Paper)
        )
    }
}

/// Clave canónica de partida: el par de jugadores en orden estable, así el
/// reto A→B y el B→A son la misma partida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GameKey {
    guild: GuildId,
    low: UserId,
    high: UserId,
}

impl GameKey {
    fn new(guild: GuildId, a: UserId, b: UserId) -> Self {
        let (low, high) = if a.get() <= b.get() { (a, b) } else { (b, a) };
        Self { guild, low, high }
    }
}

#[derive(Debug)]
struct RpsGame {
    challenger: UserId,
    opponent: UserId,
    choices: HashMap<UserId, RpsChoice>,
    created_at: Instant,
}

impl RpsGame {
    fn expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Resultado de una partida completa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpsOutcome {
    Win {
        winner: UserId,
        loser: UserId,
        winning: RpsChoice,
        losing: RpsChoice,
    },
    Tie {
        players: [UserId; 2],
        choice: RpsChoice,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no puedes retarte a ti mismo")]
    SelfChallenge,

    #[error("ya existe una partida activa entre ustedes")]
    AlreadyActive,

    #[error("no hay partida activa con ese usuario")]
    NoGame,

    #[error("la partida expiró, vuelve a retar")]
    Expired,
}

/// Partidas activas más el almacén de estadísticas. Las partidas expiran
/// solas: la expiración se verifica en cada acceso y libera la entrada.
pub struct RpsManager {
    games: DashMap<GameKey, RpsGame>,
    stats: Mutex<RpsStore>,
    ttl: Duration,
}

impl RpsManager {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        let store = RpsStore::load(data_dir.join(SAVE_FILE)).await;
        Ok(Self {
            games: DashMap::new(),
            stats: Mutex::new(store),
            ttl: GAME_TTL,
        })
    }

    #[cfg(test)]
    fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Crea una partida entre retador y oponente.
    pub fn challenge(
        &self,
        guild: GuildId,
        challenger: UserId,
        opponent: UserId,
    ) -> Result<(), GameError> {
        if challenger == opponent {
            return Err(GameError::SelfChallenge);
        }

        self.purge_expired();

        let key = GameKey::new(guild, challenger, opponent);
        if self.games.contains_key(&key) {
            return Err(GameError::AlreadyActive);
        }

        self.games.insert(
            key,
            RpsGame {
                challenger,
                opponent,
                choices: HashMap::new(),
                created_at: Instant::now(),
            },
        );
        info!(
            "🎮 Partida de RPS creada en guild {}: {} vs {}",
            guild, challenger, opponent
        );
        Ok(())
    }

    /// Cancela la partida entre dos jugadores concretos.
    pub fn cancel(&self, guild: GuildId, a: UserId, b: UserId) -> bool {
        self.games.remove(&GameKey::new(guild, a, b)).is_some()
    }

    /// El oponente acepta el reto. Devuelve al retador para el anuncio.
    pub fn accept(&self, guild: GuildId, user: UserId) -> Result<UserId, GameError> {
        let key = self.find_key(guild, user).ok_or(GameError::NoGame)?;

        if self.expire_if_needed(key) {
            return Err(GameError::Expired);
        }

        let game = self.games.get(&key).ok_or(GameError::NoGame)?;
        if game.opponent != user {
            return Err(GameError::NoGame);
        }
        Ok(game.challenger)
    }

    /// El oponente rechaza el reto y la partida se elimina.
    pub fn decline(&self, guild: GuildId, user: UserId) -> Result<UserId, GameError> {
        let key = self.find_key(guild, user).ok_or(GameError::NoGame)?;

        let challenger = {
            let game = self.games.get(&key).ok_or(GameError::NoGame)?;
            if game.opponent != user {
                return Err(GameError::NoGame);
            }
            game.challenger
        };

        self.games.remove(&key);
        Ok(challenger)
    }

    /// Registra la jugada de un participante. Devuelve el resultado cuando
    /// ambos eligieron; la partida se elimina y las estadísticas se guardan.
    pub async fn choose(
        &self,
        guild: GuildId,
        user: UserId,
        choice: RpsChoice,
    ) -> Result<Option<RpsOutcome>, GameError> {
        let key = self.find_key(guild, user).ok_or(GameError::NoGame)?;

        if self.expire_if_needed(key) {
            return Err(GameError::Expired);
        }

        let outcome = {
            let mut game = self.games.get_mut(&key).ok_or(GameError::NoGame)?;
            game.choices.insert(user, choice);
            if game.choices.len() < 2 {
                return Ok(None);
            }
            let low_choice = game.choices[&key.low];
            let high_choice = game.choices[&key.high];
            resolve_round(key.low, low_choice, key.high, high_choice)
        };

        self.games.remove(&key);
        self.record(&outcome).await;
        Ok(Some(outcome))
    }

    pub async fn stats_for(&self, user: UserId) -> Option<RpsRecord> {
        self.stats.lock().await.get(user)
    }

    pub async fn leaderboard(&self) -> Vec<(u64, RpsRecord)> {
        self.stats.lock().await.leaderboard()
    }

    /// Borra todas las estadísticas (solo el dueño del bot).
    pub async fn reset_stats(&self) -> Result<()> {
        let mut store = self.stats.lock().await;
        store.clear();
        store.save().await
    }

    fn find_key(&self, guild: GuildId, user: UserId) -> Option<GameKey> {
        self.games.iter().find_map(|entry| {
            let key = *entry.key();
            (key.guild == guild && (key.low == user || key.high == user)).then_some(key)
        })
    }

    /// Elimina la partida si expiró. La expiración libera la entrada.
    fn expire_if_needed(&self, key: GameKey) -> bool {
        let expired = self
            .games
            .get(&key)
            .map(|game| game.expired(self.ttl))
            .unwrap_or(false);
        if expired {
            self.games.remove(&key);
        }
        expired
    }

    fn purge_expired(&self) {
        self.games.retain(|_, game| !game.expired(self.ttl));
    }

    async fn record(&self, outcome: &RpsOutcome) {
        let mut store = self.stats.lock().await;
        match *outcome {
            RpsOutcome::Win { winner, loser, .. } => store.record_win(winner, loser),
            RpsOutcome::Tie { players, .. } => store.record_tie(players),
        }
        // El marcador es lo mejor-posible: un fallo de disco no corta el juego.
        if let Err(e) = store.save().await {
            error!("💾 No se pudieron guardar las estadísticas de RPS: {}", e);
        }
    }
}

fn resolve_round(a: UserId, a_choice: RpsChoice, b: UserId, b_choice: RpsChoice) -> RpsOutcome {
    if a_choice == b_choice {
        RpsOutcome::Tie {
            players: [a, b],
            choice: a_choice,
        }
    } else if a_choice.beats(b_choice) {
        RpsOutcome::Win {
            winner: a,
            loser: b,
            winning: a_choice,
            losing: b_choice,
        }
    } else {
        RpsOutcome::Win {
            winner: b,
            loser: a,
            winning: b_choice,
            losing: a_choice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    fn guild() -> GuildId {
        GuildId::new(1)
    }

    /// El TempDir se devuelve para que el directorio viva lo que dura la
    /// prueba; si se soltara acá, los guardados irían a una ruta borrada.
    async fn manager() -> (RpsManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let manager = RpsManager::new(dir.path()).await.unwrap();
        (manager, dir)
    }

    #[test]
    fn la_matriz_de_jugadas_es_la_clasica() {
        use RpsChoice::*;
        assert!(Rock.beats(Scissors));
        assert!(Paper.beats(Rock));
        assert!(Scissors.beats(Paper));
        assert!(!Scissors.beats(Rock));
        assert!(!Rock.beats(Rock));
    }

    #[test]
    fn la_clave_no_depende_del_orden_de_los_jugadores() {
        assert_eq!(
            GameKey::new(guild(), user(5), user(9)),
            GameKey::new(guild(), user(9), user(5))
        );
    }

    #[tokio::test]
    async fn una_partida_completa_reparte_victoria_y_derrota() {
        let (manager, _dir) = manager().await;
        manager.challenge(guild(), user(1), user(2)).unwrap();
        manager.accept(guild(), user(2)).unwrap();

        assert_eq!(
            manager.choose(guild(), user(1), RpsChoice::Rock).await.unwrap(),
            None
        );
        let outcome = manager
            .choose(guild(), user(2), RpsChoice::Scissors)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            outcome,
            RpsOutcome::Win {
                winner: user(1),
                loser: user(2),
                winning: RpsChoice::Rock,
                losing: RpsChoice::Scissors,
            }
        );

        // La partida terminada libera la clave y actualiza el marcador.
        assert_eq!(
            manager.choose(guild(), user(1), RpsChoice::Rock).await,
            Err(GameError::NoGame)
        );
        assert_eq!(manager.stats_for(user(1)).await.unwrap().wins, 1);
        assert_eq!(manager.stats_for(user(2)).await.unwrap().losses, 1);
    }

    #[tokio::test]
    async fn el_empate_suma_a_ambos() {
        let (manager, _dir) = manager().await;
        manager.challenge(guild(), user(1), user(2)).unwrap();

        manager.choose(guild(), user(1), RpsChoice::Paper).await.unwrap();
        let outcome = manager
            .choose(guild(), user(2), RpsChoice::Paper)
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(outcome, RpsOutcome::Tie { .. }));
        assert_eq!(manager.stats_for(user(1)).await.unwrap().ties, 1);
        assert_eq!(manager.stats_for(user(2)).await.unwrap().ties, 1);
    }

    #[tokio::test]
    async fn no_se_puede_retar_a_si_mismo_ni_duplicar_partidas() {
        let (manager, _dir) = manager().await;
        assert_eq!(
            manager.challenge(guild(), user(1), user(1)),
            Err(GameError::SelfChallenge)
        );

        manager.challenge(guild(), user(1), user(2)).unwrap();
        // El reto inverso es la misma partida.
        assert_eq!(
            manager.challenge(guild(), user(2), user(1)),
            Err(GameError::AlreadyActive)
        );
    }

    #[tokio::test]
    async fn una_partida_expirada_se_libera_al_accederla() {
        let (manager, _dir) = manager().await;
        let manager = manager.with_ttl(Duration::ZERO);
        manager.challenge(guild(), user(1), user(2)).unwrap();

        assert_eq!(
            manager.choose(guild(), user(1), RpsChoice::Rock).await,
            Err(GameError::Expired)
        );
        // La entrada quedó liberada: se puede volver a retar.
        assert!(manager.challenge(guild(), user(1), user(2)).is_ok());
    }
}
