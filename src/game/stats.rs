use anyhow::Result;
use serde::{Deserialize, Serialize};
use serenity::model::id::UserId;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

/// Marcador acumulado de un jugador.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpsRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

/// Almacén plano de estadísticas: un único JSON con el mapa completo
/// usuario → {wins, losses, ties}, reescrito entero en cada guardado.
pub struct RpsStore {
    path: PathBuf,
    records: HashMap<u64, RpsRecord>,
}

impl RpsStore {
    /// Carga el archivo si existe. Un archivo ausente o ilegible parte de
    /// cero en vez de impedir el arranque.
    pub async fn load(path: PathBuf) -> Self {
        let records = match fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!(
                        "⚠️ Estadísticas ilegibles en {}: {}. Se parte de cero",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        if !records.is_empty() {
            info!("📂 Cargadas estadísticas de {} jugadores", records.len());
        }

        Self { path, records }
    }

    pub async fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }

    pub fn get(&self, user: UserId) -> Option<RpsRecord> {
        self.records.get(&user.get()).copied()
    }

    pub fn record_win(&mut self, winner: UserId, loser: UserId) {
        self.records.entry(winner.get()).or_default().wins += 1;
        self.records.entry(loser.get()).or_default().losses += 1;
    }

    pub fn record_tie(&mut self, players: [UserId; 2]) {
        for player in players {
            self.records.entry(player.get()).or_default().ties += 1;
        }
    }

    /// Tabla completa ordenada por victorias y, a igualdad, por empates.
    pub fn leaderboard(&self) -> Vec<(u64, RpsRecord)> {
        let mut entries: Vec<(u64, RpsRecord)> =
            self.records.iter().map(|(id, record)| (*id, *record)).collect();
        entries.sort_by(|a, b| (b.1.wins, b.1.ties).cmp(&(a.1.wins, a.1.ties)));
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    #[tokio::test]
    async fn guarda_y_recarga_el_mapa_completo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rps_stats.json");

        let mut store = RpsStore::load(path.clone()).await;
        assert!(store.is_empty());

        store.record_win(user(1), user(2));
        store.record_tie([user(1), user(3)]);
        store.save().await.unwrap();

        let reloaded = RpsStore::load(path).await;
        assert_eq!(
            reloaded.get(user(1)),
            Some(RpsRecord {
                wins: 1,
                losses: 0,
                ties: 1
            })
        );
        assert_eq!(
            reloaded.get(user(2)),
            Some(RpsRecord {
                wins: 0,
                losses: 1,
                ties: 0
            })
        );
        assert_eq!(reloaded.get(user(9)), None);
    }

    #[tokio::test]
    async fn un_archivo_corrupto_parte_de_cero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rps_stats.json");
        tokio::fs::write(&path, "esto no es json").await.unwrap();

        let store = RpsStore::load(path).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn la_tabla_ordena_por_victorias_y_empates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RpsStore::load(dir.path().join("rps_stats.json")).await;

        // 1 le gana dos veces a 2; 3 gana una y empata una.
        store.record_win(user(1), user(2));
        store.record_win(user(1), user(2));
        store.record_win(user(3), user(2));
        store.record_tie([user(3), user(2)]);

        let board = store.leaderboard();
        let ids: Vec<u64> = board.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }
}
