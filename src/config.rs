use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::player::PlayerSettings;

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub application_id: u64,
    pub guild_id: Option<u64>, // Para comandos de desarrollo

    // Reproductor
    pub default_volume: f32, // 0.0 - 1.0
    pub max_queue_size: usize,
    pub idle_timeout_secs: u64,
    pub idle_check_secs: u64,
    pub progress_update_secs: u64,
    pub search_results: usize,

    // Resolución de audio
    pub ytdlp_path: String,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,

    // Paths
    pub data_dir: PathBuf,
    pub jokes_file: PathBuf,

    // Verificación de miembros
    pub admin_role_id: Option<u64>,
    pub verified_role_id: Option<u64>,
    pub unverified_role_id: Option<u64>,
    pub verify_log_channel_id: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let data_dir: PathBuf = std::env::var("DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN")?,
            application_id: std::env::var("APPLICATION_ID")?.parse()?,
            guild_id: std::env::var("GUILD_ID").ok().and_then(|s| s.parse().ok()),

            // Reproductor
            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()?,
            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            idle_timeout_secs: std::env::var("IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
            idle_check_secs: std::env::var("IDLE_CHECK_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            progress_update_secs: std::env::var("PROGRESS_UPDATE_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            search_results: std::env::var("SEARCH_RESULTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,

            // Resolución de audio
            ytdlp_path: std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string()),
            spotify_client_id: std::env::var("SPOTIFY_CLIENT_ID").ok(),
            spotify_client_secret: std::env::var("SPOTIFY_CLIENT_SECRET").ok(),

            // Paths
            jokes_file: std::env::var("JOKES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("jokes.txt")),
            data_dir,

            // Verificación
            admin_role_id: std::env::var("ADMIN_ROLE_ID").ok().and_then(|s| s.parse().ok()),
            verified_role_id: std::env::var("VERIFIED_ROLE_ID")
                .ok()
                .and_then(|s| s.parse().ok()),
            unverified_role_id: std::env::var("UNVERIFIED_ROLE_ID")
                .ok()
                .and_then(|s| s.parse().ok()),
            verify_log_channel_id: std::env::var("VERIFY_LOG_CHANNEL_ID")
                .ok()
                .and_then(|s| s.parse().ok()),
        };

        std::fs::create_dir_all(&config.data_dir)?;

        config.validate()?;

        Ok(config)
    }

    /// Sanity checks de configuración antes de arrancar el bot.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_volume) {
            anyhow::bail!(
                "El volumen por defecto debe estar entre 0.0 y 1.0, se recibió: {}",
                self.default_volume
            );
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("El tamaño máximo de cola debe ser mayor que 0");
        }

        if self.idle_timeout_secs == 0 || self.idle_check_secs == 0 {
            anyhow::bail!("Los tiempos de inactividad deben ser mayores que 0");
        }

        if self.idle_check_secs > self.idle_timeout_secs {
            anyhow::bail!(
                "El período de chequeo ({}) no puede superar el umbral de inactividad ({})",
                self.idle_check_secs,
                self.idle_timeout_secs
            );
        }

        if self.progress_update_secs == 0 {
            anyhow::bail!("El período de progreso debe ser mayor que 0");
        }

        if !(1..=25).contains(&self.search_results) {
            anyhow::bail!(
                "SEARCH_RESULTS debe estar entre 1 y 25, se recibió: {}",
                self.search_results
            );
        }

        Ok(())
    }

    /// Subconjunto de configuración que consume el motor de reproducción.
    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            default_volume: self.default_volume,
            max_queue_size: self.max_queue_size,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            idle_check_period: Duration::from_secs(self.idle_check_secs),
            progress_period: Duration::from_secs(self.progress_update_secs),
        }
    }
}
