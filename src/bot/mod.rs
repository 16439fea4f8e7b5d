//! Superficie de comandos del bot.
//!
//! Implementa el [`EventHandler`] de serenity: registro de comandos slash,
//! despacho de comandos y de interacciones de componentes (menú de búsqueda,
//! botones de RPS). Traduce cada comando a operaciones del motor de
//! reproducción o del juego; acá no vive ninguna lógica de estado.

pub mod commands;
pub mod game;
pub mod handlers;
pub mod jokes;
pub mod search;
pub mod verify;

use anyhow::Result;
use serenity::all::{Context, EventHandler, GuildId, Interaction, Ready};
use serenity::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::game::RpsManager;
use crate::player::PlaybackEngine;
use crate::sources::SpotifyClient;
use search::SearchSessions;

/// Handler principal del bot: configuración, motor de reproducción, juego y
/// sesiones de búsqueda en curso.
pub struct RitmoBot {
    pub config: Arc<Config>,
    pub engine: Arc<PlaybackEngine>,
    pub rps: Arc<RpsManager>,
    pub searches: SearchSessions,
    pub spotify: Option<Arc<SpotifyClient>>,
}

impl RitmoBot {
    pub fn new(config: Arc<Config>, engine: Arc<PlaybackEngine>, rps: Arc<RpsManager>) -> Self {
        let spotify = match (&config.spotify_client_id, &config.spotify_client_secret) {
            (Some(id), Some(secret)) => {
                Some(Arc::new(SpotifyClient::new(id.clone(), secret.clone())))
            }
            _ => None,
        };

        Self {
            config,
            engine,
            rps,
            searches: SearchSessions::new(),
            spotify,
        }
    }

    /// Registra los comandos slash, por guild (propagación inmediata, para
    /// desarrollo) o globales según configuración.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");
        info!("🔧 Application ID: {}", self.config.application_id);

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::from(guild_id);
                if !ctx.cache.guilds().contains(&guild_id) {
                    warn!("⚠️ El bot no está en la guild especificada: {}", guild_id);
                    return Ok(());
                }
                commands::register_guild_commands(ctx, guild_id).await?;
                info!("✅ Comandos registrados para guild {}", guild_id);
            }
            None => {
                commands::register_global_commands(ctx).await?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler for RitmoBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                if let Err(e) = handlers::handle_command(&ctx, command, self).await {
                    error!("Error manejando comando: {:?}", e);
                }
            }
            Interaction::Component(component) => {
                if let Err(e) = handlers::handle_component(&ctx, component, self).await {
                    error!("Error manejando componente: {:?}", e);
                }
            }
            _ => {}
        }
    }
}
