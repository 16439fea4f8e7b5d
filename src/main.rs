use anyhow::Result;
use serenity::http::Http;
use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

use ritmo_bot::bot::RitmoBot;
use ritmo_bot::config::Config;
use ritmo_bot::game::RpsManager;
use ritmo_bot::player::PlaybackEngine;
use ritmo_bot::sources::YtDlpResolver;
use ritmo_bot::ui::notifier::DiscordNotifier;
use ritmo_bot::voice::SongbirdSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ritmo_bot=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Ritmo Bot v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::load()?);

    let resolver = Arc::new(YtDlpResolver::new(config.ytdlp_path.clone()));
    if let Err(e) = resolver.verify_dependencies().await {
        // El bot arranca igual: los comandos de música fallarán con aviso.
        error!("⚠️ yt-dlp no disponible: {:?}", e);
    }

    let rps = Arc::new(RpsManager::new(&config.data_dir).await?);

    // Intents mínimos necesarios
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let manager = Songbird::serenity();
    let notifier = Arc::new(DiscordNotifier::new(Arc::new(Http::new(
        &config.discord_token,
    ))));
    let sink = Arc::new(SongbirdSink::new(manager.clone()));

    let engine = Arc::new(PlaybackEngine::new(
        config.player_settings(),
        resolver,
        sink,
        notifier,
    ));
    engine.spawn_idle_reaper();

    let handler = RitmoBot::new(config.clone(), engine, rps);

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(manager)
        .await?;

    // Shutdown por Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("No se pudo registrar Ctrl+C");
        info!("⚠️ Señal de apagado recibida, cerrando...");
        std::process::exit(0);
    });

    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}
