use anyhow::Result;
use serenity::builder::{
    CreateInteractionResponse, CreateInteractionResponseMessage, EditInteractionResponse,
};
use serenity::model::application::{CommandInteraction, ComponentInteraction};
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::Context;
use tracing::{error, info};

use crate::bot::{game, jokes, search, verify, RitmoBot};
use crate::error::PlayerError;
use crate::player::{RemoveOutcome, TrackRequest};
use crate::sources::SpotifyClient;
use crate::ui::{buttons, embeds};

/// Despacha comandos slash
pub async fn handle_command(ctx: &Context, command: CommandInteraction, bot: &RitmoBot) -> Result<()> {
    let Some(guild_id) = command.guild_id else {
        return respond_ephemeral(ctx, &command, "❌ Este comando solo funciona en un servidor").await;
    };

    info!(
        "📝 Comando /{} usado por {} en guild {}",
        command.data.name, command.user.name, guild_id
    );

    match command.data.name.as_str() {
        "play" => handle_play(ctx, command, bot, guild_id).await,
        "search" => search::handle_search_command(ctx, command, bot).await,
        "skip" => handle_skip(ctx, command, bot, guild_id).await,
        "pause" => handle_pause(ctx, command, bot, guild_id).await,
        "resume" => handle_resume(ctx, command, bot, guild_id).await,
        "volume" => handle_volume(ctx, command, bot, guild_id).await,
        "remove" => handle_remove(ctx, command, bot, guild_id).await,
        "queue" => handle_queue(ctx, command, bot, guild_id).await,
        "nowplaying" => handle_nowplaying(ctx, command, bot, guild_id).await,
        "leave" => handle_leave(ctx, command, bot, guild_id).await,
        "help" => respond_embed(ctx, &command, embeds::create_help_embed()).await,
        "rps" => game::handle_rps_challenge(ctx, command, bot, guild_id).await,
        "rpscancel" => game::handle_rps_cancel(ctx, command, bot, guild_id).await,
        "rpsstats" => game::handle_rps_stats(ctx, command, bot).await,
        "rpsleaderboard" => game::handle_rps_leaderboard(ctx, command, bot).await,
        "rpsreset" => game::handle_rps_reset(ctx, command, bot).await,
        "jamesjoke" => jokes::handle_joke(ctx, command, bot).await,
        "verify" => verify::handle_verify(ctx, command, bot, guild_id).await,
        _ => respond_ephemeral(ctx, &command, "❌ Comando no reconocido").await,
    }
}

/// Despacha interacciones de componentes (menú de búsqueda, botones de RPS)
pub async fn handle_component(
    ctx: &Context,
    component: ComponentInteraction,
    bot: &RitmoBot,
) -> Result<()> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };

    info!(
        "🔘 Componente {} usado por {} en guild {}",
        component.data.custom_id, component.user.name, guild_id
    );

    let custom_id = component.data.custom_id.as_str();
    if custom_id == buttons::ids::SEARCH_SELECT {
        search::handle_search_selection(ctx, &component, bot, guild_id).await
    } else if custom_id == buttons::ids::RPS_ACCEPT
        || custom_id == buttons::ids::RPS_DECLINE
        || custom_id.starts_with(buttons::ids::RPS_MOVE_PREFIX)
    {
        game::handle_rps_component(ctx, &component, bot, guild_id).await
    } else {
        component
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content("❌ Acción no reconocida")
                        .ephemeral(true),
                ),
            )
            .await?;
        Ok(())
    }
}

// Handlers de reproducción

async fn handle_play(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    let Some(url) = str_option(&command, "url").map(str::to_string) else {
        return respond_ephemeral(ctx, &command, "❌ Falta el término a reproducir").await;
    };

    // Resolver y conectar toman tiempo: defer antes de trabajar.
    defer(ctx, &command).await?;

    let Some(voice_channel) = user_voice_channel(ctx, guild_id, command.user.id) else {
        return edit_text(ctx, &command, "Debes estar en un canal de voz para usar `/play`.").await;
    };

    let requests = match build_requests(bot, &url, command.user.id).await {
        Ok(requests) => requests,
        Err(message) => return edit_text(ctx, &command, message).await,
    };

    match bot
        .engine
        .enqueue(guild_id, requests, voice_channel, command.channel_id)
        .await
    {
        Ok(added) => {
            edit_text(
                ctx,
                &command,
                format!("➕ {} canción(es) agregada(s) a la cola", added),
            )
            .await
        }
        Err(e) => edit_text(ctx, &command, user_error_text(&e)).await,
    }
}

/// Una URL de Spotify se expande a búsquedas por pista; cualquier otra cosa
/// va directa al resolver como locator único.
async fn build_requests(
    bot: &RitmoBot,
    url: &str,
    requested_by: UserId,
) -> Result<Vec<TrackRequest>, String> {
    if SpotifyClient::is_spotify_url(url) {
        let Some(spotify) = &bot.spotify else {
            return Err("❌ La integración con Spotify no está configurada".to_string());
        };
        let queries = spotify
            .expand(url)
            .await
            .map_err(|e| format!("❌ No se pudo procesar la URL de Spotify: {}", e))?;
        Ok(queries
            .into_iter()
            .map(|query| TrackRequest {
                locator: query.clone(),
                title: Some(query),
                requested_by,
            })
            .collect())
    } else {
        Ok(vec![TrackRequest {
            locator: url.to_string(),
            title: None,
            requested_by,
        }])
    }
}

async fn handle_skip(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    match bot.engine.skip(guild_id).await {
        Ok(()) => respond_text(ctx, &command, "⏭️ Saltado!").await,
        Err(e) => respond_text(ctx, &command, user_error_text(&e)).await,
    }
}

async fn handle_pause(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    match bot.engine.pause(guild_id).await {
        Ok(()) => respond_text(ctx, &command, "⏸️ Reproducción pausada").await,
        Err(e) => respond_text(ctx, &command, user_error_text(&e)).await,
    }
}

async fn handle_resume(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    match bot.engine.resume(guild_id).await {
        Ok(()) => respond_text(ctx, &command, "▶️ Reproducción reanudada").await,
        Err(e) => respond_text(ctx, &command, user_error_text(&e)).await,
    }
}

async fn handle_volume(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    let Some(percent) = int_option(&command, "percent") else {
        return respond_ephemeral(ctx, &command, "❌ Falta el porcentaje").await;
    };

    match bot.engine.set_volume(guild_id, percent).await {
        Ok(()) => respond_text(ctx, &command, format!("🔊 Volumen ajustado a {}%", percent)).await,
        Err(e) => respond_text(ctx, &command, user_error_text(&e)).await,
    }
}

async fn handle_remove(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    let position = int_option(&command, "position").unwrap_or(0);
    if position < 1 {
        return respond_text(ctx, &command, "❌ Posición inválida en la cola").await;
    }

    match bot.engine.remove_at(guild_id, position as usize).await {
        Ok(RemoveOutcome::Removed(track)) => {
            respond_text(ctx, &command, format!("🗑️ Eliminada: {}", track.title)).await
        }
        Ok(RemoveOutcome::SkippedCurrent) => {
            respond_text(ctx, &command, "⏭️ Era la pista actual: saltada").await
        }
        Err(e) => respond_text(ctx, &command, user_error_text(&e)).await,
    }
}

async fn handle_queue(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    let queue = bot.engine.list_queue(guild_id).await?;
    if queue.is_empty() {
        return respond_text(ctx, &command, "📭 La cola está vacía!").await;
    }
    respond_embed(ctx, &command, embeds::create_queue_embed(&queue)).await
}

async fn handle_nowplaying(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    match bot.engine.now_playing(guild_id).await? {
        Some((track, elapsed)) => {
            respond_embed(ctx, &command, embeds::create_progress_embed(&track, elapsed)).await
        }
        None => respond_text(ctx, &command, "❌ No hay nada reproduciéndose").await,
    }
}

async fn handle_leave(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    bot.engine.leave(guild_id).await?;
    respond_text(ctx, &command, "👋 Desconectado y cola limpiada").await
}

// Funciones auxiliares compartidas por los handlers

pub(crate) fn str_option<'a>(command: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_str())
}

pub(crate) fn int_option(command: &CommandInteraction, name: &str) -> Option<i64> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_i64())
}

pub(crate) fn user_option(command: &CommandInteraction, name: &str) -> Option<UserId> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_user_id())
}

/// Canal de voz en el que está el usuario, según la caché del gateway.
pub(crate) fn user_voice_channel(
    ctx: &Context,
    guild_id: GuildId,
    user_id: UserId,
) -> Option<ChannelId> {
    let guild = guild_id.to_guild_cached(&ctx.cache)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
}

/// Texto visible para el usuario según el tipo de error del motor.
pub(crate) fn user_error_text(err: &PlayerError) -> String {
    match err {
        PlayerError::Input(e) => format!("❌ {}", e),
        other => {
            error!("Error del reproductor: {:?}", other);
            "❌ Algo salió mal procesando el comando".to_string()
        }
    }
}

pub(crate) async fn defer(ctx: &Context, command: &CommandInteraction) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;
    Ok(())
}

pub(crate) async fn respond_text(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new().content(content),
            ),
        )
        .await?;
    Ok(())
}

pub(crate) async fn respond_ephemeral(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

pub(crate) async fn respond_embed(
    ctx: &Context,
    command: &CommandInteraction,
    embed: serenity::builder::CreateEmbed,
) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new().embed(embed),
            ),
        )
        .await?;
    Ok(())
}

/// Edita la respuesta de un comando ya deferido.
pub(crate) async fn edit_text(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> Result<()> {
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await?;
    Ok(())
}
