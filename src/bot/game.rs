use anyhow::Result;
use serenity::builder::{
    CreateInteractionResponse, CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
    CreateMessage,
};
use serenity::model::application::{CommandInteraction, ComponentInteraction};
use serenity::model::id::GuildId;
use serenity::prelude::Context;

use crate::bot::handlers::{respond_embed, respond_ephemeral, user_option};
use crate::bot::RitmoBot;
use crate::game::{GameError, RpsChoice, RpsOutcome};
use crate::ui::{buttons, embeds};

/// /rps: crea la partida, le muestra los botones de jugada al retador y
/// publica el reto con aceptar/rechazar para el oponente.
pub async fn handle_rps_challenge(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    let Some(opponent) = user_option(&command, "opponent") else {
        return respond_ephemeral(ctx, &command, "❌ Falta el oponente").await;
    };
    let challenger = command.user.id;

    if let Err(e) = bot.rps.challenge(guild_id, challenger, opponent) {
        return respond_ephemeral(ctx, &command, format!("❌ {}", e)).await;
    }

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content("Elige tu jugada:")
                    .components(buttons::create_rps_move_buttons())
                    .ephemeral(true),
            ),
        )
        .await?;

    command
        .channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .content(format!(
                    "<@{}>, **{}** te retó a Piedra, Papel o Tijeras!",
                    opponent, command.user.name
                ))
                .components(buttons::create_rps_challenge_buttons()),
        )
        .await?;

    Ok(())
}

/// /rpscancel
pub async fn handle_rps_cancel(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    let Some(opponent) = user_option(&command, "opponent") else {
        return respond_ephemeral(ctx, &command, "❌ Falta el oponente").await;
    };

    if bot.rps.cancel(guild_id, command.user.id, opponent) {
        respond_ephemeral(ctx, &command, "Partida cancelada.").await
    } else {
        respond_ephemeral(ctx, &command, "No hay partida activa con ese usuario.").await
    }
}

/// /rpsstats
pub async fn handle_rps_stats(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
) -> Result<()> {
    let target = user_option(&command, "member").unwrap_or(command.user.id);

    match bot.rps.stats_for(target).await {
        Some(record) => {
            let name = command
                .data
                .resolved
                .users
                .get(&target)
                .map(|user| user.name.clone())
                .unwrap_or_else(|| command.user.name.clone());
            respond_embed(ctx, &command, embeds::create_rps_stats_embed(&name, record)).await
        }
        None => respond_ephemeral(ctx, &command, "Ese jugador no tiene partidas registradas.").await,
    }
}

/// /rpsleaderboard
pub async fn handle_rps_leaderboard(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
) -> Result<()> {
    let entries = bot.rps.leaderboard().await;
    if entries.is_empty() {
        return respond_ephemeral(ctx, &command, "Todavía no se jugó ninguna partida.").await;
    }
    respond_embed(ctx, &command, embeds::create_rps_leaderboard_embed(&entries)).await
}

/// /rpsreset: solo el dueño de la aplicación
pub async fn handle_rps_reset(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
) -> Result<()> {
    let app_info = ctx.http.get_current_application_info().await?;
    let is_owner = app_info
        .owner
        .map(|owner| owner.id == command.user.id)
        .unwrap_or(false);

    if !is_owner {
        return respond_ephemeral(
            ctx,
            &command,
            "❌ No estás **autorizado** a borrar la tabla.",
        )
        .await;
    }

    bot.rps.reset_stats().await?;
    respond_ephemeral(ctx, &command, "🧹 **La tabla de RPS fue borrada.**").await
}

/// Botones de RPS: aceptar/rechazar el reto y las tres jugadas.
pub async fn handle_rps_component(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    let custom_id = component.data.custom_id.as_str();
    let user = component.user.id;

    if custom_id == buttons::ids::RPS_ACCEPT {
        match bot.rps.accept(guild_id, user) {
            Ok(_challenger) => {
                // Quitar los botones del reto y darle sus jugadas al oponente.
                component
                    .create_response(
                        &ctx.http,
                        CreateInteractionResponse::UpdateMessage(
                            CreateInteractionResponseMessage::new()
                                .content("✅ Reto aceptado!")
                                .components(vec![]),
                        ),
                    )
                    .await?;
                component
                    .create_followup(
                        &ctx.http,
                        CreateInteractionResponseFollowup::new()
                            .content("Elige tu jugada:")
                            .components(buttons::create_rps_move_buttons())
                            .ephemeral(true),
                    )
                    .await?;
            }
            Err(e) => return ephemeral_component(ctx, component, format!("❌ {}", e)).await,
        }
        return Ok(());
    }

    if custom_id == buttons::ids::RPS_DECLINE {
        match bot.rps.decline(guild_id, user) {
            Ok(_) => {
                component
                    .create_response(
                        &ctx.http,
                        CreateInteractionResponse::UpdateMessage(
                            CreateInteractionResponseMessage::new()
                                .content("❌ Reto rechazado.")
                                .components(vec![]),
                        ),
                    )
                    .await?;
            }
            Err(e) => return ephemeral_component(ctx, component, format!("❌ {}", e)).await,
        }
        return Ok(());
    }

    // Jugada: rps_move_<choice>
    let Some(choice) = custom_id
        .strip_prefix(buttons::ids::RPS_MOVE_PREFIX)
        .and_then(RpsChoice::from_id)
    else {
        return Ok(());
    };

    match bot.rps.choose(guild_id, user, choice).await {
        Ok(None) => {
            component
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::UpdateMessage(
                        CreateInteractionResponseMessage::new()
                            .content(format!("Elegiste {}", choice.emoji()))
                            .components(vec![]),
                    ),
                )
                .await?;
        }
        Ok(Some(outcome)) => {
            component
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::UpdateMessage(
                        CreateInteractionResponseMessage::new()
                            .content(format!("Elegiste {}", choice.emoji()))
                            .components(vec![]),
                    ),
                )
                .await?;
            component
                .channel_id
                .send_message(&ctx.http, CreateMessage::new().content(outcome_text(&outcome)))
                .await?;
        }
        Err(GameError::NoGame) => {
            return ephemeral_component(ctx, component, "❌ No hay partida activa con ese usuario.")
                .await;
        }
        Err(e) => return ephemeral_component(ctx, component, format!("❌ {}", e)).await,
    }

    Ok(())
}

fn outcome_text(outcome: &RpsOutcome) -> String {
    match outcome {
        RpsOutcome::Win {
            winner,
            winning,
            losing,
            ..
        } => format!(
            "<@{}> gana! {} vence a {}",
            winner,
            winning.emoji(),
            losing.emoji()
        ),
        RpsOutcome::Tie { choice, .. } => {
            format!("Empate! Ambos eligieron {}", choice.emoji())
        }
    }
}

async fn ephemeral_component(
    ctx: &Context,
    component: &ComponentInteraction,
    content: impl Into<String>,
) -> Result<()> {
    component
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
