use anyhow::Result;
use serenity::model::application::CommandInteraction;
use serenity::model::id::{ChannelId, GuildId, RoleId};
use serenity::prelude::Context;
use tracing::{info, warn};

use crate::bot::handlers::{respond_ephemeral, respond_text, user_option};
use crate::bot::RitmoBot;

/// /verify: quita el rol de no-verificado, asigna el de verificado y deja
/// registro en el canal de log. Solo para quien tenga el rol de admin.
pub async fn handle_verify(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    let (Some(admin_role), Some(verified_role)) =
        (bot.config.admin_role_id, bot.config.verified_role_id)
    else {
        return respond_ephemeral(ctx, &command, "❌ La verificación no está configurada.").await;
    };

    let is_admin = command
        .member
        .as_ref()
        .map(|member| member.roles.contains(&RoleId::new(admin_role)))
        .unwrap_or(false);

    if !is_admin {
        return respond_ephemeral(ctx, &command, "❌ No tienes permiso para usar este comando.")
            .await;
    }

    let Some(target) = user_option(&command, "member") else {
        return respond_ephemeral(ctx, &command, "❌ Falta el miembro a verificar").await;
    };

    let member = guild_id.member(&ctx.http, target).await?;

    if let Some(unverified_role) = bot.config.unverified_role_id {
        let unverified_role = RoleId::new(unverified_role);
        if member.roles.contains(&unverified_role) {
            member.remove_role(&ctx.http, unverified_role).await?;
        }
    }

    member.add_role(&ctx.http, RoleId::new(verified_role)).await?;

    info!("✅ {} verificado por {} en guild {}", target, command.user.name, guild_id);
    respond_text(ctx, &command, format!("✅ <@{}> ha sido verificado.", target)).await?;

    if let Some(log_channel) = bot.config.verify_log_channel_id {
        let log = format!(
            "✅ **Verificación**\nUsuario: <@{}>\nVerificado por: <@{}>",
            target, command.user.id
        );
        if let Err(e) = ChannelId::new(log_channel).say(&ctx.http, log).await {
            warn!("⚠️ No se pudo registrar la verificación: {}", e);
        }
    }

    Ok(())
}
