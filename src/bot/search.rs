use anyhow::Result;
use dashmap::DashMap;
use serenity::builder::{
    CreateActionRow, CreateInteractionResponse, CreateInteractionResponseMessage,
    EditInteractionResponse,
};
use serenity::model::application::{CommandInteraction, ComponentInteraction};
use serenity::model::application::ComponentInteractionDataKind;
use serenity::model::id::{GuildId, UserId};
use serenity::prelude::Context;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

use crate::bot::handlers::{defer, edit_text, respond_ephemeral, str_option, user_voice_channel};
use crate::bot::RitmoBot;
use crate::player::TrackRequest;
use crate::sources::SearchCandidate;
use crate::ui::{buttons, embeds};

/// Cuánto vive una búsqueda esperando elección.
const SESSION_TTL: Duration = Duration::from_secs(60);

/// Sesiones efímeras de búsqueda: una por (guild, usuario). La expiración es
/// explícita y se verifica al acceder; una sesión vencida se libera ahí
/// mismo, nunca queda colgando.
pub struct SearchSessions {
    sessions: DashMap<(GuildId, UserId), SearchSession>,
    ttl: Duration,
}

struct SearchSession {
    candidates: Vec<SearchCandidate>,
    created_at: Instant,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("no tienes una búsqueda activa; usa /search primero")]
    NoSession,

    #[error("la búsqueda expiró, vuelve a intentarlo")]
    Expired,

    #[error("esa opción no existe en los resultados")]
    BadIndex,
}

impl SearchSessions {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: SESSION_TTL,
        }
    }

    pub fn put(&self, guild: GuildId, user: UserId, candidates: Vec<SearchCandidate>) {
        self.sessions.insert(
            (guild, user),
            SearchSession {
                candidates,
                created_at: Instant::now(),
            },
        );
    }

    /// Consume la elección del usuario. En cualquier salida la sesión deja
    /// de existir, salvo que nunca haya existido.
    pub fn take(
        &self,
        guild: GuildId,
        user: UserId,
        index: usize,
    ) -> Result<SearchCandidate, SearchError> {
        let (_, session) = self
            .sessions
            .remove(&(guild, user))
            .ok_or(SearchError::NoSession)?;

        if session.created_at.elapsed() >= self.ttl {
            return Err(SearchError::Expired);
        }

        session
            .candidates
            .into_iter()
            .nth(index)
            .ok_or(SearchError::BadIndex)
    }
}

impl Default for SearchSessions {
    fn default() -> Self {
        Self::new()
    }
}

/// /search: busca candidatos y muestra el menú de selección.
pub async fn handle_search_command(
    ctx: &Context,
    command: CommandInteraction,
    bot: &RitmoBot,
) -> Result<()> {
    let Some(guild_id) = command.guild_id else {
        return respond_ephemeral(ctx, &command, "❌ Este comando solo funciona en un servidor").await;
    };
    let Some(query) = str_option(&command, "query").map(str::to_string) else {
        return respond_ephemeral(ctx, &command, "❌ Falta el término de búsqueda").await;
    };

    if user_voice_channel(ctx, guild_id, command.user.id).is_none() {
        return respond_ephemeral(
            ctx,
            &command,
            "Debes estar en un canal de voz para usar `/search`.",
        )
        .await;
    }

    defer(ctx, &command).await?;

    info!("🔍 Búsqueda iniciada por {}: {}", command.user.name, query);

    let candidates = match bot.engine.search(&query, bot.config.search_results).await {
        Ok(candidates) => candidates,
        Err(e) => {
            return edit_text(ctx, &command, format!("❌ La búsqueda falló: {}", e)).await;
        }
    };

    let embed = embeds::create_search_results_embed(&query, &candidates);
    let menu = buttons::create_search_select_menu(&candidates);

    bot.searches.put(guild_id, command.user.id, candidates);

    command
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new()
                .embed(embed)
                .components(vec![CreateActionRow::SelectMenu(menu)]),
        )
        .await?;

    Ok(())
}

/// Elección en el menú de /search: encola el candidato elegido.
pub async fn handle_search_selection(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: &RitmoBot,
    guild_id: GuildId,
) -> Result<()> {
    let index = match &component.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values
            .first()
            .and_then(|value| value.parse::<usize>().ok()),
        _ => None,
    };
    let Some(index) = index else {
        return Ok(());
    };

    let Some(voice_channel) = user_voice_channel(ctx, guild_id, component.user.id) else {
        return update_component(ctx, component, "Debes estar en un canal de voz para elegir.").await;
    };

    let candidate = match bot.searches.take(guild_id, component.user.id, index) {
        Ok(candidate) => candidate,
        Err(e) => return update_component(ctx, component, format!("❌ {}", e)).await,
    };

    let request = TrackRequest {
        locator: candidate.url,
        title: Some(candidate.title.clone()),
        requested_by: component.user.id,
    };

    match bot
        .engine
        .enqueue(guild_id, vec![request], voice_channel, component.channel_id)
        .await
    {
        Ok(_) => {
            update_component(
                ctx,
                component,
                format!("➕ Agregada a la cola: {}", candidate.title),
            )
            .await
        }
        Err(e) => {
            update_component(ctx, component, crate::bot::handlers::user_error_text(&e)).await
        }
    }
}

/// Reemplaza el mensaje del menú por un texto plano (sin componentes).
async fn update_component(
    ctx: &Context,
    component: &ComponentInteraction,
    content: impl Into<String>,
) -> Result<()> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .embeds(vec![])
                    .components(vec![]),
            ),
        )
        .await?;
    Ok(())
}
