use anyhow::Result;
use rand::seq::SliceRandom;
use serenity::model::application::CommandInteraction;
use serenity::prelude::Context;

use crate::bot::handlers::{respond_ephemeral, respond_text};
use crate::bot::RitmoBot;

/// /jamesjoke: una línea al azar del archivo de chistes configurado.
pub async fn handle_joke(ctx: &Context, command: CommandInteraction, bot: &RitmoBot) -> Result<()> {
    let jokes: Vec<String> = match tokio::fs::read_to_string(&bot.config.jokes_file).await {
        Ok(raw) => raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    };

    // El RNG no cruza ningún await.
    let joke = {
        let mut rng = rand::thread_rng();
        jokes.choose(&mut rng).cloned()
    };

    match joke {
        Some(joke) => respond_text(ctx, &command, joke).await,
        None => respond_ephemeral(ctx, &command, "❌ No hay chistes cargados.").await,
    }
}
