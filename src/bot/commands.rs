use anyhow::Result;
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::CommandOptionType;
use serenity::model::id::GuildId;
use serenity::prelude::Context;

/// Registra comandos globales (propagación lenta, ~1 hora)
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    for command in all_commands() {
        ctx.http.create_global_command(&command).await?;
    }
    Ok(())
}

/// Registra comandos para una guild específica (desarrollo, propagación inmediata)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;
    Ok(())
}

fn all_commands() -> Vec<CreateCommand> {
    vec![
        play_command(),
        search_command(),
        skip_command(),
        pause_command(),
        resume_command(),
        volume_command(),
        remove_command(),
        queue_command(),
        nowplaying_command(),
        leave_command(),
        help_command(),
        rps_command(),
        rpscancel_command(),
        rpsstats_command(),
        rpsleaderboard_command(),
        rpsreset_command(),
        jamesjoke_command(),
        verify_command(),
    ]
}

// Comandos de reproducción

fn play_command() -> CreateCommand {
    CreateCommand::new("play")
        .description("Reproduce una pista de YouTube o Spotify")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "url",
                "URL de YouTube/Spotify o término de búsqueda",
            )
            .required(true),
        )
}

fn search_command() -> CreateCommand {
    CreateCommand::new("search")
        .description("Busca en YouTube y elige una canción")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "query", "Término de búsqueda")
                .required(true),
        )
}

fn skip_command() -> CreateCommand {
    CreateCommand::new("skip").description("Salta la pista actual")
}

fn pause_command() -> CreateCommand {
    CreateCommand::new("pause").description("Pausa la reproducción")
}

fn resume_command() -> CreateCommand {
    CreateCommand::new("resume").description("Reanuda la reproducción pausada")
}

fn volume_command() -> CreateCommand {
    CreateCommand::new("volume")
        .description("Ajusta el volumen (0-100%)")
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "percent", "Porcentaje de volumen")
                .required(true),
        )
}

fn remove_command() -> CreateCommand {
    CreateCommand::new("remove")
        .description("Quita una pista de la cola")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                "position",
                "Posición en la cola (desde 1)",
            )
            .required(true),
        )
}

fn queue_command() -> CreateCommand {
    CreateCommand::new("queue").description("Muestra la cola actual")
}

fn nowplaying_command() -> CreateCommand {
    CreateCommand::new("nowplaying").description("Muestra la pista que está sonando")
}

fn leave_command() -> CreateCommand {
    CreateCommand::new("leave").description("Desconecta el bot y limpia la cola")
}

fn help_command() -> CreateCommand {
    CreateCommand::new("help").description("Muestra todos los comandos")
}

// Comandos del juego

fn rps_command() -> CreateCommand {
    CreateCommand::new("rps")
        .description("Reta a alguien a Piedra, Papel o Tijeras")
        .add_option(
            CreateCommandOption::new(CommandOptionType::User, "opponent", "A quién retas")
                .required(true),
        )
}

fn rpscancel_command() -> CreateCommand {
    CreateCommand::new("rpscancel")
        .description("Cancela tu partida activa con alguien")
        .add_option(
            CreateCommandOption::new(CommandOptionType::User, "opponent", "Con quién jugabas")
                .required(true),
        )
}

fn rpsstats_command() -> CreateCommand {
    CreateCommand::new("rpsstats")
        .description("Estadísticas de RPS tuyas o de otro jugador")
        .add_option(CreateCommandOption::new(
            CommandOptionType::User,
            "member",
            "Jugador a consultar",
        ))
}

fn rpsleaderboard_command() -> CreateCommand {
    CreateCommand::new("rpsleaderboard").description("Tabla de posiciones de RPS")
}

fn rpsreset_command() -> CreateCommand {
    CreateCommand::new("rpsreset")
        .description("SOLO DUEÑO: Borra todas las estadísticas de RPS")
}

// Misceláneos

fn jamesjoke_command() -> CreateCommand {
    CreateCommand::new("jamesjoke").description("Un chiste de James al azar")
}

fn verify_command() -> CreateCommand {
    CreateCommand::new("verify")
        .description("Verifica a un miembro del servidor")
        .add_option(
            CreateCommandOption::new(CommandOptionType::User, "member", "Miembro a verificar")
                .required(true),
        )
}
