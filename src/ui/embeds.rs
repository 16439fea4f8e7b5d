use serenity::all::Timestamp;
use serenity::builder::{CreateEmbed, CreateEmbedFooter};
use std::time::Duration;

use crate::game::stats::RpsRecord;
use crate::player::state::Track;
use crate::sources::SearchCandidate;

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const GOLD: Colour = Colour::from_rgb(255, 193, 7);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Ritmo Bot";

const PROGRESS_BAR_LEN: usize = 20;

/// Embed de "Reproduciendo Ahora" para una pista recién arrancada.
pub fn create_now_playing_embed(track: &Track) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("🎵 Reproduciendo Ahora")
        .description(format!("[{}]({})", track.title, track.locator))
        .color(colors::MUSIC_PURPLE)
        .field(
            "⏱️ Duración",
            format_duration(track.duration_seconds),
            true,
        )
        .field(
            "👤 Solicitado por",
            format!("<@{}>", track.requested_by),
            true,
        )
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER));

    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}

/// Embed de progreso: el de "Reproduciendo Ahora" más la barra de avance.
pub fn create_progress_embed(track: &Track, elapsed: Duration) -> CreateEmbed {
    create_now_playing_embed(track).field(
        "Progreso",
        render_progress_bar(elapsed.as_secs(), track.duration_seconds),
        false,
    )
}

/// Embed con la cola completa; la pista activa va primera.
pub fn create_queue_embed(queue: &[Track]) -> CreateEmbed {
    let mut embed = CreateEmbed::default().title("📋 Cola").color(colors::SUCCESS_GREEN);

    for (i, track) in queue.iter().enumerate() {
        embed = embed.field(
            format!("{}.", i + 1),
            format!("[{}]({})", track.title, track.locator),
            false,
        );
    }

    embed.footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Embed con los resultados de /search, numerados como el menú.
pub fn create_search_results_embed(query: &str, candidates: &[SearchCandidate]) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title(format!("🔍 Resultados para: {}", query))
        .color(colors::INFO_BLUE);

    if candidates.is_empty() {
        return embed.description("Sin resultados.");
    }

    let mut description = String::new();
    for (i, candidate) in candidates.iter().enumerate() {
        description.push_str(&format!(
            "**{}.** [{}]({}) `[{}]`\n",
            i + 1,
            candidate.title,
            candidate.url,
            format_duration(candidate.duration_seconds),
        ));
    }

    embed
        .description(description)
        .footer(CreateEmbedFooter::new("Elige una canción del menú inferior"))
}

/// Embed de ayuda con todos los comandos.
pub fn create_help_embed() -> CreateEmbed {
    CreateEmbed::default()
        .title("Comandos de Ritmo Bot")
        .color(colors::GOLD)
        .field("/play <URL o búsqueda>", "Reproduce una pista de YouTube o Spotify", false)
        .field("/search <término>", "Busca en YouTube y elige un resultado", false)
        .field("/queue", "Muestra la cola", false)
        .field("/nowplaying", "Muestra la pista actual", false)
        .field("/skip", "Salta la pista actual", false)
        .field("/pause", "Pausa la reproducción", false)
        .field("/resume", "Reanuda la reproducción", false)
        .field("/volume <0-100>", "Ajusta el volumen", false)
        .field("/remove <posición>", "Quita una pista de la cola", false)
        .field("/leave", "Desconecta el bot y limpia la cola", false)
        .field("/rps <oponente>", "Reta a Piedra, Papel o Tijeras", false)
        .field("/rpsstats · /rpsleaderboard", "Estadísticas del juego", false)
        .field("/jamesjoke", "Un chiste al azar", false)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Embed de estadísticas de RPS de un jugador.
pub fn create_rps_stats_embed(display_name: &str, record: RpsRecord) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("🪨📄✂️ Estadísticas RPS — {}", display_name))
        .color(colors::INFO_BLUE)
        .field("Victorias", record.wins.to_string(), true)
        .field("Derrotas", record.losses.to_string(), true)
        .field("Empates", record.ties.to_string(), true)
}

/// Embed de tabla de posiciones de RPS, ordenada por victorias y empates.
pub fn create_rps_leaderboard_embed(entries: &[(u64, RpsRecord)]) -> CreateEmbed {
    let mut description = String::new();
    for (rank, (user_id, record)) in entries.iter().enumerate() {
        description.push_str(&format!(
            "**#{} <@{}>** — {}V / {}D / {}E\n",
            rank + 1,
            user_id,
            record.wins,
            record.losses,
            record.ties,
        ));
    }

    CreateEmbed::default()
        .title("🏆 Tabla de Piedra, Papel o Tijeras")
        .color(colors::GOLD)
        .description(description)
}

/// Formatea segundos como `m:ss` o `h:mm:ss`.
pub fn format_duration(seconds: Option<u64>) -> String {
    let Some(total) = seconds else {
        return "Desconocida".to_string();
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Barra de progreso textual de ancho fijo. Sin duración conocida (streams
/// en vivo) solo muestra el tiempo transcurrido.
pub fn render_progress_bar(elapsed_secs: u64, duration_secs: Option<u64>) -> String {
    let Some(duration) = duration_secs.filter(|d| *d > 0) else {
        return format!("Transcurrido: {}", format_duration(Some(elapsed_secs)));
    };

    let filled = ((elapsed_secs as f64 / duration as f64) * PROGRESS_BAR_LEN as f64) as usize;
    let filled = filled.min(PROGRESS_BAR_LEN);
    let bar: String = "█".repeat(filled) + &"─".repeat(PROGRESS_BAR_LEN - filled);

    format!(
        "[{}] {} / {}",
        bar,
        format_duration(Some(elapsed_secs.min(duration))),
        format_duration(Some(duration)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formatea_duraciones() {
        assert_eq!(format_duration(None), "Desconocida");
        assert_eq!(format_duration(Some(0)), "0:00");
        assert_eq!(format_duration(Some(212)), "3:32");
        assert_eq!(format_duration(Some(3661)), "1:01:01");
    }

    #[test]
    fn la_barra_arranca_vacia_y_termina_llena() {
        assert_eq!(
            render_progress_bar(0, Some(100)),
            "[────────────────────] 0:00 / 1:40"
        );
        assert_eq!(
            render_progress_bar(50, Some(100)),
            "[██████████──────────] 0:50 / 1:40"
        );
        assert_eq!(
            render_progress_bar(100, Some(100)),
            "[████████████████████] 1:40 / 1:40"
        );
    }

    #[test]
    fn la_barra_no_desborda_pasada_la_duracion() {
        assert_eq!(
            render_progress_bar(130, Some(100)),
            "[████████████████████] 1:40 / 1:40"
        );
    }

    #[test]
    fn sin_duracion_solo_muestra_transcurrido() {
        assert_eq!(render_progress_bar(75, None), "Transcurrido: 1:15");
        assert_eq!(render_progress_bar(10, Some(0)), "Transcurrido: 0:10");
    }
}
