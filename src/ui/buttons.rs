use serenity::all::ButtonStyle;
use serenity::builder::{
    CreateActionRow, CreateButton, CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption,
};

use crate::game::RpsChoice;
use crate::sources::SearchCandidate;
use crate::ui::embeds::format_duration;

/// IDs personalizados de los componentes interactivos
pub mod ids {
    pub const SEARCH_SELECT: &str = "search_select";
    pub const RPS_ACCEPT: &str = "rps_accept";
    pub const RPS_DECLINE: &str = "rps_decline";
    pub const RPS_MOVE_PREFIX: &str = "rps_move_";
}

/// Botones de jugada para una partida de RPS.
pub fn create_rps_move_buttons() -> Vec<CreateActionRow> {
    let row = CreateActionRow::Buttons(
        [RpsChoice::Rock, RpsChoice::Paper, RpsChoice::Scissors]
            .into_iter()
            .map(|choice| {
                CreateButton::new(format!("{}{}", ids::RPS_MOVE_PREFIX, choice.id()))
                    .label(choice.emoji())
                    .style(ButtonStyle::Primary)
            })
            .collect(),
    );
    vec![row]
}

/// Botones de aceptar/rechazar un reto de RPS.
pub fn create_rps_challenge_buttons() -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(ids::RPS_ACCEPT)
            .label("Aceptar")
            .style(ButtonStyle::Success),
        CreateButton::new(ids::RPS_DECLINE)
            .label("Rechazar")
            .style(ButtonStyle::Danger),
    ])]
}

/// Menú de selección para los resultados de /search.
pub fn create_search_select_menu(candidates: &[SearchCandidate]) -> CreateSelectMenu {
    let options = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let label = format!(
                "{}. {} [{}]",
                i + 1,
                candidate.title,
                format_duration(candidate.duration_seconds)
            );
            // Discord limita las etiquetas a 100 caracteres.
            let label: String = label.chars().take(100).collect();
            CreateSelectMenuOption::new(label, i.to_string())
        })
        .collect();

    CreateSelectMenu::new(ids::SEARCH_SELECT, CreateSelectMenuKind::String { options })
        .placeholder("Elige una canción para encolar...")
        .min_values(1)
        .max_values(1)
}
