//! Ritmo Bot: bot de Discord con reproductor de música por guild, Piedra,
//! Papel o Tijeras con estadísticas persistidas y utilidades de moderación.
//!
//! El corazón es [`player::PlaybackEngine`]: un worker por guild que
//! serializa comandos de usuario, fines de pista y tareas de fondo contra el
//! mismo estado, sin bloquear a los demás guilds.

pub mod bot;
pub mod config;
pub mod error;
pub mod game;
pub mod player;
pub mod sources;
pub mod ui;
pub mod voice;
