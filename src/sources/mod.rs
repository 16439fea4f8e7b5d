pub mod spotify;
pub mod ytdlp;

use async_trait::async_trait;

use crate::error::ResolutionError;

pub use spotify::SpotifyClient;
pub use ytdlp::YtDlpResolver;

/// Descriptor de una pista ya resuelta a un stream directo de audio.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    /// URL canónica de la página del video.
    pub page_url: String,
    /// Stream directo. Expira: sirve para reproducir ahora, no para guardar.
    pub stream_url: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration_seconds: Option<u64>,
}

/// Candidato de búsqueda para la desambiguación interactiva: título más un
/// locator reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCandidate {
    pub url: String,
    pub title: String,
    pub duration_seconds: Option<u64>,
}

/// Resolución de locators (URL directa o término de búsqueda) contra el
/// servicio externo de medios.
///
/// La resolución no es idempotente: los stream URLs rotan y expiran, así que
/// el caller debe resolver inmediatamente antes de reproducir y nunca
/// cachear un stream entre esperas de cola.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync + 'static {
    /// Resuelve un locator al mejor match reproducible.
    async fn resolve(&self, locator: &str) -> Result<ResolvedTrack, ResolutionError>;

    /// Devuelve hasta `limit` candidatos ordenados para que el usuario elija.
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, ResolutionError>;
}
