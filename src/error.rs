use thiserror::Error;

/// Un locator (URL o término de búsqueda) no se pudo resolver a un stream
/// reproducible. Nunca es fatal: la política del reproductor es descartar la
/// entrada afectada y continuar con la siguiente.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no se pudo ejecutar yt-dlp: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("el extractor terminó con error: {0}")]
    Extractor(String),

    #[error("tiempo de espera agotado resolviendo el stream")]
    Timeout,

    #[error("salida del extractor con formato inesperado: {0}")]
    Parse(String),

    #[error("sin resultados para: {0}")]
    NoResults(String),

    #[error("error HTTP consultando la API externa: {0}")]
    Http(#[from] reqwest::Error),
}

/// El canal de voz no se pudo alcanzar. Se descarta el intento actual sin
/// reintento automático: el usuario debe volver a pedir reproducción.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("no hay canal de voz vinculado; usa /play estando en un canal de voz")]
    NoChannelBound,

    #[error("no se pudo conectar al canal de voz: {0}")]
    Join(String),
}

/// La sesión de audio falló al arrancar o murió a mitad del stream. Se trata
/// como un fin de pista y se avanza a la siguiente.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no se pudo iniciar la reproducción: {0}")]
    Start(String),

    #[error("la sesión de audio terminó con error: {0}")]
    Stream(String),
}

/// Entrada inválida del usuario. Se reporta al comando que la emitió sin
/// mutar ningún estado.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserInputError {
    #[error("el volumen debe estar entre 0 y 100")]
    InvalidVolume,

    #[error("posición inválida en la cola")]
    InvalidPosition,

    #[error("no hay nada reproduciéndose")]
    NothingPlaying,

    #[error("no hay nada pausado")]
    NothingPaused,

    #[error("la cola está llena (máximo {0} canciones)")]
    QueueFull(usize),
}

/// Error unificado de las operaciones públicas del reproductor.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Input(#[from] UserInputError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("el reproductor de este servidor no está disponible")]
    WorkerGone,
}
