use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{ResolvedTrack, SearchCandidate, TrackResolver};
use crate::error::ResolutionError;

/// Formato de salida de yt-dlp para resolver una pista. El título va último
/// para que un `|` dentro del título no rompa el parseo.
const RESOLVE_FORMAT: &str = "%(webpage_url)s|%(url)s|%(thumbnail)s|%(duration)s|%(title)s";
const SEARCH_FORMAT: &str = "%(url)s|%(duration)s|%(title)s";

/// Resolver basado en yt-dlp como proceso hijo. Sin estado propio: cada
/// resolución es una invocación nueva, con timeout acotado.
pub struct YtDlpResolver {
    ytdlp_path: String,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(ytdlp_path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Verifica que el ejecutable de yt-dlp exista y responda.
    pub async fn verify_dependencies(&self) -> Result<()> {
        let check = tokio::process::Command::new(&self.ytdlp_path)
            .arg("--version")
            .output()
            .await;

        match check {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                info!("✅ yt-dlp versión: {}", version.trim());
                Ok(())
            }
            _ => {
                error!(
                    "❌ yt-dlp no encontrado en `{}`. Instala con: pip install yt-dlp",
                    self.ytdlp_path
                );
                anyhow::bail!("yt-dlp no disponible")
            }
        }
    }

    async fn run(&self, args: &[&str], target: &str) -> Result<String, ResolutionError> {
        let mut cmd = tokio::process::Command::new(&self.ytdlp_path);
        cmd.args(args);

        if let Some(cookies) = find_cookies_file().await {
            cmd.args(["--cookies", &cookies]);
        }

        cmd.arg(target);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ResolutionError::Timeout)?
            .map_err(ResolutionError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolutionError::Extractor(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, locator: &str) -> Result<ResolvedTrack, ResolutionError> {
        info!("🔍 Resolviendo stream para: {}", locator);

        let stdout = self
            .run(
                &[
                    "--print",
                    RESOLVE_FORMAT,
                    "--default-search",
                    "ytsearch",
                    "--no-playlist",
                    "--format",
                    "ba[ext=webm][acodec=opus]/ba/best",
                    "--quiet",
                    "--no-warnings",
                    "--socket-timeout",
                    "15",
                    "--retries",
                    "2",
                ],
                locator,
            )
            .await?;

        let line = stdout
            .lines()
            .next()
            .ok_or_else(|| ResolutionError::NoResults(locator.to_string()))?;

        parse_resolve_line(line).ok_or_else(|| {
            warn!("⚠️ Línea de yt-dlp con formato inesperado: {}", line);
            ResolutionError::Parse(line.to_string())
        })
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, ResolutionError> {
        info!("🔍 Buscando {} candidatos para: {}", limit, query);

        let target = format!("ytsearch{}:{}", limit, query);
        let stdout = self
            .run(
                &[
                    "--print",
                    SEARCH_FORMAT,
                    "--flat-playlist",
                    "--skip-download",
                    "--quiet",
                    "--no-warnings",
                    "--socket-timeout",
                    "15",
                ],
                &target,
            )
            .await?;

        let candidates: Vec<SearchCandidate> = stdout
            .lines()
            .filter_map(parse_search_line)
            .take(limit)
            .collect();

        if candidates.is_empty() {
            return Err(ResolutionError::NoResults(query.to_string()));
        }

        Ok(candidates)
    }
}

/// Busca un archivo de cookies para yt-dlp (mitiga el throttling).
async fn find_cookies_file() -> Option<String> {
    let candidates = [
        format!(
            "{}/.config/yt-dlp/cookies.txt",
            std::env::var("HOME").unwrap_or_default()
        ),
        "./cookies.txt".to_string(),
    ];

    for path in candidates {
        if tokio::fs::metadata(&path).await.is_ok() {
            debug!("🍪 Cookies encontradas en: {}", path);
            return Some(path);
        }
    }

    None
}

fn parse_resolve_line(line: &str) -> Option<ResolvedTrack> {
    let mut parts = line.splitn(5, '|');
    let page_url = parts.next()?.trim();
    let stream_url = parts.next()?.trim();
    let thumbnail = optional_field(parts.next()?);
    let duration_seconds = parse_duration_field(parts.next()?);
    let title = parts.next()?.trim();

    if page_url.is_empty() || stream_url.is_empty() || stream_url == "NA" {
        return None;
    }

    Some(ResolvedTrack {
        page_url: page_url.to_string(),
        stream_url: stream_url.to_string(),
        title: if title.is_empty() || title == "NA" {
            page_url.to_string()
        } else {
            title.to_string()
        },
        thumbnail,
        duration_seconds,
    })
}

fn parse_search_line(line: &str) -> Option<SearchCandidate> {
    let mut parts = line.splitn(3, '|');
    let url = parts.next()?.trim();
    let duration_seconds = parse_duration_field(parts.next()?);
    let title = parts.next()?.trim();

    if url.is_empty() || url == "NA" {
        return None;
    }

    Some(SearchCandidate {
        url: url.to_string(),
        title: if title.is_empty() || title == "NA" {
            url.to_string()
        } else {
            title.to_string()
        },
        duration_seconds,
    })
}

/// Campos que yt-dlp imprime como "NA" cuando no existen.
fn optional_field(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty() && raw != "NA").then(|| raw.to_string())
}

/// La duración puede venir como entero o como float ("212.0").
fn parse_duration_field(raw: &str) -> Option<u64> {
    raw.trim().parse::<f64>().ok().map(|d| d as u64)
}
