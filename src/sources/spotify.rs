use base64::engine::general_purpose::STANDARD as B64_ENGINE;
use base64::Engine;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::error::ResolutionError;

/// Cliente mínimo de la Web API de Spotify (client credentials). Spotify no
/// entrega audio: solo sirve para expandir URLs de track/playlist a términos
/// de búsqueda que después resuelve el extractor normal.
pub struct SpotifyClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpotifyKind {
    Track,
    Playlist,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TrackObject {
    name: String,
    artists: Vec<ArtistObject>,
}

#[derive(Deserialize)]
struct ArtistObject {
    name: String,
}

#[derive(Deserialize)]
struct PlaylistPage {
    items: Vec<PlaylistItem>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    track: Option<TrackObject>,
}

impl SpotifyClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            client_secret,
        }
    }

    pub fn is_spotify_url(url: &str) -> bool {
        url.contains("open.spotify.com")
    }

    /// Expande una URL de Spotify a términos de búsqueda "título artista",
    /// uno por pista. Una playlist produce varios.
    pub async fn expand(&self, raw_url: &str) -> Result<Vec<String>, ResolutionError> {
        let (kind, id) = parse_spotify_url(raw_url)
            .ok_or_else(|| ResolutionError::Parse(raw_url.to_string()))?;

        let token = self.fetch_token().await?;

        match kind {
            SpotifyKind::Track => {
                let track: TrackObject = self
                    .get_json(&format!("https://api.spotify.com/v1/tracks/{}", id), &token)
                    .await?;
                Ok(vec![search_query(&track)])
            }
            SpotifyKind::Playlist => {
                let page: PlaylistPage = self
                    .get_json(
                        &format!("https://api.spotify.com/v1/playlists/{}/tracks?limit=50", id),
                        &token,
                    )
                    .await?;

                let queries: Vec<String> = page
                    .items
                    .into_iter()
                    .filter_map(|item| item.track)
                    .map(|track| search_query(&track))
                    .collect();

                if queries.is_empty() {
                    return Err(ResolutionError::NoResults(raw_url.to_string()));
                }

                info!("🎵 Playlist de Spotify expandida a {} búsquedas", queries.len());
                Ok(queries)
            }
        }
    }

    async fn fetch_token(&self) -> Result<String, ResolutionError> {
        let basic = B64_ENGINE.encode(format!("{}:{}", self.client_id, self.client_secret));

        let response = self
            .http
            .post("https://accounts.spotify.com/api/token")
            .header("Authorization", format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?;

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<T, ResolutionError> {
        Ok(self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

fn parse_spotify_url(raw: &str) -> Option<(SpotifyKind, String)> {
    let parsed = Url::parse(raw).ok()?;
    if parsed.host_str() != Some("open.spotify.com") {
        return None;
    }

    let mut segments = parsed.path_segments()?;
    let mut kind_segment = segments.next()?;
    // Rutas con prefijo regional: /intl-es/track/{id}
    if kind_segment.starts_with("intl-") {
        kind_segment = segments.next()?;
    }

    let kind = match kind_segment {
        "track" => SpotifyKind::Track,
        "playlist" => SpotifyKind::Playlist,
        _ => return None,
    };

    let id = segments.next()?;
    if id.is_empty() {
        return None;
    }

    Some((kind, id.to_string()))
}

fn search_query(track: &TrackObject) -> String {
    match track.artists.first() {
        Some(artist) => format!("{} {}", track.name, artist.name),
        None => track.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detecta_urls_de_track_y_playlist() {
        assert_eq!(
            parse_spotify_url("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"),
            Some((SpotifyKind::Track, "4uLU6hMCjMI75M1A2tKUQC".to_string()))
        );
        assert_eq!(
            parse_spotify_url("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=x"),
            Some((SpotifyKind::Playlist, "37i9dQZF1DXcBWIGoYBM5M".to_string()))
        );
    }

    #[test]
    fn acepta_rutas_con_prefijo_regional() {
        assert_eq!(
            parse_spotify_url("https://open.spotify.com/intl-es/track/abc123"),
            Some((SpotifyKind::Track, "abc123".to_string()))
        );
    }

    #[test]
    fn rechaza_otras_urls() {
        assert_eq!(parse_spotify_url("https://open.spotify.com/artist/xyz"), None);
        assert_eq!(parse_spotify_url("https://www.youtube.com/watch?v=abc"), None);
        assert_eq!(parse_spotify_url("no es una url"), None);
    }

    #[test]
    fn la_busqueda_combina_titulo_y_artista() {
        let track = TrackObject {
            name: "Praise You".to_string(),
            artists: vec![ArtistObject {
                name: "Fatboy Slim".to_string(),
            }],
        };
        assert_eq!(search_query(&track), "Praise You Fatboy Slim");

        let sin_artista = TrackObject {
            name: "Anónima".to_string(),
            artists: vec![],
        };
        assert_eq!(search_query(&sin_artista), "Anónima");
    }
}
