//! Spotify Web API album search, authorized with the client-credentials flow.
//!
//! The bearer token is cached in a [`TokenCache`] owned by the catalog client
//! and refreshed a minute before it expires.

use serde::Deserialize;

use super::matching::AlbumQuery;
use super::token::TokenCache;
use super::{AlbumHit, CatalogSource, first_nonempty, year_prefix};
use crate::error::MdLabelError;

pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SEARCH_URL: &str = "https://api.spotify.com/v1/search";

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub albums: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub items: Vec<Album>,
}

#[derive(Debug, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Image {
    pub url: Option<String>,
}

async fn request_token(
    client: &reqwest::Client,
    credentials: &SpotifyCredentials,
) -> Result<(String, u64), MdLabelError> {
    let response = client
        .post(TOKEN_URL)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Spotify token request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(MdLabelError::Catalog(format!(
            "Spotify token endpoint returned HTTP {}",
            response.status()
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Spotify token response invalid: {}", e)))?;
    Ok((token.access_token, token.expires_in))
}

pub async fn search(
    client: &reqwest::Client,
    credentials: &SpotifyCredentials,
    tokens: &TokenCache,
    query: &AlbumQuery,
) -> Result<Vec<AlbumHit>, MdLabelError> {
    let token = tokens
        .get_or_refresh(|| request_token(client, credentials))
        .await?;

    let q = format!("artist:{} album:{}", query.artist.trim(), query.album.trim());
    let response = client
        .get(SEARCH_URL)
        .bearer_auth(&token)
        .query(&[("q", q.as_str()), ("type", "album"), ("limit", "20")])
        .send()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Spotify request failed: {}", e)))?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        tokens.invalidate().await;
    }
    if !response.status().is_success() {
        return Err(MdLabelError::Catalog(format!(
            "Spotify returned HTTP {}",
            response.status()
        )));
    }

    let body: SearchResponse = response
        .json()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Spotify response invalid: {}", e)))?;
    Ok(normalize(body, query))
}

pub fn normalize(response: SearchResponse, query: &AlbumQuery) -> Vec<AlbumHit> {
    let Some(albums) = response.albums else {
        return Vec::new();
    };

    albums
        .items
        .into_iter()
        .filter(|album| album.album_type == "album")
        .filter(|album| {
            let artist = album.artists.first().map(|a| a.name.as_str()).unwrap_or("");
            query.accepts(artist, &album.name)
        })
        .map(|album| {
            // images are ordered largest first
            let image = |i: usize| album.images.get(i).and_then(|img| img.url.clone());
            let artwork_url = first_nonempty([&image(0)]);
            let thumbnail_url = first_nonempty([&image(2), &image(1), &image(0)]);
            let artist = album
                .artists
                .first()
                .map(|a| a.name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| query.artist.clone());

            AlbumHit {
                id: format!("spotify-{}", album.id),
                year: year_prefix(album.release_date.as_deref()),
                kind: "Album".to_string(),
                thumbnail_url,
                artwork_url,
                title: album.name,
                artist,
                source: CatalogSource::Spotify,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "albums": {
            "items": [
                {
                    "id": "6dVIqQ8qmQ5GBnJ9shOYGE",
                    "name": "OK Computer",
                    "album_type": "album",
                    "artists": [{"name": "Radiohead"}],
                    "images": [
                        {"url": "https://i.scdn.co/640", "width": 640},
                        {"url": "https://i.scdn.co/300", "width": 300},
                        {"url": "https://i.scdn.co/64", "width": 64}
                    ],
                    "release_date": "1997-05-21"
                },
                {
                    "id": "single1",
                    "name": "OK Computer",
                    "album_type": "single",
                    "artists": [{"name": "Radiohead"}],
                    "images": []
                },
                {
                    "id": "noimg",
                    "name": "OK Computer OKNOTOK",
                    "album_type": "album",
                    "artists": [{"name": "Radiohead"}],
                    "images": [{"url": "https://i.scdn.co/only"}]
                }
            ]
        }
    }"#;

    #[test]
    fn test_normalize_albums_only() {
        let response: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let hits = normalize(response, &AlbumQuery::new("Radiohead", "OK Computer"));

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "spotify-6dVIqQ8qmQ5GBnJ9shOYGE");
        assert_eq!(hits[0].year, "1997");
        assert_eq!(hits[0].artwork_url.as_deref(), Some("https://i.scdn.co/640"));
        assert_eq!(hits[0].thumbnail_url.as_deref(), Some("https://i.scdn.co/64"));
    }

    #[test]
    fn test_single_image_is_both_thumbnail_and_artwork() {
        let response: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let hits = normalize(response, &AlbumQuery::new("Radiohead", "OK Computer"));
        assert_eq!(hits[1].thumbnail_url.as_deref(), Some("https://i.scdn.co/only"));
        assert_eq!(hits[1].artwork_url.as_deref(), Some("https://i.scdn.co/only"));
        assert_eq!(hits[1].year, "");
    }

    #[test]
    fn test_token_response_default_lifetime() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token": "x", "token_type": "Bearer"}"#).unwrap();
        assert_eq!(token.expires_in, 3600);
    }
}
