//! Last.fm `album.search`. Requires an API key; results carry no year.

use serde::Deserialize;

use super::matching::AlbumQuery;
use super::{AlbumHit, CatalogSource, first_nonempty};
use crate::error::MdLabelError;

pub const API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Image size labels, preferred first.
const SIZE_PREFERENCE: [&str; 3] = ["extralarge", "large", "medium"];

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub results: Option<Results>,
}

#[derive(Debug, Deserialize)]
pub struct Results {
    pub albummatches: Option<AlbumMatches>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumMatches {
    #[serde(default)]
    pub album: Vec<Album>,
}

#[derive(Debug, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artist: String,
    pub mbid: Option<String>,
    #[serde(default)]
    pub image: Vec<Image>,
}

#[derive(Debug, Deserialize)]
pub struct Image {
    #[serde(rename = "#text")]
    pub url: Option<String>,
    #[serde(default)]
    pub size: String,
}

pub async fn search(
    client: &reqwest::Client,
    api_key: &str,
    query: &AlbumQuery,
) -> Result<Vec<AlbumHit>, MdLabelError> {
    let text = query.free_text();
    let response = client
        .get(API_URL)
        .query(&[
            ("method", "album.search"),
            ("album", text.as_str()),
            ("api_key", api_key),
            ("format", "json"),
            ("limit", "20"),
        ])
        .send()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Last.fm request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(MdLabelError::Catalog(format!(
            "Last.fm returned HTTP {}",
            response.status()
        )));
    }

    let body: SearchResponse = response
        .json()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Last.fm response invalid: {}", e)))?;
    Ok(normalize(body, query))
}

/// Whitespace runs become a single `-`.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn largest_image(images: &[Image]) -> Option<String> {
    SIZE_PREFERENCE
        .iter()
        .find_map(|size| images.iter().find(|img| img.size == *size))
        .or_else(|| images.last())
        .and_then(|img| first_nonempty([&img.url]))
}

pub fn normalize(response: SearchResponse, query: &AlbumQuery) -> Vec<AlbumHit> {
    let albums = response
        .results
        .and_then(|r| r.albummatches)
        .map(|m| m.album)
        .unwrap_or_default();

    albums
        .into_iter()
        .filter(|album| !album.name.is_empty() && !album.artist.is_empty())
        .filter(|album| query.accepts(&album.artist, &album.name))
        .map(|album| {
            let key = album
                .mbid
                .as_deref()
                .filter(|mbid| !mbid.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| slug(&album.name));
            let image = largest_image(&album.image);

            AlbumHit {
                id: format!("lastfm-{}", key),
                year: String::new(),
                kind: "Album".to_string(),
                thumbnail_url: image.clone(),
                artwork_url: image,
                title: album.name,
                artist: album.artist,
                source: CatalogSource::LastFm,
            }
        })
        .collect()
}
