//! Deezer public album search. No credentials required.

use serde::Deserialize;

use super::matching::AlbumQuery;
use super::{AlbumHit, CatalogSource, first_nonempty, year_prefix};
use crate::error::MdLabelError;

pub const SEARCH_URL: &str = "https://api.deezer.com/search/album";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Album>,
}

#[derive(Debug, Deserialize)]
pub struct Album {
    pub id: u64,
    pub title: String,
    pub artist: Artist,
    pub release_date: Option<String>,
    pub cover_small: Option<String>,
    pub cover_medium: Option<String>,
    pub cover_big: Option<String>,
    pub cover_xl: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Artist {
    pub name: String,
}

pub async fn search(
    client: &reqwest::Client,
    query: &AlbumQuery,
) -> Result<Vec<AlbumHit>, MdLabelError> {
    let response = client
        .get(SEARCH_URL)
        .query(&[("q", query.free_text().as_str()), ("limit", "20")])
        .send()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Deezer request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(MdLabelError::Catalog(format!(
            "Deezer returned HTTP {}",
            response.status()
        )));
    }

    let body: SearchResponse = response
        .json()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Deezer response invalid: {}", e)))?;
    Ok(normalize(body, query))
}

pub fn normalize(response: SearchResponse, query: &AlbumQuery) -> Vec<AlbumHit> {
    response
        .data
        .into_iter()
        .filter(|album| query.accepts(&album.artist.name, &album.title))
        .map(|album| AlbumHit {
            id: format!("deezer-{}", album.id),
            year: year_prefix(album.release_date.as_deref()),
            kind: "Album".to_string(),
            thumbnail_url: first_nonempty([&album.cover_medium, &album.cover_small]),
            artwork_url: first_nonempty([&album.cover_xl, &album.cover_big, &album.cover_medium]),
            title: album.title,
            artist: album.artist.name,
            source: CatalogSource::Deezer,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "data": [
            {
                "id": 302127,
                "title": "Discovery",
                "artist": {"name": "Daft Punk"},
                "release_date": "2001-03-07",
                "cover_small": "https://e-cdns/s.jpg",
                "cover_medium": "https://e-cdns/m.jpg",
                "cover_big": "https://e-cdns/b.jpg",
                "cover_xl": ""
            },
            {
                "id": 1,
                "title": "Homework",
                "artist": {"name": "Daft Punk"},
                "cover_medium": "https://e-cdns/h.jpg"
            }
        ],
        "total": 2
    }"#;

    #[test]
    fn test_normalize_filters_and_maps() {
        let response: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let hits = normalize(response, &AlbumQuery::new("daft punk", "discovery"));

        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.id, "deezer-302127");
        assert_eq!(hit.year, "2001");
        assert_eq!(hit.thumbnail_url.as_deref(), Some("https://e-cdns/m.jpg"));
        // empty cover_xl falls through to cover_big
        assert_eq!(hit.artwork_url.as_deref(), Some("https://e-cdns/b.jpg"));
        assert_eq!(hit.source, CatalogSource::Deezer);
    }

    #[test]
    fn test_missing_data_is_empty() {
        let response: SearchResponse = serde_json::from_str(r#"{"error": {}}"#).unwrap();
        assert!(normalize(response, &AlbumQuery::new("a", "b")).is_empty());
    }
}
