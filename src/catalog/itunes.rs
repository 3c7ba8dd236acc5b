//! iTunes Search API. No credentials required.
//!
//! Artwork URLs embed their size (`.../100x100bb.jpg`); the size segment is
//! rewritten to request larger renditions.

use serde::Deserialize;

use super::matching::AlbumQuery;
use super::{AlbumHit, CatalogSource, year_prefix};
use crate::error::MdLabelError;

pub const SEARCH_URL: &str = "https://itunes.apple.com/search";

const SOURCE_SIZE: &str = "100x100bb";
const THUMBNAIL_SIZE: &str = "600x600bb";
const ARTWORK_SIZE: &str = "3000x3000bb";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Collection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub collection_id: u64,
    #[serde(default)]
    pub collection_name: String,
    #[serde(default)]
    pub artist_name: String,
    pub collection_type: Option<String>,
    pub release_date: Option<String>,
    pub artwork_url100: Option<String>,
}

pub async fn search(
    client: &reqwest::Client,
    query: &AlbumQuery,
) -> Result<Vec<AlbumHit>, MdLabelError> {
    let text = query.free_text();
    let response = client
        .get(SEARCH_URL)
        .query(&[
            ("term", text.as_str()),
            ("entity", "album"),
            ("limit", "20"),
            ("media", "music"),
        ])
        .send()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("iTunes request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(MdLabelError::Catalog(format!(
            "iTunes returned HTTP {}",
            response.status()
        )));
    }

    // iTunes answers with text/javascript, so decode the bytes directly
    let bytes = response
        .bytes()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("iTunes response read failed: {}", e)))?;
    let body: SearchResponse = serde_json::from_slice(&bytes)
        .map_err(|e| MdLabelError::Catalog(format!("iTunes response invalid: {}", e)))?;
    Ok(normalize(body, query))
}

fn resized(url: Option<&str>, size: &str) -> Option<String> {
    url.filter(|u| !u.is_empty())
        .map(|u| u.replacen(SOURCE_SIZE, size, 1))
}

pub fn normalize(response: SearchResponse, query: &AlbumQuery) -> Vec<AlbumHit> {
    response
        .results
        .into_iter()
        .filter(|c| c.collection_type.as_deref() == Some("Album"))
        .filter(|c| query.accepts(&c.artist_name, &c.collection_name))
        .map(|c| AlbumHit {
            id: format!("itunes-{}", c.collection_id),
            year: year_prefix(c.release_date.as_deref()),
            kind: "Album".to_string(),
            thumbnail_url: resized(c.artwork_url100.as_deref(), THUMBNAIL_SIZE),
            artwork_url: resized(c.artwork_url100.as_deref(), ARTWORK_SIZE),
            title: c.collection_name,
            artist: c.artist_name,
            source: CatalogSource::Itunes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "resultCount": 2,
        "results": [
            {
                "wrapperType": "collection",
                "collectionType": "Album",
                "collectionId": 1440903625,
                "collectionName": "Homogenic",
                "artistName": "Björk",
                "releaseDate": "1997-09-22T07:00:00Z",
                "artworkUrl100": "https://is1-ssl.mzstatic.com/image/thumb/x/100x100bb.jpg"
            },
            {
                "wrapperType": "collection",
                "collectionType": "Compilation",
                "collectionId": 2,
                "collectionName": "Homogenic Live",
                "artistName": "Björk"
            }
        ]
    }"#;

    #[test]
    fn test_normalize_upgrades_artwork() {
        let response: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let hits = normalize(response, &AlbumQuery::new("Björk", "homogenic"));

        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.id, "itunes-1440903625");
        assert_eq!(hit.year, "1997");
        assert_eq!(
            hit.artwork_url.as_deref(),
            Some("https://is1-ssl.mzstatic.com/image/thumb/x/3000x3000bb.jpg")
        );
        assert_eq!(
            hit.thumbnail_url.as_deref(),
            Some("https://is1-ssl.mzstatic.com/image/thumb/x/600x600bb.jpg")
        );
    }
}
