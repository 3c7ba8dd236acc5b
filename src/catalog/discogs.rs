//! Discogs database search. Key and secret go in the query string.
//!
//! Discogs titles read `"Artist - Album"`; both halves are split out.

use serde::Deserialize;

use super::matching::AlbumQuery;
use super::{AlbumHit, CatalogSource, first_nonempty};
use crate::error::MdLabelError;

pub const SEARCH_URL: &str = "https://api.discogs.com/database/search";

#[derive(Debug, Clone)]
pub struct DiscogsCredentials {
    pub key: String,
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Release>,
}

#[derive(Debug, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// A string in search results, occasionally a number.
    pub year: Option<serde_json::Value>,
    #[serde(default)]
    pub format: Vec<String>,
    pub thumb: Option<String>,
    pub cover_image: Option<String>,
}

pub async fn search(
    client: &reqwest::Client,
    credentials: &DiscogsCredentials,
    query: &AlbumQuery,
) -> Result<Vec<AlbumHit>, MdLabelError> {
    let text = query.free_text();
    let mut params = vec![
        ("q", text.as_str()),
        ("type", "release"),
        ("key", credentials.key.as_str()),
    ];
    if let Some(secret) = &credentials.secret {
        params.push(("secret", secret.as_str()));
    }

    let response = client
        .get(SEARCH_URL)
        .query(&params)
        .send()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Discogs request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(MdLabelError::Catalog(format!(
            "Discogs returned HTTP {}",
            response.status()
        )));
    }

    let body: SearchResponse = response
        .json()
        .await
        .map_err(|e| MdLabelError::Catalog(format!("Discogs response invalid: {}", e)))?;
    Ok(normalize(body, query))
}

/// `("Artist", "Album")` from `"Artist - Album"`. Without a separator the
/// artist is empty and the album is the whole title.
fn split_title(title: &str) -> (&str, &str) {
    let mut parts = title.split(" - ");
    let artist = parts.next().unwrap_or("");
    match parts.next() {
        Some(album) if !album.is_empty() => (artist, album),
        _ => ("", title),
    }
}

fn is_single_or_ep(formats: &[String]) -> bool {
    formats.iter().any(|f| {
        let f = f.to_lowercase();
        f.contains("single") || f.contains("ep")
    })
}

fn year_string(year: Option<&serde_json::Value>) -> String {
    match year {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

pub fn normalize(response: SearchResponse, query: &AlbumQuery) -> Vec<AlbumHit> {
    response
        .results
        .into_iter()
        .filter(|release| release.kind == "release" || release.kind == "master")
        .filter(|release| !is_single_or_ep(&release.format))
        .filter(|release| {
            let (artist, album) = split_title(&release.title);
            query.accepts(artist, album)
        })
        .map(|release| {
            let (artist, album) = split_title(&release.title);
            let artist = if artist.is_empty() {
                query.artist.clone()
            } else {
                artist.to_string()
            };

            AlbumHit {
                id: format!("discogs-{}", release.id),
                title: album.to_string(),
                artist,
                year: year_string(release.year.as_ref()),
                kind: (if release.kind == "master" { "Album" } else { "Release" }).to_string(),
                thumbnail_url: first_nonempty([&release.thumb, &release.cover_image]),
                artwork_url: first_nonempty([&release.cover_image, &release.thumb]),
                source: CatalogSource::Discogs,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "pagination": {"items": 4},
        "results": [
            {
                "id": 249504,
                "title": "Boards Of Canada - Music Has The Right To Children",
                "type": "master",
                "year": "1998",
                "format": ["Vinyl", "LP", "Album"],
                "thumb": "https://discogs/t.jpg",
                "cover_image": "https://discogs/c.jpg"
            },
            {
                "id": 1,
                "title": "Boards Of Canada - Music Has The Right To Children",
                "type": "release",
                "year": 2004,
                "format": ["CD", "Album", "Reissue"],
                "thumb": "",
                "cover_image": "https://discogs/c2.jpg"
            },
            {
                "id": 2,
                "title": "Boards Of Canada - Aquarius",
                "type": "release",
                "format": ["Vinyl", "Single"]
            },
            {
                "id": 3,
                "title": "Boards Of Canada",
                "type": "artist"
            }
        ]
    }"#;

    #[test]
    fn test_normalize_splits_titles() {
        let response: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let hits = normalize(
            response,
            &AlbumQuery::new("Boards of Canada", "Music Has the Right to Children"),
        );

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "discogs-249504");
        assert_eq!(hits[0].artist, "Boards Of Canada");
        assert_eq!(hits[0].title, "Music Has The Right To Children");
        assert_eq!(hits[0].kind, "Album");
        assert_eq!(hits[0].year, "1998");
        assert_eq!(hits[1].kind, "Release");
        assert_eq!(hits[1].year, "2004");
        assert_eq!(hits[1].thumbnail_url.as_deref(), Some("https://discogs/c2.jpg"));
    }

    #[test]
    fn test_split_title_without_separator() {
        assert_eq!(split_title("Selected Ambient Works"), ("", "Selected Ambient Works"));
        assert_eq!(split_title("Aphex Twin - SAW"), ("Aphex Twin", "SAW"));
    }

    #[test]
    fn test_singles_and_eps_excluded() {
        assert!(is_single_or_ep(&["Vinyl".into(), "Single".into()]));
        assert!(is_single_or_ep(&["CD".into(), "EP".into()]));
        assert!(!is_single_or_ep(&["CD".into(), "Album".into()]));
    }
}
