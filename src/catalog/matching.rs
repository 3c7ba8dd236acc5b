//! # Fuzzy Matching
//!
//! Catalog search endpoints return loosely related albums. Hits are kept only
//! when both the artist and the album title resemble what was asked for.
//!
//! Similarity is the Dice coefficient over the sets of character bigrams of
//! both strings, compared lowercase and trimmed:
//!
//! ```text
//! dice = 2 × |bigrams(a) ∩ bigrams(b)| / (|bigrams(a)| + |bigrams(b)|)
//!
//! "radiohead" vs "radio head"  → 0.80
//! "ok computer" vs "kid a"     → 0.0
//! ```
//!
//! | Field  | Threshold | Also accepted |
//! |--------|-----------|---------------|
//! | artist | 0.60 | substring either way, equal after dropping a leading "the " |
//! | album  | 0.65 | substring either way |

use std::collections::HashSet;

pub const ARTIST_THRESHOLD: f64 = 0.6;
pub const ALBUM_THRESHOLD: f64 = 0.65;

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Bigram similarity in `0.0..=1.0`. Identical strings score 1, strings
/// shorter than two characters otherwise score 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = fold(a);
    let b = fold(b);
    if a == b {
        return 1.0;
    }
    if a.chars().count() < 2 || b.chars().count() < 2 {
        return 0.0;
    }

    let left = bigrams(&a);
    let right = bigrams(&b);
    let shared = left.intersection(&right).count();
    (2.0 * shared as f64) / (left.len() + right.len()) as f64
}

fn strip_article(s: &str) -> &str {
    match s.strip_prefix("the") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => s,
    }
}

pub fn artist_matches(wanted: &str, found: &str) -> bool {
    if similarity(wanted, found) >= ARTIST_THRESHOLD {
        return true;
    }
    let wanted = fold(wanted);
    let found = fold(found);
    if wanted.contains(&found) || found.contains(&wanted) {
        return true;
    }
    strip_article(&wanted) == strip_article(&found)
}

pub fn album_matches(wanted: &str, found: &str) -> bool {
    if similarity(wanted, found) >= ALBUM_THRESHOLD {
        return true;
    }
    let wanted = fold(wanted);
    let found = fold(found);
    wanted.contains(&found) || found.contains(&wanted)
}

/// The artist/album pair a search was made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumQuery {
    pub artist: String,
    pub album: String,
}

impl AlbumQuery {
    pub fn new(artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            album: album.into(),
        }
    }

    /// `"{artist} {album}"`, the free-text form most catalogs take.
    pub fn free_text(&self) -> String {
        format!("{} {}", self.artist.trim(), self.album.trim())
    }

    pub fn accepts(&self, artist: &str, album: &str) -> bool {
        artist_matches(&self.artist, artist) && album_matches(&self.album, album)
    }
}
