//! Case transforms and width-based truncation for label text.

use super::font::Face;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Upper-case every character.
pub fn uppercase(text: &str) -> String {
    text.to_uppercase()
}

/// Lower-case everything, then capitalize the first character of each word.
///
/// Word characters are alphanumerics and `_`. An apostrophe between two word
/// characters stays inside the word, so `don't` becomes `Don't`.
pub fn title_case(text: &str) -> String {
    let lower: Vec<char> = text.to_lowercase().chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for (i, &ch) in lower.iter().enumerate() {
        if is_word_char(ch) {
            if in_word {
                out.push(ch);
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            let inner_apostrophe = matches!(ch, '\'' | '\u{2019}')
                && in_word
                && lower.get(i + 1).copied().is_some_and(is_word_char);
            out.push(ch);
            in_word = inner_apostrophe;
        }
    }
    out
}

#[inline]
fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Result of fitting text into a width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fitted {
    pub text: String,
    /// Whether characters were dropped.
    pub truncated: bool,
}

/// Fit `text` into `max_width` pixels when drawn with `face` at `px`.
///
/// Text that fits is returned unchanged. Otherwise trailing characters are
/// dropped and [`ELLIPSIS`] appended until the measured width fits. When not
/// even the marker fits, the result is empty.
pub fn truncate_to_width(face: &Face, text: &str, px: f32, max_width: f32) -> Fitted {
    if face.measure(text, px) <= max_width {
        return Fitted {
            text: text.to_string(),
            truncated: false,
        };
    }

    let chars: Vec<char> = text.chars().collect();
    for keep in (0..chars.len()).rev() {
        let prefix: String = chars[..keep].iter().collect();
        let candidate = format!("{}{}", prefix.trim_end(), ELLIPSIS);
        if face.measure(&candidate, px) <= max_width {
            return Fitted {
                text: candidate,
                truncated: true,
            };
        }
    }

    Fitted {
        text: String::new(),
        truncated: true,
    }
}
