//! # Export
//!
//! Print-ready output of a rendered label.
//!
//! | Output | Resolution | Guides |
//! |--------|------------|--------|
//! | PNG preview | as requested | as requested |
//! | PDF | 300 DPI | crop marks on, trim line and safe zone off |
//!
//! The PDF page has the template's total physical size (printable area plus
//! bleed on every side); see [`pdf`].

pub mod pdf;

use chrono::NaiveDate;

use crate::error::MdLabelError;
use crate::label::{LabelData, RenderSnapshot};
use crate::render::{LabelRenderer, Surface};
use crate::template::Template;

use pdf::{PageSize, PdfInfo};

/// Longest sanitized artist/title fragment in export file names.
const FILE_NAME_PART_MAX: usize = 30;

/// A finished PDF export.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Lossless PNG of the current surface.
pub fn png(surface: &Surface) -> Result<Vec<u8>, MdLabelError> {
    surface.to_png()
}

/// Package `surface` as a PDF sized to `template` including bleed.
pub fn pdf_for_template(surface: &Surface, template: &Template, info: &PdfInfo) -> Result<Vec<u8>, MdLabelError> {
    let size = PageSize {
        width_mm: template.total_width_mm(),
        height_mm: template.total_height_mm(),
    };
    pdf::package(surface.image(), size, info)
}

/// `{artist}-{title}-{template}-{YYYY-MM-DD}.pdf` with artist and title
/// reduced to `[a-z0-9_]`.
pub fn file_name(data: &LabelData, template_id: &str, date: NaiveDate) -> String {
    let artist = sanitize(non_empty(&data.artist, "unknown"));
    let title = sanitize(non_empty(&data.title, "label"));
    format!("{}-{}-{}-{}.pdf", artist, title, template_id, date.format("%Y-%m-%d"))
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .take(FILE_NAME_PART_MAX)
        .collect()
}

/// Render `snapshot` at its own options and return PNG bytes.
pub async fn render_png(renderer: &mut LabelRenderer, snapshot: &RenderSnapshot) -> Result<Vec<u8>, MdLabelError> {
    renderer.render_snapshot(snapshot).await?;
    renderer.to_png()
}

/// Render `snapshot` with export options and package it as a PDF.
pub async fn render_pdf(
    renderer: &mut LabelRenderer,
    snapshot: &RenderSnapshot,
    date: NaiveDate,
) -> Result<ExportedPdf, MdLabelError> {
    let options = snapshot.options.for_export();
    renderer.render(&snapshot.data, &options).await?;

    let title = match (snapshot.data.artist.is_empty(), snapshot.data.title.is_empty()) {
        (false, false) => Some(format!("{} - {}", snapshot.data.artist, snapshot.data.title)),
        (true, false) => Some(snapshot.data.title.clone()),
        _ => None,
    };
    let info = PdfInfo {
        title,
        created: Some(date),
    };

    let bytes = pdf_for_template(renderer.surface(), &options.template, &info)?;
    let file_name = file_name(&snapshot.data, &options.template.id, date);
    tracing::info!(file = %file_name, size = bytes.len(), "exported PDF");
    Ok(ExportedPdf { file_name, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_file_name() {
        let data = LabelData::new("OK Computer", "Radiohead", "1997");
        assert_eq!(
            file_name(&data, "jewel-case", date()),
            "radiohead-ok_computer-jewel-case-2024-06-01.pdf"
        );
    }

    #[test]
    fn test_file_name_defaults_and_limits() {
        let data = LabelData::default();
        assert_eq!(file_name(&data, "disc-surface", date()), "unknown-label-disc-surface-2024-06-01.pdf");

        let data = LabelData::new("A".repeat(50), "Sigur Rós", "");
        let name = file_name(&data, "x", date());
        assert!(name.starts_with("sigur_r_s-"));
        assert!(name.contains(&format!("-{}-", "a".repeat(30))));
    }
}
