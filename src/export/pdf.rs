//! # PDF Packaging
//!
//! Wraps a rendered raster in a single-page PDF whose page is exactly the
//! label's physical size (printable area plus bleed). The image covers the
//! whole page, with no margin or letterboxing, so printing at 100% scale
//! reproduces the label dimensions.
//!
//! ```text
//! 43 × 59mm label  →  121.9 × 167.2pt media box, portrait
//!                     one RGB image XObject, Flate-compressed
//! ```

use chrono::{Datelike, NaiveDate};
use flate2::{write::ZlibEncoder, Compression};
use image::RgbImage;
use pdf_writer::{Content, Date, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};
use std::io::Write;

use crate::error::MdLabelError;
use crate::units::mm_to_points;

const IMAGE_NAME: Name<'static> = Name(b"Label");

/// Page orientation, chosen by comparing height to width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

impl PageOrientation {
    /// Portrait when taller than wide, landscape otherwise (including square).
    pub fn for_size(width_mm: f32, height_mm: f32) -> Self {
        if height_mm > width_mm {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }
}

/// Physical page size in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    pub fn orientation(&self) -> PageOrientation {
        PageOrientation::for_size(self.width_mm, self.height_mm)
    }

    /// Media box extent in points, long side placed by orientation.
    pub fn points(&self) -> (f32, f32) {
        let long = self.width_mm.max(self.height_mm);
        let short = self.width_mm.min(self.height_mm);
        let (w, h) = match self.orientation() {
            PageOrientation::Portrait => (short, long),
            PageOrientation::Landscape => (long, short),
        };
        (mm_to_points(w), mm_to_points(h))
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub created: Option<NaiveDate>,
}

/// Build a one-page PDF showing `image` stretched over a page of `size`.
pub fn package(image: &RgbImage, size: PageSize, info: &PdfInfo) -> Result<Vec<u8>, MdLabelError> {
    let (px_w, px_h) = image.dimensions();
    if px_w == 0 || px_h == 0 {
        return Err(MdLabelError::Export("cannot package an empty image".to_string()));
    }
    if !(size.width_mm > 0.0 && size.height_mm > 0.0) {
        return Err(MdLabelError::Export(format!(
            "invalid page size {}×{}mm",
            size.width_mm, size.height_mm
        )));
    }

    let compressed = compress(image.as_raw())?;
    let (page_w, page_h) = size.points();

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let image_id = Ref::new(4);
    let content_id = Ref::new(5);
    let info_id = Ref::new(6);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, page_w, page_h));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().x_objects().pair(IMAGE_NAME, image_id);
    page.finish();

    let mut xobject = pdf.image_xobject(image_id, &compressed);
    xobject.filter(Filter::FlateDecode);
    xobject.width(px_w as i32);
    xobject.height(px_h as i32);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    xobject.finish();

    let mut content = Content::new();
    content.save_state();
    content.transform([page_w, 0.0, 0.0, page_h, 0.0, 0.0]);
    content.x_object(IMAGE_NAME);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    let mut doc_info = pdf.document_info(info_id);
    doc_info.producer(TextStr(concat!("mdlabel ", env!("CARGO_PKG_VERSION"))));
    if let Some(title) = &info.title {
        doc_info.title(TextStr(title));
    }
    if let Some(date) = info.created {
        doc_info.creation_date(
            Date::new(date.year().clamp(0, 9999) as u16)
                .month(date.month() as u8)
                .day(date.day() as u8),
        );
    }
    doc_info.finish();

    Ok(pdf.finish())
}

fn compress(data: &[u8]) -> Result<Vec<u8>, MdLabelError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| MdLabelError::Export(format!("Failed to compress image: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| MdLabelError::Export(format!("Failed to compress image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use image::Rgb;
    use std::io::Read;

    fn media_box(pdf: &[u8]) -> Vec<f32> {
        let text = String::from_utf8_lossy(pdf);
        let start = text.find("/MediaBox [").unwrap() + "/MediaBox [".len();
        let end = start + text[start..].find(']').unwrap();
        text[start..end]
            .split_whitespace()
            .map(|n| n.parse().unwrap())
            .collect()
    }

    #[test]
    fn test_orientation() {
        assert_eq!(PageOrientation::for_size(43.0, 59.0), PageOrientation::Portrait);
        assert_eq!(PageOrientation::for_size(70.0, 40.0), PageOrientation::Landscape);
        assert_eq!(PageOrientation::for_size(50.0, 50.0), PageOrientation::Landscape);
    }

    #[test]
    fn test_page_matches_physical_size() {
        let image = RgbImage::from_pixel(508, 697, Rgb([255, 255, 255]));
        let size = PageSize { width_mm: 43.0, height_mm: 59.0 };
        let pdf = package(&image, size, &PdfInfo::default()).unwrap();

        assert!(pdf.starts_with(b"%PDF-"));
        let mb = media_box(&pdf);
        assert_eq!(mb.len(), 4);
        assert!((mb[2] - 43.0 * 72.0 / 25.4).abs() < 0.01);
        assert!((mb[3] - 59.0 * 72.0 / 25.4).abs() < 0.01);
    }

    #[test]
    fn test_landscape_keeps_label_proportions() {
        let image = RgbImage::from_pixel(10, 5, Rgb([0, 0, 0]));
        let size = PageSize { width_mm: 70.0, height_mm: 35.0 };
        let mb = media_box(&package(&image, size, &PdfInfo::default()).unwrap());
        assert!(mb[2] > mb[3]);
    }

    #[test]
    fn test_metadata_written() {
        let image = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let info = PdfInfo {
            title: Some("Kid A".to_string()),
            created: NaiveDate::from_ymd_opt(2025, 3, 9),
        };
        let size = PageSize { width_mm: 10.0, height_mm: 10.0 };
        let text = String::from_utf8_lossy(&package(&image, size, &info).unwrap()).to_string();
        assert!(text.contains("/Title (Kid A)"));
        assert!(text.contains("D:20250309"));
    }

    #[test]
    fn test_compression_round_trip() {
        let data: Vec<u8> = (0..=255).cycle().take(3000).collect();
        let compressed = compress(&data).unwrap();
        let mut out = Vec::new();
        ZlibDecoder::new(&compressed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_rejects_empty_image() {
        let size = PageSize { width_mm: 10.0, height_mm: 10.0 };
        assert!(package(&RgbImage::new(0, 0), size, &PdfInfo::default()).is_err());
    }
}
