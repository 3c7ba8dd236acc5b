//! # Label Inputs
//!
//! Value types describing one render: what goes on the label ([`LabelData`])
//! and how it is drawn ([`RenderOptions`]). A [`RenderSnapshot`] bundles both
//! so a render call sees one immutable set of inputs.
//!
//! ## Latest-wins rendering
//!
//! Renders suspend while artwork resolves, so a caller driving renders from
//! user input can start a new one before the previous finished.
//! [`RenderGeneration`] hands out monotonically increasing tickets. Results
//! whose ticket is no longer current should be discarded.
//!
//! ```
//! use mdlabel::label::RenderGeneration;
//!
//! let generation = RenderGeneration::default();
//! let first = generation.next();
//! let second = generation.next();
//! assert!(!generation.is_current(first));
//! assert!(generation.is_current(second));
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::template::{self, Template};
use crate::units::Dpi;

/// Default artwork over-scale so edges are filled.
pub const DEFAULT_ARTWORK_SCALE: f32 = 1.12;

/// Default font family.
pub const DEFAULT_FONT_FAMILY: &str = "Space Grotesk";

/// Text content and artwork reference for one label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelData {
    pub title: String,
    pub artist: String,
    pub year: String,
    /// Network URL, `data:` URL, `file://` URL or local path. `None` renders
    /// the placeholder.
    pub artwork_url: Option<String>,
}

impl LabelData {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            year: year.into(),
            artwork_url: None,
        }
    }

    pub fn with_artwork(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    /// Artwork reference, treating an empty string as absent.
    pub fn artwork(&self) -> Option<&str> {
        self.artwork_url.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Weight, slant and case transform for the text block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    /// Capitalize words instead of upper-casing everything. Also drops the
    /// default bold weight of the title line.
    pub title_case: bool,
}

/// Artwork pan and zoom. Offsets are millimeters from the region center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkPosition {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for ArtworkPosition {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: DEFAULT_ARTWORK_SCALE,
        }
    }
}

/// Background/text polarity of the standard layout's text region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelTheme {
    #[default]
    Light,
    Dark,
}

impl std::str::FromStr for LabelTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme '{}' (expected light or dark)", other)),
        }
    }
}

/// Display and style options for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub dpi: Dpi,
    pub show_trim_line: bool,
    pub show_safe_zone: bool,
    pub show_crop_marks: bool,
    pub show_center_marks: bool,
    pub template: Template,
    pub font_family: String,
    pub font_style: FontStyle,
    pub artwork_position: ArtworkPosition,
    pub label_theme: LabelTheme,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: Dpi::SCREEN,
            show_trim_line: true,
            show_safe_zone: true,
            show_crop_marks: false,
            show_center_marks: false,
            template: template::default_template().clone(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_style: FontStyle::default(),
            artwork_position: ArtworkPosition::default(),
            label_theme: LabelTheme::default(),
        }
    }
}

impl RenderOptions {
    pub fn for_template(template: Template) -> Self {
        Self {
            template,
            ..Self::default()
        }
    }

    /// Print-ready variant: print resolution, no on-screen guides, crop
    /// marks always on. Center marks are kept as requested.
    pub fn for_export(&self) -> Self {
        Self {
            dpi: Dpi::PRINT,
            show_trim_line: false,
            show_safe_zone: false,
            show_crop_marks: true,
            ..self.clone()
        }
    }
}

/// Immutable inputs of one render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub data: LabelData,
    pub options: RenderOptions,
}

impl RenderSnapshot {
    pub fn new(data: LabelData, options: RenderOptions) -> Self {
        Self { data, options }
    }
}

/// Ticket identifying one started render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderTicket(u64);

/// Monotonic render counter for discarding stale results.
#[derive(Debug, Default)]
pub struct RenderGeneration {
    counter: AtomicU64,
}

impl RenderGeneration {
    /// Start a new render, invalidating every earlier ticket.
    pub fn next(&self) -> RenderTicket {
        RenderTicket(self.counter.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether no render was started after `ticket`.
    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.counter.load(Ordering::Acquire) == ticket.0
    }
}
