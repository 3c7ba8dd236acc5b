//! # Label Templates
//!
//! A template describes one physical label format: its printable area in
//! millimeters, the uniform bleed around it, whether an orientation banner is
//! printed, and which layout strategy arranges its regions.
//!
//! ```text
//! ┌──────────────── width + 2×bleed ────────────────┐
//! │ bleed                                           │
//! │   ┌─────────────── width ───────────────┐       │
//! │   │ banner (optional, 4mm)              │       │
//! │   ├─────────────────────────────────────┤       │
//! │   │ artwork                             │ height│
//! │   ├─────────────────────────────────────┤       │
//! │   │ text                                │       │
//! │   └─────────────────────────────────────┘       │
//! │                                                 │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Templates are pure data. The built-in set lives in [`registry`].

pub mod registry;

pub use registry::{all, by_category, by_id, categories, default_template};

use serde::{Deserialize, Serialize};

use crate::error::MdLabelError;

/// Layout strategy used to arrange a template's regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    /// Banner, artwork filling the remaining height, 6.5mm themed text region.
    #[default]
    Standard,
    /// Fixed stack: banner 4mm, 37mm square artwork, 9mm white text region.
    DiscSurface,
}

impl LayoutKind {
    /// Infer the layout from a template id (used for ad-hoc templates).
    pub fn for_id(id: &str) -> Self {
        match id {
            "disc-surface" => Self::DiscSurface,
            _ => Self::Standard,
        }
    }
}

/// # Label Template
///
/// Physical label format. All lengths are in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub category: String,
    /// Printable width, excluding bleed
    #[serde(rename = "widthMM")]
    pub width_mm: f32,
    /// Printable height, excluding bleed
    #[serde(rename = "heightMM")]
    pub height_mm: f32,
    /// Uniform bleed on all four sides
    #[serde(rename = "bleedMM")]
    pub bleed_mm: f32,
    pub has_banner: bool,
    #[serde(default)]
    pub layout: LayoutKind,
}

impl Template {
    /// Build an ad-hoc template. The layout is inferred from the id.
    pub fn new(
        id: impl Into<String>,
        width_mm: f32,
        height_mm: f32,
        bleed_mm: f32,
        has_banner: bool,
    ) -> Self {
        let id = id.into();
        Self {
            layout: LayoutKind::for_id(&id),
            name: id.clone(),
            display_name: id.clone(),
            category: String::new(),
            id,
            width_mm,
            height_mm,
            bleed_mm,
            has_banner,
        }
    }

    /// Override the layout strategy.
    pub fn with_layout(mut self, layout: LayoutKind) -> Self {
        self.layout = layout;
        self
    }

    /// Width including bleed on both sides.
    #[inline]
    pub fn total_width_mm(&self) -> f32 {
        self.width_mm + 2.0 * self.bleed_mm
    }

    /// Height including bleed on both sides.
    #[inline]
    pub fn total_height_mm(&self) -> f32 {
        self.height_mm + 2.0 * self.bleed_mm
    }

    /// Check the geometry invariants (all dimensions positive and finite).
    pub fn validate(&self) -> Result<(), MdLabelError> {
        let dims = [
            ("width", self.width_mm),
            ("height", self.height_mm),
            ("bleed", self.bleed_mm),
        ];
        for (what, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                return Err(MdLabelError::Template(format!(
                    "template '{}' has non-positive {}: {}mm",
                    self.id, what, value
                )));
            }
        }
        Ok(())
    }
}
