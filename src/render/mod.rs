//! # Rendering Module
//!
//! This module turns label data and a template into pixels.
//!
//! ## Modules
//!
//! - [`layout`]: Pure layout strategies producing a draw plan
//! - [`renderer`]: Executes a draw plan on a surface
//! - [`surface`]: RGB pixel buffer and drawing primitives
//! - [`font`]: Font discovery, fallback and glyph rasterization
//! - [`text`]: Case transforms and width-based truncation
//! - [`artwork`]: Artwork sources and fit computation
//! - [`guides`]: Trim line, safe zone, crop and center marks
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mdlabel::label::{LabelData, RenderOptions};
//! use mdlabel::render::{DefaultArtworkSource, FontBook, LabelRenderer};
//! use mdlabel::template;
//! use mdlabel::units::Dpi;
//!
//! # async fn example() -> Result<(), mdlabel::MdLabelError> {
//! let mut renderer = LabelRenderer::new(
//!     Arc::new(FontBook::system()),
//!     Arc::new(DefaultArtworkSource::new()?),
//! );
//!
//! let mut options = RenderOptions::for_template(template::by_id("disc-surface").unwrap().clone());
//! options.dpi = Dpi::PRINT;
//!
//! let data = LabelData::new("Kid A", "Radiohead", "2000")
//!     .with_artwork("https://example.com/kid-a.jpg");
//! renderer.render(&data, &options).await?;
//! # Ok(())
//! # }
//! ```

pub mod artwork;
pub mod font;
pub mod guides;
pub mod layout;
pub mod renderer;
pub mod surface;
pub mod text;

pub use artwork::{ArtworkSource, DefaultArtworkSource};
pub use font::{Face, FontBook};
pub use layout::DrawPlan;
pub use renderer::{LabelRenderer, DEFAULT_ARTWORK_TIMEOUT, MAX_SURFACE_PIXELS};
pub use surface::Surface;
