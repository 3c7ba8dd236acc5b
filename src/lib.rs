//! # mdlabel - MiniDisc and Album Insert Label Renderer
//!
//! mdlabel renders print-ready labels for MiniDisc cases, disc surfaces,
//! cassette J-cards and CD booklets. It provides:
//!
//! - **Templates**: physical label formats in millimeters, with bleed
//! - **Rendering**: artwork, text and print guides on an RGBA surface, at any DPI
//! - **Export**: lossless PNG and single-page PDF at the exact physical size
//! - **Catalogs**: album artwork search across Deezer, Spotify, Last.fm, Discogs and iTunes
//! - **Server**: JSON API for previews, exports, search and feedback
//!
//! ## Quick Start
//!
//! ```no_run
//! use mdlabel::{
//!     label::{LabelData, RenderOptions},
//!     render::{DefaultArtworkSource, FontBook, LabelRenderer},
//!     template::registry,
//!     units::Dpi,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), mdlabel::MdLabelError> {
//! let fonts = Arc::new(FontBook::system());
//! let artwork = Arc::new(DefaultArtworkSource::new()?);
//! let mut renderer = LabelRenderer::new(fonts, artwork);
//!
//! let data = LabelData::new("Discovery", "Daft Punk", "2001").with_artwork("cover.jpg");
//! let mut options = RenderOptions::for_template(registry::default_template().clone());
//! options.dpi = Dpi::PRINT;
//!
//! renderer.render(&data, &options).await?;
//! std::fs::write("label.png", renderer.to_png()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`units`] | Millimeter to pixel conversion |
//! | [`template`] | Label formats and the built-in registry |
//! | [`label`] | Label content and render options |
//! | [`render`] | Layout, drawing surface, fonts, artwork and the renderer |
//! | [`export`] | PNG and PDF output |
//! | [`catalog`] | Album artwork search |
//! | [`feedback`] | Feedback relay to a webhook |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod catalog;
pub mod error;
pub mod export;
pub mod feedback;
pub mod label;
pub mod render;
pub mod server;
pub mod template;
pub mod units;

// Re-exports for convenience
pub use error::MdLabelError;
pub use label::{LabelData, RenderOptions, RenderSnapshot};
pub use render::LabelRenderer;
pub use template::Template;
