//! Core library for composing images into an SVG spritesheet.
//!
//! - Intake: MIME validation, name sanitizing, dimension probing (SVG attributes / raster headers)
//! - Layout: row-major grid, either intrinsic sizes (`original`) or fixed cells (`custom`)
//! - Emission: one SVG with `<view>` fragments, plus CSS and HTML usage snippets
//! - Session: caller-owned, generation-tagged image collection
//!
//! Quick example:
//! ```ignore
//! use svg_sprite_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let mut session = SpriteSession::new();
//! session.add(Upload::new("home.svg", "image/svg+xml", std::fs::read("home.svg")?))?;
//! session.add(Upload::new("logo.png", "image/png", std::fs::read("logo.png")?))?;
//! let cfg = LayoutConfig::builder().sprite_name("icons").columns(8).spacing(2).build();
//! let sheet = session.compose(&cfg)?;
//! std::fs::write(cfg.svg_file_name(), &sheet.artifacts.svg)?;
//! # Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod export_css;
pub mod export_svg;
pub mod intake;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod session;

pub use config::*;
pub use error::*;
pub use export::*;
pub use export_css::*;
pub use export_svg::*;
pub use intake::*;
pub use layout::*;
pub use model::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `svg_sprite_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{ConsumptionMode, LayoutConfig, LayoutConfigBuilder, SizingMode};
    pub use crate::error::SpriteError;
    pub use crate::intake::{DecodedImage, Upload, decode_upload};
    pub use crate::layout::{LayoutItem, layout, layout_items};
    pub use crate::model::{
        Artifacts, ImageId, ImageKind, Layout, PlacedImage, Rect, SheetStats, SpriteImage,
        SpriteSheet,
    };
    pub use crate::session::{IntakeReport, IntakeTicket, Rejection, SpriteSession};
    pub use crate::{compose, emit, to_css, to_html, to_json_manifest, to_svg};
}
