use crate::config::LayoutConfig;
use crate::error::{Result, SpriteError};
use crate::export_css::{to_css, to_html};
use crate::export_svg::to_svg;
use crate::layout::layout;
use crate::model::{Artifacts, Layout, Meta, SpriteImage, SpriteSheet};
use tracing::{info, instrument};

/// Serialize a computed layout into SVG, CSS and HTML text.
///
/// An empty layout produces empty artifacts.
pub fn emit(layout: &Layout, images: &[SpriteImage], cfg: &LayoutConfig) -> Result<Artifacts> {
    Ok(Artifacts {
        svg: to_svg(layout, images)?,
        css: to_css(layout, cfg),
        html: to_html(layout, cfg),
    })
}

/// Lays out `images` with `cfg` and emits all artifacts.
///
/// Notes:
/// - All-or-nothing: any failure returns an error and no partial artifacts.
/// - Empty input is rejected with `SpriteError::Empty`.
/// - Pure: no I/O; persisting the text is the caller's job.
#[instrument(skip_all, fields(images = images.len()))]
pub fn compose(images: &[SpriteImage], cfg: &LayoutConfig) -> Result<SpriteSheet> {
    cfg.validate()?;
    if images.is_empty() {
        return Err(SpriteError::Empty);
    }

    let layout = layout(images, cfg)?;
    let artifacts = emit(&layout, images, cfg)?;
    let meta = Meta {
        schema_version: "1".into(),
        app: "svg-sprite".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        sprite_name: cfg.effective_sprite_name().into(),
        image: cfg.svg_file_name(),
        sizing_mode: cfg.sizing_mode,
        consumption_mode: cfg.consumption_mode,
        size: (layout.width, layout.height),
        spacing: cfg.spacing,
        columns: cfg.columns,
    };
    info!(
        width = layout.width,
        height = layout.height,
        svg_bytes = artifacts.svg.len(),
        "sprite sheet composed"
    );
    Ok(SpriteSheet {
        layout,
        artifacts,
        meta,
    })
}
