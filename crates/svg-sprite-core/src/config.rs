use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Smallest accepted custom cell side (pixels).
pub const MIN_CUSTOM_SIZE: u32 = 16;
/// Largest accepted custom cell side (pixels).
pub const MAX_CUSTOM_SIZE: u32 = 1600;
/// Sprite name used when none (or a blank one) is configured.
pub const DEFAULT_SPRITE_NAME: &str = "sprite";

/// How placed images are sized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SizingMode {
    /// Keep each image's intrinsic size; rows grow to their tallest item.
    Original,
    /// Force every image into a uniform `custom_width x custom_height` cell.
    Custom,
}

impl FromStr for SizingMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}

/// How a page is expected to reference the sprite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionMode {
    /// Elements paint the fragment as a CSS background through `--vg`.
    Background,
    /// Each fragment is used directly as `<img src="sheet.svg#id">`.
    ImgSrc,
}

impl FromStr for ConsumptionMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "background" | "bg" | "bgurl" => Ok(Self::Background),
            "img" | "imgsrc" | "img_src" | "img-src" => Ok(Self::ImgSrc),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Base name of the sprite: CSS class prefix and file stem.
    #[serde(default = "default_sprite_name")]
    pub sprite_name: String,
    #[serde(default = "default_sizing_mode")]
    pub sizing_mode: SizingMode,
    /// Cell width in custom mode (clamped to `MIN_CUSTOM_SIZE..=MAX_CUSTOM_SIZE`).
    #[serde(default = "default_custom_side")]
    pub custom_width: u32,
    /// Cell height in custom mode (clamped to `MIN_CUSTOM_SIZE..=MAX_CUSTOM_SIZE`).
    #[serde(default = "default_custom_side")]
    pub custom_height: u32,
    /// Pixel gap between neighbouring items, both axes.
    #[serde(default)]
    pub spacing: u32,
    /// Items per row; must be at least 1.
    #[serde(default = "default_columns")]
    pub columns: u32,
    #[serde(default = "default_consumption_mode")]
    pub consumption_mode: ConsumptionMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sprite_name: default_sprite_name(),
            sizing_mode: default_sizing_mode(),
            custom_width: default_custom_side(),
            custom_height: default_custom_side(),
            spacing: 0,
            columns: default_columns(),
            consumption_mode: default_consumption_mode(),
        }
    }
}

impl LayoutConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `columns` is zero
    /// - the sprite name is not a plain CSS identifier (`[A-Za-z_][A-Za-z0-9_-]*`);
    ///   it is used unescaped in selectors and file names
    ///
    /// Out-of-range custom dimensions are not an error; see [`LayoutConfig::cell_size`].
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpriteError;

        if self.columns == 0 {
            return Err(SpriteError::InvalidConfig(
                "columns must be at least 1".into(),
            ));
        }

        let name = self.effective_sprite_name();
        if !is_css_identifier(name) {
            return Err(SpriteError::InvalidConfig(format!(
                "sprite_name {:?} must start with a letter or '_' and contain only ASCII letters, digits, '_' or '-'",
                self.sprite_name
            )));
        }

        Ok(())
    }

    /// Sprite name with the blank-name fallback applied.
    pub fn effective_sprite_name(&self) -> &str {
        let trimmed = self.sprite_name.trim();
        if trimmed.is_empty() {
            DEFAULT_SPRITE_NAME
        } else {
            trimmed
        }
    }

    /// Custom cell size clamped into `[MIN_CUSTOM_SIZE, MAX_CUSTOM_SIZE]`.
    pub fn cell_size(&self) -> (u32, u32) {
        let w = self.custom_width.clamp(MIN_CUSTOM_SIZE, MAX_CUSTOM_SIZE);
        let h = self.custom_height.clamp(MIN_CUSTOM_SIZE, MAX_CUSTOM_SIZE);
        if (w, h) != (self.custom_width, self.custom_height) {
            warn!(
                requested_w = self.custom_width,
                requested_h = self.custom_height,
                w,
                h,
                "custom cell size clamped"
            );
        }
        (w, h)
    }

    /// File name of the generated sheet (`{name}.svg`).
    pub fn svg_file_name(&self) -> String {
        format!("{}.svg", self.effective_sprite_name())
    }

    /// File name of the generated stylesheet (`{name}.css`).
    pub fn css_file_name(&self) -> String {
        format!("{}.css", self.effective_sprite_name())
    }
}

fn is_css_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn default_sprite_name() -> String {
    DEFAULT_SPRITE_NAME.to_string()
}
fn default_sizing_mode() -> SizingMode {
    SizingMode::Original
}
fn default_custom_side() -> u32 {
    24
}
fn default_columns() -> u32 {
    4
}
fn default_consumption_mode() -> ConsumptionMode {
    ConsumptionMode::Background
}

/// Builder for `LayoutConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct LayoutConfigBuilder {
    cfg: LayoutConfig,
}

impl LayoutConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: LayoutConfig::default(),
        }
    }
    pub fn sprite_name(mut self, v: impl Into<String>) -> Self {
        self.cfg.sprite_name = v.into();
        self
    }
    pub fn sizing_mode(mut self, v: SizingMode) -> Self {
        self.cfg.sizing_mode = v;
        self
    }
    /// Switches to custom sizing with the given cell dimensions.
    pub fn custom_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.sizing_mode = SizingMode::Custom;
        self.cfg.custom_width = w;
        self.cfg.custom_height = h;
        self
    }
    pub fn spacing(mut self, v: u32) -> Self {
        self.cfg.spacing = v;
        self
    }
    pub fn columns(mut self, v: u32) -> Self {
        self.cfg.columns = v;
        self
    }
    pub fn consumption_mode(mut self, v: ConsumptionMode) -> Self {
        self.cfg.consumption_mode = v;
        self
    }
    pub fn build(self) -> LayoutConfig {
        self.cfg
    }
}

impl LayoutConfig {
    /// Create a fluent builder for `LayoutConfig`.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::new()
    }
}
