use crate::config::{ConsumptionMode, SizingMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle in sprite coordinates. `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right_edge(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom_edge(&self) -> u32 {
        self.y + self.h
    }
    /// Returns true if `r` lies fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x
            && r.y >= self.y
            && r.right_edge() <= self.right_edge()
            && r.bottom_edge() <= self.bottom_edge()
    }
    /// Returns true if the two rectangles share any area.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right_edge()
            || r.x >= self.right_edge()
            || self.y >= r.bottom_edge()
            || r.y >= self.bottom_edge())
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// Session-assigned identity of an uploaded image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Svg,
}

impl ImageKind {
    /// Maps an upload MIME type; `image/jpg` is accepted as an alias of `image/jpeg`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/svg+xml" => Some(Self::Svg),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Svg => "image/svg+xml",
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Svg)
    }
}

/// Parsed content of a vector upload, ready to be nested into the sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineSvg {
    /// Raw markup between the root `<svg>` start and end tags.
    pub markup: String,
    /// Root `viewBox` as `(min_x, min_y, width, height)`, if present and well-formed.
    pub view_box: Option<(f64, f64, f64, f64)>,
    /// Prefixed namespace declarations of the root (`xmlns:xlink`, ...) as
    /// `(attribute, uri)`; the markup may depend on them.
    pub namespaces: Vec<(String, String)>,
}

/// A decoded upload. Immutable once created; only collection membership changes.
#[derive(Debug, Clone)]
pub struct SpriteImage {
    pub id: ImageId,
    /// Sanitized identifier (see [`crate::intake::sanitize_name`]).
    pub name: String,
    pub original_name: String,
    pub kind: ImageKind,
    /// Encoded payload as uploaded.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Inline content for vector sources; `None` for rasters and malformed SVG.
    pub inline: Option<InlineSvg>,
}

impl SpriteImage {
    /// Payload as a `data:` URI (base64).
    pub fn data_uri(&self) -> String {
        use base64::Engine;
        format!(
            "data:{};base64,{}",
            self.kind.mime(),
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// Placement of one image within the sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedImage {
    pub image_id: ImageId,
    /// Sanitized image name.
    pub name: String,
    /// Name de-duplicated within the sheet; CSS class suffix.
    pub class_name: String,
    /// `<view id>` and URL fragment.
    pub fragment_id: String,
    pub rect: Rect,
}

/// Output of the layout engine: ordered placements and canvas size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Layout {
    pub placements: Vec<PlacedImage>,
    pub width: u32,
    pub height: u32,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Generated text artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub svg: String,
    pub css: String,
    pub html: String,
}

/// Sheet-level metadata (used by the manifest exporter and templates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version of the manifest; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub sprite_name: String,
    pub image: String,
    pub sizing_mode: SizingMode,
    pub consumption_mode: ConsumptionMode,
    pub size: (u32, u32),
    pub spacing: u32,
    pub columns: u32,
}

/// A fully composed sheet: layout, artifacts and metadata.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub layout: Layout,
    pub artifacts: Artifacts,
    pub meta: Meta,
}

/// Statistics about how densely the sheet is used.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SheetStats {
    pub num_images: usize,
    pub num_rows: usize,
    pub canvas_area: u64,
    /// Sum of placement areas.
    pub used_area: u64,
    /// used_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl SpriteSheet {
    /// Computes usage statistics for this sheet.
    pub fn stats(&self) -> SheetStats {
        let placements = &self.layout.placements;
        let canvas_area = self.layout.width as u64 * self.layout.height as u64;
        let used_area: u64 = placements.iter().map(|p| p.rect.area()).sum();
        let mut rows: Vec<u32> = placements.iter().map(|p| p.rect.y).collect();
        rows.dedup();
        let occupancy = if canvas_area > 0 {
            used_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        SheetStats {
            num_images: placements.len(),
            num_rows: rows.len(),
            canvas_area,
            used_area,
            occupancy,
        }
    }
}

impl SheetStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Images: {}, Rows: {}, Occupancy: {:.2}%, Canvas Area: {} px², Used Area: {} px²",
            self.num_images,
            self.num_rows,
            self.occupancy * 100.0,
            self.canvas_area,
            self.used_area,
        )
    }

    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_area)
    }
}
