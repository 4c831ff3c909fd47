use crate::config::{LayoutConfig, SizingMode};
use crate::error::{Result, SpriteError};
use crate::intake::DEFAULT_SIZE;
use crate::model::{ImageId, Layout, PlacedImage, Rect, SpriteImage};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Size-only input to the layout engine.
#[derive(Debug, Clone)]
pub struct LayoutItem {
    pub image_id: ImageId,
    pub name: String,
    pub w: u32,
    pub h: u32,
}

impl From<&SpriteImage> for LayoutItem {
    fn from(img: &SpriteImage) -> Self {
        Self {
            image_id: img.id,
            name: img.name.clone(),
            w: img.width,
            h: img.height,
        }
    }
}

/// Computes placements for `images` in collection order.
///
/// Notes:
/// - `Original` packs row-major with variable row height; the canvas is the
///   bounding box of all placements.
/// - `Custom` uses a fixed cell grid; the canvas follows the closed-form grid size.
/// - An empty list yields an empty 0x0 layout.
pub fn layout(images: &[SpriteImage], cfg: &LayoutConfig) -> Result<Layout> {
    layout_items(images.iter().map(LayoutItem::from).collect(), cfg)
}

#[instrument(skip_all, fields(items = items.len()))]
pub fn layout_items(items: Vec<LayoutItem>, cfg: &LayoutConfig) -> Result<Layout> {
    cfg.validate()?;
    if items.is_empty() {
        return Ok(Layout::default());
    }

    let (rects, width, height) = match cfg.sizing_mode {
        SizingMode::Original => original_grid(&items, cfg.columns, cfg.spacing)?,
        SizingMode::Custom => custom_grid(items.len(), cfg)?,
    };

    let mut used_classes: HashSet<String> = HashSet::with_capacity(items.len());
    let placements = items
        .into_iter()
        .zip(rects)
        .enumerate()
        .map(|(i, (item, rect))| PlacedImage {
            image_id: item.image_id,
            class_name: unique_class(&item.name, &mut used_classes),
            name: item.name,
            fragment_id: fragment_id(i),
            rect,
        })
        .collect::<Vec<_>>();

    debug!(
        mode = ?cfg.sizing_mode,
        placements = placements.len(),
        width,
        height,
        "layout computed"
    );
    Ok(Layout {
        placements,
        width,
        height,
    })
}

/// Sequential zero-padded fragment id for the item at `index` (`0 -> "01"`).
pub fn fragment_id(index: usize) -> String {
    format!("{:02}", index + 1)
}

fn unique_class(name: &str, used: &mut HashSet<String>) -> String {
    let base = if name.is_empty() { "image" } else { name };
    let mut candidate = base.to_string();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

fn original_grid(items: &[LayoutItem], columns: u32, spacing: u32) -> Result<(Vec<Rect>, u32, u32)> {
    let spacing = spacing as u64;
    let (mut x, mut y, mut row_h, mut col) = (0u64, 0u64, 0u64, 0u32);
    let (mut max_x, mut max_y) = (0u64, 0u64);
    let mut rects = Vec::with_capacity(items.len());
    for item in items {
        let w = u64::from(if item.w == 0 { DEFAULT_SIZE } else { item.w });
        let h = u64::from(if item.h == 0 { DEFAULT_SIZE } else { item.h });
        if col >= columns {
            x = 0;
            y += row_h + spacing;
            row_h = 0;
            col = 0;
        }
        rects.push(rect_u32(x, y, w, h)?);
        max_x = max_x.max(x + w);
        max_y = max_y.max(y + h);
        x += w + spacing;
        row_h = row_h.max(h);
        col += 1;
    }
    Ok((rects, to_u32(max_x)?, to_u32(max_y)?))
}

fn custom_grid(count: usize, cfg: &LayoutConfig) -> Result<(Vec<Rect>, u32, u32)> {
    let (cw, ch) = cfg.cell_size();
    let (cw, ch) = (cw as u64, ch as u64);
    let spacing = cfg.spacing as u64;
    let columns = cfg.columns as u64;
    let rects = (0..count as u64)
        .map(|i| {
            let row = i / columns;
            let col = i % columns;
            rect_u32(col * (cw + spacing), row * (ch + spacing), cw, ch)
        })
        .collect::<Result<Vec<_>>>()?;
    let rows = (count as u64).div_ceil(columns);
    let width = cw * columns + spacing * (columns - 1);
    let height = ch * rows + spacing * (rows - 1);
    Ok((rects, to_u32(width)?, to_u32(height)?))
}

fn rect_u32(x: u64, y: u64, w: u64, h: u64) -> Result<Rect> {
    // Edges must be addressable too, not just the origin.
    to_u32(x + w)?;
    to_u32(y + h)?;
    Ok(Rect::new(to_u32(x)?, to_u32(y)?, to_u32(w)?, to_u32(h)?))
}

fn to_u32(v: u64) -> Result<u32> {
    u32::try_from(v).map_err(|_| SpriteError::Overflow)
}
