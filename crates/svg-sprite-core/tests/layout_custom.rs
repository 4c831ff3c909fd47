use svg_sprite_core::prelude::*;

fn items(n: usize) -> Vec<LayoutItem> {
    (0..n)
        .map(|i| LayoutItem {
            image_id: ImageId(i as u64),
            name: format!("icon{}", i),
            // intrinsic sizes vary; custom mode ignores them
            w: 10 + i as u32 * 7,
            h: 30 - i as u32,
        })
        .collect()
}

#[test]
fn four_images_fifty_px_cells() {
    let cfg = LayoutConfig::builder().custom_size(50, 50).columns(2).spacing(10).build();
    let layout = layout_items(items(4), &cfg).expect("layout");
    assert_eq!((layout.width, layout.height), (110, 110));
    let rects: Vec<Rect> = layout.placements.iter().map(|p| p.rect).collect();
    assert_eq!(rects[0], Rect::new(0, 0, 50, 50));
    assert_eq!(rects[1], Rect::new(60, 0, 50, 50));
    assert_eq!(rects[2], Rect::new(0, 60, 50, 50));
    assert_eq!(rects[3], Rect::new(60, 60, 50, 50));
}

#[test]
fn placement_follows_row_and_column_formula() {
    let (cw, ch, spacing, columns) = (32u32, 20u32, 3u32, 4u32);
    let cfg = LayoutConfig::builder()
        .custom_size(cw, ch)
        .columns(columns)
        .spacing(spacing)
        .build();
    let layout = layout_items(items(11), &cfg).expect("layout");
    for (i, p) in layout.placements.iter().enumerate() {
        let row = i as u32 / columns;
        let col = i as u32 % columns;
        assert_eq!(p.rect, Rect::new(col * (cw + spacing), row * (ch + spacing), cw, ch));
    }
    let rows = 3;
    assert_eq!(layout.width, cw * columns + spacing * (columns - 1));
    assert_eq!(layout.height, ch * rows + spacing * (rows - 1));
}

#[test]
fn grid_width_spans_all_columns_even_when_partially_filled() {
    let cfg = LayoutConfig::builder().custom_size(20, 20).columns(5).spacing(1).build();
    let layout = layout_items(items(2), &cfg).expect("layout");
    assert_eq!((layout.width, layout.height), (104, 20));
}

#[test]
fn out_of_range_cells_are_clamped() {
    let cfg = LayoutConfig::builder().custom_size(4, 2000).columns(1).build();
    assert_eq!(cfg.cell_size(), (16, 1600));
    let layout = layout_items(items(1), &cfg).expect("layout");
    assert_eq!(layout.placements[0].rect, Rect::new(0, 0, 16, 1600));
}

#[test]
fn zero_columns_rejected() {
    let cfg = LayoutConfig::builder().custom_size(24, 24).columns(0).build();
    match layout_items(items(3), &cfg) {
        Err(SpriteError::InvalidConfig(msg)) => assert!(msg.contains("columns")),
        other => panic!("expected InvalidConfig, got {:?}", other),
    }
}
