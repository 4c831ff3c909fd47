use crate::config::{ConsumptionMode, LayoutConfig, SizingMode};
use crate::model::Layout;

pub const CSS_MIME: &str = "text/css";

/// Build the stylesheet for the chosen consumption mode.
///
/// Background mode: a base `.{sprite}` rule painting `var(--vg)`, then one rule
/// per image sizing `.{sprite}-{class}` and pointing `--vg` at its fragment.
/// Custom sizing adds a `.{sprite}--grid` rule for plain `background-position`
/// use of the whole sheet. Img-src mode only emits a comment.
pub fn to_css(layout: &Layout, cfg: &LayoutConfig) -> String {
    if layout.is_empty() {
        return String::new();
    }
    let name = cfg.effective_sprite_name();
    let file = cfg.svg_file_name();
    let mut s = String::new();
    match cfg.consumption_mode {
        ConsumptionMode::ImgSrc => {
            s.push_str(&format!(
                "/* No CSS needed: reference fragments directly, e.g. <img src=\"{file}#fragment\"> */\n"
            ));
        }
        ConsumptionMode::Background => {
            s.push_str("/* SVG sprite CSS using <view> fragments */\n");
            s.push_str(&format!(
                ".{name} {{\n    display: inline-block;\n    background: var(--vg) no-repeat center / contain;\n}}\n"
            ));
            for p in &layout.placements {
                s.push_str(&format!(
                    "\n.{name}-{} {{\n    width: {}px;\n    height: {}px;\n    --vg: url({file}#{});\n}}\n",
                    p.class_name, p.rect.w, p.rect.h, p.fragment_id
                ));
            }
            if cfg.sizing_mode == SizingMode::Custom {
                let (cw, ch) = cfg.cell_size();
                s.push_str(&format!(
                    "\n/* Position-based alternative: fixed {cw}x{ch}px cells of the whole sheet */\n"
                ));
                s.push_str(&format!(
                    ".{name}--grid {{\n    display: inline-block;\n    width: {cw}px;\n    height: {ch}px;\n    background: url({file}) no-repeat;\n}}\n"
                ));
                for p in &layout.placements {
                    s.push_str(&format!(
                        ".{name}--grid.{name}-{} {{ background-position: {} {}; }}\n",
                        p.class_name,
                        offset(p.rect.x),
                        offset(p.rect.y)
                    ));
                }
            }
        }
    }
    s
}

/// One usage line per image, addressing its fragment.
///
/// Img-src mode: `<img width height src="{sprite}.svg#id">`.
/// Background mode: an anchor carrying the classes and a `--vg` style hook,
/// with a zero-width space so the empty element still renders.
pub fn to_html(layout: &Layout, cfg: &LayoutConfig) -> String {
    let name = cfg.effective_sprite_name();
    let file = cfg.svg_file_name();
    layout
        .placements
        .iter()
        .map(|p| match cfg.consumption_mode {
            ConsumptionMode::ImgSrc => format!(
                r#"<img width="{}" height="{}" src="{file}#{}" alt="{}">"#,
                p.rect.w, p.rect.h, p.fragment_id, p.name
            ),
            ConsumptionMode::Background => format!(
                r#"<a class="{name}-{} {name}" href="{file}#{}" style="--vg:url({file}#{})">&#8203;</a>"#,
                p.class_name, p.fragment_id, p.fragment_id
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn offset(v: u32) -> String {
    if v == 0 {
        "0".to_string()
    } else {
        format!("-{v}px")
    }
}
