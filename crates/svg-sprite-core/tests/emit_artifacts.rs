use std::io::Cursor;
use svg_sprite_core::prelude::*;

fn svg_upload(name: &str, w: u32, h: u32) -> Upload {
    let body = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}"/></svg>"#
    );
    Upload::new(name, "image/svg+xml", body.into_bytes())
}

fn png_upload(name: &str, w: u32, h: u32) -> Upload {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(w, h));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode png");
    Upload::new(name, "image/png", buf)
}

fn session(uploads: Vec<Upload>) -> SpriteSession {
    let mut s = SpriteSession::new();
    let report = s.ingest(uploads);
    assert!(report.rejected.is_empty());
    s
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn svg_document_has_canvas_and_views() {
    let s = session(vec![
        svg_upload("a.svg", 24, 24),
        svg_upload("b.svg", 32, 32),
        svg_upload("c.svg", 16, 16),
    ]);
    let cfg = LayoutConfig::builder().columns(2).spacing(4).build();
    let sheet = s.compose(&cfg).expect("compose");
    let svg = &sheet.artifacts.svg;
    assert!(svg.starts_with(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="60" height="52" viewBox="0 0 60 52">"#
    ));
    assert!(svg.ends_with("</svg>"));
    assert!(svg.contains(r#"<g transform="translate(28, 0)"><g><rect width="32" height="32"/></g></g>"#));
    assert!(svg.contains(r#"<view id="01" viewBox="0 0 24 24"/>"#));
    assert!(svg.contains(r#"<view id="02" viewBox="28 0 32 32"/>"#));
    assert!(svg.contains(r#"<view id="03" viewBox="0 36 16 16"/>"#));
    // content precedes views
    assert!(svg.find("<g transform").unwrap() < svg.find("<view").unwrap());
}

#[test]
fn raster_becomes_image_element_with_data_uri() {
    let s = session(vec![png_upload("pic.png", 10, 20)]);
    let sheet = s.compose(&LayoutConfig::default()).expect("compose");
    let svg = &sheet.artifacts.svg;
    assert!(svg.contains(r#"<image x="0" y="0" width="10" height="20" href="data:image/png;base64,"#));
    assert!(svg.contains(r#"preserveAspectRatio="xMidYMid meet"/>"#));
}

#[test]
fn custom_mode_scales_vector_content_into_cell() {
    let s = session(vec![svg_upload("a.svg", 24, 24), svg_upload("wide.svg", 48, 24)]);
    let cfg = LayoutConfig::builder().custom_size(48, 48).columns(2).spacing(2).build();
    let svg = s.compose(&cfg).expect("compose").artifacts.svg;
    assert!(svg.contains(r#"<g transform="translate(0, 0)"><g transform="scale(2)">"#));
    // 48x24 source fit into 48x48 cell: no scale, centred vertically
    assert!(svg.contains(r#"<g transform="translate(50, 0)"><g transform="translate(0, 12)">"#));
}

#[test]
fn malformed_vector_keeps_slot_without_markup() {
    let broken = Upload::new("broken.svg", "image/svg+xml", b"<svg><g></svg>".to_vec());
    let s = session(vec![broken, svg_upload("ok.svg", 10, 10)]);
    let sheet = s.compose(&LayoutConfig::builder().columns(2).build()).expect("compose");
    let svg = &sheet.artifacts.svg;
    assert_eq!(sheet.layout.placements[0].rect, Rect::new(0, 0, 24, 24));
    assert_eq!(count(svg, "<g transform"), 1);
    assert!(svg.contains(r#"<view id="01" viewBox="0 0 24 24"/>"#));
    assert!(svg.contains(r#"<g transform="translate(24, 0)">"#));
}

#[test]
fn every_view_is_referenced_once_in_css_and_html() {
    let s = session(vec![
        svg_upload("home.svg", 24, 24),
        svg_upload("home.svg", 24, 24),
        png_upload("logo.png", 8, 8),
    ]);
    let cfg = LayoutConfig::builder().sprite_name("icons").columns(2).build();
    let sheet = s.compose(&cfg).expect("compose");
    let Artifacts { svg, css, html } = &sheet.artifacts;
    for p in &sheet.layout.placements {
        let id = &p.fragment_id;
        assert_eq!(count(svg, &format!(r#"<view id="{id}""#)), 1);
        assert_eq!(count(css, &format!("icons.svg#{id})")), 1, "css ref for {id}");
        let lines = html.lines().filter(|l| l.contains(&format!("icons.svg#{id}\""))).count();
        assert_eq!(lines, 1, "html line for {id}");
    }
    assert_eq!(html.lines().count(), 3);
}

#[test]
fn background_mode_css_and_html_shapes() {
    let s = session(vec![svg_upload("Arrow Up.svg", 24, 16)]);
    let cfg = LayoutConfig::builder().sprite_name("ui").build();
    let sheet = s.compose(&cfg).expect("compose");
    let css = &sheet.artifacts.css;
    assert!(css.contains(".ui {\n    display: inline-block;"));
    assert!(css.contains(".ui-arrow_up {\n    width: 24px;\n    height: 16px;\n    --vg: url(ui.svg#01);\n}"));
    assert!(!css.contains("--grid"));
    assert_eq!(
        sheet.artifacts.html,
        r#"<a class="ui-arrow_up ui" href="ui.svg#01" style="--vg:url(ui.svg#01)">&#8203;</a>"#
    );
}

#[test]
fn custom_background_mode_adds_position_grid() {
    let s = session(vec![svg_upload("a.svg", 24, 24), svg_upload("b.svg", 24, 24)]);
    let cfg = LayoutConfig::builder()
        .sprite_name("s")
        .custom_size(50, 40)
        .columns(1)
        .spacing(10)
        .build();
    let css = s.compose(&cfg).expect("compose").artifacts.css;
    assert!(css.contains(".s--grid {\n    display: inline-block;\n    width: 50px;\n    height: 40px;\n    background: url(s.svg) no-repeat;\n}"));
    assert!(css.contains(".s--grid.s-a { background-position: 0 0; }"));
    assert!(css.contains(".s--grid.s-b { background-position: 0 -50px; }"));
}

#[test]
fn img_src_mode_needs_no_css() {
    let s = session(vec![svg_upload("a.svg", 24, 24), svg_upload("b.svg", 12, 12)]);
    let cfg = LayoutConfig::builder()
        .consumption_mode(ConsumptionMode::ImgSrc)
        .columns(2)
        .build();
    let sheet = s.compose(&cfg).expect("compose");
    assert!(sheet.artifacts.css.starts_with("/* No CSS needed"));
    assert_eq!(sheet.artifacts.css.lines().count(), 1);
    assert_eq!(
        sheet.artifacts.html,
        "<img width=\"24\" height=\"24\" src=\"sprite.svg#01\" alt=\"a\">\n<img width=\"12\" height=\"12\" src=\"sprite.svg#02\" alt=\"b\">"
    );
}

#[test]
fn empty_layout_emits_nothing() {
    let cfg = LayoutConfig::default();
    let layout = layout(&[], &cfg).expect("layout");
    let artifacts = emit(&layout, &[], &cfg).expect("emit");
    assert_eq!(artifacts, Artifacts::default());
}

#[test]
fn emit_rejects_layout_from_other_images() {
    let a = session(vec![svg_upload("a.svg", 8, 8)]);
    let b = session(vec![svg_upload("b.svg", 8, 8), svg_upload("c.svg", 8, 8)]);
    let cfg = LayoutConfig::default();
    let layout = layout(a.images(), &cfg).expect("layout");
    assert!(matches!(
        emit(&layout, b.images(), &cfg),
        Err(SpriteError::Encode(_))
    ));
}

fn assert_prefixes_bound(svg: &str) {
    use quick_xml::events::Event;
    use quick_xml::name::ResolveResult;
    use quick_xml::reader::NsReader;

    let mut reader = NsReader::from_str(svg);
    loop {
        let (ns, event) = reader.read_resolved_event().expect("sheet is well-formed XML");
        let element_unbound = matches!(ns, ResolveResult::Unknown(_));
        match event {
            Event::Start(e) | Event::Empty(e) => {
                assert!(!element_unbound, "unbound element prefix: {:?}", e.name());
                for attr in e.attributes() {
                    let attr = attr.expect("attribute");
                    if attr.key.as_namespace_binding().is_some() {
                        continue;
                    }
                    let (ns, _) = reader.resolve_attribute(attr.key);
                    assert!(
                        !matches!(ns, ResolveResult::Unknown(_)),
                        "unbound attribute prefix: {:?}",
                        attr.key
                    );
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
}

fn xlink_icon(name: &str) -> Upload {
    let body = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="16" height="16"><defs><path id="p" d="M0 0h16v16z"/></defs><use xlink:href="#p"/></svg>"##;
    Upload::new(name, "image/svg+xml", body.as_bytes().to_vec())
}

#[test]
fn xlink_icons_keep_their_namespace() {
    let s = session(vec![xlink_icon("a.svg"), svg_upload("b.svg", 8, 8)]);
    let sheet = s.compose(&LayoutConfig::default()).expect("compose");
    let svg = &sheet.artifacts.svg;
    assert!(svg.contains(r#"<g xmlns:xlink="http://www.w3.org/1999/xlink">"#));
    assert_prefixes_bound(svg);
}

#[test]
fn inner_ids_are_scoped_per_fragment() {
    let gradient = r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><defs><linearGradient id="g"><stop offset="0"/></linearGradient></defs><rect width="16" height="16" fill="url(#g)"/><style>.x{fill:url('#g')}</style></svg>"##;
    let s = session(vec![
        xlink_icon("a.svg"),
        Upload::new("b.svg", "image/svg+xml", gradient.as_bytes().to_vec()),
        Upload::new("c.svg", "image/svg+xml", gradient.as_bytes().to_vec()),
    ]);
    let sheet = s.compose(&LayoutConfig::default()).expect("compose");
    let svg = &sheet.artifacts.svg;

    assert!(svg.contains(r##"<path id="01-p" d="M0 0h16v16z"/></defs><use xlink:href="#01-p"/>"##));
    assert!(svg.contains(r#"<linearGradient id="02-g">"#));
    assert!(svg.contains(r#"fill="url(#02-g)""#));
    assert!(svg.contains("fill:url('#02-g')"));
    assert!(svg.contains(r#"<linearGradient id="03-g">"#));
    assert!(svg.contains(r#"fill="url(#03-g)""#));
    assert_eq!(count(svg, r#"id="g""#), 0);
    assert_eq!(count(svg, r#"id="p""#), 0);
    // view ids are untouched
    assert!(svg.contains(r#"<view id="02" viewBox="16 0 16 16"/>"#));
    assert_prefixes_bound(svg);
}
