use crate::error::{Result, SpriteError};
use crate::model::{InlineSvg, Layout, PlacedImage, Rect, SpriteImage};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use std::collections::HashSet;
use std::fmt::Write;
use tracing::warn;

pub const SVG_MIME: &str = "image/svg+xml";

/// Serialize the layout into one SVG document.
///
/// Body: every image's inline content (vector sources nested in translating
/// groups, rasters as `<image>` with a data URI), then one `<view>` per image
/// whose `viewBox` is its placement rect. Ids declared inside a vector source
/// are prefixed with its fragment id. An empty layout yields an empty string.
///
/// `images` must be the list the layout was computed from, in the same order.
pub fn to_svg(layout: &Layout, images: &[SpriteImage]) -> Result<String> {
    if layout.is_empty() {
        return Ok(String::new());
    }
    check_alignment(layout, images)?;

    let (w, h) = (layout.width, layout.height);
    let mut s = String::new();
    write!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    )
    .map_err(encode_err)?;
    for (placed, img) in layout.placements.iter().zip(images) {
        write_content(&mut s, placed, img)?;
    }
    for placed in &layout.placements {
        let r = placed.rect;
        write!(
            s,
            r#"<view id="{}" viewBox="{} {} {} {}"/>"#,
            placed.fragment_id, r.x, r.y, r.w, r.h
        )
        .map_err(encode_err)?;
    }
    s.push_str("</svg>");
    Ok(s)
}

fn check_alignment(layout: &Layout, images: &[SpriteImage]) -> Result<()> {
    let aligned = layout.placements.len() == images.len()
        && layout
            .placements
            .iter()
            .zip(images)
            .all(|(p, img)| p.image_id == img.id);
    if aligned {
        Ok(())
    } else {
        Err(SpriteError::Encode(format!(
            "layout has {} placements that do not match the {} supplied images",
            layout.placements.len(),
            images.len()
        )))
    }
}

fn write_content(s: &mut String, placed: &PlacedImage, img: &SpriteImage) -> Result<()> {
    let r = placed.rect;
    if img.kind.is_vector() {
        // Malformed vector sources keep their slot but contribute no markup.
        if let Some(inline) = &img.inline {
            let inner = inner_transform(inline, (img.width, img.height), &r);
            write!(s, r#"<g transform="translate({}, {})">"#, r.x, r.y).map_err(encode_err)?;
            s.push_str("<g");
            if let Some(t) = inner {
                write!(s, r#" transform="{t}""#).map_err(encode_err)?;
            }
            // Prefixes bound on the source root must stay bound inside the sheet.
            for (attr, uri) in &inline.namespaces {
                write!(s, r#" {attr}="{}""#, quick_xml::escape::escape(uri.as_str()))
                    .map_err(encode_err)?;
            }
            s.push('>');
            let prefix = format!("{}-", placed.fragment_id);
            match scope_ids(&inline.markup, &prefix) {
                Ok(markup) => s.push_str(&markup),
                Err(e) => {
                    warn!(
                        image = %img.name,
                        error = %e,
                        "could not scope inner ids; embedding as is"
                    );
                    s.push_str(&inline.markup);
                }
            }
            s.push_str("</g></g>");
        }
    } else {
        write!(
            s,
            r#"<image x="{}" y="{}" width="{}" height="{}" href="{}" preserveAspectRatio="xMidYMid meet"/>"#,
            r.x,
            r.y,
            r.w,
            r.h,
            img.data_uri()
        )
        .map_err(encode_err)?;
    }
    Ok(())
}

/// Transform mapping the source coordinate frame (its viewBox, else the
/// intrinsic size) onto the placement rect, aspect-preserving and centred.
/// `None` when the mapping is the identity.
fn inner_transform(inline: &InlineSvg, intrinsic: (u32, u32), rect: &Rect) -> Option<String> {
    let (vx, vy, vw, vh) = inline
        .view_box
        .unwrap_or((0.0, 0.0, intrinsic.0 as f64, intrinsic.1 as f64));
    let (rw, rh) = (rect.w as f64, rect.h as f64);
    let scale = (rw / vw).min(rh / vh);
    let dx = (rw - vw * scale) / 2.0;
    let dy = (rh - vh * scale) / 2.0;

    let mut parts: Vec<String> = Vec::new();
    if !negligible(dx) || !negligible(dy) {
        parts.push(format!("translate({}, {})", num(dx), num(dy)));
    }
    if !negligible(scale - 1.0) {
        parts.push(format!("scale({})", num(scale)));
    }
    if !negligible(vx) || !negligible(vy) {
        parts.push(format!("translate({}, {})", num(-vx), num(-vy)));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Prefixes every `id` declared in `markup` with `prefix` and rewrites the
/// local references to them (`href="#id"`, `xlink:href`, `url(#id)` in
/// attributes and `<style>` text), so icons can't clash with each other or
/// with the `<view>` ids. Markup without ids is returned untouched.
fn scope_ids(markup: &str, prefix: &str) -> Result<String> {
    let ids = declared_ids(markup)?;
    if ids.is_empty() {
        return Ok(markup.to_string());
    }

    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::with_capacity(markup.len() + ids.len() * prefix.len()));
    let mut style_depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"style" {
                    style_depth += 1;
                }
                let e = scoped_element(&e, prefix, &ids)?;
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                let e = scoped_element(&e, prefix, &ids)?;
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"style" {
                    style_depth = style_depth.saturating_sub(1);
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Text(t) if style_depth > 0 => {
                let raw = String::from_utf8_lossy(&t).into_owned();
                let text = scope_url_refs(&raw, prefix, &ids);
                writer.write_event(Event::Text(BytesText::from_escaped(text)))?;
            }
            Event::CData(c) if style_depth > 0 => {
                let raw = String::from_utf8_lossy(&c).into_owned();
                let text = scope_url_refs(&raw, prefix, &ids);
                writer.write_event(Event::CData(BytesCData::new(text)))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|e| SpriteError::Encode(e.to_string()))
}

fn declared_ids(markup: &str) -> Result<HashSet<String>> {
    let mut reader = Reader::from_str(markup);
    let mut ids = HashSet::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    if attr.key.as_ref() == b"id" {
                        ids.insert(attr.unescape_value()?.into_owned());
                    }
                }
            }
            Event::Eof => return Ok(ids),
            _ => {}
        }
    }
}

fn scoped_element(
    e: &BytesStart<'_>,
    prefix: &str,
    ids: &HashSet<String>,
) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?;
        let scoped = if key == "id" && ids.contains(&*value) {
            format!("{prefix}{value}")
        } else if attr.key.local_name().as_ref() == b"href" {
            match value.strip_prefix('#').filter(|t| ids.contains(*t)) {
                Some(target) => format!("#{prefix}{target}"),
                None => value.to_string(),
            }
        } else {
            scope_url_refs(&value, prefix, ids)
        };
        out.push_attribute((key.as_str(), scoped.as_str()));
    }
    Ok(out)
}

/// Rewrites `url(#id)` (optionally quoted) for ids in `ids`.
fn scope_url_refs(value: &str, prefix: &str, ids: &HashSet<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find("url(") {
        let (head, tail) = rest.split_at(pos + "url(".len());
        out.push_str(head);
        let quote_len = usize::from(tail.starts_with('\'') || tail.starts_with('"'));
        let (quote, body) = tail.split_at(quote_len);
        out.push_str(quote);
        rest = body;
        if let Some(reference) = body.strip_prefix('#') {
            let end = reference
                .find(|c: char| matches!(c, ')' | '\'' | '"') || c.is_whitespace())
                .unwrap_or(reference.len());
            let (target, after) = reference.split_at(end);
            out.push('#');
            if ids.contains(target) {
                out.push_str(prefix);
            }
            out.push_str(target);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

fn negligible(v: f64) -> bool {
    v.abs() < 1e-6
}

/// Compact decimal form: at most four fractional digits, no trailing zeros.
fn num(v: f64) -> String {
    let rounded = (v * 10_000.0).round() / 10_000.0;
    // adding 0.0 normalizes -0.0
    format!("{}", rounded + 0.0)
}

fn encode_err(e: std::fmt::Error) -> SpriteError {
    SpriteError::Encode(e.to_string())
}
