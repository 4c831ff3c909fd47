//! Image intake: upload validation, name sanitizing and dimension probing.
//!
//! Every recoverable problem (malformed SVG, undecodable raster) degrades to a
//! `DEFAULT_SIZE` square and is logged; only unsupported MIME types are
//! reported to the caller.

use crate::error::{Result, SpriteError};
use crate::model::{ImageId, ImageKind, InlineSvg, SpriteImage};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::path::Path;
use tracing::{debug, warn};

/// Fallback side length for images whose size cannot be determined.
pub const DEFAULT_SIZE: u32 = 24;

/// A raw upload as handed over by the caller.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    /// Declared MIME type (e.g. `image/png`).
    pub mime: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            data,
        }
    }

    /// Reads a file and declares its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageKind::from_extension)
            .map(|k| k.mime().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Ok(Self {
            file_name,
            mime,
            data,
        })
    }
}

/// An upload whose metrics are known but which has not joined a session yet.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub name: String,
    pub original_name: String,
    pub kind: ImageKind,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub inline: Option<InlineSvg>,
}

impl DecodedImage {
    pub fn into_image(self, id: ImageId) -> SpriteImage {
        SpriteImage {
            id,
            name: self.name,
            original_name: self.original_name,
            kind: self.kind,
            data: self.data,
            width: self.width,
            height: self.height,
            inline: self.inline,
        }
    }
}

/// Validates the MIME type and probes dimensions (and inline content for SVG).
///
/// Fails only with [`SpriteError::UnsupportedType`].
pub fn decode_upload(upload: Upload) -> Result<DecodedImage> {
    let Some(kind) = ImageKind::from_mime(&upload.mime) else {
        return Err(SpriteError::UnsupportedType {
            name: upload.file_name,
            mime: upload.mime,
        });
    };
    let (width, height, inline) = if kind.is_vector() {
        let root = read_svg_root(&upload.data, &upload.file_name);
        let (w, h) = root
            .as_ref()
            .map(SvgRoot::dimensions)
            .unwrap_or((DEFAULT_SIZE, DEFAULT_SIZE));
        let inline = root.and_then(SvgRoot::into_inline);
        (w, h, inline)
    } else {
        let (w, h) = raster_dimensions(&upload.data);
        (w, h, None)
    };
    debug!(file = %upload.file_name, ?kind, width, height, "decoded upload");
    Ok(DecodedImage {
        name: sanitize_name(&upload.file_name),
        original_name: upload.file_name,
        kind,
        data: upload.data,
        width,
        height,
        inline,
    })
}

/// Strips the last extension, replaces every non-alphanumeric char with `_`
/// and lower-cases the result.
pub fn sanitize_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot + 1 < file_name.len() && !file_name[dot + 1..].contains('/') => {
            &file_name[..dot]
        }
        _ => file_name,
    };
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Intrinsic size of an SVG document: `width`/`height` if both are present,
/// else the viewBox extent, else `DEFAULT_SIZE` square.
pub fn svg_dimensions(data: &[u8]) -> (u32, u32) {
    read_svg_root(data, "<svg>")
        .map(|root| root.dimensions())
        .unwrap_or((DEFAULT_SIZE, DEFAULT_SIZE))
}

/// Raw markup nested inside the root `<svg>`, or `None` for malformed input.
pub fn svg_inner_markup(data: &[u8]) -> Option<InlineSvg> {
    read_svg_root(data, "<svg>").and_then(SvgRoot::into_inline)
}

/// Natural size of a raster image; `DEFAULT_SIZE` square if it cannot be decoded.
pub fn raster_dimensions(data: &[u8]) -> (u32, u32) {
    match probe_raster(data) {
        Ok((w, h)) => (non_zero(w), non_zero(h)),
        Err(e) => {
            warn!(error = %e, "raster decode failed, using default size");
            (DEFAULT_SIZE, DEFAULT_SIZE)
        }
    }
}

fn probe_raster(data: &[u8]) -> Result<(u32, u32)> {
    let reader = image::ImageReader::new(std::io::Cursor::new(data)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

fn non_zero(v: u32) -> u32 {
    if v == 0 { DEFAULT_SIZE } else { v }
}

struct SvgRoot {
    width: Option<String>,
    height: Option<String>,
    view_box: Option<String>,
    namespaces: Vec<(String, String)>,
    /// `None` when the root element was never closed.
    inner: Option<String>,
}

impl SvgRoot {
    fn dimensions(&self) -> (u32, u32) {
        if let (Some(w), Some(h)) = (&self.width, &self.height) {
            return (dimension_or_default(w), dimension_or_default(h));
        }
        if let Some(vb) = &self.view_box {
            let tokens = view_box_tokens(vb);
            if tokens.len() >= 4 {
                return (
                    dimension_or_default(tokens[2]),
                    dimension_or_default(tokens[3]),
                );
            }
        }
        (DEFAULT_SIZE, DEFAULT_SIZE)
    }

    fn into_inline(self) -> Option<InlineSvg> {
        let view_box = self.view_box.as_deref().and_then(parse_view_box);
        let namespaces = self.namespaces;
        self.inner.map(|markup| InlineSvg {
            markup,
            view_box,
            namespaces,
        })
    }
}

fn read_svg_root(data: &[u8], label: &str) -> Option<SvgRoot> {
    let text = match std::str::from_utf8(data) {
        Ok(t) => t,
        Err(e) => {
            warn!(file = label, error = %e, "svg is not valid UTF-8");
            return None;
        }
    };
    match parse_svg_root(text) {
        Ok(Some(root)) => Some(root),
        Ok(None) => {
            warn!(file = label, "svg has no root <svg> element");
            None
        }
        Err(e) => {
            warn!(file = label, error = %e, "svg parse failed");
            None
        }
    }
}

fn parse_svg_root(text: &str) -> Result<Option<SvgRoot>> {
    let mut reader = Reader::from_str(text);
    // (root, inner start offset, depth)
    let mut open: Option<(SvgRoot, usize, usize)> = None;
    loop {
        // Start of the next event; at the root's end tag, the end of the inner markup.
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => match open.as_mut() {
                Some((_, _, depth)) => *depth += 1,
                None if e.local_name().as_ref() == b"svg" => {
                    let root = root_attributes(&e)?;
                    let start = reader.buffer_position() as usize;
                    open = Some((root, start, 1));
                }
                None => {}
            },
            Event::Empty(e) if open.is_none() && e.local_name().as_ref() == b"svg" => {
                let mut root = root_attributes(&e)?;
                root.inner = Some(String::new());
                return Ok(Some(root));
            }
            Event::End(_) => {
                let closes_root = match open.as_mut() {
                    Some((_, _, depth)) => {
                        *depth -= 1;
                        *depth == 0
                    }
                    None => false,
                };
                if !closes_root {
                    continue;
                }
                if let Some((mut root, start, _)) = open.take() {
                    root.inner = Some(text[start..before].to_string());
                    return Ok(Some(root));
                }
            }
            Event::Eof => return Ok(open.map(|(root, ..)| root)),
            _ => {}
        }
    }
}

fn root_attributes(e: &BytesStart<'_>) -> Result<SvgRoot> {
    let mut root = SvgRoot {
        width: None,
        height: None,
        view_box: None,
        namespaces: Vec::new(),
        inner: None,
    };
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref().starts_with(b"xmlns:") {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            root.namespaces.push((key, attr.unescape_value()?.into_owned()));
            continue;
        }
        let slot = match attr.key.as_ref() {
            b"width" => &mut root.width,
            b"height" => &mut root.height,
            b"viewBox" => &mut root.view_box,
            _ => continue,
        };
        let value = attr.unescape_value()?;
        if !value.trim().is_empty() {
            *slot = Some(value.into_owned());
        }
    }
    Ok(root)
}

fn view_box_tokens(vb: &str) -> Vec<&str> {
    vb.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_view_box(vb: &str) -> Option<(f64, f64, f64, f64)> {
    let nums: Vec<f64> = view_box_tokens(vb)
        .into_iter()
        .map(|t| t.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match nums.as_slice() {
        [x, y, w, h, ..] if *w > 0.0 && *h > 0.0 => Some((*x, *y, *w, *h)),
        _ => None,
    }
}

/// Leading-integer parse (`"24px"` -> 24, `"12.5"` -> 12); non-positive or
/// unparseable values fall back to `DEFAULT_SIZE`.
fn dimension_or_default(s: &str) -> u32 {
    match leading_int(s) {
        Some(v) if v > 0 => u32::try_from(v).unwrap_or(u32::MAX),
        _ => DEFAULT_SIZE,
    }
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (neg, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }
    let v: i64 = digits.parse().unwrap_or(i64::MAX);
    Some(if neg { -v } else { v })
}
