use crate::error::{Result, SpriteError};
use crate::model::SpriteSheet;
use serde_json::{Value, json};

/// Serialize the sheet layout as `{ frames: [...], meta }`.
/// Frames keep sheet order; each carries its fragment id, names and rect.
pub fn to_json_manifest(sheet: &SpriteSheet) -> Value {
    let frames: Vec<Value> = sheet
        .layout
        .placements
        .iter()
        .map(|p| {
            json!({
                "id": p.fragment_id,
                "name": p.name,
                "class": p.class_name,
                "imageId": p.image_id.0,
                "frame": {"x": p.rect.x, "y": p.rect.y, "w": p.rect.w, "h": p.rect.h},
            })
        })
        .collect();
    json!({ "frames": frames, "meta": &sheet.meta })
}

/// Pretty-printed manifest text.
pub fn to_json_manifest_string(sheet: &SpriteSheet) -> Result<String> {
    serde_json::to_string_pretty(&to_json_manifest(sheet))
        .map_err(|e| SpriteError::Encode(e.to_string()))
}
