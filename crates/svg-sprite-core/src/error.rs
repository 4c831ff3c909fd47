use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Unsupported image type for {name}: {mime}")]
    UnsupportedType { name: String, mime: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Sprite canvas exceeds the addressable coordinate range")]
    Overflow,
    #[error("Nothing to compose")]
    Empty,
    #[error("Encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, SpriteError>;
