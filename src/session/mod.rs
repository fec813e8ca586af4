//! Image session
//!
//! Ordered list of images loaded for watermarking, with one of them
//! selected. Only PNG, JPEG and GIF are accepted. A file with the same name
//! and byte size as an existing entry is ignored.

pub mod debounce;

pub use debounce::Debouncer;

use std::fmt;
use std::path::Path;

use image::ImageFormat;
use uuid::Uuid;

use crate::constants::ACCEPTED_MIME_TYPES;
use crate::watermark::SourceImage;

/// Errors that can occur while adding images to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Not a PNG, JPEG or GIF
    UnsupportedType {
        file_name: String,
        detected: Option<String>,
    },
    /// Recognized type but the data could not be decoded
    DecodeFailed { file_name: String, message: String },
    /// The file could not be read
    ReadFailed { file_name: String, message: String },
    /// No image with this id
    NotFound(Uuid),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnsupportedType {
                file_name,
                detected,
            } => match detected {
                Some(kind) => write!(
                    f,
                    "Unsupported file type {} for {} (only png, jpg, gif)",
                    kind, file_name
                ),
                None => write!(
                    f,
                    "Unsupported file type for {} (only png, jpg, gif)",
                    file_name
                ),
            },
            SessionError::DecodeFailed { file_name, message } => {
                write!(f, "Unable to load image {}: {}", file_name, message)
            }
            SessionError::ReadFailed { file_name, message } => {
                write!(f, "Unable to read {}: {}", file_name, message)
            }
            SessionError::NotFound(id) => write!(f, "No image with id {}", id),
        }
    }
}

impl std::error::Error for SessionError {}

/// MIME type of `format` if the session accepts it
fn accepted_mime(format: ImageFormat) -> Option<&'static str> {
    let mime = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        _ => return None,
    };
    ACCEPTED_MIME_TYPES.contains(&mime).then_some(mime)
}

/// Detect the image format from content, falling back to the extension.
fn sniff_format(file_name: &str, data: &[u8]) -> Result<ImageFormat, SessionError> {
    let unsupported = |detected: Option<String>| SessionError::UnsupportedType {
        file_name: file_name.to_string(),
        detected,
    };

    let format = match image::guess_format(data) {
        Ok(format) => format,
        Err(_) => Path::new(file_name)
            .extension()
            .and_then(ImageFormat::from_extension)
            .ok_or_else(|| unsupported(None))?,
    };

    match accepted_mime(format) {
        Some(_) => Ok(format),
        None => Err(unsupported(Some(format!("{:?}", format).to_lowercase()))),
    }
}

/// An image in the session
#[derive(Debug, Clone)]
pub struct ImageEntry {
    id: Uuid,
    byte_size: u64,
    mime: &'static str,
    image: SourceImage,
}

impl ImageEntry {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_name(&self) -> &str {
        self.image.file_name()
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn image(&self) -> &SourceImage {
        &self.image
    }
}

/// Ordered images plus the current selection
#[derive(Debug, Default)]
pub struct ImageSession {
    entries: Vec<ImageEntry>,
    selected: Option<Uuid>,
}

impl ImageSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image from memory.
    ///
    /// Returns `Ok(None)` when an image with the same name and size is
    /// already loaded. The first image added becomes the selection.
    pub fn add_bytes(
        &mut self,
        file_name: &str,
        data: &[u8],
    ) -> Result<Option<Uuid>, SessionError> {
        let format = sniff_format(file_name, data).map_err(|e| {
            tracing::warn!(file_name = %file_name, "{}", e);
            e
        })?;

        let byte_size = data.len() as u64;
        if self
            .entries
            .iter()
            .any(|e| e.file_name() == file_name && e.byte_size == byte_size)
        {
            tracing::debug!(file_name = %file_name, "Image already loaded, ignoring");
            return Ok(None);
        }

        let decoded = image::load_from_memory_with_format(data, format).map_err(|e| {
            let err = SessionError::DecodeFailed {
                file_name: file_name.to_string(),
                message: e.to_string(),
            };
            tracing::error!(file_name = %file_name, "{}", err);
            err
        })?;

        let entry = ImageEntry {
            id: Uuid::new_v4(),
            byte_size,
            mime: accepted_mime(format).unwrap_or("image/png"),
            image: SourceImage::from_dynamic(&decoded, file_name),
        };
        let id = entry.id;

        tracing::info!(
            id = %id,
            file_name = %file_name,
            width = entry.image.width(),
            height = entry.image.height(),
            "Image added"
        );
        self.entries.push(entry);
        if self.selected.is_none() {
            self.selected = Some(id);
        }
        Ok(Some(id))
    }

    /// Read and add an image file.
    pub async fn add_file(&mut self, path: &Path) -> Result<Option<Uuid>, SessionError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| SessionError::ReadFailed {
                file_name: file_name.clone(),
                message: e.to_string(),
            })?;
        self.add_bytes(&file_name, &data)
    }

    /// Remove an image. Removing the selection selects the first remaining
    /// image.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;

        if removed && self.selected == Some(id) {
            self.selected = self.entries.first().map(|e| e.id);
        }
        removed
    }

    pub fn select(&mut self, id: Uuid) -> Result<(), SessionError> {
        if self.get(id).is_none() {
            return Err(SessionError::NotFound(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&ImageEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn selected(&self) -> Option<&ImageEntry> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn images(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
