//! Export file naming
//!
//! `photo.jpg` becomes `watermarked_photo.jpg`; with timestamps enabled it
//! becomes `watermarked_photo_2025-01-31T08-15-42.jpg`. Names without an
//! extension are exported as PNG.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EXTENSION, DEFAULT_FILE_PREFIX};

/// Split a file name into base and extension at the last dot.
///
/// Leading dots (`.hidden`) and trailing dots (`photo.`) do not count as an
/// extension separator. Directory components are dropped.
pub fn split_file_name(name: &str) -> (&str, Option<&str>) {
    let name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);

    match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && !ext.is_empty() => (base, Some(ext)),
        _ => (name, None),
    }
}

/// `photo.jpg` -> `watermarked_photo.jpg`
pub fn generate_file_name(original_name: &str) -> String {
    FileNamer::default().name_at(original_name, Utc::now())
}

/// `photo.jpg` -> `{prefix}_photo_2025-01-31T08-15-42.jpg`
pub fn generate_timestamped_file_name(
    original_name: &str,
    prefix: &str,
    now: DateTime<Utc>,
) -> String {
    FileNamer::default()
        .with_prefix(prefix)
        .timestamped(true)
        .name_at(original_name, now)
}

/// Builds export file names from the source image name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNamer {
    /// Prefix joined to the base name with an underscore
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Append an ISO-8601 timestamp (colons replaced by dashes)
    #[serde(default)]
    pub timestamped: bool,
}

fn default_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

impl Default for FileNamer {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            timestamped: false,
        }
    }
}

impl FileNamer {
    pub fn timestamped(mut self, enabled: bool) -> Self {
        self.timestamped = enabled;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn name_for(&self, original_name: &str) -> String {
        self.name_at(original_name, Utc::now())
    }

    /// Name for an export taken at `now`.
    pub fn name_at(&self, original_name: &str, now: DateTime<Utc>) -> String {
        let (base, ext) = split_file_name(original_name);
        let ext = ext.unwrap_or(DEFAULT_EXTENSION);

        let mut name = String::with_capacity(self.prefix.len() + base.len() + ext.len() + 24);
        if !self.prefix.is_empty() {
            name.push_str(&self.prefix);
            name.push('_');
        }
        name.push_str(base);
        if self.timestamped {
            name.push('_');
            name.push_str(&now.format("%Y-%m-%dT%H-%M-%S").to_string());
        }
        name.push('.');
        name.push_str(ext);
        name
    }
}
