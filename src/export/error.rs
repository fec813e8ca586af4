//! Export error types
//!
//! Every variant is recoverable: the export strategy catches each one and
//! moves on to the next method in its plan.

use std::fmt;

/// Errors that can occur while handing a composited image to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Encoding the surface to PNG failed
    EncodeFailed { message: String },
    /// The host refused to open a new viewer (popup blocked)
    ViewerBlocked,
    /// Navigating the current context failed
    NavigationFailed { message: String },
    /// The host could not create an object URL
    ObjectUrlUnavailable { message: String },
    /// Triggering the download failed
    DownloadFailed { message: String },
    /// The URL is neither a live object URL nor a data URL
    InvalidUrl { url: String },
    /// Filesystem failure in a native host
    Io { message: String },
}

impl ExportError {
    pub fn encode_failed(message: impl Into<String>) -> Self {
        ExportError::EncodeFailed {
            message: message.into(),
        }
    }

    pub fn download_failed(message: impl Into<String>) -> Self {
        ExportError::DownloadFailed {
            message: message.into(),
        }
    }

    pub fn invalid_url(url: &str) -> Self {
        // Data URLs can be megabytes long
        let url = if url.len() > 64 {
            let mut end = 64;
            while !url.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &url[..end])
        } else {
            url.to_string()
        };
        ExportError::InvalidUrl { url }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io {
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EncodeFailed { message } => {
                write!(f, "Failed to encode image: {}", message)
            }
            ExportError::ViewerBlocked => write!(f, "Viewer window could not be opened"),
            ExportError::NavigationFailed { message } => {
                write!(f, "Navigation failed: {}", message)
            }
            ExportError::ObjectUrlUnavailable { message } => {
                write!(f, "Object URL unavailable: {}", message)
            }
            ExportError::DownloadFailed { message } => {
                write!(f, "Download failed: {}", message)
            }
            ExportError::InvalidUrl { url } => write!(f, "Cannot resolve URL: {}", url),
            ExportError::Io { message } => write!(f, "I/O error: {}", message),
        }
    }
}

impl std::error::Error for ExportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ExportError::encode_failed("bad buffer").to_string(),
            "Failed to encode image: bad buffer"
        );
        assert_eq!(
            ExportError::ViewerBlocked.to_string(),
            "Viewer window could not be opened"
        );
        assert_eq!(
            ExportError::download_failed("click ignored").to_string(),
            "Download failed: click ignored"
        );
        assert_eq!(
            ExportError::invalid_url("ftp://x").to_string(),
            "Cannot resolve URL: ftp://x"
        );
    }

    #[test]
    fn test_invalid_url_is_truncated() {
        let long = format!("data:image/png;base64,{}", "A".repeat(500));
        match ExportError::invalid_url(&long) {
            ExportError::InvalidUrl { url } => {
                assert!(url.len() <= 67);
                assert!(url.ends_with("..."));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_url_truncation_respects_char_boundaries() {
        let long = "啊".repeat(40);
        match ExportError::invalid_url(&long) {
            ExportError::InvalidUrl { url } => assert!(url.ends_with("...")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_io_error() {
        let err: ExportError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.to_string(), "I/O error: disk full");
    }
}
