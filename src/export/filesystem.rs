//! Native filesystem export host
//!
//! Downloads become files in an output directory. Object URLs are kept in
//! an in-process registry until revoked. A viewer becomes an `.html` file
//! next to the downloads.
//!
//! A host never overwrites: when the requested name was already written in
//! this session or exists on disk, a numeric suffix is added
//! (`watermarked_photo_1.png`, `watermarked_photo_2.png`, ...).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use uuid::Uuid;

use super::capabilities::RuntimeProbe;
use super::encoder::decode_data_url;
use super::error::ExportError;
use super::filename::split_file_name;
use super::host::{ExportHost, ObjectUrl};

const OBJECT_URL_SCHEME: &str = "blob:tilemark/";

/// Export host writing into a directory
#[derive(Clone)]
pub struct FilesystemHost {
    output_dir: PathBuf,
    probe: RuntimeProbe,
    object_urls: Arc<RwLock<HashMap<String, Bytes>>>,
    written: Arc<RwLock<Vec<PathBuf>>>,
    /// Paths handed out to writes, finished or in flight
    reserved: Arc<RwLock<HashSet<PathBuf>>>,
}

impl std::fmt::Debug for FilesystemHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemHost")
            .field("output_dir", &self.output_dir)
            .field("live_object_urls", &self.object_urls.read().len())
            .finish()
    }
}

impl FilesystemHost {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_probe(output_dir, RuntimeProbe::desktop())
    }

    /// Host that reports `probe` to the export strategy. Lets a native run
    /// take the mobile or restricted export paths.
    pub fn with_probe(output_dir: impl Into<PathBuf>, probe: RuntimeProbe) -> Self {
        Self {
            output_dir: output_dir.into(),
            probe,
            object_urls: Arc::new(RwLock::new(HashMap::new())),
            written: Arc::new(RwLock::new(Vec::new())),
            reserved: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Every file written so far, in order
    pub fn written_files(&self) -> Vec<PathBuf> {
        self.written.read().clone()
    }

    pub fn live_object_urls(&self) -> usize {
        self.object_urls.read().len()
    }

    fn resolve(&self, href: &str) -> Result<Bytes, ExportError> {
        if href.starts_with(OBJECT_URL_SCHEME) {
            return self
                .object_urls
                .read()
                .get(href)
                .cloned()
                .ok_or_else(|| ExportError::invalid_url(href));
        }
        decode_data_url(href)
            .map(|(_, data)| Bytes::from(data))
            .ok_or_else(|| ExportError::invalid_url(href))
    }

    /// Reserve a path for `file_name` inside the output directory.
    ///
    /// Directory components are dropped. Names already reserved by this host
    /// or present on disk get the first free `_N` suffix.
    async fn reserve_path(&self, file_name: &str) -> Result<PathBuf, ExportError> {
        let name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ExportError::download_failed(format!("invalid file name: {}", file_name))
            })?;
        let (base, ext) = split_file_name(name);

        let mut suffix = 0usize;
        loop {
            let candidate = match (suffix, ext) {
                (0, _) => name.to_string(),
                (n, Some(ext)) => format!("{}_{}.{}", base, n, ext),
                (n, None) => format!("{}_{}", base, n),
            };
            suffix += 1;

            let path = self.output_dir.join(candidate);
            if self.reserved.read().contains(&path) {
                continue;
            }
            if tokio::fs::try_exists(&path).await? {
                continue;
            }
            if self.reserved.write().insert(path.clone()) {
                return Ok(path);
            }
        }
    }

    async fn write(&self, file_name: &str, data: &[u8]) -> Result<(), ExportError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.reserve_path(file_name).await?;

        if let Err(e) = write_file_atomic(&self.output_dir, &path, data).await {
            self.reserved.write().remove(&path);
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = data.len(), "Export written");
        self.written.write().push(path);
        Ok(())
    }
}

/// Write to a uniquely named temp file in `dir`, then rename over `path`.
/// The temp file is removed when either step fails.
async fn write_file_atomic(dir: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = dir.join(format!(".tilemark-{}.tmp", Uuid::new_v4()));

    let result = match tokio::fs::write(&temp_path, data).await {
        Ok(()) => tokio::fs::rename(&temp_path, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }
    result
}

#[async_trait]
impl ExportHost for FilesystemHost {
    fn probe(&self) -> RuntimeProbe {
        self.probe.clone()
    }

    async fn open_viewer(&self, title: &str, html: &str) -> Result<(), ExportError> {
        let (base, _) = split_file_name(title);
        self.write(&format!("{}.html", base), html.as_bytes()).await
    }

    async fn navigate(&self, url: &str, suggested_name: &str) -> Result<(), ExportError> {
        let data = self.resolve(url).map_err(|e| ExportError::NavigationFailed {
            message: e.to_string(),
        })?;
        self.write(suggested_name, &data).await
    }

    async fn create_object_url(&self, data: Bytes, _mime: &str) -> Result<ObjectUrl, ExportError> {
        let url = format!("{}{}", OBJECT_URL_SCHEME, Uuid::new_v4());
        self.object_urls.write().insert(url.clone(), data);
        Ok(ObjectUrl::new(url))
    }

    async fn revoke_object_url(&self, url: &ObjectUrl) {
        self.object_urls.write().remove(url.as_str());
    }

    async fn click_download(&self, href: &str, file_name: &str) -> Result<(), ExportError> {
        let data = self.resolve(href)?;
        self.write(file_name, &data).await
    }
}
