//! In-memory export host for testing
//!
//! Records every call so tests can assert which export methods ran and in
//! what order. Failures of each host operation can be simulated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::capabilities::RuntimeProbe;
use super::error::ExportError;
use super::host::{ExportHost, ObjectUrl};

/// A call the host received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    OpenViewer { title: String },
    Navigate { url_prefix: String },
    CreateObjectUrl { url: String, len: usize },
    RevokeObjectUrl { url: String },
    ClickDownload { href_prefix: String, file_name: String },
}

/// Mock host that keeps object URLs and downloads in memory
#[derive(Clone)]
pub struct MockExportHost {
    probe: Arc<RwLock<RuntimeProbe>>,
    calls: Arc<RwLock<Vec<HostCall>>>,
    object_urls: Arc<RwLock<HashMap<String, Bytes>>>,
    downloads: Arc<RwLock<Vec<(String, String)>>>,
    viewer_pages: Arc<RwLock<Vec<String>>>,
    next_id: Arc<AtomicU64>,
    revoked: Arc<AtomicU64>,
    /// Simulate errors if true
    block_viewer: Arc<RwLock<bool>>,
    fail_navigation: Arc<RwLock<bool>>,
    fail_object_urls: Arc<RwLock<bool>>,
    fail_downloads: Arc<RwLock<bool>>,
}

impl Default for MockExportHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExportHost {
    pub fn new() -> Self {
        Self::with_probe(RuntimeProbe::desktop())
    }

    pub fn with_probe(probe: RuntimeProbe) -> Self {
        Self {
            probe: Arc::new(RwLock::new(probe)),
            calls: Arc::new(RwLock::new(Vec::new())),
            object_urls: Arc::new(RwLock::new(HashMap::new())),
            downloads: Arc::new(RwLock::new(Vec::new())),
            viewer_pages: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            revoked: Arc::new(AtomicU64::new(0)),
            block_viewer: Arc::new(RwLock::new(false)),
            fail_navigation: Arc::new(RwLock::new(false)),
            fail_object_urls: Arc::new(RwLock::new(false)),
            fail_downloads: Arc::new(RwLock::new(false)),
        }
    }

    pub fn set_probe(&self, probe: RuntimeProbe) {
        *self.probe.write() = probe;
    }

    pub fn set_viewer_blocked(&self, enabled: bool) {
        *self.block_viewer.write() = enabled;
    }

    pub fn set_navigation_fails(&self, enabled: bool) {
        *self.fail_navigation.write() = enabled;
    }

    pub fn set_object_urls_fail(&self, enabled: bool) {
        *self.fail_object_urls.write() = enabled;
    }

    pub fn set_downloads_fail(&self, enabled: bool) {
        *self.fail_downloads.write() = enabled;
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.read().clone()
    }

    /// `(href, file_name)` of every successful download
    pub fn downloads(&self) -> Vec<(String, String)> {
        self.downloads.read().clone()
    }

    pub fn viewer_pages(&self) -> Vec<String> {
        self.viewer_pages.read().clone()
    }

    pub fn live_object_urls(&self) -> usize {
        self.object_urls.read().len()
    }

    pub fn revoked_count(&self) -> u64 {
        self.revoked.load(Ordering::SeqCst)
    }

    fn record(&self, call: HostCall) {
        self.calls.write().push(call);
    }
}

fn prefix(url: &str) -> String {
    url.chars().take(22).collect()
}

#[async_trait]
impl ExportHost for MockExportHost {
    fn probe(&self) -> RuntimeProbe {
        self.probe.read().clone()
    }

    async fn open_viewer(&self, title: &str, html: &str) -> Result<(), ExportError> {
        self.record(HostCall::OpenViewer {
            title: title.to_string(),
        });
        if *self.block_viewer.read() {
            return Err(ExportError::ViewerBlocked);
        }
        self.viewer_pages.write().push(html.to_string());
        Ok(())
    }

    async fn navigate(&self, url: &str, _suggested_name: &str) -> Result<(), ExportError> {
        self.record(HostCall::Navigate {
            url_prefix: prefix(url),
        });
        if *self.fail_navigation.read() {
            return Err(ExportError::NavigationFailed {
                message: "Simulated navigation failure".to_string(),
            });
        }
        Ok(())
    }

    async fn create_object_url(&self, data: Bytes, _mime: &str) -> Result<ObjectUrl, ExportError> {
        if *self.fail_object_urls.read() {
            return Err(ExportError::ObjectUrlUnavailable {
                message: "Simulated object URL failure".to_string(),
            });
        }
        let url = format!("blob:mock/{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.record(HostCall::CreateObjectUrl {
            url: url.clone(),
            len: data.len(),
        });
        self.object_urls.write().insert(url.clone(), data);
        Ok(ObjectUrl::new(url))
    }

    async fn revoke_object_url(&self, url: &ObjectUrl) {
        self.record(HostCall::RevokeObjectUrl {
            url: url.to_string(),
        });
        if self.object_urls.write().remove(url.as_str()).is_some() {
            self.revoked.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn click_download(&self, href: &str, file_name: &str) -> Result<(), ExportError> {
        self.record(HostCall::ClickDownload {
            href_prefix: prefix(href),
            file_name: file_name.to_string(),
        });
        if *self.fail_downloads.read() {
            return Err(ExportError::download_failed("Simulated download failure"));
        }
        if href.starts_with("blob:") && !self.object_urls.read().contains_key(href) {
            return Err(ExportError::invalid_url(href));
        }
        self.downloads
            .write()
            .push((href.to_string(), file_name.to_string()));
        Ok(())
    }
}
