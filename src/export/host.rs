//! Host trait for export operations
//!
//! The export strategy never touches a window, a document or a filesystem
//! directly. Everything it needs from the hosting runtime goes through
//! `ExportHost`, so a browser binding, a native filesystem host and the
//! in-memory test host all share the same plan walker.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task::JoinHandle;

use super::capabilities::RuntimeProbe;
use super::error::ExportError;
use crate::constants::{DOWNLOAD_RELEASE_DELAY, VIEWER_RELEASE_DELAY};

/// Handle to binary data registered with the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations the hosting runtime provides to the export strategy
#[async_trait]
pub trait ExportHost: Send + Sync {
    /// Snapshot of the runtime, taken fresh for every export
    fn probe(&self) -> RuntimeProbe;

    /// Open a new viewer showing `html`. Fails with `ViewerBlocked` when
    /// the runtime refuses (popup blockers).
    async fn open_viewer(&self, title: &str, html: &str) -> Result<(), ExportError>;

    /// Point the current context at `url`
    async fn navigate(&self, url: &str, suggested_name: &str) -> Result<(), ExportError>;

    /// Register binary data and return a URL for it
    async fn create_object_url(&self, data: Bytes, mime: &str) -> Result<ObjectUrl, ExportError>;

    /// Release a URL created by `create_object_url`. Unknown URLs are ignored.
    async fn revoke_object_url(&self, url: &ObjectUrl);

    /// Trigger a download of `href` saved as `file_name`
    async fn click_download(&self, href: &str, file_name: &str) -> Result<(), ExportError>;
}

/// How long an object URL must outlive the action that used it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePolicy {
    /// The runtime has started reading the download
    AfterDownload,
    /// A viewer may still be displaying the URL
    AfterViewer,
}

impl ReleasePolicy {
    pub fn delay(self) -> Duration {
        match self {
            ReleasePolicy::AfterDownload => DOWNLOAD_RELEASE_DELAY,
            ReleasePolicy::AfterViewer => VIEWER_RELEASE_DELAY,
        }
    }
}

/// An object URL that is revoked exactly once.
///
/// Release it explicitly with `release_now` or `release_after`. A lease that
/// is dropped while still holding its URL schedules an immediate revoke on
/// the current runtime.
pub struct ObjectUrlLease {
    host: Arc<dyn ExportHost>,
    url: Option<ObjectUrl>,
}

impl fmt::Debug for ObjectUrlLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectUrlLease").field("url", &self.url).finish()
    }
}

impl ObjectUrlLease {
    /// Register `data` with the host.
    pub async fn acquire(
        host: Arc<dyn ExportHost>,
        data: Bytes,
        mime: &str,
    ) -> Result<Self, ExportError> {
        let url = host.create_object_url(data, mime).await?;
        tracing::trace!(url = %url, "Object URL acquired");
        Ok(Self {
            host,
            url: Some(url),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_ref().map(ObjectUrl::as_str).unwrap_or_default()
    }

    pub async fn release_now(mut self) {
        if let Some(url) = self.url.take() {
            self.host.revoke_object_url(&url).await;
        }
    }

    /// Revoke after `delay` on a background task.
    pub fn release_after(mut self, delay: Duration) -> JoinHandle<()> {
        let host = Arc::clone(&self.host);
        let url = self.url.take();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(url) = url {
                host.revoke_object_url(&url).await;
                tracing::trace!(url = %url, "Object URL released");
            }
        })
    }

    pub fn release_with(self, policy: ReleasePolicy) -> JoinHandle<()> {
        self.release_after(policy.delay())
    }
}

impl Drop for ObjectUrlLease {
    fn drop(&mut self) {
        let Some(url) = self.url.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let host = Arc::clone(&self.host);
                handle.spawn(async move { host.revoke_object_url(&url).await });
            }
            Err(_) => {
                tracing::warn!(url = %url, "Object URL dropped outside a runtime and was not revoked");
            }
        }
    }
}
