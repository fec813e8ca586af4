//! Capability-aware export strategy
//!
//! Picks an ordered list of export methods for the detected runtime and
//! tries them in turn until one succeeds.
//!
//! # Policy
//!
//! 1. Restricted web view: show the image in a viewer page built around a
//!    data URL. If the viewer is blocked, navigate the current context to
//!    the data URL instead.
//! 2. Mobile with object URLs: download through an object URL, released
//!    shortly after the click. Falls through to 3 on failure.
//! 3. Everything else: download a data URL directly.
//!
//! # Example
//!
//! ```ignore
//! use tilemark::export::{Exporter, FilesystemHost};
//!
//! let exporter = Exporter::new(Arc::new(FilesystemHost::new("out")));
//! let saved = exporter
//!     .export_surface(&surface, "photo.jpg", Some(&|p| println!("{}", p)))
//!     .await;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::capabilities::{detect_capabilities, EnvironmentCapabilities};
use super::encoder::{encode_blob, encode_data_url};
use super::error::ExportError;
use super::filename::FileNamer;
use super::host::{ExportHost, ObjectUrlLease, ReleasePolicy};
use super::viewer::render_viewer_page;
use crate::watermark::CompositeSurface;

/// Observer for human-readable export progress
pub type ProgressCallback<'a> = &'a (dyn Fn(&ExportProgress) + Send + Sync);

/// A single way of handing the image to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportMethod {
    /// Viewer page around a data URL, navigating to the data URL if blocked
    DataUrlViewer,
    /// Download through an object URL
    ObjectUrlDownload,
    /// Download of a data URL
    DataUrlDownload,
}

impl ExportMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportMethod::DataUrlViewer => "data_url_viewer",
            ExportMethod::ObjectUrlDownload => "object_url_download",
            ExportMethod::DataUrlDownload => "data_url_download",
        }
    }
}

impl fmt::Display for ExportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered methods to attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    methods: Vec<ExportMethod>,
}

impl ExportPlan {
    pub fn methods(&self) -> &[ExportMethod] {
        &self.methods
    }

    pub fn first(&self) -> Option<ExportMethod> {
        self.methods.first().copied()
    }
}

/// Choose the export methods for a runtime. First applicable branch wins.
pub fn select_plan(caps: &EnvironmentCapabilities) -> ExportPlan {
    let methods = if caps.is_restricted_web_view {
        vec![ExportMethod::DataUrlViewer]
    } else if caps.is_mobile && caps.supports_blob_object_urls {
        vec![ExportMethod::ObjectUrlDownload, ExportMethod::DataUrlDownload]
    } else {
        vec![ExportMethod::DataUrlDownload]
    };
    ExportPlan { methods }
}

/// Status reported to the caller during an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportProgress {
    Preparing,
    RestrictedMode,
    MobileOptimized,
    StandardDownload,
    FallingBack,
    ViewerBlocked,
    Succeeded(ExportMethod),
    Failed,
}

impl fmt::Display for ExportProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportProgress::Preparing => write!(f, "Preparing download..."),
            ExportProgress::RestrictedMode => {
                write!(f, "Using compatibility mode for embedded browsers...")
            }
            ExportProgress::MobileOptimized => write!(f, "Using mobile-optimized mode..."),
            ExportProgress::StandardDownload => write!(f, "Starting download..."),
            ExportProgress::FallingBack => write!(f, "Falling back to compatibility mode..."),
            ExportProgress::ViewerBlocked => {
                write!(f, "Viewer blocked, opening the image directly...")
            }
            ExportProgress::Succeeded(ExportMethod::DataUrlViewer) => {
                write!(f, "Image opened, long-press it to save")
            }
            ExportProgress::Succeeded(_) => write!(f, "Download started"),
            ExportProgress::Failed => write!(f, "Download failed, please try again"),
        }
    }
}

/// Outcome of one export call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub success: bool,
    /// Method that succeeded
    pub method: Option<ExportMethod>,
    pub file_name: String,
    /// Methods attempted, in order
    pub attempted: Vec<ExportMethod>,
}

/// Runs export plans against a host
#[derive(Clone)]
pub struct Exporter {
    host: Arc<dyn ExportHost>,
    namer: FileNamer,
    download_release: Duration,
}

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter")
            .field("namer", &self.namer)
            .field("download_release", &self.download_release)
            .finish()
    }
}

impl Exporter {
    pub fn new(host: Arc<dyn ExportHost>) -> Self {
        Self {
            host,
            namer: FileNamer::default(),
            download_release: ReleasePolicy::AfterDownload.delay(),
        }
    }

    pub fn with_file_namer(mut self, namer: FileNamer) -> Self {
        self.namer = namer;
        self
    }

    pub fn with_download_release(mut self, delay: Duration) -> Self {
        self.download_release = delay;
        self
    }

    pub fn host(&self) -> &Arc<dyn ExportHost> {
        &self.host
    }

    /// Save or display `surface`. Returns `false` only when every method in
    /// the plan failed.
    pub async fn export_surface(
        &self,
        surface: &CompositeSurface,
        original_name: &str,
        progress: Option<ProgressCallback<'_>>,
    ) -> bool {
        self.export_with_report(surface, original_name, progress)
            .await
            .success
    }

    pub async fn export_with_report(
        &self,
        surface: &CompositeSurface,
        original_name: &str,
        progress: Option<ProgressCallback<'_>>,
    ) -> ExportReport {
        let report = |p: ExportProgress| {
            if let Some(callback) = progress {
                callback(&p);
            }
        };

        let caps = detect_capabilities(&self.host.probe());
        let plan = select_plan(&caps);
        let file_name = self.namer.name_for(original_name);
        let mut attempted = Vec::with_capacity(plan.methods().len());

        tracing::info!(
            file_name = %file_name,
            restricted = caps.is_restricted_web_view,
            mobile = caps.is_mobile,
            plan = ?plan.methods(),
            "Exporting image"
        );
        report(ExportProgress::Preparing);

        for (index, method) in plan.methods().iter().copied().enumerate() {
            report(announce(method, index > 0));
            attempted.push(method);

            let result = match method {
                ExportMethod::DataUrlViewer => {
                    self.open_in_viewer(surface, &file_name, &report).await
                }
                ExportMethod::ObjectUrlDownload => {
                    self.download_object_url(surface, &file_name).await
                }
                ExportMethod::DataUrlDownload => self.download_data_url(surface, &file_name).await,
            };

            match result {
                Ok(()) => {
                    tracing::info!(method = %method, file_name = %file_name, "Export succeeded");
                    report(ExportProgress::Succeeded(method));
                    return ExportReport {
                        success: true,
                        method: Some(method),
                        file_name,
                        attempted,
                    };
                }
                Err(e) => {
                    tracing::warn!(method = %method, error = %e, "Export method failed");
                }
            }
        }

        tracing::error!(file_name = %file_name, "All export methods failed");
        report(ExportProgress::Failed);
        ExportReport {
            success: false,
            method: None,
            file_name,
            attempted,
        }
    }

    async fn open_in_viewer(
        &self,
        surface: &CompositeSurface,
        file_name: &str,
        report: &(dyn Fn(ExportProgress) + Send + Sync),
    ) -> Result<(), ExportError> {
        let data_url = encode_data_url(surface)?;
        let page = render_viewer_page(&data_url, file_name);

        match self.host.open_viewer(file_name, &page).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(error = %e, "Viewer unavailable, navigating to data URL");
                report(ExportProgress::ViewerBlocked);
                self.host.navigate(&data_url, file_name).await
            }
        }
    }

    async fn download_object_url(
        &self,
        surface: &CompositeSurface,
        file_name: &str,
    ) -> Result<(), ExportError> {
        let encoded = encode_blob(surface).await?;
        let lease =
            ObjectUrlLease::acquire(Arc::clone(&self.host), encoded.data, encoded.content_type)
                .await?;

        match self.host.click_download(lease.url(), file_name).await {
            Ok(()) => {
                let _ = lease.release_after(self.download_release);
                Ok(())
            }
            Err(e) => {
                lease.release_now().await;
                Err(e)
            }
        }
    }

    async fn download_data_url(
        &self,
        surface: &CompositeSurface,
        file_name: &str,
    ) -> Result<(), ExportError> {
        let data_url = encode_data_url(surface)?;
        self.host.click_download(&data_url, file_name).await
    }
}

fn announce(method: ExportMethod, is_fallback: bool) -> ExportProgress {
    match method {
        ExportMethod::DataUrlViewer => ExportProgress::RestrictedMode,
        ExportMethod::ObjectUrlDownload => ExportProgress::MobileOptimized,
        ExportMethod::DataUrlDownload if is_fallback => ExportProgress::FallingBack,
        ExportMethod::DataUrlDownload => ExportProgress::StandardDownload,
    }
}
