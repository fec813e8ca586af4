//! Capability-aware image export.
//!
//! Hands a composited surface to the user in whatever way the hosting
//! runtime supports: a direct download, an object URL download, or a viewer
//! page the user saves from manually.
//!
//! # Features
//!
//! - **Capability detection** from a `RuntimeProbe` snapshot, taken per export
//! - **Ordered fallback** across export methods; an export never errors
//! - **Deferred object URL release** so in-flight downloads stay valid
//! - **Filesystem host** for native runs, writing into an output directory
//!
//! # Configuration Example
//!
//! ```yaml
//! export:
//!   output_dir: "./watermarked"
//!   file_prefix: "watermarked"
//!   timestamped: false
//!   environment:
//!     user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"
//!     location_protocol: "https:"
//! ```

pub mod capabilities;
pub mod encoder;
pub mod error;
pub mod filename;
pub mod filesystem;
pub mod host;
pub mod mock_host;
pub mod strategy;
pub mod viewer;

// Re-export main types for convenience
pub use capabilities::{detect_capabilities, EnvironmentCapabilities, RuntimeProbe};
pub use encoder::{encode_blob, encode_data_url, encode_png, EncodedImage};
pub use error::ExportError;
pub use filename::{generate_file_name, generate_timestamped_file_name, FileNamer};
pub use filesystem::FilesystemHost;
pub use host::{ExportHost, ObjectUrl, ObjectUrlLease, ReleasePolicy};
pub use mock_host::MockExportHost;
pub use strategy::{
    select_plan, ExportMethod, ExportPlan, ExportProgress, ExportReport, Exporter,
    ProgressCallback,
};
pub use viewer::render_viewer_page;
