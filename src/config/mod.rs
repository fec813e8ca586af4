// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_FILE_PREFIX, DEFAULT_LOG_LEVEL, DEFAULT_OUTPUT_DIR};
use crate::export::{FileNamer, RuntimeProbe};
use crate::watermark::WatermarkSpec;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watermark: WatermarkSpec,
    #[serde(default)]
    pub font: FontConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Font used to rasterize the watermark text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontConfig {
    /// TrueType/OpenType font file. System fonts are searched when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

/// Where and how exported images are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving downloads (default: ./watermarked)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Prefix joined to the original file name (default: watermarked)
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Append a timestamp to exported names (default: false)
    #[serde(default)]
    pub timestamped: bool,

    /// Runtime reported to the export strategy (default: desktop browser)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<RuntimeProbe>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            timestamped: false,
            environment: None,
        }
    }
}

impl ExportConfig {
    pub fn file_namer(&self) -> FileNamer {
        FileNamer::default()
            .with_prefix(self.file_prefix.clone())
            .timestamped(self.timestamped)
    }

    pub fn probe(&self) -> RuntimeProbe {
        self.environment.clone().unwrap_or_default()
    }

    /// Report `user_agent` to the export strategy. Other configured probe
    /// fields are kept.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        let mut probe = self.probe();
        probe.user_agent = user_agent.into();
        self.environment = Some(probe);
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output (default)
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "tilemark=debug" (RUST_LOG wins)
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document means all defaults
        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.watermark.validate().map_err(|e| e.to_string())?;

        if let Some(path) = &self.font.path {
            if path.as_os_str().is_empty() {
                return Err("Font path cannot be empty".to_string());
            }
        }

        if self.export.output_dir.as_os_str().is_empty() {
            return Err("Export output_dir cannot be empty".to_string());
        }

        if self.export.file_prefix.contains(['/', '\\']) {
            return Err(format!(
                "Export file_prefix '{}' must not contain path separators",
                self.export.file_prefix
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err("Logging level cannot be empty".to_string());
        }

        Ok(())
    }
}
