//! Runtime capability detection
//!
//! The hosting runtime is described by a `RuntimeProbe` snapshot (user agent,
//! page protocol, feature flags). `detect_capabilities` turns a probe into
//! the flags the export strategy branches on. It is a pure function so the
//! export path can be driven with any environment in tests.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static MOBILE_UA: OnceLock<Regex> = OnceLock::new();
static IOS_UA: OnceLock<Regex> = OnceLock::new();

fn mobile_pattern() -> &'static Regex {
    MOBILE_UA.get_or_init(|| {
        Regex::new(r"(?i)android|webos|iphone|ipod|blackberry|iemobile|opera mini|mobile")
            .expect("mobile user agent pattern is valid")
    })
}

fn ios_pattern() -> &'static Regex {
    IOS_UA.get_or_init(|| Regex::new(r"iPad|iPhone|iPod").expect("iOS user agent pattern is valid"))
}

fn default_protocol() -> String {
    "https:".to_string()
}

fn default_true() -> bool {
    true
}

/// Raw facts about the hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeProbe {
    /// User agent string
    #[serde(default)]
    pub user_agent: String,

    /// Protocol the page was served from, e.g. "https:" or "file:"
    #[serde(default = "default_protocol")]
    pub location_protocol: String,

    /// The runtime can construct binary blobs
    #[serde(default = "default_true")]
    pub has_blob: bool,

    /// The runtime can create object URLs for blobs
    #[serde(default = "default_true")]
    pub has_object_url: bool,

    /// Hyperlinks honor the `download` attribute
    #[serde(default = "default_true")]
    pub anchor_supports_download: bool,
}

impl Default for RuntimeProbe {
    fn default() -> Self {
        Self::desktop()
    }
}

impl RuntimeProbe {
    /// A fully capable desktop browser served over HTTPS.
    pub fn desktop() -> Self {
        Self::from_user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
        )
    }

    /// A fully capable runtime with the given user agent.
    pub fn from_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            location_protocol: default_protocol(),
            has_blob: true,
            has_object_url: true,
            anchor_supports_download: true,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.location_protocol = protocol.into();
        self
    }

    pub fn with_object_urls(mut self, supported: bool) -> Self {
        self.has_object_url = supported;
        self
    }

    pub fn with_blob(mut self, supported: bool) -> Self {
        self.has_blob = supported;
        self
    }

    pub fn with_anchor_download(mut self, supported: bool) -> Self {
        self.anchor_supports_download = supported;
        self
    }
}

/// Capability flags derived from a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvironmentCapabilities {
    /// Embedded web view, local file page, or no object URL support
    pub is_restricted_web_view: bool,
    /// User agent names a mobile device
    pub is_mobile: bool,
    /// Blobs and object URLs are both available
    pub supports_blob_object_urls: bool,
    /// Hyperlinks honor the `download` attribute
    pub supports_anchor_download: bool,
    pub is_ios: bool,
    pub is_android: bool,
}

/// Derive capability flags from a runtime probe.
pub fn detect_capabilities(probe: &RuntimeProbe) -> EnvironmentCapabilities {
    let ua = probe.user_agent.as_str();
    let is_android = ua.contains("Android");

    let is_restricted_web_view = ua.contains("wv")
        || (is_android && ua.contains("Version/"))
        || probe.location_protocol.eq_ignore_ascii_case("file:")
        || !probe.has_object_url;

    EnvironmentCapabilities {
        is_restricted_web_view,
        is_mobile: mobile_pattern().is_match(ua),
        supports_blob_object_urls: probe.has_blob && probe.has_object_url,
        supports_anchor_download: probe.anchor_supports_download,
        is_ios: ios_pattern().is_match(ua),
        is_android,
    }
}
