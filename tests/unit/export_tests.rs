// Export strategy tests against the in-memory host

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use rstest::rstest;
use tilemark::export::mock_host::HostCall;
use tilemark::export::{
    detect_capabilities, select_plan, EnvironmentCapabilities, ExportHost, ExportMethod,
    ExportProgress, Exporter, MockExportHost, RuntimeProbe,
};
use tilemark::watermark::{CompositeSurface, SourceImage};

const ANDROID_WEBVIEW: &str = "Mozilla/5.0 (Linux; Android 13; SM-S911B; wv) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/119.0 Mobile Safari/537.36";
const ANDROID_BROWSER: &str = "Mozilla/5.0 (Linux; Android 13; SM-S911B) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 SamsungBrowser/23.0 Chrome/115.0 Mobile Safari/537.36";
const IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";

fn surface() -> CompositeSurface {
    let source = SourceImage::new(
        RgbaImage::from_pixel(12, 8, Rgba([0, 128, 255, 255])),
        "photo.jpg",
    );
    let mut surface = CompositeSurface::new();
    surface.reset_to(&source);
    surface
}

fn exporter(host: &Arc<MockExportHost>) -> Exporter {
    let dyn_host: Arc<dyn ExportHost> = host.clone();
    Exporter::new(dyn_host)
}

#[rstest]
#[case(RuntimeProbe::desktop(), ExportMethod::DataUrlDownload)]
#[case(RuntimeProbe::from_user_agent(IPAD), ExportMethod::ObjectUrlDownload)]
#[case(RuntimeProbe::from_user_agent(ANDROID_WEBVIEW), ExportMethod::DataUrlViewer)]
#[case(RuntimeProbe::from_user_agent(ANDROID_BROWSER), ExportMethod::DataUrlViewer)]
#[case(RuntimeProbe::desktop().with_protocol("file:"), ExportMethod::DataUrlViewer)]
#[case(RuntimeProbe::from_user_agent(IPAD).with_blob(false), ExportMethod::DataUrlDownload)]
fn test_first_method_for_runtime(#[case] probe: RuntimeProbe, #[case] expected: ExportMethod) {
    let plan = select_plan(&detect_capabilities(&probe));
    assert_eq!(plan.first(), Some(expected));
}

#[test]
fn test_selection_is_deterministic() {
    let caps = EnvironmentCapabilities {
        is_restricted_web_view: true,
        is_mobile: true,
        supports_blob_object_urls: true,
        supports_anchor_download: true,
        is_ios: true,
        is_android: false,
    };
    let first = select_plan(&caps);
    for _ in 0..10 {
        assert_eq!(select_plan(&caps), first);
    }
}

#[tokio::test]
async fn test_progress_is_reported_before_each_attempt() {
    let host = Arc::new(MockExportHost::with_probe(RuntimeProbe::from_user_agent(IPAD)));
    host.set_downloads_fail(true);

    let messages = Mutex::new(Vec::new());
    let callback = |p: &ExportProgress| messages.lock().push(p.to_string());
    let saved = exporter(&host)
        .export_surface(&surface(), "photo.jpg", Some(&callback))
        .await;

    assert!(!saved);
    assert_eq!(
        *messages.lock(),
        vec![
            "Preparing download...".to_string(),
            "Using mobile-optimized mode...".to_string(),
            "Falling back to compatibility mode...".to_string(),
            "Download failed, please try again".to_string(),
        ]
    );

    let clicks = host
        .calls()
        .into_iter()
        .filter(|c| matches!(c, HostCall::ClickDownload { .. }))
        .count();
    assert_eq!(clicks, 2);
}

#[tokio::test]
async fn test_capabilities_are_detected_per_call() {
    let host = Arc::new(MockExportHost::new());
    let exporter = exporter(&host);

    let first = exporter
        .export_with_report(&surface(), "photo.jpg", None)
        .await;
    assert_eq!(first.method, Some(ExportMethod::DataUrlDownload));

    host.set_probe(RuntimeProbe::desktop().with_object_urls(false));
    let second = exporter
        .export_with_report(&surface(), "photo.jpg", None)
        .await;
    assert_eq!(second.method, Some(ExportMethod::DataUrlViewer));
}

#[tokio::test]
async fn test_export_without_progress_callback() {
    let host = Arc::new(MockExportHost::new());
    assert!(exporter(&host).export_surface(&surface(), "a.gif", None).await);
    assert_eq!(host.downloads()[0].1, "watermarked_a.gif");
}
