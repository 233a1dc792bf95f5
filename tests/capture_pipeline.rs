//! Capture pipeline behavior through the surface

use async_trait::async_trait;
use snippetshot::bridge::{self, HostEndpoint, HostMessage, PresentationMessage};
use snippetshot::capture::{CaptureRequest, Rasterizer};
use snippetshot::clipboard::{ClipboardSink, NoClipboard, RgbaImage};
use snippetshot::serialize::{from_base64, SerializedImage};
use snippetshot::surface::DEFAULT_LABEL;
use snippetshot::{CaptureMode, CaptureOutcome, ClipboardPayload, Error, Surface, SurfaceConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

fn png() -> Vec<u8> {
    snippetshot::rendering::raster::rasterize(&[], 3, 2, 1)
        .unwrap()
        .png_data
}

/// Returns a fixed image, counting calls
#[derive(Default)]
struct Counting {
    calls: AtomicUsize,
}

#[async_trait]
impl Rasterizer for Counting {
    async fn rasterize(&self, _request: &CaptureRequest) -> snippetshot::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(png())
    }
}

/// Blocks until the gate is opened
#[derive(Default)]
struct Gated {
    gate: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl Rasterizer for Gated {
    async fn rasterize(&self, _request: &CaptureRequest) -> snippetshot::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(png())
    }
}

/// Never finishes
struct Stuck;

#[async_trait]
impl Rasterizer for Stuck {
    async fn rasterize(&self, _request: &CaptureRequest) -> snippetshot::Result<Vec<u8>> {
        futures::future::pending::<()>().await;
        Ok(Vec::new())
    }
}

/// Fails on the first call only
#[derive(Default)]
struct FailsOnce {
    calls: AtomicUsize,
}

#[async_trait]
impl Rasterizer for FailsOnce {
    async fn rasterize(&self, _request: &CaptureRequest) -> snippetshot::Result<Vec<u8>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(Error::RasterizationFailure("canvas tainted".into()));
        }
        Ok(png())
    }
}

#[derive(Default)]
struct RecordingClipboard {
    images: Mutex<Vec<RgbaImage>>,
}

impl ClipboardSink for RecordingClipboard {
    fn write_image(&self, image: &RgbaImage) -> snippetshot::Result<()> {
        self.images.lock().unwrap().push(image.clone());
        Ok(())
    }
}

fn config() -> SurfaceConfig {
    SurfaceConfig {
        watchdog_ms: 200,
        label_reset_ms: 100,
        ..Default::default()
    }
}

fn surface_with(
    rasterizer: Arc<dyn Rasterizer>,
    clipboard: Arc<dyn ClipboardSink>,
    config: SurfaceConfig,
) -> (Surface, HostEndpoint) {
    let (host, surface_end) = bridge::channel();
    let surface = Surface::new(config, rasterizer, clipboard, surface_end.outbox);
    surface
        .paste(&ClipboardPayload::new(
            Some("<div><div><span>    fn main() {}</span></div></div>".into()),
            Some("    fn main() {}".into()),
        ))
        .unwrap();
    (surface, host)
}

fn drain(host: &mut HostEndpoint) -> Vec<PresentationMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = host.inbox.try_recv() {
        out.push(msg);
    }
    out
}

#[tokio::test]
async fn save_sends_one_shoot_and_restores_layout() {
    let rasterizer = Arc::new(Counting::default());
    let (surface, mut host) = surface_with(rasterizer.clone(), Arc::new(NoClipboard), config());
    let before = surface.state().layout().clone();

    let outcome = surface.capture(CaptureMode::Save).await;
    assert_eq!(outcome, CaptureOutcome::Succeeded(CaptureMode::Save));
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(surface.state().layout(), &before);
    assert!(!surface.state().is_busy());

    let msgs = drain(&mut host);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        PresentationMessage::Shoot { serialized_blob } => {
            let bytes = SerializedImage::from_string(serialized_blob.clone()).to_bytes().unwrap();
            assert_eq!(bytes, png());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn saved_label_reverts_after_delay() {
    let (surface, _host) = surface_with(Arc::new(Counting::default()), Arc::new(NoClipboard), config());
    surface.capture(CaptureMode::Save).await;
    surface
        .handle_host_message(HostMessage::SaveSuccess {
            file_name: "a.png".into(),
            file_path: "/tmp/a.png".into(),
        })
        .await
        .unwrap();
    assert_eq!(surface.state().label(), "Saved!");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(surface.state().label(), DEFAULT_LABEL);
}

#[tokio::test]
async fn newer_label_cancels_pending_revert() {
    let config = SurfaceConfig {
        label_reset_ms: 300,
        ..config()
    };
    let (surface, _host) = surface_with(Arc::new(Counting::default()), Arc::new(NoClipboard), config);
    surface
        .handle_host_message(HostMessage::SaveSuccess {
            file_name: "a.png".into(),
            file_path: "a.png".into(),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    surface.handle_host_message(HostMessage::ShareSuccess).await.unwrap();

    // the first revert is due by now but must not fire
    tokio::time::sleep(Duration::from_millis(225)).await;
    assert_eq!(surface.state().label(), "Shared!");

    tokio::time::sleep(Duration::from_millis(225)).await;
    assert_eq!(surface.state().label(), DEFAULT_LABEL);
}

#[tokio::test]
async fn second_request_while_capturing_is_ignored() {
    let rasterizer = Arc::new(Gated::default());
    let (surface, mut host) = surface_with(rasterizer.clone(), Arc::new(NoClipboard), SurfaceConfig {
        watchdog_ms: 5_000,
        ..config()
    });

    let first = {
        let surface = surface.clone();
        tokio::spawn(async move { surface.capture(CaptureMode::Save).await })
    };
    while rasterizer.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert!(surface.state().is_busy());
    assert_eq!(surface.state().label(), "Capturing…");

    assert_eq!(surface.capture(CaptureMode::Save).await, CaptureOutcome::Ignored);
    assert_eq!(surface.capture(CaptureMode::Copy).await, CaptureOutcome::Ignored);
    assert!(surface.state().is_busy());
    assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);

    rasterizer.gate.notify_one();
    assert_eq!(first.await.unwrap(), CaptureOutcome::Succeeded(CaptureMode::Save));
    assert!(!surface.state().is_busy());

    let shoots = drain(&mut host)
        .into_iter()
        .filter(|m| matches!(m, PresentationMessage::Shoot { .. }))
        .count();
    assert_eq!(shoots, 1);
}

#[tokio::test]
async fn watchdog_times_out_and_unblocks() {
    let (surface, mut host) = surface_with(Arc::new(Stuck), Arc::new(NoClipboard), config());
    let before = surface.state().layout().clone();

    let outcome = surface.capture(CaptureMode::Save).await;
    assert_eq!(outcome, CaptureOutcome::TimedOut);
    assert!(!surface.state().is_busy());
    assert_eq!(surface.state().layout(), &before);
    assert_eq!(surface.state().label(), DEFAULT_LABEL);

    let msgs = drain(&mut host);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        PresentationMessage::ExportError { message } => assert!(message.contains("timed out")),
        other => panic!("unexpected {:?}", other),
    }

    // the pipeline accepts new work afterwards
    assert_eq!(surface.capture(CaptureMode::Save).await, CaptureOutcome::TimedOut);
}

#[tokio::test]
async fn failure_reports_once_then_retry_succeeds() {
    let (surface, mut host) = surface_with(Arc::new(FailsOnce::default()), Arc::new(NoClipboard), config());
    let before = surface.state().layout().clone();

    let outcome = surface.capture(CaptureMode::Save).await;
    assert!(matches!(outcome, CaptureOutcome::Failed(Error::RasterizationFailure(_))));
    assert_eq!(surface.state().layout(), &before);
    assert!(!surface.state().is_busy());

    let msgs = drain(&mut host);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(msgs[0], PresentationMessage::ExportError { .. }));

    assert_eq!(
        surface.capture(CaptureMode::Save).await,
        CaptureOutcome::Succeeded(CaptureMode::Save)
    );
    assert!(matches!(drain(&mut host)[..], [PresentationMessage::Shoot { .. }]));
}

#[tokio::test]
async fn copy_writes_clipboard_without_host_save() {
    let clipboard = Arc::new(RecordingClipboard::default());
    let (surface, mut host) = surface_with(Arc::new(Counting::default()), clipboard.clone(), config());

    let outcome = surface.capture(CaptureMode::Copy).await;
    assert_eq!(outcome, CaptureOutcome::Succeeded(CaptureMode::Copy));
    assert_eq!(surface.state().label(), "Copied!");

    let images = clipboard.images.lock().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!((images[0].width, images[0].height), (3, 2));

    let msgs = drain(&mut host);
    assert!(matches!(msgs[..], [PresentationMessage::CopySuccess { .. }]));
}

#[tokio::test]
async fn missing_clipboard_is_a_copy_error_not_a_save() {
    let (surface, mut host) = surface_with(Arc::new(Counting::default()), Arc::new(NoClipboard), config());

    let outcome = surface.capture(CaptureMode::Copy).await;
    assert!(matches!(outcome, CaptureOutcome::Failed(Error::ClipboardUnavailable(_))));

    let msgs = drain(&mut host);
    assert_eq!(msgs.len(), 1);
    assert!(matches!(msgs[0], PresentationMessage::CopyError { .. }));
}

#[tokio::test]
async fn share_sends_base64_and_clipboard_status() {
    let (surface, mut host) = surface_with(Arc::new(Counting::default()), Arc::new(NoClipboard), config());
    assert_eq!(
        surface.capture(CaptureMode::Share).await,
        CaptureOutcome::Succeeded(CaptureMode::Share)
    );

    match drain(&mut host).as_slice() {
        [PresentationMessage::ShareToTwitter {
            image_data,
            text,
            image_copied_to_clipboard,
        }] => {
            assert_eq!(from_base64(image_data).unwrap(), png());
            assert_eq!(text, &SurfaceConfig::default().share_caption);
            assert!(!image_copied_to_clipboard);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn invalid_paste_keeps_content_and_notifies_host() {
    let (surface, mut host) = surface_with(Arc::new(Counting::default()), Arc::new(NoClipboard), config());
    let before = surface.state().content().to_string();

    let changed = surface
        .paste(&ClipboardPayload::new(Some("plain words".into()), Some("plain words".into())))
        .unwrap();
    assert!(!changed);
    assert_eq!(surface.state().content(), before);
    assert_eq!(drain(&mut host), vec![PresentationMessage::InvalidPasteContent]);
}

#[tokio::test]
async fn paste_applies_detected_background() {
    let (surface, _host) = surface_with(Arc::new(Counting::default()), Arc::new(NoClipboard), config());
    surface
        .paste(&ClipboardPayload::new(
            Some("<div style=\"background-color: #1e1e1e;\"><div><span>x</span></div></div>".into()),
            Some("x".into()),
        ))
        .unwrap();
    let state = surface.state();
    assert_eq!(state.layout().snippet.get("background-color"), Some("#1e1e1e"));
    assert_eq!(state.saved_content(), Some(state.content()));
}

#[tokio::test]
async fn rasterizer_sees_export_layout_without_toolbar() {
    struct Inspect(Mutex<Option<CaptureRequest>>);

    #[async_trait]
    impl Rasterizer for Inspect {
        async fn rasterize(&self, request: &CaptureRequest) -> snippetshot::Result<Vec<u8>> {
            *self.0.lock().unwrap() = Some(request.clone());
            Ok(png())
        }
    }

    let inspect = Arc::new(Inspect(Mutex::new(None)));
    let (surface, _host) = surface_with(inspect.clone(), Arc::new(NoClipboard), config());
    surface.set_line_numbers(true);
    surface.capture(CaptureMode::Save).await;

    let request = inspect.0.lock().unwrap().take().unwrap();
    let container = request.region.elements().next().unwrap();
    assert_eq!(container.attr("id"), Some("snippet-container"));
    assert_eq!(container.style().get("padding"), Some("32px"));
    assert_eq!(container.style().get("display"), Some("inline-block"));
    let toolbar = container.child_elements().find(|el| el.has_class("toolbar")).unwrap();
    assert!((request.exclude)(toolbar));
    assert!(request.region.to_html().contains("class=\"line-number\""));
    assert_eq!(request.scale, 2);

    // the live layout is back to normal
    assert_eq!(surface.state().layout().container.get("padding"), Some("16px"));
}

#[tokio::test]
async fn dropped_capture_releases_the_surface() {
    let (surface, mut host) = surface_with(Arc::new(Stuck), Arc::new(NoClipboard), config());
    let before = surface.state().layout().clone();

    let cancelled =
        tokio::time::timeout(Duration::from_millis(20), surface.capture(CaptureMode::Save)).await;
    assert!(cancelled.is_err());

    assert!(!surface.state().is_busy());
    assert_eq!(surface.state().layout(), &before);
    assert_eq!(surface.state().label(), DEFAULT_LABEL);
    assert!(drain(&mut host).is_empty());

    // a later request runs instead of being ignored
    assert_eq!(surface.capture(CaptureMode::Save).await, CaptureOutcome::TimedOut);
}

#[tokio::test]
async fn oversized_snippet_fails_as_export_error() {
    let (surface, mut host) = surface_with(
        Arc::new(snippetshot::rendering::BlockRasterizer),
        Arc::new(NoClipboard),
        SurfaceConfig {
            watchdog_ms: 10_000,
            ..config()
        },
    );
    let before = surface.state().layout().clone();
    let long = "x".repeat(2_100);
    assert!(surface
        .paste(&ClipboardPayload::new(
            Some(format!("<div><div><span>{}</span></div></div>", long)),
            Some(long),
        ))
        .unwrap());

    let outcome = surface.capture(CaptureMode::Save).await;
    match outcome {
        CaptureOutcome::Failed(Error::RasterizationFailure(message)) => {
            assert!(message.contains("unsupported image size"), "{}", message)
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(!surface.state().is_busy());
    assert_eq!(surface.state().layout(), &before);
    assert!(matches!(drain(&mut host)[..], [PresentationMessage::ExportError { .. }]));
}
