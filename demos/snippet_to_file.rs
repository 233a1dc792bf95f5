//! Snippet-to-file example - pastes a highlighted selection and saves it as PNG

use snippetshot::bridge::{self, HostMessage};
use snippetshot::host::HeadlessUi;
use snippetshot::{
    new_surface, CaptureMode, ClipboardPayload, HostController, HostStore, SurfaceConfig,
};

const SELECTION_HTML: &str = r#"<div style="color: #d8dee9;background-color: #2e3440;white-space: pre;"><div><span style="color: #81a1c1;">    fn</span><span> greet(name: &amp;str) {</span></div><div><span>        println!("hello {}", name);</span></div><div><span>    }</span></div></div>"#;
const SELECTION_TEXT: &str = "    fn greet(name: &str) {\n        println!(\"hello {}\", name);\n    }";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("SnippetShot - Snippet to File Example\n");

    let output = std::env::temp_dir().join("snippetshot-demo.png");
    let (host_end, surface_end) = bridge::channel();
    let host = HostController::new(
        HostStore::in_memory(),
        HeadlessUi {
            output: Some(output.clone()),
        },
        host_end.outbox,
    );
    let surface = new_surface(SurfaceConfig::default(), surface_end.outbox);
    let mut inbox = surface_end.inbox;

    let host_task = tokio::spawn(host.run(host_end.inbox));

    surface.paste(&ClipboardPayload::new(
        Some(SELECTION_HTML.to_string()),
        Some(SELECTION_TEXT.to_string()),
    ))?;
    println!("Normalized content:\n{}\n", surface.state().content());

    let outcome = surface.capture(CaptureMode::Save).await;
    println!("Capture outcome: {:?}", outcome);

    drop(surface);
    host_task.await??;

    while let Ok(msg) = inbox.try_recv() {
        if let HostMessage::SaveSuccess { file_path, .. } = msg {
            println!("Saved to {}", file_path);
        }
    }
    Ok(())
}
