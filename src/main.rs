use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use snippetshot::bridge::{self, HostMessage, SurfaceEndpoint};
use snippetshot::host::HeadlessUi;
use snippetshot::settings::{BackgroundKind, GradientStops};
use snippetshot::{
    new_surface, CaptureMode, CaptureOutcome, ClipboardPayload, HostController, HostStore,
    PasteNormalizer, PresentationSettings, SurfaceConfig,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "snippetshot", version, about = "Turn code selections into PNG snippets")]
struct Cli {
    /// Log verbosity
    #[arg(long, value_enum, global = true, default_value = "warn")]
    log_level: LogLevelArg,

    /// Host store file (defaults to the user config directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevelArg::Off => LevelFilter::OFF,
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the normalized markup of a paste
    Normalize {
        /// Rich markup payload
        #[arg(long)]
        html: Option<PathBuf>,
        /// Plain-text payload
        #[arg(long)]
        text: Option<PathBuf>,
    },

    /// Paste, capture and export a snippet
    Shoot {
        #[arg(long)]
        html: Option<PathBuf>,
        #[arg(long)]
        text: Option<PathBuf>,
        /// Where to save the PNG (defaults to a timestamped name)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Copy to the clipboard instead of saving
        #[arg(long, conflicts_with = "share")]
        copy: bool,
        /// Run the share flow instead of saving
        #[arg(long)]
        share: bool,
        #[arg(long)]
        line_numbers: bool,
        /// Solid background color
        #[arg(long)]
        background: Option<String>,
        /// Two gradient stops, comma separated
        #[arg(long, value_delimiter = ',')]
        gradient: Option<Vec<String>>,
        /// Gradient direction (`to right`, `45deg`, `circle`)
        #[arg(long, default_value = "to bottom right")]
        direction: String,
        /// Footer text under the snippet
        #[arg(long)]
        attribution: Option<String>,
        /// Capture watchdog in milliseconds
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
    },
}

fn read_optional(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    path.map(|p| std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Library `log` records are bridged into the subscriber
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level.to_level_filter())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Normalize { html, text } => {
            let payload = ClipboardPayload::new(
                read_optional(html.as_deref())?,
                read_optional(text.as_deref())?,
            );
            match PasteNormalizer::default().normalize(&payload)? {
                Some(outcome) => {
                    log::info!(
                        "indent {}, background {}",
                        outcome.indent.0,
                        outcome.background.as_deref().unwrap_or("none")
                    );
                    println!("{}", outcome.content);
                }
                None => bail!("nothing to paste: give --html and/or --text"),
            }
        }
        Command::Shoot {
            html,
            text,
            output,
            copy,
            share,
            line_numbers,
            background,
            gradient,
            direction,
            attribution,
            timeout_ms,
        } => {
            let payload = ClipboardPayload::new(
                read_optional(html.as_deref())?,
                read_optional(text.as_deref())?,
            );
            let mode = if copy {
                CaptureMode::Copy
            } else if share {
                CaptureMode::Share
            } else {
                CaptureMode::Save
            };

            let settings = PresentationSettings {
                line_numbers_enabled: line_numbers,
                attribution_enabled: attribution.is_some(),
                attribution_text: attribution.unwrap_or_default(),
                ..Default::default()
            };
            let config = SurfaceConfig {
                watchdog_ms: timeout_ms,
                ..Default::default()
            };

            let store = match cli.store.or_else(HostStore::default_path) {
                Some(path) => HostStore::open(path),
                None => HostStore::in_memory(),
            };

            let (host_end, surface_end) = bridge::channel();
            let SurfaceEndpoint { outbox, mut inbox } = surface_end;
            let surface = new_surface(config, outbox);
            let host = HostController::new(store, HeadlessUi { output }, host_end.outbox)
                .with_settings(settings);

            host.open_panel()?;
            while let Ok(msg) = inbox.try_recv() {
                surface.handle_host_message(msg).await?;
            }
            let host_task = tokio::spawn(host.run(host_end.inbox));
            surface.start()?;

            if let Some(color) = background {
                surface.set_background_color(&color)?;
            }
            if let Some(stops) = gradient {
                let [from, to]: [String; 2] = stops
                    .try_into()
                    .map_err(|_| anyhow::anyhow!("--gradient takes exactly two colors"))?;
                surface.set_background_settings(
                    BackgroundKind::Gradient,
                    GradientStops(from, to),
                    &direction,
                )?;
            }
            let has_payload = payload.html.is_some() || payload.text.is_some();
            if has_payload && !surface.paste(&payload)? {
                bail!("paste was not usable");
            }

            let outcome = surface.capture(mode).await;
            drop(surface);
            host_task.await??;

            match outcome {
                CaptureOutcome::Succeeded(CaptureMode::Save) => {
                    while let Ok(msg) = inbox.try_recv() {
                        match msg {
                            HostMessage::SaveSuccess { file_path, .. } => println!("{}", file_path),
                            HostMessage::SaveError { message } => bail!("save failed: {}", message),
                            _ => {}
                        }
                    }
                }
                CaptureOutcome::Succeeded(CaptureMode::Copy) => println!("copied to clipboard"),
                CaptureOutcome::Succeeded(CaptureMode::Share) => {
                    while let Ok(msg) = inbox.try_recv() {
                        if let HostMessage::ShareError { message } = msg {
                            bail!("share failed: {}", message);
                        }
                    }
                    println!("shared");
                }
                CaptureOutcome::Failed(e) => bail!(e),
                CaptureOutcome::TimedOut => bail!("capture timed out after {}ms", timeout_ms),
                CaptureOutcome::Ignored => bail!("another capture was running"),
            }
        }
    }
    Ok(())
}
