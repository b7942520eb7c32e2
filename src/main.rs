//! HackCheck-RS: breach search from the terminal
//!
//! Runs one search through the full pipeline with the console as the chat
//! surface. Navigation commands are read from stdin while the preview is live.

use anyhow::Result;
use clap::Parser;
use hackcheck_rs::{
    chat::{ChatSurface, ConsoleSurface},
    config, logging,
    network::{RateLimiter, RequestGate},
    notify::{Origin, Requester},
    paginator::{Navigation, PreviewHandle},
    pipeline::{SearchOutcome, SearchPipeline, SearchSession},
    search::SearchType,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Search breach data and export the results.
#[derive(Parser, Debug)]
#[command(name = "hackcheck-rs")]
#[command(version, about, long_about = None)]
struct Cli {
    /// What to search by (email, password, username, full_name, ip_address,
    /// phone_number, hash, domain).
    #[arg(short = 't', long = "type")]
    search_type: SearchType,

    /// The term to search for.
    #[arg(short = 'q', long)]
    term: String,

    /// Name reported as the requester.
    #[arg(short, long, env = "USER", default_value = "console")]
    user: String,

    /// Path to settings.yml.
    #[arg(short, long, env = "HACKCHECK_SETTINGS_PATH")]
    config: Option<PathBuf>,

    /// Override the page cap.
    #[arg(long)]
    max_pages: Option<u32>,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let source = config::locate(cli.config.as_deref());
    let mut settings = config::load(source.as_deref())?;
    if let Some(max_pages) = cli.max_pages {
        settings.api.max_pages = max_pages;
    }
    settings.general.debug |= cli.debug;

    let _guard = logging::init_logging(&settings.general);
    info!("Starting HackCheck-RS v{}", hackcheck_rs::VERSION);
    match source {
        Some(ref path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    settings.validate()?;
    let settings = config::init(settings)?;

    // One limiter for every request the process makes
    let limiter: Arc<dyn RequestGate> = Arc::new(RateLimiter::from_settings(&settings.rate_limit));
    let pipeline = SearchPipeline::from_settings(settings, limiter)?;
    let surface: Arc<dyn ChatSurface> = Arc::new(ConsoleSurface::stdout(&settings.chat));

    let session = SearchSession::new(
        Requester::new(cli.user),
        Origin::DirectMessage,
        cli.search_type,
        cli.term,
    );

    match pipeline.run(surface, session).await {
        SearchOutcome::Completed(done) => {
            info!("Search finished with {} records", done.results.len());
            if let Some(preview) = done.preview {
                navigate(preview).await;
            }
            Ok(ExitCode::SUCCESS)
        }
        SearchOutcome::Rejected(_) | SearchOutcome::Failed(_) => Ok(ExitCode::FAILURE),
    }
}

/// Feed stdin commands to the preview until it freezes
async fn navigate(preview: PreviewHandle) {
    info!("Type 'n' for the next page or 'b' for the previous one");
    spawn_stdin_reader(preview.sender());

    if let Some(view) = preview.finished().await {
        info!(
            "Preview closed on page {} of {}",
            view.current_page() + 1,
            view.max_page() + 1
        );
    }
}

/// Blocking stdin reads live on their own thread; it ends with the process
fn spawn_stdin_reader(sender: mpsc::Sender<Navigation>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match Navigation::parse(&line) {
                Some(nav) => {
                    if sender.blocking_send(nav).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => warn!("Unknown command '{}', use n or b", line.trim()),
            }
        }
    });
}
