//! NPS Widget - launcher and feedback form
//!
//! CLI entry point for inspecting and driving the widget.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use keystore::{FileStorage, LocalStorage, UnavailableStorage};
use npswidget::app::{AppView, FeedbackPayload, FeedbackSubmitter, HttpSubmitter, Rating};
use npswidget::cli::{Cli, Command};
use npswidget::config::Config;
use npswidget::console::{ConsoleNavigator, ConsolePrompter};
use npswidget::host::{DISMISSED_VALUE, ReadyState, STORAGE_KEY};
use npswidget::protocol::TrustedOrigin;
use npswidget::repl::{self, ReplCommand};
use npswidget::session::{Services, Session};

/// Time given to the actors to process a typed command before the next line
const EVENT_SETTLE: Duration = Duration::from_millis(20);

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("npswidget")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("npswidget.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Origin { url } => {
            debug!(?url, "main: matched Origin command");
            cmd_origin(&config, url.as_deref())
        }
        Command::Status => {
            debug!("main: matched Status command");
            cmd_status(&config)
        }
        Command::Reset => {
            debug!("main: matched Reset command");
            cmd_reset(&config)
        }
        Command::Submit { rating, feedback } => {
            debug!(rating, "main: matched Submit command");
            cmd_submit(&config, rating, feedback).await
        }
        Command::Run { ready } => {
            debug!(?ready, "main: matched Run command");
            cmd_run(&config, ready.into()).await
        }
    }
}

fn cmd_origin(config: &Config, url: Option<&str>) -> Result<()> {
    let url = url.unwrap_or_else(|| config.host.effective_widget_url());
    let trusted = TrustedOrigin::from_endpoint(url);
    if trusted == TrustedOrigin::Any {
        eprintln!("{} Invalid widget URL, accepting any origin", "✗".red());
    }
    println!("{}", trusted);
    Ok(())
}

fn open_storage(config: &Config) -> Result<FileStorage> {
    FileStorage::open(&config.storage.path).context("Failed to open storage")
}

fn cmd_status(config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    match storage.get_item(STORAGE_KEY)? {
        Some(value) if value == DISMISSED_VALUE => {
            println!("{} (storage: {})", "dismissed".yellow(), storage.path().display());
        }
        _ => println!("{} (storage: {})", "not dismissed".green(), storage.path().display()),
    }
    Ok(())
}

fn cmd_reset(config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    storage.remove_item(STORAGE_KEY)?;
    info!("Cleared dismissed flag");
    println!("{} Cleared dismissed flag", "✓".green());
    Ok(())
}

async fn cmd_submit(config: &Config, rating: u8, feedback: String) -> Result<()> {
    let rating = Rating::new(rating)?;
    let submitter = HttpSubmitter::from_config(&config.feedback).context("Failed to build HTTP client")?;
    let payload = FeedbackPayload::new(rating, feedback);

    submitter.submit(&payload).await?;
    println!("{} Submitted {} stars to {}", "✓".green(), rating, submitter.api_url().cyan());
    Ok(())
}

fn print_status(session: &Session) {
    let host = session.host_view();
    let app = session.app_view();
    println!(
        "host: initialized={} visible={} scroll-locked={} dismissed={} frame-loads={}",
        host.initialized, host.visible, host.scroll_locked, host.dismissed, host.frame_loads
    );
    match app.view {
        AppView::ThankYou => println!("app:  thank-you (document {})", app.generation),
        AppView::Rating(view) => println!(
            "app:  score={} highlighted={} follow-up={} feedback={:?} mood={:?} (document {})",
            view.score.map_or_else(|| "-".to_string(), |r| r.to_string()),
            view.highlighted,
            view.show_follow_up,
            view.feedback,
            app.mood,
            app.generation
        ),
    }
}

async fn cmd_run(config: &Config, ready: ReadyState) -> Result<()> {
    let storage: Arc<dyn LocalStorage> = match FileStorage::open(&config.storage.path) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            warn!(error = %e, "Storage unavailable, dismissal will not persist");
            Arc::new(UnavailableStorage::new(e.to_string()))
        }
    };
    let services = Services {
        storage,
        submitter: Arc::new(HttpSubmitter::from_config(&config.feedback).context("Failed to build HTTP client")?),
        navigator: Arc::new(ConsoleNavigator),
        prompter: Arc::new(ConsolePrompter),
    };

    let session = Session::start(config, services, ready)?;

    // Report overlay visibility changes as they happen
    let mut host_view = session.subscribe_host();
    let watcher = tokio::spawn(async move {
        let mut visible = false;
        while host_view.changed().await.is_ok() {
            let now = host_view.borrow_and_update().visible;
            if now != visible {
                visible = now;
                let state = if visible { "opened".green() } else { "closed".yellow() };
                println!("{} overlay {}", "•".cyan(), state);
            }
        }
    });

    println!("{}", "NPS widget session - type 'help' for commands".bold());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match repl::parse_command(&line) {
            Ok(ReplCommand::Host(event)) => {
                session.host(event)?;
                tokio::time::sleep(EVENT_SETTLE).await;
            }
            Ok(ReplCommand::App(event)) => {
                session.app(event)?;
                tokio::time::sleep(EVENT_SETTLE).await;
            }
            Ok(ReplCommand::Status) => print_status(&session),
            Ok(ReplCommand::Help) => println!("{}", repl::HELP),
            Ok(ReplCommand::Quit) => break,
            Err(e) if line.trim().is_empty() => debug!(error = %e, "cmd_run: blank line"),
            Err(e) => eprintln!("{} {}", "✗".red(), e),
        }
    }

    session.shutdown().await?;
    watcher.abort();
    Ok(())
}
