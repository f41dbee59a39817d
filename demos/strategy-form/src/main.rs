//! Strategy form - form-dispatch demo
//!
//! Edit the caching strategy of a root policy and a few databases:
//! 1. Keys map to actions, applied to the `App`
//! 2. Saving runs through a `SaveForm` (dirty tracking + deferred save)
//! 3. "Invalidate now" runs through a `DeferredAction` with a 300ms busy floor
//! 4. Completions and failure toasts arrive on channels and trigger a redraw
//!
//! # Usage
//!
//! ```sh
//! cargo run -p strategy-form-demo
//!
//! # Slow backend that fails every third call, logging to a file
//! cargo run -p strategy-form-demo -- --latency-ms 1500 --fail-every 3 --log-file demo.log
//! ```

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use form_dispatch::{ChannelNotifier, Notification};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use strategy_form_demo::app::{default_targets, App, AppEvent};
use strategy_form_demo::backend::SimBackend;
use strategy_form_demo::config::AppConfig;
use strategy_form_demo::input::{action_for_key, spawn_input_reader, TermEvent};
use strategy_form_demo::ui;

/// Caching strategy editor - form-dispatch demo
#[derive(Parser, Debug)]
#[command(name = "strategy-form")]
#[command(about = "Edit caching strategies with save, discard, and invalidate")]
struct Args {
    /// Simulated backend latency in milliseconds
    #[arg(long, default_value = "400")]
    latency_ms: u64,

    /// Fail every n-th backend call (0 never fails)
    #[arg(long, default_value = "0")]
    fail_every: u32,

    /// Write logs to this file (RUST_LOG filters, default "info")
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// JSON file with controller timing overrides
    #[arg(long)]
    config: Option<PathBuf>,
}

enum Step {
    Term(TermEvent),
    Controller(AppEvent),
    Toast(Notification),
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    // ===== Terminal setup =====
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &args, config).await;

    // ===== Cleanup =====
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn init_logging(path: &PathBuf) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    args: &Args,
    config: AppConfig,
) -> io::Result<()> {
    let backend = SimBackend::new(Duration::from_millis(args.latency_ms), args.fail_every);
    let (notifier, mut toast_rx) = ChannelNotifier::channel();
    let mut app = App::new(default_targets(), backend, notifier, config);

    let (term_tx, mut term_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let reader = spawn_input_reader(term_tx, cancel.clone());

    tracing::info!(
        latency_ms = args.latency_ms,
        fail_every = args.fail_every,
        "Strategy form started"
    );

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::render(frame, &app)) {
            break Err(e);
        }

        let step = tokio::select! {
            Some(event) = term_rx.recv() => Step::Term(event),
            Some(event) = app.next_event() => Step::Controller(event),
            Some(toast) = toast_rx.recv() => Step::Toast(toast),
            else => break Ok(()),
        };

        match step {
            Step::Term(TermEvent::Key(key)) => {
                if let Some(action) = action_for_key(key) {
                    app.handle(action);
                }
            }
            Step::Term(TermEvent::Resize(..)) => {}
            Step::Controller(event) => app.on_event(event),
            Step::Toast(toast) => app.push_toast(toast),
        }

        if app.should_quit {
            break Ok(());
        }
    };

    cancel.cancel();
    let _ = reader.await;
    result
}
