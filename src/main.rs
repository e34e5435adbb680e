use mswp::cli::{AppConfig, Args};
use mswp::config::UserConfig;
use mswp::domain::{DecisionEngine, QueueState, ReviewQueue};
use mswp::feedback::{Feedback, FeedbackSlot};
use mswp::session::{ReviewEvent, ReviewSession};
use mswp::source::DirectorySource;
use mswp::tui::{
    handle_confirm_input, handle_key_event, render, KeyAction, Screen, SwipeTracker, SwipeUpdate,
    ViewState,
};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use std::{env, io};
use tokio::runtime::Runtime;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How long to wait before asking the source again after a failed load
const LOAD_RETRY_INTERVAL: Duration = Duration::from_secs(2);

type Session = ReviewSession<DirectorySource>;

fn main() -> io::Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let user_config = UserConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load user config: {}", e);
        UserConfig::default()
    });
    let config = AppConfig::from_args(args, &user_config);

    match init_tracing(config.log_file.as_deref()) {
        Ok(path) => info!(log = %path.display(), "logging initialised"),
        Err(e) => eprintln!("Warning: Failed to open log file: {}", e),
    }

    run_app_with_config(&config)
}

/// Logs go to a file so they never interleave with the raw-mode screen
fn init_tracing(log_file: Option<&Path>) -> io::Result<PathBuf> {
    let path = match log_file {
        Some(path) => path.to_path_buf(),
        None => dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("mswp")
            .join("mswp.log"),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env("MSWP_LOG").unwrap_or_else(|_| EnvFilter::new("mswp=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(path)
}

/// Runs the TUI application with configuration
pub fn run_app_with_config(config: &AppConfig) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let mut source = DirectorySource::new(config.directory.clone(), config.scan_options())
        .with_page_size(config.page_size);
    source.set_dry_run(config.dry_run);

    let mut engine =
        DecisionEngine::with_queue(ReviewQueue::with_prefetch_percent(config.prefetch_percent));
    engine.set_swipe_threshold(config.swipe_threshold);

    let session = ReviewSession::new(source, engine);
    let mut events = session.subscribe();

    if config.dry_run {
        println!("[DRY RUN] No files will be moved to trash");
    }
    info!(
        directory = %config.directory.display(),
        dry_run = config.dry_run,
        page_size = config.page_size,
        "starting review"
    );

    spawn_load(&runtime, &session);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &runtime, &session, &mut events, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    let snapshot = runtime.block_on(session.snapshot());
    let stats = &snapshot.stats;
    let prefix = if config.dry_run { "[DRY RUN] " } else { "" };
    println!("\n{}Review finished", prefix);
    println!("   Reviewed: {} item(s)", stats.reviewed);
    println!("   Kept:     {}", stats.kept);
    if snapshot.pending_deletions > 0 {
        println!(
            "   {} item(s) were still marked for deletion and were left untouched",
            snapshot.pending_deletions
        );
    }
    info!(
        reviewed = stats.reviewed,
        kept = stats.kept,
        pending = snapshot.pending_deletions,
        "review ended"
    );

    result
}

/// Loads the next page in the background; failures surface as events
fn spawn_load(runtime: &Runtime, session: &Session) {
    let session = session.clone();
    runtime.spawn(async move {
        if let Err(e) = session.load_next_page().await {
            warn!(error = %e, "page load failed");
        }
    });
}

fn spawn_finish(runtime: &Runtime, session: &Session) {
    let session = session.clone();
    runtime.spawn(async move {
        if let Err(e) = session.finish().await {
            warn!(error = %e, "finish did not complete");
        }
    });
}

/// Main application loop
fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    runtime: &Runtime,
    session: &Session,
    events: &mut broadcast::Receiver<ReviewEvent>,
    config: &AppConfig,
) -> io::Result<()> {
    let mut view_state = ViewState::Browsing;
    let mut feedback = FeedbackSlot::new();
    let mut swipe = SwipeTracker::new();
    let mut last_load = Instant::now();

    loop {
        let now = Instant::now();
        loop {
            match events.try_recv() {
                Ok(event) => {
                    if matches!(event, ReviewEvent::PageFailed { .. }) {
                        last_load = now;
                    }
                    if let Some(message) = Feedback::from_event(&event, config.feedback) {
                        feedback.show(message, now);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "event receiver lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        let snapshot = runtime.block_on(session.snapshot());

        // Retry a stalled load so a transient source error doesn't strand the user
        if snapshot.current.is_none()
            && snapshot.state == QueueState::Loading
            && !snapshot.fetch_in_flight
            && now.duration_since(last_load) >= LOAD_RETRY_INTERVAL
        {
            last_load = now;
            spawn_load(runtime, session);
        }

        let message = feedback.current(now).cloned();
        terminal.draw(|frame| {
            let screen = Screen {
                snapshot: &snapshot,
                feedback: message.as_ref(),
                drag: swipe.offset(),
                dry_run: config.dry_run,
            };
            render(frame, &screen, view_state);
        })?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match view_state {
                ViewState::Help => {
                    let action = handle_key_event(key);
                    if matches!(action, KeyAction::Help | KeyAction::Quit | KeyAction::None) {
                        view_state = ViewState::Browsing;
                    }
                }
                ViewState::ConfirmFinish => match handle_confirm_input(key) {
                    KeyAction::ConfirmFinish => {
                        view_state = ViewState::Browsing;
                        spawn_finish(runtime, session);
                    }
                    KeyAction::CancelFinish => view_state = ViewState::Browsing,
                    _ => {}
                },
                ViewState::Browsing => match handle_key_event(key) {
                    KeyAction::Quit => break,
                    KeyAction::Keep => {
                        runtime.block_on(session.keep());
                    }
                    KeyAction::Delete => {
                        runtime.block_on(session.delete());
                    }
                    KeyAction::Undo => {
                        runtime.block_on(session.undo());
                    }
                    KeyAction::Reset => runtime.block_on(session.reset()),
                    KeyAction::Finish => {
                        if snapshot.pending_deletions > 0 && config.confirm_finish {
                            view_state = ViewState::ConfirmFinish;
                        } else {
                            spawn_finish(runtime, session);
                        }
                    }
                    KeyAction::Help => view_state = ViewState::Help,
                    KeyAction::ConfirmFinish | KeyAction::CancelFinish | KeyAction::None => {}
                },
            },
            Event::Mouse(mouse) if view_state == ViewState::Browsing => {
                if let SwipeUpdate::Released(displacement) = swipe.handle(mouse) {
                    runtime.block_on(session.swipe(displacement));
                }
            }
            Event::Resize(_, _) => swipe.cancel(),
            _ => {}
        }
    }

    Ok(())
}
