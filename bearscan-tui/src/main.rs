//! bearscan TUI: three-panel terminal screener with vim-style navigation.
//!
//! Panels:
//! 1. Candidates: screen results, sort and view toggles
//! 2. Universe: groups, tickers and cache coverage
//! 3. Help: keyboard shortcuts and the screen rules

mod app;
mod input;
mod persistence;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use bearscan_core::data::{ParquetCache, Universe};
use bearscan_runner::logging::init_file_logging;
use bearscan_runner::ScanConfig;

use crate::app::AppState;
use crate::worker::{WorkerCommand, WorkerResponse};

#[derive(Parser)]
#[command(name = "bearscan-tui", about = "Interactive short-candidate screener")]
struct Cli {
    /// Scan configuration (TOML). Defaults to the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Universe file (TOML groups). Defaults to the built-in Taiwan list.
    #[arg(long)]
    universe: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bearscan");
    let config = load_config(cli.config.as_deref(), &config_dir)?;
    let universe = match &cli.universe {
        Some(path) => Universe::from_file(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("loading universe {}", path.display()))?,
        None => Universe::default_taiwan(),
    };

    let cache_dir = config.data.cache_dir.clone();
    let state_path = config_dir.join("state.json");

    // The terminal belongs to the UI, so logs go to a file.
    init_file_logging(&config.logging.level, &cache_dir.join("bearscan-tui.log"))
        .with_context(|| format!("opening log file in {}", cache_dir.display()))?;

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let worker_handle = worker::spawn_worker(config.clone(), cmd_rx, resp_tx, cancel.clone())
        .context("spawning worker thread")?;

    let mut app = AppState::new(
        cmd_tx.clone(),
        resp_rx,
        cancel,
        universe,
        config.output.sort,
        config.output.top,
        cache_dir.clone(),
        state_path.clone(),
    );
    persistence::apply(&mut app, persistence::load(&state_path));
    scan_cache_status(&mut app, &cache_dir);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    if let Err(e) = persistence::save(&app.state_path, &persistence::extract(&app)) {
        tracing::warn!(error = %e, "failed to save UI state");
    }

    // Shutdown worker
    app.cancel_scan();
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// An explicit `--config` must load; the default location is optional.
fn load_config(explicit: Option<&Path>, config_dir: &Path) -> Result<ScanConfig> {
    if let Some(path) = explicit {
        return ScanConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    let default_path = config_dir.join("config.toml");
    if default_path.exists() {
        ScanConfig::from_file(&default_path)
            .with_context(|| format!("loading config {}", default_path.display()))
    } else {
        Ok(ScanConfig::default())
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::ScanProgress(p) => {
            app.scan.completed = p.completed;
            app.scan.total = p.total;
            app.scan.current_symbol = Some(p.symbol);
        }
        WorkerResponse::ScanDone(report) => app.apply_report(*report),
        WorkerResponse::ScanCancelled { completed, total } => {
            app.scan = app::ScanStatus::default();
            app.set_warning(format!("Scan cancelled after {completed}/{total} tickers"));
        }
        WorkerResponse::ScanError { error } => {
            app.scan = app::ScanStatus::default();
            tracing::error!(%error, "scan failed");
            app.set_error(format!("Scan failed: {error}"));
        }
    }
}

/// Mark tickers that already have cached bars.
fn scan_cache_status(app: &mut AppState, cache_dir: &Path) {
    let cache = ParquetCache::new(cache_dir);
    let tickers = app.universe.universe.all_tickers();
    let statuses = cache.status(&tickers);
    for status in statuses {
        app.universe.cache_status.insert(status.symbol, status.cached);
    }
}
