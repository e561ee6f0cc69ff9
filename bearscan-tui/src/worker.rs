//! Background worker thread; every scan runs here.
//!
//! Communication with the TUI main thread is via `mpsc` channels.
//! The worker creates a private rayon::ThreadPool (not the global pool)
//! and keeps one series memo for its whole lifetime.

use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bearscan_core::data::DataProvider;
use bearscan_runner::{
    build_provider, run_scan, ScanConfig, ScanContext, ScanError, ScanProgress, ScanReport,
    SeriesMemo,
};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    RunScan { symbols: Vec<String> },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    ScanProgress(ScanProgress),
    ScanDone(Box<ScanReport>),
    ScanCancelled { completed: usize, total: usize },
    ScanError { error: String },
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    config: ScanConfig,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("bearscan-worker".into())
        .spawn(move || worker_loop(config, rx, tx, cancel))
}

fn worker_loop(
    config: ScanConfig,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) {
    let threads = if config.scan.threads > 0 {
        config.scan.threads
    } else {
        rayon::current_num_threads()
    };
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("bearscan-pool-{i}"))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to build worker pool");
            let _ = tx.send(WorkerResponse::ScanError {
                error: format!("failed to build worker pool: {e}"),
            });
            return;
        }
    };

    let provider: Option<Arc<dyn DataProvider>> = match build_provider(&config) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "provider unavailable, scanning from cache only");
            None
        }
    };
    let memo = Arc::new(SeriesMemo::new());

    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::RunScan { symbols }) => {
                let mut ctx = ScanContext::new(&config, provider.clone()).with_memo(memo.clone());
                // Already inside the private pool.
                ctx.threads = 0;
                let response = pool.install(|| scan(&symbols, &ctx, &tx, &cancel));
                if tx.send(response).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("worker stopped");
}

fn scan(
    symbols: &[String],
    ctx: &ScanContext,
    tx: &Sender<WorkerResponse>,
    cancel: &AtomicBool,
) -> WorkerResponse {
    let on_progress = |p: &ScanProgress| {
        let _ = tx.send(WorkerResponse::ScanProgress(p.clone()));
    };
    match run_scan(symbols, ctx, Some(&on_progress), Some(cancel)) {
        Ok(report) => WorkerResponse::ScanDone(Box::new(report)),
        Err(ScanError::Cancelled { completed, total }) => {
            WorkerResponse::ScanCancelled { completed, total }
        }
        Err(e) => WorkerResponse::ScanError {
            error: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn offline_config(cache_dir: &std::path::Path) -> ScanConfig {
        let mut config = ScanConfig::default();
        config.data.cache_dir = cache_dir.to_path_buf();
        config.data.offline = true;
        config.data.synthetic = true;
        config.scan.threads = 2;
        config
    }

    fn next_final(rx: &Receiver<WorkerResponse>) -> WorkerResponse {
        loop {
            match rx.recv_timeout(Duration::from_secs(30)).unwrap() {
                WorkerResponse::ScanProgress(_) => continue,
                other => return other,
            }
        }
    }

    #[test]
    fn worker_scans_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let handle =
            spawn_worker(offline_config(dir.path()), cmd_rx, resp_tx, cancel).unwrap();

        let symbols = vec!["2330.TW".to_string(), "2317.TW".to_string()];
        cmd_tx.send(WorkerCommand::RunScan { symbols }).unwrap();
        match next_final(&resp_rx) {
            WorkerResponse::ScanDone(report) => {
                assert_eq!(report.universe_size, 2);
                assert_eq!(report.verdicts.len() + report.exclusions.len(), 2);
            }
            other => panic!("unexpected response {other:?}"),
        }

        // Memo generation advances per run.
        cmd_tx
            .send(WorkerCommand::RunScan {
                symbols: vec!["2330.TW".to_string()],
            })
            .unwrap();
        match next_final(&resp_rx) {
            WorkerResponse::ScanDone(report) => assert_eq!(report.run, 2),
            other => panic!("unexpected response {other:?}"),
        }

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn preset_cancel_reports_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(true));
        let handle =
            spawn_worker(offline_config(dir.path()), cmd_rx, resp_tx, cancel).unwrap();

        cmd_tx
            .send(WorkerCommand::RunScan {
                symbols: vec!["2330.TW".to_string()],
            })
            .unwrap();
        match next_final(&resp_rx) {
            WorkerResponse::ScanCancelled { completed, total } => {
                assert_eq!(completed, 0);
                assert_eq!(total, 1);
            }
            other => panic!("unexpected response {other:?}"),
        }

        drop(cmd_tx);
        handle.join().unwrap();
    }
}
