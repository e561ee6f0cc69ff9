//! bearscan CLI: one-shot screening and cache management.
//!
//! Commands:
//! - `scan`: load the universe, screen every ticker, print the candidates
//! - `download`: fetch history from Yahoo Finance into the Parquet cache
//! - `cache status`: per-ticker cache coverage and freshness
//! - `universe`: print a universe file (the built-in Taiwan list by default)

use anyhow::{anyhow, bail, Context, Result};
use bearscan_core::data::{
    download_symbols, normalize_symbol, CircuitBreaker, DownloadRequest, ParquetCache,
    StdoutProgress, Universe, YahooProvider,
};
use bearscan_core::screen::Condition;
use bearscan_core::Verdict;
use bearscan_runner::{
    build_provider, logging, run_scan, LogFormat, ScanConfig, ScanContext, ScanReport, SortKey,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "bearscan",
    about = "bearscan: Taiwan-stock short-candidate screener"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen the universe once and print the candidates.
    Scan {
        /// Path to a TOML scan config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a universe TOML file. Defaults to the built-in Taiwan list.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Screen these tickers instead of a universe (e.g. 2330 2317.TW).
        #[arg(long, num_args = 1..)]
        tickers: Vec<String>,

        /// Evaluate as of this date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Offline mode: cache only, no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Generate synthetic data for tickers with no real data.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Read prices from `{DIR}/{TICKER}.csv` instead of Yahoo Finance.
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Cache directory. Overrides the config file.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Candidate order: symbol, deviation or score.
        #[arg(long)]
        sort: Option<String>,

        /// Show only the first N candidates.
        #[arg(long)]
        top: Option<usize>,

        /// Write the printed rows as CSV to this file.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the full report as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// List every evaluated ticker, not just candidates.
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Log level: trace, debug, info, warn, error.
        #[arg(long)]
        log_level: Option<String>,

        /// Log format: pretty or json.
        #[arg(long)]
        log_format: Option<String>,
    },
    /// Download daily history from Yahoo Finance into the cache.
    Download {
        /// Tickers to download. Defaults to the whole universe.
        symbols: Vec<String>,

        /// Path to a universe TOML file.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Calendar days of history to fetch.
        #[arg(long, default_value_t = 90)]
        days: u32,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Print a universe as TOML.
    Universe {
        /// Universe file to validate and print. Defaults to the built-in list.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached range, bar count and fetch time per ticker.
    Status {
        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Also list universe tickers that have no cache entry.
        #[arg(long)]
        universe: Option<PathBuf>,
    },
}

/// Flag overrides for `scan`, applied on top of the config file.
struct ScanArgs {
    config: Option<PathBuf>,
    universe: Option<PathBuf>,
    tickers: Vec<String>,
    as_of: Option<String>,
    offline: bool,
    synthetic: bool,
    csv_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    sort: Option<String>,
    top: Option<usize>,
    csv: Option<PathBuf>,
    json: bool,
    all: bool,
    log_level: Option<String>,
    log_format: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            config,
            universe,
            tickers,
            as_of,
            offline,
            synthetic,
            csv_dir,
            cache_dir,
            sort,
            top,
            csv,
            json,
            all,
            log_level,
            log_format,
        } => run_scan_cmd(ScanArgs {
            config,
            universe,
            tickers,
            as_of,
            offline,
            synthetic,
            csv_dir,
            cache_dir,
            sort,
            top,
            csv,
            json,
            all,
            log_level,
            log_format,
        }),
        Commands::Download {
            symbols,
            universe,
            days,
            force,
            cache_dir,
        } => run_download(symbols, universe, days, force, cache_dir),
        Commands::Cache { action } => match action {
            CacheAction::Status {
                cache_dir,
                universe,
            } => run_cache_status(&cache_dir, universe.as_deref()),
        },
        Commands::Universe { file } => run_universe(file.as_deref()),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

/// Explicit tickers win over a universe file; bare codes become `.TW`.
fn load_universe(path: Option<&Path>, tickers: &[String]) -> Result<Universe> {
    if !tickers.is_empty() {
        return Ok(Universe::from_tickers(
            tickers.iter().map(|t| normalize_symbol(t)),
        ));
    }
    match path {
        Some(p) => Universe::from_file(p).map_err(|e| anyhow!(e)),
        None => Ok(Universe::default_taiwan()),
    }
}

fn build_scan_config(args: &ScanArgs) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_file(path)?,
        None => ScanConfig::default(),
    };

    if let Some(d) = &args.as_of {
        config.scan.as_of = Some(parse_date(d)?);
    }
    config.data.offline |= args.offline;
    config.data.synthetic |= args.synthetic;
    if let Some(dir) = &args.csv_dir {
        config.data.csv_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.cache_dir {
        config.data.cache_dir = dir.clone();
    }
    if let Some(s) = &args.sort {
        config.output.sort = s.parse()?;
    }
    if let Some(n) = args.top {
        config.output.top = n;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(f) = &args.log_format {
        config.logging.format = f.parse()?;
    }

    config.validate()?;
    Ok(config)
}

fn run_scan_cmd(args: ScanArgs) -> Result<()> {
    let config = build_scan_config(&args)?;
    logging::init_logging(&config.logging.level, config.logging.format);

    let universe = load_universe(args.universe.as_deref(), &args.tickers)?;
    let symbols: Vec<String> = universe.all_tickers().into_iter().map(String::from).collect();
    if symbols.is_empty() {
        bail!("universe is empty");
    }

    let provider = build_provider(&config)?;
    let ctx = ScanContext::new(&config, provider);
    let report = run_scan(&symbols, &ctx, None, None)?;

    let rows = if args.all {
        report.all_verdicts(config.output.sort)
    } else {
        report.candidates(config.output.sort, config.output.top)
    };

    if let Some(path) = &args.csv {
        report.write_csv(path, &rows)?;
        println!("Wrote {} rows to {}", rows.len(), path.display());
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    print_report(&report, &rows, args.all, config.output.sort);
    Ok(())
}

fn run_download(
    symbols: Vec<String>,
    universe: Option<PathBuf>,
    days: u32,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    logging::init_logging("warn", LogFormat::Pretty);

    let universe = load_universe(universe.as_deref(), &symbols)?;
    let sym_refs = universe.all_tickers();
    if sym_refs.is_empty() {
        bail!("no tickers to download");
    }

    let end = chrono::Local::now().date_naive();
    let request = DownloadRequest {
        start: end - chrono::Duration::days(i64::from(days)),
        end,
        force,
        max_age: chrono::Duration::hours(12),
    };

    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = YahooProvider::new(circuit_breaker)?;
    let cache = ParquetCache::new(cache_dir);

    let summary = download_symbols(&provider, &cache, &sym_refs, &request, &StdoutProgress);
    if summary.skipped > 0 {
        println!("{} already fresh in cache", summary.skipped);
    }

    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_cache_status(cache_dir: &Path, universe: Option<&Path>) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ParquetCache::new(cache_dir);
    let mut symbols = cache.cached_symbols();
    if let Some(path) = universe {
        let universe = Universe::from_file(path).map_err(|e| anyhow!(e))?;
        symbols.extend(universe.all_tickers().into_iter().map(String::from));
        symbols.sort();
        symbols.dedup();
    }

    if symbols.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let sym_refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let rows = cache.status(&sym_refs);
    let cached = rows.iter().filter(|r| r.cached).count();

    println!("Cache: {}", cache_dir.display());
    println!("Tickers: {cached} cached of {}", rows.len());
    println!();
    println!(
        "{:<10} {:<12} {:>6} {:<20}",
        "Ticker", "Last Bar", "Bars", "Fetched"
    );
    println!("{}", "-".repeat(52));
    for row in &rows {
        let last = row
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "(missing)".into());
        let bars = row.bar_count.map(|n| n.to_string()).unwrap_or_default();
        let fetched = row
            .fetched_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{:<10} {:<12} {:>6} {:<20}", row.symbol, last, bars, fetched);
    }

    Ok(())
}

fn run_universe(file: Option<&Path>) -> Result<()> {
    let universe = match file {
        Some(p) => Universe::from_file(p).map_err(|e| anyhow!(e))?,
        None => Universe::default_taiwan(),
    };
    print!("{}", universe.to_toml().map_err(|e| anyhow!(e))?);
    Ok(())
}

fn print_report(report: &ScanReport, rows: &[&Verdict], all: bool, sort: SortKey) {
    let summary = report.summary();
    println!();
    println!("=== Short Candidates as of {} ===", report.as_of);
    println!(
        "Universe: {}  Evaluated: {}  Candidates: {}  Excluded: {}  ({} ms, sorted by {})",
        summary.total,
        summary.evaluated,
        summary.candidates,
        summary.excluded,
        report.elapsed_ms,
        sort.label()
    );
    println!();

    if rows.is_empty() {
        println!("(no rows)");
    } else {
        println!(
            "{:<10} {:<10} {:>9} {:>9} {:>9} {:>9} {:>7} {:>8} {:>5}  {}",
            "Ticker", "Date", "Close", "MA5", "MA20", "Dev%", "Score", "Vol", "Pass", "Failed"
        );
        println!("{}", "-".repeat(96));
        for v in rows {
            print_row(v, all);
        }
    }

    if !report.exclusions.is_empty() {
        println!();
        println!("Excluded:");
        for e in &report.exclusions {
            println!("  {:<10} {:<18} {}", e.symbol, e.error.kind(), e.error);
        }
    }

    let notices = report.notices();
    if !notices.is_empty() {
        println!();
        for notice in &notices {
            println!("NOTICE: {notice}");
        }
    }
    println!();
}

fn print_row(v: &Verdict, all: bool) {
    let s = &v.snapshot;
    let (ma5, ma20, dev, score) = match &s.trend {
        Some(t) => (
            format!("{:.2}", t.ma_short),
            format!("{:.2}", t.ma_long),
            format!("{:+.2}", t.deviation * 100.0),
            t.bear_score.to_string(),
        ),
        None => ("-".into(), "-".into(), "-".into(), "-".into()),
    };
    let failed = if all {
        v.checks
            .first_failure()
            .map(Condition::label)
            .unwrap_or("")
    } else {
        ""
    };
    println!(
        "{:<10} {:<10} {:>9.2} {:>9} {:>9} {:>9} {:>7} {:>8} {:>5}  {}",
        v.symbol,
        s.date,
        s.close,
        ma5,
        ma20,
        dev,
        score,
        s.volume,
        if v.candidate { "yes" } else { "no" },
        failed
    );
}
