//! NiftyX CLI binary
//!
//! Entry point for polling the dashboard sources, running one-off analyses
//! and managing the configuration file.

use analytics::export::write_csv;
use analytics::AnalyticsResult;
use anyhow::{Context, Result};
use cli::{Cli, Commands};
use config::{generate_default_config, load_config, save_config, validate_config, MasterConfig, SourceConfig};
use feed::{CycleReport, Poller};
use observability::{init_logging_with_level, init_metrics, LogFormat};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let (format, level) = logging_settings(&cli);
    init_logging_with_level("niftyx", format, &level)?;

    info!("NiftyX starting...");
    debug!(?cli, "CLI arguments parsed");

    match cli.command {
        Commands::Watch { config } => {
            info!("Executing 'watch' command");
            watch_command(config).await
        }
        Commands::Analyze {
            config,
            chain,
            prev_ohlc,
            csv,
        } => {
            info!("Executing 'analyze' command");
            analyze_command(config, chain, prev_ohlc, csv).await
        }
        Commands::Validate { config } => {
            info!("Executing 'validate' command");
            validate_command(config)
        }
        Commands::Init { output } => {
            info!("Executing 'init' command");
            init_command(output)
        }
    }
}

/// CLI flag first, then the config file's `logging` section
fn logging_settings(cli: &Cli) -> (LogFormat, String) {
    let config_path = match &cli.command {
        Commands::Watch { config } | Commands::Analyze { config, .. } | Commands::Validate { config } => {
            Some(config.as_path())
        }
        Commands::Init { .. } => None,
    };
    let logging = config_path
        .filter(|p| p.exists())
        .and_then(|p| load_config(p).ok())
        .map(|c| c.logging)
        .unwrap_or_default();

    let format = cli
        .log_format
        .and_then(|f| LogFormat::parse(f.as_str()))
        .or_else(|| LogFormat::parse(&logging.format))
        .unwrap_or_default();
    (format, logging.level)
}

/// Load and validate; warnings are logged, errors abort
fn load_valid_config(path: &Path) -> Result<MasterConfig> {
    let config = load_config(path)?;
    let report = validate_config(&config);

    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }

    if !report.is_valid() {
        error!(error_count = report.errors.len(), "Configuration validation failed");
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start due to configuration errors");
    }

    Ok(config)
}

fn export_csv(result: &AnalyticsResult, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    write_csv(&result.rows, file).with_context(|| format!("Failed to write CSV file: {:?}", path))?;
    debug!(?path, rows = result.rows.len(), "Exported strike table");
    Ok(())
}

fn log_cycle(report: &CycleReport) {
    let a = &report.analytics;
    let total_pcr = a.zones.as_ref().and_then(|z| z.total.pcr);
    info!(
        cycle = report.cycle,
        atm = ?a.atm_strike,
        pcr = ?total_pcr,
        max_pain = ?a.max_pain.as_ref().map(|m| m.strike),
        signal = a.signal.as_ref().map(|s| s.as_str()).unwrap_or("-"),
        mock_greeks = a.greeks_is_mock,
        "Dashboard updated"
    );
    for status in report.sources.iter().filter(|s| s.error.is_some()) {
        warn!(
            source = %status.kind,
            outcome = status.outcome.as_str(),
            error = status.error.as_deref().unwrap_or_default(),
            "Source not updated"
        );
    }
}

async fn watch_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = load_valid_config(config_path.as_ref())?;

    if config.metrics.enabled {
        init_metrics(config.metrics.port)?;
    }

    let poller = Arc::new(Poller::from_config(&config)?);
    let mut reports = poller.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = tokio::spawn({
        let poller = poller.clone();
        async move { poller.run(shutdown_rx).await }
    });

    let csv_path = config.export.csv_path.as_ref().map(PathBuf::from);
    info!(
        dashboard = %config.dashboard.name,
        interval = ?config.polling.interval,
        "Watching (Ctrl+C to stop)"
    );

    loop {
        tokio::select! {
            changed = reports.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = reports.borrow_and_update().clone();
                if let Some(report) = latest {
                    log_cycle(&report);
                    if let Some(path) = &csv_path {
                        if let Err(e) = export_csv(&report.analytics, path) {
                            error!(error = %e, "CSV export failed");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, stopping");
                break;
            }
        }
        if worker.is_finished() {
            break;
        }
    }

    let _ = shutdown_tx.send(true);
    worker.await.context("Poller task failed")?;
    Ok(())
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

async fn analyze_command(
    config_path: PathBuf,
    chain: Option<PathBuf>,
    prev_ohlc: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let mut config = if config_path.exists() {
        load_valid_config(&config_path)?
    } else if chain.is_some() {
        info!(path = ?config_path, "No configuration file, using defaults with file inputs only");
        let mut config = generate_default_config();
        config.sources = Default::default();
        config
    } else {
        anyhow::bail!("Configuration file not found: {:?}", config_path);
    };

    if let Some(path) = &chain {
        config.sources.option_chain = Some(SourceConfig::new(file_url(path)));
    }
    if let Some(path) = &prev_ohlc {
        config.sources.prev_index_ohlc = Some(SourceConfig::new(file_url(path)));
    }

    let poller = Poller::from_config(&config)?;
    let report = poller.refresh().await;

    print_report(&report);

    let csv_path = csv.or_else(|| config.export.csv_path.as_ref().map(PathBuf::from));
    if let Some(path) = csv_path {
        export_csv(&report.analytics, &path)?;
        println!("[ok] Strike table written to {:?}", path);
    }

    Ok(())
}

fn fmt_opt(v: Option<f64>, dp: usize) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.*}", dp, x),
        Some(_) => "inf".to_string(),
        None => "-".to_string(),
    }
}

fn print_report(report: &CycleReport) {
    let a = &report.analytics;

    println!("\n=== NIFTY Option Chain ===\n");
    println!("Spot:   {}", fmt_opt(a.spot, 2));
    println!("ATM:    {}", fmt_opt(a.atm_strike, 0));
    println!("Expiry: {}", a.selected_expiry.as_deref().unwrap_or("-"));
    if let Some(mp) = &a.max_pain {
        println!("Max pain: {} ({:?})", mp.strike, mp.source);
    }
    if let Some(signal) = &a.signal {
        println!("Signal: {} (window PCR {})", signal.as_str(), fmt_opt(a.pcr_window, 2));
    }
    if let Some(ratio) = a.advance_decline_ratio {
        println!("Advance/Decline: {:.2}", ratio);
    }

    println!("\n{:>10} {:>14} {:>14} {:>14} {:>8}", "Strike", "CE OI", "PE OI", "Total OI", "PCR");
    for row in &a.rows {
        println!(
            "{:>10} {:>14.0} {:>14.0} {:>14.0} {:>8}",
            row.strike,
            row.ce_oi(),
            row.pe_oi(),
            row.total_oi,
            fmt_opt(row.pcr, 2)
        );
    }

    if let Some(zones) = &a.zones {
        println!("\n{:>6} {:>14} {:>14} {:>8} {:>24} {:>24}", "Zone", "CE OI", "PE OI", "PCR", "CE range", "PE range");
        for zone in zones.rows() {
            println!(
                "{:>6} {:>14.0} {:>14.0} {:>8} {:>24} {:>24}",
                zone.kind.as_str(),
                zone.ce_oi,
                zone.pe_oi,
                fmt_opt(zone.pcr, 2),
                zone.ce_range.as_ref().map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
                zone.pe_range.as_ref().map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            );
        }
    }

    if let Some(pivots) = &a.pivots {
        println!("\n{:>6} {:>10} {:>8} {:>10}", "Level", "Value", "Gap", "Diff");
        for level in &pivots.levels {
            println!(
                "{:>6} {:>10.2} {:>8.2} {:>10}",
                level.label.as_str(),
                level.value,
                level.gap,
                fmt_opt(level.pivot_diff, 2)
            );
        }
    }

    if let Some(greeks) = &a.greeks {
        let label = if a.greeks_is_mock { " (mock)" } else { "" };
        println!("\nGreeks{} around {}", label, greeks.atm_strike);
        println!(
            "{:>10} {:>8} {:>8} {:>10} {:>10} | {:>8} {:>8} {:>10} {:>10}",
            "Strike", "CE delta", "CE LTP", "CE chg", "CE target", "PE delta", "PE LTP", "PE chg", "PE target"
        );
        for row in &greeks.rows {
            println!(
                "{:>10} {:>8} {:>8} {:>10} {:>10} | {:>8} {:>8} {:>10} {:>10}",
                row.strike,
                row.call.delta,
                row.call.last_price,
                row.call.expected_change,
                row.call.target_price,
                row.put.delta,
                row.put.last_price,
                row.put.expected_change,
                row.put.target_price
            );
        }
    }

    for warning in &a.warnings {
        println!("[warn] {:?}: {}", warning.component, warning.message);
    }
    for status in report.sources.iter().filter(|s| s.error.is_some()) {
        println!(
            "[warn] {} {}: {}",
            status.kind,
            status.outcome.as_str(),
            status.error.as_deref().unwrap_or_default()
        );
    }
    println!();
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Dashboard: {}", config.dashboard.name);
    println!("Symbol: {} (strike step {})", config.dashboard.symbol, config.dashboard.strike_step);
    println!("Polling: {:?}", config.polling.interval);
    println!("Enabled sources: {}", config.sources.enabled().count());

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Point the sources at your dashboard backend (http://...) or JSON files (file://...)");
    println!("  2. Run 'niftyx validate --config {:?}' to check configuration", output_path);
    println!("  3. Run 'niftyx watch --config {:?}' to start polling", output_path);

    Ok(())
}
