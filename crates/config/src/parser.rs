use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MasterConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path).with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());
    parse_config(&content)
}

/// Substitute env vars and parse YAML
pub fn parse_config(content: &str) -> Result<MasterConfig> {
    let substituted = substitution::substitute_env_vars(content)?;
    debug!("Environment variable substitution completed");

    let config: MasterConfig =
        serde_yaml::from_str(&substituted).with_context(|| "Failed to parse YAML configuration")?;

    info!(name = %config.dashboard.name, "Configuration loaded successfully");
    Ok(config)
}

/// Local dashboard backend on port 8000, greeks enabled, 30s polling
#[instrument]
pub fn generate_default_config() -> MasterConfig {
    let base = "http://localhost:8000/api";

    let sources = SourcesConfig {
        option_chain: Some(SourceConfig::new(format!("{}/options", base))),
        window_stats: Some(SourceConfig::new(format!("{}/window_stats", base))),
        index_ohlc: Some(SourceConfig::new(format!("{}/index_ohlc", base))),
        prev_index_ohlc: Some(SourceConfig::new(format!("{}/prev_index_ohlc", base))),
        market_breadth: Some(SourceConfig::new(format!("{}/market_stats", base))),
        greeks: Some(SourceConfig {
            retry: Some(SourceKind::Greeks.default_retry()),
            ..SourceConfig::new(format!("{}/greeks", base))
        }),
    };

    MasterConfig {
        dashboard: DashboardConfig {
            name: "NIFTY Options Dashboard".to_string(),
            symbol: default_symbol(),
            strike_step: default_strike_step(),
        },
        sources,
        polling: PollingConfig::default(),
        window: WindowConfig::default(),
        greeks: GreeksConfig::default(),
        signals: SignalsConfig::default(),
        export: ExportConfig::default(),
        logging: LoggingConfig::default(),
        metrics: MetricsConfig::default(),
    }
}

#[instrument]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &MasterConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config).with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml).with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}
