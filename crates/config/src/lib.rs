use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Root of `niftyx.yaml`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MasterConfig {
    pub dashboard: DashboardConfig,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub greeks: GreeksConfig,
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    pub name: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_strike_step")]
    pub strike_step: f64,
}

// ============================================================================
// Data sources
// ============================================================================

/// Logical upstream endpoints polled each cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    OptionChain,
    WindowStats,
    IndexOhlc,
    PrevIndexOhlc,
    MarketBreadth,
    Greeks,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::OptionChain,
        SourceKind::WindowStats,
        SourceKind::IndexOhlc,
        SourceKind::PrevIndexOhlc,
        SourceKind::MarketBreadth,
        SourceKind::Greeks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::OptionChain => "option_chain",
            SourceKind::WindowStats => "window_stats",
            SourceKind::IndexOhlc => "index_ohlc",
            SourceKind::PrevIndexOhlc => "prev_index_ohlc",
            SourceKind::MarketBreadth => "market_breadth",
            SourceKind::Greeks => "greeks",
        }
    }

    /// Retry policy used when a source has no `retry` block.
    ///
    /// The greeks endpoint is the flaky one upstream: 3 attempts at 1s, 2s, 4s.
    pub fn default_retry(&self) -> RetryConfig {
        match self {
            SourceKind::Greeks => RetryConfig {
                max_attempts: 3,
                base_delay_ms: 1000,
                multiplier: 2.0,
                max_delay_ms: default_max_delay_ms(),
            },
            _ => RetryConfig::single_attempt(),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_chain: Option<SourceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_stats: Option<SourceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_ohlc: Option<SourceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_index_ohlc: Option<SourceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_breadth: Option<SourceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeks: Option<SourceConfig>,
}

impl SourcesConfig {
    pub fn get(&self, kind: SourceKind) -> Option<&SourceConfig> {
        match kind {
            SourceKind::OptionChain => self.option_chain.as_ref(),
            SourceKind::WindowStats => self.window_stats.as_ref(),
            SourceKind::IndexOhlc => self.index_ohlc.as_ref(),
            SourceKind::PrevIndexOhlc => self.prev_index_ohlc.as_ref(),
            SourceKind::MarketBreadth => self.market_breadth.as_ref(),
            SourceKind::Greeks => self.greeks.as_ref(),
        }
    }

    pub fn get_mut(&mut self, kind: SourceKind) -> &mut Option<SourceConfig> {
        match kind {
            SourceKind::OptionChain => &mut self.option_chain,
            SourceKind::WindowStats => &mut self.window_stats,
            SourceKind::IndexOhlc => &mut self.index_ohlc,
            SourceKind::PrevIndexOhlc => &mut self.prev_index_ohlc,
            SourceKind::MarketBreadth => &mut self.market_breadth,
            SourceKind::Greeks => &mut self.greeks,
        }
    }

    /// Configured and enabled sources, in poll order
    pub fn enabled(&self) -> impl Iterator<Item = (SourceKind, &SourceConfig)> {
        SourceKind::ALL
            .into_iter()
            .filter_map(move |kind| self.get(kind).filter(|s| s.enabled).map(|s| (kind, s)))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// `http(s)://` endpoint or `file://` path for offline replay
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

impl SourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            enabled: true,
            timeout_seconds: default_timeout_seconds(),
            retry: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Explicit retry block, else the default for `kind`
    pub fn retry_for(&self, kind: SourceKind) -> RetryConfig {
        self.retry.clone().unwrap_or_else(|| kind.default_retry())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

// ============================================================================
// Polling, window, greeks, signals
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum PollInterval {
    #[serde(rename = "manual")]
    Manual,
    #[default]
    #[serde(rename = "30s")]
    Secs30,
    #[serde(rename = "60s")]
    Secs60,
    #[serde(rename = "300s")]
    Secs300,
}

impl PollInterval {
    /// `None` for manual refresh
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            PollInterval::Manual => None,
            PollInterval::Secs30 => Some(Duration::from_secs(30)),
            PollInterval::Secs60 => Some(Duration::from_secs(60)),
            PollInterval::Secs300 => Some(Duration::from_secs(300)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default)]
    pub interval: PollInterval,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Fixed,
    Dynamic,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default)]
    pub mode: WindowMode,
    #[serde(default = "default_fixed_below")]
    pub fixed_below: f64,
    #[serde(default = "default_fixed_above")]
    pub fixed_above: f64,
    #[serde(default = "default_atm_window")]
    pub atm_window: u32,
    /// Keep `strike_min`/`strike_max` instead of following the ATM window
    #[serde(default)]
    pub lock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            mode: WindowMode::default(),
            fixed_below: default_fixed_below(),
            fixed_above: default_fixed_above(),
            atm_window: default_atm_window(),
            lock: false,
            strike_min: None,
            strike_max: None,
            expiry: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GreeksConfig {
    /// Expected index move in points; target LTP is N/A without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_move: Option<f64>,
    #[serde(default = "default_down_steps")]
    pub down_steps: u32,
    #[serde(default = "default_up_steps")]
    pub up_steps: u32,
    #[serde(default = "default_enabled")]
    pub mock_fallback: bool,
    #[serde(default)]
    pub mock: MockGreeksConfig,
}

impl Default for GreeksConfig {
    fn default() -> Self {
        Self {
            expected_move: None,
            down_steps: default_down_steps(),
            up_steps: default_up_steps(),
            mock_fallback: true,
            mock: MockGreeksConfig::default(),
        }
    }
}

/// Pricing inputs for the synthetic greeks chain
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MockGreeksConfig {
    #[serde(default = "default_mock_days_to_expiry")]
    pub days_to_expiry: f64,
    #[serde(default = "default_mock_volatility")]
    pub volatility: f64,
    #[serde(default = "default_mock_rate")]
    pub rate: f64,
}

impl Default for MockGreeksConfig {
    fn default() -> Self {
        Self {
            days_to_expiry: default_mock_days_to_expiry(),
            volatility: default_mock_volatility(),
            rate: default_mock_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalsConfig {
    #[serde(default = "default_bullish_pcr")]
    pub bullish_pcr: f64,
    #[serde(default = "default_bearish_pcr")]
    pub bearish_pcr: f64,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            bullish_pcr: default_bullish_pcr(),
            bearish_pcr: default_bearish_pcr(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<String>,
}

// ============================================================================
// Logging and metrics
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `pretty`, `json` or `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Fallback filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
dashboard:
  name: NIFTY desk
sources:
  option_chain:
    url: http://localhost:8000/api/options
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let cfg: MasterConfig = serde_yaml::from_str(MINIMAL).unwrap();

        assert_eq!(cfg.dashboard.symbol, "NIFTY");
        assert_eq!(cfg.dashboard.strike_step, 50.0);
        assert_eq!(cfg.polling.interval, PollInterval::Secs30);
        assert_eq!(cfg.window.mode, WindowMode::Fixed);
        assert_eq!(cfg.window.fixed_below, 500.0);
        assert_eq!(cfg.window.fixed_above, 550.0);
        assert_eq!(cfg.greeks.down_steps, 10);
        assert_eq!(cfg.greeks.up_steps, 11);
        assert!(cfg.greeks.mock_fallback);
        assert!(cfg.greeks.expected_move.is_none());
        assert_eq!(cfg.signals.bullish_pcr, 1.2);
        assert!(!cfg.metrics.enabled);

        let chain = cfg.sources.option_chain.as_ref().unwrap();
        assert!(chain.enabled);
        assert_eq!(chain.timeout_seconds, 10);
        assert_eq!(chain.retry_for(SourceKind::OptionChain).max_attempts, 1);
        assert!(cfg.sources.greeks.is_none());
    }

    #[test]
    fn test_greeks_default_retry() {
        let source = SourceConfig::new("http://localhost:8000/api/greeks");
        let retry = source.retry_for(SourceKind::Greeks);
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.base_delay_ms, 1000);
        assert_eq!(retry.multiplier, 2.0);
    }

    #[test]
    fn test_explicit_retry_and_interval() {
        let yaml = r#"
dashboard:
  name: desk
sources:
  greeks:
    url: file://fixtures/greeks.json
    retry:
      max_attempts: 5
      base_delay_ms: 200
polling:
  interval: 300s
window:
  mode: dynamic
  atm_window: 5
"#;
        let cfg: MasterConfig = serde_yaml::from_str(yaml).unwrap();
        let retry = cfg.sources.greeks.as_ref().unwrap().retry_for(SourceKind::Greeks);
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.base_delay_ms, 200);
        assert_eq!(retry.multiplier, 2.0);

        assert_eq!(cfg.polling.interval.as_duration(), Some(Duration::from_secs(300)));
        assert_eq!(cfg.window.mode, WindowMode::Dynamic);
        assert_eq!(cfg.window.atm_window, 5);
    }

    #[test]
    fn test_unknown_interval_rejected() {
        let yaml = format!("{}polling:\n  interval: 15s\n", MINIMAL);
        assert!(serde_yaml::from_str::<MasterConfig>(&yaml).is_err());
    }

    #[test]
    fn test_enabled_sources_in_poll_order() {
        let mut sources = SourcesConfig::default();
        sources.greeks = Some(SourceConfig::new("http://a/greeks"));
        sources.option_chain = Some(SourceConfig::new("http://a/chain"));
        let mut breadth = SourceConfig::new("http://a/breadth");
        breadth.enabled = false;
        sources.market_breadth = Some(breadth);

        let kinds: Vec<SourceKind> = sources.enabled().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![SourceKind::OptionChain, SourceKind::Greeks]);
    }
}
