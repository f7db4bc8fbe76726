use crate::*;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Dashboard name is required")]
    MissingDashboardName,

    #[error("strike_step must be a positive number, got: {0}")]
    InvalidStrikeStep(f64),

    #[error("Source '{source_name}': invalid url '{url}': {message}")]
    InvalidSourceUrl {
        source_name: String,
        url: String,
        message: String,
    },

    #[error("Source '{source_name}': timeout_seconds must be a positive integer")]
    InvalidTimeout { source_name: String },

    #[error("Source '{source_name}' retry: {message}")]
    InvalidRetry { source_name: String, message: String },

    #[error("Window: {message}")]
    InvalidWindow { message: String },

    #[error("strike_min ({min}) must not exceed strike_max ({max})")]
    InvalidStrikeBounds { min: f64, max: f64 },

    #[error("Greeks: {message}")]
    InvalidGreeks { message: String },

    #[error("bearish_pcr ({bearish}) must be below bullish_pcr ({bullish})")]
    InvalidSignalThresholds { bullish: f64, bearish: f64 },

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Environment variable '{var}' is missing or invalid: {message}")]
    InvalidEnvVar { var: String, message: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &MasterConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_dashboard(&config.dashboard, &mut report);
    validate_sources(&config.sources, &mut report);
    validate_window(&config.window, &mut report);
    validate_greeks(&config.greeks, &mut report);
    validate_signals(&config.signals, &mut report);

    if LOG_FORMATS.iter().all(|f| !f.eq_ignore_ascii_case(config.logging.format.trim())) {
        report.add_error(ValidationError::InvalidLogFormat(config.logging.format.clone()));
    }

    if config.metrics.enabled && config.metrics.port == 0 {
        report.add_warning("metrics.port", "port 0 binds an ephemeral port");
    }

    report
}

const LOG_FORMATS: [&str; 3] = ["pretty", "json", "compact"];

fn validate_dashboard(dashboard: &DashboardConfig, report: &mut ValidationReport) {
    if dashboard.name.trim().is_empty() {
        report.add_error(ValidationError::MissingDashboardName);
    }

    if !(dashboard.strike_step.is_finite() && dashboard.strike_step > 0.0) {
        report.add_error(ValidationError::InvalidStrikeStep(dashboard.strike_step));
    }
}

fn validate_sources(sources: &SourcesConfig, report: &mut ValidationReport) {
    match &sources.option_chain {
        None => report.add_warning("sources.option_chain", "No option chain source; every view will be empty"),
        Some(s) if !s.enabled => {
            report.add_warning("sources.option_chain", "Option chain source is disabled; every view will be empty")
        }
        Some(_) => {}
    }

    for kind in SourceKind::ALL {
        let Some(source) = sources.get(kind) else {
            continue;
        };
        if !source.enabled {
            continue;
        }
        validate_source(kind, source, report);
    }
}

fn validate_source(kind: SourceKind, source: &SourceConfig, report: &mut ValidationReport) {
    let name = kind.as_str();

    for var in unresolved_env_vars(&source.url) {
        report.add_error(ValidationError::InvalidEnvVar {
            var,
            message: format!("referenced by sources.{}.url", name),
        });
    }

    match Url::parse(&source.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https" | "file") => {}
        Ok(url) => report.add_error(ValidationError::InvalidSourceUrl {
            source_name: name.to_string(),
            url: source.url.clone(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => report.add_error(ValidationError::InvalidSourceUrl {
            source_name: name.to_string(),
            url: source.url.clone(),
            message: e.to_string(),
        }),
    }

    if source.timeout_seconds == 0 {
        report.add_error(ValidationError::InvalidTimeout {
            source_name: name.to_string(),
        });
    }

    let retry = match &source.retry {
        Some(retry) => retry.clone(),
        None => {
            let retry = kind.default_retry();
            report.add_default(
                &format!("sources.{}.retry", name),
                &format!(
                    "{} attempt(s), {} ms base delay, x{}",
                    retry.max_attempts, retry.base_delay_ms, retry.multiplier
                ),
            );
            retry
        }
    };

    if retry.max_attempts == 0 {
        report.add_error(ValidationError::InvalidRetry {
            source_name: name.to_string(),
            message: "max_attempts must be at least 1".to_string(),
        });
    }

    if !(retry.multiplier.is_finite() && retry.multiplier >= 1.0) {
        report.add_error(ValidationError::InvalidRetry {
            source_name: name.to_string(),
            message: format!("multiplier must be >= 1, got: {}", retry.multiplier),
        });
    }

    if retry.max_delay_ms < retry.base_delay_ms {
        report.add_warning(
            &format!("sources.{}.retry.max_delay_ms", name),
            "max_delay_ms is below base_delay_ms; every wait is capped to max_delay_ms",
        );
    }
}

fn validate_window(window: &WindowConfig, report: &mut ValidationReport) {
    if !(window.fixed_below.is_finite() && window.fixed_below >= 0.0)
        || !(window.fixed_above.is_finite() && window.fixed_above >= 0.0)
    {
        report.add_error(ValidationError::InvalidWindow {
            message: "fixed_below and fixed_above must be non-negative".to_string(),
        });
    }

    if window.mode == WindowMode::Dynamic && window.atm_window == 0 {
        report.add_error(ValidationError::InvalidWindow {
            message: "atm_window must be a positive integer in dynamic mode".to_string(),
        });
    }

    if let (Some(min), Some(max)) = (window.strike_min, window.strike_max) {
        if min > max {
            report.add_error(ValidationError::InvalidStrikeBounds { min, max });
        }
    }

    let has_bounds = window.strike_min.is_some() || window.strike_max.is_some();
    if window.lock && !has_bounds {
        report.add_warning("window.lock", "lock is set without strike_min/strike_max; the ATM window is used");
    }
    if !window.lock && has_bounds {
        report.add_warning(
            "window.strike_min",
            "strike bounds are ignored unless window.lock is set",
        );
    }
}

fn validate_greeks(greeks: &GreeksConfig, report: &mut ValidationReport) {
    if let Some(moved) = greeks.expected_move {
        if !moved.is_finite() {
            report.add_error(ValidationError::InvalidGreeks {
                message: format!("expected_move must be finite, got: {}", moved),
            });
        }
    }

    if greeks.down_steps == 0 && greeks.up_steps == 0 {
        report.add_warning("greeks", "ladder has only the ATM strike");
    }

    let mock = &greeks.mock;
    if greeks.mock_fallback && !(mock.volatility.is_finite() && mock.volatility > 0.0) {
        report.add_error(ValidationError::InvalidGreeks {
            message: format!("mock.volatility must be positive, got: {}", mock.volatility),
        });
    }
    if greeks.mock_fallback && !(mock.days_to_expiry.is_finite() && mock.days_to_expiry > 0.0) {
        report.add_error(ValidationError::InvalidGreeks {
            message: format!("mock.days_to_expiry must be positive, got: {}", mock.days_to_expiry),
        });
    }
}

fn validate_signals(signals: &SignalsConfig, report: &mut ValidationReport) {
    if !(signals.bearish_pcr < signals.bullish_pcr) {
        report.add_error(ValidationError::InvalidSignalThresholds {
            bullish: signals.bullish_pcr,
            bearish: signals.bearish_pcr,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> MasterConfig {
        generate_default_config()
    }

    #[test]
    fn test_missing_name_and_bad_step() {
        let mut cfg = base();
        cfg.dashboard.name = "  ".to_string();
        cfg.dashboard.strike_step = 0.0;

        let report = validate_config(&cfg);
        assert!(report.errors.contains(&ValidationError::MissingDashboardName));
        assert!(report.errors.contains(&ValidationError::InvalidStrikeStep(0.0)));
    }

    #[test]
    fn test_bad_url_and_scheme() {
        let mut cfg = base();
        cfg.sources.index_ohlc = Some(SourceConfig::new("not a url"));
        cfg.sources.market_breadth = Some(SourceConfig::new("ftp://host/breadth"));

        let report = validate_config(&cfg);
        let bad: Vec<_> = report
            .errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::InvalidSourceUrl { source_name, .. } => Some(source_name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(bad, vec!["index_ohlc", "market_breadth"]);
    }

    #[test]
    fn test_disabled_source_not_checked() {
        let mut cfg = base();
        let mut src = SourceConfig::new("not a url");
        src.enabled = false;
        cfg.sources.window_stats = Some(src);

        assert!(validate_config(&cfg).is_valid());
    }

    #[test]
    fn test_retry_rules() {
        let mut cfg = base();
        cfg.sources.greeks.as_mut().unwrap().retry = Some(RetryConfig {
            max_attempts: 0,
            base_delay_ms: 100,
            multiplier: 0.5,
            max_delay_ms: 1000,
        });

        let report = validate_config(&cfg);
        let retry_errors = report
            .errors
            .iter()
            .filter(|e| matches!(e, ValidationError::InvalidRetry { .. }))
            .count();
        assert_eq!(retry_errors, 2);
    }

    #[test]
    fn test_default_retry_recorded() {
        let mut cfg = base();
        cfg.sources.greeks.as_mut().unwrap().retry = None;

        let report = validate_config(&cfg);
        assert!(report
            .defaults_applied
            .iter()
            .any(|d| d.field == "sources.greeks.retry" && d.value.starts_with("3 attempt")));
    }

    #[test]
    fn test_thresholds_and_bounds() {
        let mut cfg = base();
        cfg.signals.bearish_pcr = 1.5;
        cfg.window.lock = true;
        cfg.window.strike_min = Some(25600.0);
        cfg.window.strike_max = Some(25000.0);
        cfg.greeks.expected_move = Some(f64::NAN);

        let report = validate_config(&cfg);
        assert!(report.errors.contains(&ValidationError::InvalidSignalThresholds {
            bullish: 1.2,
            bearish: 1.5
        }));
        assert!(report.errors.contains(&ValidationError::InvalidStrikeBounds {
            min: 25600.0,
            max: 25000.0
        }));
        assert!(report.errors.iter().any(|e| matches!(e, ValidationError::InvalidGreeks { .. })));
    }

    #[test]
    fn test_warnings() {
        let mut cfg = base();
        cfg.sources.option_chain.as_mut().unwrap().enabled = false;
        cfg.window.lock = true;

        let report = validate_config(&cfg);
        assert!(report.is_valid());
        let fields: Vec<&str> = report.warnings.iter().map(|w| w.field.as_str()).collect();
        assert!(fields.contains(&"sources.option_chain"));
        assert!(fields.contains(&"window.lock"));
    }

    #[test]
    fn test_unresolved_env_var_in_url() {
        let mut cfg = base();
        cfg.sources.option_chain = Some(SourceConfig::new("http://${NIFTYX_VALIDATOR_UNSET}/chain"));

        let report = validate_config(&cfg);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidEnvVar { var, .. } if var == "NIFTYX_VALIDATOR_UNSET")));
    }

    #[test]
    fn test_log_format() {
        let mut cfg = base();
        cfg.logging.format = "JSON".to_string();
        assert!(validate_config(&cfg).is_valid());

        cfg.logging.format = "syslog".to_string();
        assert!(validate_config(&cfg)
            .errors
            .contains(&ValidationError::InvalidLogFormat("syslog".to_string())));
    }
}
