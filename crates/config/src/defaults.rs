pub const DEFAULT_CONFIG_PATH: &str = "niftyx.yaml";

pub fn default_enabled() -> bool {
    true
}

pub fn default_symbol() -> String {
    "NIFTY".to_string()
}

pub fn default_strike_step() -> f64 {
    50.0
}

pub fn default_timeout_seconds() -> u64 {
    10
}

pub fn default_base_delay_ms() -> u64 {
    1000
}

pub fn default_multiplier() -> f64 {
    2.0
}

pub fn default_max_delay_ms() -> u64 {
    30_000
}

pub fn default_fixed_below() -> f64 {
    500.0
}

pub fn default_fixed_above() -> f64 {
    550.0
}

pub fn default_atm_window() -> u32 {
    3
}

pub fn default_down_steps() -> u32 {
    10
}

pub fn default_up_steps() -> u32 {
    11
}

pub fn default_mock_days_to_expiry() -> f64 {
    7.0
}

pub fn default_mock_volatility() -> f64 {
    0.12
}

pub fn default_mock_rate() -> f64 {
    0.065
}

pub fn default_bullish_pcr() -> f64 {
    1.2
}

pub fn default_bearish_pcr() -> f64 {
    0.8
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}
