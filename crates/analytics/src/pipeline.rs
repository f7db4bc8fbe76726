//! The single recompute entry point
//!
//! [`compute_analytics`] derives every view from one snapshot. It never
//! fails: a view whose inputs are missing is left out and the reason is
//! recorded as an [`AnalyticsWarning`].

use crate::aggregator::{aggregate_strikes, expiries, expiry_profile, max_total_oi, ExpiryOi, QuoteFilter};
use crate::candles::Candle;
use crate::error::AnalyticsError;
use crate::greeks::{map_greeks_chain, strike_ladder, GreeksTable, RawGreeksStrike};
use crate::max_pain::{resolve_max_pain, MaxPain};
use crate::normalizer::underlying_from_quotes;
use crate::pivot::{compute_pivots, PivotLevels};
use crate::stats::{
    compute_window_stats, index_trend, pcr_signal, round_to_strike, window_bounds, ExternalStats, PcrSignal,
    SignalThresholds, StrikeBounds, Trend, WindowSpec, WindowStats,
};
use crate::types::{IndexOhlc, MarketBreadth, OptionQuote, StrikeRow};
use crate::zones::{classify_zones, ZoneTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Greeks chain as last received, or synthesised
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GreeksSnapshot {
    pub chain: Vec<RawGreeksStrike>,
    /// ATM strike the greeks service centred its chain on
    pub atm_strike: Option<f64>,
    pub is_mock: bool,
}

/// Latest data from every source; any part may be absent
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub quotes: Vec<OptionQuote>,
    pub index_ohlc: Option<IndexOhlc>,
    pub prev_index_ohlc: Option<IndexOhlc>,
    pub window_stats: Option<ExternalStats>,
    pub breadth: Option<MarketBreadth>,
    pub greeks: Option<GreeksSnapshot>,
    pub latest_candle: Option<Candle>,
}

/// Operator selections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    /// Defaults to the nearest expiry
    pub expiry: Option<String>,
    /// When neither bound is set the strike window around ATM applies
    pub strike_min: Option<f64>,
    pub strike_max: Option<f64>,
    pub atm_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    pub strike_step: f64,
    pub window: WindowSpec,
    pub signals: SignalThresholds,
    pub expected_move: Option<f64>,
    pub ladder_down: u32,
    pub ladder_up: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            strike_step: 50.0,
            window: WindowSpec::default(),
            signals: SignalThresholds::default(),
            expected_move: None,
            ladder_down: 10,
            ladder_up: 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    Underlying,
    Zones,
    MaxPain,
    Pivots,
    WindowStats,
    Greeks,
}

/// A view that could not be produced this cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsWarning {
    pub component: Component,
    pub message: String,
}

impl AnalyticsWarning {
    fn new(component: Component, message: impl Into<String>) -> Self {
        Self {
            component,
            message: message.into(),
        }
    }

    fn from_error(component: Component, err: &AnalyticsError) -> Self {
        Self::new(component, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub spot: Option<f64>,
    pub atm_strike: Option<f64>,
    pub selected_expiry: Option<String>,
    pub expiries: Vec<String>,
    /// Strike bounds actually applied to the table
    pub strike_bounds: Option<StrikeBounds>,
    pub rows: Vec<StrikeRow>,
    pub max_total_oi: f64,
    pub expiry_profile: Vec<ExpiryOi>,
    pub zones: Option<ZoneTable>,
    pub max_pain: Option<MaxPain>,
    pub pivots: Option<PivotLevels>,
    pub greeks: Option<GreeksTable>,
    pub greeks_is_mock: bool,
    /// Derived locally from the option chain
    pub window_stats: Option<WindowStats>,
    /// Window PCR used for the signal; the backend's figure when present
    pub pcr_window: Option<f64>,
    pub signal: Option<PcrSignal>,
    pub avg_val: Option<f64>,
    pub trend: Option<Trend>,
    pub breadth: Option<MarketBreadth>,
    pub advance_decline_ratio: Option<f64>,
    pub warnings: Vec<AnalyticsWarning>,
}

fn resolve_spot(snapshot: &Snapshot) -> Option<f64> {
    underlying_from_quotes(&snapshot.quotes).or_else(|| {
        snapshot
            .index_ohlc
            .as_ref()
            .and_then(IndexOhlc::current_value)
            .filter(|v| *v > 0.0)
    })
}

fn resolve_avg_val(snapshot: &Snapshot) -> Option<f64> {
    let external = snapshot.window_stats.as_ref().and_then(|s| s.avg_val);
    let published = snapshot.index_ohlc.as_ref().and_then(|o| o.avg_val);
    external.or(published).or_else(|| {
        let prev_close = snapshot
            .index_ohlc
            .as_ref()
            .and_then(|o| o.prev_close)
            .or_else(|| snapshot.window_stats.as_ref().and_then(|s| s.prev_close))?;
        snapshot.latest_candle.as_ref()?.true_range(prev_close)
    })
}

/// Derive every view from `snapshot`
pub fn compute_analytics(snapshot: &Snapshot, filters: &Filters, config: &AnalyticsConfig) -> AnalyticsResult {
    let mut warnings = Vec::new();

    let all_expiries = expiries(&snapshot.quotes);
    let selected_expiry = filters.expiry.clone().or_else(|| all_expiries.first().cloned());

    let spot = resolve_spot(snapshot);
    let atm_strike = filters
        .atm_override
        .filter(|a| a.is_finite())
        .or_else(|| snapshot.window_stats.as_ref().and_then(|s| s.atm).filter(|a| a.is_finite()))
        .or_else(|| spot.map(|s| round_to_strike(s, config.strike_step)))
        .filter(|a| a.is_finite());
    if atm_strike.is_none() {
        warnings.push(AnalyticsWarning::new(
            Component::Underlying,
            "no underlying price; ATM strike unknown",
        ));
    }

    let strike_bounds = match (filters.strike_min, filters.strike_max) {
        (None, None) => atm_strike.map(|atm| window_bounds(atm, &config.window)),
        (min, max) => Some(StrikeBounds {
            low: min.unwrap_or(f64::NEG_INFINITY),
            high: max.unwrap_or(f64::INFINITY),
        }),
    };
    let filter = QuoteFilter {
        expiry: selected_expiry.clone(),
        strike_min: strike_bounds.map(|b| b.low),
        strike_max: strike_bounds.map(|b| b.high),
    };
    let rows = aggregate_strikes(&snapshot.quotes, &filter);
    debug!(rows = rows.len(), expiry = ?selected_expiry, "Aggregated strike table");

    let zones = atm_strike.and_then(|atm| match classify_zones(&rows, atm) {
        Ok(z) => Some(z),
        Err(e) => {
            warnings.push(AnalyticsWarning::from_error(Component::Zones, &e));
            None
        }
    });

    let external_max_pain = snapshot.window_stats.as_ref().and_then(|s| s.max_pain.as_ref());
    let max_pain = resolve_max_pain(external_max_pain, &rows);
    if max_pain.is_none() {
        warnings.push(AnalyticsWarning::new(Component::MaxPain, "no strikes to select max pain from"));
    }

    let pivots = match snapshot.prev_index_ohlc.as_ref() {
        Some(prev) => match compute_pivots(prev, snapshot.index_ohlc.as_ref()) {
            Ok(p) => Some(p),
            Err(e) => {
                warnings.push(AnalyticsWarning::from_error(Component::Pivots, &e));
                None
            }
        },
        None => {
            warnings.push(AnalyticsWarning::new(
                Component::Pivots,
                "previous-session index OHLC required for pivot calculation",
            ));
            None
        }
    };

    let window = WindowSpec {
        step: config.strike_step,
        ..config.window
    };
    let window_stats = match spot {
        Some(s) => match compute_window_stats(&snapshot.quotes, s, &window) {
            Ok(ws) => Some(ws),
            Err(e) => {
                warnings.push(AnalyticsWarning::from_error(Component::WindowStats, &e));
                None
            }
        },
        None => None,
    };

    let pcr_window = snapshot
        .window_stats
        .as_ref()
        .and_then(|s| s.pcr_window)
        .or_else(|| window_stats.as_ref().and_then(|w| w.pcr_window));
    let signal = pcr_signal(pcr_window, &config.signals);

    let greeks = match (snapshot.greeks.as_ref(), atm_strike) {
        (Some(g), atm) => match g.atm_strike.or(atm) {
            Some(centre) => {
                let ladder = strike_ladder(centre, config.ladder_down, config.ladder_up, config.strike_step);
                Some(map_greeks_chain(&g.chain, centre, &ladder, config.expected_move))
            }
            None => {
                warnings.push(AnalyticsWarning::new(Component::Greeks, "greeks table needs an ATM strike"));
                None
            }
        },
        (None, _) => None,
    };

    let avg_val = resolve_avg_val(snapshot);
    let trend = match (snapshot.index_ohlc.as_ref().and_then(|o| o.last), avg_val) {
        (Some(last), Some(avg)) => index_trend(last, avg),
        _ => None,
    };

    AnalyticsResult {
        spot,
        atm_strike,
        selected_expiry,
        expiries: all_expiries,
        strike_bounds,
        max_total_oi: max_total_oi(&rows),
        expiry_profile: expiry_profile(&snapshot.quotes),
        rows,
        zones,
        max_pain,
        pivots,
        greeks,
        greeks_is_mock: snapshot.greeks.as_ref().map(|g| g.is_mock).unwrap_or(false),
        window_stats,
        pcr_window,
        signal,
        avg_val,
        trend,
        breadth: snapshot.breadth,
        advance_decline_ratio: snapshot.breadth.and_then(|b| b.advance_decline_ratio()),
        warnings,
    }
}
