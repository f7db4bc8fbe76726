//! Window statistics around the ATM strike
//!
//! Mirrors the summary the backend publishes (`pcr_window`, `pcr_overall`,
//! VWAP, IV skew, max pain) so it can be derived locally when that endpoint
//! is down, and decodes the backend's own copy when it is up.

use crate::aggregator::{aggregate_strikes, QuoteFilter};
use crate::error::AnalyticsError;
use crate::max_pain::{true_max_pain, ExternalMaxPain, PainPoint};
use crate::normalizer::lenient_f64;
use crate::types::{OptionQuote, OptionSide, SideVwap, StrikeRow};
use crate::Result;
use serde::{Deserialize, Serialize};

/// ATM strike: `spot` rounded to the nearest multiple of `step`
pub fn round_to_strike(spot: f64, step: f64) -> f64 {
    (spot / step).round() * step
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Fixed,
    Dynamic,
}

/// How far the strike window reaches either side of ATM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub mode: WindowMode,
    pub fixed_below: f64,
    pub fixed_above: f64,
    /// Strikes either side of ATM in dynamic mode
    pub atm_window: u32,
    pub step: f64,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            mode: WindowMode::Fixed,
            fixed_below: 500.0,
            fixed_above: 550.0,
            atm_window: 3,
            step: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeBounds {
    pub low: f64,
    pub high: f64,
}

impl StrikeBounds {
    pub fn contains(&self, strike: f64) -> bool {
        strike >= self.low && strike <= self.high
    }
}

pub fn window_bounds(atm: f64, spec: &WindowSpec) -> StrikeBounds {
    match spec.mode {
        WindowMode::Fixed => StrikeBounds {
            low: atm - spec.fixed_below,
            high: atm + spec.fixed_above,
        },
        WindowMode::Dynamic => {
            let reach = f64::from(spec.atm_window) * spec.step;
            StrikeBounds {
                low: atm - reach,
                high: atm + reach,
            }
        }
    }
}

/// Global Σ PE OI / Σ CE OI; `None` when there is no call OI
pub fn overall_pcr(quotes: &[OptionQuote]) -> Option<f64> {
    let (ce, pe) = quotes.iter().fold((0.0, 0.0), |(ce, pe), q| match q.side {
        OptionSide::Call => (ce + q.open_interest, pe),
        OptionSide::Put => (ce, pe + q.open_interest),
    });
    (ce > 0.0).then(|| pe / ce)
}

/// CE/PE totals over the strikes counted by [`window_pcr`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowTotals {
    #[serde(rename = "CE_OI", default)]
    pub ce_oi: f64,
    #[serde(rename = "PE_OI", default)]
    pub pe_oi: f64,
    #[serde(rename = "CE_vol", default)]
    pub ce_vol: f64,
    #[serde(rename = "PE_vol", default)]
    pub pe_vol: f64,
}

/// PCR over strikes inside `bounds` where both sides carry OI.
///
/// Strikes with a zero side are excluded entirely, volume included.
pub fn window_pcr(rows: &[StrikeRow], bounds: &StrikeBounds) -> (Option<f64>, WindowTotals) {
    let totals = rows
        .iter()
        .filter(|r| bounds.contains(r.strike) && r.ce_oi() > 0.0 && r.pe_oi() > 0.0)
        .fold(WindowTotals::default(), |t, r| WindowTotals {
            ce_oi: t.ce_oi + r.ce_oi(),
            pe_oi: t.pe_oi + r.pe_oi(),
            ce_vol: t.ce_vol + r.call.volume,
            pe_vol: t.pe_vol + r.put.volume,
        });
    let pcr = (totals.ce_oi > 0.0).then(|| totals.pe_oi / totals.ce_oi);
    (pcr, totals)
}

/// Σ price·volume / Σ volume per side
pub fn vwap_by_side(quotes: &[OptionQuote]) -> SideVwap {
    let side_vwap = |side: OptionSide| {
        let (pv, vol) = quotes
            .iter()
            .filter(|q| q.side == side)
            .fold((0.0, 0.0), |(pv, vol), q| (pv + q.last_price * q.volume, vol + q.volume));
        (vol > 0.0).then(|| pv / vol)
    };
    SideVwap {
        call: side_vwap(OptionSide::Call),
        put: side_vwap(OptionSide::Put),
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Median put IV over median call IV
pub fn iv_skew(quotes: &[OptionQuote]) -> Option<f64> {
    let ivs = |side: OptionSide| {
        median(
            quotes
                .iter()
                .filter(|q| q.side == side)
                .map(|q| q.implied_volatility)
                .collect(),
        )
    };
    match (ivs(OptionSide::Call), ivs(OptionSide::Put)) {
        (Some(ce), Some(pe)) if ce != 0.0 => Some(pe / ce),
        _ => None,
    }
}

/// max(H − L, |H − Pc|, |L − Pc|)
pub fn true_range(prev_close: f64, high: f64, low: f64) -> Option<f64> {
    if ![prev_close, high, low].iter().all(|v| v.is_finite()) {
        return None;
    }
    Some((high - low).max((high - prev_close).abs()).max((low - prev_close).abs()))
}

/// Half the true range; published as `avg_val` next to the index OHLC
pub fn index_momentum(prev_close: f64, high: f64, low: f64) -> Option<f64> {
    true_range(prev_close, high, low).map(|tr| tr / 2.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
}

/// Uptrend when the live value sits above `avg_val`
pub fn index_trend(last: f64, avg_val: f64) -> Option<Trend> {
    if !(last.is_finite() && avg_val.is_finite()) || last == 0.0 || avg_val == 0.0 {
        return None;
    }
    Some(if last > avg_val { Trend::Up } else { Trend::Down })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalThresholds {
    pub bullish_pcr: f64,
    pub bearish_pcr: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            bullish_pcr: 1.2,
            bearish_pcr: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PcrSignal {
    CallBuy,
    PutBuy,
    Sideways,
}

impl PcrSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            PcrSignal::CallBuy => "CE BUY",
            PcrSignal::PutBuy => "PE BUY",
            PcrSignal::Sideways => "Sideways",
        }
    }
}

/// Thresholds are exclusive: a PCR equal to either one is sideways
pub fn pcr_signal(pcr: Option<f64>, thresholds: &SignalThresholds) -> Option<PcrSignal> {
    let pcr = pcr.filter(|p| !p.is_nan())?;
    Some(if pcr > thresholds.bullish_pcr {
        PcrSignal::CallBuy
    } else if pcr < thresholds.bearish_pcr {
        PcrSignal::PutBuy
    } else {
        PcrSignal::Sideways
    })
}

/// Window stats as published by the backend; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub atm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pcr_window: Option<f64>,
    #[serde(default)]
    pub pcr_window_details: Option<WindowTotals>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pcr_overall: Option<f64>,
    #[serde(default)]
    pub vwap: SideVwap,
    #[serde(default)]
    pub max_pain: Option<ExternalMaxPain>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub skew: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub prev_close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_val: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Window stats derived from the option chain alone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub spot: f64,
    pub atm: f64,
    pub bounds: StrikeBounds,
    pub pcr_window: Option<f64>,
    pub totals: WindowTotals,
    pub pcr_overall: Option<f64>,
    pub vwap: SideVwap,
    pub skew: Option<f64>,
    /// Writer-loss minimum over the window
    pub max_pain: Option<PainPoint>,
}

/// Stats over every expiry in the snapshot, restricted to the strike window.
///
/// Fails with [`AnalyticsError::InsufficientData`] when `spot` is unusable.
pub fn compute_window_stats(quotes: &[OptionQuote], spot: f64, spec: &WindowSpec) -> Result<WindowStats> {
    if !spot.is_finite() || spot <= 0.0 {
        return Err(AnalyticsError::insufficient(
            "window stats require a positive underlying price",
        ));
    }
    let atm = round_to_strike(spot, spec.step);
    let bounds = window_bounds(atm, spec);

    let window_quotes: Vec<OptionQuote> = quotes
        .iter()
        .filter(|q| bounds.contains(q.strike))
        .cloned()
        .collect();
    let rows = aggregate_strikes(
        &window_quotes,
        &QuoteFilter {
            expiry: None,
            strike_min: Some(bounds.low),
            strike_max: Some(bounds.high),
        },
    );
    let (pcr_window, totals) = window_pcr(&rows, &bounds);

    Ok(WindowStats {
        spot,
        atm,
        bounds,
        pcr_window,
        totals,
        pcr_overall: overall_pcr(quotes),
        vwap: vwap_by_side(&window_quotes),
        skew: iv_skew(&window_quotes),
        max_pain: true_max_pain(&rows),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn quote(strike: f64, side: OptionSide, oi: f64, vol: f64, price: f64, iv: f64) -> OptionQuote {
        OptionQuote {
            open_interest: oi,
            volume: vol,
            last_price: price,
            implied_volatility: iv,
            ..OptionQuote::empty(strike, side)
        }
    }

    #[test]
    fn test_round_and_bounds() {
        assert_eq!(round_to_strike(25327.05, 50.0), 25350.0);
        assert_eq!(round_to_strike(25324.0, 50.0), 25300.0);

        let fixed = window_bounds(25350.0, &WindowSpec::default());
        assert_eq!(fixed, StrikeBounds { low: 24850.0, high: 25900.0 });

        let dynamic = window_bounds(
            25350.0,
            &WindowSpec {
                mode: WindowMode::Dynamic,
                ..Default::default()
            },
        );
        assert_eq!(dynamic, StrikeBounds { low: 25200.0, high: 25500.0 });
    }

    #[test]
    fn test_window_pcr_excludes_one_sided_strikes() {
        let quotes = vec![
            quote(25300.0, OptionSide::Call, 100.0, 10.0, 0.0, 0.0),
            quote(25300.0, OptionSide::Put, 150.0, 20.0, 0.0, 0.0),
            quote(25350.0, OptionSide::Put, 900.0, 5.0, 0.0, 0.0),
            quote(25400.0, OptionSide::Call, 50.0, 1.0, 0.0, 0.0),
            quote(25400.0, OptionSide::Put, 50.0, 2.0, 0.0, 0.0),
            quote(26500.0, OptionSide::Call, 10.0, 1.0, 0.0, 0.0),
            quote(26500.0, OptionSide::Put, 10.0, 1.0, 0.0, 0.0),
        ];
        let rows = aggregate_strikes(&quotes, &QuoteFilter::default());
        let bounds = StrikeBounds { low: 25200.0, high: 25500.0 };

        let (pcr, totals) = window_pcr(&rows, &bounds);
        assert_eq!(totals.ce_oi, 150.0);
        assert_eq!(totals.pe_oi, 200.0);
        assert_eq!(totals.pe_vol, 22.0);
        assert!((pcr.unwrap() - 200.0 / 150.0).abs() < 1e-12);

        // global sum keeps the one-sided strike and the far strike
        assert!((overall_pcr(&quotes).unwrap() - 1110.0 / 160.0).abs() < 1e-12);
    }

    #[test]
    fn test_overall_pcr_without_calls() {
        let quotes = vec![quote(25300.0, OptionSide::Put, 10.0, 0.0, 0.0, 0.0)];
        assert_eq!(overall_pcr(&quotes), None);
    }

    #[test]
    fn test_vwap_and_skew() {
        let quotes = vec![
            quote(25300.0, OptionSide::Call, 0.0, 10.0, 100.0, 10.0),
            quote(25350.0, OptionSide::Call, 0.0, 30.0, 60.0, 12.0),
            quote(25400.0, OptionSide::Call, 0.0, 0.0, 30.0, 14.0),
            quote(25300.0, OptionSide::Put, 0.0, 0.0, 40.0, 15.0),
            quote(25350.0, OptionSide::Put, 0.0, 0.0, 70.0, 18.0),
        ];
        let vwap = vwap_by_side(&quotes);
        assert_eq!(vwap.call, Some((1000.0 + 1800.0) / 40.0));
        assert_eq!(vwap.put, None);
        assert_eq!(iv_skew(&quotes), Some(16.5 / 12.0));
    }

    #[test]
    fn test_true_range_and_momentum() {
        assert_eq!(true_range(25100.0, 25428.75, 25286.30), Some(328.75));
        assert_eq!(index_momentum(25100.0, 25428.75, 25286.30), Some(164.375));
        assert_eq!(true_range(f64::NAN, 1.0, 1.0), None);
        assert_eq!(index_trend(25400.0, 164.0), Some(Trend::Up));
        assert_eq!(index_trend(0.0, 164.0), None);
    }

    #[test]
    fn test_signal_thresholds() {
        let t = SignalThresholds::default();
        assert_eq!(pcr_signal(Some(1.3), &t), Some(PcrSignal::CallBuy));
        assert_eq!(pcr_signal(Some(0.7), &t), Some(PcrSignal::PutBuy));
        assert_eq!(pcr_signal(Some(1.2), &t), Some(PcrSignal::Sideways));
        assert_eq!(pcr_signal(Some(0.8), &t), Some(PcrSignal::Sideways));
        assert_eq!(pcr_signal(Some(f64::INFINITY), &t), Some(PcrSignal::CallBuy));
        assert_eq!(pcr_signal(None, &t), None);
    }

    #[test]
    fn test_compute_window_stats() {
        let quotes = vec![
            quote(25300.0, OptionSide::Call, 100.0, 10.0, 80.0, 12.0),
            quote(25300.0, OptionSide::Put, 50.0, 10.0, 40.0, 14.0),
            quote(25350.0, OptionSide::Call, 80.0, 10.0, 50.0, 11.0),
            quote(25350.0, OptionSide::Put, 200.0, 10.0, 60.0, 13.0),
            quote(27000.0, OptionSide::Call, 999.0, 10.0, 1.0, 30.0),
        ];
        let stats = compute_window_stats(&quotes, 25341.0, &WindowSpec::default()).unwrap();
        assert_eq!(stats.atm, 25350.0);
        assert_eq!(stats.totals.ce_oi, 180.0);
        // settling at 25350 costs 100 calls × 50, at 25300 it costs 200 puts × 50
        assert_eq!(stats.max_pain.unwrap().strike, 25350.0);
        assert!(stats.pcr_overall.unwrap() < stats.pcr_window.unwrap());

        assert_matches!(
            compute_window_stats(&quotes, f64::NAN, &WindowSpec::default()),
            Err(AnalyticsError::InsufficientData(_))
        );
    }

    #[test]
    fn test_external_stats_decode() {
        let stats: ExternalStats = serde_json::from_value(json!({
            "atm": 25350, "low": 24850, "high": 25900,
            "pcr_window": 1.31, "pcr_overall": "0.92",
            "pcr_window_details": {"CE_OI": 100, "PE_OI": 131, "CE_vol": 5, "PE_vol": 6},
            "vwap": {"CE": 88.1, "PE": null},
            "max_pain": {"max_pain_strike": 25300, "pain_map": {"25300": 1.0}},
            "skew": null, "prev_close": 25327.05, "avg_val": null
        }))
        .unwrap();
        assert_eq!(stats.pcr_overall, Some(0.92));
        assert_eq!(stats.vwap.put, None);
        assert_eq!(stats.pcr_window_details.unwrap().pe_oi, 131.0);
        assert_eq!(stats.max_pain.unwrap().max_pain_strike, Some(25300.0));
    }
}
