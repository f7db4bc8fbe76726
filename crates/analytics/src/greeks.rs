//! Greeks mapper
//!
//! Projects each option's LTP over an operator-supplied index move using
//! delta alone: `expected_change = delta × move`, `target = ltp + expected_change`.
//! This is a first-order approximation, not a repricing. Every output is a
//! display string and any missing input renders as `"N/A"`.

use crate::normalizer::lenient_f64;
use crate::types::{Moneyness, OptionSide};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGreeks {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub delta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub theta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub iv: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMarketData {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ltp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub oi: Option<f64>,
}

/// One side of a strike as the greeks service sends it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOptionSide {
    #[serde(default, alias = "greeks")]
    pub option_greeks: RawGreeks,
    #[serde(default, alias = "marketData")]
    pub market_data: RawMarketData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGreeksStrike {
    #[serde(default, alias = "strikePrice", alias = "strike", deserialize_with = "lenient_f64")]
    pub strike_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub expiry: Option<String>,
    #[serde(default, alias = "callOptions")]
    pub call_options: Option<RawOptionSide>,
    #[serde(default, alias = "putOptions")]
    pub put_options: Option<RawOptionSide>,
}

impl RawGreeksStrike {
    pub fn side(&self, side: OptionSide) -> Option<&RawOptionSide> {
        match side {
            OptionSide::Call => self.call_options.as_ref(),
            OptionSide::Put => self.put_options.as_ref(),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(v @ Value::Number(_)) => Some(v.to_string()),
        _ => None,
    })
}

/// Formatted greeks for one option side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreeksRow {
    pub delta: String,
    pub theta: String,
    pub iv: String,
    pub open_interest: String,
    pub last_price: String,
    pub expected_change: String,
    pub target_price: String,
}

fn fmt(value: Option<f64>, decimals: usize) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.*}", decimals, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Map one raw side; a missing side maps to all `"N/A"`
pub fn map_option_side(raw: Option<&RawOptionSide>, expected_move: Option<f64>) -> GreeksRow {
    let (greeks, market) = match raw {
        Some(r) => (r.option_greeks.clone(), r.market_data.clone()),
        None => (RawGreeks::default(), RawMarketData::default()),
    };
    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

    let expected_change = match (finite(greeks.delta), finite(expected_move)) {
        (Some(delta), Some(mv)) => Some(delta * mv),
        _ => None,
    };
    let target_price = match (finite(market.ltp), expected_change) {
        (Some(ltp), Some(change)) => Some(ltp + change),
        _ => None,
    };

    GreeksRow {
        delta: fmt(greeks.delta, 4),
        theta: fmt(greeks.theta, 2),
        iv: fmt(greeks.iv, 2),
        open_interest: fmt(market.oi, 0),
        last_price: fmt(market.ltp, 2),
        expected_change: fmt(expected_change, 2),
        target_price: fmt(target_price, 2),
    }
}

/// Strikes from `atm − down·step` to `atm + up·step`, ascending
pub fn strike_ladder(atm: f64, down: u32, up: u32, step: f64) -> Vec<f64> {
    (0..=down)
        .rev()
        .map(|i| atm - f64::from(i) * step)
        .chain((1..=up).map(|i| atm + f64::from(i) * step))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreeksStrikeRow {
    pub strike: f64,
    pub expiry: Option<String>,
    pub call_moneyness: Moneyness,
    pub put_moneyness: Moneyness,
    pub call: GreeksRow,
    pub put: GreeksRow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreeksTable {
    pub atm_strike: f64,
    pub rows: Vec<GreeksStrikeRow>,
    /// Ladder strikes the chain had no entry for
    pub missing_strikes: Vec<f64>,
}

fn on_ladder(ladder: &[f64], strike: f64) -> bool {
    ladder.iter().any(|s| (s - strike).abs() < 1e-6)
}

/// Map a raw chain onto the strike ladder around `atm`.
///
/// Strikes off the ladder are dropped; a strike appearing twice keeps its
/// first entry.
pub fn map_greeks_chain(
    chain: &[RawGreeksStrike],
    atm: f64,
    ladder: &[f64],
    expected_move: Option<f64>,
) -> GreeksTable {
    let mut kept: Vec<(f64, &RawGreeksStrike)> = Vec::new();
    for entry in chain {
        let Some(strike) = entry.strike_price.filter(|s| s.is_finite()) else {
            continue;
        };
        if on_ladder(ladder, strike) && !kept.iter().any(|(s, _)| (*s - strike).abs() < 1e-6) {
            kept.push((strike, entry));
        }
    }
    kept.sort_by(|a, b| a.0.total_cmp(&b.0));

    let missing_strikes = ladder
        .iter()
        .copied()
        .filter(|s| !kept.iter().any(|(k, _)| (k - s).abs() < 1e-6))
        .collect();

    let rows = kept
        .into_iter()
        .map(|(strike, entry)| GreeksStrikeRow {
            strike,
            expiry: entry.expiry.clone(),
            call_moneyness: Moneyness::classify(strike, atm, OptionSide::Call),
            put_moneyness: Moneyness::classify(strike, atm, OptionSide::Put),
            call: map_option_side(entry.side(OptionSide::Call), expected_move),
            put: map_option_side(entry.side(OptionSide::Put), expected_move),
        })
        .collect();

    GreeksTable {
        atm_strike: atm,
        rows,
        missing_strikes,
    }
}

/// Decode a bare chain array, skipping entries that are not objects
pub fn parse_greeks_chain(payload: &Value) -> Vec<RawGreeksStrike> {
    payload
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|v| v.is_object())
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
