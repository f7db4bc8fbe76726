//! Shared types for the analytics engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Option side (call or put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionSide {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionSide {
    /// Parse the exchange's side code (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CE" | "CALL" | "C" => Some(Self::Call),
            "PE" | "PUT" | "P" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract expiry as sent upstream, plus its parsed date when recognisable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiry {
    pub raw: String,
    pub date: Option<NaiveDate>,
}

/// One exchange quote for one (strike, side) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub side: OptionSide,
    pub open_interest: f64,
    pub open_interest_change: f64,
    pub volume: f64,
    pub last_price: f64,
    pub last_price_change: f64,
    pub implied_volatility: f64,
    pub bid_qty: f64,
    pub bid_price: f64,
    pub ask_qty: f64,
    pub ask_price: f64,
    pub expiry: Option<Expiry>,
    /// Underlying index value reported alongside the quote (0 when absent)
    pub underlying_price: f64,
}

impl OptionQuote {
    /// Quote with every numeric field zeroed
    pub fn empty(strike: f64, side: OptionSide) -> Self {
        Self {
            strike,
            side,
            open_interest: 0.0,
            open_interest_change: 0.0,
            volume: 0.0,
            last_price: 0.0,
            last_price_change: 0.0,
            implied_volatility: 0.0,
            bid_qty: 0.0,
            bid_price: 0.0,
            ask_qty: 0.0,
            ask_price: 0.0,
            expiry: None,
            underlying_price: 0.0,
        }
    }

    pub fn expiry_raw(&self) -> Option<&str> {
        self.expiry.as_ref().map(|e| e.raw.as_str())
    }
}

/// Per-side sums and last-seen prices inside a [`StrikeRow`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideAggregate {
    pub open_interest: f64,
    pub open_interest_change: f64,
    pub volume: f64,
    pub last_price: f64,
    pub last_price_change: f64,
    pub bid_qty: f64,
    pub bid_price: f64,
    pub ask_qty: f64,
    pub ask_price: f64,
    /// Number of quotes folded into this side
    pub quote_count: u32,
}

/// Aggregation of all quotes sharing a strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeRow {
    pub strike: f64,
    pub call: SideAggregate,
    pub put: SideAggregate,
    pub total_oi: f64,
    /// Put OI / call OI; `None` when both are zero, `+inf` when only puts carry OI
    pub pcr: Option<f64>,
}

impl StrikeRow {
    pub fn new(strike: f64) -> Self {
        Self {
            strike,
            call: SideAggregate::default(),
            put: SideAggregate::default(),
            total_oi: 0.0,
            pcr: None,
        }
    }

    pub fn side(&self, side: OptionSide) -> &SideAggregate {
        match side {
            OptionSide::Call => &self.call,
            OptionSide::Put => &self.put,
        }
    }

    pub fn side_mut(&mut self, side: OptionSide) -> &mut SideAggregate {
        match side {
            OptionSide::Call => &mut self.call,
            OptionSide::Put => &mut self.put,
        }
    }

    pub fn ce_oi(&self) -> f64 {
        self.call.open_interest
    }

    pub fn pe_oi(&self) -> f64 {
        self.put.open_interest
    }
}

/// Put-call ratio with the dashboard's edge-case rule.
///
/// Returns `None` when neither side has open interest and `+inf`
/// when only the put side does.
pub fn put_call_ratio(call: f64, put: f64) -> Option<f64> {
    if call != 0.0 {
        Some(put / call)
    } else if put > 0.0 {
        Some(f64::INFINITY)
    } else {
        None
    }
}

/// Strike moneyness relative to the ATM strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Moneyness {
    Itm,
    Atm,
    Otm,
}

impl Moneyness {
    /// Classify one side of a strike: below ATM calls are ITM and puts OTM, above ATM the reverse
    pub fn classify(strike: f64, atm: f64, side: OptionSide) -> Self {
        if strike == atm {
            return Self::Atm;
        }
        match (strike < atm, side) {
            (true, OptionSide::Call) | (false, OptionSide::Put) => Self::Itm,
            (true, OptionSide::Put) | (false, OptionSide::Call) => Self::Otm,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Itm => "ITM",
            Self::Atm => "ATM",
            Self::Otm => "OTM",
        }
    }
}

/// Index OHLC snapshot for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexOhlc {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// Session close; for the live session this is usually absent
    pub close: Option<f64>,
    pub last: Option<f64>,
    pub prev_close: Option<f64>,
    pub avg_val: Option<f64>,
    pub timestamp: Option<String>,
}

impl IndexOhlc {
    /// Closing value used for pivots: close, then previous close.
    /// `last` is an intraday value and never stands in for the close.
    pub fn session_close(&self) -> Option<f64> {
        [self.close, self.prev_close]
            .into_iter()
            .flatten()
            .find(|v| v.is_finite())
    }

    /// Live index value used for pivot differences: last, then previous close
    pub fn current_value(&self) -> Option<f64> {
        [self.last, self.prev_close]
            .into_iter()
            .flatten()
            .find(|v| v.is_finite())
    }
}

/// Advance/decline counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketBreadth {
    pub advance: Option<f64>,
    pub decline: Option<f64>,
}

impl MarketBreadth {
    pub fn advance_decline_ratio(&self) -> Option<f64> {
        match (self.advance, self.decline) {
            (Some(a), Some(d)) if d > 0.0 => Some(a / d),
            _ => None,
        }
    }
}

/// Per-side volume-weighted average price
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideVwap {
    #[serde(rename = "CE", default)]
    pub call: Option<f64>,
    #[serde(rename = "PE", default)]
    pub put: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcr_edge_cases() {
        assert_eq!(put_call_ratio(0.0, 0.0), None);
        assert_eq!(put_call_ratio(0.0, 10.0), Some(f64::INFINITY));
        assert_eq!(put_call_ratio(100.0, 50.0), Some(0.5));
    }

    #[test]
    fn test_moneyness_rule() {
        assert_eq!(Moneyness::classify(25300.0, 25350.0, OptionSide::Call), Moneyness::Itm);
        assert_eq!(Moneyness::classify(25300.0, 25350.0, OptionSide::Put), Moneyness::Otm);
        assert_eq!(Moneyness::classify(25400.0, 25350.0, OptionSide::Call), Moneyness::Otm);
        assert_eq!(Moneyness::classify(25400.0, 25350.0, OptionSide::Put), Moneyness::Itm);
        assert_eq!(Moneyness::classify(25350.0, 25350.0, OptionSide::Put), Moneyness::Atm);
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(OptionSide::parse("ce"), Some(OptionSide::Call));
        assert_eq!(OptionSide::parse(" PE "), Some(OptionSide::Put));
        assert_eq!(OptionSide::parse("FUT"), None);
    }

    #[test]
    fn test_session_close_fallback() {
        let ohlc = IndexOhlc {
            last: Some(25327.05),
            prev_close: Some(25100.0),
            ..Default::default()
        };
        assert_eq!(ohlc.session_close(), Some(25100.0));
        assert_eq!(ohlc.current_value(), Some(25327.05));

        let closed = IndexOhlc {
            close: Some(25200.0),
            ..ohlc
        };
        assert_eq!(closed.session_close(), Some(25200.0));
    }
}
