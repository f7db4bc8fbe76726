//! Decoding of upstream payloads into engine inputs
//!
//! Upstream shapes drift, so every decoder searches for the fields it needs
//! and accepts the aliases seen in the wild instead of binding to one schema.

use crate::error::FeedError;
use crate::Result;
use analytics::greeks::parse_greeks_chain;
use analytics::normalizer::{coerce_f64, normalize, normalize_exchange_chain};
use analytics::{ExternalStats, IndexOhlc, MarketBreadth, OptionQuote, RawGreeksStrike};
use serde_json::{Map, Value};

pub const INDEX_NAME: &str = "NIFTY 50";

const INDEX_NAME_KEYS: [&str; 4] = ["indexName", "index", "name", "symbol"];
const ADVANCE_KEYS: [&str; 3] = ["advances", "advance", "adv"];
const DECLINE_KEYS: [&str; 3] = ["declines", "decline", "dec"];

/// Flat quote array, `{data: [...]}` wrapper, or the exchange's nested chain
pub fn decode_option_chain(source_name: &str, payload: &Value) -> Result<Vec<OptionQuote>> {
    let decoded = match payload {
        Value::Array(_) => normalize(payload),
        Value::Object(obj) if obj.contains_key("records") => normalize_exchange_chain(payload),
        Value::Object(obj) => match obj.get("data") {
            Some(data @ Value::Array(_)) => normalize(data),
            _ => return Err(FeedError::malformed(source_name, "option chain object has no 'data' array")),
        },
        _ => return Err(FeedError::malformed(source_name, "option chain is neither an array nor an object")),
    };
    decoded.map_err(|e| FeedError::malformed(source_name, e.to_string()))
}

fn first_number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(coerce_f64)
}

fn is_index_record(obj: &Map<String, Value>) -> bool {
    INDEX_NAME_KEYS
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .any(|name| name.trim().eq_ignore_ascii_case(INDEX_NAME))
}

/// Depth-first search for the first object matching `pred`
fn find_object<'a>(value: &'a Value, pred: &dyn Fn(&Map<String, Value>) -> bool) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(obj) if pred(obj) => Some(obj),
        Value::Object(obj) => obj.values().find_map(|v| find_object(v, pred)),
        Value::Array(items) => items.iter().find_map(|v| find_object(v, pred)),
        _ => None,
    }
}

fn ohlc_from_record(obj: &Map<String, Value>) -> IndexOhlc {
    IndexOhlc {
        open: first_number(obj, &["open"]),
        high: first_number(obj, &["high"]),
        low: first_number(obj, &["low"]),
        close: first_number(obj, &["close"]),
        last: first_number(obj, &["last", "lastPrice", "ltp"]),
        prev_close: first_number(obj, &["previousClose", "prevClose", "prev_close"]),
        avg_val: first_number(obj, &["avg_val", "avgVal"]),
        timestamp: ["timestamp", "date", "time"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(str::to_string),
    }
}

/// The `NIFTY 50` record anywhere in the payload, else a top-level OHLC object
pub fn decode_index_ohlc(source_name: &str, payload: &Value) -> Result<IndexOhlc> {
    let record = find_object(payload, &is_index_record).or_else(|| {
        payload
            .as_object()
            .filter(|obj| ["high", "low"].iter().all(|k| obj.contains_key(*k)))
    });

    let Some(record) = record else {
        return Err(FeedError::malformed(
            source_name,
            format!("no '{}' record in index payload", INDEX_NAME),
        ));
    };

    let ohlc = ohlc_from_record(record);
    if ohlc.high.is_none() && ohlc.low.is_none() && ohlc.last.is_none() && ohlc.prev_close.is_none() {
        return Err(FeedError::malformed(source_name, "index record carries no prices"));
    }
    Ok(ohlc)
}

/// Advance/decline counts from the first object that carries either
pub fn decode_market_breadth(source_name: &str, payload: &Value) -> Result<MarketBreadth> {
    let has_counts = |obj: &Map<String, Value>| first_number(obj, &ADVANCE_KEYS).is_some() || first_number(obj, &DECLINE_KEYS).is_some();

    let record = find_object(payload, &has_counts)
        .ok_or_else(|| FeedError::malformed(source_name, "no advance/decline counts in payload"))?;

    Ok(MarketBreadth {
        advance: first_number(record, &ADVANCE_KEYS),
        decline: first_number(record, &DECLINE_KEYS),
    })
}

/// Backend window stats; an `error` without an ATM is a failed computation
pub fn decode_window_stats(source_name: &str, payload: &Value) -> Result<ExternalStats> {
    if !payload.is_object() {
        return Err(FeedError::malformed(source_name, "window stats is not an object"));
    }
    let stats: ExternalStats = serde_json::from_value(payload.clone())?;
    if let (Some(err), None) = (&stats.error, stats.atm) {
        return Err(FeedError::malformed(source_name, err.clone()));
    }
    Ok(stats)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GreeksPayload {
    pub chain: Vec<RawGreeksStrike>,
    pub atm_strike: Option<f64>,
}

/// `{status: "success", data, atm_strike}` envelope or a bare array.
///
/// An empty chain counts as malformed so the caller can fall back.
pub fn decode_greeks(source_name: &str, payload: &Value) -> Result<GreeksPayload> {
    let (data, atm_strike) = match payload {
        Value::Array(_) => (payload, None),
        Value::Object(obj) => {
            if let Some(status) = obj.get("status").and_then(Value::as_str) {
                if !status.eq_ignore_ascii_case("success") {
                    let message = obj
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("no message");
                    return Err(FeedError::malformed(
                        source_name,
                        format!("status '{}': {}", status, message),
                    ));
                }
            }
            let data = obj
                .get("data")
                .ok_or_else(|| FeedError::malformed(source_name, "greeks envelope has no 'data'"))?;
            (data, obj.get("atm_strike").and_then(coerce_f64))
        }
        _ => return Err(FeedError::malformed(source_name, "greeks payload is not JSON object or array")),
    };

    let chain = parse_greeks_chain(data);
    if chain.is_empty() {
        return Err(FeedError::malformed(source_name, "greeks chain is empty"));
    }
    Ok(GreeksPayload { chain, atm_strike })
}
