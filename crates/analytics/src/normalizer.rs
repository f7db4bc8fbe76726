//! Option-chain normalizer
//!
//! Upstream quote records are loosely typed: field names vary between
//! endpoints (`bidPrice` vs `bidprice`, `expiry` vs `expiryDate`) and
//! numbers sometimes arrive as strings. All of that is resolved here, once,
//! through [`FIELD_ALIASES`]; everything downstream sees [`OptionQuote`].

use crate::error::AnalyticsError;
use crate::types::{Expiry, OptionQuote, OptionSide};
use crate::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

/// Canonical quote fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteField {
    Strike,
    Side,
    OpenInterest,
    OpenInterestChange,
    Volume,
    LastPrice,
    LastPriceChange,
    ImpliedVolatility,
    BidQty,
    BidPrice,
    AskQty,
    AskPrice,
    Expiry,
    UnderlyingPrice,
}

/// Upstream key aliases per canonical field, in lookup order
pub const FIELD_ALIASES: &[(QuoteField, &[&str])] = &[
    (QuoteField::Strike, &["strike", "strikePrice", "strike_price"]),
    (QuoteField::Side, &["optionType", "side", "type"]),
    (QuoteField::OpenInterest, &["OI", "openInterest", "oi"]),
    (
        QuoteField::OpenInterestChange,
        &["OI_change", "changeinOpenInterest", "oi_change"],
    ),
    (QuoteField::Volume, &["volume", "totalTradedVolume"]),
    (QuoteField::LastPrice, &["lastPrice", "ltp"]),
    (QuoteField::LastPriceChange, &["LTP_change", "change"]),
    (QuoteField::ImpliedVolatility, &["impliedVolatility", "iv"]),
    (QuoteField::BidQty, &["bidQty", "bidqty"]),
    (QuoteField::BidPrice, &["bidPrice", "bidprice"]),
    (QuoteField::AskQty, &["askQty", "askqty"]),
    (QuoteField::AskPrice, &["askPrice", "askprice"]),
    (QuoteField::Expiry, &["expiry", "expiryDate", "expiry_date"]),
    (
        QuoteField::UnderlyingPrice,
        &["underlyingPrice", "underlying", "underlyingValue"],
    ),
];

fn aliases(field: QuoteField) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, a)| *a)
        .unwrap_or(&[])
}

/// Coerce a JSON value to a finite number (numeric strings included)
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Serde adapter: any non-numeric value deserializes to `None` instead of failing
pub fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_f64))
}

/// First alias carrying a usable number, or 0
fn number(obj: &Map<String, Value>, field: QuoteField) -> f64 {
    aliases(field)
        .iter()
        .filter_map(|k| obj.get(*k))
        .find_map(coerce_f64)
        .unwrap_or(0.0)
}

fn text(obj: &Map<String, Value>, field: QuoteField) -> Option<String> {
    aliases(field)
        .iter()
        .filter_map(|k| obj.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
}

/// Parse the expiry formats seen upstream
pub fn parse_expiry(raw: &str) -> Expiry {
    let s = raw.trim();
    let date = NaiveDate::parse_from_str(s, "%d-%b-%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| DateTime::parse_from_rfc2822(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            // Flask renders pandas timestamps as "Tue, 14 Oct 2025 00:00:00 GMT"
            NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S GMT")
                .ok()
                .map(|dt| dt.date())
        });

    Expiry {
        raw: s.to_string(),
        date,
    }
}

/// Normalize a single record; `None` when strike or side is unusable
pub fn normalize_record(obj: &Map<String, Value>) -> Option<OptionQuote> {
    let strike = number(obj, QuoteField::Strike);
    if !(strike.is_finite() && strike > 0.0) {
        return None;
    }
    let side = text(obj, QuoteField::Side).and_then(|s| OptionSide::parse(&s))?;

    Some(OptionQuote {
        strike,
        side,
        open_interest: number(obj, QuoteField::OpenInterest),
        open_interest_change: number(obj, QuoteField::OpenInterestChange),
        volume: number(obj, QuoteField::Volume),
        last_price: number(obj, QuoteField::LastPrice),
        last_price_change: number(obj, QuoteField::LastPriceChange),
        implied_volatility: number(obj, QuoteField::ImpliedVolatility),
        bid_qty: number(obj, QuoteField::BidQty),
        bid_price: number(obj, QuoteField::BidPrice),
        ask_qty: number(obj, QuoteField::AskQty),
        ask_price: number(obj, QuoteField::AskPrice),
        expiry: text(obj, QuoteField::Expiry).map(|e| parse_expiry(&e)),
        underlying_price: number(obj, QuoteField::UnderlyingPrice),
    })
}

/// Normalize a flat array of quote records.
///
/// Non-array input is a [`AnalyticsError::MalformedResponse`]; individual
/// records that are not objects or lack a usable strike/side are skipped.
pub fn normalize(payload: &Value) -> Result<Vec<OptionQuote>> {
    let records = payload
        .as_array()
        .ok_or_else(|| AnalyticsError::malformed("option chain response is not an array"))?;

    let quotes: Vec<OptionQuote> = records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(normalize_record)
        .collect();

    let dropped = records.len() - quotes.len();
    if dropped > 0 {
        debug!(dropped, kept = quotes.len(), "Dropped unusable option-chain records");
    }

    Ok(quotes)
}

/// Flatten the exchange's native nested chain
/// (`records.data[].{strikePrice, expiryDate, CE, PE}`) into quotes.
pub fn normalize_exchange_chain(payload: &Value) -> Result<Vec<OptionQuote>> {
    let records = payload
        .get("records")
        .ok_or_else(|| AnalyticsError::malformed("exchange chain has no 'records'"))?;
    let data = records
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| AnalyticsError::malformed("exchange chain 'records.data' is not an array"))?;
    let underlying = records.get("underlyingValue").and_then(coerce_f64);

    let mut quotes = Vec::with_capacity(data.len() * 2);
    for entry in data.iter().filter_map(Value::as_object) {
        for side in [OptionSide::Call, OptionSide::Put] {
            let Some(leg) = entry.get(side.as_str()).and_then(Value::as_object) else {
                continue;
            };

            let mut merged = leg.clone();
            for key in ["strikePrice", "expiryDate"] {
                if let Some(v) = entry.get(key) {
                    merged.entry(key.to_string()).or_insert_with(|| v.clone());
                }
            }
            merged.insert("optionType".to_string(), Value::from(side.as_str()));
            if let Some(u) = underlying {
                merged
                    .entry("underlyingValue".to_string())
                    .or_insert_with(|| Value::from(u));
            }

            if let Some(q) = normalize_record(&merged) {
                quotes.push(q);
            }
        }
    }

    Ok(quotes)
}

/// Underlying value reported by the snapshot (first positive one)
pub fn underlying_from_quotes(quotes: &[OptionQuote]) -> Option<f64> {
    quotes
        .iter()
        .map(|q| q.underlying_price)
        .find(|u| u.is_finite() && *u > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_missing_and_garbage_fields_default_to_zero() {
        let quotes = normalize(&json!([
            { "strike": 25300, "optionType": "CE", "OI": "abc", "volume": null }
        ]))
        .unwrap();

        assert_eq!(quotes.len(), 1);
        let q = &quotes[0];
        assert_eq!(q.open_interest, 0.0);
        assert_eq!(q.volume, 0.0);
        assert_eq!(q.bid_price, 0.0);
        assert!(q.expiry.is_none());
    }

    #[test]
    fn test_aliases_resolve() {
        let quotes = normalize(&json!([{
            "strike": "25350",
            "optionType": "PE",
            "OI": 1200,
            "OI_change": -40,
            "bidprice": 101.5,
            "askprice": "102.25",
            "expiryDate": "14-Oct-2025",
            "underlyingPrice": 25327.05
        }]))
        .unwrap();

        let q = &quotes[0];
        assert_eq!(q.strike, 25350.0);
        assert_eq!(q.side, OptionSide::Put);
        assert_eq!(q.open_interest_change, -40.0);
        assert_eq!(q.bid_price, 101.5);
        assert_eq!(q.ask_price, 102.25);
        assert_eq!(q.expiry_raw(), Some("14-Oct-2025"));
        assert_eq!(
            q.expiry.as_ref().and_then(|e| e.date),
            NaiveDate::from_ymd_opt(2025, 10, 14)
        );
        assert_eq!(underlying_from_quotes(&quotes), Some(25327.05));
    }

    #[test]
    fn test_invalid_strike_and_side_dropped() {
        let quotes = normalize(&json!([
            { "strike": "n/a", "optionType": "CE" },
            { "strike": -50, "optionType": "CE" },
            { "strike": 25300, "optionType": "FUT" },
            { "strike": 25300, "optionType": "CE" },
            "not an object"
        ]))
        .unwrap();

        assert_eq!(quotes.len(), 1);
    }

    #[test]
    fn test_non_array_is_malformed() {
        let err = normalize(&json!({ "error": "fetch_failed" })).unwrap_err();
        assert_matches!(err, AnalyticsError::MalformedResponse(_));
    }

    #[test]
    fn test_expiry_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 14);
        assert_eq!(parse_expiry("14-Oct-2025").date, expected);
        assert_eq!(parse_expiry("2025-10-14").date, expected);
        assert_eq!(parse_expiry("2025-10-14T00:00:00").date, expected);
        assert_eq!(parse_expiry("Tue, 14 Oct 2025 00:00:00 GMT").date, expected);
        assert_eq!(parse_expiry("2025-10-14 (Mock)").date, None);
    }

    #[test]
    fn test_exchange_chain_flattening() {
        let payload = json!({
            "records": {
                "underlyingValue": 25327.05,
                "data": [{
                    "strikePrice": 25300,
                    "expiryDate": "14-Oct-2025",
                    "CE": { "openInterest": 100, "changeinOpenInterest": 5, "totalTradedVolume": 900, "lastPrice": 80.5 },
                    "PE": { "openInterest": 50, "bidprice": 40.1 }
                }, {
                    "strikePrice": 25350,
                    "expiryDate": "14-Oct-2025",
                    "PE": { "openInterest": 200 }
                }]
            }
        });

        let quotes = normalize_exchange_chain(&payload).unwrap();
        assert_eq!(quotes.len(), 3);

        let ce = &quotes[0];
        assert_eq!(ce.side, OptionSide::Call);
        assert_eq!(ce.open_interest, 100.0);
        assert_eq!(ce.open_interest_change, 5.0);
        assert_eq!(ce.volume, 900.0);
        assert_eq!(ce.underlying_price, 25327.05);

        assert_eq!(quotes[1].bid_price, 40.1);
        assert_eq!(quotes[2].strike, 25350.0);
    }

    #[test]
    fn test_exchange_chain_without_records_is_malformed() {
        assert_matches!(
            normalize_exchange_chain(&json!([])),
            Err(AnalyticsError::MalformedResponse(_))
        );
    }
}
