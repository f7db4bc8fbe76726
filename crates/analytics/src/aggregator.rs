//! Strike aggregator
//!
//! Folds normalized quotes into one row per strike with call and put legs
//! side by side, keyed by `OrderedFloat` so rows come out in strike order.

use crate::types::{put_call_ratio, OptionQuote, OptionSide, StrikeRow};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Quote filter; every bound is optional and they combine with AND
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteFilter {
    pub expiry: Option<String>,
    pub strike_min: Option<f64>,
    pub strike_max: Option<f64>,
}

impl QuoteFilter {
    pub fn matches(&self, quote: &OptionQuote) -> bool {
        if let Some(expiry) = &self.expiry {
            if quote.expiry_raw() != Some(expiry.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.strike_min {
            if quote.strike < min {
                return false;
            }
        }
        if let Some(max) = self.strike_max {
            if quote.strike > max {
                return false;
            }
        }
        true
    }
}

/// Group quotes by strike.
///
/// OI, OI change and volume accumulate per side; last price, price change
/// and the top-of-book fields take the last quote seen for that side.
/// Output is sorted ascending by strike with one row per strike.
pub fn aggregate_strikes(quotes: &[OptionQuote], filter: &QuoteFilter) -> Vec<StrikeRow> {
    let mut by_strike: BTreeMap<OrderedFloat<f64>, StrikeRow> = BTreeMap::new();

    for quote in quotes.iter().filter(|q| filter.matches(q)) {
        let row = by_strike
            .entry(OrderedFloat(quote.strike))
            .or_insert_with(|| StrikeRow::new(quote.strike));

        let side = row.side_mut(quote.side);
        side.open_interest += quote.open_interest;
        side.open_interest_change += quote.open_interest_change;
        side.volume += quote.volume;
        side.last_price = quote.last_price;
        side.last_price_change = quote.last_price_change;
        side.bid_qty = quote.bid_qty;
        side.bid_price = quote.bid_price;
        side.ask_qty = quote.ask_qty;
        side.ask_price = quote.ask_price;
        side.quote_count += 1;
    }

    let mut rows: Vec<StrikeRow> = by_strike.into_values().collect();
    for row in &mut rows {
        row.total_oi = row.ce_oi() + row.pe_oi();
        row.pcr = put_call_ratio(row.ce_oi(), row.pe_oi());
    }
    rows
}

/// Distinct expiries, nearest first.
///
/// Dated expiries sort by date; unparseable ones follow in lexical order.
pub fn expiries(quotes: &[OptionQuote]) -> Vec<String> {
    let mut seen: Vec<(Option<chrono::NaiveDate>, String)> = Vec::new();
    for expiry in quotes.iter().filter_map(|q| q.expiry.as_ref()) {
        if !seen.iter().any(|(_, raw)| *raw == expiry.raw) {
            seen.push((expiry.date, expiry.raw.clone()));
        }
    }

    seen.sort_by(|(da, ra), (db, rb)| match (da, db) {
        (Some(a), Some(b)) => a.cmp(b).then_with(|| ra.cmp(rb)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => ra.cmp(rb),
    });

    seen.into_iter().map(|(_, raw)| raw).collect()
}

/// Call/put OI for one expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiryOi {
    pub expiry: String,
    pub ce_oi: f64,
    pub pe_oi: f64,
}

/// OI per expiry across the whole snapshot, in [`expiries`] order
pub fn expiry_profile(quotes: &[OptionQuote]) -> Vec<ExpiryOi> {
    expiries(quotes)
        .into_iter()
        .map(|expiry| {
            let (ce_oi, pe_oi) = quotes
                .iter()
                .filter(|q| q.expiry_raw() == Some(expiry.as_str()))
                .fold((0.0, 0.0), |(ce, pe), q| match q.side {
                    OptionSide::Call => (ce + q.open_interest, pe),
                    OptionSide::Put => (ce, pe + q.open_interest),
                });
            ExpiryOi {
                expiry,
                ce_oi,
                pe_oi,
            }
        })
        .collect()
}

/// Largest total OI across rows (0 when empty)
pub fn max_total_oi(rows: &[StrikeRow]) -> f64 {
    rows.iter().map(|r| r.total_oi).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::parse_expiry;

    fn quote(strike: f64, side: OptionSide, oi: f64, expiry: &str) -> OptionQuote {
        OptionQuote {
            open_interest: oi,
            volume: oi / 10.0,
            expiry: Some(parse_expiry(expiry)),
            ..OptionQuote::empty(strike, side)
        }
    }

    #[test]
    fn test_rows_sorted_and_unique() {
        let quotes = vec![
            quote(25400.0, OptionSide::Call, 10.0, "14-Oct-2025"),
            quote(25300.0, OptionSide::Put, 20.0, "14-Oct-2025"),
            quote(25400.0, OptionSide::Put, 30.0, "14-Oct-2025"),
            quote(25350.0, OptionSide::Call, 40.0, "14-Oct-2025"),
            quote(25300.0, OptionSide::Call, 50.0, "14-Oct-2025"),
        ];

        let rows = aggregate_strikes(&quotes, &QuoteFilter::default());
        let strikes: Vec<f64> = rows.iter().map(|r| r.strike).collect();
        assert_eq!(strikes, vec![25300.0, 25350.0, 25400.0]);
        assert!(strikes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sums_accumulate_and_prices_overwrite() {
        let mut first = quote(25300.0, OptionSide::Call, 100.0, "14-Oct-2025");
        first.last_price = 80.0;
        first.bid_price = 79.5;
        let mut second = quote(25300.0, OptionSide::Call, 40.0, "14-Oct-2025");
        second.last_price = 82.0;
        second.bid_price = 81.0;
        second.open_interest_change = 7.0;

        let rows = aggregate_strikes(&[first, second], &QuoteFilter::default());
        let call = &rows[0].call;
        assert_eq!(call.open_interest, 140.0);
        assert_eq!(call.volume, 14.0);
        assert_eq!(call.open_interest_change, 7.0);
        assert_eq!(call.last_price, 82.0);
        assert_eq!(call.bid_price, 81.0);
        assert_eq!(call.quote_count, 2);
    }

    #[test]
    fn test_pcr_and_total() {
        let quotes = vec![
            quote(25300.0, OptionSide::Call, 100.0, "14-Oct-2025"),
            quote(25300.0, OptionSide::Put, 50.0, "14-Oct-2025"),
            quote(25350.0, OptionSide::Put, 200.0, "14-Oct-2025"),
            quote(25400.0, OptionSide::Call, 0.0, "14-Oct-2025"),
        ];

        let rows = aggregate_strikes(&quotes, &QuoteFilter::default());
        assert_eq!(rows[0].total_oi, 150.0);
        assert_eq!(rows[0].pcr, Some(0.5));
        assert_eq!(rows[1].pcr, Some(f64::INFINITY));
        assert_eq!(rows[2].pcr, None);
        assert_eq!(max_total_oi(&rows), 200.0);
    }

    #[test]
    fn test_filters_combine() {
        let quotes = vec![
            quote(25200.0, OptionSide::Call, 1.0, "14-Oct-2025"),
            quote(25300.0, OptionSide::Call, 1.0, "14-Oct-2025"),
            quote(25300.0, OptionSide::Call, 1.0, "21-Oct-2025"),
            quote(25500.0, OptionSide::Call, 1.0, "14-Oct-2025"),
        ];
        let filter = QuoteFilter {
            expiry: Some("14-Oct-2025".to_string()),
            strike_min: Some(25250.0),
            strike_max: Some(25400.0),
        };

        let rows = aggregate_strikes(&quotes, &filter);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].strike, 25300.0);
        assert_eq!(rows[0].ce_oi(), 1.0);
    }

    #[test]
    fn test_expiries_nearest_first() {
        let quotes = vec![
            quote(25300.0, OptionSide::Call, 10.0, "28-Oct-2025"),
            quote(25300.0, OptionSide::Put, 20.0, "14-Oct-2025"),
            quote(25350.0, OptionSide::Call, 5.0, "weekly"),
            quote(25350.0, OptionSide::Put, 5.0, "14-Oct-2025"),
        ];

        assert_eq!(expiries(&quotes), vec!["14-Oct-2025", "28-Oct-2025", "weekly"]);

        let profile = expiry_profile(&quotes);
        assert_eq!(profile[0].pe_oi, 25.0);
        assert_eq!(profile[1].ce_oi, 10.0);
    }
}
