//! Synthetic greeks chain shown when the greeks source is unavailable

use crate::black_scholes::{price_and_greeks, BsInputs, DAYS_PER_YEAR};
use crate::greeks::{RawGreeks, RawGreeksStrike, RawMarketData, RawOptionSide};
use crate::types::OptionSide;

pub const MOCK_EXPIRY_LABEL: &str = "mock";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockGreeksParams {
    pub days_to_expiry: f64,
    /// Annualised, as a fraction
    pub vol: f64,
    pub rate: f64,
    pub dividend: f64,
}

impl Default for MockGreeksParams {
    fn default() -> Self {
        Self {
            days_to_expiry: 7.0,
            vol: 0.12,
            rate: 0.065,
            dividend: 0.0,
        }
    }
}

fn mock_side(spot: f64, strike: f64, side: OptionSide, params: &MockGreeksParams) -> RawOptionSide {
    let g = price_and_greeks(BsInputs {
        spot,
        strike,
        time: params.days_to_expiry / DAYS_PER_YEAR,
        vol: params.vol,
        rate: params.rate,
        dividend: params.dividend,
        side,
    });
    RawOptionSide {
        option_greeks: RawGreeks {
            delta: Some(g.delta),
            theta: Some(g.theta),
            iv: Some(params.vol * 100.0),
        },
        market_data: RawMarketData {
            ltp: Some(g.price),
            oi: None,
        },
    }
}

/// Deterministic chain priced with the index sitting exactly at `atm`
pub fn mock_greeks_chain(atm: f64, ladder: &[f64], params: &MockGreeksParams) -> Vec<RawGreeksStrike> {
    ladder
        .iter()
        .map(|&strike| RawGreeksStrike {
            strike_price: Some(strike),
            expiry: Some(MOCK_EXPIRY_LABEL.to_string()),
            call_options: Some(mock_side(atm, strike, OptionSide::Call, params)),
            put_options: Some(mock_side(atm, strike, OptionSide::Put, params)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greeks::{map_greeks_chain, strike_ladder, NOT_AVAILABLE};

    #[test]
    fn test_mock_chain_covers_ladder() {
        let ladder = strike_ladder(25250.0, 10, 11, 50.0);
        let chain = mock_greeks_chain(25250.0, &ladder, &MockGreeksParams::default());
        assert_eq!(chain.len(), ladder.len());

        let table = map_greeks_chain(&chain, 25250.0, &ladder, Some(100.0));
        assert!(table.missing_strikes.is_empty());
        assert!(table.rows.iter().all(|r| r.call.open_interest == NOT_AVAILABLE));
    }

    #[test]
    fn test_mock_deltas_monotonic() {
        let ladder = strike_ladder(25250.0, 3, 3, 50.0);
        let chain = mock_greeks_chain(25250.0, &ladder, &MockGreeksParams::default());
        let deltas: Vec<f64> = chain
            .iter()
            .filter_map(|c| c.call_options.as_ref()?.option_greeks.delta)
            .collect();
        assert!(deltas.windows(2).all(|w| w[0] > w[1]));
        assert!(deltas.iter().all(|d| (0.0..=1.0).contains(d)));
    }

    #[test]
    fn test_mock_is_deterministic() {
        let ladder = strike_ladder(25250.0, 2, 2, 50.0);
        let params = MockGreeksParams::default();
        assert_eq!(
            mock_greeks_chain(25250.0, &ladder, &params),
            mock_greeks_chain(25250.0, &ladder, &params)
        );
    }
}
