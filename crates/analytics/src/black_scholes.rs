//! Black-Scholes pricing with a continuous dividend yield.
//!
//! Used to synthesise the fallback greeks chain. Theta is quoted per
//! calendar day, matching what the greeks service publishes.

use crate::types::OptionSide;
use std::f64::consts::PI;

pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsInputs {
    pub spot: f64,
    pub strike: f64,
    /// Years to expiry
    pub time: f64,
    pub vol: f64,
    pub rate: f64,
    pub dividend: f64,
    pub side: OptionSide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BsGreeks {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
    /// Per calendar day
    pub theta: f64,
}

pub fn norm_pdf(x: f64) -> f64 {
    (1.0 / (2.0 * PI).sqrt()) * (-0.5 * x * x).exp()
}

/// Abramowitz-Stegun approximation
pub fn norm_cdf(x: f64) -> f64 {
    let k = 1.0 / (1.0 + 0.2316419 * x.abs());
    let poly = k
        * (0.319381530
            + k * (-0.356563782 + k * (1.781477937 + k * (-1.821255978 + k * 1.330274429))));

    let approx = 1.0 - norm_pdf(x) * poly;

    if x >= 0.0 {
        approx
    } else {
        1.0 - approx
    }
}

pub fn intrinsic_value(spot: f64, strike: f64, side: OptionSide) -> f64 {
    match side {
        OptionSide::Call => (spot - strike).max(0.0),
        OptionSide::Put => (strike - spot).max(0.0),
    }
}

fn d1_d2(input: &BsInputs) -> (f64, f64) {
    let sqrt_t = input.time.sqrt();
    let d1 = ((input.spot / input.strike).ln()
        + (input.rate - input.dividend + 0.5 * input.vol * input.vol) * input.time)
        / (input.vol * sqrt_t);
    (d1, d1 - input.vol * sqrt_t)
}

/// Price and first-order greeks.
///
/// At or past expiry (or with zero vol) the option is worth its intrinsic
/// value, delta is a step and gamma/theta vanish.
pub fn price_and_greeks(input: BsInputs) -> BsGreeks {
    let BsInputs {
        spot: s,
        strike: k,
        time: t,
        vol: v,
        rate: r,
        dividend: q,
        side,
    } = input;

    if t <= 0.0 || v <= 0.0 {
        let itm = match side {
            OptionSide::Call => s > k,
            OptionSide::Put => s < k,
        };
        let delta = match (side, itm) {
            (OptionSide::Call, true) => 1.0,
            (OptionSide::Put, true) => -1.0,
            _ => 0.0,
        };
        return BsGreeks {
            price: intrinsic_value(s, k, side),
            delta,
            gamma: 0.0,
            theta: 0.0,
        };
    }

    let (d1, d2) = d1_d2(&input);
    let sqrt_t = t.sqrt();
    let div = (-q * t).exp();
    let disc = (-r * t).exp();
    let pdf = norm_pdf(d1);

    let (price, delta) = match side {
        OptionSide::Call => (
            s * div * norm_cdf(d1) - k * disc * norm_cdf(d2),
            div * norm_cdf(d1),
        ),
        OptionSide::Put => (
            k * disc * norm_cdf(-d2) - s * div * norm_cdf(-d1),
            div * (norm_cdf(d1) - 1.0),
        ),
    };

    let gamma = div * pdf / (s * v * sqrt_t);

    let decay = -(s * v * div * pdf) / (2.0 * sqrt_t);
    let theta_annual = match side {
        OptionSide::Call => decay + q * s * div * norm_cdf(d1) - r * k * disc * norm_cdf(d2),
        OptionSide::Put => decay - q * s * div * norm_cdf(-d1) + r * k * disc * norm_cdf(-d2),
    };

    BsGreeks {
        price: price.max(0.0),
        delta,
        gamma,
        theta: theta_annual / DAYS_PER_YEAR,
    }
}
