//! Max pain selection
//!
//! Resolution order: an externally supplied strike, then the argmin of an
//! externally supplied pain map, then the strike with the greatest total
//! OI. The last step is a heuristic; [`compute_pain_map`] gives the real
//! writer-loss figure and is reported alongside, never substituted.

use crate::normalizer::{coerce_f64, lenient_f64};
use crate::types::StrikeRow;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Where a max-pain strike came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxPainSource {
    External,
    PainMap,
    HighestOpenInterest,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxPain {
    pub strike: f64,
    pub source: MaxPainSource,
}

/// Max-pain block of the window stats payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalMaxPain {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max_pain_strike: Option<f64>,
    /// Strike (as text) to aggregate writer loss
    #[serde(default)]
    pub pain_map: BTreeMap<String, Value>,
}

impl ExternalMaxPain {
    /// Argmin of the pain map; keys are visited in ascending strike order and
    /// the first minimum wins
    pub fn pain_map_argmin(&self) -> Option<f64> {
        let mut points: Vec<(f64, f64)> = self
            .pain_map
            .iter()
            .filter_map(|(k, v)| {
                let strike = k.trim().parse::<f64>().ok().filter(|s| s.is_finite())?;
                Some((strike, coerce_f64(v)?))
            })
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut best: Option<(f64, f64)> = None;
        for (strike, pain) in points {
            match best {
                Some((_, p)) if pain >= p => {}
                _ => best = Some((strike, pain)),
            }
        }
        best.map(|(strike, _)| strike)
    }
}

/// Pick the max-pain strike for `rows`.
///
/// `None` only when there is no external data and no rows.
pub fn resolve_max_pain(external: Option<&ExternalMaxPain>, rows: &[StrikeRow]) -> Option<MaxPain> {
    if let Some(ext) = external {
        if let Some(strike) = ext.max_pain_strike.filter(|s| s.is_finite()) {
            return Some(MaxPain {
                strike,
                source: MaxPainSource::External,
            });
        }
        if let Some(strike) = ext.pain_map_argmin() {
            return Some(MaxPain {
                strike,
                source: MaxPainSource::PainMap,
            });
        }
    }

    highest_open_interest(rows).map(|strike| MaxPain {
        strike,
        source: MaxPainSource::HighestOpenInterest,
    })
}

/// Strike with the greatest total OI; ties go to the first row
pub fn highest_open_interest(rows: &[StrikeRow]) -> Option<f64> {
    let mut best: Option<&StrikeRow> = None;
    for row in rows.iter().filter(|r| r.strike.is_finite()) {
        match best {
            Some(b) if row.total_oi <= b.total_oi => {}
            _ => best = Some(row),
        }
    }
    best.map(|r| r.strike)
}

/// Aggregate writer payout if the index settles at `strike`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PainPoint {
    pub strike: f64,
    pub pain: f64,
}

/// Writer loss at every candidate settlement strike.
///
/// For candidate `s0`: Σ max(0, s0 − s)·CE_OI(s) + max(0, s − s0)·PE_OI(s).
/// `rows` must already be sorted by strike, as the aggregator emits them.
pub fn compute_pain_map(rows: &[StrikeRow]) -> Vec<PainPoint> {
    rows.iter()
        .map(|candidate| {
            let s0 = candidate.strike;
            let pain = rows
                .iter()
                .map(|r| (s0 - r.strike).max(0.0) * r.ce_oi() + (r.strike - s0).max(0.0) * r.pe_oi())
                .sum();
            PainPoint { strike: s0, pain }
        })
        .collect()
}

/// Minimum of [`compute_pain_map`]; the lowest strike wins ties
pub fn true_max_pain(rows: &[StrikeRow]) -> Option<PainPoint> {
    compute_pain_map(rows)
        .into_iter()
        .fold(None, |best: Option<PainPoint>, p| match best {
            Some(b) if p.pain >= b.pain => Some(b),
            _ => Some(p),
        })
}
