//! Classic floor-trader pivots from the previous session's OHLC

use crate::error::AnalyticsError;
use crate::types::IndexOhlc;
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PivotLabel {
    R3,
    R2,
    R1,
    #[serde(rename = "CP")]
    Pivot,
    S1,
    S2,
    S3,
}

impl PivotLabel {
    /// Display order, resistance on top
    pub const ALL: [PivotLabel; 7] = [
        PivotLabel::R3,
        PivotLabel::R2,
        PivotLabel::R1,
        PivotLabel::Pivot,
        PivotLabel::S1,
        PivotLabel::S2,
        PivotLabel::S3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PivotLabel::R3 => "R3",
            PivotLabel::R2 => "R2",
            PivotLabel::R1 => "R1",
            PivotLabel::Pivot => "CP",
            PivotLabel::S1 => "S1",
            PivotLabel::S2 => "S2",
            PivotLabel::S3 => "S3",
        }
    }
}

/// One row of the pivot table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevel {
    pub label: PivotLabel,
    pub value: f64,
    /// `value − P`
    pub gap: f64,
    /// `current − value`; `None` without a live index value
    pub pivot_diff: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    /// `R1 − S1`
    pub momentum: f64,
    pub current: Option<f64>,
    /// R3 … S3 in display order
    pub levels: Vec<PivotLevel>,
}

impl PivotLevels {
    pub fn level(&self, label: PivotLabel) -> f64 {
        match label {
            PivotLabel::R3 => self.r3,
            PivotLabel::R2 => self.r2,
            PivotLabel::R1 => self.r1,
            PivotLabel::Pivot => self.pivot,
            PivotLabel::S1 => self.s1,
            PivotLabel::S2 => self.s2,
            PivotLabel::S3 => self.s3,
        }
    }
}

/// Pivot levels from raw high/low/close.
///
/// Any non-finite input yields [`AnalyticsError::InsufficientData`].
pub fn pivot_levels(high: f64, low: f64, close: f64, current: Option<f64>) -> Result<PivotLevels> {
    if ![high, low, close].iter().all(|v| v.is_finite()) {
        return Err(AnalyticsError::insufficient(
            "pivot levels require finite previous-session high, low and close",
        ));
    }
    let current = current.filter(|v| v.is_finite());

    let p = (high + low + close) / 3.0;
    let range = high - low;
    let mut out = PivotLevels {
        high,
        low,
        close,
        pivot: p,
        r1: 2.0 * p - low,
        s1: 2.0 * p - high,
        r2: p + range,
        s2: p - range,
        r3: high + 2.0 * (p - low),
        s3: low - 2.0 * (high - p),
        momentum: 0.0,
        current,
        levels: Vec::with_capacity(PivotLabel::ALL.len()),
    };
    out.momentum = out.r1 - out.s1;

    out.levels = PivotLabel::ALL
        .iter()
        .map(|&label| {
            let value = out.level(label);
            PivotLevel {
                label,
                value,
                gap: if label == PivotLabel::Pivot { 0.0 } else { value - p },
                pivot_diff: current.map(|c| c - value),
            }
        })
        .collect();

    Ok(out)
}

/// Pivots from the previous session's OHLC, diffed against today's live value
pub fn compute_pivots(prev: &IndexOhlc, today: Option<&IndexOhlc>) -> Result<PivotLevels> {
    let (Some(high), Some(low), Some(close)) = (prev.high, prev.low, prev.session_close()) else {
        return Err(AnalyticsError::insufficient(
            "previous-session index OHLC required for pivot calculation",
        ));
    };
    pivot_levels(high, low, close, today.and_then(IndexOhlc::current_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() <= 0.01
    }

    #[test]
    fn test_reference_session() {
        let p = pivot_levels(25428.75, 25286.30, 25327.05, None).unwrap();

        assert!(close_to(p.pivot, 25347.37));
        assert!(close_to(p.r1, 25408.43));
        assert!(close_to(p.s1, 25265.98));
        assert!(close_to(p.momentum, 142.45));
        assert!(p.levels.iter().all(|l| l.pivot_diff.is_none()));
    }

    #[test]
    fn test_level_order_and_gaps() {
        let p = pivot_levels(110.0, 90.0, 100.0, Some(105.0)).unwrap();
        let labels: Vec<&str> = p.levels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["R3", "R2", "R1", "CP", "S1", "S2", "S3"]);

        // P = 100, range = 20
        assert_eq!(p.r1, 110.0);
        assert_eq!(p.s1, 90.0);
        assert_eq!(p.r2, 120.0);
        assert_eq!(p.s2, 80.0);
        assert_eq!(p.r3, 130.0);
        assert_eq!(p.s3, 70.0);

        let cp = p.levels[3];
        assert_eq!(cp.gap, 0.0);
        assert_eq!(cp.pivot_diff, Some(5.0));
        assert_eq!(p.levels[0].gap, 30.0);
        assert_eq!(p.levels[6].pivot_diff, Some(35.0));
    }

    #[test]
    fn test_deterministic() {
        let a = pivot_levels(25428.75, 25286.30, 25327.05, Some(25400.0)).unwrap();
        let b = pivot_levels(25428.75, 25286.30, 25327.05, Some(25400.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_inputs() {
        assert_matches!(
            pivot_levels(f64::NAN, 1.0, 1.0, None),
            Err(AnalyticsError::InsufficientData(_))
        );

        let prev = IndexOhlc {
            high: Some(25428.75),
            low: None,
            close: Some(25327.05),
            ..Default::default()
        };
        assert_matches!(compute_pivots(&prev, None), Err(AnalyticsError::InsufficientData(_)));
    }

    #[test]
    fn test_missing_close_uses_previous_close_not_last() {
        let prev = IndexOhlc {
            high: Some(110.0),
            low: Some(90.0),
            last: Some(100.0),
            prev_close: Some(70.0),
            ..Default::default()
        };
        let p = compute_pivots(&prev, None).unwrap();
        // (110 + 90 + 70) / 3
        assert_eq!(p.pivot, 90.0);
        assert_eq!(p.r1, 90.0);
        assert_eq!(p.s1, 70.0);
    }

    #[test]
    fn test_current_from_today() {
        let prev = IndexOhlc {
            high: Some(110.0),
            low: Some(90.0),
            close: Some(100.0),
            ..Default::default()
        };
        let today = IndexOhlc {
            prev_close: Some(98.0),
            ..Default::default()
        };
        let p = compute_pivots(&prev, Some(&today)).unwrap();
        assert_eq!(p.current, Some(98.0));
        assert_eq!(p.levels[3].pivot_diff, Some(-2.0));
    }
}
