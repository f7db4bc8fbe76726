//! Zone classifier (PCR engine)
//!
//! Partitions aggregated strikes into OTM / ATM / ITM buckets around an
//! ATM strike. A strike below ATM sends its call side to ITM and its put
//! side to OTM; above ATM the reverse; the ATM strike sends both sides to
//! ATM. TOTAL receives everything, so for every summed field
//! `TOTAL == OTM + ATM + ITM`.

use crate::error::AnalyticsError;
use crate::types::{put_call_ratio, Moneyness, OptionSide, StrikeRow};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Zone identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneKind {
    Otm,
    Atm,
    Itm,
    Total,
}

impl ZoneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneKind::Otm => "OTM",
            ZoneKind::Atm => "ATM",
            ZoneKind::Itm => "ITM",
            ZoneKind::Total => "TOTAL",
        }
    }
}

impl From<Moneyness> for ZoneKind {
    fn from(m: Moneyness) -> Self {
        match m {
            Moneyness::Otm => ZoneKind::Otm,
            Moneyness::Atm => ZoneKind::Atm,
            Moneyness::Itm => ZoneKind::Itm,
        }
    }
}

/// Inclusive range of contributing strikes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeRange {
    pub min: f64,
    pub max: f64,
}

impl StrikeRange {
    fn extend(range: Option<Self>, strike: f64) -> Option<Self> {
        Some(match range {
            Some(r) => StrikeRange {
                min: r.min.min(strike),
                max: r.max.max(strike),
            },
            None => StrikeRange {
                min: strike,
                max: strike,
            },
        })
    }
}

impl std::fmt::Display for StrikeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

/// One bucket of the PCR table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub ce_oi: f64,
    pub pe_oi: f64,
    pub ce_vol: f64,
    pub pe_vol: f64,
    pub ce_oi_change: f64,
    pub pe_oi_change: f64,
    /// Strikes whose call OI is strictly positive
    pub ce_range: Option<StrikeRange>,
    /// Strikes whose put OI is strictly positive
    pub pe_range: Option<StrikeRange>,
    pub pcr: Option<f64>,
}

impl Zone {
    fn empty(kind: ZoneKind) -> Self {
        Self {
            kind,
            ce_oi: 0.0,
            pe_oi: 0.0,
            ce_vol: 0.0,
            pe_vol: 0.0,
            ce_oi_change: 0.0,
            pe_oi_change: 0.0,
            ce_range: None,
            pe_range: None,
            pcr: None,
        }
    }

    fn add_side(&mut self, row: &StrikeRow, side: OptionSide) {
        let agg = row.side(side);
        match side {
            OptionSide::Call => {
                self.ce_oi += agg.open_interest;
                self.ce_vol += agg.volume;
                self.ce_oi_change += agg.open_interest_change;
                if agg.open_interest > 0.0 {
                    self.ce_range = StrikeRange::extend(self.ce_range, row.strike);
                }
            }
            OptionSide::Put => {
                self.pe_oi += agg.open_interest;
                self.pe_vol += agg.volume;
                self.pe_oi_change += agg.open_interest_change;
                if agg.open_interest > 0.0 {
                    self.pe_range = StrikeRange::extend(self.pe_range, row.strike);
                }
            }
        }
    }

    fn finalize(mut self) -> Self {
        self.pcr = put_call_ratio(self.ce_oi, self.pe_oi);
        self
    }
}

/// OTM / ATM / ITM / TOTAL buckets around one ATM strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTable {
    pub atm_strike: f64,
    pub otm: Zone,
    pub atm: Zone,
    pub itm: Zone,
    pub total: Zone,
}

impl ZoneTable {
    pub fn zone(&self, kind: ZoneKind) -> &Zone {
        match kind {
            ZoneKind::Otm => &self.otm,
            ZoneKind::Atm => &self.atm,
            ZoneKind::Itm => &self.itm,
            ZoneKind::Total => &self.total,
        }
    }

    fn zone_mut(&mut self, kind: ZoneKind) -> &mut Zone {
        match kind {
            ZoneKind::Otm => &mut self.otm,
            ZoneKind::Atm => &mut self.atm,
            ZoneKind::Itm => &mut self.itm,
            ZoneKind::Total => &mut self.total,
        }
    }

    /// Rows in display order: OTM, ATM, ITM, TOTAL
    pub fn rows(&self) -> [&Zone; 4] {
        [&self.otm, &self.atm, &self.itm, &self.total]
    }
}

/// Bucket strike rows around `atm`.
///
/// Fails with [`AnalyticsError::InvalidInput`] when `atm` is not finite.
pub fn classify_zones(rows: &[StrikeRow], atm: f64) -> Result<ZoneTable> {
    if !atm.is_finite() {
        return Err(AnalyticsError::invalid_input(format!(
            "ATM strike must be finite, got {}",
            atm
        )));
    }

    let mut table = ZoneTable {
        atm_strike: atm,
        otm: Zone::empty(ZoneKind::Otm),
        atm: Zone::empty(ZoneKind::Atm),
        itm: Zone::empty(ZoneKind::Itm),
        total: Zone::empty(ZoneKind::Total),
    };

    for row in rows.iter().filter(|r| r.strike.is_finite()) {
        for side in [OptionSide::Call, OptionSide::Put] {
            table.total.add_side(row, side);
            let kind = ZoneKind::from(Moneyness::classify(row.strike, atm, side));
            table.zone_mut(kind).add_side(row, side);
        }
    }

    Ok(ZoneTable {
        atm_strike: table.atm_strike,
        otm: table.otm.finalize(),
        atm: table.atm.finalize(),
        itm: table.itm.finalize(),
        total: table.total.finalize(),
    })
}
