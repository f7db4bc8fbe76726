//! CSV flattening of the strike table

use crate::types::StrikeRow;
use crate::Result;
use serde::Serialize;
use std::io::Write;

/// One CSV line: `strike, ce_oi, pe_oi, total_oi, pcr`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub strike: f64,
    pub ce_oi: f64,
    pub pe_oi: f64,
    pub total_oi: f64,
    /// Empty when undefined or infinite
    pub pcr: Option<f64>,
}

pub fn flatten_for_export(rows: &[StrikeRow]) -> Vec<ExportRow> {
    rows.iter()
        .map(|r| ExportRow {
            strike: r.strike,
            ce_oi: r.ce_oi(),
            pe_oi: r.pe_oi(),
            total_oi: r.total_oi,
            pcr: r.pcr.filter(|p| p.is_finite()),
        })
        .collect()
}

/// Write the strike table with a header line
pub fn write_csv<W: Write>(rows: &[StrikeRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in flatten_for_export(rows) {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn to_csv_string(rows: &[StrikeRow]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::put_call_ratio;

    fn row(strike: f64, ce_oi: f64, pe_oi: f64) -> StrikeRow {
        let mut r = StrikeRow::new(strike);
        r.call.open_interest = ce_oi;
        r.put.open_interest = pe_oi;
        r.total_oi = ce_oi + pe_oi;
        r.pcr = put_call_ratio(ce_oi, pe_oi);
        r
    }

    #[test]
    fn test_csv_layout() {
        let rows = vec![row(25300.0, 100.0, 50.0), row(25350.0, 0.0, 200.0), row(25400.0, 0.0, 0.0)];
        let csv = to_csv_string(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "strike,ce_oi,pe_oi,total_oi,pcr");
        assert_eq!(lines[1], "25300.0,100.0,50.0,150.0,0.5");
        assert_eq!(lines[2], "25350.0,0.0,200.0,200.0,");
        assert_eq!(lines[3], "25400.0,0.0,0.0,0.0,");
    }

    #[test]
    fn test_empty_table_has_no_header() {
        // csv writes the header with the first record
        assert_eq!(to_csv_string(&[]).unwrap(), "");
    }
}
