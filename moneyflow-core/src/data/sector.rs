//! Sector reference table and the sector join.
//!
//! The join never fails: codes missing from the reference (or a missing
//! reference altogether) resolve to `"Others"`.

use super::provider::SheetSource;
use super::reader::{ReadOutcome, SheetReader};
use super::retry::RetryPolicy;
use crate::domain::record::columns;
use crate::domain::{EnrichedRecord, OutputRecord, RawRow, SourceDocument, DEFAULT_SECTOR};
use std::collections::HashMap;

/// Mapping `StockCode → Sector`, read once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct SectorReference {
    sectors: HashMap<String, String>,
}

impl SectorReference {
    /// Reference with no entries; every code resolves to the default sector.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from reference rows. The first entry for a code wins; rows with a
    /// blank code or blank sector are ignored.
    pub fn from_rows(rows: &[RawRow]) -> Self {
        let mut sectors = HashMap::new();
        for row in rows {
            let code = row.get(columns::STOCK_CODE).unwrap_or("").trim();
            let sector = row.get(columns::SECTOR).unwrap_or("").trim();
            if code.is_empty() || sector.is_empty() {
                continue;
            }
            sectors
                .entry(code.to_string())
                .or_insert_with(|| sector.to_string());
        }
        Self { sectors }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut sectors = HashMap::new();
        for (k, v) in pairs {
            sectors.entry(k.into()).or_insert_with(|| v.into());
        }
        Self { sectors }
    }

    /// Read the reference document. Any read failure yields an empty reference.
    pub fn load(source: &dyn SheetSource, document: &SourceDocument, policy: RetryPolicy) -> Self {
        match SheetReader::new(source, policy).read(document) {
            ReadOutcome::Rows(rows) => {
                let reference = Self::from_rows(&rows);
                tracing::info!(entries = reference.len(), "loaded sector reference");
                reference
            }
            ReadOutcome::Empty => {
                tracing::warn!(document = %document.name, "sector reference is empty");
                Self::empty()
            }
            ReadOutcome::RetryExhausted { error, .. } => {
                tracing::warn!(document = %document.name, %error, "sector reference unavailable");
                Self::empty()
            }
        }
    }

    /// Reference entry for a code, if there is one.
    pub fn get(&self, stock_code: &str) -> Option<&str> {
        self.sectors.get(stock_code.trim()).map(|s| s.as_str())
    }

    pub fn contains(&self, stock_code: &str) -> bool {
        self.get(stock_code).is_some()
    }

    pub fn sector_for(&self, stock_code: &str) -> &str {
        self.get(stock_code).unwrap_or(DEFAULT_SECTOR)
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

/// Attach a sector label to every record, preserving order.
pub fn join_sectors(records: Vec<EnrichedRecord>, reference: &SectorReference) -> Vec<OutputRecord> {
    let mut unmatched = 0usize;
    let joined: Vec<OutputRecord> = records
        .into_iter()
        .map(|rec| {
            let sector = match reference.get(&rec.record.stock_code) {
                Some(sector) => sector.to_string(),
                None => {
                    unmatched += 1;
                    DEFAULT_SECTOR.to_string()
                }
            };
            rec.with_sector(sector)
        })
        .collect();
    tracing::debug!(rows = joined.len(), unmatched, "joined sectors");
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ref_row(code: &str, sector: &str) -> RawRow {
        RawRow {
            cells: vec![
                ("Stock Code".into(), code.into()),
                ("Sector".into(), sector.into()),
            ],
            source_file: "sectors".into(),
        }
    }

    #[test]
    fn lookup_with_default() {
        let r = SectorReference::from_rows(&[ref_row("BBCA", "Finance"), ref_row("ADRO", "Energy")]);
        assert_eq!(r.sector_for("BBCA"), "Finance");
        assert_eq!(r.sector_for(" ADRO "), "Energy");
        assert_eq!(r.sector_for("ZZZZ"), "Others");
    }

    #[test]
    fn first_entry_wins_and_blanks_ignored() {
        let r = SectorReference::from_rows(&[
            ref_row("BBCA", "Finance"),
            ref_row("BBCA", "Banking"),
            ref_row("", "Energy"),
            ref_row("TLKM", ""),
        ]);
        assert_eq!(r.len(), 1);
        assert_eq!(r.sector_for("BBCA"), "Finance");
        assert_eq!(r.sector_for("TLKM"), "Others");
    }

    #[test]
    fn explicit_others_entry_is_a_match() {
        let r = SectorReference::from_pairs([("MISC", "Others")]);
        assert_eq!(r.get("MISC"), Some("Others"));
        assert!(r.contains("MISC"));
        assert_eq!(r.get("ZZZZ"), None);
        assert!(!r.contains("ZZZZ"));
        assert_eq!(r.sector_for("ZZZZ"), DEFAULT_SECTOR);
    }

    #[test]
    fn empty_reference_defaults_everything() {
        let r = SectorReference::empty();
        assert!(r.is_empty());
        assert_eq!(r.sector_for("ANY"), DEFAULT_SECTOR);
    }
}
