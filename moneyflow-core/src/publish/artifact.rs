//! Flat CSV artifact: serialization of the final dataset and the reverse
//! parse used by downstream viewers.
//!
//! Column order is fixed: input columns, pass-through columns in first-seen
//! order, then the derived columns, `Sector` and `Source File`. Missing
//! values are empty cells; dates are `YYYY-MM-DD`; booleans are
//! `True`/`False`.

use crate::domain::record::columns;
use crate::domain::{
    DailyRecord, FinalSignal, FlowDirection, ForeignFlow, GroupIndicators, MfiSignal,
    OutputRecord, RowIndicators, Signal,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("artifact is missing column '{0}'")]
    MissingColumn(String),

    #[error("line {line}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("failed to flush artifact: {0}")]
    Flush(String),
}

const INPUT_COLUMNS: [&str; 12] = [
    columns::STOCK_CODE,
    columns::DATE,
    columns::HIGH,
    columns::LOW,
    columns::CLOSE,
    columns::VOLUME,
    columns::FOREIGN_BUY,
    columns::FOREIGN_SELL,
    columns::BID_VOLUME,
    columns::OFFER_VOLUME,
    columns::PREVIOUS,
    columns::CHANGE,
];

const OUTPUT_COLUMNS: [&str; 21] = [
    columns::VWAP,
    columns::WEEK,
    columns::SIGNAL,
    columns::MONEY_FLOW,
    columns::PREV_VWAP,
    columns::FLOW_DIRECTION,
    columns::POSITIVE_FLOW,
    columns::NEGATIVE_FLOW,
    columns::POS_FLOW_14,
    columns::NEG_FLOW_14,
    columns::MFI14,
    columns::MFI_SIGNAL,
    columns::FOREIGN_FLOW,
    columns::BID_OFFER_IMBALANCE,
    columns::FINAL_SIGNAL,
    columns::UNUSUAL_VOLUME,
    columns::AVG_VOLUME_5D,
    columns::VOLUME_CHANGE_POSITIVE,
    columns::SCORE,
    columns::SECTOR,
    columns::SOURCE_FILE,
];

/// Columns that older artifacts may lack; they read back as missing.
const OPTIONAL_COLUMNS: [&str; 4] = [
    columns::CHANGE,
    columns::AVG_VOLUME_5D,
    columns::VOLUME_CHANGE_POSITIVE,
    columns::SCORE,
];

/// Full header for `records`.
pub fn artifact_header(records: &[OutputRecord]) -> Vec<String> {
    let mut header: Vec<String> = INPUT_COLUMNS.iter().map(|c| c.to_string()).collect();
    for rec in records {
        for (name, _) in &rec.record.extras {
            if !header.iter().any(|h| h == name) {
                header.push(name.clone());
            }
        }
    }
    header.extend(OUTPUT_COLUMNS.iter().map(|c| c.to_string()));
    header
}

fn num(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn flag(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

fn cells(rec: &OutputRecord, extras: &[String]) -> Vec<String> {
    let r = &rec.record;
    let mut out = vec![
        r.stock_code.clone(),
        r.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        num(r.high),
        num(r.low),
        num(r.close),
        num(r.volume),
        num(r.foreign_buy),
        num(r.foreign_sell),
        num(r.bid_volume),
        num(r.offer_volume),
        num(r.previous),
        num(r.change),
    ];
    out.extend(extras.iter().map(|name| r.extra(name).unwrap_or("").to_string()));

    let (row, group) = (&rec.row, &rec.group);
    out.extend([
        num(row.vwap),
        group.week.clone().unwrap_or_default(),
        row.signal.to_string(),
        num(row.money_flow),
        num(group.prev_vwap),
        group.flow_direction.to_string(),
        num(group.positive_flow),
        num(group.negative_flow),
        num(group.pos_flow_14),
        num(group.neg_flow_14),
        num(group.mfi14),
        group.mfi_signal.to_string(),
        row.foreign_flow.to_string(),
        row.bid_offer_imbalance.to_string(),
        row.final_signal.to_string(),
        flag(row.unusual_volume).to_string(),
        num(group.avg_volume_5d),
        group.weekly_volume_change_positive.to_string(),
        rec.score.to_string(),
        rec.sector.clone(),
        r.source_file.clone(),
    ]);
    out
}

/// Serialize the dataset to CSV bytes.
pub fn write_artifact(records: &[OutputRecord]) -> Result<Vec<u8>, ArtifactError> {
    let header = artifact_header(records);
    let extras = &header[INPUT_COLUMNS.len()..header.len() - OUTPUT_COLUMNS.len()];

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&header)?;
    for rec in records {
        wtr.write_record(cells(rec, extras))?;
    }
    wtr.into_inner()
        .map_err(|e| ArtifactError::Flush(e.to_string()))
}

struct Row<'a> {
    line: usize,
    index: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl<'a> Row<'a> {
    fn raw(&self, column: &str) -> &'a str {
        self.index
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }

    fn invalid(&self, column: &str) -> ArtifactError {
        ArtifactError::InvalidValue {
            line: self.line,
            column: column.to_string(),
            value: self.raw(column).to_string(),
        }
    }

    fn number(&self, column: &str) -> Result<Option<f64>, ArtifactError> {
        let raw = self.raw(column).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(|_| self.invalid(column))
    }

    fn label<T: FromStr>(&self, column: &str) -> Result<T, ArtifactError> {
        self.raw(column).parse().map_err(|_| self.invalid(column))
    }

    fn boolean(&self, column: &str) -> Result<bool, ArtifactError> {
        match self.raw(column).trim() {
            "True" | "true" | "1" => Ok(true),
            "False" | "false" | "0" | "" => Ok(false),
            _ => Err(self.invalid(column)),
        }
    }

    fn integer(&self, column: &str) -> Result<u8, ArtifactError> {
        let raw = self.raw(column).trim();
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse().map_err(|_| self.invalid(column))
    }

    fn date(&self) -> Result<Option<NaiveDate>, ArtifactError> {
        let raw = self.raw(columns::DATE).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| self.invalid(columns::DATE))
    }

    fn text(&self, column: &str) -> Option<String> {
        let raw = self.raw(column);
        (!raw.is_empty()).then(|| raw.to_string())
    }
}

/// Parse an artifact produced by [`write_artifact`].
pub fn read_artifact(bytes: &[u8]) -> Result<Vec<OutputRecord>, ArtifactError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let header = rdr.headers()?.clone();
    let index: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    for required in INPUT_COLUMNS.iter().chain(OUTPUT_COLUMNS.iter()) {
        if !OPTIONAL_COLUMNS.contains(required) && !index.contains_key(*required) {
            return Err(ArtifactError::MissingColumn(required.to_string()));
        }
    }
    let extras: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| !INPUT_COLUMNS.contains(h) && !OUTPUT_COLUMNS.contains(h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut out = Vec::new();
    for (n, result) in rdr.records().enumerate() {
        let record = result?;
        let row = Row {
            line: n + 2,
            index: &index,
            record: &record,
        };

        let mut daily = DailyRecord::new(
            row.raw(columns::STOCK_CODE),
            row.date()?,
            row.raw(columns::SOURCE_FILE),
        );
        daily.high = row.number(columns::HIGH)?;
        daily.low = row.number(columns::LOW)?;
        daily.close = row.number(columns::CLOSE)?;
        daily.volume = row.number(columns::VOLUME)?;
        daily.foreign_buy = row.number(columns::FOREIGN_BUY)?;
        daily.foreign_sell = row.number(columns::FOREIGN_SELL)?;
        daily.bid_volume = row.number(columns::BID_VOLUME)?;
        daily.offer_volume = row.number(columns::OFFER_VOLUME)?;
        daily.previous = row.number(columns::PREVIOUS)?;
        daily.change = row.number(columns::CHANGE)?;
        daily.extras = extras
            .iter()
            .map(|(i, name)| (name.clone(), record.get(*i).unwrap_or("").to_string()))
            .collect();

        let indicators = RowIndicators {
            vwap: row.number(columns::VWAP)?,
            money_flow: row.number(columns::MONEY_FLOW)?,
            signal: row.label::<Signal>(columns::SIGNAL)?,
            foreign_flow: row.label::<ForeignFlow>(columns::FOREIGN_FLOW)?,
            bid_offer_imbalance: row.number(columns::BID_OFFER_IMBALANCE)?.unwrap_or(0.0),
            final_signal: row.label::<FinalSignal>(columns::FINAL_SIGNAL)?,
            unusual_volume: row.boolean(columns::UNUSUAL_VOLUME)?,
        };
        let group = GroupIndicators {
            week: row.text(columns::WEEK),
            prev_vwap: row.number(columns::PREV_VWAP)?,
            flow_direction: row.label::<FlowDirection>(columns::FLOW_DIRECTION)?,
            positive_flow: row.number(columns::POSITIVE_FLOW)?,
            negative_flow: row.number(columns::NEGATIVE_FLOW)?,
            pos_flow_14: row.number(columns::POS_FLOW_14)?,
            neg_flow_14: row.number(columns::NEG_FLOW_14)?,
            mfi14: row.number(columns::MFI14)?,
            mfi_signal: row.label::<MfiSignal>(columns::MFI_SIGNAL)?,
            avg_volume_5d: row.number(columns::AVG_VOLUME_5D)?,
            weekly_volume_change_positive: row.integer(columns::VOLUME_CHANGE_POSITIVE)?,
        };

        out.push(OutputRecord {
            record: daily,
            row: indicators,
            group,
            score: row.integer(columns::SCORE)?,
            sector: row.raw(columns::SECTOR).to_string(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EnrichedRecord;

    fn sample() -> OutputRecord {
        let mut record = DailyRecord::new(
            "ABC",
            NaiveDate::from_ymd_opt(2024, 1, 16),
            "daily_20240116.csv",
        );
        record.high = Some(100.0);
        record.low = Some(90.0);
        record.close = Some(110.0);
        record.volume = Some(5000.0);
        record.extras = vec![("Company Name".into(), "Abc, Tbk".into())];
        EnrichedRecord {
            record,
            row: RowIndicators {
                vwap: Some(100.0),
                money_flow: Some(500_000.0),
                signal: Signal::Akumulasi,
                foreign_flow: ForeignFlow::Netral,
                bid_offer_imbalance: 0.35,
                final_signal: FinalSignal::StrongAkumulasi,
                unusual_volume: true,
            },
            group: GroupIndicators {
                week: Some("2024-02".into()),
                ..GroupIndicators::undated()
            },
            score: 4,
        }
        .with_sector("Energy")
    }

    #[test]
    fn header_places_extras_between_input_and_derived() {
        let header = artifact_header(&[sample()]);
        assert_eq!(header[0], "Stock Code");
        assert_eq!(header[12], "Company Name");
        assert_eq!(header[13], "VWAP");
        assert_eq!(header.last().map(String::as_str), Some("Source File"));
    }

    #[test]
    fn writes_labels_and_empty_cells() {
        let bytes = write_artifact(&[sample()]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let line = text.lines().nth(1).unwrap();
        assert!(line.starts_with("ABC,2024-01-16,100,90,110,5000,,,,,,,\"Abc, Tbk\",100,2024-02,Akumulasi"));
        assert!(line.contains("Strong Akumulasi,True"));
        assert!(line.ends_with(",4,Energy,daily_20240116.csv"));
    }

    #[test]
    fn read_back_restores_records() {
        let original = sample();
        let bytes = write_artifact(std::slice::from_ref(&original)).unwrap();
        let parsed = read_artifact(&bytes).unwrap();
        assert_eq!(parsed, vec![original]);
    }

    #[test]
    fn empty_dataset_still_has_header() {
        let bytes = write_artifact(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(read_artifact(text.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let err = read_artifact(b"Stock Code,Close\nABC,1\n").unwrap_err();
        assert!(matches!(err, ArtifactError::MissingColumn(_)));
    }

    #[test]
    fn bad_label_reports_line_and_column() {
        let bytes = write_artifact(&[sample()]).unwrap();
        let text = String::from_utf8(bytes).unwrap().replace("Strong Akumulasi", "Maybe");
        match read_artifact(text.as_bytes()).unwrap_err() {
            ArtifactError::InvalidValue { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "Final Signal");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
