//! Stage-by-stage integration over real files: a directory of daily CSV
//! exports is enumerated, read, merged, enriched, joined and published, and
//! the artifact is parsed back.

use moneyflow_core::data::{
    enumerate_sources, join_sectors, local_document, merge_sources, CsvSheetSource,
    DirectoryCatalog, NoProgress, ReadOutcome, RetryPolicy, SectorReference, SheetReader,
};
use moneyflow_core::domain::{FinalSignal, Signal};
use moneyflow_core::indicators::IndicatorEngine;
use moneyflow_core::publish::{read_artifact, FileSink, FileSnapshot, Publisher};
use moneyflow_core::data::SnapshotSource;
use std::fs;
use std::path::Path;

const HEADER: &str = "Stock Code,Company Name,Last Trading Date,High,Low,Close,Volume,Foreign Buy,Foreign Sell,Bid Volume,Offer Volume,Previous";

fn write_day(dir: &Path, name: &str, rows: &[&str]) {
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    fs::write(dir.join(name), body).unwrap();
}

fn fixture(dir: &Path) {
    let daily = dir.join("daily");
    fs::create_dir_all(&daily).unwrap();
    write_day(
        &daily,
        "ringkasan_20240115.csv",
        &[
            "ABC,Abc Tbk,15 Jan 2024,96,94,95,1000,10,10,100,100,94",
            "XYZ,Xyz Tbk,15 Jan 2024,11,9,10,2000,500,100,,,10",
        ],
    );
    write_day(
        &daily,
        "ringkasan_20240116.csv",
        &[
            // Date cell unparseable: falls back to the file name.
            "ABC,Abc Tbk,??,100,90,110,5000,10,10,675,325,95",
            "XYZ,Xyz Tbk,16 Jan 2024,11,9,abc,2000,100,100,,,10",
        ],
    );
    fs::write(daily.join("readme.txt"), "not a sheet").unwrap();
    fs::write(
        dir.join("sectors.csv"),
        "Stock Code,Sector\nABC,Energy\n",
    )
    .unwrap();
}

#[test]
fn directory_to_artifact_and_back() {
    let tmp = tempfile::tempdir().unwrap();
    fixture(tmp.path());

    let catalog = DirectoryCatalog::new(tmp.path(), ".csv", 1);
    let enumeration = enumerate_sources(&catalog, "daily");
    assert!(!enumeration.is_partial());
    assert_eq!(enumeration.documents.len(), 2);

    let reader = SheetReader::new(&CsvSheetSource, RetryPolicy::immediate(3));
    let reads = reader.read_all(&enumeration.documents, &NoProgress);
    assert!(reads.iter().all(|r| matches!(r.outcome, ReadOutcome::Rows(_))));

    let merged = merge_sources(&reads);
    assert_eq!(merged.records.len(), 4);
    assert_eq!(merged.report.coerced_to_missing, 1);
    assert_eq!(merged.report.date_strategies["source_file_name"], 1);

    let run = IndicatorEngine::default().run(merged.records);
    let sectors = SectorReference::load(
        &CsvSheetSource,
        &local_document(&tmp.path().join("sectors.csv")),
        RetryPolicy::immediate(1),
    );
    let output = join_sectors(run.records, &sectors);

    let abc_day2 = &output[1];
    assert_eq!(abc_day2.stock_code(), "ABC");
    assert_eq!(abc_day2.row.signal, Signal::Akumulasi);
    assert_eq!(abc_day2.row.final_signal, FinalSignal::StrongAkumulasi);
    assert_eq!(abc_day2.sector, "Energy");
    assert_eq!(output[2].sector, "Others");
    assert_eq!(output[3].record.close, None);

    let artifact_path = tmp.path().join("out").join("merged.csv");
    let sink = FileSink::new(&artifact_path);
    let outcome = Publisher::new(&sink, RetryPolicy::immediate(3))
        .publish(&output)
        .unwrap();
    assert!(outcome.is_success());

    let bytes = FileSnapshot::new(&artifact_path).fetch().unwrap();
    let parsed = read_artifact(&bytes).unwrap();
    assert_eq!(parsed, output);
    assert_eq!(parsed[0].record.extra("Company Name"), Some("Abc Tbk"));
}

#[test]
fn missing_sector_file_defaults_everything() {
    let tmp = tempfile::tempdir().unwrap();
    fixture(tmp.path());
    let sectors = SectorReference::load(
        &CsvSheetSource,
        &local_document(&tmp.path().join("nope.csv")),
        RetryPolicy::immediate(2),
    );
    assert!(sectors.is_empty());
    assert_eq!(sectors.sector_for("ABC"), "Others");
}

#[test]
fn header_only_sheet_is_empty_not_exhausted() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("blank_20240101.csv");
    fs::write(&path, format!("{HEADER}\n")).unwrap();

    let reader = SheetReader::new(&CsvSheetSource, RetryPolicy::immediate(3));
    assert!(matches!(reader.read(&local_document(&path)), ReadOutcome::Empty));

    let missing = local_document(&tmp.path().join("gone.csv"));
    assert!(matches!(
        reader.read(&missing),
        ReadOutcome::RetryExhausted { attempts: 3, .. }
    ));
}
