use capacity_forecast::{
    DataLoader, ForecastAssembler, ForecastConfig, ForecastError, ForecastRecord, ForecastStore,
    InMemoryForecastStore,
};
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use std::io::{self, BufWriter, Write};
use tempfile::NamedTempFile;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

// Helper function to create history for a growing and a short-lived repository
fn create_history_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "repository_id,date,used_space_gb,dedup_ratio").unwrap();

    for i in 0..60 {
        let date = as_of() - Duration::days(60 - i);
        writeln!(file, "repo-grow,{},{},2.0", date, 400 + 5 * i).unwrap();
    }
    for i in 0..5 {
        let date = as_of() - Duration::days(5 - i);
        writeln!(file, "repo-new,{},{},", date, 50 + i).unwrap();
    }

    file
}

fn create_snapshot_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "repository_id,repository_name,repository_type,total_capacity_gb,used_space_gb"
    )
    .unwrap();
    writeln!(file, "repo-grow,Primary Backup,LinuxLocal,1000,700").unwrap();
    writeln!(file, "repo-new,Fresh Backup,WinLocal,500,55").unwrap();
    file
}

#[test]
fn test_full_forecast_workflow() {
    // 1. Load inputs
    let history_file = create_history_file();
    let snapshot_file = create_snapshot_file();
    let history = DataLoader::history_from_csv(history_file.path()).unwrap();
    let snapshots = DataLoader::snapshots_from_csv(snapshot_file.path()).unwrap();
    assert_eq!(history.len(), 65);

    let inputs = DataLoader::group_inputs(snapshots, history);
    assert_eq!(inputs.len(), 2);

    // 2. Forecast
    let assembler = ForecastAssembler::new(ForecastConfig::default()).unwrap();
    let report = assembler.forecast_all(&inputs, as_of());
    assert_eq!(report.forecasts.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].repository_id, "repo-new");
    assert!(report.failed.is_empty());

    // 3. Persist
    let mut store = InMemoryForecastStore::new();
    for forecast in &report.forecasts {
        store.upsert(ForecastRecord::from(forecast)).unwrap();
    }
    let record = store.get("repo-grow", as_of()).unwrap();
    assert_eq!(record.days_to_80, Some(20));
    assert_eq!(record.days_to_90, Some(40));
    assert_eq!(record.days_to_100, Some(60));
    assert_eq!(record.days_to_80_ci_lower, Some(18));
    assert_eq!(record.days_to_100_ci_upper, Some(66));
    assert_eq!(record.model_type, "LINEAR");
    assert_eq!(record.priority, "HIGH");
    assert_eq!(record.confidence_level, "HIGH");
    assert_eq!(record.dedup_trend, "STABLE");
    assert_eq!(record.current_dedup_ratio, Some(2.0));
    assert_eq!(record.repository_type, "LinuxLocal");

    // 4. Export
    let mut buffer = Vec::new();
    store.write_json(&mut buffer).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["repository_id"], "repo-grow");
    assert_eq!(rows[0]["forecast_date"], "2024-03-01");
    assert_eq!(rows[0]["days_to_80"], 20);
    assert_eq!(rows[0]["quality_flags"]["model_type"], "LINEAR");
    assert_eq!(rows[0]["quality_flags"]["sample_count"], 61);
}

#[test]
fn test_upsert_replaces_same_day_record() {
    let history_file = create_history_file();
    let snapshot_file = create_snapshot_file();
    let inputs = DataLoader::group_inputs(
        DataLoader::snapshots_from_csv(snapshot_file.path()).unwrap(),
        DataLoader::history_from_csv(history_file.path()).unwrap(),
    );
    let assembler = ForecastAssembler::new(ForecastConfig::default()).unwrap();

    let mut store = InMemoryForecastStore::new();
    for _ in 0..2 {
        for forecast in &assembler.forecast_all(&inputs, as_of()).forecasts {
            store.upsert(forecast.into()).unwrap();
        }
    }
    assert_eq!(store.len(), 1);

    // a later run is a separate row and becomes the latest
    let mut later = store.get("repo-grow", as_of()).unwrap().clone();
    later.forecast_date = as_of() + Duration::days(1);
    later.days_to_80 = Some(19);
    store.upsert(later).unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.latest("repo-grow").unwrap().days_to_80, Some(19));
    assert!(store.latest("repo-new").is_none());
}

#[test]
fn test_record_serde_round_trip() {
    let history_file = create_history_file();
    let snapshot_file = create_snapshot_file();
    let inputs = DataLoader::group_inputs(
        DataLoader::snapshots_from_csv(snapshot_file.path()).unwrap(),
        DataLoader::history_from_csv(history_file.path()).unwrap(),
    );
    let assembler = ForecastAssembler::new(ForecastConfig::default()).unwrap();
    let report = assembler.forecast_all(&inputs, as_of());

    let record = ForecastRecord::from(&report.forecasts[0]);
    let text = serde_json::to_string(&record).unwrap();
    let parsed: ForecastRecord = serde_json::from_str(&text).unwrap();

    assert_eq!(parsed.key(), ("repo-grow".to_string(), as_of()));
    assert_eq!(parsed.recommendation, record.recommendation);
    assert_eq!(parsed.days_to_100, record.days_to_100);
}

#[test]
fn test_missing_input_file() {
    let result = DataLoader::history_from_csv("/nonexistent/path.csv");
    assert!(result.is_err());
}

/// Accepts every write but fails to flush, like a full disk behind a buffer
struct UnflushableWriter;

impl Write for UnflushableWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
    }
}

#[test]
fn test_export_reports_flush_failure() {
    let store = InMemoryForecastStore::new();
    let result = store.write_json(BufWriter::new(UnflushableWriter));
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}
