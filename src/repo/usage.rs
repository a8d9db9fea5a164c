//! Historical usage store backed by a delimited file.
//!
//! The file is parsed once per store and kept in memory. A missing or
//! unreadable file leaves the store empty instead of failing: forecasting
//! degrades to a zero baseline rather than refusing requests.

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{DailyUsage, UsageRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open usage file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read usage file header: {0}")]
    Header(#[source] csv::Error),
}

/// Row counts from a single load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
}

/// Region entry for map clients: where to drop a default marker and how
/// much history backs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub name: String,
    pub record_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct RawUsageRow {
    #[serde(rename = "region", alias = "States", alias = "State", alias = "state")]
    region: Option<String>,
    #[serde(rename = "subregion", alias = "Regions", alias = "Subregion")]
    subregion: Option<String>,
    #[serde(alias = "Latitude", alias = "lat")]
    latitude: Option<String>,
    #[serde(alias = "Longitude", alias = "lon")]
    longitude: Option<String>,
    #[serde(rename = "date", alias = "Dates", alias = "Date", alias = "timestamp")]
    date: Option<String>,
    #[serde(rename = "usage", alias = "Usage")]
    usage: Option<String>,
}

const TIMESTAMP_FORMATS: &[&str] = &["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// Parse a US-style timestamp (`MM/DD/YYYY HH:MM:SS`) down to its calendar date.
pub fn parse_usage_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

fn parse_f64(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn row_to_record(row: RawUsageRow) -> Option<UsageRecord> {
    let region = non_empty(row.region)?;
    let date = parse_usage_date(row.date.as_deref()?)?;
    let usage = parse_f64(row.usage.as_deref()).filter(|u| *u >= 0.0)?;

    Some(UsageRecord {
        region,
        subregion: non_empty(row.subregion).unwrap_or_default(),
        latitude: parse_f64(row.latitude.as_deref()).unwrap_or(0.0),
        longitude: parse_f64(row.longitude.as_deref()).unwrap_or(0.0),
        date,
        usage,
    })
}

/// Read every usable record from `path`, skipping malformed rows.
pub fn read_usage_file(path: &Path) -> Result<(Vec<UsageRecord>, LoadReport), StoreError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    rdr.headers().map_err(StoreError::Header)?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawUsageRow>() {
        report.total_rows += 1;
        match result.ok().and_then(row_to_record) {
            Some(record) => records.push(record),
            None => report.skipped_rows += 1,
        }
    }

    report.loaded_rows = records.len();
    Ok((records, report))
}

fn region_key(region: &str) -> String {
    region.trim().to_lowercase()
}

#[derive(Debug, Default)]
struct RegionSeries {
    name: String,
    record_count: usize,
    latitude_sum: f64,
    longitude_sum: f64,
    daily: Vec<DailyUsage>,
}

/// Records plus their per-region daily aggregates.
#[derive(Debug, Default)]
pub struct UsageIndex {
    records: Vec<UsageRecord>,
    regions: HashMap<String, RegionSeries>,
    report: LoadReport,
}

impl UsageIndex {
    pub fn build(records: Vec<UsageRecord>, report: LoadReport) -> Self {
        let mut sums: HashMap<String, (RegionSeries, BTreeMap<NaiveDate, f64>)> = HashMap::new();

        for record in &records {
            let (series, by_date) = sums
                .entry(region_key(&record.region))
                .or_insert_with(|| {
                    (
                        RegionSeries {
                            name: record.region.clone(),
                            ..RegionSeries::default()
                        },
                        BTreeMap::new(),
                    )
                });
            series.record_count += 1;
            series.latitude_sum += record.latitude;
            series.longitude_sum += record.longitude;
            *by_date.entry(record.date).or_insert(0.0) += record.usage;
        }

        let regions = sums
            .into_iter()
            .map(|(key, (mut series, by_date))| {
                series.daily = by_date
                    .into_iter()
                    .map(|(date, usage)| DailyUsage::new(date, usage))
                    .collect();
                (key, series)
            })
            .collect();

        Self {
            records,
            regions,
            report,
        }
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn report(&self) -> LoadReport {
        self.report
    }

    /// Daily sums for `region`, ascending by date; empty when unknown.
    pub fn daily_usage_for_region(&self, region: &str) -> &[DailyUsage] {
        self.regions
            .get(&region_key(region))
            .map(|s| s.daily.as_slice())
            .unwrap_or(&[])
    }

    pub fn regions(&self) -> Vec<RegionSummary> {
        let mut out: Vec<RegionSummary> = self
            .regions
            .values()
            .map(|s| {
                let n = s.record_count.max(1) as f64;
                RegionSummary {
                    name: s.name.clone(),
                    record_count: s.record_count,
                    first_date: s.daily.first().map(|d| d.date),
                    last_date: s.daily.last().map(|d| d.date),
                    latitude: s.latitude_sum / n,
                    longitude: s.longitude_sum / n,
                }
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

/// Process-wide historical store. Construct once and share behind an `Arc`.
pub struct HistoricalStore {
    path: Option<PathBuf>,
    data: OnceCell<UsageIndex>,
}

impl HistoricalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            data: OnceCell::new(),
        }
    }

    /// Store preloaded with `records`; never touches the filesystem.
    pub fn from_records(records: Vec<UsageRecord>) -> Self {
        let report = LoadReport {
            total_rows: records.len(),
            loaded_rows: records.len(),
            skipped_rows: 0,
        };
        Self {
            path: None,
            data: OnceCell::with_value(UsageIndex::build(records, report)),
        }
    }

    /// Parse the source file on first call; later calls return the cache.
    ///
    /// Concurrent first callers block on the same initialization.
    pub fn load_once(&self) -> &UsageIndex {
        self.data.get_or_init(|| {
            let Some(path) = self.path.as_deref() else {
                return UsageIndex::default();
            };
            match read_usage_file(path) {
                Ok((records, report)) => {
                    info!(
                        path = %path.display(),
                        total_rows = report.total_rows,
                        loaded_rows = report.loaded_rows,
                        skipped_rows = report.skipped_rows,
                        "historical usage loaded"
                    );
                    UsageIndex::build(records, report)
                }
                Err(e) => {
                    warn!(error = %e, "historical usage unavailable, continuing with empty dataset");
                    UsageIndex::default()
                }
            }
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    pub fn daily_usage_for_region(&self, region: &str) -> Vec<DailyUsage> {
        self.load_once().daily_usage_for_region(region).to_vec()
    }

    /// The last `window` daily points for `region`.
    pub fn recent_daily_usage(&self, region: &str, window: usize) -> Vec<DailyUsage> {
        let daily = self.load_once().daily_usage_for_region(region);
        daily[daily.len().saturating_sub(window)..].to_vec()
    }

    pub fn regions(&self) -> Vec<RegionSummary> {
        self.load_once().regions()
    }

    pub fn record_count(&self) -> usize {
        self.load_once().records().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
States,Regions,latitude,longitude,Dates,Usage
Punjab,NR,31.51,75.98,01/02/2019 00:00:00,119.9
Punjab,NR,31.51,75.98,01/03/2019 00:00:00,121.9
Haryana,NR,28.45,77.02,01/02/2019 00:00:00,130.3
 punjab ,NR2,31.00,76.00,01/02/2019 00:00:00,10.1
Punjab,NR,31.51,75.98,not-a-date,5.0
Punjab,NR,31.51,75.98,01/04/2019 00:00:00,-1.0
Punjab,NR,31.51,75.98,01/05/2019 00:00:00,abc
";

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, m, d).unwrap()
    }

    #[test]
    fn test_parse_usage_date_formats() {
        assert_eq!(parse_usage_date("01/02/2019 00:00:00"), Some(date(1, 2)));
        assert_eq!(parse_usage_date("12/31/2019 23:59"), Some(date(12, 31)));
        assert_eq!(parse_usage_date("07/04/2019"), Some(date(7, 4)));
        assert_eq!(parse_usage_date("2019-07-04"), Some(date(7, 4)));
        assert_eq!(parse_usage_date("31/12/2019 00:00:00"), None);
        assert_eq!(parse_usage_date(""), None);
    }

    #[test]
    fn test_read_skips_malformed_rows() {
        let file = write_csv(SAMPLE);
        let (records, report) = read_usage_file(file.path()).unwrap();

        assert_eq!(report.total_rows, 7);
        assert_eq!(report.loaded_rows, 4);
        assert_eq!(report.skipped_rows, 3);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].region, "Punjab");
        assert_eq!(records[0].subregion, "NR");
        assert_eq!(records[0].latitude, 31.51);
    }

    #[test]
    fn test_daily_usage_sums_same_region_and_date() {
        let file = write_csv(SAMPLE);
        let store = HistoricalStore::new(file.path());

        let daily = store.daily_usage_for_region("PUNJAB");
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, date(1, 2));
        assert!((daily[0].usage - 130.0).abs() < 1e-9);
        assert_eq!(daily[1].date, date(1, 3));
        assert!((daily[1].usage - 121.9).abs() < 1e-9);
    }

    #[test]
    fn test_region_lookup_trims_whitespace() {
        let file = write_csv(SAMPLE);
        let store = HistoricalStore::new(file.path());
        assert_eq!(store.daily_usage_for_region("  haryana "), vec![DailyUsage::new(date(1, 2), 130.3)]);
        assert!(store.daily_usage_for_region("Atlantis").is_empty());
    }

    #[test]
    fn test_missing_file_yields_empty_store() {
        let store = HistoricalStore::new("/definitely/not/here/usage.csv");
        assert_eq!(store.record_count(), 0);
        assert!(store.is_loaded());
        assert!(store.daily_usage_for_region("Punjab").is_empty());
        assert!(store.regions().is_empty());
    }

    #[test]
    fn test_load_once_is_idempotent() {
        let file = write_csv(SAMPLE);
        let store = HistoricalStore::new(file.path());

        let first: Vec<UsageRecord> = store.load_once().records().to_vec();
        // Changing the file afterwards must not change the cached data.
        std::fs::write(file.path(), "States,Regions,latitude,longitude,Dates,Usage\n").unwrap();
        let second: Vec<UsageRecord> = store.load_once().records().to_vec();

        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
        assert!(std::ptr::eq(store.load_once(), store.load_once()));
    }

    #[test]
    fn test_recent_daily_usage_takes_tail() {
        let records = (1..=10)
            .map(|d| UsageRecord {
                region: "Goa".to_string(),
                subregion: "WR".to_string(),
                latitude: 15.3,
                longitude: 74.1,
                date: date(1, d),
                usage: d as f64,
            })
            .collect();
        let store = HistoricalStore::from_records(records);

        let recent = store.recent_daily_usage("goa", 3);
        let usages: Vec<f64> = recent.iter().map(|d| d.usage).collect();
        assert_eq!(usages, vec![8.0, 9.0, 10.0]);
        assert_eq!(store.recent_daily_usage("goa", 100).len(), 10);
    }

    #[test]
    fn test_regions_catalogue() {
        let file = write_csv(SAMPLE);
        let store = HistoricalStore::new(file.path());
        let regions = store.regions();

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].name, "Haryana");
        assert_eq!(regions[1].name, "Punjab");
        assert_eq!(regions[1].record_count, 3);
        assert_eq!(regions[1].first_date, Some(date(1, 2)));
        assert_eq!(regions[1].last_date, Some(date(1, 3)));
        assert!((regions[0].latitude - 28.45).abs() < 1e-9);
    }
}
