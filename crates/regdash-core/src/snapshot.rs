//! CSV snapshots as an alternate data source.
//!
//! Two shapes are supported:
//! - record exports, whose header row uses the table's column names and
//!   load into the same `Record`s the API returns
//! - pre-aggregated tallies, one `(key, value)` pair per row, summed per key

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Record;
use crate::summary::{group_sum, GroupTotal};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Snapshot has no column named {0:?}")]
    MissingColumn(String),
}

fn open(path: &Path) -> Result<std::fs::File, SnapshotError> {
    std::fs::File::open(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Parse a record export. Blank cells are treated as missing.
pub fn parse_records<R: Read>(input: R) -> Result<Vec<Record>, SnapshotError> {
    let mut reader = reader(input);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(Record::from_columns(headers.iter().zip(row.iter())));
    }
    Ok(records)
}

/// Load a record export from disk
pub fn load_records(path: &Path) -> Result<Vec<Record>, SnapshotError> {
    let records = parse_records(open(path)?)?;
    debug!(path = %path.display(), count = records.len(), "Loaded record snapshot");
    Ok(records)
}

/// Parse a pre-aggregated tally and sum `value_column` per `key_column`.
/// Rows with a blank key or a non-numeric value are skipped.
pub fn parse_tally<R: Read>(
    input: R,
    key_column: &str,
    value_column: &str,
) -> Result<Vec<GroupTotal<f64>>, SnapshotError> {
    let mut reader = reader(input);
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SnapshotError::MissingColumn(name.to_string()))
    };
    let key_idx = column(key_column)?;
    let value_idx = column(value_column)?;

    let mut rows: Vec<(String, f64)> = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let row = row?;
        let key = row.get(key_idx).filter(|k| !k.is_empty());
        let value = row.get(value_idx).and_then(|v| v.parse::<f64>().ok());
        match (key, value) {
            (Some(k), Some(v)) => rows.push((k.to_string(), v)),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, key_column, value_column, "Skipped tally rows without a key or numeric value");
    }

    Ok(group_sum(&rows, |(k, _)| Some(k.clone()), |(_, v)| Some(*v)))
}

/// A pre-aggregated snapshot: `value_column` summed per `key_column`,
/// largest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally {
    pub key_column: String,
    pub value_column: String,
    pub totals: Vec<GroupTotal<f64>>,
}

impl Tally {
    /// Sum over every group
    pub fn grand_total(&self) -> f64 {
        self.totals.iter().map(|g| g.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Load a pre-aggregated tally from disk
pub fn load_tally(path: &Path, key_column: &str, value_column: &str) -> Result<Tally, SnapshotError> {
    let totals = parse_tally(open(path)?, key_column, value_column)?;
    debug!(path = %path.display(), groups = totals.len(), "Loaded tally snapshot");
    Ok(Tally {
        key_column: key_column.to_string(),
        value_column: value_column.to_string(),
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::summary::Summary;

    const EXPORT: &str = "\
Id,Full Name,Affiliation (College/Company/Organization Name),Age,Gender
1,Asha Verma,IIT Delhi,17,female
2,Ravi Kumar,IIT Delhi,19, Male
3,Meera Iyer,BITS Pilani,,FEMALE
4,Arjun Rao,,abc,male
";

    #[test]
    fn test_parse_records() {
        let records = parse_records(EXPORT.as_bytes()).expect("parse export");
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].id_display(), "1");
        assert_eq!(records[1].gender.as_deref(), Some("Male"));
        assert_eq!(records[2].age, None);
        assert_eq!(records[3].affiliation, None);
        assert_eq!(records[3].age_years(), None);
    }

    #[test]
    fn test_snapshot_feeds_same_aggregation() {
        let records = parse_records(EXPORT.as_bytes()).expect("parse export");
        let summary = Summary::from_records(&records);

        assert_eq!(summary.total_registrants, 4);
        assert_eq!(summary.with_valid_age, 2);
        assert_eq!(summary.banded_total(), 2);
        assert_eq!(summary.genders[0].label, "Female");
        assert_eq!(summary.genders[0].value, 2);
        assert_eq!(summary.distinct_affiliations, 2);
    }

    #[test]
    fn test_load_records_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(EXPORT.as_bytes()).expect("write export");

        let records = load_records(file.path()).expect("load export");
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_records(&dir.path().join("nope.csv")).expect_err("missing file");
        assert!(matches!(err, SnapshotError::Io { .. }));
    }

    #[test]
    fn test_parse_tally_sums_per_key() {
        let csv = "\
College,Registrations
IIT Delhi,10
BITS Pilani,4
IIT Delhi,2
,7
NIT Trichy,many
";
        let totals = parse_tally(csv.as_bytes(), "College", "Registrations").expect("parse tally");
        assert_eq!(
            totals,
            vec![
                GroupTotal { label: "IIT Delhi".to_string(), value: 12.0 },
                GroupTotal { label: "BITS Pilani".to_string(), value: 4.0 },
            ]
        );
    }

    #[test]
    fn test_parse_tally_missing_column() {
        let err = parse_tally("College,Count\nA,1\n".as_bytes(), "College", "Registrations")
            .expect_err("missing column");
        assert!(matches!(err, SnapshotError::MissingColumn(ref c) if c == "Registrations"));
    }

    #[test]
    fn test_load_tally_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"Gender,Count\nMale,3\nFemale,5\n").expect("write tally");

        let tally = load_tally(file.path(), "Gender", "Count").expect("load tally");
        assert_eq!(tally.key_column, "Gender");
        assert_eq!(tally.totals[0].label, "Female");
        assert_eq!(tally.totals[0].value, 5.0);
        assert_eq!(tally.grand_total(), 8.0);

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "Gender,Count\n").expect("write empty tally");
        let empty = load_tally(&path, "Gender", "Count").expect("load empty tally");
        assert!(empty.is_empty());
        assert_eq!(empty.grand_total(), 0.0);
    }
}
