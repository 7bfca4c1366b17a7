//! Append-only behavioural record of a session, written as JSON lines.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use serde::{Serialize, Serializer};
use serde_json::Value;

pub const APP_SHORT_NAME: &str = "GEMSrun";

/// `Result` column of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    /// `Valid|<detail>`, e.g. `Valid|Interaction` for a matched drop.
    ValidWith(String),
    /// `Invalid|<reason>`, or bare `Invalid` when the reason is empty.
    Invalid(String),
}

impl Outcome {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Outcome::Invalid(reason.into())
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Outcome::Invalid(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Valid => f.write_str("Valid"),
            Outcome::ValidWith(detail) => write!(f, "Valid|{detail}"),
            Outcome::Invalid(reason) if reason.is_empty() => f.write_str("Invalid"),
            Outcome::Invalid(reason) => write!(f, "Invalid|{reason}"),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRecord {
    #[serde(rename = "Kind")]
    pub kind: String,
    #[serde(rename = "Type")]
    pub event_type: String,
    #[serde(rename = "View")]
    pub view: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
    #[serde(rename = "Source", skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(rename = "Target")]
    pub target: Option<Value>,
    #[serde(rename = "Result")]
    pub result: Outcome,
    #[serde(rename = "TimeTime")]
    pub total_time: f64,
    #[serde(rename = "ViewTime")]
    pub view_time: f64,
}

/// Most records an in-memory log holds; the oldest half is dropped past it.
pub const MEMORY_LIMIT: usize = 50_000;

/// Writes records to a file, or keeps the recent ones in memory when no file
/// was requested.
#[derive(Debug, Default)]
pub struct DataLog {
    sink: Option<BufWriter<File>>,
    path: Option<PathBuf>,
    records: Vec<DataRecord>,
    appended: usize,
}

impl DataLog {
    /// Records stay in memory only.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open `<dir>/GEMSrun_v<version>_<user>_<unix-seconds>.txt`.
    pub fn create(dir: &Path, user: &str, overwrite: bool) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating data folder {}", dir.display()))?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let path = dir.join(log_file_name(user, stamp));
        Self::open(path, overwrite)
    }

    pub fn open(path: PathBuf, overwrite: bool) -> Result<Self> {
        if path.exists() && !overwrite {
            bail!(
                "data file {} already exists (use --overwrite to replace it)",
                path.display()
            );
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("opening data file {}", path.display()))?;
        Ok(Self {
            sink: Some(BufWriter::new(file)),
            path: Some(path),
            records: Vec::new(),
            appended: 0,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records held in memory. Always empty for a file-backed log.
    pub fn records(&self) -> &[DataRecord] {
        &self.records
    }

    /// Number of records appended over the whole session.
    pub fn len(&self) -> usize {
        self.appended
    }

    pub fn is_empty(&self) -> bool {
        self.appended == 0
    }

    /// Write failures are reported but never interrupt the session.
    pub fn append(&mut self, record: DataRecord) {
        self.appended += 1;
        match self.sink.as_mut() {
            Some(sink) => {
                if let Err(err) = write_line(sink, &record) {
                    warn!("unable to write data record: {err:#}");
                }
            }
            None => {
                if self.records.len() >= MEMORY_LIMIT {
                    self.records.drain(..MEMORY_LIMIT / 2);
                    debug!("dropped the oldest {} in-memory data records", MEMORY_LIMIT / 2);
                }
                self.records.push(record);
            }
        }
    }
}

fn write_line(sink: &mut BufWriter<File>, record: &DataRecord) -> Result<()> {
    serde_json::to_writer(&mut *sink, record).context("serializing data record")?;
    sink.write_all(b"\n")?;
    sink.flush()?;
    Ok(())
}

pub fn log_file_name(user: &str, stamp: u64) -> String {
    let version = env!("CARGO_PKG_VERSION").replace('.', "");
    format!("{APP_SHORT_NAME}_v{version}_{user}_{stamp}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(result: Outcome) -> DataRecord {
        DataRecord {
            kind: "Action".to_string(),
            event_type: "ShowObject".to_string(),
            view: "1".to_string(),
            params: BTreeMap::from([("object_id".to_string(), json!(4))]),
            source: None,
            target: Some(json!(4)),
            result,
            total_time: 1.5,
            view_time: 0.25,
        }
    }

    #[test]
    fn outcome_renders_reason_codes() {
        assert_eq!(Outcome::Valid.to_string(), "Valid");
        assert_eq!(Outcome::ValidWith("Interaction".into()).to_string(), "Valid|Interaction");
        assert_eq!(Outcome::invalid("ViewDoesNotExist").to_string(), "Invalid|ViewDoesNotExist");
        assert_eq!(Outcome::invalid("").to_string(), "Invalid");
    }

    #[test]
    fn record_serializes_with_flattened_params() {
        let value = serde_json::to_value(record(Outcome::Valid)).expect("serialize");
        assert_eq!(
            value,
            json!({
                "Kind": "Action",
                "Type": "ShowObject",
                "View": "1",
                "object_id": 4,
                "Target": 4,
                "Result": "Valid",
                "TimeTime": 1.5,
                "ViewTime": 0.25,
            })
        );
    }

    #[test]
    fn file_log_writes_one_line_per_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut log = DataLog::create(dir.path(), "User1", false).expect("create");
        log.append(record(Outcome::Valid));
        log.append(record(Outcome::invalid("ObjectDoesNotExist")));

        let path = log.path().expect("path").to_path_buf();
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with("GEMSrun_v"));
        assert!(name.contains("_User1_"));

        let text = fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"Result\":\"Invalid|ObjectDoesNotExist\""));
        assert_eq!(log.len(), 2);
        assert!(log.records().is_empty());
    }

    #[test]
    fn memory_log_keeps_only_recent_records() {
        let mut log = DataLog::in_memory();
        for step in 0..=MEMORY_LIMIT {
            let mut entry = record(Outcome::Valid);
            entry.total_time = step as f64;
            log.append(entry);
        }
        assert_eq!(log.len(), MEMORY_LIMIT + 1);
        assert_eq!(log.records().len(), MEMORY_LIMIT / 2 + 1);
        assert_eq!(log.records()[0].total_time, (MEMORY_LIMIT / 2) as f64);
        let last = log.records().last().expect("last record");
        assert_eq!(last.total_time, MEMORY_LIMIT as f64);
    }

    #[test]
    fn existing_file_requires_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.txt");
        fs::write(&path, "old").expect("seed");
        assert!(DataLog::open(path.clone(), false).is_err());
        assert!(DataLog::open(path, true).is_ok());
    }
}
