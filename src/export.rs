//! Writing retained comments to disk.
//!
//! The collector hands its records to a [`RecordSink`] exactly once, when the
//! loop stops. [`CsvExporter`] is the production sink. If the sink fails,
//! [`export_with_fallback`] dumps the same records as JSON into the system
//! temp directory so a run's work is not lost.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::ExportError;
use crate::filter::TargetSet;
use crate::record::RetainedRecord;

/// Timestamp format of the "Date Scraped" column.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepts the whole ordered record sequence and a destination path.
pub trait RecordSink {
    fn write(&self, records: &[RetainedRecord], path: &Path) -> Result<(), ExportError>;
}

/// Column layout of the export: Author, Sentiment, Comment, Profile Link,
/// Date Scraped.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Author")]
    author: &'a str,
    #[serde(rename = "Sentiment")]
    sentiment: &'static str,
    #[serde(rename = "Comment")]
    comment: &'a str,
    #[serde(rename = "Profile Link")]
    profile_link: &'a str,
    #[serde(rename = "Date Scraped")]
    date_scraped: String,
}

impl<'a> From<&'a RetainedRecord> for ExportRow<'a> {
    fn from(record: &'a RetainedRecord) -> Self {
        Self {
            author: &record.author,
            sentiment: record.sentiment.label(),
            comment: &record.text,
            profile_link: &record.profile_link,
            date_scraped: record.scraped_at.format(DATE_FORMAT).to_string(),
        }
    }
}

const HEADERS: [&str; 5] = ["Author", "Sentiment", "Comment", "Profile Link", "Date Scraped"];

/// CSV sink. Creates missing parent directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl RecordSink for CsvExporter {
    fn write(&self, records: &[RetainedRecord], path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(File::create(path)?));

        // Headers are written by hand so an empty run still gets them.
        writer.write_record(HEADERS)?;
        for record in records {
            writer.serialize(ExportRow::from(record))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// `{dir}/{prefix}_{targets}_{unix seconds}.csv`.
pub fn output_path(dir: &Path, prefix: &str, targets: &TargetSet, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("{}_{}_{}.csv", prefix, targets.label(), at.timestamp()))
}

/// Where the JSON fallback for `primary` goes.
pub fn fallback_path(primary: &Path) -> PathBuf {
    let stem = primary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "comments".to_string());
    std::env::temp_dir().join(format!("{stem}.json"))
}

/// Result of the end-of-run export.
#[derive(Debug)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// The sink failed but the records were dumped elsewhere.
    FallbackWritten { primary_error: ExportError, fallback: PathBuf },
    /// Nothing reached disk. The records are still in the run outcome.
    Failed { primary_error: ExportError, fallback_error: ExportError },
}

impl ExportOutcome {
    /// Path of whatever file was written, if any.
    pub fn written_path(&self) -> Option<&Path> {
        match self {
            ExportOutcome::Written(path) => Some(path),
            ExportOutcome::FallbackWritten { fallback, .. } => Some(fallback),
            ExportOutcome::Failed { .. } => None,
        }
    }
}

fn dump_json(records: &[RetainedRecord], path: &Path) -> Result<(), ExportError> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, records)?;
    Ok(())
}

/// Calls `sink` once; on failure dumps the records to [`fallback_path`].
pub fn export_with_fallback<E>(sink: &E, records: &[RetainedRecord], path: &Path) -> ExportOutcome
where
    E: RecordSink + ?Sized,
{
    export_with_fallback_at(sink, records, path, &fallback_path(path))
}

/// Like [`export_with_fallback`] with an explicit dump location.
pub fn export_with_fallback_at<E>(sink: &E, records: &[RetainedRecord], path: &Path, fallback: &Path) -> ExportOutcome
where
    E: RecordSink + ?Sized,
{
    info!(count = records.len(), path = %path.display(), "💾 Saving comments");

    let primary_error = match sink.write(records, path) {
        Ok(()) => return ExportOutcome::Written(path.to_path_buf()),
        Err(e) => e,
    };
    error!(error = %primary_error, path = %path.display(), "Export failed");

    match dump_json(records, fallback) {
        Ok(()) => {
            warn!(path = %fallback.display(), "Records dumped to fallback file");
            ExportOutcome::FallbackWritten {
                primary_error,
                fallback: fallback.to_path_buf(),
            }
        }
        Err(fallback_error) => {
            error!(error = %fallback_error, path = %fallback.display(), "Fallback dump failed too");
            ExportOutcome::Failed { primary_error, fallback_error }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::SentimentCategory;
    use crate::testing::{record, FailingSink};
    use chrono::TimeZone;

    #[test]
    fn test_csv_column_order_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let records = vec![
            record("Sam", SentimentCategory::VeryGood, "This is amazing work!"),
            record("Unknown", SentimentCategory::Bad, "not great, \"honestly\""),
        ];

        CsvExporter.write(&records, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, HEADERS);

        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "Sam");
        assert_eq!(&rows[0][1], "Very Good");
        assert_eq!(&rows[0][2], "This is amazing work!");
        assert_eq!(&rows[0][3], "https://example.com/in/sam");
        assert_eq!(&rows[0][4], records[0].scraped_at.format(DATE_FORMAT).to_string());
        assert_eq!(&rows[1][2], "not great, \"honestly\"");
    }

    #[test]
    fn test_empty_export_has_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        CsvExporter.write(&[], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), "Author,Sentiment,Comment,Profile Link,Date Scraped");
    }

    #[test]
    fn test_output_path_is_run_unique() {
        let at = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let later = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).unwrap();
        let targets = TargetSet::parse("1");

        let first = output_path(Path::new("out"), "comments", &targets, at);
        let second = output_path(Path::new("out"), "comments", &targets, later);

        assert_eq!(first, Path::new("out").join(format!("comments_Very_Good_{}.csv", at.timestamp())));
        assert_ne!(first, second);
    }

    #[test]
    fn test_fallback_dump_on_sink_failure() {
        let records = vec![record("Sam", SentimentCategory::Good, "nice")];
        let path = PathBuf::from(format!("fallback-test-{}.csv", std::process::id()));

        let outcome = export_with_fallback(&FailingSink::default(), &records, &path);
        let fallback = match outcome {
            ExportOutcome::FallbackWritten { fallback, .. } => fallback,
            other => panic!("unexpected outcome: {other:?}"),
        };

        let dumped: Vec<RetainedRecord> =
            serde_json::from_str(&fs::read_to_string(&fallback).unwrap()).unwrap();
        fs::remove_file(&fallback).unwrap();
        assert_eq!(dumped, records);
    }

    #[test]
    fn test_fallback_dump_counts_as_saved() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("dump.json");
        let records = vec![record("Sam", SentimentCategory::Good, "nice")];

        let outcome = export_with_fallback_at(&FailingSink::default(), &records, Path::new("out.csv"), &fallback);
        assert!(matches!(outcome, ExportOutcome::FallbackWritten { .. }));
        assert_eq!(outcome.written_path(), Some(fallback.as_path()));
    }

    #[test]
    fn test_failed_when_fallback_dump_fails_too() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("Sam", SentimentCategory::Worst, "awful")];

        // The fallback target is an existing directory, so it cannot be created as a file.
        let outcome = export_with_fallback_at(&FailingSink::default(), &records, Path::new("out.csv"), dir.path());
        match &outcome {
            ExportOutcome::Failed {
                primary_error: ExportError::Io(_),
                fallback_error: ExportError::Io(_),
            } => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(outcome.written_path(), None);
    }

    #[test]
    fn test_written_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.csv");
        let outcome = export_with_fallback(&CsvExporter, &[], &path);
        assert_eq!(outcome.written_path(), Some(path.as_path()));
    }
}
