//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Liu.
//! The Liu project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Liu Ingest Tests - Reader
//!
//! Catalog resolution, header validation and CSV batch reading.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test ingest
//! ```

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use liu::catalog::{LiuCatalogEntry, LiuCatalogResolver, LiuStaticCatalog};
use liu::errors::LiuError;
use liu::generator::generate_logs;
use liu::ingest::{LiuIngestReader, LiuReaderConfig};
use liu::record::{LiuColumnSpec, LiuColumnType, LiuSchema};

const HEADER: &str = "event_time,user_id,endpoint,status_code,response_ms,user_agent\n";

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn catalog_for(location: &Path) -> LiuStaticCatalog {
    LiuStaticCatalog::new().with_dataset(
        "raw_logs",
        LiuCatalogEntry::log_events(location.display().to_string()),
    )
}

/// Tests that generated files read back with every row.
#[test]
fn test_read_generated_file() {
    let dir = tempfile::tempdir().unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
    let path = generate_logs(250, &dir.path().join("logs_20260126.csv"), date, Some(3)).unwrap();

    let reader = LiuIngestReader::new().with_config(LiuReaderConfig::default().with_job_run_id("jr_9"));
    let batch = reader.read("raw_logs", &catalog_for(&path)).unwrap();

    assert_eq!(batch.len(), 250);
    assert_eq!(batch.column_count(), 6);
    assert_eq!(batch.transformation_id().as_str(), "jr_9:liu_catalog_source");
    assert!(batch.records().iter().all(|r| r.event_time().date() == date));
}

/// Tests that a directory location reads its CSV files in name order.
#[test]
fn test_read_directory_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("b.csv"),
        &format!("{HEADER}2026-01-26T00:00:02,user_002,/,200,1,mobile\n"),
    );
    write(
        &dir.path().join("a.csv"),
        &format!("{HEADER}2026-01-26T00:00:01,user_001,/,200,1,mobile\n"),
    );
    write(&dir.path().join("notes.txt"), "ignored");

    let batch = LiuIngestReader::new()
        .read("raw_logs", &catalog_for(dir.path()))
        .unwrap();
    let users: Vec<&str> = batch.records().iter().map(|r| r.user_id()).collect();
    assert_eq!(users, vec!["user_001", "user_002"]);
}

/// Tests that `file://` locations resolve like plain paths.
#[test]
fn test_read_file_uri() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.csv");
    write(&path, &format!("{HEADER}2026-01-26T00:00:01,user_001,/,200,1,mobile\n"));

    let catalog = LiuStaticCatalog::new().with_dataset(
        "raw_logs",
        LiuCatalogEntry::log_events(format!("file://{}", path.display())),
    );
    assert_eq!(LiuIngestReader::new().read("raw_logs", &catalog).unwrap().len(), 1);
}

/// Tests that a header-only file yields an empty batch that keeps its width.
#[test]
fn test_read_header_only_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    write(&path, HEADER);

    let batch = LiuIngestReader::new().read("raw_logs", &catalog_for(&path)).unwrap();
    assert!(batch.is_empty());
    assert_eq!(batch.column_count(), 6);
}

/// Tests that unknown datasets are reported as not found.
#[test]
fn test_unknown_dataset_is_not_found() {
    let err = LiuIngestReader::new()
        .read("missing", &LiuStaticCatalog::new())
        .unwrap_err();
    assert_eq!(err, LiuError::not_found("missing"));
}

/// Tests that a missing location is a source error.
#[test]
fn test_missing_location_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let err = LiuIngestReader::new()
        .read("raw_logs", &catalog_for(&dir.path().join("nope.csv")))
        .unwrap_err();
    assert!(matches!(err, LiuError::SourceUnavailable { .. }), "{err}");
}

/// Tests that unsupported URI schemes are rejected.
#[test]
fn test_remote_scheme_is_unavailable() {
    let catalog = LiuStaticCatalog::new()
        .with_dataset("raw_logs", LiuCatalogEntry::log_events("s3://bucket/raw_logs/"));
    let err = LiuIngestReader::new().read("raw_logs", &catalog).unwrap_err();
    assert!(matches!(err, LiuError::SourceUnavailable { .. }), "{err}");
}

/// Tests that a source without a header line is an infrastructure error.
#[test]
fn test_empty_file_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.csv");
    write(&path, "");

    let err = LiuIngestReader::new().read("raw_logs", &catalog_for(&path)).unwrap_err();
    assert!(matches!(err, LiuError::SourceUnavailable { .. }), "{err}");
    assert!(err.is_infrastructure());
    assert!(!err.is_data_quality());
}

/// Tests that an empty file after the first one is reported the same way.
#[test]
fn test_empty_later_file_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a.csv"), HEADER);
    write(&dir.path().join("b.csv"), "");

    let err = LiuIngestReader::new()
        .read("raw_logs", &catalog_for(dir.path()))
        .unwrap_err();
    assert!(matches!(err, LiuError::SourceUnavailable { .. }), "{err}");
}

/// Tests that a header without a declared column is a schema mismatch.
#[test]
fn test_header_mismatch_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.csv");
    write(
        &path,
        "event_time,user,endpoint,status_code,response_ms,user_agent\n2026-01-26T00:00:01,user_001,/,200,1,mobile\n",
    );

    let err = LiuIngestReader::new().read("raw_logs", &catalog_for(&path)).unwrap_err();
    assert!(matches!(err, LiuError::SchemaMismatch { .. }), "{err}");
}

/// Tests that a different header in a later file is a schema mismatch.
#[test]
fn test_inconsistent_headers_across_files() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a.csv"), HEADER);
    write(
        &dir.path().join("b.csv"),
        "user_id,event_time,endpoint,status_code,response_ms,user_agent\n",
    );

    let err = LiuIngestReader::new()
        .read("raw_logs", &catalog_for(dir.path()))
        .unwrap_err();
    assert!(matches!(err, LiuError::SchemaMismatch { .. }), "{err}");
}

/// Tests that a malformed row aborts the read and names file and line.
#[test]
fn test_malformed_row_aborts_with_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.csv");
    write(
        &path,
        &format!(
            "{HEADER}2026-01-26T00:00:01,user_001,/,200,1,mobile\n2026-01-26T00:00:02,user_002,/,abc,1,mobile\n"
        ),
    );

    let err = LiuIngestReader::new().read("raw_logs", &catalog_for(&path)).unwrap_err();
    match err {
        LiuError::Parse { reason } => {
            assert!(reason.contains("logs.csv"), "{reason}");
            assert!(reason.contains("line 3"), "{reason}");
        }
        other => panic!("unexpected error {other}"),
    }
}

/// Tests that the record iterator stops after the first error.
#[test]
fn test_iterator_stops_after_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.csv");
    write(
        &path,
        &format!(
            "{HEADER}2026-01-26T00:00:01,user_001,/,200,1,mobile\nbroken\n2026-01-26T00:00:03,user_003,/,200,1,mobile\n"
        ),
    );

    let mut iter = LiuIngestReader::new().open("raw_logs", &catalog_for(&path)).unwrap();
    assert!(iter.next().unwrap().is_ok());
    assert!(iter.next().unwrap().is_err());
    assert!(iter.next().is_none());
    assert_eq!(iter.records_read(), 1);
}

/// Tests catalog files in YAML with a declared schema.
#[test]
fn test_catalog_from_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.yaml");
    write(
        &path,
        "datasets:\n  raw_logs:\n    location: data/raw\n  narrow:\n    location: data/narrow\n    schema:\n      - { name: event_time, type: timestamp }\n      - { name: user_id, type: string }\n",
    );

    let catalog = LiuStaticCatalog::from_path(&path).unwrap();
    assert_eq!(catalog.dataset_names(), vec!["narrow", "raw_logs"]);
    assert_eq!(catalog.resolve("raw_logs").unwrap().schema, LiuSchema::log_events());
    assert_eq!(
        catalog.resolve("narrow").unwrap().schema,
        LiuSchema::new(vec![
            LiuColumnSpec::new("event_time", LiuColumnType::Timestamp),
            LiuColumnSpec::new("user_id", LiuColumnType::String),
        ])
    );
    assert!(matches!(catalog.resolve("other"), Err(LiuError::NotFound { .. })));
}

/// Tests that gzip sources are decompressed transparently.
#[cfg(feature = "compression")]
#[test]
fn test_read_gzip_source() {
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.csv.gz");
    let file = fs::File::create(&path).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder
        .write_all(format!("{HEADER}2026-01-26T00:00:01,user_001,/,200,1,mobile\n").as_bytes())
        .unwrap();
    encoder.finish().unwrap();

    let batch = LiuIngestReader::new().read("raw_logs", &catalog_for(&path)).unwrap();
    assert_eq!(batch.len(), 1);
}
