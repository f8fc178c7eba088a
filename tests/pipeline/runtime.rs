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

//! # Liu Pipeline Tests - Runtime
//!
//! Routing of the pipeline state machine, the quality gate, publishing
//! strategies and end-to-end runs from generated CSV to Parquet.
//!
//! ## Test Categories
//!
//! - **Routing Tests**: Gate on and off, request overrides
//! - **Failure Tests**: Unknown datasets, invalid rulesets, failing sinks
//! - **End-to-End Tests**: Generated logs through to committed Parquet
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test pipeline
//! ```

use std::fs::{self, File};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use liu::catalog::{LiuCatalogEntry, LiuCatalogResolver, LiuStaticCatalog};
use liu::config::LiuJobConfig;
use liu::errors::{LiuError, Result};
use liu::export::{LiuBatchWriter, LiuCommitManifest, LiuDestination, LiuParquetWriter, LiuWriteResult};
use liu::generator::generate_logs;
use liu::ingest::LiuBatchReader;
use liu::pipeline::{
    run_pipeline, LiuPipeline, LiuPipelineConfig, LiuPipelineState, LiuRunRequest, LiuRunStatus,
};
use liu::quality::{
    LiuBatchQualityResult, LiuJsonlSink, LiuMemorySink, LiuNullSink, LiuPublishingStrategy,
    LiuQualityEngine, LiuQualitySink,
};
use liu::record::{LiuBatch, LiuTransformationId};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

const HEADER: &str = "event_time,user_id,endpoint,status_code,response_ms,user_agent\n";

/// Writer that only counts how often it is called.
#[derive(Default)]
struct CountingWriter {
    calls: AtomicUsize,
}

impl CountingWriter {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LiuBatchWriter for CountingWriter {
    fn write(&self, batch: &LiuBatch, _destination: &LiuDestination) -> Result<LiuWriteResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LiuWriteResult {
            transformation_id: batch.transformation_id().to_string(),
            records_written: batch.len(),
            ..Default::default()
        })
    }
}

/// Reader that hands out a batch without any columns.
struct ZeroColumnReader;

impl LiuBatchReader for ZeroColumnReader {
    fn read_batch(
        &self,
        dataset_name: &str,
        resolver: &dyn LiuCatalogResolver,
        transformation_id: &LiuTransformationId,
    ) -> Result<LiuBatch> {
        resolver.resolve(dataset_name)?;
        Ok(LiuBatch::new(Vec::new(), Vec::new(), transformation_id.clone()))
    }
}

struct FailingSink;

impl LiuQualitySink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn publish(&self, _result: &LiuBatchQualityResult) -> Result<()> {
        Err(LiuError::publish("collector unreachable"))
    }
}

fn log_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 26).unwrap()
}

fn generated_catalog(dir: &Path, rows: usize) -> LiuStaticCatalog {
    let path = generate_logs(rows, &dir.join("raw").join("logs_20260126.csv"), log_date(), Some(11)).unwrap();
    LiuStaticCatalog::new().with_dataset("raw_logs", LiuCatalogEntry::log_events(path.display().to_string()))
}

fn null_engine() -> LiuQualityEngine {
    LiuQualityEngine::new(Arc::new(LiuNullSink), LiuPublishingStrategy::BestEffort)
}

fn parquet_rows(root: &Path) -> usize {
    let manifest = LiuCommitManifest::load(root).unwrap();
    manifest
        .committed_files()
        .into_iter()
        .map(|file| {
            let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(root.join(file)).unwrap())
                .unwrap()
                .build()
                .unwrap();
            reader.map(|b| b.unwrap().num_rows()).sum::<usize>()
        })
        .sum()
}

/// Tests a default run over 2000 generated rows.
#[test]
fn test_generated_logs_reach_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = generated_catalog(dir.path(), 2000);
    let out = dir.path().join("out");
    let request = LiuRunRequest::new("raw_logs", LiuDestination::new(out.display().to_string()), "jr_e2e");

    let outcome = run_pipeline(&request, &catalog, Arc::new(LiuNullSink), LiuPipelineConfig::new());

    assert_eq!(outcome.status, LiuRunStatus::Success, "{:?}", outcome.reason);
    assert!(outcome.reason.is_none());
    assert_eq!(parquet_rows(&out), 2000);
}

/// Tests that every state is visited in order on success.
#[test]
fn test_success_visits_every_state() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = generated_catalog(dir.path(), 20);
    let writer = CountingWriter::default();
    let memory = Arc::new(LiuMemorySink::new());
    let engine = LiuQualityEngine::new(memory.clone(), LiuPublishingStrategy::Strict);
    let pipeline = LiuPipeline::new(&catalog, &writer, engine, LiuPipelineConfig::new());

    let report = pipeline.run(&LiuRunRequest::new("raw_logs", LiuDestination::new("unused"), "jr_states"));

    use LiuPipelineState::*;
    assert_eq!(report.states, vec![Init, Reading, Evaluating, Routing, Writing, Done]);
    assert!(report.is_success());
    assert_eq!(writer.calls(), 1);
    assert_eq!(report.write.unwrap().records_written, 20);

    let published = memory.results();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].evaluation_context, "EvaluateDataQuality_nodeB");
    assert_eq!(published[0].transformation_id, "jr_states:liu_catalog_source");
    assert_eq!(report.quality.unwrap(), published[0]);
}

/// Tests that a header-only source passes the default ruleset and commits an empty file.
#[test]
fn test_header_only_source_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("empty.csv");
    fs::write(&source, HEADER).unwrap();
    let catalog = LiuStaticCatalog::new()
        .with_dataset("raw_logs", LiuCatalogEntry::log_events(source.display().to_string()));
    let out = dir.path().join("out");
    let request = LiuRunRequest::new("raw_logs", LiuDestination::new(out.display().to_string()), "jr_empty");

    let outcome = run_pipeline(&request, &catalog, Arc::new(LiuNullSink), LiuPipelineConfig::new());

    assert_eq!(outcome.status, LiuRunStatus::Success, "{:?}", outcome.reason);
    let manifest = LiuCommitManifest::load(&out).unwrap();
    assert_eq!(manifest.committed_files().len(), 1);
    assert_eq!(parquet_rows(&out), 0);
}

/// Tests that an unknown dataset fails while reading and never reaches the writer.
#[test]
fn test_unknown_dataset_fails_before_writing() {
    let writer = CountingWriter::default();
    let catalog = LiuStaticCatalog::new();
    let pipeline = LiuPipeline::new(&catalog, &writer, null_engine(), LiuPipelineConfig::new());

    let report = pipeline.run(&LiuRunRequest::new(
        "nonexistent_dataset",
        LiuDestination::new("unused"),
        "jr_missing",
    ));

    assert_eq!(writer.calls(), 0);
    assert_eq!(report.error, Some(LiuError::not_found("nonexistent_dataset")));
    assert_eq!(
        report.states,
        vec![LiuPipelineState::Init, LiuPipelineState::Reading, LiuPipelineState::Failed]
    );
    let outcome = report.outcome();
    assert_eq!(outcome.status, LiuRunStatus::Failure);
    assert!(outcome.reason.unwrap().contains("nonexistent_dataset"));
}

/// Tests that a failing batch is blocked when gating is on.
#[test]
fn test_gate_blocks_failing_batch() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = generated_catalog(dir.path(), 10);
    let writer = CountingWriter::default();
    let config = LiuPipelineConfig::new()
        .gate_on_quality(true)
        .ruleset("Rules = [ ColumnCount > 0, RowCount > 100 ]");
    let pipeline = LiuPipeline::new(&catalog, &writer, null_engine(), config);

    let report = pipeline.run(&LiuRunRequest::new("raw_logs", LiuDestination::new("unused"), "jr_gate"));

    assert_eq!(writer.calls(), 0);
    assert_eq!(report.states.last(), Some(&LiuPipelineState::Failed));
    assert!(report.states.contains(&LiuPipelineState::Routing));
    assert!(!report.states.contains(&LiuPipelineState::Writing));
    match report.error {
        Some(LiuError::QualityGate { context, failed_rules }) => {
            assert_eq!(context, "EvaluateDataQuality_nodeB");
            assert_eq!(failed_rules, vec!["RowCount > 100".to_string()]);
        }
        other => panic!("expected a quality gate error, got {other:?}"),
    }
    assert!(!report.quality.unwrap().overall_passed);
}

/// Tests that a batch without columns fails the default ruleset and is gated.
#[test]
fn test_zero_column_batch_is_gated() {
    let catalog = LiuStaticCatalog::new().with_dataset("raw_logs", LiuCatalogEntry::log_events("unused"));
    let writer = CountingWriter::default();
    let pipeline = LiuPipeline::new(&catalog, &writer, null_engine(), LiuPipelineConfig::new().gate_on_quality(true))
        .with_reader(&ZeroColumnReader);

    let report = pipeline.run(&LiuRunRequest::new("raw_logs", LiuDestination::new("unused"), "jr_zero"));

    assert_eq!(writer.calls(), 0);
    assert_eq!(
        report.states,
        vec![
            LiuPipelineState::Init,
            LiuPipelineState::Reading,
            LiuPipelineState::Evaluating,
            LiuPipelineState::Routing,
            LiuPipelineState::Failed,
        ]
    );
    match report.error {
        Some(LiuError::QualityGate { failed_rules, .. }) => {
            assert_eq!(failed_rules, vec!["ColumnCount > 0".to_string()]);
        }
        other => panic!("expected a quality gate error, got {other:?}"),
    }
}

/// Tests that the same batch reaches the writer when gating is off.
#[test]
fn test_zero_column_batch_written_without_gate() {
    let catalog = LiuStaticCatalog::new().with_dataset("raw_logs", LiuCatalogEntry::log_events("unused"));
    let writer = CountingWriter::default();
    let pipeline = LiuPipeline::new(&catalog, &writer, null_engine(), LiuPipelineConfig::new())
        .with_reader(&ZeroColumnReader);

    let report = pipeline.run(&LiuRunRequest::new("raw_logs", LiuDestination::new("unused"), "jr_zero"));

    assert!(report.is_success());
    assert!(report.states.contains(&LiuPipelineState::Writing));
    assert_eq!(writer.calls(), 1);
    assert!(!report.quality.unwrap().overall_passed);
}

/// Tests that a failing batch is still written when gating is off.
#[test]
fn test_failing_batch_written_without_gate() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = generated_catalog(dir.path(), 10);
    let writer = CountingWriter::default();
    let config = LiuPipelineConfig::new().ruleset("Rules = [ RowCount > 100 ]");
    let pipeline = LiuPipeline::new(&catalog, &writer, null_engine(), config);

    let report = pipeline.run(&LiuRunRequest::new("raw_logs", LiuDestination::new("unused"), "jr_nogate"));

    assert!(report.is_success());
    assert_eq!(writer.calls(), 1);
    assert!(!report.quality.unwrap().overall_passed);
}

/// Tests that the request setting overrides the configured gate.
#[test]
fn test_request_overrides_gate() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = generated_catalog(dir.path(), 10);
    let writer = CountingWriter::default();
    let config = LiuPipelineConfig::new().ruleset("Rules = [ RowCount > 100 ]");
    let pipeline = LiuPipeline::new(&catalog, &writer, null_engine(), config);

    let request = LiuRunRequest::new("raw_logs", LiuDestination::new("unused"), "jr_override")
        .with_gate_on_quality(true);
    let report = pipeline.run(&request);

    assert_eq!(writer.calls(), 0);
    assert!(report.error.unwrap().is_data_quality());
}

/// Tests that an invalid ruleset fails the run before the source is read.
#[test]
fn test_invalid_ruleset_fails_before_reading() {
    let writer = CountingWriter::default();
    let catalog = LiuStaticCatalog::new();
    let config = LiuPipelineConfig::new().ruleset("Rules = [ Completeness \"user_id\" > 0.9 ]");
    let pipeline = LiuPipeline::new(&catalog, &writer, null_engine(), config);

    let report = pipeline.run(&LiuRunRequest::new("raw_logs", LiuDestination::new("unused"), "jr_rules"));

    assert!(matches!(report.error, Some(LiuError::RuleDefinition { .. })));
    assert_eq!(report.states, vec![LiuPipelineState::Init, LiuPipelineState::Failed]);
}

/// Tests that a failing sink does not fail a best effort run.
#[test]
fn test_best_effort_sink_failure_still_writes() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = generated_catalog(dir.path(), 10);
    let writer = CountingWriter::default();
    let engine = LiuQualityEngine::new(Arc::new(FailingSink), LiuPublishingStrategy::BestEffort);
    let pipeline = LiuPipeline::new(&catalog, &writer, engine, LiuPipelineConfig::new());

    let report = pipeline.run(&LiuRunRequest::new("raw_logs", LiuDestination::new("unused"), "jr_sink"));

    assert!(report.is_success());
    assert_eq!(writer.calls(), 1);
}

/// Tests that a failing sink fails a strict run before writing.
#[test]
fn test_strict_sink_failure_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = generated_catalog(dir.path(), 10);
    let writer = CountingWriter::default();
    let engine = LiuQualityEngine::new(Arc::new(FailingSink), LiuPublishingStrategy::Strict);
    let pipeline = LiuPipeline::new(&catalog, &writer, engine, LiuPipelineConfig::new());

    let report = pipeline.run(&LiuRunRequest::new("raw_logs", LiuDestination::new("unused"), "jr_strict"));

    assert_eq!(writer.calls(), 0);
    assert!(matches!(report.error, Some(LiuError::Publish { .. })));
    assert!(report.error.unwrap().is_infrastructure());
}

/// Tests that re-running a job with the same run id leaves one copy of the data.
#[test]
fn test_rerun_same_job_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = generated_catalog(dir.path(), 150);
    let out = dir.path().join("out");
    let destination = LiuDestination::new(out.display().to_string()).with_partition_keys(["user_agent"]);
    let request = LiuRunRequest::new("raw_logs", destination, "jr_repeat");
    let writer = LiuParquetWriter::new();
    let pipeline = LiuPipeline::new(&catalog, &writer, null_engine(), LiuPipelineConfig::new());

    assert!(pipeline.run(&request).is_success());
    assert!(pipeline.run(&request).is_success());

    assert_eq!(parquet_rows(&out), 150);
    assert_eq!(LiuCommitManifest::load(&out).unwrap().entries.len(), 1);
}

/// Tests a job file run with a JSONL sink and a catalog using relative locations.
#[test]
fn test_job_file_run_publishes_to_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    generate_logs(40, &dir.path().join("data").join("logs.csv"), log_date(), Some(5)).unwrap();
    fs::create_dir_all(dir.path().join("catalogs")).unwrap();
    fs::write(
        dir.path().join("catalogs").join("catalog.yaml"),
        "datasets:\n  raw_logs:\n    location: ../data\n",
    )
    .unwrap();
    let job_path = dir.path().join("job.yaml");
    fs::write(
        &job_path,
        r#"dataset: raw_logs
job_run_id: jr_job
catalog_path: catalogs/catalog.yaml
destination:
  location: out
  partition_keys: [status_code]
sink:
  kind: jsonl
  path: quality/results.jsonl
pipeline:
  gate_on_quality: true
  ruleset: |
    Rules = [
        ColumnCount > 0,
        IsComplete "user_id"
    ]
"#,
    )
    .unwrap();

    let job = LiuJobConfig::from_path(&job_path).unwrap();
    let catalog = job.load_catalog().unwrap();
    let request = job.to_request(None, None);
    let outcome = run_pipeline(&request, &catalog, job.sink.build(), job.pipeline.clone());

    assert_eq!(outcome.status, LiuRunStatus::Success, "{:?}", outcome.reason);
    assert_eq!(parquet_rows(&dir.path().join("out")), 40);

    let sink = LiuJsonlSink::new(dir.path().join("quality").join("results.jsonl"));
    let content = fs::read_to_string(sink.path()).unwrap();
    let result: LiuBatchQualityResult = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert!(result.overall_passed);
    assert_eq!(result.transformation_id, "jr_job:liu_catalog_source");
    assert_eq!(result.outcomes.len(), 2);
}
