//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Liu.
//! The Liu project belongs to the Dunimd Team.
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

//! # Liu Pipeline Module
//!
//! This module composes the ingestion reader, the quality engine and the
//! columnar writer into one run.
//!
//! ## State Machine
//!
//! ```text
//! INIT -> READING -> EVALUATING -> ROUTING -> WRITING -> DONE
//!   \________\___________\____________\__________\____> FAILED
//! ```
//!
//! - Reader or catalog errors fail the run while `READING`
//! - Publishing failures only fail the run under the strict strategy
//! - With `gate_on_quality`, a failing batch stops in `ROUTING` with a
//!   quality gate error and the writer is never called
//! - No state is retried
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use liu::catalog::{LiuCatalogEntry, LiuStaticCatalog};
//! use liu::export::{LiuDestination, LiuParquetWriter};
//! use liu::pipeline::{LiuPipeline, LiuPipelineConfig, LiuRunRequest};
//! use liu::quality::{LiuLogSink, LiuPublishingStrategy, LiuQualityEngine};
//!
//! let catalog = LiuStaticCatalog::new()
//!     .with_dataset("raw_logs", LiuCatalogEntry::log_events("data/raw_logs"));
//! let writer = LiuParquetWriter::new();
//! let engine = LiuQualityEngine::new(Arc::new(LiuLogSink), LiuPublishingStrategy::BestEffort);
//! let pipeline = LiuPipeline::new(&catalog, &writer, engine, LiuPipelineConfig::new());
//!
//! let request = LiuRunRequest::new("raw_logs", LiuDestination::new("out/logs"), "jr_1");
//! let report = pipeline.run(&request);
//! assert!(report.is_success());
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::LiuCatalogResolver;
use crate::errors::{LiuError, Result};
use crate::export::{LiuBatchWriter, LiuDestination, LiuParquetWriter, LiuWriteResult};
use crate::ingest::{LiuBatchReader, LiuIngestReader, DEFAULT_NODE_NAME};
use crate::logging::LiuLogContext;
use crate::record::LiuTransformationId;
use crate::quality::{
    LiuBatchQualityResult, LiuPublishingStrategy, LiuQualityEngine, LiuQualitySink,
    LiuRuleRegistry, LiuRuleset, DEFAULT_EVALUATION_CONTEXT, DEFAULT_RULESET,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiuPipelineState {
    Init,
    Reading,
    Evaluating,
    Routing,
    Writing,
    Done,
    Failed,
}

impl LiuPipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LiuPipelineState::Done | LiuPipelineState::Failed)
    }

    pub fn can_transition_to(self, next: LiuPipelineState) -> bool {
        use LiuPipelineState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Init, Reading)
            | (Reading, Evaluating)
            | (Evaluating, Routing)
            | (Routing, Writing)
            | (Writing, Done) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LiuPipelineState::Init => "INIT",
            LiuPipelineState::Reading => "READING",
            LiuPipelineState::Evaluating => "EVALUATING",
            LiuPipelineState::Routing => "ROUTING",
            LiuPipelineState::Writing => "WRITING",
            LiuPipelineState::Done => "DONE",
            LiuPipelineState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for LiuPipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-invocation behaviour of the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiuPipelineConfig {
    pub gate_on_quality: bool,
    pub publishing_strategy: LiuPublishingStrategy,
    pub evaluation_context: String,
    /// Ruleset text, see [`crate::quality::ruleset`].
    pub ruleset: String,
    pub node_name: String,
}

impl Default for LiuPipelineConfig {
    fn default() -> Self {
        Self {
            gate_on_quality: false,
            publishing_strategy: LiuPublishingStrategy::BestEffort,
            evaluation_context: DEFAULT_EVALUATION_CONTEXT.to_string(),
            ruleset: DEFAULT_RULESET.to_string(),
            node_name: DEFAULT_NODE_NAME.to_string(),
        }
    }
}

impl LiuPipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate_on_quality(mut self, enabled: bool) -> Self {
        self.gate_on_quality = enabled;
        self
    }

    pub fn publishing_strategy(mut self, strategy: LiuPublishingStrategy) -> Self {
        self.publishing_strategy = strategy;
        self
    }

    pub fn evaluation_context(mut self, context: &str) -> Self {
        self.evaluation_context = context.to_string();
        self
    }

    pub fn ruleset(mut self, ruleset: &str) -> Self {
        self.ruleset = ruleset.to_string();
        self
    }

    pub fn node_name(mut self, node_name: &str) -> Self {
        self.node_name = node_name.to_string();
        self
    }
}

/// One invocation of the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuRunRequest {
    pub dataset_name: String,
    pub destination: LiuDestination,
    pub job_run_id: String,
    /// Overrides [`LiuPipelineConfig::gate_on_quality`] when set.
    #[serde(default)]
    pub gate_on_quality: Option<bool>,
}

impl LiuRunRequest {
    pub fn new(
        dataset_name: impl Into<String>,
        destination: LiuDestination,
        job_run_id: impl Into<String>,
    ) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            destination,
            job_run_id: job_run_id.into(),
            gate_on_quality: None,
        }
    }

    pub fn with_gate_on_quality(mut self, enabled: bool) -> Self {
        self.gate_on_quality = Some(enabled);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiuRunStatus {
    Success,
    Failure,
}

/// Terminal status of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiuRunOutcome {
    pub status: LiuRunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Everything known about a finished run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuRunReport {
    pub dataset_name: String,
    pub job_run_id: String,
    pub states: Vec<LiuPipelineState>,
    pub quality: Option<LiuBatchQualityResult>,
    pub write: Option<LiuWriteResult>,
    pub error: Option<LiuError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl LiuRunReport {
    fn new(request: &LiuRunRequest) -> Self {
        Self {
            dataset_name: request.dataset_name.clone(),
            job_run_id: request.job_run_id.clone(),
            states: vec![LiuPipelineState::Init],
            quality: None,
            write: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn state(&self) -> LiuPipelineState {
        self.states.last().copied().unwrap_or(LiuPipelineState::Init)
    }

    pub fn is_success(&self) -> bool {
        self.state() == LiuPipelineState::Done
    }

    pub fn outcome(&self) -> LiuRunOutcome {
        if self.is_success() {
            LiuRunOutcome {
                status: LiuRunStatus::Success,
                reason: None,
            }
        } else {
            LiuRunOutcome {
                status: LiuRunStatus::Failure,
                reason: Some(
                    self.error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| format!("run stopped in state {}", self.state())),
                ),
            }
        }
    }

    fn advance(&mut self, next: LiuPipelineState) -> Result<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(LiuError::internal(format!(
                "invalid pipeline transition {current} -> {next}"
            )));
        }
        log::debug!("pipeline state {current} -> {next}");
        self.states.push(next);
        Ok(())
    }

    fn fail(&mut self, err: LiuError) {
        if !self.state().is_terminal() {
            self.states.push(LiuPipelineState::Failed);
        }
        self.error = Some(err);
        self.finished_at = Some(Utc::now());
    }
}

/// Reader, quality engine and writer wired together.
pub struct LiuPipeline<'a> {
    resolver: &'a dyn LiuCatalogResolver,
    /// `None` reads CSV sources with [`LiuIngestReader`].
    reader: Option<&'a dyn LiuBatchReader>,
    writer: &'a dyn LiuBatchWriter,
    engine: LiuQualityEngine,
    registry: LiuRuleRegistry,
    config: LiuPipelineConfig,
}

impl<'a> LiuPipeline<'a> {
    pub fn new(
        resolver: &'a dyn LiuCatalogResolver,
        writer: &'a dyn LiuBatchWriter,
        engine: LiuQualityEngine,
        config: LiuPipelineConfig,
    ) -> Self {
        Self {
            resolver,
            reader: None,
            writer,
            engine,
            registry: LiuRuleRegistry::with_defaults(),
            config,
        }
    }

    pub fn with_reader(mut self, reader: &'a dyn LiuBatchReader) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Replaces the rule vocabulary used to parse the ruleset.
    pub fn with_registry(mut self, registry: LiuRuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &LiuPipelineConfig {
        &self.config
    }

    /// Runs the request to a terminal state. Never panics on pipeline errors;
    /// they are recorded in the report.
    pub fn run(&self, request: &LiuRunRequest) -> LiuRunReport {
        let _context = LiuLogContext::scoped([
            ("job_run_id", request.job_run_id.clone()),
            ("dataset", request.dataset_name.clone()),
        ]);
        let mut report = LiuRunReport::new(request);

        match self.execute(request, &mut report) {
            Ok(()) => {
                report.finished_at = Some(Utc::now());
                log::info!(
                    "pipeline run succeeded: {} records written",
                    report.write.as_ref().map(|w| w.records_written).unwrap_or(0)
                );
            }
            Err(err) => {
                let category = if err.is_data_quality() {
                    "data quality"
                } else if err.is_infrastructure() {
                    "infrastructure"
                } else {
                    "configuration"
                };
                log::error!(
                    "pipeline run failed in state {} ({category}): {err}",
                    report.state()
                );
                report.fail(err);
            }
        }
        report
    }

    fn execute(&self, request: &LiuRunRequest, report: &mut LiuRunReport) -> Result<()> {
        let ruleset = LiuRuleset::parse(&self.config.ruleset, &self.registry)?;
        let gate = request.gate_on_quality.unwrap_or(self.config.gate_on_quality);

        report.advance(LiuPipelineState::Reading)?;
        let transformation_id = LiuTransformationId::new(&request.job_run_id, &self.config.node_name);
        let batch = match self.reader {
            Some(reader) => reader.read_batch(&request.dataset_name, self.resolver, &transformation_id)?,
            None => LiuIngestReader::new().read_batch(&request.dataset_name, self.resolver, &transformation_id)?,
        };

        report.advance(LiuPipelineState::Evaluating)?;
        if ruleset.is_empty() {
            log::warn!("ruleset is empty; the batch passes vacuously");
        }
        let quality = self
            .engine
            .evaluate(&batch, &ruleset, &self.config.evaluation_context)?;
        let passed = quality.overall_passed;
        let failed_rules = quality.failed_rules();
        report.quality = Some(quality);

        report.advance(LiuPipelineState::Routing)?;
        if !passed {
            if gate {
                return Err(LiuError::quality_gate(
                    self.config.evaluation_context.clone(),
                    failed_rules,
                ));
            }
            log::warn!(
                "quality rules failed ({}); writing anyway because gating is off",
                failed_rules.join(", ")
            );
        }

        report.advance(LiuPipelineState::Writing)?;
        report.write = Some(self.writer.write(&batch, &request.destination)?);

        report.advance(LiuPipelineState::Done)
    }
}

/// Runs one request with the Parquet writer and returns its terminal status.
pub fn run_pipeline(
    request: &LiuRunRequest,
    resolver: &dyn LiuCatalogResolver,
    sink: Arc<dyn LiuQualitySink>,
    config: LiuPipelineConfig,
) -> LiuRunOutcome {
    let writer = LiuParquetWriter::new();
    let engine = LiuQualityEngine::new(sink, config.publishing_strategy);
    LiuPipeline::new(resolver, &writer, engine, config)
        .run(request)
        .outcome()
}
