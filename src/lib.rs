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

//! # Liu Core Library
//!
//! Liu is a batch ETL for web event logs: it reads CSV log captures named in
//! a catalog, checks them against a declarative quality ruleset and persists
//! the accepted batch as compressed, optionally partitioned Parquet.
//!
//! ## Module Overview
//!
//! - **record**: Log records, batches, schemas and transformation ids
//! - **quality**: Rule predicates, ruleset parser, evaluation and sinks
//! - **catalog**: Dataset name resolution
//! - **ingest**: CSV source reading with header validation
//! - **export**: Parquet writing with partitions and idempotent commits
//! - **pipeline**: The read, evaluate, route, write state machine
//! - **generator**: Synthetic log datasets
//! - **config**: Job files for the command line
//! - **logging**: Backend for the `log` facade
//! - **metrics**: Batch observations published with quality results
//!
//! ## Feature Flags
//!
//! - `parallel`: Encodes destination partitions in parallel
//! - `compression`: Reads gzip and zstd compressed sources
//! - `full`: Enables all features
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use liu::{run_pipeline, LiuCatalogEntry, LiuDestination, LiuLogSink, LiuPipelineConfig,
//!           LiuRunRequest, LiuRunStatus, LiuStaticCatalog};
//!
//! let catalog = LiuStaticCatalog::new()
//!     .with_dataset("raw_logs", LiuCatalogEntry::log_events("data/raw_logs"));
//! let request = LiuRunRequest::new("raw_logs", LiuDestination::new("out/web_logs"), "jr_1");
//! let outcome = run_pipeline(&request, &catalog, Arc::new(LiuLogSink), LiuPipelineConfig::new());
//! assert_eq!(outcome.status, LiuRunStatus::Success);
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, LiuError>`. Quality gate failures are
//! kept apart from infrastructure failures, see [`LiuError::is_data_quality`].

pub mod catalog;
pub mod config;
pub mod errors;
pub mod export;
pub mod generator;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod quality;
pub mod record;

pub use errors::{LiuError, Result};
pub use record::{
    parse_record, LiuBatch, LiuColumnSpec, LiuColumnType, LiuLogRecord, LiuSchema,
    LiuTransformationId, LOG_COLUMNS,
};
pub use metrics::LiuBatchObservations;

pub use catalog::{LiuCatalogEntry, LiuCatalogResolver, LiuStaticCatalog};
pub use ingest::{LiuBatchReader, LiuIngestReader, LiuReaderConfig, LiuRecordIterator};
pub use export::{LiuBatchWriter, LiuCodec, LiuDestination, LiuParquetWriter, LiuWriteResult};
pub use quality::{
    evaluate, LiuBatchQualityResult, LiuJsonlSink, LiuLogSink, LiuNullSink, LiuPublishingStrategy,
    LiuQualityEngine, LiuQualitySink, LiuRuleOutcome, LiuRuleRegistry, LiuRuleset,
};
pub use pipeline::{
    run_pipeline, LiuPipeline, LiuPipelineConfig, LiuPipelineState, LiuRunOutcome, LiuRunReport,
    LiuRunRequest, LiuRunStatus,
};
pub use generator::{generate_daily_logs, generate_logs, LiuLogGenerator};
pub use config::LiuJobConfig;

/// Crate version, as recorded in Parquet `created_by` metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
