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

//! # Data Ingestion Module
//!
//! This module reads catalog datasets of CSV event logs into batches.
//!
//! ## Module Components
//!
//! - **Format Detection** ([format.rs](format/index.html)): Location resolution, file listing and compression detection
//! - **Reader** ([reader.rs](reader/index.html)): Header validation and lazy record iteration
//!
//! ## Supported Sources
//!
//! - **CSV**: UTF-8, header row naming the six log columns in any order
//! - **Gzip**: .csv.gz files (feature `compression`)
//! - **Zstd**: .csv.zst files (feature `compression`)
//!
//! A location may name a single file or a directory; a directory is read file
//! by file in name order and every header must agree.
//!
//! ## Usage Patterns
//!
//! ```rust,ignore
//! use liu::catalog::{LiuCatalogEntry, LiuStaticCatalog};
//! use liu::ingest::{LiuIngestReader, LiuReaderConfig};
//!
//! let catalog = LiuStaticCatalog::new()
//!     .with_dataset("raw_logs", LiuCatalogEntry::log_events("data/raw_logs"));
//! let reader = LiuIngestReader::new()
//!     .with_config(LiuReaderConfig::default().with_job_run_id("jr_42"));
//! let batch = reader.read("raw_logs", &catalog)?;
//! ```

pub mod format;
pub mod reader;

pub use format::{list_source_files, open_source, resolve_location, LiuSourceCompression};
pub use reader::{LiuBatchReader, LiuIngestReader, LiuReaderConfig, LiuRecordIterator, DEFAULT_NODE_NAME};
