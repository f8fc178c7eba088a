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

use std::collections::VecDeque;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::LiuCatalogResolver;
use crate::errors::{LiuError, Result};
use crate::ingest::format::{list_source_files, open_source};
use crate::record::{LiuBatch, LiuLogRecord, LiuRecordParser, LiuTransformationId};

/// Node name used for the transformation id when none is configured.
pub const DEFAULT_NODE_NAME: &str = "liu_catalog_source";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuReaderConfig {
    pub node_name: String,
    pub job_run_id: String,
    pub delimiter: u8,
    pub progress_interval: usize,
}

impl Default for LiuReaderConfig {
    fn default() -> Self {
        Self {
            node_name: DEFAULT_NODE_NAME.to_string(),
            job_run_id: "local".to_string(),
            delimiter: b',',
            progress_interval: 100_000,
        }
    }
}

impl LiuReaderConfig {
    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = node_name.into();
        self
    }

    pub fn with_job_run_id(mut self, job_run_id: impl Into<String>) -> Self {
        self.job_run_id = job_run_id.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Produces the batch of one pipeline run.
pub trait LiuBatchReader {
    fn read_batch(
        &self,
        dataset_name: &str,
        resolver: &dyn LiuCatalogResolver,
        transformation_id: &LiuTransformationId,
    ) -> Result<LiuBatch>;
}

/// Reads a catalog dataset into a batch.
#[derive(Clone, Debug, Default)]
pub struct LiuIngestReader {
    config: LiuReaderConfig,
}

impl LiuIngestReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: LiuReaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LiuReaderConfig {
        &self.config
    }

    pub fn transformation_id(&self) -> LiuTransformationId {
        LiuTransformationId::new(&self.config.job_run_id, &self.config.node_name)
    }

    /// Resolves the dataset, validates the header and returns a lazy record
    /// iterator over every source file.
    pub fn open(
        &self,
        dataset_name: &str,
        resolver: &dyn LiuCatalogResolver,
    ) -> Result<LiuRecordIterator> {
        self.open_as(dataset_name, resolver, self.transformation_id())
    }

    fn open_as(
        &self,
        dataset_name: &str,
        resolver: &dyn LiuCatalogResolver,
        transformation_id: LiuTransformationId,
    ) -> Result<LiuRecordIterator> {
        let entry = resolver.resolve(dataset_name)?;
        let mut pending: VecDeque<PathBuf> = list_source_files(&entry.location)?.into();
        let first = pending
            .pop_front()
            .ok_or_else(|| LiuError::source_unavailable(&entry.location, "no source files"))?;

        let (reader, columns) = open_csv(&first, self.config.delimiter)?;
        entry.schema.check_header(&columns)?;
        let parser = LiuRecordParser::new(&columns).map_err(|err| match err {
            LiuError::Parse { reason } => LiuError::schema_mismatch(reason),
            other => other,
        })?;

        log::debug!(
            "opened dataset '{}' at {} ({} file(s))",
            dataset_name,
            entry.location,
            pending.len() + 1
        );

        Ok(LiuRecordIterator {
            columns,
            parser,
            delimiter: self.config.delimiter,
            progress_interval: self.config.progress_interval.max(1),
            transformation_id,
            current: Some(LiuOpenFile {
                path: first,
                reader,
            }),
            pending,
            row: csv::StringRecord::new(),
            records_read: 0,
            exhausted: false,
        })
    }

    /// Reads the whole dataset. Any malformed row aborts the read.
    pub fn read(&self, dataset_name: &str, resolver: &dyn LiuCatalogResolver) -> Result<LiuBatch> {
        self.read_batch(dataset_name, resolver, &self.transformation_id())
    }
}

impl LiuBatchReader for LiuIngestReader {
    fn read_batch(
        &self,
        dataset_name: &str,
        resolver: &dyn LiuCatalogResolver,
        transformation_id: &LiuTransformationId,
    ) -> Result<LiuBatch> {
        let batch = self
            .open_as(dataset_name, resolver, transformation_id.clone())?
            .into_batch()?;
        log::info!(
            "read {} records from dataset '{}' as {}",
            batch.len(),
            dataset_name,
            batch.transformation_id()
        );
        Ok(batch)
    }
}

struct LiuOpenFile {
    path: PathBuf,
    reader: csv::Reader<Box<dyn Read>>,
}

fn open_csv(path: &Path, delimiter: u8) -> Result<(csv::Reader<Box<dyn Read>>, Vec<String>)> {
    let source = open_source(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(source);
    let columns: Vec<String> = reader
        .headers()
        .map_err(|err| LiuError::source_unavailable(path.display().to_string(), err.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(LiuError::source_unavailable(
            path.display().to_string(),
            "file has no header line",
        ));
    }
    Ok((reader, columns))
}

/// Finite, non-restartable iterator over the records of one dataset.
///
/// The first error ends the iteration.
pub struct LiuRecordIterator {
    columns: Vec<String>,
    parser: LiuRecordParser,
    delimiter: u8,
    progress_interval: usize,
    transformation_id: LiuTransformationId,
    current: Option<LiuOpenFile>,
    pending: VecDeque<PathBuf>,
    row: csv::StringRecord,
    records_read: usize,
    exhausted: bool,
}

impl LiuRecordIterator {
    /// Header of the dataset, as observed in the first source file.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn transformation_id(&self) -> &LiuTransformationId {
        &self.transformation_id
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Drains the iterator into a batch.
    pub fn into_batch(mut self) -> Result<LiuBatch> {
        let mut records = Vec::new();
        for record in self.by_ref() {
            records.push(record?);
        }
        Ok(LiuBatch::new(self.columns, records, self.transformation_id))
    }

    fn advance(&mut self) -> Result<Option<LiuLogRecord>> {
        loop {
            if self.current.is_none() {
                match self.pending.pop_front() {
                    Some(path) => {
                        let (reader, columns) = open_csv(&path, self.delimiter)?;
                        if columns != self.columns {
                            return Err(LiuError::schema_mismatch(format!(
                                "header of {} differs from the first source file",
                                path.display()
                            )));
                        }
                        self.current = Some(LiuOpenFile { path, reader });
                    }
                    None => return Ok(None),
                }
            }

            let current = match self.current.as_mut() {
                Some(current) => current,
                None => return Ok(None),
            };

            let has_row = current.reader.read_record(&mut self.row).map_err(|err| {
                if err.is_io_error() {
                    LiuError::source_unavailable(current.path.display().to_string(), err.to_string())
                } else {
                    LiuError::parse(format!("{}: {err}", current.path.display()))
                }
            })?;

            if !has_row {
                log::debug!("finished source file {}", current.path.display());
                self.current = None;
                continue;
            }

            let line = self.row.position().map(|p| p.line()).unwrap_or(0);
            let record = self.parser.parse(&self.row.iter().collect::<Vec<_>>()).map_err(|err| {
                let reason = match err {
                    LiuError::Parse { reason } => reason,
                    other => other.to_string(),
                };
                LiuError::parse(format!("{} line {line}: {reason}", current.path.display()))
            })?;

            self.records_read += 1;
            if self.records_read % self.progress_interval == 0 {
                log::debug!("read {} records", self.records_read);
            }
            return Ok(Some(record));
        }
    }
}

impl Iterator for LiuRecordIterator {
    type Item = Result<LiuLogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(err) => {
                self.exhausted = true;
                Some(Err(err))
            }
        }
    }
}

impl std::fmt::Debug for LiuRecordIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiuRecordIterator")
            .field("columns", &self.columns)
            .field("transformation_id", &self.transformation_id)
            .field("pending_files", &self.pending.len())
            .field("records_read", &self.records_read)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
