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

//! # Parquet Writer Module
//!
//! Writes accepted batches as compressed Parquet files, optionally split into
//! Hive-style partitions, and commits them through the destination manifest.
//!
//! A write goes through four steps:
//!
//! 1. the existing manifest is loaded, so a corrupt one fails the write early
//! 2. every output file is encoded into a hidden staging directory
//! 3. staged files are moved to their final path
//! 4. the manifest entry of the transformation id is stored
//!
//! Should step 3 or 4 fail, the moved files are removed and the files they
//! replaced are put back.
//!
//! Output names derive from the transformation id only, so a re-run with the
//! same id overwrites its previous files; files of the previous run that the
//! new run no longer produces are removed after the manifest is stored.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::Utc;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::errors::{LiuError, Result};
use crate::export::destination::LiuDestination;
use crate::export::manifest::{
    compute_file_hash, LiuCommitManifest, LiuManifestEntryBuilder, LiuManifestFile,
};
use crate::record::{LiuBatch, LiuLogRecord};

/// Hive's marker for an empty partition value.
pub const DEFAULT_PARTITION_VALUE: &str = "__HIVE_DEFAULT_PARTITION__";

/// Outcome of a committed write.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiuWriteResult {
    pub transformation_id: String,
    pub files: Vec<LiuManifestFile>,
    pub records_written: usize,
    pub bytes_written: u64,
    pub partitions: usize,
    /// Files of a previous run with the same id that were removed.
    pub removed_files: usize,
}

/// Persists a batch at a destination.
pub trait LiuBatchWriter {
    fn write(&self, batch: &LiuBatch, destination: &LiuDestination) -> Result<LiuWriteResult>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuParquetWriterConfig {
    pub max_row_group_size: usize,
}

impl Default for LiuParquetWriterConfig {
    fn default() -> Self {
        Self {
            max_row_group_size: 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LiuParquetWriter {
    config: LiuParquetWriterConfig,
}

struct LiuFileTask<'a> {
    relative_path: String,
    partition: BTreeMap<String, String>,
    records: Vec<&'a LiuLogRecord>,
}

impl LiuParquetWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: LiuParquetWriterConfig) -> Self {
        self.config = config;
        self
    }

    fn plan<'a>(&self, batch: &'a LiuBatch, destination: &LiuDestination) -> Vec<LiuFileTask<'a>> {
        let mut groups: BTreeMap<Vec<String>, Vec<&'a LiuLogRecord>> = BTreeMap::new();
        if destination.partition_keys.is_empty() {
            groups.insert(Vec::new(), batch.records().iter().collect());
        } else {
            for record in batch.records() {
                let values: Vec<String> = destination
                    .partition_keys
                    .iter()
                    .map(|key| record.field_value(key).unwrap_or_default())
                    .collect();
                groups.entry(values).or_default().push(record);
            }
        }

        let digest = batch.transformation_id().digest();
        let suffix = match destination.codec.file_infix() {
            Some(infix) => format!("{infix}.parquet"),
            None => "parquet".to_string(),
        };

        let mut tasks = Vec::new();
        let mut index = 0usize;
        for (values, records) in groups {
            let partition: BTreeMap<String, String> = destination
                .partition_keys
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect();
            let directory: String = destination
                .partition_keys
                .iter()
                .zip(values.iter())
                .map(|(key, value)| format!("{key}={}/", escape_partition_value(value)))
                .collect();

            let chunk_size = destination.max_records_per_file.unwrap_or(usize::MAX).max(1);
            let chunks: Vec<Vec<&'a LiuLogRecord>> = if records.is_empty() {
                vec![Vec::new()]
            } else {
                records.chunks(chunk_size).map(|c| c.to_vec()).collect()
            };
            for chunk in chunks {
                tasks.push(LiuFileTask {
                    relative_path: format!("{directory}part-{digest}-{index:05}.{suffix}"),
                    partition: partition.clone(),
                    records: chunk,
                });
                index += 1;
            }
        }
        tasks
    }

    fn encode(
        &self,
        task: &LiuFileTask<'_>,
        schema: &SchemaRef,
        destination: &LiuDestination,
        staging: &Path,
    ) -> Result<LiuManifestFile> {
        let path = staging.join(&task.relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| LiuError::write(format!("create {}: {err}", parent.display())))?;
        }

        let record_batch = to_record_batch(schema, &task.records)?;
        let properties = WriterProperties::builder()
            .set_compression(destination.codec.to_parquet())
            .set_max_row_group_size(self.config.max_row_group_size.max(1))
            .set_created_by(format!("liu {}", env!("CARGO_PKG_VERSION")))
            .build();

        let file = File::create(&path)
            .map_err(|err| LiuError::write(format!("create {}: {err}", path.display())))?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(properties))?;
        writer.write(&record_batch)?;
        writer.close()?;

        let size = fs::metadata(&path)
            .map_err(|err| LiuError::write(format!("stat {}: {err}", path.display())))?
            .len();

        Ok(LiuManifestFile {
            path: task.relative_path.clone(),
            partition: task.partition.clone(),
            size,
            hash: compute_file_hash(&path)?,
            record_count: task.records.len(),
            created_at: Utc::now(),
        })
    }

    fn encode_all(
        &self,
        tasks: &[LiuFileTask<'_>],
        schema: &SchemaRef,
        destination: &LiuDestination,
        staging: &Path,
    ) -> Result<Vec<LiuManifestFile>> {
        #[cfg(feature = "parallel")]
        let encoded: Vec<Result<LiuManifestFile>> = tasks
            .par_iter()
            .map(|task| self.encode(task, schema, destination, staging))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let encoded: Vec<Result<LiuManifestFile>> = tasks
            .iter()
            .map(|task| self.encode(task, schema, destination, staging))
            .collect();

        encoded.into_iter().collect()
    }

    /// Moves staged files into place and stores the manifest.
    ///
    /// A failure restores every file this call replaced and removes the ones
    /// it added, so the destination keeps its previous committed state.
    fn commit(
        &self,
        root: &Path,
        staging: &Path,
        files: &[LiuManifestFile],
        destination: &LiuDestination,
        transformation_id: &str,
        mut manifest: LiuCommitManifest,
    ) -> Result<usize> {
        let mut moves = LiuPlacedFiles::new(staging.join(REPLACED_DIR));
        let stored = files
            .iter()
            .try_for_each(|file| moves.place(&staging.join(&file.path), root, &file.path))
            .and_then(|()| {
                let entry = files
                    .iter()
                    .cloned()
                    .fold(
                        LiuManifestEntryBuilder::new(transformation_id)
                            .codec(destination.codec)
                            .partition_keys(&destination.partition_keys),
                        |builder, file| builder.add_file(file),
                    )
                    .build();
                let previous = manifest.upsert(entry);
                manifest.store(root)?;
                Ok(previous)
            });

        let previous = match stored {
            Ok(previous) => previous,
            Err(err) => {
                moves.roll_back();
                return Err(err);
            }
        };

        let current: BTreeSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
        let mut removed = 0;
        if let Some(previous) = previous {
            for stale in previous.file_paths().filter(|p| !current.contains(p)) {
                let path = root.join(stale);
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => log::warn!("could not remove stale file {}: {err}", path.display()),
                }
            }
        }
        Ok(removed)
    }
}

/// Staging subdirectory holding the files a commit replaces.
const REPLACED_DIR: &str = ".replaced";

/// Files moved into the destination by one commit, in move order.
struct LiuPlacedFiles {
    backup_root: PathBuf,
    placed: Vec<PathBuf>,
    replaced: Vec<(PathBuf, PathBuf)>,
}

impl LiuPlacedFiles {
    fn new(backup_root: PathBuf) -> Self {
        Self {
            backup_root,
            placed: Vec::new(),
            replaced: Vec::new(),
        }
    }

    fn place(&mut self, from: &Path, root: &Path, relative: &str) -> Result<()> {
        let to = root.join(relative);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| LiuError::write(format!("create {}: {err}", parent.display())))?;
        }
        if to.exists() {
            let backup = self.backup_root.join(relative);
            if let Some(parent) = backup.parent() {
                fs::create_dir_all(parent)
                    .map_err(|err| LiuError::write(format!("create {}: {err}", parent.display())))?;
            }
            fs::rename(&to, &backup)
                .map_err(|err| LiuError::write(format!("replace {}: {err}", to.display())))?;
            self.replaced.push((backup, to.clone()));
        }
        fs::rename(from, &to).map_err(|err| LiuError::write(format!("move {}: {err}", to.display())))?;
        self.placed.push(to);
        Ok(())
    }

    fn roll_back(self) {
        for path in self.placed.iter().rev() {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::error!("could not remove {} after a failed commit: {err}", path.display());
                }
            }
        }
        for (backup, original) in self.replaced.iter().rev() {
            if let Err(err) = fs::rename(backup, original) {
                log::error!("could not restore {}: {err}", original.display());
            }
        }
        log::warn!(
            "rolled back {} placed and {} replaced file(s)",
            self.placed.len(),
            self.replaced.len()
        );
    }
}

impl LiuBatchWriter for LiuParquetWriter {
    fn write(&self, batch: &LiuBatch, destination: &LiuDestination) -> Result<LiuWriteResult> {
        destination.validate()?;
        let root = destination.root()?;
        let transformation_id = batch.transformation_id().to_string();
        let manifest = LiuCommitManifest::load(&root)?;

        fs::create_dir_all(&root)
            .map_err(|err| LiuError::write(format!("create {}: {err}", root.display())))?;
        let staging = staging_dir(&root, &batch.transformation_id().digest());
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .map_err(|err| LiuError::write(format!("clear {}: {err}", staging.display())))?;
        }
        fs::create_dir_all(&staging)
            .map_err(|err| LiuError::write(format!("create {}: {err}", staging.display())))?;

        let schema = output_schema(destination);
        let tasks = self.plan(batch, destination);
        let partitions: BTreeSet<&BTreeMap<String, String>> = tasks.iter().map(|t| &t.partition).collect();
        let partitions = partitions.len();

        let outcome = self
            .encode_all(&tasks, &schema, destination, &staging)
            .and_then(|files| {
                let removed =
                    self.commit(&root, &staging, &files, destination, &transformation_id, manifest)?;
                Ok((files, removed))
            });

        if let Err(err) = fs::remove_dir_all(&staging) {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("could not remove staging {}: {err}", staging.display());
            }
        }

        let (files, removed_files) = outcome?;
        let result = LiuWriteResult {
            transformation_id,
            records_written: files.iter().map(|f| f.record_count).sum(),
            bytes_written: files.iter().map(|f| f.size).sum(),
            partitions,
            removed_files,
            files,
        };
        log::info!(
            "committed {} records in {} file(s) to {} ({}, {} partition(s))",
            result.records_written,
            result.files.len(),
            root.display(),
            destination.codec,
            result.partitions
        );
        Ok(result)
    }
}

fn staging_dir(root: &Path, digest: &str) -> PathBuf {
    root.join(format!(".liu_staging-{digest}"))
}

/// Arrow schema of the columns stored in the files.
pub fn output_schema(destination: &LiuDestination) -> SchemaRef {
    let fields: Vec<Field> = destination
        .data_columns()
        .into_iter()
        .map(|column| match column {
            "event_time" => Field::new(column, DataType::Timestamp(TimeUnit::Microsecond, None), false),
            "status_code" => Field::new(column, DataType::Int32, false),
            "response_ms" => Field::new(column, DataType::Int64, false),
            _ => Field::new(column, DataType::Utf8, false),
        })
        .collect();
    Arc::new(Schema::new(fields))
}

fn to_record_batch(schema: &SchemaRef, records: &[&LiuLogRecord]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|field| -> ArrayRef {
            match field.name().as_str() {
                "event_time" => Arc::new(TimestampMicrosecondArray::from_iter_values(
                    records.iter().map(|r| r.event_time().and_utc().timestamp_micros()),
                )),
                "user_id" => Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.user_id()))),
                "endpoint" => Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.endpoint()))),
                "status_code" => {
                    Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.status_code())))
                }
                "response_ms" => Arc::new(Int64Array::from_iter_values(
                    records.iter().map(|r| i64::from(r.response_ms())),
                )),
                _ => Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.user_agent()))),
            }
        })
        .collect();

    let options = RecordBatchOptions::new().with_row_count(Some(records.len()));
    Ok(RecordBatch::try_new_with_options(schema.clone(), columns, &options)?)
}

/// Escapes a value for use in a `key=value` directory name.
pub fn escape_partition_value(value: &str) -> String {
    if value.is_empty() {
        return DEFAULT_PARTITION_VALUE.to_string();
    }
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '/' | '\\' | '=' | '%' | ':' | '"' | '\'' | '*' | '?' | '#' | '[' | ']' | '{' | '}'
            | '^' | '\u{7f}' => {
                escaped.push_str(&format!("%{:02X}", ch as u32));
            }
            c if c.is_control() => escaped.push_str(&format!("%{:02X}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}
