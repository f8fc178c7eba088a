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

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use serde::{Deserialize, Serialize};

use crate::errors::{LiuError, Result};
use crate::ingest::format::resolve_location;
use crate::record::LOG_COLUMNS;

/// Compression codec of the Parquet output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiuCodec {
    #[default]
    Snappy,
    Gzip,
    Zstd,
    Lz4,
    Uncompressed,
}

impl LiuCodec {
    pub fn to_parquet(self) -> Compression {
        match self {
            LiuCodec::Snappy => Compression::SNAPPY,
            LiuCodec::Gzip => Compression::GZIP(GzipLevel::default()),
            LiuCodec::Zstd => Compression::ZSTD(ZstdLevel::default()),
            LiuCodec::Lz4 => Compression::LZ4_RAW,
            LiuCodec::Uncompressed => Compression::UNCOMPRESSED,
        }
    }

    /// Infix used in output file names, `None` for uncompressed output.
    pub fn file_infix(self) -> Option<&'static str> {
        match self {
            LiuCodec::Snappy => Some("snappy"),
            LiuCodec::Gzip => Some("gz"),
            LiuCodec::Zstd => Some("zstd"),
            LiuCodec::Lz4 => Some("lz4"),
            LiuCodec::Uncompressed => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LiuCodec::Snappy => "snappy",
            LiuCodec::Gzip => "gzip",
            LiuCodec::Zstd => "zstd",
            LiuCodec::Lz4 => "lz4",
            LiuCodec::Uncompressed => "uncompressed",
        }
    }
}

impl fmt::Display for LiuCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiuCodec {
    type Err = LiuError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "snappy" => Ok(LiuCodec::Snappy),
            "gzip" | "gz" => Ok(LiuCodec::Gzip),
            "zstd" => Ok(LiuCodec::Zstd),
            "lz4" => Ok(LiuCodec::Lz4),
            "uncompressed" | "none" => Ok(LiuCodec::Uncompressed),
            other => Err(LiuError::config(format!("unknown codec '{other}'"))),
        }
    }
}

/// Where and how a batch is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiuDestination {
    /// Plain path or `file://` URI of the output root.
    pub location: String,
    #[serde(default)]
    pub partition_keys: Vec<String>,
    #[serde(default)]
    pub codec: LiuCodec,
    /// Upper bound of records per output file; unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_records_per_file: Option<usize>,
}

impl LiuDestination {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            partition_keys: Vec::new(),
            codec: LiuCodec::default(),
            max_records_per_file: None,
        }
    }

    pub fn with_partition_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_codec(mut self, codec: LiuCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_max_records_per_file(mut self, max: usize) -> Self {
        self.max_records_per_file = Some(max);
        self
    }

    /// Local directory the output is committed under.
    pub fn root(&self) -> Result<PathBuf> {
        resolve_location(&self.location).map_err(|err| match err {
            LiuError::SourceUnavailable { message, .. } => {
                LiuError::write(format!("destination '{}': {message}", self.location))
            }
            other => other,
        })
    }

    /// Rejects unknown, duplicate or exhaustive partition keys.
    pub fn validate(&self) -> Result<()> {
        for (idx, key) in self.partition_keys.iter().enumerate() {
            if !LOG_COLUMNS.contains(&key.as_str()) {
                return Err(LiuError::write(format!("unknown partition key '{key}'")));
            }
            if self.partition_keys[..idx].contains(key) {
                return Err(LiuError::write(format!("duplicate partition key '{key}'")));
            }
        }
        if self.partition_keys.len() >= LOG_COLUMNS.len() {
            return Err(LiuError::write("partition keys must leave at least one data column"));
        }
        if self.max_records_per_file == Some(0) {
            return Err(LiuError::write("max_records_per_file must be positive"));
        }
        Ok(())
    }

    /// Log columns stored inside the files, partition keys excluded.
    pub fn data_columns(&self) -> Vec<&'static str> {
        LOG_COLUMNS
            .iter()
            .copied()
            .filter(|c| !self.partition_keys.iter().any(|k| k == c))
            .collect()
    }
}
