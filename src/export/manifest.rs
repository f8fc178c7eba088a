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

//! Commit manifest of a destination.
//!
//! The manifest is the source of truth for which files belong to the
//! destination: a file is visible once its transformation entry is stored.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{LiuError, Result};
use crate::export::destination::LiuCodec;

pub const MANIFEST_FILE_NAME: &str = "_liu_manifest.json";
pub const MANIFEST_VERSION: &str = "1.0.0";

/// One committed Parquet file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuManifestFile {
    /// Path relative to the destination root, `/` separated.
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub partition: BTreeMap<String, String>,
    pub size: u64,
    pub hash: String,
    pub record_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Files committed for one transformation id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuManifestEntry {
    pub transformation_id: String,
    pub committed_at: DateTime<Utc>,
    pub codec: LiuCodec,
    #[serde(default)]
    pub partition_keys: Vec<String>,
    pub total_records: usize,
    pub total_size: u64,
    pub files: Vec<LiuManifestFile>,
}

impl LiuManifestEntry {
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }
}

#[derive(Debug)]
pub struct LiuManifestEntryBuilder {
    entry: LiuManifestEntry,
}

impl LiuManifestEntryBuilder {
    pub fn new(transformation_id: impl Into<String>) -> Self {
        Self {
            entry: LiuManifestEntry {
                transformation_id: transformation_id.into(),
                committed_at: Utc::now(),
                codec: LiuCodec::default(),
                partition_keys: Vec::new(),
                total_records: 0,
                total_size: 0,
                files: Vec::new(),
            },
        }
    }

    pub fn codec(mut self, codec: LiuCodec) -> Self {
        self.entry.codec = codec;
        self
    }

    pub fn partition_keys(mut self, keys: &[String]) -> Self {
        self.entry.partition_keys = keys.to_vec();
        self
    }

    pub fn add_file(mut self, file: LiuManifestFile) -> Self {
        self.entry.total_records += file.record_count;
        self.entry.total_size += file.size;
        self.entry.files.push(file);
        self
    }

    pub fn build(self) -> LiuManifestEntry {
        self.entry
    }
}

/// All entries committed under one destination root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuCommitManifest {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: BTreeMap<String, LiuManifestEntry>,
}

impl Default for LiuCommitManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            updated_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }
}

impl LiuCommitManifest {
    /// Reads the manifest under `root`; a missing file is an empty manifest.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(MANIFEST_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|err| LiuError::write(format!("read manifest {}: {err}", path.display())))?;
        Self::from_json(&content)
    }

    /// Writes the manifest under `root` through a temp file and a rename.
    pub fn store(&self, root: &Path) -> Result<()> {
        let path = root.join(MANIFEST_FILE_NAME);
        let temp = root.join(format!(".{MANIFEST_FILE_NAME}.tmp"));
        fs::write(&temp, self.to_json()?)
            .map_err(|err| LiuError::write(format!("write {}: {err}", temp.display())))?;
        fs::rename(&temp, &path).map_err(|err| {
            let _ = fs::remove_file(&temp);
            LiuError::write(format!("commit manifest {}: {err}", path.display()))
        })
    }

    pub fn entry(&self, transformation_id: &str) -> Option<&LiuManifestEntry> {
        self.entries.get(transformation_id)
    }

    /// Stores `entry`, returning the one it replaces.
    pub fn upsert(&mut self, entry: LiuManifestEntry) -> Option<LiuManifestEntry> {
        self.updated_at = Utc::now();
        self.entries.insert(entry.transformation_id.clone(), entry)
    }

    pub fn total_records(&self) -> usize {
        self.entries.values().map(|e| e.total_records).sum()
    }

    /// Relative paths of every committed file.
    pub fn committed_files(&self) -> Vec<&str> {
        self.entries.values().flat_map(|e| e.file_paths()).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| LiuError::internal(format!("serialize manifest: {err}")))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| LiuError::write(format!("invalid manifest JSON: {err}")))
    }
}

/// BLAKE3 digest of a file, hex encoded.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .map_err(|err| LiuError::write(format!("hash {}: {err}", path.display())))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
