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

//! # Liu Catalog Module
//!
//! Resolution of dataset names to a storage location and a declared schema.
//! Relative locations in a catalog file resolve against the file's directory.
//!
//! ```yaml
//! datasets:
//!   raw_logs:
//!     location: data/raw_logs/2026-01-26
//!     schema:
//!       - { name: event_time, type: timestamp }
//!       - { name: user_id, type: string }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{LiuError, Result};
use crate::record::LiuSchema;

/// What the catalog knows about one dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiuCatalogEntry {
    /// Plain path or `file://` URI of a file or a directory of files.
    pub location: String,
    #[serde(default = "LiuSchema::log_events")]
    pub schema: LiuSchema,
}

impl LiuCatalogEntry {
    pub fn new(location: impl Into<String>, schema: LiuSchema) -> Self {
        Self {
            location: location.into(),
            schema,
        }
    }

    /// Entry declaring the standard six log columns.
    pub fn log_events(location: impl Into<String>) -> Self {
        Self::new(location, LiuSchema::log_events())
    }
}

/// Maps dataset names to catalog entries.
pub trait LiuCatalogResolver {
    /// Fails with [`LiuError::NotFound`] for unknown names.
    fn resolve(&self, dataset_name: &str) -> Result<LiuCatalogEntry>;
}

/// In-memory catalog, built in code or loaded from a YAML/JSON file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiuStaticCatalog {
    #[serde(default)]
    datasets: BTreeMap<String, LiuCatalogEntry>,
}

impl LiuStaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, name: impl Into<String>, entry: LiuCatalogEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: LiuCatalogEntry) {
        self.datasets.insert(name.into(), entry);
    }

    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Resolves relative plain-path locations against `base`.
    pub fn rebase(&mut self, base: &Path) {
        for entry in self.datasets.values_mut() {
            if !entry.location.contains("://") && Path::new(&entry.location).is_relative() {
                entry.location = base.join(&entry.location).display().to_string();
            }
        }
    }

    /// Loads a catalog file, YAML or JSON by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| LiuError::config(format!("read catalog {}: {err}", path.display())))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let mut catalog: LiuStaticCatalog = match extension.as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|err| LiuError::config(format!("catalog {}: {err}", path.display())))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|err| LiuError::config(format!("catalog {}: {err}", path.display())))?,
            other => {
                return Err(LiuError::config(format!(
                    "unsupported catalog extension '{other}' for {}",
                    path.display()
                )))
            }
        };
        if let Some(base) = path.parent() {
            catalog.rebase(base);
        }
        log::debug!("loaded catalog {} with {} datasets", path.display(), catalog.len());
        Ok(catalog)
    }
}

impl LiuCatalogResolver for LiuStaticCatalog {
    fn resolve(&self, dataset_name: &str) -> Result<LiuCatalogEntry> {
        self.datasets
            .get(dataset_name)
            .cloned()
            .ok_or_else(|| LiuError::not_found(dataset_name))
    }
}
