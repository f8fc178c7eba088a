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

//! # Job Configuration
//!
//! A job file binds everything one pipeline invocation needs. YAML and JSON
//! are accepted, chosen by file extension.
//!
//! ```yaml
//! dataset: raw_logs
//! job_run_id: jr_20260126
//! catalog_path: catalog.yaml
//! destination:
//!   location: out/web_logs
//!   partition_keys: [user_agent]
//!   codec: snappy
//! sink:
//!   kind: jsonl
//!   path: out/quality.jsonl
//! pipeline:
//!   gate_on_quality: true
//!   ruleset: |
//!     Rules = [
//!         ColumnCount > 0,
//!         IsComplete "user_id"
//!     ]
//! logging:
//!   default_level: INFO
//! ```
//!
//! Relative paths are resolved against the directory of the job file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::catalog::LiuStaticCatalog;
use crate::errors::{LiuError, Result};
use crate::export::LiuDestination;
use crate::logging::{LiuLogConfig, LiuLogConfigBuilder};
use crate::pipeline::{LiuPipelineConfig, LiuRunRequest};
use crate::quality::LiuSinkConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuJobConfig {
    pub dataset: String,
    pub destination: LiuDestination,
    #[serde(default)]
    pub job_run_id: Option<String>,
    /// Catalog file; takes precedence over `catalog`.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Inline catalog.
    #[serde(default)]
    pub catalog: Option<LiuStaticCatalog>,
    #[serde(default)]
    pub sink: LiuSinkConfig,
    #[serde(default)]
    pub pipeline: LiuPipelineConfig,
    #[serde(default)]
    pub logging: Option<LiuLogConfigBuilder>,
}

impl LiuJobConfig {
    /// Loads a job file, YAML or JSON by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| LiuError::config(format!("read job file {}: {err}", path.display())))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let mut job: LiuJobConfig = match extension.as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|err| LiuError::config(format!("job file {}: {err}", path.display())))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|err| LiuError::config(format!("job file {}: {err}", path.display())))?,
            other => {
                return Err(LiuError::config(format!(
                    "unsupported job file extension '{other}' for {}",
                    path.display()
                )))
            }
        };
        if let Some(base) = path.parent() {
            job.rebase(base);
        }
        Ok(job)
    }

    /// Resolves relative paths against `base`.
    pub fn rebase(&mut self, base: &Path) {
        if let Some(catalog_path) = &self.catalog_path {
            if catalog_path.is_relative() {
                self.catalog_path = Some(base.join(catalog_path));
            }
        }
        if let Some(catalog) = &mut self.catalog {
            catalog.rebase(base);
        }
        if !self.destination.location.contains("://") && Path::new(&self.destination.location).is_relative() {
            self.destination.location = base.join(&self.destination.location).display().to_string();
        }
        if let LiuSinkConfig::Jsonl { path } = &mut self.sink {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Catalog named by the job, from file or inline.
    pub fn load_catalog(&self) -> Result<LiuStaticCatalog> {
        match (&self.catalog_path, &self.catalog) {
            (Some(path), _) => LiuStaticCatalog::from_path(path),
            (None, Some(catalog)) => Ok(catalog.clone()),
            (None, None) => Err(LiuError::config("job defines neither catalog_path nor catalog")),
        }
    }

    pub fn log_config(&self) -> LiuLogConfig {
        self.logging.clone().unwrap_or_default().build()
    }

    /// Builds the run request; command line overrides win over the file.
    pub fn to_request(&self, job_run_id: Option<&str>, gate_on_quality: Option<bool>) -> LiuRunRequest {
        let job_run_id = job_run_id
            .map(str::to_string)
            .or_else(|| self.job_run_id.clone())
            .unwrap_or_else(default_job_run_id);
        let mut request = LiuRunRequest::new(&self.dataset, self.destination.clone(), job_run_id);
        request.gate_on_quality = gate_on_quality;
        request
    }
}

/// Run id derived from the current time, e.g. `jr_20260126T101500`.
pub fn default_job_run_id() -> String {
    Utc::now().format("jr_%Y%m%dT%H%M%S").to_string()
}
