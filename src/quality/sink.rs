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

//! Observability sinks receiving batch quality results.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::errors::{LiuError, Result};
use crate::quality::engine::LiuBatchQualityResult;

/// How a failed publish affects the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiuPublishingStrategy {
    /// Log the failure and carry on.
    #[default]
    BestEffort,
    /// Fail the run with a publish error.
    Strict,
}

/// Destination for quality results.
pub trait LiuQualitySink: Send + Sync {
    fn name(&self) -> &str;

    fn publish(&self, result: &LiuBatchQualityResult) -> Result<()>;
}

/// Emits every result as one structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiuLogSink;

impl LiuQualitySink for LiuLogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn publish(&self, result: &LiuBatchQualityResult) -> Result<()> {
        let payload = serde_json::to_string(result)?;
        if result.overall_passed {
            log::info!(target: "liu::quality", "{payload}");
        } else {
            log::warn!(target: "liu::quality", "{payload}");
        }
        Ok(())
    }
}

/// Appends one JSON document per result to a file.
#[derive(Debug)]
pub struct LiuJsonlSink {
    path: PathBuf,
    guard: Mutex<()>,
}

impl LiuJsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LiuQualitySink for LiuJsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn publish(&self, result: &LiuBatchQualityResult) -> Result<()> {
        let _lock = self
            .guard
            .lock()
            .map_err(|_| LiuError::publish("jsonl sink lock poisoned"))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    LiuError::publish(format!("create {}: {err}", parent.display()))
                })?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| LiuError::publish(format!("open {}: {err}", self.path.display())))?;

        let mut line = serde_json::to_string(result)?;
        line.push('\n');
        file.write_all(line.as_bytes())
            .map_err(|err| LiuError::publish(format!("append {}: {err}", self.path.display())))
    }
}

/// Discards every result.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiuNullSink;

impl LiuQualitySink for LiuNullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn publish(&self, _result: &LiuBatchQualityResult) -> Result<()> {
        Ok(())
    }
}

/// Keeps published results in memory, mostly for inspection in tests.
#[derive(Debug, Default)]
pub struct LiuMemorySink {
    results: Mutex<Vec<LiuBatchQualityResult>>,
}

impl LiuMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<LiuBatchQualityResult> {
        self.results
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl LiuQualitySink for LiuMemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn publish(&self, result: &LiuBatchQualityResult) -> Result<()> {
        self.results
            .lock()
            .map_err(|_| LiuError::publish("memory sink lock poisoned"))?
            .push(result.clone());
        Ok(())
    }
}

/// Sink selection as written in a job file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiuSinkConfig {
    #[default]
    Log,
    Jsonl {
        path: PathBuf,
    },
    Null,
}

impl LiuSinkConfig {
    pub fn build(&self) -> Arc<dyn LiuQualitySink> {
        match self {
            LiuSinkConfig::Log => Arc::new(LiuLogSink),
            LiuSinkConfig::Jsonl { path } => Arc::new(LiuJsonlSink::new(path.clone())),
            LiuSinkConfig::Null => Arc::new(LiuNullSink),
        }
    }
}
