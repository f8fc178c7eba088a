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

//! # Liu Error Module
//!
//! This module defines the error types used throughout the Liu pipeline for
//! consistent error handling and reporting.
//!
//! ## Error Categories
//!
//! - **Parse**: A source row could not be turned into a log record
//! - **RuleDefinition**: A quality rule or ruleset text is malformed
//! - **SourceUnavailable**: The resolved source location cannot be read
//! - **SchemaMismatch**: The observed header disagrees with the catalog schema
//! - **QualityGate**: The batch failed its ruleset while gating is enabled
//! - **Write**: The columnar output could not be produced or committed
//! - **NotFound**: The catalog does not know the requested dataset
//! - **Publish**: A quality result could not be published (strict mode only)
//! - **Config**: A job, catalog or logging file is invalid
//! - **Io / Serde / Internal**: Low level failures
//!
//! Quality-gate failures are kept apart from infrastructure failures so that
//! callers can tell "the data is bad" from "the platform is broken", see
//! [`LiuError::is_data_quality`].

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Liu.
pub type Result<T> = std::result::Result<T, LiuError>;

/// Canonical error enumeration for Liu.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq)]
pub enum LiuError {
    /// A raw row could not be parsed into a record.
    #[error("parse error: {reason}")]
    Parse { reason: String },

    /// A rule or ruleset definition was rejected at construction time.
    #[error("rule definition error: {message}")]
    RuleDefinition { message: String },

    /// The resolved source location could not be read.
    #[error("source '{location}' unavailable: {message}")]
    SourceUnavailable { location: String, message: String },

    /// The observed column set is incompatible with the declared schema.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The batch failed its ruleset and the pipeline gates on quality.
    #[error("quality gate failed in context '{context}': failing rules [{}]", failed_rules.join(", "))]
    QualityGate {
        context: String,
        failed_rules: Vec<String>,
    },

    /// Columnar output could not be written or committed.
    #[error("write error: {reason}")]
    Write { reason: String },

    /// The catalog has no entry for the dataset.
    #[error("dataset '{dataset}' not found in catalog")]
    NotFound { dataset: String },

    /// Publishing a quality result failed.
    #[error("publish error: {message}")]
    Publish { message: String },

    /// Invalid configuration input.
    #[error("config error: {message}")]
    Config { message: String },

    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for LiuError {
    fn from(err: io::Error) -> Self {
        LiuError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LiuError {
    fn from(err: serde_json::Error) -> Self {
        LiuError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for LiuError {
    fn from(err: serde_yaml::Error) -> Self {
        LiuError::Serde(err.to_string())
    }
}

impl From<csv::Error> for LiuError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            LiuError::Io(err.to_string())
        } else {
            LiuError::parse(err.to_string())
        }
    }
}

impl From<parquet::errors::ParquetError> for LiuError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        LiuError::write(format!("parquet: {err}"))
    }
}

impl From<arrow::error::ArrowError> for LiuError {
    fn from(err: arrow::error::ArrowError) -> Self {
        LiuError::write(format!("arrow: {err}"))
    }
}

impl LiuError {
    /// Helper to construct parse errors.
    pub fn parse<T: Into<String>>(reason: T) -> Self {
        LiuError::Parse {
            reason: reason.into(),
        }
    }

    /// Helper to construct rule definition errors.
    pub fn rule_definition<T: Into<String>>(message: T) -> Self {
        LiuError::RuleDefinition {
            message: message.into(),
        }
    }

    /// Helper to construct source errors.
    pub fn source_unavailable(location: impl Into<String>, message: impl Into<String>) -> Self {
        LiuError::SourceUnavailable {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Helper to construct schema errors.
    pub fn schema_mismatch<T: Into<String>>(message: T) -> Self {
        LiuError::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Helper to construct quality gate errors.
    pub fn quality_gate(context: impl Into<String>, failed_rules: Vec<String>) -> Self {
        LiuError::QualityGate {
            context: context.into(),
            failed_rules,
        }
    }

    /// Helper to construct write errors.
    pub fn write<T: Into<String>>(reason: T) -> Self {
        LiuError::Write {
            reason: reason.into(),
        }
    }

    /// Helper to construct catalog lookup errors.
    pub fn not_found<T: Into<String>>(dataset: T) -> Self {
        LiuError::NotFound {
            dataset: dataset.into(),
        }
    }

    /// Helper to construct publish errors.
    pub fn publish<T: Into<String>>(message: T) -> Self {
        LiuError::Publish {
            message: message.into(),
        }
    }

    /// Helper to construct configuration errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        LiuError::Config {
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        LiuError::Internal(message.into())
    }

    /// True when the failure describes the data rather than the platform.
    pub fn is_data_quality(&self) -> bool {
        matches!(
            self,
            LiuError::QualityGate { .. } | LiuError::Parse { .. } | LiuError::SchemaMismatch { .. }
        )
    }

    /// True for storage, catalog and other platform failures.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            LiuError::SourceUnavailable { .. }
                | LiuError::Write { .. }
                | LiuError::NotFound { .. }
                | LiuError::Publish { .. }
                | LiuError::Io(_)
        )
    }

    /// Stable short label for the error category, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            LiuError::Parse { .. } => "parse",
            LiuError::RuleDefinition { .. } => "rule_definition",
            LiuError::SourceUnavailable { .. } => "source_unavailable",
            LiuError::SchemaMismatch { .. } => "schema_mismatch",
            LiuError::QualityGate { .. } => "quality_gate",
            LiuError::Write { .. } => "write",
            LiuError::NotFound { .. } => "not_found",
            LiuError::Publish { .. } => "publish",
            LiuError::Config { .. } => "config",
            LiuError::Io(_) => "io",
            LiuError::Serde(_) => "serde",
            LiuError::Internal(_) => "internal",
        }
    }
}
