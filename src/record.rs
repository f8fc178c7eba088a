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

//! # Liu Record Module
//!
//! This module provides the data structures for individual log events and the
//! batches that flow through a Liu pipeline.
//!
//! ## Design Principles
//!
//! - **Typed**: a [`LiuLogRecord`] carries the six log columns with their
//!   native types instead of a loose JSON payload
//! - **Immutable**: fields are private and only exposed through accessors, so
//!   a record read from the source leaves the pipeline exactly as it entered
//! - **Header driven**: raw rows are matched to columns by header name, the
//!   header order of a source file does not matter
//!
//! ## Usage Example
//!
//! ```rust
//! use liu::record::parse_record;
//!
//! # fn main() -> liu::errors::Result<()> {
//! let header = ["event_time", "user_id", "endpoint", "status_code", "response_ms", "user_agent"];
//! let row = ["2026-01-26T10:00:00", "user_001", "/home", "200", "120", "mobile"];
//! let record = parse_record(&row, &header)?;
//! assert_eq!(record.user_id(), "user_001");
//! # Ok(())
//! # }
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::{LiuError, Result};

/// Column names of a log event, in canonical order.
pub const LOG_COLUMNS: [&str; 6] = [
    "event_time",
    "user_id",
    "endpoint",
    "status_code",
    "response_ms",
    "user_agent",
];

/// Format used when a timestamp is rendered back to text.
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Logical type of a catalog column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiuColumnType {
    Timestamp,
    String,
    Integer,
}

/// One `(name, type)` pair of a declared schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiuColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: LiuColumnType,
}

impl LiuColumnSpec {
    pub fn new(name: impl Into<String>, data_type: LiuColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered column list declared for a dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiuSchema {
    columns: Vec<LiuColumnSpec>,
}

impl LiuSchema {
    pub fn new(columns: Vec<LiuColumnSpec>) -> Self {
        Self { columns }
    }

    /// The schema of the web log events produced by the log generator.
    pub fn log_events() -> Self {
        Self::new(vec![
            LiuColumnSpec::new("event_time", LiuColumnType::Timestamp),
            LiuColumnSpec::new("user_id", LiuColumnType::String),
            LiuColumnSpec::new("endpoint", LiuColumnType::String),
            LiuColumnSpec::new("status_code", LiuColumnType::Integer),
            LiuColumnSpec::new("response_ms", LiuColumnType::Integer),
            LiuColumnSpec::new("user_agent", LiuColumnType::String),
        ])
    }

    pub fn columns(&self) -> &[LiuColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Checks an observed header against the declared columns.
    ///
    /// The header is compatible when it has the same width and names every
    /// declared column, in any order.
    pub fn check_header<H: AsRef<str>>(&self, header: &[H]) -> Result<()> {
        if header.len() != self.columns.len() {
            return Err(LiuError::schema_mismatch(format!(
                "expected {} columns, observed {}",
                self.columns.len(),
                header.len()
            )));
        }
        let missing: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| !header.iter().any(|h| h.as_ref() == c.name))
            .map(|c| c.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(LiuError::schema_mismatch(format!(
                "declared columns missing from source header: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

/// One web log event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiuLogRecord {
    event_time: NaiveDateTime,
    user_id: String,
    endpoint: String,
    status_code: i32,
    response_ms: u32,
    user_agent: String,
}

impl LiuLogRecord {
    /// Builds a record from already typed values.
    ///
    /// `user_id` must be non-empty, the same rule [`parse_record`] enforces.
    pub fn new(
        event_time: NaiveDateTime,
        user_id: impl Into<String>,
        endpoint: impl Into<String>,
        status_code: i32,
        response_ms: u32,
        user_agent: impl Into<String>,
    ) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(LiuError::parse("user_id must not be empty"));
        }
        Ok(Self {
            event_time,
            user_id,
            endpoint: endpoint.into(),
            status_code,
            response_ms,
            user_agent: user_agent.into(),
        })
    }

    pub fn event_time(&self) -> NaiveDateTime {
        self.event_time
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    pub fn response_ms(&self) -> u32 {
        self.response_ms
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Textual value of a column, as it would appear in the source file.
    ///
    /// Returns `None` for names outside [`LOG_COLUMNS`].
    pub fn field_value(&self, column: &str) -> Option<String> {
        match column {
            "event_time" => Some(self.event_time.format(EVENT_TIME_FORMAT).to_string()),
            "user_id" => Some(self.user_id.clone()),
            "endpoint" => Some(self.endpoint.clone()),
            "status_code" => Some(self.status_code.to_string()),
            "response_ms" => Some(self.response_ms.to_string()),
            "user_agent" => Some(self.user_agent.clone()),
            _ => None,
        }
    }
}

/// Parses an ISO-8601 timestamp.
///
/// Naive values (`2026-01-26T10:00:00`, optional fraction, `T` or space) are
/// taken as-is; values with an offset are normalised to UTC.
pub fn parse_event_time(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LiuError::parse("event_time must not be empty"));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Ok(ts);
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|ts| ts.naive_utc())
        .map_err(|err| LiuError::parse(format!("event_time '{trimmed}' is not ISO-8601 ({err})")))
}

/// Column positions of a header, resolved once and reused for every row.
#[derive(Clone, Debug)]
pub struct LiuRecordParser {
    width: usize,
    positions: [usize; 6],
}

impl LiuRecordParser {
    /// Resolves the position of every log column in `header`.
    pub fn new<H: AsRef<str>>(header: &[H]) -> Result<Self> {
        let mut positions = [0usize; 6];
        for (slot, column) in LOG_COLUMNS.iter().enumerate() {
            positions[slot] = header
                .iter()
                .position(|h| h.as_ref().trim() == *column)
                .ok_or_else(|| LiuError::parse(format!("header is missing column '{column}'")))?;
        }
        Ok(Self {
            width: header.len(),
            positions,
        })
    }

    /// Parses one raw row.
    pub fn parse<R: AsRef<str>>(&self, raw_row: &[R]) -> Result<LiuLogRecord> {
        if raw_row.len() != self.width {
            return Err(LiuError::parse(format!(
                "row has {} fields, header declares {}",
                raw_row.len(),
                self.width
            )));
        }
        let field = |slot: usize| raw_row[self.positions[slot]].as_ref().trim();

        let event_time = parse_event_time(field(0))?;
        let user_id = field(1);
        if user_id.is_empty() {
            return Err(LiuError::parse("user_id must not be empty"));
        }
        let status_code = field(3).parse::<i32>().map_err(|err| {
            LiuError::parse(format!("status_code '{}' is not an integer ({err})", field(3)))
        })?;
        let response_ms = field(4).parse::<u32>().map_err(|err| {
            LiuError::parse(format!(
                "response_ms '{}' is not a non-negative integer ({err})",
                field(4)
            ))
        })?;

        Ok(LiuLogRecord {
            event_time,
            user_id: user_id.to_string(),
            endpoint: field(2).to_string(),
            status_code,
            response_ms,
            user_agent: field(5).to_string(),
        })
    }
}

/// Parses a raw row against its header.
///
/// Fails with [`LiuError::Parse`] when the field count differs from the
/// header, when a log column is missing, when `event_time` is not ISO-8601,
/// when `user_id` is empty or when a numeric column does not parse.
pub fn parse_record<R: AsRef<str>, H: AsRef<str>>(raw_row: &[R], header: &[H]) -> Result<LiuLogRecord> {
    LiuRecordParser::new(header)?.parse(raw_row)
}

/// Stable identifier tagging everything one pipeline stage writes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiuTransformationId(String);

impl LiuTransformationId {
    /// Derives the identifier of `node` for one job run.
    pub fn new(job_run_id: &str, node: &str) -> Self {
        Self(format!("{job_run_id}:{node}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, filesystem safe digest of the identifier.
    pub fn digest(&self) -> String {
        blake3::hash(self.0.as_bytes()).to_hex()[..16].to_string()
    }
}

impl fmt::Display for LiuTransformationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered records read together from one source invocation.
#[derive(Clone, Debug)]
pub struct LiuBatch {
    columns: Vec<String>,
    records: Vec<LiuLogRecord>,
    transformation_id: LiuTransformationId,
}

impl LiuBatch {
    pub fn new(
        columns: Vec<String>,
        records: Vec<LiuLogRecord>,
        transformation_id: LiuTransformationId,
    ) -> Self {
        Self {
            columns,
            records,
            transformation_id,
        }
    }

    /// Number of fields per record, i.e. the observed header width.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[LiuLogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn transformation_id(&self) -> &LiuTransformationId {
        &self.transformation_id
    }
}
