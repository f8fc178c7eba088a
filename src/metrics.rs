//! Copyright © 2025 Dunimd Team. All Rights Reserved.
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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::LiuBatch;

/// Batch level observations published alongside rule outcomes.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct LiuBatchObservations {
    pub row_count: usize,
    pub column_count: usize,
    /// Records whose value in the column is empty, per observed column.
    pub empty_value_counts: BTreeMap<String, usize>,
    pub status_code_counts: BTreeMap<i32, usize>,
    pub average_response_ms: f64,
    pub max_response_ms: u32,
}

impl LiuBatchObservations {
    pub fn compute(batch: &LiuBatch) -> Self {
        let mut observations = LiuBatchObservations {
            row_count: batch.len(),
            column_count: batch.column_count(),
            ..Default::default()
        };

        for column in batch.columns() {
            observations.empty_value_counts.insert(column.clone(), 0);
        }

        if batch.is_empty() {
            return observations;
        }

        let mut total_ms = 0u64;
        for record in batch.records() {
            for column in batch.columns() {
                let empty = record
                    .field_value(column)
                    .map(|v| v.trim().is_empty())
                    .unwrap_or(true);
                if empty {
                    *observations.empty_value_counts.entry(column.clone()).or_insert(0) += 1;
                }
            }
            *observations.status_code_counts.entry(record.status_code()).or_insert(0) += 1;
            total_ms += u64::from(record.response_ms());
            observations.max_response_ms = observations.max_response_ms.max(record.response_ms());
        }

        observations.average_response_ms = total_ms as f64 / batch.len() as f64;
        observations
    }

    pub fn as_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
