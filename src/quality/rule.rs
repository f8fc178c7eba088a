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

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{LiuError, Result};
use crate::record::LiuBatch;

/// Numeric constraint attached to a rule, e.g. `> 0` or `between 1 and 10`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiuComparison {
    GreaterThan(f64),
    GreaterOrEqual(f64),
    LessThan(f64),
    LessOrEqual(f64),
    Equal(f64),
    NotEqual(f64),
    Between(f64, f64),
}

impl LiuComparison {
    /// Builds a comparison from an operator token.
    pub fn from_operator(op: &str, value: f64) -> Result<Self> {
        match op {
            ">" => Ok(LiuComparison::GreaterThan(value)),
            ">=" => Ok(LiuComparison::GreaterOrEqual(value)),
            "<" => Ok(LiuComparison::LessThan(value)),
            "<=" => Ok(LiuComparison::LessOrEqual(value)),
            "=" | "==" => Ok(LiuComparison::Equal(value)),
            "!=" => Ok(LiuComparison::NotEqual(value)),
            other => Err(LiuError::rule_definition(format!("unknown comparison operator '{other}'"))),
        }
    }

    pub fn between(low: f64, high: f64) -> Result<Self> {
        if low > high {
            return Err(LiuError::rule_definition(format!(
                "between bounds are reversed: {} > {}",
                render_number(low),
                render_number(high)
            )));
        }
        Ok(LiuComparison::Between(low, high))
    }

    pub fn check(&self, observed: f64) -> bool {
        match *self {
            LiuComparison::GreaterThan(v) => observed > v,
            LiuComparison::GreaterOrEqual(v) => observed >= v,
            LiuComparison::LessThan(v) => observed < v,
            LiuComparison::LessOrEqual(v) => observed <= v,
            LiuComparison::Equal(v) => observed == v,
            LiuComparison::NotEqual(v) => observed != v,
            LiuComparison::Between(low, high) => observed >= low && observed <= high,
        }
    }
}

impl fmt::Display for LiuComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LiuComparison::GreaterThan(v) => write!(f, "> {}", render_number(v)),
            LiuComparison::GreaterOrEqual(v) => write!(f, ">= {}", render_number(v)),
            LiuComparison::LessThan(v) => write!(f, "< {}", render_number(v)),
            LiuComparison::LessOrEqual(v) => write!(f, "<= {}", render_number(v)),
            LiuComparison::Equal(v) => write!(f, "= {}", render_number(v)),
            LiuComparison::NotEqual(v) => write!(f, "!= {}", render_number(v)),
            LiuComparison::Between(low, high) => {
                write!(f, "between {} and {}", render_number(low), render_number(high))
            }
        }
    }
}

pub(crate) fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Result of applying one predicate to a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct LiuPredicateOutcome {
    pub passed: bool,
    pub observed: Value,
}

/// Contract every quality rule implementation fulfils.
///
/// Predicates inspect a batch without modifying it and never fail: anything
/// that can be wrong with a rule is rejected when it is constructed.
pub trait LiuRulePredicate: fmt::Debug {
    /// Rule type name as written in a ruleset, e.g. `ColumnCount`.
    fn rule_type(&self) -> &'static str;

    fn evaluate(&self, batch: &LiuBatch) -> LiuPredicateOutcome;
}

/// `ColumnCount <comparison>` over the header width.
#[derive(Debug, Clone)]
pub struct LiuColumnCountRule {
    comparison: LiuComparison,
}

impl LiuColumnCountRule {
    pub fn new(comparison: LiuComparison) -> Self {
        Self { comparison }
    }
}

impl LiuRulePredicate for LiuColumnCountRule {
    fn rule_type(&self) -> &'static str {
        "ColumnCount"
    }

    fn evaluate(&self, batch: &LiuBatch) -> LiuPredicateOutcome {
        let observed = batch.column_count();
        LiuPredicateOutcome {
            passed: self.comparison.check(observed as f64),
            observed: json!(observed),
        }
    }
}

/// `RowCount <comparison>` over the number of records.
#[derive(Debug, Clone)]
pub struct LiuRowCountRule {
    comparison: LiuComparison,
}

impl LiuRowCountRule {
    pub fn new(comparison: LiuComparison) -> Self {
        Self { comparison }
    }
}

impl LiuRulePredicate for LiuRowCountRule {
    fn rule_type(&self) -> &'static str {
        "RowCount"
    }

    fn evaluate(&self, batch: &LiuBatch) -> LiuPredicateOutcome {
        let observed = batch.len();
        LiuPredicateOutcome {
            passed: self.comparison.check(observed as f64),
            observed: json!(observed),
        }
    }
}

/// `ColumnExists "name"`.
#[derive(Debug, Clone)]
pub struct LiuColumnExistsRule {
    column: String,
}

impl LiuColumnExistsRule {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl LiuRulePredicate for LiuColumnExistsRule {
    fn rule_type(&self) -> &'static str {
        "ColumnExists"
    }

    fn evaluate(&self, batch: &LiuBatch) -> LiuPredicateOutcome {
        let exists = batch.columns().iter().any(|c| c == &self.column);
        LiuPredicateOutcome {
            passed: exists,
            observed: json!(exists),
        }
    }
}

/// `IsComplete "name"`: every record carries a non-empty value.
///
/// The observed value is the completeness ratio; an empty batch is complete.
#[derive(Debug, Clone)]
pub struct LiuIsCompleteRule {
    column: String,
}

impl LiuIsCompleteRule {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl LiuRulePredicate for LiuIsCompleteRule {
    fn rule_type(&self) -> &'static str {
        "IsComplete"
    }

    fn evaluate(&self, batch: &LiuBatch) -> LiuPredicateOutcome {
        if !batch.columns().iter().any(|c| c == &self.column) {
            return LiuPredicateOutcome {
                passed: false,
                observed: Value::Null,
            };
        }
        if batch.is_empty() {
            return LiuPredicateOutcome {
                passed: true,
                observed: json!(1.0),
            };
        }
        let complete = batch
            .records()
            .iter()
            .filter(|r| {
                r.field_value(&self.column)
                    .map(|v| !v.trim().is_empty())
                    .unwrap_or(false)
            })
            .count();
        LiuPredicateOutcome {
            passed: complete == batch.len(),
            observed: json!(complete as f64 / batch.len() as f64),
        }
    }
}

/// `ColumnValues "name" in ["a", "b"]`: every value belongs to the set.
///
/// The observed value is the number of records outside the set.
#[derive(Debug, Clone)]
pub struct LiuColumnValuesRule {
    column: String,
    allowed: Vec<String>,
}

impl LiuColumnValuesRule {
    pub fn new(column: impl Into<String>, allowed: Vec<String>) -> Self {
        Self {
            column: column.into(),
            allowed,
        }
    }
}

impl LiuRulePredicate for LiuColumnValuesRule {
    fn rule_type(&self) -> &'static str {
        "ColumnValues"
    }

    fn evaluate(&self, batch: &LiuBatch) -> LiuPredicateOutcome {
        if !batch.columns().iter().any(|c| c == &self.column) {
            return LiuPredicateOutcome {
                passed: false,
                observed: Value::Null,
            };
        }
        let violations = batch
            .records()
            .iter()
            .filter(|r| match r.field_value(&self.column) {
                Some(value) => !self.allowed.iter().any(|a| a == &value),
                None => true,
            })
            .count();
        LiuPredicateOutcome {
            passed: violations == 0,
            observed: json!(violations),
        }
    }
}
