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

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LiuError, Result};
use crate::metrics::LiuBatchObservations;
use crate::quality::ruleset::LiuRuleset;
use crate::quality::sink::{LiuLogSink, LiuPublishingStrategy, LiuQualitySink};
use crate::record::LiuBatch;

/// Evaluation context used when none is configured.
pub const DEFAULT_EVALUATION_CONTEXT: &str = "EvaluateDataQuality_nodeB";

/// Verdict of one rule against one batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuRuleOutcome {
    pub rule_name: String,
    pub passed: bool,
    pub observed_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate verdict of a ruleset against one batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuBatchQualityResult {
    pub evaluation_context: String,
    pub transformation_id: String,
    pub outcomes: Vec<LiuRuleOutcome>,
    pub overall_passed: bool,
    pub observations: LiuBatchObservations,
    pub evaluated_at: DateTime<Utc>,
}

impl LiuBatchQualityResult {
    /// Names of the rules that did not pass, in declaration order.
    pub fn failed_rules(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| o.rule_name.clone())
            .collect()
    }

    pub fn outcome(&self, rule_name: &str) -> Option<&LiuRuleOutcome> {
        self.outcomes.iter().find(|o| o.rule_name == rule_name)
    }
}

/// Applies every rule of `ruleset` to `batch`, in declaration order.
///
/// Evaluation is pure: the batch is not touched, nothing is published and no
/// error can occur. An empty ruleset passes.
pub fn evaluate(batch: &LiuBatch, ruleset: &LiuRuleset, context: &str) -> LiuBatchQualityResult {
    let outcomes: Vec<LiuRuleOutcome> = ruleset
        .rules()
        .iter()
        .map(|rule| {
            let verdict = rule.predicate().evaluate(batch);
            let message = if verdict.passed {
                None
            } else {
                Some(format!("observed {} does not satisfy '{}'", verdict.observed, rule.name()))
            };
            LiuRuleOutcome {
                rule_name: rule.name().to_string(),
                passed: verdict.passed,
                observed_value: verdict.observed,
                message,
            }
        })
        .collect();

    let overall_passed = outcomes.iter().all(|o| o.passed);

    LiuBatchQualityResult {
        evaluation_context: context.to_string(),
        transformation_id: batch.transformation_id().to_string(),
        outcomes,
        overall_passed,
        observations: LiuBatchObservations::compute(batch),
        evaluated_at: Utc::now(),
    }
}

/// Evaluates batches and hands the results to an observability sink.
#[derive(Clone)]
pub struct LiuQualityEngine {
    sink: Arc<dyn LiuQualitySink>,
    strategy: LiuPublishingStrategy,
}

impl LiuQualityEngine {
    pub fn new(sink: Arc<dyn LiuQualitySink>, strategy: LiuPublishingStrategy) -> Self {
        Self { sink, strategy }
    }

    pub fn strategy(&self) -> LiuPublishingStrategy {
        self.strategy
    }

    /// Evaluates and publishes.
    ///
    /// Only a publish failure under [`LiuPublishingStrategy::Strict`] turns
    /// into an error.
    pub fn evaluate(
        &self,
        batch: &LiuBatch,
        ruleset: &LiuRuleset,
        context: &str,
    ) -> Result<LiuBatchQualityResult> {
        let result = evaluate(batch, ruleset, context);
        self.publish(&result)?;
        Ok(result)
    }

    pub fn publish(&self, result: &LiuBatchQualityResult) -> Result<()> {
        match self.sink.publish(result) {
            Ok(()) => Ok(()),
            Err(err) => match self.strategy {
                LiuPublishingStrategy::BestEffort => {
                    log::warn!(
                        "publishing quality result to '{}' sink failed: {err}",
                        self.sink.name()
                    );
                    Ok(())
                }
                LiuPublishingStrategy::Strict => Err(match err {
                    LiuError::Publish { .. } => err,
                    other => LiuError::publish(other.to_string()),
                }),
            },
        }
    }
}

impl Default for LiuQualityEngine {
    fn default() -> Self {
        Self::new(Arc::new(LiuLogSink), LiuPublishingStrategy::BestEffort)
    }
}

impl std::fmt::Debug for LiuQualityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiuQualityEngine")
            .field("sink", &self.sink.name())
            .field("strategy", &self.strategy)
            .finish()
    }
}
