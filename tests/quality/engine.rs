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

//! # Liu Quality Tests - Engine
//!
//! Ruleset parsing, the rule registry, evaluation semantics and publishing
//! strategies of the quality engine.
//!
//! ## Test Categories
//!
//! - **Parser Tests**: Ruleset text to named rules
//! - **Evaluation Tests**: AND semantics and determinism
//! - **Publishing Tests**: Best-effort and strict sinks
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test quality
//! ```

use std::sync::Arc;

use liu::errors::{LiuError, Result};
use liu::quality::{
    evaluate, LiuBatchQualityResult, LiuJsonlSink, LiuMemorySink, LiuPredicateOutcome,
    LiuPublishingStrategy, LiuQualityEngine, LiuQualitySink, LiuRuleExpr, LiuRulePredicate,
    LiuRuleRegistry, LiuRuleset, DEFAULT_RULESET,
};
use liu::record::{parse_record, LiuBatch, LiuTransformationId, LOG_COLUMNS};
use proptest::prelude::*;
use serde_json::json;

fn batch(rows: &[[&str; 6]]) -> LiuBatch {
    let header: Vec<String> = LOG_COLUMNS.iter().map(|c| c.to_string()).collect();
    let records = rows
        .iter()
        .map(|row| parse_record(row, &header).unwrap())
        .collect();
    LiuBatch::new(header, records, LiuTransformationId::new("jr_test", "source"))
}

fn sample_batch() -> LiuBatch {
    batch(&[
        ["2026-01-26T00:00:01", "user_001", "/", "200", "100", "mobile"],
        ["2026-01-26T00:00:02", "user_002", "/cart", "404", "250", "desktop"],
        ["2026-01-26T00:00:03", "user_003", "", "500", "900", "tablet"],
    ])
}

fn parse(text: &str) -> LiuRuleset {
    LiuRuleset::parse(text, &LiuRuleRegistry::with_defaults()).unwrap()
}

#[derive(Debug)]
struct FailingSink;

impl LiuQualitySink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn publish(&self, _result: &LiuBatchQualityResult) -> Result<()> {
        Err(LiuError::publish("sink offline"))
    }
}

/// Tests that the default ruleset is the single column count smoke test.
#[test]
fn test_default_ruleset() {
    let ruleset = parse(DEFAULT_RULESET);
    assert_eq!(ruleset.names(), vec!["ColumnCount > 0"]);
    assert_eq!(LiuRuleset::default_ruleset().unwrap().len(), 1);
}

/// Tests that the default ruleset only rejects a batch without columns.
#[test]
fn test_default_ruleset_rejects_zero_columns() {
    let ruleset = parse(DEFAULT_RULESET);

    let header_only = batch(&[]);
    assert!(evaluate(&header_only, &ruleset, "ctx").overall_passed);

    let no_columns = LiuBatch::new(Vec::new(), Vec::new(), LiuTransformationId::new("jr_test", "source"));
    let result = evaluate(&no_columns, &ruleset, "ctx");
    assert!(!result.overall_passed);
    assert_eq!(result.outcomes[0].observed_value, json!(0));
    assert_eq!(result.failed_rules(), vec!["ColumnCount > 0".to_string()]);
}

/// Tests parsing of every bundled rule type, with comments and a trailing comma.
#[test]
fn test_parse_all_rule_types() {
    let ruleset = parse(
        r#"Rules = [
            # structure
            ColumnCount = 6,
            RowCount between 1 and 10,
            ColumnExists "user_agent",
            // content
            IsComplete "user_id",
            ColumnValues "user_agent" in ["desktop", "mobile", "tablet"],
        ]"#,
    );
    assert_eq!(
        ruleset.names(),
        vec![
            "ColumnCount = 6",
            "RowCount between 1 and 10",
            "ColumnExists \"user_agent\"",
            "IsComplete \"user_id\"",
            "ColumnValues \"user_agent\" in [\"desktop\", \"mobile\", \"tablet\"]",
        ]
    );

    let result = evaluate(&sample_batch(), &ruleset, "ctx");
    assert!(result.overall_passed, "{:?}", result.failed_rules());
}

/// Tests that the `Rules = [...]` wrapper is optional and an empty body is allowed.
#[test]
fn test_parse_bare_and_empty_rulesets() {
    assert_eq!(parse("ColumnCount > 0, RowCount >= 0").len(), 2);
    assert!(parse("Rules = [ ]").is_empty());
    assert!(parse("").is_empty());
}

/// Tests that malformed ruleset text is a rule definition error.
#[test]
fn test_parse_rejects_malformed_rulesets() {
    let registry = LiuRuleRegistry::with_defaults();
    for text in [
        "Rules = [ ColumnCount > ]",
        "Rules = [ ColumnCount > 0",
        "Rules = [ RowCount between 5 and 1 ]",
        "Rules = [ Uniqueness \"user_id\" > 0.5 ]",
        "Rules = [ IsComplete ]",
        "Rules = [ ColumnCount > 0,, RowCount > 0 ]",
        "Rules = [ ColumnCount ~ 0 ]",
    ] {
        let err = LiuRuleset::parse(text, &registry).unwrap_err();
        assert!(matches!(err, LiuError::RuleDefinition { .. }), "{text}: {err}");
    }
}

/// Tests that duplicate rule names are kept and reported.
#[test]
fn test_duplicate_rule_names_are_reported() {
    let ruleset = parse("Rules = [ ColumnCount > 0, ColumnCount > 0 ]");
    assert_eq!(ruleset.len(), 2);
    assert_eq!(ruleset.duplicate_names(), vec!["ColumnCount > 0"]);
}

/// Tests that a batch passes only when every rule passes.
#[test]
fn test_overall_passed_requires_every_rule() {
    let ruleset = parse(
        r#"Rules = [ ColumnCount > 0, IsComplete "endpoint", RowCount > 100 ]"#,
    );
    let result = evaluate(&sample_batch(), &ruleset, "ctx");

    assert!(!result.overall_passed);
    assert_eq!(result.outcomes.len(), 3);
    assert!(result.outcome("ColumnCount > 0").unwrap().passed);
    assert_eq!(
        result.failed_rules(),
        vec!["IsComplete \"endpoint\"".to_string(), "RowCount > 100".to_string()]
    );
    let complete = result.outcome("IsComplete \"endpoint\"").unwrap();
    assert!((complete.observed_value.as_f64().unwrap() - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(result.outcome("RowCount > 100").unwrap().observed_value, json!(3));
    assert_eq!(result.transformation_id, "jr_test:source");
    assert_eq!(result.observations.row_count, 3);
}

/// Tests that a header-only batch still satisfies `ColumnCount > 0`.
#[test]
fn test_empty_batch_passes_column_count() {
    let result = evaluate(&batch(&[]), &parse(DEFAULT_RULESET), "ctx");
    assert!(result.overall_passed);
    assert_eq!(result.outcomes[0].observed_value, json!(6));
}

/// Tests that value-set violations are counted.
#[test]
fn test_column_values_counts_violations() {
    let ruleset = parse(r#"ColumnValues "user_agent" in ["desktop"]"#);
    let result = evaluate(&sample_batch(), &ruleset, "ctx");
    assert!(!result.overall_passed);
    assert_eq!(result.outcomes[0].observed_value, json!(2));
}

#[derive(Debug)]
struct EvenRows;

impl LiuRulePredicate for EvenRows {
    fn rule_type(&self) -> &'static str {
        "EvenRows"
    }

    fn evaluate(&self, batch: &LiuBatch) -> LiuPredicateOutcome {
        LiuPredicateOutcome {
            passed: batch.len() % 2 == 0,
            observed: json!(batch.len()),
        }
    }
}

fn even_rows_factory(_expr: &LiuRuleExpr) -> Result<Box<dyn LiuRulePredicate + Send + Sync>> {
    Ok(Box::new(EvenRows))
}

/// Tests that custom rule types can be registered and parsed.
#[test]
fn test_registry_accepts_custom_rules() {
    let mut registry = LiuRuleRegistry::with_defaults();
    registry.register("EvenRows", even_rows_factory);
    assert!(registry.contains("EvenRows"));

    let ruleset = LiuRuleset::parse("Rules = [ EvenRows ]", &registry).unwrap();
    let result = evaluate(&sample_batch(), &ruleset, "ctx");
    assert!(!result.overall_passed);
    assert_eq!(result.outcomes[0].rule_name, "EvenRows");
}

/// Tests that a failing sink is tolerated under best effort publishing.
#[test]
fn test_best_effort_tolerates_sink_failure() {
    let engine = LiuQualityEngine::new(Arc::new(FailingSink), LiuPublishingStrategy::BestEffort);
    let result = engine
        .evaluate(&sample_batch(), &parse(DEFAULT_RULESET), "ctx")
        .unwrap();
    assert!(result.overall_passed);
}

/// Tests that a failing sink fails evaluation under strict publishing.
#[test]
fn test_strict_surfaces_sink_failure() {
    let engine = LiuQualityEngine::new(Arc::new(FailingSink), LiuPublishingStrategy::Strict);
    let err = engine
        .evaluate(&sample_batch(), &parse(DEFAULT_RULESET), "ctx")
        .unwrap_err();
    assert!(matches!(err, LiuError::Publish { .. }));
}

/// Tests that published results reach the sink unchanged.
#[test]
fn test_memory_and_jsonl_sinks_receive_results() {
    let memory = Arc::new(LiuMemorySink::new());
    let engine = LiuQualityEngine::new(memory.clone(), LiuPublishingStrategy::Strict);
    let result = engine
        .evaluate(&sample_batch(), &parse(DEFAULT_RULESET), "EvaluateDataQuality_nodeB")
        .unwrap();
    assert_eq!(memory.results(), vec![result.clone()]);

    let dir = tempfile::tempdir().unwrap();
    let sink = LiuJsonlSink::new(dir.path().join("nested").join("quality.jsonl"));
    sink.publish(&result).unwrap();
    sink.publish(&result).unwrap();
    let content = std::fs::read_to_string(sink.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    let decoded: LiuBatchQualityResult = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(decoded.outcomes, result.outcomes);
    assert_eq!(decoded.transformation_id, result.transformation_id);
    assert_eq!(decoded.evaluation_context, "EvaluateDataQuality_nodeB");
}

proptest! {
    /// Evaluating the same batch twice yields the same verdicts.
    #[test]
    fn test_evaluation_is_deterministic(
        agents in proptest::collection::vec(prop_oneof!["desktop", "mobile", "tablet", "bot"], 0..20),
    ) {
        let rows: Vec<[&str; 6]> = agents
            .iter()
            .map(|agent| ["2026-01-26T00:00:00", "user_001", "/", "200", "10", agent.as_str()])
            .collect();
        let batch = batch(&rows);
        let ruleset = parse(r#"Rules = [ ColumnCount > 0, RowCount > 0, ColumnValues "user_agent" in ["desktop", "mobile", "tablet"] ]"#);

        let first = evaluate(&batch, &ruleset, "ctx");
        let second = evaluate(&batch, &ruleset, "ctx");
        prop_assert_eq!(&first.outcomes, &second.outcomes);
        prop_assert_eq!(first.overall_passed, first.outcomes.iter().all(|o| o.passed));
        prop_assert_eq!(first.overall_passed, !agents.is_empty() && agents.iter().all(|a| a != "bot"));
    }
}
