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

use std::collections::HashMap;

use crate::errors::{LiuError, Result};
use crate::quality::rule::{
    LiuColumnCountRule, LiuColumnExistsRule, LiuColumnValuesRule, LiuComparison,
    LiuIsCompleteRule, LiuRowCountRule, LiuRulePredicate,
};
use crate::quality::ruleset::LiuRuleExpr;

/// Constructor turning a parsed rule expression into a predicate.
pub type LiuRuleFactory = fn(&LiuRuleExpr) -> Result<Box<dyn LiuRulePredicate + Send + Sync>>;

/// Named rule constructors known to the ruleset parser.
#[derive(Clone)]
pub struct LiuRuleRegistry {
    factories: HashMap<String, LiuRuleFactory>,
}

impl LiuRuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        LiuRuleRegistry {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry pre-loaded with the bundled rule types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Registers a factory for the given rule type, replacing any previous one.
    pub fn register(&mut self, rule_type: impl Into<String>, factory: LiuRuleFactory) {
        self.factories.insert(rule_type.into(), factory);
    }

    pub fn contains(&self, rule_type: &str) -> bool {
        self.factories.contains_key(rule_type)
    }

    /// Registered rule type names, sorted.
    pub fn rule_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiates the predicate for an expression.
    pub fn build(&self, expr: &LiuRuleExpr) -> Result<Box<dyn LiuRulePredicate + Send + Sync>> {
        let factory = self.factories.get(&expr.rule_type).ok_or_else(|| {
            LiuError::rule_definition(format!(
                "unknown rule type '{}' (known: {})",
                expr.rule_type,
                self.rule_types().join(", ")
            ))
        })?;
        factory(expr)
    }

    fn register_defaults(&mut self) {
        self.register("ColumnCount", column_count_factory as LiuRuleFactory);
        self.register("RowCount", row_count_factory as LiuRuleFactory);
        self.register("ColumnExists", column_exists_factory as LiuRuleFactory);
        self.register("IsComplete", is_complete_factory as LiuRuleFactory);
        self.register("ColumnValues", column_values_factory as LiuRuleFactory);
    }
}

impl Default for LiuRuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for LiuRuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiuRuleRegistry")
            .field("rule_types", &self.rule_types())
            .finish()
    }
}

fn require_comparison(expr: &LiuRuleExpr) -> Result<LiuComparison> {
    expr.comparison.clone().ok_or_else(|| {
        LiuError::rule_definition(format!("{} requires a comparison such as '> 0'", expr.rule_type))
    })
}

fn require_column(expr: &LiuRuleExpr) -> Result<String> {
    expr.column.clone().ok_or_else(|| {
        LiuError::rule_definition(format!("{} requires a quoted column name", expr.rule_type))
    })
}

fn reject_column(expr: &LiuRuleExpr) -> Result<()> {
    match &expr.column {
        Some(column) => Err(LiuError::rule_definition(format!(
            "{} does not take a column, got \"{column}\"",
            expr.rule_type
        ))),
        None => Ok(()),
    }
}

fn reject_comparison(expr: &LiuRuleExpr) -> Result<()> {
    match &expr.comparison {
        Some(comparison) => Err(LiuError::rule_definition(format!(
            "{} does not take a comparison, got '{comparison}'",
            expr.rule_type
        ))),
        None => Ok(()),
    }
}

fn reject_values(expr: &LiuRuleExpr) -> Result<()> {
    if expr.values.is_empty() {
        Ok(())
    } else {
        Err(LiuError::rule_definition(format!(
            "{} does not take a value list",
            expr.rule_type
        )))
    }
}

fn column_count_factory(expr: &LiuRuleExpr) -> Result<Box<dyn LiuRulePredicate + Send + Sync>> {
    reject_column(expr)?;
    reject_values(expr)?;
    Ok(Box::new(LiuColumnCountRule::new(require_comparison(expr)?)))
}

fn row_count_factory(expr: &LiuRuleExpr) -> Result<Box<dyn LiuRulePredicate + Send + Sync>> {
    reject_column(expr)?;
    reject_values(expr)?;
    Ok(Box::new(LiuRowCountRule::new(require_comparison(expr)?)))
}

fn column_exists_factory(expr: &LiuRuleExpr) -> Result<Box<dyn LiuRulePredicate + Send + Sync>> {
    reject_comparison(expr)?;
    reject_values(expr)?;
    Ok(Box::new(LiuColumnExistsRule::new(require_column(expr)?)))
}

fn is_complete_factory(expr: &LiuRuleExpr) -> Result<Box<dyn LiuRulePredicate + Send + Sync>> {
    reject_comparison(expr)?;
    reject_values(expr)?;
    Ok(Box::new(LiuIsCompleteRule::new(require_column(expr)?)))
}

fn column_values_factory(expr: &LiuRuleExpr) -> Result<Box<dyn LiuRulePredicate + Send + Sync>> {
    reject_comparison(expr)?;
    let column = require_column(expr)?;
    if expr.values.is_empty() {
        return Err(LiuError::rule_definition(
            "ColumnValues requires a non-empty 'in [...]' list",
        ));
    }
    Ok(Box::new(LiuColumnValuesRule::new(column, expr.values.clone())))
}
