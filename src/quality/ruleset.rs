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

//! Ruleset text format.
//!
//! ```text
//! Rules = [
//!     ColumnCount > 0,
//!     RowCount between 1 and 5000000,
//!     IsComplete "user_id",
//!     ColumnValues "user_agent" in ["desktop", "mobile", "tablet"]
//! ]
//! ```
//!
//! The `Rules = [ ... ]` wrapper is optional. Lines starting with `#` or `//`
//! are comments. A rule is named after its canonical text.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{LiuError, Result};
use crate::quality::registry::LiuRuleRegistry;
use crate::quality::rule::{LiuComparison, LiuRulePredicate};

/// Ruleset applied when a job does not declare one.
pub const DEFAULT_RULESET: &str = "Rules = [\n    ColumnCount > 0\n]";

/// Parsed form of one rule, before it is bound to a predicate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuRuleExpr {
    pub rule_type: String,
    pub column: Option<String>,
    pub comparison: Option<LiuComparison>,
    pub values: Vec<String>,
}

impl LiuRuleExpr {
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            column: None,
            comparison: None,
            values: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_comparison(mut self, comparison: LiuComparison) -> Self {
        self.comparison = Some(comparison);
        self
    }

    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }
}

impl fmt::Display for LiuRuleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule_type)?;
        if let Some(column) = &self.column {
            write!(f, " \"{column}\"")?;
        }
        if let Some(comparison) = &self.comparison {
            write!(f, " {comparison}")?;
        }
        if !self.values.is_empty() {
            let quoted: Vec<String> = self.values.iter().map(|v| format!("\"{v}\"")).collect();
            write!(f, " in [{}]", quoted.join(", "))?;
        }
        Ok(())
    }
}

/// A named predicate.
#[derive(Debug)]
pub struct LiuRule {
    name: String,
    predicate: Box<dyn LiuRulePredicate + Send + Sync>,
}

impl LiuRule {
    pub fn new(
        name: impl Into<String>,
        predicate: Box<dyn LiuRulePredicate + Send + Sync>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LiuError::rule_definition("rule name must not be empty"));
        }
        Ok(Self { name, predicate })
    }

    /// Builds a rule from an expression through the registry, named after the
    /// expression text.
    pub fn from_expr(expr: &LiuRuleExpr, registry: &LiuRuleRegistry) -> Result<Self> {
        let predicate = registry.build(expr)?;
        Self::new(expr.to_string(), predicate)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicate(&self) -> &(dyn LiuRulePredicate + Send + Sync) {
        self.predicate.as_ref()
    }
}

/// Ordered collection of rules evaluated against a batch.
#[derive(Debug, Default)]
pub struct LiuRuleset {
    rules: Vec<LiuRule>,
}

impl LiuRuleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single structural smoke test `ColumnCount > 0`.
    pub fn default_ruleset() -> Result<Self> {
        Self::parse(DEFAULT_RULESET, &LiuRuleRegistry::with_defaults())
    }

    /// Parses ruleset text, binding each rule through `registry`.
    pub fn parse(text: &str, registry: &LiuRuleRegistry) -> Result<Self> {
        let cleaned: String = text
            .lines()
            .filter(|line| {
                let trimmed = line.trim_start();
                !(trimmed.starts_with('#') || trimmed.starts_with("//"))
            })
            .collect::<Vec<_>>()
            .join("\n");

        let tokens = tokenize(&cleaned)?;
        let body = strip_wrapper(&tokens)?;

        let mut ruleset = LiuRuleset::new();
        if body.is_empty() {
            return Ok(ruleset);
        }
        let groups = split_top_level(body)?;
        let last = groups.len() - 1;
        for (idx, group) in groups.into_iter().enumerate() {
            if group.is_empty() {
                // trailing comma
                if idx == last && idx > 0 {
                    continue;
                }
                return Err(LiuError::rule_definition(format!("rule {} is empty", idx + 1)));
            }
            let expr = parse_expr(group)?;
            ruleset.push(LiuRule::from_expr(&expr, registry)?);
        }
        Ok(ruleset)
    }

    /// Appends a rule; duplicate names are allowed but logged.
    pub fn push(&mut self, rule: LiuRule) {
        if self.rules.iter().any(|r| r.name == rule.name) {
            log::warn!("ruleset already contains a rule named '{}'", rule.name);
        }
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: LiuRule) -> Self {
        self.push(rule);
        self
    }

    pub fn rules(&self) -> &[LiuRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Names that occur more than once, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for name in self.names() {
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Quoted(String),
    Number(String),
    Op(String),
    LBracket,
    RBracket,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) | Token::Number(s) | Token::Op(s) => write!(f, "{s}"),
            Token::Quoted(s) => write!(f, "\"{s}\""),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn token_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(pattern) = PATTERN.get() {
        return Ok(pattern);
    }
    let compiled = Regex::new(
        r#"^(?:"(?P<quoted>(?:[^"\\]|\\.)*)"|(?P<number>-?\d+(?:\.\d+)?)|(?P<op>>=|<=|!=|==|=|>|<)|(?P<punct>[\[\],])|(?P<ident>[A-Za-z_][A-Za-z0-9_]*))"#,
    )
    .map_err(|err| LiuError::internal(format!("ruleset token pattern: {err}")))?;
    Ok(PATTERN.get_or_init(|| compiled))
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let pattern = token_pattern()?;
    let mut tokens = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let caps = pattern.captures(rest).ok_or_else(|| {
            let snippet: String = rest.chars().take(20).collect();
            LiuError::rule_definition(format!("unexpected input near '{snippet}'"))
        })?;
        let consumed = caps.get(0).map(|m| m.end()).unwrap_or(0);

        let token = if let Some(m) = caps.name("quoted") {
            Token::Quoted(m.as_str().replace("\\\"", "\"").replace("\\\\", "\\"))
        } else if let Some(m) = caps.name("number") {
            Token::Number(m.as_str().to_string())
        } else if let Some(m) = caps.name("op") {
            Token::Op(m.as_str().to_string())
        } else if let Some(m) = caps.name("punct") {
            match m.as_str() {
                "[" => Token::LBracket,
                "]" => Token::RBracket,
                _ => Token::Comma,
            }
        } else if let Some(m) = caps.name("ident") {
            Token::Ident(m.as_str().to_string())
        } else {
            return Err(LiuError::internal("ruleset token matched no group"));
        };

        tokens.push(token);
        rest = rest[consumed..].trim_start();
    }

    Ok(tokens)
}

fn strip_wrapper(tokens: &[Token]) -> Result<&[Token]> {
    match tokens.first() {
        Some(Token::Ident(word)) if word == "Rules" => {
            if tokens.get(1) != Some(&Token::Op("=".into())) {
                return Err(LiuError::rule_definition("expected '=' after 'Rules'"));
            }
            if tokens.get(2) != Some(&Token::LBracket) {
                return Err(LiuError::rule_definition("expected '[' after 'Rules ='"));
            }
            if tokens.last() != Some(&Token::RBracket) || tokens.len() < 4 {
                return Err(LiuError::rule_definition("ruleset is missing its closing ']'"));
            }
            Ok(&tokens[3..tokens.len() - 1])
        }
        _ => Ok(tokens),
    }
}

fn split_top_level(body: &[Token]) -> Result<Vec<&[Token]>> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (idx, token) in body.iter().enumerate() {
        match token {
            Token::LBracket => depth += 1,
            Token::RBracket => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| LiuError::rule_definition("unbalanced ']' in ruleset"))?;
            }
            Token::Comma if depth == 0 => {
                groups.push(&body[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(LiuError::rule_definition("unbalanced '[' in ruleset"));
    }
    groups.push(&body[start..]);
    Ok(groups)
}

fn parse_number(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|err| LiuError::rule_definition(format!("invalid number '{raw}' ({err})")))
}

fn expect_number(tokens: &[Token], idx: usize, context: &str) -> Result<f64> {
    match tokens.get(idx) {
        Some(Token::Number(raw)) => parse_number(raw),
        Some(other) => Err(LiuError::rule_definition(format!(
            "{context}: expected a number, found '{other}'"
        ))),
        None => Err(LiuError::rule_definition(format!("{context}: expected a number"))),
    }
}

fn parse_expr(tokens: &[Token]) -> Result<LiuRuleExpr> {
    let rule_type = match tokens.first() {
        Some(Token::Ident(name)) => name.clone(),
        Some(other) => {
            return Err(LiuError::rule_definition(format!(
                "rule must start with a rule type, found '{other}'"
            )))
        }
        None => return Err(LiuError::rule_definition("empty rule")),
    };
    let mut expr = LiuRuleExpr::new(rule_type.clone());
    let mut idx = 1;

    if let Some(Token::Quoted(column)) = tokens.get(idx) {
        expr.column = Some(column.clone());
        idx += 1;
    }

    match tokens.get(idx) {
        None => {}
        Some(Token::Op(op)) => {
            let value = expect_number(tokens, idx + 1, &rule_type)?;
            expr.comparison = Some(LiuComparison::from_operator(op, value)?);
            idx += 2;
        }
        Some(Token::Ident(word)) if word == "between" => {
            let low = expect_number(tokens, idx + 1, &rule_type)?;
            if tokens.get(idx + 2) != Some(&Token::Ident("and".into())) {
                return Err(LiuError::rule_definition(format!(
                    "{rule_type}: expected 'and' in between clause"
                )));
            }
            let high = expect_number(tokens, idx + 3, &rule_type)?;
            expr.comparison = Some(LiuComparison::between(low, high)?);
            idx += 4;
        }
        Some(Token::Ident(word)) if word == "in" => {
            if tokens.get(idx + 1) != Some(&Token::LBracket) {
                return Err(LiuError::rule_definition(format!(
                    "{rule_type}: expected '[' after 'in'"
                )));
            }
            idx += 2;
            let mut values = Vec::new();
            loop {
                match tokens.get(idx) {
                    Some(Token::Quoted(v)) | Some(Token::Number(v)) => values.push(v.clone()),
                    Some(Token::RBracket) if values.is_empty() => {
                        idx += 1;
                        break;
                    }
                    Some(other) => {
                        return Err(LiuError::rule_definition(format!(
                            "{rule_type}: unexpected '{other}' in value list"
                        )))
                    }
                    None => {
                        return Err(LiuError::rule_definition(format!(
                            "{rule_type}: unterminated value list"
                        )))
                    }
                }
                idx += 1;
                match tokens.get(idx) {
                    Some(Token::Comma) => idx += 1,
                    Some(Token::RBracket) => {
                        idx += 1;
                        break;
                    }
                    _ => {
                        return Err(LiuError::rule_definition(format!(
                            "{rule_type}: expected ',' or ']' in value list"
                        )))
                    }
                }
            }
            expr.values = values;
        }
        Some(other) => {
            return Err(LiuError::rule_definition(format!(
                "{rule_type}: unexpected '{other}'"
            )))
        }
    }

    if let Some(extra) = tokens.get(idx) {
        return Err(LiuError::rule_definition(format!(
            "{rule_type}: unexpected trailing '{extra}'"
        )));
    }
    Ok(expr)
}
