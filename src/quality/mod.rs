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

//! # Liu Quality Module
//!
//! Declarative data quality rules evaluated against a batch.
//!
//! ## Module Components
//!
//! - **rule**: Predicate trait and the bundled structural rules
//! - **registry**: Named constructors turning rule expressions into predicates
//! - **ruleset**: Ruleset text parser and ordered rule collection
//! - **engine**: Pure evaluation and the publishing quality engine
//! - **sink**: Observability sinks and the publishing strategy

pub mod engine;
pub mod registry;
pub mod rule;
pub mod ruleset;
pub mod sink;

pub use engine::{
    evaluate, LiuBatchQualityResult, LiuQualityEngine, LiuRuleOutcome, DEFAULT_EVALUATION_CONTEXT,
};
pub use registry::{LiuRuleFactory, LiuRuleRegistry};
pub use rule::{
    LiuColumnCountRule, LiuColumnExistsRule, LiuColumnValuesRule, LiuComparison,
    LiuIsCompleteRule, LiuPredicateOutcome, LiuRowCountRule, LiuRulePredicate,
};
pub use ruleset::{LiuRule, LiuRuleExpr, LiuRuleset, DEFAULT_RULESET};
pub use sink::{
    LiuJsonlSink, LiuLogSink, LiuMemorySink, LiuNullSink, LiuPublishingStrategy, LiuQualitySink,
    LiuSinkConfig,
};
