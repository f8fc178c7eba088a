//! Copyright © 2025 Wenze Wei. All Rights Reserved.
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

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration of the Liu logger: level, console output, optional file
/// output with size based rotation, and per-target level overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiuLogConfig {
    pub default_level: String,
    pub console_enabled: bool,
    pub json_format_console: bool,
    /// Whether file logging is enabled.
    pub file_enabled: bool,
    /// Log file path when file logging is enabled.
    pub file_path: Option<String>,
    pub json_format_file: bool,
    /// Rotate once the file grows past this many bytes.
    pub max_bytes: Option<u64>,
    /// Number of rotated files to keep.
    pub backup_count: Option<u32>,
    /// Level overrides keyed by log target prefix, e.g. `liu::quality`.
    pub target_levels: HashMap<String, String>,
}

impl Default for LiuLogConfig {
    fn default() -> Self {
        LiuLogConfig {
            default_level: "INFO".to_string(),
            console_enabled: true,
            json_format_console: false,
            file_enabled: false,
            file_path: None,
            json_format_file: true,
            max_bytes: Some(10 * 1024 * 1024),
            backup_count: Some(7),
            target_levels: HashMap::new(),
        }
    }
}

impl LiuLogConfig {
    pub fn level_filter(&self) -> LevelFilter {
        parse_level(&self.default_level)
    }

    /// Most verbose level any target may log at.
    pub fn max_level(&self) -> LevelFilter {
        self.target_levels
            .values()
            .map(|l| parse_level(l))
            .fold(self.level_filter(), Ord::max)
    }

    /// Effective level of a target; the longest matching prefix wins.
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.target_levels
            .iter()
            .filter(|(prefix, _)| target.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, level)| parse_level(level))
            .unwrap_or_else(|| self.level_filter())
    }
}

fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_uppercase().as_str() {
        "OFF" => LevelFilter::Off,
        "ERROR" => LevelFilter::Error,
        "WARN" | "WARNING" => LevelFilter::Warn,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiuLogConfigBuilder {
    pub default_level: Option<String>,
    pub console_enabled: Option<bool>,
    pub json_format_console: Option<bool>,
    pub file_enabled: Option<bool>,
    pub file_path: Option<String>,
    pub json_format_file: Option<bool>,
    pub max_bytes: Option<u64>,
    pub backup_count: Option<u32>,
    pub target_levels: Option<HashMap<String, String>>,
}

impl LiuLogConfigBuilder {
    pub fn build(self) -> LiuLogConfig {
        let base = LiuLogConfig::default();
        LiuLogConfig {
            default_level: self.default_level.unwrap_or(base.default_level),
            console_enabled: self.console_enabled.unwrap_or(base.console_enabled),
            json_format_console: self.json_format_console.unwrap_or(base.json_format_console),
            // a configured path turns file logging on unless disabled explicitly
            file_enabled: self.file_enabled.unwrap_or(self.file_path.is_some()),
            file_path: self.file_path.or(base.file_path),
            json_format_file: self.json_format_file.unwrap_or(base.json_format_file),
            max_bytes: self.max_bytes.or(base.max_bytes),
            backup_count: self.backup_count.or(base.backup_count),
            target_levels: self.target_levels.unwrap_or(base.target_levels),
        }
    }

    /// Builds from a JSON object, ignoring fields it cannot read.
    pub fn from_json(value: &Value) -> LiuLogConfig {
        let builder: LiuLogConfigBuilder =
            serde_json::from_value(value.clone()).unwrap_or_default();
        builder.build()
    }
}
