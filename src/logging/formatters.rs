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

use chrono::SecondsFormat;
use serde_json::Value;

use crate::logging::core::LiuLogLine;

pub struct LiuJsonFormatter;

impl LiuJsonFormatter {
    pub fn format(line: &LiuLogLine) -> String {
        line.to_json().to_string()
    }
}

/// `2026-01-26T10:00:00.000Z INFO  liu::pipeline message key=value`
pub struct LiuTextFormatter;

impl LiuTextFormatter {
    pub fn format(line: &LiuLogLine) -> String {
        let mut out = format!(
            "{} {:<5} {} {}",
            line.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            line.level.as_str(),
            line.target,
            line.message
        );
        for (key, value) in &line.context {
            match value {
                Value::String(s) => out.push_str(&format!(" {key}={s}")),
                other => out.push_str(&format!(" {key}={other}")),
            }
        }
        out
    }
}
