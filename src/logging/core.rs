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

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{Level, Log, Metadata, Record};
use serde_json::{json, Map, Value};

use crate::errors::{LiuError, Result};
use crate::logging::config::LiuLogConfig;
use crate::logging::context::LiuLogContext;
use crate::logging::handlers::{LiuConsoleHandler, LiuFileHandler, LiuLogHandler};

/// One formatted log event, context included.
#[derive(Clone, Debug)]
pub struct LiuLogLine {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub context: Map<String, Value>,
}

impl LiuLogLine {
    pub fn from_record(record: &Record<'_>) -> Self {
        LiuLogLine {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            timestamp: Utc::now(),
            context: LiuLogContext::get().into_iter().collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut data = Map::new();
        data.insert(
            "timestamp".into(),
            json!(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        data.insert("level".into(), json!(self.level.as_str()));
        data.insert("target".into(), json!(self.target));
        data.insert("message".into(), json!(self.message));
        if !self.context.is_empty() {
            data.insert("context".into(), Value::Object(self.context.clone()));
        }
        Value::Object(data)
    }
}

/// `log` backend writing to the console and an optional rotating file.
pub struct LiuLogger {
    config: LiuLogConfig,
    handlers: Vec<Box<dyn LiuLogHandler + Send + Sync>>,
}

static LOGGER: OnceLock<LiuLogger> = OnceLock::new();

impl LiuLogger {
    pub fn new(config: LiuLogConfig) -> Self {
        let mut handlers: Vec<Box<dyn LiuLogHandler + Send + Sync>> = Vec::new();
        if config.console_enabled {
            handlers.push(Box::new(LiuConsoleHandler::new(config.json_format_console)));
        }
        if config.file_enabled {
            if let Some(path) = &config.file_path {
                handlers.push(Box::new(LiuFileHandler::new(
                    path.clone(),
                    config.json_format_file,
                    config.max_bytes,
                    config.backup_count,
                )));
            }
        }
        LiuLogger { config, handlers }
    }

    /// Installs the global logger. Safe to call multiple times; the first
    /// call wins.
    pub fn init(config: LiuLogConfig) -> Result<()> {
        if LOGGER.get().is_some() {
            return Ok(());
        }
        let max_level = config.max_level();
        let logger = LOGGER.get_or_init(|| LiuLogger::new(config));
        match log::set_logger(logger) {
            Ok(()) => {
                log::set_max_level(max_level);
                Ok(())
            }
            Err(err) => Err(LiuError::config(format!("logger already installed: {err}"))),
        }
    }

    pub fn config(&self) -> &LiuLogConfig {
        &self.config
    }
}

impl Log for LiuLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.config.level_for(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = LiuLogLine::from_record(record);
        for handler in &self.handlers {
            handler.handle(&line);
        }
    }

    fn flush(&self) {
        for handler in &self.handlers {
            handler.flush();
        }
    }
}
