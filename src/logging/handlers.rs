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

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::logging::core::LiuLogLine;
use crate::logging::formatters::{LiuJsonFormatter, LiuTextFormatter};

pub trait LiuLogHandler {
    fn handle(&self, line: &LiuLogLine);

    fn flush(&self) {}
}

/// Writes to stderr so command output on stdout stays clean.
pub struct LiuConsoleHandler {
    json: bool,
}

impl LiuConsoleHandler {
    pub fn new(json: bool) -> Self {
        LiuConsoleHandler { json }
    }
}

impl LiuLogHandler for LiuConsoleHandler {
    fn handle(&self, line: &LiuLogLine) {
        let text = if self.json {
            LiuJsonFormatter::format(line)
        } else {
            LiuTextFormatter::format(line)
        };
        let _ = writeln!(std::io::stderr().lock(), "{text}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Appends to a file, rotating `path -> path.1 -> path.2 ...` by size.
pub struct LiuFileHandler {
    path: PathBuf,
    json: bool,
    max_bytes: Option<u64>,
    backup_count: Option<u32>,
    guard: Mutex<()>,
}

impl LiuFileHandler {
    pub fn new(
        path: impl Into<PathBuf>,
        json: bool,
        max_bytes: Option<u64>,
        backup_count: Option<u32>,
    ) -> Self {
        LiuFileHandler {
            path: path.into(),
            json,
            max_bytes,
            backup_count,
            guard: Mutex::new(()),
        }
    }

    fn backup_path(&self, idx: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{idx}"));
        PathBuf::from(name)
    }

    fn rotate_if_needed(&self) {
        let max_bytes = match self.max_bytes {
            Some(v) => v,
            None => return,
        };
        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() > max_bytes => {}
            _ => return,
        }

        let backup_count = self.backup_count.unwrap_or(7);
        if backup_count == 0 {
            let _ = fs::remove_file(&self.path);
            return;
        }
        for idx in (1..=backup_count).rev() {
            let from = if idx == 1 {
                self.path.clone()
            } else {
                self.backup_path(idx - 1)
            };
            if from.exists() {
                let _ = fs::rename(&from, self.backup_path(idx));
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LiuLogHandler for LiuFileHandler {
    fn handle(&self, line: &LiuLogLine) {
        let _guard = match self.guard.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.rotate_if_needed();

        let text = if self.json {
            LiuJsonFormatter::format(line)
        } else {
            LiuTextFormatter::format(line)
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = fs::create_dir_all(parent);
            }
        }
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{text}");
        }
    }
}
