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

//! # Liu Log Generator
//!
//! Synthetic web log datasets for local runs and tests. Every generated row
//! satisfies the record model, so a generated file always reads back cleanly.
//!
//! Value distributions:
//!
//! - `event_time`: uniform over the seconds of the log date
//! - `user_id`: `user_001` to `user_500`
//! - `status_code`: drawn from `[200, 200, 200, 201, 400, 404, 500]`, so 200 is
//!   three times as likely as any other code
//! - `response_ms`: uniform in `[50, 2000]`

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::errors::{LiuError, Result};
use crate::record::{LiuLogRecord, EVENT_TIME_FORMAT, LOG_COLUMNS};

pub const ENDPOINTS: [&str; 7] = ["/", "/home", "/products", "/product/123", "/cart", "/login", "/search"];
pub const STATUS_CODES: [i32; 7] = [200, 200, 200, 201, 400, 404, 500];
pub const USER_AGENTS: [&str; 3] = ["desktop", "mobile", "tablet"];
pub const MAX_USER_ID: u32 = 500;
pub const RESPONSE_MS_RANGE: (u32, u32) = (50, 2000);

/// Defaults of the multi-day helper.
pub const DEFAULT_DAYS: u32 = 10;
pub const DEFAULT_ROWS_PER_DAY: usize = 2000;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Random source of synthetic log records.
#[derive(Debug, Clone)]
pub struct LiuLogGenerator {
    rng: SmallRng,
}

impl LiuLogGenerator {
    /// Seeded generators are reproducible; unseeded ones draw from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn next_record(&mut self, log_date: NaiveDate) -> Result<LiuLogRecord> {
        let offset = self.rng.gen_range(0..SECONDS_PER_DAY);
        let event_time = log_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| LiuError::internal("midnight is always valid"))?
            + Duration::seconds(offset);

        let user_id = format!("user_{:03}", self.rng.gen_range(1..=MAX_USER_ID));
        let endpoint = ENDPOINTS[self.rng.gen_range(0..ENDPOINTS.len())];
        let status_code = STATUS_CODES[self.rng.gen_range(0..STATUS_CODES.len())];
        let response_ms = self.rng.gen_range(RESPONSE_MS_RANGE.0..=RESPONSE_MS_RANGE.1);
        let user_agent = USER_AGENTS[self.rng.gen_range(0..USER_AGENTS.len())];

        LiuLogRecord::new(event_time, user_id, endpoint, status_code, response_ms, user_agent)
    }

    pub fn records(&mut self, num_rows: usize, log_date: NaiveDate) -> Result<Vec<LiuLogRecord>> {
        (0..num_rows).map(|_| self.next_record(log_date)).collect()
    }
}

/// Writes `num_rows` synthetic records for `log_date` as CSV at `output_path`.
///
/// Parent directories are created. Returns the absolute path of the file.
pub fn generate_logs(
    num_rows: usize,
    output_path: &Path,
    log_date: NaiveDate,
    seed: Option<u64>,
) -> Result<PathBuf> {
    if num_rows == 0 {
        return Err(LiuError::config("num_rows must be positive"));
    }
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut generator = LiuLogGenerator::new(seed);
    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record(LOG_COLUMNS)?;
    for _ in 0..num_rows {
        let record = generator.next_record(log_date)?;
        writer.write_record([
            record.event_time().format(EVENT_TIME_FORMAT).to_string(),
            record.user_id().to_string(),
            record.endpoint().to_string(),
            record.status_code().to_string(),
            record.response_ms().to_string(),
            record.user_agent().to_string(),
        ])?;
    }
    writer.flush()?;

    let absolute = fs::canonicalize(output_path)?;
    log::info!("generated {} log rows at {}", num_rows, absolute.display());
    Ok(absolute)
}

/// File name of the daily log file, e.g. `logs_20260126.csv`.
pub fn daily_file_name(log_date: NaiveDate) -> String {
    format!("logs_{}.csv", log_date.format("%Y%m%d"))
}

/// Generates `days` daily files ending at `end_date` and going back in time.
///
/// With a seed, day `n` uses `seed + n` so each file differs but the whole
/// set is reproducible.
pub fn generate_daily_logs(
    dir: &Path,
    days: u32,
    rows_per_day: usize,
    end_date: NaiveDate,
    seed: Option<u64>,
) -> Result<Vec<PathBuf>> {
    if days == 0 {
        return Err(LiuError::config("days must be positive"));
    }
    (0..days)
        .map(|offset| {
            let log_date = end_date - Duration::days(i64::from(offset));
            let day_seed = seed.map(|s| s.wrapping_add(u64::from(offset)));
            generate_logs(rows_per_day, &dir.join(daily_file_name(log_date)), log_date, day_seed)
        })
        .collect()
}
