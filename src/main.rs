//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Liu.
//! The Liu project belongs to the Dunimd Team.
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

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use liu::config::LiuJobConfig;
use liu::export::LiuParquetWriter;
use liu::generator::{daily_file_name, generate_daily_logs, generate_logs};
use liu::logging::{self, LiuLogConfig};
use liu::pipeline::LiuPipeline;
use liu::quality::LiuQualityEngine;

#[derive(Parser)]
#[command(name = "liu-etl")]
#[command(about = "Batch ETL from CSV web logs to quality-checked Parquet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pipeline invocation described by a job file.
    Run {
        #[arg(long)]
        config: PathBuf,
        /// Overrides the run id of the job file.
        #[arg(long)]
        job_run_id: Option<String>,
        /// Blocks the write of a batch failing its rules, whatever the job file says.
        #[arg(long)]
        gate_on_quality: bool,
    },
    /// Write synthetic web log CSV files.
    Generate {
        #[arg(long, default_value_t = 1000)]
        rows: usize,
        /// Output file for a single day.
        #[arg(long, conflicts_with = "days")]
        output: Option<PathBuf>,
        /// Log date, YYYY-MM-DD; today when omitted.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Number of daily files to write into --dir, ending at --date.
        #[arg(long, requires = "dir")]
        days: Option<u32>,
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            config,
            job_run_id,
            gate_on_quality,
        } => run(config, job_run_id, gate_on_quality.then_some(true)),
        Commands::Generate {
            rows,
            output,
            date,
            days,
            dir,
            seed,
        } => generate(rows, output, date, days, dir, seed).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("liu-etl: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the run reached `DONE`.
fn run(config: PathBuf, job_run_id: Option<String>, gate_on_quality: Option<bool>) -> anyhow::Result<bool> {
    let job = LiuJobConfig::from_path(&config)
        .with_context(|| format!("loading job {}", config.display()))?;
    logging::init(job.log_config())?;

    let catalog = job.load_catalog().context("loading catalog")?;
    let request = job.to_request(job_run_id.as_deref(), gate_on_quality);
    let writer = LiuParquetWriter::new();
    let engine = LiuQualityEngine::new(job.sink.build(), job.pipeline.publishing_strategy);
    let report = LiuPipeline::new(&catalog, &writer, engine, job.pipeline.clone()).run(&request);

    println!("{}", serde_json::to_string_pretty(&report.outcome())?);
    Ok(report.is_success())
}

fn generate(
    rows: usize,
    output: Option<PathBuf>,
    date: Option<NaiveDate>,
    days: Option<u32>,
    dir: Option<PathBuf>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    logging::init(LiuLogConfig::default())?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());

    let files = match (days, dir) {
        (Some(days), Some(dir)) => generate_daily_logs(&dir, days, rows, date, seed)?,
        (None, dir) => {
            let output = output
                .or_else(|| dir.map(|d| d.join(daily_file_name(date))))
                .unwrap_or_else(|| PathBuf::from(daily_file_name(date)));
            vec![generate_logs(rows, &output, date, seed)?]
        }
        (Some(_), None) => anyhow::bail!("--days requires --dir"),
    };
    for file in files {
        println!("{}", file.display());
    }
    Ok(())
}
