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

//! # Data Export Module
//!
//! This module persists accepted batches as columnar Parquet files.
//!
//! ## Module Components
//!
//! - **Destination** ([destination.rs](destination/index.html)): Output location, partition keys and codec
//! - **Writer** ([writer.rs](writer/index.html)): Staged, idempotent Parquet writes
//! - **Manifest** ([manifest.rs](manifest/index.html)): Commit record of the files per transformation id
//!
//! ## Supported Codecs
//!
//! - **Snappy** (default)
//! - **Gzip**, **Zstd**, **Lz4**
//! - **Uncompressed**
//!
//! ## Usage Patterns
//!
//! ```rust,ignore
//! use liu::export::{LiuBatchWriter, LiuCodec, LiuDestination, LiuParquetWriter};
//!
//! let destination = LiuDestination::new("out/web_logs")
//!     .with_partition_keys(["user_agent"])
//!     .with_codec(LiuCodec::Snappy);
//! let result = LiuParquetWriter::new().write(&batch, &destination)?;
//! println!("{} records in {} files", result.records_written, result.files.len());
//! ```

pub mod destination;
pub mod manifest;
pub mod writer;

pub use destination::{LiuCodec, LiuDestination};
pub use manifest::{
    compute_file_hash, LiuCommitManifest, LiuManifestEntry, LiuManifestEntryBuilder,
    LiuManifestFile, MANIFEST_FILE_NAME,
};
pub use writer::{
    escape_partition_value, output_schema, LiuBatchWriter, LiuParquetWriter,
    LiuParquetWriterConfig, LiuWriteResult,
};
