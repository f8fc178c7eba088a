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

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::errors::{LiuError, Result};

/// Compression of a CSV source file, detected from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiuSourceCompression {
    None,
    Gzip,
    Zstd,
}

impl LiuSourceCompression {
    /// Returns `None` when the path is not a CSV source at all.
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".csv") {
            Some(LiuSourceCompression::None)
        } else if name.ends_with(".csv.gz") {
            Some(LiuSourceCompression::Gzip)
        } else if name.ends_with(".csv.zst") || name.ends_with(".csv.zstd") {
            Some(LiuSourceCompression::Zstd)
        } else {
            None
        }
    }
}

/// Turns a catalog location into a local path.
///
/// Plain paths and `file://` URIs are accepted; any other scheme is reported
/// as an unavailable source.
pub fn resolve_location(location: &str) -> Result<PathBuf> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(LiuError::source_unavailable(location, "empty location"));
    }
    if let Some(rest) = trimmed.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if let Some((scheme, _)) = trimmed.split_once("://") {
        return Err(LiuError::source_unavailable(
            location,
            format!("unsupported scheme '{scheme}'"),
        ));
    }
    Ok(PathBuf::from(trimmed))
}

/// Lists the source files behind a location, in file-name order.
pub fn list_source_files(location: &str) -> Result<Vec<PathBuf>> {
    let path = resolve_location(location)?;
    let metadata = fs::metadata(&path)
        .map_err(|err| LiuError::source_unavailable(location, err.to_string()))?;

    if metadata.is_file() {
        return Ok(vec![path]);
    }

    let mut files = Vec::new();
    let entries =
        fs::read_dir(&path).map_err(|err| LiuError::source_unavailable(location, err.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|err| LiuError::source_unavailable(location, err.to_string()))?;
        let candidate = entry.path();
        if candidate.is_file() && LiuSourceCompression::detect(&candidate).is_some() {
            files.push(candidate);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if files.is_empty() {
        return Err(LiuError::source_unavailable(location, "no CSV files in directory"));
    }
    Ok(files)
}

/// Opens a source file, decompressing on the fly when needed.
pub fn open_source(path: &Path) -> Result<Box<dyn Read>> {
    let location = path.display().to_string();
    let file = File::open(path).map_err(|err| LiuError::source_unavailable(&location, err.to_string()))?;

    match LiuSourceCompression::detect(path).unwrap_or(LiuSourceCompression::None) {
        LiuSourceCompression::None => Ok(Box::new(BufReader::new(file))),
        LiuSourceCompression::Gzip => open_gzip(file, &location),
        LiuSourceCompression::Zstd => open_zstd(file, &location),
    }
}

#[cfg(feature = "compression")]
fn open_gzip(file: File, _location: &str) -> Result<Box<dyn Read>> {
    Ok(Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file))))
}

#[cfg(not(feature = "compression"))]
fn open_gzip(_file: File, location: &str) -> Result<Box<dyn Read>> {
    Err(LiuError::source_unavailable(location, "gzip sources require the 'compression' feature"))
}

#[cfg(feature = "compression")]
fn open_zstd(file: File, location: &str) -> Result<Box<dyn Read>> {
    let decoder = zstd::stream::read::Decoder::new(file)
        .map_err(|err| LiuError::source_unavailable(location, err.to_string()))?;
    Ok(Box::new(BufReader::new(decoder)))
}

#[cfg(not(feature = "compression"))]
fn open_zstd(_file: File, location: &str) -> Result<Box<dyn Read>> {
    Err(LiuError::source_unavailable(location, "zstd sources require the 'compression' feature"))
}
