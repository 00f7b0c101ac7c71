//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd Team.
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

//! # CSV Row Source
//!
//! Chunked CSV decoding on top of the `csv` crate. The first record is the
//! header; every later record becomes one [`ZiRow`].
//!
//! Sequential chunk requests advance a single cursor through the input;
//! requests ahead of the cursor scan forward. A request behind the cursor
//! re-opens the file when the source was opened from a path, and is rejected
//! for reader-backed sources. Served chunks are not retained, so retrying an
//! index also goes back through the file.
//!
//! Records the CSV reader rejects are skipped, logged and counted in
//! [`ZiRowBatch::skipped_rows`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::{ErrorKind, ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::source::{ZiChunk, ZiRowSource};
use crate::errors::{Result, ZiError};
use crate::record::{ZiCell, ZiColumnSet, ZiRow, ZiRowBatch};

/// Bytes read from the head of a file when estimating its row count.
pub const DEFAULT_SAMPLE_BYTES: usize = 100_000;

/// Decoding options for CSV input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiCsvOptions {
    pub delimiter: u8,
    /// Rows per chunk.
    pub chunk_size: usize,
    /// Decode numeric text into numbers and blank fields into empty cells.
    pub dynamic_typing: bool,
    /// Drop records whose fields are all blank.
    pub skip_empty_lines: bool,
    /// Accept records with a different field count than the header.
    pub flexible: bool,
}

impl Default for ZiCsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            chunk_size: 1000,
            dynamic_typing: true,
            skip_empty_lines: true,
            flexible: true,
        }
    }
}

impl ZiCsvOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(self.flexible);
        builder
    }
}

type ZiCsvReader = csv::Reader<Box<dyn Read + Send>>;

/// Streams a CSV input chunk by chunk.
pub struct ZiCsvRowSource {
    reader: ZiCsvReader,
    path: Option<PathBuf>,
    options: ZiCsvOptions,
    columns: ZiColumnSet,
    next_index: usize,
    exhausted: bool,
    cancel: Option<CancellationToken>,
}

impl ZiCsvRowSource {
    /// Opens a CSV file and reads its header.
    pub fn open(path: impl AsRef<Path>, options: ZiCsvOptions) -> Result<Self> {
        let path = path.as_ref();
        let reader = open_reader(path, &options)?;
        Self::build(reader, Some(path.to_path_buf()), options)
    }

    /// Wraps any reader. Such a source can only be read forwards.
    pub fn from_reader<R>(reader: R, options: ZiCsvOptions) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let boxed: Box<dyn Read + Send> = Box::new(reader);
        let reader = options.reader_builder().from_reader(boxed);
        Self::build(reader, None, options)
    }

    fn build(mut reader: ZiCsvReader, path: Option<PathBuf>, options: ZiCsvOptions) -> Result<Self> {
        if options.chunk_size == 0 {
            return Err(ZiError::usage("chunk size must be at least 1"));
        }
        let columns = header_columns(&mut reader)?;
        log::debug!(
            "csv source opened with {} columns{}",
            columns.len(),
            path.as_ref()
                .map(|p| format!(" from {}", p.display()))
                .unwrap_or_default()
        );
        Ok(Self {
            reader,
            path,
            options,
            columns,
            next_index: 0,
            exhausted: false,
            cancel: None,
        })
    }

    /// Answers end of data once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn columns(&self) -> &ZiColumnSet {
        &self.columns
    }

    pub fn options(&self) -> &ZiCsvOptions {
        &self.options
    }

    fn rewind(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or_else(|| {
            ZiError::usage("reader-backed csv source can only serve chunks in order")
        })?;
        log::debug!("csv source rewinding {}", path.display());
        let mut reader = open_reader(&path, &self.options)?;
        header_columns(&mut reader)?;
        self.reader = reader;
        self.next_index = 0;
        self.exhausted = false;
        Ok(())
    }

    fn read_chunk(&mut self) -> Result<ZiChunk> {
        let index = self.next_index;
        self.next_index += 1;
        if self.exhausted {
            return Ok(ZiChunk::EndOfData);
        }

        let mut rows = Vec::with_capacity(self.options.chunk_size);
        let mut skipped = 0;
        let mut record = StringRecord::new();
        while rows.len() < self.options.chunk_size {
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    if self.options.skip_empty_lines && record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }
                    rows.push(self.decode(&record));
                }
                Ok(false) => {
                    self.exhausted = true;
                    break;
                }
                Err(err) => {
                    if let ErrorKind::Io(io) = err.kind() {
                        return Err(ZiError::input(format!(
                            "csv read failed in chunk {}: {}",
                            index, io
                        )));
                    }
                    skipped += 1;
                    log::warn!("skipping malformed csv record in chunk {}: {}", index, err);
                }
            }
        }

        if rows.is_empty() && skipped == 0 {
            return Ok(ZiChunk::EndOfData);
        }
        Ok(ZiChunk::Rows(ZiRowBatch::new(rows).with_skipped(skipped)))
    }

    fn decode(&self, record: &StringRecord) -> ZiRow {
        let cells = record
            .iter()
            .map(|field| {
                if self.options.dynamic_typing {
                    ZiCell::infer(field)
                } else {
                    ZiCell::text(field)
                }
            })
            .collect();
        ZiRow::new(cells)
    }
}

#[async_trait]
impl ZiRowSource for ZiCsvRowSource {
    async fn next_chunk(&mut self, chunk_index: usize) -> Result<ZiChunk> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Ok(ZiChunk::EndOfData);
        }
        if chunk_index < self.next_index {
            self.rewind()?;
        }
        while self.next_index < chunk_index {
            if self.read_chunk()?.is_end() {
                break;
            }
        }
        if self.next_index == chunk_index {
            self.read_chunk()
        } else {
            Ok(ZiChunk::EndOfData)
        }
    }
}

impl std::fmt::Debug for ZiCsvRowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZiCsvRowSource")
            .field("path", &self.path)
            .field("columns", &self.columns)
            .field("next_index", &self.next_index)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

fn open_reader(path: &Path, options: &ZiCsvOptions) -> Result<ZiCsvReader> {
    let file = File::open(path)
        .map_err(|e| ZiError::input(format!("cannot open {}: {}", path.display(), e)))?;
    let boxed: Box<dyn Read + Send> = Box::new(BufReader::new(file));
    Ok(options.reader_builder().from_reader(boxed))
}

fn header_columns<R: Read>(reader: &mut csv::Reader<R>) -> Result<ZiColumnSet> {
    let headers = reader
        .headers()
        .map_err(|e| ZiError::input(format!("cannot read csv header: {}", e)))?;
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ZiError::input("input has no header row"));
    }
    ZiColumnSet::new(headers.iter().map(|h| h.trim().to_string()))
}

/// Reads only the header record of a CSV file.
pub fn read_csv_header(path: impl AsRef<Path>, options: &ZiCsvOptions) -> Result<ZiColumnSet> {
    let mut reader = open_reader(path.as_ref(), options)?;
    header_columns(&mut reader)
}

/// Estimates the number of lines in a file from a sample of its head.
///
/// Returns 1 when the sample holds no line break.
pub fn estimate_row_count(path: impl AsRef<Path>, sample_bytes: usize) -> Result<usize> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ZiError::input(format!("cannot open {}: {}", path.display(), e)))?;
    let file_size = file.metadata()?.len() as usize;
    let mut sample = Vec::with_capacity(sample_bytes.min(file_size));
    file.take(sample_bytes as u64).read_to_end(&mut sample)?;

    let newlines = sample.iter().filter(|b| **b == b'\n').count();
    if newlines == 0 {
        return Ok(1);
    }
    let bytes_per_row = sample.len() as f64 / newlines as f64;
    Ok((file_size as f64 / bytes_per_row).ceil() as usize)
}

/// True when the path carries a `.csv` extension.
pub fn is_csv_path(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}
