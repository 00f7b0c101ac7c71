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

//! # Multi-File Splitter
//!
//! Owns the document writer of the file being filled and rotates to a fresh
//! document once the configured row quota is reached.
//!
//! ## Behaviour
//!
//! - Without a quota every row lands in one document, which is always
//!   finalized, even when empty.
//! - With a quota, a document is finalized when the next row would exceed it,
//!   and the trailing document only when it holds rows.
//! - File names come from the configured pattern with the 1-based file number
//!   substituted; titles gain a `(Part k of N)` suffix in split mode.
//! - With an output directory configured, finished documents are written
//!   atomically and only their path is kept in memory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ZiExportConfig;
use crate::errors::{Result, ZiError};
use crate::events::{ZiEvent, ZiEventSink};
use crate::export::persist::write_atomic;
use crate::record::ZiColumnSet;
use crate::render::{ZiDocumentSpec, ZiSurfaceFactory};
use crate::writer::{ZiDocumentWriter, ZiWriterOptions};

/// Where a finished document lives.
#[derive(Clone, Debug, PartialEq)]
pub enum ZiDocumentData {
    Memory(Vec<u8>),
    File(PathBuf),
}

impl ZiDocumentData {
    /// Document bytes, read from disk when persisted.
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            ZiDocumentData::Memory(bytes) => Ok(bytes.clone()),
            ZiDocumentData::File(path) => Ok(fs::read(path)?),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ZiDocumentData::Memory(_) => None,
            ZiDocumentData::File(path) => Some(path),
        }
    }
}

/// A finalized output document.
#[derive(Clone, Debug, PartialEq)]
pub struct ZiCompletedFile {
    /// 1-based.
    pub file_index: usize,
    pub file_name: String,
    pub document: ZiDocumentData,
    pub row_count: usize,
    pub page_count: usize,
}

impl ZiCompletedFile {
    pub fn bytes(&self) -> Result<Vec<u8>> {
        self.document.read()
    }

    /// Writes the document to `path`.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match &self.document {
            ZiDocumentData::Memory(bytes) => write_atomic(path, bytes),
            ZiDocumentData::File(source) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                fs::copy(source, path)?;
                Ok(())
            }
        }
    }
}

/// Files produced by a finished split.
#[derive(Clone, Debug, Default)]
pub struct ZiSplitSummary {
    pub files: Vec<ZiCompletedFile>,
    pub total_files: usize,
    pub total_pages: usize,
}

pub struct ZiFileSplitter {
    config: ZiExportConfig,
    factory: Arc<dyn ZiSurfaceFactory>,
    columns: ZiColumnSet,
    events: ZiEventSink,
    total_files_expected: usize,
    file_index: usize,
    row_in_file: usize,
    writer: Option<ZiDocumentWriter>,
    completed: Vec<ZiCompletedFile>,
}

impl ZiFileSplitter {
    pub fn new(
        config: ZiExportConfig,
        factory: Arc<dyn ZiSurfaceFactory>,
        columns: ZiColumnSet,
        estimated_total_rows: usize,
        events: ZiEventSink,
    ) -> Self {
        let total_files_expected = expected_files(estimated_total_rows, config.rows_per_file);
        Self {
            config,
            factory,
            columns,
            events,
            total_files_expected,
            file_index: 0,
            row_in_file: 0,
            writer: None,
            completed: Vec::new(),
        }
    }

    /// Opens document 1.
    pub fn start(&mut self) -> Result<()> {
        if self.file_index != 0 {
            return Err(ZiError::usage("splitter already started"));
        }
        self.open_next()
    }

    /// Reported file total, never below the current file number.
    pub fn total_files(&self) -> usize {
        self.total_files_expected.max(self.file_index).max(1)
    }

    pub fn current_file(&self) -> usize {
        self.file_index
    }

    pub fn rows_in_current_file(&self) -> usize {
        self.row_in_file
    }

    pub fn current_page(&self) -> usize {
        self.writer.as_ref().map(|w| w.page_count()).unwrap_or(0)
    }

    pub fn completed(&self) -> &[ZiCompletedFile] {
        &self.completed
    }

    pub fn writer_mut(&mut self) -> Result<&mut ZiDocumentWriter> {
        self.writer
            .as_mut()
            .ok_or_else(|| ZiError::usage("no document is open"))
    }

    /// Finalizes the current document and opens the next one when the row
    /// quota is reached. Returns true on rotation.
    pub fn rotate_if_full(&mut self) -> Result<bool> {
        let Some(quota) = self.config.rows_per_file else {
            return Ok(false);
        };
        if self.row_in_file < quota {
            return Ok(false);
        }
        self.finish_current()?;
        self.open_next()?;
        Ok(true)
    }

    /// Counts a row written to the current document.
    pub fn record_row(&mut self) {
        self.row_in_file += 1;
    }

    /// Finalizes the trailing document and returns every completed file.
    pub fn finish(mut self) -> Result<ZiSplitSummary> {
        let single_document = self.config.rows_per_file.is_none();
        if self.writer.is_some() && (single_document || self.row_in_file > 0) {
            self.finish_current()?;
        }
        let total_files = if single_document {
            1
        } else {
            self.total_files_expected.max(self.completed.len())
        };
        let total_pages = self.completed.iter().map(|f| f.page_count).sum();
        Ok(ZiSplitSummary {
            files: self.completed,
            total_files,
            total_pages,
        })
    }

    /// Drops the open document without finalizing it.
    pub fn abandon(self) -> Vec<ZiCompletedFile> {
        if let Some(writer) = &self.writer {
            log::debug!(
                "abandoning file {} after {} rows",
                self.file_index,
                writer.rows_written()
            );
        }
        self.completed
    }

    fn open_next(&mut self) -> Result<()> {
        self.file_index += 1;
        self.row_in_file = 0;
        let (page_width, page_height) = self.config.page_dimensions_mm();
        let spec = ZiDocumentSpec {
            title: self.document_title(),
            author: self.config.author.clone(),
            page_width,
            page_height,
        };
        let mut writer = ZiDocumentWriter::start_document(
            self.factory.as_ref(),
            spec,
            self.columns.clone(),
            ZiWriterOptions::from(&self.config),
        )?;
        if self.config.include_header_row {
            writer.write_header_row()?;
        }
        self.writer = Some(writer);

        let file_name = self.config.file_name(self.file_index);
        log::debug!("started file {} ({})", self.file_index, file_name);
        self.events.emit(ZiEvent::FileStarted {
            file_index: self.file_index,
            file_name,
        });
        Ok(())
    }

    fn finish_current(&mut self) -> Result<()> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| ZiError::usage("no document is open"))?;
        let finished = writer.finalize()?;
        let file_name = self.config.file_name(self.file_index);
        let document = match &self.config.output_dir {
            Some(dir) => {
                let path = dir.join(&file_name);
                write_atomic(&path, &finished.bytes)?;
                ZiDocumentData::File(path)
            }
            None => ZiDocumentData::Memory(finished.bytes),
        };

        log::info!(
            "completed {} with {} rows on {} pages",
            file_name,
            finished.row_count,
            finished.page_count
        );
        self.events.emit(ZiEvent::FileCompleted {
            file_index: self.file_index,
            file_name: file_name.clone(),
            row_count: finished.row_count,
            page_count: finished.page_count,
        });
        self.completed.push(ZiCompletedFile {
            file_index: self.file_index,
            file_name,
            document,
            row_count: finished.row_count,
            page_count: finished.page_count,
        });
        Ok(())
    }

    fn document_title(&self) -> String {
        let title = &self.config.title;
        if title.is_empty() || self.config.rows_per_file.is_none() {
            return title.clone();
        }
        format!(
            "{} (Part {} of {})",
            title,
            self.file_index,
            self.total_files()
        )
    }
}

impl std::fmt::Debug for ZiFileSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZiFileSplitter")
            .field("file_index", &self.file_index)
            .field("row_in_file", &self.row_in_file)
            .field("total_files_expected", &self.total_files_expected)
            .field("completed", &self.completed.len())
            .finish()
    }
}

/// `ceil(rows / quota)`, at least 1; always 1 without a quota.
pub fn expected_files(estimated_total_rows: usize, rows_per_file: Option<usize>) -> usize {
    match rows_per_file {
        Some(quota) if quota > 0 => estimated_total_rows.div_ceil(quota).max(1),
        _ => 1,
    }
}
