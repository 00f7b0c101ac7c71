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

//! # Streaming Pagination Engine
//!
//! Pulls chunks from a [`ZiRowSource`], places every row through the layout
//! tracker and writes it via the splitter's current document writer.
//!
//! ## Execution Flow
//!
//! 1. Validate configuration and open document 1 (header row included).
//! 2. For each chunk: check cancellation, fetch, check again, then for each
//!    row check cancellation, rotate the file if its quota is full, break the
//!    page if the row would overflow, and draw it.
//! 3. After each chunk emit one progress event and yield to the runtime.
//! 4. On end of data finalize the trailing document and package the archive.
//!
//! Only the current chunk is held in memory; it is dropped once written.
//! Once cancellation is observed nothing more is drawn and the run returns
//! [`ZiOutcome::Cancelled`] with the files finished before that point.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ZiExportConfig;
use crate::errors::{Result, ZiError};
use crate::events::{ZiEvent, ZiEventSink, ZiProgress};
use crate::export::archive::{ZiArchive, ZiArchivePackager};
use crate::ingest::{ZiChunk, ZiRowSource};
use crate::layout::needs_page_break;
use crate::record::ZiColumnSet;
use crate::render::ZiSurfaceFactory;
use crate::splitter::{ZiCompletedFile, ZiFileSplitter};

/// Counters of one generation run.
#[derive(Clone, Debug)]
pub struct ZiGenerationSession {
    pub total_rows_expected: usize,
    pub rows_processed: usize,
    pub skipped_rows: usize,
    pub chunks_processed: usize,
    pub current_file_index: usize,
    pub cancel: CancellationToken,
}

impl ZiGenerationSession {
    pub fn new(total_rows_expected: usize, cancel: CancellationToken) -> Self {
        Self {
            total_rows_expected,
            rows_processed: 0,
            skipped_rows: 0,
            chunks_processed: 0,
            current_file_index: 1,
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn progress(&self, splitter: &ZiFileSplitter) -> ZiProgress {
        ZiProgress {
            rows_processed: self.rows_processed,
            total_rows_expected: self.total_rows_expected,
            skipped_rows: self.skipped_rows,
            chunks_processed: self.chunks_processed,
            current_page: splitter.current_page(),
            current_file: self.current_file_index,
            total_files: splitter.total_files(),
        }
    }
}

/// Result of a completed run.
#[derive(Clone, Debug)]
pub struct ZiGenerationResult {
    pub files: Vec<ZiCompletedFile>,
    pub total_files: usize,
    pub archive: Option<ZiArchive>,
    /// Set when packaging failed; the files stay valid.
    pub archive_error: Option<String>,
    pub rows_processed: usize,
    pub skipped_rows: usize,
    pub total_pages: usize,
}

#[derive(Clone, Debug)]
pub enum ZiOutcome {
    Completed(ZiGenerationResult),
    Cancelled {
        rows_processed: usize,
        skipped_rows: usize,
        /// Files finalized before cancellation was observed.
        completed_files: Vec<ZiCompletedFile>,
    },
}

impl ZiOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ZiOutcome::Cancelled { .. })
    }

    pub fn rows_processed(&self) -> usize {
        match self {
            ZiOutcome::Completed(result) => result.rows_processed,
            ZiOutcome::Cancelled { rows_processed, .. } => *rows_processed,
        }
    }

    /// The completed result, or `None` when cancelled.
    pub fn completed(self) -> Option<ZiGenerationResult> {
        match self {
            ZiOutcome::Completed(result) => Some(result),
            ZiOutcome::Cancelled { .. } => None,
        }
    }
}

/// Drives one export run from source to finished documents.
pub struct ZiPaginationEngine {
    config: ZiExportConfig,
    factory: Arc<dyn ZiSurfaceFactory>,
    packager: Arc<dyn ZiArchivePackager>,
}

impl ZiPaginationEngine {
    pub fn new(
        config: ZiExportConfig,
        factory: Arc<dyn ZiSurfaceFactory>,
        packager: Arc<dyn ZiArchivePackager>,
    ) -> Self {
        Self {
            config,
            factory,
            packager,
        }
    }

    pub async fn run(
        &self,
        columns: ZiColumnSet,
        estimated_total_rows: usize,
        source: &mut dyn ZiRowSource,
        cancel: CancellationToken,
        events: ZiEventSink,
    ) -> Result<ZiOutcome> {
        self.config.validate()?;
        if columns.is_empty() {
            return Err(ZiError::usage("cannot generate a document without columns"));
        }

        let mut session = ZiGenerationSession::new(estimated_total_rows, cancel);
        let column_count = columns.len();
        let mut splitter = ZiFileSplitter::new(
            self.config.clone(),
            Arc::clone(&self.factory),
            columns,
            estimated_total_rows,
            events.clone(),
        );
        log::info!(
            "starting export: {} columns, ~{} rows, {} file(s) expected",
            column_count,
            session.total_rows_expected,
            splitter.total_files()
        );
        splitter.start()?;

        let mut chunk_index = 0;
        let mut cancelled = false;
        loop {
            if session.is_cancelled() {
                cancelled = true;
                break;
            }
            let fetched = source.next_chunk(chunk_index).await;
            chunk_index += 1;
            if session.is_cancelled() {
                cancelled = true;
                break;
            }

            let batch = match fetched {
                Ok(ZiChunk::EndOfData) => break,
                Ok(ZiChunk::Rows(batch)) => batch,
                Err(ZiError::RowDecode {
                    chunk,
                    rows,
                    message,
                }) => {
                    log::warn!(
                        "skipping chunk {} ({} rows): {}",
                        chunk,
                        rows,
                        message
                    );
                    session.skipped_rows += rows;
                    session.chunks_processed += 1;
                    events.emit(ZiEvent::Progress(session.progress(&splitter)));
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(err) => return Err(err),
            };

            if batch.skipped_rows > 0 {
                log::warn!(
                    "chunk {} dropped {} malformed rows",
                    chunk_index - 1,
                    batch.skipped_rows
                );
            }
            session.skipped_rows += batch.skipped_rows;

            for row in batch {
                if session.is_cancelled() {
                    cancelled = true;
                    break;
                }
                if splitter.rotate_if_full()? {
                    session.current_file_index = splitter.current_file();
                }
                let file_index = session.current_file_index;
                let writer = splitter.writer_mut()?;
                if needs_page_break(writer.layout()) {
                    writer.add_page()?;
                    events.emit(ZiEvent::PageAdded {
                        file_index,
                        page: writer.page_count(),
                    });
                }
                writer.write_data_row(&row, session.rows_processed % 2 == 1)?;
                splitter.record_row();
                session.rows_processed += 1;
            }
            if cancelled {
                break;
            }

            session.chunks_processed += 1;
            events.emit(ZiEvent::Progress(session.progress(&splitter)));
            tokio::task::yield_now().await;
        }

        if cancelled {
            let completed_files = splitter.abandon();
            log::info!(
                "export cancelled after {} rows; {} file(s) were already complete",
                session.rows_processed,
                completed_files.len()
            );
            return Ok(ZiOutcome::Cancelled {
                rows_processed: session.rows_processed,
                skipped_rows: session.skipped_rows,
                completed_files,
            });
        }

        let summary = splitter.finish()?;
        let (archive, archive_error) = self.package(&summary.files);
        log::info!(
            "export finished: {} rows, {} skipped, {} file(s), {} page(s)",
            session.rows_processed,
            session.skipped_rows,
            summary.files.len(),
            summary.total_pages
        );
        Ok(ZiOutcome::Completed(ZiGenerationResult {
            files: summary.files,
            total_files: summary.total_files,
            archive,
            archive_error,
            rows_processed: session.rows_processed,
            skipped_rows: session.skipped_rows,
            total_pages: summary.total_pages,
        }))
    }

    fn package(&self, files: &[ZiCompletedFile]) -> (Option<ZiArchive>, Option<String>) {
        if !self.config.create_archive || files.len() < 2 {
            return (None, None);
        }
        match self.packager.package(
            &self.config.archive_name,
            files,
            self.config.output_dir.as_deref(),
        ) {
            Ok(archive) => (Some(archive), None),
            Err(err) => {
                log::warn!("archive packaging failed: {}", err);
                (None, Some(err.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for ZiPaginationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZiPaginationEngine")
            .field("config", &self.config)
            .finish()
    }
}
