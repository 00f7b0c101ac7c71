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

//! # Stream Exporter
//!
//! Public entry points of a generation run.
//!
//! - [`ZiStreamExporter::run`] drives the export on the caller's task.
//! - [`ZiStreamExporter::spawn`] runs it on its own tokio task and returns a
//!   [`ZiGenerationHandle`] for cancellation, events and the final outcome.
//!
//! ```rust
//! use std::sync::Arc;
//! use zipage::config::ZiExportConfig;
//! use zipage::exporter::ZiStreamExporter;
//! use zipage::ingest::{ZiCsvOptions, ZiCsvRowSource};
//! use zipage::render::ZiPdfSurfaceFactory;
//!
//! let source = ZiCsvRowSource::open("orders.csv", ZiCsvOptions::default())?;
//! let columns = source.columns().clone();
//! let mut handle = ZiStreamExporter::new(ZiExportConfig::default().with_rows_per_file(Some(50_000)))
//!     .spawn(columns, 120_000, Box::new(source), Arc::new(ZiPdfSurfaceFactory::new()));
//! while let Some(event) = handle.next_event().await {
//!     println!("{:?}", event);
//! }
//! let outcome = handle.wait().await?;
//! ```

#[cfg(feature = "csv")]
use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ZiExportConfig;
use crate::engine::{ZiOutcome, ZiPaginationEngine};
use crate::errors::{Result, ZiError};
use crate::events::{ZiEvent, ZiEventSink};
use crate::export::archive::{ZiArchivePackager, ZiZipPackager};
use crate::ingest::ZiRowSource;
#[cfg(feature = "csv")]
use crate::ingest::{estimate_row_count, ZiCsvOptions, ZiCsvRowSource, DEFAULT_SAMPLE_BYTES};
use crate::record::ZiColumnSet;
use crate::render::ZiSurfaceFactory;

/// Event slots between a spawned generation and its handle.
pub const EVENT_BUFFER: usize = 256;

pub struct ZiStreamExporter {
    config: ZiExportConfig,
    packager: Arc<dyn ZiArchivePackager>,
}

impl ZiStreamExporter {
    pub fn new(config: ZiExportConfig) -> Self {
        Self {
            config,
            packager: Arc::new(ZiZipPackager::new()),
        }
    }

    /// Replaces the ZIP packager.
    pub fn with_packager(mut self, packager: Arc<dyn ZiArchivePackager>) -> Self {
        self.packager = packager;
        self
    }

    pub fn config(&self) -> &ZiExportConfig {
        &self.config
    }

    /// Runs a generation on the current task.
    pub async fn run(
        &self,
        columns: ZiColumnSet,
        estimated_total_rows: usize,
        source: &mut dyn ZiRowSource,
        factory: Arc<dyn ZiSurfaceFactory>,
        cancel: CancellationToken,
        events: impl Into<ZiEventSink>,
    ) -> Result<ZiOutcome> {
        let engine = ZiPaginationEngine::new(self.config.clone(), factory, Arc::clone(&self.packager));
        engine
            .run(columns, estimated_total_rows, source, cancel, events.into())
            .await
    }

    /// Exports a CSV file: header from the first record, row estimate from a
    /// sample of the file head, chunks of `config.chunk_size` rows.
    #[cfg(feature = "csv")]
    pub async fn run_csv(
        &self,
        path: impl AsRef<Path>,
        factory: Arc<dyn ZiSurfaceFactory>,
        cancel: CancellationToken,
        events: impl Into<ZiEventSink>,
    ) -> Result<ZiOutcome> {
        let path = path.as_ref();
        // the header line is part of the sample
        let estimated = estimate_row_count(path, DEFAULT_SAMPLE_BYTES)?.saturating_sub(1);
        let options = ZiCsvOptions::default().with_chunk_size(self.config.chunk_size);
        let mut source = ZiCsvRowSource::open(path, options)?.with_cancellation(cancel.clone());
        let columns = source.columns().clone();
        log::debug!("exporting {} (~{} rows)", path.display(), estimated);
        self.run(columns, estimated, &mut source, factory, cancel, events)
            .await
    }

    /// Runs a generation on a new tokio task.
    ///
    /// Events go through a channel of [`EVENT_BUFFER`] slots. While the
    /// buffer is full, new events are dropped rather than queued.
    pub fn spawn(
        self,
        columns: ZiColumnSet,
        estimated_total_rows: usize,
        mut source: Box<dyn ZiRowSource>,
        factory: Arc<dyn ZiSurfaceFactory>,
    ) -> ZiGenerationHandle {
        let cancel = CancellationToken::new();
        let (sender, events) = mpsc::channel(EVENT_BUFFER);
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            self.run(
                columns,
                estimated_total_rows,
                source.as_mut(),
                factory,
                token,
                sender,
            )
            .await
        });
        ZiGenerationHandle {
            cancel,
            events,
            task,
        }
    }
}

impl std::fmt::Debug for ZiStreamExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZiStreamExporter")
            .field("config", &self.config)
            .finish()
    }
}

/// Item of [`ZiGenerationHandle::into_event_stream`].
#[derive(Debug)]
pub enum ZiGenerationUpdate {
    Event(ZiEvent),
    /// Last item of the stream.
    Finished(Result<ZiOutcome>),
}

/// Caller side of a spawned generation.
#[derive(Debug)]
pub struct ZiGenerationHandle {
    cancel: CancellationToken,
    events: Receiver<ZiEvent>,
    task: JoinHandle<Result<ZiOutcome>>,
}

impl ZiGenerationHandle {
    /// Requests cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next event, or `None` once the run has ended and all events were read.
    pub async fn next_event(&mut self) -> Option<ZiEvent> {
        self.events.recv().await
    }

    /// Waits for the run to end. Unread events are discarded.
    pub async fn wait(self) -> Result<ZiOutcome> {
        let Self { events, task, .. } = self;
        drop(events);
        task.await
            .map_err(|e| ZiError::internal(format!("generation task failed: {}", e)))?
    }

    /// Every delivered event in order, followed by the outcome.
    pub fn into_event_stream(self) -> impl Stream<Item = ZiGenerationUpdate> {
        stream::unfold(Some(self), |state| async move {
            let mut handle = state?;
            match handle.next_event().await {
                Some(event) => Some((ZiGenerationUpdate::Event(event), Some(handle))),
                None => {
                    let outcome = handle.wait().await;
                    Some((ZiGenerationUpdate::Finished(outcome), None))
                }
            }
        })
    }
}
