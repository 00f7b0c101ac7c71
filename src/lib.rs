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

//! # Zipage Core Library
//!
//! Streaming, constant-memory pagination of large tabular datasets into PDF
//! documents. Rows are pulled from a source in bounded chunks, laid out into
//! pages and, optionally, split across several output files that can be
//! packaged into one ZIP archive.
//!
//! ## Module Overview
//!
//! - **record**: cells, rows, row batches and the fixed column set
//! - **config**: export configuration and its JSON/YAML builder
//! - **ingest**: row sources (in-memory, CSV)
//! - **layout**: page geometry and page-break decisions
//! - **render**: drawing surface trait with PDF and recording backends
//! - **writer**: per-document writer state machine
//! - **splitter**: row quotas, file naming, completed-file bookkeeping
//! - **engine**: the streaming pagination loop
//! - **events**: progress and lifecycle notifications
//! - **export**: atomic persistence and archive packaging
//! - **exporter**: public run/spawn entry points
//!
//! ## Feature Flags
//!
//! - `csv`: CSV row source
//! - `pdf`: printpdf drawing backend
//! - `full`: Enables all features (default)
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use zipage::{ZiColumnSet, ZiEventSink, ZiExportConfig, ZiRow, ZiStreamExporter, ZiVecRowSource};
//! use zipage::render::ZiPdfSurfaceFactory;
//!
//! let columns = ZiColumnSet::new(["id", "name"])?;
//! let rows = vec![ZiRow::from_texts(["1", "Alice"]), ZiRow::from_texts(["2", "Bob"])];
//! let mut source = ZiVecRowSource::new(rows, 1000)?;
//! let outcome = ZiStreamExporter::new(ZiExportConfig::default())
//!     .run(columns, 2, &mut source, Arc::new(ZiPdfSurfaceFactory::new()), CancellationToken::new(), ZiEventSink::disabled())
//!     .await?;
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, ZiError>`. Malformed rows are skipped and
//! counted; packaging failures are reported in the result; cancellation is an
//! outcome, not an error.

#![deny(non_snake_case)]

pub mod errors;
pub mod record;
pub mod config;
pub mod layout;
pub mod render;
pub mod writer;
pub mod ingest;
pub mod events;
pub mod splitter;
pub mod engine;
pub mod export;
pub mod exporter;

pub use errors::{Result, ZiError};
pub use record::{ZiCell, ZiColumnSet, ZiRow, ZiRowBatch};
pub use config::{ZiColor, ZiExportConfig, ZiExportConfigBuilder, ZiMargins, ZiOrientation, ZiPageSize};
pub use layout::{column_widths, needs_page_break, row_height, ZiLayoutState};
pub use render::{ZiDocumentSpec, ZiDrawingSurface, ZiRecordingSurfaceFactory, ZiSurfaceFactory};
pub use writer::{ZiDocumentWriter, ZiWriterOptions, ZiWriterState};
pub use ingest::{ZiChunk, ZiRowSource, ZiVecRowSource};
pub use events::{ZiEvent, ZiEventSink, ZiProgress};
pub use splitter::{ZiCompletedFile, ZiDocumentData, ZiFileSplitter};
pub use engine::{ZiGenerationResult, ZiGenerationSession, ZiOutcome, ZiPaginationEngine};
pub use export::{ZiArchive, ZiArchivePackager, ZiZipPackager};
pub use exporter::{ZiGenerationHandle, ZiGenerationUpdate, ZiStreamExporter};

#[cfg(feature = "csv")]
pub use ingest::{estimate_row_count, read_csv_header, ZiCsvOptions, ZiCsvRowSource};
#[cfg(feature = "pdf")]
pub use render::ZiPdfSurfaceFactory;
