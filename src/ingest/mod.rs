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

//! # Data Ingestion Module
//!
//! Row sources feeding the pagination engine one bounded chunk at a time.
//!
//! ## Module Components
//!
//! - **Source** ([source.rs](source/index.html)): the [`ZiRowSource`] trait and
//!   an in-memory implementation
//! - **CSV** ([csv_source.rs](csv_source/index.html)): chunked CSV decoding,
//!   header sampling and row-count estimation (feature `csv`)
//!
//! ## Usage Patterns
//!
//! ```rust
//! use zipage::ingest::{estimate_row_count, ZiCsvOptions, ZiCsvRowSource, DEFAULT_SAMPLE_BYTES};
//!
//! let source = ZiCsvRowSource::open("orders.csv", ZiCsvOptions::default())?;
//! let columns = source.columns().clone();
//! let estimate = estimate_row_count("orders.csv", DEFAULT_SAMPLE_BYTES)?;
//! ```

pub mod source;
#[cfg(feature = "csv")]
pub mod csv_source;

pub use source::{ZiChunk, ZiRowSource, ZiVecRowSource};
#[cfg(feature = "csv")]
pub use csv_source::{
    estimate_row_count, is_csv_path, read_csv_header, ZiCsvOptions, ZiCsvRowSource,
    DEFAULT_SAMPLE_BYTES,
};
