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

//! # Row Source
//!
//! Pull-based provider of row chunks. The engine asks for chunk `0`, `1`, `2`
//! and so on until the source answers [`ZiChunk::EndOfData`].
//!
//! A source must answer a repeated request for the same index with the same
//! rows. Errors other than [`ZiError::RowDecode`] end the run.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::{Result, ZiError};
use crate::record::{ZiRow, ZiRowBatch};

/// Answer to a chunk request.
#[derive(Clone, Debug, PartialEq)]
pub enum ZiChunk {
    Rows(ZiRowBatch),
    EndOfData,
}

impl ZiChunk {
    pub fn is_end(&self) -> bool {
        matches!(self, ZiChunk::EndOfData)
    }
}

#[async_trait]
pub trait ZiRowSource: Send {
    /// Returns the rows of chunk `chunk_index`, or end of data.
    async fn next_chunk(&mut self, chunk_index: usize) -> Result<ZiChunk>;
}

/// Serves fixed-size chunks from rows already in memory.
#[derive(Clone, Debug)]
pub struct ZiVecRowSource {
    rows: Vec<ZiRow>,
    chunk_size: usize,
    cancel: Option<CancellationToken>,
}

impl ZiVecRowSource {
    pub fn new(rows: Vec<ZiRow>, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ZiError::usage("chunk size must be at least 1"));
        }
        Ok(Self {
            rows,
            chunk_size,
            cancel: None,
        })
    }

    /// Answers end of data once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.rows.len().div_ceil(self.chunk_size)
    }
}

#[async_trait]
impl ZiRowSource for ZiVecRowSource {
    async fn next_chunk(&mut self, chunk_index: usize) -> Result<ZiChunk> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Ok(ZiChunk::EndOfData);
        }
        let start = chunk_index.saturating_mul(self.chunk_size);
        if start >= self.rows.len() {
            return Ok(ZiChunk::EndOfData);
        }
        let end = (start + self.chunk_size).min(self.rows.len());
        Ok(ZiChunk::Rows(ZiRowBatch::new(self.rows[start..end].to_vec())))
    }
}
