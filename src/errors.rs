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

//! # Zipage Error Module
//!
//! This module defines the error types shared by every stage of a streaming
//! export: row decoding, layout, drawing, file splitting and packaging.
//!
//! ## Error Categories
//!
//! - **Input**: The data source is unreadable or not tabular. Fatal to the run.
//! - **RowDecode**: A single malformed row or chunk. Recoverable; the engine
//!   treats the chunk as empty and counts the skipped rows.
//! - **Packaging**: Archive creation failed. Non-fatal; finished documents stay
//!   valid and are still returned.
//! - **Usage**: A programming-contract violation (writing after finalize,
//!   generating with zero columns, invalid configuration). Fails fast.
//! - **Render**: The drawing backend rejected an operation.
//! - **Io** / **Serde** / **Zip**: Wrapped library failures.
//! - **Internal**: Unexpected internal failures.
//!
//! Cancellation is deliberately absent here: a cancelled run is a distinct
//! outcome ([`crate::engine::ZiOutcome::Cancelled`]), not a failure.
//!
//! ## Usage
//!
//! ```rust
//! use zipage::errors::{Result, ZiError};
//!
//! fn check_columns(columns: &[String]) -> Result<()> {
//!     if columns.is_empty() {
//!         return Err(ZiError::usage("at least one column is required"));
//!     }
//!     Ok(())
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::result::ZipError;

/// Convience result type used throughout Zipage.
pub type Result<T> = std::result::Result<T, ZiError>;

/// Canonical error enumeration for Zipage.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ZiError {
    /// The source could not be read or does not look tabular.
    #[error("input error: {message}")]
    Input { message: String },

    /// A chunk (or some rows of it) could not be decoded.
    #[error("row decode error in chunk {chunk}: {message} ({rows} rows skipped)")]
    RowDecode {
        chunk: usize,
        rows: usize,
        message: String,
    },

    /// Archive packaging failed; individual documents are unaffected.
    #[error("packaging error: {message}")]
    Packaging { message: String },

    /// Contract violation by the caller.
    #[error("usage error: {message}")]
    Usage { message: String },

    /// The drawing backend failed.
    #[error("render error: {message}")]
    Render { message: String },

    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Errors originating from ZIP file operations.
    #[error("zip error: {0}")]
    Zip(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for ZiError {
    fn from(err: io::Error) -> Self {
        ZiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ZiError {
    fn from(err: serde_json::Error) -> Self {
        ZiError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for ZiError {
    fn from(err: serde_yaml::Error) -> Self {
        ZiError::Serde(err.to_string())
    }
}

impl From<ZipError> for ZiError {
    fn from(err: ZipError) -> Self {
        ZiError::Zip(err.to_string())
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for ZiError {
    fn from(err: csv::Error) -> Self {
        ZiError::Input {
            message: err.to_string(),
        }
    }
}

impl ZiError {
    /// Helper to construct input errors.
    pub fn input<T: Into<String>>(message: T) -> Self {
        ZiError::Input {
            message: message.into(),
        }
    }

    /// Helper to construct recoverable row decode errors.
    pub fn row_decode(chunk: usize, rows: usize, message: impl Into<String>) -> Self {
        ZiError::RowDecode {
            chunk,
            rows,
            message: message.into(),
        }
    }

    /// Helper to construct packaging errors.
    pub fn packaging<T: Into<String>>(message: T) -> Self {
        ZiError::Packaging {
            message: message.into(),
        }
    }

    /// Helper to construct usage errors.
    pub fn usage<T: Into<String>>(message: T) -> Self {
        ZiError::Usage {
            message: message.into(),
        }
    }

    /// Helper to construct render errors.
    pub fn render<T: Into<String>>(message: T) -> Self {
        ZiError::Render {
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        ZiError::Internal(message.into())
    }

    /// Returns true when the engine may skip past this error and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ZiError::RowDecode { .. })
    }
}
