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

//! # Zipage Record Module
//!
//! Tabular data structures that flow from a row source into the document
//! writer.
//!
//! ## Design Principles
//!
//! - **Typed once**: a cell's kind (text, number, empty) is decided at decode
//!   time; drawing only ever calls [`ZiCell::display`].
//! - **Fixed columns**: a [`ZiColumnSet`] is derived once before streaming and
//!   never changes during a run. Rows are reconciled against it at draw time:
//!   excess cells are dropped and missing cells render blank.
//! - **Transient batches**: a [`ZiRowBatch`] is consumed exactly once and
//!   dropped as soon as its rows have been written.
//!
//! ## Usage Example
//!
//! ```rust
//! use zipage::record::{ZiCell, ZiColumnSet, ZiRow};
//!
//! let columns = ZiColumnSet::new(["id", "name"]).unwrap();
//! let row = ZiRow::from_texts(["1", "Alice"]);
//! assert_eq!(row.cell(1).display(), "Alice");
//! assert_eq!(row.cell(5).display(), "");
//! assert_eq!(columns.len(), 2);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ZiError};

/// A single table cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ZiCell {
    /// Free text, rendered verbatim.
    Text(String),
    /// Numeric value decoded from the source.
    Number(f64),
    /// Missing or empty value.
    #[default]
    Empty,
}

static EMPTY_CELL: ZiCell = ZiCell::Empty;

impl ZiCell {
    /// Builds a text cell, mapping the empty string to [`ZiCell::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            ZiCell::Empty
        } else {
            ZiCell::Text(value)
        }
    }

    /// Decodes raw field text, inferring numbers the way a dynamically typed
    /// reader would.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ZiCell::Empty;
        }
        if looks_numeric(trimmed) {
            if let Ok(number) = trimmed.parse::<f64>() {
                if number.abs() < MAX_EXACT_INTEGER {
                    return ZiCell::Number(number);
                }
            }
        }
        ZiCell::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ZiCell::Empty)
    }

    /// Display text for drawing.
    ///
    /// Integral numbers print without a fractional part, non-finite numbers
    /// print as `NaN`, `Infinity` or `-Infinity`, and empty cells are blank.
    pub fn display(&self) -> String {
        match self {
            ZiCell::Text(text) => text.clone(),
            ZiCell::Empty => String::new(),
            ZiCell::Number(number) => format_number(*number),
        }
    }
}

impl fmt::Display for ZiCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for ZiCell {
    fn from(value: &str) -> Self {
        ZiCell::text(value)
    }
}

impl From<String> for ZiCell {
    fn from(value: String) -> Self {
        ZiCell::text(value)
    }
}

impl From<f64> for ZiCell {
    fn from(value: f64) -> Self {
        ZiCell::Number(value)
    }
}

impl From<i64> for ZiCell {
    fn from(value: i64) -> Self {
        ZiCell::Number(value as f64)
    }
}

impl<T: Into<ZiCell>> From<Option<T>> for ZiCell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ZiCell::Empty)
    }
}

/// Magnitudes from here on lose integer precision and stay text.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn looks_numeric(text: &str) -> bool {
    // Reject forms f64::from_str accepts but a CSV author would not mean as
    // numbers ("inf", "NaN", "+5", hex-like words).
    let body = text.strip_prefix('-').unwrap_or(text);
    !body.is_empty()
        && body.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.')
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
}

fn format_number(number: f64) -> String {
    if number.is_nan() {
        return "NaN".to_string();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    }
}

/// One ordered row of cells.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ZiRow {
    pub cells: Vec<ZiCell>,
}

impl ZiRow {
    pub fn new(cells: Vec<ZiCell>) -> Self {
        Self { cells }
    }

    /// Builds a row of text cells.
    pub fn from_texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: values.into_iter().map(|v| ZiCell::text(v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `index`, or an empty cell when the row is short.
    pub fn cell(&self, index: usize) -> &ZiCell {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }

    /// Display texts reconciled against a column count.
    pub fn display_cells(&self, columns: usize) -> Vec<String> {
        (0..columns).map(|i| self.cell(i).display()).collect()
    }
}

/// Ordered rows of one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZiRowBatch {
    pub rows: Vec<ZiRow>,
    /// Rows the decoder dropped inside this chunk because they were malformed.
    pub skipped_rows: usize,
}

impl ZiRowBatch {
    pub fn new(rows: Vec<ZiRow>) -> Self {
        Self {
            rows,
            skipped_rows: 0,
        }
    }

    pub fn with_skipped(mut self, skipped_rows: usize) -> Self {
        self.skipped_rows = skipped_rows;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for ZiRowBatch {
    type Item = ZiRow;
    type IntoIter = std::vec::IntoIter<ZiRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Ordered column names, fixed for one generation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZiColumnSet {
    names: Vec<String>,
}

impl ZiColumnSet {
    /// Builds a column set; at least one column is required.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ZiError::usage("column set must contain at least one column"));
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
