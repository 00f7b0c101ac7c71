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

//! # Page Layout Tracker
//!
//! Pure geometry for the pagination engine. All distances are millimetres,
//! measured from the top edge of the page downwards.
//!
//! The tracker never draws. [`ZiLayoutState`] is advanced by the document
//! writer after every band and reset to the top margin on a new page; the
//! engine asks [`needs_page_break`] before placing each row.

use serde::{Deserialize, Serialize};

use crate::config::ZiMargins;

/// Millimetres per typographic point.
pub const MM_PER_POINT: f64 = 25.4 / 72.0;

/// Vertical cursor of the page being filled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiLayoutState {
    /// Offset of the next band's top edge from the top of the page.
    pub current_offset: f64,
    /// 1-based page number inside the current document.
    pub current_page: usize,
    pub row_height: f64,
    pub page_height: f64,
    pub margins: ZiMargins,
}

impl ZiLayoutState {
    /// A fresh state positioned at the top margin of page 1.
    pub fn new(page_height: f64, margins: ZiMargins, row_height: f64) -> Self {
        Self {
            current_offset: margins.top,
            current_page: 1,
            row_height,
            page_height,
            margins,
        }
    }

    /// Moves the cursor down by one row.
    pub fn advance(&mut self) {
        self.current_offset += self.row_height;
    }

    /// Starts the next page.
    pub fn next_page(&mut self) {
        self.current_page += 1;
        self.current_offset = self.margins.top;
    }

    /// Lowest offset a band may reach.
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.margins.bottom
    }
}

/// Returns true when one more row would overflow the printable area.
///
/// A row that ends exactly on the bottom margin still fits.
pub fn needs_page_break(state: &ZiLayoutState) -> bool {
    state.current_offset + state.row_height > state.content_bottom()
}

/// Row height in millimetres for a font size in points.
pub fn row_height(font_size_pt: f64, cell_padding: f64) -> f64 {
    font_size_pt * MM_PER_POINT + 2.0 * cell_padding
}

/// Equal column widths across the printable width.
pub fn column_widths(page_width: f64, margins: &ZiMargins, columns: usize) -> Vec<f64> {
    if columns == 0 {
        return Vec::new();
    }
    let usable = (page_width - margins.left - margins.right).max(0.0);
    vec![usable / columns as f64; columns]
}

/// Left edge of every column.
pub fn column_offsets(margins: &ZiMargins, widths: &[f64]) -> Vec<f64> {
    widths
        .iter()
        .scan(margins.left, |x, width| {
            let left = *x;
            *x += width;
            Some(left)
        })
        .collect()
}

/// Number of rows that fit on a page when the first row starts at
/// `first_offset`.
pub fn rows_per_page(state: &ZiLayoutState, first_offset: f64) -> usize {
    if state.row_height <= 0.0 {
        return usize::MAX;
    }
    let mut scratch = ZiLayoutState {
        current_offset: first_offset,
        ..*state
    };
    let mut count = 0;
    while !needs_page_break(&scratch) {
        scratch.advance();
        count += 1;
    }
    count
}
