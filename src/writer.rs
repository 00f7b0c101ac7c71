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

//! # Document Writer
//!
//! Stateful wrapper around exactly one drawing surface. The writer owns the
//! vertical cursor ([`ZiLayoutState`]) of the document it is drawing and moves
//! through a fixed lifecycle:
//!
//! ```text
//! Empty --write_header_row--> HeaderWritten --write_data_row--> RowsWritten
//!   |                                                              |
//!   +------------------------------ finalize ----------------------+--> Finalized
//! ```
//!
//! `add_page` may happen in any non-final state. Once finalized, every call
//! that would draw fails with [`ZiError::Usage`].

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::config::{ZiColor, ZiExportConfig, ZiMargins};
use crate::errors::{Result, ZiError};
use crate::layout::{column_offsets, column_widths, row_height, ZiLayoutState};
use crate::record::{ZiColumnSet, ZiRow};
use crate::render::{ZiDocumentSpec, ZiDrawingSurface, ZiFontStyle, ZiSurfaceFactory, ZiTextAlign};

const TITLE_FONT_SIZE: f64 = 14.0;
const AUTHOR_FONT_SIZE: f64 = 10.0;
const PAGE_NUMBER_FONT_SIZE: f64 = 8.0;
const TIMESTAMP_FONT_SIZE: f64 = 7.0;
/// Distance of the text baseline above a band's bottom edge, beyond padding.
const BASELINE_LIFT: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZiWriterState {
    Empty,
    HeaderWritten,
    RowsWritten,
    Finalized,
}

/// Drawing options for one document, taken from the export configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiWriterOptions {
    pub margins: ZiMargins,
    pub include_header_row: bool,
    pub repeat_header_row: bool,
    pub include_footer: bool,
    pub include_page_numbers: bool,
    pub font_size: f64,
    pub cell_padding: f64,
    pub header_fill_color: ZiColor,
    pub alternate_row_fill_color: ZiColor,
}

impl From<&ZiExportConfig> for ZiWriterOptions {
    fn from(config: &ZiExportConfig) -> Self {
        Self {
            margins: config.margins,
            include_header_row: config.include_header_row,
            repeat_header_row: config.repeat_header_row,
            include_footer: config.include_footer,
            include_page_numbers: config.include_page_numbers,
            font_size: config.font_size,
            cell_padding: config.cell_padding,
            header_fill_color: config.header_fill_color,
            alternate_row_fill_color: config.alternate_row_fill_color,
        }
    }
}

/// Exported bytes of a finalized document.
#[derive(Clone, Debug)]
pub struct ZiFinishedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub row_count: usize,
}

pub struct ZiDocumentWriter {
    surface: Option<Box<dyn ZiDrawingSurface>>,
    spec: ZiDocumentSpec,
    columns: ZiColumnSet,
    options: ZiWriterOptions,
    widths: Vec<f64>,
    offsets: Vec<f64>,
    layout: ZiLayoutState,
    state: ZiWriterState,
    rows_written: usize,
}

impl ZiDocumentWriter {
    /// Creates a surface for `spec` and positions the cursor on page 1.
    ///
    /// The document heading (title and author) is stamped immediately; the
    /// column header row is not.
    pub fn start_document(
        factory: &dyn ZiSurfaceFactory,
        spec: ZiDocumentSpec,
        columns: ZiColumnSet,
        options: ZiWriterOptions,
    ) -> Result<Self> {
        if columns.is_empty() {
            return Err(ZiError::usage("cannot start a document without columns"));
        }
        let mut surface = factory.create(&spec)?;
        surface.set_font(ZiFontStyle::Regular, options.font_size);

        let height = row_height(options.font_size, options.cell_padding);
        let widths = column_widths(spec.page_width, &options.margins, columns.len());
        let offsets = column_offsets(&options.margins, &widths);
        let layout = ZiLayoutState::new(spec.page_height, options.margins, height);

        let mut writer = Self {
            surface: Some(surface),
            spec,
            columns,
            options,
            widths,
            offsets,
            layout,
            state: ZiWriterState::Empty,
            rows_written: 0,
        };
        writer.stamp_heading()?;
        Ok(writer)
    }

    pub fn state(&self) -> ZiWriterState {
        self.state
    }

    pub fn layout(&self) -> &ZiLayoutState {
        &self.layout
    }

    pub fn spec(&self) -> &ZiDocumentSpec {
        &self.spec
    }

    pub fn page_count(&self) -> usize {
        self.layout.current_page
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn column_widths(&self) -> &[f64] {
        &self.widths
    }

    /// Draws the shaded header band with one bold label per column.
    pub fn write_header_row(&mut self) -> Result<()> {
        self.draw_header_band()?;
        if self.state == ZiWriterState::Empty {
            self.state = ZiWriterState::HeaderWritten;
        }
        Ok(())
    }

    /// Draws one data row at the cursor.
    ///
    /// Cells beyond the column count are dropped; missing cells stay blank.
    pub fn write_data_row(&mut self, row: &ZiRow, alternate: bool) -> Result<()> {
        let band_width = self.band_width();
        let top = self.layout.current_offset;
        let baseline = self.baseline();
        let (left, padding) = (self.options.margins.left, self.options.cell_padding);
        let (font_size, fill) = (self.options.font_size, self.options.alternate_row_fill_color);
        let height = self.layout.row_height;
        let texts = row.display_cells(self.columns.len());
        let cells: Vec<(f64, f64)> = self
            .offsets
            .iter()
            .zip(&self.widths)
            .map(|(x, width)| (*x, *width))
            .collect();

        let surface = self.surface_mut()?;
        if alternate {
            surface.set_fill_color(fill);
            surface.fill_rect(left, top, band_width, height)?;
        }
        surface.set_font(ZiFontStyle::Regular, font_size);
        for (text, (x, width)) in texts.iter().zip(cells) {
            if text.is_empty() {
                continue;
            }
            surface.draw_text(
                text,
                x + padding,
                baseline,
                ZiTextAlign::Left,
                Some(width - 2.0 * padding),
            )?;
        }

        self.layout.advance();
        self.rows_written += 1;
        self.state = ZiWriterState::RowsWritten;
        Ok(())
    }

    /// Starts a new page: cursor back to the top margin, heading stamped and
    /// the header row repeated when configured.
    pub fn add_page(&mut self) -> Result<()> {
        self.surface_mut()?.add_page()?;
        self.layout.next_page();
        log::debug!(
            "document '{}' advanced to page {}",
            self.spec.title,
            self.layout.current_page
        );
        self.stamp_heading()?;
        if self.options.include_header_row && self.options.repeat_header_row {
            self.draw_header_band()?;
        }
        Ok(())
    }

    /// Stamps footers on every page and exports the document.
    pub fn finalize(&mut self) -> Result<ZiFinishedDocument> {
        let mut surface = self
            .surface
            .take()
            .ok_or_else(|| ZiError::usage("document writer already finalized"))?;
        self.state = ZiWriterState::Finalized;

        if self.options.include_footer {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            let footer_y = self.spec.page_height - self.options.margins.bottom / 2.0;
            for page in 1..=surface.page_count() {
                surface.set_page(page)?;
                if self.options.include_page_numbers {
                    surface.set_font(ZiFontStyle::Regular, PAGE_NUMBER_FONT_SIZE);
                    surface.draw_text(
                        &format!("Page {}", page),
                        self.spec.page_width / 2.0,
                        footer_y,
                        ZiTextAlign::Center,
                        None,
                    )?;
                }
                surface.set_font(ZiFontStyle::Regular, TIMESTAMP_FONT_SIZE);
                surface.draw_text(
                    &timestamp,
                    self.options.margins.left,
                    footer_y,
                    ZiTextAlign::Left,
                    None,
                )?;
            }
        }

        let page_count = surface.page_count();
        let bytes = surface.export()?;
        Ok(ZiFinishedDocument {
            bytes,
            page_count,
            row_count: self.rows_written,
        })
    }

    fn surface_mut(&mut self) -> Result<&mut Box<dyn ZiDrawingSurface>> {
        self.surface
            .as_mut()
            .ok_or_else(|| ZiError::usage("document writer already finalized"))
    }

    fn band_width(&self) -> f64 {
        self.spec.page_width - self.options.margins.left - self.options.margins.right
    }

    fn baseline(&self) -> f64 {
        self.layout.current_offset + self.layout.row_height - self.options.cell_padding - BASELINE_LIFT
    }

    fn draw_header_band(&mut self) -> Result<()> {
        let band_width = self.band_width();
        let top = self.layout.current_offset;
        let baseline = self.baseline();
        let height = self.layout.row_height;
        let options = self.options.clone();
        let labels: Vec<(String, f64, f64)> = self
            .columns
            .iter()
            .zip(self.offsets.iter().zip(&self.widths))
            .map(|(name, (x, width))| (name.to_string(), *x, *width))
            .collect();

        let surface = self.surface_mut()?;
        surface.set_fill_color(options.header_fill_color);
        surface.fill_rect(options.margins.left, top, band_width, height)?;
        surface.set_font(ZiFontStyle::Bold, options.font_size);
        for (label, x, width) in &labels {
            surface.draw_text(
                label,
                x + options.cell_padding,
                baseline,
                ZiTextAlign::Left,
                Some(width - 2.0 * options.cell_padding),
            )?;
        }
        surface.set_font(ZiFontStyle::Regular, options.font_size);

        self.layout.advance();
        Ok(())
    }

    fn stamp_heading(&mut self) -> Result<()> {
        let (title, author) = (self.spec.title.clone(), self.spec.author.clone());
        if title.is_empty() && author.is_empty() {
            return Ok(());
        }
        let (left, top) = (self.options.margins.left, self.options.margins.top);
        let font_size = self.options.font_size;
        let surface = self.surface_mut()?;
        if !title.is_empty() {
            surface.set_font(ZiFontStyle::Bold, TITLE_FONT_SIZE);
            surface.draw_text(&title, left, top - 5.0, ZiTextAlign::Left, None)?;
        }
        if !author.is_empty() {
            surface.set_font(ZiFontStyle::Regular, AUTHOR_FONT_SIZE);
            surface.draw_text(&author, left, top, ZiTextAlign::Left, None)?;
        }
        surface.set_font(ZiFontStyle::Regular, font_size);
        Ok(())
    }
}

impl std::fmt::Debug for ZiDocumentWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZiDocumentWriter")
            .field("spec", &self.spec)
            .field("state", &self.state)
            .field("layout", &self.layout)
            .field("rows_written", &self.rows_written)
            .finish()
    }
}
